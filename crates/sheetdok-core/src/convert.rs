//! Conversion pipeline: analyze, collect warnings, render, check strictness

use std::path::Path;

use rayon::prelude::*;
use sheetdok_diagrams::{infer_sheet, ConnectionGraph, Flowchart, InferenceConfig};
use sheetdok_model::{Warnings, Workbook};
use sheetdok_ooxml::PackageError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::diagnostics::{self, StructuredFailure};
use crate::html::to_html;
use crate::markdown::to_markdown;
use crate::render::{strategy_for, RenderContext, RenderMode, RenderOptions};

/// Errors from the file-level conversion helpers
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    #[error(transparent)]
    Strict(#[from] StructuredFailure),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inference results of one sheet
#[derive(Debug, Clone, Default)]
pub struct SheetAnalysis {
    pub graph: ConnectionGraph,
    pub flowchart: Flowchart,
    /// `GeometryAmbiguity` warnings raised while inferring
    pub warnings: Warnings,
}

/// Inference results of a workbook, one entry per sheet in workbook order
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub sheets: Vec<SheetAnalysis>,
}

impl Analysis {
    /// Total number of inferred edges
    pub fn edge_count(&self) -> usize {
        self.sheets.iter().map(|s| s.graph.len()).sum()
    }
}

/// Infer connection graphs and flowcharts for every sheet
pub fn analyze(workbook: &Workbook, config: &InferenceConfig) -> Analysis {
    let sheets = workbook
        .sheets
        .par_iter()
        .map(|sheet| {
            let (graph, warnings) = infer_sheet(sheet, config);
            let flowchart = Flowchart::build(sheet, &graph);
            SheetAnalysis {
                graph,
                flowchart,
                warnings,
            }
        })
        .collect();
    Analysis { sheets }
}

/// Render a workbook with default options for `mode`
///
/// # Example
///
/// ```
/// use sheetdok_core::{render, RenderMode};
/// use sheetdok_model::Workbook;
///
/// let workbook = Workbook {
///     title: "empty".to_string(),
///     ..Default::default()
/// };
/// let text = render(&workbook, RenderMode::Work, true).unwrap();
/// assert!(text.starts_with("# Workbook: empty"));
/// ```
pub fn render(
    workbook: &Workbook,
    mode: RenderMode,
    strict: bool,
) -> Result<String, StructuredFailure> {
    let options = RenderOptions::default().with_mode(mode).with_strict(strict);
    render_with_options(workbook, &options)
}

/// Render a workbook
///
/// In strict mode any `Unsupported` warning turns the result into a
/// [`StructuredFailure`] listing all of them; the text is discarded.
pub fn render_with_options(
    workbook: &Workbook,
    options: &RenderOptions,
) -> Result<String, StructuredFailure> {
    let analysis = analyze(workbook, &options.inference);
    let warnings = diagnostics::collect(workbook, &analysis);
    let ctx = RenderContext {
        workbook,
        analysis: &analysis,
        warnings: &warnings,
        options,
    };

    let report = strategy_for(options.mode).render(&ctx);
    let text = if options.is_html() {
        to_html(&report)
    } else {
        to_markdown(&report)
    };

    if options.strict {
        if let Err(failure) = diagnostics::check_strict(&warnings) {
            log::debug!(
                "strict mode: discarding {} bytes of {} output",
                text.len(),
                options.mode
            );
            return Err(failure);
        }
    }
    Ok(text)
}

/// Load and render package bytes
pub fn convert_bytes(
    bytes: &[u8],
    file_name: &str,
    options: &RenderOptions,
) -> Result<String, ConvertError> {
    let workbook = sheetdok_ooxml::load_bytes(bytes, file_name)?;
    Ok(render_with_options(&workbook, options)?)
}

/// Load and render a package file
pub fn convert_file<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String, ConvertError> {
    let path = path.as_ref();
    log::debug!("converting {}", path.display());
    let workbook = sheetdok_ooxml::load(path)?;
    Ok(render_with_options(&workbook, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdok_model::{
        BoundingBox, Connector, ConnectorKind, Point, Shape, ShapeId, ShapeKind, Sheet, Warning,
        WarningKind,
    };

    fn shape(id: u32, x: f64, y: f64) -> Shape {
        Shape {
            id: ShapeId(id),
            uid: format!("s{}", id),
            name: format!("Box {}", id),
            text: None,
            kind: ShapeKind::from_preset(Some("rect")),
            bbox: BoundingBox::new(x, y, 10.0, 10.0),
            rotation: 0.0,
            z_order: id as usize,
            parent: None,
            image: None,
            fill_color: None,
            line_color: None,
            anchor: None,
            raw_xml: String::new(),
        }
    }

    fn diagram_workbook() -> Workbook {
        let connector = Connector {
            id: ShapeId(10),
            uid: "c10".into(),
            name: "Arrow".into(),
            text: None,
            kind: ConnectorKind::from_preset(Some("straightConnector1")),
            start: Point::new(10.0, 10.0),
            end: Point::new(50.0, 50.0),
            start_ref: None,
            end_ref: None,
            head_arrow: None,
            tail_arrow: Some("triangle".into()),
            line_color: None,
            z_order: 3,
            anchor: None,
            raw_xml: String::new(),
        };
        Workbook {
            title: "flow".into(),
            sheets: vec![Sheet {
                name: "Flow".into(),
                shapes: vec![shape(1, 0.0, 0.0), shape(2, 50.0, 50.0)],
                connectors: vec![connector],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_analyze_per_sheet() {
        let workbook = diagram_workbook();
        let analysis = analyze(&workbook, &InferenceConfig::default());

        assert_eq!(analysis.sheets.len(), 1);
        assert_eq!(analysis.edge_count(), 1);
        assert!(analysis.sheets[0].graph.edges[0].is_resolved());
        assert!(!analysis.sheets[0].flowchart.is_empty());
    }

    #[test]
    fn test_render_is_idempotent() {
        let workbook = diagram_workbook();
        for mode in [RenderMode::Work, RenderMode::Sheet, RenderMode::Full] {
            let first = render(&workbook, mode, false).unwrap();
            let second = render(&workbook, mode, false).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_strict_fails_only_on_unsupported() {
        let mut workbook = diagram_workbook();
        workbook
            .warnings
            .push(Warning::new(WarningKind::MissingPart, "docProps/app.xml"));
        assert!(render(&workbook, RenderMode::Work, true).is_ok());

        workbook.sheets[0].warnings.push(
            Warning::new(WarningKind::Unsupported, "not modeled").with_element("x14:sparklineGroups"),
        );
        let failure = render(&workbook, RenderMode::Work, true).unwrap_err();
        assert_eq!(failure.len(), 1);
        assert!(render(&workbook, RenderMode::Work, false).is_ok());
    }

    #[test]
    fn test_convert_bytes_rejects_non_zip() {
        let result = convert_bytes(b"not a zip", "x.xlsx", &RenderOptions::default());
        assert!(matches!(result, Err(ConvertError::Package(_))));
    }
}
