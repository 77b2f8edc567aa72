//! Render strategies
//!
//! The same workbook is projected into three documents:
//!
//! - [`WorkView`]: compact, row-oriented, for reading and diffing
//! - [`SheetView`]: HTML grids that keep the visual layout
//! - [`FullDump`]: everything the model holds, raw fragments included
//!
//! All three share the section skeleton in [`common`]; a strategy only
//! decides how styles and cells are shown and whether raw XML is included.

mod common;
mod full_dump;
pub mod images;
mod sheet_view;
mod work_view;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sheetdok_diagrams::InferenceConfig;
use sheetdok_model::{Sheet, Warnings, Workbook};

use crate::convert::{Analysis, SheetAnalysis};
use crate::report::{Report, Section};

pub use full_dump::FullDump;
pub use sheet_view::SheetView;
pub use work_view::WorkView;

/// Output mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Compact row-oriented view
    #[default]
    Work,
    /// Visual-fidelity grid view
    Sheet,
    /// Exhaustive dump
    Full,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Sheet => "sheet",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" | "work-view" => Ok(Self::Work),
            "sheet" | "sheet-view" => Ok(Self::Sheet),
            "full" | "full-dump" => Ok(Self::Full),
            other => Err(format!("unknown render mode '{}'", other)),
        }
    }
}

/// Options for one render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub mode: RenderMode,
    pub strict: bool,
    /// Render hidden sheets in work and sheet view (full dump always does)
    pub include_hidden_sheets: bool,
    /// Emit the sheet view as a standalone HTML document
    pub standalone_html: bool,
    pub inference: InferenceConfig,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Work,
            strict: false,
            include_hidden_sheets: true,
            standalone_html: false,
            inference: InferenceConfig::default(),
        }
    }
}

impl RenderOptions {
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether the output is a standalone HTML document
    pub fn is_html(&self) -> bool {
        self.mode == RenderMode::Sheet && self.standalone_html
    }
}

/// Everything a strategy reads
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub workbook: &'a Workbook,
    pub analysis: &'a Analysis,
    /// All warnings, already collected in reporting order
    pub warnings: &'a Warnings,
    pub options: &'a RenderOptions,
}

impl<'a> RenderContext<'a> {
    /// Sheets to render with their analysis, in workbook order
    pub fn sheets(&self) -> impl Iterator<Item = (&'a Sheet, &'a SheetAnalysis)> + 'a {
        let include_hidden =
            self.options.include_hidden_sheets || self.options.mode == RenderMode::Full;
        self.workbook
            .sheets
            .iter()
            .zip(self.analysis.sheets.iter())
            .filter(move |(sheet, _)| include_hidden || !sheet.visibility.is_hidden())
    }
}

/// One output mode
pub trait RenderStrategy: Send + Sync {
    fn mode(&self) -> RenderMode;

    /// Fill the `## Styles` section
    fn styles(&self, ctx: &RenderContext<'_>, section: &mut Section);

    /// Append the cell-content section(s) of one sheet
    fn cells(&self, ctx: &RenderContext<'_>, sheet: &Sheet, report: &mut Report);

    /// Include raw XML fragments for drawing objects and warnings
    fn raw_fragments(&self) -> bool {
        false
    }

    /// Build the whole report
    fn render(&self, ctx: &RenderContext<'_>) -> Report {
        common::build_report(self, ctx)
    }
}

/// Strategy implementing a mode
pub fn strategy_for(mode: RenderMode) -> Box<dyn RenderStrategy> {
    match mode {
        RenderMode::Work => Box::new(WorkView),
        RenderMode::Sheet => Box::new(SheetView),
        RenderMode::Full => Box::new(FullDump),
    }
}
