//! Workbook assembly
//!
//! Walks the package from `_rels/.rels` to the workbook part and from there
//! to every worksheet, resolving shared strings, shared formulas, styles,
//! merges and drawings into a [`Workbook`]. Either the whole model is built
//! or a [`PackageError`] is returned.

use std::path::Path;

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use sheetdok_diagrams::GridMetrics;
use sheetdok_model::{
    Sheet, SourceMetadata, StyleTable, Warning, WarningKind, Warnings, Workbook,
};

use crate::archive::{rels_path_for, resolve_target, PackageArchive};
use crate::content_types::{ContentTypes, CONTENT_TYPES_PART};
use crate::drawing::{DrawingCollector, DrawingContext};
use crate::error::{PackageError, Result};
use crate::relationships::Relationships;
use crate::shared_strings::SharedStrings;
use crate::styles::parse_styles;
use crate::workbook_part::{SheetEntry, WorkbookPart};
use crate::worksheet::{parse_worksheet, SheetContext};
use crate::xml::XmlDocument;

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const PRINT_AREA: &str = "_xlnm.Print_Area";
const PRINT_TITLES: &str = "_xlnm.Print_Titles";

/// Load a workbook from an `.xlsx` file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_bytes(&bytes, &name)
}

/// Load a workbook from in-memory package bytes
///
/// `file_name` only feeds the title and source metadata.
pub fn load_bytes(bytes: &[u8], file_name: &str) -> Result<Workbook> {
    let archive = PackageArchive::from_bytes(bytes)?;
    let metadata = SourceMetadata {
        file_name: file_name.to_string(),
        file_size: bytes.len() as u64,
        sha256: sha256_hex(bytes),
        zip_entries: archive.len(),
        ..Default::default()
    };
    assemble(&archive, metadata)
}

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Build the workbook model from an unpacked package
pub fn assemble(archive: &PackageArchive, mut metadata: SourceMetadata) -> Result<Workbook> {
    let content_types = match archive.get_string(CONTENT_TYPES_PART) {
        Some(source) => ContentTypes::parse(source)?,
        None => return Err(PackageError::MissingPart(CONTENT_TYPES_PART.to_string())),
    };
    if content_types.is_macro_enabled() {
        return Err(PackageError::UnsupportedFormat(
            "macro-enabled workbooks are not supported".to_string(),
        ));
    }

    let root_rels = optional_rels(archive, "_rels/.rels")?;
    let workbook_path = root_rels
        .of_type(Relationships::OFFICE_DOCUMENT)
        .next()
        .map(|rel| resolve_target("", &rel.target))
        .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());
    let workbook_source = archive
        .get_string(&workbook_path)
        .ok_or_else(|| PackageError::MissingPart(workbook_path.clone()))?;
    let workbook = WorkbookPart::parse(&workbook_path, workbook_source)?;
    let workbook_rels = optional_rels(archive, &rels_path_for(&workbook_path))?;

    let mut warnings = Warnings::new();

    let shared_strings = match part_of_type(&workbook_rels, &workbook_path, Relationships::SHARED_STRINGS) {
        Some(path) => match archive.get_string(&path) {
            Some(source) => SharedStrings::parse(&path, source)?,
            None => {
                warnings.push(missing_part(&path, "shared strings part is missing"));
                SharedStrings::default()
            }
        },
        None => SharedStrings::default(),
    };

    let styles = match part_of_type(&workbook_rels, &workbook_path, Relationships::STYLES) {
        Some(path) => match archive.get_string(&path) {
            Some(source) => parse_styles(&path, source)?,
            None => {
                warnings.push(missing_part(&path, "styles part is missing"));
                StyleTable::new()
            }
        },
        None => StyleTable::new(),
    };

    read_document_properties(archive, &root_rels, &mut metadata)?;
    metadata.calc_mode = workbook.calc_mode.clone();
    metadata.calc_id = workbook.calc_id.clone();

    // Resolve sheet parts up front so missing worksheets fail before any work
    let mut worksheets: Vec<(&SheetEntry, String)> = Vec::new();
    for entry in &workbook.sheets {
        let rel = entry
            .rel_id
            .as_deref()
            .and_then(|id| workbook_rels.get(id))
            .ok_or_else(|| {
                PackageError::invalid_reference(
                    workbook_path.as_str(),
                    format!("sheet '{}' has no relationship", entry.name),
                )
            })?;
        let path = resolve_target(&workbook_path, &rel.target);

        if rel.is_type(Relationships::WORKSHEET) {
            if !archive.contains(&path) {
                return Err(PackageError::MissingPart(path));
            }
            worksheets.push((entry, path));
        } else {
            let kind = rel.rel_type.rsplit('/').next().unwrap_or_default();
            log::warn!("skipping {} '{}' ({})", kind, entry.name, path);
            let mut warning = Warning::new(
                WarningKind::Unsupported,
                format!("{} sheets are not converted", kind),
            )
            .with_scope(&entry.name)
            .with_location(&path)
            .with_element(kind);
            if let Some(raw) = archive.get_string(&path) {
                warning = warning.with_raw(raw);
            }
            warnings.push(warning);
        }
    }

    let ctx = SheetContext {
        shared_strings: &shared_strings,
        styles: &styles,
    };
    let sheets = worksheets
        .par_iter()
        .map(|(entry, path)| {
            assemble_sheet(archive, &content_types, &workbook, entry, path, ctx)
        })
        .collect::<Result<Vec<_>>>()?;

    let title = Path::new(&metadata.file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::debug!(
        "assembled '{}': {} sheets, {} workbook warnings",
        title,
        sheets.len(),
        warnings.len()
    );

    Ok(Workbook {
        title,
        metadata,
        styles,
        defined_names: workbook.defined_names,
        sheets,
        warnings,
    })
}

fn assemble_sheet(
    archive: &PackageArchive,
    content_types: &ContentTypes,
    workbook: &WorkbookPart,
    entry: &SheetEntry,
    path: &str,
    ctx: SheetContext<'_>,
) -> Result<Sheet> {
    let source = archive
        .get_string(path)
        .ok_or_else(|| PackageError::MissingPart(path.to_string()))?;
    let parsed = parse_worksheet(entry, path, source, ctx)?;
    let mut sheet = parsed.sheet;

    sheet.print.print_areas = workbook
        .builtin_for_sheet(PRINT_AREA, entry.index)
        .flat_map(|n| n.ranges.iter().copied())
        .collect();
    sheet.print.print_titles = workbook
        .builtin_for_sheet(PRINT_TITLES, entry.index)
        .map(|n| n.value.clone())
        .next();

    if !parsed.drawing_rel_ids.is_empty() {
        let grid = GridMetrics::from_layout(&sheet.layout);
        let drawing_ctx = DrawingContext {
            archive,
            content_types,
            grid: &grid,
            scope: &entry.name,
        };
        let sheet_rels = optional_rels(archive, &rels_path_for(path))?;
        let mut collector = DrawingCollector::new();

        for rel_id in &parsed.drawing_rel_ids {
            let Some(rel) = sheet_rels.get(rel_id) else {
                collector.warn(
                    missing_part(path, format!("drawing relationship {} is not declared", rel_id))
                        .with_scope(&entry.name),
                );
                continue;
            };
            let drawing_path = resolve_target(path, &rel.target);
            match archive.get_string(&drawing_path) {
                Some(xml) => collector.add_drawing(&drawing_path, xml, drawing_ctx)?,
                None => collector.warn(
                    missing_part(&drawing_path, "drawing part is missing").with_scope(&entry.name),
                ),
            }
        }

        let drawings = collector.finish();
        sheet.shapes = drawings.shapes;
        sheet.connectors = drawings.connectors;
        sheet.warnings.append(drawings.warnings);
    }

    log::debug!(
        "{}: {} cells, {} merges, {} shapes, {} connectors",
        sheet.name,
        sheet.cells.len(),
        sheet.merges.len(),
        sheet.shapes.len(),
        sheet.connectors.len()
    );
    Ok(sheet)
}

fn optional_rels(archive: &PackageArchive, path: &str) -> Result<Relationships> {
    match archive.get(path) {
        Some(bytes) => Relationships::parse(bytes),
        None => Ok(Relationships::new()),
    }
}

fn part_of_type(rels: &Relationships, base: &str, kind: &str) -> Option<String> {
    rels.of_type(kind)
        .next()
        .map(|rel| resolve_target(base, &rel.target))
}

fn missing_part(location: &str, reason: impl Into<String>) -> Warning {
    Warning::new(WarningKind::MissingPart, reason).with_location(location)
}

/// Fill creator/dates from `docProps/core.xml` and the application name from
/// `docProps/app.xml`
fn read_document_properties(
    archive: &PackageArchive,
    root_rels: &Relationships,
    metadata: &mut SourceMetadata,
) -> Result<()> {
    let core = part_of_type(root_rels, "", Relationships::CORE_PROPERTIES)
        .unwrap_or_else(|| "docProps/core.xml".to_string());
    if let Some(source) = archive.get_string(&core) {
        let doc = XmlDocument::parse(core, source)?;
        let text = |name: &str| {
            doc.root
                .child_text(name)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        };
        metadata.creator = text("creator");
        metadata.last_modified_by = text("lastModifiedBy");
        metadata.created = text("created");
        metadata.modified = text("modified");
    }

    let app = part_of_type(root_rels, "", Relationships::EXTENDED_PROPERTIES)
        .unwrap_or_else(|| "docProps/app.xml".to_string());
    if let Some(source) = archive.get_string(&app) {
        let doc = XmlDocument::parse(app, source)?;
        metadata.application = doc
            .root
            .child_text("Application")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_missing_content_types_is_fatal() {
        let mut archive = PackageArchive::new();
        archive.set_string("xl/workbook.xml", "<workbook/>");
        let err = assemble(&archive, SourceMetadata::default()).unwrap_err();
        assert!(matches!(err, PackageError::MissingPart(_)));
    }
}
