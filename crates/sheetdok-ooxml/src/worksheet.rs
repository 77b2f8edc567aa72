//! Worksheet part parsing (`xl/worksheets/sheetN.xml`)
//!
//! Produces a [`Sheet`] with cells, merges, validations, print settings and
//! layout filled in. Drawing objects are attached later by the assembler,
//! which only needs the drawing relationship ids collected here.

use std::collections::{BTreeMap, HashMap, HashSet};

use sheetdok_model::reference::{parse_sqref, parse_sheet_scoped_ranges, MAX_COL, MAX_ROW};
use sheetdok_model::{
    Cell, CellKind, CellRef, DataValidationRule, FreezePane, MergeRegion, PrintSettings, RangeRef,
    Sheet, SheetLayout, StyleTable, ValidationKind, Warning, WarningKind, Warnings,
};

use crate::error::{PackageError, Result};
use crate::formula::shift_formula;
use crate::shared_strings::{item_text, SharedStrings};
use crate::workbook_part::SheetEntry;
use crate::xml::{XmlDocument, XmlElement};

/// Top-level worksheet children that are either modeled or deliberately
/// ignored; anything else is reported as unsupported
const KNOWN_CHILDREN: &[&str] = &[
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// Result of parsing one worksheet part
#[derive(Debug, Clone)]
pub struct ParsedWorksheet {
    pub sheet: Sheet,
    /// Relationship ids of `<drawing>` elements, in document order
    pub drawing_rel_ids: Vec<String>,
}

/// Read-only lookups shared by every sheet of a workbook
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    pub shared_strings: &'a SharedStrings,
    pub styles: &'a StyleTable,
}

/// Parse a worksheet part
pub fn parse_worksheet(
    entry: &SheetEntry,
    path: &str,
    source: String,
    ctx: SheetContext<'_>,
) -> Result<ParsedWorksheet> {
    let doc = XmlDocument::parse(path, source)?;
    let root = &doc.root;

    let mut sheet = Sheet {
        index: entry.index,
        name: entry.name.clone(),
        path: path.to_string(),
        visibility: entry.visibility,
        ..Default::default()
    };
    let mut warnings = Warnings::new();
    let mut drawing_rel_ids = Vec::new();

    sheet.dimension = root
        .child("dimension")
        .and_then(|d| d.attr("ref"))
        .and_then(|r| r.parse().ok());

    for child in root.elements() {
        match child.local.as_str() {
            "sheetViews" => sheet.layout.freeze = parse_freeze(child),
            "sheetFormatPr" => parse_format_defaults(child, &mut sheet.layout),
            "cols" => parse_cols(child, &mut sheet.layout),
            "sheetData" => {
                sheet.cells = parse_sheet_data(
                    &doc,
                    child,
                    &sheet.name,
                    ctx,
                    &mut sheet.layout,
                    &mut warnings,
                )?
            }
            "mergeCells" => sheet.merges = parse_merges(&doc, child, &sheet.name, &mut warnings)?,
            "dataValidations" => {
                sheet.validations = parse_validations(&doc, child, &sheet.name, &mut warnings)
            }
            "drawing" => {
                if let Some(id) = child.attr("id") {
                    drawing_rel_ids.push(id.to_string());
                }
            }
            local if KNOWN_CHILDREN.contains(&local) => {}
            local => {
                log::debug!("{}: unsupported worksheet element <{}>", path, local);
                warnings.push(
                    Warning::new(WarningKind::Unsupported, "worksheet element is not modeled")
                        .with_scope(&sheet.name)
                        .with_location(path)
                        .with_element(local)
                        .with_raw(doc.raw(child)),
                );
            }
        }
    }

    sheet.print = parse_print_settings(root);
    sheet.warnings = warnings;

    Ok(ParsedWorksheet {
        sheet,
        drawing_rel_ids,
    })
}

/// A `<c>` element before shared-string and shared-formula resolution
struct RawCell<'a> {
    coord: CellRef,
    elem: &'a XmlElement,
}

fn parse_sheet_data(
    doc: &XmlDocument,
    sheet_data: &XmlElement,
    scope: &str,
    ctx: SheetContext<'_>,
    layout: &mut SheetLayout,
    warnings: &mut Warnings,
) -> Result<Vec<Cell>> {
    let part = doc.part.as_str();
    let mut raw_cells = Vec::new();
    let mut last_row = 0u32;

    for row in sheet_data.children_named("row") {
        let row_idx = match row.attr("r") {
            Some(r) => r.trim().parse::<u32>().ok(),
            None => last_row.checked_add(1),
        }
        .filter(|r| (1..=MAX_ROW).contains(r))
        .ok_or_else(|| {
            PackageError::invalid_reference(
                part,
                format!(
                    "invalid row number '{}'",
                    row.attr("r").map_or_else(|| format!("after {}", last_row), str::to_string)
                ),
            )
        })?;
        last_row = row_idx;

        if let Some(ht) = row.attr_parse::<f64>("ht") {
            layout.row_heights.insert(row_idx, ht);
        }
        if row.attr_bool("hidden", false) {
            layout.hidden_rows.insert(row_idx);
        }

        let mut last_col = 0u32;
        for c in row.children_named("c") {
            let coord = match c.attr("r") {
                Some(r) => r.parse::<CellRef>().map_err(|e| {
                    PackageError::invalid_reference(part, e.to_string())
                })?,
                None => last_col
                    .checked_add(1)
                    .filter(|col| *col <= MAX_COL)
                    .map(|col| CellRef::new(row_idx, col))
                    .ok_or_else(|| {
                        PackageError::invalid_reference(
                            part,
                            format!("row {}: cell after column {} is past the last column", row_idx, last_col),
                        )
                    })?,
            };
            last_col = coord.col;
            raw_cells.push(RawCell { coord, elem: c });
        }
    }

    // Masters first, so dependents may appear in any order
    let mut masters: HashMap<String, (CellRef, String)> = HashMap::new();
    for raw in &raw_cells {
        if let Some(f) = raw.elem.child("f") {
            let text = f.text();
            if f.attr("t") == Some("shared") && !text.trim().is_empty() {
                if let Some(si) = f.attr("si") {
                    masters
                        .entry(si.to_string())
                        .or_insert((raw.coord, text.trim().to_string()));
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let mut cells = Vec::with_capacity(raw_cells.len());
    for raw in raw_cells {
        if !seen.insert(raw.coord) {
            return Err(PackageError::malformed(
                part,
                format!("duplicate cell coordinate {}", raw.coord),
            ));
        }
        cells.push(build_cell(part, &raw, &masters, scope, ctx, warnings)?);
    }

    cells.sort_by_key(|c| c.coord);
    Ok(cells)
}

fn build_cell(
    part: &str,
    raw: &RawCell<'_>,
    masters: &HashMap<String, (CellRef, String)>,
    scope: &str,
    ctx: SheetContext<'_>,
    warnings: &mut Warnings,
) -> Result<Cell> {
    let elem = raw.elem;
    let kind = CellKind::from_type_attr(elem.attr("t"));
    let stored = elem.child_text("v");

    let value = match kind {
        CellKind::SharedString => match stored.as_deref().map(str::trim) {
            Some(idx) => {
                let index: usize = idx.parse().map_err(|_| {
                    PackageError::malformed(part, format!("{}: bad shared string index '{}'", raw.coord, idx))
                })?;
                let text = ctx.shared_strings.get(index).ok_or_else(|| {
                    PackageError::malformed(
                        part,
                        format!(
                            "{}: shared string index {} out of range ({} entries)",
                            raw.coord,
                            index,
                            ctx.shared_strings.len()
                        ),
                    )
                })?;
                Some(text.to_string())
            }
            None => None,
        },
        CellKind::InlineString => elem.child("is").map(item_text),
        CellKind::Boolean => stored.as_deref().map(|v| {
            if v.trim() == "1" {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }),
        _ => stored.clone(),
    };

    let formula = match elem.child("f") {
        Some(f) => resolve_formula(part, raw.coord, f, masters)?,
        None => None,
    };

    let style_id = match elem.attr("s") {
        Some(s) => {
            let id = s.trim().parse::<u32>().ok();
            match id {
                Some(id) if ctx.styles.contains(id) => Some(id),
                _ => {
                    warnings.push(
                        Warning::new(
                            WarningKind::StyleResolution,
                            format!("unknown style id '{}', using default style 0", s),
                        )
                        .with_scope(scope)
                        .with_location(raw.coord.to_string()),
                    );
                    Some(0)
                }
            }
        }
        None => None,
    };

    let mut cell = Cell::new(raw.coord, kind, value);
    if formula.is_some() {
        cell.cached_value = stored;
    }
    cell.formula = formula;
    cell.style_id = style_id;
    Ok(cell)
}

fn resolve_formula(
    part: &str,
    coord: CellRef,
    f: &XmlElement,
    masters: &HashMap<String, (CellRef, String)>,
) -> Result<Option<String>> {
    let text = f.text().trim().to_string();
    if f.attr("t") != Some("shared") || !text.is_empty() {
        return Ok((!text.is_empty()).then_some(text));
    }

    let si = f.attr("si").unwrap_or_default();
    let (master, master_text) = masters.get(si).ok_or_else(|| {
        PackageError::malformed(
            part,
            format!("{}: shared formula si={} has no master cell", coord, si),
        )
    })?;
    let rows = i64::from(coord.row) - i64::from(master.row);
    let cols = i64::from(coord.col) - i64::from(master.col);
    Ok(Some(shift_formula(master_text, rows, cols)))
}

fn parse_merges(
    doc: &XmlDocument,
    merge_cells: &XmlElement,
    scope: &str,
    warnings: &mut Warnings,
) -> Result<Vec<MergeRegion>> {
    let mut merges: Vec<MergeRegion> = Vec::new();
    for merge in merge_cells.children_named("mergeCell") {
        let Some(r) = merge.attr("ref") else { continue };
        let range: RangeRef = r.parse().map_err(|e: sheetdok_model::ReferenceError| {
            PackageError::invalid_reference(doc.part.as_str(), e.to_string())
        })?;

        // First-declared region wins
        if let Some(existing) = merges.iter().find(|m| m.range.intersects(&range)) {
            warnings.push(
                Warning::new(
                    WarningKind::MergeConflict,
                    format!("merge {} overlaps earlier merge {}; dropped", range, existing.range),
                )
                .with_scope(scope)
                .with_location(range.to_string())
                .with_raw(doc.raw(merge)),
            );
            continue;
        }
        merges.push(MergeRegion::new(range));
    }
    Ok(merges)
}

fn parse_validations(
    doc: &XmlDocument,
    validations: &XmlElement,
    scope: &str,
    warnings: &mut Warnings,
) -> Vec<DataValidationRule> {
    let mut rules = Vec::new();
    for dv in validations.children_named("dataValidation") {
        let sqref = dv.attr("sqref").unwrap_or_default();
        let kind = ValidationKind::parse(dv.attr("type"));
        if let ValidationKind::Other(ref other) = kind {
            warnings.push(
                Warning::new(
                    WarningKind::Unsupported,
                    format!("data validation type '{}' is not recognized", other),
                )
                .with_scope(scope)
                .with_location(sqref)
                .with_element("dataValidation")
                .with_raw(doc.raw(dv)),
            );
        }

        let formula1 = non_empty(dv.child_text("formula1"));
        let formula2 = non_empty(dv.child_text("formula2"));
        let list_source = match (&kind, &formula1) {
            (ValidationKind::List, Some(f))
                if !f.starts_with('"') && !parse_sheet_scoped_ranges(f).is_empty() =>
            {
                Some(f.clone())
            }
            _ => None,
        };

        rules.push(DataValidationRule {
            ranges: parse_sqref(sqref),
            kind,
            operator: dv.attr("operator").map(str::to_string),
            formula1,
            formula2,
            list_source,
            allow_blank: dv.attr_bool("allowBlank", false),
            show_error_message: dv.attr_bool("showErrorMessage", false),
            prompt_title: dv.attr("promptTitle").map(str::to_string),
            prompt: dv.attr("prompt").map(str::to_string),
            error_title: dv.attr("errorTitle").map(str::to_string),
            error: dv.attr("error").map(str::to_string),
        });
    }
    rules
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn parse_cols(cols: &XmlElement, layout: &mut SheetLayout) {
    for col in cols.children_named("col") {
        let (Some(min), Some(max)) = (col.attr_parse::<u32>("min"), col.attr_parse::<u32>("max"))
        else {
            continue;
        };
        let width = col.attr_parse::<f64>("width");
        let hidden = col.attr_bool("hidden", false);
        for idx in min.max(1)..=max.min(MAX_COL) {
            if let Some(w) = width {
                layout.col_widths.insert(idx, w);
            }
            if hidden {
                layout.hidden_cols.insert(idx);
            }
        }
    }
}

fn parse_format_defaults(format: &XmlElement, layout: &mut SheetLayout) {
    layout.default_col_width = format
        .attr_parse("defaultColWidth")
        .or_else(|| format.attr_parse::<f64>("baseColWidth").map(|w| w + 0.71));
    layout.default_row_height = format.attr_parse("defaultRowHeight");
}

fn parse_freeze(views: &XmlElement) -> Option<FreezePane> {
    let pane = views.child("sheetView")?.child("pane")?;
    if !matches!(pane.attr("state"), Some("frozen") | Some("frozenSplit")) {
        return None;
    }
    let split = |name: &str| pane.attr_parse::<f64>(name).map(|v| v as u32).unwrap_or(0);
    Some(FreezePane {
        x_split: split("xSplit"),
        y_split: split("ySplit"),
        top_left_cell: pane.attr("topLeftCell").and_then(|c| c.parse().ok()),
    })
}

fn parse_print_settings(root: &XmlElement) -> PrintSettings {
    let attrs = |name: &str| -> BTreeMap<String, String> {
        root.child(name)
            .map(|e| {
                e.attr_map()
                    .into_iter()
                    .filter(|(k, _)| !k.ends_with(":id"))
                    .collect()
            })
            .unwrap_or_default()
    };
    let breaks = |name: &str| -> Vec<u32> {
        root.child(name)
            .map(|b| b.children_named("brk").filter_map(|brk| brk.attr_parse("id")).collect())
            .unwrap_or_default()
    };
    let header_footer = root.child("headerFooter");

    PrintSettings {
        page_setup: attrs("pageSetup"),
        margins: attrs("pageMargins"),
        options: attrs("printOptions"),
        header: header_footer.and_then(|h| non_empty(h.child_text("oddHeader"))),
        footer: header_footer.and_then(|h| non_empty(h.child_text("oddFooter"))),
        row_breaks: breaks("rowBreaks"),
        col_breaks: breaks("colBreaks"),
        ..Default::default()
    }
}
