//! Worksheet content: cells, merges, validations and layout

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::drawing::{Connector, Shape};
use crate::reference::{CellRef, RangeRef};
use crate::warning::Warnings;

/// Sheet visibility state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

impl Visibility {
    /// Parse the `state` attribute of a `<sheet>` element
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some("hidden") => Self::Hidden,
            Some("veryHidden") => Self::VeryHidden,
            _ => Self::Visible,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::VeryHidden => "veryHidden",
        }
    }

    pub fn is_hidden(&self) -> bool {
        !matches!(self, Self::Visible)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of value stored in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Numeric value (`t="n"` or no type)
    Number,
    /// Shared string table entry (`t="s"`)
    SharedString,
    /// Inline rich or plain string (`t="inlineStr"`)
    InlineString,
    /// String result of a formula (`t="str"`)
    FormulaString,
    Boolean,
    Error,
    /// ISO 8601 date (`t="d"`)
    Date,
}

impl CellKind {
    /// Map the `t` attribute of a `<c>` element
    pub fn from_type_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => Self::SharedString,
            Some("inlineStr") => Self::InlineString,
            Some("str") => Self::FormulaString,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            Some("d") => Self::Date,
            _ => Self::Number,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::SharedString => "shared_string",
            Self::InlineString => "inline_string",
            Self::FormulaString => "formula_string",
            Self::Boolean => "boolean",
            Self::Error => "error",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single materialized cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub coord: CellRef,
    pub kind: CellKind,
    /// Resolved stored value (shared strings already looked up)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Formula text without the leading `=`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Last computed value; only set for formula cells
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_value: Option<String>,
    /// Key into the workbook style table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<u32>,
}

impl Cell {
    /// Create a value cell
    pub fn new(coord: CellRef, kind: CellKind, value: Option<String>) -> Self {
        Self {
            coord,
            kind,
            value,
            formula: None,
            cached_value: None,
            style_id: None,
        }
    }

    /// Whether the cell carries a value or a formula
    pub fn has_content(&self) -> bool {
        self.formula.is_some() || self.value.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Text as a reader would see it: the cached value for formulas,
    /// the stored value otherwise
    pub fn display_value(&self) -> &str {
        if self.formula.is_some() {
            self.cached_value.as_deref().unwrap_or("")
        } else {
            self.value.as_deref().unwrap_or("")
        }
    }

    /// Style id, defaulting to 0
    pub fn style(&self) -> u32 {
        self.style_id.unwrap_or(0)
    }
}

/// A merged cell region; the top-left anchor carries the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MergeRegion {
    pub range: RangeRef,
}

impl MergeRegion {
    pub fn new(range: RangeRef) -> Self {
        Self { range }
    }

    pub fn anchor(&self) -> CellRef {
        self.range.start
    }

    /// Whether a cell is covered but is not the anchor
    pub fn is_interior(&self, cell: CellRef) -> bool {
        cell != self.range.start && self.range.contains(cell)
    }
}

/// Data validation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationKind {
    Any,
    Whole,
    Decimal,
    List,
    Date,
    Time,
    TextLength,
    Custom,
    /// A type this converter does not know; kept verbatim
    Other(String),
}

impl ValidationKind {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("none") | Some("") => Self::Any,
            Some("whole") => Self::Whole,
            Some("decimal") => Self::Decimal,
            Some("list") => Self::List,
            Some("date") => Self::Date,
            Some("time") => Self::Time,
            Some("textLength") => Self::TextLength,
            Some("custom") => Self::Custom,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "any",
            Self::Whole => "whole",
            Self::Decimal => "decimal",
            Self::List => "list",
            Self::Date => "date",
            Self::Time => "time",
            Self::TextLength => "textLength",
            Self::Custom => "custom",
            Self::Other(kind) => kind,
        }
    }
}

/// One `<dataValidation>` rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataValidationRule {
    pub ranges: Vec<RangeRef>,
    pub kind: ValidationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula2: Option<String>,
    /// Set when a list rule draws its items from a cell range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_source: Option<String>,
    pub allow_blank: bool,
    pub show_error_message: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Page setup and print layout
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrintSettings {
    /// From `_xlnm.Print_Area`
    pub print_areas: Vec<RangeRef>,
    /// Raw `_xlnm.Print_Titles` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_titles: Option<String>,
    /// `pageSetup` attributes (orientation, paperSize, scale, fitToWidth, ...)
    pub page_setup: BTreeMap<String, String>,
    /// `pageMargins` attributes
    pub margins: BTreeMap<String, String>,
    /// `printOptions` attributes
    pub options: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    pub row_breaks: Vec<u32>,
    pub col_breaks: Vec<u32>,
}

impl PrintSettings {
    pub fn is_empty(&self) -> bool {
        self.print_areas.is_empty()
            && self.print_titles.is_none()
            && self.page_setup.is_empty()
            && self.margins.is_empty()
            && self.options.is_empty()
            && self.header.is_none()
            && self.footer.is_none()
            && self.row_breaks.is_empty()
            && self.col_breaks.is_empty()
    }
}

/// Frozen pane split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreezePane {
    /// Frozen column count
    pub x_split: u32,
    /// Frozen row count
    pub y_split: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_left_cell: Option<CellRef>,
}

/// Column/row sizing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetLayout {
    /// Custom widths in character units, keyed by 1-indexed column
    pub col_widths: BTreeMap<u32, f64>,
    /// Custom heights in points, keyed by 1-indexed row
    pub row_heights: BTreeMap<u32, f64>,
    pub hidden_cols: BTreeSet<u32>,
    pub hidden_rows: BTreeSet<u32>,
    /// Default width in character units, when declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_col_width: Option<f64>,
    /// Default height in points, when declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_row_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeze: Option<FreezePane>,
}

/// One worksheet
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sheet {
    /// Position in the workbook (0-indexed)
    pub index: usize,
    pub name: String,
    /// Package part path (`xl/worksheets/sheet1.xml`)
    pub path: String,
    pub visibility: Visibility,
    /// Declared `<dimension ref>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<RangeRef>,
    /// Sparse cells, sorted row-major, coordinates unique
    pub cells: Vec<Cell>,
    /// Pairwise non-overlapping merge regions
    pub merges: Vec<MergeRegion>,
    pub validations: Vec<DataValidationRule>,
    pub print: PrintSettings,
    pub layout: SheetLayout,
    pub shapes: Vec<Shape>,
    pub connectors: Vec<Connector>,
    /// Warnings recorded while assembling this sheet
    pub warnings: Warnings,
}

impl Sheet {
    /// Find a cell by coordinate
    pub fn cell(&self, coord: CellRef) -> Option<&Cell> {
        self.cells
            .binary_search_by(|c| c.coord.cmp(&coord))
            .ok()
            .map(|idx| &self.cells[idx])
    }

    /// Merge region covering a cell, if any
    pub fn merge_at(&self, coord: CellRef) -> Option<&MergeRegion> {
        self.merges.iter().find(|m| m.range.contains(coord))
    }

    /// Range spanned by materialized cells and merges
    pub fn used_range(&self) -> Option<RangeRef> {
        let cells = self.cells.iter().map(|c| RangeRef::single(c.coord));
        let merges = self.merges.iter().map(|m| m.range);
        cells.chain(merges).reduce(|acc, r| acc.union(&r))
    }

    /// Ranges a rendering should cover: the print areas clipped to the
    /// used range, or the used range when no print area is declared
    pub fn base_ranges(&self) -> Vec<RangeRef> {
        let Some(used) = self.used_range() else {
            return Vec::new();
        };
        if self.print.print_areas.is_empty() {
            return vec![used];
        }
        self.print
            .print_areas
            .iter()
            .filter_map(|area| area.intersection(&used))
            .collect()
    }

    /// Rows that contain at least one cell with content
    pub fn content_rows(&self) -> Vec<u32> {
        let rows: BTreeSet<u32> = self
            .cells
            .iter()
            .filter(|c| c.has_content())
            .map(|c| c.coord.row)
            .collect();
        rows.into_iter().collect()
    }

    /// Cells with a formula, in row-major order
    pub fn formula_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.formula.is_some())
    }

    pub fn is_col_hidden(&self, col: u32) -> bool {
        self.layout.hidden_cols.contains(&col)
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.layout.hidden_rows.contains(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(a1: &str, value: &str) -> Cell {
        Cell::new(
            a1.parse().unwrap(),
            CellKind::Number,
            Some(value.to_string()),
        )
    }

    #[test]
    fn test_cell_lookup_and_used_range() {
        let sheet = Sheet {
            cells: vec![cell("A1", "1"), cell("C2", "2")],
            merges: vec![MergeRegion::new("D4:E5".parse().unwrap())],
            ..Default::default()
        };
        assert!(sheet.cell("C2".parse().unwrap()).is_some());
        assert!(sheet.cell("B2".parse().unwrap()).is_none());
        assert_eq!(sheet.used_range().unwrap().to_string(), "A1:E5");
    }

    #[test]
    fn test_merge_interior() {
        let merge = MergeRegion::new("A1:B2".parse().unwrap());
        assert!(!merge.is_interior("A1".parse().unwrap()));
        assert!(merge.is_interior("B2".parse().unwrap()));
        assert!(!merge.is_interior("C1".parse().unwrap()));
    }

    #[test]
    fn test_display_value_prefers_cache_for_formulas() {
        let mut c = cell("C1", "ignored");
        c.formula = Some("B1*2".to_string());
        c.cached_value = Some("200".to_string());
        assert_eq!(c.display_value(), "200");
        assert!(c.has_content());
    }

    #[test]
    fn test_visibility_and_kinds() {
        assert_eq!(Visibility::from_state(Some("veryHidden")), Visibility::VeryHidden);
        assert!(Visibility::Hidden.is_hidden());
        assert_eq!(CellKind::from_type_attr(Some("s")), CellKind::SharedString);
        assert_eq!(CellKind::from_type_attr(None), CellKind::Number);
        assert_eq!(ValidationKind::parse(Some("weird")).as_str(), "weird");
    }
}
