//! A1-style cell and range references
//!
//! Coordinates are 1-indexed: `A1` is row 1, column 1. Ranges are always
//! normalized so that `start` is the top-left and `end` the bottom-right cell.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Largest row index allowed by the SpreadsheetML format
pub const MAX_ROW: u32 = 1_048_576;

/// Largest column index allowed by the SpreadsheetML format (`XFD`)
pub const MAX_COL: u32 = 16_384;

/// Errors produced while parsing references
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Not a valid A1 cell reference
    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    /// Not a valid A1 range reference
    #[error("Invalid range reference: {0}")]
    InvalidRange(String),
}

/// A single cell coordinate
///
/// Ordering is row-major, which is the order cells are stored in a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellRef {
    /// Row number (1-indexed)
    pub row: u32,
    /// Column number (1-indexed)
    pub col: u32,
}

impl CellRef {
    /// Create a reference from 1-indexed row and column
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Offset this reference, returning `None` when it leaves the sheet
    pub fn offset(&self, rows: i64, cols: i64) -> Option<Self> {
        let row = i64::from(self.row) + rows;
        let col = i64::from(self.col) + cols;
        if (1..=i64::from(MAX_ROW)).contains(&row) && (1..=i64::from(MAX_COL)).contains(&col) {
            Some(Self::new(row as u32, col as u32))
        } else {
            None
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReferenceError::InvalidCell(s.to_string());
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('$').unwrap_or(trimmed);

        let split = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (letters, rest) = body.split_at(split);
        let digits = rest.strip_prefix('$').unwrap_or(rest);

        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let col = column_index(letters).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 || row > MAX_ROW {
            return Err(invalid());
        }

        Ok(Self::new(row, col))
    }
}

/// A rectangular cell range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RangeRef {
    /// Top-left cell
    pub start: CellRef,
    /// Bottom-right cell
    pub end: CellRef,
}

impl RangeRef {
    /// Create a normalized range from two corners
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// A range covering a single cell
    pub fn single(cell: CellRef) -> Self {
        Self::new(cell, cell)
    }

    /// Check whether a cell lies inside the range
    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Check whether two ranges share at least one cell
    pub fn intersects(&self, other: &RangeRef) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Cells shared by two ranges, if any
    pub fn intersection(&self, other: &RangeRef) -> Option<RangeRef> {
        self.intersects(other).then(|| RangeRef {
            start: CellRef::new(
                self.start.row.max(other.start.row),
                self.start.col.max(other.start.col),
            ),
            end: CellRef::new(
                self.end.row.min(other.end.row),
                self.end.col.min(other.end.col),
            ),
        })
    }

    /// Number of rows covered
    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns covered
    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Whether this range is a single cell
    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    /// Smallest range covering both ranges
    pub fn union(&self, other: &RangeRef) -> RangeRef {
        RangeRef {
            start: CellRef::new(
                self.start.row.min(other.start.row),
                self.start.col.min(other.start.col),
            ),
            end: CellRef::new(
                self.end.row.max(other.end.row),
                self.end.col.max(other.end.col),
            ),
        }
    }

    /// Iterate over every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col)))
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for RangeRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once(':') {
            Some((a, b)) => {
                let start: CellRef = a
                    .parse()
                    .map_err(|_| ReferenceError::InvalidRange(s.to_string()))?;
                let end: CellRef = b
                    .parse()
                    .map_err(|_| ReferenceError::InvalidRange(s.to_string()))?;
                Ok(RangeRef::new(start, end))
            }
            None => trimmed
                .parse::<CellRef>()
                .map(RangeRef::single)
                .map_err(|_| ReferenceError::InvalidRange(s.to_string())),
        }
    }
}

/// Convert a 1-indexed column number to letters (1 -> `A`, 27 -> `AA`)
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert column letters to a 1-indexed column number
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut value: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        value = value * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    (value <= MAX_COL).then_some(value)
}

/// Parse a space-separated `sqref` list, skipping malformed entries
pub fn parse_sqref(sqref: &str) -> Vec<RangeRef> {
    sqref
        .split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect()
}

/// Parse a defined-name value such as `'Sheet 1'!$A$1:$C$3,$D$5`
///
/// Every comma-separated part may carry its own sheet prefix. Parts that are
/// not plain cell ranges (whole rows/columns, constants, formulas) are skipped.
pub fn parse_sheet_scoped_ranges(value: &str) -> Vec<RangeRef> {
    split_outside_quotes(value, ',')
        .into_iter()
        .filter_map(|part| {
            let part = part.trim();
            let payload = match part.rfind('!') {
                Some(idx) => &part[idx + 1..],
                None => part,
            };
            payload.parse().ok()
        })
        .collect()
}

/// Split on a delimiter, ignoring delimiters inside single-quoted sheet names
fn split_outside_quotes(value: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, c) in value.char_indices() {
        if c == '\'' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            parts.push(&value[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    parts.push(&value[start..]);
    parts
}
