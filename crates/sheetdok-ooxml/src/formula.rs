//! Shared formula translation
//!
//! A shared formula is written once on its master cell (`<f t="shared"
//! ref="B2:B9" si="0">A2*2</f>`) and referenced by index from the other
//! cells of the range. Each dependent cell gets the master text with every
//! relative A1 reference moved by the cell's offset from the master.

use once_cell::sync::Lazy;

use regex::Regex;
use sheetdok_model::{column_index, column_letters, CellRef};

/// Shift the relative references of `formula` by `rows` and `cols`
///
/// `$`-anchored components stay put, text inside string literals is left
/// untouched, and tokens that look like references but are function names
/// (`LOG10(`) or part of a longer identifier are skipped. A reference moved
/// off the sheet becomes `#REF!`.
pub fn shift_formula(formula: &str, rows: i64, cols: i64) -> String {
    if rows == 0 && cols == 0 {
        return formula.to_string();
    }

    let mut out = String::with_capacity(formula.len() + 8);
    for (idx, segment) in formula.split('"').enumerate() {
        if idx > 0 {
            out.push('"');
        }
        // Odd segments sit between quotes
        if idx % 2 == 1 {
            out.push_str(segment);
        } else {
            out.push_str(&shift_segment(segment, rows, cols));
        }
    }
    out
}

static REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)([A-Za-z]{1,3})(\$?)([0-9]+)").unwrap());

fn shift_segment(segment: &str, rows: i64, cols: i64) -> String {
    let re = &*REF_RE;
    let mut out = String::with_capacity(segment.len());
    let mut last = 0;

    for caps in re.captures_iter(segment) {
        let Some(whole) = caps.get(0) else { continue };
        let before = segment[..whole.start()].chars().next_back();
        let after = segment[whole.end()..].chars().next();

        let embedded = before.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        let call_or_name = after.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '(');
        if embedded || call_or_name {
            continue;
        }

        let col_abs = !caps[1].is_empty();
        let row_abs = !caps[3].is_empty();
        let (Some(col), Ok(row)) = (column_index(&caps[2]), caps[4].parse::<u32>()) else {
            continue;
        };
        if row == 0 {
            continue;
        }

        out.push_str(&segment[last..whole.start()]);
        let shifted = CellRef::new(row, col).offset(
            if row_abs { 0 } else { rows },
            if col_abs { 0 } else { cols },
        );
        match shifted {
            Some(cell) => {
                out.push_str(&caps[1]);
                out.push_str(&column_letters(cell.col));
                out.push_str(&caps[3]);
                out.push_str(&cell.row.to_string());
            }
            None => out.push_str("#REF!"),
        }
        last = whole.end();
    }

    out.push_str(&segment[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_shift() {
        assert_eq!(shift_formula("A2*2", 1, 0), "A3*2");
        assert_eq!(shift_formula("SUM(A1:B1)", 2, 1), "SUM(B3:C3)");
    }

    #[test]
    fn test_absolute_parts_stay() {
        assert_eq!(shift_formula("$A$1+A1", 3, 3), "$A$1+D4");
        assert_eq!(shift_formula("$A1+A$1", 1, 1), "$A2+B$1");
    }

    #[test]
    fn test_string_literals_untouched() {
        assert_eq!(
            shift_formula(r#"IF(A1="B2","B2",A1)"#, 1, 0),
            r#"IF(A2="B2","B2",A2)"#
        );
    }

    #[test]
    fn test_function_names_not_shifted() {
        assert_eq!(shift_formula("LOG10(A1)", 1, 0), "LOG10(A2)");
        assert_eq!(shift_formula("ATAN2(A1,B1)", 0, 1), "ATAN2(B1,C1)");
    }

    #[test]
    fn test_sheet_qualified_reference() {
        assert_eq!(shift_formula("Sheet2!A1*2", 1, 0), "Sheet2!A2*2");
    }

    #[test]
    fn test_off_sheet_is_ref_error() {
        assert_eq!(shift_formula("A1", -1, 0), "#REF!");
    }

    #[test]
    fn test_zero_offset_is_identity() {
        assert_eq!(shift_formula("anything A1", 0, 0), "anything A1");
    }
}
