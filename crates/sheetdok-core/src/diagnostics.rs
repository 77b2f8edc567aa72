//! Warning fan-in and strict-mode escalation
//!
//! Warnings are produced in three places: workbook assembly, sheet assembly
//! and connector inference. [`collect`] merges them into a single sink in a
//! fixed order so every rendering lists them identically.

use std::fmt::Write as _;

use serde::Serialize;
use sheetdok_model::{Warning, WarningKind, Warnings, Workbook};
use thiserror::Error;

use crate::convert::Analysis;

/// Strict-mode failure listing every unsupported element
///
/// # Example
///
/// ```
/// use sheetdok_core::diagnostics::{check_strict, StructuredFailure};
/// use sheetdok_model::{Warning, WarningKind, Warnings};
///
/// let mut warnings = Warnings::new();
/// warnings.push(Warning::new(WarningKind::Unsupported, "not modeled").with_element("foo"));
///
/// let failure: StructuredFailure = check_strict(&warnings).unwrap_err();
/// assert_eq!(failure.unsupported.len(), 1);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{}", describe(.unsupported))]
pub struct StructuredFailure {
    /// Every `Unsupported` warning, in collection order
    pub unsupported: Vec<Warning>,
}

impl StructuredFailure {
    pub fn len(&self) -> usize {
        self.unsupported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// Failure as pretty-printed JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn describe(unsupported: &[Warning]) -> String {
    let mut text = format!(
        "strict mode: {} unsupported element(s) found",
        unsupported.len()
    );
    for warning in unsupported {
        let _ = write!(text, "\n  - {}", warning);
    }
    text
}

/// Merge all warnings: workbook-level first, then per sheet in sheet order,
/// assembly warnings before inference warnings
pub fn collect(workbook: &Workbook, analysis: &Analysis) -> Warnings {
    let mut all = Warnings::new();
    all.extend(workbook.warnings.iter().cloned());
    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        all.extend(sheet.warnings.iter().cloned());
        if let Some(sheet_analysis) = analysis.sheets.get(idx) {
            all.extend(sheet_analysis.warnings.iter().cloned());
        }
    }
    all
}

/// Fail if any warning is unsupported
pub fn check_strict(warnings: &Warnings) -> Result<(), StructuredFailure> {
    let unsupported: Vec<Warning> = warnings.unsupported().cloned().collect();
    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(StructuredFailure { unsupported })
    }
}

/// Warning count per kind, in reporting order, including zero counts
pub fn counts_by_kind(warnings: &Warnings) -> Vec<(WarningKind, usize)> {
    WarningKind::all()
        .iter()
        .map(|&kind| (kind, warnings.count(kind)))
        .collect()
}
