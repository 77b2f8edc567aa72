//! Workbook root type

use serde::Serialize;

use crate::reference::RangeRef;
use crate::sheet::Sheet;
use crate::style::StyleTable;
use crate::warning::{Warning, Warnings};

/// Facts about the source package itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    pub file_name: String,
    pub file_size: u64,
    /// Lowercase hex SHA-256 of the package bytes
    pub sha256: String,
    pub zip_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calc_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calc_id: Option<String>,
}

/// A `<definedName>` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinedName {
    pub name: String,
    /// Refers-to text as written
    pub value: String,
    /// Index of the sheet the name is local to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_sheet: Option<usize>,
    pub hidden: bool,
    /// Plain cell ranges found in `value`
    pub ranges: Vec<RangeRef>,
}

impl DefinedName {
    /// Built-in names such as `_xlnm.Print_Area`
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("_xlnm.")
    }
}

/// A fully assembled workbook
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    /// Title used in rendered output (the file stem)
    pub title: String,
    pub metadata: SourceMetadata,
    pub styles: StyleTable,
    pub defined_names: Vec<DefinedName>,
    pub sheets: Vec<Sheet>,
    /// Workbook-level warnings
    pub warnings: Warnings,
}

impl Workbook {
    /// Find a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Workbook warnings followed by every sheet's, in sheet order
    pub fn all_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings
            .iter()
            .chain(self.sheets.iter().flat_map(|s| s.warnings.iter()))
    }

    /// Names local to a sheet
    pub fn names_for_sheet(&self, index: usize) -> Vec<&DefinedName> {
        self.defined_names
            .iter()
            .filter(|n| n.local_sheet == Some(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warning::WarningKind;

    #[test]
    fn test_all_warnings_order() {
        let mut wb = Workbook::default();
        wb.warnings
            .push(Warning::new(WarningKind::Unsupported, "workbook"));
        let mut s1 = Sheet {
            name: "A".to_string(),
            ..Default::default()
        };
        s1.warnings
            .push(Warning::new(WarningKind::MergeConflict, "sheet a"));
        let mut s2 = Sheet {
            name: "B".to_string(),
            index: 1,
            ..Default::default()
        };
        s2.warnings
            .push(Warning::new(WarningKind::StyleResolution, "sheet b"));
        wb.sheets = vec![s1, s2];

        let reasons: Vec<_> = wb.all_warnings().map(|w| w.reason.as_str()).collect();
        assert_eq!(reasons, vec!["workbook", "sheet a", "sheet b"]);
        assert!(wb.sheet("B").is_some());
    }
}
