//! Workbook part (`xl/workbook.xml`): sheet list, defined names, calc settings

use sheetdok_model::reference::parse_sheet_scoped_ranges;
use sheetdok_model::{DefinedName, Visibility};

use crate::error::Result;
use crate::xml::XmlDocument;

/// One `<sheet>` entry, before its part is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Position in the sheet list (0-indexed), the `localSheetId` key
    pub index: usize,
    pub name: String,
    pub sheet_id: Option<u32>,
    /// Relationship id pointing at the sheet part
    pub rel_id: Option<String>,
    pub visibility: Visibility,
}

/// Parsed workbook part
#[derive(Debug, Clone, Default)]
pub struct WorkbookPart {
    pub sheets: Vec<SheetEntry>,
    pub defined_names: Vec<DefinedName>,
    pub calc_mode: Option<String>,
    pub calc_id: Option<String>,
}

impl WorkbookPart {
    pub fn parse(part: &str, source: String) -> Result<Self> {
        let doc = XmlDocument::parse(part, source)?;
        let root = &doc.root;

        let sheets = root
            .child("sheets")
            .map(|s| {
                s.children_named("sheet")
                    .enumerate()
                    .map(|(index, sheet)| SheetEntry {
                        index,
                        name: sheet
                            .attr("name")
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("Sheet{}", index + 1)),
                        sheet_id: sheet.attr_parse("sheetId"),
                        rel_id: sheet.attr("id").map(str::to_string),
                        visibility: Visibility::from_state(sheet.attr("state")),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let defined_names = root
            .child("definedNames")
            .map(|d| {
                d.children_named("definedName")
                    .map(|dn| {
                        let value = dn.text().trim().to_string();
                        DefinedName {
                            name: dn.attr("name").unwrap_or_default().to_string(),
                            ranges: parse_sheet_scoped_ranges(&value),
                            value,
                            local_sheet: dn.attr_parse("localSheetId"),
                            hidden: dn.attr_bool("hidden", false),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let calc = root.child("calcPr");
        Ok(Self {
            sheets,
            defined_names,
            calc_mode: calc.and_then(|c| c.attr("calcMode")).map(str::to_string),
            calc_id: calc.and_then(|c| c.attr("calcId")).map(str::to_string),
        })
    }

    /// Built-in names of one kind (`_xlnm.Print_Area`) local to a sheet
    pub fn builtin_for_sheet<'a>(
        &'a self,
        builtin: &'a str,
        sheet: usize,
    ) -> impl Iterator<Item = &'a DefinedName> {
        self.defined_names
            .iter()
            .filter(move |n| n.name == builtin && n.local_sheet == Some(sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Data" sheetId="1" r:id="rId1"/>
    <sheet name="Secret" sheetId="2" state="veryHidden" r:id="rId2"/>
  </sheets>
  <definedNames>
    <definedName name="_xlnm.Print_Area" localSheetId="0">Data!$A$1:$C$10</definedName>
    <definedName name="Rates" hidden="1">'Secret'!$B$2:$B$5</definedName>
  </definedNames>
  <calcPr calcId="191029" calcMode="manual"/>
</workbook>"#;

    #[test]
    fn test_parse_sheets_and_names() {
        let wb = WorkbookPart::parse("xl/workbook.xml", WORKBOOK.to_string()).unwrap();

        assert_eq!(wb.sheets.len(), 2);
        assert_eq!(wb.sheets[0].name, "Data");
        assert_eq!(wb.sheets[0].rel_id.as_deref(), Some("rId1"));
        assert_eq!(wb.sheets[1].visibility, Visibility::VeryHidden);

        assert_eq!(wb.defined_names.len(), 2);
        assert!(wb.defined_names[1].hidden);
        assert_eq!(wb.defined_names[1].ranges[0].to_string(), "B2:B5");

        let areas: Vec<_> = wb.builtin_for_sheet("_xlnm.Print_Area", 0).collect();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].ranges[0].to_string(), "A1:C10");

        assert_eq!(wb.calc_mode.as_deref(), Some("manual"));
        assert_eq!(wb.calc_id.as_deref(), Some("191029"));
    }
}
