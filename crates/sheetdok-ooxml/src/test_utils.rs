//! Shared test utilities for sheetdok crates
//!
//! [`XlsxBuilder`] assembles small but structurally complete XLSX packages in
//! memory so tests can exercise the whole load path without fixture files.
//!
//! # Example
//! ```
//! use sheetdok_ooxml::test_utils::XlsxBuilder;
//!
//! let bytes = XlsxBuilder::new()
//!     .shared_strings(&["Revenue"])
//!     .sheet("Data", r#"<sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData>"#)
//!     .build()?;
//! assert!(!bytes.is_empty());
//! # Ok::<(), sheetdok_ooxml::PackageError>(())
//! ```

use crate::archive::PackageArchive;
use crate::content_types::{WORKBOOK_MACRO_MAIN, WORKBOOK_MAIN};
use crate::error::Result;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Namespace declarations for drawing fixtures
pub const DRAWING_NAMESPACES: &str = r#"xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

#[derive(Debug, Clone)]
enum SheetKind {
    Worksheet {
        body: String,
        drawing: Option<String>,
        drawing_rels: Option<String>,
    },
    Chartsheet,
}

#[derive(Debug, Clone)]
struct SheetFixture {
    name: String,
    state: Option<String>,
    kind: SheetKind,
}

/// Builder for in-memory XLSX packages
#[derive(Debug, Clone, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetFixture>,
    shared_strings: Option<Vec<String>>,
    styles: Option<String>,
    defined_names: Vec<String>,
    parts: Vec<(String, Vec<u8>)>,
    creator: Option<String>,
    macro_enabled: bool,
}

impl XlsxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared string table entries, in index order
    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = Some(strings.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Full `styles.xml` content
    pub fn styles(mut self, xml: impl Into<String>) -> Self {
        self.styles = Some(xml.into());
        self
    }

    /// A visible worksheet; `body` is the inner XML of `<worksheet>`
    pub fn sheet(self, name: &str, body: &str) -> Self {
        self.sheet_with_state(name, None, body)
    }

    /// A worksheet with a `state` attribute (`hidden`, `veryHidden`)
    pub fn sheet_with_state(mut self, name: &str, state: Option<&str>, body: &str) -> Self {
        self.sheets.push(SheetFixture {
            name: name.to_string(),
            state: state.map(str::to_string),
            kind: SheetKind::Worksheet {
                body: body.to_string(),
                drawing: None,
                drawing_rels: None,
            },
        });
        self
    }

    /// Attach a drawing to the most recently added worksheet
    ///
    /// `anchors` is the inner XML of `<xdr:wsDr>`; `rels` the inner XML of the
    /// drawing's `<Relationships>`, if it has any.
    pub fn drawing(mut self, anchors: &str, rels: Option<&str>) -> Self {
        if let Some(SheetFixture {
            kind: SheetKind::Worksheet {
                drawing,
                drawing_rels,
                ..
            },
            ..
        }) = self.sheets.last_mut()
        {
            *drawing = Some(anchors.to_string());
            *drawing_rels = rels.map(str::to_string);
        }
        self
    }

    /// A chartsheet entry
    pub fn chartsheet(mut self, name: &str) -> Self {
        self.sheets.push(SheetFixture {
            name: name.to_string(),
            state: None,
            kind: SheetKind::Chartsheet,
        });
        self
    }

    /// A `<definedName>`; `local_sheet` is the 0-indexed sheet position
    pub fn defined_name(mut self, name: &str, local_sheet: Option<usize>, value: &str) -> Self {
        let local = local_sheet
            .map(|i| format!(r#" localSheetId="{}""#, i))
            .unwrap_or_default();
        self.defined_names.push(format!(
            r#"<definedName name="{}"{}>{}</definedName>"#,
            name,
            local,
            escape(value)
        ));
        self
    }

    /// An arbitrary extra part (media, ...)
    pub fn part(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.parts.push((path.to_string(), bytes));
        self
    }

    /// `docProps/core.xml` with a creator
    pub fn creator(mut self, creator: &str) -> Self {
        self.creator = Some(creator.to_string());
        self
    }

    /// Declare the workbook as macro-enabled
    pub fn macro_enabled(mut self) -> Self {
        self.macro_enabled = true;
        self
    }

    /// Assemble the package
    pub fn archive(&self) -> PackageArchive {
        let mut archive = PackageArchive::new();
        let mut overrides = String::new();
        let mut root_rels = format!(
            r#"<Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/>"#,
            REL_NS
        );
        let mut workbook_rels = String::new();
        let mut sheet_entries = String::new();

        for (idx, sheet) in self.sheets.iter().enumerate() {
            let n = idx + 1;
            let state = sheet
                .state
                .as_deref()
                .map(|s| format!(r#" state="{}""#, s))
                .unwrap_or_default();
            sheet_entries.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
                escape(&sheet.name),
                n,
                state,
                n
            ));

            match &sheet.kind {
                SheetKind::Worksheet {
                    body,
                    drawing,
                    drawing_rels,
                } => {
                    let path = format!("xl/worksheets/sheet{}.xml", n);
                    workbook_rels.push_str(&format!(
                        r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                        n, REL_NS, n
                    ));
                    let mut body = body.clone();
                    if let Some(anchors) = drawing {
                        body.push_str(r#"<drawing r:id="rIdDrawing"/>"#);
                        archive.set_string(
                            format!("xl/worksheets/_rels/sheet{}.xml.rels", n),
                            relationships(&format!(
                                r#"<Relationship Id="rIdDrawing" Type="{}/drawing" Target="../drawings/drawing{}.xml"/>"#,
                                REL_NS, n
                            )),
                        );
                        archive.set_string(
                            format!("xl/drawings/drawing{}.xml", n),
                            format!(r#"<xdr:wsDr {}>{}</xdr:wsDr>"#, DRAWING_NAMESPACES, anchors),
                        );
                        if let Some(rels) = drawing_rels {
                            archive.set_string(
                                format!("xl/drawings/_rels/drawing{}.xml.rels", n),
                                relationships(rels),
                            );
                        }
                    }
                    archive.set_string(
                        path,
                        format!(
                            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}">{}</worksheet>"#,
                            MAIN_NS, REL_NS, body
                        ),
                    );
                    overrides.push_str(&format!(
                        r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                        n
                    ));
                }
                SheetKind::Chartsheet => {
                    workbook_rels.push_str(&format!(
                        r#"<Relationship Id="rId{}" Type="{}/chartsheet" Target="chartsheets/sheet{}.xml"/>"#,
                        n, REL_NS, n
                    ));
                    archive.set_string(
                        format!("xl/chartsheets/sheet{}.xml", n),
                        format!(
                            r#"<chartsheet xmlns="{}" xmlns:r="{}"><sheetViews><sheetView workbookViewId="0"/></sheetViews></chartsheet>"#,
                            MAIN_NS, REL_NS
                        ),
                    );
                }
            }
        }

        if let Some(strings) = &self.shared_strings {
            let items: String = strings
                .iter()
                .map(|s| format!("<si><t>{}</t></si>", escape(s)))
                .collect();
            archive.set_string(
                "xl/sharedStrings.xml",
                format!(
                    r#"<sst xmlns="{}" count="{}" uniqueCount="{}">{}</sst>"#,
                    MAIN_NS,
                    strings.len(),
                    strings.len(),
                    items
                ),
            );
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rIdStrings" Type="{}/sharedStrings" Target="sharedStrings.xml"/>"#,
                REL_NS
            ));
        }

        if let Some(styles) = &self.styles {
            archive.set_string("xl/styles.xml", styles.clone());
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rIdStyles" Type="{}/styles" Target="styles.xml"/>"#,
                REL_NS
            ));
        }

        if let Some(creator) = &self.creator {
            archive.set_string(
                "docProps/core.xml",
                format!(
                    r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"><dc:creator>{}</dc:creator><dcterms:created>2024-01-01T00:00:00Z</dcterms:created></cp:coreProperties>"#,
                    escape(creator)
                ),
            );
            root_rels.push_str(
                r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
            );
        }

        let defined_names = if self.defined_names.is_empty() {
            String::new()
        } else {
            format!("<definedNames>{}</definedNames>", self.defined_names.concat())
        };
        archive.set_string(
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets>{}</sheets>{}<calcPr calcId="191029"/></workbook>"#,
                MAIN_NS, REL_NS, sheet_entries, defined_names
            ),
        );
        archive.set_string("xl/_rels/workbook.xml.rels", relationships(&workbook_rels));
        archive.set_string("_rels/.rels", relationships(&root_rels));

        let main = if self.macro_enabled {
            WORKBOOK_MACRO_MAIN
        } else {
            WORKBOOK_MAIN
        };
        archive.set_string(
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/xl/workbook.xml" ContentType="{}"/>{}</Types>"#,
                main, overrides
            ),
        );

        for (path, bytes) in &self.parts {
            archive.set(path.clone(), bytes.clone());
        }
        archive
    }

    /// Assemble and zip the package
    pub fn build(&self) -> Result<Vec<u8>> {
        self.archive().to_bytes()
    }
}

fn relationships(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        inner
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
