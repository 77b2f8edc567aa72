//! Conversion Tests
//!
//! End-to-end tests from in-memory XLSX packages to rendered documents.
//!
//! Test Categories:
//! 1. Scenarios (revenue row, connected shapes, dangling connector, merges)
//! 2. Document structure (section order, hidden sheets, images)
//! 3. Properties (determinism, strict mode, merge invariant)
//! 4. Files and settings

use sheetdok_core::{
    convert_bytes, convert_file, load_bytes, render, render_with_options, ConvertError,
    RenderMode, RenderOptions, Settings,
};
use sheetdok_ooxml::test_utils::{XlsxBuilder, DRAWING_NAMESPACES};

const EMU_PER_PX: i64 = 9525;

/// Shape anchored at an absolute pixel rectangle
fn abs_rect(id: u32, text: &str, x: i64, y: i64, w: i64, h: i64) -> String {
    format!(
        r#"<xdr:absoluteAnchor><xdr:pos x="{}" y="{}"/><xdr:ext cx="{}" cy="{}"/><xdr:sp><xdr:nvSpPr><xdr:cNvPr id="{id}" name="Box {id}"/><xdr:cNvSpPr/></xdr:nvSpPr><xdr:spPr><a:prstGeom prst="rect"/></xdr:spPr><xdr:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></xdr:txBody></xdr:sp><xdr:clientData/></xdr:absoluteAnchor>"#,
        x * EMU_PER_PX,
        y * EMU_PER_PX,
        w * EMU_PER_PX,
        h * EMU_PER_PX,
    )
}

/// Arrow connector from (x1, y1) to (x2, y2), with x2 >= x1 and y2 >= y1
fn abs_arrow(id: u32, x1: i64, y1: i64, x2: i64, y2: i64) -> String {
    format!(
        r#"<xdr:absoluteAnchor><xdr:pos x="{}" y="{}"/><xdr:ext cx="{}" cy="{}"/><xdr:cxnSp><xdr:nvCxnSpPr><xdr:cNvPr id="{id}" name="Arrow {id}"/><xdr:cNvCxnSpPr/></xdr:nvCxnSpPr><xdr:spPr><a:prstGeom prst="straightConnector1"/><a:ln><a:tailEnd type="triangle"/></a:ln></xdr:spPr></xdr:cxnSp><xdr:clientData/></xdr:absoluteAnchor>"#,
        x1 * EMU_PER_PX,
        y1 * EMU_PER_PX,
        (x2 - x1) * EMU_PER_PX,
        (y2 - y1) * EMU_PER_PX,
    )
}

fn revenue_package() -> Vec<u8> {
    XlsxBuilder::new()
        .shared_strings(&["Revenue"])
        .sheet(
            "Summary",
            r#"<sheetData><row r="1">
<c r="A1" t="s"><v>0</v></c>
<c r="B1"><v>100</v></c>
<c r="C1"><f>B1*2</f><v>200</v></c>
</row></sheetData>"#,
        )
        .build()
        .unwrap()
}

fn flow_package(end: (i64, i64)) -> Vec<u8> {
    let anchors = format!(
        "{}{}{}",
        abs_rect(1, "Start", 0, 0, 10, 10),
        abs_rect(2, "Finish", 50, 50, 10, 10),
        abs_arrow(3, 10, 10, end.0, end.1)
    );
    XlsxBuilder::new()
        .sheet("Flow", "<sheetData/>")
        .drawing(&anchors, None)
        .build()
        .unwrap()
}

/// Heading lines in document order
fn headings(text: &str) -> Vec<&str> {
    text.lines().filter(|l| l.starts_with('#')).collect()
}

// =============================================================================
// PART 1: SCENARIOS
// =============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_revenue_work_view() {
        let workbook = load_bytes(&revenue_package(), "revenue.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Work, false).unwrap();

        assert!(text.starts_with("# Workbook: revenue.xlsx\n"));
        assert!(text.contains("A1: Revenue · B1: 100 · C1: =B1*2 = 200"));
    }

    #[test]
    fn test_revenue_full_dump_shows_style_ids() {
        let workbook = load_bytes(&revenue_package(), "revenue.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Full, false).unwrap();

        assert!(text.contains("| A1 | shared_string | Revenue |  |  | 0 |"));
        assert!(text.contains("| B1 | number | 100 |  |  | 0 |"));
        assert!(text.contains("| C1 | number |  | =B1*2 | 200 | 0 |"));
    }

    #[test]
    fn test_connected_shapes() {
        let workbook = load_bytes(&flow_package((50, 50)), "flow.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Work, false).unwrap();

        assert!(text.contains("| forward |"));
        assert!(text.contains("| inferred/inferred | 0.00 | 0.00 |"));
        assert!(text.contains("```mermaid\nflowchart TD\n"));
        assert!(text.contains("    S1 --> S2\n"));
        assert!(!text.contains("geometry_ambiguity]"));
    }

    #[test]
    fn test_dangling_endpoint() {
        let workbook = load_bytes(&flow_package((1000, 1000)), "flow.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Work, false).unwrap();

        assert!(text.contains("inferred/dangling"));
        assert!(text.contains("    S1 --> C3_end\n"));
        assert!(text.contains(r#"C3_end["unconnected end"]"#));
        assert!(text.contains("[geometry_ambiguity]"));
    }

    #[test]
    fn test_overlapping_merges() {
        let bytes = XlsxBuilder::new()
            .sheet(
                "Merged",
                r#"<sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Title</t></is></c></row></sheetData>
<mergeCells count="2"><mergeCell ref="A1:B2"/><mergeCell ref="A1:C1"/></mergeCells>"#,
            )
            .build()
            .unwrap();
        let workbook = load_bytes(&bytes, "merged.xlsx").unwrap();
        assert_eq!(workbook.sheets[0].merges.len(), 1);

        let text = render(&workbook, RenderMode::Sheet, false).unwrap();
        assert!(text.contains(r#"data-merge="A1:B2""#));
        assert!(!text.contains(r#"data-merge="A1:C1""#));
        assert!(text.contains("[merge_conflict]"));
    }
}

// =============================================================================
// PART 2: DOCUMENT STRUCTURE
// =============================================================================

mod structure_tests {
    use super::*;

    #[test]
    fn test_section_order_is_shared_by_all_modes() {
        let workbook = load_bytes(&flow_package((50, 50)), "flow.xlsx").unwrap();
        let cell_heading = |mode: RenderMode| match mode {
            RenderMode::Work => "### Cells",
            RenderMode::Sheet => "### Sheet View",
            RenderMode::Full => "### Cells (Full Dump)",
        };

        for mode in [RenderMode::Work, RenderMode::Sheet, RenderMode::Full] {
            let text = render(&workbook, mode, false).unwrap();
            let top: Vec<_> = headings(&text)
                .into_iter()
                .filter(|h| !h.starts_with("####"))
                .collect();
            assert_eq!(
                top,
                vec![
                    "# Workbook: flow.xlsx",
                    "## Source Metadata",
                    "## Styles",
                    "## Defined Names",
                    "## Sheet: Flow [visible]",
                    "### Sheet Metadata",
                    "### Print Metadata",
                    "### Data Validations",
                    cell_heading(mode),
                    "### Drawing Objects",
                    "### Connectors (Raw + Inferred)",
                    "### Diagram",
                    "### Embedded Images",
                    "### Unsupported Elements",
                    "## Extraction Summary",
                    "## Warnings",
                ],
                "mode {}",
                mode
            );
        }
    }

    #[test]
    fn test_diagram_identical_across_modes() {
        let workbook = load_bytes(&flow_package((50, 50)), "flow.xlsx").unwrap();
        let diagram = |text: &str| {
            let start = text.find("```mermaid").unwrap();
            let end = start + text[start..].find("\n```\n").unwrap();
            text[start..end].to_string()
        };

        let work = diagram(&render(&workbook, RenderMode::Work, false).unwrap());
        let sheet = diagram(&render(&workbook, RenderMode::Sheet, false).unwrap());
        let full = diagram(&render(&workbook, RenderMode::Full, false).unwrap());
        assert_eq!(work, sheet);
        assert_eq!(work, full);
    }

    #[test]
    fn test_hidden_sheets() {
        let bytes = XlsxBuilder::new()
            .sheet("Shown", "<sheetData/>")
            .sheet_with_state("Lookup", Some("hidden"), "<sheetData/>")
            .build()
            .unwrap();
        let workbook = load_bytes(&bytes, "hidden.xlsx").unwrap();

        let included = render(&workbook, RenderMode::Work, false).unwrap();
        assert!(included.contains("## Sheet: Lookup [hidden]"));

        let options = RenderOptions {
            include_hidden_sheets: false,
            ..Default::default()
        };
        let excluded = render_with_options(&workbook, &options).unwrap();
        assert!(!excluded.contains("## Sheet: Lookup"));
        assert!(excluded.contains("| rendered_sheet_count | 1 |"));
    }

    #[test]
    fn test_defined_names_and_validations() {
        let bytes = XlsxBuilder::new()
            .sheet(
                "Input",
                r#"<sheetData/><dataValidations count="1"><dataValidation type="list" allowBlank="1" sqref="B2:B5"><formula1>"Yes,No"</formula1></dataValidation></dataValidations>"#,
            )
            .defined_name("Rate", None, "Input!$C$1")
            .build()
            .unwrap();
        let workbook = load_bytes(&bytes, "names.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Work, false).unwrap();

        assert!(text.contains("| Rate | workbook | Input!$C$1 | false |"));
        assert!(text.contains("| list | B2:B5 |"));
    }

    #[test]
    fn test_embedded_image_data_uri() {
        let pic = r#"<xdr:absoluteAnchor><xdr:pos x="0" y="0"/><xdr:ext cx="95250" cy="95250"/><xdr:pic><xdr:nvPicPr><xdr:cNvPr id="4" name="Logo"/><xdr:cNvPicPr/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="rIdImg"/></xdr:blipFill><xdr:spPr/></xdr:pic><xdr:clientData/></xdr:absoluteAnchor>"#;
        let rels = r#"<Relationship Id="rIdImg" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>"#;
        let bytes = XlsxBuilder::new()
            .sheet("Art", "<sheetData/>")
            .drawing(pic, Some(rels))
            .part("xl/media/image1.png", b"hello".to_vec())
            .build()
            .unwrap();
        let workbook = load_bytes(&bytes, "art.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Work, false).unwrap();

        assert!(text.contains("#### Image 1:"));
        assert!(text.contains("](data:image/png;base64,aGVsbG8=)"));
        assert!(DRAWING_NAMESPACES.contains("xmlns:r="));
    }
}

// =============================================================================
// PART 3: PROPERTIES
// =============================================================================

mod property_tests {
    use super::*;

    fn unsupported_package() -> Vec<u8> {
        XlsxBuilder::new()
            .sheet(
                "Data",
                r#"<sheetData/><mc:AlternateContent xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><mc:Fallback/></mc:AlternateContent>"#,
            )
            .chartsheet("Chart")
            .build()
            .unwrap()
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let bytes = flow_package((1000, 1000));
        for mode in [RenderMode::Work, RenderMode::Sheet, RenderMode::Full] {
            let first = render(&load_bytes(&bytes, "flow.xlsx").unwrap(), mode, false).unwrap();
            let second = render(&load_bytes(&bytes, "flow.xlsx").unwrap(), mode, false).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_strict_fails_iff_unsupported() {
        let clean = load_bytes(&flow_package((1000, 1000)), "flow.xlsx").unwrap();
        for mode in [RenderMode::Work, RenderMode::Sheet, RenderMode::Full] {
            assert!(render(&clean, mode, true).is_ok());
        }

        let workbook = load_bytes(&unsupported_package(), "odd.xlsx").unwrap();
        let expected = workbook
            .all_warnings()
            .filter(|w| w.is_unsupported())
            .count();
        assert!(expected >= 2);

        for mode in [RenderMode::Work, RenderMode::Sheet, RenderMode::Full] {
            let failure = render(&workbook, mode, true).unwrap_err();
            assert_eq!(failure.len(), expected);
            assert!(render(&workbook, mode, false).is_ok());
        }
    }

    #[test]
    fn test_unsupported_elements_listed() {
        let workbook = load_bytes(&unsupported_package(), "odd.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Full, false).unwrap();

        assert!(text.contains("#### Unsupported 1: AlternateContent"));
        assert!(text.contains("[unsupported]"));
        assert!(text.contains("xl/chartsheets/sheet2.xml"));
    }

    #[test]
    fn test_sheet_view_merge_invariant() {
        let bytes = XlsxBuilder::new()
            .sheet(
                "Grid",
                r#"<sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>A</t></is></c><c r="B1" t="inlineStr"><is><t>B</t></is></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>C</t></is></c><c r="B2" t="inlineStr"><is><t>D</t></is></c><c r="C2" t="inlineStr"><is><t>E</t></is></c></row>
<row r="3"><c r="C3" t="inlineStr"><is><t>F</t></is></c></row>
</sheetData><mergeCells count="2"><mergeCell ref="A1:B2"/><mergeCell ref="C2:C3"/></mergeCells>"#,
            )
            .build()
            .unwrap();
        let workbook = load_bytes(&bytes, "grid.xlsx").unwrap();
        let text = render(&workbook, RenderMode::Sheet, false).unwrap();

        for interior in ["B1", "A2", "B2", "C3"] {
            assert!(
                !text.contains(&format!(r#"data-coord="{}""#, interior)),
                "{} rendered",
                interior
            );
        }
        assert!(text.contains(r#"data-coord="A1" rowspan="2" colspan="2" data-merge="A1:B2""#));
        assert!(text.contains(r#"data-coord="C2" rowspan="2" data-merge="C2:C3""#));
    }

    #[test]
    fn test_malformed_package_is_package_error() {
        let result = convert_bytes(b"PK\x03\x04 truncated", "bad.xlsx", &RenderOptions::default());
        assert!(matches!(result, Err(ConvertError::Package(_))));
    }

    #[test]
    fn test_out_of_sheet_rows_are_package_errors() {
        for row in ["0", "1048577"] {
            let bytes = XlsxBuilder::new()
                .sheet(
                    "Data",
                    &format!(r#"<sheetData><row r="{}"><c><v>1</v></c></row></sheetData>"#, row),
                )
                .build()
                .unwrap();
            for mode in [RenderMode::Work, RenderMode::Sheet, RenderMode::Full] {
                let options = RenderOptions::default().with_mode(mode);
                let result = convert_bytes(&bytes, "rows.xlsx", &options);
                assert!(matches!(result, Err(ConvertError::Package(_))), "row {}", row);
            }
        }
    }

    #[test]
    fn test_maximal_drawing_ids_convert() {
        let anchors = format!(
            "{}{}",
            abs_rect(u32::MAX, "First", 0, 0, 10, 10),
            abs_rect(u32::MAX, "Second", 50, 50, 10, 10)
        );
        let bytes = XlsxBuilder::new()
            .sheet("Flow", "<sheetData/>")
            .drawing(&anchors, None)
            .build()
            .unwrap();

        let workbook = load_bytes(&bytes, "ids.xlsx").unwrap();
        let ids: Vec<u32> = workbook.sheets[0].shapes.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![u32::MAX, 1]);

        let text = render(&workbook, RenderMode::Sheet, false).unwrap();
        assert!(text.contains(&format!("    S{}[\"First\"]", u32::MAX)));
        assert!(text.contains("    S1[\"Second\"]"));
    }
}

// =============================================================================
// PART 4: FILES AND SETTINGS
// =============================================================================

mod file_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_convert_file_with_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("revenue.xlsx");
        fs::write(&path, revenue_package()).unwrap();
        fs::write(
            dir.path().join("sheetdok.toml"),
            "[render]\nmode = \"sheet\"\nstandalone_html = true\n",
        )
        .unwrap();

        let settings = Settings::discover(dir.path()).unwrap();
        let html = convert_file(&path, &settings.render_options()).unwrap();
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("Revenue"));
    }

    #[test]
    fn test_convert_missing_file() {
        let result = convert_file("/nonexistent/book.xlsx", &RenderOptions::default());
        assert!(matches!(result, Err(ConvertError::Package(_))));
    }

    #[test]
    fn test_strict_error_through_convert() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.xlsx");
        let bytes = XlsxBuilder::new()
            .sheet("Data", "<sheetData/>")
            .chartsheet("Chart")
            .build()
            .unwrap();
        fs::write(&path, bytes).unwrap();

        let options = RenderOptions::default().with_strict(true);
        match convert_file(&path, &options) {
            Err(ConvertError::Strict(failure)) => {
                assert_eq!(failure.len(), 1);
                assert!(failure.to_string().contains("1 unsupported element(s)"));
            }
            other => panic!("expected strict failure, got {:?}", other.map(|t| t.len())),
        }
    }
}
