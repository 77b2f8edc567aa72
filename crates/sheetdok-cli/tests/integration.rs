//! Integration tests for sheetdok CLI
//!
//! These tests drive the command functions against workbooks written to a
//! temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use sheetdok_cli::{
    convert_command, inspect_command, inspect_summary, ConvertArgs, ModeArg, OutputFormat,
};
use sheetdok_ooxml::test_utils::XlsxBuilder;
use tempfile::TempDir;

/// Write a one-row workbook into `dir` and return its path
fn write_revenue_workbook(dir: &Path) -> PathBuf {
    let bytes = XlsxBuilder::new()
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
        .unwrap();
    let path = dir.join("budget.xlsx");
    fs::write(&path, bytes).unwrap();
    path
}

/// Workbook with a chartsheet, which strict mode refuses
fn write_chart_workbook(dir: &Path) -> PathBuf {
    let bytes = XlsxBuilder::new()
        .sheet("Data", "<sheetData/>")
        .chartsheet("Chart1")
        .build()
        .unwrap();
    let path = dir.join("charts.xlsx");
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_convert_writes_markdown() {
    let temp = TempDir::new().unwrap();
    let input = write_revenue_workbook(temp.path());
    let output = temp.path().join("budget.md");

    convert_command(&ConvertArgs {
        input,
        output: Some(output.clone()),
        ..Default::default()
    })
    .unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("# Workbook: budget.xlsx"));
    assert!(text.contains("### Cells"));
    assert!(text.contains("A1: Revenue"));
    assert!(text.contains("C1: =B1*2 = 200"));
}

#[test]
fn test_convert_full_mode() {
    let temp = TempDir::new().unwrap();
    let input = write_revenue_workbook(temp.path());
    let output = temp.path().join("budget.full.md");

    convert_command(&ConvertArgs {
        input,
        output: Some(output.clone()),
        mode: Some(ModeArg::Full),
        ..Default::default()
    })
    .unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("### Cells (Full Dump)"));
    assert!(text.contains("| mode | full |"));
}

#[test]
fn test_convert_html() {
    let temp = TempDir::new().unwrap();
    let input = write_revenue_workbook(temp.path());
    let output = temp.path().join("budget.html");

    convert_command(&ConvertArgs {
        input,
        output: Some(output.clone()),
        html: true,
        ..Default::default()
    })
    .unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("<!doctype html>"));
    assert!(text.contains("data-coord=\"A1\""));
}

#[test]
fn test_settings_file_next_to_input() {
    let temp = TempDir::new().unwrap();
    let input = write_revenue_workbook(temp.path());
    fs::write(temp.path().join("sheetdok.toml"), "[render]\nmode = \"full\"\n").unwrap();
    let output = temp.path().join("out.md");

    convert_command(&ConvertArgs {
        input: input.clone(),
        output: Some(output.clone()),
        ..Default::default()
    })
    .unwrap();
    assert!(fs::read_to_string(&output).unwrap().contains("### Cells (Full Dump)"));

    // Flags win over the file
    convert_command(&ConvertArgs {
        input,
        output: Some(output.clone()),
        mode: Some(ModeArg::Work),
        ..Default::default()
    })
    .unwrap();
    let text = fs::read_to_string(&output).unwrap();
    assert!(!text.contains("### Cells (Full Dump)"));
    assert!(text.contains("### Cells"));
}

#[test]
fn test_strict_failure_is_error() {
    let temp = TempDir::new().unwrap();
    let input = write_chart_workbook(temp.path());
    let output = temp.path().join("charts.md");

    let result = convert_command(&ConvertArgs {
        input: input.clone(),
        output: Some(output.clone()),
        strict: true,
        ..Default::default()
    });
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("unsupported"));
    assert!(!output.exists());

    // Without strict the same workbook converts and lists the element
    convert_command(&ConvertArgs {
        input,
        output: Some(output.clone()),
        ..Default::default()
    })
    .unwrap();
    assert!(fs::read_to_string(&output)
        .unwrap()
        .contains("### Unsupported Elements"));
}

#[test]
fn test_missing_input() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.xlsx");

    let err = convert_command(&ConvertArgs {
        input: missing.clone(),
        ..Default::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("Input file not found"));

    assert!(inspect_command(&missing, OutputFormat::Text).is_err());
}

#[test]
fn test_malformed_input() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("broken.xlsx");
    fs::write(&input, b"not a zip").unwrap();

    let err = convert_command(&ConvertArgs {
        input,
        ..Default::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("Failed to convert workbook"));
}

#[test]
fn test_inspect_summary() {
    let temp = TempDir::new().unwrap();
    let input = write_chart_workbook(temp.path());

    inspect_command(&input, OutputFormat::Json).unwrap();

    let workbook = sheetdok_core::load(&input).unwrap();
    let summary = inspect_summary(&workbook);
    assert_eq!(summary["file_name"], "charts.xlsx");
    assert_eq!(summary["sheets"][0]["name"], "Data");
    assert!(summary["warnings"]["unsupported"].as_u64().unwrap() >= 1);
    assert_eq!(summary["warnings"]["merge_conflict"], 0);
}
