//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sheetdok_core::diagnostics::{collect, counts_by_kind};
use sheetdok_core::{analyze, RenderMode, RenderOptions, Settings};
use sheetdok_model::Workbook;

/// Output format for the inspect command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

/// Render mode as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Compact row-oriented view
    Work,
    /// HTML grid keeping the visual layout
    Sheet,
    /// Everything, raw XML included
    Full,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Work => RenderMode::Work,
            ModeArg::Sheet => RenderMode::Sheet,
            ModeArg::Full => RenderMode::Full,
        }
    }
}

#[derive(Parser)]
#[command(name = "sheetdok")]
#[command(author, version, about = "Spreadsheets as readable documents", long_about = None)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an XLSX workbook to Markdown or HTML
    Convert(ConvertArgs),

    /// Print extraction counts and warnings of an XLSX workbook
    Inspect {
        /// Input XLSX file
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Arguments of the convert command; unset flags fall back to the settings file
#[derive(Debug, Clone, Default, Args)]
pub struct ConvertArgs {
    /// Input XLSX file
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Render mode
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Fail when the workbook contains unsupported elements
    #[arg(long)]
    pub strict: bool,

    /// Emit the sheet view as a standalone HTML document
    #[arg(long)]
    pub html: bool,

    /// Leave hidden sheets out of work and sheet view
    #[arg(long)]
    pub exclude_hidden: bool,

    /// Connector attachment tolerance in pixels
    #[arg(long, value_name = "PX")]
    pub tolerance: Option<f64>,

    /// Settings file (defaults to sheetdok.toml next to the input)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert(args) => convert_command(&args),
        Commands::Inspect { input, format } => inspect_command(&input, format),
    }
}

/// Install the stderr log subscriber; `RUST_LOG` takes precedence
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second install (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve the effective render options: settings file first, flags on top
pub fn resolve_options(args: &ConvertArgs) -> Result<RenderOptions> {
    let settings = match args.config {
        Some(ref path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => {
            let dir = args
                .input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            Settings::discover(dir)
                .with_context(|| format!("Failed to load settings from {}", dir.display()))?
        }
    };

    let mut options = settings.render_options();
    if let Some(mode) = args.mode {
        options.mode = mode.into();
    }
    if args.strict {
        options.strict = true;
    }
    if args.html {
        options.mode = RenderMode::Sheet;
        options.standalone_html = true;
    }
    if args.exclude_hidden {
        options.include_hidden_sheets = false;
    }
    if let Some(tolerance) = args.tolerance {
        if !tolerance.is_finite() || tolerance < 0.0 {
            anyhow::bail!("--tolerance must be a non-negative number, got {}", tolerance);
        }
        options.inference.tolerance = tolerance;
    }
    Ok(options)
}

/// Execute the convert command
pub fn convert_command(args: &ConvertArgs) -> Result<()> {
    let input = &args.input;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let options = resolve_options(args)?;
    tracing::debug!(
        mode = %options.mode,
        strict = options.strict,
        tolerance = options.inference.tolerance,
        "converting {}",
        input.display()
    );

    let text = sheetdok_core::convert_file(input, &options)
        .with_context(|| format!("Failed to convert workbook: {}", input.display()))?;

    match args.output {
        Some(ref path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("Created: {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Execute the inspect command
pub fn inspect_command(input: &Path, format: OutputFormat) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let workbook = sheetdok_core::load(input)
        .with_context(|| format!("Failed to load workbook: {}", input.display()))?;

    let summary = inspect_summary(&workbook);
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize summary to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", summary_text(&summary)),
    }
    Ok(())
}

/// Extraction counts and warnings of a workbook as JSON
pub fn inspect_summary(workbook: &Workbook) -> serde_json::Value {
    let analysis = analyze(workbook, &Default::default());
    let warnings = collect(workbook, &analysis);

    let sheets: Vec<serde_json::Value> = workbook
        .sheets
        .iter()
        .zip(&analysis.sheets)
        .map(|(sheet, sheet_analysis)| {
            serde_json::json!({
                "name": sheet.name,
                "visibility": sheet.visibility.as_str(),
                "cells": sheet.cells.len(),
                "merges": sheet.merges.len(),
                "shapes": sheet.shapes.len(),
                "connectors": sheet.connectors.len(),
                "resolved_edges": sheet_analysis.graph.resolved().count(),
            })
        })
        .collect();
    let by_kind: serde_json::Map<String, serde_json::Value> = counts_by_kind(&warnings)
        .into_iter()
        .map(|(kind, count)| (kind.as_str().to_string(), count.into()))
        .collect();

    serde_json::json!({
        "file_name": workbook.metadata.file_name,
        "sha256": workbook.metadata.sha256,
        "sheets": sheets,
        "defined_names": workbook.defined_names.len(),
        "styles": workbook.styles.len(),
        "warnings": by_kind,
        "messages": warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
    })
}

fn summary_text(summary: &serde_json::Value) -> String {
    let mut out = String::new();
    let field = |v: &serde_json::Value, key: &str| v[key].to_string().trim_matches('"').to_string();

    out.push_str(&format!("sheetdok v{}\n", sheetdok_core::VERSION));
    out.push_str(&format!("File: {}\n", field(summary, "file_name")));
    out.push_str(&format!("SHA-256: {}\n", field(summary, "sha256")));
    out.push_str(&format!(
        "Styles: {}  Defined names: {}\n",
        field(summary, "styles"),
        field(summary, "defined_names")
    ));

    out.push_str("\nSheets:\n");
    for sheet in summary["sheets"].as_array().into_iter().flatten() {
        out.push_str(&format!(
            "  {} [{}]: {} cells, {} merges, {} shapes, {} connectors ({} resolved)\n",
            field(sheet, "name"),
            field(sheet, "visibility"),
            field(sheet, "cells"),
            field(sheet, "merges"),
            field(sheet, "shapes"),
            field(sheet, "connectors"),
            field(sheet, "resolved_edges"),
        ));
    }

    out.push_str("\nWarnings:\n");
    if let Some(kinds) = summary["warnings"].as_object() {
        for (kind, count) in kinds {
            out.push_str(&format!("  {}: {}\n", kind, count));
        }
    }
    for message in summary["messages"].as_array().into_iter().flatten() {
        out.push_str(&format!("  - {}\n", message.as_str().unwrap_or_default()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_flags() {
        let cli = Cli::try_parse_from([
            "sheetdok",
            "convert",
            "book.xlsx",
            "--mode",
            "full",
            "--strict",
            "--tolerance",
            "40",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.input, PathBuf::from("book.xlsx"));
                assert_eq!(args.mode, Some(ModeArg::Full));
                assert!(args.strict);
                assert_eq!(args.tolerance, Some(40.0));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = ConvertArgs {
            input: PathBuf::from("/nonexistent/dir/book.xlsx"),
            html: true,
            exclude_hidden: true,
            tolerance: Some(15.0),
            ..Default::default()
        };
        let options = resolve_options(&args).unwrap();
        assert_eq!(options.mode, RenderMode::Sheet);
        assert!(options.standalone_html);
        assert!(options.is_html());
        assert!(!options.include_hidden_sheets);
        assert_eq!(options.inference.tolerance, 15.0);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let args = ConvertArgs {
            input: PathBuf::from("book.xlsx"),
            tolerance: Some(-1.0),
            ..Default::default()
        };
        assert!(resolve_options(&args).is_err());
    }

    #[test]
    fn test_summary_text() {
        let workbook = Workbook {
            sheets: vec![sheetdok_model::Sheet {
                name: "Data".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = summary_text(&inspect_summary(&workbook));
        assert!(text.contains("  Data [visible]: 0 cells, 0 merges, 0 shapes, 0 connectors (0 resolved)"));
        assert!(text.contains("  unsupported: 0"));
    }
}
