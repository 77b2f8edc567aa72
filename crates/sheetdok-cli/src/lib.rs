//! sheetdok CLI - Command-line interface library
//!
//! This library provides the CLI functionality for sheetdok:
//! - Convert: render an XLSX workbook as Markdown or HTML
//! - Inspect: print extraction counts and warnings
//!
//! # Library Usage
//!
//! ```ignore
//! use sheetdok_cli::{convert_command, inspect_command, ConvertArgs, OutputFormat};
//!
//! // Run the full CLI
//! run_cli();
//!
//! // Or use individual commands programmatically
//! convert_command(&ConvertArgs { input, output: Some(out), ..Default::default() })?;
//! inspect_command(&input, OutputFormat::Json)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Work view Markdown on stdout
//! sheetdok convert budget.xlsx
//!
//! # Standalone HTML sheet view
//! sheetdok convert budget.xlsx --html -o budget.html
//!
//! # Fail on anything the converter cannot represent
//! sheetdok convert budget.xlsx --mode full --strict
//!
//! # Extraction summary as JSON
//! sheetdok inspect budget.xlsx --format json
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{convert_command, init_logging, inspect_command, inspect_summary, resolve_options};
pub use app::{run_cli, ConvertArgs, ModeArg, OutputFormat};
