//! sheetdok-core - Spreadsheets as readable documents
//!
//! Core library for sheetdok: turns an assembled [`Workbook`] into Markdown
//! (or standalone HTML) in one of three render modes, with connector
//! diagrams and a warnings report.
//!
//! # Example
//!
//! ```
//! use sheetdok_core::{render_with_options, RenderMode, RenderOptions};
//! use sheetdok_model::{Cell, CellKind, Sheet, Workbook};
//!
//! let workbook = Workbook {
//!     title: "budget".to_string(),
//!     sheets: vec![Sheet {
//!         name: "Sheet1".to_string(),
//!         cells: vec![Cell::new(
//!             "A1".parse().unwrap(),
//!             CellKind::InlineString,
//!             Some("Revenue".to_string()),
//!         )],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let options = RenderOptions::default().with_mode(RenderMode::Full);
//! let markdown = render_with_options(&workbook, &options).unwrap();
//! assert!(markdown.contains("## Sheet: Sheet1 [visible]"));
//! assert!(markdown.contains("| A1 | inline_string | Revenue |"));
//! ```

pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod html;
pub mod markdown;
pub mod render;
pub mod report;

// Re-export main types and functions
pub use config::{ConfigError, Settings, SETTINGS_FILE};
pub use convert::{
    analyze, convert_bytes, convert_file, render, render_with_options, Analysis, ConvertError,
    SheetAnalysis,
};
pub use diagnostics::StructuredFailure;
pub use render::{RenderMode, RenderOptions, RenderStrategy};
pub use report::Report;
pub use sheetdok_model::Workbook;
pub use sheetdok_ooxml::{load, load_bytes, PackageError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
