//! # sheetdok-ooxml
//!
//! SpreadsheetML (XLSX) package reading for sheetdok.
//!
//! This crate provides functionality to:
//! - Open XLSX packages and resolve their relationships
//! - Decode shared strings, styles, worksheets and drawings
//! - Assemble everything into a typed [`sheetdok_model::Workbook`]
//!
//! ## Example: Loading a Workbook
//!
//! ```no_run
//! let workbook = sheetdok_ooxml::load("report.xlsx")?;
//!
//! for sheet in &workbook.sheets {
//!     println!("{}: {} cells", sheet.name, sheet.cells.len());
//! }
//! # Ok::<(), sheetdok_ooxml::PackageError>(())
//! ```

pub mod archive;
pub mod assembler;
pub mod content_types;
pub mod drawing;
pub mod error;
pub mod formula;
pub mod relationships;
pub mod shared_strings;
pub mod styles;
pub mod test_utils;
pub mod workbook_part;
pub mod worksheet;
pub mod xml;

pub use archive::PackageArchive;
pub use assembler::{assemble, load, load_bytes, sha256_hex};
pub use content_types::ContentTypes;
pub use error::{PackageError, Result};
pub use formula::shift_formula;
pub use relationships::Relationships;
pub use shared_strings::SharedStrings;
pub use styles::parse_styles;
pub use workbook_part::{SheetEntry, WorkbookPart};
pub use worksheet::{parse_worksheet, ParsedWorksheet, SheetContext};
pub use xml::{XmlDocument, XmlElement};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
