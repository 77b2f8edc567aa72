//! Error types for package reading and assembly

use thiserror::Error;

/// Fatal errors while reading a spreadsheet package
///
/// Anything recoverable is recorded as a warning instead; these variants
/// mean no consistent workbook could be produced.
#[derive(Error, Debug)]
pub enum PackageError {
    /// Error reading the ZIP container
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required part not found in the package
    #[error("Required part not found: {0}")]
    MissingPart(String),

    /// A part exists but its content is inconsistent
    #[error("Malformed part {part}: {reason}")]
    Malformed { part: String, reason: String },

    /// A cell, range or relationship reference could not be resolved
    #[error("Invalid reference in {part}: {reason}")]
    InvalidReference { part: String, reason: String },

    /// Not a plain SpreadsheetML workbook (macro-enabled, legacy, ...)
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl PackageError {
    pub(crate) fn malformed(part: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            part: part.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_reference(part: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            part: part.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for package operations
pub type Result<T> = std::result::Result<T, PackageError>;
