//! sheetdok-model - Typed workbook model
//!
//! This crate provides the in-memory representation of an assembled
//! spreadsheet package: sheets, cells, styles, merges, validations, drawing
//! objects and the warnings recorded while building them.
//!
//! The model is produced once by `sheetdok-ooxml` and is read-only from then
//! on; inference and rendering only borrow it.

pub mod drawing;
pub mod reference;
pub mod region;
pub mod sheet;
pub mod style;
pub mod warning;
pub mod workbook;

pub use drawing::{
    AnchorKind, AnchorMarker, BoundingBox, CellAnchor, Connector, ConnectorKind, EmbeddedImage,
    Point, Shape, ShapeId, ShapeKind,
};
pub use reference::{column_index, column_letters, CellRef, RangeRef, ReferenceError};
pub use region::{build_regions, CellRegion, RegionCell, RegionFlag};
pub use sheet::{
    Cell, CellKind, DataValidationRule, FreezePane, MergeRegion, PrintSettings, Sheet,
    SheetLayout, ValidationKind, Visibility,
};
pub use style::{
    Alignment, Border, Fill, Font, NumberFormat, StyleRecord, StyleTable, XmlNode,
};
pub use warning::{Warning, WarningKind, Warnings};
pub use workbook::{DefinedName, SourceMetadata, Workbook};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
