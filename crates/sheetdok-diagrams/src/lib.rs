//! # sheetdok-diagrams
//!
//! Drawing geometry, connector inference and Mermaid diagram generation for
//! sheetdok.
//!
//! Spreadsheet flowcharts are drawn with shapes and connectors that are often
//! only visually attached. This crate recovers the intended graph:
//!
//! - [`geometry`] maps cell anchors and transforms to sheet pixels
//! - [`inference`] attaches each connector end to the nearest shape
//! - [`flowchart`] turns the resulting graph into a Mermaid `flowchart TD`
//!
//! ## Example
//!
//! ```
//! use sheetdok_diagrams::{infer_sheet, Flowchart, InferenceConfig};
//! use sheetdok_model::Sheet;
//!
//! let sheet = Sheet::default();
//! let (graph, warnings) = infer_sheet(&sheet, &InferenceConfig::default());
//! assert!(graph.is_empty() && warnings.is_empty());
//!
//! let chart = Flowchart::build(&sheet, &graph);
//! assert_eq!(chart.to_mermaid(), "flowchart TD\n");
//! ```

pub mod flowchart;
pub mod geometry;
pub mod inference;

pub use flowchart::{escape_label, FlowEdge, FlowNode, Flowchart};
pub use geometry::{AnchorFrame, GridMetrics, GroupSpace, Transform, EMU_PER_PIXEL};
pub use inference::{
    infer_sheet, Confidence, ConnectionEdge, ConnectionGraph, Direction, Endpoint,
    InferenceConfig, DEFAULT_TOLERANCE,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
