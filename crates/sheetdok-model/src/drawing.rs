//! Drawing objects: shapes, connectors and embedded images
//!
//! All geometry is expressed in sheet pixels with the origin at the top-left
//! corner of cell `A1`.

use std::fmt;

use serde::Serialize;

/// Drawing-object id, unique within a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in sheet pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Axis-aligned rectangle in sheet pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from two opposite corners, normalizing negative extents
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={:.1} y={:.1} w={:.1} h={:.1}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// How a drawing object is tied to the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorKind {
    TwoCell,
    OneCell,
    Absolute,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoCell => "twoCellAnchor",
            Self::OneCell => "oneCellAnchor",
            Self::Absolute => "absoluteAnchor",
        }
    }
}

/// A `<xdr:from>`/`<xdr:to>` marker: 0-indexed cell plus EMU offsets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnchorMarker {
    pub col: u32,
    pub col_off: i64,
    pub row: u32,
    pub row_off: i64,
}

/// Cell anchor of a top-level drawing object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellAnchor {
    pub kind: AnchorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<AnchorMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<AnchorMarker>,
}

/// Kind of a drawing shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Picture,
    Group,
    GraphicFrame,
    /// Any other preset geometry, by name
    Generic(String),
}

impl ShapeKind {
    /// Map a `prstGeom` preset name
    pub fn from_preset(prst: Option<&str>) -> Self {
        match prst {
            Some("rect") | Some("roundRect") => Self::Rectangle,
            Some("ellipse") => Self::Ellipse,
            Some(other) => Self::Generic(other.to_string()),
            None => Self::Generic("custom".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Picture => "picture",
            Self::Group => "group",
            Self::GraphicFrame => "graphic_frame",
            Self::Generic(prst) => prst,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image bytes referenced by a picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedImage {
    /// Media part path (`xl/media/image1.png`)
    pub path: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// A non-connector drawing object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub id: ShapeId,
    /// Drawing-local uid (`{drawing}#{n}`), stable across id reassignment
    pub uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub kind: ShapeKind,
    pub bbox: BoundingBox,
    /// Rotation in degrees
    pub rotation: f64,
    /// Document order within the drawing
    pub z_order: usize,
    /// Index of the enclosing group in `Sheet::shapes`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbeddedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<CellAnchor>,
    /// Serialized source element
    #[serde(skip)]
    pub raw_xml: String,
}

impl Shape {
    pub fn is_group(&self) -> bool {
        self.kind == ShapeKind::Group
    }

    /// Text if present, otherwise the name
    pub fn label(&self) -> &str {
        match self.text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.name,
        }
    }
}

/// Connector geometry preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Straight,
    Elbow,
    Curved,
    Other(String),
}

impl ConnectorKind {
    /// Map a `prstGeom` preset name
    pub fn from_preset(prst: Option<&str>) -> Self {
        match prst {
            Some("straightConnector1") | Some("line") | None => Self::Straight,
            Some(p) if p.starts_with("bentConnector") => Self::Elbow,
            Some(p) if p.starts_with("curvedConnector") => Self::Curved,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Straight => "straight",
            Self::Elbow => "elbow",
            Self::Curved => "curved",
            Self::Other(prst) => prst,
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connector (`<xdr:cxnSp>`) between two points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub id: ShapeId,
    pub uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub kind: ConnectorKind,
    /// Start point, flips and rotation applied
    pub start: Point,
    /// End point, flips and rotation applied
    pub end: Point,
    /// Shape named by `stCxn`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ref: Option<ShapeId>,
    /// Shape named by `endCxn`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ref: Option<ShapeId>,
    /// `headEnd` marker type other than `none`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_arrow: Option<String>,
    /// `tailEnd` marker type other than `none`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail_arrow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    pub z_order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<CellAnchor>,
    #[serde(skip)]
    pub raw_xml: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_corners() {
        let bbox = BoundingBox::from_corners(Point::new(10.0, 40.0), Point::new(0.0, 20.0));
        assert_eq!(bbox, BoundingBox::new(0.0, 20.0, 10.0, 20.0));
        assert_eq!(bbox.area(), 200.0);
        assert_eq!(bbox.center(), Point::new(5.0, 30.0));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ShapeKind::from_preset(Some("roundRect")), ShapeKind::Rectangle);
        assert_eq!(
            ShapeKind::from_preset(Some("diamond")),
            ShapeKind::Generic("diamond".to_string())
        );
        assert_eq!(ConnectorKind::from_preset(Some("bentConnector3")), ConnectorKind::Elbow);
        assert_eq!(ConnectorKind::from_preset(Some("curvedConnector2")), ConnectorKind::Curved);
        assert_eq!(ConnectorKind::from_preset(Some("line")), ConnectorKind::Straight);
    }
}
