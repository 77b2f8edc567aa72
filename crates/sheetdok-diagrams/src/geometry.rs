//! Sheet geometry: EMU/pixel conversion, anchors and transforms
//!
//! Drawing objects are positioned in EMUs relative to cell markers. Everything
//! downstream works in sheet pixels with the origin at the top-left corner of
//! `A1`, using the sheet's real column widths and row heights.

use std::collections::{BTreeMap, BTreeSet};

use sheetdok_model::{AnchorKind, AnchorMarker, BoundingBox, Point, SheetLayout};

/// EMUs per pixel at 96 DPI
pub const EMU_PER_PIXEL: f64 = 9525.0;

/// Width of a column without a custom width
pub const DEFAULT_COL_WIDTH_PX: f64 = 64.0;

/// Height of a row without a custom height
pub const DEFAULT_ROW_HEIGHT_PX: f64 = 20.0;

/// Convert EMUs to pixels
pub fn emu_to_px(emu: i64) -> f64 {
    emu as f64 / EMU_PER_PIXEL
}

/// Convert a column width in character units to pixels
///
/// Uses the Calibri 11 max digit width of 7 px with the usual 5 px padding
/// folded in, and never goes below 20 px.
pub fn col_width_px(chars: f64) -> f64 {
    let px = (((256.0 * chars + (128.0_f64 / 7.0).trunc()) / 256.0) * 7.0).trunc();
    px.max(20.0)
}

/// Convert a row height in points to pixels
pub fn row_height_px(points: f64) -> f64 {
    (points * 96.0 / 72.0).max(12.0)
}

/// Column and row sizes of one sheet, in pixels
///
/// Hidden columns and rows have zero extent.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMetrics {
    default_col: f64,
    default_row: f64,
    cols: BTreeMap<u32, f64>,
    rows: BTreeMap<u32, f64>,
    hidden_cols: BTreeSet<u32>,
    hidden_rows: BTreeSet<u32>,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            default_col: DEFAULT_COL_WIDTH_PX,
            default_row: DEFAULT_ROW_HEIGHT_PX,
            cols: BTreeMap::new(),
            rows: BTreeMap::new(),
            hidden_cols: BTreeSet::new(),
            hidden_rows: BTreeSet::new(),
        }
    }
}

impl GridMetrics {
    /// Metrics of a grid with default sizes everywhere
    pub fn uniform() -> Self {
        Self::default()
    }

    /// Metrics from a sheet's declared layout
    pub fn from_layout(layout: &SheetLayout) -> Self {
        Self {
            default_col: layout
                .default_col_width
                .map(col_width_px)
                .unwrap_or(DEFAULT_COL_WIDTH_PX),
            default_row: layout
                .default_row_height
                .map(row_height_px)
                .unwrap_or(DEFAULT_ROW_HEIGHT_PX),
            cols: layout
                .col_widths
                .iter()
                .map(|(&c, &w)| (c, col_width_px(w)))
                .collect(),
            rows: layout
                .row_heights
                .iter()
                .map(|(&r, &h)| (r, row_height_px(h)))
                .collect(),
            hidden_cols: layout.hidden_cols.clone(),
            hidden_rows: layout.hidden_rows.clone(),
        }
    }

    /// Width of a 1-indexed column
    pub fn col_width(&self, col: u32) -> f64 {
        if self.hidden_cols.contains(&col) {
            return 0.0;
        }
        self.cols.get(&col).copied().unwrap_or(self.default_col)
    }

    /// Height of a 1-indexed row
    pub fn row_height(&self, row: u32) -> f64 {
        if self.hidden_rows.contains(&row) {
            return 0.0;
        }
        self.rows.get(&row).copied().unwrap_or(self.default_row)
    }

    /// Left edge of the column after the first `cols` columns
    pub fn x_offset(&self, cols: u32) -> f64 {
        span(cols, self.default_col, &self.cols, &self.hidden_cols)
    }

    /// Top edge of the row after the first `rows` rows
    pub fn y_offset(&self, rows: u32) -> f64 {
        span(rows, self.default_row, &self.rows, &self.hidden_rows)
    }

    /// Pixel position of a 0-indexed anchor marker
    pub fn marker_point(&self, marker: &AnchorMarker) -> Point {
        Point::new(
            self.x_offset(marker.col) + emu_to_px(marker.col_off),
            self.y_offset(marker.row) + emu_to_px(marker.row_off),
        )
    }
}

/// Total extent of the first `count` lines, given default and custom sizes
fn span(count: u32, default: f64, custom: &BTreeMap<u32, f64>, hidden: &BTreeSet<u32>) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let mut total = f64::from(count) * default;
    for (_, size) in custom.range(1..=count) {
        total += size - default;
    }
    for idx in hidden.range(1..=count) {
        total -= custom.get(idx).copied().unwrap_or(default);
    }
    total
}

/// Raw placement data of a drawing anchor, in EMUs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorFrame {
    pub kind: AnchorKind,
    pub from: Option<AnchorMarker>,
    pub to: Option<AnchorMarker>,
    /// `<xdr:pos x y>` of an absolute anchor
    pub pos: Option<(i64, i64)>,
    /// `<xdr:ext cx cy>` of a one-cell or absolute anchor
    pub ext: Option<(i64, i64)>,
}

impl AnchorFrame {
    /// Bounding box of the anchored object in sheet pixels
    ///
    /// A two-cell anchor missing a marker, or a one-cell anchor without
    /// `from`, yields an empty box at the origin.
    pub fn bbox(&self, grid: &GridMetrics) -> BoundingBox {
        let (cx, cy) = self.ext.unwrap_or((0, 0));
        match self.kind {
            AnchorKind::TwoCell => match (self.from, self.to) {
                (Some(from), Some(to)) => {
                    BoundingBox::from_corners(grid.marker_point(&from), grid.marker_point(&to))
                }
                _ => BoundingBox::default(),
            },
            AnchorKind::OneCell => match self.from {
                Some(from) => {
                    let origin = grid.marker_point(&from);
                    BoundingBox::new(origin.x, origin.y, emu_to_px(cx), emu_to_px(cy))
                }
                None => BoundingBox::default(),
            },
            AnchorKind::Absolute => {
                let (x, y) = self.pos.unwrap_or((0, 0));
                BoundingBox::new(emu_to_px(x), emu_to_px(y), emu_to_px(cx), emu_to_px(cy))
            }
        }
    }
}

/// An `<a:xfrm>` transform, in EMUs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub off: (i64, i64),
    pub ext: (i64, i64),
    /// Child coordinate space origin (group shapes only)
    pub ch_off: Option<(i64, i64)>,
    /// Child coordinate space extent (group shapes only)
    pub ch_ext: Option<(i64, i64)>,
    /// Rotation in 60000ths of a degree
    pub rot: i64,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Transform {
    pub fn rotation_degrees(&self) -> f64 {
        self.rot as f64 / 60000.0
    }
}

/// Maps a group's child coordinate space onto its pixel bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSpace {
    bbox: BoundingBox,
    ch_off: (f64, f64),
    scale: (f64, f64),
}

impl GroupSpace {
    /// Child space of a group placed at `bbox`
    ///
    /// A zero-sized child extent falls back to plain EMU scaling so children
    /// keep their size.
    pub fn new(bbox: BoundingBox, xfrm: &Transform) -> Self {
        let (ox, oy) = xfrm.ch_off.unwrap_or(xfrm.off);
        let (ex, ey) = xfrm.ch_ext.unwrap_or(xfrm.ext);
        let axis = |px: f64, emu: i64| {
            if emu > 0 {
                px / emu as f64
            } else {
                1.0 / EMU_PER_PIXEL
            }
        };
        Self {
            bbox,
            ch_off: (ox as f64, oy as f64),
            scale: (axis(bbox.width, ex), axis(bbox.height, ey)),
        }
    }

    /// Pixel box of a child transform
    pub fn map(&self, child: &Transform) -> BoundingBox {
        let (x, y) = child.off;
        let (cx, cy) = child.ext;
        BoundingBox::new(
            self.bbox.x + (x as f64 - self.ch_off.0) * self.scale.0,
            self.bbox.y + (y as f64 - self.ch_off.1) * self.scale.1,
            cx as f64 * self.scale.0,
            cy as f64 * self.scale.1,
        )
    }
}

/// Start and end points of a connector drawn across `bbox`
///
/// The line runs from the top-left to the bottom-right corner; `flip_h` and
/// `flip_v` mirror it, and the result is rotated about the box centre.
pub fn connector_endpoints(
    bbox: &BoundingBox,
    flip_h: bool,
    flip_v: bool,
    rotation_deg: f64,
) -> (Point, Point) {
    let (mut x1, mut x2) = (bbox.x, bbox.right());
    let (mut y1, mut y2) = (bbox.y, bbox.bottom());
    if flip_h {
        std::mem::swap(&mut x1, &mut x2);
    }
    if flip_v {
        std::mem::swap(&mut y1, &mut y2);
    }

    let start = Point::new(x1, y1);
    let end = Point::new(x2, y2);
    if rotation_deg.rem_euclid(360.0) == 0.0 {
        return (start, end);
    }
    let centre = bbox.center();
    (
        rotate(start, centre, rotation_deg),
        rotate(end, centre, rotation_deg),
    )
}

/// Rotate `p` clockwise (screen coordinates) about `centre`
pub fn rotate(p: Point, centre: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = p.x - centre.x;
    let dy = p.y - centre.y;
    Point::new(
        centre.x + dx * cos - dy * sin,
        centre.y + dx * sin + dy * cos,
    )
}

/// Distance from a point to a box: 0 inside or on the border, otherwise the
/// Euclidean distance to the nearest edge
pub fn point_to_bbox_distance(p: Point, bbox: &BoundingBox) -> f64 {
    let dx = (bbox.x - p.x).max(0.0).max(p.x - bbox.right());
    let dy = (bbox.y - p.y).max(0.0).max(p.y - bbox.bottom());
    dx.hypot(dy)
}
