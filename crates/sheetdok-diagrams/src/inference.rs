//! Connector endpoint inference
//!
//! Connectors in a drawing frequently lack explicit `stCxn`/`endCxn` links,
//! so each endpoint is attached to the nearest shape on the sheet within a
//! proximity tolerance. Ties are broken deterministically and reported.

use std::fmt;

use serde::{Deserialize, Serialize};
use sheetdok_model::{Connector, Point, Shape, ShapeId, Sheet, Warning, WarningKind, Warnings};

use crate::geometry::point_to_bbox_distance;

/// Default proximity tolerance in pixels
pub const DEFAULT_TOLERANCE: f64 = 220.0;

/// Distances closer than this are considered equal
pub const TIE_EPSILON: f64 = 1e-9;

/// Inference settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Maximum pixel distance between an endpoint and the shape it attaches to
    pub tolerance: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// How an endpoint was attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Named by `stCxn`/`endCxn`
    Explicit,
    /// Single nearest shape within tolerance
    Inferred,
    /// Several shapes at the same distance; precedence rules picked one
    TieBreak,
    /// No shape within tolerance
    Dangling,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Inferred => "inferred",
            Self::TieBreak => "tie_break",
            Self::Dangling => "dangling",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge direction, derived from the connector's arrow markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Arrow at the end point only
    Forward,
    /// Arrow at the start point only; source and target are swapped
    Reverse,
    Bidirectional,
    Undirected,
}

impl Direction {
    /// Direction implied by `headEnd`/`tailEnd` markers
    pub fn from_arrows(head: Option<&str>, tail: Option<&str>) -> Self {
        let has = |m: Option<&str>| m.is_some_and(|m| !m.eq_ignore_ascii_case("none"));
        match (has(head), has(tail)) {
            (true, true) => Self::Bidirectional,
            (false, true) => Self::Forward,
            (true, false) => Self::Reverse,
            (false, false) => Self::Undirected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
            Self::Bidirectional => "bidirectional",
            Self::Undirected => "undirected",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end of an inferred edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    /// Index into `Sheet::shapes`
    pub shape: Option<usize>,
    pub shape_id: Option<ShapeId>,
    pub point: Point,
    /// Distance to the chosen (or nearest rejected) shape; `None` for explicit
    /// links and sheets without shapes
    pub distance: Option<f64>,
    pub confidence: Confidence,
}

impl Endpoint {
    pub fn is_attached(&self) -> bool {
        self.shape.is_some()
    }
}

/// A connector resolved against the sheet's shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionEdge {
    /// Index into `Sheet::connectors`
    pub connector: usize,
    pub connector_id: ShapeId,
    pub source: Endpoint,
    pub target: Endpoint,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ConnectionEdge {
    /// Both endpoints attached to a shape
    pub fn is_resolved(&self) -> bool {
        self.source.is_attached() && self.target.is_attached()
    }

    /// Both endpoints named explicitly in the drawing
    pub fn is_explicit(&self) -> bool {
        self.source.confidence == Confidence::Explicit
            && self.target.confidence == Confidence::Explicit
    }
}

/// All edges of one sheet, in connector order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionGraph {
    /// Index of the sheet in the workbook
    pub sheet: usize,
    pub edges: Vec<ConnectionEdge>,
}

impl ConnectionGraph {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edge inferred for a connector
    pub fn edge_for(&self, connector: usize) -> Option<&ConnectionEdge> {
        self.edges.iter().find(|e| e.connector == connector)
    }

    pub fn resolved(&self) -> impl Iterator<Item = &ConnectionEdge> {
        self.edges.iter().filter(|e| e.is_resolved())
    }
}

/// Infer the connection graph of a sheet
///
/// Returns the graph together with the `GeometryAmbiguity` warnings raised
/// while building it. The result depends only on the sheet contents.
pub fn infer_sheet(sheet: &Sheet, config: &InferenceConfig) -> (ConnectionGraph, Warnings) {
    let mut warnings = Warnings::new();
    let edges = sheet
        .connectors
        .iter()
        .enumerate()
        .map(|(idx, connector)| infer_connector(sheet, idx, connector, config, &mut warnings))
        .collect::<Vec<_>>();

    log::debug!(
        "{}: {} connectors, {} warnings",
        sheet.name,
        edges.len(),
        warnings.len()
    );
    (
        ConnectionGraph {
            sheet: sheet.index,
            edges,
        },
        warnings,
    )
}

#[derive(Clone, Copy)]
enum End {
    Start,
    End,
}

impl End {
    fn as_str(self) -> &'static str {
        match self {
            End::Start => "start",
            End::End => "end",
        }
    }
}

fn infer_connector(
    sheet: &Sheet,
    index: usize,
    connector: &Connector,
    config: &InferenceConfig,
    warnings: &mut Warnings,
) -> ConnectionEdge {
    let start = resolve_endpoint(
        sheet,
        connector,
        End::Start,
        connector.start,
        connector.start_ref,
        config,
        warnings,
    );
    let end = resolve_endpoint(
        sheet,
        connector,
        End::End,
        connector.end,
        connector.end_ref,
        config,
        warnings,
    );

    let direction = Direction::from_arrows(
        connector.head_arrow.as_deref(),
        connector.tail_arrow.as_deref(),
    );
    let (source, target) = match direction {
        Direction::Reverse => (end, start),
        _ => (start, end),
    };

    ConnectionEdge {
        connector: index,
        connector_id: connector.id,
        source,
        target,
        direction,
        label: connector
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    }
}

fn resolve_endpoint(
    sheet: &Sheet,
    connector: &Connector,
    end: End,
    point: Point,
    explicit: Option<ShapeId>,
    config: &InferenceConfig,
    warnings: &mut Warnings,
) -> Endpoint {
    let ambiguity = |reason: String| {
        Warning::new(WarningKind::GeometryAmbiguity, reason)
            .with_scope(&sheet.name)
            .with_location(&connector.uid)
    };

    if let Some(id) = explicit {
        if let Some(idx) = sheet.shapes.iter().position(|s| s.id == id) {
            return Endpoint {
                shape: Some(idx),
                shape_id: Some(id),
                point,
                distance: None,
                confidence: Confidence::Explicit,
            };
        }
        warnings.push(ambiguity(format!(
            "{} link names shape id {} which does not exist; inferring from geometry",
            end.as_str(),
            id
        )));
    }

    let Some(nearest) = nearest_shapes(&sheet.shapes, point) else {
        warnings.push(ambiguity(format!(
            "{} point {} has no shape to attach to",
            end.as_str(),
            point
        )));
        return Endpoint {
            shape: None,
            shape_id: None,
            point,
            distance: None,
            confidence: Confidence::Dangling,
        };
    };

    if nearest.distance > config.tolerance {
        warnings.push(ambiguity(format!(
            "{} point {} is {:.1}px from the nearest shape (tolerance {:.1}px); left dangling",
            end.as_str(),
            point,
            nearest.distance,
            config.tolerance
        )));
        return Endpoint {
            shape: None,
            shape_id: None,
            point,
            distance: Some(nearest.distance),
            confidence: Confidence::Dangling,
        };
    }

    let winner = &sheet.shapes[nearest.winner];
    let confidence = if nearest.contested {
        warnings.push(ambiguity(format!(
            "{} point {} is equidistant from {} shapes; chose shape {} by precedence",
            end.as_str(),
            point,
            nearest.tied,
            winner.id
        )));
        Confidence::TieBreak
    } else {
        Confidence::Inferred
    };

    Endpoint {
        shape: Some(nearest.winner),
        shape_id: Some(winner.id),
        point,
        distance: Some(nearest.distance),
        confidence,
    }
}

struct Nearest {
    winner: usize,
    distance: f64,
    /// Number of shapes at the minimum distance
    tied: usize,
    /// Whether the tie involved shapes other than the winner's enclosing groups
    contested: bool,
}

/// Pick the closest shape to `point`
///
/// Equidistant candidates are ordered by smallest area, then lowest z-order,
/// then lowest shape id, then uid.
fn nearest_shapes(shapes: &[Shape], point: Point) -> Option<Nearest> {
    let distances: Vec<f64> = shapes
        .iter()
        .map(|s| point_to_bbox_distance(point, &s.bbox))
        .collect();
    let best = distances.iter().copied().min_by(f64::total_cmp)?;

    let mut tied: Vec<usize> = (0..shapes.len())
        .filter(|&i| (distances[i] - best).abs() <= TIE_EPSILON)
        .collect();
    tied.sort_by(|&a, &b| {
        let (sa, sb) = (&shapes[a], &shapes[b]);
        sa.bbox
            .area()
            .total_cmp(&sb.bbox.area())
            .then(sa.z_order.cmp(&sb.z_order))
            .then(sa.id.cmp(&sb.id))
            .then(sa.uid.cmp(&sb.uid))
    });

    let winner = tied[0];
    // A point inside a grouped shape is also inside its groups; that is not
    // an ambiguity
    let contested = tied[1..]
        .iter()
        .any(|&other| !is_ancestor(shapes, other, winner));

    Some(Nearest {
        winner,
        distance: distances[winner],
        tied: tied.len(),
        contested,
    })
}

fn is_ancestor(shapes: &[Shape], candidate: usize, of: usize) -> bool {
    let mut current = shapes[of].parent;
    while let Some(parent) = current {
        if parent == candidate {
            return true;
        }
        current = shapes.get(parent).and_then(|s| s.parent);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdok_model::{BoundingBox, ConnectorKind, ShapeKind};

    fn shape(id: u32, bbox: BoundingBox) -> Shape {
        Shape {
            id: ShapeId(id),
            uid: format!("xl/drawings/drawing1.xml#{}", id),
            name: format!("Shape {}", id),
            text: None,
            kind: ShapeKind::Rectangle,
            bbox,
            rotation: 0.0,
            z_order: id as usize,
            parent: None,
            image: None,
            fill_color: None,
            line_color: None,
            anchor: None,
            raw_xml: String::new(),
        }
    }

    fn connector(id: u32, start: Point, end: Point) -> Connector {
        Connector {
            id: ShapeId(id),
            uid: format!("xl/drawings/drawing1.xml#{}", id),
            name: format!("Connector {}", id),
            text: None,
            kind: ConnectorKind::Straight,
            start,
            end,
            start_ref: None,
            end_ref: None,
            head_arrow: None,
            tail_arrow: Some("triangle".to_string()),
            line_color: None,
            z_order: id as usize,
            anchor: None,
            raw_xml: String::new(),
        }
    }

    fn sheet(shapes: Vec<Shape>, connectors: Vec<Connector>) -> Sheet {
        Sheet {
            name: "Flow".to_string(),
            shapes,
            connectors,
            ..Default::default()
        }
    }

    #[test]
    fn test_corner_touching_connector() {
        let s = sheet(
            vec![
                shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
                shape(2, BoundingBox::new(50.0, 50.0, 10.0, 10.0)),
            ],
            vec![connector(3, Point::new(10.0, 10.0), Point::new(50.0, 50.0))],
        );
        let (graph, warnings) = infer_sheet(&s, &InferenceConfig::default());
        let edge = &graph.edges[0];
        assert_eq!(edge.source.shape_id, Some(ShapeId(1)));
        assert_eq!(edge.target.shape_id, Some(ShapeId(2)));
        assert_eq!(edge.source.distance, Some(0.0));
        assert_eq!(edge.target.distance, Some(0.0));
        assert_eq!(edge.direction, Direction::Forward);
        assert!(edge.is_resolved());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_far_endpoint_dangles() {
        let s = sheet(
            vec![shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))],
            vec![connector(2, Point::new(10.0, 10.0), Point::new(1000.0, 1000.0))],
        );
        let (graph, warnings) = infer_sheet(&s, &InferenceConfig::default());
        let edge = &graph.edges[0];
        assert_eq!(edge.source.shape_id, Some(ShapeId(1)));
        assert_eq!(edge.target.confidence, Confidence::Dangling);
        assert!(!edge.is_resolved());
        assert_eq!(warnings.count(WarningKind::GeometryAmbiguity), 1);
    }

    #[test]
    fn test_tolerance_is_configurable() {
        let s = sheet(
            vec![shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))],
            vec![connector(2, Point::new(40.0, 10.0), Point::new(5.0, 5.0))],
        );
        let (graph, _) = infer_sheet(&s, &InferenceConfig { tolerance: 20.0 });
        assert_eq!(graph.edges[0].source.confidence, Confidence::Dangling);

        let (graph, _) = infer_sheet(&s, &InferenceConfig { tolerance: 30.0 });
        assert_eq!(graph.edges[0].source.confidence, Confidence::Inferred);
    }

    #[test]
    fn test_tie_breaks_by_area_then_id() {
        let s = sheet(
            vec![
                shape(1, BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
                shape(2, BoundingBox::new(0.0, 0.0, 20.0, 20.0)),
                shape(3, BoundingBox::new(200.0, 0.0, 20.0, 20.0)),
                shape(4, BoundingBox::new(200.0, 40.0, 20.0, 20.0)),
            ],
            vec![
                connector(5, Point::new(5.0, 5.0), Point::new(210.0, 30.0)),
            ],
        );
        let (graph, warnings) = infer_sheet(&s, &InferenceConfig::default());
        let edge = &graph.edges[0];
        // Both contain the start point; the smaller box wins
        assert_eq!(edge.source.shape_id, Some(ShapeId(2)));
        // Equal area and distance; lower z-order wins
        assert_eq!(edge.target.shape_id, Some(ShapeId(3)));
        assert_eq!(edge.target.confidence, Confidence::TieBreak);
        assert_eq!(warnings.count(WarningKind::GeometryAmbiguity), 2);
    }

    #[test]
    fn test_tie_prefers_lower_z_order_over_lower_id() {
        let mut back = shape(9, BoundingBox::new(200.0, 0.0, 20.0, 20.0));
        back.z_order = 0;
        let mut front = shape(3, BoundingBox::new(200.0, 40.0, 20.0, 20.0));
        front.z_order = 5;
        let s = sheet(
            vec![front, back, shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))],
            vec![connector(7, Point::new(5.0, 5.0), Point::new(210.0, 30.0))],
        );
        let (graph, _) = infer_sheet(&s, &InferenceConfig::default());
        let target = &graph.edges[0].target;
        assert_eq!(target.shape_id, Some(ShapeId(9)));
        assert_eq!(target.confidence, Confidence::TieBreak);
    }

    #[test]
    fn test_tie_with_equal_z_order_falls_back_to_id() {
        let mut high = shape(9, BoundingBox::new(200.0, 0.0, 20.0, 20.0));
        high.z_order = 2;
        let mut low = shape(4, BoundingBox::new(200.0, 40.0, 20.0, 20.0));
        low.z_order = 2;
        let s = sheet(
            vec![high, low, shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))],
            vec![connector(7, Point::new(5.0, 5.0), Point::new(210.0, 30.0))],
        );
        let (graph, warnings) = infer_sheet(&s, &InferenceConfig::default());
        let target = &graph.edges[0].target;
        assert_eq!(target.shape_id, Some(ShapeId(4)));
        assert_eq!(target.confidence, Confidence::TieBreak);
        assert_eq!(warnings.count(WarningKind::GeometryAmbiguity), 1);
    }

    #[test]
    fn test_group_nesting_is_not_ambiguous() {
        let mut child = shape(2, BoundingBox::new(10.0, 10.0, 20.0, 20.0));
        child.parent = Some(0);
        let mut group = shape(1, BoundingBox::new(0.0, 0.0, 100.0, 100.0));
        group.kind = ShapeKind::Group;
        let s = sheet(
            vec![group, child, shape(3, BoundingBox::new(300.0, 0.0, 10.0, 10.0))],
            vec![connector(4, Point::new(15.0, 15.0), Point::new(300.0, 5.0))],
        );
        let (graph, warnings) = infer_sheet(&s, &InferenceConfig::default());
        assert_eq!(graph.edges[0].source.shape_id, Some(ShapeId(2)));
        assert_eq!(graph.edges[0].source.confidence, Confidence::Inferred);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_explicit_links_win() {
        let mut c = connector(3, Point::new(500.0, 500.0), Point::new(600.0, 600.0));
        c.start_ref = Some(ShapeId(2));
        c.end_ref = Some(ShapeId(1));
        let s = sheet(
            vec![
                shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
                shape(2, BoundingBox::new(50.0, 50.0, 10.0, 10.0)),
            ],
            vec![c],
        );
        let (graph, warnings) = infer_sheet(&s, &InferenceConfig::default());
        let edge = &graph.edges[0];
        assert!(edge.is_explicit());
        assert_eq!(edge.source.shape_id, Some(ShapeId(2)));
        assert_eq!(edge.target.shape_id, Some(ShapeId(1)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unknown_explicit_link_falls_back() {
        let mut c = connector(3, Point::new(10.0, 10.0), Point::new(50.0, 50.0));
        c.start_ref = Some(ShapeId(99));
        let s = sheet(
            vec![
                shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
                shape(2, BoundingBox::new(50.0, 50.0, 10.0, 10.0)),
            ],
            vec![c],
        );
        let (graph, warnings) = infer_sheet(&s, &InferenceConfig::default());
        assert_eq!(graph.edges[0].source.shape_id, Some(ShapeId(1)));
        assert_eq!(graph.edges[0].source.confidence, Confidence::Inferred);
        assert_eq!(warnings.count(WarningKind::GeometryAmbiguity), 1);
    }

    #[test]
    fn test_direction_from_arrows() {
        assert_eq!(Direction::from_arrows(None, Some("triangle")), Direction::Forward);
        assert_eq!(Direction::from_arrows(Some("arrow"), None), Direction::Reverse);
        assert_eq!(
            Direction::from_arrows(Some("arrow"), Some("stealth")),
            Direction::Bidirectional
        );
        assert_eq!(Direction::from_arrows(Some("none"), None), Direction::Undirected);
    }

    #[test]
    fn test_reverse_swaps_endpoints() {
        let mut c = connector(3, Point::new(10.0, 10.0), Point::new(50.0, 50.0));
        c.head_arrow = Some("triangle".to_string());
        c.tail_arrow = None;
        let s = sheet(
            vec![
                shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
                shape(2, BoundingBox::new(50.0, 50.0, 10.0, 10.0)),
            ],
            vec![c],
        );
        let (graph, _) = infer_sheet(&s, &InferenceConfig::default());
        assert_eq!(graph.edges[0].direction, Direction::Reverse);
        assert_eq!(graph.edges[0].source.shape_id, Some(ShapeId(2)));
        assert_eq!(graph.edges[0].target.shape_id, Some(ShapeId(1)));
    }

    #[test]
    fn test_edge_serializes() {
        let s = sheet(
            vec![
                shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
                shape(2, BoundingBox::new(50.0, 50.0, 10.0, 10.0)),
            ],
            vec![connector(3, Point::new(10.0, 10.0), Point::new(50.0, 50.0))],
        );
        let (graph, _) = infer_sheet(&s, &InferenceConfig::default());
        let json = serde_json::to_value(&graph.edges[0]).unwrap();
        assert_eq!(json["source"]["confidence"], "inferred");
        assert_eq!(json["direction"], "forward");
        assert_eq!(json["target"]["shape_id"], 2);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let s = sheet(
            vec![
                shape(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
                shape(2, BoundingBox::new(20.0, 0.0, 10.0, 10.0)),
            ],
            vec![connector(3, Point::new(15.0, 5.0), Point::new(25.0, 5.0))],
        );
        let first = infer_sheet(&s, &InferenceConfig::default());
        let second = infer_sheet(&s, &InferenceConfig::default());
        assert_eq!(first, second);
    }
}
