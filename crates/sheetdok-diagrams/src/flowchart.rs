//! Mermaid flowchart generation from a sheet's connection graph

use std::collections::HashSet;
use std::fmt;

use sheetdok_model::{ShapeId, Sheet};

use crate::inference::{ConnectionEdge, ConnectionGraph, Direction, Endpoint};

/// A node in the generated flowchart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    /// Stand-in for a dangling connector end
    pub placeholder: bool,
}

/// An edge in the generated flowchart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub direction: Direction,
    pub label: Option<String>,
}

impl FlowEdge {
    fn arrow(&self) -> String {
        let label = self.label.as_deref().map(escape_label);
        match (self.direction, label) {
            (Direction::Bidirectional, None) => "<-->".to_string(),
            (Direction::Bidirectional, Some(l)) => format!("<-->|\"{}\"|", l),
            (Direction::Undirected, None) => "---".to_string(),
            (Direction::Undirected, Some(l)) => format!("---|\"{}\"|", l),
            (_, None) => "-->".to_string(),
            (_, Some(l)) => format!("-- \"{}\" -->", l),
        }
    }
}

/// A Mermaid `flowchart TD` for one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flowchart {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl Flowchart {
    /// Build the flowchart of a sheet
    ///
    /// Every non-group shape is a node, connected or not. Groups appear only
    /// when an edge attaches to them. Duplicate source/target pairs are
    /// emitted once; self loops are kept.
    pub fn build(sheet: &Sheet, graph: &ConnectionGraph) -> Self {
        let touched: HashSet<usize> = graph
            .edges
            .iter()
            .flat_map(|e| [e.source.shape, e.target.shape])
            .flatten()
            .collect();

        let mut nodes: Vec<FlowNode> = sheet
            .shapes
            .iter()
            .enumerate()
            .filter(|(idx, shape)| !shape.is_group() || touched.contains(idx))
            .map(|(_, shape)| FlowNode {
                id: shape_node_id(shape.id),
                label: shape.label().to_string(),
                placeholder: false,
            })
            .collect();

        let mut seen_pairs = HashSet::new();
        let mut edges = Vec::new();
        for edge in &graph.edges {
            let (from, to) = endpoint_ids(sheet, edge, &mut nodes);
            if !seen_pairs.insert((from.clone(), to.clone())) {
                continue;
            }
            edges.push(FlowEdge {
                from,
                to,
                direction: edge.direction,
                label: edge.label.clone(),
            });
        }

        Self { nodes, edges }
    }

    /// No nodes and no edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Mermaid source text, without code fences
    pub fn to_mermaid(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Flowchart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "flowchart TD")?;
        for node in &self.nodes {
            writeln!(f, "    {}[\"{}\"]", node.id, escape_label(&node.label))?;
        }
        for edge in &self.edges {
            writeln!(f, "    {} {} {}", edge.from, edge.arrow(), edge.to)?;
        }
        Ok(())
    }
}

/// Node id of a shape
pub fn shape_node_id(id: ShapeId) -> String {
    format!("S{}", id.0)
}

fn endpoint_ids(sheet: &Sheet, edge: &ConnectionEdge, nodes: &mut Vec<FlowNode>) -> (String, String) {
    let (start_role, end_role) = match edge.direction {
        Direction::Reverse => ("end", "start"),
        _ => ("start", "end"),
    };
    let id = |endpoint: &Endpoint, role: &str, nodes: &mut Vec<FlowNode>| match endpoint
        .shape
        .and_then(|idx| sheet.shapes.get(idx))
    {
        Some(shape) => shape_node_id(shape.id),
        None => {
            let id = format!("C{}_{}", edge.connector_id.0, role);
            if !nodes.iter().any(|n| n.id == id) {
                nodes.push(FlowNode {
                    id: id.clone(),
                    label: format!("unconnected {}", role),
                    placeholder: true,
                });
            }
            id
        }
    };
    let from = id(&edge.source, start_role, nodes);
    let to = id(&edge.target, end_role, nodes);
    (from, to)
}

/// Escape text for a quoted Mermaid label
pub fn escape_label(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}
