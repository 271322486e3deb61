#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::graph::{AnchorKind, CurveEdge, CurveGraph, CurveNode, EdgeId, NodeId};

/// Editor grid dimensions. Wire coordinates live in `[0, x] x [0, y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSize {
    pub x: f32,
    pub y: f32,
}

impl GridSize {
    pub const ENVELOPE: GridSize = GridSize { x: 4.0, y: 8.0 };
    pub const LFO: GridSize = GridSize { x: 8.0, y: 8.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Round `value` to the nearest multiple of `step`.
pub fn snap_to(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "is_false"))]
    pub anchor_x: bool,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "is_false"))]
    pub anchor_y: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub curve_x: f32,
    pub curve_y: f32,
}

/// A curve graph as the editor exchanges it, in grid units.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphData {
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
}

#[cfg(feature = "serde")]
fn is_false(value: &bool) -> bool {
    !*value
}

impl CurveGraph {
    /// Scale node positions and edge curvature out to grid units.
    pub fn to_grid(&self, grid: GridSize) -> GraphData {
        let nodes = self
            .nodes()
            .iter()
            .map(|n| NodeData {
                id: n.id,
                x: n.x * grid.x,
                y: n.y * grid.y,
                anchor_x: n.anchor.locks_x(),
                anchor_y: n.anchor.locks_y(),
            })
            .collect();
        let edges = self
            .edges()
            .iter()
            .map(|e| EdgeData {
                id: e.id,
                source: e.source,
                target: e.target,
                curve_x: e.curve_x * grid.x,
                curve_y: e.curve_y * grid.y,
            })
            .collect();

        GraphData { nodes, edges }
    }

    /// Scale grid-unit wire data back into the normalized domain.
    ///
    /// The result is not validated; callers that need the chain call
    /// [`CurveGraph::validate`] or [`CurveGraph::ordered_nodes`].
    pub fn from_grid(data: &GraphData, grid: GridSize) -> Self {
        let nodes = data
            .nodes
            .iter()
            .map(|n| {
                CurveNode::new(n.id, n.x / grid.x, n.y / grid.y)
                    .anchored(AnchorKind::from_flags(n.anchor_x, n.anchor_y))
            })
            .collect();
        let edges = data
            .edges
            .iter()
            .map(|e| {
                CurveEdge::straight(e.id, e.source, e.target)
                    .with_curve(e.curve_x / grid.x, e.curve_y / grid.y)
            })
            .collect();

        CurveGraph::from_parts(nodes, edges)
    }
}
