use std::fmt;

use crate::curve::{Axis, EdgeId, NodeId};

/// Structural problems with a curve graph, or an edit the graph refuses.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveError {
    EmptyGraph,
    /// Every node is the target of some edge.
    NoPathStart,
    MultiplePathStarts { count: usize },
    /// The forward walk revisited a node.
    Cycle { at: NodeId },
    /// The walk ended before reaching every node.
    Disconnected { visited: usize, total: usize },
    UnknownNode(NodeId),
    UnknownEdge(EdgeId),
    DuplicateX { x: f32 },
    /// No edge spans the sampled x position.
    EdgeNotCovering { ratio: f32 },
    Anchored { id: NodeId, axis: Axis },
    /// The chain does not have the start/attack/hold/decay/release shape.
    NotAnEnvelope { nodes: usize },
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::EmptyGraph => write!(f, "curve graph has no nodes"),
            CurveError::NoPathStart => write!(f, "curve graph has no start node"),
            CurveError::MultiplePathStarts { count } => {
                write!(f, "curve graph has {count} start nodes, expected one")
            }
            CurveError::Cycle { at } => write!(f, "curve graph contains a cycle at node {at}"),
            CurveError::Disconnected { visited, total } => {
                write!(f, "curve path reaches {visited} of {total} nodes")
            }
            CurveError::UnknownNode(id) => write!(f, "unknown node {id}"),
            CurveError::UnknownEdge(id) => write!(f, "unknown edge {id}"),
            CurveError::DuplicateX { x } => write!(f, "two nodes share x = {x}"),
            CurveError::EdgeNotCovering { ratio } => {
                write!(f, "no edge covers x = {ratio}")
            }
            CurveError::Anchored { id, axis } => {
                write!(f, "node {id} is anchored on the {axis:?} axis")
            }
            CurveError::NotAnEnvelope { nodes } => {
                write!(f, "envelope graph needs 5 chained nodes, found {nodes}")
            }
        }
    }
}

impl std::error::Error for CurveError {}

/// Conditions the render thread reports out of band instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Rendering panicked; the block was replaced with silence.
    RenderPanic,
    /// A note-on arrived with every voice busy and none releasing.
    VoicesExhausted,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::RenderPanic => write!(f, "render block panicked, output silenced"),
            FaultKind::VoicesExhausted => write!(f, "no voice available for note-on"),
        }
    }
}
