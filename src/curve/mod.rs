//! Curve graphs: the editable shapes behind envelopes and LFOs.
//!
//! A curve graph is a chain of nodes joined by single-control-point bezier
//! edges. The editor manipulates it in grid units, the engine reads it in the
//! normalized `[0, 1] x [0, 1]` domain, with y pointing down (screen space).

/*
Shape of a Curve Graph
======================

    y=0 ┐        (2)────(3)
        │       ╱          ╲
        │      ╱            (4)
        │     ╱                ╲
    y=1 └──(1)                  (5)──→ x
          start                 end

Nodes are kept in an unordered set; the order comes from the edges. Exactly
one node is never the target of an edge, and walking `source → target` from
it visits every node once, left to right. Anything else (a cycle, a second
chain, a dangling node) is a malformed graph and every operation that needs
the order reports it instead of guessing.

Each edge stores its curvature as an offset (curve_x, curve_y) of the control
point from the segment midpoint. The control point is always clamped into the
segment's bounding box so a rendered curve never overshoots its endpoints.
*/

/// Control-point clamping for edge curvature.
pub mod bezier;
/// Envelope <-> five-node chain conversion.
pub mod envelope;
/// Node/edge storage and the chain operations.
pub mod graph;
/// Grid-unit wire form used by the editor.
pub mod grid;

pub use bezier::{bounded_curve, BoundedCurve, Point};
pub use graph::{AnchorKind, Axis, CurveEdge, CurveGraph, CurveNode, EdgeId, Neighbours, NodeId};
pub use grid::{snap_to, EdgeData, GraphData, GridSize, NodeData};
