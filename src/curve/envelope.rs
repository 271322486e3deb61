use crate::{
    curve::graph::{AnchorKind, CurveEdge, CurveGraph, CurveNode},
    error::CurveError,
    synth::params::{Envelope, EnvelopeData},
};

/*
Envelope as a Curve Graph
=========================

The envelope editor shows the four phases as a fixed five-node chain:

    y=0 ┐    (2)────(3)
        │   ╱          ╲
        │  ╱            (4)──╮
        │ ╱                   ╲
    y=1 └(1)                   (5)
         start attack hold decay release

  node      x                          y           anchor
  start     0                          1           both
  attack    A                          0           y
  hold      A + H                      0           y
  decay     A + H + D                  decay.y     free
  release   A + H + D + R              1           y

Phase durations are normalized knob values in [0, 1]; the sums are divided
by the number of timed phases (4) so the whole chain fits the unit square.
The decay node's y is the inverted sustain level, exactly as stored in the
envelope. The decay edge keeps its curvature flipped (1 - curve_y), and the
hold edge is always flat.
*/

const TIMED_PHASES: f32 = 4.0;

const START: u32 = 1;
const ATTACK: u32 = 2;
const HOLD: u32 = 3;
const DECAY: u32 = 4;
const RELEASE: u32 = 5;

impl Envelope {
    /// The editable five-node chain for this envelope.
    ///
    /// Edge curvature is stored as edited, not bounded. The decay edge in
    /// particular holds `1 - curve_y` and can sit outside its segment box, so
    /// pass stored curvature through [`bounded_curve`](crate::curve::bounded_curve)
    /// before drawing or sampling it.
    pub fn to_graph(&self) -> CurveGraph {
        let attack_x = self.attack.x;
        let hold_x = attack_x + self.hold.x;
        let decay_x = hold_x + self.decay.x;
        let release_x = decay_x + self.release.x;

        let nodes = vec![
            CurveNode::new(START, 0.0, 1.0).anchored(AnchorKind::BothAnchored),
            CurveNode::new(ATTACK, attack_x / TIMED_PHASES, 0.0).anchored(AnchorKind::YAnchored),
            CurveNode::new(HOLD, hold_x / TIMED_PHASES, 0.0).anchored(AnchorKind::YAnchored),
            CurveNode::new(DECAY, decay_x / TIMED_PHASES, self.decay.y),
            CurveNode::new(RELEASE, release_x / TIMED_PHASES, 1.0)
                .anchored(AnchorKind::YAnchored),
        ];

        let edges = vec![
            CurveEdge::straight(1, START, ATTACK)
                .with_curve(self.attack.curve_x, self.attack.curve_y),
            CurveEdge::straight(2, ATTACK, HOLD),
            CurveEdge::straight(3, HOLD, DECAY)
                .with_curve(self.decay.curve_x, 1.0 - self.decay.curve_y),
            CurveEdge::straight(4, DECAY, RELEASE)
                .with_curve(self.release.curve_x, self.release.curve_y),
        ];

        CurveGraph::from_parts(nodes, edges)
    }

    /// Read an envelope back from an edited chain.
    ///
    /// Works on chain order rather than node ids, so a chain rebuilt through
    /// the wire form is accepted as long as it still has five nodes.
    pub fn from_graph(graph: &CurveGraph) -> Result<Self, CurveError> {
        let nodes = graph.ordered_nodes()?;
        if nodes.len() != 5 {
            return Err(CurveError::NotAnEnvelope { nodes: nodes.len() });
        }
        let edges = graph.ordered_edges()?;

        let x = |i: usize| nodes[i].x * TIMED_PHASES;

        Ok(Self {
            attack: EnvelopeData {
                x: x(1),
                y: 0.0,
                curve_x: edges[0].curve_x,
                curve_y: edges[0].curve_y,
            },
            hold: EnvelopeData {
                x: x(2) - x(1),
                y: 0.0,
                curve_x: 0.0,
                curve_y: 0.0,
            },
            decay: EnvelopeData {
                x: x(3) - x(2),
                y: nodes[3].y,
                curve_x: edges[2].curve_x,
                curve_y: 1.0 - edges[2].curve_y,
            },
            release: EnvelopeData {
                x: x(4) - x(3),
                y: 0.0,
                curve_x: edges[3].curve_x,
                curve_y: edges[3].curve_y,
            },
        })
    }
}
