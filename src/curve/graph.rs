use crate::{
    curve::bezier::{bounded_curve, BoundedCurve, Point},
    error::CurveError,
};

pub type NodeId = u32;
pub type EdgeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Which coordinates of a node the editor may not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorKind {
    #[default]
    Free,
    XAnchored,
    YAnchored,
    BothAnchored,
}

impl AnchorKind {
    pub fn from_flags(anchor_x: bool, anchor_y: bool) -> Self {
        match (anchor_x, anchor_y) {
            (false, false) => AnchorKind::Free,
            (true, false) => AnchorKind::XAnchored,
            (false, true) => AnchorKind::YAnchored,
            (true, true) => AnchorKind::BothAnchored,
        }
    }

    pub fn locks_x(self) -> bool {
        matches!(self, AnchorKind::XAnchored | AnchorKind::BothAnchored)
    }

    pub fn locks_y(self) -> bool {
        matches!(self, AnchorKind::YAnchored | AnchorKind::BothAnchored)
    }

    pub fn is_free(self) -> bool {
        self == AnchorKind::Free
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub anchor: AnchorKind,
}

impl CurveNode {
    pub fn new(id: NodeId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            anchor: AnchorKind::Free,
        }
    }

    pub fn anchored(mut self, anchor: AnchorKind) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub curve_x: f32, // control point offset from the segment midpoint
    pub curve_y: f32,
}

impl CurveEdge {
    pub fn straight(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            curve_x: 0.0,
            curve_y: 0.0,
        }
    }

    pub fn with_curve(mut self, curve_x: f32, curve_y: f32) -> Self {
        self.curve_x = curve_x;
        self.curve_y = curve_y;
        self
    }
}

/// Immediate predecessor and successor of a node along the chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Neighbours {
    pub left: Option<CurveNode>,
    pub right: Option<CurveNode>,
}

/// A normalized x → y function stored as a chain of nodes and edges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurveGraph {
    nodes: Vec<CurveNode>,
    edges: Vec<CurveEdge>,
    next_id: u32,
}

impl CurveGraph {
    /// Build a graph from raw parts. Nothing is validated here; see [`CurveGraph::validate`].
    pub fn from_parts(nodes: Vec<CurveNode>, edges: Vec<CurveEdge>) -> Self {
        let next_id = nodes
            .iter()
            .map(|n| n.id)
            .chain(edges.iter().map(|e| e.id))
            .max()
            .map_or(1, |id| id + 1);

        Self {
            nodes,
            edges,
            next_id,
        }
    }

    /// Connect `points` left to right with straight edges.
    pub fn chain(points: &[(f32, f32)]) -> Self {
        let nodes: Vec<CurveNode> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| CurveNode::new(i as NodeId + 1, x, y))
            .collect();
        let edges = nodes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| CurveEdge::straight(i as EdgeId + 1, pair[0].id, pair[1].id))
            .collect();

        Self::from_parts(nodes, edges)
    }

    /// Initial LFO shape: a single rise and fall across the period.
    pub fn default_lfo() -> Self {
        let mut graph = Self::chain(&[(0.0, 1.0), (0.5, 0.0), (1.0, 1.0)]);
        graph.nodes[0].anchor = AnchorKind::XAnchored;
        graph.nodes[2].anchor = AnchorKind::XAnchored;
        graph
    }

    pub fn nodes(&self) -> &[CurveNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CurveEdge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Result<&CurveNode, CurveError> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or(CurveError::UnknownNode(id))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&CurveEdge, CurveError> {
        self.edges
            .iter()
            .find(|e| e.id == id)
            .ok_or(CurveError::UnknownEdge(id))
    }

    fn outgoing(&self, id: NodeId) -> Option<&CurveEdge> {
        self.edges.iter().find(|e| e.source == id)
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Nodes in chain order, starting from the one node that no edge targets.
    ///
    /// The walk is bounded by the node count, so a cycle is reported rather
    /// than followed forever.
    pub fn ordered_nodes(&self) -> Result<Vec<CurveNode>, CurveError> {
        if self.nodes.is_empty() {
            return Err(CurveError::EmptyGraph);
        }

        let mut starts = self
            .nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id));
        let start = *starts.next().ok_or(CurveError::NoPathStart)?;
        let extra = starts.count();
        if extra > 0 {
            return Err(CurveError::MultiplePathStarts { count: extra + 1 });
        }

        let mut ordered = Vec::with_capacity(self.nodes.len());
        ordered.push(start);
        let mut current = start.id;

        for _ in 0..self.nodes.len() {
            let Some(edge) = self.outgoing(current) else {
                break;
            };
            let target = *self.node(edge.target)?;
            if ordered.iter().any(|n| n.id == target.id) {
                return Err(CurveError::Cycle { at: target.id });
            }
            ordered.push(target);
            current = target.id;
        }

        if ordered.len() != self.nodes.len() {
            return Err(CurveError::Disconnected {
                visited: ordered.len(),
                total: self.nodes.len(),
            });
        }

        Ok(ordered)
    }

    /// Edges in chain order; `result[i]` joins `ordered_nodes()[i]` and `[i + 1]`.
    pub fn ordered_edges(&self) -> Result<Vec<CurveEdge>, CurveError> {
        let ordered = self.ordered_nodes()?;
        ordered
            .windows(2)
            .map(|pair| {
                self.edges
                    .iter()
                    .find(|e| e.source == pair[0].id && e.target == pair[1].id)
                    .copied()
                    .ok_or(CurveError::Disconnected {
                        visited: 0,
                        total: ordered.len(),
                    })
            })
            .collect()
    }

    /// Check the single left-to-right chain invariant.
    pub fn validate(&self) -> Result<(), CurveError> {
        let ordered = self.ordered_nodes()?;
        if self.edges.len() != ordered.len() - 1 {
            return Err(CurveError::Disconnected {
                visited: ordered.len(),
                total: self.nodes.len(),
            });
        }
        // x never goes backwards along the chain
        for pair in ordered.windows(2) {
            if pair[1].x < pair[0].x {
                return Err(CurveError::Cycle { at: pair[1].id });
            }
        }
        Ok(())
    }

    /// Neighbours of `node` along the chain.
    ///
    /// For a node that is not in the graph (a candidate insertion point), the
    /// nearest nodes by x on each side are taken, then the chain is walked from
    /// the left candidate until a directly connected pair reaching the right
    /// candidate is found.
    pub fn neighbours(&self, node: &CurveNode) -> Result<Neighbours, CurveError> {
        let ordered = self.ordered_nodes()?;

        if let Some(index) = ordered.iter().position(|n| n.id == node.id) {
            return Ok(Neighbours {
                left: index.checked_sub(1).map(|i| ordered[i]),
                right: ordered.get(index + 1).copied(),
            });
        }

        let left = ordered
            .iter()
            .filter(|n| n.x < node.x)
            .max_by(|a, b| a.x.total_cmp(&b.x))
            .copied();
        let right = ordered
            .iter()
            .filter(|n| n.x > node.x)
            .min_by(|a, b| a.x.total_cmp(&b.x))
            .copied();

        let (Some(left), Some(right)) = (left, right) else {
            return Ok(Neighbours { left, right });
        };

        let Some(start) = ordered.iter().position(|n| n.id == left.id) else {
            return Ok(Neighbours::default());
        };

        // advance until the pair is joined by a single edge
        for index in start..ordered.len() - 1 {
            if ordered[index + 1].id == right.id {
                return Ok(Neighbours {
                    left: Some(ordered[index]),
                    right: Some(ordered[index + 1]),
                });
            }
        }

        Ok(Neighbours {
            left: Some(left),
            right: ordered.get(start + 1).copied(),
        })
    }

    /// Insert a free node at `(x, y)`, splitting the edge it lands on.
    ///
    /// The new left edge is straight; the new right edge inherits the
    /// curvature of the split edge so the shape right of the insertion point
    /// is preserved.
    pub fn insert_node(&mut self, x: f32, y: f32) -> Result<NodeId, CurveError> {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);

        if self.nodes.iter().any(|n| n.x == x) {
            return Err(CurveError::DuplicateX { x });
        }

        if self.nodes.is_empty() {
            let id = self.allocate_id();
            self.nodes.push(CurveNode::new(id, x, y));
            return Ok(id);
        }

        let candidate = CurveNode::new(self.next_id, x, y);
        let Neighbours { left, right } = self.neighbours(&candidate)?;

        let id = self.allocate_id();
        let node = CurveNode::new(id, x, y);

        let bridge = match (left, right) {
            (Some(l), Some(r)) => self
                .edges
                .iter()
                .position(|e| e.source == l.id && e.target == r.id),
            _ => None,
        };
        let (curve_x, curve_y) = match bridge {
            Some(index) => {
                let removed = self.edges.remove(index);
                (removed.curve_x, removed.curve_y)
            }
            None => (0.0, 0.0),
        };

        self.nodes.push(node);
        if let Some(left) = left {
            let edge_id = self.allocate_id();
            self.edges.push(CurveEdge::straight(edge_id, left.id, id));
        }
        if let Some(right) = right {
            let edge_id = self.allocate_id();
            self.edges
                .push(CurveEdge::straight(edge_id, id, right.id).with_curve(curve_x, curve_y));
        }

        Ok(id)
    }

    /// Remove a node and join its former neighbours with a straight edge.
    ///
    /// Anchored nodes cannot be deleted.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), CurveError> {
        let node = *self.node(id)?;
        if node.anchor.locks_x() {
            return Err(CurveError::Anchored { id, axis: Axis::X });
        }
        if node.anchor.locks_y() {
            return Err(CurveError::Anchored { id, axis: Axis::Y });
        }

        let Neighbours { left, right } = self.neighbours(&node)?;

        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| e.source != id && e.target != id);

        if let (Some(left), Some(right)) = (left, right) {
            let edge_id = self.allocate_id();
            self.edges.push(CurveEdge::straight(edge_id, left.id, right.id));
        }

        Ok(())
    }

    /// Drag a node to `(x, y)`.
    ///
    /// Anchored axes keep their value, and both axes stay inside `[0, 1]`. x
    /// stays strictly between the neighbours so no two nodes share it; with
    /// no room between them the node keeps its x. Returns the node as placed.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> Result<CurveNode, CurveError> {
        let node = *self.node(id)?;
        if node.anchor == AnchorKind::BothAnchored {
            return Err(CurveError::Anchored { id, axis: Axis::X });
        }

        let Neighbours { left, right } = self.neighbours(&node)?;
        let lower = left.map_or(0.0, |n| next_above(n.x)).max(0.0);
        let upper = right.map_or(1.0, |n| next_below(n.x)).min(1.0);

        let x = if node.anchor.locks_x() || lower > upper {
            node.x
        } else {
            x.clamp(lower, upper)
        };
        let y = if node.anchor.locks_y() {
            node.y
        } else {
            y.clamp(0.0, 1.0)
        };

        let slot = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(CurveError::UnknownNode(id))?;
        slot.x = x;
        slot.y = y;
        Ok(*slot)
    }

    /// Drag an edge's control point; the offset is clamped to the segment box.
    pub fn set_curve(
        &mut self,
        edge_id: EdgeId,
        raw_x: f32,
        raw_y: f32,
    ) -> Result<BoundedCurve, CurveError> {
        let edge = *self.edge(edge_id)?;
        let source = self.node(edge.source)?.position();
        let target = self.node(edge.target)?.position();
        let bounded = bounded_curve(source, target, raw_x, raw_y);

        if let Some(slot) = self.edges.iter_mut().find(|e| e.id == edge_id) {
            slot.curve_x = bounded.curve_x;
            slot.curve_y = bounded.curve_y;
        }
        Ok(bounded)
    }

    pub fn reset_curve(&mut self, edge_id: EdgeId) -> Result<(), CurveError> {
        let slot = self
            .edges
            .iter_mut()
            .find(|e| e.id == edge_id)
            .ok_or(CurveError::UnknownEdge(edge_id))?;
        slot.curve_x = 0.0;
        slot.curve_y = 0.0;
        Ok(())
    }
}

/// Smallest f32 above `x`, for x in `[0, 1]`.
fn next_above(x: f32) -> f32 {
    f32::from_bits(x.max(0.0).to_bits() + 1)
}

/// Largest f32 below `x`, for x in `[0, 1]`; zero has nothing below it.
fn next_below(x: f32) -> f32 {
    if x <= 0.0 {
        x
    } else {
        f32::from_bits(x.to_bits() - 1)
    }
}
