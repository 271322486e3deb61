use curvesynth::{
    curve::{bounded_curve, CurveGraph, EdgeData, GraphData, GridSize, NodeData, Point},
    dsp::lfo::{lfo_rate_ms, LfoTable},
    synth::params::Envelope,
    CurveError,
};

fn four_node_lfo() -> CurveGraph {
    let mut graph = CurveGraph::chain(&[(0.0, 1.0), (0.3, 0.2), (0.6, 0.8), (1.0, 0.0)]);
    let edges: Vec<_> = graph.edges().iter().map(|e| e.id).collect();
    for id in edges {
        graph.set_curve(id, 0.05, -0.05).unwrap();
    }
    graph
}

#[test]
fn deleting_an_interior_node_relinks_with_one_straight_edge() {
    let mut graph = four_node_lfo();
    let before: Vec<_> = graph.edges().iter().map(|e| e.id).collect();
    let victim = graph.ordered_nodes().unwrap()[1];

    graph.delete_node(victim.id).unwrap();

    let after: Vec<_> = graph.edges().iter().map(|e| e.id).collect();
    let removed = before.iter().filter(|id| !after.contains(id)).count();
    let added: Vec<_> = graph
        .edges()
        .iter()
        .filter(|e| !before.contains(&e.id))
        .collect();

    assert_eq!(removed, 2);
    assert_eq!(added.len(), 1);
    assert_eq!((added[0].curve_x, added[0].curve_y), (0.0, 0.0));

    let ordered = graph.ordered_nodes().unwrap();
    assert_eq!(ordered.len(), 3);
    assert_eq!(added[0].source, ordered[0].id);
    assert_eq!(added[0].target, ordered[1].id);
}

#[test]
fn ordering_is_a_connected_permutation() {
    let mut graph = four_node_lfo();
    graph.insert_node(0.45, 0.5).unwrap();
    graph.insert_node(0.9, 0.1).unwrap();

    let ordered = graph.ordered_nodes().unwrap();
    assert_eq!(ordered.len(), graph.nodes().len());
    for pair in ordered.windows(2) {
        let joining = graph
            .edges()
            .iter()
            .filter(|e| e.source == pair[0].id && e.target == pair[1].id)
            .count();
        assert_eq!(joining, 1);
        assert!(pair[0].x < pair[1].x);
    }
    assert_eq!(graph.ordered_nodes().unwrap(), ordered);
}

#[test]
fn control_points_never_leave_the_segment_box() {
    let source = Point::new(0.2, 0.9);
    let target = Point::new(0.6, 0.1);
    for &raw_x in &[-1e6, -1.0, -0.1, 0.0, 0.07, 0.5, 1e6] {
        for &raw_y in &[-1e6, -0.3, 0.0, 0.2, 1e6] {
            let control = bounded_curve(source, target, raw_x, raw_y).control();
            assert!((0.2..=0.6).contains(&control.x), "x {raw_x} -> {}", control.x);
            assert!((0.1..=0.9).contains(&control.y), "y {raw_y} -> {}", control.y);
        }
    }
}

#[test]
fn edited_lfo_still_samples() {
    let mut graph = CurveGraph::default_lfo();
    graph.insert_node(0.25, 0.0).unwrap();
    let table = LfoTable::build(&graph, lfo_rate_ms(1.0)).unwrap();
    assert_eq!(table.period_ms(), 63);
    assert!(table.samples().iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn cyclic_graph_is_reported_not_followed() {
    let data = GraphData {
        nodes: vec![
            NodeData {
                id: 1,
                x: 0.0,
                y: 0.0,
                anchor_x: false,
                anchor_y: false,
            },
            NodeData {
                id: 2,
                x: 8.0,
                y: 8.0,
                anchor_x: false,
                anchor_y: false,
            },
        ],
        edges: vec![
            EdgeData {
                id: 1,
                source: 1,
                target: 2,
                curve_x: 0.0,
                curve_y: 0.0,
            },
            EdgeData {
                id: 2,
                source: 2,
                target: 1,
                curve_x: 0.0,
                curve_y: 0.0,
            },
        ],
    };
    let graph = CurveGraph::from_grid(&data, GridSize::LFO);
    assert_eq!(graph.ordered_nodes(), Err(CurveError::NoPathStart));
    assert_eq!(graph.validate(), Err(CurveError::NoPathStart));
}

#[cfg(feature = "serde")]
#[test]
fn envelope_editor_wire_form_round_trips() {
    let envelope = Envelope::default();
    let json = serde_json::to_string(&envelope.to_graph().to_grid(GridSize::ENVELOPE)).unwrap();
    assert!(json.contains("\"curveX\""));
    assert!(json.contains("\"anchorY\":true"));

    let data: GraphData = serde_json::from_str(&json).unwrap();
    let back = Envelope::from_graph(&CurveGraph::from_grid(&data, GridSize::ENVELOPE)).unwrap();
    assert!((back.hold.x - envelope.hold.x).abs() < 1e-5);
    assert!((back.decay.y - envelope.decay.y).abs() < 1e-5);
    assert!((back.release.x - envelope.release.x).abs() < 1e-5);
}
