//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use butterfly_search::weighting::calc_edge_weight;
use butterfly_search::{ChGraph, ChGraphBuilder, EdgeId, Graph, NodeId, RoadGraph, Weighting};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Install a test subscriber once; `RUST_LOG=butterfly_search=debug` to see search logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Two routes from 1 to 4: via 2 (5 + 5) and via 3 (3 + 3); node 0 is isolated
///
/// Edge ids: 0 = 1→2, 1 = 2→4, 2 = 1→3, 3 = 3→4.
pub fn diamond() -> RoadGraph {
    let mut b = RoadGraph::builder(5);
    b.add_edge(1, 2, 5.0, 50.0);
    b.add_edge(2, 4, 5.0, 50.0);
    b.add_edge(1, 3, 3.0, 50.0);
    b.add_edge(3, 4, 3.0, 50.0);
    b.build().expect("diamond graph")
}

/// Sources 0 and 1 reach target 3 through hub 2 with costs 10 and 7
pub fn two_sources_one_target() -> RoadGraph {
    let mut b = RoadGraph::builder(4);
    b.add_edge(0, 2, 4.0, 50.0);
    b.add_edge(1, 2, 1.0, 50.0);
    b.add_edge(2, 3, 6.0, 50.0);
    b.build().expect("hub graph")
}

/// Random directed graph without self loops; about one edge in ten has no access
pub fn random_graph(rng: &mut StdRng, n_nodes: usize, n_edges: usize) -> RoadGraph {
    const SPEEDS: [f64; 5] = [0.0, 30.0, 50.0, 90.0, 120.0];
    let mut b = RoadGraph::builder(n_nodes);
    for _ in 0..n_edges {
        let from = rng.random_range(0..n_nodes) as NodeId;
        let mut to = rng.random_range(0..n_nodes) as NodeId;
        if to == from {
            to = (to + 1) % n_nodes as NodeId;
        }
        let distance = rng.random_range(10.0..1000.0_f64).round();
        let speed = if rng.random_range(0..10) == 0 {
            SPEEDS[0]
        } else {
            SPEEDS[rng.random_range(1..SPEEDS.len())]
        };
        b.add_edge(from, to, distance, speed);
    }
    b.build().expect("random graph")
}

/// Random contraction order
pub fn random_order(rng: &mut StdRng, n_nodes: usize) -> Vec<NodeId> {
    let mut order: Vec<NodeId> = (0..n_nodes as NodeId).collect();
    order.shuffle(rng);
    order
}

struct OverlayEdge {
    id: EdgeId,
    from: NodeId,
    to: NodeId,
    weight: f64,
}

/// Contract nodes in `order` (first = lowest level) without witness searches
///
/// Every in/out pair around a contracted node becomes a shortcut, so the
/// result is a valid hierarchy for `weighting` however bad the order is.
pub fn contract<W: Weighting>(base: Arc<RoadGraph>, weighting: &W, order: &[NodeId]) -> ChGraph {
    let mut levels = vec![0u32; base.node_count()];
    for (rank, &node) in order.iter().enumerate() {
        levels[node as usize] = rank as u32;
    }

    let mut overlay = Vec::new();
    for id in 0..base.edge_count() as EdgeId {
        let state = base.edge(id).expect("base edge");
        let weight = calc_edge_weight(weighting, &state, false, None).expect("base weight");
        if weight.is_finite() {
            overlay.push(OverlayEdge {
                id,
                from: state.base,
                to: state.adj,
                weight,
            });
        }
    }

    let mut builder = ChGraphBuilder::new(base, levels.clone());
    for &v in order {
        let level = levels[v as usize];
        let incoming: Vec<(EdgeId, NodeId, f64)> = overlay
            .iter()
            .filter(|e| e.to == v && levels[e.from as usize] > level)
            .map(|e| (e.id, e.from, e.weight))
            .collect();
        let outgoing: Vec<(EdgeId, NodeId, f64)> = overlay
            .iter()
            .filter(|e| e.from == v && levels[e.to as usize] > level)
            .map(|e| (e.id, e.to, e.weight))
            .collect();

        for &(in_id, u, in_w) in &incoming {
            for &(out_id, w, out_w) in &outgoing {
                if u == w {
                    continue;
                }
                let weight = in_w + out_w;
                let id = builder
                    .add_shortcut(u, w, weight, (in_id, out_id))
                    .expect("shortcut");
                overlay.push(OverlayEdge {
                    id,
                    from: u,
                    to: w,
                    weight,
                });
            }
        }
    }
    builder.build().expect("contracted graph")
}

/// Compare two optional costs with a relative tolerance
pub fn assert_same_cost(a: Option<f64>, b: Option<f64>, context: &str) {
    match (a, b) {
        (None, None) => {}
        (Some(x), Some(y)) => {
            let tol = 1e-9 * x.abs().max(1.0);
            assert!((x - y).abs() <= tol, "{context}: {x} != {y}");
        }
        _ => panic!("{context}: {a:?} vs {b:?}"),
    }
}
