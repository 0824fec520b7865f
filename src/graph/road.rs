//! In-memory road graph in compressed sparse row layout
//!
//! Both adjacency directions are stored as `offsets` + edge id arrays built
//! with a counting pass and a prefix sum, so that expanding a node is a
//! contiguous slice walk.

use super::{Adjacency, Direction, EdgeId, EdgeState, Graph, NodeId};
use crate::error::{Error, Result};

/// A directed base edge as produced by the graph build
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Length in metres
    pub distance: f64,
    /// Profile speed in km/h, 0 = no access for this vehicle
    pub speed_kmh: f64,
}

/// Flat forward and reverse adjacency over directed edges
#[derive(Debug, Clone)]
pub struct RoadGraph {
    n_nodes: usize,
    edges: Vec<RoadEdge>,
    out_offsets: Vec<u32>, // n_nodes + 1
    out_edges: Vec<EdgeId>,
    in_offsets: Vec<u32>, // n_nodes + 1
    in_edges: Vec<EdgeId>,
}

impl RoadGraph {
    pub fn builder(n_nodes: usize) -> RoadGraphBuilder {
        RoadGraphBuilder::new(n_nodes)
    }

    /// Raw edge record
    pub fn road_edge(&self, edge: EdgeId) -> Option<&RoadEdge> {
        self.edges.get(edge as usize)
    }

    #[inline]
    fn state(&self, edge: EdgeId, dir: Direction) -> EdgeState {
        let e = &self.edges[edge as usize];
        let (base, adj) = match dir {
            Direction::Forward => (e.from, e.to),
            Direction::Backward => (e.to, e.from),
        };
        EdgeState {
            edge,
            base,
            adj,
            distance: e.distance,
            speed_kmh: e.speed_kmh,
            shortcut: None,
        }
    }

    fn slice(&self, node: NodeId, dir: Direction) -> &[EdgeId] {
        let n = node as usize;
        if n >= self.n_nodes {
            return &[];
        }
        let (offsets, ids) = match dir {
            Direction::Forward => (&self.out_offsets, &self.out_edges),
            Direction::Backward => (&self.in_offsets, &self.in_edges),
        };
        &ids[offsets[n] as usize..offsets[n + 1] as usize]
    }
}

impl Adjacency for RoadGraph {
    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = EdgeState> + '_ {
        self.slice(node, dir)
            .iter()
            .map(move |&edge| self.state(edge, dir))
    }
}

impl Graph for RoadGraph {
    fn node_count(&self) -> usize {
        self.n_nodes
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge(&self, edge: EdgeId) -> Option<EdgeState> {
        if (edge as usize) < self.edges.len() {
            Some(self.state(edge, Direction::Forward))
        } else {
            None
        }
    }
}

/// Collects directed edges, then lays them out as CSR
#[derive(Debug, Clone, Default)]
pub struct RoadGraphBuilder {
    n_nodes: usize,
    edges: Vec<RoadEdge>,
}

impl RoadGraphBuilder {
    pub fn new(n_nodes: usize) -> Self {
        Self {
            n_nodes,
            edges: Vec::new(),
        }
    }

    /// Add a directed edge and return its id
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, distance: f64, speed_kmh: f64) -> EdgeId {
        let id = self.edges.len() as EdgeId;
        self.edges.push(RoadEdge {
            from,
            to,
            distance,
            speed_kmh,
        });
        id
    }

    /// Add `a → b` and `b → a` with identical attributes
    pub fn add_two_way(
        &mut self,
        a: NodeId,
        b: NodeId,
        distance: f64,
        speed_kmh: f64,
    ) -> (EdgeId, EdgeId) {
        let fwd = self.add_edge(a, b, distance, speed_kmh);
        let bwd = self.add_edge(b, a, distance, speed_kmh);
        (fwd, bwd)
    }

    pub fn build(self) -> Result<RoadGraph> {
        let n_nodes = self.n_nodes;
        for e in &self.edges {
            for node in [e.from, e.to] {
                if node as usize >= n_nodes {
                    return Err(Error::InvalidNode {
                        node,
                        node_count: n_nodes,
                    });
                }
            }
            if !(e.distance >= 0.0) || !(e.speed_kmh >= 0.0) {
                return Err(Error::config(format!(
                    "edge {}→{} has negative or NaN distance/speed",
                    e.from, e.to
                )));
            }
        }

        let (out_offsets, out_edges) = csr(n_nodes, &self.edges, |e| e.from);
        let (in_offsets, in_edges) = csr(n_nodes, &self.edges, |e| e.to);

        tracing::debug!(
            nodes = n_nodes,
            edges = self.edges.len(),
            "road graph built"
        );

        Ok(RoadGraph {
            n_nodes,
            edges: self.edges,
            out_offsets,
            out_edges,
            in_offsets,
            in_edges,
        })
    }
}

/// Group edge ids by `key(edge)` with a counting pass and a prefix sum
pub(super) fn csr<E>(
    n_nodes: usize,
    edges: &[E],
    key: impl Fn(&E) -> NodeId,
) -> (Vec<u32>, Vec<EdgeId>) {
    let mut counts = vec![0u32; n_nodes];
    for e in edges {
        counts[key(e) as usize] += 1;
    }

    let mut offsets = Vec::with_capacity(n_nodes + 1);
    let mut offset = 0u32;
    for &count in &counts {
        offsets.push(offset);
        offset += count;
    }
    offsets.push(offset);

    // Second pass: place ids, reusing counts as write cursors
    counts.fill(0);
    let mut ids = vec![0 as EdgeId; edges.len()];
    for (id, e) in edges.iter().enumerate() {
        let n = key(e) as usize;
        ids[(offsets[n] + counts[n]) as usize] = id as EdgeId;
        counts[n] += 1;
    }

    (offsets, ids)
}
