//! Contracted graph: base road graph + levels + shortcuts
//!
//! The hierarchy itself is computed elsewhere. This type only stores it and
//! exposes base edges and shortcuts through one cursor so that level-filtered
//! searches see the overlay as a single graph.
//!
//! Shortcut ids are allocated after the last base edge, so `edge < base_edges`
//! is a base edge and everything above is a shortcut.

use std::sync::Arc;

use super::road::{csr, RoadGraph};
use super::{Adjacency, Direction, EdgeId, EdgeState, Graph, LevelGraph, NodeId, Shortcut};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct ShortcutEdge {
    from: NodeId,
    to: NodeId,
    weight: f64,
    skipped: (EdgeId, EdgeId),
    /// Sum of the unpacked base edge lengths
    distance: f64,
}

/// Road graph augmented with contraction levels and shortcut edges
#[derive(Debug, Clone)]
pub struct ChGraph {
    base: Arc<RoadGraph>,
    levels: Vec<u32>,
    shortcuts: Vec<ShortcutEdge>,
    // CSR over shortcut indices (not edge ids)
    sc_out_offsets: Vec<u32>,
    sc_out: Vec<u32>,
    sc_in_offsets: Vec<u32>,
    sc_in: Vec<u32>,
}

impl ChGraph {
    pub fn base(&self) -> &RoadGraph {
        &self.base
    }

    pub fn shortcut_count(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_shortcut(&self, edge: EdgeId) -> bool {
        let base_edges = self.base.edge_count();
        (edge as usize) >= base_edges && (edge as usize) < base_edges + self.shortcuts.len()
    }

    /// Append the base edges behind `edge`, in travel order
    pub fn unpack_edge(&self, edge: EdgeId, out: &mut Vec<EdgeId>) {
        let base_edges = self.base.edge_count();
        if (edge as usize) < base_edges {
            out.push(edge);
            return;
        }
        match self.shortcuts.get(edge as usize - base_edges) {
            Some(sc) => {
                self.unpack_edge(sc.skipped.0, out);
                self.unpack_edge(sc.skipped.1, out);
            }
            None => {
                tracing::trace!(edge, "unpack_edge: unknown edge id");
            }
        }
    }

    /// Expand a path of overlay edges to base edges
    pub fn unpack_path(&self, path: &[EdgeId]) -> Vec<EdgeId> {
        let mut out = Vec::with_capacity(path.len() * 2);
        for &edge in path {
            self.unpack_edge(edge, &mut out);
        }
        out
    }

    fn shortcut_state(&self, idx: u32, dir: Direction) -> EdgeState {
        let sc = &self.shortcuts[idx as usize];
        let (base, adj) = match dir {
            Direction::Forward => (sc.from, sc.to),
            Direction::Backward => (sc.to, sc.from),
        };
        EdgeState {
            edge: (self.base.edge_count() + idx as usize) as EdgeId,
            base,
            adj,
            distance: sc.distance,
            // Shortcuts are costed by their stored weight, never by speed
            speed_kmh: 0.0,
            shortcut: Some(Shortcut {
                weight: sc.weight,
                skipped: sc.skipped,
            }),
        }
    }

    fn shortcut_slice(&self, node: NodeId, dir: Direction) -> &[u32] {
        let n = node as usize;
        if n >= self.levels.len() {
            return &[];
        }
        let (offsets, ids) = match dir {
            Direction::Forward => (&self.sc_out_offsets, &self.sc_out),
            Direction::Backward => (&self.sc_in_offsets, &self.sc_in),
        };
        &ids[offsets[n] as usize..offsets[n + 1] as usize]
    }
}

impl Adjacency for ChGraph {
    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = EdgeState> + '_ {
        self.base.edges(node, dir).chain(
            self.shortcut_slice(node, dir)
                .iter()
                .map(move |&idx| self.shortcut_state(idx, dir)),
        )
    }
}

impl Graph for ChGraph {
    fn node_count(&self) -> usize {
        self.base.node_count()
    }

    fn edge_count(&self) -> usize {
        self.base.edge_count() + self.shortcuts.len()
    }

    fn edge(&self, edge: EdgeId) -> Option<EdgeState> {
        let base_edges = self.base.edge_count();
        if (edge as usize) < base_edges {
            self.base.edge(edge)
        } else if (edge as usize) < base_edges + self.shortcuts.len() {
            Some(self.shortcut_state((edge as usize - base_edges) as u32, Direction::Forward))
        } else {
            None
        }
    }
}

impl LevelGraph for ChGraph {
    #[inline]
    fn level(&self, node: NodeId) -> u32 {
        self.levels.get(node as usize).copied().unwrap_or(0)
    }
}

/// Collects shortcuts produced by an external contraction
#[derive(Debug)]
pub struct ChGraphBuilder {
    base: Arc<RoadGraph>,
    levels: Vec<u32>,
    shortcuts: Vec<ShortcutEdge>,
}

impl ChGraphBuilder {
    pub fn new(base: Arc<RoadGraph>, levels: Vec<u32>) -> Self {
        Self {
            base,
            levels,
            shortcuts: Vec::new(),
        }
    }

    /// (tail, head, distance) of a base edge or an already added shortcut
    fn endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId, f64)> {
        let base_edges = self.base.edge_count();
        if (edge as usize) < base_edges {
            self.base
                .road_edge(edge)
                .map(|e| (e.from, e.to, e.distance))
        } else {
            self.shortcuts
                .get(edge as usize - base_edges)
                .map(|sc| (sc.from, sc.to, sc.distance))
        }
    }

    /// Add `from → to` replacing the two-edge chain `skipped`; returns its edge id
    pub fn add_shortcut(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        skipped: (EdgeId, EdgeId),
    ) -> Result<EdgeId> {
        let (a_from, a_to, a_dist) = self
            .endpoints(skipped.0)
            .ok_or_else(|| Error::config(format!("shortcut skips unknown edge {}", skipped.0)))?;
        let (b_from, b_to, b_dist) = self
            .endpoints(skipped.1)
            .ok_or_else(|| Error::config(format!("shortcut skips unknown edge {}", skipped.1)))?;

        if a_from != from || b_to != to || a_to != b_from {
            return Err(Error::config(format!(
                "shortcut {from}→{to} does not match skipped chain \
                 {a_from}→{a_to}, {b_from}→{b_to}"
            )));
        }
        if !(weight >= 0.0) {
            return Err(Error::config(format!(
                "shortcut {from}→{to} has invalid weight {weight}"
            )));
        }

        let id = (self.base.edge_count() + self.shortcuts.len()) as EdgeId;
        self.shortcuts.push(ShortcutEdge {
            from,
            to,
            weight,
            skipped,
            distance: a_dist + b_dist,
        });
        Ok(id)
    }

    pub fn build(self) -> Result<ChGraph> {
        let n_nodes = self.base.node_count();
        if self.levels.len() != n_nodes {
            return Err(Error::config(format!(
                "{} levels supplied for {} nodes",
                self.levels.len(),
                n_nodes
            )));
        }

        let (sc_out_offsets, sc_out) = csr(n_nodes, &self.shortcuts, |sc| sc.from);
        let (sc_in_offsets, sc_in) = csr(n_nodes, &self.shortcuts, |sc| sc.to);

        tracing::debug!(
            nodes = n_nodes,
            base_edges = self.base.edge_count(),
            shortcuts = self.shortcuts.len(),
            "contracted graph built"
        );

        Ok(ChGraph {
            base: self.base,
            levels: self.levels,
            shortcuts: self.shortcuts,
            sc_out_offsets,
            sc_out,
            sc_in_offsets,
            sc_in,
        })
    }
}
