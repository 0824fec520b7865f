//! Query-time restricted graph for the downward pass
//!
//! Holds the edges found by the backward level-filtered scan from the
//! targets, keyed by their tail so the downward pass can walk them forward.
//! Edges are kept in discovery order and never deduplicated.

use rustc_hash::FxHashMap;

use crate::graph::{Adjacency, Direction, EdgeState, NodeId};

#[derive(Debug, Clone, Default)]
pub struct SubGraph {
    adjacency: FxHashMap<NodeId, Vec<EdgeState>>,
    edge_count: usize,
}

impl SubGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` without edges; returns true if it was new
    pub fn add_node(&mut self, node: NodeId) -> bool {
        if self.adjacency.contains_key(&node) {
            return false;
        }
        self.adjacency.insert(node, Vec::new());
        true
    }

    /// Store the edge behind `cursor`, keyed by its physical tail
    ///
    /// `reverse` is true for a backward cursor (tail = `cursor.adj`). Returns
    /// true if the tail was not in the sub-graph before, i.e. the scan still
    /// has to expand it.
    pub fn add_edge(&mut self, cursor: &EdgeState, reverse: bool) -> bool {
        let forward = if reverse {
            EdgeState {
                base: cursor.adj,
                adj: cursor.base,
                ..*cursor
            }
        } else {
            *cursor
        };

        self.edge_count += 1;
        match self.adjacency.get_mut(&forward.base) {
            Some(list) => {
                list.push(forward);
                false
            }
            None => {
                self.adjacency.insert(forward.base, vec![forward]);
                true
            }
        }
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn clear(&mut self) {
        self.adjacency.clear();
        self.edge_count = 0;
    }
}

impl Adjacency for SubGraph {
    /// Only forward cursors exist; the restricted graph is walked downward only
    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = EdgeState> + '_ {
        let list = match dir {
            Direction::Forward => self.adjacency.get(&node).map(Vec::as_slice),
            Direction::Backward => None,
        };
        list.unwrap_or(&[]).iter().copied()
    }
}
