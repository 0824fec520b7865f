//! Target-pruned one-to-many Dijkstra
//!
//! Settles nodes in increasing weight from one source and stops as soon as
//! every requested target is settled, the frontier runs dry, or the
//! visited-node budget is used up. Works on any [`Graph`], including a
//! contracted one (shortcuts are costed by their stored weight).

use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::filter::{AllEdges, EdgeFilter};
use crate::graph::{Direction, EdgeId, Graph, NodeId};
use crate::observe::{NoopObserver, SearchKind, SearchObserver, SearchStats};
use crate::queue::Frontier;
use crate::tree::{EntryIdx, SptArena, SptEntry};
use crate::weighting::{calc_edge_weight, Weighting};

/// What a search label is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// One label per node
    #[default]
    NodeBased,
    /// One label per incoming edge, so filters and weightings can see turns
    EdgeBased,
}

impl TraversalMode {
    #[inline]
    pub fn is_edge_based(self) -> bool {
        matches!(self, TraversalMode::EdgeBased)
    }
}

/// Label key: node id, or incoming edge id in edge-based mode
pub type TraversalId = u64;

const SOURCE_KEY: u64 = 1 << 32;

#[inline]
fn traversal_id(mode: TraversalMode, node: NodeId, via: Option<EdgeId>) -> TraversalId {
    match (mode, via) {
        (TraversalMode::EdgeBased, Some(edge)) => edge as u64,
        // the source has no incoming edge; keep it apart from edge ids
        (TraversalMode::EdgeBased, None) => SOURCE_KEY | node as u64,
        (TraversalMode::NodeBased, _) => node as u64,
    }
}

pub struct OneToManyDijkstra<G, W, F = AllEdges> {
    graph: G,
    weighting: W,
    filter: F,
    mode: TraversalMode,
    arena: SptArena,
    best: FxHashMap<TraversalId, EntryIdx>,
    frontier: Frontier,
    max_visited_nodes: usize,
    visited_nodes: usize,
    observer: Box<dyn SearchObserver>,
}

impl<G: Graph, W: Weighting> OneToManyDijkstra<G, W> {
    pub fn new(graph: G, weighting: W) -> Self {
        Self {
            graph,
            weighting,
            filter: AllEdges,
            mode: TraversalMode::NodeBased,
            arena: SptArena::new(),
            best: FxHashMap::default(),
            frontier: Frontier::new(),
            max_visited_nodes: usize::MAX,
            visited_nodes: 0,
            observer: Box::new(NoopObserver),
        }
    }
}

impl<G: Graph, W: Weighting, F: EdgeFilter> OneToManyDijkstra<G, W, F> {
    /// Replace the edge filter
    pub fn with_filter<F2: EdgeFilter>(self, filter: F2) -> OneToManyDijkstra<G, W, F2> {
        OneToManyDijkstra {
            graph: self.graph,
            weighting: self.weighting,
            filter,
            mode: self.mode,
            arena: self.arena,
            best: self.best,
            frontier: self.frontier,
            max_visited_nodes: self.max_visited_nodes,
            visited_nodes: self.visited_nodes,
            observer: self.observer,
        }
    }

    pub fn with_mode(mut self, mode: TraversalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_observer(&mut self, observer: Box<dyn SearchObserver>) {
        self.observer = observer;
    }

    /// Stop after settling `n` nodes; unreached targets come back as `None`
    pub fn set_max_visited_nodes(&mut self, n: usize) {
        self.max_visited_nodes = n;
    }

    /// Nodes settled by the last query
    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Drop all query state; the budget and observer are kept
    pub fn reset(&mut self) {
        self.arena.clear();
        self.best.clear();
        self.frontier.clear();
        self.visited_nodes = 0;
    }

    pub fn entry(&self, idx: EntryIdx) -> Option<&SptEntry> {
        self.arena.get(idx)
    }

    pub fn tree(&self) -> &SptArena {
        &self.arena
    }

    /// Edges from the source to the entry, in travel order
    pub fn path_edges(&self, idx: EntryIdx) -> Vec<EdgeId> {
        self.arena.path_edges(idx)
    }

    /// Per target (input order): the settled entry, or `None` if unreached
    ///
    /// Query state from a previous call is discarded first.
    pub fn calc_paths(
        &mut self,
        source: NodeId,
        targets: &[NodeId],
    ) -> Result<Vec<Option<EntryIdx>>> {
        self.graph.check_node(source)?;
        for &t in targets {
            self.graph.check_node(t)?;
        }
        self.reset();
        let started = Instant::now();

        let mut results = vec![None; targets.len()];
        let mut pending: FxHashMap<NodeId, Vec<usize>> = FxHashMap::default();
        for (pos, &t) in targets.iter().enumerate() {
            pending.entry(t).or_default().push(pos);
        }

        let root = self.arena.push(SptEntry::root(source));
        self.best.insert(traversal_id(self.mode, source, None), root);
        self.frontier.push(root, 0.0);

        // The source is its own zero-cost target and never waits for a pop
        if let Some(positions) = pending.remove(&source) {
            for pos in positions {
                results[pos] = Some(root);
            }
        }

        let mut stats = SearchStats {
            kind: SearchKind::OneToMany,
            n_sources: 1,
            n_targets: targets.len(),
            ..Default::default()
        };

        while !pending.is_empty() {
            if self.visited_nodes >= self.max_visited_nodes {
                stats.budget_exhausted = true;
                break;
            }
            let Some((idx, weight)) = self.frontier.pop() else {
                break;
            };

            let Some(entry) = self.arena.get_mut(idx) else {
                continue;
            };
            entry.visited = true;
            let (node, prev_edge) = (entry.node, entry.edge);
            self.visited_nodes += 1;

            if let Some(positions) = pending.remove(&node) {
                for pos in positions {
                    results[pos] = Some(idx);
                }
                if pending.is_empty() {
                    break;
                }
            }

            self.relax(idx, node, weight, prev_edge, &mut stats)?;
        }

        stats.visited_nodes = self.visited_nodes;
        stats.reached_targets = results.iter().filter(|r| r.is_some()).count();
        stats.elapsed = started.elapsed();

        if stats.budget_exhausted {
            tracing::warn!(
                source,
                budget = self.max_visited_nodes,
                unreached = targets.len() - stats.reached_targets,
                "one-to-many search stopped at visited-node budget"
            );
        }
        tracing::debug!(
            source,
            targets = targets.len(),
            reached = stats.reached_targets,
            visited = self.visited_nodes,
            elapsed_us = stats.elapsed.as_micros() as u64,
            "one-to-many search done"
        );
        self.observer.on_query(&stats);

        Ok(results)
    }

    fn relax(
        &mut self,
        idx: EntryIdx,
        node: NodeId,
        weight: f64,
        prev_edge: Option<EdgeId>,
        stats: &mut SearchStats,
    ) -> Result<()> {
        for edge in self.graph.edges(node, Direction::Forward) {
            if !self.filter.accept(&edge, prev_edge) {
                continue;
            }
            let edge_weight = calc_edge_weight(&self.weighting, &edge, false, prev_edge)?;
            if !edge_weight.is_finite() {
                tracing::trace!(edge = edge.edge, "edge infeasible under weighting");
                continue;
            }
            let tmp = weight + edge_weight;
            let key = traversal_id(self.mode, edge.adj, Some(edge.edge));

            match self.best.get(&key).copied() {
                None => {
                    let child = self.arena.push(SptEntry {
                        node: edge.adj,
                        edge: Some(edge.edge),
                        weight: tmp,
                        parent: Some(idx),
                        visited: false,
                    });
                    self.best.insert(key, child);
                    self.frontier.push(child, tmp);
                    stats.heap_pushes += 1;
                }
                Some(existing) => {
                    let Some(entry) = self.arena.get_mut(existing) else {
                        continue;
                    };
                    // ties keep the existing label
                    if entry.visited || tmp >= entry.weight {
                        continue;
                    }
                    entry.weight = tmp;
                    entry.edge = Some(edge.edge);
                    entry.parent = Some(idx);
                    self.frontier.push(existing, tmp);
                    stats.heap_pushes += 1;
                }
            }
        }
        Ok(())
    }
}

impl<G, W: std::fmt::Debug, F> std::fmt::Debug for OneToManyDijkstra<G, W, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneToManyDijkstra")
            .field("weighting", &self.weighting)
            .field("mode", &self.mode)
            .field("max_visited_nodes", &self.max_visited_nodes)
            .field("visited_nodes", &self.visited_nodes)
            .finish()
    }
}
