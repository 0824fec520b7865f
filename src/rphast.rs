//! Hierarchy-aware one-to-many / many-to-many search (RPHAST)
//!
//! Two phases over a contracted graph:
//!
//! 1. [`RphastSearch::prepare`] walks backward from all targets along edges
//!    whose tail is not below their head and stores every accepted edge in a
//!    [`SubGraph`]. That sub-graph holds the downward tail of every
//!    shortest path into a target.
//! 2. [`RphastSearch::calc_paths`] runs an upward pass from all sources over
//!    the full graph (level never decreases), then a downward pass over the
//!    sub-graph only. Both passes share one label map, so labels found going
//!    up are continued going down instead of restarting.
//!
//! Each node carries one slot per source and every relaxation updates all
//! slots at once, so k sources cost one traversal, not k.

use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::dijkstra::TraversalMode;
use crate::error::{Error, Result};
use crate::filter::{AllEdges, EdgeFilter, LevelEdgeFilter, SearchPass};
use crate::graph::{Adjacency, Direction, EdgeId, EdgeState, LevelGraph, NodeId};
use crate::observe::{NoopObserver, SearchKind, SearchObserver, SearchStats};
use crate::queue::Frontier;
use crate::subgraph::SubGraph;
use crate::tree::{EntryIdx, MultiTreeArena, MultiTreeEntry, TreeSlot};
use crate::weighting::{calc_edge_weight, Weighting};

/// Labels, frontier and counters of the query in flight
#[derive(Debug, Default)]
struct QueryState {
    arena: MultiTreeArena,
    best: FxHashMap<NodeId, EntryIdx>,
    frontier: Frontier,
    /// (source slot, candidate weight) buffer reused across relaxations
    scratch: Vec<(usize, f64)>,
    n_sources: usize,
    visited_nodes: usize,
    heap_pushes: usize,
}

impl QueryState {
    fn clear(&mut self, n_sources: usize) {
        self.arena.clear();
        self.best.clear();
        self.frontier.clear();
        self.scratch.clear();
        self.n_sources = n_sources;
        self.visited_nodes = 0;
        self.heap_pushes = 0;
    }

    fn entry_for(&mut self, node: NodeId) -> EntryIdx {
        if let Some(&idx) = self.best.get(&node) {
            return idx;
        }
        let idx = self.arena.push(MultiTreeEntry::new(node, self.n_sources));
        self.best.insert(node, idx);
        idx
    }

    /// Queue `idx` keyed by its cheapest slot
    fn enqueue(&mut self, idx: EntryIdx) {
        if let Some(entry) = self.arena.get(idx) {
            let key = entry.min_weight();
            if key.is_finite() {
                self.frontier.push(idx, key);
            }
        }
    }

    /// Push every slot of `from` that changed since its last expansion
    fn relax(&mut self, from: EntryIdx, edge: &EdgeState, edge_weight: f64) {
        if edge.adj == edge.base {
            return;
        }

        self.scratch.clear();
        if let Some(entry) = self.arena.get(from) {
            for (i, slot) in entry.slots().iter().enumerate() {
                let Some(slot) = slot else {
                    continue;
                };
                if !slot.weight.is_finite() || !slot.update {
                    continue;
                }
                self.scratch.push((i, slot.weight + edge_weight));
            }
        }
        if self.scratch.is_empty() {
            return;
        }

        let to = self.entry_for(edge.adj);
        let mut improved = false;
        if let Some(target) = self.arena.get_mut(to) {
            for &(i, tmp) in &self.scratch {
                // ties keep the existing label
                if target.slot(i).is_some_and(|s| tmp >= s.weight) {
                    continue;
                }
                target.set_slot(
                    i,
                    TreeSlot {
                        weight: tmp,
                        edge: Some(edge.edge),
                        parent: Some(from),
                        update: true,
                    },
                );
                improved = true;
            }
        }
        if improved {
            self.enqueue(to);
            self.heap_pushes += 1;
        }
    }

    /// Clear the update flags of `idx` once its edges have been relaxed
    fn expanded(&mut self, idx: EntryIdx) {
        if let Some(entry) = self.arena.get_mut(idx) {
            entry.reset_update(false);
        }
    }
}

/// Lower `bound[i]` to the weight of slot `i` where set (and changed, with `only_updated`)
fn lower_bounds(bound: &mut [f64], entry: &MultiTreeEntry, only_updated: bool) {
    for (b, slot) in bound.iter_mut().zip(entry.slots()) {
        if let Some(slot) = slot {
            if !only_updated || slot.update {
                *b = b.min(slot.weight);
            }
        }
    }
}

/// Many-to-many search over a [`LevelGraph`]
pub struct RphastSearch<G, W, F = AllEdges> {
    graph: G,
    weighting: W,
    filter: F,
    mode: TraversalMode,
    target_graph: Option<SubGraph>,
    state: QueryState,
    upward: LevelEdgeFilter,
    max_visited_nodes: usize,
    observer: Box<dyn SearchObserver>,
}

impl<G: LevelGraph, W: Weighting> RphastSearch<G, W> {
    pub fn new(graph: G, weighting: W) -> Self {
        Self {
            graph,
            weighting,
            filter: AllEdges,
            mode: TraversalMode::NodeBased,
            target_graph: None,
            state: QueryState::default(),
            upward: LevelEdgeFilter::new(SearchPass::Upward),
            max_visited_nodes: usize::MAX,
            observer: Box::new(NoopObserver),
        }
    }
}

impl<G: LevelGraph, W: Weighting, F: EdgeFilter> RphastSearch<G, W, F> {
    /// Extra filter applied in both phases on top of the level filter
    pub fn with_filter<F2: EdgeFilter>(self, filter: F2) -> RphastSearch<G, W, F2> {
        RphastSearch {
            graph: self.graph,
            weighting: self.weighting,
            filter,
            mode: self.mode,
            target_graph: self.target_graph,
            state: self.state,
            upward: self.upward,
            max_visited_nodes: self.max_visited_nodes,
            observer: self.observer,
        }
    }

    /// Only node-based traversal is supported; edge-based fails at `prepare`
    pub fn with_mode(mut self, mode: TraversalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_observer(&mut self, observer: Box<dyn SearchObserver>) {
        self.observer = observer;
    }

    pub fn set_max_visited_nodes(&mut self, n: usize) {
        self.max_visited_nodes = n;
    }

    /// Nodes settled by the last `calc_paths`, both passes together
    pub fn visited_nodes(&self) -> usize {
        self.state.visited_nodes
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Restricted graph built by the last `prepare`
    pub fn target_graph(&self) -> Option<&SubGraph> {
        self.target_graph.as_ref()
    }

    /// Highest-level node reached by the last upward pass
    pub fn highest_node(&self) -> Option<NodeId> {
        self.upward.highest_node()
    }

    pub fn entry(&self, idx: EntryIdx) -> Option<&MultiTreeEntry> {
        self.state.arena.get(idx)
    }

    pub fn tree(&self) -> &MultiTreeArena {
        &self.state.arena
    }

    /// Overlay edges from source `source` (slot index) to the entry
    pub fn path_edges(&self, idx: EntryIdx, source: usize) -> Vec<EdgeId> {
        self.state.arena.path_edges(idx, source)
    }

    /// Forget the prepared sub-graph and all labels
    pub fn reset(&mut self) {
        self.target_graph = None;
        self.state.clear(0);
        self.upward.reset();
    }

    /// Build the restricted target graph
    ///
    /// Fails with [`Error::UnsupportedMode`] for edge-based traversal before
    /// touching the graph.
    pub fn prepare(&mut self, sources: &[NodeId], targets: &[NodeId]) -> Result<()> {
        if self.mode.is_edge_based() {
            return Err(Error::UnsupportedMode(
                "edge-based traversal is not supported by the many-to-many hierarchy search".into(),
            ));
        }
        for &n in sources.iter().chain(targets) {
            self.graph.check_node(n)?;
        }

        let started = Instant::now();
        let down = LevelEdgeFilter::new(SearchPass::Downward);
        let mut sub = SubGraph::new();
        let mut stack: Vec<NodeId> = Vec::with_capacity(targets.len());
        for &t in targets {
            if sub.add_node(t) {
                stack.push(t);
            }
        }

        while let Some(node) = stack.pop() {
            for edge in self.graph.edges(node, Direction::Backward) {
                if !down.accept(&self.graph, &edge, Direction::Backward)
                    || !self.filter.accept(&edge, None)
                {
                    continue;
                }
                if sub.add_edge(&edge, true) {
                    stack.push(edge.adj);
                }
            }
        }

        tracing::debug!(
            targets = targets.len(),
            nodes = sub.node_count(),
            edges = sub.edge_count(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "target sub-graph prepared"
        );
        self.target_graph = Some(sub);
        Ok(())
    }

    /// Per target (input order): its entry, or `None` if no source reached it
    ///
    /// Slot `i` of a returned entry holds the label for `sources[i]`. When the
    /// visited-node budget stops the search, only labels that no further
    /// search could improve are kept.
    pub fn calc_paths(
        &mut self,
        sources: &[NodeId],
        targets: &[NodeId],
    ) -> Result<Vec<Option<EntryIdx>>> {
        let sub = self.target_graph.take().ok_or(Error::NotPrepared)?;
        let result = self.run(&sub, sources, targets);
        self.target_graph = Some(sub);
        result
    }

    fn run(
        &mut self,
        sub: &SubGraph,
        sources: &[NodeId],
        targets: &[NodeId],
    ) -> Result<Vec<Option<EntryIdx>>> {
        for &s in sources {
            self.graph.check_node(s)?;
        }
        if targets.iter().any(|&t| !sub.contains_node(t)) {
            return Err(Error::NotPrepared);
        }

        let started = Instant::now();
        self.state.clear(sources.len());
        self.upward.reset();

        let mut stats = SearchStats {
            kind: SearchKind::Rphast,
            n_sources: sources.len(),
            n_targets: targets.len(),
            subgraph_nodes: sub.node_count(),
            subgraph_edges: sub.edge_count(),
            ..Default::default()
        };

        for (i, &s) in sources.iter().enumerate() {
            let idx = self.state.entry_for(s);
            if let Some(entry) = self.state.arena.get_mut(idx) {
                entry.set_slot(i, TreeSlot::root());
            }
            self.state.enqueue(idx);
            self.upward.update_highest(&self.graph, s);
        }

        let upward_stopped = self.upward_pass()?;
        stats.upward_visited = self.state.visited_nodes;

        let mut downward_stopped = false;
        if !upward_stopped {
            self.seed_downward(sub);
            downward_stopped = self.downward_pass(sub)?;
        }
        stats.downward_visited = self.state.visited_nodes - stats.upward_visited;
        stats.budget_exhausted = upward_stopped || downward_stopped;

        if stats.budget_exhausted {
            // an unfinished upward pass still owes the downward seeds their turn
            self.drop_open_labels(targets, upward_stopped.then_some(sub));
        }

        let results: Vec<Option<EntryIdx>> = targets
            .iter()
            .map(|t| {
                self.state.best.get(t).copied().filter(|&idx| {
                    self.state
                        .arena
                        .get(idx)
                        .is_some_and(|e| e.min_weight().is_finite())
                })
            })
            .collect();

        stats.visited_nodes = self.state.visited_nodes;
        stats.heap_pushes = self.state.heap_pushes;
        stats.reached_targets = results
            .iter()
            .flatten()
            .filter_map(|&idx| self.state.arena.get(idx))
            .map(|e| e.slots().iter().flatten().count())
            .sum();
        stats.elapsed = started.elapsed();

        if stats.budget_exhausted {
            tracing::warn!(
                sources = sources.len(),
                budget = self.max_visited_nodes,
                reached = stats.reached_targets,
                "hierarchy search stopped at visited-node budget"
            );
        }
        tracing::debug!(
            sources = sources.len(),
            targets = targets.len(),
            upward = stats.upward_visited,
            downward = stats.downward_visited,
            highest = ?self.upward.highest_node(),
            reached = stats.reached_targets,
            elapsed_us = stats.elapsed.as_micros() as u64,
            "hierarchy search done"
        );
        self.observer.on_query(&stats);

        Ok(results)
    }

    fn budget_left(&self) -> bool {
        self.state.visited_nodes < self.max_visited_nodes
    }

    /// Returns true if the budget stopped the pass
    fn upward_pass(&mut self) -> Result<bool> {
        loop {
            if !self.budget_left() {
                return Ok(!self.state.frontier.is_empty());
            }
            let Some((idx, _)) = self.state.frontier.pop() else {
                return Ok(false);
            };
            let Some(entry) = self.state.arena.get_mut(idx) else {
                continue;
            };
            entry.visited = true;
            let node = entry.node;
            self.state.visited_nodes += 1;
            self.upward.update_highest(&self.graph, node);

            for edge in self.graph.edges(node, Direction::Forward) {
                if !self.upward.accept(&self.graph, &edge, Direction::Forward)
                    || !self.filter.accept(&edge, None)
                {
                    continue;
                }
                let edge_weight = calc_edge_weight(&self.weighting, &edge, false, None)?;
                if !edge_weight.is_finite() {
                    continue;
                }
                self.state.relax(idx, &edge, edge_weight);
            }
            self.state.expanded(idx);
        }
    }

    /// Queue every labeled sub-graph node with all its slots marked changed
    ///
    /// Nodes outside the sub-graph have no downward edges, so the highest
    /// node and the sources only take part when the sub-graph holds them.
    fn seed_downward(&mut self, sub: &SubGraph) {
        self.state.frontier.clear();
        for node in sub.nodes() {
            let Some(&idx) = self.state.best.get(&node) else {
                continue;
            };
            if let Some(entry) = self.state.arena.get_mut(idx) {
                entry.reset_update(true);
            }
            self.state.enqueue(idx);
        }
        tracing::trace!(queued = self.state.frontier.len(), "downward pass seeded");
    }

    fn downward_pass(&mut self, sub: &SubGraph) -> Result<bool> {
        loop {
            if !self.budget_left() {
                return Ok(!self.state.frontier.is_empty());
            }
            let Some((idx, _)) = self.state.frontier.pop() else {
                return Ok(false);
            };
            let Some(entry) = self.state.arena.get_mut(idx) else {
                continue;
            };
            entry.visited = true;
            let node = entry.node;
            self.state.visited_nodes += 1;

            for edge in sub.edges(node, Direction::Forward) {
                if !self.filter.accept(&edge, None) {
                    continue;
                }
                let edge_weight = calc_edge_weight(&self.weighting, &edge, false, None)?;
                if !edge_weight.is_finite() {
                    continue;
                }
                self.state.relax(idx, &edge, edge_weight);
            }
            self.state.expanded(idx);
        }
    }

    /// Unset the target slots a stopped search could still improve
    ///
    /// Edge weights are non-negative, so no later label for source `i` can
    /// undercut the cheapest changed slot `i` still queued. With the upward
    /// pass unfinished the downward seeds (`pending`) count as queued too.
    /// Target slots above that bound are dropped; the rest are final.
    fn drop_open_labels(&mut self, targets: &[NodeId], pending: Option<&SubGraph>) {
        let state = &mut self.state;
        let mut bound = vec![f64::INFINITY; state.n_sources];
        for idx in state.frontier.indices() {
            if let Some(entry) = state.arena.get(idx) {
                lower_bounds(&mut bound, entry, true);
            }
        }
        for node in pending.into_iter().flat_map(SubGraph::nodes) {
            if let Some(entry) = state.best.get(&node).and_then(|&idx| state.arena.get(idx)) {
                lower_bounds(&mut bound, entry, false);
            }
        }

        let mut dropped = 0;
        for t in targets {
            let Some(&idx) = state.best.get(t) else {
                continue;
            };
            let Some(entry) = state.arena.get_mut(idx) else {
                continue;
            };
            for (i, &b) in bound.iter().enumerate() {
                if entry.slot(i).is_some_and(|s| s.weight > b) {
                    entry.clear_slot(i);
                    dropped += 1;
                }
            }
        }
        tracing::trace!(?bound, dropped, "open target labels dropped");
    }
}

impl<G, W: std::fmt::Debug, F> std::fmt::Debug for RphastSearch<G, W, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RphastSearch")
            .field("weighting", &self.weighting)
            .field("mode", &self.mode)
            .field("prepared", &self.target_graph.is_some())
            .field("max_visited_nodes", &self.max_visited_nodes)
            .field("visited_nodes", &self.state.visited_nodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::{ChGraph, ChGraphBuilder, RoadGraph};
    use crate::weighting::ShortestWeighting;

    // Diamond 1-2-4 (5+5) / 1-3-4 (3+3); 4 on top, 1 at the bottom
    fn diamond() -> ChGraph {
        let mut b = RoadGraph::builder(5);
        b.add_edge(1, 2, 5.0, 50.0);
        b.add_edge(2, 4, 5.0, 50.0);
        b.add_edge(1, 3, 3.0, 50.0);
        b.add_edge(3, 4, 3.0, 50.0);
        let base = Arc::new(b.build().unwrap());
        ChGraphBuilder::new(base, vec![0, 1, 2, 3, 4]).build().unwrap()
    }

    // A -> M (10), B -> M (7), M -> T (0): M is the peak, T below it
    fn two_sources() -> ChGraph {
        let mut b = RoadGraph::builder(4);
        b.add_edge(0, 2, 10.0, 50.0);
        b.add_edge(1, 2, 7.0, 50.0);
        b.add_edge(2, 3, 0.0, 50.0);
        let base = Arc::new(b.build().unwrap());
        ChGraphBuilder::new(base, vec![0, 1, 3, 2]).build().unwrap()
    }

    // 0 -> 1 -> 3 costs 13, 0 -> 2 -> 3 costs 6; level = node id, no shortcuts
    fn late_detour() -> ChGraph {
        let mut b = RoadGraph::builder(4);
        b.add_edge(0, 1, 3.0, 50.0);
        b.add_edge(1, 3, 10.0, 50.0);
        b.add_edge(0, 2, 5.0, 50.0);
        b.add_edge(2, 3, 1.0, 50.0);
        let base = Arc::new(b.build().unwrap());
        ChGraphBuilder::new(base, vec![0, 1, 2, 3]).build().unwrap()
    }

    type Search<'a> = RphastSearch<&'a ChGraph, ShortestWeighting>;

    fn slot_weight(search: &Search<'_>, idx: Option<EntryIdx>, i: usize) -> Option<f64> {
        idx.and_then(|idx| search.entry(idx))
            .and_then(|e| e.slot(i))
            .map(|s| s.weight)
    }

    #[test]
    fn diamond_goes_through_node_three() {
        let g = diamond();
        let mut search = RphastSearch::new(&g, ShortestWeighting);
        search.prepare(&[1], &[4]).unwrap();
        let res = search.calc_paths(&[1], &[4]).unwrap();
        assert_eq!(slot_weight(&search, res[0], 0), Some(6.0));
        assert_eq!(search.path_edges(res[0].unwrap(), 0), vec![2, 3]);
    }

    #[test]
    fn every_source_gets_its_own_slot() {
        let g = two_sources();
        let mut search = RphastSearch::new(&g, ShortestWeighting);
        search.prepare(&[0, 1], &[3]).unwrap();
        let res = search.calc_paths(&[0, 1], &[3]).unwrap();
        assert_eq!(slot_weight(&search, res[0], 0), Some(10.0));
        assert_eq!(slot_weight(&search, res[0], 1), Some(7.0));
    }

    #[test]
    fn zero_cost_source_target_is_reachable_with_no_budget() {
        let g = diamond();
        let mut search = RphastSearch::new(&g, ShortestWeighting);
        search.set_max_visited_nodes(0);
        search.prepare(&[1], &[4, 1]).unwrap();
        let res = search.calc_paths(&[1], &[4, 1]).unwrap();
        assert!(res[0].is_none());
        assert_eq!(slot_weight(&search, res[1], 0), Some(0.0));
        assert_eq!(search.visited_nodes(), 0);
    }

    #[test]
    fn budget_stop_never_returns_an_improvable_label() {
        let g = late_detour();
        let mut search = RphastSearch::new(&g, ShortestWeighting);
        search.prepare(&[0], &[3]).unwrap();

        // 0 and 1 settled: 3 holds 13 while 2 (at 5) is still queued
        search.set_max_visited_nodes(2);
        let res = search.calc_paths(&[0], &[3]).unwrap();
        assert!(res[0].is_none());

        search.set_max_visited_nodes(3);
        let res = search.calc_paths(&[0], &[3]).unwrap();
        assert_eq!(slot_weight(&search, res[0], 0), Some(6.0));

        search.set_max_visited_nodes(usize::MAX);
        let res = search.calc_paths(&[0], &[3]).unwrap();
        assert_eq!(slot_weight(&search, res[0], 0), Some(6.0));
        assert_eq!(search.path_edges(res[0].unwrap(), 0), vec![2, 3]);
    }

    #[test]
    fn budget_sweep_keeps_only_final_labels() {
        let g = diamond();
        let targets = [4, 3, 2, 1];
        let mut search = RphastSearch::new(&g, ShortestWeighting);
        search.prepare(&[1], &targets).unwrap();
        let full: Vec<Option<f64>> = search
            .calc_paths(&[1], &targets)
            .unwrap()
            .into_iter()
            .map(|idx| slot_weight(&search, idx, 0))
            .collect();
        assert_eq!(full, vec![Some(6.0), Some(3.0), Some(5.0), Some(0.0)]);

        let mut last = 0;
        for budget in 0..=10 {
            search.set_max_visited_nodes(budget);
            let res = search.calc_paths(&[1], &targets).unwrap();
            let mut reached = 0;
            for (t, idx) in res.into_iter().enumerate() {
                if let Some(w) = slot_weight(&search, idx, 0) {
                    assert_eq!(Some(w), full[t], "budget {budget} target {}", targets[t]);
                    reached += 1;
                }
            }
            assert!(reached >= last, "budget {budget}: {reached} < {last}");
            last = reached;
        }
        assert_eq!(last, targets.len());
    }

    #[test]
    fn edge_based_mode_fails_at_prepare() {
        let g = diamond();
        let mut search =
            RphastSearch::new(&g, ShortestWeighting).with_mode(TraversalMode::EdgeBased);
        assert!(matches!(
            search.prepare(&[1], &[4]),
            Err(Error::UnsupportedMode(_))
        ));
        assert!(search.target_graph().is_none());
    }

    #[test]
    fn calc_paths_requires_prepare() {
        let g = diamond();
        let mut search = RphastSearch::new(&g, ShortestWeighting);
        assert!(matches!(search.calc_paths(&[1], &[4]), Err(Error::NotPrepared)));

        search.prepare(&[1], &[4]).unwrap();
        assert!(matches!(search.calc_paths(&[1], &[2]), Err(Error::NotPrepared)));
        search.reset();
        assert!(matches!(search.calc_paths(&[1], &[4]), Err(Error::NotPrepared)));
    }

    #[test]
    fn target_graph_only_holds_downward_edges() {
        let g = two_sources();
        let mut search = RphastSearch::new(&g, ShortestWeighting);
        search.prepare(&[0], &[3]).unwrap();
        let sub = search.target_graph().unwrap();
        // only M -> T qualifies: A and B sit below M
        assert_eq!(sub.edge_count(), 1);
        assert!(sub.contains_node(2));
        assert!(!sub.contains_node(0));
    }
}
