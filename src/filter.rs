//! Edge filters applied before an edge is relaxed
//!
//! A filter sees the edge cursor and the id of the edge the search arrived
//! by. Filters are stateless and compose with [`FilterChain`]; all members
//! must accept. [`LevelEdgeFilter`] is the one stateful exception: it also
//! remembers the highest-level node the upward pass has reached.

use rustc_hash::FxHashSet;

use crate::graph::{Direction, EdgeId, EdgeState, Graph, LevelGraph, NodeId};

/// Accept/reject predicate over an edge cursor
pub trait EdgeFilter: Send + Sync {
    fn accept(&self, edge: &EdgeState, prev_edge: Option<EdgeId>) -> bool;
}

impl<F: EdgeFilter + ?Sized> EdgeFilter for &F {
    fn accept(&self, edge: &EdgeState, prev_edge: Option<EdgeId>) -> bool {
        (**self).accept(edge, prev_edge)
    }
}

impl<F: EdgeFilter + ?Sized> EdgeFilter for Box<F> {
    fn accept(&self, edge: &EdgeState, prev_edge: Option<EdgeId>) -> bool {
        (**self).accept(edge, prev_edge)
    }
}

/// Accepts every edge
#[derive(Debug, Clone, Copy, Default)]
pub struct AllEdges;

impl EdgeFilter for AllEdges {
    #[inline]
    fn accept(&self, _edge: &EdgeState, _prev_edge: Option<EdgeId>) -> bool {
        true
    }
}

/// Rejects turning straight back onto the node the search came from
///
/// Needs the graph to resolve the previous edge's far endpoint.
#[derive(Debug, Clone)]
pub struct UTurnFilter<G> {
    graph: G,
}

impl<G: Graph> UTurnFilter<G> {
    pub fn new(graph: G) -> Self {
        Self { graph }
    }
}

impl<G: Graph> EdgeFilter for UTurnFilter<G> {
    fn accept(&self, edge: &EdgeState, prev_edge: Option<EdgeId>) -> bool {
        let Some(prev) = prev_edge else {
            return true;
        };
        if prev == edge.edge {
            return false;
        }
        match self.graph.edge(prev) {
            Some(p) => {
                // `p` is oriented tail → head; the far end is whichever is not `base`
                let came_from = if p.base == edge.base { p.adj } else { p.base };
                came_from != edge.adj
            }
            None => true,
        }
    }
}

/// Rejects a caller-supplied set of edges (detours, closures)
///
/// Matches edge ids as they appear in the cursor. On a contracted graph a
/// shortcut covering an avoided base edge is not rejected, so use this with
/// the plain search over the base graph.
#[derive(Debug, Clone, Default)]
pub struct AvoidEdgesFilter {
    avoided: FxHashSet<EdgeId>,
}

impl AvoidEdgesFilter {
    pub fn new(edges: impl IntoIterator<Item = EdgeId>) -> Self {
        Self {
            avoided: edges.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.avoided.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avoided.is_empty()
    }
}

impl EdgeFilter for AvoidEdgesFilter {
    #[inline]
    fn accept(&self, edge: &EdgeState, _prev_edge: Option<EdgeId>) -> bool {
        !self.avoided.contains(&edge.edge)
    }
}

/// Conjunction of filters, evaluated in insertion order
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn EdgeFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl EdgeFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn push(&mut self, filter: Box<dyn EdgeFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl EdgeFilter for FilterChain {
    fn accept(&self, edge: &EdgeState, prev_edge: Option<EdgeId>) -> bool {
        self.filters.iter().all(|f| f.accept(edge, prev_edge))
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Which half of a hierarchy query is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPass {
    /// Level never decreases along the path
    Upward,
    /// Level never increases along the path
    Downward,
}

/// Level-monotonic filter for hierarchy searches
#[derive(Debug, Clone)]
pub struct LevelEdgeFilter {
    pass: SearchPass,
    highest: Option<(NodeId, u32)>,
}

impl LevelEdgeFilter {
    pub fn new(pass: SearchPass) -> Self {
        Self {
            pass,
            highest: None,
        }
    }

    pub fn pass(&self) -> SearchPass {
        self.pass
    }

    /// Accept `edge` if levels move the right way along the path
    ///
    /// `dir` is the cursor direction: a backward cursor walks the path
    /// against travel direction, so the comparison flips.
    #[inline]
    pub fn accept<G: LevelGraph>(&self, graph: &G, edge: &EdgeState, dir: Direction) -> bool {
        let base = graph.level(edge.base);
        let adj = graph.level(edge.adj);
        match (self.pass, dir) {
            (SearchPass::Upward, Direction::Forward)
            | (SearchPass::Downward, Direction::Backward) => adj >= base,
            (SearchPass::Upward, Direction::Backward)
            | (SearchPass::Downward, Direction::Forward) => adj <= base,
        }
    }

    /// Remember `node` if it outranks every node seen so far (first wins ties)
    pub fn update_highest<G: LevelGraph>(&mut self, graph: &G, node: NodeId) {
        let level = graph.level(node);
        match self.highest {
            Some((_, best)) if best >= level => {}
            _ => self.highest = Some((node, level)),
        }
    }

    pub fn highest_node(&self) -> Option<NodeId> {
        self.highest.map(|(node, _)| node)
    }

    pub fn reset(&mut self) {
        self.highest = None;
    }
}
