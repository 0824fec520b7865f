//! Graph model shared by every search
//!
//! Graphs are immutable once built and are shared read-only between any number
//! of concurrently running queries. Searches only see them through the
//! [`Adjacency`] cursor contract, so the full graph and the query-time
//! [`SubGraph`](crate::subgraph::SubGraph) are explored by the same code.
//!
//! Every edge is directed. A cursor yielded while expanding `node` always has
//! `base == node`; for [`Direction::Backward`] cursors the physical edge runs
//! `adj → base`.

mod ch;
mod road;

pub use ch::{ChGraph, ChGraphBuilder};
pub use road::{RoadEdge, RoadGraph, RoadGraphBuilder};

/// Node identifier (dense, `0..node_count`)
pub type NodeId = u32;

/// Edge identifier (dense; shortcuts are numbered after all base edges)
pub type EdgeId = u32;

/// Which adjacency list a search walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Outgoing edges, `base → adj`
    Forward,
    /// Incoming edges, `adj → base`
    Backward,
}

impl Direction {
    /// Weightings take a `reverse` flag rather than a direction
    #[inline]
    pub fn is_reverse(self) -> bool {
        matches!(self, Direction::Backward)
    }
}

/// Precomputed data carried by a shortcut edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortcut {
    /// Weight fixed at contraction time
    pub weight: f64,
    /// Skipped edges in travel order: `from → via`, then `via → to`
    pub skipped: (EdgeId, EdgeId),
}

/// Edge cursor handed to filters and weightings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeState {
    pub edge: EdgeId,
    /// Node being expanded
    pub base: NodeId,
    /// Neighbour reached through this edge
    pub adj: NodeId,
    /// Length in metres
    pub distance: f64,
    /// Profile speed in km/h, 0 when the vehicle has no access
    pub speed_kmh: f64,
    pub shortcut: Option<Shortcut>,
}

impl EdgeState {
    #[inline]
    pub fn is_shortcut(&self) -> bool {
        self.shortcut.is_some()
    }

    #[inline]
    pub fn is_accessible(&self) -> bool {
        self.speed_kmh > 0.0
    }

    /// Physical tail and head of the edge for a cursor obtained in `dir`
    #[inline]
    pub fn endpoints(&self, dir: Direction) -> (NodeId, NodeId) {
        match dir {
            Direction::Forward => (self.base, self.adj),
            Direction::Backward => (self.adj, self.base),
        }
    }
}

/// Edge cursor contract: everything a relaxation loop needs
pub trait Adjacency {
    /// Edges incident to `node` in `dir`, oriented with `base == node`
    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = EdgeState> + '_;
}

/// A complete, shareable routing graph
pub trait Graph: Adjacency + Send + Sync {
    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    /// Edge by id, oriented in its travel direction (`base → adj`)
    fn edge(&self, edge: EdgeId) -> Option<EdgeState>;

    /// Fails with [`Error::InvalidNode`](crate::Error::InvalidNode) for ids outside the graph
    fn check_node(&self, node: NodeId) -> crate::Result<()> {
        if (node as usize) < self.node_count() {
            Ok(())
        } else {
            Err(crate::Error::InvalidNode {
                node,
                node_count: self.node_count(),
            })
        }
    }
}

/// Graph with precomputed contraction levels
pub trait LevelGraph: Graph {
    fn level(&self, node: NodeId) -> u32;
}

impl<G: Adjacency + ?Sized> Adjacency for &G {
    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = EdgeState> + '_ {
        (**self).edges(node, dir)
    }
}

impl<G: Graph + ?Sized> Graph for &G {
    fn node_count(&self) -> usize {
        (**self).node_count()
    }

    fn edge_count(&self) -> usize {
        (**self).edge_count()
    }

    fn edge(&self, edge: EdgeId) -> Option<EdgeState> {
        (**self).edge(edge)
    }
}

impl<G: LevelGraph + ?Sized> LevelGraph for &G {
    fn level(&self, node: NodeId) -> u32 {
        (**self).level(node)
    }
}

impl<G: Adjacency + ?Sized> Adjacency for std::sync::Arc<G> {
    fn edges(&self, node: NodeId, dir: Direction) -> impl Iterator<Item = EdgeState> + '_ {
        (**self).edges(node, dir)
    }
}

impl<G: Graph + ?Sized> Graph for std::sync::Arc<G> {
    fn node_count(&self) -> usize {
        (**self).node_count()
    }

    fn edge_count(&self) -> usize {
        (**self).edge_count()
    }

    fn edge(&self, edge: EdgeId) -> Option<EdgeState> {
        (**self).edge(edge)
    }
}

impl<G: LevelGraph + ?Sized> LevelGraph for std::sync::Arc<G> {
    fn level(&self, node: NodeId) -> u32 {
        (**self).level(node)
    }
}
