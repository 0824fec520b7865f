//! Butterfly-search - shortest path search over contracted road graphs
//!
//! Two searches share one weighting stack:
//!
//! - [`OneToManyDijkstra`]: single source, many targets, any graph.
//! - [`RphastSearch`]: one or many sources to many targets over a
//!   [`ChGraph`], using an upward pass on the full graph and a downward pass
//!   over a per-query target sub-graph.
//!
//! ```
//! use butterfly_search::{ChGraphBuilder, RoadGraph, RphastSearch, ShortestWeighting};
//! use std::sync::Arc;
//!
//! let mut b = RoadGraph::builder(3);
//! b.add_edge(0, 1, 5.0, 50.0);
//! b.add_edge(1, 2, 5.0, 50.0);
//! let ch = ChGraphBuilder::new(Arc::new(b.build()?), vec![0, 1, 2]).build()?;
//!
//! let mut search = RphastSearch::new(&ch, ShortestWeighting);
//! search.prepare(&[0], &[2])?;
//! let hits = search.calc_paths(&[0], &[2])?;
//! let weight = hits[0].and_then(|idx| search.entry(idx)?.slot(0)).map(|s| s.weight);
//! assert_eq!(weight, Some(10.0));
//! # Ok::<(), butterfly_search::Error>(())
//! ```

pub mod attributes;
pub mod config;
pub mod dijkstra;
pub mod error;
pub mod filter;
pub mod graph;
pub mod matrix;
pub mod observe;
pub mod queue;
pub mod rphast;
pub mod subgraph;
pub mod tree;
pub mod weighting;

pub use attributes::{AttributeStores, AvoidFeatures, EdgeStore, TravelMode, VecStore};
pub use config::{ProfileConfig, SearchConfig, WeightingConfig};
pub use dijkstra::{OneToManyDijkstra, TraversalMode};
pub use error::{Error, Result};
pub use filter::{AvoidEdgesFilter, EdgeFilter, FilterChain, UTurnFilter};
pub use graph::{
    Adjacency, ChGraph, ChGraphBuilder, Direction, EdgeId, EdgeState, Graph, LevelGraph, NodeId,
    RoadGraph,
};
pub use matrix::{DistanceMatrix, PathMetrics};
pub use observe::{HistogramObserver, SearchObserver, SearchStats};
pub use rphast::RphastSearch;
pub use weighting::{FastestWeighting, ShortestWeighting, Weighting};
