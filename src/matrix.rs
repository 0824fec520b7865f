//! Turning search labels into matrices and path metrics

use crate::dijkstra::OneToManyDijkstra;
use crate::filter::EdgeFilter;
use crate::graph::{ChGraph, EdgeId, Graph, LevelGraph, RoadGraph};
use crate::rphast::RphastSearch;
use crate::tree::EntryIdx;
use crate::weighting::{travel_time_secs, Weighting};

/// Cost per (source, target) pair, row-major by source
///
/// `None` means the target was not reached from that source.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n_sources: usize,
    n_targets: usize,
    weights: Vec<Option<f64>>,
}

impl DistanceMatrix {
    pub fn new(n_sources: usize, n_targets: usize) -> Self {
        Self {
            n_sources,
            n_targets,
            weights: vec![None; n_sources * n_targets],
        }
    }

    /// One row from a plain search result
    pub fn from_one_to_many<G: Graph, W: Weighting, F: EdgeFilter>(
        search: &OneToManyDijkstra<G, W, F>,
        results: &[Option<EntryIdx>],
    ) -> Self {
        let mut m = Self::new(1, results.len());
        for (t, res) in results.iter().enumerate() {
            let weight = res.and_then(|idx| search.entry(idx)).map(|e| e.weight);
            m.set(0, t, weight);
        }
        m
    }

    /// Full matrix from a hierarchy search over `n_sources` sources
    pub fn from_rphast<G: LevelGraph, W: Weighting, F: EdgeFilter>(
        search: &RphastSearch<G, W, F>,
        n_sources: usize,
        results: &[Option<EntryIdx>],
    ) -> Self {
        let mut m = Self::new(n_sources, results.len());
        for (t, res) in results.iter().enumerate() {
            let Some(entry) = res.and_then(|idx| search.entry(idx)) else {
                continue;
            };
            for s in 0..n_sources {
                m.set(s, t, entry.slot(s).map(|slot| slot.weight));
            }
        }
        m
    }

    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    pub fn get(&self, source: usize, target: usize) -> Option<f64> {
        if source >= self.n_sources || target >= self.n_targets {
            return None;
        }
        self.weights[source * self.n_targets + target]
    }

    pub fn set(&mut self, source: usize, target: usize, weight: Option<f64>) {
        if source < self.n_sources && target < self.n_targets {
            self.weights[source * self.n_targets + target] = weight;
        }
    }

    pub fn row(&self, source: usize) -> &[Option<f64>] {
        if source >= self.n_sources {
            return &[];
        }
        &self.weights[source * self.n_targets..(source + 1) * self.n_targets]
    }

    pub fn reachable_count(&self) -> usize {
        self.weights.iter().filter(|w| w.is_some()).count()
    }
}

/// Weight, length and travel time of one path
#[derive(Debug, Clone, PartialEq)]
pub struct PathMetrics {
    /// Cost under the query's weighting
    pub weight: f64,
    /// Metres
    pub distance: f64,
    /// Seconds at profile speed; infinite if an edge has no access
    pub duration: f64,
    /// Base edges in travel order
    pub edges: Vec<EdgeId>,
}

impl PathMetrics {
    /// Metrics of a path already expressed in base edges
    pub fn for_base_path(graph: &RoadGraph, edges: Vec<EdgeId>, weight: f64) -> Self {
        let mut distance = 0.0;
        let mut duration = 0.0;
        for &edge in &edges {
            let Some(state) = graph.edge(edge) else {
                tracing::trace!(edge, "path metrics: unknown base edge");
                continue;
            };
            distance += state.distance;
            duration += travel_time_secs(&state).unwrap_or(f64::INFINITY);
        }
        Self {
            weight,
            distance,
            duration,
            edges,
        }
    }

    /// Metrics of an overlay path; shortcuts are unpacked first
    pub fn for_ch_path(graph: &ChGraph, overlay: &[EdgeId], weight: f64) -> Self {
        Self::for_base_path(graph.base(), graph.unpack_path(overlay), weight)
    }
}

/// Metrics for every (source, target) pair of a hierarchy search, row-major
pub fn rphast_path_metrics<W: Weighting, F: EdgeFilter>(
    search: &RphastSearch<&ChGraph, W, F>,
    n_sources: usize,
    results: &[Option<EntryIdx>],
) -> Vec<Option<PathMetrics>> {
    let graph = *search.graph();
    let mut out = Vec::with_capacity(n_sources * results.len());
    for s in 0..n_sources {
        for res in results {
            let metrics = res.and_then(|idx| {
                let slot = search.entry(idx)?.slot(s)?;
                let overlay = search.path_edges(idx, s);
                Some(PathMetrics::for_ch_path(graph, &overlay, slot.weight))
            });
            out.push(metrics);
        }
    }
    out
}
