//! Query statistics and the observer hook that receives them
//!
//! Searches fill a [`SearchStats`] while they run and hand it to their
//! observer once per `calc_paths`. Observers only read; they cannot change a
//! result.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hdrhistogram::Histogram;

use crate::error::{Error, Result};

/// Which search produced a [`SearchStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
    #[default]
    OneToMany,
    Rphast,
}

/// Statistics for one query
#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    pub kind: SearchKind,
    pub n_sources: usize,
    pub n_targets: usize,
    /// Nodes settled across all passes
    pub visited_nodes: usize,
    pub upward_visited: usize,
    pub downward_visited: usize,
    pub subgraph_nodes: usize,
    pub subgraph_edges: usize,
    /// Total relaxations that improved a label
    pub heap_pushes: usize,
    pub reached_targets: usize,
    /// The visited-node budget stopped the search early
    pub budget_exhausted: bool,
    pub elapsed: Duration,
}

/// Receives statistics after every query
pub trait SearchObserver: Send {
    fn on_query(&mut self, stats: &SearchStats);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {
    #[inline]
    fn on_query(&mut self, _stats: &SearchStats) {}
}

/// Lets several search instances report into one observer
impl<O: SearchObserver> SearchObserver for Arc<Mutex<O>> {
    fn on_query(&mut self, stats: &SearchStats) {
        match self.lock() {
            Ok(mut inner) => inner.on_query(stats),
            Err(_) => tracing::warn!("search observer lock poisoned, dropping stats"),
        }
    }
}

/// Latency and visited-node distributions across queries
#[derive(Debug, Clone)]
pub struct HistogramObserver {
    latency_us: Histogram<u64>,
    visited: Histogram<u64>,
    queries: u64,
    budget_exhausted: u64,
    unreached_targets: u64,
}

/// Snapshot of a [`HistogramObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistogramSummary {
    pub queries: u64,
    pub budget_exhausted: u64,
    pub unreached_targets: u64,
    pub latency_p50_us: u64,
    pub latency_p99_us: u64,
    pub latency_max_us: u64,
    pub visited_p50: u64,
    pub visited_max: u64,
    pub visited_mean: f64,
}

impl HistogramObserver {
    pub fn new() -> Result<Self> {
        let hist = || {
            Histogram::<u64>::new(3).map_err(|e| Error::config(format!("histogram: {e}")))
        };
        Ok(Self {
            latency_us: hist()?,
            visited: hist()?,
            queries: 0,
            budget_exhausted: 0,
            unreached_targets: 0,
        })
    }

    pub fn queries(&self) -> u64 {
        self.queries
    }

    pub fn summary(&self) -> HistogramSummary {
        HistogramSummary {
            queries: self.queries,
            budget_exhausted: self.budget_exhausted,
            unreached_targets: self.unreached_targets,
            latency_p50_us: self.latency_us.value_at_quantile(0.50),
            latency_p99_us: self.latency_us.value_at_quantile(0.99),
            latency_max_us: self.latency_us.max(),
            visited_p50: self.visited.value_at_quantile(0.50),
            visited_max: self.visited.max(),
            visited_mean: self.visited.mean(),
        }
    }

    pub fn reset(&mut self) {
        self.latency_us.reset();
        self.visited.reset();
        self.queries = 0;
        self.budget_exhausted = 0;
        self.unreached_targets = 0;
    }
}

impl SearchObserver for HistogramObserver {
    fn on_query(&mut self, stats: &SearchStats) {
        self.queries += 1;
        if stats.budget_exhausted {
            self.budget_exhausted += 1;
        }
        let pairs = stats.n_targets * stats.n_sources.max(1);
        self.unreached_targets += pairs.saturating_sub(stats.reached_targets) as u64;
        self.latency_us
            .saturating_record(stats.elapsed.as_micros().min(u64::MAX as u128) as u64);
        self.visited.saturating_record(stats.visited_nodes as u64);
    }
}
