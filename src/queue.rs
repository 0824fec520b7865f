//! Search frontier: arena indices keyed by cumulative weight

use std::cmp::{Ordering, Reverse};

use priority_queue::PriorityQueue;
use rustc_hash::FxBuildHasher;

use crate::tree::EntryIdx;

/// Totally ordered `f64` for use as a heap key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight(pub f64);

impl Eq for Weight {}

impl PartialOrd for Weight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Min-queue over arena entries with decrease-key
#[derive(Clone)]
pub struct Frontier {
    pq: PriorityQueue<EntryIdx, Reverse<Weight>, FxBuildHasher>,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Frontier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frontier")
            .field("len", &self.pq.len())
            .field("min", &self.peek_weight())
            .finish()
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            pq: PriorityQueue::default(),
        }
    }

    /// Insert `idx`, or move it to `weight` if already queued
    pub fn push(&mut self, idx: EntryIdx, weight: f64) {
        self.pq.push(idx, Reverse(Weight(weight)));
    }

    /// Entry with the smallest weight
    pub fn pop(&mut self) -> Option<(EntryIdx, f64)> {
        self.pq.pop().map(|(idx, Reverse(Weight(w)))| (idx, w))
    }

    pub fn peek_weight(&self) -> Option<f64> {
        self.pq.peek().map(|(_, Reverse(Weight(w)))| *w)
    }

    pub fn contains(&self, idx: EntryIdx) -> bool {
        self.pq.get(&idx).is_some()
    }

    /// Queued entries in no particular order
    pub fn indices(&self) -> impl Iterator<Item = EntryIdx> + '_ {
        self.pq.iter().map(|(idx, _)| *idx)
    }

    pub fn len(&self) -> usize {
        self.pq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pq.is_empty()
    }

    pub fn clear(&mut self) {
        self.pq.clear();
    }
}
