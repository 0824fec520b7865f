//! Soft preference by tag-derived road priority

use std::sync::Arc;

use super::Weighting;
use crate::attributes::EdgeStore;
use crate::error::{Error, Result};
use crate::graph::{EdgeId, EdgeState};

/// Preference band a priority value falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriorityBand {
    AvoidAtAllCost,
    ReachDestination,
    AvoidIfPossible,
    Neutral,
    Prefer,
    Best,
}

impl PriorityBand {
    /// Band of a priority in `0..=1`; thresholds at k/7, upper bound inclusive
    pub fn of(priority: f64) -> Self {
        // compare in sevenths so that k/7 itself stays in band k
        let sevenths = priority * 7.0;
        if sevenths <= 1.0 {
            PriorityBand::AvoidAtAllCost
        } else if sevenths <= 2.0 {
            PriorityBand::ReachDestination
        } else if sevenths <= 3.0 {
            PriorityBand::AvoidIfPossible
        } else if sevenths <= 4.0 {
            PriorityBand::Neutral
        } else if sevenths <= 5.0 {
            PriorityBand::Prefer
        } else {
            PriorityBand::Best
        }
    }

    fn adjust(self, priority: f64) -> f64 {
        match self {
            PriorityBand::AvoidAtAllCost => priority / 2.0,
            PriorityBand::ReachDestination => priority / 1.5,
            PriorityBand::AvoidIfPossible => priority / 1.25,
            PriorityBand::Neutral => priority,
            PriorityBand::Prefer => priority * 1.5,
            PriorityBand::Best => priority * 2.0,
        }
    }
}

/// `inner / (0.5 + adjusted_priority)`
#[derive(Clone)]
pub struct PriorityWeighting<W> {
    inner: W,
    store: Arc<dyn EdgeStore<f64>>,
}

impl<W: Weighting> PriorityWeighting<W> {
    pub fn new(inner: W, store: Option<Arc<dyn EdgeStore<f64>>>) -> Result<Self> {
        let store =
            store.ok_or_else(|| Error::config("priority weighting requires a priority store"))?;
        Ok(Self { inner, store })
    }
}

impl<W: Weighting> Weighting for PriorityWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let weight = self.inner.calc_weight(edge, reverse, prev_edge)?;
        let Some(priority) = self.store.value(edge.edge) else {
            return Ok(weight);
        };
        if !(0.0..=1.0).contains(&priority) {
            return Err(Error::edge_data(
                edge.edge,
                format!("priority {priority} outside 0..=1"),
            ));
        }
        let adjusted = PriorityBand::of(priority).adjust(priority);
        Ok(weight / (0.5 + adjusted))
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for PriorityWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityWeighting")
            .field("inner", &self.inner)
            .finish()
    }
}
