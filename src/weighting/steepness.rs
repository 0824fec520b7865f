//! Steepness-based penalties for cycling and walking profiles

use std::sync::Arc;

use super::{Weighting, INFEASIBLE};
use crate::attributes::{EdgeStore, MAX_STEEPNESS_BUCKET};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, EdgeState};

const BUCKETS: usize = MAX_STEEPNESS_BUCKET as usize + 1;

/// Multiplier per steepness bucket for a rider who avoids hills
pub const HILL_PENALTY: [f64; BUCKETS] = [
    1.0, 1.0, 1.05, 1.1, 1.2, 1.35, 1.5, 1.7, 1.95, 2.25, 2.6, 3.0, 3.5, 4.1, 4.8, 5.6,
];

/// Rows: difficulty 0 (novice) to 3 (pro). Each row is non-decreasing.
const DIFFICULTY_PENALTY: [[f64; BUCKETS]; 4] = [
    [1.0, 1.0, 1.1, 1.3, 1.6, 2.0, 2.6, 3.4, 4.4, 5.6, 7.0, 8.6, 10.4, 12.4, 14.6, 17.0],
    [1.0, 1.0, 1.0, 1.1, 1.3, 1.6, 2.0, 2.5, 3.1, 3.8, 4.6, 5.5, 6.5, 7.6, 8.8, 10.1],
    [1.0, 1.0, 1.0, 1.0, 1.1, 1.2, 1.4, 1.7, 2.0, 2.4, 2.9, 3.5, 4.2, 5.0, 5.9, 6.9],
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.1, 1.2, 1.3, 1.5, 1.7, 2.0, 2.3, 2.7, 3.1, 3.6, 4.1],
];

/// Bucket of `edge`, `None` when the store has no record
pub(super) fn steepness_bucket(
    store: &dyn EdgeStore<u8>,
    edge: &EdgeState,
) -> Result<Option<usize>> {
    match store.value(edge.edge) {
        None => Ok(None),
        Some(b) if b <= MAX_STEEPNESS_BUCKET => Ok(Some(b as usize)),
        Some(b) => Err(Error::edge_data(
            edge.edge,
            format!("steepness bucket {b} out of range"),
        )),
    }
}

fn check_max_bucket(max_bucket: u8) -> Result<()> {
    if max_bucket > MAX_STEEPNESS_BUCKET {
        return Err(Error::config(format!(
            "maximum steepness bucket {max_bucket} exceeds {MAX_STEEPNESS_BUCKET}"
        )));
    }
    Ok(())
}

/// Penalises climbs according to rider difficulty
#[derive(Clone)]
pub struct SteepnessDifficultyWeighting<W> {
    inner: W,
    store: Arc<dyn EdgeStore<u8>>,
    difficulty: usize,
    max_bucket: u8,
}

impl<W: Weighting> SteepnessDifficultyWeighting<W> {
    /// `difficulty` in `0..=3`; edges steeper than `max_bucket` are infeasible
    pub fn new(
        inner: W,
        store: Option<Arc<dyn EdgeStore<u8>>>,
        difficulty: u8,
        max_bucket: u8,
    ) -> Result<Self> {
        let store = store.ok_or_else(|| {
            Error::config("steepness difficulty weighting requires a steepness store")
        })?;
        if difficulty as usize >= DIFFICULTY_PENALTY.len() {
            return Err(Error::config(format!(
                "difficulty level {difficulty} out of range 0..=3"
            )));
        }
        check_max_bucket(max_bucket)?;
        Ok(Self {
            inner,
            store,
            difficulty: difficulty as usize,
            max_bucket,
        })
    }

    pub fn penalty(&self, bucket: usize) -> f64 {
        DIFFICULTY_PENALTY[self.difficulty][bucket.min(BUCKETS - 1)]
    }
}

impl<W: Weighting> Weighting for SteepnessDifficultyWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let factor = match steepness_bucket(&*self.store, edge)? {
            Some(b) if b > self.max_bucket as usize => return Ok(INFEASIBLE),
            Some(b) => self.penalty(b),
            None => 1.0,
        };
        Ok(self.inner.calc_weight(edge, reverse, prev_edge)? * factor)
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for SteepnessDifficultyWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteepnessDifficultyWeighting")
            .field("inner", &self.inner)
            .field("difficulty", &self.difficulty)
            .field("max_bucket", &self.max_bucket)
            .finish()
    }
}

/// Penalises climbs with the hill table, scaled by `strength`
#[derive(Clone)]
pub struct AvoidHillsWeighting<W> {
    inner: W,
    store: Arc<dyn EdgeStore<u8>>,
    strength: f64,
    max_bucket: u8,
}

impl<W: Weighting> AvoidHillsWeighting<W> {
    /// `strength` 1.0 applies the table as is, 0.0 disables it
    pub fn new(
        inner: W,
        store: Option<Arc<dyn EdgeStore<u8>>>,
        strength: f64,
        max_bucket: u8,
    ) -> Result<Self> {
        let store =
            store.ok_or_else(|| Error::config("avoid-hills weighting requires a steepness store"))?;
        if !(strength >= 0.0) {
            return Err(Error::config(format!(
                "hill avoidance strength must be non-negative, got {strength}"
            )));
        }
        check_max_bucket(max_bucket)?;
        Ok(Self {
            inner,
            store,
            strength,
            max_bucket,
        })
    }

    pub fn penalty(&self, bucket: usize) -> f64 {
        1.0 + (HILL_PENALTY[bucket.min(BUCKETS - 1)] - 1.0) * self.strength
    }
}

impl<W: Weighting> Weighting for AvoidHillsWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let factor = match steepness_bucket(&*self.store, edge)? {
            Some(b) if b > self.max_bucket as usize => return Ok(INFEASIBLE),
            Some(b) => self.penalty(b),
            None => 1.0,
        };
        Ok(self.inner.calc_weight(edge, reverse, prev_edge)? * factor)
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for AvoidHillsWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvoidHillsWeighting")
            .field("inner", &self.inner)
            .field("strength", &self.strength)
            .field("max_bucket", &self.max_bucket)
            .finish()
    }
}
