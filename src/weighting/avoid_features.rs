//! Near-exclusion of way categories (ferries, tollways, steps, ...)

use std::sync::Arc;

use super::steepness::steepness_bucket;
use super::{Weighting, HILL_PENALTY};
use crate::attributes::{AvoidFeatures, EdgeStore, TravelMode};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, EdgeState};

/// Divisor applied to the cost of an avoided edge (i.e. ×1000)
const SPEED_FACTOR: f64 = 0.001;

/// Makes avoided categories practically unusable without forbidding them
///
/// An edge whose category bits intersect the avoid set costs `inner / 0.001`.
/// If `hills` is requested and a steepness store is attached, the hill
/// penalty table is applied on top.
#[derive(Clone)]
pub struct AvoidFeaturesWeighting<W> {
    inner: W,
    avoid: AvoidFeatures,
    categories: Arc<dyn EdgeStore<AvoidFeatures>>,
    steepness: Option<Arc<dyn EdgeStore<u8>>>,
}

impl<W: Weighting> AvoidFeaturesWeighting<W> {
    pub fn new(
        inner: W,
        mode: TravelMode,
        avoid: AvoidFeatures,
        categories: Option<Arc<dyn EdgeStore<AvoidFeatures>>>,
        steepness: Option<Arc<dyn EdgeStore<u8>>>,
    ) -> Result<Self> {
        let illegal = avoid.difference(mode.legal_features());
        if !illegal.is_empty() {
            return Err(Error::config(format!(
                "cannot avoid {illegal} when {mode:?}"
            )));
        }
        let categories = categories.ok_or_else(|| {
            Error::config("avoid-features weighting requires a way category store")
        })?;
        Ok(Self {
            inner,
            avoid,
            categories,
            steepness,
        })
    }

    pub fn avoided(&self) -> AvoidFeatures {
        self.avoid
    }

    fn hill_factor(&self, edge: &EdgeState) -> Result<f64> {
        if !self.avoid.contains(AvoidFeatures::HILLS) {
            return Ok(1.0);
        }
        let Some(store) = self.steepness.as_deref() else {
            return Ok(1.0);
        };
        Ok(steepness_bucket(store, edge)?.map_or(1.0, |b| HILL_PENALTY[b]))
    }
}

impl<W: Weighting> Weighting for AvoidFeaturesWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let weight = self.inner.calc_weight(edge, reverse, prev_edge)?;
        if self.avoid.is_empty() {
            return Ok(weight);
        }

        let mut weight = weight * self.hill_factor(edge)?;
        let category = self.categories.value(edge.edge).unwrap_or_default();
        if category.intersects(self.avoid) {
            weight /= SPEED_FACTOR;
        }
        Ok(weight)
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for AvoidFeaturesWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvoidFeaturesWeighting")
            .field("inner", &self.inner)
            .field("avoid", &self.avoid.to_string())
            .field("steepness", &self.steepness.is_some())
            .finish()
    }
}
