//! Edge cost functions
//!
//! Every search calls exactly one primitive per relaxed edge:
//! [`calc_edge_weight`], which returns the precomputed weight of shortcuts and
//! defers to the active [`Weighting`] for everything else.
//!
//! A weighting stack is built from three kinds of pieces:
//!
//! - base weightings ([`ShortestWeighting`], [`FastestWeighting`])
//! - decorators that wrap one inner weighting and scale or override its cost
//!   from an attribute store
//! - combinators ([`SumWeighting`], [`ProductWeighting`]) folding N weightings
//!
//! `f64::INFINITY` means "do not use this edge" and survives every decorator
//! and combinator unchanged.

mod avoid_features;
mod borders;
mod combinators;
mod environment;
mod priority;
mod steepness;
mod traffic;

pub use avoid_features::AvoidFeaturesWeighting;
pub use borders::{BorderRestriction, BordersWeighting};
pub use combinators::{ProductWeighting, SumWeighting};
pub use environment::{GreenWeighting, QuietWeighting};
pub use priority::{PriorityBand, PriorityWeighting};
pub use steepness::{AvoidHillsWeighting, SteepnessDifficultyWeighting, HILL_PENALTY};
pub use traffic::TrafficWeighting;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::graph::{EdgeId, EdgeState};

/// Cost of an edge that must not be used
pub const INFEASIBLE: f64 = f64::INFINITY;

/// km/h → m/s
const SPEED_CONV: f64 = 3.6;

/// Per-edge cost function
///
/// `reverse` is true when the edge is evaluated from a backward cursor.
/// `prev_edge` is the edge the search arrived by, if any. Costs are
/// non-negative; [`INFEASIBLE`] marks an unusable edge. An `Err` means the
/// edge carries attribute data this weighting cannot interpret and aborts
/// the current query only.
pub trait Weighting: fmt::Debug + Send + Sync {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64>;
}

impl<W: Weighting + ?Sized> Weighting for &W {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        (**self).calc_weight(edge, reverse, prev_edge)
    }
}

impl<W: Weighting + ?Sized> Weighting for Box<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        (**self).calc_weight(edge, reverse, prev_edge)
    }
}

impl<W: Weighting + ?Sized> Weighting for Arc<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        (**self).calc_weight(edge, reverse, prev_edge)
    }
}

/// Cost used by the search loops: stored weight for shortcuts, weighting otherwise
#[inline]
pub fn calc_edge_weight<W: Weighting + ?Sized>(
    weighting: &W,
    edge: &EdgeState,
    reverse: bool,
    prev_edge: Option<EdgeId>,
) -> Result<f64> {
    match edge.shortcut {
        Some(sc) => Ok(sc.weight),
        None => weighting.calc_weight(edge, reverse, prev_edge),
    }
}

/// Length in metres
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestWeighting;

impl Weighting for ShortestWeighting {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        _reverse: bool,
        _prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        if !edge.is_accessible() {
            return Ok(INFEASIBLE);
        }
        Ok(edge.distance)
    }
}

/// Travel time in seconds at profile speed, optionally capped
#[derive(Debug, Clone, Copy, Default)]
pub struct FastestWeighting {
    max_speed_kmh: Option<f64>,
}

impl FastestWeighting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never assume more than `max_speed_kmh`
    pub fn with_max_speed(max_speed_kmh: f64) -> Result<Self> {
        if !(max_speed_kmh > 0.0) {
            return Err(crate::Error::config(format!(
                "maximum speed must be positive, got {max_speed_kmh}"
            )));
        }
        Ok(Self {
            max_speed_kmh: Some(max_speed_kmh),
        })
    }

    /// Speed actually used for `edge`, in km/h
    #[inline]
    pub fn effective_speed(&self, edge: &EdgeState) -> f64 {
        match self.max_speed_kmh {
            Some(max) => edge.speed_kmh.min(max),
            None => edge.speed_kmh,
        }
    }
}

impl Weighting for FastestWeighting {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        _reverse: bool,
        _prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let speed = self.effective_speed(edge);
        if speed <= 0.0 {
            return Ok(INFEASIBLE);
        }
        Ok(edge.distance * SPEED_CONV / speed)
    }
}

/// Travel time of `edge` at its profile speed in seconds, `None` without access
pub fn travel_time_secs(edge: &EdgeState) -> Option<f64> {
    if edge.is_accessible() {
        Some(edge.distance * SPEED_CONV / edge.speed_kmh)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::graph::{EdgeId, EdgeState, Shortcut};

    pub fn edge(edge: EdgeId, distance: f64, speed_kmh: f64) -> EdgeState {
        EdgeState {
            edge,
            base: 0,
            adj: 1,
            distance,
            speed_kmh,
            shortcut: None,
        }
    }

    pub fn shortcut(edge: EdgeId, weight: f64) -> EdgeState {
        EdgeState {
            shortcut: Some(Shortcut {
                weight,
                skipped: (0, 1),
            }),
            speed_kmh: 0.0,
            ..self::edge(edge, 1.0, 0.0)
        }
    }
}
