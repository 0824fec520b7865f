//! Live traffic: closures, delays, speed limits and slowdowns
//!
//! Expects a time-based inner weighting (seconds at free-flow speed).

use std::sync::Arc;

use super::{Weighting, INFEASIBLE};
use crate::attributes::{TrafficEffect, TrafficStore};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, EdgeState};

#[derive(Clone)]
pub struct TrafficWeighting<W> {
    inner: W,
    store: Arc<TrafficStore>,
    heavy_vehicle: bool,
}

/// What the active events on one edge amount to
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Impact {
    blocked: bool,
    delay_secs: Option<f64>,
    speed_cap_kmh: Option<f64>,
    speed_factor: Option<f64>,
}

impl<W: Weighting> TrafficWeighting<W> {
    /// `heavy_vehicle` selects whether HGV-only events apply
    pub fn new(inner: W, store: Option<Arc<TrafficStore>>, heavy_vehicle: bool) -> Result<Self> {
        let store =
            store.ok_or_else(|| Error::config("traffic weighting requires a traffic store"))?;
        Ok(Self {
            inner,
            store,
            heavy_vehicle,
        })
    }

    fn impact(&self, edge: EdgeId) -> Result<Impact> {
        let mut impact = Impact::default();
        for &code in self.store.codes(edge) {
            let event = self.store.table().get(code).ok_or_else(|| {
                Error::edge_data(edge, format!("unknown traffic event code {code}"))
            })?;
            if event.heavy_vehicles_only && !self.heavy_vehicle {
                continue;
            }
            match event.effect {
                TrafficEffect::Blocked => impact.blocked = true,
                TrafficEffect::Delay(secs) => {
                    impact.delay_secs = Some(impact.delay_secs.map_or(secs, |d| d.max(secs)));
                }
                TrafficEffect::SpeedCap(kmh) => {
                    impact.speed_cap_kmh = Some(impact.speed_cap_kmh.map_or(kmh, |c| c.min(kmh)));
                }
                TrafficEffect::SpeedFactor(f) if f > 0.0 && f <= 1.0 => {
                    impact.speed_factor = Some(impact.speed_factor.map_or(f, |m| m.min(f)));
                }
                TrafficEffect::SpeedFactor(f) => {
                    return Err(Error::edge_data(
                        edge,
                        format!("traffic event {code} has speed factor {f} outside (0, 1]"),
                    ));
                }
            }
        }
        Ok(impact)
    }
}

impl<W: Weighting> Weighting for TrafficWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let impact = self.impact(edge.edge)?;
        if impact.blocked {
            return Ok(INFEASIBLE);
        }

        let free_flow = self.inner.calc_weight(edge, reverse, prev_edge)?;
        if !free_flow.is_finite() {
            return Ok(free_flow);
        }

        let weight = if let Some(delay) = impact.delay_secs {
            free_flow + delay
        } else if let Some(cap) = impact.speed_cap_kmh {
            if cap <= 0.0 {
                INFEASIBLE
            } else if cap < edge.speed_kmh {
                free_flow * edge.speed_kmh / cap
            } else {
                free_flow
            }
        } else if let Some(factor) = impact.speed_factor {
            free_flow / factor
        } else {
            free_flow
        };
        Ok(weight)
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for TrafficWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficWeighting")
            .field("inner", &self.inner)
            .field("heavy_vehicle", &self.heavy_vehicle)
            .field("events", &self.store.table().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{TrafficEvent, TrafficEventTable};
    use crate::weighting::test_support::edge;
    use crate::weighting::FastestWeighting;

    const CLOSED: u16 = 401;
    const QUEUE_10MIN: u16 = 108;
    const LIMIT_50: u16 = 970;
    const SLOW_HALF: u16 = 115;
    const SLOW_QUARTER: u16 = 116;
    const HGV_CLOSED: u16 = 802;

    fn store() -> Option<Arc<TrafficStore>> {
        let mut table = TrafficEventTable::new();
        table
            .insert(CLOSED, TrafficEvent::new(TrafficEffect::Blocked))
            .insert(QUEUE_10MIN, TrafficEvent::new(TrafficEffect::Delay(600.0)))
            .insert(LIMIT_50, TrafficEvent::new(TrafficEffect::SpeedCap(50.0)))
            .insert(SLOW_HALF, TrafficEvent::new(TrafficEffect::SpeedFactor(0.5)))
            .insert(SLOW_QUARTER, TrafficEvent::new(TrafficEffect::SpeedFactor(0.25)))
            .insert(HGV_CLOSED, TrafficEvent::heavy_only(TrafficEffect::Blocked));

        Some(Arc::new(TrafficStore::new(
            vec![
                vec![],
                vec![CLOSED],
                vec![SLOW_HALF, QUEUE_10MIN, LIMIT_50],
                vec![SLOW_HALF, LIMIT_50],
                vec![SLOW_HALF, SLOW_QUARTER],
                vec![HGV_CLOSED],
                vec![999],
            ],
            table,
        )))
    }

    // 1 km at 100 km/h = 36 s free flow
    fn cost(w: &TrafficWeighting<FastestWeighting>, e: EdgeId) -> Result<f64> {
        w.calc_weight(&edge(e, 1000.0, 100.0), false, None)
    }

    #[test]
    fn effects_apply_in_priority_order() {
        let w = TrafficWeighting::new(FastestWeighting::new(), store(), false).unwrap();
        assert!((cost(&w, 0).unwrap() - 36.0).abs() < 1e-9);
        assert_eq!(cost(&w, 1).unwrap(), INFEASIBLE);
        assert!((cost(&w, 2).unwrap() - 636.0).abs() < 1e-9);
        assert!((cost(&w, 3).unwrap() - 72.0).abs() < 1e-9);
        assert!((cost(&w, 4).unwrap() - 144.0).abs() < 1e-9);
    }

    #[test]
    fn heavy_vehicle_events_only_hit_heavy_vehicles() {
        let car = TrafficWeighting::new(FastestWeighting::new(), store(), false).unwrap();
        let hgv = TrafficWeighting::new(FastestWeighting::new(), store(), true).unwrap();
        assert!((cost(&car, 5).unwrap() - 36.0).abs() < 1e-9);
        assert_eq!(cost(&hgv, 5).unwrap(), INFEASIBLE);
    }

    #[test]
    fn unknown_code_aborts_the_query() {
        let w = TrafficWeighting::new(FastestWeighting::new(), store(), false).unwrap();
        assert!(matches!(cost(&w, 6), Err(Error::UnhandledEdgeData { edge: 6, .. })));
    }

    #[test]
    fn store_is_required() {
        assert!(TrafficWeighting::new(FastestWeighting::new(), None, false).is_err());
    }
}
