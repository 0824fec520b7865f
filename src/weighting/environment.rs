//! Green and quiet preferences
//!
//! Both are soft: without a store they leave the inner cost untouched.

use std::sync::Arc;

use super::Weighting;
use crate::attributes::{EdgeStore, MAX_GREEN_LEVEL, MAX_NOISE_LEVEL};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, EdgeState};

fn check_strength(name: &str, strength: f64) -> Result<()> {
    if !(strength >= 0.0) || !strength.is_finite() {
        return Err(Error::config(format!(
            "{name} strength must be a non-negative number, got {strength}"
        )));
    }
    Ok(())
}

/// Makes less green edges more expensive: `1 + strength * (1 - level/63)`
#[derive(Clone)]
pub struct GreenWeighting<W> {
    inner: W,
    store: Option<Arc<dyn EdgeStore<u8>>>,
    factors: [f64; MAX_GREEN_LEVEL as usize + 1],
}

impl<W: Weighting> GreenWeighting<W> {
    pub fn new(inner: W, store: Option<Arc<dyn EdgeStore<u8>>>, strength: f64) -> Result<Self> {
        check_strength("green", strength)?;
        let mut factors = [1.0; MAX_GREEN_LEVEL as usize + 1];
        for (level, factor) in factors.iter_mut().enumerate() {
            *factor = 1.0 + strength * (1.0 - level as f64 / MAX_GREEN_LEVEL as f64);
        }
        Ok(Self {
            inner,
            store,
            factors,
        })
    }
}

impl<W: Weighting> Weighting for GreenWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let weight = self.inner.calc_weight(edge, reverse, prev_edge)?;
        let Some(store) = &self.store else {
            return Ok(weight);
        };
        match store.value(edge.edge) {
            None => Ok(weight),
            Some(level) => match self.factors.get(level as usize) {
                Some(factor) => Ok(weight * factor),
                None => Err(Error::edge_data(
                    edge.edge,
                    format!("green level {level} out of range"),
                )),
            },
        }
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for GreenWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreenWeighting")
            .field("inner", &self.inner)
            .field("store", &self.store.is_some())
            .field("max_factor", &self.factors[0])
            .finish()
    }
}

/// Penalises noisy edges: `(1 + level)^strength`
#[derive(Clone)]
pub struct QuietWeighting<W> {
    inner: W,
    store: Option<Arc<dyn EdgeStore<u8>>>,
    factors: [f64; MAX_NOISE_LEVEL as usize + 1],
}

impl<W: Weighting> QuietWeighting<W> {
    pub fn new(inner: W, store: Option<Arc<dyn EdgeStore<u8>>>, strength: f64) -> Result<Self> {
        check_strength("quiet", strength)?;
        let mut factors = [1.0; MAX_NOISE_LEVEL as usize + 1];
        for (level, factor) in factors.iter_mut().enumerate() {
            *factor = (1.0 + level as f64).powf(strength);
        }
        Ok(Self {
            inner,
            store,
            factors,
        })
    }
}

impl<W: Weighting> Weighting for QuietWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        let weight = self.inner.calc_weight(edge, reverse, prev_edge)?;
        let Some(store) = &self.store else {
            return Ok(weight);
        };
        match store.value(edge.edge) {
            None => Ok(weight),
            Some(level) => match self.factors.get(level as usize) {
                Some(factor) => Ok(weight * factor),
                None => Err(Error::edge_data(
                    edge.edge,
                    format!("noise level {level} out of range"),
                )),
            },
        }
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for QuietWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuietWeighting")
            .field("inner", &self.inner)
            .field("store", &self.store.is_some())
            .field("factors", &self.factors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::VecStore;
    use crate::weighting::test_support::edge;
    use crate::weighting::ShortestWeighting;

    fn levels(values: Vec<u8>) -> Option<Arc<dyn EdgeStore<u8>>> {
        Some(Arc::new(VecStore::from(values)))
    }

    #[test]
    fn greener_is_cheaper() {
        let w = GreenWeighting::new(ShortestWeighting, levels(vec![0, 63, 32]), 1.0).unwrap();
        let cost = |e| w.calc_weight(&edge(e, 10.0, 5.0), false, None).unwrap();
        assert!((cost(0) - 20.0).abs() < 1e-9);
        assert!((cost(1) - 10.0).abs() < 1e-9);
        assert!(cost(2) < cost(0) && cost(2) > cost(1));
    }

    #[test]
    fn quiet_penalises_loud_buckets_disproportionately() {
        let w = QuietWeighting::new(ShortestWeighting, levels(vec![0, 1, 2, 3]), 2.0).unwrap();
        let costs: Vec<f64> = (0..4)
            .map(|e| w.calc_weight(&edge(e, 1.0, 5.0), false, None).unwrap())
            .collect();
        for (cost, expected) in costs.iter().zip([1.0, 4.0, 9.0, 16.0]) {
            assert!((cost - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_store_passes_through() {
        let green = GreenWeighting::new(ShortestWeighting, None, 1.0).unwrap();
        let quiet = QuietWeighting::new(ShortestWeighting, None, 3.0).unwrap();
        let e = edge(0, 7.0, 5.0);
        assert_eq!(green.calc_weight(&e, false, None).unwrap(), 7.0);
        assert_eq!(quiet.calc_weight(&e, false, None).unwrap(), 7.0);
    }

    #[test]
    fn out_of_range_levels_are_edge_data_errors() {
        let green = GreenWeighting::new(ShortestWeighting, levels(vec![64]), 1.0).unwrap();
        let quiet = QuietWeighting::new(ShortestWeighting, levels(vec![4]), 1.0).unwrap();
        let e = edge(0, 1.0, 5.0);
        assert!(matches!(
            green.calc_weight(&e, false, None),
            Err(Error::UnhandledEdgeData { edge: 0, .. })
        ));
        assert!(quiet.calc_weight(&e, false, None).is_err());
    }
}
