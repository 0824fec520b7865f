//! Per-edge attribute stores consulted by weighting decorators
//!
//! Stores are produced by the graph build and are read-only afterwards. A
//! store answers `None` for edges it has no record of; decorators treat that
//! as "no attribute" rather than as an error. Shortcut ids are never looked
//! up because shortcuts are costed by their stored weight.

mod features;
mod traffic;

pub use features::{AvoidFeatures, TravelMode};
pub use traffic::{TrafficEffect, TrafficEvent, TrafficEventTable, TrafficStore};

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graph::EdgeId;

/// Highest steepness bucket a store may report
pub const MAX_STEEPNESS_BUCKET: u8 = 15;
/// Highest green index
pub const MAX_GREEN_LEVEL: u8 = 63;
/// Highest noise index
pub const MAX_NOISE_LEVEL: u8 = 3;

/// Read-only lookup of one attribute per edge
pub trait EdgeStore<T>: Send + Sync {
    fn value(&self, edge: EdgeId) -> Option<T>;
}

/// Dense store indexed by edge id
#[derive(Debug, Clone, Default)]
pub struct VecStore<T> {
    values: Vec<T>,
}

impl<T: Copy> VecStore<T> {
    pub fn new(len: usize, default: T) -> Self {
        Self {
            values: vec![default; len],
        }
    }

    /// Fails for an edge id past the end instead of growing the store
    pub fn set(&mut self, edge: EdgeId, value: T) -> Result<()> {
        let len = self.values.len();
        let slot = self.values.get_mut(edge as usize).ok_or_else(|| {
            Error::config(format!("edge {edge} outside attribute store of {len} edges"))
        })?;
        *slot = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> From<Vec<T>> for VecStore<T> {
    fn from(values: Vec<T>) -> Self {
        Self { values }
    }
}

impl<T: Copy + Send + Sync> EdgeStore<T> for VecStore<T> {
    #[inline]
    fn value(&self, edge: EdgeId) -> Option<T> {
        self.values.get(edge as usize).copied()
    }
}

/// Kind of administrative border an edge crosses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderType {
    /// Edge stays inside one country
    #[default]
    None,
    /// Border with customs or passport control
    Controlled,
    /// Border without control (e.g. inside the Schengen area)
    Open,
}

/// Border attributes of one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderCrossing {
    pub kind: BorderType,
    /// Numeric country code at the edge's tail, 0 when unknown
    pub start_country: u16,
    /// Numeric country code at the edge's head, 0 when unknown
    pub end_country: u16,
}

impl BorderCrossing {
    pub fn crossing(kind: BorderType, start_country: u16, end_country: u16) -> Self {
        Self {
            kind,
            start_country,
            end_country,
        }
    }

    pub fn is_crossing(&self) -> bool {
        self.kind != BorderType::None
    }
}

/// Every attribute store a weighting may need, all optional
#[derive(Clone, Default)]
pub struct AttributeStores {
    /// Steepness bucket `0..=15`
    pub steepness: Option<Arc<dyn EdgeStore<u8>>>,
    pub borders: Option<Arc<dyn EdgeStore<BorderCrossing>>>,
    /// Way category bitmask in [`AvoidFeatures`] bits
    pub way_category: Option<Arc<dyn EdgeStore<AvoidFeatures>>>,
    /// Green index `0..=63`, higher is greener
    pub green: Option<Arc<dyn EdgeStore<u8>>>,
    /// Noise index `0..=3`, higher is louder
    pub noise: Option<Arc<dyn EdgeStore<u8>>>,
    /// Tag-derived priority in `0..=1`
    pub priority: Option<Arc<dyn EdgeStore<f64>>>,
    pub traffic: Option<Arc<TrafficStore>>,
}

impl std::fmt::Debug for AttributeStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStores")
            .field("steepness", &self.steepness.is_some())
            .field("borders", &self.borders.is_some())
            .field("way_category", &self.way_category.is_some())
            .field("green", &self.green.is_some())
            .field("noise", &self.noise.is_some())
            .field("priority", &self.priority.is_some())
            .field("traffic", &self.traffic.is_some())
            .finish()
    }
}
