//! TOML profiles for weightings and search limits
//!
//! A profile names a base weighting, the hard decorators stacked on top of
//! it, and optional soft preferences. [`WeightingConfig::build`] checks every
//! parameter against the attribute stores before any query runs.
//!
//! ```toml
//! [weighting]
//! base = "fastest"
//! max_speed_kmh = 90.0
//! travel_mode = "cycling"
//! avoid_features = ["ferries", "steps"]
//! green = 0.5
//!
//! [weighting.borders]
//! restriction = "forbid_controlled"
//! avoid_countries = [56]
//!
//! [search]
//! max_visited_nodes = 500000
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeStores, AvoidFeatures, TravelMode, MAX_STEEPNESS_BUCKET};
use crate::dijkstra::TraversalMode;
use crate::error::{Error, Result};
use crate::weighting::{
    AvoidFeaturesWeighting, AvoidHillsWeighting, BorderRestriction, BordersWeighting,
    FastestWeighting, GreenWeighting, PriorityWeighting, ProductWeighting, QuietWeighting,
    ShortestWeighting, SteepnessDifficultyWeighting, SumWeighting, TrafficWeighting, Weighting,
};

/// Cost the decorators start from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseWeighting {
    /// Metres
    Shortest,
    /// Seconds
    #[default]
    Fastest,
}

/// How soft preferences are merged when more than one is set
///
/// `Sum` adds one copy of the hard stack per preference. `Product` stacks the
/// preference factors on a single copy, so the hard cost is counted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    #[default]
    Sum,
    Product,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BordersConfig {
    #[serde(default)]
    pub restriction: BorderRestriction,
    #[serde(default)]
    pub avoid_countries: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SteepnessConfig {
    /// 0 (easy) to 3 (hard)
    pub difficulty: u8,
    #[serde(default = "default_max_bucket")]
    pub max_bucket: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvoidHillsConfig {
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default = "default_max_bucket")]
    pub max_bucket: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficConfig {
    #[serde(default)]
    pub heavy_vehicle: bool,
}

fn default_max_bucket() -> u8 {
    MAX_STEEPNESS_BUCKET
}

fn default_strength() -> f64 {
    1.0
}

/// A weighting profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightingConfig {
    #[serde(default)]
    pub base: BaseWeighting,
    /// Only used by the fastest base
    #[serde(default)]
    pub max_speed_kmh: Option<f64>,
    #[serde(default)]
    pub travel_mode: TravelMode,
    /// Feature names, e.g. `["ferries", "tollways"]`
    #[serde(default)]
    pub avoid_features: Vec<String>,
    #[serde(default)]
    pub borders: Option<BordersConfig>,
    #[serde(default)]
    pub steepness: Option<SteepnessConfig>,
    #[serde(default)]
    pub avoid_hills: Option<AvoidHillsConfig>,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub traffic: Option<TrafficConfig>,
    /// Green preference strength
    #[serde(default)]
    pub green: Option<f64>,
    /// Quiet preference strength
    #[serde(default)]
    pub quiet: Option<f64>,
    #[serde(default)]
    pub combine: Combine,
}

impl WeightingConfig {
    pub fn avoid_set(&self) -> Result<AvoidFeatures> {
        self.avoid_features
            .iter()
            .try_fold(AvoidFeatures::NONE, |acc, name| Ok(acc | name.parse::<AvoidFeatures>()?))
    }

    /// Compose the configured stack over `stores`
    ///
    /// Hard decorators wrap the base in a fixed order: avoid-features,
    /// borders, steepness difficulty, avoid-hills, priority, traffic. Soft
    /// preferences go on top, merged as [`Combine`] describes.
    pub fn build(&self, stores: &AttributeStores) -> Result<Box<dyn Weighting>> {
        let mut w: Box<dyn Weighting> = match self.base {
            BaseWeighting::Shortest => Box::new(ShortestWeighting),
            BaseWeighting::Fastest => match self.max_speed_kmh {
                Some(kmh) => Box::new(FastestWeighting::with_max_speed(kmh)?),
                None => Box::new(FastestWeighting::new()),
            },
        };

        let avoid = self.avoid_set()?;
        if !avoid.is_empty() {
            w = Box::new(AvoidFeaturesWeighting::new(
                w,
                self.travel_mode,
                avoid,
                stores.way_category.clone(),
                stores.steepness.clone(),
            )?);
        }
        if let Some(b) = &self.borders {
            w = Box::new(BordersWeighting::new(
                w,
                stores.borders.clone(),
                b.restriction,
                b.avoid_countries.iter().copied(),
            )?);
        }
        if let Some(s) = &self.steepness {
            w = Box::new(SteepnessDifficultyWeighting::new(
                w,
                stores.steepness.clone(),
                s.difficulty,
                s.max_bucket,
            )?);
        }
        if let Some(h) = &self.avoid_hills {
            w = Box::new(AvoidHillsWeighting::new(
                w,
                stores.steepness.clone(),
                h.strength,
                h.max_bucket,
            )?);
        }
        if self.priority {
            w = Box::new(PriorityWeighting::new(w, stores.priority.clone())?);
        }
        if let Some(t) = &self.traffic {
            w = Box::new(TrafficWeighting::new(w, stores.traffic.clone(), t.heavy_vehicle)?);
        }

        let weighting: Box<dyn Weighting> = match self.combine {
            Combine::Product => {
                if let Some(strength) = self.green {
                    w = Box::new(GreenWeighting::new(w, stores.green.clone(), strength)?);
                }
                if let Some(strength) = self.quiet {
                    w = Box::new(QuietWeighting::new(w, stores.noise.clone(), strength)?);
                }
                w
            }
            Combine::Sum => {
                let hard: Arc<dyn Weighting> = Arc::from(w);
                let mut soft: Vec<Box<dyn Weighting>> = Vec::new();
                if let Some(strength) = self.green {
                    let green = GreenWeighting::new(hard.clone(), stores.green.clone(), strength)?;
                    soft.push(Box::new(green));
                }
                if let Some(strength) = self.quiet {
                    let quiet = QuietWeighting::new(hard.clone(), stores.noise.clone(), strength)?;
                    soft.push(Box::new(quiet));
                }
                match soft.len() {
                    0 => Box::new(hard),
                    1 => soft.remove(0),
                    _ => Box::new(SumWeighting::new(soft)?),
                }
            }
        };
        tracing::debug!(?weighting, "built weighting");
        Ok(weighting)
    }
}

/// Query limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_max_visited_nodes")]
    pub max_visited_nodes: usize,
    #[serde(default)]
    pub traversal: TraversalMode,
}

fn default_max_visited_nodes() -> usize {
    usize::MAX
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_visited_nodes: default_max_visited_nodes(),
            traversal: TraversalMode::default(),
        }
    }
}

/// A full profile file: `[weighting]` and `[search]` tables, both optional
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(default)]
    pub weighting: WeightingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl ProfileConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let profile = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded profile");
        Ok(profile)
    }

    pub fn build_weighting(&self, stores: &AttributeStores) -> Result<Box<dyn Weighting>> {
        self.weighting.build(stores)
    }
}

impl std::str::FromStr for ProfileConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s)
    }
}
