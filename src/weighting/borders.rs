//! Border crossing restrictions

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::{Weighting, INFEASIBLE};
use crate::attributes::{BorderCrossing, BorderType, EdgeStore};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, EdgeState};

/// Which crossings may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderRestriction {
    #[default]
    AllowAll,
    /// No crossing at all, controlled or open
    ForbidAll,
    /// Only open crossings
    ForbidControlled,
}

#[derive(Clone)]
pub struct BordersWeighting<W> {
    inner: W,
    store: Arc<dyn EdgeStore<BorderCrossing>>,
    restriction: BorderRestriction,
    avoid_countries: FxHashSet<u16>,
}

impl<W: Weighting> BordersWeighting<W> {
    pub fn new(
        inner: W,
        store: Option<Arc<dyn EdgeStore<BorderCrossing>>>,
        restriction: BorderRestriction,
        avoid_countries: impl IntoIterator<Item = u16>,
    ) -> Result<Self> {
        let store =
            store.ok_or_else(|| Error::config("borders weighting requires a borders store"))?;
        Ok(Self {
            inner,
            store,
            restriction,
            // 0 is "unknown country" in the store
            avoid_countries: avoid_countries.into_iter().filter(|&c| c != 0).collect(),
        })
    }

    /// 1.0 or [`INFEASIBLE`] for one crossing record
    pub fn factor(&self, crossing: &BorderCrossing) -> f64 {
        let forbidden = match (self.restriction, crossing.kind) {
            (_, BorderType::None) | (BorderRestriction::AllowAll, _) => false,
            (BorderRestriction::ForbidAll, _) => true,
            (BorderRestriction::ForbidControlled, kind) => kind == BorderType::Controlled,
        };
        if forbidden
            || self.avoid_countries.contains(&crossing.start_country)
            || self.avoid_countries.contains(&crossing.end_country)
        {
            INFEASIBLE
        } else {
            1.0
        }
    }
}

impl<W: Weighting> Weighting for BordersWeighting<W> {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        if let Some(crossing) = self.store.value(edge.edge) {
            if self.factor(&crossing) == INFEASIBLE {
                return Ok(INFEASIBLE);
            }
        }
        self.inner.calc_weight(edge, reverse, prev_edge)
    }
}

impl<W: std::fmt::Debug> std::fmt::Debug for BordersWeighting<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BordersWeighting")
            .field("inner", &self.inner)
            .field("restriction", &self.restriction)
            .field("avoid_countries", &self.avoid_countries.len())
            .finish()
    }
}
