//! Way category bits and the travel modes that may avoid them

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Bitmask over way categories a route can avoid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AvoidFeatures(u32);

impl AvoidFeatures {
    pub const NONE: Self = Self(0);
    pub const HIGHWAYS: Self = Self(1);
    pub const TOLLWAYS: Self = Self(1 << 1);
    pub const FERRIES: Self = Self(1 << 2);
    pub const UNPAVED: Self = Self(1 << 3);
    pub const BORDERS: Self = Self(1 << 4);
    pub const FORDS: Self = Self(1 << 5);
    pub const TUNNELS: Self = Self(1 << 6);
    pub const BRIDGES: Self = Self(1 << 7);
    pub const STEPS: Self = Self(1 << 8);
    pub const TRACKS: Self = Self(1 << 9);
    pub const HILLS: Self = Self(1 << 10);

    const NAMED: [(&'static str, Self); 11] = [
        ("highways", Self::HIGHWAYS),
        ("tollways", Self::TOLLWAYS),
        ("ferries", Self::FERRIES),
        ("unpaved", Self::UNPAVED),
        ("borders", Self::BORDERS),
        ("fords", Self::FORDS),
        ("tunnels", Self::TUNNELS),
        ("bridges", Self::BRIDGES),
        ("steps", Self::STEPS),
        ("tracks", Self::TRACKS),
        ("hills", Self::HILLS),
    ];

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Names of the set bits, in declaration order
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(_, bit)| self.contains(*bit))
            .map(|(name, _)| name)
    }
}

impl BitOr for AvoidFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AvoidFeatures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromStr for AvoidFeatures {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::NAMED
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, bit)| *bit)
            .ok_or_else(|| Error::config(format!("unknown avoid feature '{s}'")))
    }
}

impl fmt::Display for AvoidFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Profile family; decides which way categories may be avoided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Cycling,
    Walking,
}

impl TravelMode {
    pub fn legal_features(self) -> AvoidFeatures {
        use AvoidFeatures as F;
        match self {
            TravelMode::Driving => {
                F::HIGHWAYS
                    | F::TOLLWAYS
                    | F::FERRIES
                    | F::UNPAVED
                    | F::BORDERS
                    | F::FORDS
                    | F::TUNNELS
                    | F::BRIDGES
                    | F::TRACKS
            }
            TravelMode::Cycling => {
                F::FERRIES | F::UNPAVED | F::STEPS | F::FORDS | F::BORDERS | F::HILLS
            }
            TravelMode::Walking => F::FERRIES | F::STEPS | F::FORDS | F::BORDERS | F::HILLS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names_case_insensitively() {
        assert_eq!("Ferries".parse::<AvoidFeatures>().unwrap(), AvoidFeatures::FERRIES);
        assert!("motorways".parse::<AvoidFeatures>().is_err());
    }

    #[test]
    fn display_lists_set_bits() {
        let f = AvoidFeatures::TOLLWAYS | AvoidFeatures::STEPS;
        assert_eq!(f.to_string(), "tollways|steps");
        assert_eq!(AvoidFeatures::NONE.to_string(), "none");
    }

    #[test]
    fn walking_cannot_avoid_highways() {
        let legal = TravelMode::Walking.legal_features();
        assert!(!legal.contains(AvoidFeatures::HIGHWAYS));
        assert!(legal.contains(AvoidFeatures::STEPS | AvoidFeatures::HILLS));
        assert!(TravelMode::Driving.legal_features().contains(AvoidFeatures::TRACKS));
    }
}
