//! Transform kinds selectable in a model specification.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::MMMError;

/// Carryover kernel family.
///
/// Parsing accepts `"geometric_decay"` (alias `"geo_decay"`) and
/// `"peaked_decay"` (alias `"adstock"`), case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryoverKind {
    #[serde(alias = "geo_decay")]
    GeometricDecay,
    #[serde(alias = "adstock")]
    PeakedDecay,
}

impl CarryoverKind {
    pub const ALL: [CarryoverKind; 2] = [CarryoverKind::GeometricDecay, CarryoverKind::PeakedDecay];

    /// Canonical name, also the name of the emitted kernel function.
    pub fn name(self) -> &'static str {
        match self {
            CarryoverKind::GeometricDecay => "geometric_decay",
            CarryoverKind::PeakedDecay => "peaked_decay",
        }
    }
}

impl FromStr for CarryoverKind {
    type Err = MMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geometric_decay" | "geo_decay" => Ok(CarryoverKind::GeometricDecay),
            "peaked_decay" | "adstock" => Ok(CarryoverKind::PeakedDecay),
            _ => Err(MMMError::UnknownCarryover { name: s.to_string() }),
        }
    }
}

/// Saturation kernel family.
///
/// Parsing accepts `"logistic"` (alias `"hill"`) and `"reach"`,
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationKind {
    #[serde(alias = "hill")]
    Logistic,
    Reach,
}

impl SaturationKind {
    pub const ALL: [SaturationKind; 2] = [SaturationKind::Logistic, SaturationKind::Reach];

    pub fn name(self) -> &'static str {
        match self {
            SaturationKind::Logistic => "logistic",
            SaturationKind::Reach => "reach",
        }
    }

    /// Name of the emitted kernel function.
    pub fn function_name(self) -> &'static str {
        match self {
            SaturationKind::Logistic => "logistic_saturation",
            SaturationKind::Reach => "reach_saturation",
        }
    }
}

impl FromStr for SaturationKind {
    type Err = MMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "hill" => Ok(SaturationKind::Logistic),
            "reach" => Ok(SaturationKind::Reach),
            _ => Err(MMMError::UnknownSaturation { name: s.to_string() }),
        }
    }
}
