//! Elementwise value transforms applied before scaling.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::MMMError;

/// Invertible elementwise transform.
///
/// Variants:
/// - `Log`: `ln(1 + x)`, inverse `exp(x) - 1`; defined for `x ≥ 0` here.
/// - `Sqrt`: `√x`, inverse `x²`.
/// - `Identity`: no-op; named `"none"` in configuration.
///
/// Parsing:
/// Implements `FromStr` with case-insensitive names `"log"`, `"sqrt"`,
/// `"none"`. Unknown names return `MMMError::UnknownTransform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTransform {
    Log,
    Sqrt,
    #[default]
    #[serde(rename = "none")]
    Identity,
}

impl ValueTransform {
    /// Resolve an optional configuration name; `None` means identity.
    pub fn from_name(name: Option<&str>) -> Result<Self, MMMError> {
        name.map_or(Ok(ValueTransform::Identity), |n| n.parse())
    }

    #[inline]
    pub fn forward(self, x: f64) -> f64 {
        match self {
            ValueTransform::Log => x.ln_1p(),
            ValueTransform::Sqrt => x.sqrt(),
            ValueTransform::Identity => x,
        }
    }

    #[inline]
    pub fn inverse(self, x: f64) -> f64 {
        match self {
            ValueTransform::Log => x.exp_m1(),
            ValueTransform::Sqrt => x * x,
            ValueTransform::Identity => x,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueTransform::Log => "log",
            ValueTransform::Sqrt => "sqrt",
            ValueTransform::Identity => "none",
        }
    }
}

impl FromStr for ValueTransform {
    type Err = MMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(ValueTransform::Log),
            "sqrt" => Ok(ValueTransform::Sqrt),
            "none" => Ok(ValueTransform::Identity),
            _ => Err(MMMError::UnknownTransform { name: s.to_string() }),
        }
    }
}
