//! Model parameters and their prior distributions.
//!
//! The prior table here is the single source for both the emitted model
//! section and the log density maximized by the posterior-mode estimator,
//! so the two cannot drift apart.
use statrs::distribution::{Beta, Continuous, Gamma, InverseGamma, Normal, Uniform};

use crate::errors::{MMMError, MMMResult};

/// Scale of the inverse-gamma prior on the noise variance
/// (`0.05 · 0.01`).
pub const NOISE_VAR_SCALE: f64 = 0.0005;

/// Shape of the inverse-gamma prior on the noise variance.
pub const NOISE_VAR_SHAPE: f64 = 0.05;

/// A free parameter declared by the generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelParameter {
    NoiseVar,
    Tau,
    BetaMedias,
    RetainRate,
    Delay,
    GammaCtrl,
    Ec,
    Slope,
    HalfSaturation,
}

impl ModelParameter {
    /// Name used in the program text and in sampler output.
    pub fn name(self) -> &'static str {
        match self {
            ModelParameter::NoiseVar => "noise_var",
            ModelParameter::Tau => "tau",
            ModelParameter::BetaMedias => "beta_medias",
            ModelParameter::RetainRate => "retain_rate",
            ModelParameter::Delay => "delay",
            ModelParameter::GammaCtrl => "gamma_ctrl",
            ModelParameter::Ec => "ec",
            ModelParameter::Slope => "slope",
            ModelParameter::HalfSaturation => "half_saturation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "noise_var" => ModelParameter::NoiseVar,
            "tau" => ModelParameter::Tau,
            "beta_medias" => ModelParameter::BetaMedias,
            "retain_rate" => ModelParameter::RetainRate,
            "delay" => ModelParameter::Delay,
            "gamma_ctrl" => ModelParameter::GammaCtrl,
            "ec" => ModelParameter::Ec,
            "slope" => ModelParameter::Slope,
            "half_saturation" => ModelParameter::HalfSaturation,
            _ => return None,
        })
    }

    /// Parameters the inference machine consumes; `noise_var` only matters
    /// inside the likelihood.
    pub fn is_predictive(self) -> bool {
        self != ModelParameter::NoiseVar
    }

    /// The fixed prior of this parameter.
    pub fn prior(self) -> Prior {
        match self {
            ModelParameter::RetainRate => Prior::Beta { alpha: 3.0, beta: 3.0 },
            ModelParameter::Delay => Prior::LagUniform,
            ModelParameter::Slope => Prior::Gamma { shape: 3.0, rate: 1.0 },
            ModelParameter::Ec => Prior::Beta { alpha: 2.0, beta: 2.0 },
            ModelParameter::HalfSaturation => Prior::Gamma { shape: 3.0, rate: 1.0 },
            ModelParameter::Tau => Prior::Normal { mean: 0.0, sd: 5.0 },
            ModelParameter::BetaMedias | ModelParameter::GammaCtrl => {
                Prior::Normal { mean: 0.0, sd: 1.0 }
            }
            ModelParameter::NoiseVar => {
                Prior::InvGamma { shape: NOISE_VAR_SHAPE, scale: NOISE_VAR_SCALE }
            }
        }
    }
}

/// Prior distribution family with fixed hyperparameters.
///
/// `LagUniform` is `uniform(0, max_lag - 1)`; its upper bound depends on
/// the data and is supplied at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prior {
    Beta { alpha: f64, beta: f64 },
    Gamma { shape: f64, rate: f64 },
    Normal { mean: f64, sd: f64 },
    InvGamma { shape: f64, scale: f64 },
    LagUniform,
}

impl Prior {
    /// Sampling-statement right-hand side, e.g. `beta(3, 3)`.
    pub fn to_stan(&self) -> String {
        match self {
            Prior::Beta { alpha, beta } => format!("beta({alpha}, {beta})"),
            Prior::Gamma { shape, rate } => format!("gamma({shape}, {rate})"),
            Prior::Normal { mean, sd } => format!("normal({mean}, {sd})"),
            Prior::InvGamma { shape, scale } => format!("inv_gamma({shape}, {scale})"),
            Prior::LagUniform => "uniform(0, max_lag - 1)".to_string(),
        }
    }

    /// Log density at `x`; `-inf` outside the support.
    ///
    /// Errors
    /// ------
    /// - `MMMError::InvalidPrior` if the hyperparameters (or, for
    ///   `LagUniform`, `max_lag < 2`) do not define a distribution.
    pub fn ln_pdf(&self, x: f64, max_lag: usize) -> MMMResult<f64> {
        let value = match *self {
            Prior::Beta { alpha, beta } => Beta::new(alpha, beta).map_err(invalid("beta"))?.ln_pdf(x),
            Prior::Gamma { shape, rate } => {
                Gamma::new(shape, rate).map_err(invalid("gamma"))?.ln_pdf(x)
            }
            Prior::Normal { mean, sd } => Normal::new(mean, sd).map_err(invalid("normal"))?.ln_pdf(x),
            Prior::InvGamma { shape, scale } => {
                InverseGamma::new(shape, scale).map_err(invalid("inv_gamma"))?.ln_pdf(x)
            }
            Prior::LagUniform => {
                let upper = max_lag as f64 - 1.0;
                Uniform::new(0.0, upper).map_err(invalid("uniform"))?.ln_pdf(x)
            }
        };
        Ok(value)
    }
}

fn invalid<E: std::fmt::Display>(name: &'static str) -> impl FnOnce(E) -> MMMError {
    move |e| MMMError::InvalidPrior { name, reason: e.to_string() }
}
