//! PosteriorDensity — the log posterior the generated program declares.
use std::f64::consts::PI;

use crate::{
    errors::{MMMError, MMMResult},
    inference::{InferenceMachine, ParameterSet},
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, LogDensity, Theta},
    },
    sampling::SamplerInput,
};

use super::layout::ParameterLayout;

/// Unnormalized log posterior over the unconstrained coordinates of a
/// [`ParameterLayout`].
///
/// `ℓ(θ) = Σ_slots ln p(c(θ)_i) + Σ_t ln N(Y_t | μ_t, noise_var)` where `c` is
/// the layout's link map, the priors come from [`ModelParameter::prior`]
/// (the same table the program's model section prints), and `μ` is the
/// inference machine's mean on the sampler input's lagged tensor.
///
/// The change-of-variables Jacobian is not added, so the maximizer of `ℓ` is
/// the posterior mode in the constrained parameters.
///
/// [`ModelParameter::prior`]: crate::program::ModelParameter::prior
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorDensity {
    layout: ParameterLayout,
}

impl PosteriorDensity {
    pub fn new(layout: ParameterLayout) -> Self {
        PosteriorDensity { layout }
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Sum of prior log densities at constrained values in slot order.
    pub fn log_prior(&self, values: &ndarray::Array1<f64>) -> MMMResult<f64> {
        let max_lag = self.layout.max_lag();
        let mut total = 0.0;
        for ((parameter, _), &value) in self.layout.slots().zip(values.iter()) {
            total += parameter.prior().ln_pdf(value, max_lag)?;
        }
        Ok(total)
    }

    /// Gaussian log likelihood of the target given `params` and
    /// `noise_var`.
    ///
    /// Errors
    /// ------
    /// - `MMMError::InvalidSetting` for a non-positive `noise_var`.
    /// - `MMMError::ControlMismatch` when `params` and `input` disagree on
    ///   controls.
    /// - Errors from the inference machine.
    pub fn log_likelihood(
        &self, params: &ParameterSet, noise_var: f64, input: &SamplerInput,
    ) -> MMMResult<f64> {
        if noise_var.is_nan() || noise_var <= 0.0 {
            return Err(MMMError::InvalidSetting { field: "noise_var", reason: "must be positive" });
        }
        let ctrl = match (input.x_ctrl(), params.gamma_ctrl()) {
            (Some(x), Some(gamma)) => Some((x.view(), gamma)),
            (None, None) => None,
            _ => {
                return Err(MMMError::ControlMismatch {
                    reason: "the sampler input and the parameter set disagree on control variables",
                });
            }
        };
        let machine = InferenceMachine::new(params.clone(), input.max_lag())?;
        let mean = machine.predict_lagged(input.x_media().view(), ctrl)?;
        let sse: f64 = input.y().iter().zip(mean.iter()).map(|(y, mu)| (y - mu).powi(2)).sum();
        let n = input.n_obs() as f64;
        Ok(-0.5 * n * (2.0 * PI * noise_var).ln() - 0.5 * sse / noise_var)
    }

    /// `ℓ(θ)` on the media-mix scale.
    pub fn log_posterior(&self, theta: &Theta, input: &SamplerInput) -> MMMResult<f64> {
        let values = self.layout.constrain(theta)?;
        let (params, noise_var) = self.layout.assemble(&values)?;
        Ok(self.log_prior(&values)? + self.log_likelihood(&params, noise_var, input)?)
    }
}

impl LogDensity for PosteriorDensity {
    type Data = SamplerInput;

    fn value(&self, theta: &Theta, data: &SamplerInput) -> OptResult<Cost> {
        Ok(self.log_posterior(theta, data)?)
    }

    /// Rejects a `θ` of the wrong length or with non-finite entries and data
    /// whose shape differs from the layout.
    fn check(&self, theta: &Theta, data: &SamplerInput) -> OptResult<()> {
        if theta.len() != self.layout.dim() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.layout.dim(),
                actual: theta.len(),
            });
        }
        if let Some(index) = theta.iter().position(|v| !v.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value: theta[index] });
        }
        if data.num_media() != self.layout.channels()
            || data.num_ctrl() != self.layout.n_ctrl()
            || data.max_lag() != self.layout.max_lag()
        {
            return Err(OptError::InvalidModelInput {
                text: "sampler input shape differs from the parameter layout".to_string(),
            });
        }
        Ok(())
    }
}
