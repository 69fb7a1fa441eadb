//! Guarded scalar transforms between unconstrained reals and parameter
//! domains.
//!
//! Softplus and its inverse switch to the identity above `x > 20`, where
//! `ln(1 + e^x)` and `x` agree to `f64` precision. The logistic map is
//! evaluated on whichever side keeps `exp` from overflowing and its output
//! is clamped to `[LOGIT_EPS, 1 - LOGIT_EPS]`.

/// Clamp applied to logistic outputs and logit inputs.
pub const LOGIT_EPS: f64 = 1e-12;

/// Eigenvalues at or below this are treated as zero curvature.
pub const EIGEN_EPS: f64 = 1e-10;

/// Smallest value a strictly positive parameter is allowed to take.
pub const POSITIVE_FLOOR: f64 = 1e-12;

/// `ln(1 + exp(x))`, mapping ℝ → (0, ∞).
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Inverse of [`safe_softplus`] on `(0, ∞)`: `ln(exp(x) - 1)`.
///
/// Inputs are floored at [`POSITIVE_FLOOR`].
pub fn safe_softplus_inv(x: f64) -> f64 {
    let x = x.max(POSITIVE_FLOOR);
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Derivative of [`safe_softplus`], which is the logistic function.
pub fn softplus_deriv(x: f64) -> f64 {
    safe_logistic(x)
}

/// `1 / (1 + exp(-x))`, mapping ℝ → (0, 1).
pub fn safe_logistic(x: f64) -> f64 {
    let p = if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    };
    p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS)
}

/// Inverse of [`safe_logistic`]: `ln(p / (1 - p))` with `p` clamped into
/// the open unit interval.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    p.ln() - (-p).ln_1p()
}

/// Derivative of [`safe_logistic`]: `σ(x)(1 - σ(x))`.
pub fn logistic_deriv(x: f64) -> f64 {
    let p = safe_logistic(x);
    p * (1.0 - p)
}
