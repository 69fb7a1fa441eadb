//! errors — failures of the posterior-mode optimizer.
//!
//! [`OptError`] covers bad optimizer settings, bad objective output, and
//! failures reported by argmin itself. Objective callbacks return
//! `OptResult`, argmin carries their errors as `argmin::core::Error`, and
//! `From<Error>` recovers the original variant on the way out.
use argmin::core::{ArgminError, Error};

use crate::errors::MMMError;

/// Result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Settings ----
    InvalidTolGrad { tol: f64, reason: &'static str },
    InvalidTolCost { tol: f64, reason: &'static str },
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    NoTolerancesProvided,
    InvalidLineSearch { name: String, reason: &'static str },
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Objective ----
    /// Sentinel from `LogDensity::grad`: use finite differences.
    GradientNotImplemented,
    GradientDimMismatch { expected: usize, found: usize },
    InvalidGradient { index: usize, value: f64, reason: &'static str },
    NonFiniteCost { value: f64 },
    ThetaLengthMismatch { expected: usize, actual: usize },
    InvalidThetaInput { index: usize, value: f64 },
    /// The model rejected its data or a decoded parameter set.
    InvalidModelInput { text: String },

    // ---- Curvature ----
    HessianDimMismatch { expected: usize, found: (usize, usize) },
    InvalidHessian { row: usize, col: usize, value: f64 },

    // ---- Solver ----
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },
    MissingThetaHat,
    /// An error raised by argmin; `kind` names the `ArgminError` variant,
    /// or `"backend"` for anything else.
    Solver { kind: &'static str, text: String },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Settings ----
            OptError::InvalidTolGrad { tol, reason } => write!(f, "tol_grad = {tol} rejected: {reason}"),
            OptError::InvalidTolCost { tol, reason } => write!(f, "tol_cost = {tol} rejected: {reason}"),
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "max_iter = {max_iter} rejected: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "at least one of tol_grad, tol_cost or max_iter must be set")
            }
            OptError::InvalidLineSearch { name, reason } => write!(f, "line search '{name}' rejected: {reason}"),
            OptError::InvalidLBFGSMem { mem, reason } => write!(f, "lbfgs_mem = {mem} rejected: {reason}"),

            // ---- Objective ----
            OptError::GradientNotImplemented => write!(f, "no analytic gradient for this log density"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "gradient has {found} entries, parameter vector has {expected}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "gradient entry {index} is {value}: {reason}")
            }
            OptError::NonFiniteCost { value } => write!(f, "log density evaluated to {value}"),
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "parameter vector has {actual} entries, layout expects {expected}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "parameter vector entry {index} is {value}; entries must be finite")
            }
            OptError::InvalidModelInput { text } => write!(f, "model rejected its input: {text}"),

            // ---- Curvature ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(f, "Hessian is {}x{}, expected {expected}x{expected}", found.0, found.1)
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Hessian entry ({row}, {col}) is {value}; entries must be finite")
            }

            // ---- Solver ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "optimizer returned {value} at index {index}: {reason}")
            }
            OptError::MissingThetaHat => write!(f, "optimizer finished without a best parameter vector"),
            OptError::Solver { kind, text } => write!(f, "argmin ({kind}): {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(ours) => return ours,
            Err(err) => err,
        };
        match err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                let (kind, text) = match argmin_err {
                    ArgminError::InvalidParameter { text } => ("invalid parameter", text),
                    ArgminError::NotImplemented { text } => ("not implemented", text),
                    ArgminError::NotInitialized { text } => ("not initialized", text),
                    ArgminError::ConditionViolated { text } => ("condition violated", text),
                    ArgminError::CheckpointNotFound { text } => ("checkpoint not found", text),
                    ArgminError::PotentialBug { text } => ("potential bug", text),
                    ArgminError::ImpossibleError { text } => ("impossible error", text),
                    other => ("unknown", other.to_string()),
                };
                OptError::Solver { kind, text }
            }
            Err(other) => OptError::Solver { kind: "backend", text: other.to_string() },
        }
    }
}

impl From<MMMError> for OptError {
    fn from(err: MMMError) -> Self {
        OptError::InvalidModelInput { text: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Errors raised in callbacks survive the trip through argmin's error
    // type; argmin's own errors keep their kind.
    //
    // Given
    // -----
    // - `OptError::NonFiniteCost` wrapped into `argmin::core::Error`.
    // - `ArgminError::ConditionViolated` wrapped likewise.
    // - A plain message error.
    //
    // Expect
    // ------
    // - The original `NonFiniteCost`, then `Solver` errors of kind
    //   "condition violated" and "backend".
    fn argmin_errors_are_unwrapped() {
        // Arrange
        let ours = Error::from(OptError::NonFiniteCost { value: f64::INFINITY });
        let theirs = Error::from(ArgminError::ConditionViolated { text: "not a descent direction".into() });
        let other = Error::msg("boom");

        // Act / Assert
        assert_eq!(OptError::from(ours), OptError::NonFiniteCost { value: f64::INFINITY });
        assert_eq!(
            OptError::from(theirs),
            OptError::Solver { kind: "condition violated", text: "not a descent direction".into() }
        );
        assert_eq!(OptError::from(other), OptError::Solver { kind: "backend", text: "boom".into() });
    }

    #[test]
    // Purpose
    // -------
    // Model errors keep their message when crossing into the optimizer.
    //
    // Given
    // -----
    // - `MMMError::InvalidSlope` at channel 0.
    //
    // Expect
    // ------
    // - `InvalidModelInput` whose text names the slope.
    fn model_errors_become_invalid_model_input() {
        // Act
        let err = OptError::from(MMMError::InvalidSlope { index: 0, value: -1.0 });

        // Assert
        match err {
            OptError::InvalidModelInput { text } => assert!(text.contains("slope")),
            other => panic!("expected InvalidModelInput, got {other:?}"),
        }
    }
}
