//! errors — crate-wide error surface for media-mix modelling.
//!
//! Purpose
//! -------
//! Provide a single error enum, [`MMMError`], and result alias, [`MMMResult`],
//! shared by the spend transforms, the normalizer, the model program
//! generator, the inference machine, and the sampling boundary. Each variant
//! carries a structured payload (offending index, value, or name) so callers
//! can report precise diagnostics without string parsing.
//!
//! Key behaviors
//! -------------
//! - Group variants by the failure category they belong to and expose that
//!   category through [`MMMError::kind`] ([`ErrorKind`]).
//! - Attach human-readable `Display` messages to every variant.
//! - Convert optimizer failures ([`OptError`]) and opaque runtime failures
//!   (`anyhow::Error`) into `MMMError` so `?` works across layers.
//! - Under the `python-bindings` feature, map every error into a Python
//!   `ValueError` at the PyO3 boundary.
//!
//! Invariants & assumptions
//! ------------------------
//! - Validation is eager: every public operation checks its inputs before
//!   touching state or allocating output, so an `Err` never leaves a value
//!   partially mutated.
//! - Indices are 0-based (column index = channel index).
//!
//! Conventions
//! -----------
//! - `reason` fields are static strings phrased as domain constraints
//!   (e.g. "retain_rate must lie in [0, 1]").
//! - The core never logs errors; they propagate to the immediate caller.
//!
//! Testing notes
//! -------------
//! - Unit tests verify the category mapping of representative variants and
//!   that payloads appear in `Display` output.
use crate::optimization::errors::OptError;

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for media-mix operations.
pub type MMMResult<T> = Result<T, MMMError>;

/// Failure category of an [`MMMError`].
///
/// Every concrete variant maps to exactly one category; callers that only
/// care about the class of failure can match on this instead of the full
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized enum name at construction time.
    InvalidConfiguration,
    /// Wrong-rank array or inconsistent dimensions.
    InvalidShape,
    /// Numeric parameter or input value outside its domain.
    InvalidParameter,
    /// `transform`/`reverse_transform` invoked before `fit`.
    NotFitted,
    /// Failure reported by an external collaborator (sampler, optimizer).
    Runtime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MMMError {
    // ---- Configuration ----
    /// Unknown value transform name.
    UnknownTransform { name: String },

    /// Unknown scaler name.
    UnknownScaler { name: String },

    /// Unknown carryover kind.
    UnknownCarryover { name: String },

    /// Unknown saturation kind.
    UnknownSaturation { name: String },

    /// Unknown point-estimator name.
    UnknownEstimator { name: String },

    /// A required entry is missing from a named parameter mapping.
    MissingParameter { name: &'static str },

    /// A configuration field holds an unusable value.
    InvalidSetting { field: &'static str, reason: &'static str },

    /// A saved model document could not be written or read back.
    Persistence { text: String },

    // ---- Shape ----
    /// Array has the wrong number of dimensions.
    InvalidRank { name: &'static str, expected: usize, found: usize },

    /// `max_lag` exceeds the number of observations.
    MaxLagOutOfRange { max_lag: usize, rows: usize },

    /// A per-channel vector does not have one entry per channel.
    ChannelMismatch { name: &'static str, expected: usize, found: usize },

    /// Two aligned inputs disagree on the number of rows.
    RowMismatch { name: &'static str, expected: usize, found: usize },

    /// A fitted object was applied to data with a different column count.
    ColumnMismatch { expected: usize, found: usize },

    /// Control variables supplied to a model fitted without them, or
    /// omitted for a model fitted with them.
    ControlMismatch { reason: &'static str },

    // ---- Parameter domain ----
    /// retain_rate must lie in [0, 1].
    InvalidRetainRate { index: usize, value: f64 },

    /// delay must lie in [0, max_lag].
    InvalidDelay { index: usize, value: f64, max_lag: usize },

    /// ec must lie in [0, 1].
    InvalidEc { index: usize, value: f64 },

    /// slope must be non-negative.
    InvalidSlope { index: usize, value: f64 },

    /// half_saturation must be non-negative.
    InvalidHalfSaturation { index: usize, value: f64 },

    /// beta_medias must be non-negative.
    InvalidBeta { index: usize, value: f64 },

    /// The log transform was applied to a negative value.
    NegativeLogInput { row: usize, col: usize, value: f64 },

    /// A value that must be finite is NaN or infinite.
    NonFiniteValue { name: &'static str, index: usize, value: f64 },

    /// A prior distribution could not be built from its hyperparameters.
    InvalidPrior { name: &'static str, reason: String },

    // ---- State ----
    /// Normalizer used before `fit`.
    NotFitted,

    // ---- Runtime ----
    /// Failure surfaced by the external sampling runtime.
    Runtime { text: String },

    /// Failure surfaced by the posterior-mode optimizer.
    Optimization { source: OptError },
}

impl MMMError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MMMError::UnknownTransform { .. }
            | MMMError::UnknownScaler { .. }
            | MMMError::UnknownCarryover { .. }
            | MMMError::UnknownSaturation { .. }
            | MMMError::UnknownEstimator { .. }
            | MMMError::MissingParameter { .. }
            | MMMError::InvalidSetting { .. }
            | MMMError::Persistence { .. } => ErrorKind::InvalidConfiguration,

            MMMError::InvalidRank { .. }
            | MMMError::MaxLagOutOfRange { .. }
            | MMMError::ChannelMismatch { .. }
            | MMMError::RowMismatch { .. }
            | MMMError::ColumnMismatch { .. }
            | MMMError::ControlMismatch { .. } => ErrorKind::InvalidShape,

            MMMError::InvalidRetainRate { .. }
            | MMMError::InvalidDelay { .. }
            | MMMError::InvalidEc { .. }
            | MMMError::InvalidSlope { .. }
            | MMMError::InvalidHalfSaturation { .. }
            | MMMError::InvalidBeta { .. }
            | MMMError::NegativeLogInput { .. }
            | MMMError::NonFiniteValue { .. }
            | MMMError::InvalidPrior { .. } => ErrorKind::InvalidParameter,

            MMMError::NotFitted => ErrorKind::NotFitted,

            MMMError::Runtime { .. } | MMMError::Optimization { .. } => ErrorKind::Runtime,
        }
    }
}

impl std::error::Error for MMMError {}

impl std::fmt::Display for MMMError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            MMMError::UnknownTransform { name } => {
                write!(f, "'{name}' is not a valid transform; expected 'log', 'sqrt' or 'none'")
            }
            MMMError::UnknownScaler { name } => {
                write!(f, "'{name}' is not a valid scaler; expected 'min_max' or 'max_abs'")
            }
            MMMError::UnknownCarryover { name } => {
                write!(
                    f,
                    "'{name}' is not a valid carryover kind; expected 'geometric_decay' or 'peaked_decay'"
                )
            }
            MMMError::UnknownSaturation { name } => {
                write!(f, "'{name}' is not a valid saturation kind; expected 'logistic' or 'reach'")
            }
            MMMError::UnknownEstimator { name } => {
                write!(f, "'{name}' is not a valid estimator; expected 'mean' or 'median'")
            }
            MMMError::MissingParameter { name } => {
                write!(f, "Parameter '{name}' is missing from the parameter mapping")
            }
            MMMError::InvalidSetting { field, reason } => {
                write!(f, "Invalid setting '{field}': {reason}")
            }
            MMMError::Persistence { text } => {
                write!(f, "Fitted model document is invalid: {text}")
            }

            // ---- Shape ----
            MMMError::InvalidRank { name, expected, found } => {
                write!(f, "{name} must be {expected}-dimensional, found {found} dimensions")
            }
            MMMError::MaxLagOutOfRange { max_lag, rows } => {
                write!(f, "max_lag {max_lag} exceeds the number of observations {rows}")
            }
            MMMError::ChannelMismatch { name, expected, found } => {
                write!(f, "{name} must have one entry per channel: expected {expected}, found {found}")
            }
            MMMError::RowMismatch { name, expected, found } => {
                write!(f, "{name} row count mismatch: expected {expected}, found {found}")
            }
            MMMError::ColumnMismatch { expected, found } => {
                write!(f, "Column count mismatch with fitted state: expected {expected}, found {found}")
            }
            MMMError::ControlMismatch { reason } => {
                write!(f, "Control variable mismatch: {reason}")
            }

            // ---- Parameter domain ----
            MMMError::InvalidRetainRate { index, value } => {
                write!(f, "retain_rate at channel {index} must lie in [0, 1], got {value}")
            }
            MMMError::InvalidDelay { index, value, max_lag } => {
                write!(f, "delay at channel {index} must lie in [0, {max_lag}], got {value}")
            }
            MMMError::InvalidEc { index, value } => {
                write!(f, "ec at channel {index} must lie in [0, 1], got {value}")
            }
            MMMError::InvalidSlope { index, value } => {
                write!(f, "slope at channel {index} must be non-negative, got {value}")
            }
            MMMError::InvalidHalfSaturation { index, value } => {
                write!(f, "half_saturation at channel {index} must be non-negative, got {value}")
            }
            MMMError::InvalidBeta { index, value } => {
                write!(f, "beta_medias at channel {index} must be non-negative, got {value}")
            }
            MMMError::NegativeLogInput { row, col, value } => {
                write!(f, "Log transform with negative value {value} at ({row}, {col})")
            }
            MMMError::NonFiniteValue { name, index, value } => {
                write!(f, "{name} at index {index} must be finite, got {value}")
            }
            MMMError::InvalidPrior { name, reason } => {
                write!(f, "Invalid prior for '{name}': {reason}")
            }

            // ---- State ----
            MMMError::NotFitted => {
                write!(f, "Normalizer is not fitted; call fit before transform")
            }

            // ---- Runtime ----
            MMMError::Runtime { text } => {
                write!(f, "Sampling runtime failure: {text}")
            }
            MMMError::Optimization { source } => {
                write!(f, "Posterior-mode optimization failed: {source}")
            }
        }
    }
}

impl From<OptError> for MMMError {
    fn from(err: OptError) -> Self {
        MMMError::Optimization { source: err }
    }
}

impl From<serde_json::Error> for MMMError {
    fn from(err: serde_json::Error) -> Self {
        MMMError::Persistence { text: err.to_string() }
    }
}

impl From<anyhow::Error> for MMMError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<MMMError>() {
            Ok(inner) => inner,
            Err(other) => MMMError::Runtime { text: format!("{other:#}") },
        }
    }
}

/// Convert an [`MMMError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<MMMError> for PyErr {
    fn from(err: MMMError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Category mapping through `MMMError::kind`.
    // - Payload embedding in `Display` messages.
    // - Conversion of opaque runtime errors.
    //
    // They intentionally DO NOT cover:
    // - The PyO3 conversion, which needs the Python C API.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that one representative variant per category maps to the
    // expected `ErrorKind`.
    //
    // Given
    // -----
    // - One variant from each of the five categories.
    //
    // Expect
    // ------
    // - `kind()` returns the matching category for each.
    fn kind_maps_each_category() {
        // Arrange
        let cases = [
            (MMMError::UnknownScaler { name: "z".into() }, ErrorKind::InvalidConfiguration),
            (MMMError::InvalidRank { name: "spends", expected: 2, found: 3 }, ErrorKind::InvalidShape),
            (MMMError::InvalidSlope { index: 0, value: -1.0 }, ErrorKind::InvalidParameter),
            (MMMError::NotFitted, ErrorKind::NotFitted),
            (MMMError::Runtime { text: "boom".into() }, ErrorKind::Runtime),
        ];

        // Act / Assert
        for (err, expected) in cases {
            assert_eq!(err.kind(), expected, "wrong category for {err:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure that domain errors report the offending channel and value.
    //
    // Given
    // -----
    // - `InvalidRetainRate` at channel 1 with value 1.5.
    //
    // Expect
    // ------
    // - The message contains both "1" and "1.5".
    fn invalid_retain_rate_display_includes_payload() {
        // Arrange
        let err = MMMError::InvalidRetainRate { index: 1, value: 1.5 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("channel 1"), "missing channel index.\nGot: {msg}");
        assert!(msg.contains("1.5"), "missing offending value.\nGot: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Check that an `anyhow` error wrapping an `MMMError` is unwrapped back
    // into the original variant, while foreign errors become `Runtime`.
    //
    // Given
    // -----
    // - An `anyhow::Error` built from `MMMError::NotFitted`.
    // - An `anyhow::Error` built from a plain message.
    //
    // Expect
    // ------
    // - The first converts back to `NotFitted`.
    // - The second converts to `Runtime` with the message preserved.
    fn anyhow_conversion_preserves_inner_errors() {
        // Arrange
        let wrapped = anyhow::Error::new(MMMError::NotFitted);
        let foreign = anyhow::anyhow!("chain 3 diverged");

        // Act
        let back: MMMError = wrapped.into();
        let runtime: MMMError = foreign.into();

        // Assert
        assert_eq!(back, MMMError::NotFitted);
        match runtime {
            MMMError::Runtime { text } => assert!(text.contains("chain 3 diverged")),
            other => panic!("expected Runtime, got {other:?}"),
        }
    }
}
