//! normalizer — invertible value transform composed with a fitted rescaler.
//!
//! Purpose
//! -------
//! Put predictors and the target on a common scale before sampling and map
//! model outputs back to natural units afterwards.
//!
//! Key behaviors
//! -------------
//! - [`ValueTransform`]: `log` (`ln(1 + x)`), `sqrt`, or `none`.
//! - [`ScalerKind`]: `min_max` or `max_abs`, fitted per column.
//! - [`Normalizer`]: explicit `Unfitted → Fitted` state machine; `fit`
//!   is the only transition.
//!
//! Invariants & assumptions
//! ------------------------
//! - `reverse_transform(transform(v)) ≈ v` for every `v` in the domain of
//!   the configured transform.
//! - Everything required by `reverse_transform` lives in the serializable
//!   [`Normalizer`] value; there is no hidden state.
//!
//! Conventions
//! -----------
//! - Constant columns get a unit scale, so scaling never divides by zero.
//! - The default configuration is `none` + `max_abs`.

pub mod scaler;
pub mod state;
pub mod transform;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::scaler::{FittedScaler, ScalerKind};
pub use self::state::{Normalizer, NormalizerState};
pub use self::transform::ValueTransform;
