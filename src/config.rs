//! config — experiment settings for one training run.
//!
//! Purpose
//! -------
//! Describe a training run with the keys of the `train.yaml` experiment
//! files (`EXPERIMENT_NM`, `MAX_LAG`, `NORMALIZATION`, ...) and turn them
//! into the typed values the rest of the crate consumes.
//!
//! Key behaviors
//! -------------
//! - [`ExperimentConfig`] deserializes with serde from any self-describing
//!   format; file reading and YAML parsing stay with the caller.
//! - [`ExperimentConfig::validate`] parses every name and checks every
//!   count eagerly, so a bad file fails before any data is touched.
//! - Typed accessors build the [`ModelSpec`], both [`Normalizer`]s, the
//!   [`Estimator`], [`SamplingSettings`] and [`OptimOptions`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Optional keys fall back to the defaults of the original experiment
//!   files: no controls, `max_abs` scaling without a value transform,
//!   the `mean` estimator, one chain.
//! - `OPTIMIZER` is optional and only used by the posterior-mode path.
use serde::{Deserialize, Serialize};

use crate::{
    errors::{MMMError, MMMResult},
    normalizer::Normalizer,
    optimization::loglik_optimizer::{LineSearcher, OptimOptions, Tolerances},
    program::ModelSpec,
    sampling::{Estimator, SamplingSettings},
};

/// Arguments of one [`Normalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// `"log"`, `"sqrt"`, or absent for no transform.
    #[serde(default)]
    pub transfo_nm: Option<String>,
    #[serde(default = "default_scaler")]
    pub scaler_nm: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig { transfo_nm: None, scaler_nm: default_scaler() }
    }
}

impl NormalizerConfig {
    /// An unfitted normalizer with these settings.
    pub fn build(&self) -> MMMResult<Normalizer> {
        Normalizer::from_names(self.transfo_nm.as_deref(), &self.scaler_nm)
    }
}

/// Predictor and target normalizer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NormalizationConfig {
    #[serde(default)]
    pub predictors: NormalizerConfig,
    #[serde(default)]
    pub target: NormalizerConfig,
}

/// Posterior-mode optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OptimizerConfig {
    #[serde(default)]
    pub tol_grad: Option<f64>,
    #[serde(default)]
    pub tol_cost: Option<f64>,
    #[serde(default)]
    pub max_iter: Option<usize>,
    /// `"MoreThuente"` or `"HagerZhang"`, case-insensitive.
    #[serde(default = "default_line_searcher")]
    pub line_searcher: String,
    #[serde(default)]
    pub lbfgs_mem: Option<usize>,
    #[serde(default)]
    pub verbose: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            tol_grad: Some(1e-6),
            tol_cost: None,
            max_iter: Some(500),
            line_searcher: default_line_searcher(),
            lbfgs_mem: None,
            verbose: false,
        }
    }
}

/// ExperimentConfig — one training run.
///
/// Field names follow the experiment files; `DIMINUSHING_RETURNS_TRANSFO_NM`
/// keeps the historical spelling so existing files load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExperimentConfig {
    #[serde(rename = "EXPERIMENT_NM")]
    pub experiment_name: String,
    #[serde(rename = "MEDIA_NMS")]
    pub media_names: Vec<String>,
    #[serde(rename = "CTRL_NMS", default)]
    pub ctrl_names: Vec<String>,
    #[serde(rename = "TARGET_NM")]
    pub target_name: String,
    #[serde(rename = "DATE_NM", default)]
    pub date_name: Option<String>,
    #[serde(default)]
    pub data_source_path: Option<String>,
    #[serde(rename = "NB_TEST_OBS")]
    pub n_test: usize,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(rename = "CARRYOVER_TRANSFO_NM")]
    pub carryover: String,
    #[serde(rename = "DIMINUSHING_RETURNS_TRANSFO_NM")]
    pub saturation: String,
    pub max_lag: usize,
    #[serde(rename = "SAMPLING_N_ITER")]
    pub n_iter: usize,
    #[serde(rename = "SAMPLING_N_PROCESSORS", default = "default_chains")]
    pub chains: usize,
    #[serde(rename = "PARAMETER_ESTIMATOR_NM", default = "default_estimator")]
    pub estimator: String,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl ExperimentConfig {
    /// Check every setting without touching data.
    ///
    /// Errors
    /// ------
    /// - `MMMError::InvalidSetting` for an empty media list, a blank or
    ///   repeated column name, `MAX_LAG = 0` or `NB_TEST_OBS = 0`.
    /// - Parse errors from every accessor below.
    pub fn validate(&self) -> MMMResult<()> {
        if self.media_names.is_empty() {
            return Err(MMMError::InvalidSetting {
                field: "MEDIA_NMS",
                reason: "must name at least one media column",
            });
        }
        let mut seen = std::collections::BTreeSet::new();
        for name in self.media_names.iter().chain(&self.ctrl_names).chain([&self.target_name]) {
            if name.trim().is_empty() {
                return Err(MMMError::InvalidSetting { field: "column names", reason: "must not be blank" });
            }
            if !seen.insert(name.as_str()) {
                return Err(MMMError::InvalidSetting { field: "column names", reason: "must be unique" });
            }
        }
        if self.max_lag == 0 {
            return Err(MMMError::InvalidSetting { field: "MAX_LAG", reason: "must be at least 1" });
        }
        if self.n_test == 0 {
            return Err(MMMError::InvalidSetting { field: "NB_TEST_OBS", reason: "must be at least 1" });
        }
        self.model_spec()?;
        self.predictor_normalizer()?;
        self.target_normalizer()?;
        self.estimator()?;
        self.sampling_settings()?;
        self.optim_options()?;
        Ok(())
    }

    pub fn has_controls(&self) -> bool {
        !self.ctrl_names.is_empty()
    }

    pub fn model_spec(&self) -> MMMResult<ModelSpec> {
        ModelSpec::from_names(&self.carryover, &self.saturation, self.has_controls())
    }

    pub fn predictor_normalizer(&self) -> MMMResult<Normalizer> {
        self.normalization.predictors.build()
    }

    pub fn target_normalizer(&self) -> MMMResult<Normalizer> {
        self.normalization.target.build()
    }

    pub fn estimator(&self) -> MMMResult<Estimator> {
        self.estimator.parse()
    }

    pub fn sampling_settings(&self) -> MMMResult<SamplingSettings> {
        SamplingSettings::new(self.n_iter, self.chains)
    }

    /// Errors
    /// ------
    /// - `MMMError::Optimization` wrapping the optimizer's own validation
    ///   error (unknown line search, bad tolerance, zero memory).
    pub fn optim_options(&self) -> MMMResult<OptimOptions> {
        let opt = &self.optimizer;
        let tols = Tolerances::new(opt.tol_grad, opt.tol_cost, opt.max_iter)?;
        let line_searcher: LineSearcher = opt.line_searcher.parse()?;
        Ok(OptimOptions::new(tols, line_searcher, opt.verbose, opt.lbfgs_mem)?)
    }
}

// ---- Serde defaults ----

fn default_scaler() -> String {
    "max_abs".to_string()
}

fn default_line_searcher() -> String {
    "MoreThuente".to_string()
}

fn default_chains() -> usize {
    1
}

fn default_estimator() -> String {
    "mean".to_string()
}
