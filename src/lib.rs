//! bayesian_mmm — Bayesian media-mix modelling with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the spend transforms, the normalizer, the model program generator, and the
//! inference machine to Python via the `_bayesian_mmm` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules as the public crate surface, leaves
//!   first: `spend_transformation`, `normalizer`, `program`, `inference`,
//!   `sampling`, `posterior`, then `config` and `persistence`.
//! - Define `#[pyclass]` wrappers, `#[pyfunction]`s, and the `#[pymodule]`
//!   initializer for the `_bayesian_mmm` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - Python-visible names mirror the Rust ones (`Normalizer`,
//!   `InferenceMachine`, `expand_lags`, ...).
//!
//! Conventions
//! -----------
//! - Matrices are `(time, channel)`; lagged tensors are
//!   `(time, channel, lag)`.
//! - Errors from core Rust code are [`MMMError`](errors::MMMError)s and
//!   become `ValueError`s at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on the inner modules and can
//!   ignore the items guarded by the `python-bindings` feature.
//! - The Python packaging layer imports `_bayesian_mmm` and wraps it in the
//!   user-facing `bayesian_mmm` package, which also owns CSV and YAML IO.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   integration tests under `tests/`.

pub mod config;
pub mod errors;
pub mod inference;
pub mod normalizer;
pub mod optimization;
pub mod persistence;
pub mod posterior;
pub mod program;
pub mod sampling;
pub mod spend_transformation;
pub mod utils;
pub mod validation;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2, PyArray3};

#[cfg(feature = "python-bindings")]
use pyo3::{
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::utils::{
    extract_f64_array, extract_f64_dyn, extract_f64_matrix, extract_max_lag, extract_named_parameters,
};

/// Lagged spend tensor `(time, channel, lag)`; see
/// [`spend_transformation::expand_lags`].
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (spends, max_lag))]
fn expand_lags<'py>(
    py: Python<'py>, spends: &Bound<'py, PyAny>, max_lag: i64,
) -> PyResult<Bound<'py, PyArray3<f64>>> {
    let spends = extract_f64_matrix(py, spends)?;
    let lagged = spend_transformation::expand_lags(&spends.as_array(), extract_max_lag(max_lag)?)?;
    Ok(lagged.into_pyarray(py))
}

#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (lagged_spends, retain_rates))]
fn geometric_decay<'py>(
    py: Python<'py>, lagged_spends: &Bound<'py, PyAny>, retain_rates: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let lagged = extract_f64_dyn(lagged_spends)?;
    let rates = extract_f64_array(py, retain_rates)?;
    Ok(spend_transformation::geometric_decay(&lagged.as_array(), &rates.as_array())?.into_pyarray(py))
}

#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (lagged_spends, delays, retain_rates))]
fn peaked_decay<'py>(
    py: Python<'py>, lagged_spends: &Bound<'py, PyAny>, delays: &Bound<'py, PyAny>,
    retain_rates: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let lagged = extract_f64_dyn(lagged_spends)?;
    let delays = extract_f64_array(py, delays)?;
    let rates = extract_f64_array(py, retain_rates)?;
    let out = spend_transformation::peaked_decay(&lagged.as_array(), &delays.as_array(), &rates.as_array())?;
    Ok(out.into_pyarray(py))
}

#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (spends, ecs, slopes))]
fn logistic_saturation<'py>(
    py: Python<'py>, spends: &Bound<'py, PyAny>, ecs: &Bound<'py, PyAny>, slopes: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let spends = extract_f64_matrix(py, spends)?;
    let ecs = extract_f64_array(py, ecs)?;
    let slopes = extract_f64_array(py, slopes)?;
    let out = spend_transformation::logistic_saturation(&spends.as_array(), &ecs.as_array(), &slopes.as_array())?;
    Ok(out.into_pyarray(py))
}

#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (spends, half_saturations))]
fn reach_saturation<'py>(
    py: Python<'py>, spends: &Bound<'py, PyAny>, half_saturations: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let spends = extract_f64_matrix(py, spends)?;
    let rates = extract_f64_array(py, half_saturations)?;
    Ok(spend_transformation::reach_saturation(&spends.as_array(), &rates.as_array())?.into_pyarray(py))
}

/// Full program text for one model structure.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (carryover, saturation, has_controls))]
fn generate_program(carryover: &str, saturation: &str, has_controls: bool) -> PyResult<String> {
    let spec = program::ModelSpec::from_names(carryover, saturation, has_controls)?;
    Ok(program::ModelProgram::generate(spec).code())
}

/// Normalizer — Python-facing wrapper for [`normalizer::Normalizer`].
///
/// Constructed with `Normalizer(transfo_nm=None, scaler_nm="max_abs")`;
/// `fit`, `transform` and `reverse_transform` take 2-D array-likes and
/// return `numpy.ndarray`s. `to_json`/`from_json` carry the fitted state.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "Normalizer", module = "bayesian_mmm")]
#[derive(Clone)]
pub struct PyNormalizer {
    inner: normalizer::Normalizer,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyNormalizer {
    #[new]
    #[pyo3(signature = (transfo_nm = None, scaler_nm = "max_abs"))]
    pub fn new(transfo_nm: Option<&str>, scaler_nm: &str) -> PyResult<Self> {
        Ok(PyNormalizer { inner: normalizer::Normalizer::from_names(transfo_nm, scaler_nm)? })
    }

    pub fn fit<'py>(&mut self, py: Python<'py>, values: &Bound<'py, PyAny>) -> PyResult<()> {
        let values = extract_f64_matrix(py, values)?;
        Ok(self.inner.fit(&values.as_array())?)
    }

    pub fn transform<'py>(
        &self, py: Python<'py>, values: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let values = extract_f64_matrix(py, values)?;
        Ok(self.inner.transform(&values.as_array())?.into_pyarray(py))
    }

    pub fn reverse_transform<'py>(
        &self, py: Python<'py>, values: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let values = extract_f64_matrix(py, values)?;
        Ok(self.inner.reverse_transform(&values.as_array())?.into_pyarray(py))
    }

    #[getter]
    pub fn is_fitted(&self) -> bool {
        self.inner.is_fitted()
    }

    pub fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| errors::MMMError::from(e).into())
    }

    #[staticmethod]
    pub fn from_json(text: &str) -> PyResult<Self> {
        let inner = serde_json::from_str(text).map_err(errors::MMMError::from)?;
        Ok(PyNormalizer { inner })
    }
}

/// InferenceMachine — Python-facing wrapper for
/// [`inference::InferenceMachine`].
///
/// Constructed from a `dict` of point estimates (`tau` may be a float) and
/// `max_lag`. Variants are chosen once, from the keys present.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "InferenceMachine", module = "bayesian_mmm")]
pub struct PyInferenceMachine {
    inner: inference::InferenceMachine,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyInferenceMachine {
    #[new]
    #[pyo3(signature = (parameters, max_lag))]
    pub fn new(parameters: &Bound<'_, PyDict>, max_lag: i64) -> PyResult<Self> {
        let named = extract_named_parameters(parameters)?;
        let inner = inference::InferenceMachine::from_named(&named, extract_max_lag(max_lag)?)?;
        Ok(PyInferenceMachine { inner })
    }

    #[pyo3(signature = (spends, ctrl = None))]
    pub fn predict<'py>(
        &self, py: Python<'py>, spends: &Bound<'py, PyAny>, ctrl: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let spends = extract_f64_matrix(py, spends)?;
        let ctrl = ctrl.map(|c| extract_f64_matrix(py, c)).transpose()?;
        let out = self.inner.predict(&spends.as_array(), ctrl.as_ref().map(|c| c.as_array().into_dyn()))?;
        Ok(out.into_pyarray(py))
    }

    #[pyo3(signature = (spends, ctrl = None))]
    pub fn contributions<'py>(
        &self, py: Python<'py>, spends: &Bound<'py, PyAny>, ctrl: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let spends = extract_f64_matrix(py, spends)?;
        let ctrl = ctrl.map(|c| extract_f64_matrix(py, c)).transpose()?;
        let out = self.inner.contributions(&spends.as_array(), ctrl.as_ref().map(|c| c.as_array().into_dyn()))?;
        Ok(out.into_pyarray(py))
    }

    #[getter]
    pub fn max_lag(&self) -> usize {
        self.inner.max_lag()
    }
}

/// Initialize the `_bayesian_mmm` extension module.
///
/// Registers the transform functions, `generate_program`, and the
/// `Normalizer` and `InferenceMachine` classes at module level.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _bayesian_mmm<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(expand_lags, m)?)?;
    m.add_function(wrap_pyfunction!(geometric_decay, m)?)?;
    m.add_function(wrap_pyfunction!(peaked_decay, m)?)?;
    m.add_function(wrap_pyfunction!(logistic_saturation, m)?)?;
    m.add_function(wrap_pyfunction!(reach_saturation, m)?)?;
    m.add_function(wrap_pyfunction!(generate_program, m)?)?;
    m.add_class::<PyNormalizer>()?;
    m.add_class::<PyInferenceMachine>()?;
    Ok(())
}
