//! utils — conversions between Python objects and crate inputs.
//!
//! Everything here is compiled only with the `python-bindings` feature and
//! is used by the `#[pyclass]`/`#[pyfunction]` glue in the crate root.
//! Array-likes are accepted as contiguous `numpy.ndarray`s, as objects with
//! a `to_numpy()` method (pandas), or as nested float sequences.
#[cfg(feature = "python-bindings")]
use std::collections::BTreeMap;

#[cfg(feature = "python-bindings")]
use ndarray::{Array2, ArrayD, IxDyn};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // ndarray → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1, PyReadonlyArrayDyn,
};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

/// A 1-D float64 view of `raw_data`, copying only when needed.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        return Ok(arr_ro);
    }
    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            return Ok(series_ro);
        }
    }
    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(ndarray::Array1::from(vec).into_pyarray(py).readonly())
}

/// A float64 view of matrix-like `raw_data` (rows = time).
///
/// numpy input of any rank passes through unchanged, so a wrong rank
/// surfaces as the core's `InvalidRank` (a `ValueError`) rather than a
/// `TypeError` here. Nested sequences must be rectangular.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArrayDyn<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArrayDyn<f64>>() {
        return Ok(arr_ro);
    }
    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArrayDyn<f64>>() {
            return Ok(frame_ro);
        }
    }
    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D numpy.ndarray, pandas.DataFrame, or nested float64 sequence")
    })?;
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != n_cols) {
        return Err(PyValueError::new_err("rows must all have the same length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let n_rows = if n_cols == 0 { 0 } else { flat.len() / n_cols };
    let matrix = Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(matrix.into_dyn().into_pyarray(py).readonly())
}

/// A float64 view of any rank; rank checks are left to the core.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_dyn<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<PyReadonlyArrayDyn<'py, f64>> {
    raw_data
        .extract::<PyReadonlyArrayDyn<f64>>()
        .map_err(|_| PyTypeError::new_err("expected a float64 numpy.ndarray"))
}

/// `max_lag` from Python, where negative values are representable.
#[cfg(feature = "python-bindings")]
pub fn extract_max_lag(max_lag: i64) -> PyResult<usize> {
    usize::try_from(max_lag).map_err(|_| PyValueError::new_err(format!("max_lag must be non-negative, got {max_lag}")))
}

/// Named point estimates from a `dict[str, float | ndarray]`.
#[cfg(feature = "python-bindings")]
pub fn extract_named_parameters(named: &Bound<'_, PyDict>) -> PyResult<BTreeMap<String, ArrayD<f64>>> {
    let mut out = BTreeMap::new();
    for (key, value) in named.iter() {
        let name: String = key.extract()?;
        let array = match value.extract::<f64>() {
            Ok(scalar) => ArrayD::from_elem(IxDyn(&[]), scalar),
            Err(_) => extract_f64_dyn(&value)?.as_array().to_owned(),
        };
        out.insert(name, array);
    }
    Ok(out)
}
