//! Python bindings.
//!
//! Each function accepts and returns native Python objects (dicts/lists)
//! via `pythonize`, converted to/from `serde_json::Value` at the boundary.
//! Engine errors become `ValueError`s rather than a generic exception type,
//! so callers can catch them the way they'd catch any other bad-input
//! error from a Python API.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pythonize::{depythonize, pythonize};
use serde_json::Value;

use jsonschema_llm_core::{
    convert, convert_all_components, extract_component, list_components, rehydrate,
    Codec, ConvertOptions, ExtractOptions,
};

fn to_py_err(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Converts a JSON Schema into a target's structured-output dialect.
///
/// `schema` is a Python dict/list describing the JSON Schema document.
/// `config` is a dict matching `ConvertOptions` (e.g. `{"target": "openai-strict"}`).
/// Returns a dict matching `ConvertResult`.
#[pyfunction]
fn convert_schema(py: Python<'_>, schema: &Bound<'_, PyAny>, config: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let schema: Value = depythonize(schema).map_err(to_py_err)?;
    let config: ConvertOptions = depythonize(config).map_err(to_py_err)?;
    let result = convert(&schema, &config).map_err(to_py_err)?;
    Ok(pythonize(py, &result).map_err(to_py_err)?.into())
}

/// Reverses a codec's transforms against a document produced by an LLM.
/// Returns a dict matching `RehydrateResult`.
#[pyfunction]
fn rehydrate_document(py: Python<'_>, data: &Bound<'_, PyAny>, codec: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let data: Value = depythonize(data).map_err(to_py_err)?;
    let codec: Codec = depythonize(codec).map_err(to_py_err)?;
    let result = rehydrate(&data, &codec).map_err(to_py_err)?;
    Ok(pythonize(py, &result).map_err(to_py_err)?.into())
}

/// Lists every extractable `$defs`/`definitions` pointer in a schema.
#[pyfunction]
fn list_schema_components(py: Python<'_>, schema: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let schema: Value = depythonize(schema).map_err(to_py_err)?;
    let pointers = list_components(&schema);
    Ok(pythonize(py, &pointers).map_err(to_py_err)?.into())
}

/// Extracts one component as a standalone schema. Returns a dict matching
/// `ExtractedComponent`.
#[pyfunction]
fn extract_schema_component(
    py: Python<'_>,
    schema: &Bound<'_, PyAny>,
    pointer: &str,
    options: &Bound<'_, PyAny>,
) -> PyResult<PyObject> {
    let schema: Value = depythonize(schema).map_err(to_py_err)?;
    let options: ExtractOptions = depythonize(options).map_err(to_py_err)?;
    let result = extract_component(&schema, pointer, &options).map_err(to_py_err)?;
    Ok(pythonize(py, &result).map_err(to_py_err)?.into())
}

/// Extracts and converts every component in one call. Returns a list of
/// dicts matching `ComponentConvertResult`.
#[pyfunction]
fn convert_all_schema_components(
    py: Python<'_>,
    schema: &Bound<'_, PyAny>,
    convert_options: &Bound<'_, PyAny>,
    extract_options: &Bound<'_, PyAny>,
) -> PyResult<PyObject> {
    let schema: Value = depythonize(schema).map_err(to_py_err)?;
    let convert_options: ConvertOptions = depythonize(convert_options).map_err(to_py_err)?;
    let extract_options: ExtractOptions = depythonize(extract_options).map_err(to_py_err)?;
    let results = convert_all_components(&schema, &convert_options, &extract_options);
    Ok(pythonize(py, &results).map_err(to_py_err)?.into())
}

#[pymodule]
fn jsonschema_llm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(convert_schema, m)?)?;
    m.add_function(wrap_pyfunction!(rehydrate_document, m)?)?;
    m.add_function(wrap_pyfunction!(list_schema_components, m)?)?;
    m.add_function(wrap_pyfunction!(extract_schema_component, m)?)?;
    m.add_function(wrap_pyfunction!(convert_all_schema_components, m)?)?;
    Ok(())
}
