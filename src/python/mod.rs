//! Python bindings for the dashboard
//!
//! Tables cross the boundary as [`PyTimeseriesTable`] objects, or as split-orient JSON
//! (`{"columns": [...], "index": [...], "data": [[...]]}`) which pandas reads with
//! `pd.read_json(text, orient="split")`. Scenario parameters and ambition definitions
//! are passed as TOML text.

use ndarray::Array1;
use numpy::{PyArray1, ToPyArray};
use nzcalc_components::aviation::{AviationEmissions, Haul};
use nzcalc_components::ghg::combine_ghg_factors;
use nzcalc_components::module::{run_module, DemandSource, ModuleInputs};
use nzcalc_components::overview::EmissionsOverview;
use nzcalc_components::parameters::HaulAmbitions;
use nzcalc_core::ambition::{AmbitionLevel, AmbitionLevels, AmbitionMode};
use nzcalc_core::cleaner::{clean, CleanOptions, RawTable};
use nzcalc_core::errors::NZCalcError;
use nzcalc_core::factors::FactorTable;
use nzcalc_core::scenario::ScenarioParameters;
use nzcalc_core::timeseries::{CalculatorHorizon, FloatValue, TimeseriesTable, Year};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

fn to_py_err(err: NZCalcError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Years by named categories
#[pyclass]
#[pyo3(name = "TimeseriesTable")]
#[derive(Debug, Clone)]
pub struct PyTimeseriesTable(pub TimeseriesTable);

#[pymethods]
impl PyTimeseriesTable {
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        TimeseriesTable::from_json(json)
            .map(Self)
            .map_err(to_py_err)
    }

    fn to_json(&self) -> PyResult<String> {
        self.0.to_json().map_err(to_py_err)
    }

    #[getter]
    fn years(&self) -> Vec<Year> {
        self.0.years().to_vec()
    }

    #[getter]
    fn categories(&self) -> Vec<String> {
        self.0.categories().map(String::from).collect()
    }

    /// Values of one category as a numpy array
    fn column<'py>(
        &self,
        py: Python<'py>,
        name: &str,
    ) -> PyResult<Bound<'py, PyArray1<FloatValue>>> {
        let values: &Array1<FloatValue> = self.0.column(name).map_err(to_py_err)?;
        Ok(values.to_pyarray_bound(py))
    }

    /// Split-orient dictionary, ready for `pd.DataFrame(**table.to_dict())`
    fn to_dict(&self, py: Python<'_>) -> PyResult<PyObject> {
        Ok(pythonize::pythonize(py, &self.0)?)
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "<TimeseriesTable years={}..{} categories={:?}>",
            self.0.years().first().copied().unwrap_or_default(),
            self.0.years().last().copied().unwrap_or_default(),
            self.categories()
        )
    }
}

fn parse_haul(name: &str) -> PyResult<Haul> {
    Haul::ALL
        .into_iter()
        .find(|h| name == h.code() || name == h.label() || name == format!("{h:?}"))
        .ok_or_else(|| PyValueError::new_err(format!("Unknown haul: {name}")))
}

fn parse_mode(name: &str) -> PyResult<AmbitionMode> {
    match name {
        "Percentage" => Ok(AmbitionMode::Percentage),
        "Absolute" => Ok(AmbitionMode::Absolute),
        _ => Err(PyValueError::new_err(format!(
            "Unknown ambition mode: {name}"
        ))),
    }
}

/// Clean a raw CSV table.
///
/// Returns the cleaned table and the mean historical growth rate of each category
/// (`None` where fewer than two consecutive observations exist).
#[pyfunction]
#[pyo3(signature = (csv, capture_rate_pct=100.0))]
fn clean_data(
    csv: &str,
    capture_rate_pct: FloatValue,
) -> PyResult<(PyTimeseriesTable, HashMap<String, Option<FloatValue>>)> {
    let raw = RawTable::from_csv_str(csv).map_err(to_py_err)?;
    let cleaned = clean(&raw, &CleanOptions { capture_rate_pct }).map_err(to_py_err)?;
    let rates = cleaned
        .growth_rates
        .iter()
        .map(|(name, rate)| (name.to_string(), rate))
        .collect();
    Ok((PyTimeseriesTable(cleaned.table), rates))
}

/// Target for a (possibly fractional) ambition level
#[pyfunction]
#[pyo3(signature = (levels, level, base_value=1.0, mode="Absolute"))]
fn interpolate_ambition(
    levels: [FloatValue; 4],
    level: FloatValue,
    base_value: FloatValue,
    mode: &str,
) -> PyResult<FloatValue> {
    let level = AmbitionLevel::new(level).map_err(to_py_err)?;
    Ok(AmbitionLevels::new(levels).target(level, base_value, parse_mode(mode)?))
}

/// Combine a per-gas emission factor CSV into CO2e factors over the horizon
#[pyfunction]
#[pyo3(signature = (csv, first=2019, last=2050))]
fn emission_factors(csv: &str, first: Year, last: Year) -> PyResult<PyTimeseriesTable> {
    let horizon = CalculatorHorizon::new(first, last).map_err(to_py_err)?;
    let raw = RawTable::from_csv_str(csv).map_err(to_py_err)?;
    let cleaned = clean(&raw, &CleanOptions::default()).map_err(to_py_err)?;
    let factors = combine_ghg_factors(&cleaned.table, &horizon).map_err(to_py_err)?;
    Ok(PyTimeseriesTable(factors.table().clone()))
}

/// Project one aviation haul from its historical flights.
///
/// Returns a dict of tables: `emissions`, `activity`, `demand` and `shares`.
/// Without `ambitions`, the built-in levels for the haul are used.
#[pyfunction]
#[pyo3(signature = (history_csv, haul, factors, parameters="", ambitions=None))]
fn project_aviation(
    history_csv: &str,
    haul: &str,
    factors: PyTimeseriesTable,
    parameters: &str,
    ambitions: Option<&str>,
) -> PyResult<HashMap<String, PyTimeseriesTable>> {
    let haul = parse_haul(haul)?;
    let params = ScenarioParameters::from_toml_str(parameters).map_err(to_py_err)?;
    let ambitions = match ambitions {
        Some(text) => HaulAmbitions::from_toml_str(text).map_err(to_py_err)?,
        None => HaulAmbitions::for_haul(haul),
    };
    ambitions.warn_unbalanced_shares();

    let history = RawTable::from_csv_str(history_csv).map_err(to_py_err)?;
    let inputs = ModuleInputs {
        ambitions,
        demand: DemandSource::Projected,
        factors: FactorTable::new(factors.0),
        derivation: Box::new(AviationEmissions::new(haul)),
    };
    let outputs = run_module(&history, &params, &inputs).map_err(to_py_err)?;
    log::debug!("Projected {} over {:?}", haul, params.horizon);

    Ok(HashMap::from([
        ("emissions".to_string(), PyTimeseriesTable(outputs.emissions)),
        ("activity".to_string(), PyTimeseriesTable(outputs.activity)),
        ("demand".to_string(), PyTimeseriesTable(outputs.demand)),
        ("shares".to_string(), PyTimeseriesTable(outputs.shares)),
    ]))
}

/// Totals, cumulative total, baseline and target of several emission groups in tonnes.
///
/// `groups` is a list of `(name, emissions)` pairs with emissions in kg.
#[pyfunction]
#[pyo3(signature = (groups, base_year=2022, reduction=0.25))]
fn emissions_overview(
    py: Python<'_>,
    groups: Vec<(String, PyTimeseriesTable)>,
    base_year: Year,
    reduction: FloatValue,
) -> PyResult<PyObject> {
    let years = match groups.first() {
        Some((_, table)) => table.0.years().to_vec(),
        None => return Err(PyValueError::new_err("No emission groups given")),
    };
    let mut overview = EmissionsOverview::new(years, base_year)
        .and_then(|o| o.with_reduction(reduction))
        .map_err(to_py_err)?;
    for (name, table) in &groups {
        overview.add_group(name, &table.0).map_err(to_py_err)?;
    }
    let summary = overview.summary().map_err(to_py_err)?;
    Ok(pythonize::pythonize(py, &summary)?)
}

#[pymodule]
#[pyo3(name = "_lib")]
fn nzcalc(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<PyTimeseriesTable>()?;
    m.add_function(wrap_pyfunction!(clean_data, m)?)?;
    m.add_function(wrap_pyfunction!(interpolate_ambition, m)?)?;
    m.add_function(wrap_pyfunction!(emission_factors, m)?)?;
    m.add_function(wrap_pyfunction!(project_aviation, m)?)?;
    m.add_function(wrap_pyfunction!(emissions_overview, m)?)?;
    Ok(())
}
