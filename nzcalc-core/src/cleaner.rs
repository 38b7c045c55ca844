//! Normalisation of raw historical tables.
//!
//! Raw tables arrive from the data loader with a `Year` column and a column per
//! category. Cells are numbers, text, or the placeholder `-` for a missing
//! observation. Cleaning recodes placeholders, coerces every cell to a float,
//! indexes the table by year and estimates a business-as-usual growth rate per
//! category.

use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::{FloatValue, TimeseriesTable, Year};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Placeholder used by the source spreadsheets for a missing observation
pub const MISSING_PLACEHOLDER: &str = "-";
/// Name of the period column in raw tables
pub const YEAR_COLUMN: &str = "Year";

/// A single cell of a raw table before coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(FloatValue),
    Text(String),
    Missing,
}

impl RawValue {
    /// Coerce the cell to a float, with NaN marking a missing observation
    ///
    /// Infinite values are rejected as they have no representation in the interchange format.
    fn coerce(&self, column: &str) -> NZCalcResult<FloatValue> {
        let invalid = |value: String| NZCalcError::DataFormat {
            column: column.to_string(),
            value,
        };
        let value = match self {
            RawValue::Number(v) => *v,
            RawValue::Missing => FloatValue::NAN,
            RawValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() || s == MISSING_PLACEHOLDER {
                    FloatValue::NAN
                } else {
                    s.parse::<FloatValue>().map_err(|_| invalid(s.to_string()))?
                }
            }
        };
        if value.is_infinite() {
            return Err(invalid(value.to_string()));
        }
        Ok(value)
    }
}

impl From<FloatValue> for RawValue {
    fn from(value: FloatValue) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub year: Year,
    pub values: Vec<RawValue>,
}

/// Table as supplied by the loader, before any cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTableFields")]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Deserialize)]
struct RawTableFields {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl TryFrom<RawTableFields> for RawTable {
    type Error = NZCalcError;

    fn try_from(fields: RawTableFields) -> Result<Self, Self::Error> {
        let mut table = RawTable::new(fields.columns);
        for row in fields.rows {
            table.push_row(row.year, row.values)?;
        }
        Ok(table)
    }
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, year: Year, values: Vec<RawValue>) -> NZCalcResult<()> {
        if values.len() != self.columns.len() {
            return Err(NZCalcError::InvalidTable(format!(
                "row for {} has {} values for {} columns",
                year,
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(RawRow { year, values });
        Ok(())
    }

    /// Read a raw table from CSV text with a header row containing a `Year` column.
    pub fn from_csv_reader<R: Read>(reader: R) -> NZCalcResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let year_idx = headers
            .iter()
            .position(|h| h == YEAR_COLUMN)
            .ok_or_else(|| NZCalcError::ColumnNotFound(YEAR_COLUMN.to_string()))?;
        let columns = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != year_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut table = Self::new(columns);
        for record in reader.records() {
            let record = record?;
            let year = parse_year(record.get(year_idx).unwrap_or_default())?;
            let values = record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != year_idx)
                .map(|(_, cell)| RawValue::from(cell))
                .collect();
            table.push_row(year, values)?;
        }
        Ok(table)
    }

    pub fn from_csv_str(text: &str) -> NZCalcResult<Self> {
        Self::from_csv_reader(text.as_bytes())
    }
}

/// Years are written either as integers or as integral floats ("2019.0")
fn parse_year(cell: &str) -> NZCalcResult<Year> {
    let cell = cell.trim();
    if let Ok(year) = cell.parse::<Year>() {
        return Ok(year);
    }
    match cell.parse::<FloatValue>() {
        Ok(v) if v.fract() == 0.0 && v.abs() < Year::MAX as FloatValue => Ok(v as Year),
        _ => Err(NZCalcError::DataFormat {
            column: YEAR_COLUMN.to_string(),
            value: cell.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Share of true activity captured by the data source, in percent.
    ///
    /// Observed values are divided by `capture_rate_pct / 100` to estimate the true total.
    ///
    /// Default: 100
    pub capture_rate_pct: FloatValue,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            capture_rate_pct: 100.0,
        }
    }
}

/// Mean historical growth rate per category.
///
/// `None` marks a category whose rate is undefined (fewer than two consecutive
/// observations); such categories are carried forward flat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthRates(BTreeMap<String, Option<FloatValue>>);

impl GrowthRates {
    pub fn from_table(table: &TimeseriesTable) -> Self {
        Self(
            table
                .iter()
                .map(|(name, values)| (name.to_string(), mean_growth_rate(values.view())))
                .collect(),
        )
    }

    pub fn rate(&self, category: &str) -> NZCalcResult<Option<FloatValue>> {
        self.0
            .get(category)
            .copied()
            .ok_or_else(|| NZCalcError::ColumnNotFound(category.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<FloatValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Output of [`clean`]
#[derive(Debug, Clone)]
pub struct CleanedData {
    pub table: TimeseriesTable,
    pub growth_rates: GrowthRates,
}

/// Mean fractional change between consecutive rows where both values are observed.
///
/// Pairs that straddle a missing value are skipped rather than counted as no change,
/// as are pairs starting from zero where the change is unbounded.
pub fn mean_growth_rate(values: ArrayView1<FloatValue>) -> Option<FloatValue> {
    let changes: Vec<FloatValue> = values
        .windows(2)
        .into_iter()
        .filter(|w| !w[0].is_nan() && !w[1].is_nan() && w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if changes.is_empty() {
        None
    } else {
        Some(changes.iter().sum::<FloatValue>() / changes.len() as FloatValue)
    }
}

/// Clean a raw table and compute the per-category growth rates
pub fn clean(raw: &RawTable, options: &CleanOptions) -> NZCalcResult<CleanedData> {
    let capture = options.capture_rate_pct;
    if !(capture > 0.0 && capture <= 100.0) {
        return Err(NZCalcError::InvalidCaptureRate(capture));
    }
    let scale = 100.0 / capture;

    let years = raw.rows.iter().map(|r| r.year).collect();
    let mut table = TimeseriesTable::new(years)?;
    for (j, name) in raw.columns.iter().enumerate() {
        let values = raw
            .rows
            .iter()
            .map(|row| {
                row.values
                    .get(j)
                    .ok_or_else(|| {
                        NZCalcError::InvalidTable(format!(
                            "row for {} has no value for '{}'",
                            row.year, name
                        ))
                    })?
                    .coerce(name)
                    .map(|v| v * scale)
            })
            .collect::<NZCalcResult<Vec<FloatValue>>>()?;
        table.set_column(name.clone(), Array1::from(values))?;
    }

    let growth_rates = GrowthRates::from_table(&table);
    for (name, rate) in growth_rates.iter() {
        log::debug!("Historical growth rate for '{}': {:?}", name, rate);
    }
    Ok(CleanedData {
        table,
        growth_rates,
    })
}
