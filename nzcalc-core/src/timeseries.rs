//! Year-indexed tables of named series.
//!
//! A [`TimeseriesTable`] is the unit of exchange between every stage of the engine.
//! Periods are integer years, unique and strictly ascending. Each column holds one
//! value per year; a missing observation is stored as NaN and it is the job of the
//! cleaning and extrapolation stages to make sure none survive into a projection.
//!
//! Tables serialise in the "split" orientation used by the dashboard:
//!
//! ```json
//! {"columns": ["Car", "Bus"], "index": [2019, 2020], "data": [[1.0, 2.0], [1.5, null]]}
//! ```

use crate::errors::{NZCalcError, NZCalcResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
pub type Year = i32;

/// The fixed, contiguous range of years a calculator projects over (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HorizonFields")]
pub struct CalculatorHorizon {
    pub first: Year,
    pub last: Year,
}

#[derive(Deserialize)]
struct HorizonFields {
    first: Year,
    last: Year,
}

impl TryFrom<HorizonFields> for CalculatorHorizon {
    type Error = NZCalcError;

    fn try_from(fields: HorizonFields) -> Result<Self, Self::Error> {
        Self::new(fields.first, fields.last)
    }
}

impl Default for CalculatorHorizon {
    fn default() -> Self {
        Self {
            first: 2019,
            last: 2050,
        }
    }
}

impl CalculatorHorizon {
    pub fn new(first: Year, last: Year) -> NZCalcResult<Self> {
        if first > last {
            return Err(NZCalcError::InvalidTable(format!(
                "horizon starts after it ends ({first} > {last})"
            )));
        }
        Ok(Self { first, last })
    }

    /// Horizon used by the ground-travel modules (2018 to 2050)
    pub fn legacy() -> Self {
        Self {
            first: 2018,
            last: 2050,
        }
    }

    /// The horizon extended back by one year, so a ramp starting in `first` has an anchor
    pub fn with_preceding_year(&self) -> Self {
        Self {
            first: self.first.saturating_sub(1),
            last: self.last,
        }
    }

    pub fn years(&self) -> Vec<Year> {
        (self.first..=self.last).collect()
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.last as i64 - self.first as i64) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    pub fn contains(&self, year: Year) -> bool {
        (self.first..=self.last).contains(&year)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Array1<FloatValue>,
}

/// Ordered periods × named categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SplitTable", into = "SplitTable")]
pub struct TimeseriesTable {
    years: Vec<Year>,
    columns: Vec<Column>,
}

impl TimeseriesTable {
    /// Create an empty table over the given years
    ///
    /// Fails if the years are not strictly ascending.
    pub fn new(years: Vec<Year>) -> NZCalcResult<Self> {
        if let Some(w) = years.windows(2).find(|w| w[0] >= w[1]) {
            return Err(NZCalcError::InvalidTable(format!(
                "years must be unique and ascending, found {} followed by {}",
                w[0], w[1]
            )));
        }
        Ok(Self {
            years,
            columns: Vec::new(),
        })
    }

    pub fn from_horizon(horizon: &CalculatorHorizon) -> Self {
        Self {
            years: horizon.years(),
            columns: Vec::new(),
        }
    }

    /// Build a table from `(name, values)` pairs
    pub fn from_columns<I, S>(years: Vec<Year>, columns: I) -> NZCalcResult<Self>
    where
        I: IntoIterator<Item = (S, Array1<FloatValue>)>,
        S: Into<String>,
    {
        let mut table = Self::new(years)?;
        for (name, values) in columns {
            table.set_column(name, values)?;
        }
        Ok(table)
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<FloatValue>)> {
        self.columns.iter().map(|c| (c.name.as_str(), &c.values))
    }

    pub fn year_index(&self, year: Year) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    pub fn column(&self, name: &str) -> NZCalcResult<&Array1<FloatValue>> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.values)
            .ok_or_else(|| NZCalcError::ColumnNotFound(name.to_string()))
    }

    pub fn get(&self, year: Year, name: &str) -> NZCalcResult<FloatValue> {
        let idx = self
            .year_index(year)
            .ok_or(NZCalcError::YearNotFound(year))?;
        Ok(self.column(name)?[idx])
    }

    /// Insert a column, replacing any existing column with the same name in place
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Array1<FloatValue>,
    ) -> NZCalcResult<()> {
        let name = name.into();
        if values.len() != self.years.len() {
            return Err(NZCalcError::InvalidTable(format!(
                "column '{}' has {} values but the table has {} years",
                name,
                values.len(),
                self.years.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> NZCalcResult<Array1<FloatValue>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| NZCalcError::ColumnNotFound(name.to_string()))?;
        Ok(self.columns.remove(idx).values)
    }

    /// A new table holding only the named columns, in the order given
    pub fn select(&self, names: &[&str]) -> NZCalcResult<Self> {
        let mut out = Self::new(self.years.clone())?;
        for name in names {
            out.set_column(*name, self.column(name)?.clone())?;
        }
        Ok(out)
    }

    /// Align the table onto another set of years.
    ///
    /// Years absent from this table become missing; years absent from `years` are dropped.
    pub fn reindex(&self, years: &[Year]) -> NZCalcResult<Self> {
        let mut out = Self::new(years.to_vec())?;
        let positions: Vec<Option<usize>> = years.iter().map(|y| self.year_index(*y)).collect();
        for column in &self.columns {
            let values = positions
                .iter()
                .map(|p| p.map_or(FloatValue::NAN, |i| column.values[i]))
                .collect();
            out.set_column(column.name.clone(), values)?;
        }
        Ok(out)
    }

    /// Sum across all columns for every year, skipping missing cells.
    ///
    /// A year where every cell is missing has a missing total rather than zero.
    pub fn row_totals(&self) -> Array1<FloatValue> {
        Array1::from_iter((0..self.years.len()).map(|i| {
            let present: Vec<FloatValue> = self
                .columns
                .iter()
                .map(|c| c.values[i])
                .filter(|v| !v.is_nan())
                .collect();
            if present.is_empty() {
                FloatValue::NAN
            } else {
                present.iter().sum()
            }
        }))
    }

    /// Names and years of any missing cells
    pub fn missing_cells(&self) -> Vec<(String, Year)> {
        self.columns
            .iter()
            .flat_map(|c| {
                c.values
                    .iter()
                    .zip(self.years.iter())
                    .filter(|(v, _)| v.is_nan())
                    .map(move |(_, y)| (c.name.clone(), *y))
            })
            .collect()
    }

    /// Multiply every cell by a constant
    pub fn scale(&self, factor: FloatValue) -> Self {
        Self {
            years: self.years.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: &c.values * factor,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> NZCalcResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> NZCalcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Running total along a series
pub fn cumulative_sum(values: &Array1<FloatValue>) -> Array1<FloatValue> {
    let mut running = 0.0;
    values.mapv(|v| {
        running += v;
        running
    })
}

/// Row-oriented wire form of a [`TimeseriesTable`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SplitTable {
    columns: Vec<String>,
    index: Vec<Year>,
    data: Vec<Vec<Option<FloatValue>>>,
}

impl TryFrom<SplitTable> for TimeseriesTable {
    type Error = NZCalcError;

    fn try_from(split: SplitTable) -> Result<Self, Self::Error> {
        if split.data.len() != split.index.len() {
            return Err(NZCalcError::InvalidTable(format!(
                "{} rows of data for {} index entries",
                split.data.len(),
                split.index.len()
            )));
        }
        if let Some((i, row)) = split
            .data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != split.columns.len())
        {
            return Err(NZCalcError::InvalidTable(format!(
                "row {} has {} values for {} columns",
                i,
                row.len(),
                split.columns.len()
            )));
        }
        let mut table = TimeseriesTable::new(split.index)?;
        for (j, name) in split.columns.into_iter().enumerate() {
            if table.has_column(&name) {
                return Err(NZCalcError::InvalidTable(format!(
                    "duplicate column '{name}'"
                )));
            }
            let values = split
                .data
                .iter()
                .map(|row| row[j].unwrap_or(FloatValue::NAN))
                .collect();
            table.set_column(name, values)?;
        }
        Ok(table)
    }
}

impl From<TimeseriesTable> for SplitTable {
    fn from(table: TimeseriesTable) -> Self {
        let data = (0..table.years.len())
            .map(|i| {
                table
                    .columns
                    .iter()
                    .map(|c| Some(c.values[i]).filter(|v| !v.is_nan()))
                    .collect()
            })
            .collect();
        Self {
            columns: table.columns.into_iter().map(|c| c.name).collect(),
            index: table.years,
            data,
        }
    }
}
