//! Factor tables and derivations of quantities from projected activity.
//!
//! A factor table holds one series per composed key, for example the emission
//! factor `aviLHConEcon.fFsLD`. Derivations decide which key applies to each
//! category of activity and multiply the two series together.

use crate::bau::bau_pathway;
use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::{CalculatorHorizon, FloatValue, TimeseriesTable, Year};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Series of factors keyed by composed identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorTable(TimeseriesTable);

impl FactorTable {
    pub fn new(table: TimeseriesTable) -> Self {
        Self(table)
    }

    /// Constant factors repeated over every horizon year
    pub fn from_constants<I, S>(horizon: &CalculatorHorizon, factors: I) -> NZCalcResult<Self>
    where
        I: IntoIterator<Item = (S, FloatValue)>,
        S: Into<String>,
    {
        let n = horizon.len();
        let table = TimeseriesTable::from_columns(
            horizon.years(),
            factors
                .into_iter()
                .map(|(key, value)| (key, Array1::from_elem(n, value))),
        )?;
        Ok(Self(table))
    }

    pub fn table(&self) -> &TimeseriesTable {
        &self.0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.categories()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.has_column(key)
    }

    /// Factor series for `key` aligned to `years`.
    ///
    /// Fails if the key is absent or if any requested year has no factor.
    pub fn lookup(&self, key: &str, years: &[Year]) -> NZCalcResult<Array1<FloatValue>> {
        if !self.0.has_column(key) {
            return Err(NZCalcError::KeyNotFound(key.to_string()));
        }
        let column = self.0.column(key)?;
        years
            .iter()
            .map(|year| {
                let idx = self
                    .0
                    .year_index(*year)
                    .ok_or(NZCalcError::YearNotFound(*year))?;
                let value = column[idx];
                if value.is_nan() {
                    Err(NZCalcError::DataAvailability(format!(
                        "factor '{key}' in {year}"
                    )))
                } else {
                    Ok(value)
                }
            })
            .collect()
    }

    /// Value of a factor in the first year of the table
    pub fn first_value(&self, key: &str) -> NZCalcResult<FloatValue> {
        let first = *self
            .0
            .years()
            .first()
            .ok_or_else(|| NZCalcError::InvalidTable("factor table has no years".to_string()))?;
        Ok(self.lookup(key, &[first])?[0])
    }

    /// Extend every factor over the horizon by carrying its last value forward
    pub fn extend_to_horizon(&self, horizon: &CalculatorHorizon) -> NZCalcResult<Self> {
        let mut out = TimeseriesTable::from_horizon(horizon);
        for key in self.0.categories() {
            let extended = bau_pathway(&self.0, key, None, horizon)?;
            out.set_column(key, extended.column(key)?.clone())?;
        }
        Ok(Self(out))
    }
}

/// Multiply a projected pathway by a factor series, year by year
pub fn apply_factor(
    pathway: &Array1<FloatValue>,
    factor: &Array1<FloatValue>,
) -> NZCalcResult<Array1<FloatValue>> {
    if pathway.len() != factor.len() {
        return Err(NZCalcError::InvalidTable(format!(
            "pathway has {} values but factor has {}",
            pathway.len(),
            factor.len()
        )));
    }
    Ok(pathway * factor)
}

/// Derivation of a quantity (typically emissions) from activity by category.
///
/// Implementations are serialisable so that scenario files can name the derivation to run.
#[typetag::serde(tag = "type")]
pub trait Derivation: Debug {
    /// Factor key for a category of activity
    fn factor_key(&self, category: &str) -> NZCalcResult<String>;

    /// Categories of `activity` that produce no derived quantity
    fn is_excluded(&self, _category: &str) -> bool {
        false
    }

    /// Restate activity in the categories that factors are defined for.
    ///
    /// The default keeps the activity as-is.
    fn expand_activity(&self, activity: &TimeseriesTable) -> NZCalcResult<TimeseriesTable> {
        Ok(activity.clone())
    }

    /// Multiply each category of the expanded activity by its factor series
    fn derive(
        &self,
        activity: &TimeseriesTable,
        factors: &FactorTable,
    ) -> NZCalcResult<TimeseriesTable> {
        let activity = self.expand_activity(activity)?;
        let mut out = TimeseriesTable::new(activity.years().to_vec())?;
        for (category, values) in activity.iter() {
            if self.is_excluded(category) {
                continue;
            }
            let key = self.factor_key(category)?;
            let factor = factors.lookup(&key, activity.years())?;
            out.set_column(category, apply_factor(values, &factor)?)?;
        }
        Ok(out)
    }
}

/// Factors keyed by the category name, optionally wrapped in a prefix and suffix
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectFactors {
    pub prefix: String,
    pub suffix: String,
}

#[typetag::serde]
impl Derivation for DirectFactors {
    fn factor_key(&self, category: &str) -> NZCalcResult<String> {
        Ok(format!("{}{}{}", self.prefix, category, self.suffix))
    }
}
