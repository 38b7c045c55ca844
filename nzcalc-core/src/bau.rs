//! Business-as-usual extrapolation over the calculator horizon.

use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::{CalculatorHorizon, FloatValue, TimeseriesTable, Year};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// How a pathway is continued past its last observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BauMode {
    /// Hold the last observed value
    #[default]
    Flat,
    /// Compound the historical mean growth rate from the last observation
    HistoricalGrowth,
}

/// Extend one category of `table` over the whole horizon.
///
/// Observed years inside the horizon are copied unchanged. Every other horizon year
/// is filled from the last observed value `v` in year `y0`: with a growth rate `g`
/// the fill is `v * (1 + g)^(year - y0)`, otherwise it is `v`.
///
/// Returns a single-column table named after the category.
pub fn bau_pathway(
    table: &TimeseriesTable,
    category: &str,
    growth_rate: Option<FloatValue>,
    horizon: &CalculatorHorizon,
) -> NZCalcResult<TimeseriesTable> {
    let years = horizon.years();
    let aligned = table.select(&[category])?.reindex(&years)?;
    let observed = aligned.column(category)?;

    let (last_idx, last_value) = observed
        .iter()
        .enumerate()
        .rev()
        .find(|(_, v)| !v.is_nan())
        .map(|(i, v)| (i, *v))
        .ok_or_else(|| NZCalcError::DataAvailability(category.to_string()))?;
    let last_year = years[last_idx];

    let growth_rate = match growth_rate {
        Some(g) if !g.is_finite() => {
            log::warn!(
                "Ignoring non-finite growth rate for '{}'; holding flat",
                category
            );
            None
        }
        other => other,
    };

    let values: Array1<FloatValue> = observed
        .iter()
        .zip(years.iter())
        .map(|(v, year)| {
            if !v.is_nan() {
                *v
            } else {
                fill(last_value, last_year, *year, growth_rate)
            }
        })
        .collect();

    TimeseriesTable::from_columns(years, [(category, values)])
}

fn fill(last_value: FloatValue, last_year: Year, year: Year, growth_rate: Option<FloatValue>) -> FloatValue {
    match growth_rate {
        Some(g) => last_value * (1.0 + g).powi(year - last_year),
        None => last_value,
    }
}
