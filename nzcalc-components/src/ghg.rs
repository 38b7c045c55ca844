//! Combination of per-gas emission factors into CO2-equivalent factors.
//!
//! Source factor tables have one column per gas and factor key, named
//! `EmF.<gas>.<key>.<fuel>.` (the fuel part may be empty, e.g. `EmF.CO2.Taxi.`).
//! The combined table has one column per `<key>.<fuel>` (or `<key>` without a fuel)
//! holding the sum over [`GASES`].

use ndarray::Array1;
use nzcalc_core::errors::{NZCalcError, NZCalcResult};
use nzcalc_core::factors::FactorTable;
use nzcalc_core::timeseries::{CalculatorHorizon, FloatValue, TimeseriesTable};

/// Gases summed into each combined factor
pub const GASES: [&str; 3] = ["CO2", "N2O", "CH4"];

const PREFIX: &str = "EmF";

/// Combined factor key of a per-gas column name
pub fn combined_key(column: &str) -> NZCalcResult<String> {
    let parts: Vec<&str> = column.split('.').collect();
    match parts.as_slice() {
        [prefix, _gas, key, fuel, ..] if *prefix == PREFIX && !key.is_empty() => {
            if fuel.is_empty() {
                Ok(key.to_string())
            } else {
                Ok(format!("{key}.{fuel}"))
            }
        }
        _ => Err(NZCalcError::InvalidTable(format!(
            "'{column}' is not a per-gas emission factor column"
        ))),
    }
}

fn gas_column(gas: &str, key: &str) -> String {
    format!("{PREFIX}.{gas}.{key}.")
}

/// Extend every per-gas factor over the horizon and sum the gases of each key
pub fn combine_ghg_factors(
    table: &TimeseriesTable,
    horizon: &CalculatorHorizon,
) -> NZCalcResult<FactorTable> {
    let extended = FactorTable::new(table.clone()).extend_to_horizon(horizon)?;

    let mut keys: Vec<String> = Vec::new();
    for column in table.categories() {
        let key = combined_key(column)?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let mut combined = TimeseriesTable::from_horizon(horizon);
    for key in keys {
        let mut total: Array1<FloatValue> = Array1::zeros(horizon.len());
        for gas in GASES {
            let column = gas_column(gas, &key);
            let values = extended
                .table()
                .column(&column)
                .map_err(|_| NZCalcError::KeyNotFound(column.clone()))?;
            total = total + values;
        }
        combined.set_column(key, total)?;
    }
    log::debug!(
        "Combined {} per-gas factors into {} keys",
        table.categories().count(),
        combined.categories().count()
    );
    Ok(FactorTable::new(combined))
}
