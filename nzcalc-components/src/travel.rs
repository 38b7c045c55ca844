//! Ground travel emissions
//!
//! Activity is recorded by travel mode (Car, Bus, Train, ...). Cars, buses and trains are
//! split into engine types using the share of each engine in the first year of the
//! engine-share table; the remaining modes map onto a single factor category.
//! The factor for a mode-engine is keyed by the mode-engine name plus a fuel suffix.

use nzcalc_core::errors::NZCalcResult;
use nzcalc_core::factors::{Derivation, FactorTable};
use nzcalc_core::timeseries::TimeseriesTable;
use serde::{Deserialize, Serialize};

/// Category of aviation activity inside ground-travel data, handled by [`crate::aviation`]
pub const AVIATION_CATEGORY: &str = "Aviation";

const ROAD_ENGINES: [&str; 4] = ["E", "H2", "PHEV", "IC"];
const RAIL_ENGINES: [&str; 2] = ["trnPE", "trnPIC"];

/// Mode-engines with no emissions
pub const ZERO_EMISSION: [&str; 4] = ["Bicycle", "Walking", "Other", "carH2"];

const ELECTRIC: [&str; 7] = ["Udg", "busE", "carE", "trnPE", "busPHEV", "carPHEV", "dlr"];
const HYDROGEN: [&str; 2] = ["busH2", "carH2"];

/// Mode-engine categories that a travel mode is split into
pub fn mode_engines(mode: &str) -> Vec<String> {
    match mode {
        "Car" | "Bus" => ROAD_ENGINES
            .iter()
            .map(|engine| format!("{}{}", mode.to_lowercase(), engine))
            .collect(),
        "National Rail (Train)" | "Train" => RAIL_ENGINES.iter().map(|e| e.to_string()).collect(),
        "Underground" => vec!["Udg".to_string()],
        "Motorcycle" => vec!["MtrCyc".to_string()],
        "Light Rail" => vec!["dlr".to_string()],
        other => vec![other.to_string()],
    }
}

/// Suffix naming the fuel of a mode-engine's emission factor
pub fn fuel_suffix(mode_engine: &str) -> &'static str {
    if ELECTRIC.contains(&mode_engine) {
        ".fElc"
    } else if mode_engine == "Taxi" {
        ""
    } else if HYDROGEN.contains(&mode_engine) {
        ".fH2G"
    } else if mode_engine == "Coach" {
        ".fFsLP"
    } else {
        ".fFsLD"
    }
}

/// Split activity by mode into activity by mode-engine.
///
/// Modes that map to several engines are weighted by the engine's share; a mode that
/// maps to a single category keeps its activity unchanged. Aviation is left out.
pub fn split_mode_engines(
    activity: &TimeseriesTable,
    engine_shares: &FactorTable,
) -> NZCalcResult<TimeseriesTable> {
    let mut out = TimeseriesTable::new(activity.years().to_vec())?;
    for (mode, values) in activity.iter() {
        if mode == AVIATION_CATEGORY {
            continue;
        }
        let engines = mode_engines(mode);
        if let [single] = engines.as_slice() {
            out.set_column(single.as_str(), values.clone())?;
            continue;
        }
        for engine in engines {
            let share = engine_shares.first_value(&engine)?;
            log::debug!("{} share of '{}' activity: {}", engine, mode, share);
            out.set_column(engine, values * share)?;
        }
    }
    Ok(out)
}

/// Ground travel activity by mode multiplied by the emission factor of each mode-engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelEmissions {
    pub engine_shares: FactorTable,
}

impl TravelEmissions {
    pub fn new(engine_shares: FactorTable) -> Self {
        Self { engine_shares }
    }
}

#[typetag::serde]
impl Derivation for TravelEmissions {
    fn factor_key(&self, category: &str) -> NZCalcResult<String> {
        Ok(format!("{}{}", category, fuel_suffix(category)))
    }

    fn is_excluded(&self, category: &str) -> bool {
        ZERO_EMISSION.contains(&category)
    }

    fn expand_activity(&self, activity: &TimeseriesTable) -> NZCalcResult<TimeseriesTable> {
        split_mode_engines(activity, &self.engine_shares)
    }
}
