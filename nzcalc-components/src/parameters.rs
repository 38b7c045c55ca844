//! Ambition level definitions for each haul type
//!
//! Demand levels are multipliers of the base-year demand; class-share levels are
//! absolute shares of the projected demand. Definitions can be overridden from TOML:
//!
//! ```toml
//! demand = [1.1, 0.9, 0.7, 0.6]
//!
//! [shares]
//! "Economy Class" = [0.8, 0.9, 0.95, 1.0]
//! "Business Class" = [0.2, 0.1, 0.05, 0.0]
//! ```

use crate::aviation::{AviationClass, Haul};
use nzcalc_core::ambition::{check_share_levels, AmbitionLevels, N_LEVELS};
use nzcalc_core::errors::{NZCalcError, NZCalcResult};
use nzcalc_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance when checking that class shares sum to one at every level
pub const SHARE_TOLERANCE: FloatValue = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaulAmbitions {
    pub demand: AmbitionLevels,
    pub shares: BTreeMap<String, AmbitionLevels>,
}

fn class_shares(levels: [(AviationClass, [FloatValue; N_LEVELS]); 5]) -> BTreeMap<String, AmbitionLevels> {
    levels
        .into_iter()
        .map(|(class, values)| (class.category().to_string(), AmbitionLevels::new(values)))
        .collect()
}

impl HaulAmbitions {
    pub fn long_haul() -> Self {
        Self {
            demand: AmbitionLevels::new([1.1, 0.9, 0.7, 0.6]),
            shares: class_shares([
                (AviationClass::First, [0.003, 0.001, 0.0, 0.0]),
                (AviationClass::Business, [0.07, 0.03, 0.02, 0.0]),
                (AviationClass::PremiumEconomy, [0.18, 0.219, 0.2, 0.0]),
                (AviationClass::Economy, [0.745, 0.75, 0.78, 1.0]),
                (AviationClass::Unknown, [0.002, 0.0, 0.0, 0.0]),
            ]),
        }
    }

    /// Short-haul levels currently mirror the long-haul ones
    pub fn short_haul() -> Self {
        Self::long_haul()
    }

    pub fn domestic() -> Self {
        Self {
            demand: AmbitionLevels::new([0.9, 0.7, 0.5, 0.0]),
            shares: class_shares([
                (AviationClass::First, [0.003, 0.001, 0.0, 0.0]),
                (AviationClass::Business, [0.07, 0.03, 0.02, 0.01]),
                (AviationClass::PremiumEconomy, [0.18, 0.218, 0.2, 0.1]),
                (AviationClass::Economy, [0.745, 0.75, 0.779, 0.89]),
                (AviationClass::Unknown, [0.002, 0.001, 0.001, 0.0]),
            ]),
        }
    }

    pub fn for_haul(haul: Haul) -> Self {
        match haul {
            Haul::LongHaul => Self::long_haul(),
            Haul::ShortHaul => Self::short_haul(),
            Haul::Domestic => Self::domestic(),
        }
    }

    pub fn from_toml_str(text: &str) -> NZCalcResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Share definitions of one category
    pub fn share_levels(&self, category: &str) -> NZCalcResult<&AmbitionLevels> {
        self.shares
            .get(category)
            .ok_or_else(|| NZCalcError::UnknownCategory(category.to_string()))
    }

    /// Sum of the class shares at each level
    pub fn share_totals(&self) -> [FloatValue; N_LEVELS] {
        check_share_levels(&self.shares)
    }

    /// Log a warning for every level whose class shares do not sum to one
    pub fn warn_unbalanced_shares(&self) -> bool {
        let mut balanced = true;
        for (i, total) in self.share_totals().iter().enumerate() {
            if (total - 1.0).abs() > SHARE_TOLERANCE {
                log::warn!("Class shares at ambition level {} sum to {}", i + 1, total);
                balanced = false;
            }
        }
        balanced
    }
}
