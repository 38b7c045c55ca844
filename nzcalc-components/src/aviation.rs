//! Aviation emissions by haul and seating class
//!
//! Each seating class of a haul has its own consumption-based emission factor,
//! keyed as `avi<haul>Con<class>.fFsLD`, e.g. `avilHConEcon.fFsLD` for long-haul economy.

use nzcalc_core::errors::{NZCalcError, NZCalcResult};
use nzcalc_core::factors::Derivation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fuel suffix shared by all aviation factors
const AVIATION_FUEL: &str = ".fFsLD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AviationClass {
    First,
    Business,
    PremiumEconomy,
    Economy,
    Unknown,
}

impl AviationClass {
    pub const ALL: [AviationClass; 5] = [
        AviationClass::First,
        AviationClass::Business,
        AviationClass::PremiumEconomy,
        AviationClass::Economy,
        AviationClass::Unknown,
    ];

    /// Column name used by the historical flight data
    pub fn category(&self) -> &'static str {
        match self {
            AviationClass::First => "First Class",
            AviationClass::Business => "Business Class",
            AviationClass::PremiumEconomy => "Premium Economy Class",
            AviationClass::Economy => "Economy Class",
            AviationClass::Unknown => "Unknown",
        }
    }

    pub fn from_category(category: &str) -> NZCalcResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.category() == category)
            .ok_or_else(|| NZCalcError::UnknownCategory(category.to_string()))
    }

    /// Abbreviation used inside emission factor keys
    pub fn abbreviation(&self) -> &'static str {
        match self {
            AviationClass::First => "First",
            AviationClass::Business => "Biz",
            AviationClass::PremiumEconomy => "Prem",
            AviationClass::Economy => "Econ",
            AviationClass::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AviationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Haul {
    LongHaul,
    ShortHaul,
    Domestic,
}

impl Haul {
    pub const ALL: [Haul; 3] = [Haul::LongHaul, Haul::ShortHaul, Haul::Domestic];

    pub fn code(&self) -> &'static str {
        match self {
            Haul::LongHaul => "lH",
            Haul::ShortHaul => "sH",
            Haul::Domestic => "dom",
        }
    }

    /// Display label, also used as the group name in emissions overviews
    pub fn label(&self) -> &'static str {
        match self {
            Haul::LongHaul => "Long Haul",
            Haul::ShortHaul => "Short Haul",
            Haul::Domestic => "Domestic",
        }
    }
}

impl fmt::Display for Haul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn emission_factor_key(haul: Haul, class: AviationClass) -> String {
    format!(
        "avi{}Con{}{}",
        haul.code(),
        class.abbreviation(),
        AVIATION_FUEL
    )
}

/// Passenger activity by seating class multiplied by the class emission factor of one haul
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AviationEmissions {
    pub haul: Haul,
}

impl AviationEmissions {
    pub fn new(haul: Haul) -> Self {
        Self { haul }
    }
}

#[typetag::serde]
impl Derivation for AviationEmissions {
    fn factor_key(&self, category: &str) -> NZCalcResult<String> {
        let class = AviationClass::from_category(category)?;
        Ok(emission_factor_key(self.haul, class))
    }
}
