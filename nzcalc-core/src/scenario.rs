//! Scenario parameters supplied by the dashboard.
//!
//! Parameters are immutable once built and are passed explicitly into each run,
//! so independent scenario runs never share state. They can be written as TOML:
//!
//! ```toml
//! base_year = 2022
//! capture_rate_pct = 80.0
//! bau = "Flat"
//!
//! [horizon]
//! first = 2019
//! last = 2050
//!
//! [demand]
//! level = 2.5
//! ramp = { start = 2024, speed = 2 }
//!
//! [shares]
//! level = 1
//! ramp = { start = 2024, speed = 2 }
//! ```

use crate::ambition::{AmbitionLevel, AmbitionLevels, AmbitionMode};
use crate::bau::{bau_pathway, BauMode};
use crate::cleaner::{CleanOptions, GrowthRates};
use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::{CalculatorHorizon, FloatValue, TimeseriesTable, Year};
use crate::transition::{Ramp, TransitionProjector};
use serde::{Deserialize, Serialize};

/// Position of one dashboard lever: the selected ambition and how it is reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeverSettings {
    pub level: AmbitionLevel,
    pub ramp: Ramp,
}

impl LeverSettings {
    pub fn new(level: FloatValue, start: Year, speed: u32) -> NZCalcResult<Self> {
        Ok(Self {
            level: AmbitionLevel::new(level)?,
            ramp: Ramp::new(start, speed)?,
        })
    }

    /// Interpolated target for a category whose business-as-usual pathway is `bau`.
    ///
    /// In percentage mode the level definitions scale the pathway's value in `base_year`.
    pub fn target(
        &self,
        category: &str,
        bau: &TimeseriesTable,
        levels: &AmbitionLevels,
        mode: AmbitionMode,
        base_year: Year,
    ) -> NZCalcResult<FloatValue> {
        let base_value = match mode {
            AmbitionMode::Percentage => {
                let v = bau.get(base_year, category)?;
                if v.is_nan() {
                    return Err(NZCalcError::DataAvailability(format!(
                        "{category} in base year {base_year}"
                    )));
                }
                v
            }
            AmbitionMode::Absolute => 1.0,
        };
        Ok(levels.target(self.level, base_value, mode))
    }

    /// Project one category into `projector` and return its target
    pub fn apply(
        &self,
        projector: &mut TransitionProjector,
        category: &str,
        bau: &TimeseriesTable,
        levels: &AmbitionLevels,
        mode: AmbitionMode,
        base_year: Year,
    ) -> NZCalcResult<FloatValue> {
        let target = self.target(category, bau, levels, mode, base_year)?;
        log::debug!(
            "Projecting '{}' to {} (level {}, {:?} mode)",
            category,
            target,
            self.level.value(),
            mode
        );
        projector.project(category, bau, target, self.ramp)?;
        Ok(target)
    }
}

/// All parameters of one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParameters {
    pub horizon: CalculatorHorizon,
    /// Year whose value anchors percentage-mode ambition levels
    pub base_year: Year,
    /// How business-as-usual pathways continue past the data
    pub bau: BauMode,
    /// Share of true activity captured by the historical data, in percent
    pub capture_rate_pct: FloatValue,
    /// Lever acting on the overall demand
    pub demand: LeverSettings,
    /// Lever acting on the split of demand between categories
    pub shares: LeverSettings,
}

/// Defaults of the aviation calculator: horizon 2019 to 2050, percentage demand targets
/// anchored on 2022, and both levers ramping over two years from 2024
impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            horizon: CalculatorHorizon::default(),
            base_year: 2022,
            bau: BauMode::Flat,
            capture_rate_pct: 100.0,
            demand: LeverSettings {
                level: AmbitionLevel(1.0),
                ramp: Ramp {
                    start: 2024,
                    speed: 2,
                },
            },
            shares: LeverSettings {
                level: AmbitionLevel(1.0),
                ramp: Ramp {
                    start: 2024,
                    speed: 2,
                },
            },
        }
    }
}

impl ScenarioParameters {
    /// Defaults of the ground-travel calculators, which start in 2018 and ramp more slowly
    pub fn ground_travel() -> Self {
        Self {
            horizon: CalculatorHorizon::legacy(),
            base_year: 2018,
            demand: LeverSettings {
                level: AmbitionLevel(1.0),
                ramp: Ramp {
                    start: 2025,
                    speed: 10,
                },
            },
            shares: LeverSettings {
                level: AmbitionLevel(1.0),
                ramp: Ramp {
                    start: 2035,
                    speed: 5,
                },
            },
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> NZCalcResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            capture_rate_pct: self.capture_rate_pct,
        }
    }

    /// Growth rate to extrapolate `category` with, according to [`ScenarioParameters::bau`]
    pub fn growth_rate(
        &self,
        rates: &GrowthRates,
        category: &str,
    ) -> NZCalcResult<Option<FloatValue>> {
        match self.bau {
            BauMode::Flat => Ok(None),
            BauMode::HistoricalGrowth => {
                let rate = rates.rate(category)?;
                if rate.is_none() {
                    log::warn!(
                        "No growth rate available for '{}'; carrying forward flat",
                        category
                    );
                }
                Ok(rate)
            }
        }
    }

    /// Business-as-usual pathway for one category of `table`.
    ///
    /// The pathway also covers the year before the horizon, which anchors a ramp
    /// starting in the first horizon year.
    pub fn bau_pathway(
        &self,
        table: &TimeseriesTable,
        category: &str,
        rates: &GrowthRates,
    ) -> NZCalcResult<TimeseriesTable> {
        let growth_rate = self.growth_rate(rates, category)?;
        bau_pathway(table, category, growth_rate, &self.horizon.with_preceding_year())
    }
}
