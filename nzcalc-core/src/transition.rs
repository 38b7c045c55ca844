//! Blending of business-as-usual pathways into ambition targets.
//!
//! For a ramp starting in year `s` with a duration of `n` years, each year `y` of the
//! horizon falls into one of three regimes:
//!
//! - `y < s`: the business-as-usual value is kept
//! - `s <= y < s + n`: the value moves geometrically from the anchor `a = BaU(s - 1)`
//!   towards the target `T`, `a * (1 + r)^(y - s + 1)` with `r = (T / a)^(1 / n) - 1`
//! - `y >= s + n`: the target is held
//!
//! The rate is computed once from the anchor so the final ramp year lands on the target.
//! A zero anchor gives a rate of zero (the pathway stays at zero until the target is held).

use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::{CalculatorHorizon, FloatValue, TimeseriesTable, Year};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Start and duration of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RampFields")]
pub struct Ramp {
    /// First year that departs from business-as-usual
    pub start: Year,
    /// Number of years taken to reach the target
    pub speed: u32,
}

#[derive(Deserialize)]
struct RampFields {
    start: Year,
    speed: u32,
}

impl TryFrom<RampFields> for Ramp {
    type Error = NZCalcError;

    fn try_from(fields: RampFields) -> Result<Self, Self::Error> {
        Self::new(fields.start, fields.speed)
    }
}

impl Ramp {
    pub fn new(start: Year, speed: u32) -> NZCalcResult<Self> {
        if speed < 1 {
            return Err(NZCalcError::InvalidRampSpeed(speed));
        }
        Ok(Self { start, speed })
    }

    /// First year at which the target is held
    pub fn end(&self) -> Year {
        self.start + self.speed as Year
    }

    pub fn regime(&self, year: Year) -> Regime {
        if year < self.start {
            Regime::Unchanged
        } else if year >= self.end() {
            Regime::HeldAtTarget
        } else {
            Regime::Transition
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Unchanged,
    Transition,
    HeldAtTarget,
}

/// Accumulates projected pathways, one category at a time, for a single scenario run.
#[derive(Debug, Clone)]
pub struct TransitionProjector {
    horizon: CalculatorHorizon,
    output: TimeseriesTable,
}

impl TransitionProjector {
    pub fn new(horizon: CalculatorHorizon) -> Self {
        Self {
            horizon,
            output: TimeseriesTable::from_horizon(&horizon),
        }
    }

    pub fn horizon(&self) -> &CalculatorHorizon {
        &self.horizon
    }

    /// Project one category and store it in the output, replacing any earlier projection.
    ///
    /// `bau` must hold a `category` column covering every horizon year, plus the year
    /// before the ramp start if any horizon year falls within the ramp.
    pub fn project(
        &mut self,
        category: &str,
        bau: &TimeseriesTable,
        target: FloatValue,
        ramp: Ramp,
    ) -> NZCalcResult<&Array1<FloatValue>> {
        let values = transition_pathway(category, bau, target, ramp, &self.horizon)?;
        self.output.set_column(category, values)?;
        self.output.column(category)
    }

    pub fn output(&self) -> &TimeseriesTable {
        &self.output
    }

    pub fn finish(self) -> TimeseriesTable {
        self.output
    }
}

/// Blend one category's business-as-usual pathway into `target` over the horizon
pub fn transition_pathway(
    category: &str,
    bau: &TimeseriesTable,
    target: FloatValue,
    ramp: Ramp,
    horizon: &CalculatorHorizon,
) -> NZCalcResult<Array1<FloatValue>> {
    let invalid = |reason: String| NZCalcError::InvalidTransition {
        category: category.to_string(),
        reason,
    };
    if !target.is_finite() || target < 0.0 {
        return Err(invalid(format!(
            "target must be finite and non-negative, got {target}"
        )));
    }
    // Re-validate in case the ramp was built without `Ramp::new`
    let ramp = Ramp::new(ramp.start, ramp.speed)?;

    let mut rate: Option<FloatValue> = None;
    let mut anchor = FloatValue::NAN;
    let mut values = Vec::with_capacity(horizon.len());
    for year in horizon.years() {
        let value = match ramp.regime(year) {
            Regime::Unchanged => bau.get(year, category)?,
            Regime::HeldAtTarget => target,
            Regime::Transition => {
                let r = match rate {
                    Some(r) => r,
                    None => {
                        anchor = bau.get(ramp.start - 1, category)?;
                        let r = geometric_rate(anchor, target, ramp.speed)
                            .map_err(|reason| invalid(reason))?;
                        log::debug!(
                            "'{}' ramps from {} in {} to {} at rate {}",
                            category,
                            anchor,
                            ramp.start - 1,
                            target,
                            r
                        );
                        rate = Some(r);
                        r
                    }
                };
                let steps = year - ramp.start + 1;
                (anchor * (1.0 + r).powi(steps)).max(0.0)
            }
        };
        if value.is_nan() {
            return Err(NZCalcError::DataAvailability(format!(
                "{category} (business-as-usual value missing in {year})"
            )));
        }
        values.push(value);
    }
    Ok(Array1::from(values))
}

/// Constant per-step rate taking `anchor` to `target` in `speed` steps
fn geometric_rate(anchor: FloatValue, target: FloatValue, speed: u32) -> Result<FloatValue, String> {
    if anchor.is_nan() {
        return Err("anchor value is missing".to_string());
    }
    if anchor == 0.0 {
        return Ok(0.0);
    }
    let ratio = target / anchor;
    if ratio < 0.0 {
        return Err(format!(
            "cannot move geometrically from {anchor} to {target}"
        ));
    }
    Ok(ratio.powf(1.0 / speed as FloatValue) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use ndarray::array;

    fn bau() -> TimeseriesTable {
        TimeseriesTable::from_columns(
            vec![2020, 2021, 2022, 2023, 2024, 2025, 2026],
            [("Total", array![100.0, 110.0, 121.0, 133.1, 146.41, 161.051, 177.1561])],
        )
        .unwrap()
    }

    fn horizon() -> CalculatorHorizon {
        CalculatorHorizon::new(2020, 2026).unwrap()
    }

    #[test]
    fn regimes() {
        let ramp = Ramp::new(2024, 2).unwrap();
        assert_eq!(ramp.regime(2023), Regime::Unchanged);
        assert_eq!(ramp.regime(2024), Regime::Transition);
        assert_eq!(ramp.regime(2025), Regime::Transition);
        assert_eq!(ramp.regime(2026), Regime::HeldAtTarget);
        assert_eq!(ramp.end(), 2026);
    }

    #[test]
    fn zero_speed_is_rejected() {
        assert!(matches!(
            Ramp::new(2024, 0),
            Err(NZCalcError::InvalidRampSpeed(0))
        ));
        assert!(serde_json::from_str::<Ramp>(r#"{"start": 2024, "speed": 0}"#).is_err());
    }

    #[test]
    fn geometric_path_to_target() {
        let ramp = Ramp::new(2024, 2).unwrap();
        let values = transition_pathway("Total", &bau(), 150.0, ramp, &horizon()).unwrap();

        // Unchanged before the ramp
        assert_eq!(values[3], 133.1);
        // Geometric steps from 133.1
        let r = (150.0_f64 / 133.1).sqrt() - 1.0;
        assert!(is_close!(values[4], 133.1 * (1.0 + r)));
        assert!(is_close!(values[5], 150.0));
        // Held
        assert_eq!(values[6], 150.0);
    }

    #[test]
    fn zero_anchor_stays_at_zero() {
        let table = TimeseriesTable::from_columns(
            vec![2020, 2021, 2022, 2023],
            [("Bus", array![0.0, 0.0, 0.0, 0.0])],
        )
        .unwrap();
        let horizon = CalculatorHorizon::new(2020, 2023).unwrap();
        let ramp = Ramp::new(2021, 2).unwrap();
        let values = transition_pathway("Bus", &table, 0.3, ramp, &horizon).unwrap();
        assert_eq!(values, array![0.0, 0.0, 0.0, 0.3]);
    }

    #[test]
    fn zero_target_is_reached() {
        let ramp = Ramp::new(2021, 3).unwrap();
        let values = transition_pathway("Total", &bau(), 0.0, ramp, &horizon()).unwrap();
        assert_eq!(values[0], 100.0);
        assert!(values.iter().all(|v| *v >= 0.0));
        assert_eq!(values[3], 0.0);
        assert_eq!(values[6], 0.0);
    }

    #[test]
    fn anchor_outside_bau_fails() {
        let ramp = Ramp::new(2020, 2).unwrap();
        assert!(matches!(
            transition_pathway("Total", &bau(), 150.0, ramp, &horizon()),
            Err(NZCalcError::YearNotFound(2019))
        ));
    }

    #[test]
    fn ramp_after_horizon_is_pure_bau() {
        let ramp = Ramp::new(2040, 5).unwrap();
        let values = transition_pathway("Total", &bau(), 150.0, ramp, &horizon()).unwrap();
        assert_eq!(&values, bau().column("Total").unwrap());
    }

    #[test]
    fn negative_target_is_rejected() {
        let ramp = Ramp::new(2024, 2).unwrap();
        assert!(matches!(
            transition_pathway("Total", &bau(), -1.0, ramp, &horizon()),
            Err(NZCalcError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn projector_accumulates_columns() {
        let mut projector = TransitionProjector::new(horizon());
        let ramp = Ramp::new(2024, 2).unwrap();
        projector.project("Total", &bau(), 150.0, ramp).unwrap();

        let mut other = bau();
        other.set_column("Other", array![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        projector.project("Other", &other, 2.0, ramp).unwrap();
        // Re-projecting a category replaces it
        projector.project("Total", &bau(), 120.0, ramp).unwrap();

        let output = projector.finish();
        assert_eq!(output.categories().collect::<Vec<_>>(), vec!["Total", "Other"]);
        assert_eq!(output.get(2026, "Total").unwrap(), 120.0);
        assert_eq!(output.get(2026, "Other").unwrap(), 2.0);
    }
}
