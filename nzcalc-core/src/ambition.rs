//! Ambition levels and interpolation of scenario targets.
//!
//! Each category defines a target for the four discrete ambition levels. The dashboard
//! lets the user pick any level in `[1, 4]`, including fractional values, and the target
//! for a fractional level is the linear blend of the two bracketing integer levels:
//!
//! $$ target = (\lceil L \rceil - L) \cdot v_{\lfloor L \rfloor} + (L - \lfloor L \rfloor) \cdot v_{\lceil L \rceil} $$
//!
//! An integer level `L` brackets as `(L, L + 1)` so the blend collapses onto `v_L`,
//! and level 4 is read directly since there is no level 5.

use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of discrete ambition levels
pub const N_LEVELS: usize = 4;

/// How the values of an [`AmbitionLevels`] definition are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmbitionMode {
    /// Values are multipliers of the base-year value
    Percentage,
    /// Values are used as-is
    Absolute,
}

/// A selected ambition level, guaranteed to lie in `[1, 4]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "FloatValue", into = "FloatValue")]
pub struct AmbitionLevel(pub(crate) FloatValue);

impl AmbitionLevel {
    pub const MIN: FloatValue = 1.0;
    pub const MAX: FloatValue = N_LEVELS as FloatValue;

    pub fn new(level: FloatValue) -> NZCalcResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(NZCalcError::AmbitionLevelOutOfRange(level))
        }
    }

    pub fn value(&self) -> FloatValue {
        self.0
    }

    /// Integer levels bracketing this one as `(lower, upper)`.
    ///
    /// An integer level is its own lower bound with `level + 1` above it.
    pub fn bounds(&self) -> (usize, usize) {
        let lower = self.0.floor() as usize;
        let upper = self.0.ceil() as usize;
        if upper == lower {
            (lower, upper + 1)
        } else {
            (lower, upper)
        }
    }
}

impl TryFrom<FloatValue> for AmbitionLevel {
    type Error = NZCalcError;

    fn try_from(value: FloatValue) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AmbitionLevel> for FloatValue {
    fn from(level: AmbitionLevel) -> Self {
        level.0
    }
}

/// Target values for ambition levels 1 to 4 of one category.
///
/// Serialised as a four element list, e.g. `demand = [1.1, 0.9, 0.7, 0.6]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmbitionLevels([FloatValue; N_LEVELS]);

impl AmbitionLevels {
    pub const fn new(values: [FloatValue; N_LEVELS]) -> Self {
        Self(values)
    }

    /// Defined value at an integer level (1-based)
    pub fn at(&self, level: usize) -> Option<FloatValue> {
        level
            .checked_sub(1)
            .and_then(|idx| self.0.get(idx))
            .copied()
    }

    /// Translate the definition into target units
    pub fn mapped(&self, base_value: FloatValue, mode: AmbitionMode) -> Self {
        match mode {
            AmbitionMode::Percentage => Self(self.0.map(|v| v * base_value)),
            AmbitionMode::Absolute => *self,
        }
    }

    /// Target value for a (possibly fractional) level
    pub fn target(
        &self,
        level: AmbitionLevel,
        base_value: FloatValue,
        mode: AmbitionMode,
    ) -> FloatValue {
        let mapped = self.mapped(base_value, mode);
        if level.value() == AmbitionLevel::MAX {
            return mapped.0[N_LEVELS - 1];
        }
        let (lower, upper) = level.bounds();
        // Both bounds lie within 1..=4 once level 4 is excluded
        let v_lower = mapped.0[lower - 1];
        let v_upper = mapped.0[upper - 1];
        (upper as FloatValue - level.value()) * v_lower
            + (level.value() - lower as FloatValue) * v_upper
    }
}

/// Sum of the class-share definitions at each level.
///
/// Shares across all categories are expected to total one at every level.
pub fn check_share_levels(levels: &BTreeMap<String, AmbitionLevels>) -> [FloatValue; N_LEVELS] {
    let mut totals = [0.0; N_LEVELS];
    for definition in levels.values() {
        for (total, value) in totals.iter_mut().zip(definition.0.iter()) {
            *total += value;
        }
    }
    totals
}
