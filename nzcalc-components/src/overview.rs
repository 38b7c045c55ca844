//! Summary of emissions across modules.
//!
//! Module emissions are reported in kg CO2e per category. The overview converts them
//! to tonnes, totals them per group (e.g. per haul type) and overall, and compares the
//! overall total against a baseline year and a reduction target.

use ndarray::Array1;
use nzcalc_core::aggregation::AggregationTree;
use nzcalc_core::errors::{NZCalcError, NZCalcResult};
use nzcalc_core::timeseries::{FloatValue, TimeseriesTable, Year};
use serde::{Deserialize, Serialize};

pub const KG_PER_TONNE: FloatValue = 1000.0;

/// Fractional reduction from the baseline used for the target line
pub const DEFAULT_REDUCTION: FloatValue = 0.25;

const TOTAL: &str = "Total emissions";

#[derive(Debug, Clone)]
pub struct EmissionsOverview {
    tree: AggregationTree,
    base_year: Year,
    reduction: FloatValue,
}

/// Serialisable view of an [`EmissionsOverview`], all values in tonnes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewSummary {
    pub groups: TimeseriesTable,
    pub total: Array1<FloatValue>,
    pub cumulative: Array1<FloatValue>,
    pub base_year: Year,
    pub baseline: FloatValue,
    pub target: FloatValue,
}

impl EmissionsOverview {
    pub fn new(years: Vec<Year>, base_year: Year) -> NZCalcResult<Self> {
        let mut tree = AggregationTree::new(years);
        tree.add_group(TOTAL)?;
        Ok(Self {
            tree,
            base_year,
            reduction: DEFAULT_REDUCTION,
        })
    }

    pub fn with_reduction(mut self, reduction: FloatValue) -> NZCalcResult<Self> {
        if !(0.0..=1.0).contains(&reduction) {
            return Err(NZCalcError::Error(format!(
                "reduction must lie within [0, 1], got {reduction}"
            )));
        }
        self.reduction = reduction;
        Ok(self)
    }

    /// Add the emissions of one group, in kg, to the overall total.
    ///
    /// Adding to an existing group appends its categories; each group counts once
    /// towards the total.
    pub fn add_group(&mut self, name: &str, emissions_kg: &TimeseriesTable) -> NZCalcResult<()> {
        if name == TOTAL {
            return Err(NZCalcError::InvalidAggregation(format!(
                "'{TOTAL}' is reserved for the overall total"
            )));
        }
        let is_new = !self.tree.contains(name);
        self.tree.add_table(name, emissions_kg, 1.0 / KG_PER_TONNE)?;
        if is_new {
            self.tree.link(TOTAL, name, 1.0)?;
        }
        Ok(())
    }

    /// Total of each group in tonnes, one column per group
    pub fn group_totals(&self) -> NZCalcResult<TimeseriesTable> {
        self.tree.members_table(TOTAL)
    }

    pub fn total(&self) -> NZCalcResult<Array1<FloatValue>> {
        self.tree.value(TOTAL)
    }

    pub fn cumulative(&self) -> NZCalcResult<Array1<FloatValue>> {
        self.tree.cumulative(TOTAL)
    }

    /// Overall total in the base year
    pub fn baseline(&self) -> NZCalcResult<FloatValue> {
        let idx = self
            .tree
            .years()
            .iter()
            .position(|y| *y == self.base_year)
            .ok_or(NZCalcError::YearNotFound(self.base_year))?;
        Ok(self.total()?[idx])
    }

    pub fn target(&self) -> NZCalcResult<FloatValue> {
        Ok(self.baseline()? * (1.0 - self.reduction))
    }

    pub fn summary(&self) -> NZCalcResult<OverviewSummary> {
        Ok(OverviewSummary {
            groups: self.group_totals()?,
            total: self.total()?,
            cumulative: self.cumulative()?,
            base_year: self.base_year,
            baseline: self.baseline()?,
            target: self.target()?,
        })
    }
}
