//! Population groups that scale unit travel demand.

use ndarray::Array1;
use nzcalc_core::errors::{NZCalcError, NZCalcResult};
use nzcalc_core::timeseries::{FloatValue, TimeseriesTable, Year};
use serde::{Deserialize, Serialize};

const STUDENT_CATEGORIES: [&str; 5] = ["UG", "PGT", "PGR", "Part Time PGT", "Part Time PGR"];
const FEE_STATUSES: [&str; 2] = ["Home", "Overseas"];
const STAFF_CATEGORIES: [&str; 3] = ["Academic", "Research", "Support"];

/// Which part of the population a demand is expressed per head of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PopulationGroup {
    #[default]
    Staff,
    AllStudents,
    HomeStudents,
    OverseasStudents,
}

impl PopulationGroup {
    /// Population pathway columns belonging to the group
    pub fn categories(&self) -> Vec<String> {
        let students = |fees: &[&str]| -> Vec<String> {
            STUDENT_CATEGORIES
                .iter()
                .flat_map(|s| fees.iter().map(move |f| format!("{s} {f}")))
                .collect()
        };
        match self {
            PopulationGroup::Staff => STAFF_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            PopulationGroup::AllStudents => students(&FEE_STATUSES),
            PopulationGroup::HomeStudents => students(&FEE_STATUSES[..1]),
            PopulationGroup::OverseasStudents => students(&FEE_STATUSES[1..]),
        }
    }

    /// Total population of the group in each of `years`
    pub fn multiplier(
        &self,
        population: &TimeseriesTable,
        years: &[Year],
    ) -> NZCalcResult<Array1<FloatValue>> {
        let aligned = population.reindex(years)?;
        let mut total: Array1<FloatValue> = Array1::zeros(years.len());
        for category in self.categories() {
            total = total + aligned.column(&category)?;
        }
        if let Some((year, _)) = years.iter().zip(total.iter()).find(|(_, v)| v.is_nan()) {
            return Err(NZCalcError::DataAvailability(format!(
                "population for {self:?} in {year}"
            )));
        }
        Ok(total)
    }
}
