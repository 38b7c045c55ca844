//! Demand-and-shares module
//!
//! The common shape of every travel module: historical activity by category is cleaned
//! and turned into shares of the total, the total demand is projected towards its
//! ambition target (or supplied from elsewhere), each category share is projected
//! towards its own target, and activity by category is the demand times the share.
//! The chosen [`Derivation`] then turns activity into emissions.

use crate::parameters::HaulAmbitions;
use crate::population::PopulationGroup;
use ndarray::Array1;
use nzcalc_core::ambition::AmbitionMode;
use nzcalc_core::cleaner::{clean, GrowthRates, RawTable};
use nzcalc_core::errors::{NZCalcError, NZCalcResult};
use nzcalc_core::factors::{Derivation, FactorTable};
use nzcalc_core::scenario::ScenarioParameters;
use nzcalc_core::shares::{normalise, TOTAL_COLUMN};
use nzcalc_core::timeseries::{FloatValue, TimeseriesTable};
use nzcalc_core::transition::TransitionProjector;
use serde::{Deserialize, Serialize};

/// Where the total demand of a module comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DemandSource {
    /// Project the historical total towards the demand ambition
    #[default]
    Projected,
    /// Project the historical demand per head and multiply by a population group
    PerHead {
        group: PopulationGroup,
        pathways: TimeseriesTable,
    },
    /// Use a demand computed elsewhere, read from its `Total` column
    External(TimeseriesTable),
}

/// Everything a module needs apart from the historical data and the lever settings
#[derive(Debug, Serialize, Deserialize)]
pub struct ModuleInputs {
    pub ambitions: HaulAmbitions,
    #[serde(default)]
    pub demand: DemandSource,
    pub factors: FactorTable,
    pub derivation: Box<dyn Derivation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutputs {
    /// Derived emissions by factor category
    pub emissions: TimeseriesTable,
    /// Activity by category
    pub activity: TimeseriesTable,
    /// Total demand, in a single `Total` column
    pub demand: TimeseriesTable,
    /// Projected share of each category
    pub shares: TimeseriesTable,
}

fn projected_demand(
    shares: &TimeseriesTable,
    rates: &GrowthRates,
    params: &ScenarioParameters,
    inputs: &ModuleInputs,
) -> NZCalcResult<Array1<FloatValue>> {
    let years = params.horizon.years();
    if let DemandSource::External(table) = &inputs.demand {
        let demand = table.reindex(&years)?.column(TOTAL_COLUMN)?.clone();
        if let Some((year, _)) = years.iter().zip(demand.iter()).find(|(_, v)| v.is_nan()) {
            return Err(NZCalcError::DataAvailability(format!(
                "external demand in {year}"
            )));
        }
        return Ok(demand);
    }

    let bau = params.bau_pathway(shares, TOTAL_COLUMN, rates)?;
    let mut projector = TransitionProjector::new(params.horizon);
    params.demand.apply(
        &mut projector,
        TOTAL_COLUMN,
        &bau,
        &inputs.ambitions.demand,
        AmbitionMode::Percentage,
        params.base_year,
    )?;
    let demand = projector.output().column(TOTAL_COLUMN)?;

    match &inputs.demand {
        DemandSource::PerHead { group, pathways } => {
            Ok(demand * &group.multiplier(pathways, &years)?)
        }
        _ => Ok(demand.clone()),
    }
}

/// Run one module over a raw historical table
pub fn run_module(
    history: &RawTable,
    params: &ScenarioParameters,
    inputs: &ModuleInputs,
) -> NZCalcResult<ModuleOutputs> {
    let cleaned = clean(history, &params.clean_options())?;
    let shares = normalise(&cleaned.table)?;
    let shares_table = shares.table()?;
    // Rates of the shares themselves, and of the absolute total
    let rates = GrowthRates::from_table(shares_table);

    let demand = projected_demand(shares_table, &rates, params, inputs)?;

    let mut projector = TransitionProjector::new(params.horizon);
    let mut activity = TimeseriesTable::from_horizon(&params.horizon);
    for category in shares.categories() {
        let levels = inputs.ambitions.share_levels(category)?;
        let bau = params.bau_pathway(shares_table, category, &rates)?;
        params.shares.apply(
            &mut projector,
            category,
            &bau,
            levels,
            AmbitionMode::Absolute,
            params.base_year,
        )?;
        let share = projector.output().column(category)?;
        activity.set_column(category, share * &demand)?;
    }

    let emissions = inputs.derivation.derive(&activity, &inputs.factors)?;
    log::debug!(
        "Module produced {} emission series over {} years",
        emissions.categories().count(),
        emissions.len()
    );

    Ok(ModuleOutputs {
        emissions,
        activity,
        demand: TimeseriesTable::from_columns(params.horizon.years(), [(TOTAL_COLUMN, demand)])?,
        shares: projector.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aviation::{AviationEmissions, Haul};
    use ndarray::array;
    use nzcalc_core::factors::DirectFactors;
    use nzcalc_core::scenario::LeverSettings;
    use nzcalc_core::timeseries::CalculatorHorizon;

    fn history() -> RawTable {
        RawTable::from_csv_str(
            "Year,Economy Class,Business Class\n2020,80,20\n2021,160,40\n2022,-,-\n",
        )
        .unwrap()
    }

    fn params() -> ScenarioParameters {
        ScenarioParameters {
            horizon: CalculatorHorizon::new(2020, 2026).unwrap(),
            base_year: 2021,
            demand: LeverSettings::new(1.0, 2023, 2).unwrap(),
            shares: LeverSettings::new(4.0, 2023, 2).unwrap(),
            ..ScenarioParameters::default()
        }
    }

    fn ambitions() -> HaulAmbitions {
        HaulAmbitions::from_toml_str(
            r#"
            demand = [0.5, 0.5, 0.5, 0.5]
            [shares]
            "Economy Class" = [0.8, 0.9, 0.95, 1.0]
            "Business Class" = [0.2, 0.1, 0.05, 0.0]
            "#,
        )
        .unwrap()
    }

    fn inputs(demand: DemandSource) -> ModuleInputs {
        let horizon = params().horizon;
        ModuleInputs {
            ambitions: ambitions(),
            demand,
            factors: FactorTable::from_constants(
                &horizon,
                [("avilHConEcon.fFsLD", 0.1), ("avilHConBiz.fFsLD", 0.3)],
            )
            .unwrap(),
            derivation: Box::new(AviationEmissions::new(Haul::LongHaul)),
        }
    }

    #[test]
    fn projected_demand_and_shares() {
        let outputs = run_module(&history(), &params(), &inputs(DemandSource::Projected)).unwrap();

        let demand = outputs.demand.column(TOTAL_COLUMN).unwrap();
        assert_eq!(demand[0], 100.0);
        assert_eq!(demand[2], 200.0);
        // Half of the 2021 total once the ramp completes
        assert_eq!(demand[6], 100.0);

        assert_eq!(outputs.activity.get(2020, "Economy Class").unwrap(), 80.0);
        assert_eq!(outputs.activity.get(2026, "Economy Class").unwrap(), 100.0);
        assert_eq!(outputs.activity.get(2026, "Business Class").unwrap(), 0.0);
        assert_eq!(outputs.shares.get(2026, "Economy Class").unwrap(), 1.0);

        assert!((outputs.emissions.get(2020, "Business Class").unwrap() - 6.0).abs() < 1e-12);
        assert!((outputs.emissions.get(2026, "Economy Class").unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn per_head_demand() {
        let population = TimeseriesTable::from_columns(
            params().horizon.years(),
            [
                ("Academic", Array1::from_elem(7, 2.0)),
                ("Research", Array1::from_elem(7, 1.0)),
                ("Support", Array1::from_elem(7, 1.0)),
            ],
        )
        .unwrap();
        let source = DemandSource::PerHead {
            group: PopulationGroup::Staff,
            pathways: population,
        };
        let outputs = run_module(&history(), &params(), &inputs(source)).unwrap();
        let demand = outputs.demand.column(TOTAL_COLUMN).unwrap();
        assert_eq!(demand[0], 400.0);
        assert_eq!(demand[6], 400.0);
    }

    #[test]
    fn external_demand() {
        let external = TimeseriesTable::from_columns(
            params().horizon.years(),
            [(TOTAL_COLUMN, Array1::from_elem(7, 10.0))],
        )
        .unwrap();
        let outputs =
            run_module(&history(), &params(), &inputs(DemandSource::External(external))).unwrap();
        assert_eq!(outputs.activity.get(2020, "Economy Class").unwrap(), 8.0);
        assert_eq!(outputs.activity.get(2026, "Economy Class").unwrap(), 10.0);

        let short = TimeseriesTable::from_columns(vec![2020], [(TOTAL_COLUMN, array![1.0])]).unwrap();
        assert!(matches!(
            run_module(&history(), &params(), &inputs(DemandSource::External(short))),
            Err(NZCalcError::DataAvailability(_))
        ));
    }

    #[test]
    fn category_without_share_levels() {
        let history =
            RawTable::from_csv_str("Year,Economy Class,Cargo\n2020,80,20\n2021,160,40\n").unwrap();
        let mut inputs = inputs(DemandSource::Projected);
        inputs.derivation = Box::new(DirectFactors::default());
        assert!(matches!(
            run_module(&history, &params(), &inputs),
            Err(NZCalcError::UnknownCategory(ref c)) if c == "Cargo"
        ));
    }

    #[test]
    fn inputs_deserialise_from_json() {
        let json = serde_json::to_string(&inputs(DemandSource::Projected)).unwrap();
        let restored: ModuleInputs = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.ambitions, ambitions());
        assert_eq!(restored.demand, DemandSource::Projected);
        assert_eq!(
            restored.derivation.factor_key("Economy Class").unwrap(),
            "avilHConEcon.fFsLD"
        );
    }
}
