//! Staff commuting through the ground-travel derivation, with per-gas factors and population.

use approx::assert_relative_eq;
use ndarray::Array1;
use nzcalc_components::ghg::combine_ghg_factors;
use nzcalc_components::module::{run_module, DemandSource, ModuleInputs};
use nzcalc_components::parameters::HaulAmbitions;
use nzcalc_components::population::PopulationGroup;
use nzcalc_components::travel::TravelEmissions;
use nzcalc_core::cleaner::{clean, CleanOptions, RawTable};
use nzcalc_core::factors::FactorTable;
use nzcalc_core::scenario::ScenarioParameters;
use nzcalc_core::timeseries::{CalculatorHorizon, TimeseriesTable};

const COMMUTES: &str = "\
Year,Car,Bus,Walking,Underground
2018,40,20,30,10
2019,50,20,20,10
";

/// CO2 factor per combined key; the other gases are zero
const CO2_FACTORS: [(&str, f64); 8] = [
    ("carE.fElc", 0.1),
    ("carPHEV.fElc", 0.15),
    ("carIC.fFsLD", 0.2),
    ("busE.fElc", 0.05),
    ("busH2.fH2G", 0.07),
    ("busPHEV.fElc", 0.08),
    ("busIC.fFsLD", 0.1),
    ("Udg.fElc", 0.03),
];

/// Per-gas factor sheet as it arrives from the data loader
fn factor_sheet() -> String {
    let mut header = vec!["Year".to_string()];
    let mut row = Vec::new();
    for (key, co2) in CO2_FACTORS {
        for (gas, value) in [("CO2", co2), ("N2O", 0.0), ("CH4", 0.0)] {
            header.push(format!("EmF.{gas}.{key}."));
            row.push(value.to_string());
        }
    }
    let row = row.join(",");
    format!("{}\n2018,{row}\n2019,{row}\n", header.join(","))
}

fn engine_shares(horizon: &CalculatorHorizon) -> FactorTable {
    FactorTable::from_constants(
        horizon,
        [
            ("carE", 0.5),
            ("carH2", 0.0),
            ("carPHEV", 0.0),
            ("carIC", 0.5),
            ("busE", 0.5),
            ("busH2", 0.0),
            ("busPHEV", 0.0),
            ("busIC", 0.5),
        ],
    )
    .unwrap()
}

fn ambitions() -> HaulAmbitions {
    HaulAmbitions::from_toml_str(
        r#"
        demand = [1.0, 0.8, 0.6, 0.5]
        [shares]
        Car = [0.5, 0.4, 0.3, 0.2]
        Bus = [0.2, 0.3, 0.3, 0.3]
        Walking = [0.2, 0.2, 0.3, 0.4]
        Underground = [0.1, 0.1, 0.1, 0.1]
        "#,
    )
    .unwrap()
}

#[test]
fn staff_commuting_emissions() {
    let params = ScenarioParameters::ground_travel();
    let horizon = params.horizon;

    let raw_factors = RawTable::from_csv_str(&factor_sheet()).unwrap();
    let per_gas = clean(&raw_factors, &CleanOptions::default()).unwrap().table;
    let factors = combine_ghg_factors(&per_gas, &horizon).unwrap();

    let population = TimeseriesTable::from_columns(
        horizon.years(),
        [
            ("Academic", Array1::from_elem(horizon.len(), 100.0)),
            ("Research", Array1::from_elem(horizon.len(), 50.0)),
            ("Support", Array1::from_elem(horizon.len(), 50.0)),
        ],
    )
    .unwrap();
    let inputs = ModuleInputs {
        ambitions: ambitions(),
        demand: DemandSource::PerHead {
            group: PopulationGroup::Staff,
            pathways: population,
        },
        factors,
        derivation: Box::new(TravelEmissions::new(engine_shares(&horizon))),
    };

    // Each row totals 100 trips per head
    let history = RawTable::from_csv_str(COMMUTES).unwrap();
    let outputs = run_module(&history, &params, &inputs).unwrap();

    assert_relative_eq!(outputs.demand.get(2019, "Total").unwrap(), 20000.0, epsilon = 1e-6);
    assert_relative_eq!(outputs.activity.get(2019, "Car").unwrap(), 10000.0, epsilon = 1e-6);

    // Walking is split out as zero emission; buses and cars are split by engine
    assert_eq!(
        outputs.emissions.categories().collect::<Vec<_>>(),
        vec!["carE", "carPHEV", "carIC", "busE", "busH2", "busPHEV", "busIC", "Udg"]
    );
    assert_eq!(outputs.emissions.get(2019, "carPHEV").unwrap(), 0.0);
    assert_relative_eq!(outputs.emissions.get(2019, "carIC").unwrap(), 1000.0, epsilon = 1e-6);
    assert_relative_eq!(outputs.emissions.get(2019, "Udg").unwrap(), 60.0, epsilon = 1e-6);
}
