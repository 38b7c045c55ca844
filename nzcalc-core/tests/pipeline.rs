//! End-to-end projection passes through the core engine.

use approx::assert_relative_eq;
use nzcalc_core::ambition::{AmbitionLevel, AmbitionLevels, AmbitionMode};
use nzcalc_core::bau::bau_pathway;
use nzcalc_core::cleaner::{clean, CleanOptions, RawTable, RawValue};
use nzcalc_core::factors::{DirectFactors, Derivation, FactorTable};
use nzcalc_core::scenario::LeverSettings;
use nzcalc_core::shares::{normalise, TOTAL_COLUMN};
use nzcalc_core::timeseries::{CalculatorHorizon, TimeseriesTable};
use nzcalc_core::transition::{Ramp, TransitionProjector};

fn single_category_history() -> RawTable {
    let mut raw = RawTable::new(vec!["Flights".to_string()]);
    for (year, value) in [(2020, 100.0), (2021, 110.0), (2022, 121.0)] {
        raw.push_row(year, vec![RawValue::Number(value)]).unwrap();
    }
    raw
}

#[test]
fn growth_extrapolation_then_ramp_to_absolute_target() {
    let horizon = CalculatorHorizon::new(2020, 2030).unwrap();
    let cleaned = clean(&single_category_history(), &CleanOptions::default()).unwrap();
    let rate = cleaned.growth_rates.rate("Flights").unwrap();
    assert_relative_eq!(rate.unwrap(), 0.1, epsilon = 1e-12);

    let bau = bau_pathway(&cleaned.table, "Flights", rate, &horizon).unwrap();
    assert_relative_eq!(bau.get(2023, "Flights").unwrap(), 133.1, epsilon = 1e-9);

    let levels = AmbitionLevels::new([200.0, 150.0, 100.0, 50.0]);
    let level = AmbitionLevel::new(2.0).unwrap();
    let target = levels.target(level, f64::NAN, AmbitionMode::Absolute);
    assert_eq!(target, 150.0);

    let mut projector = TransitionProjector::new(horizon);
    projector
        .project("Flights", &bau, target, Ramp::new(2024, 2).unwrap())
        .unwrap();
    let projected = projector.finish();

    let anchor = bau.get(2023, "Flights").unwrap();
    let r = (150.0 / anchor).powf(0.5) - 1.0;
    assert_eq!(projected.get(2023, "Flights").unwrap(), anchor);
    assert_relative_eq!(
        projected.get(2024, "Flights").unwrap(),
        anchor * (1.0 + r),
        epsilon = 1e-9
    );
    assert_relative_eq!(projected.get(2025, "Flights").unwrap(), 150.0, epsilon = 1e-9);
    for year in 2026..=2030 {
        assert_eq!(projected.get(year, "Flights").unwrap(), 150.0);
    }
}

fn class_history() -> RawTable {
    let text = "\
Year,Economy Class,Business Class,First Class
2019,700,250,50
2020,-,-,-
2021,300,90,10
2022,800,180,20
";
    RawTable::from_csv_str(text).unwrap()
}

/// Shares of each class projected towards absolute targets, scaled by projected demand
fn run(horizon: &CalculatorHorizon) -> (TimeseriesTable, TimeseriesTable) {
    let cleaned = clean(&class_history(), &CleanOptions::default()).unwrap();
    let shares = normalise(&cleaned.table).unwrap();
    let shares_table = shares.table().unwrap();

    let demand_bau = bau_pathway(shares_table, TOTAL_COLUMN, None, horizon).unwrap();
    let demand_lever = LeverSettings::new(2.5, 2024, 3).unwrap();
    let mut demand = TransitionProjector::new(*horizon);
    demand_lever
        .apply(
            &mut demand,
            TOTAL_COLUMN,
            &demand_bau,
            &AmbitionLevels::new([1.1, 0.9, 0.7, 0.6]),
            AmbitionMode::Percentage,
            2022,
        )
        .unwrap();
    let demand = demand.finish();
    let total = demand.column(TOTAL_COLUMN).unwrap();

    let share_levels = [
        ("Economy Class", AmbitionLevels::new([0.745, 0.75, 0.78, 1.0])),
        ("Business Class", AmbitionLevels::new([0.07, 0.03, 0.02, 0.0])),
        ("First Class", AmbitionLevels::new([0.003, 0.001, 0.0, 0.0])),
    ];
    let share_lever = LeverSettings::new(4.0, 2026, 2).unwrap();
    let mut projector = TransitionProjector::new(*horizon);
    let mut activity = TimeseriesTable::from_horizon(horizon);
    for (category, levels) in share_levels {
        let bau = bau_pathway(shares_table, category, None, horizon).unwrap();
        share_lever
            .apply(&mut projector, category, &bau, &levels, AmbitionMode::Absolute, 2022)
            .unwrap();
        let share = projector.output().column(category).unwrap();
        activity.set_column(category, share * total).unwrap();
    }

    let factors = FactorTable::from_constants(
        horizon,
        [("Economy Class", 2.0), ("Business Class", 6.0), ("First Class", 9.0)],
    )
    .unwrap();
    let emissions = DirectFactors::default().derive(&activity, &factors).unwrap();
    (activity, emissions)
}

#[test]
fn multi_category_pipeline() {
    let horizon = CalculatorHorizon::new(2019, 2035).unwrap();
    let (activity, emissions) = run(&horizon);

    // Historical years reproduce the observations
    assert_relative_eq!(activity.get(2019, "Economy Class").unwrap(), 700.0, epsilon = 1e-9);
    assert_relative_eq!(activity.get(2022, "First Class").unwrap(), 20.0, epsilon = 1e-9);
    // The all-missing 2020 row is filled from the last observation
    assert_relative_eq!(activity.get(2020, "Business Class").unwrap(), 180.0, epsilon = 1e-9);

    // Level 2.5 demand is 0.8 of the 2022 total once the ramp completes
    let held_total: f64 = activity.iter().map(|(_, v)| v[horizon.len() - 1]).sum();
    assert_relative_eq!(held_total, 800.0, epsilon = 1e-9);
    assert_relative_eq!(
        activity.get(2035, "Economy Class").unwrap(),
        800.0,
        epsilon = 1e-9
    );
    assert_eq!(activity.get(2035, "First Class").unwrap(), 0.0);

    // Emissions are activity times factor
    assert_relative_eq!(
        emissions.get(2022, "Business Class").unwrap(),
        180.0 * 6.0,
        epsilon = 1e-9
    );
    assert!(emissions.missing_cells().is_empty());
    assert!(activity.iter().all(|(_, v)| v.iter().all(|x| *x >= 0.0)));
}

#[test]
fn repeated_runs_are_identical() {
    let horizon = CalculatorHorizon::new(2019, 2035).unwrap();
    let first = run(&horizon);
    let second = run(&horizon);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(first.1.to_json().unwrap(), second.1.to_json().unwrap());
}

#[test]
fn projected_tables_round_trip_exactly() {
    let horizon = CalculatorHorizon::new(2019, 2035).unwrap();
    let (_, emissions) = run(&horizon);
    let restored = TimeseriesTable::from_json(&emissions.to_json().unwrap()).unwrap();
    assert_eq!(restored, emissions);
}
