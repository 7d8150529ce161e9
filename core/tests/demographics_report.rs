mod common;

use common::*;
use fairlend_core::{
    codes::IncomeIndicator,
    demographics_report::{IncomeHousingReport, PopulationReport, ReportRow},
    geo::DivisionKind,
    snapshot,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn row(label: &str, count: i64, percent: i64) -> ReportRow {
    ReportRow {
        label: label.into(),
        count,
        percent,
    }
}

fn count_of(rows: &[ReportRow], label: &str) -> i64 {
    rows.iter().find(|r| r.label == label).map(|r| r.count).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Two tracts of 100 (10 white) and 245 (65 white): white is 75 of 345.
#[test]
fn population_report_sums_tracts_in_division() {
    let store = store();
    add_tract(&store, "11001000100");
    add_tract(&store, "11001000200");
    add_demographics(&store, "11001000100", 2010, IncomeIndicator::Low, 100, 10);
    add_demographics(&store, "11001000200", 2010, IncomeIndicator::High, 245, 65);
    // Wrong year and wrong county must not be counted.
    add_demographics(&store, "11001000100", 2011, IncomeIndicator::Low, 999, 999);
    add_tract(&store, "24031700100");
    add_demographics(&store, "24031700100", 2010, IncomeIndicator::Mid, 500, 400);
    snapshot::rebuild_aggregates(&store).unwrap();

    let county = division(&store, DivisionKind::County, DC);
    let rows = PopulationReport::generate_for(&store, &county, 2010).unwrap();

    assert_eq!(rows[0], row("All Population", 345, 100));
    assert_eq!(rows[1], row("White", 75, 75 * 100 / 345));
    assert_eq!(rows[1].percent, 21);
    assert_eq!(rows[5], row("Minority", 270, 270 * 100 / 345));
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "All Population",
            "White",
            "Hispanic/Latino",
            "Black",
            "Asian",
            "Minority",
            "People Living in Poverty"
        ]
    );
}

#[test]
fn metro_population_includes_its_division_counties() {
    let store = store();
    for (tract, persons, white) in [
        ("11001000100", 100, 60),
        ("24031700100", 300, 100),
        ("24005400100", 50, 50),
    ] {
        add_tract(&store, tract);
        add_demographics(&store, tract, 2012, IncomeIndicator::Mid, persons, white);
    }
    snapshot::rebuild_aggregates(&store).unwrap();

    let metro = division(&store, DivisionKind::Metro, WASHINGTON);
    let rows = PopulationReport::generate_for(&store, &metro, 2012).unwrap();
    assert_eq!(count_of(&rows, "All Population"), 400);
    assert_eq!(count_of(&rows, "White"), 160);

    let state = division(&store, DivisionKind::State, "24");
    let rows = PopulationReport::generate_for(&store, &state, 2012).unwrap();
    assert_eq!(count_of(&rows, "All Population"), 350);
}

#[test]
fn white_plus_minority_is_total() {
    let store = store();
    let mut expected = 0;
    for (i, (persons, white)) in [(1200, 1199), (37, 0), (845, 400), (10, 5)].into_iter().enumerate() {
        let tract = format!("24031{:06}", 100 * (i + 1));
        add_tract(&store, &tract);
        add_demographics(&store, &tract, 2013, IncomeIndicator::Mod, persons, white);
        expected += persons;
    }
    snapshot::rebuild_aggregates(&store).unwrap();

    let county = division(&store, DivisionKind::County, MONTGOMERY);
    let rows = PopulationReport::generate_for(&store, &county, 2013).unwrap();
    let total = count_of(&rows, "All Population");
    assert_eq!(total, expected);
    assert_eq!(count_of(&rows, "White") + count_of(&rows, "Minority"), total);
}

#[test]
fn empty_division_reports_zeroes_not_errors() {
    let store = store();
    snapshot::rebuild_aggregates(&store).unwrap();

    let county = division(&store, DivisionKind::County, ALLEGANY);
    let rows = PopulationReport::generate_for(&store, &county, 2013).unwrap();
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|r| r.count == 0 && r.percent == 0));

    let rows = IncomeHousingReport::generate_for(&store, &county, 2013).unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.count == 0 && r.percent == 0));
}

/// Each income/housing group is normalized by its own denominator.
#[test]
fn income_housing_groups_are_independently_normalized() {
    let store = store();
    // low + white majority, mod + minority, mid + white, high + minority
    let tracts = [
        ("24031000100", IncomeIndicator::Low, 100, 60),
        ("24031000200", IncomeIndicator::Mod, 200, 20),
        ("24031000300", IncomeIndicator::Mid, 300, 200),
        ("24031000400", IncomeIndicator::High, 400, 100),
    ];
    for (tract, indicator, persons, white) in tracts {
        add_tract(&store, tract);
        add_demographics(&store, tract, 2010, indicator, persons, white);
    }
    // Exactly half white: not a minority tract.
    add_tract(&store, "24031000500");
    add_demographics(&store, "24031000500", 2010, IncomeIndicator::Mid, 1000, 500);
    snapshot::rebuild_aggregates(&store).unwrap();

    let county = division(&store, DivisionKind::County, MONTGOMERY);
    let rows = IncomeHousingReport::generate_for(&store, &county, 2010).unwrap();

    let homes = (100 + 200 + 300 + 400 + 1000) * 2 / 5;
    let occupied = (100 + 200 + 300 + 400 + 1000) / 5;
    assert_eq!(
        rows,
        vec![
            row("Single Family Homes", homes, 100),
            row("Owner Occupied Homes", occupied, occupied * 100 / homes),
            row("LMI Tracts in Geography", 2, 2 * 100 / 5),
            row("Minority Tracts in Geography", 2, 2 * 100 / 5),
            row("Population in LMI Tracts", 300, 300 * 100 / 2000),
            row("Population in Minority Tracts", 600, 600 * 100 / 2000),
        ]
    );
}

/// Reports read the aggregate snapshot, which only changes on rebuild.
#[test]
fn reports_reflect_last_rebuild() {
    let store = store();
    add_tract(&store, "11001000100");
    add_demographics(&store, "11001000100", 2010, IncomeIndicator::Mid, 100, 50);
    snapshot::rebuild_aggregates(&store).unwrap();

    add_tract(&store, "11001000200");
    add_demographics(&store, "11001000200", 2010, IncomeIndicator::Mid, 900, 50);
    let county = division(&store, DivisionKind::County, DC);
    let before = PopulationReport::generate_for(&store, &county, 2010).unwrap();
    assert_eq!(before[0].count, 100);

    snapshot::rebuild_aggregates(&store).unwrap();
    let after = PopulationReport::generate_for(&store, &county, 2010).unwrap();
    assert_eq!(after[0].count, 1000);
}
