mod common;

use common::*;
use fairlend_core::{
    codes::IncomeIndicator,
    config::AnalyticsConfig,
    demographics::AggDemographicsSource,
    disparity_analyzer::{self, DisparityRow, GroupedDisparityRows},
    geo::DivisionKind,
    hmda::LoanApplicationRecord,
    report_input::{ReportInput, ReportRequest},
    store::LendStore,
};

const LMI_MINORITY_TRACT: &str = "11001000100";
const MUI_WHITE_TRACT: &str = "11001000200";
const NO_DEMOGRAPHICS_TRACT: &str = "11001000300";

// ── Helpers ──────────────────────────────────────────────────────────────────

fn applicant(
    template: &LoanApplicationRecord,
    ethnicity: &str,
    race: &str,
    sex: u8,
    income: Option<i64>,
) -> LoanApplicationRecord {
    let mut r = template.clone();
    r.applicant_ethnicity = ethnicity.into();
    r.applicant_race_1 = race.into();
    r.applicant_sex = sex;
    r.applicant_income_000s = income;
    r
}

fn with_action(r: &LoanApplicationRecord, action: u8) -> LoanApplicationRecord {
    let mut r = r.clone();
    r.action_taken = action;
    r
}

/// DC county, 2013. Area income 80_000 puts the LMI boundary at $64k.
///
///   group      tract              income  sex  apps  approved
///   white      MUI/white-majority  100     M     40     30
///   black      LMI/minority         40     F     20     10
///   hispanic   LMI/minority         40     F     10      5
///   asian      MUI/white-majority  100     M     10     10
///   unknown    no demographics     n/a     -      1      0
fn scenario() -> (LendStore, String) {
    let store = store();
    add_tract(&store, LMI_MINORITY_TRACT);
    add_tract(&store, MUI_WHITE_TRACT);
    add_tract(&store, NO_DEMOGRAPHICS_TRACT);
    add_demographics(&store, LMI_MINORITY_TRACT, 2013, IncomeIndicator::Low, 100, 10);
    add_demographics(&store, MUI_WHITE_TRACT, 2013, IncomeIndicator::High, 100, 90);
    add_area_income(&store, AggDemographicsSource::MetroDivision, WASHINGTON_ARLINGTON, 2013, 80_000);
    let lender = add_lender(&store, 2013, 1, "First Bank");

    let in_mui = loan(&lender, MUI_WHITE_TRACT, 2013);
    let in_lmi = loan(&lender, LMI_MINORITY_TRACT, 2013);

    let white = applicant(&in_mui, "2", "5", 1, Some(100));
    add_loans(&store, 30, &white);
    add_loans(&store, 10, &with_action(&white, 3));

    let black = applicant(&in_lmi, "2", "3", 2, Some(40));
    add_loans(&store, 10, &black);
    add_loans(&store, 10, &with_action(&black, 3));

    let hispanic = applicant(&in_lmi, "1", "5", 2, Some(40));
    add_loans(&store, 5, &hispanic);
    add_loans(&store, 5, &with_action(&hispanic, 4));

    let asian = applicant(&in_mui, "2", "2", 1, Some(100));
    add_loans(&store, 10, &asian);

    let unknown = applicant(&loan(&lender, NO_DEMOGRAPHICS_TRACT, 2013), "3", "6", 3, None);
    add_loans(&store, 1, &with_action(&unknown, 5));

    // Not decided, wrong year, wrong county: all out of scope.
    add_loans(&store, 5, &with_action(&white, 6));
    add_loans(&store, 5, &with_action(&loan(&lender, MUI_WHITE_TRACT, 2012), 3));
    add_tract(&store, "24031700100");
    add_loans(&store, 5, &with_action(&loan(&lender, "24031700100", 2013), 3));

    (store, lender)
}

fn row(feature: &str, ft: i64, fa: i64, total: i64, ct: i64, ca: i64) -> DisparityRow {
    DisparityRow {
        feature: feature.into(),
        feature_total: ft,
        feature_approved: fa,
        total,
        compare_total: ct,
        compare_approved: ca,
    }
}

fn groups(store: &LendStore, geoid: &str, input: &ReportInput) -> Vec<GroupedDisparityRows> {
    let county = division(store, DivisionKind::County, geoid);
    disparity_analyzer::groups_for(store, &county, input, &AnalyticsConfig::default_test()).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn groups_have_exact_rows_in_report_order() {
    let (store, _) = scenario();
    let groups = groups(&store, DC, &input(2013));

    let labels: Vec<&str> = groups.iter().map(|g| g.comparison_label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "White borrowers",
            "MUI Borrowers",
            "Male",
            "MUI Tracts",
            "White Majority Tracts"
        ]
    );

    assert_eq!(
        groups[0].rows,
        vec![
            row("White", 40, 30, 81, 40, 30),
            row("Black", 20, 10, 81, 40, 30),
            row("Hispanic/Latino", 10, 5, 81, 40, 30),
            row("Asian", 10, 10, 81, 40, 30),
            row("Minority", 41, 25, 81, 40, 30),
        ]
    );
    assert_eq!(groups[1].rows, vec![row("LMI Applicant", 30, 15, 81, 50, 40)]);
    assert_eq!(groups[2].rows, vec![row("Female", 30, 15, 81, 50, 40)]);
    assert_eq!(groups[3].rows, vec![row("Applicant in LMI Tract", 30, 15, 81, 50, 40)]);
    assert_eq!(groups[4].rows, vec![row("Applicant in Minority Tract", 30, 15, 81, 50, 40)]);
}

#[test]
fn ratios_match_hand_computed_denial_rates() {
    let (store, _) = scenario();
    let groups = groups(&store, DC, &input(2013));

    let race: Vec<String> = groups[0].rows.iter().map(DisparityRow::disparity_ratio).collect();
    // white denial 10/40; black 10/20; hispanic 5/10; asian 0/10;
    // minority 16/41 -> (16/41) / (10/40) = 1.56
    assert_eq!(race, vec!["1.0", "2.0", "2.0", "0.0", "1.6"]);
    for group in &groups[1..] {
        // (15/30) / (10/50)
        assert_eq!(group.rows[0].disparity_ratio(), "2.5");
    }
}

#[test]
fn income_group_is_omitted_without_area_income() {
    let store = store();
    add_tract(&store, "24001000100");
    let lender = add_lender(&store, 2013, 1, "Mountain Bank");
    add_loans(&store, 3, &loan(&lender, "24001000100", 2013));

    let groups = groups(&store, ALLEGANY, &input(2013));
    let labels: Vec<&str> = groups.iter().map(|g| g.comparison_label.as_str()).collect();
    assert_eq!(labels, vec!["White borrowers", "Male", "MUI Tracts", "White Majority Tracts"]);
}

/// A county outside any metro falls back to its state's low-population row.
#[test]
fn non_metro_county_uses_state_income() {
    let store = store();
    add_tract(&store, "24001000100");
    add_area_income(&store, AggDemographicsSource::LowPopulation, "24", 2013, 50_000);
    let lender = add_lender(&store, 2013, 1, "Mountain Bank");
    // Boundary is 40: 39 is LMI, 40 is MUI.
    let mut r = loan(&lender, "24001000100", 2013);
    r.applicant_income_000s = Some(39);
    add_loans(&store, 2, &r);
    r.applicant_income_000s = Some(40);
    add_loans(&store, 3, &r);

    let groups = groups(&store, ALLEGANY, &input(2013));
    assert_eq!(groups.len(), 5);
    assert_eq!(groups[1].rows[0], row("LMI Applicant", 2, 2, 5, 3, 3));
    assert_eq!(groups[1].rows[0].disparity_ratio(), "N/A");
}

#[test]
fn loan_filters_narrow_every_group() {
    let (store, lender) = scenario();
    let mut refi = loan(&lender, MUI_WHITE_TRACT, 2013);
    refi.loan_purpose = 3;
    add_loans(&store, 4, &refi);
    add_loans(&store, 4, &with_action(&refi, 3));

    let input = ReportInput::from_request(&ReportRequest {
        year: "2013".into(),
        loan_purpose: vec!["3".into()],
        ..Default::default()
    })
    .unwrap();
    let first = groups(&store, DC, &input);
    assert_eq!(first[0].rows[0], row("White", 8, 4, 8, 8, 4));
    assert_eq!(first[0].rows[1].disparity_ratio(), "N/A");

    let input = ReportInput::from_request(&ReportRequest {
        year: "2013".into(),
        loan_purpose: vec!["2".into()],
        ..Default::default()
    })
    .unwrap();
    let groups = groups(&store, DC, &input);
    assert!(groups.iter().flat_map(|g| &g.rows).all(|r| r.total == 0));
    assert!(groups
        .iter()
        .flat_map(|g| &g.rows)
        .all(|r| r.disparity_ratio() == "N/A"));
}
