//! Fixture world shared by the integration tests.
//!
//! Geography:
//!   11  District of Columbia
//!   24  Maryland
//!   47900 Washington metro, split into
//!         47894 Washington-Arlington  (county 11001)
//!         43524 Silver Spring         (county 24031)
//!   12580 Baltimore metro, no divisions (county 24005)
//!   24001 Allegany County, no metro

#![allow(dead_code)]

use fairlend_core::{
    codes::IncomeIndicator,
    demographics::{AggDemographics, AggDemographicsSource, TractDemographics},
    geo::{CoreBasedStatisticalArea, County, Division, DivisionKind, MetroDivision, State, Tract},
    hmda::LoanApplicationRecord,
    institution::{Institution, LenderHierarchyEntry},
    report_input::{ReportInput, ReportRequest},
    store::LendStore,
    types::Year,
};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DC: &str = "11001";
pub const MONTGOMERY: &str = "24031";
pub const BALTIMORE_CO: &str = "24005";
pub const ALLEGANY: &str = "24001";

pub const WASHINGTON: &str = "47900";
pub const WASHINGTON_ARLINGTON: &str = "47894";
pub const SILVER_SPRING: &str = "43524";
pub const BALTIMORE: &str = "12580";

static SEQ: AtomicU64 = AtomicU64::new(1);

pub fn empty_store() -> LendStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = LendStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

/// Migrated in-memory store holding the fixture geography (no tracts).
pub fn store() -> LendStore {
    let store = empty_store();
    seed_geography(&store);
    store
}

pub fn seed_geography(store: &LendStore) {
    for (geoid, name, abbrev) in [("11", "District of Columbia", "DC"), ("24", "Maryland", "MD")] {
        store
            .insert_state(&State {
                geoid: geoid.into(),
                name: name.into(),
                abbrev: abbrev.into(),
            })
            .unwrap();
    }
    for (geoid, name) in [
        (WASHINGTON, "Washington-Arlington-Alexandria, DC-VA-MD-WV"),
        (BALTIMORE, "Baltimore-Columbia-Towson, MD"),
    ] {
        store
            .insert_cbsa(&CoreBasedStatisticalArea {
                geoid: geoid.into(),
                name: name.into(),
                metro: true,
            })
            .unwrap();
    }
    for (geoid, name) in [
        (WASHINGTON_ARLINGTON, "Washington-Arlington-Alexandria, DC-VA-MD-WV"),
        (SILVER_SPRING, "Silver Spring-Frederick-Rockville, MD"),
    ] {
        store
            .insert_metro_division(&MetroDivision {
                geoid: geoid.into(),
                name: name.into(),
                cbsa_id: WASHINGTON.into(),
            })
            .unwrap();
    }
    for (geoid, name, cbsa, metdiv) in [
        (DC, "District of Columbia", Some(WASHINGTON), Some(WASHINGTON_ARLINGTON)),
        (MONTGOMERY, "Montgomery County", Some(WASHINGTON), Some(SILVER_SPRING)),
        (BALTIMORE_CO, "Baltimore County", Some(BALTIMORE), None),
        (ALLEGANY, "Allegany County", None, None),
    ] {
        store
            .insert_county(&County {
                geoid: geoid.into(),
                name: name.into(),
                state_id: geoid[..2].into(),
                cbsa_id: cbsa.map(Into::into),
                metdiv_id: metdiv.map(Into::into),
            })
            .unwrap();
    }
}

pub fn add_tract(store: &LendStore, geoid: &str) {
    let tract = Tract::from_geoid(geoid).unwrap();
    store.insert_tract(&tract).unwrap();
}

/// Tract demographics with the given population; housing is 40% of persons.
pub fn add_demographics(
    store: &LendStore,
    tract: &str,
    year: Year,
    indicator: IncomeIndicator,
    persons: i64,
    non_hispanic_white: i64,
) -> TractDemographics {
    let mut dem = TractDemographics::empty(tract, year, indicator);
    dem.persons = persons;
    dem.non_hispanic_white = non_hispanic_white;
    dem.single_family_homes = persons * 2 / 5;
    dem.single_family_occupied = persons / 5;
    store.insert_tract_demographics(&dem).unwrap();
    dem
}

pub fn add_area_income(store: &LendStore, source: AggDemographicsSource, geoid: &str, year: Year, est: i64) {
    store
        .insert_agg_demographics(&AggDemographics {
            source,
            geoid: geoid.into(),
            year,
            median_family_income: est,
            median_household_income: est,
            ffiec_est_med_fam_income: est,
        })
        .unwrap();
}

pub fn lender_id(year: Year, respondent: u32) -> String {
    LoanApplicationRecord::institution_key(year, "9", &format!("{respondent:010}"))
}

pub fn add_lender(store: &LendStore, year: Year, respondent: u32, name: &str) -> String {
    let institution_id = lender_id(year, respondent);
    store
        .insert_institution(&Institution {
            institution_id: institution_id.clone(),
            year,
            agency_code: "9".into(),
            respondent_id: format!("{respondent:010}"),
            name: name.into(),
            assets: None,
            rssd_id: None,
            parent_id: None,
            num_loans: 0,
        })
        .unwrap();
    institution_id
}

pub fn set_organization(store: &LendStore, institution_id: &str, organization_id: i64) {
    store
        .insert_lender_hierarchy(&LenderHierarchyEntry {
            institution_id: institution_id.into(),
            organization_id,
        })
        .unwrap();
}

/// A decided, approved application from a non-Hispanic white male with
/// $60k income. Tests override the fields they care about.
pub fn loan(institution_id: &str, tract_id: &str, year: Year) -> LoanApplicationRecord {
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    LoanApplicationRecord {
        hmda_record_id: LoanApplicationRecord::record_id(institution_id, &format!("{seq:07}")),
        as_of_year: year,
        institution_id: institution_id.into(),
        tract_id: tract_id.into(),
        action_taken: 1,
        applicant_ethnicity: "2".into(),
        applicant_race_1: "5".into(),
        applicant_race_2: None,
        applicant_race_3: None,
        applicant_race_4: None,
        applicant_race_5: None,
        applicant_sex: 1,
        applicant_income_000s: Some(60),
        loan_amount_000s: 200,
        lien_status: 1,
        loan_purpose: 1,
        property_type: 1,
        owner_occupancy: 1,
    }
}

/// Insert `n` copies of `template`, each with a fresh record id.
pub fn add_loans(store: &LendStore, n: usize, template: &LoanApplicationRecord) {
    for _ in 0..n {
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let mut record = template.clone();
        record.hmda_record_id =
            LoanApplicationRecord::record_id(&template.institution_id, &format!("{seq:07}"));
        store.insert_loan(&record).unwrap();
    }
}

pub fn division(store: &LendStore, kind: DivisionKind, geoid: &str) -> Division {
    store.get_division(kind, geoid).unwrap()
}

pub fn input(year: Year) -> ReportInput {
    ReportInput::from_request(&ReportRequest {
        year: year.to_string(),
        ..Default::default()
    })
    .unwrap()
}

pub fn input_with_lenders(year: Year, lenders: &[&str]) -> ReportInput {
    ReportInput::from_request(&ReportRequest {
        year: year.to_string(),
        lender: lenders.iter().map(|l| l.to_string()).collect(),
        ..Default::default()
    })
    .unwrap()
}
