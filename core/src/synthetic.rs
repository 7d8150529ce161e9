//! Seeded synthetic dataset generator.
//!
//! Builds a small but complete world: states, metros (one split into metro
//! divisions), counties, tracts with demographics, area income, lenders with
//! ownership groups, and loan records. The same seed always produces the same
//! rows. Used by the runner's demo mode and by property-style tests.

use crate::{
    codes::{Agency, ChoiceCode, IncomeIndicator},
    demographics::{AggDemographics, AggDemographicsSource, TractDemographics},
    error::LendResult,
    geo::{CoreBasedStatisticalArea, County, MetroDivision, State, Tract},
    hmda::LoanApplicationRecord,
    institution::{Institution, LenderHierarchyEntry},
    name_generator::NameGenerator,
    rng::{RngBank, SynthRng, SynthSlot},
    store::{IngestSummary, LendStore},
    tract_corrections::TractCorrections,
    types::{Geoid, InstitutionId, Year},
};
use serde::{Deserialize, Serialize};

const STATES: [(&str, &str, &str); 3] = [
    ("11", "District of Columbia", "DC"),
    ("24", "Maryland", "MD"),
    ("51", "Virginia", "VA"),
];

const SPLIT_METRO: &str = "47900";
const METDIV_A: &str = "47894";
const METDIV_B: &str = "43524";
const SMALL_METRO: &str = "12580";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticParams {
    pub year: Year,
    pub states: usize,
    pub counties_per_state: usize,
    pub tracts_per_county: usize,
    pub lenders: usize,
    pub loans: usize,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            year: 2013,
            states: 2,
            counties_per_state: 5,
            tracts_per_county: 6,
            lenders: 30,
            loans: 4000,
        }
    }
}

/// Codes of everything generated, for building requests against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticDataset {
    pub year: Year,
    pub states: Vec<Geoid>,
    pub metros: Vec<Geoid>,
    pub counties: Vec<Geoid>,
    pub tracts: Vec<Geoid>,
    pub lenders: Vec<InstitutionId>,
    pub loans: IngestSummary,
}

/// Populate `store` (already migrated) with a dataset derived from `seed`.
pub fn generate(store: &LendStore, seed: u64, params: &SyntheticParams) -> LendResult<SyntheticDataset> {
    let bank = RngBank::new(seed);
    let year = params.year;

    let (states, metros, counties) =
        generate_geography(store, &mut bank.for_slot(SynthSlot::Geography), params)?;
    let tracts = generate_tracts(store, &mut bank.for_slot(SynthSlot::Demographics), &counties, params)?;
    generate_area_income(store, &mut bank.for_slot(SynthSlot::AreaIncome), &states, year)?;
    let lenders = generate_lenders(store, &mut bank.for_slot(SynthSlot::Institutions), params)?;
    let records = generate_loans(&mut bank.for_slot(SynthSlot::Loans), &tracts, &lenders, params);
    let loans = store.ingest_loans(&records, &TractCorrections::default())?;

    log::info!(
        "synthetic: seed {seed}, {} counties, {} tracts, {} lenders, {} loans",
        counties.len(),
        tracts.len(),
        lenders.len(),
        loans.inserted
    );
    Ok(SyntheticDataset {
        year,
        states,
        metros,
        counties: counties.into_iter().map(|c| c.geoid).collect(),
        tracts: tracts.into_iter().map(|(t, _)| t).collect(),
        lenders,
        loans,
    })
}

fn generate_geography(
    store: &LendStore,
    rng: &mut SynthRng,
    params: &SyntheticParams,
) -> LendResult<(Vec<Geoid>, Vec<Geoid>, Vec<County>)> {
    let mut states = Vec::new();
    for (geoid, name, abbrev) in STATES.iter().take(params.states.clamp(1, STATES.len())) {
        store.insert_state(&State {
            geoid: geoid.to_string(),
            name: name.to_string(),
            abbrev: abbrev.to_string(),
        })?;
        states.push(geoid.to_string());
    }

    for (geoid, metro) in [(SPLIT_METRO, true), (SMALL_METRO, false)] {
        let name = format!("{} Metro", NameGenerator::generate_place_name(rng));
        store.insert_cbsa(&CoreBasedStatisticalArea {
            geoid: geoid.to_string(),
            name,
            metro,
        })?;
    }
    for geoid in [METDIV_A, METDIV_B] {
        store.insert_metro_division(&MetroDivision {
            geoid: geoid.to_string(),
            name: format!("{} Division", NameGenerator::generate_place_name(rng)),
            cbsa_id: SPLIT_METRO.to_string(),
        })?;
    }

    // Counties cycle through: metro division A, metro division B, the small
    // metro, and no metro at all.
    let mut counties = Vec::new();
    for state in &states {
        for i in 0..params.counties_per_state {
            let (cbsa_id, metdiv_id) = match i % 4 {
                0 => (Some(SPLIT_METRO), Some(METDIV_A)),
                1 => (Some(SPLIT_METRO), Some(METDIV_B)),
                2 => (Some(SMALL_METRO), None),
                _ => (None, None),
            };
            let county = County {
                geoid: format!("{state}{:03}", 2 * i + 1),
                name: format!("{} County", NameGenerator::generate_place_name(rng)),
                state_id: state.clone(),
                cbsa_id: cbsa_id.map(str::to_string),
                metdiv_id: metdiv_id.map(str::to_string),
            };
            store.insert_county(&county)?;
            counties.push(county);
        }
    }
    Ok((states, vec![SPLIT_METRO.to_string(), SMALL_METRO.to_string()], counties))
}

/// Insert tracts and their demographics; returns each tract with its
/// minority/LMI flags so loan outcomes can depend on them.
fn generate_tracts(
    store: &LendStore,
    rng: &mut SynthRng,
    counties: &[County],
    params: &SyntheticParams,
) -> LendResult<Vec<(Geoid, TractProfile)>> {
    let indicators = [
        IncomeIndicator::Low,
        IncomeIndicator::Mod,
        IncomeIndicator::Mid,
        IncomeIndicator::High,
    ];
    let mut tracts = Vec::new();
    for county in counties {
        for t in 0..params.tracts_per_county {
            let geoid = format!("{}{:06}", county.geoid, 100 * (t + 1));
            store.insert_tract(&Tract {
                geoid: geoid.clone(),
                name: format!("Census Tract {}", t + 1),
                county_id: county.geoid.clone(),
                state_id: county.state_id.clone(),
            })?;

            let indicator = indicators[rng.weighted(&[0.15, 0.25, 0.35, 0.25])];
            let mut dem = TractDemographics::empty(geoid.clone(), params.year, indicator);
            dem.persons = rng.range_i64(800, 8000);
            dem.non_hispanic_white = dem.persons * rng.range_i64(5, 95) / 100;
            let rest = dem.persons - dem.non_hispanic_white;
            dem.hispanic_only = rest * rng.range_i64(10, 40) / 100;
            dem.black = rest * rng.range_i64(20, 50) / 100;
            dem.asian = (rest - dem.hispanic_only - dem.black) * rng.range_i64(10, 60) / 100;
            dem.females = dem.persons / 2 + rng.range_i64(-50, 50);
            dem.males = dem.persons - dem.females;
            dem.poverty = dem.persons * rng.range_i64(3, 35) / 100;
            dem.households = dem.persons * 10 / 25;
            dem.poverty_households = dem.households * rng.range_i64(3, 30) / 100;
            dem.single_family_homes = dem.households * rng.range_i64(30, 90) / 100;
            dem.single_family_occupied = dem.single_family_homes * rng.range_i64(40, 95) / 100;
            dem.male_adult = dem.males * 3 / 4;
            dem.male_employed = dem.male_adult * rng.range_i64(50, 95) / 100;
            dem.female_adult = dem.females * 3 / 4;
            dem.female_employed = dem.female_adult * rng.range_i64(50, 95) / 100;
            dem.median_family_income = rng.range_i64(25_000, 160_000);
            store.insert_tract_demographics(&dem)?;

            tracts.push((
                geoid,
                TractProfile {
                    minority: dem.is_minority(),
                    lmi: dem.is_lmi(),
                },
            ));
        }
    }
    Ok(tracts)
}

#[derive(Debug, Clone, Copy)]
struct TractProfile {
    minority: bool,
    lmi: bool,
}

/// Area income for both metros, metro division A only (B falls back to its
/// metro) and the non-metro remainder of each state.
fn generate_area_income(store: &LendStore, rng: &mut SynthRng, states: &[Geoid], year: Year) -> LendResult<()> {
    let mut rows = vec![
        (AggDemographicsSource::Cbsa, SPLIT_METRO.to_string()),
        (AggDemographicsSource::Cbsa, SMALL_METRO.to_string()),
        (AggDemographicsSource::MetroDivision, METDIV_A.to_string()),
    ];
    rows.extend(states.iter().map(|s| (AggDemographicsSource::LowPopulation, s.clone())));
    for (source, geoid) in rows {
        let est = rng.range_i64(50_000, 110_000);
        store.insert_agg_demographics(&AggDemographics {
            source,
            geoid,
            year,
            median_family_income: est - rng.range_i64(0, 5_000),
            median_household_income: est * 4 / 5,
            ffiec_est_med_fam_income: est,
        })?;
    }
    Ok(())
}

/// Lenders grouped into ownership organizations. The first member of each
/// organization is the parent of the others.
fn generate_lenders(store: &LendStore, rng: &mut SynthRng, params: &SyntheticParams) -> LendResult<Vec<InstitutionId>> {
    let mut ids = Vec::new();
    let mut organization: Option<(i64, InstitutionId)> = None;
    for i in 0..params.lenders {
        let agency = *rng.pick(Agency::all());
        let respondent_id = format!("{:010}", i + 1);
        let agency_code = agency.code().to_string();
        let institution_id = LoanApplicationRecord::institution_key(params.year, &agency_code, &respondent_id);

        let joins = organization.is_some() && rng.chance(0.4);
        if !joins {
            organization = rng.chance(0.6).then(|| (i as i64 + 1, institution_id.clone()));
        }
        let parent_id = match (&organization, joins) {
            (Some((_, head)), true) => Some(head.clone()),
            _ => None,
        };

        store.insert_institution(&Institution {
            institution_id: institution_id.clone(),
            year: params.year,
            agency_code,
            respondent_id,
            name: NameGenerator::generate_lender_name(rng),
            assets: rng.chance(0.9).then(|| rng.pareto(50_000.0, 1.2) as i64),
            rssd_id: Some(format!("{}", 100_000 + i)),
            parent_id,
            num_loans: 0,
        })?;
        if let Some((organization_id, _)) = &organization {
            store.insert_lender_hierarchy(&LenderHierarchyEntry {
                institution_id: institution_id.clone(),
                organization_id: *organization_id,
            })?;
        }
        ids.push(institution_id);
    }
    Ok(ids)
}

fn generate_loans(
    rng: &mut SynthRng,
    tracts: &[(Geoid, TractProfile)],
    lenders: &[InstitutionId],
    params: &SyntheticParams,
) -> Vec<LoanApplicationRecord> {
    if tracts.is_empty() || lenders.is_empty() {
        return Vec::new();
    }
    let lender_weights: Vec<f64> = lenders.iter().map(|_| rng.pareto(1.0, 1.1)).collect();
    let mut records = Vec::with_capacity(params.loans);
    for seq in 0..params.loans {
        let institution_id = &lenders[rng.weighted(&lender_weights)];
        let (tract_id, profile) = rng.pick(tracts);

        // (ethnicity, race) for white, black, hispanic, asian, not provided
        let applicant = [("2", "5"), ("2", "3"), ("1", "5"), ("2", "2"), ("3", "6")]
            [rng.weighted(&[0.55, 0.15, 0.15, 0.08, 0.07])];
        let white = applicant == ("2", "5");
        let income = rng.chance(0.95).then(|| rng.range_i64(15, 250));

        let mut approve_p = 0.72;
        if !white {
            approve_p -= 0.12;
        }
        if profile.minority {
            approve_p -= 0.05;
        }
        if profile.lmi || income.is_some_and(|i| i < 45) {
            approve_p -= 0.08;
        }
        let action = if rng.chance(0.06) {
            *rng.pick(&[6u8, 7, 8])
        } else if rng.chance(approve_p) {
            1
        } else {
            *rng.pick(&[2u8, 3, 3, 3, 4, 5])
        };

        records.push(LoanApplicationRecord {
            hmda_record_id: LoanApplicationRecord::record_id(institution_id, &format!("{:07}", seq + 1)),
            as_of_year: params.year,
            institution_id: institution_id.clone(),
            tract_id: tract_id.clone(),
            action_taken: action,
            applicant_ethnicity: applicant.0.to_string(),
            applicant_race_1: applicant.1.to_string(),
            applicant_race_2: None,
            applicant_race_3: None,
            applicant_race_4: None,
            applicant_race_5: None,
            applicant_sex: if rng.chance(0.08) { 3 } else if rng.chance(0.55) { 1 } else { 2 },
            applicant_income_000s: income,
            loan_amount_000s: rng.range_i64(40, 900),
            lien_status: *rng.pick(&[1u8, 1, 1, 2]),
            loan_purpose: *rng.pick(&[1u8, 1, 2, 3, 3]),
            property_type: *rng.pick(&[1u8, 1, 1, 1, 2, 3]),
            owner_occupancy: *rng.pick(&[1u8, 1, 1, 2, 3]),
        });
    }
    records
}
