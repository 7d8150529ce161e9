//! Per-lender activity in a division, broken out by applicant characteristic.
//!
//! Two report shapes:
//!   - applicant reports (applications, originations): count and loan volume
//!     per characteristic, each as a share of the lender's total
//!   - action reports (approvals, denials): how often each characteristic
//!     received the action, with a disparity index against white applicants

use crate::{
    codes::{ActionTaken, ChoiceCode},
    error::LendResult,
    geo::Division,
    hmda::{FEMALE_SQL, MALE_SQL, RACE_FEATURES},
    lar_query::{LarQuery, SqlPredicate},
    store::LendStore,
    types::Year,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantReportKind {
    Applications,
    Originations,
}

impl ApplicantReportKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Applications => "Applications",
            Self::Originations => "Originations",
        }
    }

    fn actions(self) -> Vec<u8> {
        match self {
            Self::Applications => ActionTaken::decided_codes(),
            Self::Originations => vec![ActionTaken::Originated.code()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionReportKind {
    Approvals,
    Denials,
}

impl ActionReportKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Approvals => "Approvals",
            Self::Denials => "Denials",
        }
    }

    fn actions(self) -> Vec<u8> {
        match self {
            Self::Approvals => vec![ActionTaken::Originated.code()],
            Self::Denials => vec![ActionTaken::Denied.code()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRow {
    pub characteristic: String,
    pub count: i64,
    /// Fraction of the lender's matching records, 0 when there are none.
    pub share_of_count: f64,
    /// Loan amount, thousands of dollars.
    pub volume: i64,
    pub share_of_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRow {
    pub characteristic: String,
    pub count: i64,
    /// Fraction of the characteristic's decided applications.
    pub share: f64,
    /// `(count / total) / (white count / white total)`. Absent when the
    /// characteristic has no applications or no white applicant got the action.
    pub disparity_index: Option<f64>,
}

fn characteristics() -> Vec<(&'static str, SqlPredicate)> {
    RACE_FEATURES
        .iter()
        .map(|(name, sql)| (*name, SqlPredicate::fixed(sql)))
        .chain([
            ("Male", SqlPredicate::fixed(MALE_SQL)),
            ("Female", SqlPredicate::fixed(FEMALE_SQL)),
        ])
        .collect()
}

fn fraction(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn lender_query(
    store: &LendStore,
    institution_id: &str,
    division: &Division,
    year: Year,
) -> LendResult<LarQuery> {
    let lender = store.get_institution(institution_id)?;
    Ok(LarQuery::decided(division.clone(), year).for_lender(lender.institution_id))
}

pub fn applicant_report(
    store: &LendStore,
    institution_id: &str,
    division: &Division,
    year: Year,
    kind: ApplicantReportKind,
) -> LendResult<Vec<ApplicantRow>> {
    let query =
        lender_query(store, institution_id, division, year)?.with_actions(&kind.actions());
    let features = characteristics();
    let predicates: Vec<SqlPredicate> = features.iter().map(|(_, p)| p.clone()).collect();
    let volumes = store.feature_volumes(&query, &predicates)?;
    let (total_count, total_volume) = volumes[0];

    Ok(features
        .iter()
        .zip(&volumes[1..])
        .map(|((name, _), &(count, volume))| ApplicantRow {
            characteristic: name.to_string(),
            count,
            share_of_count: fraction(count, total_count),
            volume,
            share_of_volume: fraction(volume, total_volume),
        })
        .collect())
}

pub fn action_report(
    store: &LendStore,
    institution_id: &str,
    division: &Division,
    year: Year,
    kind: ActionReportKind,
) -> LendResult<Vec<ActionRow>> {
    let query = lender_query(store, institution_id, division, year)?;
    let features = characteristics();
    let predicates: Vec<SqlPredicate> = features.iter().map(|(_, p)| p.clone()).collect();
    let totals = store.feature_volumes(&query, &predicates)?;
    let subsets = store.feature_volumes(&query.with_actions(&kind.actions()), &predicates)?;

    // Index 1 is the first characteristic, White.
    let total_white = totals[1].0;
    let subset_white = subsets[1].0;

    Ok(features
        .iter()
        .zip(totals[1..].iter().zip(&subsets[1..]))
        .map(|((name, _), (&(total, _), &(subset, _)))| {
            let denominator = total * subset_white;
            ActionRow {
                characteristic: name.to_string(),
                count: subset,
                share: fraction(subset, total),
                disparity_index: (denominator != 0)
                    .then(|| (subset * total_white) as f64 / denominator as f64),
            }
        })
        .collect())
}
