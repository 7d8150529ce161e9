//! Lenders ranked by application volume in a division.

use crate::{
    area_income,
    config::AnalyticsConfig,
    demographics::{LMI_TRACT_SQL, MINORITY_TRACT_SQL},
    demographics_report::percent_of,
    error::LendResult,
    geo::Division,
    hmda::MINORITY_SQL,
    lar_query::SqlPredicate,
    report_input::ReportInput,
    store::{LendStore, LenderCounts},
    types::InstitutionId,
};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLenderRow {
    /// 1-based position by application volume among all lenders in scope.
    pub lender_rank: usize,
    pub requested: bool,
    pub institution_id: InstitutionId,
    pub name: String,
    pub applications: i64,
    pub approval_rate: i64,
    /// Approvals in LMI tracts, percent of approvals.
    pub lmit_pct: i64,
    /// Approvals to LMI applicants, percent of approvals.
    pub lmib_pct: i64,
    /// Approvals in minority tracts, percent of approvals.
    pub mint_pct: i64,
    /// Approvals to minority applicants, percent of approvals.
    pub minb_pct: i64,
}

impl TopLenderRow {
    fn from_counts(rank: usize, requested: bool, c: LenderCounts) -> Self {
        Self {
            lender_rank: rank,
            requested,
            applications: c.applications,
            approval_rate: percent_of(c.approved, c.applications),
            lmit_pct: percent_of(c.lmit_approved, c.approved),
            lmib_pct: percent_of(c.lmib_approved, c.approved),
            mint_pct: percent_of(c.mint_approved, c.approved),
            minb_pct: percent_of(c.minb_approved, c.approved),
            institution_id: c.institution_id,
            name: c.name,
        }
    }

    /// The top `count` lenders by decided applications, plus every requested
    /// lender that ranks below the cutoff. Rows keep their true rank.
    pub fn generate_for(
        store: &LendStore,
        division: &Division,
        input: &ReportInput,
        config: &AnalyticsConfig,
        count: usize,
    ) -> LendResult<Vec<TopLenderRow>> {
        // Without area income no applicant counts as LMI.
        let boundary = area_income::for_division(store, division, input.year())?
            .map_or(0, |dem| dem.mui_boundary_000s(config.lmi_income_percent));

        let lenders = store.lender_counts(
            &input.lar_query(division),
            &SqlPredicate::fixed(LMI_TRACT_SQL),
            &SqlPredicate::with_params(
                "(l.applicant_income_000s < ?)",
                vec![Value::Integer(boundary)],
            ),
            &SqlPredicate::fixed(MINORITY_TRACT_SQL),
            &SqlPredicate::fixed(MINORITY_SQL),
        )?;
        log::debug!(
            "top lenders: {} lenders active in {} {}",
            lenders.len(),
            division.kind().label(),
            division.geoid()
        );

        Ok(lenders
            .into_iter()
            .enumerate()
            .filter_map(|(idx, c)| {
                let requested = input.is_requested_lender(&c.institution_id);
                (idx < count || requested).then(|| Self::from_counts(idx + 1, requested, c))
            })
            .collect())
    }
}
