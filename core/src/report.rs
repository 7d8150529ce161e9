//! Full fair-lending report for a request: every analytic component for
//! every requested division, computed against one snapshot generation.

use crate::{
    config::AnalyticsConfig,
    demographics_report::{IncomeHousingReport, PopulationReport, ReportRow},
    disparity_analyzer::{self, DisparityRow, GroupedDisparityRows},
    error::LendResult,
    geo::Division,
    report_input::ReportInput,
    snapshot,
    store::LendStore,
    top_lender_ranker::TopLenderRow,
    types::Year,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisparityLine {
    #[serde(flatten)]
    pub row: DisparityRow,
    pub disparity_ratio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisparitySection {
    pub comparison_label: String,
    pub rows: Vec<DisparityLine>,
}

impl From<GroupedDisparityRows> for DisparitySection {
    fn from(group: GroupedDisparityRows) -> Self {
        Self {
            comparison_label: group.comparison_label,
            rows: group
                .rows
                .into_iter()
                .map(|row| DisparityLine {
                    disparity_ratio: row.disparity_ratio(),
                    row,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionReport {
    pub division: Division,
    pub population: Vec<ReportRow>,
    pub income_housing: Vec<ReportRow>,
    pub disparity: Vec<DisparitySection>,
    pub top_lenders: Vec<TopLenderRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    /// Aggregate snapshot the figures were read from.
    pub snapshot_generation: i64,
    pub year: Year,
    pub divisions: Vec<DivisionReport>,
}

impl ReportDocument {
    /// Compute the report inside one read transaction, so a concurrent
    /// aggregate rebuild can't change figures between divisions.
    pub fn generate(
        store: &LendStore,
        input: &ReportInput,
        config: &AnalyticsConfig,
    ) -> LendResult<ReportDocument> {
        store.begin_read()?;
        let result = Self::generate_in_snapshot(store, input, config);
        store.end_read()?;
        result
    }

    fn generate_in_snapshot(
        store: &LendStore,
        input: &ReportInput,
        config: &AnalyticsConfig,
    ) -> LendResult<ReportDocument> {
        let snapshot_generation = snapshot::current_generation(store)?;
        let lenders = input.institutions(store)?;
        log::debug!("report: {} requested lenders resolved", lenders.len());
        let divisions = input
            .divisions(store)?
            .into_iter()
            .map(|division| division_report(store, division, input, config))
            .collect::<LendResult<Vec<_>>>()?;

        let doc = ReportDocument {
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            snapshot_generation,
            year: input.year(),
            divisions,
        };
        log::info!(
            "report {}: {} divisions for {} (snapshot generation {})",
            doc.report_id,
            doc.divisions.len(),
            doc.year,
            doc.snapshot_generation
        );
        Ok(doc)
    }

    pub fn to_json(&self) -> LendResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn division_report(
    store: &LendStore,
    division: Division,
    input: &ReportInput,
    config: &AnalyticsConfig,
) -> LendResult<DivisionReport> {
    let year = input.year();
    Ok(DivisionReport {
        population: PopulationReport::generate_for(store, &division, year)?,
        income_housing: IncomeHousingReport::generate_for(store, &division, year)?,
        disparity: disparity_analyzer::groups_for(store, &division, input, config)?
            .into_iter()
            .map(DisparitySection::from)
            .collect(),
        top_lenders: TopLenderRow::generate_for(
            store,
            &division,
            input,
            config,
            config.top_lender_count,
        )?,
        division,
    })
}
