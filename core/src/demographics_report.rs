//! Population and income/housing reports for a division.
//!
//! Both read the precomputed county-year aggregates, so the figures are those
//! of the current snapshot generation.

use crate::{
    error::LendResult,
    geo::Division,
    store::{IncomeHousingTotals, LendStore, PopulationTotals},
    types::Year,
};
use serde::{Deserialize, Serialize};

/// One `(label, count, percent)` report line. Percent is integer-truncated
/// and 0 when its denominator is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub count: i64,
    pub percent: i64,
}

impl ReportRow {
    fn new(label: &str, count: i64, denominator: i64) -> Self {
        Self {
            label: label.to_string(),
            count,
            percent: percent_of(count, denominator),
        }
    }
}

/// `100 * part // whole`, or 0 when `whole` is 0.
pub fn percent_of(part: i64, whole: i64) -> i64 {
    if whole == 0 {
        0
    } else {
        100 * part / whole
    }
}

// ── Population ───────────────────────────────────────────────────────────────

pub struct PopulationReport;

impl PopulationReport {
    /// Rows, in order: all population, white, Hispanic/Latino, black, asian,
    /// minority, poverty. Every percent is of the total population.
    pub fn generate_for(store: &LendStore, division: &Division, year: Year) -> LendResult<Vec<ReportRow>> {
        let totals = store.population_totals(division, year)?;
        Ok(Self::rows(&totals))
    }

    pub fn rows(t: &PopulationTotals) -> Vec<ReportRow> {
        [
            ("All Population", t.total),
            ("White", t.white),
            ("Hispanic/Latino", t.hispanic),
            ("Black", t.black),
            ("Asian", t.asian),
            ("Minority", t.minority),
            ("People Living in Poverty", t.poverty),
        ]
        .into_iter()
        .map(|(label, count)| ReportRow::new(label, count, t.total))
        .collect()
    }
}

// ── Income / housing ─────────────────────────────────────────────────────────

pub struct IncomeHousingReport;

impl IncomeHousingReport {
    /// Three groups, each against its own denominator: homes against
    /// single-family homes, tract counts against all tracts, population
    /// against the population of those tracts.
    pub fn generate_for(store: &LendStore, division: &Division, year: Year) -> LendResult<Vec<ReportRow>> {
        let totals = store.income_housing_totals(division, year)?;
        Ok(Self::rows(&totals))
    }

    pub fn rows(t: &IncomeHousingTotals) -> Vec<ReportRow> {
        vec![
            ReportRow::new("Single Family Homes", t.home_total, t.home_total),
            ReportRow::new("Owner Occupied Homes", t.occupied, t.home_total),
            ReportRow::new("LMI Tracts in Geography", t.lmi_tracts, t.tract_total),
            ReportRow::new("Minority Tracts in Geography", t.min_tracts, t.tract_total),
            ReportRow::new("Population in LMI Tracts", t.pop_lmi, t.pop_total),
            ReportRow::new("Population in Minority Tracts", t.pop_min, t.pop_total),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_population_gives_zero_percent() {
        let rows = PopulationReport::rows(&PopulationTotals::default());
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.count == 0 && r.percent == 0));
    }

    #[test]
    fn income_housing_groups_use_their_own_denominators() {
        let totals = IncomeHousingTotals {
            home_total: 200,
            occupied: 150,
            tract_total: 4,
            lmi_tracts: 1,
            min_tracts: 3,
            pop_total: 1000,
            pop_lmi: 100,
            pop_min: 999,
        };
        let percents: Vec<i64> = IncomeHousingReport::rows(&totals).iter().map(|r| r.percent).collect();
        assert_eq!(percents, vec![100, 75, 25, 75, 10, 99]);
    }
}
