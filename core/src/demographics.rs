//! FFIEC census demographics at tract and area level.

use crate::{codes::IncomeIndicator, types::{Geoid, Year}};
use serde::{Deserialize, Serialize};

/// One row per (tract, year). Loaded in bulk and never updated afterwards;
/// a reload for a new year adds rows under the new year key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TractDemographics {
    pub tract_id: Geoid,
    pub year: Year,
    pub income_indicator: IncomeIndicator,
    pub persons: i64,
    pub females: i64,
    pub males: i64,
    pub non_hispanic_white: i64,
    pub hispanic_only: i64,
    pub black: i64,
    pub asian: i64,
    pub american_indian: i64,
    pub pacific_islander: i64,
    pub poverty: i64,
    pub households: i64,
    pub poverty_households: i64,
    pub single_family_homes: i64,
    pub single_family_occupied: i64,
    pub male_adult: i64,
    pub male_employed: i64,
    pub female_adult: i64,
    pub female_employed: i64,
    pub median_family_income: i64,
}

impl TractDemographics {
    /// A zeroed row, convenient as a base for building fixtures.
    pub fn empty(tract_id: impl Into<Geoid>, year: Year, income_indicator: IncomeIndicator) -> Self {
        Self {
            tract_id: tract_id.into(),
            year,
            income_indicator,
            persons: 0,
            females: 0,
            males: 0,
            non_hispanic_white: 0,
            hispanic_only: 0,
            black: 0,
            asian: 0,
            american_indian: 0,
            pacific_islander: 0,
            poverty: 0,
            households: 0,
            poverty_households: 0,
            single_family_homes: 0,
            single_family_occupied: 0,
            male_adult: 0,
            male_employed: 0,
            female_adult: 0,
            female_employed: 0,
            median_family_income: 0,
        }
    }

    pub fn is_lmi(&self) -> bool {
        self.income_indicator.is_lmi()
    }

    /// Strictly less than half of the population is non-Hispanic white.
    /// A tract at exactly 50% white is not a minority tract.
    pub fn is_minority(&self) -> bool {
        2 * self.non_hispanic_white < self.persons
    }
}

/// SQL form of `TractDemographics::is_minority` over alias `td`.
pub(crate) const MINORITY_TRACT_SQL: &str = "(2 * td.non_hispanic_white < td.persons)";
/// SQL form of `TractDemographics::is_lmi` over alias `td`.
pub(crate) const LMI_TRACT_SQL: &str = "(td.income_indicator IN ('low', 'mod'))";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggDemographicsSource {
    MetroDivision,
    Cbsa,
    LowPopulation,
}

/// Area-level income statistics for a metro, metro division, or the
/// low-population (non-metro) remainder of a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggDemographics {
    pub source: AggDemographicsSource,
    pub geoid: Geoid,
    pub year: Year,
    pub median_family_income: i64,
    pub median_household_income: i64,
    /// FFIEC estimated median family income, in dollars.
    pub ffiec_est_med_fam_income: i64,
}

impl AggDemographics {
    /// Applicant income boundary in thousands of dollars: incomes below it are
    /// LMI, incomes at or above it are MUI.
    pub fn mui_boundary_000s(&self, lmi_income_percent: i64) -> i64 {
        self.ffiec_est_med_fam_income * lmi_income_percent / 100 / 1000
    }
}
