//! HMDA loan application register records and applicant predicates.

use crate::{
    codes::{ActionTaken, ChoiceCode, Ethnicity, Race, Sex},
    types::{Geoid, InstitutionId, Year},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplicationRecord {
    pub hmda_record_id: String,
    pub as_of_year: Year,
    pub institution_id: InstitutionId,
    pub tract_id: Geoid,
    pub action_taken: u8,
    pub applicant_ethnicity: String,
    /// Up to five race codes; the first is authoritative for grouping.
    pub applicant_race_1: String,
    pub applicant_race_2: Option<String>,
    pub applicant_race_3: Option<String>,
    pub applicant_race_4: Option<String>,
    pub applicant_race_5: Option<String>,
    pub applicant_sex: u8,
    /// Thousands of dollars; `None` when not reported.
    pub applicant_income_000s: Option<i64>,
    pub loan_amount_000s: i64,
    pub lien_status: u8,
    pub loan_purpose: u8,
    pub property_type: u8,
    pub owner_occupancy: u8,
}

impl LoanApplicationRecord {
    /// Institution key used throughout HMDA extracts.
    pub fn institution_key(year: Year, agency_code: &str, respondent_id: &str) -> InstitutionId {
        format!("{year}{agency_code}{respondent_id}")
    }

    /// Record key: the institution key followed by the filer's sequence number.
    pub fn record_id(institution_id: &str, sequence_number: &str) -> String {
        format!("{institution_id}{sequence_number}")
    }

    pub fn action(&self) -> Option<ActionTaken> {
        ActionTaken::from_code(self.action_taken)
    }

    pub fn is_decided(&self) -> bool {
        self.action().is_some_and(ActionTaken::is_decided)
    }

    pub fn is_approved(&self) -> bool {
        self.action().is_some_and(ActionTaken::is_approved)
    }

    fn is_non_hispanic(&self) -> bool {
        self.applicant_ethnicity == code_str(Ethnicity::NotHispanicOrLatino)
    }

    pub fn is_hispanic(&self) -> bool {
        self.applicant_ethnicity == code_str(Ethnicity::HispanicOrLatino)
    }

    pub fn is_white(&self) -> bool {
        self.is_non_hispanic() && self.applicant_race_1 == code_str(Race::White)
    }

    pub fn is_black(&self) -> bool {
        self.is_non_hispanic() && self.applicant_race_1 == code_str(Race::Black)
    }

    pub fn is_asian(&self) -> bool {
        self.is_non_hispanic() && self.applicant_race_1 == code_str(Race::Asian)
    }

    /// Everyone outside the white (non-Hispanic) baseline.
    pub fn is_minority(&self) -> bool {
        !self.is_white()
    }

    pub fn is_male(&self) -> bool {
        self.applicant_sex == Sex::Male.code()
    }

    pub fn is_female(&self) -> bool {
        self.applicant_sex == Sex::Female.code()
    }
}

fn code_str<C: ChoiceCode>(c: C) -> String {
    c.code().to_string()
}

// SQL predicates over the `loan_application` alias `l`. They mirror the
// record methods above and are what every aggregate query filters on.

pub(crate) const APPROVED_SQL: &str = "l.action_taken = 1";
pub(crate) const WHITE_SQL: &str = "(l.applicant_ethnicity = '2' AND l.applicant_race_1 = '5')";
pub(crate) const BLACK_SQL: &str = "(l.applicant_ethnicity = '2' AND l.applicant_race_1 = '3')";
pub(crate) const HISPANIC_SQL: &str = "(l.applicant_ethnicity = '1')";
pub(crate) const ASIAN_SQL: &str = "(l.applicant_ethnicity = '2' AND l.applicant_race_1 = '2')";
pub(crate) const MINORITY_SQL: &str =
    "(NOT (l.applicant_ethnicity = '2' AND l.applicant_race_1 = '5'))";
pub(crate) const MALE_SQL: &str = "(l.applicant_sex = 1)";
pub(crate) const FEMALE_SQL: &str = "(l.applicant_sex = 2)";

/// Race/ethnicity features in report order; the first one is the baseline.
pub(crate) const RACE_FEATURES: [(&str, &str); 5] = [
    ("White", WHITE_SQL),
    ("Black", BLACK_SQL),
    ("Hispanic/Latino", HISPANIC_SQL),
    ("Asian", ASIAN_SQL),
    ("Minority", MINORITY_SQL),
];
