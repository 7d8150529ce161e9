//! HMDA respondents (lenders).

use crate::types::{InstitutionId, Year};
use serde::{Deserialize, Serialize};

/// One row per (year, agency, respondent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub institution_id: InstitutionId,
    pub year: Year,
    pub agency_code: String,
    pub respondent_id: String,
    pub name: String,
    /// Prior-year reported assets, thousands of dollars.
    pub assets: Option<i64>,
    pub rssd_id: Option<String>,
    /// Owning institution, if it also reports HMDA.
    pub parent_id: Option<InstitutionId>,
    /// Denormalized loan count, refreshed after bulk loads.
    pub num_loans: i64,
}

impl Institution {
    /// Display name with the agency/respondent suffix, e.g. "First Bank (9000001)".
    pub fn formatted_name(&self) -> String {
        format!("{} ({}{})", title_case(&self.name), self.agency_code, self.respondent_id)
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Precomputed ownership grouping: every institution whose top-level owner is
/// the same organization shares `organization_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderHierarchyEntry {
    pub institution_id: InstitutionId,
    pub organization_id: i64,
}
