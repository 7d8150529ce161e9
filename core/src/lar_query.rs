//! Filtered view of the loan application register.
//!
//! A `LarQuery` scopes loan records to one division, one year, a set of
//! action codes and the report's loan filters. It renders to a SQL WHERE
//! clause over `loan_application l`; the store executes it.

use crate::{
    codes::ActionTaken,
    geo::Division,
    types::{InstitutionId, Year},
};
use rusqlite::types::Value;

/// A SQL boolean expression with its positional parameters.
#[derive(Debug, Clone, Default)]
pub(crate) struct SqlPredicate {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlPredicate {
    pub fn fixed(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LarQuery {
    pub division: Division,
    pub year: Year,
    /// Action codes to include. Decided applications unless narrowed.
    pub actions: Vec<u8>,
    /// Empty means "all values".
    pub lien_status: Vec<u8>,
    pub loan_purpose: Vec<u8>,
    pub property_type: Vec<u8>,
    pub owner_occupancy: Vec<u8>,
    /// Restrict to these lenders. Empty means every lender.
    pub institutions: Vec<InstitutionId>,
}

impl LarQuery {
    /// Decided applications in the division for the year, with no loan
    /// filters.
    pub fn decided(division: Division, year: Year) -> Self {
        Self {
            division,
            year,
            actions: ActionTaken::decided_codes(),
            lien_status: Vec::new(),
            loan_purpose: Vec::new(),
            property_type: Vec::new(),
            owner_occupancy: Vec::new(),
            institutions: Vec::new(),
        }
    }

    pub fn for_lender(mut self, institution_id: impl Into<InstitutionId>) -> Self {
        self.institutions = vec![institution_id.into()];
        self
    }

    pub fn for_lenders(mut self, institutions: Vec<InstitutionId>) -> Self {
        self.institutions = institutions;
        self
    }

    pub fn with_actions(mut self, actions: &[u8]) -> Self {
        self.actions = actions.to_vec();
        self
    }

    pub(crate) fn predicate(&self) -> SqlPredicate {
        let (county_sql, county_params) = self.division.county_filter();
        let mut clauses = vec![
            "l.as_of_year = ?".to_string(),
            format!(
                "l.tract_id IN (SELECT t.geoid FROM tract t \
                 JOIN county c ON c.geoid = t.county_id WHERE {county_sql})"
            ),
        ];
        let mut params: Vec<Value> = vec![Value::Integer(i64::from(self.year))];
        params.extend(county_params.into_iter().map(Value::Text));

        push_in_list(&mut clauses, &mut params, "l.action_taken", &self.actions, true);
        push_in_list(&mut clauses, &mut params, "l.lien_status", &self.lien_status, false);
        push_in_list(&mut clauses, &mut params, "l.loan_purpose", &self.loan_purpose, false);
        push_in_list(&mut clauses, &mut params, "l.property_type", &self.property_type, false);
        push_in_list(&mut clauses, &mut params, "l.owner_occupancy", &self.owner_occupancy, false);

        if !self.institutions.is_empty() {
            let marks = vec!["?"; self.institutions.len()].join(", ");
            clauses.push(format!("l.institution_id IN ({marks})"));
            params.extend(self.institutions.iter().cloned().map(Value::Text));
        }

        SqlPredicate::with_params(clauses.join(" AND "), params)
    }
}

/// Append `column IN (?, ...)`. An empty set means no restriction unless
/// `required`, in which case it matches nothing.
fn push_in_list(
    clauses: &mut Vec<String>,
    params: &mut Vec<Value>,
    column: &str,
    values: &[u8],
    required: bool,
) {
    if values.is_empty() {
        if required {
            clauses.push("0".into());
        }
        return;
    }
    let marks = vec!["?"; values.len()].join(", ");
    clauses.push(format!("{column} IN ({marks})"));
    params.extend(values.iter().map(|v| Value::Integer(i64::from(*v))));
}
