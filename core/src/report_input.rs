//! Report requests.
//!
//! `ReportRequest` is what an HTTP or CLI layer hands us: raw strings, where
//! list fields may hold repeated values, comma-joined values, or both.
//! `ReportInput` is the validated, immutable form every analytic component
//! consumes. Validation happens once, before any query runs.

use crate::{
    codes::{ChoiceCode, LienStatus, LoanPurpose, OwnerOccupancy, PropertyType},
    error::{LendError, LendResult},
    geo::Division,
    institution::Institution,
    lar_query::LarQuery,
    store::LendStore,
    types::{Geoid, InstitutionId, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    pub county: Vec<String>,
    pub metro: Vec<String>,
    pub lender: Vec<String>,
    pub year: String,
    pub lien_status: Vec<String>,
    pub loan_purpose: Vec<String>,
    pub property_type: Vec<String>,
    pub owner_occupancy: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportInput {
    counties: BTreeSet<Geoid>,
    metros: BTreeSet<Geoid>,
    lenders: BTreeSet<InstitutionId>,
    year: Year,
    lien_status: BTreeSet<LienStatus>,
    loan_purpose: BTreeSet<LoanPurpose>,
    property_type: BTreeSet<PropertyType>,
    owner_occupancy: BTreeSet<OwnerOccupancy>,
}

/// Flatten repeated and comma-joined values into trimmed, non-empty tokens.
fn tokens(raw: &[String]) -> impl Iterator<Item = &str> + '_ {
    raw.iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn digit_ids(field: &'static str, raw: &[String]) -> LendResult<BTreeSet<String>> {
    tokens(raw)
        .map(|t| {
            if t.bytes().all(|b| b.is_ascii_digit()) {
                Ok(t.to_string())
            } else {
                Err(LendError::invalid(field, t))
            }
        })
        .collect()
}

fn choices<C: ChoiceCode>(raw: &[String]) -> LendResult<BTreeSet<C>> {
    tokens(raw)
        .map(|t| C::parse(t).ok_or_else(|| LendError::invalid(C::FIELD, t)))
        .collect()
}

fn parse_year(raw: &str) -> LendResult<Year> {
    match raw.trim().parse::<i64>() {
        Ok(y) if y > 0 => Year::try_from(y).map_err(|_| LendError::invalid("year", raw)),
        _ => Err(LendError::invalid("year", raw)),
    }
}

fn codes_of<C: ChoiceCode>(set: &BTreeSet<C>) -> Vec<u8> {
    set.iter().map(|c| c.code()).collect()
}

impl ReportInput {
    pub fn from_request(request: &ReportRequest) -> LendResult<Self> {
        Ok(Self {
            year: parse_year(&request.year)?,
            counties: digit_ids("county", &request.county)?,
            metros: digit_ids("metro", &request.metro)?,
            lenders: digit_ids("lender", &request.lender)?,
            lien_status: choices(&request.lien_status)?,
            loan_purpose: choices(&request.loan_purpose)?,
            property_type: choices(&request.property_type)?,
            owner_occupancy: choices(&request.owner_occupancy)?,
        })
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn counties(&self) -> &BTreeSet<Geoid> {
        &self.counties
    }

    pub fn metros(&self) -> &BTreeSet<Geoid> {
        &self.metros
    }

    pub fn lenders(&self) -> &BTreeSet<InstitutionId> {
        &self.lenders
    }

    pub fn is_requested_lender(&self, institution_id: &str) -> bool {
        self.lenders.contains(institution_id)
    }

    /// Decided applications in `division` for the request's year, narrowed by
    /// its loan filters. Empty filter sets mean every value.
    pub fn lar_query(&self, division: &Division) -> LarQuery {
        let mut query = LarQuery::decided(division.clone(), self.year);
        query.lien_status = codes_of(&self.lien_status);
        query.loan_purpose = codes_of(&self.loan_purpose);
        query.property_type = codes_of(&self.property_type);
        query.owner_occupancy = codes_of(&self.owner_occupancy);
        query
    }

    /// Look up every requested lender. An id with no institution is NotFound.
    pub fn institutions(&self, store: &LendStore) -> LendResult<Vec<Institution>> {
        self.lenders.iter().map(|id| store.get_institution(id)).collect()
    }

    /// Resolve the requested divisions in report order: metros without
    /// divisions by name, then metro divisions by name (a metro that has
    /// divisions is reported through them), then counties by name.
    pub fn divisions(&self, store: &LendStore) -> LendResult<Vec<Division>> {
        let mut metros = Vec::new();
        let mut metdivs = Vec::new();
        for geoid in &self.metros {
            let metro = store.get_cbsa(geoid)?;
            let divisions = store.metro_divisions_of(&metro.geoid)?;
            if divisions.is_empty() {
                metros.push(metro);
            } else {
                log::debug!(
                    "report: metro {} expands to {} metro divisions",
                    metro.geoid,
                    divisions.len()
                );
                metdivs.extend(divisions);
            }
        }
        let mut counties = self
            .counties
            .iter()
            .map(|geoid| store.get_county(geoid))
            .collect::<LendResult<Vec<_>>>()?;

        metros.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.geoid.cmp(&b.geoid)));
        metdivs.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.geoid.cmp(&b.geoid)));
        metdivs.dedup_by(|a, b| a.geoid == b.geoid);
        counties.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.geoid.cmp(&b.geoid)));

        Ok(metros
            .into_iter()
            .map(Division::Metro)
            .chain(metdivs.into_iter().map(Division::MetroDivision))
            .chain(counties.into_iter().map(Division::County))
            .collect())
    }
}

impl TryFrom<&ReportRequest> for ReportInput {
    type Error = LendError;

    fn try_from(request: &ReportRequest) -> LendResult<Self> {
        Self::from_request(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(year: &str) -> ReportRequest {
        ReportRequest {
            year: year.into(),
            ..Default::default()
        }
    }

    #[test]
    fn comma_joined_and_repeated_values_merge() {
        let mut req = request("2013");
        req.county = vec!["11001,24031".into(), " 24033 ".into(), "11001".into()];
        req.loan_purpose = vec!["1,3".into()];
        let input = ReportInput::from_request(&req).unwrap();
        assert_eq!(input.counties().len(), 3);
        assert_eq!(codes_of(&input.loan_purpose), vec![1, 3]);
    }

    #[test]
    fn year_must_be_positive() {
        for bad in ["", "0", "-2013", "20x3", "70000"] {
            let err = ReportInput::from_request(&request(bad)).unwrap_err();
            assert!(matches!(err, LendError::InvalidInput { field: "year", .. }), "{bad}");
        }
    }

    #[test]
    fn filter_codes_outside_the_table_are_rejected() {
        let mut req = request("2013");
        req.property_type = vec!["1,4".into()];
        let err = ReportInput::from_request(&req).unwrap_err();
        assert!(matches!(
            err,
            LendError::InvalidInput { field: "property_type", ref value } if value == "4"
        ));
    }
}
