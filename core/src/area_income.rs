//! Area median income for a division.
//!
//! Income statistics are published for metros, metro divisions and the
//! non-metro remainder of each state. A division takes the nearest enclosing
//! area that has a row for the year:
//!
//!   County         its metro division, then its metro, then its state
//!   MetroDivision  itself, then its parent metro
//!   Metro          itself
//!   State          the state's low-population row

use crate::{
    demographics::{AggDemographics, AggDemographicsSource},
    error::LendResult,
    geo::Division,
    store::LendStore,
    types::Year,
};

/// Candidate (source, geoid) pairs in precedence order.
fn candidates(division: &Division) -> Vec<(AggDemographicsSource, &str)> {
    use AggDemographicsSource::*;
    match division {
        Division::County(c) => {
            let mut out = Vec::with_capacity(3);
            if let Some(metdiv) = c.metdiv_id.as_deref() {
                out.push((MetroDivision, metdiv));
            }
            if let Some(cbsa) = c.cbsa_id.as_deref() {
                out.push((Cbsa, cbsa));
            }
            out.push((LowPopulation, c.state_id.as_str()));
            out
        }
        Division::MetroDivision(d) => {
            vec![(MetroDivision, d.geoid.as_str()), (Cbsa, d.cbsa_id.as_str())]
        }
        Division::Metro(m) => vec![(Cbsa, m.geoid.as_str())],
        Division::State(s) => vec![(LowPopulation, s.geoid.as_str())],
    }
}

/// The division's area income row for `year`, or `None` when no enclosing
/// area has one.
pub fn for_division(
    store: &LendStore,
    division: &Division,
    year: Year,
) -> LendResult<Option<AggDemographics>> {
    for (source, geoid) in candidates(division) {
        if let Some(dem) = store.agg_demographics(source, geoid, year)? {
            return Ok(Some(dem));
        }
    }
    log::warn!(
        "no area income for {} {} in {year}",
        division.kind().label(),
        division.geoid()
    );
    Ok(None)
}
