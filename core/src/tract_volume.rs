//! Loan volume per tract, for mapping where a lender (or a group of lenders)
//! is active relative to the number of households.

use crate::{
    codes::{ActionTaken, ChoiceCode},
    config::AnalyticsConfig,
    error::LendResult,
    geo::{Division, DivisionKind},
    peer_resolver,
    report_input::ReportInput,
    store::LendStore,
    types::{Geoid, InstitutionId, Year},
};
use serde::{Deserialize, Serialize};

/// Which lenders' loans are counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum LenderScope {
    All,
    Lender { institution_id: InstitutionId },
    /// The lender's ownership group.
    Hierarchy { institution_id: InstitutionId },
    /// The lender's peers by volume in a metro, not counting the lender.
    Peers { institution_id: InstitutionId, metro: Geoid },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TractVolume {
    pub tract_id: Geoid,
    pub volume: i64,
    pub num_households: i64,
    /// 0 when the tract has no households on record.
    pub per_thousand_households: f64,
}

impl TractVolume {
    fn new(tract_id: Geoid, volume: i64, num_households: i64) -> Self {
        let per_thousand_households = if num_households > 0 {
            1000.0 * volume as f64 / num_households as f64
        } else {
            0.0
        };
        Self {
            tract_id,
            volume,
            num_households,
            per_thousand_households,
        }
    }
}

/// Institutions a scope narrows to. Empty means every lender. A hierarchy or
/// peer scope that resolves to nobody falls back to the lender alone.
pub fn resolve_lenders(
    store: &LendStore,
    scope: &LenderScope,
    year: Year,
    config: &AnalyticsConfig,
) -> LendResult<Vec<InstitutionId>> {
    let ids = match scope {
        LenderScope::All => return Ok(Vec::new()),
        LenderScope::Lender { institution_id } => {
            vec![store.get_institution(institution_id)?.institution_id]
        }
        LenderScope::Hierarchy { institution_id } => {
            let members = peer_resolver::get_lender_hierarchy(store, institution_id, false, false, year)?;
            if members.is_empty() {
                vec![institution_id.clone()]
            } else {
                members.into_iter().map(|i| i.institution_id).collect()
            }
        }
        LenderScope::Peers { institution_id, metro } => {
            let metro = store.get_division(DivisionKind::Metro, metro)?;
            let peers =
                peer_resolver::get_peer_list(store, institution_id, &metro, year, config, true, false)?;
            if peers.is_empty() {
                log::debug!("tract volume: {institution_id} has no peers in {}", metro.geoid());
                vec![institution_id.clone()]
            } else {
                peers.into_iter().map(|p| p.institution.institution_id).collect()
            }
        }
    };
    Ok(ids)
}

/// Per-tract volume of the request's loans in `division`, ordered by tract
/// id. `actions` narrows the action codes; empty means decided applications.
pub fn tract_volumes(
    store: &LendStore,
    division: &Division,
    input: &ReportInput,
    actions: &[ActionTaken],
    scope: &LenderScope,
    config: &AnalyticsConfig,
) -> LendResult<Vec<TractVolume>> {
    let lenders = resolve_lenders(store, scope, input.year(), config)?;
    let mut query = input.lar_query(division).for_lenders(lenders);
    if !actions.is_empty() {
        let codes: Vec<u8> = actions.iter().map(|a| a.code()).collect();
        query = query.with_actions(&codes);
    }
    let rows = store.tract_volumes(&query)?;
    log::debug!(
        "tract volume: {} {}: {} tracts with loans",
        division.kind().label(),
        division.geoid(),
        rows.len()
    );
    Ok(rows
        .into_iter()
        .map(|(tract_id, volume, households)| TractVolume::new(tract_id, volume, households))
        .collect())
}
