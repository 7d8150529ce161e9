//! Lender ownership groups and similarly-sized peers.
//!
//! Ownership is precomputed into a grouping key (`lender_hierarchy`), so an
//! affiliate lookup is one indexed query rather than a walk up parent links.

use crate::{
    config::AnalyticsConfig,
    error::LendResult,
    geo::Division,
    institution::Institution,
    lar_query::LarQuery,
    report_input::ReportInput,
    store::LendStore,
    types::{InstitutionId, Year},
};
use serde::{Deserialize, Serialize};

/// Every institution reporting in `year` that shares the lender's ownership
/// group. A lender with no recorded group is its own hierarchy.
pub fn get_lender_hierarchy(
    store: &LendStore,
    institution_id: &str,
    exclude_self: bool,
    order_by_assets: bool,
    year: Year,
) -> LendResult<Vec<Institution>> {
    let institution = store.get_institution(institution_id)?;
    let Some(organization_id) = store.organization_id_for(institution_id)? else {
        return Ok(if exclude_self { Vec::new() } else { vec![institution] });
    };
    let mut members = store.institutions_in_organization(organization_id, year, order_by_assets)?;
    if exclude_self {
        members.retain(|i| i.institution_id != institution.institution_id);
    }
    log::debug!(
        "hierarchy: {institution_id} belongs to organization {organization_id} ({} members in {year})",
        members.len()
    );
    Ok(members)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerLender {
    pub institution: Institution,
    /// Decided applications in the division for the year.
    pub volume: i64,
}

/// Lenders whose volume in the division is strictly inside the configured
/// band around the reference lender's volume. The reference lender is
/// included unless `exclude_self`. Ordered by institution id, or by volume
/// descending when `order_by_volume`.
pub fn get_peer_list(
    store: &LendStore,
    institution_id: &str,
    division: &Division,
    year: Year,
    config: &AnalyticsConfig,
    exclude_self: bool,
    order_by_volume: bool,
) -> LendResult<Vec<PeerLender>> {
    let reference = store.get_institution(institution_id)?;
    let query = LarQuery::decided(division.clone(), year);
    let volumes = store.lender_volumes(&query)?;
    let reference_volume = volumes
        .iter()
        .find(|(id, _)| *id == reference.institution_id)
        .map_or(0, |(_, v)| *v);

    let lower = config.peer_band.lower * reference_volume as f64;
    let upper = config.peer_band.upper * reference_volume as f64;

    let mut peers = Vec::new();
    for (id, volume) in volumes {
        let is_self = id == reference.institution_id;
        let in_band = (volume as f64) > lower && (volume as f64) < upper;
        if is_self || !in_band {
            continue;
        }
        peers.push(PeerLender {
            institution: store.get_institution(&id)?,
            volume,
        });
    }
    if !exclude_self {
        peers.push(PeerLender {
            institution: reference,
            volume: reference_volume,
        });
    }

    if order_by_volume {
        peers.sort_by(|a, b| {
            b.volume
                .cmp(&a.volume)
                .then_with(|| a.institution.institution_id.cmp(&b.institution.institution_id))
        });
    } else {
        peers.sort_by(|a, b| a.institution.institution_id.cmp(&b.institution.institution_id));
    }
    Ok(peers)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionPeers {
    pub division: Division,
    pub peers: Vec<PeerLender>,
}

/// A requested lender's ownership group and its peers in each division.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderGroup {
    pub institution_id: InstitutionId,
    /// Ordered by assets.
    pub hierarchy: Vec<Institution>,
    /// One entry per requested division, in report order.
    pub peers: Vec<DivisionPeers>,
}

/// Groups for every requested lender. The hierarchy does not depend on the
/// division, so it is looked up once per lender.
pub fn lender_groups(
    store: &LendStore,
    input: &ReportInput,
    config: &AnalyticsConfig,
) -> LendResult<Vec<LenderGroup>> {
    let year = input.year();
    let divisions = input.divisions(store)?;
    input
        .lenders()
        .iter()
        .map(|lender| {
            let hierarchy = get_lender_hierarchy(store, lender, false, true, year)?;
            let peers = divisions
                .iter()
                .map(|division| {
                    Ok(DivisionPeers {
                        division: division.clone(),
                        peers: get_peer_list(store, lender, division, year, config, false, true)?,
                    })
                })
                .collect::<LendResult<Vec<_>>>()?;
            Ok(LenderGroup {
                institution_id: lender.clone(),
                hierarchy,
                peers,
            })
        })
        .collect()
}
