mod common;

use common::*;
use fairlend_core::{
    config::AnalyticsConfig,
    geo::DivisionKind,
    institution::Institution,
    peer_resolver::{get_lender_hierarchy, get_peer_list, lender_groups, PeerLender},
    report_input::{ReportInput, ReportRequest},
    store::LendStore,
};

const DC_TRACT: &str = "11001000100";

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ids(institutions: &[Institution]) -> Vec<&str> {
    institutions.iter().map(|i| i.institution_id.as_str()).collect()
}

fn peer_ids(peers: &[PeerLender]) -> Vec<(&str, i64)> {
    peers
        .iter()
        .map(|p| (p.institution.institution_id.as_str(), p.volume))
        .collect()
}

fn add_lender_with_assets(store: &LendStore, respondent: u32, assets: Option<i64>) -> String {
    let institution_id = lender_id(2013, respondent);
    store
        .insert_institution(&Institution {
            institution_id: institution_id.clone(),
            year: 2013,
            agency_code: "9".into(),
            respondent_id: format!("{respondent:010}"),
            name: format!("Bank {respondent}"),
            assets,
            rssd_id: None,
            parent_id: None,
            num_loans: 0,
        })
        .unwrap();
    institution_id
}

/// One lender per volume, respondents numbered from 1, all lending in DC.
fn lenders_with_volumes(store: &LendStore, volumes: &[usize]) -> Vec<String> {
    add_tract(store, DC_TRACT);
    volumes
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            let id = add_lender(store, 2013, i as u32 + 1, &format!("Lender {}", i + 1));
            add_loans(store, n, &loan(&id, DC_TRACT, 2013));
            id
        })
        .collect()
}

fn peers(store: &LendStore, id: &str, exclude_self: bool, order_by_volume: bool) -> Vec<PeerLender> {
    let county = division(store, DivisionKind::County, DC);
    get_peer_list(
        store,
        id,
        &county,
        2013,
        &AnalyticsConfig::default_test(),
        exclude_self,
        order_by_volume,
    )
    .unwrap()
}

// ── Tests: hierarchy ─────────────────────────────────────────────────────────

#[test]
fn lender_without_group_is_its_own_hierarchy() {
    let store = store();
    let a = add_lender(&store, 2013, 1, "Solo Bank");

    let with_self = get_lender_hierarchy(&store, &a, false, false, 2013).unwrap();
    assert_eq!(ids(&with_self), vec![a.as_str()]);

    let without = get_lender_hierarchy(&store, &a, true, false, 2013).unwrap();
    assert!(without.is_empty());
}

#[test]
fn hierarchy_lists_group_members_for_the_year() {
    let store = store();
    let small = add_lender_with_assets(&store, 1, Some(100));
    let unknown = add_lender_with_assets(&store, 2, None);
    let large = add_lender_with_assets(&store, 3, Some(500));
    let outsider = add_lender_with_assets(&store, 4, Some(900));
    let last_year = add_lender(&store, 2012, 5, "Old Affiliate");
    for id in [&small, &unknown, &large, &last_year] {
        set_organization(&store, id, 77);
    }
    set_organization(&store, &outsider, 78);

    let by_id = get_lender_hierarchy(&store, &small, false, false, 2013).unwrap();
    assert_eq!(ids(&by_id), vec![small.as_str(), unknown.as_str(), large.as_str()]);

    let by_assets = get_lender_hierarchy(&store, &small, false, true, 2013).unwrap();
    assert_eq!(ids(&by_assets), vec![large.as_str(), small.as_str(), unknown.as_str()]);

    let others = get_lender_hierarchy(&store, &small, true, true, 2013).unwrap();
    assert_eq!(ids(&others), vec![large.as_str(), unknown.as_str()]);
}

#[test]
fn hierarchy_of_unknown_lender_is_not_found() {
    let store = store();
    let err = get_lender_hierarchy(&store, "20139404", false, false, 2013).unwrap_err();
    assert!(err.is_not_found());
}

// ── Tests: peers ─────────────────────────────────────────────────────────────

/// Reference volume 6 gives an open band (3, 12).
#[test]
fn peers_are_strictly_inside_the_volume_band() {
    let store = store();
    let l = lenders_with_volumes(&store, &[6, 4, 2, 13, 5]);

    let by_id = peers(&store, &l[0], false, false);
    assert_eq!(peer_ids(&by_id), vec![(l[0].as_str(), 6), (l[1].as_str(), 4), (l[4].as_str(), 5)]);

    let by_volume = peers(&store, &l[0], false, true);
    assert_eq!(
        peer_ids(&by_volume),
        vec![(l[0].as_str(), 6), (l[4].as_str(), 5), (l[1].as_str(), 4)]
    );

    let others = peers(&store, &l[0], true, true);
    assert_eq!(peer_ids(&others), vec![(l[4].as_str(), 5), (l[1].as_str(), 4)]);
}

#[test]
fn band_edges_are_excluded() {
    let store = store();
    let l = lenders_with_volumes(&store, &[10, 5, 20, 6, 19]);

    let found = peers(&store, &l[0], true, false);
    assert_eq!(peer_ids(&found), vec![(l[3].as_str(), 6), (l[4].as_str(), 19)]);
}

#[test]
fn lender_without_volume_has_only_itself() {
    let store = store();
    let l = lenders_with_volumes(&store, &[0, 3, 1]);

    let found = peers(&store, &l[0], false, true);
    assert_eq!(peer_ids(&found), vec![(l[0].as_str(), 0)]);
    assert!(peers(&store, &l[0], true, true).is_empty());
}

#[test]
fn peer_volume_ignores_other_years_and_undecided_actions() {
    let store = store();
    let l = lenders_with_volumes(&store, &[4, 4]);
    add_loans(&store, 10, &loan(&l[1], DC_TRACT, 2012));
    let mut purchased = loan(&l[1], DC_TRACT, 2013);
    purchased.action_taken = 6;
    add_loans(&store, 10, &purchased);

    let found = peers(&store, &l[0], true, false);
    assert_eq!(peer_ids(&found), vec![(l[1].as_str(), 4)]);
}

#[test]
fn peers_of_unknown_lender_is_not_found() {
    let store = store();
    add_tract(&store, DC_TRACT);
    let county = division(&store, DivisionKind::County, DC);
    let err = get_peer_list(
        &store,
        "20139404",
        &county,
        2013,
        &AnalyticsConfig::default_test(),
        false,
        false,
    )
    .unwrap_err();
    assert!(err.is_not_found());
}

// ── Tests: report lender groups ──────────────────────────────────────────────

#[test]
fn one_group_per_lender_with_peers_per_division() {
    let store = store();
    let lenders = lenders_with_volumes(&store, &[6, 4]);
    set_organization(&store, &lenders[0], 5);
    set_organization(&store, &lenders[1], 5);
    let outsider = add_lender(&store, 2013, 9, "Maryland Bank");
    add_tract(&store, "24031700100");
    add_loans(&store, 3, &loan(&outsider, "24031700100", 2013));

    let input = ReportInput::from_request(&ReportRequest {
        year: "2013".into(),
        county: vec![format!("{DC},{MONTGOMERY}")],
        lender: vec![lenders[0].clone()],
        ..Default::default()
    })
    .unwrap();
    let groups = lender_groups(&store, &input, &AnalyticsConfig::default_test()).unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.institution_id, lenders[0]);
    assert_eq!(ids(&group.hierarchy).len(), 2);

    let per_division: Vec<(&str, Vec<(&str, i64)>)> = group
        .peers
        .iter()
        .map(|p| (p.division.geoid(), peer_ids(&p.peers)))
        .collect();
    assert_eq!(
        per_division,
        vec![
            (DC, vec![(lenders[0].as_str(), 6), (lenders[1].as_str(), 4)]),
            (MONTGOMERY, vec![(lenders[0].as_str(), 0)]),
        ]
    );
}
