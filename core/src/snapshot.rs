//! Precomputed report aggregates.
//!
//! The population and income/housing tables, the `lar_year` list and the
//! per-lender loan counters are derived data. After every bulk load they are
//! recomputed in full and swapped in within one transaction, so a reader on
//! another connection sees either the previous generation or the new one and
//! never a mix. Nothing updates them row by row.

use crate::{
    error::LendResult,
    store::{LendStore, SnapshotMeta},
};

/// Recompute every aggregate from the base tables and publish it as the next
/// snapshot generation.
pub fn rebuild_aggregates(store: &LendStore) -> LendResult<SnapshotMeta> {
    let built_at = chrono::Utc::now().to_rfc3339();
    let (meta, county_years) = store.rebuild_report_aggregates(&built_at)?;
    log::info!(
        "snapshot: generation {} built at {} ({} county-year rows)",
        meta.generation,
        meta.built_at,
        county_years
    );
    Ok(meta)
}

/// The snapshot generation readers currently see. Zero before any rebuild.
pub fn current_generation(store: &LendStore) -> LendResult<i64> {
    Ok(store.snapshot_meta()?.map_or(0, |m| m.generation))
}
