//! Year-keyed census tract id corrections.
//!
//! The 2010 census published a handful of tracts with ids that later TIGER
//! releases fixed. HMDA and census extracts keep citing the original ids, so
//! every loader maps a raw id through this table before resolving the tract.
//!
//! The table is loaded once and passed explicitly; nothing here is global.

use crate::types::Year;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const BUILTIN_TABLE: &str = include_str!("../../data/tract_corrections.json");

#[derive(Debug, Deserialize)]
struct CorrectionsFile {
    changes: BTreeMap<Year, HashMap<String, Option<String>>>,
}

/// Immutable correction table: effective year -> (old id -> new id or retired).
#[derive(Debug, Clone, Default)]
pub struct TractCorrections {
    changes: BTreeMap<Year, HashMap<String, Option<String>>>,
}

impl TractCorrections {
    /// The correction table shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_TABLE)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let file: CorrectionsFile = serde_json::from_str(json)?;
        Ok(Self {
            changes: file.changes,
        })
    }

    /// Build a table from `(effective_year, old_id, new_id)` triples.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Year, S, Option<S>)>,
        S: Into<String>,
    {
        let mut changes: BTreeMap<Year, HashMap<String, Option<String>>> = BTreeMap::new();
        for (year, old, new) in entries {
            changes
                .entry(year)
                .or_default()
                .insert(old.into(), new.map(Into::into));
        }
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.values().all(HashMap::is_empty)
    }

    /// Map a raw tract id to the id valid for `year`.
    ///
    /// Corrections are applied in ascending effective-year order, skipping any
    /// that take effect after `year`. Each step looks up the id produced by the
    /// previous one. `None` means the tract was retired without replacement and
    /// the record citing it should be dropped.
    pub fn change_specific_year(&self, raw_tract_id: &str, year: Year) -> Option<String> {
        let mut current = raw_tract_id.to_string();
        for (_, table) in self.changes.range(..=year) {
            match table.get(&current) {
                Some(Some(replacement)) => current = replacement.clone(),
                Some(None) => return None,
                None => {}
            }
        }
        Some(current)
    }
}
