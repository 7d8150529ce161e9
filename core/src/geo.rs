//! Geographic divisions a report can be run for.
//!
//! A report unit is one of four division variants. Each variant has its own
//! membership rule for which counties (and so which tracts) it covers:
//!
//!   State          counties with `state_id` = the state
//!   County         the county itself
//!   Metro (CBSA)   counties with `cbsa_id` = the metro, plus counties of
//!                  any metro division belonging to it
//!   MetroDivision  counties with `metdiv_id` = the division
//!
//! The store turns a division into SQL through `Division::county_filter`;
//! nothing else needs to match on the variant to resolve membership.

use crate::types::Geoid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub geoid: Geoid,
    pub name: String,
    pub abbrev: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreBasedStatisticalArea {
    pub geoid: Geoid,
    pub name: String,
    /// False for micropolitan areas.
    pub metro: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetroDivision {
    pub geoid: Geoid,
    pub name: String,
    pub cbsa_id: Geoid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct County {
    pub geoid: Geoid,
    pub name: String,
    pub state_id: Geoid,
    pub cbsa_id: Option<Geoid>,
    pub metdiv_id: Option<Geoid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tract {
    pub geoid: Geoid,
    pub name: String,
    pub county_id: Geoid,
    pub state_id: Geoid,
}

impl Tract {
    /// Derive county and state from an 11-character tract geoid.
    pub fn from_geoid(geoid: &str) -> Option<Self> {
        if geoid.len() != 11 || !geoid.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            geoid: geoid.to_string(),
            name: String::new(),
            county_id: geoid[..5].to_string(),
            state_id: geoid[..2].to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionKind {
    State,
    County,
    Metro,
    MetroDivision,
}

impl DivisionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::County => "county",
            Self::Metro => "metro",
            Self::MetroDivision => "metro division",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Division {
    State(State),
    County(County),
    Metro(CoreBasedStatisticalArea),
    MetroDivision(MetroDivision),
}

impl Division {
    pub fn kind(&self) -> DivisionKind {
        match self {
            Self::State(_) => DivisionKind::State,
            Self::County(_) => DivisionKind::County,
            Self::Metro(_) => DivisionKind::Metro,
            Self::MetroDivision(_) => DivisionKind::MetroDivision,
        }
    }

    pub fn geoid(&self) -> &str {
        match self {
            Self::State(s) => &s.geoid,
            Self::County(c) => &c.geoid,
            Self::Metro(m) => &m.geoid,
            Self::MetroDivision(d) => &d.geoid,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::State(s) => &s.name,
            Self::County(c) => &c.name,
            Self::Metro(m) => &m.name,
            Self::MetroDivision(d) => &d.name,
        }
    }

    /// SQL predicate over `county` (aliased `c`) selecting the counties in
    /// this division, with the values for its positional parameters.
    pub(crate) fn county_filter(&self) -> (&'static str, Vec<String>) {
        match self {
            Self::State(s) => ("c.state_id = ?", vec![s.geoid.clone()]),
            Self::County(c) => ("c.geoid = ?", vec![c.geoid.clone()]),
            Self::Metro(m) => (
                "(c.cbsa_id = ? OR c.metdiv_id IN \
                 (SELECT md.geoid FROM metro_division md WHERE md.cbsa_id = ?))",
                vec![m.geoid.clone(), m.geoid.clone()],
            ),
            Self::MetroDivision(d) => ("c.metdiv_id = ?", vec![d.geoid.clone()]),
        }
    }
}
