//! Shared primitive types used across the analytics core.

/// A HMDA / census reporting year.
pub type Year = u16;

/// A census geographic identifier (state, county, CBSA, metro division or tract).
pub type Geoid = String;

/// Institution key: reporting year + agency code + respondent id.
pub type InstitutionId = String;
