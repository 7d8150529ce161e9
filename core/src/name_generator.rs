//! Deterministic lender and place names for synthetic datasets.
//!
//! All generation is deterministic (same RNG seed = same names).

use crate::rng::SynthRng;

/// Deterministic name generator using curated word lists
pub struct NameGenerator;

impl NameGenerator {
    /// Lender name such as "FIRST HARBOR SAVINGS BANK". HMDA respondent names
    /// are reported upper-case.
    pub fn generate_lender_name(rng: &mut SynthRng) -> String {
        let prefix = *rng.pick(Self::lender_prefixes());
        let core = *rng.pick(Self::lender_cores());
        let suffix = *rng.pick(Self::lender_suffixes());
        if rng.chance(0.5) {
            format!("{prefix} {core} {suffix}").to_uppercase()
        } else {
            format!("{core} {suffix}").to_uppercase()
        }
    }

    /// Place name for a county or metro, e.g. "Cedar Falls".
    pub fn generate_place_name(rng: &mut SynthRng) -> String {
        let stem = *rng.pick(Self::place_stems());
        let tail = *rng.pick(Self::place_tails());
        format!("{stem} {tail}")
    }

    /// Lender name prefixes
    fn lender_prefixes() -> &'static [&'static str] {
        &[
            "First", "Citizens", "Peoples", "Farmers", "Home", "Community",
            "United", "Heritage", "Liberty", "Pioneer", "Security", "Union",
            "Commerce", "Merchants", "Guaranty", "Republic",
        ]
    }

    /// Lender name cores
    fn lender_cores() -> &'static [&'static str] {
        &[
            "Harbor", "Valley", "Summit", "Prairie", "River", "Lakeside",
            "Capital", "Keystone", "Bay", "Frontier", "Mountain", "Coastal",
            "Midland", "Central", "Northern", "Southern",
        ]
    }

    /// Lender name suffixes
    fn lender_suffixes() -> &'static [&'static str] {
        &[
            "Bank", "National Bank", "Savings Bank", "Bank and Trust",
            "Federal Credit Union", "Mortgage Company", "Home Loans",
            "Savings and Loan", "Mortgage Corporation",
        ]
    }

    /// Place name stems
    fn place_stems() -> &'static [&'static str] {
        &[
            "Cedar", "Oak", "Maple", "Pine", "Elm", "Willow", "Granite", "Silver",
            "Clear", "Red", "Green", "Spring", "Fair", "Bright", "Stone", "Iron",
        ]
    }

    /// Place name tails
    fn place_tails() -> &'static [&'static str] {
        &[
            "Falls", "Ridge", "Creek", "Springs", "Hills", "Harbor", "Point",
            "Valley", "Crossing", "Meadows", "Heights", "Park",
        ]
    }
}
