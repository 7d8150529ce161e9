//! HMDA and FFIEC choice code tables.
//!
//! Every coded column of the loan application register maps to one of these
//! enums. Report filters are expressed as sets of them, so an out-of-range
//! value is rejected when the request is parsed rather than when SQL runs.

use serde::{Deserialize, Serialize};

/// A closed set of numeric HMDA codes with human-readable labels.
pub trait ChoiceCode: Sized + Copy + Ord + 'static {
    /// Column / request field the code belongs to.
    const FIELD: &'static str;

    fn code(self) -> u8;
    fn label(self) -> &'static str;
    fn all() -> &'static [Self];

    fn from_code(code: u8) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.code() == code)
    }

    /// Parse a request token such as `"2"` into a code.
    fn parse(token: &str) -> Option<Self> {
        token.trim().parse::<u8>().ok().and_then(Self::from_code)
    }
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $variant:ident = $code:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $variant ),+
        }

        impl ChoiceCode for $name {
            const FIELD: &'static str = $field;

            fn code(self) -> u8 {
                match self {
                    $( Self::$variant => $code ),+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            fn all() -> &'static [Self] {
                &[ $( Self::$variant ),+ ]
            }
        }
    };
}

choice_enum! {
    /// Outcome of an application. Codes 1-5 are decided applications.
    ActionTaken, "action_taken" {
        Originated = 1 => "Loan originated",
        ApprovedNotAccepted = 2 => "Application approved but not accepted",
        Denied = 3 => "Application denied by financial institution",
        Withdrawn = 4 => "Application withdrawn by applicant",
        ClosedIncomplete = 5 => "File closed for incompleteness",
        Purchased = 6 => "Loan purchased by the institution",
        PreapprovalDenied = 7 => "Preapproval request denied by financial institution",
        PreapprovalApprovedNotAccepted = 8 => "Preapproval request approved but not accepted",
    }
}

impl ActionTaken {
    /// Decided applications are the population every disparity metric uses.
    pub fn is_decided(self) -> bool {
        self.code() <= 5
    }

    pub fn decided_codes() -> Vec<u8> {
        Self::all()
            .iter()
            .filter(|a| a.is_decided())
            .map(|a| a.code())
            .collect()
    }

    /// "Approved" means originated, nothing else.
    pub fn is_approved(self) -> bool {
        self == Self::Originated
    }
}

choice_enum! {
    LienStatus, "lien_status" {
        FirstLien = 1 => "Secured by a first lien",
        SubordinateLien = 2 => "Secured by a subordinate lien",
        NotSecured = 3 => "Not secured by a lien",
        NotApplicable = 4 => "Not applicable (purchased loans)",
    }
}

choice_enum! {
    LoanPurpose, "loan_purpose" {
        HomePurchase = 1 => "Home purchase",
        HomeImprovement = 2 => "Home improvement",
        Refinancing = 3 => "Refinancing",
    }
}

choice_enum! {
    PropertyType, "property_type" {
        OneToFourFamily = 1 => "One to four-family (other than manufactured housing)",
        Manufactured = 2 => "Manufactured housing",
        Multifamily = 3 => "Multifamily",
    }
}

choice_enum! {
    OwnerOccupancy, "owner_occupancy" {
        OwnerOccupied = 1 => "Owner-occupied as a principal dwelling",
        NotOwnerOccupied = 2 => "Not owner-occupied",
        NotApplicable = 3 => "Not applicable",
    }
}

choice_enum! {
    Ethnicity, "applicant_ethnicity" {
        HispanicOrLatino = 1 => "Hispanic or Latino",
        NotHispanicOrLatino = 2 => "Not Hispanic or Latino",
        NotProvided = 3 => "Information not provided by applicant",
        NotApplicable = 4 => "Not applicable",
        NoCoApplicant = 5 => "No co-applicant",
    }
}

choice_enum! {
    Race, "applicant_race" {
        AmericanIndian = 1 => "American Indian or Alaska Native",
        Asian = 2 => "Asian",
        Black = 3 => "Black or African American",
        PacificIslander = 4 => "Native Hawaiian or Other Pacific Islander",
        White = 5 => "White",
        NotProvided = 6 => "Information not provided by applicant",
        NotApplicable = 7 => "Not applicable",
        NoCoApplicant = 8 => "No co-applicant",
    }
}

choice_enum! {
    Sex, "applicant_sex" {
        Male = 1 => "Male",
        Female = 2 => "Female",
        NotProvided = 3 => "Information not provided by applicant",
        NotApplicable = 4 => "Not applicable",
        NoCoApplicant = 5 => "No co-applicant",
    }
}

choice_enum! {
    Agency, "agency_code" {
        Occ = 1 => "Office of the Comptroller of the Currency (OCC)",
        Frs = 2 => "Federal Reserve System (FRS)",
        Fdic = 3 => "Federal Deposit Insurance Corporation (FDIC)",
        Ncua = 5 => "National Credit Union Administration (NCUA)",
        Hud = 7 => "Department of Housing and Urban Development (HUD)",
        Cfpb = 9 => "Consumer Financial Protection Bureau (CFPB)",
    }
}

/// FFIEC tract income category relative to area median income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeIndicator {
    Low,
    Mod,
    Mid,
    High,
}

impl IncomeIndicator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mod => "mod",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "mod" => Some(Self::Mod),
            "mid" => Some(Self::Mid),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Low-to-moderate-income tract.
    pub fn is_lmi(self) -> bool {
        matches!(self, Self::Low | Self::Mod)
    }
}
