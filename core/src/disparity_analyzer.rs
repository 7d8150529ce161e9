//! Denial-rate disparities between applicant groups.
//!
//! Every row compares a feature group against a baseline group over the same
//! set of decided applications. The ratio reported is the feature group's
//! denial rate over the baseline's denial rate, where "denied" means any
//! decided outcome other than origination.
//!
//! Groups, in report order:
//!   1. White borrowers: White, Black, Hispanic/Latino, Asian, Minority
//!   2. MUI Borrowers: LMI Applicant (only when area income is known)
//!   3. Male: Female
//!   4. MUI Tracts: Applicant in LMI Tract
//!   5. White Majority Tracts: Applicant in Minority Tract

use crate::{
    area_income,
    config::AnalyticsConfig,
    demographics::{LMI_TRACT_SQL, MINORITY_TRACT_SQL},
    error::LendResult,
    geo::Division,
    hmda::{FEMALE_SQL, MALE_SQL, RACE_FEATURES},
    lar_query::SqlPredicate,
    report_input::ReportInput,
    store::LendStore,
};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisparityRow {
    pub feature: String,
    pub feature_total: i64,
    pub feature_approved: i64,
    /// All decided applications in scope.
    pub total: i64,
    pub compare_total: i64,
    pub compare_approved: i64,
}

impl DisparityRow {
    /// Feature denial rate over baseline denial rate, to one decimal place
    /// with exact halves rounded up. "N/A" when either group is empty, or
    /// when the baseline was never denied.
    pub fn disparity_ratio(&self) -> String {
        if self.feature_total == 0 || self.compare_total == 0 {
            return "N/A".to_string();
        }
        let compare_denied = self.compare_total - self.compare_approved;
        if compare_denied == 0 {
            return "N/A".to_string();
        }
        let feature_denied = self.feature_total - self.feature_approved;
        // Integer arithmetic so ties round the same way for every input.
        let num = 10 * i128::from(feature_denied) * i128::from(self.compare_total);
        let den = i128::from(self.feature_total) * i128::from(compare_denied);
        let tenths = (2 * num + den) / (2 * den);
        format!("{}.{}", tenths / 10, tenths % 10)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedDisparityRows {
    /// Name of the baseline every row in the group is compared against.
    pub comparison_label: String,
    pub rows: Vec<DisparityRow>,
}

/// A feature group paired with its baseline.
struct FeaturePair {
    feature: &'static str,
    feature_sql: SqlPredicate,
    baseline: &'static str,
    baseline_sql: SqlPredicate,
}

fn paired_features(mui_boundary_000s: Option<i64>) -> Vec<FeaturePair> {
    let mut pairs = Vec::with_capacity(4);
    if let Some(boundary) = mui_boundary_000s {
        pairs.push(FeaturePair {
            feature: "LMI Applicant",
            feature_sql: SqlPredicate::with_params(
                "(l.applicant_income_000s < ?)",
                vec![Value::Integer(boundary)],
            ),
            baseline: "MUI Borrowers",
            baseline_sql: SqlPredicate::with_params(
                "(l.applicant_income_000s >= ?)",
                vec![Value::Integer(boundary)],
            ),
        });
    }
    pairs.push(FeaturePair {
        feature: "Female",
        feature_sql: SqlPredicate::fixed(FEMALE_SQL),
        baseline: "Male",
        baseline_sql: SqlPredicate::fixed(MALE_SQL),
    });
    // A tract with no demographics for the year is in neither tract group.
    pairs.push(FeaturePair {
        feature: "Applicant in LMI Tract",
        feature_sql: SqlPredicate::fixed(&format!("(td.tract_id IS NOT NULL AND {LMI_TRACT_SQL})")),
        baseline: "MUI Tracts",
        baseline_sql: SqlPredicate::fixed(&format!(
            "(td.tract_id IS NOT NULL AND NOT {LMI_TRACT_SQL})"
        )),
    });
    pairs.push(FeaturePair {
        feature: "Applicant in Minority Tract",
        feature_sql: SqlPredicate::fixed(&format!(
            "(td.tract_id IS NOT NULL AND {MINORITY_TRACT_SQL})"
        )),
        baseline: "White Majority Tracts",
        baseline_sql: SqlPredicate::fixed(&format!(
            "(td.tract_id IS NOT NULL AND NOT {MINORITY_TRACT_SQL})"
        )),
    });
    pairs
}

/// Compute every disparity group for one division.
pub fn groups_for(
    store: &LendStore,
    division: &Division,
    input: &ReportInput,
    config: &AnalyticsConfig,
) -> LendResult<Vec<GroupedDisparityRows>> {
    let query = input.lar_query(division);
    let boundary = area_income::for_division(store, division, input.year())?
        .map(|dem| dem.mui_boundary_000s(config.lmi_income_percent));
    let pairs = paired_features(boundary);

    let mut features: Vec<SqlPredicate> = RACE_FEATURES
        .iter()
        .map(|(_, sql)| SqlPredicate::fixed(sql))
        .collect();
    for pair in &pairs {
        features.push(pair.feature_sql.clone());
        features.push(pair.baseline_sql.clone());
    }
    let (all, counts) = store.count_features(&query, &features)?;
    log::debug!(
        "disparity: {} {} {}: {} decided applications, income split {:?}",
        division.kind().label(),
        division.geoid(),
        input.year(),
        all.total,
        boundary
    );

    let (race_counts, pair_counts) = counts.split_at(RACE_FEATURES.len());
    let white = race_counts[0];
    let mut groups = vec![GroupedDisparityRows {
        comparison_label: "White borrowers".to_string(),
        rows: RACE_FEATURES
            .iter()
            .zip(race_counts)
            .map(|((name, _), c)| DisparityRow {
                feature: name.to_string(),
                feature_total: c.total,
                feature_approved: c.approved,
                total: all.total,
                compare_total: white.total,
                compare_approved: white.approved,
            })
            .collect(),
    }];
    for (pair, c) in pairs.iter().zip(pair_counts.chunks(2)) {
        let (feature, baseline) = (c[0], c[1]);
        groups.push(GroupedDisparityRows {
            comparison_label: pair.baseline.to_string(),
            rows: vec![DisparityRow {
                feature: pair.feature.to_string(),
                feature_total: feature.total,
                feature_approved: feature.approved,
                total: all.total,
                compare_total: baseline.total,
                compare_approved: baseline.approved,
            }],
        });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(feature: (i64, i64), compare: (i64, i64)) -> DisparityRow {
        DisparityRow {
            feature: "f".into(),
            feature_total: feature.0,
            feature_approved: feature.1,
            total: feature.0 + compare.0,
            compare_total: compare.0,
            compare_approved: compare.1,
        }
    }

    #[test]
    fn ratio_is_feature_denial_over_baseline_denial() {
        assert_eq!(row((100, 75), (200, 100)).disparity_ratio(), "0.5");
        assert_eq!(row((100, 0), (200, 100)).disparity_ratio(), "2.0");
        assert_eq!(row((100, 100), (200, 100)).disparity_ratio(), "0.0");
        assert_eq!(row((100, 70), (200, 0)).disparity_ratio(), "0.3");
    }

    #[test]
    fn exact_halves_round_up() {
        // Exactly 1.15, 3.75 and 1.85.
        assert_eq!(row((20, 0), (23, 3)).disparity_ratio(), "1.2");
        assert_eq!(row((4, 0), (15, 11)).disparity_ratio(), "3.8");
        assert_eq!(row((20, 0), (37, 17)).disparity_ratio(), "1.9");
        // 0.8125
        assert_eq!(row((40, 14), (20, 4)).disparity_ratio(), "0.8");
    }

    #[test]
    fn identical_rates_give_one() {
        assert_eq!(row((30, 10), (90, 30)).disparity_ratio(), "1.0");
    }

    #[test]
    fn empty_groups_and_perfect_baseline_are_not_applicable() {
        assert_eq!(row((0, 0), (200, 100)).disparity_ratio(), "N/A");
        assert_eq!(row((100, 50), (0, 0)).disparity_ratio(), "N/A");
        assert_eq!(row((100, 50), (200, 200)).disparity_ratio(), "N/A");
    }

    #[test]
    fn income_group_only_with_boundary() {
        assert_eq!(paired_features(None).len(), 3);
        let with = paired_features(Some(51));
        assert_eq!(with.len(), 4);
        assert_eq!(with[0].baseline, "MUI Borrowers");
        assert_eq!(with[0].feature_sql.params, vec![Value::Integer(51)]);
    }
}
