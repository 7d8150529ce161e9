use super::LendStore;
use crate::{
    error::LendResult,
    hmda::{LoanApplicationRecord, APPROVED_SQL},
    lar_query::{LarQuery, SqlPredicate},
    tract_corrections::TractCorrections,
    types::{Geoid, InstitutionId, Year},
};
use rusqlite::{params, params_from_iter, types::Value, Connection};
use serde::{Deserialize, Serialize};

/// Applications and approvals matching one feature predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCount {
    pub total: i64,
    pub approved: i64,
}

/// Per-lender counts behind one top-lender row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderCounts {
    pub institution_id: InstitutionId,
    pub name: String,
    pub applications: i64,
    pub approved: i64,
    pub lmit_approved: i64,
    pub lmib_approved: i64,
    pub mint_approved: i64,
    pub minb_approved: i64,
}

/// Outcome of a reconciled loan batch load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub inserted: usize,
    /// Tract retired by a correction with no replacement.
    pub retired_tract: usize,
    pub unknown_tract: usize,
    pub unknown_institution: usize,
}

const LAR_FROM: &str = "FROM loan_application l
     LEFT JOIN tract_demographics td
       ON td.tract_id = l.tract_id AND td.year = l.as_of_year";

fn insert_loan_row(conn: &Connection, r: &LoanApplicationRecord) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO loan_application (
            hmda_record_id, as_of_year, institution_id, tract_id, action_taken,
            applicant_ethnicity, applicant_race_1, applicant_race_2, applicant_race_3,
            applicant_race_4, applicant_race_5, applicant_sex, applicant_income_000s,
            loan_amount_000s, lien_status, loan_purpose, property_type, owner_occupancy
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
    )?;
    stmt.execute(params![
        &r.hmda_record_id,
        r.as_of_year,
        &r.institution_id,
        &r.tract_id,
        r.action_taken,
        &r.applicant_ethnicity,
        &r.applicant_race_1,
        r.applicant_race_2.as_deref(),
        r.applicant_race_3.as_deref(),
        r.applicant_race_4.as_deref(),
        r.applicant_race_5.as_deref(),
        r.applicant_sex,
        r.applicant_income_000s,
        r.loan_amount_000s,
        r.lien_status,
        r.loan_purpose,
        r.property_type,
        r.owner_occupancy,
    ])
}

fn exists(conn: &Connection, sql: &str, key: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare_cached(sql)?;
    let n: i64 = stmt.query_row(params![key], |row| row.get(0))?;
    Ok(n > 0)
}

impl LendStore {
    /// Insert one record as-is; its tract id must already be reconciled.
    pub fn insert_loan(&self, r: &LoanApplicationRecord) -> LendResult<()> {
        insert_loan_row(&self.conn, r)?;
        Ok(())
    }

    /// Load a batch of records whose `tract_id` holds the raw id cited by the
    /// extract. Each id is reconciled for the record's year; records on a
    /// retired tract, or citing a tract or lender we don't have, are dropped.
    /// The batch commits as one transaction.
    pub fn ingest_loans(
        &self,
        records: &[LoanApplicationRecord],
        corrections: &TractCorrections,
    ) -> LendResult<IngestSummary> {
        let summary = self.in_transaction(|conn| {
            let mut summary = IngestSummary::default();
            for raw in records {
                let Some(tract_id) = corrections.change_specific_year(&raw.tract_id, raw.as_of_year)
                else {
                    log::debug!(
                        "ingest: dropping {} (tract {} retired by {})",
                        raw.hmda_record_id,
                        raw.tract_id,
                        raw.as_of_year
                    );
                    summary.retired_tract += 1;
                    continue;
                };
                if !exists(conn, "SELECT COUNT(*) FROM tract WHERE geoid = ?1", &tract_id)? {
                    summary.unknown_tract += 1;
                    continue;
                }
                if !exists(
                    conn,
                    "SELECT COUNT(*) FROM institution WHERE institution_id = ?1",
                    &raw.institution_id,
                )? {
                    summary.unknown_institution += 1;
                    continue;
                }
                let mut record = raw.clone();
                record.tract_id = tract_id;
                insert_loan_row(conn, &record)?;
                summary.inserted += 1;
            }
            Ok(summary)
        })?;
        log::info!(
            "ingest: inserted {} loan records (retired tract {}, unknown tract {}, unknown lender {})",
            summary.inserted,
            summary.retired_tract,
            summary.unknown_tract,
            summary.unknown_institution
        );
        Ok(summary)
    }

    pub fn loan_count(&self, year: Year) -> LendResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM loan_application WHERE as_of_year = ?1",
            params![year],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    // ── Aggregates over a LarQuery ─────────────────────────────────

    /// Count all matching applications and, for each feature, the matching
    /// applications and approvals. Features may reference `l` and `td`.
    pub(crate) fn count_features(
        &self,
        query: &LarQuery,
        features: &[SqlPredicate],
    ) -> LendResult<(FeatureCount, Vec<FeatureCount>)> {
        let mut columns = vec![
            "COUNT(*)".to_string(),
            format!("COALESCE(SUM(CASE WHEN {APPROVED_SQL} THEN 1 ELSE 0 END), 0)"),
        ];
        let mut params: Vec<Value> = Vec::new();
        for f in features {
            columns.push(format!("COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0)", f.sql));
            params.extend(f.params.iter().cloned());
            columns.push(format!(
                "COALESCE(SUM(CASE WHEN {} AND {APPROVED_SQL} THEN 1 ELSE 0 END), 0)",
                f.sql
            ));
            params.extend(f.params.iter().cloned());
        }
        let scope = query.predicate();
        params.extend(scope.params);
        let sql = format!(
            "SELECT {} {LAR_FROM} WHERE {}",
            columns.join(", "),
            scope.sql
        );

        let values: Vec<i64> = self.conn.query_row(&sql, params_from_iter(params.iter()), |row| {
            (0..columns.len()).map(|i| row.get::<_, i64>(i)).collect()
        })?;
        let all = FeatureCount {
            total: values[0],
            approved: values[1],
        };
        let per_feature = values[2..]
            .chunks(2)
            .map(|pair| FeatureCount {
                total: pair[0],
                approved: pair[1],
            })
            .collect();
        Ok((all, per_feature))
    }

    /// Count and loan volume (in $000s) of all matching applications, then
    /// of each feature.
    pub(crate) fn feature_volumes(
        &self,
        query: &LarQuery,
        features: &[SqlPredicate],
    ) -> LendResult<Vec<(i64, i64)>> {
        let mut columns = vec![
            "COUNT(*)".to_string(),
            "COALESCE(SUM(l.loan_amount_000s), 0)".to_string(),
        ];
        let mut params: Vec<Value> = Vec::new();
        for f in features {
            columns.push(format!("COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0)", f.sql));
            params.extend(f.params.iter().cloned());
            columns.push(format!(
                "COALESCE(SUM(CASE WHEN {} THEN l.loan_amount_000s ELSE 0 END), 0)",
                f.sql
            ));
            params.extend(f.params.iter().cloned());
        }
        let scope = query.predicate();
        params.extend(scope.params);
        let sql = format!(
            "SELECT {} {LAR_FROM} WHERE {}",
            columns.join(", "),
            scope.sql
        );

        let values: Vec<i64> = self.conn.query_row(&sql, params_from_iter(params.iter()), |row| {
            (0..columns.len()).map(|i| row.get::<_, i64>(i)).collect()
        })?;
        Ok(values.chunks(2).map(|pair| (pair[0], pair[1])).collect())
    }

    /// Per-lender application and approval breakdown, ordered by application
    /// volume descending then institution id.
    pub(crate) fn lender_counts(
        &self,
        query: &LarQuery,
        lmi_tract: &SqlPredicate,
        lmi_applicant: &SqlPredicate,
        minority_tract: &SqlPredicate,
        minority_applicant: &SqlPredicate,
    ) -> LendResult<Vec<LenderCounts>> {
        let approved_and = |p: &SqlPredicate| {
            format!("COALESCE(SUM(CASE WHEN {APPROVED_SQL} AND {} THEN 1 ELSE 0 END), 0)", p.sql)
        };
        let mut params: Vec<Value> = Vec::new();
        for p in [lmi_tract, lmi_applicant, minority_tract, minority_applicant] {
            params.extend(p.params.iter().cloned());
        }
        let scope = query.predicate();
        params.extend(scope.params);
        let sql = format!(
            "SELECT l.institution_id, i.name, COUNT(*) AS applications,
                    COALESCE(SUM(CASE WHEN {APPROVED_SQL} THEN 1 ELSE 0 END), 0),
                    {}, {}, {}, {}
             {LAR_FROM}
             JOIN institution i ON i.institution_id = l.institution_id
             WHERE {}
             GROUP BY l.institution_id, i.name
             ORDER BY applications DESC, l.institution_id ASC",
            approved_and(lmi_tract),
            approved_and(lmi_applicant),
            approved_and(minority_tract),
            approved_and(minority_applicant),
            scope.sql
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Ok(LenderCounts {
                institution_id: row.get(0)?,
                name: row.get(1)?,
                applications: row.get(2)?,
                approved: row.get(3)?,
                lmit_approved: row.get(4)?,
                lmib_approved: row.get(5)?,
                mint_approved: row.get(6)?,
                minb_approved: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Matching application count and household count per tract, ordered by
    /// tract id. A tract without demographics for the year has 0 households.
    pub(crate) fn tract_volumes(&self, query: &LarQuery) -> LendResult<Vec<(Geoid, i64, i64)>> {
        let scope = query.predicate();
        let sql = format!(
            "SELECT l.tract_id, COUNT(*) AS volume, COALESCE(MAX(td.households), 0)
             {LAR_FROM}
             WHERE {}
             GROUP BY l.tract_id
             ORDER BY l.tract_id ASC",
            scope.sql
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(scope.params.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Matching application count per lender, largest first.
    pub(crate) fn lender_volumes(&self, query: &LarQuery) -> LendResult<Vec<(InstitutionId, i64)>> {
        let scope = query.predicate();
        let sql = format!(
            "SELECT l.institution_id, COUNT(*) AS volume
             FROM loan_application l
             WHERE {}
             GROUP BY l.institution_id
             ORDER BY volume DESC, l.institution_id ASC",
            scope.sql
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(scope.params.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
