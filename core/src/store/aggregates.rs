use super::LendStore;
use crate::{
    demographics::{LMI_TRACT_SQL, MINORITY_TRACT_SQL},
    error::LendResult,
    geo::Division,
    types::Year,
};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationTotals {
    pub total: i64,
    pub white: i64,
    pub hispanic: i64,
    pub black: i64,
    pub asian: i64,
    pub minority: i64,
    pub poverty: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeHousingTotals {
    pub home_total: i64,
    pub occupied: i64,
    pub tract_total: i64,
    pub lmi_tracts: i64,
    pub min_tracts: i64,
    pub pop_total: i64,
    pub pop_lmi: i64,
    pub pop_min: i64,
}

/// Which rebuild of the aggregate tables a reader is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub generation: i64,
    pub built_at: String,
}

fn population_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            county_id TEXT NOT NULL, year INTEGER NOT NULL,
            total INTEGER NOT NULL, white INTEGER NOT NULL, hispanic INTEGER NOT NULL,
            black INTEGER NOT NULL, asian INTEGER NOT NULL, minority INTEGER NOT NULL,
            poverty INTEGER NOT NULL,
            PRIMARY KEY (county_id, year)
        )"
    )
}

fn income_housing_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            county_id TEXT NOT NULL, year INTEGER NOT NULL,
            home_total INTEGER NOT NULL, occupied INTEGER NOT NULL,
            tract_total INTEGER NOT NULL, lmi_tracts INTEGER NOT NULL,
            min_tracts INTEGER NOT NULL, pop_total INTEGER NOT NULL,
            pop_lmi INTEGER NOT NULL, pop_min INTEGER NOT NULL,
            PRIMARY KEY (county_id, year)
        )"
    )
}

/// Build `{table}_next` from the current tract rows, then replace `{table}`
/// with it. Runs inside the caller's transaction.
fn swap_in(conn: &Connection, table: &str, ddl: String, fill: String) -> rusqlite::Result<usize> {
    let next = format!("{table}_next");
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {next};"))?;
    conn.execute_batch(&ddl)?;
    let rows = conn.execute(&fill, [])?;
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table}; ALTER TABLE {next} RENAME TO {table};"
    ))?;
    Ok(rows)
}

impl LendStore {
    /// Recompute every report aggregate and denormalized counter from the
    /// base tables and swap the results in with one transaction. Readers on
    /// other connections keep seeing the previous generation until commit.
    pub fn rebuild_report_aggregates(&self, built_at: &str) -> LendResult<(SnapshotMeta, usize)> {
        self.in_transaction(|conn| {
            let population_rows = swap_in(
                conn,
                "population_report",
                population_ddl("population_report_next"),
                "INSERT INTO population_report_next
                    (county_id, year, total, white, hispanic, black, asian, minority, poverty)
                 SELECT t.county_id, td.year, SUM(td.persons), SUM(td.non_hispanic_white),
                        SUM(td.hispanic_only), SUM(td.black), SUM(td.asian),
                        SUM(td.persons - td.non_hispanic_white), SUM(td.poverty)
                 FROM tract_demographics td JOIN tract t ON t.geoid = td.tract_id
                 GROUP BY t.county_id, td.year"
                    .to_string(),
            )?;
            swap_in(
                conn,
                "income_housing_report",
                income_housing_ddl("income_housing_report_next"),
                format!(
                    "INSERT INTO income_housing_report_next
                        (county_id, year, home_total, occupied, tract_total, lmi_tracts,
                         min_tracts, pop_total, pop_lmi, pop_min)
                     SELECT t.county_id, td.year,
                            SUM(td.single_family_homes), SUM(td.single_family_occupied),
                            COUNT(*),
                            SUM(CASE WHEN {LMI_TRACT_SQL} THEN 1 ELSE 0 END),
                            SUM(CASE WHEN {MINORITY_TRACT_SQL} THEN 1 ELSE 0 END),
                            SUM(td.persons),
                            SUM(CASE WHEN {LMI_TRACT_SQL} THEN td.persons ELSE 0 END),
                            SUM(CASE WHEN {MINORITY_TRACT_SQL} THEN td.persons ELSE 0 END)
                     FROM tract_demographics td JOIN tract t ON t.geoid = td.tract_id
                     GROUP BY t.county_id, td.year"
                ),
            )?;

            conn.execute_batch(
                "DELETE FROM lar_year;
                 INSERT INTO lar_year (year) SELECT DISTINCT as_of_year FROM loan_application;
                 UPDATE institution SET num_loans = (
                     SELECT COUNT(*) FROM loan_application l
                     WHERE l.institution_id = institution.institution_id
                 );",
            )?;

            conn.execute(
                "INSERT INTO snapshot_meta (id, generation, built_at) VALUES (1, 1, ?1)
                 ON CONFLICT(id) DO UPDATE SET
                     generation = snapshot_meta.generation + 1,
                     built_at = excluded.built_at",
                params![built_at],
            )?;
            let meta = conn.query_row(
                "SELECT generation, built_at FROM snapshot_meta WHERE id = 1",
                [],
                |row| {
                    Ok(SnapshotMeta {
                        generation: row.get(0)?,
                        built_at: row.get(1)?,
                    })
                },
            )?;
            Ok((meta, population_rows))
        })
    }

    /// The generation readers currently see; `None` before the first rebuild.
    pub fn snapshot_meta(&self) -> LendResult<Option<SnapshotMeta>> {
        self.conn
            .query_row(
                "SELECT generation, built_at FROM snapshot_meta WHERE id = 1",
                [],
                |row| {
                    Ok(SnapshotMeta {
                        generation: row.get(0)?,
                        built_at: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Years with loan data, most recent first.
    pub fn lar_years(&self) -> LendResult<Vec<Year>> {
        let mut stmt = self.conn.prepare("SELECT year FROM lar_year ORDER BY year DESC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn population_totals(&self, division: &Division, year: Year) -> LendResult<PopulationTotals> {
        let (filter, county_params) = division.county_filter();
        let sql = format!(
            "SELECT COALESCE(SUM(p.total), 0), COALESCE(SUM(p.white), 0),
                    COALESCE(SUM(p.hispanic), 0), COALESCE(SUM(p.black), 0),
                    COALESCE(SUM(p.asian), 0), COALESCE(SUM(p.minority), 0),
                    COALESCE(SUM(p.poverty), 0)
             FROM population_report p JOIN county c ON c.geoid = p.county_id
             WHERE p.year = ? AND {filter}"
        );
        let mut params = vec![Value::Integer(i64::from(year))];
        params.extend(county_params.into_iter().map(Value::Text));
        let totals = self.conn.query_row(&sql, params_from_iter(params.iter()), |row| {
            Ok(PopulationTotals {
                total: row.get(0)?,
                white: row.get(1)?,
                hispanic: row.get(2)?,
                black: row.get(3)?,
                asian: row.get(4)?,
                minority: row.get(5)?,
                poverty: row.get(6)?,
            })
        })?;
        Ok(totals)
    }

    pub fn income_housing_totals(
        &self,
        division: &Division,
        year: Year,
    ) -> LendResult<IncomeHousingTotals> {
        let (filter, county_params) = division.county_filter();
        let sql = format!(
            "SELECT COALESCE(SUM(r.home_total), 0), COALESCE(SUM(r.occupied), 0),
                    COALESCE(SUM(r.tract_total), 0), COALESCE(SUM(r.lmi_tracts), 0),
                    COALESCE(SUM(r.min_tracts), 0), COALESCE(SUM(r.pop_total), 0),
                    COALESCE(SUM(r.pop_lmi), 0), COALESCE(SUM(r.pop_min), 0)
             FROM income_housing_report r JOIN county c ON c.geoid = r.county_id
             WHERE r.year = ? AND {filter}"
        );
        let mut params = vec![Value::Integer(i64::from(year))];
        params.extend(county_params.into_iter().map(Value::Text));
        let totals = self.conn.query_row(&sql, params_from_iter(params.iter()), |row| {
            Ok(IncomeHousingTotals {
                home_total: row.get(0)?,
                occupied: row.get(1)?,
                tract_total: row.get(2)?,
                lmi_tracts: row.get(3)?,
                min_tracts: row.get(4)?,
                pop_total: row.get(5)?,
                pop_lmi: row.get(6)?,
                pop_min: row.get(7)?,
            })
        })?;
        Ok(totals)
    }
}
