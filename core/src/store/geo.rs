use super::{required, LendStore};
use crate::{
    error::LendResult,
    geo::{CoreBasedStatisticalArea, County, Division, DivisionKind, MetroDivision, State, Tract},
};
use rusqlite::{params, params_from_iter};

fn county_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<County> {
    Ok(County {
        geoid: row.get(0)?,
        name: row.get(1)?,
        state_id: row.get(2)?,
        cbsa_id: row.get(3)?,
        metdiv_id: row.get(4)?,
    })
}

fn tract_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tract> {
    Ok(Tract {
        geoid: row.get(0)?,
        name: row.get(1)?,
        county_id: row.get(2)?,
        state_id: row.get(3)?,
    })
}

impl LendStore {
    // ── Inserts ────────────────────────────────────────────────────

    pub fn insert_state(&self, s: &State) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO state (geoid, name, abbrev) VALUES (?1, ?2, ?3)",
            params![&s.geoid, &s.name, &s.abbrev],
        )?;
        Ok(())
    }

    pub fn insert_cbsa(&self, m: &CoreBasedStatisticalArea) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO cbsa (geoid, name, metro) VALUES (?1, ?2, ?3)",
            params![&m.geoid, &m.name, if m.metro { 1i32 } else { 0i32 }],
        )?;
        Ok(())
    }

    pub fn insert_metro_division(&self, d: &MetroDivision) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO metro_division (geoid, name, cbsa_id) VALUES (?1, ?2, ?3)",
            params![&d.geoid, &d.name, &d.cbsa_id],
        )?;
        Ok(())
    }

    pub fn insert_county(&self, c: &County) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO county (geoid, name, state_id, cbsa_id, metdiv_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &c.geoid,
                &c.name,
                &c.state_id,
                c.cbsa_id.as_deref(),
                c.metdiv_id.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_tract(&self, t: &Tract) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO tract (geoid, name, county_id, state_id) VALUES (?1, ?2, ?3, ?4)",
            params![&t.geoid, &t.name, &t.county_id, &t.state_id],
        )?;
        Ok(())
    }

    // ── Lookups ────────────────────────────────────────────────────

    pub fn get_state(&self, geoid: &str) -> LendResult<State> {
        required(
            self.conn.query_row(
                "SELECT geoid, name, abbrev FROM state WHERE geoid = ?1",
                params![geoid],
                |row| {
                    Ok(State {
                        geoid: row.get(0)?,
                        name: row.get(1)?,
                        abbrev: row.get(2)?,
                    })
                },
            ),
            "state",
            geoid,
        )
    }

    pub fn get_cbsa(&self, geoid: &str) -> LendResult<CoreBasedStatisticalArea> {
        required(
            self.conn.query_row(
                "SELECT geoid, name, metro FROM cbsa WHERE geoid = ?1",
                params![geoid],
                |row| {
                    Ok(CoreBasedStatisticalArea {
                        geoid: row.get(0)?,
                        name: row.get(1)?,
                        metro: row.get::<_, i32>(2)? != 0,
                    })
                },
            ),
            "metro",
            geoid,
        )
    }

    pub fn get_metro_division(&self, geoid: &str) -> LendResult<MetroDivision> {
        required(
            self.conn.query_row(
                "SELECT geoid, name, cbsa_id FROM metro_division WHERE geoid = ?1",
                params![geoid],
                |row| {
                    Ok(MetroDivision {
                        geoid: row.get(0)?,
                        name: row.get(1)?,
                        cbsa_id: row.get(2)?,
                    })
                },
            ),
            "metro division",
            geoid,
        )
    }

    pub fn get_county(&self, geoid: &str) -> LendResult<County> {
        required(
            self.conn.query_row(
                "SELECT geoid, name, state_id, cbsa_id, metdiv_id FROM county WHERE geoid = ?1",
                params![geoid],
                county_row_mapper,
            ),
            "county",
            geoid,
        )
    }

    /// Look up a division of the given kind by its code.
    pub fn get_division(&self, kind: DivisionKind, geoid: &str) -> LendResult<Division> {
        Ok(match kind {
            DivisionKind::State => Division::State(self.get_state(geoid)?),
            DivisionKind::County => Division::County(self.get_county(geoid)?),
            DivisionKind::Metro => Division::Metro(self.get_cbsa(geoid)?),
            DivisionKind::MetroDivision => {
                Division::MetroDivision(self.get_metro_division(geoid)?)
            }
        })
    }

    /// Metro divisions belonging to a CBSA, ordered by name.
    pub fn metro_divisions_of(&self, cbsa_id: &str) -> LendResult<Vec<MetroDivision>> {
        let mut stmt = self.conn.prepare(
            "SELECT geoid, name, cbsa_id FROM metro_division
             WHERE cbsa_id = ?1 ORDER BY name ASC, geoid ASC",
        )?;
        let rows = stmt.query_map(params![cbsa_id], |row| {
            Ok(MetroDivision {
                geoid: row.get(0)?,
                name: row.get(1)?,
                cbsa_id: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Membership ─────────────────────────────────────────────────

    /// Counties covered by the division, ordered by geoid.
    pub fn counties_for(&self, division: &Division) -> LendResult<Vec<County>> {
        let (filter, params) = division.county_filter();
        let sql = format!(
            "SELECT c.geoid, c.name, c.state_id, c.cbsa_id, c.metdiv_id
             FROM county c WHERE {filter} ORDER BY c.geoid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), county_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every tract whose county belongs to the division, ordered by geoid.
    /// An empty division yields an empty list.
    pub fn tracts_for(&self, division: &Division) -> LendResult<Vec<Tract>> {
        let (filter, params) = division.county_filter();
        let sql = format!(
            "SELECT t.geoid, t.name, t.county_id, t.state_id
             FROM tract t JOIN county c ON c.geoid = t.county_id
             WHERE {filter} ORDER BY t.geoid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), tract_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
