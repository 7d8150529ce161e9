use super::{required, LendStore};
use crate::{
    error::LendResult,
    institution::{Institution, LenderHierarchyEntry},
    types::Year,
};
use rusqlite::{params, OptionalExtension};

const INSTITUTION_COLUMNS: &str = "i.institution_id, i.year, i.agency_code, i.respondent_id,
    i.name, i.assets, i.rssd_id, i.parent_id, i.num_loans";

fn institution_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Institution> {
    Ok(Institution {
        institution_id: row.get(0)?,
        year: row.get(1)?,
        agency_code: row.get(2)?,
        respondent_id: row.get(3)?,
        name: row.get(4)?,
        assets: row.get(5)?,
        rssd_id: row.get(6)?,
        parent_id: row.get(7)?,
        num_loans: row.get(8)?,
    })
}

impl LendStore {
    pub fn insert_institution(&self, i: &Institution) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO institution (
                institution_id, year, agency_code, respondent_id, name, assets,
                rssd_id, parent_id, num_loans
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &i.institution_id,
                i.year,
                &i.agency_code,
                &i.respondent_id,
                &i.name,
                i.assets,
                i.rssd_id.as_deref(),
                i.parent_id.as_deref(),
                i.num_loans,
            ],
        )?;
        Ok(())
    }

    pub fn get_institution(&self, institution_id: &str) -> LendResult<Institution> {
        required(
            self.conn.query_row(
                &format!("SELECT {INSTITUTION_COLUMNS} FROM institution i WHERE i.institution_id = ?1"),
                params![institution_id],
                institution_row_mapper,
            ),
            "lender",
            institution_id,
        )
    }

    // ── Lender hierarchy ───────────────────────────────────────────

    pub fn insert_lender_hierarchy(&self, entry: &LenderHierarchyEntry) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO lender_hierarchy (institution_id, organization_id) VALUES (?1, ?2)",
            params![&entry.institution_id, entry.organization_id],
        )?;
        Ok(())
    }

    /// The institution's ownership grouping key, if one was loaded.
    pub fn organization_id_for(&self, institution_id: &str) -> LendResult<Option<i64>> {
        self.conn
            .query_row(
                "SELECT organization_id FROM lender_hierarchy
                 WHERE institution_id = ?1 ORDER BY organization_id ASC LIMIT 1",
                params![institution_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Every institution of `year` sharing the grouping key, ordered by id or,
    /// when `order_by_assets`, by assets descending with unknown assets last.
    pub fn institutions_in_organization(
        &self,
        organization_id: i64,
        year: Year,
        order_by_assets: bool,
    ) -> LendResult<Vec<Institution>> {
        let order = if order_by_assets {
            "i.assets IS NULL ASC, i.assets DESC, i.institution_id ASC"
        } else {
            "i.institution_id ASC"
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INSTITUTION_COLUMNS}
             FROM lender_hierarchy h
             JOIN institution i ON i.institution_id = h.institution_id
             WHERE h.organization_id = ?1 AND i.year = ?2
             ORDER BY {order}"
        ))?;
        let rows = stmt.query_map(params![organization_id, year], institution_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
