//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Analytic components call store methods and never execute SQL directly.

use crate::error::{LendError, LendResult};
mod aggregates;
mod demographics;
mod geo;
mod hmda;
mod institution;
use rusqlite::Connection;

pub use aggregates::{IncomeHousingTotals, PopulationTotals, SnapshotMeta};
pub use hmda::{FeatureCount, IngestSummary, LenderCounts};

pub struct LendStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl LendStore {
    pub fn open(path: &str) -> LendResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        // Readers keep a consistent snapshot while an aggregate rebuild commits.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LendResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> LendResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> LendResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_geo.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_demographics.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_institutions.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_hmda.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/005_report_aggregates.sql"))?;
        Ok(())
    }

    /// Run `f` inside a single transaction; committed only if `f` succeeds.
    pub(crate) fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> LendResult<T>,
    ) -> LendResult<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("rollback failed after {e}: {rollback}");
                }
                Err(e)
            }
        }
    }

    /// Open a read transaction so every query until `end_read` sees one
    /// consistent snapshot of the database.
    pub fn begin_read(&self) -> LendResult<()> {
        self.conn.execute_batch("BEGIN DEFERRED")?;
        Ok(())
    }

    pub fn end_read(&self) -> LendResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }
}

/// Map "no rows" to the distinct not-found condition.
pub(crate) fn required<T>(
    result: rusqlite::Result<T>,
    kind: &'static str,
    id: &str,
) -> LendResult<T> {
    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(LendError::not_found(kind, id)),
        Err(e) => Err(e.into()),
    }
}
