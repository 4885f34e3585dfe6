//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine and the runner call store methods and never execute
//! SQL directly.

mod customer;
mod scoring;
mod summary;

pub use scoring::StoredScore;

use crate::error::ScoreResult;
use rusqlite::Connection;

pub struct ScoreStore {
    conn: Connection,
}

impl ScoreStore {
    /// Open (or create) the scoring database at `path`.
    pub fn open(path: &str) -> ScoreResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ScoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Run `f` inside one transaction. Any error rolls back every write
    /// made through this store while `f` ran. Not reentrant.
    pub fn transaction<T>(&self, f: impl FnOnce() -> ScoreResult<T>) -> ScoreResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f()?;
        tx.commit()?;
        Ok(out)
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> ScoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_customers.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_scoring.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_segment_summary.sql"))?;
        Ok(())
    }
}
