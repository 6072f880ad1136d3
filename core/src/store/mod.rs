//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Subsystems and the engine call store methods; they never execute SQL directly.

use crate::error::SimResult;
use rusqlite::{params, Connection};

mod event_log;
mod save_slot;

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only matters for real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(&self, session_id: &str, seed: u64, version: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session (session_id, seed, version, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_id,
                seed as i64,
                version,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }
}
