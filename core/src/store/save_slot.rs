use super::SimStore;
use crate::error::SimResult;
use rusqlite::{params, OptionalExtension};

impl SimStore {
    /// Write (or overwrite) a keyed save slot.
    pub fn put_slot(&self, key: &str, payload: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO save_slot (slot_key, payload, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot_key) DO UPDATE SET payload = ?2, saved_at = ?3",
            params![key, payload, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_slot(&self, key: &str) -> SimResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM save_slot WHERE slot_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    /// RFC 3339 timestamp of the last write to `key`.
    pub fn slot_saved_at(&self, key: &str) -> SimResult<Option<String>> {
        let ts = self
            .conn
            .query_row(
                "SELECT saved_at FROM save_slot WHERE slot_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts)
    }

    pub fn delete_slot(&self, key: &str) -> SimResult<()> {
        self.conn
            .execute("DELETE FROM save_slot WHERE slot_key = ?1", params![key])?;
        Ok(())
    }
}
