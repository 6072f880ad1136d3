use super::SimStore;
use crate::{error::SimResult, event::EventLogEntry, types::Day};
use rusqlite::params;

impl SimStore {
    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, day, source, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.session_id,
                entry.day as i64,
                entry.source,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_day(&self, session_id: &str, day: Day) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, day, source, event_type, payload
             FROM event_log WHERE session_id = ?1 AND day = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id, day as i64], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    session_id: row.get(1)?,
                    day: row.get::<_, i64>(2)? as u64,
                    source: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Full ordered log for a session, as (event_type, payload) pairs.
    pub fn event_log(&self, session_id: &str) -> SimResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_type, payload FROM event_log
             WHERE session_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn event_count(&self, session_id: &str, event_type: &str) -> SimResult<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1 AND event_type = ?2",
            params![session_id, event_type],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}
