//! Snapshot serialization: full session state to/from JSON.
//!
//! A snapshot is a single JSON object with the top-level fields
//! `player, resources, day, week, phase, insurance, treatment, finances,
//! events, political`, stored under one key in the save slot table.
//!
//! Decoding never fails loudly: absent or corrupt data means "no save".

use crate::{
    error::SimResult,
    state::SessionState,
    store::SimStore,
};

/// The single storage key a session is saved under.
pub const SAVE_KEY: &str = "americanCancerExperience";

pub fn encode(state: &SessionState) -> SimResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a snapshot. Corrupt input yields `None`.
pub fn decode(json: &str) -> Option<SessionState> {
    match serde_json::from_str::<SessionState>(json) {
        Ok(mut state) => {
            state.rehydrate();
            Some(state)
        }
        Err(e) => {
            log::warn!("discarding unreadable save: {e}");
            None
        }
    }
}

impl SimStore {
    pub fn save_session(&self, state: &SessionState) -> SimResult<()> {
        let json = encode(state)?;
        self.put_slot(SAVE_KEY, &json)?;
        log::debug!("Session saved at day {}", state.day());
        Ok(())
    }

    /// Load the saved session, if there is a readable one.
    pub fn load_session(&self) -> SimResult<Option<SessionState>> {
        Ok(self.get_slot(SAVE_KEY)?.as_deref().and_then(decode))
    }

    pub fn has_save(&self) -> SimResult<bool> {
        Ok(self.get_slot(SAVE_KEY)?.is_some())
    }

    pub fn delete_save(&self) -> SimResult<()> {
        self.delete_slot(SAVE_KEY)
    }
}
