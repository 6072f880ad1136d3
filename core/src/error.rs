use thiserror::Error;

use crate::types::Day;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session already ended on day {day}")]
    SessionEnded { day: Day },

    #[error("Unknown treatment '{name}'")]
    UnknownTreatment { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
