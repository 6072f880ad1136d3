//! The session event log: everything that happened, in order.
//!
//! Subsystems and player commands emit `SimEvent`s; the engine persists
//! each one to the store's event log. Same seed and same commands must
//! produce byte-identical logs.

use crate::{
    ending::Ending,
    event_subsystem::EventCategory,
    news_subsystem::NewsPool,
    types::{Day, EntityId, SessionId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during a session.
/// Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    SessionInitialized {
        session_id: SessionId,
        seed: u64,
    },
    DayStarted {
        day: Day,
    },
    DayCompleted {
        day: Day,
    },
    SessionEnded {
        day: Day,
        ending: Ending,
    },

    // ── Ledger events ──────────────────────────────
    BillsSentToCollections {
        day: Day,
        bill_ids: Vec<EntityId>,
    },
    BillPaid {
        day: Day,
        bill_id: EntityId,
        amount: f64,
    },
    DeductibleReset {
        day: Day,
        previous_met: f64,
    },

    // ── Prior authorization ────────────────────────
    PriorAuthSubmitted {
        day: Day,
        request_id: EntityId,
        treatment: String,
    },
    PriorAuthApproved {
        day: Day,
        request_id: EntityId,
        treatment: String,
    },
    PriorAuthDenied {
        day: Day,
        request_id: EntityId,
        treatment: String,
        reason: String,
    },
    AppealFiled {
        day: Day,
        request_id: EntityId,
        appeal_number: u32,
    },

    // ── Events and news ────────────────────────────
    EventTriggered {
        day: Day,
        event_id: String,
        category: EventCategory,
        title: String,
    },
    BreakingNews {
        day: Day,
        pool: NewsPool,
        item_id: String,
        headline: String,
    },
    NetworkChanged {
        day: Day,
        notice: String,
    },

    // ── Player actions ─────────────────────────────
    TreatmentAdministered {
        day: Day,
        treatment: String,
        patient_cost: f64,
    },
    ReliefAction {
        day: Day,
        action: String,
        /// Dollars raised, credited or written off; the monthly figure for
        /// a payment plan.
        amount: f64,
    },
    CommandRejected {
        day: Day,
        command: String,
        reason: String,
    },
}

impl SimEvent {
    /// Stable string name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionInitialized { .. }     => "session_initialized",
            Self::DayStarted { .. }             => "day_started",
            Self::DayCompleted { .. }           => "day_completed",
            Self::SessionEnded { .. }           => "session_ended",
            Self::BillsSentToCollections { .. } => "bills_sent_to_collections",
            Self::BillPaid { .. }               => "bill_paid",
            Self::DeductibleReset { .. }        => "deductible_reset",
            Self::PriorAuthSubmitted { .. }     => "prior_auth_submitted",
            Self::PriorAuthApproved { .. }      => "prior_auth_approved",
            Self::PriorAuthDenied { .. }        => "prior_auth_denied",
            Self::AppealFiled { .. }            => "appeal_filed",
            Self::EventTriggered { .. }         => "event_triggered",
            Self::BreakingNews { .. }           => "breaking_news",
            Self::NetworkChanged { .. }         => "network_changed",
            Self::TreatmentAdministered { .. }  => "treatment_administered",
            Self::ReliefAction { .. }           => "relief_action",
            Self::CommandRejected { .. }        => "command_rejected",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub session_id: SessionId,
    pub day:        Day,
    pub source:     String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}
