//! The session aggregate root.
//!
//! RULE: One SessionState per game. Every component receives it by
//! `&mut` from the engine; nothing holds a second handle to it.
//!
//! The serialized shape of this struct IS the save format: top-level
//! fields `player, resources, day, week, phase, insurance, treatment,
//! finances, events, political`. Fields marked `serde(skip)` are rebuilt
//! by `rehydrate()` after loading.

use crate::{
    billing::Finances,
    clock::{Phase, SimClock},
    config::{DiagnosisRoute, SessionConfig},
    ending::{self, Ending, Outcome},
    prior_auth_subsystem::{InsuranceProfile, NO_PROVIDER},
    resources::{Meter, Resources},
    treatment::TreatmentProgress,
    types::{Day, EntityId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Most recent decisions kept in the log.
pub const DECISION_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub player:    PlayerProfile,
    pub resources: Resources,
    #[serde(flatten)]
    pub clock:     SimClock,
    pub insurance: InsuranceProfile,
    pub treatment: TreatmentProgress,
    pub finances:  Finances,
    pub events:    EventTracking,
    pub political: PoliticalState,

    /// Advisory ending set the moment a meter crosses zero.
    /// The classifier's verdict is authoritative.
    #[serde(skip)]
    pub flagged_ending: Option<Ending>,
    #[serde(skip)]
    next_id: EntityId,
}

impl SessionState {
    /// Build a fresh session from the setup knobs.
    pub fn new(config: &SessionConfig) -> Self {
        let baseline = config.diagnosis.baseline();
        let mut state = Self {
            player: PlayerProfile {
                diagnosis: config.diagnosis,
                ..PlayerProfile::default()
            },
            resources: Resources {
                health:   baseline.health,
                money:    config.starting_money,
                coverage: if config.provider == NO_PROVIDER {
                    0.0
                } else {
                    config.starting_coverage.clamp(0.0, 100.0)
                },
                hope:     baseline.hope,
                time:     baseline.time,
            },
            clock: SimClock::default(),
            insurance: InsuranceProfile::new(
                &config.provider,
                &config.plan,
                config.deductible,
                config.max_oop,
            ),
            treatment: TreatmentProgress::default(),
            finances:  Finances::default(),
            events:    EventTracking::default(),
            political: PoliticalState::default(),
            flagged_ending: None,
            next_id: 1,
        };
        if state.resources.coverage <= 0.0 {
            state.insurance.policy_cancelled = true;
        }
        if config.diagnosis == DiagnosisRoute::Emergency {
            state.add_bill("Emergency Room Visit", 12_500.0, 30);
        }
        state
    }

    pub fn day(&self) -> Day {
        self.clock.day
    }

    /// Issue the next entity id for this session.
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Rebuild the non-persisted fields after deserialization.
    pub fn rehydrate(&mut self) {
        let max_bill = self.finances.bills.iter().map(|b| b.id).max().unwrap_or(0);
        let max_request = self
            .insurance
            .all_requests()
            .map(|r| r.id)
            .max()
            .unwrap_or(0);
        self.next_id = max_bill.max(max_request) + 1;
        self.flagged_ending = match ending::classify(self) {
            Outcome::Ended(e) if self.clock.phase == Phase::Ending => Some(e),
            _ => None,
        };
    }

    /// Mark the session as terminal. Advisory only.
    pub(crate) fn flag_ending(&mut self, ending: Ending) {
        self.flagged_ending = Some(ending);
        self.clock.phase = Phase::Ending;
    }

    pub(crate) fn record_decision(&mut self, meter: Meter, delta: f64, reason: &str) {
        let log = &mut self.events.decisions;
        if log.len() == DECISION_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(DecisionRecord {
            day: self.clock.day,
            meter,
            delta,
            reason: reason.to_string(),
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerProfile {
    pub name:        String,
    pub age:         u32,
    pub occupation:  String,
    pub cancer_type: String,
    pub stage:       u8,
    pub diagnosis:   DiagnosisRoute,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            name:        "Patient".into(),
            age:         45,
            occupation:  "employed".into(),
            cancer_type: "lung".into(),
            stage:       2,
            diagnosis:   DiagnosisRoute::Screening,
        }
    }
}

/// Seen-sets for the no-repeat pools, the news history, and the
/// decision log.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventTracking {
    pub insurance_seen: BTreeSet<String>,
    pub political_seen: BTreeSet<String>,
    pub hospital_seen:  BTreeSet<String>,
    /// Breaking-news ids in the order they ran.
    pub news_history:   Vec<String>,
    pub decisions:      VecDeque<DecisionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRecord {
    pub day:    Day,
    pub meter:  Meter,
    pub delta:  f64,
    pub reason: String,
}

/// Political climate. Written only by applied effects; read by the
/// prior-auth approval and wait-time formulas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoliticalState {
    pub aca_status:       AcaStatus,
    pub fda_status:       FdaStatus,
    pub drug_price_caps:  bool,
    /// Breaking-news items applied from the executive pool.
    pub executive_orders: u32,
    /// Breaking-news items applied from the health-agency pool.
    pub agency_policies:  u32,
}

impl Default for PoliticalState {
    fn default() -> Self {
        Self {
            aca_status:       AcaStatus::Intact,
            fda_status:       FdaStatus::Normal,
            drug_price_caps:  false,
            executive_orders: 0,
            agency_policies:  0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AcaStatus {
    Intact,
    Weakened,
    Repealed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FdaStatus {
    Normal,
    Compromised,
}
