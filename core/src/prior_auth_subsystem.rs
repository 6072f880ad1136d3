//! Prior authorization subsystem.
//!
//! Owns the request lifecycle:
//!
//!   submit ──▶ Pending ──(wait elapsed, roll)──▶ Approved   (terminal)
//!                 ▲                         └──▶ Denied
//!                 └──────── appeal (≤ MAX_APPEALS) ──┘
//!
//! Requests are never deleted. The approved and denied lists double as
//! the audit log shown at the end of a session.
//!
//! Also owns the patient cost calculation, which must apply
//! deductible → coinsurance → out-of-pocket cap in exactly that order.
//!
//! Execution: every day, after the resource decay.

use crate::{
    config::TreatmentEntry,
    error::SimResult,
    event::SimEvent,
    resources::Meter,
    rng::SimRng,
    state::{AcaStatus, FdaStatus, PoliticalState, SessionState},
    subsystem::SimSubsystem,
    types::{Day, EntityId},
};
use serde::{Deserialize, Serialize};

pub const MAX_APPEALS: u32 = 3;
pub const DEFAULT_PROVIDER: &str = "UnitedHealth";
/// Provider name for an uninsured patient.
pub const NO_PROVIDER: &str = "None";

pub const BASE_APPROVAL_CHANCE: f64 = 0.6;
pub const MIN_APPROVAL_CHANCE: f64 = 0.10;
pub const MAX_APPROVAL_CHANCE: f64 = 0.90;
pub const DENIAL_HOPE_PENALTY: f64 = -10.0;

pub const APPEAL_HOPE_COST: f64 = -5.0;
pub const APPEAL_DAYS: Day = 2;

const HIGH_COST_THRESHOLD: f64 = 50_000.0;
const MID_COST_THRESHOLD: f64 = 20_000.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriorAuthStatus {
    Pending,
    Approved,
    Denied { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorAuthRequest {
    pub id:            EntityId,
    pub treatment:     String,
    pub cost:          f64,
    pub submitted_day: Day,
    pub status:        PriorAuthStatus,
    pub appeal_count:  u32,
    pub max_appeals:   u32,
}

impl PriorAuthRequest {
    pub fn denial_reason(&self) -> Option<&str> {
        match &self.status {
            PriorAuthStatus::Denied { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn appeals_left(&self) -> u32 {
        self.max_appeals.saturating_sub(self.appeal_count)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceProfile {
    pub provider:            String,
    pub plan:                String,
    pub deductible:          f64,
    pub deductible_met:      f64,
    pub max_out_of_pocket:   f64,
    pub out_of_pocket_spent: f64,
    pub policy_cancelled:    bool,
    pub network_status:      String,
    /// Index of the coverage year whose deductible is running.
    pub plan_year:           u64,
    pub pending:             Vec<PriorAuthRequest>,
    pub approved:            Vec<PriorAuthRequest>,
    pub denied:              Vec<PriorAuthRequest>,
}

impl InsuranceProfile {
    pub fn new(provider: &str, plan: &str, deductible: f64, max_out_of_pocket: f64) -> Self {
        Self {
            provider:            provider.to_string(),
            plan:                plan.to_string(),
            deductible,
            deductible_met:      0.0,
            max_out_of_pocket,
            out_of_pocket_spent: 0.0,
            policy_cancelled:    false,
            network_status:      "in-network".into(),
            plan_year:           0,
            pending:             Vec::new(),
            approved:            Vec::new(),
            denied:              Vec::new(),
        }
    }

    pub fn all_requests(&self) -> impl Iterator<Item = &PriorAuthRequest> {
        self.pending.iter().chain(&self.approved).chain(&self.denied)
    }

    /// True when a request for this treatment has been approved.
    pub fn is_approved(&self, treatment: &str) -> bool {
        self.approved.iter().any(|r| r.treatment == treatment)
    }

    pub fn is_pending(&self, treatment: &str) -> bool {
        self.pending.iter().any(|r| r.treatment == treatment)
    }
}

/// Result of an appeal attempt. Failures leave the request untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum AppealResult {
    Filed { request_id: EntityId, appeal_number: u32 },
    NotFound,
    LimitReached { appeals: u32 },
}

/// One request leaving the pending list.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorAuthDecision {
    pub request_id: EntityId,
    pub treatment:  String,
    pub approved:   bool,
    pub reason:     Option<String>,
}

/// Extra days of review for expensive treatments.
pub fn cost_tier(cost: f64) -> Day {
    if cost > HIGH_COST_THRESHOLD {
        10
    } else if cost > MID_COST_THRESHOLD {
        5
    } else {
        0
    }
}

/// Minimum days a request sits in review before it can be decided.
pub fn wait_time(request: &PriorAuthRequest, political: &PoliticalState) -> Day {
    let fda_delay = match political.fda_status {
        FdaStatus::Compromised => 7,
        FdaStatus::Normal => 0,
    };
    5 + cost_tier(request.cost) + fda_delay
}

/// Probability the insurer approves this request today.
pub fn approval_chance(request: &PriorAuthRequest, state: &SessionState) -> f64 {
    let mut chance = BASE_APPROVAL_CHANCE;

    chance += (state.resources.coverage - 50.0) * 0.005;

    chance -= match state.political.aca_status {
        AcaStatus::Intact => 0.0,
        AcaStatus::Weakened => 0.15,
        AcaStatus::Repealed => 0.30,
    };

    if request.cost > HIGH_COST_THRESHOLD {
        chance -= 0.20;
    } else if request.cost > MID_COST_THRESHOLD {
        chance -= 0.10;
    }

    chance += request.appeal_count as f64 * 0.05;

    if state.insurance.provider == DEFAULT_PROVIDER {
        chance -= 0.05;
    }

    chance.clamp(MIN_APPROVAL_CHANCE, MAX_APPROVAL_CHANCE)
}

impl SessionState {
    /// File a prior authorization for a catalog treatment. Creates a
    /// pending request; charges nothing.
    pub fn submit_prior_auth(&mut self, treatment: &TreatmentEntry) -> PriorAuthRequest {
        let request = PriorAuthRequest {
            id:            self.next_entity_id(),
            treatment:     treatment.name.clone(),
            cost:          treatment.cost,
            submitted_day: self.clock.day,
            status:        PriorAuthStatus::Pending,
            appeal_count:  0,
            max_appeals:   MAX_APPEALS,
        };
        self.insurance.pending.push(request.clone());
        log::debug!(
            "day={} prior auth #{} submitted for {} (${:.0})",
            self.clock.day,
            request.id,
            request.treatment,
            request.cost
        );
        request
    }

    /// Decide every pending request whose wait has elapsed. One sample per
    /// decided request; denials cost hope.
    pub fn process_pending(
        &mut self,
        denial_reasons: &[String],
        rng: &mut dyn SimRng,
    ) -> Vec<PriorAuthDecision> {
        let today = self.clock.day;
        let mut decisions = Vec::new();
        let pending = std::mem::take(&mut self.insurance.pending);

        for mut request in pending {
            let waited = today.saturating_sub(request.submitted_day);
            if waited < wait_time(&request, &self.political) {
                self.insurance.pending.push(request);
                continue;
            }

            let chance = approval_chance(&request, self);
            if rng.next_f64() < chance {
                request.status = PriorAuthStatus::Approved;
                decisions.push(PriorAuthDecision {
                    request_id: request.id,
                    treatment:  request.treatment.clone(),
                    approved:   true,
                    reason:     None,
                });
                self.insurance.approved.push(request);
            } else {
                let reason = pick_denial_reason(denial_reasons, rng);
                request.status = PriorAuthStatus::Denied { reason: reason.clone() };
                decisions.push(PriorAuthDecision {
                    request_id: request.id,
                    treatment:  request.treatment.clone(),
                    approved:   false,
                    reason:     Some(reason),
                });
                let label = format!("Prior auth denied: {}", request.treatment);
                self.insurance.denied.push(request);
                self.modify(Meter::Hope, DENIAL_HOPE_PENALTY, &label);
            }
        }
        decisions
    }

    /// Appeal a denied request. On success the request goes back to
    /// pending with a fresh submission day, and the filing costs hope and
    /// two days.
    pub fn appeal_denial(&mut self, request_id: EntityId) -> AppealResult {
        let Some(index) = self.insurance.denied.iter().position(|r| r.id == request_id) else {
            return AppealResult::NotFound;
        };
        let existing = &self.insurance.denied[index];
        if existing.appeal_count >= existing.max_appeals {
            return AppealResult::LimitReached { appeals: existing.appeal_count };
        }

        let mut request = self.insurance.denied.remove(index);
        request.appeal_count += 1;
        request.status = PriorAuthStatus::Pending;
        request.submitted_day = self.clock.day;
        let appeal_number = request.appeal_count;
        self.insurance.pending.push(request);

        self.modify(Meter::Hope, APPEAL_HOPE_COST, "Filing insurance appeal");
        self.advance_day(APPEAL_DAYS);

        log::debug!("day={} appeal #{appeal_number} filed for request #{request_id}", self.clock.day);
        AppealResult::Filed { request_id, appeal_number }
    }

    /// What the patient owes for a bill of `total_cost`. Updates the
    /// deductible and out-of-pocket counters. Rounded to whole dollars.
    pub fn calculate_patient_cost(&mut self, total_cost: f64, in_network: bool) -> f64 {
        let ins = &mut self.insurance;
        if ins.policy_cancelled {
            return total_cost;
        }

        let coinsurance_rate = if in_network { 0.20 } else { 0.40 };
        let deductible = if in_network { ins.deductible } else { ins.deductible * 1.5 };

        let mut patient_cost = 0.0;
        let mut remaining = total_cost;

        // 1. Deductible.
        let deductible_remaining = (deductible - ins.deductible_met).max(0.0);
        if deductible_remaining > 0.0 {
            let portion = remaining.min(deductible_remaining);
            patient_cost += portion;
            ins.deductible_met += portion;
            remaining -= portion;
        }

        // 2. Coinsurance on what is left.
        patient_cost += remaining * coinsurance_rate;

        // 3. Out-of-pocket cap.
        let headroom = (ins.max_out_of_pocket - ins.out_of_pocket_spent).max(0.0);
        if patient_cost > headroom {
            patient_cost = headroom;
        }

        ins.out_of_pocket_spent += patient_cost;
        patient_cost.round()
    }

    /// Annual reset of the deductible and out-of-pocket counters.
    /// Returns how much deductible had been met.
    pub fn reset_deductible(&mut self) -> f64 {
        let previous = self.insurance.deductible_met;
        self.insurance.deductible_met = 0.0;
        self.insurance.out_of_pocket_spent = 0.0;
        previous
    }

    /// Render a denial letter for a denied request.
    pub fn denial_letter(&self, request: &PriorAuthRequest, template: &str) -> String {
        template
            .replace("{TREATMENT}", &request.treatment)
            .replace("{REASON}", request.denial_reason().unwrap_or("Not specified"))
            .replace("{DATE}", &format!("Day {}", self.clock.day))
            .replace("{PROVIDER}", &self.insurance.provider)
            .replace("{APPEAL_DEADLINE}", &format!("Day {}", self.clock.day + 3))
    }
}

/// Roll whether a provider has dropped out of network this month.
/// Returns the notice text when it has.
pub fn check_network_status(provider_name: &str, rng: &mut dyn SimRng) -> Option<String> {
    rng.chance(0.1).then(|| {
        format!("{provider_name} is no longer in your insurance network as of this month.")
    })
}

fn pick_denial_reason(reasons: &[String], rng: &mut dyn SimRng) -> String {
    if reasons.is_empty() {
        return "Not medically necessary".into();
    }
    reasons[rng.pick_index(reasons.len())].clone()
}

pub struct PriorAuthSubsystem {
    denial_reasons: Vec<String>,
}

impl PriorAuthSubsystem {
    pub fn new(denial_reasons: Vec<String>) -> Self {
        Self { denial_reasons }
    }
}

impl SimSubsystem for PriorAuthSubsystem {
    fn name(&self) -> &'static str {
        "prior_auth"
    }

    fn update(
        &mut self,
        day:   Day,
        state: &mut SessionState,
        rng:   &mut dyn SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let decisions = state.process_pending(&self.denial_reasons, rng);

        let events: Vec<SimEvent> = decisions
            .into_iter()
            .map(|d| {
                if d.approved {
                    SimEvent::PriorAuthApproved {
                        day,
                        request_id: d.request_id,
                        treatment:  d.treatment,
                    }
                } else {
                    log::warn!("day={day} prior auth #{} denied: {}", d.request_id, d.treatment);
                    SimEvent::PriorAuthDenied {
                        day,
                        request_id: d.request_id,
                        treatment:  d.treatment,
                        reason:     d.reason.unwrap_or_default(),
                    }
                }
            })
            .collect();

        if !events.is_empty() {
            log::debug!(
                "day={day} prior_auth: {} decided, {} still pending",
                events.len(),
                state.insurance.pending.len()
            );
        }
        Ok(events)
    }
}
