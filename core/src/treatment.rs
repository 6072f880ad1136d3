//! Treatment progress and the treatment application path.
//!
//! A treatment session charges the patient through the same cost
//! calculation the insurer uses, then applies the catalog entry's health,
//! hope and time effects and advances the milestone counters.

use crate::{
    billing::DEFAULT_DUE_IN_DAYS,
    config::TreatmentEntry,
    resources::Meter,
    state::SessionState,
    types::EntityId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentKind {
    Chemotherapy,
    Surgery,
    Radiation,
    Immunotherapy,
}

impl TreatmentKind {
    /// Infer the kind from a catalog name ("Chemotherapy (targeted)" → Chemotherapy).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("chemo") {
            Some(Self::Chemotherapy)
        } else if lower.contains("surgery") {
            Some(Self::Surgery)
        } else if lower.contains("radiation") {
            Some(Self::Radiation)
        } else if lower.contains("immuno") {
            Some(Self::Immunotherapy)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TreatmentProgress {
    pub oncologist:            Option<String>,
    pub oncologist_in_network: bool,
    /// The active plan. `None` means the cancer progresses untreated.
    pub plan:                  Option<TreatmentKind>,
    pub chemo_cycles:          u32,
    pub chemo_completed:       u32,
    pub surgery_scheduled:     bool,
    pub surgery_completed:     bool,
    pub radiation_sessions:    u32,
    pub radiation_completed:   u32,
    pub missed_appointments:   u32,
}

impl TreatmentProgress {
    /// All chemo cycles done and surgery completed.
    pub fn milestones_complete(&self) -> bool {
        self.chemo_completed >= self.chemo_cycles && self.surgery_completed
    }

    pub fn sessions_received(&self) -> u32 {
        self.chemo_completed + u32::from(self.surgery_completed) + self.radiation_completed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreatmentResult {
    Administered { patient_cost: f64, bill_id: EntityId },
    /// No approved prior authorization on file for this treatment.
    NotAuthorized,
    InsufficientFunds { patient_cost: f64, available: f64 },
}

impl SessionState {
    /// Run one session of a catalog treatment.
    ///
    /// Refuses, leaving the state unchanged, when the insurer has not
    /// approved the treatment or savings don't cover the patient's share.
    pub fn start_treatment(&mut self, entry: &TreatmentEntry, in_network: bool) -> TreatmentResult {
        if !self.insurance.is_approved(&entry.name) {
            return TreatmentResult::NotAuthorized;
        }

        // Pricing moves the deductible counters; restore them on refusal.
        let before = self.insurance.clone();
        let patient_cost = self.calculate_patient_cost(entry.cost, in_network);
        if self.resources.money < patient_cost {
            self.insurance = before;
            return TreatmentResult::InsufficientFunds {
                patient_cost,
                available: self.resources.money,
            };
        }

        let label = format!("Treatment: {}", entry.name);
        self.modify(Meter::Money, -patient_cost, &label);
        self.modify(Meter::Health, entry.health_gain, &label);
        self.modify(Meter::Hope, entry.hope_cost, "Treatment side effects");
        self.advance_day(entry.time_cost);

        let t = &mut self.treatment;
        match TreatmentKind::from_name(&entry.name) {
            Some(TreatmentKind::Chemotherapy) => {
                t.chemo_cycles = entry.sessions;
                t.chemo_completed += 1;
                t.plan = Some(TreatmentKind::Chemotherapy);
            }
            Some(TreatmentKind::Surgery) => {
                t.surgery_completed = true;
                t.plan = Some(TreatmentKind::Surgery);
            }
            Some(TreatmentKind::Radiation) => {
                t.radiation_sessions = entry.sessions;
                t.radiation_completed += 1;
                t.plan = Some(TreatmentKind::Radiation);
            }
            Some(TreatmentKind::Immunotherapy) => {
                t.plan = Some(TreatmentKind::Immunotherapy);
            }
            None => {}
        }

        let bill = self.add_bill(
            &format!("{} - Patient Responsibility", entry.name),
            patient_cost,
            DEFAULT_DUE_IN_DAYS,
        );
        log::debug!(
            "day={} treatment {} administered, patient owes ${patient_cost:.0}",
            self.clock.day,
            entry.name
        );
        TreatmentResult::Administered { patient_cost, bill_id: bill.id }
    }
}
