//! The effects payload shared by every event pool, and the one function
//! that applies it.
//!
//! Application order is fixed:
//!   health → money → coverage → hope → time → bill → prior-auth denial
//!   → network change → political

use crate::{
    billing::DEFAULT_DUE_IN_DAYS,
    prior_auth_subsystem::{PriorAuthRequest, PriorAuthStatus},
    resources::Meter,
    state::{AcaStatus, FdaStatus, SessionState},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Effects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hope: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill: Option<BillEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_auth_denied: Option<PriorAuthRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub political: Option<PoliticalPatch>,
}

impl Effects {
    pub fn hope(delta: f64) -> Self {
        Self { hope: Some(delta), ..Self::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillEffect {
    pub description: String,
    pub amount:      f64,
}

/// A partial overwrite of the political state. Absent fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PoliticalPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aca_status: Option<AcaStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fda_status: Option<FdaStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drug_price_caps: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_orders: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_policies: Option<u32>,
}

impl SessionState {
    /// Apply an effects record. `label` is the reason written to the
    /// decision log for every meter change.
    pub fn apply_effects(&mut self, effects: &Effects, label: &str) {
        // Destructured so a new field fails to compile until handled here.
        let Effects {
            health,
            money,
            coverage,
            hope,
            time,
            bill,
            prior_auth_denied,
            network_change,
            political,
        } = effects;

        let meters = [
            (Meter::Health, health),
            (Meter::Money, money),
            (Meter::Coverage, coverage),
            (Meter::Hope, hope),
            (Meter::Time, time),
        ];
        for (meter, delta) in meters {
            if let Some(delta) = delta {
                self.modify(meter, *delta, label);
            }
        }

        if let Some(bill) = bill {
            self.add_bill(&bill.description, bill.amount, DEFAULT_DUE_IN_DAYS);
        }

        if let Some(request) = prior_auth_denied {
            let mut request = request.clone();
            request.id = self.next_entity_id();
            if !matches!(request.status, PriorAuthStatus::Denied { .. }) {
                request.status = PriorAuthStatus::Denied { reason: label.to_string() };
            }
            self.insurance.denied.push(request);
        }

        if let Some(status) = network_change {
            self.insurance.network_status = status.clone();
        }

        if let Some(patch) = political {
            self.apply_political_patch(patch);
        }
    }

    fn apply_political_patch(&mut self, patch: &PoliticalPatch) {
        let PoliticalPatch {
            aca_status,
            fda_status,
            drug_price_caps,
            executive_orders,
            agency_policies,
        } = patch;
        let p = &mut self.political;
        if let Some(v) = aca_status {
            p.aca_status = *v;
        }
        if let Some(v) = fda_status {
            p.fda_status = *v;
        }
        if let Some(v) = drug_price_caps {
            p.drug_price_caps = *v;
        }
        if let Some(v) = executive_orders {
            p.executive_orders = *v;
        }
        if let Some(v) = agency_policies {
            p.agency_policies = *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[test]
    fn absent_fields_change_nothing() {
        let mut s = SessionState::new(&SessionConfig::default());
        let before = s.resources.clone();
        s.apply_effects(&Effects::default(), "noop");
        assert_eq!(s.resources, before);
        assert!(s.finances.bills.is_empty());
    }

    #[test]
    fn political_patch_is_partial() {
        let mut s = SessionState::new(&SessionConfig::default());
        s.political.drug_price_caps = true;
        let effects = Effects {
            political: Some(PoliticalPatch {
                fda_status: Some(FdaStatus::Compromised),
                ..PoliticalPatch::default()
            }),
            ..Effects::default()
        };
        s.apply_effects(&effects, "agency memo");
        assert_eq!(s.political.fda_status, FdaStatus::Compromised);
        assert_eq!(s.political.aca_status, AcaStatus::Intact);
        assert!(s.political.drug_price_caps);
    }

    #[test]
    fn injected_denial_gets_a_fresh_id() {
        let mut s = SessionState::new(&SessionConfig::default());
        let taken = s.add_bill("Scan", 100.0, 30).id;
        let effects = Effects {
            prior_auth_denied: Some(PriorAuthRequest {
                id:            taken,
                treatment:     "PET scan".into(),
                cost:          6_200.0,
                submitted_day: 0,
                status:        PriorAuthStatus::Pending,
                appeal_count:  0,
                max_appeals:   3,
            }),
            ..Effects::default()
        };
        s.apply_effects(&effects, "Retroactive review");

        let denied = &s.insurance.denied[0];
        assert_ne!(denied.id, taken);
        assert_eq!(denied.denial_reason(), Some("Retroactive review"));
    }
}
