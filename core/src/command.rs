use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// All player-issued commands.
/// Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Insurance ─────────────────────────────────
    /// File paperwork for a catalog treatment. Costs a day and some hope.
    SubmitPriorAuth { treatment: String },
    AppealDenial { request_id: EntityId },
    CheckNetwork { provider: String },

    // ── Treatment ─────────────────────────────────
    StartTreatment {
        treatment: String,
        #[serde(default = "in_network_default")]
        in_network: bool,
    },

    // ── Billing office ────────────────────────────
    PayBill { bill_id: EntityId, amount: f64 },
    StartCrowdfund,
    ApplyCharityCare,
    SetupPaymentPlan,
    ApplyMedicalCredit,
    FileBankruptcy,
    NegotiateBills,
}

fn in_network_default() -> bool {
    true
}

impl PlayerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitPriorAuth { .. } => "submit_prior_auth",
            Self::AppealDenial { .. }    => "appeal_denial",
            Self::CheckNetwork { .. }    => "check_network",
            Self::StartTreatment { .. }  => "start_treatment",
            Self::PayBill { .. }         => "pay_bill",
            Self::StartCrowdfund         => "start_crowdfund",
            Self::ApplyCharityCare       => "apply_charity_care",
            Self::SetupPaymentPlan       => "setup_payment_plan",
            Self::ApplyMedicalCredit     => "apply_medical_credit",
            Self::FileBankruptcy         => "file_bankruptcy",
            Self::NegotiateBills         => "negotiate_bills",
        }
    }
}
