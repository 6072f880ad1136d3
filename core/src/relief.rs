//! Financial relief actions available from the billing office.
//!
//! Each action is a single call that applies its own hope/time cost.
//! Random outcomes roll through the supplied `SimRng`.

use crate::{
    resources::Meter,
    rng::SimRng,
    state::SessionState,
};

pub const CHARITY_CARE_APPROVAL: f64 = 0.3;
pub const NEGOTIATION_SUCCESS: f64 = 0.4;
pub const BANKRUPTCY_MIN_DEBT: f64 = 20_000.0;
pub const BANKRUPTCY_KEEP_MAX: f64 = 2_000.0;
pub const MEDICAL_CREDIT_LIMIT: f64 = 25_000.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ReliefOutcome {
    CrowdfundRaised { amount: f64 },
    CharityCare { approved: bool, reduction: f64 },
    PaymentPlan { monthly: f64, total_with_interest: f64 },
    MedicalCredit { credit: f64 },
    BankruptcyFiled { debt_discharged: f64 },
    Negotiated { success: bool, reduction: f64 },
    /// The action was not available; nothing changed.
    Unavailable { reason: &'static str },
}

impl SessionState {
    /// Start an online fundraiser. Once per session.
    pub fn start_crowdfund(&mut self, rng: &mut dyn SimRng) -> ReliefOutcome {
        if self.finances.crowdfund_started {
            return ReliefOutcome::Unavailable { reason: "fundraiser already running" };
        }
        self.finances.crowdfund_started = true;
        self.modify(Meter::Hope, -10.0, "Humiliation of begging for money online");

        let raised = (rng.next_f64() * 500.0).floor() + 100.0;
        self.finances.crowdfund_raised += raised;
        self.modify(Meter::Money, raised, "Crowdfund donations");
        ReliefOutcome::CrowdfundRaised { amount: raised }
    }

    /// Apply for hospital charity care. Three days of paperwork; approval
    /// halves the outstanding debt.
    pub fn apply_charity_care(&mut self, rng: &mut dyn SimRng) -> ReliefOutcome {
        let approved = rng.chance(CHARITY_CARE_APPROVAL);
        self.modify(Meter::Hope, -15.0, "Filling out 47 pages of financial paperwork");
        self.advance_day(3);

        let reduction = if approved {
            let target = (self.finances.total_owed * 0.5).floor();
            self.reduce_debt(target)
        } else {
            0.0
        };
        ReliefOutcome::CharityCare { approved, reduction }
    }

    /// Put the outstanding debt on a five-year plan.
    pub fn setup_payment_plan(&mut self) -> ReliefOutcome {
        if self.finances.total_owed <= 0.0 {
            return ReliefOutcome::Unavailable { reason: "nothing owed" };
        }
        self.modify(Meter::Hope, -5.0, "Accepting years of debt payments");
        ReliefOutcome::PaymentPlan {
            monthly:             (self.finances.total_owed / 60.0).ceil(),
            total_with_interest: (self.finances.total_owed * 1.15).ceil(),
        }
    }

    /// Open a medical credit card sized to the debt, capped at the limit.
    pub fn apply_medical_credit(&mut self) -> ReliefOutcome {
        let credit = MEDICAL_CREDIT_LIMIT.min(self.finances.total_owed);
        if credit <= 0.0 {
            return ReliefOutcome::Unavailable { reason: "nothing owed" };
        }
        self.modify(Meter::Money, credit, "Medical credit card");
        self.modify(Meter::Hope, -5.0, "Taking on high-interest debt");
        ReliefOutcome::MedicalCredit { credit }
    }

    /// Discharge all medical debt. Savings above the exemption are lost.
    pub fn file_bankruptcy(&mut self) -> ReliefOutcome {
        if self.finances.bankruptcy_filed {
            return ReliefOutcome::Unavailable { reason: "bankruptcy already filed" };
        }
        if self.finances.total_owed <= BANKRUPTCY_MIN_DEBT {
            return ReliefOutcome::Unavailable { reason: "debt below bankruptcy threshold" };
        }

        let discharged = self.finances.total_owed;
        self.finances.bankruptcy_filed = true;
        self.discharge_all_bills();
        self.modify(Meter::Hope, -30.0, "Filing for medical bankruptcy");
        if self.resources.money > BANKRUPTCY_KEEP_MAX {
            let excess = self.resources.money - BANKRUPTCY_KEEP_MAX;
            self.modify(Meter::Money, -excess, "Bankruptcy liquidation");
        }
        log::warn!("day={} bankruptcy filed, ${discharged:.0} discharged", self.clock.day);
        ReliefOutcome::BankruptcyFiled { debt_discharged: discharged }
    }

    /// Spend a day on hold trying to talk the bills down.
    pub fn negotiate_bills(&mut self, rng: &mut dyn SimRng) -> ReliefOutcome {
        if self.finances.total_owed <= 0.0 {
            return ReliefOutcome::Unavailable { reason: "nothing owed" };
        }
        let success = rng.chance(NEGOTIATION_SUCCESS);
        self.advance_day(1);

        if success {
            let target = (self.finances.total_owed * 0.2).floor();
            let reduction = self.reduce_debt(target);
            self.modify(Meter::Hope, 5.0, "Successfully negotiated bill reduction");
            ReliefOutcome::Negotiated { success, reduction }
        } else {
            self.modify(Meter::Hope, -10.0, "Wasted 2 hours on hold for nothing");
            ReliefOutcome::Negotiated { success, reduction: 0.0 }
        }
    }
}
