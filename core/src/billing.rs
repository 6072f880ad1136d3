//! Billing ledger: owed bills, aggregate debt, and the collections flag.
//!
//! INVARIANT: `total_owed` equals the sum of the remaining `amount` of
//! every unpaid bill. Every method here updates both sides in the same call.

use crate::{
    resources::Meter,
    state::SessionState,
    types::{Day, EntityId},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DUE_IN_DAYS: Day = 30;
/// Days past due before an unpaid bill is sent to collections.
pub const COLLECTIONS_GRACE_DAYS: Day = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bill {
    pub id:            EntityId,
    pub description:   String,
    /// Remaining amount. Decremented by partial payments.
    pub amount:        f64,
    pub due_date:      Day,
    pub paid:          bool,
    pub in_collections: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Finances {
    pub bills:             Vec<Bill>,
    pub total_owed:        f64,
    pub in_collections:    bool,
    pub collection_calls:  u32,
    pub bankruptcy_filed:  bool,
    pub crowdfund_started: bool,
    pub crowdfund_raised:  f64,
    pub job_lost:          bool,
    pub wages_lost:        f64,
}

impl Finances {
    pub fn unpaid(&self) -> impl Iterator<Item = &Bill> {
        self.bills.iter().filter(|b| !b.paid)
    }

    /// Sum of unpaid remaining amounts. Equal to `total_owed` at all times.
    pub fn recomputed_total(&self) -> f64 {
        self.unpaid().map(|b| b.amount).sum()
    }
}

impl SessionState {
    /// Record a new bill due `due_in_days` from today.
    pub fn add_bill(&mut self, description: &str, amount: f64, due_in_days: Day) -> Bill {
        let bill = Bill {
            id:             self.next_entity_id(),
            description:    description.to_string(),
            amount,
            due_date:       self.clock.day + due_in_days,
            paid:           false,
            in_collections: false,
        };
        self.finances.bills.push(bill.clone());
        self.finances.total_owed += amount;
        log::debug!(
            "day={} bill #{} added: {description} ${amount:.0}",
            self.clock.day,
            bill.id
        );
        bill
    }

    /// Pay `amount` toward a bill. Returns false, changing nothing, when the
    /// bill is unknown or already paid, or savings don't cover the payment.
    pub fn pay_bill(&mut self, bill_id: EntityId, amount: f64) -> bool {
        let Some(index) = self
            .finances
            .bills
            .iter()
            .position(|b| b.id == bill_id && !b.paid)
        else {
            return false;
        };
        if self.resources.money < amount {
            return false;
        }

        let description = self.finances.bills[index].description.clone();
        self.modify(Meter::Money, -amount, &format!("Paid: {description}"));

        let bill = &mut self.finances.bills[index];
        bill.amount -= amount;
        self.finances.total_owed -= amount;
        if bill.amount <= 0.0 {
            bill.paid = true;
            // Overpayment is not owed back; keep the aggregate exact.
            self.finances.total_owed -= bill.amount;
            bill.amount = 0.0;
        }
        self.refresh_collections_flag();
        true
    }

    /// Send long-overdue bills to collections. Returns the ids newly sent.
    pub fn sweep_collections(&mut self) -> Vec<EntityId> {
        let today = self.clock.day;
        let mut sent = Vec::new();
        for bill in self.finances.bills.iter_mut() {
            if !bill.paid
                && !bill.in_collections
                && today > bill.due_date + COLLECTIONS_GRACE_DAYS
            {
                bill.in_collections = true;
                sent.push(bill.id);
            }
        }
        if !sent.is_empty() {
            log::warn!("day={today} {} bill(s) sent to collections", sent.len());
        }
        self.refresh_collections_flag();
        sent
    }

    /// Write `reduction` off the outstanding debt, spread across unpaid bills
    /// in proportion to their remaining amounts. Returns the amount removed.
    pub fn reduce_debt(&mut self, reduction: f64) -> f64 {
        let owed = self.finances.recomputed_total();
        if owed <= 0.0 || reduction <= 0.0 {
            return 0.0;
        }
        let fraction = (reduction / owed).min(1.0);
        let mut removed = 0.0;
        for bill in self.finances.bills.iter_mut().filter(|b| !b.paid) {
            let cut = bill.amount * fraction;
            bill.amount -= cut;
            removed += cut;
            if bill.amount <= 0.0 {
                bill.amount = 0.0;
                bill.paid = true;
            }
        }
        self.finances.total_owed = self.finances.recomputed_total();
        self.refresh_collections_flag();
        removed
    }

    /// Discharge every bill (bankruptcy).
    /// Bills stay in the list, settled at zero, so ids are never reissued.
    pub(crate) fn discharge_all_bills(&mut self) {
        for bill in self.finances.bills.iter_mut().filter(|b| !b.paid) {
            bill.amount = 0.0;
            bill.paid = true;
            bill.in_collections = false;
        }
        self.finances.total_owed = 0.0;
        self.finances.in_collections = false;
    }

    fn refresh_collections_flag(&mut self) {
        let flag = self.finances.unpaid().any(|b| b.in_collections);
        self.finances.in_collections = flag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn state() -> SessionState {
        SessionState::new(&SessionConfig::default())
    }

    #[test]
    fn overpayment_settles_bill_at_zero() {
        let mut s = state();
        let bill = s.add_bill("Copay", 50.0, 30);
        assert!(s.pay_bill(bill.id, 80.0));
        assert!(s.finances.bills[0].paid);
        assert_eq!(s.finances.bills[0].amount, 0.0);
        assert_eq!(s.finances.total_owed, 0.0);
    }

    #[test]
    fn paid_bill_cannot_be_paid_again() {
        let mut s = state();
        let bill = s.add_bill("Copay", 50.0, 30);
        assert!(s.pay_bill(bill.id, 50.0));
        let money = s.resources.money;
        assert!(!s.pay_bill(bill.id, 10.0));
        assert_eq!(s.resources.money, money);
    }

    #[test]
    fn collections_flag_tracks_the_last_collected_bill() {
        let mut s = state();
        let a = s.add_bill("A", 100.0, 0);
        let b = s.add_bill("B", 200.0, 0);
        s.advance_day(COLLECTIONS_GRACE_DAYS + 1);
        assert_eq!(s.sweep_collections(), vec![a.id, b.id]);

        assert!(s.pay_bill(a.id, 100.0));
        assert!(s.finances.in_collections, "B is still in collections");
        assert!(s.pay_bill(b.id, 200.0));
        assert!(!s.finances.in_collections);
    }

    #[test]
    fn reduce_debt_keeps_aggregate_exact() {
        let mut s = state();
        s.add_bill("A", 1_000.0, 30);
        s.add_bill("B", 3_000.0, 30);
        let removed = s.reduce_debt(2_000.0);
        assert!((removed - 2_000.0).abs() < 1e-6);
        assert!((s.finances.total_owed - s.finances.recomputed_total()).abs() < 1e-9);
        assert!((s.finances.bills[0].amount - 500.0).abs() < 1e-6);
        assert!((s.finances.bills[1].amount - 1_500.0).abs() < 1e-6);
    }
}
