//! Billing ledger: the total-owed invariant and the collections sweep.

use priorauth_core::{
    billing::{COLLECTIONS_GRACE_DAYS, DEFAULT_DUE_IN_DAYS},
    config::SessionConfig,
    state::SessionState,
};

fn fresh() -> SessionState {
    SessionState::new(&SessionConfig::default())
}

fn assert_invariant(state: &SessionState) {
    let recomputed = state.finances.recomputed_total();
    assert!(
        (state.finances.total_owed - recomputed).abs() < 1e-6,
        "total_owed {} != sum of unpaid {}",
        state.finances.total_owed,
        recomputed
    );
}

#[test]
fn add_bill_sets_due_date_and_total() {
    let mut state = fresh();
    let bill = state.add_bill("MRI", 3_000.0, DEFAULT_DUE_IN_DAYS);

    assert_eq!(bill.due_date, 1 + DEFAULT_DUE_IN_DAYS);
    assert!(!bill.paid);
    assert_eq!(state.finances.total_owed, 3_000.0);
    assert_invariant(&state);
}

#[test]
fn partial_then_full_payment() {
    let mut state = fresh();
    let bill = state.add_bill("Biopsy", 4_000.0, 30);
    let a = state.add_bill("Lab work", 900.0, 30);

    assert!(state.pay_bill(bill.id, 1_500.0));
    assert_eq!(state.finances.total_owed, 3_400.0);
    assert_eq!(state.resources.money, 23_500.0);
    assert_invariant(&state);

    assert!(state.pay_bill(bill.id, 2_500.0));
    assert!(state.finances.bills.iter().any(|b| b.id == bill.id && b.paid));
    assert_eq!(state.finances.total_owed, 900.0);
    assert_invariant(&state);

    assert!(state.pay_bill(a.id, 900.0));
    assert_eq!(state.finances.total_owed, 0.0);
}

#[test]
fn failed_payment_changes_nothing() {
    let mut state = fresh();
    let bill = state.add_bill("Surgery", 90_000.0, 30);
    let before = state.clone();

    assert!(!state.pay_bill(bill.id, 50_000.0), "money is 25 000");
    assert!(!state.pay_bill(9_999, 10.0), "unknown bill id");
    assert_eq!(state.finances, before.finances);
    assert_eq!(state.resources, before.resources);
}

#[test]
fn overdue_bills_go_to_collections() {
    let mut state = fresh();
    let bill = state.add_bill("ER", 2_000.0, DEFAULT_DUE_IN_DAYS);

    state.advance_day(DEFAULT_DUE_IN_DAYS + COLLECTIONS_GRACE_DAYS);
    assert!(state.sweep_collections().is_empty(), "exactly at the grace limit is not overdue");

    state.advance_day(1);
    assert_eq!(state.sweep_collections(), vec![bill.id]);
    assert!(state.finances.in_collections);
    assert!(state.sweep_collections().is_empty(), "a bill is sent only once");

    assert!(state.pay_bill(bill.id, 2_000.0));
    assert!(!state.finances.in_collections, "paying it off clears the flag");
}

#[test]
fn paid_bills_are_never_swept() {
    let mut state = fresh();
    let bill = state.add_bill("Copay", 50.0, 1);
    assert!(state.pay_bill(bill.id, 50.0));
    state.advance_day(200);
    assert!(state.sweep_collections().is_empty());
}
