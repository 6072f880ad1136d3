//! Prior authorization queue: wait times, approval odds, cost sharing,
//! and the appeal state machine.

use priorauth_core::{
    config::{ContentPack, SessionConfig, TreatmentEntry},
    prior_auth_subsystem::{
        approval_chance, wait_time, AppealResult, PriorAuthRequest, PriorAuthStatus,
        MAX_APPEALS,
    },
    rng::{ScriptedRng, SimRng, SubsystemRng},
    state::{AcaStatus, FdaStatus, PoliticalState, SessionState},
};

fn fresh() -> SessionState {
    SessionState::new(&SessionConfig::default())
}

fn chemo() -> TreatmentEntry {
    ContentPack::default_test()
        .treatment("Chemotherapy (standard)")
        .cloned()
        .unwrap()
}

fn request(cost: f64, appeal_count: u32) -> PriorAuthRequest {
    PriorAuthRequest {
        id: 1,
        treatment: "Test".into(),
        cost,
        submitted_day: 1,
        status: PriorAuthStatus::Pending,
        appeal_count,
        max_appeals: MAX_APPEALS,
    }
}

#[test]
fn wait_time_tiers() {
    let normal = PoliticalState::default();
    assert_eq!(wait_time(&request(10_000.0, 0), &normal), 5);
    assert_eq!(wait_time(&request(30_000.0, 0), &normal), 10);
    assert_eq!(wait_time(&request(85_000.0, 0), &normal), 15);

    let compromised = PoliticalState { fda_status: FdaStatus::Compromised, ..normal };
    assert_eq!(wait_time(&request(85_000.0, 0), &compromised), 22);
}

#[test]
fn wait_time_is_monotone_in_cost_and_fda_status() {
    let normal = PoliticalState::default();
    let compromised = PoliticalState { fda_status: FdaStatus::Compromised, ..normal.clone() };
    let costs = [0.0, 5_000.0, 20_000.0, 20_001.0, 50_000.0, 50_001.0, 500_000.0];

    for pair in costs.windows(2) {
        let (lo, hi) = (request(pair[0], 0), request(pair[1], 0));
        assert!(wait_time(&lo, &normal) <= wait_time(&hi, &normal));
    }
    for cost in costs {
        let r = request(cost, 0);
        assert!(wait_time(&r, &normal) < wait_time(&r, &compromised));
    }
}

#[test]
fn approval_chance_baseline() {
    let state = fresh();
    // 0.6 + (80-50)*0.005 - 0.05 (default provider)
    let chance = approval_chance(&request(10_000.0, 0), &state);
    assert!((chance - 0.70).abs() < 1e-9, "chance = {chance}");
}

#[test]
fn approval_chance_always_within_bounds() {
    let mut rng = SubsystemRng::new(11, 0, 0, 0);
    let statuses = [AcaStatus::Intact, AcaStatus::Weakened, AcaStatus::Repealed];

    for i in 0..500 {
        let mut state = fresh();
        state.resources.coverage = rng.next_f64() * 100.0;
        state.political.aca_status = statuses[i % 3];
        if i % 2 == 0 {
            state.insurance.provider = "Aetna".into();
        }
        let r = request(rng.next_f64() * 200_000.0, (i % 4) as u32);
        let chance = approval_chance(&r, &state);
        assert!(
            (0.10..=0.90).contains(&chance),
            "approval chance {chance} escaped [0.10, 0.90]"
        );
    }
}

#[test]
fn repealed_aca_with_expensive_care_hits_the_floor() {
    let mut state = fresh();
    state.resources.coverage = 0.0;
    state.political.aca_status = AcaStatus::Repealed;
    let chance = approval_chance(&request(100_000.0, 0), &state);
    assert_eq!(chance, 0.10);
}

/// 10 000 bill, 8 000 deductible, in network → 8 000 + 20% of 2 000.
#[test]
fn patient_cost_in_network_example() {
    let mut state = fresh();
    let cost = state.calculate_patient_cost(10_000.0, true);
    assert_eq!(cost, 8_400.0);
    assert_eq!(state.insurance.deductible_met, 8_000.0);
    assert_eq!(state.insurance.out_of_pocket_spent, 8_400.0);
}

#[test]
fn patient_cost_is_capped_by_out_of_pocket_max() {
    let mut state = fresh();
    state.insurance.out_of_pocket_spent = 15_800.0;
    let cost = state.calculate_patient_cost(10_000.0, true);
    assert_eq!(cost, 200.0);
    assert_eq!(state.insurance.out_of_pocket_spent, 16_000.0);

    let after_cap = state.calculate_patient_cost(10_000.0, true);
    assert_eq!(after_cap, 0.0, "nothing owed once the cap is reached");
}

#[test]
fn out_of_network_pays_more_without_touching_the_deductible() {
    let mut state = fresh();
    // deductible 8 000 × 1.5 = 12 000 applies in full on a 10 000 bill.
    let cost = state.calculate_patient_cost(10_000.0, false);
    assert_eq!(cost, 10_000.0);
    assert_eq!(state.insurance.deductible, 8_000.0, "stored deductible never changes");
}

#[test]
fn cancelled_policy_pays_nothing() {
    let mut state = fresh();
    state.insurance.policy_cancelled = true;
    assert_eq!(state.calculate_patient_cost(12_345.0, true), 12_345.0);
    assert_eq!(state.insurance.out_of_pocket_spent, 0.0);
}

#[test]
fn submission_is_free_and_pending() {
    let mut state = fresh();
    let hope = state.resources.hope;
    let r = state.submit_prior_auth(&chemo());

    assert_eq!(r.status, PriorAuthStatus::Pending);
    assert_eq!(r.submitted_day, 1);
    assert!(state.insurance.is_pending("Chemotherapy (standard)"));
    assert_eq!(state.resources.hope, hope);
    assert_eq!(state.day(), 1);
}

#[test]
fn requests_wait_before_decision() {
    let mut state = fresh();
    state.submit_prior_auth(&chemo());
    let reasons = vec!["Nope".to_string()];
    let mut rng = ScriptedRng::constant(0.0);

    state.advance_day(4);
    assert!(state.process_pending(&reasons, &mut rng).is_empty());
    assert_eq!(rng.draws(), 0, "ineligible requests consume no randomness");

    state.advance_day(1);
    let decisions = state.process_pending(&reasons, &mut rng);
    assert_eq!(decisions.len(), 1);
    assert!(decisions[0].approved);
    assert!(state.insurance.is_approved("Chemotherapy (standard)"));
    assert!(state.insurance.pending.is_empty());
}

#[test]
fn denial_costs_hope_and_records_reason() {
    let mut state = fresh();
    let r = state.submit_prior_auth(&chemo());
    state.advance_day(5);
    let hope = state.resources.hope;

    let reasons = vec!["Form 47-B missing".to_string()];
    let decisions = state.process_pending(&reasons, &mut ScriptedRng::new(vec![0.99, 0.0]));

    assert!(!decisions[0].approved);
    assert_eq!(decisions[0].reason.as_deref(), Some("Form 47-B missing"));
    assert_eq!(state.resources.hope, hope - 10.0);
    assert_eq!(state.insurance.denied[0].id, r.id);
    assert_eq!(state.insurance.denied[0].denial_reason(), Some("Form 47-B missing"));
}

#[test]
fn appeals_are_exhausted_after_three() {
    let mut state = fresh();
    let r = state.submit_prior_auth(&chemo());
    let reasons = vec!["Nope".to_string()];
    let mut deny = ScriptedRng::constant(0.99);

    for n in 1..=MAX_APPEALS {
        state.advance_day(5);
        state.process_pending(&reasons, &mut deny);
        assert_eq!(state.insurance.denied.len(), 1);

        let hope = state.resources.hope;
        let day = state.day();
        let result = state.appeal_denial(r.id);
        assert_eq!(result, AppealResult::Filed { request_id: r.id, appeal_number: n });
        assert_eq!(state.resources.hope, hope - 5.0, "appeal costs 5 hope");
        assert_eq!(state.day(), day + 2, "appeal costs 2 days");
        assert_eq!(state.insurance.pending[0].submitted_day, day);
    }

    state.advance_day(5);
    state.process_pending(&reasons, &mut deny);
    let hope = state.resources.hope;
    assert_eq!(
        state.appeal_denial(r.id),
        AppealResult::LimitReached { appeals: MAX_APPEALS }
    );
    assert_eq!(state.resources.hope, hope, "refused appeal costs nothing");
    assert_eq!(state.appeal_denial(4242), AppealResult::NotFound);
}

#[test]
fn each_appeal_improves_the_odds() {
    let state = fresh();
    let base = approval_chance(&request(10_000.0, 0), &state);
    let appealed = approval_chance(&request(10_000.0, 2), &state);
    assert!((appealed - base - 0.10).abs() < 1e-9);
}

#[test]
fn denial_letter_fills_every_placeholder() {
    let mut state = fresh();
    let r = state.submit_prior_auth(&chemo());
    state.advance_day(5);
    state.process_pending(&["Step therapy required".to_string()], &mut ScriptedRng::constant(0.99));

    let denied = state.insurance.denied[0].clone();
    let letter = state.denial_letter(&denied, &ContentPack::default_test().denial_letter_template);
    assert!(letter.contains("Chemotherapy (standard)"));
    assert!(letter.contains("Step therapy required"));
    assert!(letter.contains("UnitedHealth"));
    assert!(letter.contains(&format!("Day {}", state.day() + 3)));
    assert!(!letter.contains('{'), "unfilled placeholder in: {letter}");
    assert_eq!(denied.id, r.id);
}
