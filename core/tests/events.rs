//! Event dispatcher: scheduling, cooldowns, no-repeat pools, and effect
//! application through the shared contract.

use priorauth_core::{
    config::{ContentPack, SessionConfig},
    effects::{BillEffect, Effects},
    event_subsystem::{EventCategory, EventRecord, EventSubsystem},
    rng::ScriptedRng,
    state::{AcaStatus, SessionState},
    subsystem::SimSubsystem,
    treatment::TreatmentKind,
};

fn dispatcher() -> EventSubsystem {
    let pack = ContentPack::default_test();
    EventSubsystem::new(
        pack.insurance_events,
        pack.political_events,
        pack.hospital_events,
        pack.financial_events,
    )
}

fn fresh() -> SessionState {
    SessionState::new(&SessionConfig::default())
}

fn ids(events: &[EventRecord]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

fn scheduled(id: &str, effects: Effects) -> EventRecord {
    EventRecord {
        id: id.into(),
        category: EventCategory::Hospital,
        title: format!("Scheduled {id}"),
        description: String::new(),
        effects,
        trigger_day: None,
    }
}

#[test]
fn scheduled_events_fire_once_on_their_day() {
    let mut events = dispatcher();
    let mut state = fresh();
    let mut never = ScriptedRng::constant(0.999);
    events.schedule_event(scheduled("follow_up", Effects::hope(-1.0)), 3);

    state.clock.day = 2;
    assert!(events.check_events(&mut state, &mut never).is_empty());

    state.clock.day = 5;
    let fired = events.check_events(&mut state, &mut never);
    assert_eq!(ids(&fired), vec!["follow_up"], "late ticks still fire overdue events");
    assert_eq!(events.scheduled_count(), 0);

    state.clock.day = 6;
    assert!(events.check_events(&mut state, &mut never).is_empty());
}

#[test]
fn insurance_cooldown_blocks_three_days() {
    let mut events = dispatcher();
    let mut state = fresh();
    let mut always = ScriptedRng::constant(0.0);

    state.clock.day = 1;
    assert_eq!(ids(&events.check_events(&mut state, &mut always)), vec!["ins_1"]);
    for day in 2..=3 {
        state.clock.day = day;
        assert!(
            events.check_events(&mut state, &mut always).is_empty(),
            "insurance should be cooling down on day {day}"
        );
        assert!(events.is_on_cooldown(EventCategory::Insurance, day));
    }
    state.clock.day = 4;
    assert_eq!(ids(&events.check_events(&mut state, &mut always)), vec!["ins_2"]);
}

#[test]
fn no_repeat_pool_runs_dry() {
    let mut events = dispatcher();
    let mut state = fresh();
    let mut always = ScriptedRng::constant(0.0);
    let mut seen = Vec::new();

    for day in [1, 4, 8, 11, 15] {
        state.clock.day = day;
        for e in events.check_events(&mut state, &mut always) {
            if e.category == EventCategory::Insurance {
                seen.push(e.id);
            }
        }
    }
    seen.sort();
    assert_eq!(seen, vec!["ins_1", "ins_2", "ins_3"], "each item exactly once");
    assert_eq!(state.events.insurance_seen.len(), 3);
    assert!(
        !events.is_on_cooldown(EventCategory::Insurance, 12),
        "an empty draw does not start a cooldown"
    );
}

#[test]
fn political_events_only_on_week_boundaries() {
    let mut events = dispatcher();
    let mut state = fresh();
    let mut always = ScriptedRng::constant(0.0);
    state.events.insurance_seen.extend(["ins_1", "ins_2", "ins_3"].map(String::from));

    state.clock.day = 6;
    assert!(events.check_events(&mut state, &mut always).is_empty());

    state.clock.day = 7;
    let fired = events.check_events(&mut state, &mut always);
    assert_eq!(ids(&fired), vec!["pol_1"]);
    assert_eq!(fired[0].category, EventCategory::Political);
}

#[test]
fn categories_roll_independently_and_in_order() {
    let mut events = dispatcher();
    let mut state = fresh();
    state.clock.day = 7;
    state.treatment.plan = Some(TreatmentKind::Chemotherapy);
    state.add_bill("Big one", 20_000.0, 0);
    state.finances.in_collections = true;

    let fired = events.check_events(&mut state, &mut ScriptedRng::constant(0.0));
    let categories: Vec<_> = fired.iter().map(|e| e.category).collect();
    assert_eq!(
        categories,
        vec![
            EventCategory::Insurance,
            EventCategory::Political,
            EventCategory::Hospital,
            EventCategory::Financial,
            EventCategory::Collection,
        ]
    );
    assert_eq!(fired[4].id, "collection_call_1");
    assert_eq!(state.finances.collection_calls, 1);
}

#[test]
fn financial_pool_repeats() {
    let mut events = dispatcher();
    let mut state = fresh();
    state.add_bill("Debt", 15_000.0, 30);
    state.events.insurance_seen.extend(["ins_1", "ins_2", "ins_3"].map(String::from));
    let mut always = ScriptedRng::constant(0.0);

    let mut financial = Vec::new();
    for day in [1, 4, 8, 11] {
        state.clock.day = day;
        financial.extend(
            events
                .check_events(&mut state, &mut always)
                .into_iter()
                .filter(|e| e.category == EventCategory::Financial)
                .map(|e| e.id),
        );
    }
    assert_eq!(financial, vec!["fin_1"; 4]);
}

#[test]
fn misses_consume_one_roll_per_gated_category() {
    let mut events = dispatcher();
    let mut state = fresh();
    state.clock.day = 2;
    let mut rng = ScriptedRng::constant(0.999);
    assert!(events.check_events(&mut state, &mut rng).is_empty());
    assert_eq!(rng.draws(), 1, "only the insurance gate is open");
}

#[test]
fn update_applies_effects_in_order() {
    let mut events = dispatcher();
    let mut state = fresh();
    let effects = Effects {
        hope: Some(-7.0),
        bill: Some(BillEffect { description: "Surprise".into(), amount: 900.0 }),
        network_change: Some("provider-left".into()),
        ..Effects::default()
    };
    events.schedule_event(scheduled("combo", effects), 1);

    let out = events
        .update(1, &mut state, &mut ScriptedRng::constant(0.999))
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].type_name(), "event_triggered");
    assert_eq!(state.resources.hope, 73.0);
    assert_eq!(state.finances.total_owed, 900.0);
    assert_eq!(state.insurance.network_status, "provider-left");
}

#[test]
fn political_event_rewrites_political_state() {
    let mut events = dispatcher();
    let mut state = fresh();
    state.clock.day = 7;
    state.events.insurance_seen.extend(["ins_1", "ins_2", "ins_3"].map(String::from));

    let mut always = ScriptedRng::constant(0.0);
    events.update(7, &mut state, &mut always).unwrap();
    assert_eq!(state.political.aca_status, AcaStatus::Repealed);
    assert_eq!(state.resources.hope, 60.0);
}
