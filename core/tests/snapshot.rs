//! Save slot: round trip, the single storage key, and corrupt data.

use priorauth_core::{
    config::{ContentPack, SessionConfig},
    resources::Meter,
    rng::ScriptedRng,
    snapshot::{self, SAVE_KEY},
    state::SessionState,
    store::SimStore,
};

fn store() -> SimStore {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

/// A state that has been through most of the ledgers.
fn lived_in() -> SessionState {
    let pack = ContentPack::default_test();
    let mut state = SessionState::new(&SessionConfig::default());
    let chemo = pack.treatment("Chemotherapy (standard)").cloned().unwrap();
    let surgery = pack.treatment("Surgery (tumor removal)").cloned().unwrap();

    state.submit_prior_auth(&chemo);
    let denied = state.submit_prior_auth(&surgery);
    state.advance_day(15);
    state.process_pending(&pack.denial_reasons, &mut ScriptedRng::new(vec![0.0, 0.99, 0.3]));
    state.appeal_denial(denied.id);
    state.start_treatment(&chemo, true);
    let bill = state.add_bill("Lab work", 1_234.56, 30);
    state.pay_bill(bill.id, 200.0);
    state.modify(Meter::Coverage, -12.5, "Policy update");
    state.events.insurance_seen.insert("ins_2".into());
    state.events.news_history.push("exec_1".into());
    state.political.executive_orders = 1;
    state
}

#[test]
fn save_then_load_reproduces_the_state() {
    let store = store();
    let state = lived_in();

    store.save_session(&state).unwrap();
    let loaded = store.load_session().unwrap().expect("a save exists");

    assert_eq!(loaded, state);
}

#[test]
fn snapshot_has_the_documented_top_level_fields() {
    let json = snapshot::encode(&lived_in()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let obj = value.as_object().unwrap();

    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "day", "events", "finances", "insurance", "phase", "player", "political",
            "resources", "treatment", "week",
        ]
    );
}

#[test]
fn loaded_state_keeps_issuing_fresh_ids() {
    let state = lived_in();
    let max_id = state.finances.bills.iter().map(|b| b.id).max().unwrap();

    let mut loaded = snapshot::decode(&snapshot::encode(&state).unwrap()).unwrap();
    let bill = loaded.add_bill("After reload", 10.0, 30);
    assert!(bill.id > max_id, "id {} reissued (max was {max_id})", bill.id);
}

#[test]
fn saves_live_under_one_key() {
    let store = store();
    assert!(!store.has_save().unwrap());

    store.save_session(&lived_in()).unwrap();
    store.save_session(&lived_in()).unwrap();
    assert!(store.has_save().unwrap());
    assert!(store.get_slot(SAVE_KEY).unwrap().is_some());
    assert!(store.slot_saved_at(SAVE_KEY).unwrap().is_some());

    store.delete_save().unwrap();
    assert!(!store.has_save().unwrap());
    assert!(store.load_session().unwrap().is_none());
}

#[test]
fn corrupt_save_reads_as_no_save() {
    let store = store();
    store.put_slot(SAVE_KEY, "{\"player\": {not json").unwrap();
    assert!(store.load_session().unwrap().is_none());

    store.put_slot(SAVE_KEY, "{\"player\": 3}").unwrap();
    assert!(store.load_session().unwrap().is_none(), "wrong shape is corrupt too");
}
