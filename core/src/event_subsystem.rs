//! Event dispatcher: scheduled and random game events.
//!
//! Two sources per day:
//!   1. Scheduled events whose trigger day has arrived. They fire
//!      unconditionally and leave the schedule.
//!   2. Random categories, each with its own roll and cooldown:
//!
//!      category    gate                     p                        cooldown  pool
//!      insurance   -                        0.15 + (100−cov)·0.002   3         no-repeat
//!      political   day % 7 == 0             0.30                     7         no-repeat
//!      hospital    treatment plan active    0.20                     5         no-repeat
//!      financial   total owed > 10 000      0.25                     3         repeatable
//!      collection  in collections           0.40                     -         synthesized
//!
//! A category in cooldown is skipped without rolling. Cooldowns start only
//! when an event actually fires. Everything triggered is returned in order
//! and applied in that order.

use crate::{
    config::EventTemplate,
    effects::Effects,
    error::SimResult,
    event::SimEvent,
    rng::SimRng,
    state::SessionState,
    subsystem::SimSubsystem,
    types::Day,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const FINANCIAL_DEBT_THRESHOLD: f64 = 10_000.0;
pub const COLLECTION_CALL_HOPE: f64 = -2.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Insurance,
    Political,
    Hospital,
    Financial,
    Collection,
}

impl EventCategory {
    pub fn cooldown_days(&self) -> Option<Day> {
        match self {
            Self::Insurance  => Some(3),
            Self::Political  => Some(7),
            Self::Hospital   => Some(5),
            Self::Financial  => Some(3),
            Self::Collection => None,
        }
    }

    /// Repeatable categories may replay the same item.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Self::Financial | Self::Collection)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Insurance  => "insurance",
            Self::Political  => "political",
            Self::Hospital   => "hospital",
            Self::Financial  => "financial",
            Self::Collection => "collection",
        }
    }
}

/// An event as the dispatcher sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub id:          String,
    pub category:    EventCategory,
    pub title:       String,
    pub description: String,
    pub effects:     Effects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_day: Option<Day>,
}

/// Draw one item from `pool` that is not yet in `seen`, and mark it seen.
/// Returns `None` once every item has been drawn.
pub fn draw_unseen<'a>(
    pool: &'a [EventTemplate],
    seen: &mut BTreeSet<String>,
    rng:  &mut dyn SimRng,
) -> Option<&'a EventTemplate> {
    let fresh: Vec<&EventTemplate> = pool.iter().filter(|e| !seen.contains(&e.id)).collect();
    if fresh.is_empty() {
        return None;
    }
    let pick = fresh[rng.pick_index(fresh.len())];
    seen.insert(pick.id.clone());
    Some(pick)
}

pub struct EventSubsystem {
    insurance: Vec<EventTemplate>,
    political: Vec<EventTemplate>,
    hospital:  Vec<EventTemplate>,
    financial: Vec<EventTemplate>,
    scheduled: Vec<EventRecord>,
    /// Category → first day it may fire again.
    cooldowns: BTreeMap<EventCategory, Day>,
}

impl EventSubsystem {
    pub fn new(
        insurance: Vec<EventTemplate>,
        political: Vec<EventTemplate>,
        hospital:  Vec<EventTemplate>,
        financial: Vec<EventTemplate>,
    ) -> Self {
        Self {
            insurance,
            political,
            hospital,
            financial,
            scheduled: Vec::new(),
            cooldowns: BTreeMap::new(),
        }
    }

    /// Queue an event to fire on `day` (or the first tick after it).
    pub fn schedule_event(&mut self, mut event: EventRecord, day: Day) {
        event.trigger_day = Some(day);
        self.scheduled.push(event);
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_on_cooldown(&self, category: EventCategory, day: Day) -> bool {
        self.cooldowns.get(&category).is_some_and(|&until| day < until)
    }

    fn set_cooldown(&mut self, category: EventCategory, day: Day) {
        if let Some(days) = category.cooldown_days() {
            self.cooldowns.insert(category, day + days);
        }
    }

    /// Collect every event that fires today, scheduled first. Marks
    /// no-repeat items as seen and starts cooldowns; applies nothing.
    pub fn check_events(&mut self, state: &mut SessionState, rng: &mut dyn SimRng) -> Vec<EventRecord> {
        let day = state.day();

        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|e| e.trigger_day.is_some_and(|t| t <= day));
        self.scheduled = later;
        let mut triggered = due;

        self.check_random_events(state, rng, &mut triggered);
        triggered
    }

    fn check_random_events(
        &mut self,
        state:     &mut SessionState,
        rng:       &mut dyn SimRng,
        triggered: &mut Vec<EventRecord>,
    ) {
        let day = state.day();

        let insurance_p = 0.15 + (100.0 - state.resources.coverage) * 0.002;
        if !self.is_on_cooldown(EventCategory::Insurance, day) && rng.chance(insurance_p) {
            if let Some(t) = draw_unseen(&self.insurance, &mut state.events.insurance_seen, rng) {
                triggered.push(t.to_record(EventCategory::Insurance));
                self.set_cooldown(EventCategory::Insurance, day);
            }
        }

        if day % 7 == 0 && !self.is_on_cooldown(EventCategory::Political, day) && rng.chance(0.3) {
            if let Some(t) = draw_unseen(&self.political, &mut state.events.political_seen, rng) {
                triggered.push(t.to_record(EventCategory::Political));
                self.set_cooldown(EventCategory::Political, day);
            }
        }

        if state.treatment.plan.is_some()
            && !self.is_on_cooldown(EventCategory::Hospital, day)
            && rng.chance(0.2)
        {
            if let Some(t) = draw_unseen(&self.hospital, &mut state.events.hospital_seen, rng) {
                triggered.push(t.to_record(EventCategory::Hospital));
                self.set_cooldown(EventCategory::Hospital, day);
            }
        }

        if state.finances.total_owed > FINANCIAL_DEBT_THRESHOLD
            && !self.financial.is_empty()
            && !self.is_on_cooldown(EventCategory::Financial, day)
            && rng.chance(0.25)
        {
            let t = &self.financial[rng.pick_index(self.financial.len())];
            triggered.push(t.to_record(EventCategory::Financial));
            self.set_cooldown(EventCategory::Financial, day);
        }

        if state.finances.in_collections && rng.chance(0.4) {
            state.finances.collection_calls += 1;
            let n = state.finances.collection_calls;
            triggered.push(EventRecord {
                id:          format!("collection_call_{n}"),
                category:    EventCategory::Collection,
                title:       "Collection Call".into(),
                description: format!("Collection call #{n} this month."),
                effects:     Effects::hope(COLLECTION_CALL_HOPE),
                trigger_day: None,
            });
        }
    }
}

impl SimSubsystem for EventSubsystem {
    fn name(&self) -> &'static str {
        "events"
    }

    fn update(
        &mut self,
        day:   Day,
        state: &mut SessionState,
        rng:   &mut dyn SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let triggered = self.check_events(state, rng);
        let mut out = Vec::with_capacity(triggered.len());

        for event in triggered {
            state.apply_effects(&event.effects, &event.title);
            log::debug!("day={day} event {} [{}]: {}", event.id, event.category.name(), event.title);
            out.push(SimEvent::EventTriggered {
                day,
                event_id: event.id,
                category: event.category,
                title:    event.title,
            });
        }
        Ok(out)
    }
}
