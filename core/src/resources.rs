//! Resource ledger: the five meters and the day clock.
//!
//! RULE: Every component mutates meters only through `modify()` or
//! `advance_day()`. Bounds are enforced here and nowhere else:
//!   - health, coverage, hope are clamped to [0, 100]
//!   - time is clamped to >= 0
//!   - money is never clamped
//!
//! There is no error path. Out-of-range deltas are applied and clamped.

use crate::{
    ending::Ending,
    state::SessionState,
    types::Day,
};
use serde::{Deserialize, Serialize};

/// Daily health loss while no treatment plan is active.
pub const UNTREATED_HEALTH_DECAY: f64 = 0.5;
/// Daily hope loss while in collections.
pub const COLLECTIONS_HOPE_DECAY: f64 = 0.2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Meter {
    Health,
    Money,
    Coverage,
    Hope,
    Time,
}

impl Meter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Health   => "health",
            Self::Money    => "money",
            Self::Coverage => "coverage",
            Self::Hope     => "hope",
            Self::Time     => "time",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resources {
    /// Physical condition, 0–100.
    pub health:   f64,
    /// Savings in dollars. May go negative.
    pub money:    f64,
    /// Insurance effectiveness, 0–100.
    pub coverage: f64,
    /// Will to keep fighting, 0–100.
    pub hope:     f64,
    /// Days left to live without treatment.
    pub time:     f64,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            health:   70.0,
            money:    25_000.0,
            coverage: 80.0,
            hope:     75.0,
            time:     365.0,
        }
    }
}

impl Resources {
    pub fn get(&self, meter: Meter) -> f64 {
        match meter {
            Meter::Health   => self.health,
            Meter::Money    => self.money,
            Meter::Coverage => self.coverage,
            Meter::Hope     => self.hope,
            Meter::Time     => self.time,
        }
    }
}

impl SessionState {
    /// Apply `delta` to a meter and return the new value.
    pub fn modify(&mut self, meter: Meter, delta: f64, reason: &str) -> f64 {
        // NaN would poison the clamp; treat it as no change.
        let delta = if delta.is_nan() { 0.0 } else { delta };
        let r = &mut self.resources;
        let value = match meter {
            Meter::Health => {
                r.health = (r.health + delta).clamp(0.0, 100.0);
                r.health
            }
            Meter::Money => {
                r.money += delta;
                r.money
            }
            Meter::Coverage => {
                r.coverage = (r.coverage + delta).clamp(0.0, 100.0);
                r.coverage
            }
            Meter::Hope => {
                r.hope = (r.hope + delta).clamp(0.0, 100.0);
                r.hope
            }
            Meter::Time => {
                r.time = (r.time + delta).max(0.0);
                r.time
            }
        };

        log::trace!(
            "day={} {} {delta:+.2} -> {value:.2} ({reason})",
            self.clock.day,
            meter.name()
        );
        self.record_decision(meter, delta, reason);

        match meter {
            Meter::Health if value <= 0.0 => self.flag_ending(Ending::DeathByDenial),
            Meter::Hope if value <= 0.0 => self.flag_ending(Ending::SystemWins),
            Meter::Time if value <= 0.0 => self.flag_ending(Ending::DeathByDelay),
            Meter::Coverage if value <= 0.0 => {
                if !self.insurance.policy_cancelled {
                    log::warn!("day={} coverage exhausted, policy cancelled", self.clock.day);
                }
                self.insurance.policy_cancelled = true;
            }
            _ => {}
        }
        value
    }

    /// Move the clock forward `days` days and apply the passive decay:
    /// time always runs down, health erodes without a treatment plan,
    /// and collections wear down hope. Returns the new day.
    pub fn advance_day(&mut self, days: Day) -> Day {
        let day = self.clock.advance(days);
        let n = days as f64;

        self.modify(Meter::Time, -n, "Time passes");

        if self.treatment.plan.is_none() {
            self.modify(
                Meter::Health,
                -UNTREATED_HEALTH_DECAY * n,
                "Untreated cancer progression",
            );
        }

        if self.finances.in_collections {
            self.modify(
                Meter::Hope,
                -COLLECTIONS_HOPE_DECAY * n,
                "Collection agency stress",
            );
        }

        day
    }
}
