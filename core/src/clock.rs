//! Session clock: owns the day counter, derived week, and game phase.

use crate::types::Day;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub day:   Day,
    pub week:  u64,
    pub phase: Phase,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            day:   1,
            week:  1,
            phase: Phase::Diagnosis,
        }
    }
}

impl SimClock {
    /// Advance `days` days. Returns the new day number.
    pub fn advance(&mut self, days: Day) -> Day {
        self.day += days;
        self.week = week_of(self.day);
        self.day
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ending
    }
}

/// Week number for a day: ceil(day / 7), so days 1..=7 are week 1.
pub fn week_of(day: Day) -> u64 {
    day.div_ceil(7)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Diagnosis,
    Insurance,
    Treatment,
    Financial,
    Ending,
}
