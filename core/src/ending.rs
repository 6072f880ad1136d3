//! Ending classifier: a pure, total function from state to outcome.
//!
//! First matching rule wins. The order is part of the contract:
//!   1. health ≤ 0                      → DeathByDenial
//!   2. hope ≤ 0                        → SystemWins
//!   3. time ≤ 0 and health > 0         → DeathByDelay
//!   4. milestones done and health > 50 → RemissionBankruptcy |
//!                                        AgainstAllOdds | RemissionBroke
//!   5. otherwise                       → Ongoing
//!
//! The classifier knows nothing about causes, only final meter values.

use crate::state::SessionState;
use serde::{Deserialize, Serialize};

pub const REMISSION_HEALTH: f64 = 50.0;
pub const COMFORTABLE_SAVINGS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    DeathByDenial,
    SystemWins,
    DeathByDelay,
    RemissionBankruptcy,
    AgainstAllOdds,
    RemissionBroke,
}

impl Ending {
    pub fn title(&self) -> &'static str {
        match self {
            Self::DeathByDenial       => "Death by Denial",
            Self::SystemWins          => "The System Wins",
            Self::DeathByDelay        => "Time Ran Out",
            Self::RemissionBankruptcy => "Remission + Bankruptcy",
            Self::AgainstAllOdds      => "Against All Odds",
            Self::RemissionBroke      => "Remission, Broke",
        }
    }

    pub fn is_survival(&self) -> bool {
        matches!(
            self,
            Self::RemissionBankruptcy | Self::AgainstAllOdds | Self::RemissionBroke
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ongoing,
    Ended(Ending),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended(_))
    }
}

pub fn classify(state: &SessionState) -> Outcome {
    let r = &state.resources;

    if r.health <= 0.0 {
        return Outcome::Ended(Ending::DeathByDenial);
    }
    if r.hope <= 0.0 {
        return Outcome::Ended(Ending::SystemWins);
    }
    if r.time <= 0.0 && r.health > 0.0 {
        return Outcome::Ended(Ending::DeathByDelay);
    }
    if state.treatment.milestones_complete() && r.health > REMISSION_HEALTH {
        let ending = if state.finances.bankruptcy_filed {
            Ending::RemissionBankruptcy
        } else if r.money > COMFORTABLE_SAVINGS {
            Ending::AgainstAllOdds
        } else {
            Ending::RemissionBroke
        };
        return Outcome::Ended(ending);
    }
    Outcome::Ongoing
}
