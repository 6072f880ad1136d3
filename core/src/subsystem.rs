//! Subsystem trait.
//!
//! RULE: Every daily subsystem implements SimSubsystem.
//! The engine calls update() on each one in a fixed order, every day.
//! Execution order is documented in engine.rs.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SimRng,
    state::SessionState,
    types::Day,
};

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per day by the engine.
    ///
    /// - `day`:   the current day number (after today's decay)
    /// - `state`: the session, mutated only through its ledger methods
    /// - `rng`:   this subsystem's deterministic stream for today
    ///
    /// Returns the events to append to today's log.
    fn update(
        &mut self,
        day: Day,
        state: &mut SessionState,
        rng: &mut dyn SimRng,
    ) -> SimResult<Vec<SimEvent>>;
}
