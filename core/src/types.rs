//! Shared primitive types used across the entire simulation.

/// A simulation day. One tick = one in-game day.
pub type Day = u64;

/// A stable, unique identifier for bills and prior-auth requests.
/// Issued from a per-session counter, never reused.
pub type EntityId = u64;

/// The canonical session identifier.
pub type SessionId = String;
