//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! Every random decision goes through the `SimRng` trait. In a live
//! session the samples come from a `SubsystemRng` derived from the single
//! master seed; tests substitute a `ScriptedRng` with a fixed sequence.
//!
//! Each subsystem gets its own stream per day, seeded from
//! (master_seed, slot, day, salt). This means:
//!   - Adding a new subsystem never changes existing subsystems' streams.
//!   - Each day's rolls are reproducible in isolation.

use crate::types::Day;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// Source of uniform samples in [0.0, 1.0).
pub trait SimRng {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick an index in [0, len). `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "len must be > 0");
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }
}

/// A named, deterministic RNG for a single subsystem.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a stream from the master seed and the stable slot index,
    /// mixed with the day and a per-call salt.
    pub fn new(master_seed: u64, slot_index: u64, day: Day, salt: u64) -> Self {
        let derived_seed = master_seed
            ^ slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ day.wrapping_mul(0xc2b2_ae3d_27d4_eb4f)
            ^ salt.wrapping_mul(0x1656_67b1_9e37_79f9);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }
}

impl SimRng for SubsystemRng {
    fn next_f64(&mut self) -> f64 {
        let bits = self.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
/// Used by tests to force specific branches.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    samples: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(samples: Vec<f64>) -> Self {
        assert!(!samples.is_empty(), "ScriptedRng needs at least one sample");
        Self { samples, cursor: 0 }
    }

    /// A source that always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples handed out so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl SimRng for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        let value = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        value
    }
}

/// All subsystem RNGs for a single session, indexed by stable slot.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_subsystem(&self, slot: SubsystemSlot, day: Day) -> SubsystemRng {
        self.stream(slot, day, 0)
    }

    /// A stream for the n-th call in the same slot on the same day.
    /// Player commands use this so two commands on one day roll differently.
    pub fn stream(&self, slot: SubsystemSlot, day: Day, salt: u64) -> SubsystemRng {
        SubsystemRng::new(self.master_seed, slot as u64, day, salt).with_name(slot.name())
    }
}

/// Stable subsystem slot assignments.
/// NEVER reorder or remove entries. Append only.
/// Reordering changes every subsystem's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    PriorAuth = 0,
    Events = 1,
    News = 2,
    Commands = 3,
    // Add new subsystems here, append only.
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PriorAuth => "prior_auth",
            Self::Events => "events",
            Self::News => "news",
            Self::Commands => "commands",
        }
    }
}
