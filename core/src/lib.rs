//! Simulation core for a satirical cancer-care game: five meters, a bill
//! ledger, a prior authorization queue, random and scheduled events, political
//! news, and an ending classifier, driven one day at a time by `SimEngine`.

pub mod billing;
pub mod clock;
pub mod command;
pub mod config;
pub mod effects;
pub mod ending;
pub mod engine;
pub mod error;
pub mod event;
pub mod event_subsystem;
pub mod news_subsystem;
pub mod prior_auth_subsystem;
pub mod relief;
pub mod resources;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod subsystem;
pub mod treatment;
pub mod types;
