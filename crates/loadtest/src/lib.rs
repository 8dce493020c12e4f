//! Join simulator.
//!
//! Fires one join request per configured student, all at once, against a
//! running classroom server and reports how many got a seat.

pub mod config;
pub mod join;

pub use config::{SessionPlan, SimulationConfig, StudentPlan};
pub use join::{JoinAttempt, JoinError, Summary, run};
