//! Vehicle Simulation Library
//!
//! A single simulated vehicle ticking on a fixed clock, with a concurrent
//! control surface to start, stop and inspect it.

pub mod api;
pub mod error;
pub mod simulation;

pub use error::{SimError, SimResult};
