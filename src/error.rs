//! Error types for the vehicle simulation.
//!
//! Control and lifecycle failures are strongly typed so callers can match
//! on them. Failures inside a single tick never reach callers; the loop
//! logs and counts them instead.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A control command other than `start` or `stop` was received.
    #[error("Invalid command: {command:?}")]
    InvalidCommand { command: String },

    /// The loop did not acknowledge shutdown within the allowed time.
    #[error("Simulation loop did not stop within {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    #[error("Simulation loop is already running")]
    LoopAlreadyRunning,

    /// The loop thread went away without handing its state back.
    #[error("Simulation loop was lost")]
    LoopLost,

    #[error("Failed to spawn simulation loop thread: {0}")]
    LoopSpawn(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
