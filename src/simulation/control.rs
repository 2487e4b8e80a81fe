//! Control surface for external callers
//!
//! `start` and `stop` only flip the run status; the loop applies the
//! consequences on its next tick.

use std::str::FromStr;

use log::{debug, info};

use crate::error::{SimError, SimResult};

use super::state::SharedVehicleState;
use super::types::{RunStatus, VehicleState};

/// A recognised control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    /// Status the vehicle is in once this command is applied
    pub fn target_status(self) -> RunStatus {
        match self {
            Command::Start => RunStatus::Running,
            Command::Stop => RunStatus::Stopped,
        }
    }
}

impl FromStr for Command {
    type Err = SimError;

    /// Case-insensitive; surrounding whitespace is not stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            _ => Err(SimError::InvalidCommand {
                command: s.to_string(),
            }),
        }
    }
}

/// Operations available to callers outside the loop
#[derive(Debug, Clone)]
pub struct ControlSurface {
    state: SharedVehicleState,
}

impl ControlSurface {
    pub fn new(state: SharedVehicleState) -> Self {
        Self { state }
    }

    pub fn start(&self) -> RunStatus {
        self.apply(Command::Start)
    }

    pub fn stop(&self) -> RunStatus {
        self.apply(Command::Stop)
    }

    /// Current snapshot of the vehicle
    pub fn status(&self) -> VehicleState {
        self.state.snapshot()
    }

    /// Parse and apply a textual command.
    /// Invalid commands leave the state untouched.
    pub fn execute(&self, command: &str) -> SimResult<RunStatus> {
        let command: Command = command.parse()?;
        Ok(self.apply(command))
    }

    pub fn apply(&self, command: Command) -> RunStatus {
        let target = command.target_status();
        let previous = self.state.set_status(target);
        if previous == target {
            debug!("{:?} ignored, vehicle already {}", command, target);
        } else {
            info!("Vehicle {} -> {}", previous, target);
        }
        target
    }
}
