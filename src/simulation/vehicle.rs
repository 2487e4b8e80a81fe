//! Per-tick motion, obstacle and lane rules
//!
//! Standalone and synchronous; the loop calls this under the state lock.

use anyhow::{Context, Result};

use super::obstacle::ObstacleSource;
use super::types::{RunStatus, Vec2, VehicleState, CRUISE_SPEED};

/// What a single tick did, beyond the new state itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// The lane toggled because the previous tick saw an obstacle
    pub lane_changed: bool,
}

impl VehicleState {
    /// Advance the vehicle by one tick.
    ///
    /// On error `self` may be partially updated; callers that need
    /// all-or-nothing semantics run this on a copy (see `SharedVehicleState::apply_tick`).
    pub fn tick(&mut self, obstacles: &mut dyn ObstacleSource) -> Result<TickOutcome> {
        match self.status {
            RunStatus::Running => {
                self.velocity.x = CRUISE_SPEED;

                // The flag still holds the previous tick's reading here
                let lane_changed = self.obstacle_detected;
                if lane_changed {
                    self.lane = self.lane.toggled();
                }

                self.position.x += self.velocity.x;
                self.position.y = 0.0;

                self.obstacle_detected = obstacles
                    .detect()
                    .context("Failed to read obstacle sensor")?;

                Ok(TickOutcome { lane_changed })
            }
            RunStatus::Stopped => {
                self.velocity = Vec2::ZERO;
                self.obstacle_detected = false;
                Ok(TickOutcome::default())
            }
        }
    }
}
