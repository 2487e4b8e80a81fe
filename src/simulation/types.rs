//! Core types for the vehicle simulation
//!
//! Plain data with no synchronization; sharing is handled by `state`.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Forward speed while running, in distance units per tick
pub const CRUISE_SPEED: f64 = 1.0;

/// Chance that an obstacle is detected on any given tick
pub const OBSTACLE_PROBABILITY: f64 = 0.25;

/// Default wall-clock time between ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A 2D vector used for both position and velocity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for [f64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

/// One of the two parallel tracks the vehicle can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub enum Lane {
    #[default]
    One,
    Two,
}

impl Lane {
    /// The other lane
    pub fn toggled(self) -> Self {
        match self {
            Lane::One => Lane::Two,
            Lane::Two => Lane::One,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Lane::One => 1,
            Lane::Two => 2,
        }
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> Self {
        lane.number()
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Whether the vehicle has been told to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Stopped,
    Running,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Stopped => "stopped",
            RunStatus::Running => "running",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full vehicle record
///
/// `Copy` so that a snapshot is always a complete, independent value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    /// x is cumulative distance travelled, y is pinned to 0 while running
    pub position: Vec2,
    pub velocity: Vec2,
    /// Set during a running tick; consumed by the following tick
    pub obstacle_detected: bool,
    pub status: RunStatus,
    pub lane: Lane,
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }
}
