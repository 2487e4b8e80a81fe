//! Vehicle simulation core
//!
//! Shared vehicle state, the per-tick rules, the control surface and the
//! background loop that ties them together. Independent of any transport.

mod control;
mod obstacle;
mod sim_loop;
mod state;
mod types;
mod vehicle;
mod world;

pub use control::{Command, ControlSurface};
pub use obstacle::{ObstacleSource, RandomObstacles, ScriptedObstacles};
pub use sim_loop::{LoopReport, SimulationLoop};
pub use state::SharedVehicleState;
pub use types::{
    Lane, RunStatus, Vec2, VehicleState, CRUISE_SPEED, DEFAULT_TICK_INTERVAL, OBSTACLE_PROBABILITY,
};
pub use vehicle::TickOutcome;
pub use world::{Simulation, SimulationConfig};
