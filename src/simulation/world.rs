//! Simulation wiring and lifecycle
//!
//! `Simulation` is the entry point: it builds the shared state, the control
//! surface and the loop, and owns starting and stopping the loop thread.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{error, info, warn};

use crate::error::{SimError, SimResult};

use super::control::ControlSurface;
use super::obstacle::{ObstacleSource, RandomObstacles};
use super::sim_loop::{LoopReport, SimulationLoop};
use super::state::SharedVehicleState;
use super::types::{VehicleState, DEFAULT_TICK_INTERVAL};
use super::vehicle::TickOutcome;

/// Extra time granted on top of the tick-based shutdown bound
const SHUTDOWN_MARGIN: Duration = Duration::from_millis(250);

/// Simulation configuration.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// How long `shutdown` waits for the loop before giving up.
    pub shutdown_timeout: Duration,
    /// Seed for the obstacle RNG; `None` uses the thread RNG.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Config with the given tick and a shutdown bound of two ticks plus margin
    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            shutdown_timeout: tick_interval * 2 + SHUTDOWN_MARGIN,
            seed: None,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::with_tick_interval(DEFAULT_TICK_INTERVAL)
    }
}

struct LoopHandle {
    shutdown: Sender<()>,
    done: Receiver<SimulationLoop>,
    thread: JoinHandle<()>,
}

/// A single simulated vehicle with its control surface and loop
pub struct Simulation {
    config: SimulationConfig,
    state: SharedVehicleState,
    control: ControlSurface,
    /// The loop while it is not running on its own thread
    idle: Option<SimulationLoop>,
    running: Option<LoopHandle>,
}

impl Simulation {
    /// Create a simulation using random obstacles (seeded if the config says so)
    pub fn new(config: SimulationConfig) -> Self {
        let obstacles = match config.seed {
            Some(seed) => RandomObstacles::with_seed(seed),
            None => RandomObstacles::new(),
        };
        Self::with_obstacles(config, obstacles)
    }

    /// Create a simulation with a specific obstacle source
    pub fn with_obstacles(config: SimulationConfig, obstacles: impl ObstacleSource + 'static) -> Self {
        let state = SharedVehicleState::new(VehicleState::new());
        let control = ControlSurface::new(state.clone());
        let sim_loop = SimulationLoop::new(state.clone(), Box::new(obstacles), config.tick_interval);

        Self {
            config,
            state,
            control,
            idle: Some(sim_loop),
            running: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Control surface; clone it to hand to request handlers
    pub fn control(&self) -> &ControlSurface {
        &self.control
    }

    pub fn snapshot(&self) -> VehicleState {
        self.state.snapshot()
    }

    pub fn is_loop_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start ticking on a background thread
    pub fn spawn_loop(&mut self) -> SimResult<()> {
        if self.running.is_some() {
            return Err(SimError::LoopAlreadyRunning);
        }
        let sim_loop = self.idle.take().ok_or(SimError::LoopLost)?;

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<SimulationLoop>(1);

        let thread = thread::Builder::new()
            .name("vehicle-sim-loop".to_string())
            .spawn(move || sim_loop.run(shutdown_rx, done_tx))?;

        self.running = Some(LoopHandle {
            shutdown: shutdown_tx,
            done: done_rx,
            thread,
        });
        Ok(())
    }

    /// Tick once on the calling thread. Only allowed while the loop is not running.
    ///
    /// Returns `None` if the tick failed (already logged).
    pub fn step(&mut self) -> SimResult<Option<TickOutcome>> {
        if self.running.is_some() {
            return Err(SimError::LoopAlreadyRunning);
        }
        let sim_loop = self.idle.as_mut().ok_or(SimError::LoopLost)?;
        Ok(sim_loop.step())
    }

    /// Stop the loop and wait for it to acknowledge, up to `shutdown_timeout`.
    ///
    /// Returns the loop's lifetime report. Calling this with no loop running
    /// just returns the report so far.
    pub fn shutdown(&mut self) -> SimResult<LoopReport> {
        let Some(handle) = self.running.take() else {
            return self
                .idle
                .as_ref()
                .map(SimulationLoop::report)
                .ok_or(SimError::LoopLost);
        };

        let timeout = self.config.shutdown_timeout;
        // Full only if a signal is already pending, which is just as good
        let _ = handle.shutdown.try_send(());

        match handle.done.recv_timeout(timeout) {
            Ok(sim_loop) => {
                if handle.thread.join().is_err() {
                    warn!("Simulation loop thread panicked after acknowledging shutdown");
                }
                let report = sim_loop.report();
                report.log_summary();
                self.idle = Some(sim_loop);
                Ok(report)
            }
            Err(RecvTimeoutError::Timeout) => {
                error!("Simulation loop did not stop within {:?}", timeout);
                Err(SimError::ShutdownTimeout { timeout })
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.thread.join();
                error!("Simulation loop exited without acknowledging shutdown");
                Err(SimError::LoopLost)
            }
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        // Signal only; dropping must not block
        if let Some(handle) = self.running.take() {
            info!("Simulation dropped with loop running; signalling it to stop");
            let _ = handle.shutdown.try_send(());
        }
    }
}
