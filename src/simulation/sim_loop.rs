//! The fixed-interval simulation loop
//!
//! Runs on its own thread, ticking the shared state once per interval until
//! the shutdown channel fires or is closed. A failing tick is logged and
//! counted; it never ends the loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, error, info};

use super::obstacle::ObstacleSource;
use super::state::SharedVehicleState;
use super::vehicle::TickOutcome;

/// Counters accumulated by the loop over its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopReport {
    /// Ticks that were applied successfully
    pub ticks_run: u64,
    /// Ticks that failed and were discarded
    pub ticks_failed: u64,
    pub lane_changes: u64,
}

impl LoopReport {
    pub fn log_summary(&self) {
        info!("=== SIMULATION LOOP STOPPED ===");
        info!("Ticks run: {}", self.ticks_run);
        info!("Ticks failed: {}", self.ticks_failed);
        info!("Lane changes: {}", self.lane_changes);
    }
}

/// Owns everything the loop thread needs.
///
/// Moves onto the loop thread when spawned and is handed back through the
/// acknowledgement channel on shutdown.
pub struct SimulationLoop {
    state: SharedVehicleState,
    obstacles: Box<dyn ObstacleSource>,
    tick_interval: Duration,
    report: LoopReport,
}

impl SimulationLoop {
    pub fn new(
        state: SharedVehicleState,
        obstacles: Box<dyn ObstacleSource>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            state,
            obstacles,
            tick_interval,
            report: LoopReport::default(),
        }
    }

    pub fn report(&self) -> LoopReport {
        self.report
    }

    /// Apply one tick, isolating any failure.
    ///
    /// Returns `None` if the tick failed; the shared state is then unchanged.
    pub fn step(&mut self) -> Option<TickOutcome> {
        let state = &self.state;
        let obstacles = &mut *self.obstacles;
        let result = panic::catch_unwind(AssertUnwindSafe(|| state.apply_tick(obstacles)));

        match result {
            Ok(Ok(outcome)) => {
                self.report.ticks_run += 1;
                if outcome.lane_changed {
                    self.report.lane_changes += 1;
                    debug!("Lane change on tick {}", self.report.ticks_run);
                }
                Some(outcome)
            }
            Ok(Err(e)) => {
                self.report.ticks_failed += 1;
                error!("Tick failed, state left unchanged: {:#}", e);
                None
            }
            Err(payload) => {
                self.report.ticks_failed += 1;
                error!(
                    "Tick panicked, state left unchanged: {}",
                    panic_message(payload.as_ref())
                );
                None
            }
        }
    }

    /// Loop body. Checks for shutdown before every tick and waits on the
    /// shutdown channel between ticks, so shutdown latency is at most one
    /// interval plus one tick.
    pub(crate) fn run(mut self, shutdown: Receiver<()>, done: Sender<SimulationLoop>) {
        info!("Simulation loop started, tick interval {:?}", self.tick_interval);

        loop {
            match shutdown.try_recv() {
                Err(TryRecvError::Empty) => {}
                Ok(()) | Err(TryRecvError::Disconnected) => break,
            }

            self.step();

            match shutdown.recv_timeout(self.tick_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!("Simulation loop acknowledging shutdown");
        // The receiver is gone if the owner was dropped without waiting
        let _ = done.send(self);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
