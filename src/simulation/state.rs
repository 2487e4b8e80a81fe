//! Shared vehicle state
//!
//! A single mutex guards the whole record. Every reader and writer, the
//! loop included, goes through this handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use log::warn;

use super::obstacle::ObstacleSource;
use super::types::{RunStatus, VehicleState};
use super::vehicle::TickOutcome;

/// Cloneable handle to the one shared `VehicleState`
#[derive(Debug, Clone, Default)]
pub struct SharedVehicleState {
    inner: Arc<Mutex<VehicleState>>,
}

impl SharedVehicleState {
    pub fn new(initial: VehicleState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    /// The guarded value is only ever replaced wholesale, so it is consistent
    /// even if a previous holder panicked.
    fn lock(&self) -> MutexGuard<'_, VehicleState> {
        self.inner.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("Vehicle state lock was poisoned; recovering last committed state");
            poisoned.into_inner()
        })
    }

    /// Point-in-time copy of the full record
    pub fn snapshot(&self) -> VehicleState {
        *self.lock()
    }

    /// Set the run status, returning the previous one
    pub fn set_status(&self, status: RunStatus) -> RunStatus {
        let mut state = self.lock();
        std::mem::replace(&mut state.status, status)
    }

    /// Apply one tick atomically.
    ///
    /// The rule runs on a copy that is committed only if it succeeds, so a
    /// failed tick leaves the shared state untouched.
    pub fn apply_tick(&self, obstacles: &mut dyn ObstacleSource) -> Result<TickOutcome> {
        let mut state = self.lock();
        let mut next = *state;
        let outcome = next.tick(obstacles)?;
        *state = next;
        Ok(outcome)
    }
}
