//! Obstacle detection sources
//!
//! The tick rule asks an `ObstacleSource` whether the road ahead is blocked.
//! Production runs use `RandomObstacles`; tests replay fixed outcomes with
//! `ScriptedObstacles`.

use std::collections::VecDeque;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::types::OBSTACLE_PROBABILITY;

/// Supplies one obstacle reading per running tick
pub trait ObstacleSource: Send {
    fn detect(&mut self) -> Result<bool>;
}

/// Detects an obstacle with probability `OBSTACLE_PROBABILITY`, independently per call
#[derive(Debug, Default)]
pub struct RandomObstacles {
    /// Optional seeded RNG for reproducible runs
    rng: Option<StdRng>,
}

impl RandomObstacles {
    pub fn new() -> Self {
        Self { rng: None }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ObstacleSource for RandomObstacles {
    fn detect(&mut self) -> Result<bool> {
        Ok(match &mut self.rng {
            Some(rng) => rng.random_bool(OBSTACLE_PROBABILITY),
            None => rand::rng().random_bool(OBSTACLE_PROBABILITY),
        })
    }
}

/// Replays a fixed sequence of readings
#[derive(Debug, Clone)]
pub struct ScriptedObstacles {
    readings: VecDeque<bool>,
    cycle: bool,
}

impl ScriptedObstacles {
    /// Play `readings` once; asking for more is an error
    pub fn once(readings: impl IntoIterator<Item = bool>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            cycle: false,
        }
    }

    /// Play `readings` forever
    pub fn cycle(readings: impl IntoIterator<Item = bool>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            cycle: true,
        }
    }
}

impl ObstacleSource for ScriptedObstacles {
    fn detect(&mut self) -> Result<bool> {
        let reading = match self.readings.pop_front() {
            Some(reading) => reading,
            None => anyhow::bail!("obstacle script exhausted"),
        };
        if self.cycle {
            self.readings.push_back(reading);
        }
        Ok(reading)
    }
}
