//! Rainfall sources for the water layer.

use log::trace;
use rand::prelude::*;

use super::{Rule, RuleError, require_layer, with_layer};
use crate::compute::{Canvases, Grid, Lattice};

/// Default layer fed by the rainfall rules.
pub const WATER: &str = "water";

/// Spread `net_water` evenly over every cell.
fn rain_uniform(grid: &mut Grid, net_water: f32) {
    let per_cell = net_water / grid.len() as f32;
    grid.add_scalar(per_cell);
}

/// Uniform rainfall every step.
///
/// `fraction`, `net_evap` and the seeded generator are carried for
/// configuration compatibility; the uniform source does not use them.
#[derive(Debug, Clone)]
pub struct RainFallClosed {
    key: String,
    net_water: f32,
    fraction: f32,
    seed: u64,
    net_evap: f32,
    rng: StdRng,
}

impl Default for RainFallClosed {
    fn default() -> Self {
        Self::new(1e5, 0.2, 10, 0.0)
    }
}

impl RainFallClosed {
    pub fn new(net_water: f32, fraction: f32, seed: u64, net_evap: f32) -> Self {
        Self {
            key: WATER.to_string(),
            net_water,
            fraction,
            seed,
            net_evap,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Rain into another layer.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn net_water(&self) -> f32 {
        self.net_water
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn net_evap(&self) -> f32 {
        self.net_evap
    }

    /// Generator seeded from `seed`.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Rule for RainFallClosed {
    fn name(&self) -> &str {
        "rain_fall_closed"
    }

    fn reads(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn writes(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn evolve(&mut self, lattice: &Lattice) -> Result<Canvases, RuleError> {
        let mut water = require_layer(lattice, &self.key)?.clone();
        rain_uniform(&mut water, self.net_water);
        with_layer(lattice, &self.key, water)
    }
}

/// Uniform rainfall on every `burst_step`-th call, starting with the first.
#[derive(Debug, Clone)]
pub struct RainBurst {
    key: String,
    net_water: f32,
    burst_step: u64,
    seed: u64,
    counter: u64,
    rng: StdRng,
}

impl Default for RainBurst {
    fn default() -> Self {
        Self {
            key: WATER.to_string(),
            net_water: 1e5,
            burst_step: 40,
            seed: 10,
            counter: 0,
            rng: StdRng::seed_from_u64(10),
        }
    }
}

impl RainBurst {
    pub fn new(net_water: f32, burst_step: u64, seed: u64) -> Result<Self, RuleError> {
        if burst_step == 0 {
            return Err(RuleError::InvalidBurstStep);
        }
        Ok(Self {
            key: WATER.to_string(),
            net_water,
            burst_step,
            seed,
            counter: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn burst_step(&self) -> u64 {
        self.burst_step
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of `evolve` calls seen so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Generator seeded from `seed`.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Rule for RainBurst {
    fn name(&self) -> &str {
        "rain_burst"
    }

    fn reads(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn writes(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn evolve(&mut self, lattice: &Lattice) -> Result<Canvases, RuleError> {
        let fires = self.counter % self.burst_step == 0;
        self.counter += 1;

        let mut water = require_layer(lattice, &self.key)?.clone();
        if fires {
            trace!("rain burst on call {}", self.counter - 1);
            rain_uniform(&mut water, self.net_water);
        }
        with_layer(lattice, &self.key, water)
    }
}

/// Rain that lands on a random subset of cells each step.
///
/// Every cell is hit independently with probability `fraction`; `net_water`
/// is split evenly among the cells hit. The generator is seeded, so two
/// rules built with the same seed produce the same sequence.
#[derive(Debug, Clone)]
pub struct ScatteredRain {
    key: String,
    net_water: f32,
    fraction: f32,
    rng: StdRng,
}

impl ScatteredRain {
    pub fn new(net_water: f32, fraction: f32, seed: u64) -> Result<Self, RuleError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(RuleError::InvalidFraction(fraction));
        }
        Ok(Self {
            key: WATER.to_string(),
            net_water,
            fraction,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }
}

impl Rule for ScatteredRain {
    fn name(&self) -> &str {
        "scattered_rain"
    }

    fn reads(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn writes(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn evolve(&mut self, lattice: &Lattice) -> Result<Canvases, RuleError> {
        let mut water = require_layer(lattice, &self.key)?.clone();

        let probability = f64::from(self.fraction);
        let hits: Vec<usize> = (0..water.len())
            .filter(|_| self.rng.gen_bool(probability))
            .collect();

        if !hits.is_empty() {
            let per_cell = self.net_water / hits.len() as f32;
            let cells = water.as_mut_slice();
            for i in hits {
                cells[i] += per_cell;
            }
        }

        with_layer(lattice, &self.key, water)
    }
}
