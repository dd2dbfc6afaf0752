//! Uniform evaporation sink.

use super::{Rule, RuleError, WATER, require_layer, with_layer};
use crate::compute::{Canvases, Lattice};

/// Removes `rate` from every cell of the water layer, never going below zero.
#[derive(Debug, Clone)]
pub struct Evaporation {
    key: String,
    rate: f32,
}

impl Evaporation {
    pub fn new(rate: f32) -> Result<Self, RuleError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(RuleError::InvalidRate(rate));
        }
        Ok(Self {
            key: WATER.to_string(),
            rate,
        })
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Rule for Evaporation {
    fn name(&self) -> &str {
        "evaporation"
    }

    fn reads(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn writes(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn evolve(&mut self, lattice: &Lattice) -> Result<Canvases, RuleError> {
        let mut water = require_layer(lattice, &self.key)?.clone();
        for v in water.as_mut_slice() {
            *v = (*v - self.rate).max(0.0);
        }
        with_layer(lattice, &self.key, water)
    }
}
