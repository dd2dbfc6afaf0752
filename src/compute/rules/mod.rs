//! Pluggable per-step processes.
//!
//! A rule reads the pre-step [`Lattice`] of a cell space and returns a full
//! canvas set. Only the layers listed by [`Rule::writes`] are taken from
//! that set, so a rule may start from a clone of the current canvases and
//! modify just its own layers.

mod evaporation;
mod flow;
mod rain;

pub use evaporation::*;
pub use flow::*;
pub use rain::*;

use super::{CanvasError, Canvases, Grid, GridError, Lattice};

/// One physical process applied once per step.
pub trait Rule: std::fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Layers this rule reads.
    fn reads(&self) -> Vec<&str>;

    /// Layers this rule writes. Must be a subset of the cell space's layers.
    fn writes(&self) -> Vec<&str>;

    /// Compute this rule's effect on the pre-step state.
    fn evolve(&mut self, lattice: &Lattice) -> Result<Canvases, RuleError>;
}

/// Look up a layer the rule depends on.
pub(crate) fn require_layer<'a>(lattice: &'a Lattice, key: &str) -> Result<&'a Grid, RuleError> {
    lattice
        .canvas(key)
        .ok_or_else(|| RuleError::MissingLayer(key.to_string()))
}

/// Clone the current canvases with `key` swapped for `grid`.
pub(crate) fn with_layer(lattice: &Lattice, key: &str, grid: Grid) -> Result<Canvases, RuleError> {
    let mut result = lattice.canvases().clone();
    result.replace(key, grid)?;
    Ok(result)
}

/// Rule construction and evaluation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("flow_factor must be in [0, 1), got {0:.3}")]
    InvalidFlowFactor(f32),
    #[error("burst_step must be non-zero")]
    InvalidBurstStep,
    #[error("fraction must be in (0, 1], got {0:.3}")]
    InvalidFraction(f32),
    #[error("Evaporation rate must be finite and non-negative, got {0}")]
    InvalidRate(f32),
    #[error("Rule needs layer '{0}' which the cell space does not have")]
    MissingLayer(String),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Grid(#[from] GridError),
}
