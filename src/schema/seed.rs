//! Seed patterns for the initial layers.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compute::{Grid, GridError};

/// Initial contents of one named layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSeed {
    /// Layer name, e.g. `terrain` or `water`.
    pub name: String,
    /// Pattern used to fill the layer.
    pub pattern: Pattern,
}

impl LayerSeed {
    pub fn new(name: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            name: name.into(),
            pattern,
        }
    }
}

/// Axis along which a [`Pattern::Ramp`] varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Rows,
    Columns,
}

/// Predefined patterns for initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// Same value everywhere.
    Constant { value: f32 },
    /// Linear slope from `from` at the first row/column to `to` at the last.
    Ramp { from: f32, to: f32, axis: Axis },
    /// Gaussian hill on a flat base.
    Hill {
        /// Center position as fraction of grid size (row, column), 0.0-1.0.
        center: (f32, f32),
        /// Radius as fraction of the smaller grid dimension.
        radius: f32,
        /// Peak height above `base`.
        amplitude: f32,
        /// Height far from the hill.
        #[serde(default)]
        base: f32,
    },
    /// Uniform random noise in [0, amplitude].
    Noise { amplitude: f32, seed: u64 },
    /// Explicit (row, column, value) entries on a zero background.
    Custom { values: Vec<(usize, usize, f32)> },
}

impl Pattern {
    /// Generate a `height` x `width` grid.
    pub fn generate(&self, height: usize, width: usize) -> Result<Grid, GridError> {
        let mut grid = Grid::zeros(height, width)?;

        match self {
            Pattern::Constant { value } => grid.add_scalar(*value),
            Pattern::Ramp { from, to, axis } => {
                let span = match axis {
                    Axis::Rows => height,
                    Axis::Columns => width,
                };
                let step = if span > 1 {
                    (to - from) / (span - 1) as f32
                } else {
                    0.0
                };
                for row in 0..height {
                    for col in 0..width {
                        let t = match axis {
                            Axis::Rows => row,
                            Axis::Columns => col,
                        };
                        grid.set(row, col, from + step * t as f32)?;
                    }
                }
            }
            Pattern::Hill {
                center,
                radius,
                amplitude,
                base,
            } => {
                let cy = center.0 * height as f32;
                let cx = center.1 * width as f32;
                let r = radius * height.min(width) as f32;
                let sigma_sq = (r / 2.0).powi(2).max(f32::EPSILON);
                for row in 0..height {
                    for col in 0..width {
                        let dy = row as f32 - cy;
                        let dx = col as f32 - cx;
                        let value = amplitude * (-(dx * dx + dy * dy) / (2.0 * sigma_sq)).exp();
                        grid.set(row, col, base + value)?;
                    }
                }
            }
            Pattern::Noise { amplitude, seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                for v in grid.as_mut_slice() {
                    *v = amplitude * rng.r#gen::<f32>();
                }
            }
            Pattern::Custom { values } => {
                for &(row, col, value) in values {
                    grid.set(row, col, value)?;
                }
            }
        }

        Ok(grid)
    }
}
