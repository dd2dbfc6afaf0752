//! Cell space - owns the canvases and drives the step loop.
//!
//! A step hands every rule the same pre-step [`Lattice`], merges the layers
//! each rule declares as written (later rules win), and only then swaps in
//! the new canvases and recomputes padding and neighbour views.

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{
    CanvasError, Canvases, Grid, GridError, Rule, RuleError, ShiftMaps, pad, shifted_padded,
};

/// Read-only view of a cell space's current state, as seen by rules.
#[derive(Debug, Clone)]
pub struct Lattice {
    canvases: Canvases,
    padded: BTreeMap<String, Grid>,
    shifted: BTreeMap<String, [Grid; 4]>,
    maps: ShiftMaps,
    step: u64,
}

impl Lattice {
    fn new(canvases: Canvases) -> Result<Self, GridError> {
        let (height, width) = canvases.shape();
        let maps = ShiftMaps::new(height, width)?;
        let padded = pad_all(&canvases);
        let shifted = shift_all(&padded, &maps)?;

        Ok(Self {
            canvases,
            padded,
            shifted,
            maps,
            step: 0,
        })
    }

    /// Install the next canvases and rebuild the derived views.
    fn advance(&mut self, canvases: Canvases) -> Result<(), GridError> {
        let padded = pad_all(&canvases);
        let shifted = shift_all(&padded, &self.maps)?;
        self.canvases = canvases;
        self.padded = padded;
        self.shifted = shifted;
        self.step += 1;
        Ok(())
    }

    /// Per-layer neighbour views computed from the current padded canvases.
    pub fn shift(&self) -> Result<BTreeMap<String, [Grid; 4]>, GridError> {
        shift_all(&self.padded, &self.maps)
    }

    pub fn canvases(&self) -> &Canvases {
        &self.canvases
    }

    pub fn canvas(&self, key: &str) -> Option<&Grid> {
        self.canvases.get(key)
    }

    /// Zero-padded copy of a layer.
    pub fn padded(&self, key: &str) -> Option<&Grid> {
        self.padded.get(key)
    }

    /// The four neighbour views of a layer, in `Direction::ALL` order.
    pub fn shifted(&self, key: &str) -> Option<&[Grid; 4]> {
        self.shifted.get(key)
    }

    pub fn maps(&self) -> &ShiftMaps {
        &self.maps
    }

    pub fn shape(&self) -> (usize, usize) {
        self.canvases.shape()
    }

    /// Steps completed so far.
    pub fn step(&self) -> u64 {
        self.step
    }
}

fn pad_all(canvases: &Canvases) -> BTreeMap<String, Grid> {
    canvases
        .iter()
        .map(|(key, grid)| (key.to_string(), pad(grid)))
        .collect()
}

fn shift_all(
    padded: &BTreeMap<String, Grid>,
    maps: &ShiftMaps,
) -> Result<BTreeMap<String, [Grid; 4]>, GridError> {
    padded
        .iter()
        .map(|(key, grid)| Ok((key.clone(), shifted_padded(grid, maps)?)))
        .collect()
}

/// Per-layer snapshots collected by [`CellSpace::flow`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    steps: Vec<u64>,
    maps: BTreeMap<String, Vec<Grid>>,
}

impl History {
    /// Number of snapshots taken.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step number of each snapshot, in order.
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    /// Snapshots of one layer, in order.
    pub fn layer(&self, key: &str) -> Option<&[Grid]> {
        self.maps.get(key).map(Vec::as_slice)
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &[Grid])> {
        self.maps.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn record(&mut self, step: u64, canvases: &Canvases) {
        self.steps.push(step);
        for (key, grid) in canvases.iter() {
            self.maps.entry(key.to_string()).or_default().push(grid.clone());
        }
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.maps.clear();
    }
}

/// A 2-D cellular automaton over a fixed set of named layers.
#[derive(Debug)]
pub struct CellSpace {
    lattice: Lattice,
    rules: Vec<Box<dyn Rule>>,
    history: History,
}

impl CellSpace {
    /// Build a cell space from a copy of `initial`.
    ///
    /// Every layer a rule reads or writes must exist in `initial`.
    pub fn new(initial: &Canvases, rules: Vec<Box<dyn Rule>>) -> Result<Self, SpaceError> {
        let canvases = initial.clone();

        for rule in &rules {
            for layer in rule.reads().into_iter().chain(rule.writes()) {
                if !canvases.contains(layer) {
                    return Err(SpaceError::UnknownRuleLayer {
                        rule: rule.name().to_string(),
                        layer: layer.to_string(),
                    });
                }
            }
        }

        let lattice = Lattice::new(canvases)?;
        let (height, width) = lattice.shape();
        debug!(
            "cell space {}x{} with layers {:?} and {} rules",
            height,
            width,
            lattice.canvases().keys().collect::<Vec<_>>(),
            rules.len()
        );

        Ok(Self {
            lattice,
            rules,
            history: History::default(),
        })
    }

    /// Build from a plain layer map.
    pub fn from_layers(
        layers: BTreeMap<String, Grid>,
        rules: Vec<Box<dyn Rule>>,
    ) -> Result<Self, SpaceError> {
        let canvases = Canvases::try_from(layers)?;
        Self::new(&canvases, rules)
    }

    /// Recompute the per-layer neighbour views of the current canvases.
    pub fn shift(&self) -> Result<BTreeMap<String, [Grid; 4]>, SpaceError> {
        Ok(self.lattice.shift()?)
    }

    /// Advance one step.
    ///
    /// On error the canvases are left at their pre-step values, although
    /// rules that ran before the failing one have already updated their own
    /// counters.
    pub fn step(&mut self) -> Result<(), SpaceError> {
        let mut next = self.lattice.canvases().clone();

        for rule in &mut self.rules {
            let output = rule
                .evolve(&self.lattice)
                .map_err(|source| SpaceError::Rule {
                    rule: rule.name().to_string(),
                    source,
                })?;

            if output.shape() != next.shape() {
                return Err(SpaceError::OutputShape {
                    rule: rule.name().to_string(),
                    expected: next.shape(),
                    found: output.shape(),
                });
            }
            if let Some(unknown) = output.keys().find(|key| !next.contains(key)) {
                return Err(SpaceError::UnknownOutputLayer {
                    rule: rule.name().to_string(),
                    layer: unknown.to_string(),
                });
            }

            let mut output = output.into_layers();
            for layer in rule.writes() {
                let grid = output
                    .remove(layer)
                    .ok_or_else(|| SpaceError::MissingWrite {
                        rule: rule.name().to_string(),
                        layer: layer.to_string(),
                    })?;
                next.replace(layer, grid)?;
            }
            debug!("rule '{}' applied", rule.name());
        }

        self.lattice.advance(next)?;
        Ok(())
    }

    /// Append the current canvases to the history.
    pub fn update_maps(&mut self) {
        self.history.record(self.lattice.step(), self.lattice.canvases());
    }

    /// Drop all recorded snapshots.
    pub fn reset_maps(&mut self) {
        self.history.clear();
    }

    /// Run exactly `nstep` steps, snapshotting every `savestep` steps.
    ///
    /// The history is reset, then holds the starting state followed by the
    /// state after every step `k` (counted from 1) with `k % savestep == 0`.
    pub fn flow(&mut self, nstep: u64, savestep: u64) -> Result<(), SpaceError> {
        if savestep == 0 {
            return Err(SpaceError::InvalidSavestep);
        }

        info!("flow: {} steps, snapshot every {}", nstep, savestep);
        let start = Instant::now();

        self.reset_maps();
        self.update_maps();
        for k in 1..=nstep {
            self.step()?;
            debug!("step {} out of {}", k, nstep);
            if k % savestep == 0 {
                self.update_maps();
            }
        }

        info!(
            "flow: done in {:.2}s, {} snapshots",
            start.elapsed().as_secs_f32(),
            self.history.len()
        );
        Ok(())
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn canvases(&self) -> &Canvases {
        self.lattice.canvases()
    }

    pub fn canvas(&self, key: &str) -> Option<&Grid> {
        self.lattice.canvas(key)
    }

    pub fn layers(&self) -> impl Iterator<Item = &str> {
        self.lattice.canvases().keys()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.lattice.shape()
    }

    pub fn steps_taken(&self) -> u64 {
        self.lattice.step()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }
}

/// Summary of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    pub total: f64,
    pub min: f32,
    pub max: f32,
    pub mean: f64,
}

impl LayerStats {
    pub fn from_grid(grid: &Grid) -> Self {
        let total = grid.sum();
        Self {
            total,
            min: grid.min(),
            max: grid.max(),
            mean: total / grid.len() as f64,
        }
    }
}

/// Per-layer statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceStats {
    pub step: u64,
    pub layers: BTreeMap<String, LayerStats>,
}

impl SpaceStats {
    pub fn from_space(space: &CellSpace) -> Self {
        Self::from_canvases(space.canvases(), space.steps_taken())
    }

    pub fn from_canvases(canvases: &Canvases, step: u64) -> Self {
        Self {
            step,
            layers: canvases
                .iter()
                .map(|(key, grid)| (key.to_string(), LayerStats::from_grid(grid)))
                .collect(),
        }
    }
}

/// Cell space construction and stepping errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpaceError {
    #[error("savestep must be non-zero")]
    InvalidSavestep,
    #[error("Rule '{rule}' uses layer '{layer}' which is not in the canvas set")]
    UnknownRuleLayer { rule: String, layer: String },
    #[error("Rule '{rule}' returned unknown layer '{layer}'")]
    UnknownOutputLayer { rule: String, layer: String },
    #[error("Rule '{rule}' did not return its layer '{layer}'")]
    MissingWrite { rule: String, layer: String },
    #[error("Rule '{rule}' returned canvases of shape {found:?}, expected {expected:?}")]
    OutputShape {
        rule: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Rule '{rule}' failed: {source}")]
    Rule { rule: String, source: RuleError },
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Grid(#[from] GridError),
}
