//! Configuration types for cell space simulations.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{LayerSeed, Pattern};
use crate::compute::{
    CanvasError, Canvases, CellSpace, Evaporation, FlowRule, GridError, RainBurst,
    RainFallClosed, Rule, RuleError, ScatteredRain, SpaceError, TERRAIN, WATER,
};

fn default_terrain() -> String {
    TERRAIN.to_string()
}

fn default_water() -> String {
    WATER.to_string()
}

fn default_flow_factor() -> f32 {
    0.5
}

fn default_net_water() -> f32 {
    1e5
}

fn default_fraction() -> f32 {
    0.2
}

fn default_seed() -> u64 {
    10
}

fn default_burst_step() -> u64 {
    40
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Initial layers.
    pub layers: Vec<LayerSeed>,
    /// Rules, applied in order every step.
    pub rules: Vec<RuleConfig>,
    /// Steps run by `flow`.
    pub steps: u64,
    /// Snapshot interval for `flow`.
    pub savestep: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            layers: vec![
                LayerSeed::new(
                    TERRAIN,
                    Pattern::Hill {
                        center: (0.5, 0.5),
                        radius: 0.3,
                        amplitude: 100.0,
                        base: 0.0,
                    },
                ),
                LayerSeed::new(WATER, Pattern::Constant { value: 0.0 }),
            ],
            rules: vec![
                RuleConfig::Flow {
                    key: default_terrain(),
                    flow_factor: default_flow_factor(),
                },
                RuleConfig::RainBurst {
                    key: default_water(),
                    net_water: default_net_water(),
                    burst_step: default_burst_step(),
                    seed: default_seed(),
                },
            ],
            steps: 100,
            savestep: 5,
        }
    }
}

/// Configuration for a single rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleConfig {
    /// Conservative steepest-descent flow.
    Flow {
        #[serde(default = "default_terrain")]
        key: String,
        #[serde(default = "default_flow_factor")]
        flow_factor: f32,
    },
    /// Uniform rainfall every step.
    RainFallClosed {
        #[serde(default = "default_water")]
        key: String,
        #[serde(default = "default_net_water")]
        net_water: f32,
        #[serde(default = "default_fraction")]
        fraction: f32,
        #[serde(default = "default_seed")]
        seed: u64,
        #[serde(default)]
        net_evap: f32,
    },
    /// Uniform rainfall every `burst_step` steps.
    RainBurst {
        #[serde(default = "default_water")]
        key: String,
        #[serde(default = "default_net_water")]
        net_water: f32,
        #[serde(default = "default_burst_step")]
        burst_step: u64,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    /// Rain on a random subset of cells.
    ScatteredRain {
        #[serde(default = "default_water")]
        key: String,
        #[serde(default = "default_net_water")]
        net_water: f32,
        #[serde(default = "default_fraction")]
        fraction: f32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    /// Uniform evaporation, clamped at zero.
    Evaporation {
        #[serde(default = "default_water")]
        key: String,
        rate: f32,
    },
}

impl RuleConfig {
    /// Layer this rule acts on.
    pub fn key(&self) -> &str {
        match self {
            RuleConfig::Flow { key, .. }
            | RuleConfig::RainFallClosed { key, .. }
            | RuleConfig::RainBurst { key, .. }
            | RuleConfig::ScatteredRain { key, .. }
            | RuleConfig::Evaporation { key, .. } => key,
        }
    }

    /// Construct the live rule.
    pub fn build(&self) -> Result<Box<dyn Rule>, RuleError> {
        let rule: Box<dyn Rule> = match self {
            RuleConfig::Flow { key, flow_factor } => {
                Box::new(FlowRule::new(*flow_factor)?.with_key(key.clone()))
            }
            RuleConfig::RainFallClosed {
                key,
                net_water,
                fraction,
                seed,
                net_evap,
            } => Box::new(
                RainFallClosed::new(*net_water, *fraction, *seed, *net_evap).with_key(key.clone()),
            ),
            RuleConfig::RainBurst {
                key,
                net_water,
                burst_step,
                seed,
            } => Box::new(RainBurst::new(*net_water, *burst_step, *seed)?.with_key(key.clone())),
            RuleConfig::ScatteredRain {
                key,
                net_water,
                fraction,
                seed,
            } => Box::new(ScatteredRain::new(*net_water, *fraction, *seed)?.with_key(key.clone())),
            RuleConfig::Evaporation { key, rate } => {
                Box::new(Evaporation::new(*rate)?.with_key(key.clone()))
            }
        };
        Ok(rule)
    }
}

impl SimulationConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Total cells per layer.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.width * self.height
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        if self.savestep == 0 {
            return Err(ConfigError::InvalidSavestep);
        }

        let mut names = HashSet::new();
        for layer in &self.layers {
            if !names.insert(layer.name.as_str()) {
                return Err(ConfigError::DuplicateLayer(layer.name.clone()));
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if !names.contains(rule.key()) {
                return Err(ConfigError::UnknownLayer {
                    rule: i,
                    layer: rule.key().to_string(),
                });
            }
            rule.build()
                .map_err(|source| ConfigError::InvalidRule { rule: i, source })?;
        }

        Ok(())
    }

    /// Generate the initial canvases from the layer seeds.
    pub fn initial_canvases(&self) -> Result<Canvases, ConfigError> {
        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let grid = layer.pattern.generate(self.height, self.width)?;
            layers.push((layer.name.clone(), grid));
        }
        Ok(Canvases::new(layers)?)
    }

    /// Construct the rules in order.
    pub fn build_rules(&self) -> Result<Vec<Box<dyn Rule>>, ConfigError> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                rule.build()
                    .map_err(|source| ConfigError::InvalidRule { rule: i, source })
            })
            .collect()
    }

    /// Validate, then build a ready-to-run cell space.
    pub fn build_space(&self) -> Result<CellSpace, ConfigError> {
        self.validate()?;
        let canvases = self.initial_canvases()?;
        let rules = self.build_rules()?;
        Ok(CellSpace::new(&canvases, rules)?)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("At least one layer is required")]
    NoLayers,
    #[error("savestep must be non-zero")]
    InvalidSavestep,
    #[error("Layer '{0}' is defined more than once")]
    DuplicateLayer(String),
    #[error("Rule {rule} references unknown layer '{layer}'")]
    UnknownLayer { rule: usize, layer: String },
    #[error("Rule {rule} is invalid: {source}")]
    InvalidRule { rule: usize, source: RuleError },
    #[error("Failed to seed layer: {0}")]
    Seed(#[from] GridError),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Space(#[from] SpaceError),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
