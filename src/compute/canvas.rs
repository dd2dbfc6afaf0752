//! Named layer sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Grid;

/// A set of named grids sharing one shape.
///
/// The key set is fixed when the set is built: [`Canvases::replace`] only
/// swaps existing layers and rejects unknown names or mismatched shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Grid>", into = "BTreeMap<String, Grid>")]
pub struct Canvases {
    shape: (usize, usize),
    layers: BTreeMap<String, Grid>,
}

impl Canvases {
    /// Build a canvas set from `(name, grid)` pairs.
    pub fn new<K, I>(layers: I) -> Result<Self, CanvasError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Grid)>,
    {
        let mut map = BTreeMap::new();
        for (key, grid) in layers {
            let key = key.into();
            if map.contains_key(&key) {
                return Err(CanvasError::DuplicateLayer(key));
            }
            map.insert(key, grid);
        }
        Self::try_from(map)
    }

    /// Common (height, width) of every layer.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.layers.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Grid> {
        self.layers.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Grid> {
        self.layers.get_mut(key)
    }

    /// Layer names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Grid)> {
        self.layers.iter().map(|(k, g)| (k.as_str(), g))
    }

    /// Swap the grid stored under an existing key.
    pub fn replace(&mut self, key: &str, grid: Grid) -> Result<Grid, CanvasError> {
        if grid.shape() != self.shape {
            return Err(CanvasError::ShapeMismatch {
                layer: key.to_string(),
                expected: self.shape,
                found: grid.shape(),
            });
        }
        match self.layers.get_mut(key) {
            Some(slot) => Ok(std::mem::replace(slot, grid)),
            None => Err(CanvasError::UnknownLayer(key.to_string())),
        }
    }

    /// Sum of one layer, or `None` if the key is unknown.
    pub fn total(&self, key: &str) -> Option<f64> {
        self.layers.get(key).map(Grid::sum)
    }

    pub fn into_layers(self) -> BTreeMap<String, Grid> {
        self.layers
    }
}

impl TryFrom<BTreeMap<String, Grid>> for Canvases {
    type Error = CanvasError;

    fn try_from(layers: BTreeMap<String, Grid>) -> Result<Self, Self::Error> {
        let shape = match layers.values().next() {
            Some(grid) => grid.shape(),
            None => return Err(CanvasError::Empty),
        };

        for (key, grid) in &layers {
            if grid.shape() != shape {
                return Err(CanvasError::ShapeMismatch {
                    layer: key.clone(),
                    expected: shape,
                    found: grid.shape(),
                });
            }
        }

        Ok(Self { shape, layers })
    }
}

impl From<Canvases> for BTreeMap<String, Grid> {
    fn from(canvases: Canvases) -> Self {
        canvases.layers
    }
}

/// Canvas set validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    #[error("Canvas set must contain at least one layer")]
    Empty,
    #[error("Layer '{0}' is defined more than once")]
    DuplicateLayer(String),
    #[error("Layer '{0}' is not part of this canvas set")]
    UnknownLayer(String),
    #[error("Layer '{layer}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        layer: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
}
