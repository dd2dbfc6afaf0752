//! popdyn - grid cellular automata for terrain flow and rainfall.
//!
//! Each layer of a [`CellSpace`] is a 2-D grid. Every step, a list of
//! [`Rule`]s reads the current layers and their neighbour views and returns
//! updated layers. The neighbour views come from index maps computed once
//! per cell space over a zero-padded copy of each layer, which gives a
//! closed boundary: nothing flows out of the domain and nothing flows in.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `compute`: grids, shift/unshift maps, the cell space and the rules
//! - `schema`: JSON configuration and seed patterns
//!
//! # Example
//!
//! ```rust
//! use popdyn::compute::{Canvases, CellSpace, FlowRule, Grid, Rule, TERRAIN};
//!
//! let terrain = Grid::from_rows(vec![
//!     vec![0.0, 1.0, 0.0],
//!     vec![3.0, 10.0, 4.0],
//!     vec![0.0, 2.0, 0.0],
//! ])?;
//! let canvases = Canvases::new([(TERRAIN, terrain)])?;
//! let rules: Vec<Box<dyn Rule>> = vec![Box::new(FlowRule::new(0.5)?)];
//!
//! let mut space = CellSpace::new(&canvases, rules)?;
//! space.flow(20, 5)?;
//!
//! println!("Terrain total after 20 steps: {}", space.canvases().total(TERRAIN).unwrap());
//! assert_eq!(space.history().len(), 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{CellSpace, Grid, Rule, SpaceStats};
pub use schema::{Pattern, SimulationConfig};
