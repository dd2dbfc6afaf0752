//! Compute module - grids, cell space and rules.

mod canvas;
mod grid;
mod rules;
mod space;

pub use canvas::*;
pub use grid::*;
pub use rules::*;
pub use space::*;
