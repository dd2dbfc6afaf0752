//! Schema module - configuration and seeding types for cell space simulations.

mod config;
mod seed;

pub use config::*;
pub use seed::*;
