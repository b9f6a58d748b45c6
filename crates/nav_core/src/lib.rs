//! # Nav Core
//!
//! Terrain-aware grid navigation core for a tick-driven strategy
//! simulation. This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (generation is seeded)
//! - No floating-point math on simulation paths (uses fixed-point)
//!
//! Three collaborators make up the core:
//! - [`terrain`] - cell classification and the cost model derived from it
//! - [`path`] - A* grid search with a bounded result cache
//! - [`steering`] - per-tick agent displacement with avoidance and
//!   escape fallbacks
//!
//! Supporting modules: [`config`] for tunables, [`worldgen`] for seeded
//! terrain generation, [`math`] for fixed-point utilities.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod math;
pub mod path;
pub mod steering;
pub mod terrain;
pub mod worldgen;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::NavConfig;
    pub use crate::error::{NavError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::path::{
        grid_to_world, route_cost, route_to_world, world_to_grid, GridPos, PathEngine,
    };
    pub use crate::steering::{
        advance, advance_along_route, goal_collision, AdvanceOutcome, AgentNavState,
    };
    pub use crate::terrain::{TerrainGrid, TerrainKind};
    pub use crate::worldgen::{generate_terrain, GenConfig};
}
