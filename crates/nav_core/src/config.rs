//! Tunable constants for the navigation core.

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::math::{fixed_serde, Fixed};

/// Tunable parameters shared by the terrain grid, path engine, and steering.
///
/// Defaults match the shipped game balance; every value can be overridden
/// through the `with_*` builders before world creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavConfig {
    /// Edge length of one grid cell in world units.
    #[serde(with = "fixed_serde")]
    pub cell_size: Fixed,
    /// Distance to the goal below which an agent counts as arrived.
    #[serde(with = "fixed_serde")]
    pub arrival_radius: Fixed,
    /// Distance ahead of the agent sampled before the normal advance.
    #[serde(with = "fixed_serde")]
    pub look_ahead: Fixed,
    /// Distance at which avoidance and escape probes sample terrain.
    #[serde(with = "fixed_serde")]
    pub probe_distance: Fixed,
    /// Forward component blended into a sidestep direction.
    #[serde(with = "fixed_serde")]
    pub avoid_forward_blend: Fixed,
    /// Speed factor while sidestepping along a perpendicular.
    #[serde(with = "fixed_serde")]
    pub avoid_speed_factor: Fixed,
    /// Speed factor while retreating along a backward diagonal.
    #[serde(with = "fixed_serde")]
    pub avoid_diagonal_factor: Fixed,
    /// Speed factor for the last-resort straight reverse.
    #[serde(with = "fixed_serde")]
    pub reverse_speed_factor: Fixed,
    /// Speed factor while escaping an impassable cell.
    #[serde(with = "fixed_serde")]
    pub escape_speed_factor: Fixed,
    /// Maximum number of routes retained by the path cache.
    pub cache_capacity: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cell_size: Fixed::from_num(30),
            arrival_radius: Fixed::from_num(10),
            look_ahead: Fixed::from_num(20),
            probe_distance: Fixed::from_num(30),
            avoid_forward_blend: Fixed::from_num(0.3),
            avoid_speed_factor: Fixed::from_num(0.6),
            avoid_diagonal_factor: Fixed::from_num(0.4),
            reverse_speed_factor: Fixed::from_num(0.2),
            escape_speed_factor: Fixed::from_num(0.5),
            cache_capacity: 100,
        }
    }
}

impl NavConfig {
    /// Set the cell size.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: Fixed) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the arrival radius.
    #[must_use]
    pub fn with_arrival_radius(mut self, radius: Fixed) -> Self {
        self.arrival_radius = radius;
        self
    }

    /// Set the look-ahead distance.
    #[must_use]
    pub fn with_look_ahead(mut self, distance: Fixed) -> Self {
        self.look_ahead = distance;
        self
    }

    /// Set the avoidance/escape probe distance.
    #[must_use]
    pub fn with_probe_distance(mut self, distance: Fixed) -> Self {
        self.probe_distance = distance;
        self
    }

    /// Set the path cache capacity.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Validate all tunables.
    ///
    /// Distances must be positive, speed factors must lie in (0, 1],
    /// and the cache must hold at least one entry.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("cell_size", self.cell_size),
            ("arrival_radius", self.arrival_radius),
            ("look_ahead", self.look_ahead),
            ("probe_distance", self.probe_distance),
        ];
        for (name, value) in positive {
            if value <= Fixed::ZERO {
                return Err(NavError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let factors = [
            ("avoid_speed_factor", self.avoid_speed_factor),
            ("avoid_diagonal_factor", self.avoid_diagonal_factor),
            ("reverse_speed_factor", self.reverse_speed_factor),
            ("escape_speed_factor", self.escape_speed_factor),
        ];
        for (name, value) in factors {
            if value <= Fixed::ZERO || value > Fixed::from_num(1) {
                return Err(NavError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }

        if self.avoid_forward_blend < Fixed::ZERO || self.avoid_forward_blend > Fixed::from_num(1) {
            return Err(NavError::InvalidConfig(format!(
                "avoid_forward_blend must be in [0, 1], got {}",
                self.avoid_forward_blend
            )));
        }

        if self.cache_capacity == 0 {
            return Err(NavError::InvalidConfig(
                "cache_capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
