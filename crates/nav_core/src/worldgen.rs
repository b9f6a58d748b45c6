//! Procedural terrain generation.
//!
//! Fills a [`TerrainGrid`] with mountain blocks, a widened river walk,
//! soft-edged forests, and occasional bridges. A protected disk around
//! the world's defended center stays clear of mountains and water so
//! the objective is always reachable and buildable.
//!
//! Generation runs once at world creation; the navigation layers treat
//! the result as immutable.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::{fixed_serde, Fixed};
use crate::terrain::{TerrainGrid, TerrainKind};

/// Configuration for terrain generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Cell size in world units.
    #[serde(with = "fixed_serde")]
    pub cell_size: Fixed,
    /// Number of mountain blocks to place.
    pub mountain_regions: u32,
    /// Edge length of each square mountain block, in cells.
    pub mountain_size: u32,
    /// Cells added on each side of the river walk.
    pub river_half_width: u32,
    /// Number of forest disks to plant.
    pub forest_count: u32,
    /// Forest disk radius in cells.
    pub forest_radius: u32,
    /// Probability that a river cell becomes a bridge.
    pub bridge_chance: f32,
    /// Radius in cells of the protected disk around the defended center.
    pub protected_radius: u32,
    /// Random seed for deterministic generation.
    pub seed: u64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            cell_size: Fixed::from_num(30),
            mountain_regions: 6,
            mountain_size: 3,
            river_half_width: 1,
            forest_count: 5,
            forest_radius: 4,
            bridge_chance: 0.12,
            protected_radius: 6,
            seed: 12345,
        }
    }
}

impl GenConfig {
    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the bridge reclassification probability.
    #[must_use]
    pub fn with_bridge_chance(mut self, chance: f32) -> Self {
        self.bridge_chance = chance.clamp(0.0, 1.0);
        self
    }
}

/// Simple deterministic RNG for terrain generation.
struct WorldRng {
    state: u64,
}

impl WorldRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    fn next_f32(&mut self) -> f32 {
        (self.next() % 10000) as f32 / 10000.0
    }

    /// Uniform value in `[min, max)`.
    fn next_range(&mut self, min: i32, max: i32) -> i32 {
        let range = (max - min) as u64;
        if range == 0 {
            return min;
        }
        min + (self.next() % range) as i32
    }
}

/// Generate a terrain grid from the given configuration.
pub fn generate_terrain(config: &GenConfig) -> Result<TerrainGrid> {
    let mut grid = TerrainGrid::new(config.width, config.height, config.cell_size)?;
    let mut rng = WorldRng::new(config.seed);

    place_mountains(&mut grid, config, &mut rng);
    carve_river(&mut grid, config, &mut rng);
    plant_forests(&mut grid, config, &mut rng);
    place_bridges(&mut grid, config, &mut rng);

    Ok(grid)
}

/// Center cell of the defended objective.
fn center_cell(config: &GenConfig) -> (i32, i32) {
    ((config.width / 2) as i32, (config.height / 2) as i32)
}

/// Whether a cell falls inside the protected disk.
fn is_protected(config: &GenConfig, col: i32, row: i32) -> bool {
    let (ccol, crow) = center_cell(config);
    let dcol = col - ccol;
    let drow = row - crow;
    let radius = config.protected_radius as i32;
    dcol * dcol + drow * drow <= radius * radius
}

/// Place square mountain blocks, rejecting any that would intrude on
/// the protected disk.
fn place_mountains(grid: &mut TerrainGrid, config: &GenConfig, rng: &mut WorldRng) {
    let size = config.mountain_size as i32;
    let max_col = config.width as i32 - size;
    let max_row = config.height as i32 - size;
    if max_col <= 0 || max_row <= 0 {
        return;
    }

    for _ in 0..config.mountain_regions {
        for _attempt in 0..20 {
            let col = rng.next_range(0, max_col);
            let row = rng.next_range(0, max_row);

            let intrudes = (0..size).any(|drow| {
                (0..size).any(|dcol| is_protected(config, col + dcol, row + drow))
            });
            if intrudes {
                continue;
            }

            for drow in 0..size {
                for dcol in 0..size {
                    grid.set_kind(col + dcol, row + drow, TerrainKind::Mountain);
                }
            }
            break;
        }
    }
}

/// Carve a widened random walk between two opposite edges. River cells
/// never overwrite mountains and skip the protected disk.
fn carve_river(grid: &mut TerrainGrid, config: &GenConfig, rng: &mut WorldRng) {
    let width = config.width as i32;
    let height = config.height as i32;
    let half = config.river_half_width as i32;
    let vertical = rng.next() % 2 == 0;

    let span = if vertical { height } else { width };
    let lane_max = if vertical { width } else { height };
    if lane_max < 2 * half + 4 {
        return;
    }
    let mut lane = rng.next_range(half + 1, lane_max - half - 1);

    for along in 0..span {
        for offset in -half..=half {
            let (col, row) = if vertical {
                (lane + offset, along)
            } else {
                (along, lane + offset)
            };
            if is_protected(config, col, row) {
                continue;
            }
            if grid.kind_at(col, row) == TerrainKind::Mountain {
                continue;
            }
            grid.set_kind(col, row, TerrainKind::River);
        }
        lane = (lane + rng.next_range(-1, 2)).clamp(half + 1, lane_max - half - 2);
    }
}

/// Plant soft-edged forest disks: inclusion probability falls off with
/// distance from the disk center, and only Open cells outside the
/// protected disk are converted.
fn plant_forests(grid: &mut TerrainGrid, config: &GenConfig, rng: &mut WorldRng) {
    let radius = config.forest_radius as i32;
    if radius == 0 {
        return;
    }

    for _ in 0..config.forest_count {
        let ccol = rng.next_range(0, config.width as i32);
        let crow = rng.next_range(0, config.height as i32);

        for drow in -radius..=radius {
            for dcol in -radius..=radius {
                let col = ccol + dcol;
                let row = crow + drow;
                let dist_sq = dcol * dcol + drow * drow;
                if dist_sq > radius * radius {
                    continue;
                }
                if is_protected(config, col, row) {
                    continue;
                }
                if grid.kind_at(col, row) != TerrainKind::Open || !grid.in_bounds(col, row) {
                    continue;
                }

                let dist = (dist_sq as f32).sqrt();
                let inclusion = (1.0 - dist / radius as f32) * 0.9;
                if rng.next_f32() < inclusion {
                    grid.set_kind(col, row, TerrainKind::Forest);
                }
            }
        }
    }
}

/// Reclassify a random fraction of river cells as bridges, restoring
/// full passability while staying visually distinct.
fn place_bridges(grid: &mut TerrainGrid, config: &GenConfig, rng: &mut WorldRng) {
    for row in 0..config.height as i32 {
        for col in 0..config.width as i32 {
            if grid.kind_at(col, row) == TerrainKind::River
                && rng.next_f32() < config.bridge_chance
            {
                grid.set_kind(col, row, TerrainKind::Bridge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_kind(grid: &TerrainGrid, kind: TerrainKind) -> usize {
        let mut count = 0;
        for row in 0..grid.height() as i32 {
            for col in 0..grid.width() as i32 {
                if grid.kind_at(col, row) == kind {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_determinism() {
        let config = GenConfig::default().with_seed(42);
        let a = generate_terrain(&config).unwrap();
        let b = generate_terrain(&config).unwrap();

        for row in 0..a.height() as i32 {
            for col in 0..a.width() as i32 {
                assert_eq!(a.kind_at(col, row), b.kind_at(col, row));
            }
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_terrain(&GenConfig::default().with_seed(1)).unwrap();
        let b = generate_terrain(&GenConfig::default().with_seed(2)).unwrap();

        let identical = (0..a.height() as i32).all(|row| {
            (0..a.width() as i32).all(|col| a.kind_at(col, row) == b.kind_at(col, row))
        });
        assert!(!identical, "different seeds produced identical terrain");
    }

    #[test]
    fn test_protected_disk_stays_clear() {
        let config = GenConfig::default().with_seed(7);
        let grid = generate_terrain(&config).unwrap();

        for row in 0..grid.height() as i32 {
            for col in 0..grid.width() as i32 {
                if is_protected(&config, col, row) {
                    let kind = grid.kind_at(col, row);
                    assert!(
                        kind != TerrainKind::Mountain && kind != TerrainKind::River,
                        "protected cell ({col}, {row}) is {kind:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_features_are_placed() {
        let grid = generate_terrain(&GenConfig::default().with_seed(42)).unwrap();

        assert!(count_kind(&grid, TerrainKind::Mountain) > 0);
        // The river crosses the map: well over half its rows survive
        // mountain overlap and the protected gap
        let water = count_kind(&grid, TerrainKind::River) + count_kind(&grid, TerrainKind::Bridge);
        assert!(water >= 20, "river too short: {water} cells");
    }

    #[test]
    fn test_bridge_chance_extremes() {
        let all = generate_terrain(&GenConfig::default().with_seed(9).with_bridge_chance(1.5))
            .unwrap();
        assert_eq!(count_kind(&all, TerrainKind::River), 0);
        assert!(count_kind(&all, TerrainKind::Bridge) > 0);

        let none = generate_terrain(&GenConfig::default().with_seed(9).with_bridge_chance(0.0))
            .unwrap();
        assert_eq!(count_kind(&none, TerrainKind::Bridge), 0);
    }

    #[test]
    fn test_forests_only_outside_protected_disk() {
        let config = GenConfig {
            mountain_regions: 0,
            river_half_width: 0,
            forest_count: 30,
            ..GenConfig::default()
        };
        let grid = generate_terrain(&config).unwrap();

        assert!(count_kind(&grid, TerrainKind::Forest) > 0);
        for row in 0..grid.height() as i32 {
            for col in 0..grid.width() as i32 {
                if is_protected(&config, col, row) {
                    assert_ne!(grid.kind_at(col, row), TerrainKind::Forest);
                }
            }
        }
    }
}
