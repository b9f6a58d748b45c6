//! Terrain classification and the cost model derived from it.
//!
//! A [`TerrainGrid`] is the single source of truth for what a grid cell
//! *is* and what that implies for movement, construction, and ranged
//! accuracy. It is generated once at world creation and treated as
//! read-only by the search and steering layers; the orchestrator owns
//! any steady-state mutation and must clear the path cache afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Classification of one grid cell.
///
/// All movement, placement, and accuracy attributes are pure functions
/// of the kind; nothing is stored per cell beyond the tag itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Plain ground. Full speed, buildable.
    #[default]
    Open,
    /// Impassable rock. Blocks search and movement entirely.
    Mountain,
    /// Fordable water. Half speed, not buildable.
    River,
    /// Tree cover. Slightly slowed, reduces incoming ranged accuracy.
    Forest,
    /// River crossing. Restores full speed and normal accuracy.
    Bridge,
}

/// Movement speed multiplier under [`TerrainKind::River`].
pub const RIVER_MOVE_MULTIPLIER: f32 = 0.5;
/// Movement speed multiplier under [`TerrainKind::Forest`].
pub const FOREST_MOVE_MULTIPLIER: f32 = 0.8;
/// Ranged accuracy multiplier for shots landing in [`TerrainKind::Forest`].
pub const FOREST_ACCURACY_MULTIPLIER: f32 = 0.7;
/// A* step cost of entering a [`TerrainKind::River`] cell.
pub const RIVER_STEP_COST: f32 = 2.0;
/// A* step cost of entering a [`TerrainKind::Forest`] cell.
pub const FOREST_STEP_COST: f32 = 1.5;

impl TerrainKind {
    /// Movement speed multiplier in [0, 1]. Zero means impassable.
    #[must_use]
    pub fn move_multiplier(self) -> Fixed {
        match self {
            Self::Open | Self::Bridge => Fixed::from_num(1),
            Self::Mountain => Fixed::ZERO,
            Self::River => Fixed::from_num(RIVER_MOVE_MULTIPLIER),
            Self::Forest => Fixed::from_num(FOREST_MOVE_MULTIPLIER),
        }
    }

    /// Whether a structure may be placed on this kind of cell.
    #[must_use]
    pub const fn allows_construction(self) -> bool {
        !matches!(self, Self::Mountain | Self::River)
    }

    /// Accuracy multiplier in (0, 1] for ranged attacks landing here.
    #[must_use]
    pub fn accuracy_multiplier(self) -> Fixed {
        match self {
            Self::Forest => Fixed::from_num(FOREST_ACCURACY_MULTIPLIER),
            _ => Fixed::from_num(1),
        }
    }

    /// Whether grid search must exclude this kind of cell entirely.
    #[must_use]
    pub const fn blocks_search(self) -> bool {
        matches!(self, Self::Mountain)
    }

    /// A* cost of a step *into* a cell of this kind.
    /// Returns `None` for kinds excluded from the search graph.
    #[must_use]
    pub fn step_cost(self) -> Option<Fixed> {
        match self {
            Self::Open | Self::Bridge => Some(Fixed::from_num(1)),
            Self::Mountain => None,
            Self::River => Some(Fixed::from_num(RIVER_STEP_COST)),
            Self::Forest => Some(Fixed::from_num(FOREST_STEP_COST)),
        }
    }
}

/// Dense rectangular terrain classification grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Cell data stored in row-major order.
    cells: Vec<TerrainKind>,
    /// Size of each cell in world units.
    #[serde(with = "fixed_serde")]
    cell_size: Fixed,
}

impl TerrainGrid {
    /// Create a new grid with every cell Open.
    pub fn new(width: u32, height: u32, cell_size: Fixed) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(NavError::InvalidGridDimensions { width, height });
        }
        if cell_size <= Fixed::ZERO {
            return Err(NavError::InvalidConfig(format!(
                "cell_size must be positive, got {cell_size}"
            )));
        }

        let cell_count = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            cells: vec![TerrainKind::Open; cell_count],
            cell_size,
        })
    }

    /// Create a grid covering a continuous world, `floor(world / cell_size)`
    /// cells per axis.
    pub fn from_world_size(world_width: Fixed, world_height: Fixed, cell_size: Fixed) -> Result<Self> {
        if cell_size <= Fixed::ZERO {
            return Err(NavError::InvalidConfig(format!(
                "cell_size must be positive, got {cell_size}"
            )));
        }
        let width = (world_width / cell_size).floor().to_num::<i64>().max(0) as u32;
        let height = (world_height / cell_size).floor().to_num::<i64>().max(0) as u32;
        Self::new(width, height, cell_size)
    }

    /// Bulk write: construct a grid from pre-classified cells in row-major
    /// order. Used by world generation and serialization, never at steady
    /// state.
    pub fn from_cells(width: u32, height: u32, cell_size: Fixed, cells: Vec<TerrainKind>) -> Result<Self> {
        let grid = Self::new(width, height, cell_size)?;
        let expected = grid.cells.len();
        if cells.len() != expected {
            return Err(NavError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { cells, ..grid })
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cell size in world units.
    #[must_use]
    pub const fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as u32) < self.width && (row as u32) < self.height
    }

    #[inline]
    fn index(&self, col: i32, row: i32) -> usize {
        (row as usize) * (self.width as usize) + (col as usize)
    }

    /// Classify a cell. Out-of-range coordinates classify as Open so that
    /// agents straying past the map edge still steer sanely (fail-soft,
    /// never an error).
    #[must_use]
    pub fn kind_at(&self, col: i32, row: i32) -> TerrainKind {
        if self.in_bounds(col, row) {
            self.cells[self.index(col, row)]
        } else {
            TerrainKind::Open
        }
    }

    /// Movement speed multiplier for the cell. Zero means impassable.
    #[must_use]
    pub fn movement_multiplier(&self, col: i32, row: i32) -> Fixed {
        self.kind_at(col, row).move_multiplier()
    }

    /// Whether a structure may be placed on the cell.
    #[must_use]
    pub fn can_place_structure(&self, col: i32, row: i32) -> bool {
        self.kind_at(col, row).allows_construction()
    }

    /// Ranged accuracy multiplier for attacks landing on the cell.
    #[must_use]
    pub fn accuracy_multiplier(&self, col: i32, row: i32) -> Fixed {
        self.kind_at(col, row).accuracy_multiplier()
    }

    /// Whether search must exclude the cell.
    #[must_use]
    pub fn is_blocking(&self, col: i32, row: i32) -> bool {
        self.kind_at(col, row).blocks_search()
    }

    /// Reclassify a cell. Returns `false` if out of bounds.
    ///
    /// Callers mutating terrain after world generation must also call
    /// [`crate::path::PathEngine::clear_cache`].
    pub fn set_kind(&mut self, col: i32, row: i32, kind: TerrainKind) -> bool {
        if self.in_bounds(col, row) {
            let index = self.index(col, row);
            self.cells[index] = kind;
            true
        } else {
            false
        }
    }

    /// Convert a continuous world position to grid coordinates by floor
    /// division. Positions outside the world map to out-of-range
    /// coordinates, which every query treats as Open.
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec2Fixed) -> (i32, i32) {
        let col = (pos.x / self.cell_size).floor().to_num::<i32>();
        let row = (pos.y / self.cell_size).floor().to_num::<i32>();
        (col, row)
    }

    /// Convert grid coordinates to the world position at the cell center.
    #[must_use]
    pub fn grid_to_world(&self, col: i32, row: i32) -> Vec2Fixed {
        let half = self.cell_size / Fixed::from_num(2);
        Vec2Fixed::new(
            Fixed::from_num(col) * self.cell_size + half,
            Fixed::from_num(row) * self.cell_size + half,
        )
    }

    /// Classify the cell under a continuous world position.
    #[must_use]
    pub fn kind_at_world(&self, pos: Vec2Fixed) -> TerrainKind {
        let (col, row) = self.world_to_grid(pos);
        self.kind_at(col, row)
    }

    /// Geometric center of the world in continuous coordinates.
    #[must_use]
    pub fn world_center(&self) -> Vec2Fixed {
        let two = Fixed::from_num(2);
        Vec2Fixed::new(
            Fixed::from_num(self.width) * self.cell_size / two,
            Fixed::from_num(self.height) * self.cell_size / two,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_kind_attribute_table() {
        use TerrainKind::*;

        assert_eq!(Open.move_multiplier(), fixed(1));
        assert_eq!(River.move_multiplier(), Fixed::from_num(0.5));
        assert_eq!(Forest.move_multiplier(), Fixed::from_num(0.8));
        assert_eq!(Bridge.move_multiplier(), fixed(1));
        assert_eq!(Mountain.move_multiplier(), Fixed::ZERO);

        assert!(Open.allows_construction());
        assert!(Forest.allows_construction());
        assert!(Bridge.allows_construction());
        assert!(!River.allows_construction());
        assert!(!Mountain.allows_construction());

        assert_eq!(Forest.accuracy_multiplier(), Fixed::from_num(0.7));
        assert_eq!(Open.accuracy_multiplier(), fixed(1));
        assert_eq!(Bridge.accuracy_multiplier(), fixed(1));

        assert!(Mountain.blocks_search());
        assert!(!River.blocks_search());

        assert_eq!(Open.step_cost(), Some(fixed(1)));
        assert_eq!(Bridge.step_cost(), Some(fixed(1)));
        assert_eq!(River.step_cost(), Some(fixed(2)));
        assert_eq!(Forest.step_cost(), Some(Fixed::from_num(1.5)));
        assert_eq!(Mountain.step_cost(), None);
    }

    #[test]
    fn test_grid_creation() {
        let grid = TerrainGrid::new(10, 8, fixed(30)).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 8);
        assert_eq!(grid.cell_size(), fixed(30));
        assert_eq!(grid.kind_at(3, 3), TerrainKind::Open);
    }

    #[test]
    fn test_grid_rejects_zero_dimensions() {
        assert!(matches!(
            TerrainGrid::new(0, 8, fixed(30)),
            Err(NavError::InvalidGridDimensions { .. })
        ));
    }

    #[test]
    fn test_from_world_size_floors() {
        let grid = TerrainGrid::from_world_size(fixed(310), fixed(299), fixed(30)).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 9);
    }

    #[test]
    fn test_from_cells_mismatch() {
        let cells = vec![TerrainKind::Open; 5];
        assert!(matches!(
            TerrainGrid::from_cells(3, 3, fixed(30), cells),
            Err(NavError::CellCountMismatch {
                expected: 9,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_out_of_range_is_open() {
        let mut grid = TerrainGrid::new(4, 4, fixed(30)).unwrap();
        grid.set_kind(0, 0, TerrainKind::Mountain);

        assert_eq!(grid.kind_at(-1, 0), TerrainKind::Open);
        assert_eq!(grid.kind_at(0, -3), TerrainKind::Open);
        assert_eq!(grid.kind_at(4, 0), TerrainKind::Open);
        assert_eq!(grid.kind_at(0, 100), TerrainKind::Open);
        assert_eq!(grid.movement_multiplier(99, 99), fixed(1));
        assert!(!grid.is_blocking(-5, -5));
    }

    #[test]
    fn test_set_kind_and_queries() {
        let mut grid = TerrainGrid::new(5, 5, fixed(30)).unwrap();

        assert!(grid.set_kind(2, 2, TerrainKind::River));
        assert_eq!(grid.movement_multiplier(2, 2), Fixed::from_num(0.5));
        assert!(!grid.can_place_structure(2, 2));
        assert!(!grid.is_blocking(2, 2));

        assert!(grid.set_kind(2, 2, TerrainKind::Mountain));
        assert!(grid.is_blocking(2, 2));
        assert_eq!(grid.movement_multiplier(2, 2), Fixed::ZERO);

        assert!(!grid.set_kind(5, 0, TerrainKind::Forest));
    }

    #[test]
    fn test_world_grid_conversion() {
        let grid = TerrainGrid::new(10, 10, fixed(30)).unwrap();

        let (col, row) = grid.world_to_grid(Vec2Fixed::new(fixed(45), fixed(29)));
        assert_eq!((col, row), (1, 0));

        // Negative world positions floor toward negative infinity
        let (col, row) = grid.world_to_grid(Vec2Fixed::new(fixed(-1), fixed(-31)));
        assert_eq!((col, row), (-1, -2));

        // Cell centers
        let center = grid.grid_to_world(1, 0);
        assert_eq!(center, Vec2Fixed::new(fixed(45), fixed(15)));

        // Round trip through the center lands in the same cell
        assert_eq!(grid.world_to_grid(grid.grid_to_world(7, 3)), (7, 3));
    }

    #[test]
    fn test_world_center() {
        let grid = TerrainGrid::new(10, 10, fixed(30)).unwrap();
        assert_eq!(grid.world_center(), Vec2Fixed::new(fixed(150), fixed(150)));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut grid = TerrainGrid::new(4, 4, fixed(30)).unwrap();
        grid.set_kind(1, 2, TerrainKind::Forest);
        grid.set_kind(3, 0, TerrainKind::Mountain);

        let encoded = serde_json::to_string(&grid).unwrap();
        let decoded: TerrainGrid = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.cell_size(), fixed(30));
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(decoded.kind_at(col, row), grid.kind_at(col, row));
            }
        }
    }
}
