//! Grid search over the terrain cost field, with memoized results.
//!
//! The engine is an independently usable service: given two grid
//! coordinates it returns a waypoint list, or an empty route when none
//! exists. It never observes or mutates agent state, and absence of a
//! route is a normal return value, not an error.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use crate::config::NavConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::terrain::TerrainGrid;

/// Integer grid coordinate, `(col, row)`.
pub type GridPos = (i32, i32);

/// Direction offsets for 8-directional movement.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct SearchNode {
    pos: GridPos,
    /// f_score = g_score + heuristic.
    f_score: Fixed,
    /// Tie-breaker: among equal f_scores, lower coordinates pop first,
    /// keeping repeated searches bit-stable.
    tie_breaker: u64,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so the comparison is reversed for
        // min-heap behavior: lower f_score = higher priority.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
fn tie_breaker(pos: GridPos) -> u64 {
    ((pos.1 as u32 as u64) << 32) | (pos.0 as u32 as u64)
}

/// Octile distance heuristic for 8-directional movement:
/// `max(|dx|, |dy|) + (√2 − 1) · min(|dx|, |dy|)`.
#[inline]
fn octile_heuristic(a: GridPos, b: GridPos) -> Fixed {
    let dx = (a.0 - b.0).unsigned_abs();
    let dy = (a.1 - b.1).unsigned_abs();
    let diagonal = Fixed::from_num(std::f64::consts::SQRT_2 - 1.0);
    Fixed::from_num(dx.max(dy)) + diagonal * Fixed::from_num(dx.min(dy))
}

/// Shortest-cost route finder with a bounded FIFO result cache.
///
/// The cache assumes terrain is immutable for the lifetime of its
/// entries; an orchestrator that mutates terrain at runtime must call
/// [`PathEngine::clear_cache`].
#[derive(Debug, Default)]
pub struct PathEngine {
    /// Memoized routes (empty route = recorded absence).
    cache: HashMap<(GridPos, GridPos), Vec<GridPos>>,
    /// Keys in insertion order, oldest first.
    insertion_order: VecDeque<(GridPos, GridPos)>,
    capacity: usize,
}

impl PathEngine {
    /// Create an engine retaining up to `capacity` cached routes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: HashMap::with_capacity(capacity),
            insertion_order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Create an engine sized per [`NavConfig::cache_capacity`].
    #[must_use]
    pub fn with_config(config: &NavConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    /// Maximum number of retained cache entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently cached results.
    #[must_use]
    pub fn cached_routes(&self) -> usize {
        self.cache.len()
    }

    /// Whether a result for this exact (start, goal) pair is cached.
    #[must_use]
    pub fn is_cached(&self, start: GridPos, goal: GridPos) -> bool {
        self.cache.contains_key(&(start, goal))
    }

    /// Drop all cached results. Must be called after any steady-state
    /// terrain mutation.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.insertion_order.clear();
    }

    /// Find the cheapest route from `start` to `goal` under the terrain
    /// cost field.
    ///
    /// Returns an empty route when either endpoint is out of grid bounds,
    /// either endpoint blocks search, or no connecting route exists. On
    /// success the route includes `start` and `goal` as its first and
    /// last elements.
    pub fn find_route(&mut self, grid: &TerrainGrid, start: GridPos, goal: GridPos) -> Vec<GridPos> {
        if !grid.in_bounds(start.0, start.1) || !grid.in_bounds(goal.0, goal.1) {
            return Vec::new();
        }

        if let Some(route) = self.cache.get(&(start, goal)) {
            tracing::trace!(?start, ?goal, "route cache hit");
            return route.clone();
        }

        let route = if grid.is_blocking(start.0, start.1) || grid.is_blocking(goal.0, goal.1) {
            Vec::new()
        } else if start == goal {
            vec![start]
        } else {
            a_star(grid, start, goal)
        };
        tracing::debug!(?start, ?goal, waypoints = route.len(), "route computed");

        self.insert(start, goal, route.clone());
        route
    }

    /// Insert a result, evicting the oldest surviving entry once past
    /// capacity.
    fn insert(&mut self, start: GridPos, goal: GridPos, route: Vec<GridPos>) {
        if self.capacity == 0 {
            return;
        }
        if self.cache.len() >= self.capacity {
            if let Some(oldest) = self.insertion_order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
        self.insertion_order.push_back((start, goal));
        self.cache.insert((start, goal), route);
    }
}

/// A* over the grid. Mountain cells never enter the neighbor set; every
/// other step costs the destination cell's terrain step cost.
fn a_star(grid: &TerrainGrid, start: GridPos, goal: GridPos) -> Vec<GridPos> {
    let mut open_set: BinaryHeap<SearchNode> = BinaryHeap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut g_score: HashMap<GridPos, Fixed> = HashMap::new();

    g_score.insert(start, Fixed::ZERO);
    open_set.push(SearchNode {
        pos: start,
        f_score: octile_heuristic(start, goal),
        tie_breaker: tie_breaker(start),
    });

    while let Some(current) = open_set.pop() {
        if current.pos == goal {
            return reconstruct_route(&came_from, goal);
        }

        let current_g = g_score.get(&current.pos).copied().unwrap_or(Fixed::MAX);

        for &(dcol, drow) in &DIRECTIONS {
            let neighbor = (current.pos.0 + dcol, current.pos.1 + drow);

            if !grid.in_bounds(neighbor.0, neighbor.1) {
                continue;
            }

            // Mountain cells are excluded, never merely expensive
            let Some(step_cost) = grid.kind_at(neighbor.0, neighbor.1).step_cost() else {
                continue;
            };

            let tentative_g = current_g + step_cost;
            let neighbor_g = g_score.get(&neighbor).copied().unwrap_or(Fixed::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.pos);
                g_score.insert(neighbor, tentative_g);
                open_set.push(SearchNode {
                    pos: neighbor,
                    f_score: tentative_g + octile_heuristic(neighbor, goal),
                    tie_breaker: tie_breaker(neighbor),
                });
            }
        }
    }

    // Start is isolated from goal
    Vec::new()
}

/// Reconstruct the route from the predecessor map, start first.
fn reconstruct_route(came_from: &HashMap<GridPos, GridPos>, goal: GridPos) -> Vec<GridPos> {
    let mut route = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        route.push(prev);
        current = prev;
    }

    route.reverse();
    route
}

/// Total route cost: the sum of destination-cell step costs over each
/// step. The start cell contributes nothing.
#[must_use]
pub fn route_cost(grid: &TerrainGrid, route: &[GridPos]) -> Fixed {
    route
        .iter()
        .skip(1)
        .map(|&(col, row)| grid.kind_at(col, row).step_cost().unwrap_or(Fixed::ZERO))
        .fold(Fixed::ZERO, |acc, cost| acc + cost)
}

/// Convert a grid route into continuous waypoints at cell centers.
#[must_use]
pub fn route_to_world(grid: &TerrainGrid, route: &[GridPos]) -> Vec<Vec2Fixed> {
    route
        .iter()
        .map(|&(col, row)| grid.grid_to_world(col, row))
        .collect()
}

/// Convert a continuous position to its grid cell by floor division.
#[must_use]
pub fn world_to_grid(pos: Vec2Fixed, cell_size: Fixed) -> GridPos {
    (
        (pos.x / cell_size).floor().to_num::<i32>(),
        (pos.y / cell_size).floor().to_num::<i32>(),
    )
}

/// Convert a grid cell to the continuous position at its center.
#[must_use]
pub fn grid_to_world(pos: GridPos, cell_size: Fixed) -> Vec2Fixed {
    let half = cell_size / Fixed::from_num(2);
    Vec2Fixed::new(
        Fixed::from_num(pos.0) * cell_size + half,
        Fixed::from_num(pos.1) * cell_size + half,
    )
}
