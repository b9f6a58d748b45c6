//! Agent steering: per-tick displacement under the terrain cost field.
//!
//! The primary entry point is [`advance`]: direct steering toward the
//! goal with local avoidance, falling back through successively more
//! desperate escape heuristics when the intended direction or the
//! current cell is blocked. [`advance_along_route`] is the independent
//! path-following mode driven by the [`PathEngine`]; the orchestrator
//! decides which mode an agent uses.
//!
//! All probes are point samples, not swept checks, so the blocking
//! guarantee is best-effort against corner-clipping through thin
//! obstacles.

use serde::{Deserialize, Serialize};

use crate::config::NavConfig;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::path::{route_to_world, PathEngine};
use crate::terrain::TerrainGrid;

/// Compass probe directions for the escape tier, in priority order.
const COMPASS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// Waypoint-following scratch state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RouteFollow {
    /// Cell-center waypoints in world coordinates, start to goal.
    waypoints: Vec<Vec2Fixed>,
    /// Index of the next waypoint to reach.
    next: usize,
}

/// Per-agent navigation state, owned by the caller and passed by
/// reference into every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentNavState {
    /// Continuous world position.
    pub position: Vec2Fixed,
    /// Movement speed in world units per second on Open terrain.
    #[serde(with = "fixed_serde")]
    pub base_speed: Fixed,
    /// Damage reported to the orchestrator when the goal is reached.
    pub impact_damage: u32,
    /// Goal position seen on the previous tick, used to detect goal
    /// movement in path-following mode.
    last_goal: Option<Vec2Fixed>,
    /// Active route scratch for path-following mode.
    route: Option<RouteFollow>,
}

impl AgentNavState {
    /// Create navigation state for a freshly spawned agent.
    #[must_use]
    pub const fn new(position: Vec2Fixed, base_speed: Fixed) -> Self {
        Self {
            position,
            base_speed,
            impact_damage: 0,
            last_goal: None,
            route: None,
        }
    }

    /// Set the damage dealt on goal impact.
    #[must_use]
    pub const fn with_impact_damage(mut self, damage: u32) -> Self {
        self.impact_damage = damage;
        self
    }

    /// Whether a computed route is currently being followed.
    #[must_use]
    pub const fn has_route(&self) -> bool {
        self.route.is_some()
    }
}

/// Result of one steering tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// The agent is within the arrival radius of the goal.
    pub arrived: bool,
    /// Impact damage to apply, reported only on arrival.
    pub impact_damage: Option<u32>,
}

impl AdvanceOutcome {
    const fn moving() -> Self {
        Self {
            arrived: false,
            impact_damage: None,
        }
    }

    const fn arrived(damage: u32) -> Self {
        Self {
            arrived: true,
            impact_damage: Some(damage),
        }
    }
}

/// Fixed-radius arrival/impact check, independent of terrain logic.
#[must_use]
pub fn goal_collision(position: Vec2Fixed, goal: Vec2Fixed, radius: Fixed) -> bool {
    position.distance_squared(goal) <= radius * radius
}

#[inline]
fn elapsed_seconds(elapsed_ms: u32, time_scale: Fixed) -> Fixed {
    Fixed::from_num(elapsed_ms) / Fixed::from_num(1000) * time_scale
}

#[inline]
fn passable(terrain: &TerrainGrid, point: Vec2Fixed) -> bool {
    terrain.kind_at_world(point).move_multiplier() > Fixed::ZERO
}

/// Advance an agent one tick using direct terrain-aware steering.
///
/// State machine per tick: arrival check, then self-cell check (escape
/// when standing on an impassable cell), then look-ahead check
/// (avoidance when the intended direction is blocked), then the normal
/// advance at `base_speed × time_scale × cell multiplier × elapsed
/// seconds`.
pub fn advance(
    agent: &mut AgentNavState,
    goal: Vec2Fixed,
    elapsed_ms: u32,
    time_scale: Fixed,
    terrain: &TerrainGrid,
    config: &NavConfig,
) -> AdvanceOutcome {
    if goal_collision(agent.position, goal, config.arrival_radius) {
        agent.route = None;
        return AdvanceOutcome::arrived(agent.impact_damage);
    }

    let dt = elapsed_seconds(elapsed_ms, time_scale);
    let here = terrain.kind_at_world(agent.position).move_multiplier();

    if here == Fixed::ZERO {
        escape_step(agent, dt, terrain, config);
        return AdvanceOutcome::moving();
    }

    let heading = (goal - agent.position).normalize();
    let ahead = agent.position + heading * config.look_ahead;
    if !passable(terrain, ahead) {
        avoidance_step(agent, heading, dt, terrain, config);
        return AdvanceOutcome::moving();
    }

    agent.position = agent.position + heading * (agent.base_speed * dt * here);
    AdvanceOutcome::moving()
}

/// Avoidance tier: the intended direction is blocked but the current
/// cell is fine. Probes perpendiculars, then backward diagonals, then
/// reverses outright — some displacement is always produced.
fn avoidance_step(
    agent: &mut AgentNavState,
    heading: Vec2Fixed,
    dt: Fixed,
    terrain: &TerrainGrid,
    config: &NavConfig,
) {
    let left = Vec2Fixed::new(-heading.y, heading.x);
    let right = Vec2Fixed::new(heading.y, -heading.x);

    for side in [left, right] {
        if passable(terrain, agent.position + side * config.probe_distance) {
            tracing::trace!("avoidance: sidestep");
            let dir = (side + heading * config.avoid_forward_blend).normalize();
            agent.position =
                agent.position + dir * (agent.base_speed * dt * config.avoid_speed_factor);
            return;
        }
    }

    for side in [left, right] {
        let dir = (-heading + side).normalize();
        if passable(terrain, agent.position + dir * config.probe_distance) {
            tracing::trace!("avoidance: backward diagonal");
            agent.position =
                agent.position + dir * (agent.base_speed * dt * config.avoid_diagonal_factor);
            return;
        }
    }

    // Every probe failed: back straight out at minimal speed
    tracing::trace!("avoidance: reverse");
    agent.position =
        agent.position + (-heading) * (agent.base_speed * dt * config.reverse_speed_factor);
}

/// Escape tier: the agent is standing on an impassable cell (terrain
/// altered underneath it, or a spawn past the map edge). Probes the
/// eight compass directions in priority order; when fully enclosed,
/// flees the world center as a guaranteed-progress fallback.
fn escape_step(agent: &mut AgentNavState, dt: Fixed, terrain: &TerrainGrid, config: &NavConfig) {
    let step = agent.base_speed * dt * config.escape_speed_factor;

    for &(dx, dy) in &COMPASS {
        let dir = Vec2Fixed::new(Fixed::from_num(dx), Fixed::from_num(dy)).normalize();
        if passable(terrain, agent.position + dir * config.probe_distance) {
            tracing::debug!(?dx, ?dy, "escape: compass probe");
            agent.position = agent.position + dir * step;
            return;
        }
    }

    let away = agent.position - terrain.world_center();
    if away == Vec2Fixed::ZERO {
        // Exactly at the center: no direction to flee along
        tracing::debug!("escape: enclosed at world center, holding");
        return;
    }
    tracing::debug!("escape: fleeing world center");
    agent.position = agent.position + away.normalize() * step;
}

/// Advance an agent one tick along a cached route from the path engine.
///
/// The route is recomputed when none is held or when the goal has moved
/// into a different grid cell since the last tick. When the engine
/// reports no route, the agent degrades to direct steering for the
/// tick.
pub fn advance_along_route(
    agent: &mut AgentNavState,
    goal: Vec2Fixed,
    elapsed_ms: u32,
    time_scale: Fixed,
    terrain: &TerrainGrid,
    engine: &mut PathEngine,
    config: &NavConfig,
) -> AdvanceOutcome {
    if goal_collision(agent.position, goal, config.arrival_radius) {
        agent.route = None;
        return AdvanceOutcome::arrived(agent.impact_damage);
    }

    let goal_cell = terrain.world_to_grid(goal);
    let needs_route = match (&agent.route, agent.last_goal) {
        (None, _) | (_, None) => true,
        (Some(_), Some(last)) => terrain.world_to_grid(last) != goal_cell,
    };

    if needs_route {
        let (col, row) = terrain.world_to_grid(agent.position);
        let route = engine.find_route(terrain, (col, row), goal_cell);
        agent.route = if route.is_empty() {
            None
        } else {
            Some(RouteFollow {
                waypoints: route_to_world(terrain, &route),
                next: 0,
            })
        };
        agent.last_goal = Some(goal);
    }

    if agent.route.is_none() {
        // No traversable route; keep moving rather than freezing
        return advance(agent, goal, elapsed_ms, time_scale, terrain, config);
    }

    let dt = elapsed_seconds(elapsed_ms, time_scale);
    let here = terrain.kind_at_world(agent.position).move_multiplier();
    if here == Fixed::ZERO {
        escape_step(agent, dt, terrain, config);
        return AdvanceOutcome::moving();
    }

    let position = agent.position;
    let threshold_sq = config.arrival_radius * config.arrival_radius;
    let target = if let Some(follow) = agent.route.as_mut() {
        while follow.next < follow.waypoints.len()
            && position.distance_squared(follow.waypoints[follow.next]) <= threshold_sq
        {
            follow.next += 1;
        }
        follow.waypoints.get(follow.next).copied().unwrap_or(goal)
    } else {
        goal
    };

    let heading = (target - position).normalize();
    if heading == Vec2Fixed::ZERO {
        return AdvanceOutcome::moving();
    }
    agent.position = position + heading * (agent.base_speed * dt * here);
    AdvanceOutcome::moving()
}
