//! Vector Balls - A last-ball-standing arena simulation
//!
//! Core modules:
//! - `sim`: Simulation (physics, collisions, lines, eliminations)
//! - `settings`: Validated match configuration
//! - `palette`: Fixed ball color palette and closest-color lookup
//! - `persistence`: Snapshot save/restore of a running match
//! - `error`: Configuration and invalid-state errors

pub mod error;
pub mod palette;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use error::{MatchError, Result};
pub use palette::{PaletteColor, Rgb, closest_color_name};
pub use settings::MatchSettings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless driver (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena radius at 100% size
    pub const BASE_ARENA_RADIUS: f32 = 345.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 12.0;
    pub const INITIAL_SPEED_MIN: f32 = 160.0;
    pub const INITIAL_SPEED_MAX: f32 = 240.0;
    /// Cap on absolute speed to keep the simulation stable
    pub const MAX_SPEED: f32 = 700.0;

    /// Lines granted at match start / per boundary hit
    pub const INITIAL_LINES_PER_BALL: u32 = 3;
    pub const LINES_PER_BOUNDARY_HIT: u32 = 3;

    /// Multiply both balls' speeds by (1 + factor) after a ball-ball collision
    pub const BALL_COLLISION_SPEED_INCREASE_FACTOR: f32 = 0.12;
    /// Added to a ball's speed (units/s) on a boundary hit
    pub const BOUNDARY_COLLISION_SPEED_INCREASE: f32 = 25.0;

    /// Seconds at match start during which no lines can be removed
    pub const GRACE_PERIOD_DURATION: f32 = 1.0;

    /// Extra push applied to each ball when separating an overlap
    pub const SEPARATION_SLOP: f32 = 0.1;

    /// Spawn placement: fraction of the free radius a ball may start at
    pub const SPAWN_RADIUS_MIN_FRACTION: f32 = 0.15;
    pub const SPAWN_RADIUS_MAX_FRACTION: f32 = 0.75;
    /// Spawn placement: minimum center spacing in ball radii
    pub const SPAWN_SPACING_RADII: f32 = 2.2;
    pub const SPAWN_ATTEMPTS: u32 = 1000;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
