//! Match settings
//!
//! Collected once by the setup screen and handed to the simulation at match
//! start. Settings never change while a match is running.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{MatchError, Result};
use crate::palette::PaletteColor;

pub const MIN_BALLS: u32 = 2;
pub const MAX_BALLS: u32 = 12;
pub const MIN_LINES_PER_HIT: u32 = 1;
pub const MAX_LINES_PER_HIT: u32 = 10;
pub const MIN_ARENA_PERCENT: f32 = 30.0;
pub const MAX_ARENA_PERCENT: f32 = 100.0;
pub const MAX_GRACE_PERIOD: f32 = 10.0;
pub const MAX_BALL_COLLISION_FACTOR: f32 = 1.0;
pub const MAX_BOUNDARY_SPEED_INCREASE: f32 = 200.0;

/// Match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Number of balls (2-12)
    pub ball_count: u32,
    /// Lines granted per boundary hit (1-10)
    pub lines_per_hit: u32,
    /// Lines every ball starts with
    pub initial_lines_per_ball: u32,
    /// Ball-ball speed boost (multiplicative, speed *= 1 + factor)
    pub ball_collision_speed_increase_factor: f32,
    /// Boundary speed boost (additive, units/s)
    pub boundary_collision_speed_increase: f32,
    /// Arena radius as a percentage of `BASE_ARENA_RADIUS` (30-100)
    pub arena_size_percent: f32,
    /// Seconds at match start during which lines cannot be removed
    pub grace_period: f32,
    /// Initial speed range for randomized starting velocities
    pub initial_speed_min: f32,
    pub initial_speed_max: f32,
    /// Hard speed cap
    pub max_speed: f32,
    pub ball_radius: f32,
    /// One color per ball. Empty means palette order.
    #[serde(default)]
    pub colors: Vec<PaletteColor>,
    /// Seed for spawn positions, velocities and initial line anchors
    #[serde(default)]
    pub seed: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            ball_count: 6,
            lines_per_hit: LINES_PER_BOUNDARY_HIT,
            initial_lines_per_ball: INITIAL_LINES_PER_BALL,
            ball_collision_speed_increase_factor: BALL_COLLISION_SPEED_INCREASE_FACTOR,
            boundary_collision_speed_increase: BOUNDARY_COLLISION_SPEED_INCREASE,
            arena_size_percent: 80.0,
            grace_period: GRACE_PERIOD_DURATION,
            initial_speed_min: INITIAL_SPEED_MIN,
            initial_speed_max: INITIAL_SPEED_MAX,
            max_speed: MAX_SPEED,
            ball_radius: BALL_RADIUS,
            colors: Vec::new(),
            seed: 0,
        }
    }
}

impl MatchSettings {
    /// Default settings for `ball_count` balls
    pub fn with_ball_count(ball_count: u32) -> Self {
        Self {
            ball_count,
            ..Self::default()
        }
    }

    /// Arena radius derived from the size percentage
    pub fn arena_radius(&self) -> f32 {
        BASE_ARENA_RADIUS * self.arena_size_percent / 100.0
    }

    /// Color for the ball at `index`, falling back to palette order
    pub fn color_for(&self, index: usize) -> PaletteColor {
        self.colors
            .get(index)
            .copied()
            .unwrap_or(PaletteColor::ALL[index % PaletteColor::ALL.len()])
    }

    /// Reject anything outside the allowed ranges
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BALLS..=MAX_BALLS).contains(&self.ball_count) {
            return Err(MatchError::config(
                "ball_count",
                format!("{} not in {MIN_BALLS}..={MAX_BALLS}", self.ball_count),
            ));
        }
        if !(MIN_LINES_PER_HIT..=MAX_LINES_PER_HIT).contains(&self.lines_per_hit) {
            return Err(MatchError::config(
                "lines_per_hit",
                format!("{} not in {MIN_LINES_PER_HIT}..={MAX_LINES_PER_HIT}", self.lines_per_hit),
            ));
        }
        if !(MIN_LINES_PER_HIT..=MAX_LINES_PER_HIT).contains(&self.initial_lines_per_ball) {
            return Err(MatchError::config(
                "initial_lines_per_ball",
                format!(
                    "{} not in {MIN_LINES_PER_HIT}..={MAX_LINES_PER_HIT}",
                    self.initial_lines_per_ball
                ),
            ));
        }
        check_range(
            "ball_collision_speed_increase_factor",
            self.ball_collision_speed_increase_factor,
            0.0,
            MAX_BALL_COLLISION_FACTOR,
        )?;
        check_range(
            "boundary_collision_speed_increase",
            self.boundary_collision_speed_increase,
            0.0,
            MAX_BOUNDARY_SPEED_INCREASE,
        )?;
        check_range(
            "arena_size_percent",
            self.arena_size_percent,
            MIN_ARENA_PERCENT,
            MAX_ARENA_PERCENT,
        )?;
        check_range("grace_period", self.grace_period, 0.0, MAX_GRACE_PERIOD)?;

        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(MatchError::config("max_speed", "must be positive"));
        }
        if !self.initial_speed_min.is_finite() || self.initial_speed_min <= 0.0 {
            return Err(MatchError::config("initial_speed_min", "must be positive"));
        }
        check_range(
            "initial_speed_max",
            self.initial_speed_max,
            self.initial_speed_min,
            self.max_speed,
        )?;

        if !self.ball_radius.is_finite() || self.ball_radius <= 0.0 {
            return Err(MatchError::config("ball_radius", "must be positive"));
        }
        // Every ball needs room at the innermost spawn ring and beyond
        if self.ball_radius * SPAWN_SPACING_RADII * 2.0 > self.arena_radius() {
            return Err(MatchError::config(
                "ball_radius",
                format!("{} too large for arena radius {}", self.ball_radius, self.arena_radius()),
            ));
        }

        if !self.colors.is_empty() {
            if self.colors.len() != self.ball_count as usize {
                return Err(MatchError::config(
                    "colors",
                    format!("{} colors for {} balls", self.colors.len(), self.ball_count),
                ));
            }
            for (i, color) in self.colors.iter().enumerate() {
                if self.colors[..i].contains(color) {
                    return Err(MatchError::config(
                        "colors",
                        format!("{} assigned twice", color.name()),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(MatchError::config(field, format!("{value} not in {min}..={max}")))
    }
}
