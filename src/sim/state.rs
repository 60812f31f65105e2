//! Match state and core simulation types
//!
//! Everything needed to resume a match lives here and is serializable.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::line::Line;
use super::recorder::{MatchRecorder, RankingEntry};
use crate::consts::*;
use crate::error::{MatchError, Result};
use crate::palette::PaletteColor;
use crate::polar_to_cartesian;
use crate::settings::MatchSettings;

/// Phase of a running match. Setup happens before a `MatchState` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Simulation advances on every tick
    Running,
    /// Ticks are ignored; no state changes
    Paused,
    /// Fewer than two balls remain
    Over,
}

/// Something that happened during a tick, for sound/UI hooks
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    BoundaryHit { ball_id: u32, contact: Vec2, lines_added: u32 },
    BallCollision { a: u32, b: u32 },
    LineRemoved { owner: u32, remover: u32, line_id: u32 },
    Eliminated { ball_id: u32, rank: u32 },
    MatchOver { winner: Option<u32> },
}

/// The circular play area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub center: Vec2,
    pub radius: f32,
}

impl Arena {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Point on the boundary at `theta`
    pub fn boundary_point(&self, theta: f32) -> Vec2 {
        self.center + polar_to_cartesian(self.radius, theta)
    }

    /// True if a circle at `pos` lies fully inside (touching counts as inside)
    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        (pos - self.center).length() + radius <= self.radius
    }
}

/// One competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    radius: f32,
    color: PaletteColor,
    /// Creation order
    lines: Vec<Line>,
    next_line_id: u32,
    alive: bool,
    /// 1 = first eliminated, ball count = survivor
    elimination_rank: Option<u32>,
    lines_removed: u32,
    lines_lost: u32,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32, color: PaletteColor) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            color,
            lines: Vec::new(),
            next_line_id: 0,
            alive: true,
            elimination_rank: None,
            lines_removed: 0,
            lines_lost: 0,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn color(&self) -> PaletteColor {
        self.color
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn elimination_rank(&self) -> Option<u32> {
        self.elimination_rank
    }

    /// Lines this ball has cut from others
    pub fn lines_removed(&self) -> u32 {
        self.lines_removed
    }

    /// Own lines cut by others
    pub fn lines_lost(&self) -> u32 {
        self.lines_lost
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// All lines including ones killed this tick (purged at tick end)
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn alive_lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(|l| l.is_alive())
    }

    pub fn alive_line_count(&self) -> usize {
        self.alive_lines().count()
    }

    /// (anchor, tip) of every alive line, for rendering
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.alive_lines().map(Line::segment)
    }

    /// Advance position and drag line tips along
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.sync_line_tips();
    }

    pub fn sync_line_tips(&mut self) {
        let center = self.pos;
        for line in self.lines.iter_mut().filter(|l| l.is_alive()) {
            line.sync_tip(center);
        }
    }

    /// Attach a new line anchored at `anchor`; returns its id
    pub fn add_line(&mut self, anchor: Vec2) -> u32 {
        let id = self.next_line_id;
        self.next_line_id += 1;
        self.lines.push(Line::new(id, anchor, self.pos));
        id
    }

    /// Kill a line. Returns true if that was the last alive line, in which
    /// case the ball is no longer alive. The caller assigns the rank.
    pub fn remove_line(&mut self, line_id: u32) -> bool {
        let killed = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .is_some_and(Line::kill);
        if killed && self.alive && self.alive_line_count() == 0 {
            self.alive = false;
            return true;
        }
        false
    }

    /// Drop lines killed earlier in the tick
    pub fn purge_dead_lines(&mut self) {
        self.lines.retain(Line::is_alive);
    }

    pub(crate) fn record_removed(&mut self) {
        self.lines_removed += 1;
    }

    pub(crate) fn record_lost(&mut self) {
        self.lines_lost += 1;
    }

    pub(crate) fn set_rank(&mut self, rank: u32) {
        debug_assert!(self.elimination_rank.is_none(), "ball {} ranked twice", self.id);
        self.elimination_rank = Some(rank);
    }

    /// Eliminate regardless of remaining lines (all lines die with the ball)
    pub(crate) fn eliminate(&mut self) {
        self.alive = false;
        for line in &mut self.lines {
            line.kill();
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// Complete match state (serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    settings: MatchSettings,
    pub(crate) arena: Arena,
    /// Sorted by id, never inserted into after spawn
    pub(crate) balls: Vec<Ball>,
    pub(crate) recorder: MatchRecorder,
    pub(crate) phase: MatchPhase,
    /// Simulated seconds since match start (paused time excluded)
    pub(crate) elapsed: f32,
    pub(crate) time_ticks: u64,
    rng_state: RngState,
}

impl MatchState {
    /// Validate settings and spawn a fresh match
    pub fn new(settings: MatchSettings) -> Result<Self> {
        settings.validate()?;
        let arena = Arena::new(Vec2::ZERO, settings.arena_radius());
        let mut state = Self {
            rng_state: RngState::new(settings.seed),
            settings,
            arena,
            balls: Vec::new(),
            recorder: MatchRecorder::new(),
            phase: MatchPhase::Running,
            elapsed: 0.0,
            time_ticks: 0,
        };
        state.spawn_balls();
        log::info!(
            "Match started: {} balls, arena radius {:.1}, seed {}",
            state.balls.len(),
            state.arena.radius,
            state.settings.seed
        );
        Ok(state)
    }

    /// Throw away the current match and start over with the same settings.
    /// Each reset draws from a new RNG stream so layouts differ.
    pub fn reset(&mut self) {
        self.rng_state.stream += 1;
        self.balls.clear();
        self.recorder = MatchRecorder::new();
        self.phase = MatchPhase::Running;
        self.elapsed = 0.0;
        self.time_ticks = 0;
        self.spawn_balls();
        log::info!("Match reset (stream {})", self.rng_state.stream);
    }

    pub fn pause(&mut self) {
        if self.phase == MatchPhase::Running {
            self.phase = MatchPhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == MatchPhase::Paused {
            self.phase = MatchPhase::Running;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            MatchPhase::Running => self.pause(),
            MatchPhase::Paused => self.resume(),
            MatchPhase::Over => {}
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// All balls in id order, eliminated ones included
    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls.get(id as usize)
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == MatchPhase::Over
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn in_grace_period(&self) -> bool {
        self.elapsed < self.settings.grace_period
    }

    /// Seconds of grace left (0 once it has expired)
    pub fn grace_remaining(&self) -> f32 {
        (self.settings.grace_period - self.elapsed).max(0.0)
    }

    pub fn alive_count(&self) -> usize {
        self.balls.iter().filter(|b| b.is_alive()).count()
    }

    pub fn total_alive_lines(&self) -> usize {
        self.balls.iter().map(Ball::alive_line_count).sum()
    }

    pub fn recorder(&self) -> &MatchRecorder {
        &self.recorder
    }

    pub fn winner(&self) -> Option<&Ball> {
        self.recorder.winner().and_then(|id| self.ball(id))
    }

    /// Final standings, winner first. Only valid once the match is over.
    pub fn final_rankings(&self) -> Result<Vec<RankingEntry>> {
        if !self.is_over() {
            return Err(MatchError::invalid_state("rankings requested before match is over"));
        }
        self.recorder.final_rankings(&self.balls)
    }

    /// Place balls at random non-overlapping spots with random headings,
    /// each with its initial lines at random boundary points
    fn spawn_balls(&mut self) {
        let mut rng = self.rng_state.to_rng();
        let radius = self.settings.ball_radius;
        let free_radius = self.arena.radius - radius - 2.0;

        for i in 0..self.settings.ball_count {
            let mut position = None;
            for _ in 0..SPAWN_ATTEMPTS {
                let r = rng.random_range(SPAWN_RADIUS_MIN_FRACTION..SPAWN_RADIUS_MAX_FRACTION)
                    * free_radius;
                let theta = rng.random::<f32>() * std::f32::consts::TAU;
                let candidate = self.arena.center + polar_to_cartesian(r, theta);
                if self.position_is_free(candidate, radius) {
                    position = Some(candidate);
                    break;
                }
            }
            let position = position.unwrap_or_else(|| {
                log::warn!("No free spawn spot for ball {}, placing at center", i);
                self.arena.center
            });

            let speed =
                rng.random_range(self.settings.initial_speed_min..=self.settings.initial_speed_max);
            let heading = rng.random::<f32>() * std::f32::consts::TAU;
            let velocity = polar_to_cartesian(speed, heading);

            let mut ball = Ball::new(i, position, velocity, radius, self.settings.color_for(i as usize));
            for _ in 0..self.settings.initial_lines_per_ball {
                let theta = rng.random::<f32>() * std::f32::consts::TAU;
                ball.add_line(self.arena.boundary_point(theta));
            }
            self.balls.push(ball);
        }
    }

    fn position_is_free(&self, pos: Vec2, radius: f32) -> bool {
        if !self.arena.contains(pos, radius) {
            return false;
        }
        self.balls
            .iter()
            .all(|other| (pos - other.pos).length() >= radius * SPAWN_SPACING_RADII)
    }

    /// Build a match from hand-placed balls instead of random spawns
    ///
    /// Every ball must be alive with at least one line, fit inside the arena,
    /// use the configured radius and have a color no other ball uses.
    pub fn from_parts(settings: MatchSettings, balls: Vec<Ball>) -> Result<Self> {
        settings.validate()?;
        if balls.len() != settings.ball_count as usize {
            return Err(MatchError::config(
                "ball_count",
                format!("{} balls supplied for ball_count {}", balls.len(), settings.ball_count),
            ));
        }
        let arena = Arena::new(Vec2::ZERO, settings.arena_radius());
        for (i, ball) in balls.iter().enumerate() {
            if ball.id as usize != i {
                return Err(MatchError::invalid_state("ball ids must be 0..n in order"));
            }
            if ball.radius() != settings.ball_radius {
                return Err(MatchError::config(
                    "ball_radius",
                    format!(
                        "ball {} has radius {}, expected {}",
                        ball.id,
                        ball.radius(),
                        settings.ball_radius
                    ),
                ));
            }
            if !ball.is_alive() || ball.alive_line_count() == 0 {
                return Err(MatchError::invalid_state(format!(
                    "ball {} starts without any lines",
                    ball.id
                )));
            }
            let placed_inside = ball.pos.is_finite() && arena.contains(ball.pos, ball.radius());
            if !placed_inside || !ball.vel.is_finite() {
                return Err(MatchError::invalid_state(format!(
                    "ball {} at ({:.1}, {:.1}) is outside the arena",
                    ball.id, ball.pos.x, ball.pos.y
                )));
            }
            if balls[..i].iter().any(|other| other.color() == ball.color()) {
                return Err(MatchError::config(
                    "colors",
                    format!("ball {} reuses color {}", ball.id, ball.color().name()),
                ));
            }
        }
        Ok(Self {
            rng_state: RngState::new(settings.seed),
            settings,
            arena,
            balls,
            recorder: MatchRecorder::new(),
            phase: MatchPhase::Running,
            elapsed: 0.0,
            time_ticks: 0,
        })
    }
}
