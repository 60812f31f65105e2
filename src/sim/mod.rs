//! Simulation module
//!
//! All gameplay logic lives here. No rendering or platform dependencies:
//! - Caller-supplied timestep only
//! - Seeded RNG only, and only at spawn
//! - Stable iteration order (by ball id, then line creation order)

pub mod geometry;
pub mod line;
pub mod recorder;
pub mod state;
pub mod tick;

pub use geometry::{
    BoundaryBounce, boundary_reflect, distance_point_to_segment, elastic_bounce,
    reflect_velocity, segment_circle_intersects,
};
pub use line::Line;
pub use recorder::{Elimination, MatchRecorder, RankingEntry};
pub use state::{Arena, Ball, MatchEvent, MatchPhase, MatchState};
pub use tick::tick;
