//! Collision geometry and response
//!
//! Three interactions drive the game: a ball against the arena wall, a ball
//! against another ball, and a ball's body against a line segment owned by
//! someone else. All functions here are total over finite inputs.

use glam::Vec2;

/// Gap left between a corrected ball and the wall. Larger than the f32
/// rounding of a position at arena scale, so a ball parked against the wall
/// is not seen as touching it again on the next check.
const CONTACT_SKIN: f32 = 5e-4;

/// Result of a boundary check
#[derive(Debug, Clone, Copy)]
pub struct BoundaryBounce {
    /// Whether the ball was touching or past the wall
    pub hit: bool,
    /// Position after correction (unchanged on a miss)
    pub pos: Vec2,
    /// Velocity after reflection and boost (unchanged on a miss)
    pub vel: Vec2,
    /// Contact point on the boundary circle (meaningless on a miss)
    pub contact: Vec2,
}

impl BoundaryBounce {
    pub fn miss(pos: Vec2, vel: Vec2) -> Self {
        Self {
            hit: false,
            pos,
            vel,
            contact: pos,
        }
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n, `normal` must be unit length.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Shortest distance from `point` to the closed segment `a`-`b`
pub fn distance_point_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_len_sq = ab.length_squared();
    if ab_len_sq == 0.0 {
        // Degenerate segment
        return ap.length();
    }
    let t = (ap.dot(ab) / ab_len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (point - closest).length()
}

/// Check if a circle touches the segment from `anchor` to `tip`
///
/// Inclusive at the radius so a grazing contact still counts. At low frame
/// rates a fast ball can otherwise step across a line without ever being
/// strictly inside it.
#[inline]
pub fn segment_circle_intersects(anchor: Vec2, tip: Vec2, center: Vec2, radius: f32) -> bool {
    distance_point_to_segment(center, anchor, tip) <= radius
}

/// Unit normal from `a` toward `b`, or +X when the centers coincide
#[inline]
pub fn collision_normal(a: Vec2, b: Vec2) -> Vec2 {
    let n = (b - a).normalize_or_zero();
    if n == Vec2::ZERO { Vec2::X } else { n }
}

/// Arcade ball-ball response
///
/// Each velocity has its component along the center line mirrored and its
/// tangential component kept, then gets scaled by `1 + boost_factor`. This
/// is not momentum conserving: both balls always leave faster than they came.
pub fn elastic_bounce(
    pos_a: Vec2,
    vel_a: Vec2,
    pos_b: Vec2,
    vel_b: Vec2,
    boost_factor: f32,
) -> (Vec2, Vec2) {
    let n = collision_normal(pos_a, pos_b);
    let scale = 1.0 + boost_factor;
    (
        reflect_velocity(vel_a, n) * scale,
        reflect_velocity(vel_b, n) * scale,
    )
}

/// Ball against the arena wall
///
/// On contact the ball is placed against the boundary (`CONTACT_SKIN`
/// inside it), its velocity is
/// reflected about the inward normal and `speed_increase` is added to its
/// speed. A ball strictly inside the arena is returned untouched.
pub fn boundary_reflect(
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    arena_center: Vec2,
    arena_radius: f32,
    speed_increase: f32,
) -> BoundaryBounce {
    let offset = pos - arena_center;
    let dist = offset.length();
    if dist + radius <= arena_radius {
        return BoundaryBounce::miss(pos, vel);
    }

    let outward = if dist > 0.0 { offset / dist } else { Vec2::X };
    let new_pos = arena_center + outward * (arena_radius - radius - CONTACT_SKIN).max(0.0);
    let contact = arena_center + outward * arena_radius;

    let mut new_vel = reflect_velocity(vel, -outward);
    let speed = new_vel.length();
    if speed > 0.0 {
        new_vel *= (speed + speed_increase) / speed;
    }

    BoundaryBounce {
        hit: true,
        pos: new_pos,
        vel: new_vel,
        contact,
    }
}

/// Pull a ball back inside the arena without any bounce response
///
/// Used after overlap separation, which can push a ball past the wall.
pub fn clamp_inside(pos: Vec2, radius: f32, arena_center: Vec2, arena_radius: f32) -> Vec2 {
    let offset = pos - arena_center;
    if offset.length() + radius > arena_radius {
        let max_dist = (arena_radius - radius - CONTACT_SKIN).max(0.0);
        arena_center + offset.normalize_or(Vec2::X) * max_dist
    } else {
        pos
    }
}
