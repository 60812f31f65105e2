//! Boundary-anchored lines
//!
//! A line runs from a fixed anchor on the arena wall to its owning ball's
//! center. The anchor never moves after creation; only the tip follows the
//! ball. Lines carry geometry only, ownership lives in the `Ball` that holds
//! them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A tether from the arena wall to a ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Per-ball id, never reused within a match
    pub id: u32,
    anchor: Vec2,
    tip: Vec2,
    alive: bool,
}

impl Line {
    pub fn new(id: u32, anchor: Vec2, tip: Vec2) -> Self {
        Self {
            id,
            anchor,
            tip,
            alive: true,
        }
    }

    #[inline]
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    #[inline]
    pub fn tip(&self) -> Vec2 {
        self.tip
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Move the free end to the owner's current center
    #[inline]
    pub fn sync_tip(&mut self, center: Vec2) {
        self.tip = center;
    }

    /// Mark dead. Returns false if it was already dead.
    pub fn kill(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    /// (anchor, tip) pair for rendering and intersection tests
    #[inline]
    pub fn segment(&self) -> (Vec2, Vec2) {
        (self.anchor, self.tip)
    }
}
