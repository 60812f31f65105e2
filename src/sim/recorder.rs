//! Match recorder
//!
//! Tracks the order in which balls are knocked out and builds the final
//! standings once the match is over. Append-only; frozen after `finish`.

use serde::{Deserialize, Serialize};

use super::state::Ball;
use crate::error::{MatchError, Result};
use crate::palette::PaletteColor;

/// A single elimination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elimination {
    pub ball_id: u32,
    /// 1 = first ball out
    pub rank: u32,
    /// Match time (seconds) of the tick it happened in
    pub time: f32,
}

/// One row of the final standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub ball_id: u32,
    /// Elimination rank: 1 = first out, ball count = survivor
    pub rank: u32,
    /// Finishing position: 1 = winner
    pub place: u32,
    pub color: PaletteColor,
    pub lines_removed: u32,
    pub lines_lost: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecorder {
    /// First eliminated first
    eliminations: Vec<Elimination>,
    winner: Option<u32>,
    finished: bool,
}

impl MatchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eliminations(&self) -> &[Elimination] {
        &self.eliminations
    }

    /// Ball ids in elimination order
    pub fn elimination_order(&self) -> impl Iterator<Item = u32> + '_ {
        self.eliminations.iter().map(|e| e.ball_id)
    }

    pub fn winner(&self) -> Option<u32> {
        self.winner
    }

    pub fn record_elimination(&mut self, ball_id: u32, rank: u32, time: f32) -> Result<()> {
        if self.finished {
            return Err(MatchError::invalid_state(format!(
                "elimination of ball {ball_id} recorded after match end"
            )));
        }
        if self.eliminations.iter().any(|e| e.ball_id == ball_id) {
            return Err(MatchError::invalid_state(format!(
                "ball {ball_id} eliminated twice"
            )));
        }
        self.eliminations.push(Elimination {
            ball_id,
            rank,
            time,
        });
        Ok(())
    }

    /// Freeze the record. `winner` is the surviving ball, if any.
    pub fn finish(&mut self, winner: Option<u32>) -> Result<()> {
        if self.finished {
            return Err(MatchError::invalid_state("match already finished"));
        }
        self.winner = winner;
        self.finished = true;
        Ok(())
    }

    /// Standings sorted winner first
    pub fn final_rankings(&self, balls: &[Ball]) -> Result<Vec<RankingEntry>> {
        if !self.finished {
            return Err(MatchError::invalid_state(
                "rankings requested before match is over",
            ));
        }
        let total = balls.len() as u32;
        let mut entries = balls
            .iter()
            .map(|ball| {
                let rank = ball.elimination_rank().ok_or_else(|| {
                    MatchError::invalid_state(format!("ball {} has no rank", ball.id))
                })?;
                Ok(RankingEntry {
                    ball_id: ball.id,
                    rank,
                    place: total + 1 - rank,
                    color: ball.color(),
                    lines_removed: ball.lines_removed(),
                    lines_lost: ball.lines_lost(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.place);
        Ok(entries)
    }
}
