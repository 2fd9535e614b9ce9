//! Periodic gravity inversion
//!
//! On a fixed wall-clock interval (independent of the drop speed) the
//! fall direction flips, the whole grid turns over, and the falling piece
//! is repositioned so its distance from the new floor matches its
//! distance from the old one. A warning fires a fixed lead time before
//! each shift so collaborators can alert the player.

use crate::grid::{Gravity, Grid, ROWS};
use crate::piece::Piece;

/// Time between gravity inversions
pub const SHIFT_INTERVAL_MS: u64 = 30_000;
/// How long before a shift the warning fires
pub const WARNING_LEAD_MS: u64 = 3_000;

/// What a gravity tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityTick {
    /// The shift is imminent
    Warning,
    /// The direction just flipped; the caller applies the board flip
    Shift,
}

#[derive(Debug, Clone)]
pub struct GravityController {
    direction: Gravity,
    next_shift_at: u64,
    warned: bool,
}

impl GravityController {
    pub fn new(now_ms: u64) -> Self {
        Self {
            direction: Gravity::Down,
            next_shift_at: now_ms + SHIFT_INTERVAL_MS,
            warned: false,
        }
    }

    pub fn direction(&self) -> Gravity {
        self.direction
    }

    /// Advance the shift schedule. At most one signal per call: the
    /// warning once per cycle, then the shift itself.
    pub fn tick(&mut self, now_ms: u64) -> Option<GravityTick> {
        if now_ms >= self.next_shift_at {
            self.direction = self.direction.flipped();
            self.next_shift_at = now_ms + SHIFT_INTERVAL_MS;
            self.warned = false;
            Some(GravityTick::Shift)
        } else if !self.warned && now_ms + WARNING_LEAD_MS >= self.next_shift_at {
            self.warned = true;
            Some(GravityTick::Warning)
        } else {
            None
        }
    }

    /// Flip the grid and mirror the falling piece's vertical origin,
    /// which keeps its distance from the new floor equal to its distance
    /// from the old one. A piece whose mirrored position collides snaps
    /// to the new spawn edge.
    pub fn apply_shift(&self, grid: &mut Grid, piece: Option<&mut Piece>) {
        grid.invert();
        if let Some(piece) = piece {
            piece.y = ROWS as i32 - piece.height() as i32 - piece.y;
            if grid.collides(&piece.shape, piece.x, piece.y) {
                piece.y = self.direction.spawn_row(piece.height());
            }
        }
    }

    /// Push the schedule into the future, used when a pause ends
    pub fn defer(&mut self, delta_ms: u64) {
        self.next_shift_at += delta_ms;
    }
}
