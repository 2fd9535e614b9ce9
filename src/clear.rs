//! Line clearing: detection, the timed flash phase, removal and bomb
//! explosions
//!
//! The engine is a small state machine (Idle -> Flashing -> back to Idle).
//! All timing is millisecond deadlines measured against the timestamp the
//! session passes in, so the flash phase is testable without waiting.

use crate::grid::{COLS, Gravity, Grid, ROWS};

/// Number of alternating highlight ticks in the flash phase
pub const FLASH_TICKS: u32 = 6;
/// Length of one flash tick
pub const FLASH_TICK_MS: u64 = 100;

/// Transient state of a pending clear: the lines waiting for removal and
/// the highlight toggle the renderer alternates on.
#[derive(Debug, Clone)]
pub struct FlashState {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub highlight_on: bool,
    ticks_left: u32,
    next_toggle_at: u64,
}

#[derive(Debug, Default)]
enum ClearState {
    #[default]
    Idle,
    Flashing(FlashState),
}

/// What a resolved clear did to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOutcome {
    /// Rows cleared plus columns cleared; both count toward leveling
    pub lines: u32,
    /// Grid positions of detonated bombs
    pub blasts: Vec<(usize, usize)>,
    /// Occupied cells destroyed by the blasts
    pub blast_cells: u32,
}

#[derive(Debug, Default)]
pub struct LineClearEngine {
    state: ClearState,
}

impl LineClearEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flashing(&self) -> bool {
        matches!(self.state, ClearState::Flashing(_))
    }

    pub fn flash(&self) -> Option<&FlashState> {
        match &self.state {
            ClearState::Flashing(flash) => Some(flash),
            ClearState::Idle => None,
        }
    }

    /// Scan the grid after a lock. Rows and columns are detected
    /// independently on one snapshot; a cell may belong to both. If any
    /// line is complete the engine enters the flash phase and returns the
    /// affected indices.
    pub fn begin(&mut self, grid: &Grid, now_ms: u64) -> Option<(Vec<usize>, Vec<usize>)> {
        debug_assert!(!self.is_flashing(), "clear scan while a flash is pending");
        let rows = grid.full_rows();
        let cols = grid.full_cols();
        if rows.is_empty() && cols.is_empty() {
            return None;
        }
        tracing::debug!(?rows, ?cols, "lines complete, flashing");
        self.state = ClearState::Flashing(FlashState {
            rows: rows.clone(),
            cols: cols.clone(),
            highlight_on: true,
            ticks_left: FLASH_TICKS,
            next_toggle_at: now_ms + FLASH_TICK_MS,
        });
        Some((rows, cols))
    }

    /// Advance the flash phase. When the final tick elapses the recorded
    /// lines are removed atomically and the outcome is returned; the
    /// engine is Idle again afterwards.
    pub fn tick(&mut self, grid: &mut Grid, gravity: Gravity, now_ms: u64) -> Option<ClearOutcome> {
        let ClearState::Flashing(flash) = &mut self.state else {
            return None;
        };
        while flash.ticks_left > 0 && now_ms >= flash.next_toggle_at {
            flash.highlight_on = !flash.highlight_on;
            flash.ticks_left -= 1;
            flash.next_toggle_at += FLASH_TICK_MS;
        }
        if flash.ticks_left > 0 {
            return None;
        }
        let ClearState::Flashing(flash) = std::mem::take(&mut self.state) else {
            unreachable!();
        };
        Some(Self::apply(grid, gravity, &flash.rows, &flash.cols))
    }

    /// Push every pending deadline into the future, used when a pause ends
    pub fn defer(&mut self, delta_ms: u64) {
        if let ClearState::Flashing(flash) = &mut self.state {
            flash.next_toggle_at += delta_ms;
        }
    }

    /// Snapshot-then-apply removal. Bombs among the cleared cells are
    /// collected first (deduplicated by coordinate, so a bomb on a
    /// row/column intersection triggers once), then rows are removed with
    /// the vacated row reinjected at the gravity edge, full columns are
    /// zeroed, and finally each queued bomb clears its clipped 3x3
    /// neighborhood and the affected columns compact toward the floor.
    fn apply(grid: &mut Grid, gravity: Gravity, rows: &[usize], cols: &[usize]) -> ClearOutcome {
        let mut blasts: Vec<(usize, usize)> = Vec::new();
        for &r in rows {
            for c in 0..COLS {
                if grid.get(r as i32, c as i32).is_some_and(|cell| cell.is_bomb()) {
                    blasts.push((r, c));
                }
            }
        }
        for &c in cols {
            for r in 0..ROWS {
                if grid.get(r as i32, c as i32).is_some_and(|cell| cell.is_bomb())
                    && !blasts.contains(&(r, c))
                {
                    blasts.push((r, c));
                }
            }
        }

        grid.remove_rows(rows, gravity);
        for &c in cols {
            grid.clear_column(c);
        }

        let mut blast_cells = 0u32;
        for &(r, c) in &blasts {
            blast_cells += grid.explode(r, c) as u32;
            let from = c.saturating_sub(1);
            let to = (c + 1).min(COLS - 1);
            for col in from..=to {
                grid.compact_column(col, gravity);
            }
        }

        ClearOutcome {
            lines: (rows.len() + cols.len()) as u32,
            blasts,
            blast_cells,
        }
    }
}
