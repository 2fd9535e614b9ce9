//! Scoring and leveling rules

/// Lines needed to advance one level
pub const LINES_PER_LEVEL: u32 = 10;
/// Drop interval at level 0, before the per-level speedup
pub const BASE_INTERVAL_MS: u64 = 800;
/// Speedup per level
pub const SPEED_STEP_MS: u64 = 60;
/// Fastest the drop timer ever gets
pub const MIN_INTERVAL_MS: u64 = 120;
/// Flat bonus per occupied cell cleared by a bomb blast
const BOMB_CELL_BONUS: u64 = 10;

/// Result of feeding a clear into the score engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearResult {
    /// Points awarded for this clear
    pub delta: u64,
    /// Set when the clear crossed a level boundary
    pub new_level: Option<u32>,
}

/// Score, cumulative lines and level. `level` is always
/// `lines / LINES_PER_LEVEL + 1`.
#[derive(Debug, Clone)]
pub struct Score {
    pub points: u64,
    pub lines: u32,
    pub level: u32,
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl Score {
    pub fn new() -> Self {
        Self {
            points: 0,
            lines: 0,
            level: 1,
        }
    }

    /// Base score for clearing `lines` at once; four or more lines cap at
    /// the four-line tier.
    fn base_score(lines: u32) -> u64 {
        match lines {
            0 => 0,
            1 => 100,
            2 => 300,
            3 => 500,
            _ => 800,
        }
    }

    /// Record a clear of `lines` rows-plus-columns. The delta uses the
    /// level in effect when the clear happened; leveling applies after.
    pub fn add_clear(&mut self, lines: u32) -> ClearResult {
        let delta = Self::base_score(lines) * u64::from(self.level);
        self.points += delta;
        self.lines += lines;
        let level = self.lines / LINES_PER_LEVEL + 1;
        let new_level = if level > self.level {
            self.level = level;
            Some(level)
        } else {
            None
        };
        ClearResult { delta, new_level }
    }

    /// Milliseconds between gravity drop steps at the current level
    pub fn drop_interval_ms(&self) -> u64 {
        BASE_INTERVAL_MS
            .saturating_sub(u64::from(self.level) * SPEED_STEP_MS)
            .max(MIN_INTERVAL_MS)
    }

    /// 1 point per manually soft-dropped cell
    pub fn add_soft_drop(&mut self, cells: u32) {
        self.points += u64::from(cells);
    }

    /// 2 points per hard-dropped cell
    pub fn add_hard_drop(&mut self, cells: u32) {
        self.points += u64::from(cells) * 2;
    }

    /// Flat bonus for cells destroyed by bomb blasts
    pub fn add_bomb_bonus(&mut self, cells: u32) -> u64 {
        let delta = u64::from(cells) * BOMB_CELL_BONUS;
        self.points += delta;
        delta
    }
}
