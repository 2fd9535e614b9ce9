//! Game session: owns the board state machine and sequences ticks
//!
//! `GameSession` is the single aggregate holding the grid, the falling
//! piece, the clear engine, the gravity schedule and the score. All
//! mutation happens synchronously inside the command methods and
//! `tick`; collaborators observe the session through the drained event
//! queue and never reach into board state.

use crate::clear::{ClearOutcome, LineClearEngine};
use crate::factory::PieceFactory;
use crate::gravity::{GravityController, GravityTick};
use crate::grid::{BlockKind, Cell, Gravity, Grid};
use crate::piece::Piece;
use crate::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
}

/// Events produced for rendering/audio collaborators. Each carries the
/// minimal payload needed to react; a failure to consume one can never
/// propagate back into the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLocked,
    LinesFlashing { rows: Vec<usize>, cols: Vec<usize> },
    LinesCleared { count: u32, score_delta: u64 },
    BombExploded { row: usize, col: usize },
    LevelUp { level: u32 },
    GravityShiftWarning,
    GravityShifted { direction: Gravity },
    GameOver { score: u64, level: u32 },
}

pub struct GameSession {
    pub grid: Grid,
    /// The falling piece. None while a flash is pending or after game over.
    pub current: Option<Piece>,
    /// Queued piece, promoted on the next spawn
    pub next: Piece,
    factory: PieceFactory,
    pub clear: LineClearEngine,
    gravity: GravityController,
    pub score: Score,
    pub state: SessionState,
    next_drop_at: u64,
    pause_started: Option<u64>,
    last_tick_ms: u64,
    events: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(now_ms: u64) -> Self {
        Self::with_seed(rand::random(), now_ms)
    }

    pub fn with_seed(seed: u64, now_ms: u64) -> Self {
        let mut factory = PieceFactory::with_seed(seed);
        let mut current = factory.next();
        current.place_at_spawn(Gravity::Down);
        let next = factory.next();
        let score = Score::new();
        let next_drop_at = now_ms + score.drop_interval_ms();
        tracing::info!(seed, "session started");
        Self {
            grid: Grid::new(),
            current: Some(current),
            next,
            factory,
            clear: LineClearEngine::new(),
            gravity: GravityController::new(now_ms),
            score,
            state: SessionState::Playing,
            next_drop_at,
            pause_started: None,
            last_tick_ms: now_ms,
            events: Vec::new(),
        }
    }

    pub fn gravity_direction(&self) -> Gravity {
        self.gravity.direction()
    }

    /// Take all events produced since the last drain, in order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance timers. Must be called once per frame. Within one tick the
    /// gravity-shift check runs before the drop timer, so a frame that
    /// triggers both applies the shift first.
    pub fn tick(&mut self, now_ms: u64) {
        self.last_tick_ms = now_ms;
        if self.state != SessionState::Playing {
            return;
        }

        // A shift during a flash would invalidate the recorded line
        // indices; postpone it until the flash resolves.
        if !self.clear.is_flashing() {
            match self.gravity.tick(now_ms) {
                Some(GravityTick::Warning) => {
                    self.events.push(GameEvent::GravityShiftWarning);
                }
                Some(GravityTick::Shift) => {
                    self.gravity.apply_shift(&mut self.grid, self.current.as_mut());
                    let direction = self.gravity.direction();
                    tracing::debug!(?direction, "gravity inverted");
                    self.events.push(GameEvent::GravityShifted { direction });
                }
                None => {}
            }
        }

        if let Some(outcome) = self.clear.tick(&mut self.grid, self.gravity.direction(), now_ms) {
            self.resolve_clear(outcome);
            self.spawn(now_ms);
            return;
        }

        if self.current.is_some() && now_ms >= self.next_drop_at {
            self.gravity_step(now_ms);
            self.next_drop_at = now_ms + self.score.drop_interval_ms();
        }
    }

    /// Translate the falling piece one column. Illegal moves are silently
    /// rejected.
    pub fn move_piece(&mut self, dir: i32) {
        if self.state != SessionState::Playing {
            return;
        }
        if let Some(piece) = self.current.as_mut() {
            if piece.try_move(&self.grid, dir.signum()) {
                self.events.push(GameEvent::PieceMoved);
            }
        }
    }

    pub fn rotate_piece(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        if let Some(piece) = self.current.as_mut() {
            if piece.try_rotate(&self.grid) {
                self.events.push(GameEvent::PieceRotated);
            }
        }
    }

    /// Move one cell with gravity; locks on contact
    pub fn soft_drop(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        let Some(piece) = self.current.as_mut() else {
            return;
        };
        if piece.try_step(&self.grid, self.gravity.direction()) {
            self.score.add_soft_drop(1);
            self.next_drop_at = self.last_tick_ms + self.score.drop_interval_ms();
        } else {
            self.lock(self.last_tick_ms);
        }
    }

    /// Drop to contact and lock immediately; 2 points per cell advanced
    pub fn hard_drop(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        let Some(piece) = self.current.as_mut() else {
            return;
        };
        let distance = piece.drop_to_floor(&self.grid, self.gravity.direction());
        self.score.add_hard_drop(distance);
        self.lock(self.last_tick_ms);
    }

    pub fn toggle_pause(&mut self, now_ms: u64) {
        match self.state {
            SessionState::Playing => {
                self.state = SessionState::Paused;
                self.pause_started = Some(now_ms);
            }
            SessionState::Paused => {
                self.state = SessionState::Playing;
                // Paused time never counts against any deadline
                if let Some(started) = self.pause_started.take() {
                    let delta = now_ms.saturating_sub(started);
                    self.next_drop_at += delta;
                    self.gravity.defer(delta);
                    self.clear.defer(delta);
                }
            }
            SessionState::GameOver => {}
        }
    }

    pub fn restart(&mut self, now_ms: u64) {
        *self = Self::new(now_ms);
    }

    /// One scheduled fall step; awards nothing
    fn gravity_step(&mut self, now_ms: u64) {
        let Some(piece) = self.current.as_mut() else {
            return;
        };
        if !piece.try_step(&self.grid, self.gravity.direction()) {
            self.lock(now_ms);
        }
    }

    /// Merge the piece into the grid. A bomb piece marks the rounded
    /// centroid of its cells as the bomb block. Hands off to the clear
    /// engine; the next spawn is deferred while a flash is pending.
    fn lock(&mut self, now_ms: u64) {
        let Some(piece) = self.current.take() else {
            return;
        };
        let bomb_cell = piece.has_bomb.then(|| piece.bomb_cell());
        for (row, col) in piece.cells() {
            let kind = if bomb_cell == Some((row, col)) {
                BlockKind::Bomb
            } else {
                BlockKind::Normal
            };
            self.grid.set(row as usize, col as usize, Cell::Filled {
                color: piece.color,
                kind,
            });
        }
        self.events.push(GameEvent::PieceLocked);

        if let Some((rows, cols)) = self.clear.begin(&self.grid, now_ms) {
            self.events.push(GameEvent::LinesFlashing { rows, cols });
        } else {
            self.spawn(now_ms);
        }
    }

    fn resolve_clear(&mut self, outcome: ClearOutcome) {
        for &(row, col) in &outcome.blasts {
            self.events.push(GameEvent::BombExploded { row, col });
        }
        if outcome.blast_cells > 0 {
            self.score.add_bomb_bonus(outcome.blast_cells);
        }
        let result = self.score.add_clear(outcome.lines);
        tracing::debug!(
            lines = outcome.lines,
            delta = result.delta,
            "clear resolved"
        );
        self.events.push(GameEvent::LinesCleared {
            count: outcome.lines,
            score_delta: result.delta,
        });
        if let Some(level) = result.new_level {
            tracing::info!(level, "level up");
            self.events.push(GameEvent::LevelUp { level });
        }
    }

    /// Promote the queued piece and draw a new one. A colliding spawn is
    /// the sole game-over trigger; the grid is left untouched.
    fn spawn(&mut self, now_ms: u64) {
        let mut piece = std::mem::replace(&mut self.next, self.factory.next());
        piece.place_at_spawn(self.gravity.direction());
        if self.grid.collides(&piece.shape, piece.x, piece.y) {
            self.state = SessionState::GameOver;
            tracing::info!(
                score = self.score.points,
                level = self.score.level,
                "game over"
            );
            self.events.push(GameEvent::GameOver {
                score: self.score.points,
                level: self.score.level,
            });
            return;
        }
        self.current = Some(piece);
        self.next_drop_at = now_ms + self.score.drop_interval_ms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clear::{FLASH_TICK_MS, FLASH_TICKS};
    use crate::grid::{COLS, ROWS};
    use crate::gravity::{SHIFT_INTERVAL_MS, WARNING_LEAD_MS};
    use ratatui::style::Color;

    fn session() -> GameSession {
        GameSession::with_seed(1, 0)
    }

    fn i_piece() -> Piece {
        Piece::new(vec![vec![1, 1, 1, 1]], Color::Cyan, false)
    }

    fn filled() -> Cell {
        Cell::Filled {
            color: Color::Gray,
            kind: BlockKind::Normal,
        }
    }

    /// Drive the flash phase to completion, starting from `now`
    fn run_flash(session: &mut GameSession, now: &mut u64) {
        for _ in 0..=FLASH_TICKS {
            *now += FLASH_TICK_MS;
            session.tick(*now);
        }
    }

    #[test]
    fn move_and_rotate_emit_events() {
        let mut session = session();
        session.move_piece(1);
        session.rotate_piece();
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::PieceMoved));
        assert!(events.contains(&GameEvent::PieceRotated));
    }

    #[test]
    fn rejected_move_emits_nothing() {
        let mut session = session();
        let piece = session.current.as_mut().unwrap();
        piece.x = 0;
        session.move_piece(-1);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn hard_drop_locks_and_awards_two_points_per_cell() {
        let mut session = session();
        session.current = Some(i_piece());
        session.current.as_mut().unwrap().place_at_spawn(Gravity::Down);
        session.hard_drop();
        assert_eq!(session.score.points, 2 * (ROWS as u64 - 1));
        assert!(session.drain_events().contains(&GameEvent::PieceLocked));
        // The piece merged into the grid at the floor
        assert!(session.grid.get(ROWS as i32 - 1, 3).unwrap().is_filled());
    }

    #[test]
    fn filling_the_bottom_row_flashes_then_clears() {
        let mut session = session();
        for col in 2..COLS {
            session.grid.set(ROWS - 1, col, filled());
        }
        // A 2-wide piece completes the row
        let mut piece = Piece::new(vec![vec![1, 1]], Color::Yellow, false);
        piece.x = 0;
        piece.y = 0;
        session.current = Some(piece);
        session.hard_drop();

        let events = session.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::LinesFlashing { rows, cols } if rows == &[ROWS - 1] && cols.is_empty()
        )));
        // No piece in play while the flash is pending
        assert!(session.current.is_none());
        assert!(session.clear.is_flashing());

        let mut now = 0;
        run_flash(&mut session, &mut now);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LinesCleared {
            count: 1,
            score_delta: 100
        }));
        // Flash resolved: cleared, spawned, back to normal play
        assert!(session.current.is_some());
        assert!((0..COLS).all(|c| session.grid.get(ROWS as i32 - 1, c as i32).unwrap().is_empty()));
    }

    #[test]
    fn colliding_spawn_is_game_over_and_grid_is_untouched() {
        let mut session = session();
        // Block the center of the spawn rows without completing any line;
        // every shape mask has a set cell in its first row within these
        // columns when centered
        for row in 0..2 {
            for col in 3..=6 {
                session.grid.set(row, col, filled());
            }
        }
        let before = session.grid.clone();
        let mut piece = i_piece();
        piece.x = 3;
        piece.y = 10;
        session.current = Some(piece);
        session.hard_drop();

        assert_eq!(session.state, SessionState::GameOver);
        let events = session.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
        // The spawn blockade is exactly as it was
        for row in 0..2 {
            for col in 3..=6 {
                assert_eq!(
                    session.grid.get(row, col),
                    before.get(row, col)
                );
            }
        }
        // Frozen: commands mutate nothing further
        session.move_piece(1);
        session.soft_drop();
        session.tick(1_000_000);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn gravity_warning_then_shift_events() {
        let mut session = session();
        session.tick(SHIFT_INTERVAL_MS - WARNING_LEAD_MS);
        assert!(session
            .drain_events()
            .contains(&GameEvent::GravityShiftWarning));
        session.tick(SHIFT_INTERVAL_MS);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::GravityShifted {
            direction: Gravity::Up
        }));
        assert_eq!(session.gravity_direction(), Gravity::Up);
    }

    #[test]
    fn gravity_shift_precedes_the_drop_in_the_same_tick() {
        let mut session = session();
        session.current = Some(i_piece());
        let piece = session.current.as_mut().unwrap();
        piece.x = 3;
        piece.y = 10;
        // Both the shift and the drop timer are due at this timestamp
        session.next_drop_at = SHIFT_INTERVAL_MS;
        session.tick(SHIFT_INTERVAL_MS);
        // Shift mirrored y to 7, then the drop stepped upward to 6
        assert_eq!(session.current.as_ref().unwrap().y, 6);
    }

    #[test]
    fn gravity_shift_waits_for_a_pending_flash() {
        let mut session = session();
        for col in 1..COLS {
            session.grid.set(ROWS - 1, col, filled());
        }
        let mut piece = Piece::new(vec![vec![1]], Color::Green, false);
        piece.x = 0;
        piece.y = 0;
        session.current = Some(piece);
        // Lock just before the shift deadline
        session.last_tick_ms = SHIFT_INTERVAL_MS - 10;
        session.hard_drop();
        assert!(session.clear.is_flashing());
        session.drain_events();

        // The deadline passes mid-flash; no shift yet
        session.tick(SHIFT_INTERVAL_MS + 50);
        assert!(!session
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::GravityShifted { .. })));
        assert_eq!(session.gravity_direction(), Gravity::Down);

        let mut now = SHIFT_INTERVAL_MS + 50;
        run_flash(&mut session, &mut now);
        session.tick(now + 1);
        assert!(session
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::GravityShifted { .. })));
    }

    #[test]
    fn pause_defers_every_deadline() {
        let mut session = session();
        let drop_at = session.next_drop_at;
        session.toggle_pause(100);
        // Ticks during the pause do nothing
        session.tick(drop_at + 5_000);
        assert_eq!(session.current.as_ref().unwrap().y, 0);
        session.toggle_pause(100 + 5_000);
        assert_eq!(session.next_drop_at, drop_at + 5_000);
        session.tick(session.next_drop_at);
        assert_eq!(session.current.as_ref().unwrap().y, 1);
    }

    #[test]
    fn scheduled_drop_steps_the_piece() {
        let mut session = session();
        let y0 = session.current.as_ref().unwrap().y;
        session.tick(session.next_drop_at);
        assert_eq!(session.current.as_ref().unwrap().y, y0 + 1);
    }

    #[test]
    fn bomb_piece_marks_its_centroid_on_lock() {
        let mut session = session();
        let mut piece = Piece::new(vec![vec![1, 1], vec![1, 1]], Color::Yellow, true);
        piece.x = 4;
        piece.y = 0;
        session.current = Some(piece);
        session.hard_drop();
        // O mask centroid (0.5, 0.5) rounds to (1, 1) within the mask
        assert!(session
            .grid
            .get(ROWS as i32 - 1, 5)
            .unwrap()
            .is_bomb());
        assert!(!session.grid.get(ROWS as i32 - 2, 4).unwrap().is_bomb());
    }

    #[test]
    fn level_up_event_fires_at_the_boundary() {
        let mut session = session();
        session.score.lines = 9;
        for col in 1..COLS {
            session.grid.set(ROWS - 1, col, filled());
        }
        let mut piece = Piece::new(vec![vec![1]], Color::Green, false);
        piece.x = 0;
        session.current = Some(piece);
        session.hard_drop();
        let mut now = 0;
        run_flash(&mut session, &mut now);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
    }
}
