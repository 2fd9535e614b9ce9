//! Game grid: occupancy matrix, collision detection, and line surgery

use ratatui::style::Color;

/// Board dimensions
pub const ROWS: usize = 18;
pub const COLS: usize = 10;

/// Special-block marker. Only meaningful on occupied cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockKind {
    #[default]
    Normal,
    Bomb,
}

/// A cell on the grid - either empty or filled with a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled { color: Color, kind: BlockKind },
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled { .. })
    }

    pub fn is_bomb(&self) -> bool {
        matches!(
            self,
            Cell::Filled {
                kind: BlockKind::Bomb,
                ..
            }
        )
    }
}

/// Effective fall direction. `Down` pulls pieces toward row `ROWS - 1`,
/// `Up` toward row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    #[default]
    Down,
    Up,
}

impl Gravity {
    pub fn flipped(self) -> Self {
        match self {
            Gravity::Down => Gravity::Up,
            Gravity::Up => Gravity::Down,
        }
    }

    /// Row delta of a single fall step.
    pub fn step(self) -> i32 {
        match self {
            Gravity::Down => 1,
            Gravity::Up => -1,
        }
    }

    /// Spawn row for a piece of the given height: pieces enter from the
    /// side gravity pulls them away from.
    pub fn spawn_row(self, height: usize) -> i32 {
        match self {
            Gravity::Down => 0,
            Gravity::Up => (ROWS - height) as i32,
        }
    }
}

/// The game grid, stored as `[row][col]` with row 0 at the top.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: [[Cell; COLS]; ROWS],
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Get the cell at (row, col). Returns None if out of bounds.
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 || row >= ROWS as i32 || col >= COLS as i32 {
            return None;
        }
        Some(self.cells[row as usize][col as usize])
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if row < ROWS && col < COLS {
            self.cells[row][col] = cell;
        }
    }

    /// Check whether a shape mask placed with its top-left corner at
    /// (x, y) overlaps the bounds or an occupied cell. The bounds check
    /// applies to both vertical directions since gravity can point either
    /// way. No side effects.
    pub fn collides(&self, mask: &[Vec<u8>], x: i32, y: i32) -> bool {
        for (r, mask_row) in mask.iter().enumerate() {
            for (c, &bit) in mask_row.iter().enumerate() {
                if bit == 0 {
                    continue;
                }
                let row = y + r as i32;
                let col = x + c as i32;
                match self.get(row, col) {
                    None => return true,
                    Some(cell) if cell.is_filled() => return true,
                    Some(_) => {}
                }
            }
        }
        false
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(Cell::is_filled)
    }

    pub fn is_col_full(&self, col: usize) -> bool {
        (0..ROWS).all(|row| self.cells[row][col].is_filled())
    }

    /// Indices of all completely occupied rows, top to bottom.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..ROWS).filter(|&r| self.is_row_full(r)).collect()
    }

    /// Indices of all completely occupied columns, left to right.
    pub fn full_cols(&self) -> Vec<usize> {
        (0..COLS).filter(|&c| self.is_col_full(c)).collect()
    }

    /// Remove the given rows and inject fresh empty rows at the edge
    /// gravity pulls new rows from (top when falling down, bottom when
    /// falling up). Relative order of the surviving rows is preserved and
    /// the row count never changes.
    pub fn remove_rows(&mut self, rows: &[usize], gravity: Gravity) {
        let kept: Vec<[Cell; COLS]> = (0..ROWS)
            .filter(|r| !rows.contains(r))
            .map(|r| self.cells[r])
            .collect();
        let empty = [Cell::Empty; COLS];
        let removed = ROWS - kept.len();
        match gravity {
            Gravity::Down => {
                for row in 0..removed {
                    self.cells[row] = empty;
                }
                for (i, row) in kept.iter().enumerate() {
                    self.cells[removed + i] = *row;
                }
            }
            Gravity::Up => {
                for (i, row) in kept.iter().enumerate() {
                    self.cells[i] = *row;
                }
                for row in kept.len()..ROWS {
                    self.cells[row] = empty;
                }
            }
        }
    }

    /// Zero every cell of a column. Row count is unaffected.
    pub fn clear_column(&mut self, col: usize) {
        for row in 0..ROWS {
            self.cells[row][col] = Cell::Empty;
        }
    }

    /// Slide the occupied cells of a column toward the gravity floor,
    /// closing any gaps while preserving their order.
    pub fn compact_column(&mut self, col: usize, gravity: Gravity) {
        let stack: Vec<Cell> = (0..ROWS)
            .map(|row| self.cells[row][col])
            .filter(Cell::is_filled)
            .collect();
        let gap = ROWS - stack.len();
        for row in 0..ROWS {
            self.cells[row][col] = Cell::Empty;
        }
        match gravity {
            Gravity::Down => {
                for (i, cell) in stack.iter().enumerate() {
                    self.cells[gap + i][col] = *cell;
                }
            }
            Gravity::Up => {
                for (i, cell) in stack.iter().enumerate() {
                    self.cells[i][col] = *cell;
                }
            }
        }
    }

    /// Clear the 3x3 neighborhood around a detonating bomb, clipped to the
    /// grid bounds. Returns how many occupied cells were cleared.
    pub fn explode(&mut self, row: usize, col: usize) -> usize {
        let mut cleared = 0;
        for dr in -1..=1i32 {
            for dc in -1..=1i32 {
                let r = row as i32 + dr;
                let c = col as i32 + dc;
                if let Some(cell) = self.get(r, c) {
                    if cell.is_filled() {
                        cleared += 1;
                        self.cells[r as usize][c as usize] = Cell::Empty;
                    }
                }
            }
        }
        cleared
    }

    /// Flip the grid vertically: row order reverses, cell contents are
    /// preserved. Used when gravity inverts.
    pub fn invert(&mut self) {
        self.cells.reverse();
    }

    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(Cell::is_empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Cell {
        Cell::Filled {
            color: Color::Cyan,
            kind: BlockKind::Normal,
        }
    }

    fn bomb() -> Cell {
        Cell::Filled {
            color: Color::Red,
            kind: BlockKind::Bomb,
        }
    }

    #[test]
    fn new_grid_is_empty() {
        assert!(Grid::new().is_empty());
    }

    #[test]
    fn collides_on_bounds_in_both_vertical_directions() {
        let grid = Grid::new();
        let mask = vec![vec![1u8]];
        assert!(grid.collides(&mask, -1, 0));
        assert!(grid.collides(&mask, COLS as i32, 0));
        assert!(grid.collides(&mask, 0, -1));
        assert!(grid.collides(&mask, 0, ROWS as i32));
        assert!(!grid.collides(&mask, 0, 0));
        assert!(!grid.collides(&mask, COLS as i32 - 1, ROWS as i32 - 1));
    }

    #[test]
    fn collides_on_occupied_cells_only_where_mask_is_set() {
        let mut grid = Grid::new();
        grid.set(5, 5, filled());
        let mask = vec![vec![0u8, 1], vec![1, 1]];
        // Set cells land on (5,6), (6,5), (6,6) - the zero at (5,5) is ignored
        assert!(!grid.collides(&mask, 5, 5));
        // Anchored at (4,4) the (1,1) bit covers the occupied (5,5)
        assert!(grid.collides(&mask, 4, 4));
    }

    #[test]
    fn remove_rows_injects_empty_row_at_top_when_falling_down() {
        let mut grid = Grid::new();
        for col in 0..COLS {
            grid.set(ROWS - 1, col, filled());
        }
        grid.set(ROWS - 2, 0, filled());
        grid.remove_rows(&[ROWS - 1], Gravity::Down);
        // The marker block slid down one row, top row is fresh
        assert!(grid.get(ROWS as i32 - 1, 0).unwrap().is_filled());
        assert!(grid.get(ROWS as i32 - 2, 0).unwrap().is_empty());
        assert!((0..COLS).all(|c| grid.get(0, c as i32).unwrap().is_empty()));
    }

    #[test]
    fn remove_rows_injects_empty_row_at_bottom_when_falling_up() {
        let mut grid = Grid::new();
        for col in 0..COLS {
            grid.set(0, col, filled());
        }
        grid.set(1, 3, filled());
        grid.remove_rows(&[0], Gravity::Up);
        assert!(grid.get(0, 3).unwrap().is_filled());
        assert!((0..COLS).all(|c| grid.get(ROWS as i32 - 1, c as i32).unwrap().is_empty()));
    }

    #[test]
    fn remove_rows_preserves_relative_order() {
        let mut grid = Grid::new();
        let a = Cell::Filled {
            color: Color::Green,
            kind: BlockKind::Normal,
        };
        let b = Cell::Filled {
            color: Color::Blue,
            kind: BlockKind::Normal,
        };
        grid.set(4, 0, a);
        grid.set(6, 0, b);
        for col in 0..COLS {
            grid.set(5, col, filled());
        }
        grid.remove_rows(&[5], Gravity::Down);
        assert_eq!(grid.get(5, 0), Some(a));
        assert_eq!(grid.get(6, 0), Some(b));
    }

    #[test]
    fn clear_column_empties_it_without_changing_row_count() {
        let mut grid = Grid::new();
        for row in 0..ROWS {
            grid.set(row, 2, filled());
        }
        grid.set(9, 3, filled());
        grid.clear_column(2);
        assert!((0..ROWS).all(|r| grid.get(r as i32, 2).unwrap().is_empty()));
        assert!(grid.get(9, 3).unwrap().is_filled());
    }

    #[test]
    fn compact_column_slides_cells_toward_the_floor() {
        let mut grid = Grid::new();
        grid.set(2, 0, filled());
        grid.set(10, 0, filled());
        grid.compact_column(0, Gravity::Down);
        assert!(grid.get(ROWS as i32 - 1, 0).unwrap().is_filled());
        assert!(grid.get(ROWS as i32 - 2, 0).unwrap().is_filled());
        assert!(grid.get(2, 0).unwrap().is_empty());
        assert!(grid.get(10, 0).unwrap().is_empty());
    }

    #[test]
    fn compact_column_slides_upward_under_inverted_gravity() {
        let mut grid = Grid::new();
        grid.set(5, 1, filled());
        grid.set(12, 1, filled());
        grid.compact_column(1, Gravity::Up);
        assert!(grid.get(0, 1).unwrap().is_filled());
        assert!(grid.get(1, 1).unwrap().is_filled());
        assert!(grid.get(5, 1).unwrap().is_empty());
    }

    #[test]
    fn explode_clears_clipped_neighborhood() {
        let mut grid = Grid::new();
        // Corner bomb: only 4 cells of the 3x3 are on the grid
        for row in 0..2 {
            for col in 0..2 {
                grid.set(row, col, filled());
            }
        }
        grid.set(2, 2, filled()); // outside the blast
        let cleared = grid.explode(0, 0);
        assert_eq!(cleared, 4);
        assert!(grid.get(2, 2).unwrap().is_filled());
        assert!(grid.get(1, 1).unwrap().is_empty());
    }

    #[test]
    fn invert_reverses_row_order() {
        let mut grid = Grid::new();
        grid.set(0, 4, bomb());
        grid.invert();
        assert!(grid.get(ROWS as i32 - 1, 4).unwrap().is_bomb());
        assert!(grid.get(0, 4).unwrap().is_empty());
    }
}
