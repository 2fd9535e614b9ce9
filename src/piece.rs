//! Active falling piece logic

use crate::grid::{COLS, Gravity, Grid};
use ratatui::style::Color;

/// An active falling piece: a rectangular binary mask anchored by its
/// top-left corner in grid coordinates. Exactly one piece is falling at a
/// time; it is not written into the grid until it locks.
#[derive(Debug, Clone)]
pub struct Piece {
    /// Rectangular 0/1 mask, `shape[row][col]`
    pub shape: Vec<Vec<u8>>,
    pub color: Color,
    /// Column of the mask's top-left corner
    pub x: i32,
    /// Row of the mask's top-left corner
    pub y: i32,
    /// Whether this piece carries a bomb block
    pub has_bomb: bool,
}

impl Piece {
    pub fn new(shape: Vec<Vec<u8>>, color: Color, has_bomb: bool) -> Self {
        Self {
            shape,
            color,
            x: 0,
            y: 0,
            has_bomb,
        }
    }

    pub fn width(&self) -> usize {
        self.shape.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.shape.len()
    }

    /// Center horizontally and sit at the spawn edge for the current
    /// gravity direction.
    pub fn place_at_spawn(&mut self, gravity: Gravity) {
        self.x = ((COLS - self.width()) / 2) as i32;
        self.y = gravity.spawn_row(self.height());
    }

    /// Absolute (row, col) of every set cell
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(r, row)| {
            row.iter().enumerate().filter_map(move |(c, &bit)| {
                (bit != 0).then(|| (self.y + r as i32, self.x + c as i32))
            })
        })
    }

    /// Try to translate horizontally, returns true if successful
    pub fn try_move(&mut self, grid: &Grid, dx: i32) -> bool {
        if grid.collides(&self.shape, self.x + dx, self.y) {
            false
        } else {
            self.x += dx;
            true
        }
    }

    /// The mask rotated 90 degrees: transpose with row order reversed,
    /// `rotated[c][r] = shape[rows - 1 - r][c]`.
    pub fn rotated_shape(&self) -> Vec<Vec<u8>> {
        let rows = self.height();
        let cols = self.width();
        let mut rotated = vec![vec![0u8; rows]; cols];
        for r in 0..rows {
            for c in 0..cols {
                rotated[c][rows - 1 - r] = self.shape[r][c];
            }
        }
        rotated
    }

    /// Try to rotate in place. There is no wall-kick fallback: rotation
    /// simply fails near a boundary.
    pub fn try_rotate(&mut self, grid: &Grid) -> bool {
        let rotated = self.rotated_shape();
        if grid.collides(&rotated, self.x, self.y) {
            false
        } else {
            self.shape = rotated;
            true
        }
    }

    /// Move one cell in the fall direction, returns true if successful
    pub fn try_step(&mut self, grid: &Grid, gravity: Gravity) -> bool {
        let dy = gravity.step();
        if grid.collides(&self.shape, self.x, self.y + dy) {
            false
        } else {
            self.y += dy;
            true
        }
    }

    /// Step until contact and return the distance travelled
    pub fn drop_to_floor(&mut self, grid: &Grid, gravity: Gravity) -> u32 {
        let mut distance = 0;
        while self.try_step(grid, gravity) {
            distance += 1;
        }
        distance
    }

    /// Absolute (row, col) of the rounded centroid of the set cells; the
    /// cell a bomb piece marks when it locks.
    pub fn bomb_cell(&self) -> (i32, i32) {
        let mut count = 0u32;
        let mut row_sum = 0i32;
        let mut col_sum = 0i32;
        for (r, row) in self.shape.iter().enumerate() {
            for (c, &bit) in row.iter().enumerate() {
                if bit != 0 {
                    count += 1;
                    row_sum += r as i32;
                    col_sum += c as i32;
                }
            }
        }
        let r = (f64::from(row_sum) / f64::from(count)).round() as i32;
        let c = (f64::from(col_sum) / f64::from(count)).round() as i32;
        (self.y + r, self.x + c)
    }
}
