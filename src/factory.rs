//! Piece generation: weighted random shape draw with a bomb chance

use crate::piece::Piece;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Chance for a freshly drawn piece to carry a bomb block
const BOMB_CHANCE: f64 = 0.1;

/// The seven shape kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl ShapeKind {
    pub fn all() -> [ShapeKind; 7] {
        [
            ShapeKind::I,
            ShapeKind::O,
            ShapeKind::T,
            ShapeKind::S,
            ShapeKind::Z,
            ShapeKind::J,
            ShapeKind::L,
        ]
    }

    /// Binary mask with the shape in its spawn orientation
    pub fn mask(self) -> Vec<Vec<u8>> {
        match self {
            ShapeKind::I => vec![vec![1, 1, 1, 1]],
            ShapeKind::O => vec![vec![1, 1], vec![1, 1]],
            ShapeKind::T => vec![vec![1, 1, 1], vec![0, 1, 0]],
            ShapeKind::S => vec![vec![0, 1, 1], vec![1, 1, 0]],
            ShapeKind::Z => vec![vec![1, 1, 0], vec![0, 1, 1]],
            ShapeKind::J => vec![vec![1, 0, 0], vec![1, 1, 1]],
            ShapeKind::L => vec![vec![0, 0, 1], vec![1, 1, 1]],
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            ShapeKind::I => Color::Cyan,
            ShapeKind::O => Color::Yellow,
            ShapeKind::T => Color::Magenta,
            ShapeKind::S => Color::Green,
            ShapeKind::Z => Color::Red,
            ShapeKind::J => Color::Blue,
            ShapeKind::L => Color::Rgb(255, 165, 0),
        }
    }

    /// Draw weight. The skew pieces come up slightly less often.
    fn weight(self) -> u32 {
        match self {
            ShapeKind::S | ShapeKind::Z => 8,
            _ => 10,
        }
    }
}

/// Produces new falling pieces from a weighted random draw
#[derive(Debug, Clone)]
pub struct PieceFactory {
    rng: ChaCha8Rng,
    weights: WeightedIndex<u32>,
}

impl Default for PieceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceFactory {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        let weights = WeightedIndex::new(ShapeKind::all().map(ShapeKind::weight))
            .expect("shape weights are non-zero");
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            weights,
        }
    }

    /// Draw the next piece. The piece is unplaced; the session positions
    /// it at spawn time, once the gravity direction is known.
    pub fn next(&mut self) -> Piece {
        let kind = ShapeKind::all()[self.weights.sample(&mut self.rng)];
        let has_bomb = self.rng.gen_bool(BOMB_CHANCE);
        Piece::new(kind.mask(), kind.color(), has_bomb)
    }
}
