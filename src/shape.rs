//! Shape model: the 7 kinds, occupancy matrices, clockwise rotation, spawn rule.

use crate::grid::{COLS, ColorTag, Pos};

/// Shape kinds (I, J, L, O, S, T, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl ShapeKind {
    pub const ALL: [Self; 7] = [Self::I, Self::J, Self::L, Self::O, Self::S, Self::T, Self::Z];

    /// Spawn-orientation occupancy, row-major, top row first.
    pub fn matrix(self) -> Matrix {
        let rows: &[&[u8]] = match self {
            Self::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            Self::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
        };
        Matrix::from_rows(rows)
    }

    pub fn color(self) -> ColorTag {
        ColorTag(self as u8)
    }
}

/// 2-D occupancy matrix. Immutable; rotation returns a new matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matrix {
    rows: Vec<Vec<bool>>,
}

impl Matrix {
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|&v| v != 0).collect())
                .collect(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, dx: usize, dy: usize) -> bool {
        self.rows.get(dy).and_then(|row| row.get(dx)).copied().unwrap_or(false)
    }

    /// Offsets `(dx, dy)` of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, occupied)| **occupied)
                .map(move |(dx, _)| (dx as i32, dy as i32))
        })
    }

    /// Clockwise 90° turn: transpose, then reverse each resulting row.
    pub fn rotated_cw(&self) -> Self {
        let height = self.height();
        let rows = (0..self.width())
            .map(|i| (0..height).rev().map(|j| self.rows[j][i]).collect())
            .collect();
        Self { rows }
    }
}

/// The falling piece: kind, current (possibly rotated) matrix and top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: ShapeKind,
    pub matrix: Matrix,
    pub pos: Pos,
}

impl ActivePiece {
    /// New piece at row 0, horizontally centred on its matrix width.
    pub fn spawn(kind: ShapeKind) -> Self {
        let matrix = kind.matrix();
        let x = (COLS / 2) as i32 - (matrix.width() / 2) as i32;
        Self {
            kind,
            matrix,
            pos: Pos::new(x, 0),
        }
    }

    pub fn color(&self) -> ColorTag {
        self.kind.color()
    }

    pub fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            pos: self.pos.offset(dx, dy),
            ..self.clone()
        }
    }

    pub fn rotated(&self) -> Self {
        Self {
            matrix: self.matrix.rotated_cw(),
            ..self.clone()
        }
    }

    /// Absolute grid cells the piece covers.
    pub fn cells(&self) -> impl Iterator<Item = Pos> + '_ {
        self.matrix.cells().map(|(dx, dy)| self.pos.offset(dx, dy))
    }
}
