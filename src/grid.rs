//! Playfield grid: fixed ROWS x COLS cells, placement validation and row clearing.

use crate::shape::Matrix;
use std::collections::VecDeque;

/// Playfield width in cells.
pub const COLS: usize = 10;
/// Playfield height in cells.
pub const ROWS: usize = 20;

/// Colour / material tag of an occupied cell. One per shape kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTag(pub u8);

/// Single cell: either empty or filled with the tag of the piece that locked there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(ColorTag),
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Filled(_))
    }
}

/// Grid position in cell units. `x` is the column, `y` the row (0 is top).
/// Rows may be negative while a piece is still partly above the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Playfield: rows[0] is the top row. Dimensions never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: VecDeque<[Cell; COLS]>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self {
            rows: (0..ROWS).map(|_| [Cell::Empty; COLS]).collect(),
        }
    }

    /// Cell at (x, y); `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows.get(y as usize).and_then(|row| row.get(x as usize)).copied()
    }

    /// True when (x, y) is inside the field and filled.
    #[inline]
    pub fn is_filled(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_filled)
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(slot) = self.rows.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
            *slot = cell;
        }
    }

    pub fn row(&self, y: usize) -> Option<&[Cell; COLS]> {
        self.rows.get(y)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; COLS]> {
        self.rows.iter()
    }

    pub fn filled_count(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_filled()).count()
    }

    /// True if `matrix` placed with its top-left at `pos` stays inside the side walls,
    /// above the floor, and off every filled cell. Rows above the field count as free.
    pub fn is_valid_move(&self, pos: Pos, matrix: &Matrix) -> bool {
        for (dx, dy) in matrix.cells() {
            let x = pos.x + dx;
            let y = pos.y + dy;
            if x < 0 || x >= COLS as i32 || y >= ROWS as i32 {
                return false;
            }
            if y >= 0 && self.is_filled(x, y) {
                return false;
            }
        }
        true
    }

    /// Lowest row the matrix can occupy when dropped straight down from `pos`.
    pub fn landing_row(&self, pos: Pos, matrix: &Matrix) -> i32 {
        let mut y = pos.y;
        while self.is_valid_move(Pos::new(pos.x, y + 1), matrix) {
            y += 1;
        }
        y
    }

    /// Write `tag` into every cell the matrix covers at `pos`. Parts above row 0 are dropped.
    pub fn stamp(&mut self, pos: Pos, matrix: &Matrix, tag: ColorTag) {
        for (dx, dy) in matrix.cells() {
            let (x, y) = (pos.x + dx, pos.y + dy);
            if (0..ROWS as i32).contains(&y) {
                self.set(x, y, Cell::Filled(tag));
            }
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows.get(y).is_some_and(|row| row.iter().all(|c| c.is_filled()))
    }

    /// Remove every full row bottom-to-top, inserting an empty row on top for each.
    /// After a removal the same index is examined again since everything above shifted down.
    /// Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0u32;
        let mut y = ROWS;
        while y > 0 {
            let row = y - 1;
            if self.is_row_full(row) {
                self.rows.remove(row);
                self.rows.push_front([Cell::Empty; COLS]);
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        cleared
    }

    /// Build a grid from an ASCII picture, top row first; `#` is filled, anything else empty.
    /// Missing rows at the top are left empty. Intended for tests and fixtures.
    pub fn from_ascii(lines: &[&str]) -> Self {
        let mut grid = Self::new();
        let offset = ROWS.saturating_sub(lines.len());
        for (i, line) in lines.iter().enumerate().take(ROWS) {
            for (x, ch) in line.chars().enumerate().take(COLS) {
                if ch == '#' {
                    grid.set(x as i32, (offset + i) as i32, Cell::Filled(ColorTag(0)));
                }
            }
        }
        grid
    }

    /// Convert to plain rows of `Option<ColorTag>` for external observers.
    pub fn snapshot(&self) -> Vec<Vec<Option<ColorTag>>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| match c {
                        Cell::Empty => None,
                        Cell::Filled(tag) => Some(*tag),
                    })
                    .collect()
            })
            .collect()
    }
}
