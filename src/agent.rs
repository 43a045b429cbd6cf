//! Lemmings: small agents that fall onto the stack and walk along it.
//!
//! Each physics tick an agent is first checked for encasement (its cell became
//! filled), then falls towards the first filled cell below it, and once landed
//! walks sideways, turning around at walls and obstacles.

use crate::grid::{COLS, Grid, Pos, ROWS};
use std::fmt;

/// Population cap.
pub const MAX_AGENTS: usize = 20;

/// Rows fallen per physics tick.
pub const FALL_STEP: f64 = 0.6;
/// Columns walked per physics tick.
pub const WALK_STEP: f64 = 0.07;
/// Below this distance to the resting row an agent counts as landed.
const LAND_EPSILON: f64 = 0.05;
/// Vertical bias when mapping a position to a cell; a body slightly above a
/// row boundary is judged to be in the cell below.
const CELL_EPSILON: f64 = 0.1;

/// Stable identity of an agent, assigned from a monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// What a physics step did to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStep {
    /// Agent was inside a filled cell and must be removed.
    Encased,
    /// Agent moved down towards its resting row.
    Falling,
    /// Agent stood on its resting row and walked or turned.
    Grounded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    /// Horizontal position in column units.
    pub x: f64,
    /// Vertical position in row units, 0 at the top.
    pub y: f64,
    pub direction: Direction,
    pub falling: bool,
}

/// `Math.round` semantics: halves round towards +infinity.
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

impl Agent {
    /// Fresh agent at the top of `column`, falling.
    pub fn spawn(id: AgentId, column: i32, direction: Direction) -> Self {
        Self {
            id,
            x: f64::from(column),
            y: 0.0,
            direction,
            falling: true,
        }
    }

    /// Grid cell the agent is considered to occupy.
    pub fn cell(&self) -> Pos {
        Pos::new(round_half_up(self.x), (self.y + CELL_EPSILON).floor() as i32)
    }

    /// True if the agent's cell is filled in `grid`.
    pub fn is_encased(&self, grid: &Grid) -> bool {
        let cell = self.cell();
        (0..ROWS as i32).contains(&cell.y) && grid.is_filled(cell.x, cell.y)
    }

    /// Row the agent comes to rest on: the row above the first filled cell
    /// below it, or the bottom row when the column is empty.
    pub fn resting_row(&self, grid: &Grid) -> i32 {
        let cell = self.cell();
        let ground = (cell.y + 1).max(0)..ROWS as i32;
        let floor = ground
            .into_iter()
            .find(|&y| grid.is_filled(cell.x, y))
            .unwrap_or(ROWS as i32);
        floor - 1
    }

    /// Advance one physics tick against `grid`.
    pub fn step(&mut self, grid: &Grid) -> AgentStep {
        if self.is_encased(grid) {
            return AgentStep::Encased;
        }

        let target = self.resting_row(grid);
        let target_y = f64::from(target);
        if self.y < target_y - LAND_EPSILON {
            self.falling = true;
            self.y = (self.y + FALL_STEP).min(target_y);
            return AgentStep::Falling;
        }

        self.falling = false;
        self.y = target_y;
        let step = self.direction.sign() * WALK_STEP;
        let next_x = round_half_up(self.x + step);
        // A resting row above the field has no cells to bump into.
        let blocked = next_x < 0 || next_x >= COLS as i32 || grid.is_filled(next_x, target);
        if blocked {
            self.direction = self.direction.reversed();
        } else {
            self.x += step;
        }
        AgentStep::Grounded
    }
}
