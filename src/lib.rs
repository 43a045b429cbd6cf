//! Lemtris — falling-block puzzle where clearing lines releases lemmings.
//!
//! The core is [`game::Simulation`]: one owned state value advanced by
//! [`game::Simulation::advance`] with caller-supplied frame timestamps. Piece
//! gravity and agent physics run on two independent cadences; locking a piece
//! crushes any agent under it, stamps the grid, clears rows and spawns agents.

pub mod agent;
pub mod app;
pub mod autopilot;
pub mod game;
pub mod grid;
pub mod highscores;
pub mod scheduler;
pub mod scoring;
pub mod shape;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use game::{Command, DeathCause, GameEvent, Simulation};

/// Agent physics interval, independent of difficulty.
pub const PHYSICS_INTERVAL_MS: u64 = 20;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Piece gravity interval in milliseconds.
    pub fn gravity_interval_ms(self) -> u64 {
        match self {
            Self::Easy => 800,
            Self::Medium => 500,
            Self::Hard => 250,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Options that affect game behaviour (difficulty, timing, randomness).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    /// Seed for piece and agent randomness; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub physics_interval_ms: u64,
    /// Overrides the difficulty's gravity interval.
    pub gravity_interval_ms: Option<u64>,
}

impl GameConfig {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn gravity_interval_ms(&self) -> u64 {
        self.gravity_interval_ms
            .unwrap_or_else(|| self.difficulty.gravity_interval_ms())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            seed: None,
            physics_interval_ms: PHYSICS_INTERVAL_MS,
            gravity_interval_ms: None,
        }
    }
}

/// Start a new game at `now_ms`.
pub fn start_game(config: &GameConfig, now_ms: u64) -> Simulation {
    Simulation::new(config, now_ms)
}
