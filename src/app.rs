//! App: headless main loop, frame timing and command feeding.

use crate::{GameConfig, start_game};
use crate::autopilot::Policy;
use crate::game::{DeathCause, GameEvent, Simulation};
use crate::scheduler::Clock;
use anyhow::{Result, ensure};
use log::{debug, info};
use std::thread;
use std::time::Duration;

/// How the loop is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after this much game time even if the game is still running.
    pub max_ms: u64,
    /// The policy is consulted once every this many frames.
    pub frames_per_command: u32,
    /// Sleep after every frame. `None` runs as fast as possible.
    pub frame_delay: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_ms: 10 * 60 * 1_000,
            frames_per_command: 6,
            frame_delay: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GameOver,
    TimeLimit,
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub score: i64,
    pub kills: u32,
    pub lines_cleared: u32,
    pub frames: u64,
    pub elapsed_ms: u64,
    pub reason: StopReason,
}

pub struct App<C: Clock, P: Policy> {
    options: RunOptions,
    clock: C,
    policy: P,
    state: Simulation,
    start_ms: u64,
    frames: u64,
}

impl<C: Clock, P: Policy> App<C, P> {
    pub fn new(config: &GameConfig, options: RunOptions, mut clock: C, policy: P) -> Result<Self> {
        ensure!(config.physics_interval_ms > 0, "physics interval must be positive");
        ensure!(config.gravity_interval_ms() > 0, "gravity interval must be positive");
        ensure!(options.frames_per_command > 0, "frames per command must be positive");
        let start = clock.now_ms();
        Ok(Self {
            options,
            clock,
            policy,
            state: start_game(config, start),
            start_ms: start,
            frames: 0,
        })
    }

    pub fn state(&self) -> &Simulation {
        &self.state
    }

    /// One frame: maybe feed a command, then advance the simulation.
    /// Returns the frame timestamp.
    pub fn frame(&mut self) -> u64 {
        let now = self.clock.now_ms();
        if self.frames % u64::from(self.options.frames_per_command) == 0 {
            if let Some(command) = self.policy.choose_command(&self.state) {
                self.state.apply(command);
            }
        }
        self.state.advance(now);
        self.frames += 1;
        for event in self.state.drain_events() {
            log_event(&event);
        }
        now
    }

    /// Run frames until game over or the time limit.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut elapsed = 0;
        let reason = loop {
            if self.state.is_game_over() {
                break StopReason::GameOver;
            }
            if elapsed >= self.options.max_ms {
                break StopReason::TimeLimit;
            }
            let now = self.frame();
            elapsed = now.saturating_sub(self.start_ms);
            if let Some(delay) = self.options.frame_delay {
                thread::sleep(delay);
            }
        };
        let summary = RunSummary {
            score: self.state.score(),
            kills: self.state.kills(),
            lines_cleared: self.state.lines_cleared(),
            frames: self.frames,
            elapsed_ms: elapsed,
            reason,
        };
        info!(
            "run finished ({:?}): score={} kills={} lines={} frames={}",
            summary.reason, summary.score, summary.kills, summary.lines_cleared, summary.frames
        );
        Ok(summary)
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::AgentKilled { id, cell, cause } => {
            let how = match cause {
                DeathCause::Crush => "crushed",
                DeathCause::Encasement => "encased",
            };
            debug!("{id} {how} at ({}, {})", cell.x, cell.y);
        }
        GameEvent::LinesCleared { lines, reward } => info!("cleared {lines} line(s): +{reward}"),
        GameEvent::Penalty { kills, points } => info!("{kills} kill(s): -{points}"),
        GameEvent::GameOver { score, kills } => info!("game over: score={score} kills={kills}"),
        GameEvent::PieceSpawned { .. }
        | GameEvent::PieceLocked { .. }
        | GameEvent::AgentsSpawned { .. } => {}
    }
}
