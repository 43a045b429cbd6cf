//! Lemtris — falling blocks, line clears release lemmings, don't crush them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lemtris::app::{App, RunOptions, StopReason};
use lemtris::autopilot::RandomPolicy;
use lemtris::highscores::{self, LEADERBOARD_LEN, ScoreEntry, ScoreStore};
use lemtris::scheduler::{SystemClock, VirtualClock};
use lemtris::{Difficulty, GameConfig, PHYSICS_INTERVAL_MS};
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

/// Frame pacing for `--realtime`, roughly 60 Hz.
const FRAME_MS: u64 = 16;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let store = match args.scores_file {
        Some(path) => ScoreStore::new(path),
        None => ScoreStore::open_default()?,
    };
    match args.command {
        Cmd::Play(play) => run_play(&play, &store),
        Cmd::Scores { limit } => show_scores(&store, limit),
    }
}

/// Falling-block puzzle with lemmings, played headless by an autopilot.
#[derive(Debug, Parser)]
#[command(
    name = "lemtris",
    version,
    about = "Falling-block puzzle where clearing lines releases lemmings you must not crush.",
    long_about = "Lemtris is a falling-block puzzle with a twist.\n\n\
        Every cleared line releases a lemming that falls onto the stack and walks along it. \
        Clearing lines with many lemmings alive multiplies the reward (up to 5x with 20 alive), \
        but locking a piece on top of lemmings costs floor(k^4.2 * 20) points for k kills.\n\n\
        The `play` command runs one game with a seeded random autopilot and can record the \
        result; `scores` prints the two leaderboards."
)]
pub struct Args {
    /// Score file (JSON array). Defaults to $XDG_CONFIG_HOME/lemtris/scores.json.
    #[arg(long, global = true, value_name = "FILE")]
    pub scores_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Play one game with the autopilot and print the result.
    Play(PlayArgs),
    /// Show the top scores and top killers.
    Scores {
        /// Rows per leaderboard.
        #[arg(short, long, default_value_t = LEADERBOARD_LEN)]
        limit: usize,
    },
}

#[derive(Debug, clap::Args)]
pub struct PlayArgs {
    /// Difficulty: easy (800 ms gravity), medium (500 ms), hard (250 ms).
    #[arg(short, long, default_value = "easy")]
    pub difficulty: Difficulty,

    /// Seed for pieces, lemmings and the autopilot. Random if not set.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Override the gravity interval in ms.
    #[arg(long, value_name = "MS")]
    pub gravity_ms: Option<u64>,

    /// Lemming physics interval in ms.
    #[arg(long, default_value_t = PHYSICS_INTERVAL_MS, value_name = "MS")]
    pub physics_ms: u64,

    /// Stop after this many seconds of game time.
    #[arg(long, default_value = "600", value_name = "SECS")]
    pub max_seconds: u64,

    /// Autopilot acts once every N frames.
    #[arg(long, default_value = "6", value_name = "N")]
    pub frames_per_command: u32,

    /// Run on the wall clock instead of simulated 60 Hz frames.
    #[arg(long)]
    pub realtime: bool,

    /// Record the result under this player name.
    #[arg(short, long)]
    pub name: Option<String>,
}

fn run_play(play: &PlayArgs, store: &ScoreStore) -> Result<()> {
    let seed = play.seed.unwrap_or_else(rand::random);
    let config = GameConfig {
        difficulty: play.difficulty,
        seed: Some(seed),
        physics_interval_ms: play.physics_ms,
        gravity_interval_ms: play.gravity_ms,
    };
    let options = RunOptions {
        max_ms: play.max_seconds.saturating_mul(1_000),
        frames_per_command: play.frames_per_command,
        frame_delay: play.realtime.then(|| Duration::from_millis(FRAME_MS)),
    };
    let policy = RandomPolicy::new(seed.rotate_left(17));
    let summary = if play.realtime {
        App::new(&config, options, SystemClock::new(), policy)?.run()?
    } else {
        App::new(&config, options, VirtualClock::sixty_hz(), policy)?.run()?
    };

    let ended = match summary.reason {
        StopReason::GameOver => "game over",
        StopReason::TimeLimit => "time limit",
    };
    println!(
        "{ended} after {:.1}s (seed {seed}): score {}, kills {}, lines {}",
        summary.elapsed_ms as f64 / 1_000.0,
        summary.score,
        summary.kills,
        summary.lines_cleared
    );

    if let Some(name) = &play.name {
        let entry = ScoreEntry::today(name.clone(), summary.score, summary.kills, play.difficulty);
        store
            .append(entry)
            .with_context(|| format!("saving score to {}", store.path().display()))?;
        println!("saved to {}", store.path().display());
    }
    Ok(())
}

fn show_scores(store: &ScoreStore, limit: usize) -> Result<()> {
    let entries = store.load().unwrap_or_else(|e| {
        warn!("{e}; showing empty leaderboards");
        Vec::new()
    });

    println!("Top scores");
    for (i, e) in highscores::top_by_score(&entries, limit).iter().enumerate() {
        println!("{:>2}. {:<16} {:>8}  {:<6} {}", i + 1, e.name, e.score, e.difficulty, e.date);
    }
    println!();
    println!("Top killers");
    for (i, e) in highscores::top_by_kills(&entries, limit).iter().enumerate() {
        println!("{:>2}. {:<16} {:>8}  {:<6} {}", i + 1, e.name, e.kills, e.difficulty, e.date);
    }
    Ok(())
}
