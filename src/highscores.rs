//! Persist score records to disk (XDG config or ~/.config/lemtris) as a JSON array.
//!
//! The file is only ever rewritten whole: read every record, append one,
//! write every record back. Leaderboards are derived views, never stored.

use crate::Difficulty;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DIR_NAME: &str = "lemtris";
const FILENAME: &str = "scores.json";

/// Rows shown on each leaderboard.
pub const LEADERBOARD_LEN: usize = 10;

/// One finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: i64,
    pub kills: u32,
    pub difficulty: Difficulty,
    pub date: String,
}

impl ScoreEntry {
    /// Entry dated today (UTC).
    pub fn today(name: impl Into<String>, score: i64, kills: u32, difficulty: Difficulty) -> Self {
        Self {
            name: name.into(),
            score,
            kills,
            difficulty,
            date: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScoreStoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed score file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not determine a config directory (set HOME or XDG_CONFIG_HOME)")]
    NoConfigDir,
}

/// Returns the default path of the score file (config dir / lemtris / scores.json).
pub fn default_path() -> Result<PathBuf, ScoreStoreError> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .map_err(|_| ScoreStoreError::NoConfigDir)?,
    };
    Ok(base.join(DIR_NAME).join(FILENAME))
}

/// Score records stored under one fixed path.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    path: PathBuf,
}

impl ScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self, ScoreStoreError> {
        default_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in insertion order. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<ScoreEntry>, ScoreStoreError> {
        let content = match fs::read(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ScoreStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&content).map_err(|source| ScoreStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Read every record, append `entry`, write every record back.
    /// Creates the config directory if needed.
    pub fn append(&self, entry: ScoreEntry) -> Result<(), ScoreStoreError> {
        let mut entries = self.load()?;
        entries.push(entry);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ScoreStoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_vec_pretty(&entries).map_err(|source| ScoreStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| ScoreStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Best `n` entries by score, highest first. Ties keep insertion order.
pub fn top_by_score(entries: &[ScoreEntry], n: usize) -> Vec<ScoreEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted.truncate(n);
    sorted
}

/// Best `n` entries by kills, highest first. Ties keep insertion order.
pub fn top_by_kills(entries: &[ScoreEntry], n: usize) -> Vec<ScoreEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.kills.cmp(&a.kills));
    sorted.truncate(n);
    sorted
}
