//! Seams to the rest of the game: where rewards go and where the best score
//! for this mini-game is kept.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub trait RewardSink {
    fn add_coins(&mut self, amount: u32);
    fn add_xp(&mut self, amount: u32);
}

pub trait HighScoreStore {
    fn high_score(&self) -> u32;
    fn record(&mut self, score: u32) -> Result<(), StoreError>;
}

/// What a finished session pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub coins: u32,
    pub xp: u32,
}

impl Reward {
    pub fn from_score(score: u32) -> Self {
        Self {
            coins: (score / 10).max(1),
            xp: (score / 10).max(5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRewards {
    pub coins: u32,
    pub xp: u32,
    pub payouts: u32,
}

impl RewardSink for MemoryRewards {
    fn add_coins(&mut self, amount: u32) {
        self.coins += amount;
        self.payouts += 1;
    }

    fn add_xp(&mut self, amount: u32) {
        self.xp += amount;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryHighScores {
    pub best: u32,
}

impl MemoryHighScores {
    pub fn new(best: u32) -> Self {
        Self { best }
    }
}

impl HighScoreStore for MemoryHighScores {
    fn high_score(&self) -> u32 {
        self.best
    }

    fn record(&mut self, score: u32) -> Result<(), StoreError> {
        self.best = self.best.max(score);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: u32,
}

/// High score kept in a small JSON file, replaced atomically on write.
#[derive(Debug, Clone)]
pub struct JsonHighScores {
    path: PathBuf,
    best: u32,
}

impl JsonHighScores {
    /// Opens the store; a missing file means no score yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let best = match fs::read_to_string(&path) {
            Ok(text) => {
                serde_json::from_str::<HighScoreFile>(&text)
                    .map_err(|source| StoreError::Format {
                        path: path.clone(),
                        source,
                    })?
                    .high_score
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, best })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonHighScores {
    fn high_score(&self) -> u32 {
        self.best
    }

    fn record(&mut self, score: u32) -> Result<(), StoreError> {
        if score <= self.best {
            return Ok(());
        }
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let data = serde_json::to_vec_pretty(&HighScoreFile { high_score: score }).map_err(|source| {
            StoreError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        self.best = score;
        Ok(())
    }
}
