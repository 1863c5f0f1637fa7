//! The occasional bonus fruit. It lives on emptied path cells, is worth a
//! flat score and has no bearing on the pellet count or the win condition.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{MazeGrid, Pos, Tile};
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    pub enabled: bool,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
    pub lifetime_ms: u64,
    pub score: u32,
    /// Power-mode time granted on pickup; opens a window if none is running.
    pub power_boost_ms: u64,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_wait_ms: 42_000,
            max_wait_ms: 77_000,
            lifetime_ms: 18_000,
            score: 200,
            power_boost_ms: 2_800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusEvent {
    Spawned(Pos),
    Expired(Pos),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bonus {
    config: BonusConfig,
    cell: Option<Pos>,
    lifetime_left: Duration,
    spawn_in: Duration,
}

impl Bonus {
    pub fn new(config: BonusConfig, rng: &mut dyn RandomSource) -> Self {
        Self {
            config,
            cell: None,
            lifetime_left: Duration::ZERO,
            spawn_in: roll_wait(&config, rng),
        }
    }

    pub fn cell(&self) -> Option<Pos> {
        self.cell
    }

    pub fn tick(
        &mut self,
        delta: Duration,
        grid: &MazeGrid,
        occupied: &[Pos],
        rng: &mut dyn RandomSource,
    ) -> Option<BonusEvent> {
        if !self.config.enabled {
            return None;
        }
        if let Some(cell) = self.cell {
            self.lifetime_left = self.lifetime_left.saturating_sub(delta);
            if self.lifetime_left.is_zero() {
                self.cell = None;
                self.spawn_in = roll_wait(&self.config, rng);
                return Some(BonusEvent::Expired(cell));
            }
            return None;
        }

        self.spawn_in = self.spawn_in.saturating_sub(delta);
        if !self.spawn_in.is_zero() {
            return None;
        }
        self.spawn_in = roll_wait(&self.config, rng);

        let candidates: Vec<Pos> = grid
            .cells_of(Tile::Path)
            .into_iter()
            .filter(|cell| !occupied.contains(cell))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let cell = candidates[rng.index(candidates.len())];
        self.cell = Some(cell);
        self.lifetime_left = Duration::from_millis(self.config.lifetime_ms);
        debug!(%cell, "bonus_spawned");
        Some(BonusEvent::Spawned(cell))
    }

    /// Points for the player reaching `cell`, if the bonus sits there.
    pub fn try_collect(&mut self, cell: Pos, rng: &mut dyn RandomSource) -> Option<u32> {
        if self.cell != Some(cell) {
            return None;
        }
        self.cell = None;
        self.lifetime_left = Duration::ZERO;
        self.spawn_in = roll_wait(&self.config, rng);
        Some(self.config.score)
    }

    pub fn power_boost(&self) -> Duration {
        Duration::from_millis(self.config.power_boost_ms)
    }

    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.cell = None;
        self.lifetime_left = Duration::ZERO;
        self.spawn_in = roll_wait(&self.config, rng);
    }
}

fn roll_wait(config: &BonusConfig, rng: &mut dyn RandomSource) -> Duration {
    let span = config.max_wait_ms.saturating_sub(config.min_wait_ms) as usize;
    Duration::from_millis(config.min_wait_ms + rng.index(span + 1) as u64)
}
