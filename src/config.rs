use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bonus::BonusConfig;
use crate::collision::CAPTURE_RADIUS;
use crate::error::ConfigError;
use crate::ghost::PURSUIT_CHANCE;
use crate::lifecycle::RESPAWN_DELAY;
use crate::pellets::Scoring;
use crate::power::POWER_DURATION;

pub const DEFAULT_LIVES: u32 = 3;
pub const PLAYER_SPEED: f32 = 6.0;
pub const GHOST_SPEED: f32 = 5.0;
pub const GHOST_RELEASE_INTERVAL_MS: u64 = 2000;

/// Tuning for one chase session. Speeds are in cells per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub lives: u32,
    pub player_speed: f32,
    pub ghost_speed: f32,
    pub power_duration_ms: u64,
    pub respawn_delay_ms: u64,
    /// Ghost `i` starts moving `i * ghost_release_interval_ms` after the
    /// session starts or play resumes.
    pub ghost_release_interval_ms: u64,
    /// How long an eaten ghost sits at its spawn cell. Defaults to the
    /// respawn delay.
    pub ghost_return_ms: u64,
    pub capture_radius: f32,
    pub pursuit_chance: f32,
    pub scoring: Scoring,
    pub bonus: BonusConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            lives: DEFAULT_LIVES,
            player_speed: PLAYER_SPEED,
            ghost_speed: GHOST_SPEED,
            power_duration_ms: POWER_DURATION.as_millis() as u64,
            respawn_delay_ms: RESPAWN_DELAY.as_millis() as u64,
            ghost_release_interval_ms: GHOST_RELEASE_INTERVAL_MS,
            ghost_return_ms: RESPAWN_DELAY.as_millis() as u64,
            capture_radius: CAPTURE_RADIUS,
            pursuit_chance: PURSUIT_CHANCE,
            scoring: Scoring::default(),
            bonus: BonusConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lives == 0 {
            return Err(ConfigError::NoLives);
        }
        for (field, value) in [
            ("player_speed", self.player_speed),
            ("ghost_speed", self.ghost_speed),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.power_duration_ms == 0 {
            return Err(ConfigError::ZeroPowerDuration);
        }
        if !(self.capture_radius > 0.0 && self.capture_radius <= 1.0) {
            return Err(ConfigError::CaptureRadius(self.capture_radius));
        }
        if !(0.0..=1.0).contains(&self.pursuit_chance) {
            return Err(ConfigError::PursuitChance(self.pursuit_chance));
        }
        if self.bonus.min_wait_ms > self.bonus.max_wait_ms {
            return Err(ConfigError::BonusWindow {
                min_ms: self.bonus.min_wait_ms,
                max_ms: self.bonus.max_wait_ms,
            });
        }
        Ok(())
    }

    pub fn power_duration(&self) -> Duration {
        Duration::from_millis(self.power_duration_ms)
    }

    pub fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }

    pub fn ghost_return(&self) -> Duration {
        Duration::from_millis(self.ghost_return_ms)
    }

    pub fn release_delay(&self, ghost: usize) -> Duration {
        Duration::from_millis(self.ghost_release_interval_ms * ghost as u64)
    }
}
