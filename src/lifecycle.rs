use std::time::Duration;

use serde::Serialize;
use tracing::info;

pub const RESPAWN_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Running,
    /// Actors are frozen at their start cells until the delay runs out.
    Resetting { remaining: Duration },
    Complete,
    GameOver,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::GameOver)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    phase: Phase,
    respawn_delay: Duration,
}

impl Lifecycle {
    pub fn new(respawn_delay: Duration) -> Self {
        Self {
            phase: Phase::Running,
            respawn_delay,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Takes a life. The last life ends the session on the spot, with no
    /// respawn.
    pub fn on_capture(&mut self, lives: &mut u32) -> Phase {
        if self.phase != Phase::Running {
            return self.phase;
        }
        *lives = lives.saturating_sub(1);
        self.phase = if *lives == 0 {
            Phase::GameOver
        } else {
            Phase::Resetting {
                remaining: self.respawn_delay,
            }
        };
        info!(lives = *lives, phase = ?self.phase, "player_captured");
        self.phase
    }

    pub fn on_win(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Complete;
        }
    }

    /// Counts down a pending respawn. Returns true on the tick play resumes.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Phase::Resetting { remaining } = self.phase else {
            return false;
        };
        let remaining = remaining.saturating_sub(delta);
        if remaining.is_zero() {
            self.phase = Phase::Running;
            info!("play_resumed");
            true
        } else {
            self.phase = Phase::Resetting { remaining };
            false
        }
    }
}
