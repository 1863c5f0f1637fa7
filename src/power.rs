use std::time::Duration;

use tracing::debug;

use crate::ghost::Ghost;

pub const POWER_DURATION: Duration = Duration::from_millis(5000);

/// Global timed window during which every non-eaten ghost is `Scared`.
/// Elapsed time is the sum of ticked deltas, never a tick count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerMode {
    duration: Duration,
    /// Length of the current window; `duration` plus any extensions.
    window: Duration,
    elapsed: Duration,
    active: bool,
}

impl PowerMode {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            window: duration,
            elapsed: Duration::ZERO,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn remaining(&self) -> Duration {
        if self.active {
            self.window.saturating_sub(self.elapsed)
        } else {
            Duration::ZERO
        }
    }

    /// Opens (or restarts) the window. Re-activating never stacks time.
    pub fn activate(&mut self, ghosts: &mut [Ghost]) {
        let restarted = self.active;
        self.active = true;
        self.window = self.duration;
        self.elapsed = Duration::ZERO;
        for ghost in ghosts.iter_mut() {
            ghost.frighten();
        }
        debug!(restarted, "power_mode_started");
    }

    /// Lengthens a running window by `boost`, or opens one lasting just
    /// `boost`. Returns true when this opened a new window.
    pub fn extend(&mut self, boost: Duration, ghosts: &mut [Ghost]) -> bool {
        if self.active {
            self.window += boost;
            debug!(boost_ms = boost.as_millis() as u64, "power_mode_extended");
            return false;
        }
        self.active = true;
        self.window = boost;
        self.elapsed = Duration::ZERO;
        for ghost in ghosts.iter_mut() {
            ghost.frighten();
        }
        debug!(boost_ms = boost.as_millis() as u64, "power_mode_started");
        true
    }

    /// Returns true on the tick the window closes.
    pub fn tick(&mut self, delta: Duration, ghosts: &mut [Ghost]) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += delta;
        if self.elapsed < self.window {
            return false;
        }
        self.active = false;
        for ghost in ghosts.iter_mut() {
            ghost.calm();
        }
        debug!(elapsed_ms = self.elapsed.as_millis() as u64, "power_mode_ended");
        true
    }

    /// Drops a pending window without touching ghost modes.
    pub fn cancel(&mut self) {
        self.active = false;
        self.elapsed = Duration::ZERO;
    }
}
