//! One chase session: owns the grid, the actors and every timer, and
//! advances them in a fixed order once per host frame.
//!
//! Tick order while running:
//! 1. ghost modes are sampled for collision resolution
//! 2. the power-mode timer, ghost release timers and the bonus advance
//! 3. the player moves; every reached cell is checked for pellets and bonus
//! 4. ghosts move, deciding at cell centers
//! 5. player/ghost contacts are resolved against the sampled modes
//! 6. a capture hands over to the lifecycle (reset or game over)
//!
//! Steps 3 to 5 repeat over equal slices of a long frame, so actors cannot
//! pass through each other between two contact checks.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::actor::Actor;
use crate::bonus::{Bonus, BonusEvent};
use crate::collision::{self, Contact};
use crate::config::GameConfig;
use crate::error::SessionError;
use crate::ghost::{Ghost, GhostMode};
use crate::grid::{Dir, MazeGrid, Pos, Tile};
use crate::host::{HighScoreStore, Reward, RewardSink};
use crate::layout::Layout;
use crate::lifecycle::{Lifecycle, Phase};
use crate::pellets::CollectibleTracker;
use crate::power::PowerMode;
use crate::rng::RandomSource;

/// Most cells any actor may cover between two contact checks.
pub const MAX_STEP_CELLS: f32 = 0.5;

/// Observable per-tick state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSession {
    pub score: u32,
    pub lives_remaining: u32,
    pub pellets_remaining: usize,
    pub pellets_collected: usize,
    pub total_pellets: usize,
    pub power_mode_active: bool,
    pub power_mode_elapsed: Duration,
    pub game_over: bool,
    pub won: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub won: bool,
    pub final_score: u32,
    pub is_new_high_score: bool,
    pub reward: Reward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    PelletEaten { cell: Pos, points: u32 },
    PowerPelletEaten { cell: Pos, points: u32 },
    PowerModeStarted,
    PowerModeEnded,
    BonusSpawned { cell: Pos },
    BonusExpired { cell: Pos },
    BonusEaten { cell: Pos, points: u32 },
    GhostReleased { ghost: usize },
    GhostEaten { ghost: usize, points: u32 },
    PlayerCaptured { ghost: usize, lives_remaining: u32 },
    Resumed,
    Finished(SessionResult),
}

pub struct Session<R, H> {
    config: GameConfig,
    grid: MazeGrid,
    player: Actor,
    player_start: Pos,
    ghosts: Vec<Ghost>,
    power: PowerMode,
    pellets: CollectibleTracker,
    bonus: Bonus,
    lifecycle: Lifecycle,
    state: GameSession,
    best_at_start: u32,
    result: Option<SessionResult>,
    rng: Box<dyn RandomSource>,
    rewards: R,
    high_scores: H,
}

impl<R: RewardSink, H: HighScoreStore> Session<R, H> {
    /// Builds a fresh session. Layout and config problems are reported here
    /// and never surface once play has started.
    pub fn init(
        layout: &Layout,
        config: GameConfig,
        mut rng: Box<dyn RandomSource>,
        rewards: R,
        high_scores: H,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let grid = layout.build_grid()?;

        let player = Actor::new(layout.player_start, config.player_speed);
        let ghosts = layout
            .ghost_spawns
            .iter()
            .enumerate()
            .map(|(idx, &spawn)| Ghost::new(spawn, config.ghost_speed, config.release_delay(idx)))
            .collect();
        let pellets = CollectibleTracker::new(&grid);
        let bonus = Bonus::new(config.bonus, rng.as_mut());
        let best_at_start = high_scores.high_score();

        let state = GameSession {
            score: 0,
            lives_remaining: config.lives,
            pellets_remaining: pellets.remaining(),
            pellets_collected: 0,
            total_pellets: pellets.total(),
            power_mode_active: false,
            power_mode_elapsed: Duration::ZERO,
            game_over: false,
            won: false,
        };

        info!(
            width = grid.width(),
            height = grid.height(),
            pellets = pellets.total(),
            ghosts = layout.ghost_spawns.len(),
            lives = config.lives,
            best = best_at_start,
            "session_started"
        );

        Ok(Self {
            power: PowerMode::new(config.power_duration()),
            lifecycle: Lifecycle::new(config.respawn_delay()),
            player_start: layout.player_start,
            config,
            grid,
            player,
            ghosts,
            pellets,
            bonus,
            state,
            best_at_start,
            result: None,
            rng,
            rewards,
            high_scores,
        })
    }

    pub fn state(&self) -> &GameSession {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub fn player(&self) -> &Actor {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn bonus_cell(&self) -> Option<Pos> {
        self.bonus.cell()
    }

    pub fn power_remaining(&self) -> Duration {
        self.power.remaining()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn rewards(&self) -> &R {
        &self.rewards
    }

    pub fn high_scores(&self) -> &H {
        &self.high_scores
    }

    /// Advances the session by `delta`. `input` is the newest directional
    /// command, if any arrived since the previous frame.
    pub fn update(&mut self, delta: Duration, input: Option<Dir>) -> Vec<Event> {
        let mut events = Vec::new();
        if self.lifecycle.phase().is_terminal() {
            return events;
        }
        if let Some(dir) = input {
            self.player.request(dir);
        }

        if let Phase::Resetting { .. } = self.lifecycle.phase() {
            if self.lifecycle.tick(delta) {
                events.push(Event::Resumed);
            }
            return events;
        }

        let sampled: Vec<GhostMode> = self.ghosts.iter().map(|g| g.mode).collect();

        if self.power.tick(delta, &mut self.ghosts) {
            events.push(Event::PowerModeEnded);
        }
        for (idx, ghost) in self.ghosts.iter_mut().enumerate() {
            if ghost.tick_release(delta) {
                debug!(ghost = idx, "ghost_released");
                events.push(Event::GhostReleased { ghost: idx });
            }
        }
        self.tick_bonus(delta, &mut events);

        let steps = self.sub_steps(delta);
        let step = delta / steps;
        for _ in 0..steps {
            for cell in self.player.advance(step, &self.grid) {
                self.collect_at(cell, &mut events);
                if self.pellets.is_cleared() {
                    self.complete(&mut events);
                    return events;
                }
            }

            let player_cell = self.player.cell;
            for ghost in self.ghosts.iter_mut() {
                ghost.advance(
                    step,
                    &self.grid,
                    player_cell,
                    self.rng.as_mut(),
                    self.config.pursuit_chance,
                );
            }

            if self.resolve_contacts(&sampled, &mut events) {
                break;
            }
        }

        self.sync_state();
        events
    }

    /// Ends the session early (the player left the mini-game). Pending timers
    /// are dropped and nothing further is paid out.
    pub fn teardown(mut self) -> GameSession {
        self.power.cancel();
        self.sync_state();
        info!(
            score = self.state.score,
            phase = ?self.lifecycle.phase(),
            settled = self.result.is_some(),
            "session_torn_down"
        );
        self.state
    }

    /// Number of equal movement slices for `delta`, so that no actor covers
    /// more than [`MAX_STEP_CELLS`] between two contact checks.
    fn sub_steps(&self, delta: Duration) -> u32 {
        let fastest = self.config.player_speed.max(self.config.ghost_speed);
        let cells = fastest * delta.as_secs_f32();
        (cells / MAX_STEP_CELLS).ceil().max(1.0) as u32
    }

    /// Applies this slice's contacts. Returns true once the player is caught.
    fn resolve_contacts(&mut self, sampled: &[GhostMode], events: &mut Vec<Event>) -> bool {
        let mut captured_by = None;
        for contact in collision::resolve(&self.player, &self.ghosts, sampled, self.config.capture_radius) {
            match contact {
                Contact::GhostEaten(idx) => {
                    let points = self.config.scoring.ghost;
                    self.state.score += points;
                    self.ghosts[idx].mark_eaten(self.config.ghost_return());
                    events.push(Event::GhostEaten { ghost: idx, points });
                }
                Contact::PlayerCaptured(idx) => {
                    captured_by.get_or_insert(idx);
                }
            }
        }
        match captured_by {
            Some(idx) => {
                self.capture(idx, events);
                true
            }
            None => false,
        }
    }

    fn tick_bonus(&mut self, delta: Duration, events: &mut Vec<Event>) {
        let mut occupied: Vec<Pos> = self.ghosts.iter().map(Ghost::cell).collect();
        occupied.extend(self.ghosts.iter().map(|g| g.spawn));
        occupied.push(self.player.cell);
        occupied.push(self.player_start);
        match self.bonus.tick(delta, &self.grid, &occupied, self.rng.as_mut()) {
            Some(BonusEvent::Spawned(cell)) => events.push(Event::BonusSpawned { cell }),
            Some(BonusEvent::Expired(cell)) => events.push(Event::BonusExpired { cell }),
            None => {}
        }
    }

    fn collect_at(&mut self, cell: Pos, events: &mut Vec<Event>) {
        if let Some(points) = self.bonus.try_collect(cell, self.rng.as_mut()) {
            self.state.score += points;
            events.push(Event::BonusEaten { cell, points });
            let boost = self.bonus.power_boost();
            if !boost.is_zero() && self.power.extend(boost, &mut self.ghosts) {
                events.push(Event::PowerModeStarted);
            }
        }

        let Some(pickup) = self.pellets.collect(&mut self.grid, cell, &self.config.scoring) else {
            return;
        };
        self.state.score += pickup.points;
        if pickup.tile == Tile::PowerPellet {
            events.push(Event::PowerPelletEaten {
                cell,
                points: pickup.points,
            });
            self.power.activate(&mut self.ghosts);
            events.push(Event::PowerModeStarted);
        } else {
            events.push(Event::PelletEaten {
                cell,
                points: pickup.points,
            });
        }
        self.sync_state();
    }

    fn capture(&mut self, ghost: usize, events: &mut Vec<Event>) {
        let phase = self.lifecycle.on_capture(&mut self.state.lives_remaining);
        events.push(Event::PlayerCaptured {
            ghost,
            lives_remaining: self.state.lives_remaining,
        });

        if phase == Phase::GameOver {
            self.state.game_over = true;
            self.finish(events);
            return;
        }

        if self.power.is_active() {
            self.power.cancel();
            events.push(Event::PowerModeEnded);
        }
        self.player.place(self.player_start);
        for ghost in self.ghosts.iter_mut() {
            ghost.respawn();
        }
        self.bonus.reset(self.rng.as_mut());
    }

    fn complete(&mut self, events: &mut Vec<Event>) {
        self.state.score += self.config.scoring.completion_bonus;
        self.state.won = true;
        self.lifecycle.on_win();
        self.finish(events);
    }

    /// Settles a finished session exactly once: pays the reward sink and
    /// hands a beaten high score back to the store.
    fn finish(&mut self, events: &mut Vec<Event>) {
        if self.result.is_some() {
            return;
        }
        self.power.cancel();
        self.sync_state();

        let score = self.state.score;
        let reward = Reward::from_score(score);
        let result = SessionResult {
            won: self.state.won,
            final_score: score,
            is_new_high_score: score > self.best_at_start,
            reward,
        };

        self.rewards.add_coins(reward.coins);
        self.rewards.add_xp(reward.xp);
        if result.is_new_high_score {
            if let Err(error) = self.high_scores.record(score) {
                warn!(%error, score, "high_score_save_failed");
            }
        }

        info!(
            won = result.won,
            score,
            new_high_score = result.is_new_high_score,
            coins = reward.coins,
            xp = reward.xp,
            "session_finished"
        );
        self.result = Some(result);
        events.push(Event::Finished(result));
    }

    fn sync_state(&mut self) {
        self.state.pellets_remaining = self.pellets.remaining();
        self.state.pellets_collected = self.pellets.collected();
        self.state.power_mode_active = self.power.is_active();
        self.state.power_mode_elapsed = self.power.elapsed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusConfig;
    use crate::host::{MemoryHighScores, MemoryRewards};
    use crate::rng::ScriptedRandom;

    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.bonus.enabled = false;
        config
    }

    fn session(rows: &[&str], config: GameConfig) -> Session<MemoryRewards, MemoryHighScores> {
        Session::init(
            &Layout::parse(rows).unwrap(),
            config,
            Box::new(ScriptedRandom::wander()),
            MemoryRewards::default(),
            MemoryHighScores::new(100),
        )
        .unwrap()
    }

    #[test]
    fn init_reports_malformed_layouts() {
        let layout = Layout::parse(&["###", "#P#", "#.#", "###"]).unwrap();
        let err = Session::init(
            &layout,
            GameConfig::default(),
            Box::new(ScriptedRandom::wander()),
            MemoryRewards::default(),
            MemoryHighScores::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::Layout(_)));
    }

    #[test]
    fn init_reports_bad_config() {
        let layout = Layout::default_maze().unwrap();
        let config = GameConfig {
            lives: 0,
            ..GameConfig::default()
        };
        let err = Session::init(
            &layout,
            config,
            Box::new(ScriptedRandom::wander()),
            MemoryRewards::default(),
            MemoryHighScores::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn power_window_opens_in_the_tick_after_the_pellet() {
        let mut s = session(&["#######", " Po..  ", "#######"], quiet_config());
        let events = s.update(Duration::from_millis(200), Some(Dir::Right));
        assert!(events.contains(&Event::PowerModeStarted));
        assert!(s.state().power_mode_active);
        assert_eq!(s.state().power_mode_elapsed, Duration::ZERO);

        s.update(Duration::from_millis(100), None);
        assert_eq!(s.state().power_mode_elapsed, Duration::from_millis(100));
    }

    #[test]
    fn finished_sessions_ignore_further_updates() {
        let mut s = session(&["#####", " P.  ", "#####"], quiet_config());
        let events = s.update(Duration::from_millis(200), Some(Dir::Right));
        assert!(matches!(events.last(), Some(Event::Finished(_))));
        let result = *s.result().unwrap();
        assert!(result.won);
        assert_eq!(result.final_score, 10 + 500);
        assert!(result.is_new_high_score);
        assert_eq!(s.high_scores().best, 510);
        assert_eq!(s.rewards().payouts, 1);

        assert!(s.update(Duration::from_secs(10), Some(Dir::Left)).is_empty());
        assert_eq!(s.rewards().payouts, 1);
        assert_eq!(s.rewards().coins, 51);
        assert_eq!(s.rewards().xp, 51);
    }

    #[test]
    fn head_on_pair_meets_within_one_long_frame() {
        let mut s = session(&["###########", " P.G.....  ", "###########"], quiet_config());
        let events = s.update(Duration::from_millis(300), Some(Dir::Right));
        assert!(
            events.contains(&Event::PlayerCaptured {
                ghost: 0,
                lives_remaining: 2
            }),
            "{events:?}"
        );
        assert_eq!(s.state().lives_remaining, 2);
        assert_eq!(s.player().cell, Pos::new(1, 1));
    }

    #[test]
    fn bonus_pickup_opens_a_boost_window() {
        let mut config = quiet_config();
        config.bonus = BonusConfig {
            enabled: true,
            min_wait_ms: 100,
            max_wait_ms: 100,
            lifetime_ms: 10_000,
            score: 200,
            power_boost_ms: 2_800,
        };
        let mut s = session(&["#######", " P..   ", "#######"], config);

        let mut eaten = Vec::new();
        for _ in 0..30 {
            eaten = s.update(Duration::from_millis(16), Some(Dir::Left));
            if eaten.iter().any(|e| matches!(e, Event::BonusEaten { .. })) {
                break;
            }
        }
        assert!(eaten.contains(&Event::BonusEaten {
            cell: Pos::new(0, 1),
            points: 200
        }));
        assert!(eaten.contains(&Event::PowerModeStarted));
        assert!(s.state().power_mode_active);
        assert_eq!(s.power_remaining(), Duration::from_millis(2800));
        assert_eq!(s.state().score, 200);
    }

    #[test]
    fn teardown_pays_nothing() {
        let mut s = session(&["#######", " P...  ", "#######"], quiet_config());
        s.update(Duration::from_millis(200), Some(Dir::Right));
        let rewards = s.rewards().clone();
        let state = s.teardown();
        assert_eq!(state.score, 10);
        assert_eq!(rewards.payouts, 0);
    }
}
