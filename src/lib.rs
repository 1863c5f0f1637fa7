//! Headless core of the maze chase mini-game.
//!
//! A host creates a [`Session`] from a [`Layout`] and a [`GameConfig`], calls
//! [`Session::update`] once per frame with the elapsed time and the newest
//! directional input, and reads back [`GameSession`] plus the returned
//! [`Event`]s. Nothing here knows about rendering, audio or any engine.

pub mod actor;
pub mod bonus;
pub mod collision;
pub mod config;
pub mod error;
pub mod ghost;
pub mod grid;
pub mod host;
pub mod layout;
pub mod lifecycle;
pub mod pellets;
pub mod power;
pub mod rng;
pub mod session;

pub use config::GameConfig;
pub use error::{ConfigError, LayoutError, SessionError, StoreError};
pub use ghost::GhostMode;
pub use grid::{Dir, MazeGrid, Pos, Tile};
pub use host::{HighScoreStore, JsonHighScores, MemoryHighScores, MemoryRewards, Reward, RewardSink};
pub use layout::Layout;
pub use lifecycle::Phase;
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use session::{Event, GameSession, Session, SessionResult};
