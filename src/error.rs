use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::grid::Pos;

/// Problems found while building a maze layout. All of these are fatal at
/// session construction; none can surface mid-session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} has {actual} tiles, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile code {0}")]
    UnknownCode(u8),
    #[error("unknown layout glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error("layout does not designate a tunnel row")]
    NoTunnelRow,
    #[error("tunnel row {row} is outside a layout of height {height}")]
    TunnelRowOutOfRange { row: usize, height: usize },
    #[error("tunnel row {0} is walled at its edges")]
    TunnelRowBlocked(usize),
    #[error("layout has no player start cell")]
    NoPlayerStart,
    #[error("{what} cell {cell} is outside the layout")]
    SpawnOutOfBounds { what: &'static str, cell: Pos },
    #[error("{what} cell {cell} is a wall")]
    SpawnOnWall { what: &'static str, cell: Pos },
    #[error("layout has no pellets to collect")]
    NoPellets,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("lives must be at least 1")]
    NoLives,
    #[error("power duration must be non-zero")]
    ZeroPowerDuration,
    #[error("capture radius must be in (0, 1], got {0}")]
    CaptureRadius(f32),
    #[error("pursuit chance must be in [0, 1], got {0}")]
    PursuitChance(f32),
    #[error("bonus wait range is inverted: {min_ms}..={max_ms}")]
    BonusWindow { min_ms: u64, max_ms: u64 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read/write high score file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("high score file {path} is malformed: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
