//! Maze layouts: the tile matrix, the tunnel row and the fixed spawn cells.
//!
//! Layouts come either from ASCII art (see [`Layout::parse`]) or from the
//! tile-code matrix of the data contract, usually deserialized from JSON.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::grid::{MazeGrid, Pos, Tile};

/// The maze the terminal game ships with. `#` wall, `.` pellet, `o` power
/// pellet, `P` player start, `G` ghost spawn, anything else blank is path.
pub const DEFAULT_MAZE: [&str; 20] = [
    "###################",
    "#o.......#.......o#",
    "#.##.###.#.###.##.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.### # ###.####",
    "####.#   G   #.####",
    "    .  #GGG#  .    ",
    "####.# ##### #.####",
    "####.#       #.####",
    "####.# ##### #.####",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o.#.....P.....#.o#",
    "##.#.#...#...#.#.##",
    "#....#...#...#....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub tiles: Vec<Vec<Tile>>,
    pub tunnel_row: Option<usize>,
    pub player_start: Pos,
    pub ghost_spawns: Vec<Pos>,
}

impl Layout {
    pub fn default_maze() -> Result<Self, LayoutError> {
        Self::parse(&DEFAULT_MAZE)
    }

    /// Parses ASCII art. The tunnel row is the single row whose two edge
    /// cells are open.
    pub fn parse(rows: &[&str]) -> Result<Self, LayoutError> {
        let mut tiles = Vec::with_capacity(rows.len());
        let mut player_start = None;
        let mut ghost_spawns = Vec::new();

        for (y, line) in rows.iter().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (x, glyph) in line.chars().enumerate() {
                let tile = match glyph {
                    '#' => Tile::Wall,
                    ' ' => Tile::Path,
                    '.' => Tile::Pellet,
                    'o' => Tile::PowerPellet,
                    'P' => {
                        player_start = Some(Pos::new(x as i32, y as i32));
                        Tile::Path
                    }
                    'G' => {
                        ghost_spawns.push(Pos::new(x as i32, y as i32));
                        Tile::Path
                    }
                    other => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: other,
                            x,
                            y,
                        })
                    }
                };
                row.push(tile);
            }
            tiles.push(row);
        }

        let tunnel_row = tiles.iter().position(|row| {
            matches!((row.first(), row.last()), (Some(a), Some(b)) if *a != Tile::Wall && *b != Tile::Wall)
        });

        Ok(Self {
            tiles,
            tunnel_row,
            player_start: player_start.ok_or(LayoutError::NoPlayerStart)?,
            ghost_spawns,
        })
    }

    /// Builds a layout from the raw code matrix (`Wall=0 .. PowerPellet=3`).
    pub fn from_codes(
        codes: &[Vec<u8>],
        tunnel_row: Option<usize>,
        player_start: Pos,
        ghost_spawns: Vec<Pos>,
    ) -> Result<Self, LayoutError> {
        let tiles = codes
            .iter()
            .map(|row| row.iter().map(|&code| Tile::try_from(code)).collect())
            .collect::<Result<Vec<Vec<Tile>>, _>>()?;
        Ok(Self {
            tiles,
            tunnel_row,
            player_start,
            ghost_spawns,
        })
    }

    /// Validates the layout and produces the session's grid.
    pub fn build_grid(&self) -> Result<MazeGrid, LayoutError> {
        let tunnel_row = self.tunnel_row.ok_or(LayoutError::NoTunnelRow)?;
        let grid = MazeGrid::new(self.tiles.clone(), tunnel_row)?;

        check_spawn(&grid, "player start", self.player_start)?;
        for &spawn in &self.ghost_spawns {
            check_spawn(&grid, "ghost spawn", spawn)?;
        }
        if grid.pellet_count() == 0 {
            return Err(LayoutError::NoPellets);
        }
        Ok(grid)
    }
}

fn check_spawn(grid: &MazeGrid, what: &'static str, cell: Pos) -> Result<(), LayoutError> {
    match grid.tile(cell) {
        None => Err(LayoutError::SpawnOutOfBounds { what, cell }),
        Some(Tile::Wall) => Err(LayoutError::SpawnOnWall { what, cell }),
        Some(_) => Ok(()),
    }
}
