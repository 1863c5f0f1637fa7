use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// A maze tile. Codes match the layout data contract: `Wall=0`, `Path=1`,
/// `Pellet=2`, `PowerPellet=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tile {
    Wall,
    Path,
    Pellet,
    PowerPellet,
}

impl Tile {
    pub fn is_pellet(self) -> bool {
        matches!(self, Tile::Pellet | Tile::PowerPellet)
    }
}

impl TryFrom<u8> for Tile {
    type Error = LayoutError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Tile::Wall),
            1 => Ok(Tile::Path),
            2 => Ok(Tile::Pellet),
            3 => Ok(Tile::PowerPellet),
            other => Err(LayoutError::UnknownCode(other)),
        }
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> u8 {
        match tile {
            Tile::Wall => 0,
            Tile::Path => 1,
            Tile::Pellet => 2,
            Tile::PowerPellet => 3,
        }
    }
}

/// A grid cell address. Signed so that a step off the tunnel row's edge is
/// representable before it is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Dir) -> Pos {
        let (dx, dy) = dir.delta();
        Pos {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Enumeration order used wherever directions are scanned; ties resolve to
    /// the earliest entry.
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Left, Dir::Down, Dir::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// The static maze. The only mutation it ever sees is a pellet tile
/// degrading to `Path` through [`MazeGrid::consume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    tiles: Vec<Vec<Tile>>,
    tunnel_row: usize,
}

impl MazeGrid {
    pub fn new(tiles: Vec<Vec<Tile>>, tunnel_row: usize) -> Result<Self, LayoutError> {
        let height = tiles.len();
        let width = tiles.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(LayoutError::Empty);
        }
        for (row, line) in tiles.iter().enumerate() {
            if line.len() != width {
                return Err(LayoutError::Ragged {
                    row,
                    expected: width,
                    actual: line.len(),
                });
            }
        }
        if tunnel_row >= height {
            return Err(LayoutError::TunnelRowOutOfRange {
                row: tunnel_row,
                height,
            });
        }
        let edges = &tiles[tunnel_row];
        if edges[0] == Tile::Wall || edges[width - 1] == Tile::Wall {
            return Err(LayoutError::TunnelRowBlocked(tunnel_row));
        }
        Ok(Self {
            width,
            height,
            tiles,
            tunnel_row,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tunnel_row(&self) -> usize {
        self.tunnel_row
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Horizontal wraparound, applied only on the tunnel row.
    pub fn wrap(&self, pos: Pos) -> Pos {
        if pos.y == self.tunnel_row as i32 {
            Pos {
                x: pos.x.rem_euclid(self.width as i32),
                y: pos.y,
            }
        } else {
            pos
        }
    }

    pub fn is_passable(&self, pos: Pos) -> bool {
        match self.tile(self.wrap(pos)) {
            Some(Tile::Wall) | None => false,
            Some(_) => true,
        }
    }

    pub fn can_move(&self, pos: Pos, dir: Dir) -> bool {
        self.is_passable(pos.step(dir))
    }

    /// Degrades a pellet at `pos` to `Path` and reports what was there.
    pub fn consume(&mut self, pos: Pos) -> Option<Tile> {
        let pos = self.wrap(pos);
        if !self.in_bounds(pos) {
            return None;
        }
        let tile = &mut self.tiles[pos.y as usize][pos.x as usize];
        if tile.is_pellet() {
            let eaten = *tile;
            *tile = Tile::Path;
            Some(eaten)
        } else {
            None
        }
    }

    pub fn pellet_count(&self) -> usize {
        self.tiles
            .iter()
            .flatten()
            .filter(|tile| tile.is_pellet())
            .count()
    }

    /// Every cell whose tile matches `kind`, in row-major order.
    pub fn cells_of(&self, kind: Tile) -> Vec<Pos> {
        let mut cells = Vec::new();
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if *tile == kind {
                    cells.push(Pos::new(x as i32, y as i32));
                }
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> MazeGrid {
        use Tile::*;
        MazeGrid::new(
            vec![
                vec![Wall, Wall, Wall, Wall],
                vec![Path, Pellet, PowerPellet, Path],
                vec![Wall, Pellet, Wall, Wall],
            ],
            1,
        )
        .unwrap()
    }

    #[test]
    fn tile_codes_follow_the_layout_contract() {
        assert_eq!(Tile::try_from(0), Ok(Tile::Wall));
        assert_eq!(Tile::try_from(3), Ok(Tile::PowerPellet));
        assert_eq!(Tile::try_from(4), Err(LayoutError::UnknownCode(4)));
        assert_eq!(u8::from(Tile::Pellet), 2);
    }

    #[test]
    fn walls_and_out_of_bounds_are_impassable() {
        let g = grid();
        assert!(!g.is_passable(Pos::new(0, 0)));
        assert!(!g.is_passable(Pos::new(1, 3)));
        assert!(!g.is_passable(Pos::new(-1, 2)));
        assert!(g.is_passable(Pos::new(1, 2)));
    }

    #[test]
    fn wrap_applies_only_on_tunnel_row() {
        let g = grid();
        assert_eq!(g.wrap(Pos::new(-1, 1)), Pos::new(3, 1));
        assert_eq!(g.wrap(Pos::new(4, 1)), Pos::new(0, 1));
        assert_eq!(g.wrap(Pos::new(-1, 2)), Pos::new(-1, 2));
        assert!(g.is_passable(Pos::new(-1, 1)));
    }

    #[test]
    fn consume_degrades_once() {
        let mut g = grid();
        assert_eq!(g.pellet_count(), 3);
        assert_eq!(g.consume(Pos::new(2, 1)), Some(Tile::PowerPellet));
        assert_eq!(g.consume(Pos::new(2, 1)), None);
        assert_eq!(g.tile(Pos::new(2, 1)), Some(Tile::Path));
        assert_eq!(g.consume(Pos::new(0, 0)), None);
        assert_eq!(g.pellet_count(), 2);
    }

    #[test]
    fn rejects_blocked_tunnel() {
        let err = MazeGrid::new(vec![vec![Tile::Wall, Tile::Path]], 0).unwrap_err();
        assert_eq!(err, LayoutError::TunnelRowBlocked(0));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = MazeGrid::new(vec![vec![Tile::Path, Tile::Path], vec![Tile::Path]], 0).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Ragged {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }
}
