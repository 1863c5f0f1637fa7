use serde::{Deserialize, Serialize};

use crate::grid::{MazeGrid, Pos, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scoring {
    pub pellet: u32,
    pub power_pellet: u32,
    pub ghost: u32,
    pub completion_bonus: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            pellet: 10,
            power_pellet: 50,
            ghost: 200,
            completion_bonus: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub cell: Pos,
    pub tile: Tile,
    pub points: u32,
    /// This pickup emptied the maze.
    pub cleared: bool,
}

/// Pellet bookkeeping. `collected + remaining == total` at all times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectibleTracker {
    total: usize,
    remaining: usize,
}

impl CollectibleTracker {
    pub fn new(grid: &MazeGrid) -> Self {
        let total = grid.pellet_count();
        Self {
            total,
            remaining: total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn collected(&self) -> usize {
        self.total - self.remaining
    }

    pub fn is_cleared(&self) -> bool {
        self.remaining == 0
    }

    /// Consumes whatever pellet sits on the player's newly reached cell.
    pub fn collect(&mut self, grid: &mut MazeGrid, cell: Pos, scoring: &Scoring) -> Option<Pickup> {
        let tile = grid.consume(cell)?;
        self.remaining = self.remaining.saturating_sub(1);
        let points = match tile {
            Tile::PowerPellet => scoring.power_pellet,
            _ => scoring.pellet,
        };
        Some(Pickup {
            cell,
            tile,
            points,
            cleared: self.remaining == 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    #[test]
    fn scores_and_counts_each_pellet_once() {
        let mut grid = Layout::parse(&["#####", " P.o ", "#####"])
            .unwrap()
            .build_grid()
            .unwrap();
        let mut tracker = CollectibleTracker::new(&grid);
        let scoring = Scoring::default();
        assert_eq!(tracker.total(), 2);

        assert_eq!(tracker.collect(&mut grid, Pos::new(1, 1), &scoring), None);

        let pellet = tracker.collect(&mut grid, Pos::new(2, 1), &scoring).unwrap();
        assert_eq!((pellet.tile, pellet.points, pellet.cleared), (Tile::Pellet, 10, false));
        assert_eq!(tracker.collect(&mut grid, Pos::new(2, 1), &scoring), None);
        assert_eq!(tracker.collected() + tracker.remaining(), tracker.total());

        let power = tracker.collect(&mut grid, Pos::new(3, 1), &scoring).unwrap();
        assert_eq!((power.tile, power.points, power.cleared), (Tile::PowerPellet, 50, true));
        assert!(tracker.is_cleared());
    }
}
