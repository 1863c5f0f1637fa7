//! Grid-aligned motion shared by the player and the ghosts.
//!
//! An actor always travels in a straight line from the center of `cell`
//! toward the center of `target`. Directions are only ever chosen when a
//! center is reached, so an actor can never straddle a wall corner.

use std::time::Duration;

use tracing::trace;

use crate::grid::{Dir, MazeGrid, Pos};

/// Distance (in cells) under which an actor counts as sitting on a center.
pub const CENTER_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Last cell center reached. Always inside the grid.
    pub cell: Pos,
    /// Cell being moved toward; equals `cell` while stopped. On the tunnel row
    /// this may sit one step past the edge until it is reached and wrapped.
    pub target: Pos,
    pub x: f32,
    pub y: f32,
    pub direction: Option<Dir>,
    /// Newest requested direction, applied at the next center if passable.
    pub intended: Option<Dir>,
    /// Cells per second.
    pub speed: f32,
}

impl Actor {
    pub fn new(cell: Pos, speed: f32) -> Self {
        Self {
            cell,
            target: cell,
            x: cell.x as f32,
            y: cell.y as f32,
            direction: None,
            intended: None,
            speed,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn distance_to(&self, other: &Actor) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves the actor onto `cell` at rest, dropping any heading or intent.
    pub fn place(&mut self, cell: Pos) {
        self.cell = cell;
        self.target = cell;
        self.x = cell.x as f32;
        self.y = cell.y as f32;
        self.direction = None;
        self.intended = None;
    }

    /// Newest command wins; there is no deeper queue.
    pub fn request(&mut self, dir: Dir) {
        self.intended = Some(dir);
    }

    pub fn at_target(&self) -> bool {
        let dx = self.target.x as f32 - self.x;
        let dy = self.target.y as f32 - self.y;
        dx.abs() + dy.abs() < CENTER_EPSILON
    }

    /// Advances using only the actor's own intent. Returns every new cell
    /// whose center was reached during this step, in order.
    pub fn advance(&mut self, delta: Duration, grid: &MazeGrid) -> Vec<Pos> {
        self.advance_with(delta, grid, |_, _| {})
    }

    /// Like [`Actor::advance`], but `steer` runs at every decision point
    /// before the direction rule, so it can replace `intended`.
    pub fn advance_with<F>(&mut self, delta: Duration, grid: &MazeGrid, mut steer: F) -> Vec<Pos>
    where
        F: FnMut(&mut Actor, &MazeGrid),
    {
        let mut budget = self.speed * delta.as_secs_f32();
        let mut arrived = Vec::new();

        loop {
            if self.at_target() {
                if let Some(cell) = self.settle(grid) {
                    arrived.push(cell);
                }
                steer(self, grid);
                self.decide(grid);
                match self.direction {
                    Some(dir) => self.target = self.cell.step(dir),
                    None => break,
                }
            }

            if budget <= 0.0 {
                break;
            }

            let dx = self.target.x as f32 - self.x;
            let dy = self.target.y as f32 - self.y;
            let dist = dx.abs() + dy.abs();
            if budget < dist {
                self.x += dx / dist * budget;
                self.y += dy / dist * budget;
                break;
            }
            budget -= dist;
            self.x = self.target.x as f32;
            self.y = self.target.y as f32;
        }

        arrived
    }

    /// Snaps onto the target center. Crossing the tunnel edge teleports the
    /// continuous coordinate to the wrapped cell's center.
    fn settle(&mut self, grid: &MazeGrid) -> Option<Pos> {
        let reached = grid.wrap(self.target);
        self.x = reached.x as f32;
        self.y = reached.y as f32;
        self.target = reached;
        if reached == self.cell {
            return None;
        }
        self.cell = reached;
        Some(reached)
    }

    fn decide(&mut self, grid: &MazeGrid) {
        if let Some(want) = self.intended {
            if grid.can_move(self.cell, want) {
                if self.direction != Some(want) {
                    trace!(cell = %self.cell, ?want, "turn");
                }
                self.direction = Some(want);
                return;
            }
        }
        if let Some(current) = self.direction {
            if grid.can_move(self.cell, current) {
                return;
            }
        }
        self.direction = None;
    }
}
