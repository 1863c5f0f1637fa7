use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};

use crate::actor::Actor;
use crate::grid::{Dir, MazeGrid, Pos};
use crate::rng::RandomSource;

/// Probability that a roaming ghost takes the pursuit branch at a decision
/// point rather than wandering.
pub const PURSUIT_CHANCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GhostMode {
    Patrol,
    Pursue,
    Scared,
    Eaten,
}

impl GhostMode {
    /// Whether touching the player in this mode costs a life.
    pub fn is_dangerous(self) -> bool {
        matches!(self, GhostMode::Patrol | GhostMode::Pursue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub dir: Dir,
    pub pursuing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    pub actor: Actor,
    pub mode: GhostMode,
    pub spawn: Pos,
    /// Behaviour restored when power mode ends.
    roaming: GhostMode,
    release_delay: Duration,
    release_in: Duration,
}

impl Ghost {
    pub fn new(spawn: Pos, speed: f32, release_delay: Duration) -> Self {
        Self {
            actor: Actor::new(spawn, speed),
            mode: GhostMode::Patrol,
            spawn,
            roaming: GhostMode::Patrol,
            release_delay,
            release_in: release_delay,
        }
    }

    pub fn cell(&self) -> Pos {
        self.actor.cell
    }

    /// Released and not waiting at spawn after being eaten.
    pub fn is_active(&self) -> bool {
        self.release_in.is_zero() && self.mode != GhostMode::Eaten
    }

    pub fn release_in(&self) -> Duration {
        self.release_in
    }

    /// Counts down the activation delay. Returns true on the tick the ghost
    /// starts moving again; an eaten ghost comes back patrolling.
    pub fn tick_release(&mut self, delta: Duration) -> bool {
        if self.release_in.is_zero() {
            return false;
        }
        self.release_in = self.release_in.saturating_sub(delta);
        if !self.release_in.is_zero() {
            return false;
        }
        if self.mode == GhostMode::Eaten {
            self.mode = GhostMode::Patrol;
            self.roaming = GhostMode::Patrol;
        }
        true
    }

    pub fn frighten(&mut self) {
        match self.mode {
            GhostMode::Eaten | GhostMode::Scared => {}
            roaming => {
                self.roaming = roaming;
                self.mode = GhostMode::Scared;
            }
        }
    }

    pub fn calm(&mut self) {
        if self.mode == GhostMode::Scared {
            self.mode = self.roaming;
        }
    }

    /// Sends the ghost straight back to its spawn cell to wait out
    /// `return_delay`.
    pub fn mark_eaten(&mut self, return_delay: Duration) {
        self.mode = GhostMode::Eaten;
        self.actor.place(self.spawn);
        self.release_in = return_delay;
        debug!(spawn = %self.spawn, "ghost_eaten");
    }

    /// Back to spawn on the initial staggered schedule.
    pub fn respawn(&mut self) {
        self.actor.place(self.spawn);
        self.mode = GhostMode::Patrol;
        self.roaming = GhostMode::Patrol;
        self.release_in = self.release_delay;
    }

    pub fn advance(
        &mut self,
        delta: Duration,
        grid: &MazeGrid,
        player_cell: Pos,
        rng: &mut dyn RandomSource,
        pursuit_chance: f32,
    ) {
        if !self.is_active() {
            return;
        }
        let mode = self.mode;
        let mut roaming = self.roaming;
        self.actor.advance_with(delta, grid, |actor, grid| {
            let choice = choose_direction(actor, mode, player_cell, grid, &mut *rng, pursuit_chance);
            actor.intended = choice.map(|c| c.dir);
            if let Some(choice) = choice {
                if mode != GhostMode::Scared {
                    roaming = if choice.pursuing {
                        GhostMode::Pursue
                    } else {
                        GhostMode::Patrol
                    };
                }
            }
        });
        if mode != GhostMode::Scared {
            self.mode = roaming;
        }
        self.roaming = roaming;
    }
}

/// Picks the next heading at a cell center. Reversing is only allowed when it
/// is the sole way out; `None` means the ghost is boxed in and waits.
pub fn choose_direction(
    actor: &Actor,
    mode: GhostMode,
    player_cell: Pos,
    grid: &MazeGrid,
    rng: &mut dyn RandomSource,
    pursuit_chance: f32,
) -> Option<Choice> {
    let open: Vec<Dir> = Dir::ALL
        .into_iter()
        .filter(|dir| grid.can_move(actor.cell, *dir))
        .collect();
    let reverse = actor.direction.map(Dir::opposite);
    let forward: Vec<Dir> = open
        .iter()
        .copied()
        .filter(|dir| Some(*dir) != reverse)
        .collect();
    let options = if forward.is_empty() { open } else { forward };
    if options.is_empty() {
        return None;
    }

    if mode != GhostMode::Scared && rng.chance(pursuit_chance) {
        let mut best = options[0];
        let mut best_dist = u32::MAX;
        for dir in &options {
            let dist = grid.wrap(actor.cell.step(*dir)).manhattan(player_cell);
            if dist < best_dist {
                best = *dir;
                best_dist = dist;
            }
        }
        trace!(cell = %actor.cell, dir = ?best, "ghost_pursue");
        return Some(Choice {
            dir: best,
            pursuing: true,
        });
    }

    let dir = options[rng.index(options.len())];
    Some(Choice {
        dir,
        pursuing: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::rng::ScriptedRandom;

    //   0123456
    // 0 #######
    // 1 #P....#
    // 2 #.#.#.#
    // 3 #.....#
    // 4 #.###.#
    // 5 .......   tunnel
    // 6 #######
    fn grid() -> MazeGrid {
        Layout::parse(&["#######", "#P....#", "#.#.#.#", "#.....#", "#.###.#", ".......", "#######"])
            .unwrap()
            .build_grid()
            .unwrap()
    }

    fn actor_at(x: i32, y: i32, dir: Option<Dir>) -> Actor {
        let mut a = Actor::new(Pos::new(x, y), 5.0);
        a.direction = dir;
        a
    }

    #[test]
    fn never_reverses_when_another_way_exists() {
        let g = grid();
        // (3,1): open left, right, down; arrived heading Right.
        let a = actor_at(3, 1, Some(Dir::Right));
        for pick in 0..3 {
            let mut rng = ScriptedRandom::new([0.9], [pick]);
            let choice = choose_direction(&a, GhostMode::Patrol, Pos::new(1, 1), &g, &mut rng, PURSUIT_CHANCE).unwrap();
            assert_ne!(choice.dir, Dir::Left);
            assert!(!choice.pursuing);
        }
    }

    #[test]
    fn dead_end_allows_reverse() {
        let g = Layout::parse(&["#####", "#P..#", "#####", "  .  ", "#####"])
            .unwrap()
            .build_grid()
            .unwrap();
        let a = actor_at(3, 1, Some(Dir::Right));
        let mut rng = ScriptedRandom::wander();
        let choice = choose_direction(&a, GhostMode::Patrol, Pos::new(1, 1), &g, &mut rng, PURSUIT_CHANCE).unwrap();
        assert_eq!(choice.dir, Dir::Left);
    }

    #[test]
    fn pursuit_minimises_manhattan_distance() {
        let g = grid();
        let a = actor_at(3, 1, Some(Dir::Right));
        let mut rng = ScriptedRandom::new([0.29], Vec::<usize>::new());
        let choice = choose_direction(&a, GhostMode::Pursue, Pos::new(3, 3), &g, &mut rng, PURSUIT_CHANCE).unwrap();
        assert_eq!(
            choice,
            Choice {
                dir: Dir::Down,
                pursuing: true
            }
        );
    }

    #[test]
    fn roll_at_threshold_wanders() {
        let g = grid();
        let a = actor_at(3, 1, Some(Dir::Right));
        let mut rng = ScriptedRandom::new([0.3], [1]);
        let choice = choose_direction(&a, GhostMode::Patrol, Pos::new(3, 3), &g, &mut rng, PURSUIT_CHANCE).unwrap();
        // Candidates in scan order: Down, Right.
        assert_eq!(choice.dir, Dir::Right);
        assert!(!choice.pursuing);
    }

    #[test]
    fn scared_ghosts_always_wander() {
        let g = grid();
        let a = actor_at(3, 1, Some(Dir::Right));
        let mut rng = ScriptedRandom::pursue();
        let choice = choose_direction(&a, GhostMode::Scared, Pos::new(3, 3), &g, &mut rng, PURSUIT_CHANCE).unwrap();
        assert!(!choice.pursuing);
        assert_eq!(choice.dir, Dir::Down);
    }

    #[test]
    fn waits_for_release_then_moves() {
        let g = grid();
        let mut ghost = Ghost::new(Pos::new(1, 1), 5.0, Duration::from_millis(400));
        let mut rng = ScriptedRandom::wander();

        ghost.tick_release(Duration::from_millis(300));
        ghost.advance(Duration::from_millis(300), &g, Pos::new(5, 3), &mut rng, PURSUIT_CHANCE);
        assert_eq!(ghost.actor.position(), (1.0, 1.0));

        assert!(ghost.tick_release(Duration::from_millis(100)));
        ghost.advance(Duration::from_millis(100), &g, Pos::new(5, 3), &mut rng, PURSUIT_CHANCE);
        assert_ne!(ghost.actor.position(), (1.0, 1.0));
    }

    #[test]
    fn mode_records_the_branch_taken() {
        let g = grid();
        let mut ghost = Ghost::new(Pos::new(1, 1), 5.0, Duration::ZERO);
        let mut rng = ScriptedRandom::pursue();
        ghost.advance(Duration::from_millis(10), &g, Pos::new(5, 3), &mut rng, PURSUIT_CHANCE);
        assert_eq!(ghost.mode, GhostMode::Pursue);

        ghost.frighten();
        assert_eq!(ghost.mode, GhostMode::Scared);
        ghost.calm();
        assert_eq!(ghost.mode, GhostMode::Pursue);
    }

    #[test]
    fn eaten_ghost_returns_to_spawn_and_patrols() {
        let g = grid();
        let mut ghost = Ghost::new(Pos::new(1, 1), 5.0, Duration::ZERO);
        let mut rng = ScriptedRandom::wander();
        ghost.advance(Duration::from_millis(500), &g, Pos::new(5, 3), &mut rng, PURSUIT_CHANCE);
        ghost.frighten();

        ghost.mark_eaten(Duration::from_millis(200));
        assert_eq!(ghost.actor.position(), (1.0, 1.0));
        assert!(!ghost.is_active());

        ghost.frighten();
        assert_eq!(ghost.mode, GhostMode::Eaten);

        assert!(ghost.tick_release(Duration::from_millis(250)));
        assert_eq!(ghost.mode, GhostMode::Patrol);
        assert!(ghost.is_active());
    }
}
