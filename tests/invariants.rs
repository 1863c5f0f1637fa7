//! Long seeded runs on the built-in maze, checking the properties that must
//! hold after every tick.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use maze_chase::ghost::GhostMode;
use maze_chase::{
    Dir, Event, GameConfig, Layout, MazeGrid, MemoryHighScores, MemoryRewards, Phase, Pos, SeededRandom,
    Session,
};

fn session(seed: u64) -> Session<MemoryRewards, MemoryHighScores> {
    Session::init(
        &Layout::default_maze().unwrap(),
        GameConfig::default(),
        Box::new(SeededRandom::new(seed)),
        MemoryRewards::default(),
        MemoryHighScores::default(),
    )
    .unwrap()
}

fn is_dead_end(grid: &MazeGrid, cell: Pos, heading: Dir) -> bool {
    Dir::ALL
        .iter()
        .filter(|&&d| d != heading.opposite())
        .all(|&d| !grid.can_move(cell, d))
}

#[test]
fn seeded_runs_keep_every_invariant() {
    for seed in [1, 7, 42, 1234] {
        let mut s = session(seed);
        let mut input = StdRng::seed_from_u64(seed ^ 0xfeed);
        let mut prev_dirs: Vec<Option<Dir>> = s.ghosts().iter().map(|g| g.actor.direction).collect();
        let mut prev_score = 0;
        let mut finished = 0;

        for tick in 0..6000 {
            let dir = (tick % 25 == 0).then(|| Dir::ALL[input.gen_range(0..4)]);
            let delta = Duration::from_millis(input.gen_range(8..40));
            let events = s.update(delta, dir);
            let state = *s.state();

            assert_eq!(state.pellets_collected + state.pellets_remaining, state.total_pellets);
            assert!(state.score >= prev_score, "score never decreases");
            prev_score = state.score;
            if state.won {
                assert_eq!(state.pellets_remaining, 0);
            }

            let grid = s.grid();
            assert!(grid.in_bounds(s.player().cell));
            assert!(grid.is_passable(s.player().cell));
            for (idx, ghost) in s.ghosts().iter().enumerate() {
                assert!(grid.in_bounds(ghost.cell()));
                assert!(grid.is_passable(ghost.cell()));

                // Reversal only happens when nothing else was open.
                if let (Some(before), Some(now)) = (prev_dirs[idx], ghost.actor.direction) {
                    if now == before.opposite() {
                        assert!(is_dead_end(grid, ghost.cell(), before), "ghost {idx} reversed at {}", ghost.cell());
                    }
                }
                prev_dirs[idx] = ghost.actor.direction;
            }

            for event in &events {
                if let Event::GhostEaten { ghost, .. } = event {
                    assert!(!events.contains(&Event::PlayerCaptured {
                        ghost: *ghost,
                        lives_remaining: state.lives_remaining
                    }));
                    assert_eq!(s.ghosts()[*ghost].mode, GhostMode::Eaten);
                }
                if matches!(event, Event::Finished(_)) {
                    finished += 1;
                }
            }

            if s.phase().is_terminal() {
                break;
            }
        }

        assert!(finished <= 1);
        if s.phase().is_terminal() {
            assert_eq!(finished, 1);
            assert_eq!(s.rewards().payouts, 1);
        } else {
            assert!(matches!(s.phase(), Phase::Running | Phase::Resetting { .. }));
            assert_eq!(s.rewards().payouts, 0);
        }
    }
}

#[test]
fn same_seed_same_game() {
    let run = |seed| {
        let mut s = session(seed);
        let mut trace = Vec::new();
        for tick in 0..1500u32 {
            let dir = Dir::ALL[(tick / 40 % 4) as usize];
            s.update(Duration::from_millis(16), Some(dir));
            trace.push((s.state().score, s.ghosts().iter().map(|g| g.cell()).collect::<Vec<_>>()));
        }
        trace
    };
    assert_eq!(run(99), run(99));
}
