use crate::actor::Actor;
use crate::ghost::{Ghost, GhostMode};

/// Capture distance in cells, measured between continuous positions.
pub const CAPTURE_RADIUS: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// The player ate a scared ghost.
    GhostEaten(usize),
    /// A dangerous ghost caught the player.
    PlayerCaptured(usize),
}

/// Proximity check of the player against every ghost. `sampled` holds each
/// ghost's mode as it stood at the start of the tick, so one ghost yields at
/// most one outcome per tick whatever happened to its mode since.
pub fn resolve(player: &Actor, ghosts: &[Ghost], sampled: &[GhostMode], radius: f32) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for (idx, (ghost, mode)) in ghosts.iter().zip(sampled).enumerate() {
        if ghost.mode == GhostMode::Eaten {
            continue;
        }
        if player.distance_to(&ghost.actor) >= radius {
            continue;
        }
        match mode {
            GhostMode::Scared => contacts.push(Contact::GhostEaten(idx)),
            GhostMode::Patrol | GhostMode::Pursue => contacts.push(Contact::PlayerCaptured(idx)),
            GhostMode::Eaten => {}
        }
    }
    contacts
}
