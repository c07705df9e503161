#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Actor traversal along the installed pathway.
//!
//! Each live actor is driven by its own [`Traversal`] activity. The actor
//! appears on the first pathway cell at no time cost, then completes one
//! segment every `1 / speed` seconds. The world interpolates positions between
//! advances, so progress is continuous for every observer.

use std::time::Duration;

use path_defence_core::{ActorId, Command};
use path_defence_timeline::Step;
use path_defence_world::{query, World};

/// Activity that advances a single actor segment by segment until it arrives
/// or is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Traversal {
    actor: ActorId,
    started: bool,
}

impl Traversal {
    /// Creates a traversal for a freshly spawned actor.
    #[must_use]
    pub const fn new(actor: ActorId) -> Self {
        Self {
            actor,
            started: false,
        }
    }

    /// Actor driven by this traversal.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// Completes the current segment, if one is due, and schedules the next.
    ///
    /// The traversal ends once the actor no longer exists or the advance it
    /// emits carries the actor onto the final cell.
    pub fn step(&mut self, now: Duration, world: &World, out: &mut Vec<Command>) -> Step {
        let Some(segment_time) = query::actor_segment_time(world, self.actor) else {
            return Step::Done;
        };

        if !self.started {
            self.started = true;
            return Step::Sleep(segment_time);
        }

        let remaining = query::actor_remaining_segments(world, self.actor).unwrap_or(0);
        out.push(Command::AdvanceActor {
            actor: self.actor,
            at: now,
        });
        if remaining <= 1 {
            Step::Done
        } else {
            Step::Sleep(segment_time)
        }
    }
}
