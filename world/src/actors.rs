//! Live actor storage and pathway progress.

use std::{collections::BTreeMap, time::Duration};

use path_defence_core::{ActorId, EnemyKind, EnemyStats};

/// State of a single actor travelling the pathway.
#[derive(Clone, Debug)]
pub(crate) struct Actor {
    pub(crate) id: ActorId,
    pub(crate) kind: EnemyKind,
    pub(crate) health: u32,
    pub(crate) reward: u32,
    /// Number of segments fully completed.
    pub(crate) segment: usize,
    pub(crate) segment_started: Duration,
    pub(crate) segment_time: Duration,
}

impl Actor {
    /// Continuous progress in segments, capped at `segment_count`.
    pub(crate) fn traveled(&self, now: Duration, segment_count: usize) -> f32 {
        let fraction = if self.segment_time.is_zero() {
            1.0
        } else {
            let elapsed = now.saturating_sub(self.segment_started);
            (elapsed.as_secs_f32() / self.segment_time.as_secs_f32()).clamp(0.0, 1.0)
        };
        let progress = self.segment as f32 + fraction;
        progress.min(segment_count as f32)
    }
}

/// Registry that stores actors and allocates identifiers in spawn order.
#[derive(Debug)]
pub(crate) struct ActorRegistry {
    entries: BTreeMap<ActorId, Actor>,
    next_actor_id: u32,
}

impl ActorRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_actor_id: 0,
        }
    }

    pub(crate) fn spawn(&mut self, stats: &EnemyStats, at: Duration) -> ActorId {
        let id = ActorId::new(self.next_actor_id);
        self.next_actor_id = self.next_actor_id.wrapping_add(1);
        let actor = Actor {
            id,
            kind: stats.kind(),
            health: stats.health(),
            reward: stats.reward(),
            segment: 0,
            segment_started: at,
            segment_time: stats.segment_time(),
        };
        let _ = self.entries.insert(id, actor);
        id
    }

    pub(crate) fn get(&self, id: ActorId) -> Option<&Actor> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every actor while keeping the identifier counter monotonic.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
