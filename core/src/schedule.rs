//! Wave schedule definitions consumed by the wave scheduler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{tables::seconds_per, EnemyKind};

/// Group of identical enemies emitted at a fixed rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    kind: EnemyKind,
    count: u32,
    rate: f32,
    #[serde(default)]
    offset_next: f32,
}

impl Batch {
    /// Creates a batch emitting `count` enemies at `rate` per second, then
    /// waiting `offset_next` seconds before the following batch.
    #[must_use]
    pub const fn new(kind: EnemyKind, count: u32, rate: f32, offset_next: f32) -> Self {
        Self {
            kind,
            count,
            rate,
            offset_next,
        }
    }

    /// Enemy type emitted by the batch.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Number of enemies emitted.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Enemies emitted per second.
    #[must_use]
    pub const fn rate(&self) -> f32 {
        self.rate
    }

    /// Seconds waited after the final emission before the next batch.
    #[must_use]
    pub const fn offset_next(&self) -> f32 {
        self.offset_next
    }

    /// Interval between consecutive emissions.
    #[must_use]
    pub fn period(&self) -> Duration {
        seconds_per(self.rate)
    }

    /// Delay between the final emission and the next batch.
    #[must_use]
    pub fn offset(&self) -> Duration {
        if self.offset_next > 0.0 {
            Duration::try_from_secs_f32(self.offset_next).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

/// Ordered batches plus the wave's running time and completion reward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    duration: f32,
    reward: u32,
    batches: Vec<Batch>,
}

impl Wave {
    /// Creates a wave description.
    #[must_use]
    pub fn new(duration: f32, reward: u32, batches: Vec<Batch>) -> Self {
        Self {
            duration,
            reward,
            batches,
        }
    }

    /// Seconds the wave runs before the next cooldown begins.
    #[must_use]
    pub const fn duration_secs(&self) -> f32 {
        self.duration
    }

    /// Running time of the wave.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.duration > 0.0 {
            Duration::try_from_secs_f32(self.duration).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// Cash paid when the wave's duration elapses.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Batches in emission order.
    #[must_use]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Total number of enemies the wave emits.
    #[must_use]
    pub fn enemy_count(&self) -> u64 {
        self.batches.iter().map(|batch| u64::from(batch.count)).sum()
    }
}

/// Ordered list of waves played in a single game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveSchedule {
    waves: Vec<Wave>,
}

impl WaveSchedule {
    /// Wraps the provided waves.
    #[must_use]
    pub fn new(waves: Vec<Wave>) -> Self {
        Self { waves }
    }

    /// Waves in play order.
    #[must_use]
    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    /// Wave at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Wave> {
        self.waves.get(index)
    }

    /// Number of waves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether the schedule holds no waves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Reports whether the index names the final wave.
    #[must_use]
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.waves.len()
    }
}
