#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduling activities.
//!
//! [`ScheduleRun`] walks the wave schedule: a skippable cooldown before each
//! wave, the wave's own skippable duration, the completion reward, and finally
//! a drain that waits for the population to empty. Each started wave gets its
//! own [`WaveSpawn`] activity that emits the wave's batches concurrently with
//! the schedule's countdowns.

use std::time::Duration;

use path_defence_core::{Batch, Command, Countdown, SchedulePhase, Wave, WaveSchedule};
use path_defence_timeline::{Step, Wake};
use path_defence_world::{query, World};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Begin,
    Cooldown { wave: usize },
    Running { wave: usize },
    Draining,
    Finished,
}

/// Activity that drives a whole wave schedule from the first cooldown to the
/// outcome.
#[derive(Clone, Debug)]
pub struct ScheduleRun {
    schedule: WaveSchedule,
    cooldown: Duration,
    stage: Stage,
}

impl ScheduleRun {
    /// Creates a run over `schedule` that waits `cooldown` before every wave.
    #[must_use]
    pub fn new(schedule: WaveSchedule, cooldown: Duration) -> Self {
        Self {
            schedule,
            cooldown,
            stage: Stage::Begin,
        }
    }

    /// Phase the run is currently in.
    #[must_use]
    pub fn phase(&self) -> SchedulePhase {
        match self.stage {
            Stage::Begin => SchedulePhase::Idle,
            Stage::Cooldown { wave } => SchedulePhase::Cooldown { wave },
            Stage::Running { wave } => SchedulePhase::Wave { wave },
            Stage::Draining => SchedulePhase::Draining,
            Stage::Finished => SchedulePhase::Finished,
        }
    }

    /// Advances the run after a wake-up, emitting the commands of the transition.
    pub fn step(&mut self, now: Duration, wake: Wake, out: &mut Vec<Command>) -> Step {
        match self.stage {
            Stage::Begin => self.enter_cooldown(0, now, out),
            Stage::Cooldown { wave } => {
                if wake == Wake::Interrupted {
                    debug!(wave, "cooldown_skipped");
                }
                self.start_wave(wave, now, out)
            }
            Stage::Running { wave } => {
                if wake == Wake::Interrupted {
                    debug!(wave, "wave_duration_skipped");
                }
                let reward = self.schedule.get(wave).map_or(0, Wave::reward);
                out.push(Command::PayWaveReward {
                    wave,
                    amount: reward,
                });
                self.enter_cooldown(wave + 1, now, out)
            }
            Stage::Draining => {
                self.stage = Stage::Finished;
                out.push(Command::ResolveOutcome);
                Step::Done
            }
            Stage::Finished => Step::Done,
        }
    }

    /// Drain condition: no live actors and no wave still emitting.
    #[must_use]
    pub fn ready(&self, world: &World) -> bool {
        match self.stage {
            Stage::Draining => query::population(world) == 0 && !query::is_spawning(world),
            _ => true,
        }
    }

    fn enter_cooldown(&mut self, wave: usize, now: Duration, out: &mut Vec<Command>) -> Step {
        if wave >= self.schedule.len() {
            return self.enter_drain(out);
        }

        self.stage = Stage::Cooldown { wave };
        out.push(Command::PublishPhase {
            phase: SchedulePhase::Cooldown { wave },
            countdown: Countdown::Ends {
                at: now.saturating_add(self.cooldown),
            },
        });
        Step::Countdown(self.cooldown)
    }

    fn start_wave(&mut self, wave: usize, now: Duration, out: &mut Vec<Command>) -> Step {
        info!(wave, at_ms = now.as_millis() as u64, "wave_started");
        out.push(Command::StartWave { wave });

        if self.schedule.is_last(wave) {
            return self.enter_drain(out);
        }

        let duration = self.schedule.get(wave).map_or(Duration::ZERO, Wave::duration);
        self.stage = Stage::Running { wave };
        out.push(Command::PublishPhase {
            phase: SchedulePhase::Wave { wave },
            countdown: Countdown::Ends {
                at: now.saturating_add(duration),
            },
        });
        Step::Countdown(duration)
    }

    fn enter_drain(&mut self, out: &mut Vec<Command>) -> Step {
        self.stage = Stage::Draining;
        out.push(Command::PublishPhase {
            phase: SchedulePhase::Draining,
            countdown: Countdown::Unbounded,
        });
        Step::Until
    }
}

/// Activity that emits one wave's batches in order.
///
/// Actors of a batch are emitted `1 / rate` seconds apart with no interval
/// after the final actor; the batch's offset then elapses before the next
/// batch starts. Spawning is reported finished right after the wave's final
/// actor is emitted.
#[derive(Clone, Debug)]
pub struct WaveSpawn {
    batches: Vec<Batch>,
    batch: usize,
    emitted: u32,
    finished: bool,
}

impl WaveSpawn {
    /// Creates the spawn activity for `wave`.
    #[must_use]
    pub fn new(wave: &Wave) -> Self {
        Self {
            batches: wave.batches().to_vec(),
            batch: 0,
            emitted: 0,
            finished: false,
        }
    }

    /// Emits the actors due at `now` and reports how long to wait next.
    pub fn step(&mut self, now: Duration, out: &mut Vec<Command>) -> Step {
        let Some(batch) = self.batches.get(self.batch).copied() else {
            self.finish(out);
            return Step::Done;
        };

        if self.emitted < batch.count() {
            out.push(Command::SpawnActor {
                kind: batch.kind(),
                at: now,
            });
            self.emitted += 1;
            if self.emitted < batch.count() {
                return Step::Sleep(batch.period());
            }
        }

        self.batch += 1;
        self.emitted = 0;
        if self.batch >= self.batches.len() {
            self.finish(out);
        }
        Step::Sleep(batch.offset())
    }

    fn finish(&mut self, out: &mut Vec<Command>) {
        if !self.finished {
            self.finished = true;
            out.push(Command::FinishSpawning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ScheduleRun, WaveSpawn};
    use path_defence_core::{
        Batch, Command, Countdown, EnemyKind, SchedulePhase, Wave, WaveSchedule,
    };
    use path_defence_timeline::{Step, Wake};
    use std::time::Duration;

    fn wave(duration: f32, reward: u32) -> Wave {
        Wave::new(
            duration,
            reward,
            vec![Batch::new(EnemyKind::Normal, 1, 1.0, 0.0)],
        )
    }

    #[test]
    fn run_walks_cooldown_wave_and_drain() {
        let schedule = WaveSchedule::new(vec![wave(10.0, 25), wave(5.0, 0)]);
        let mut run = ScheduleRun::new(schedule, Duration::from_secs(3));
        let mut out = Vec::new();

        let step = run.step(Duration::ZERO, Wake::Start, &mut out);
        assert_eq!(step, Step::Countdown(Duration::from_secs(3)));
        assert_eq!(
            out,
            vec![Command::PublishPhase {
                phase: SchedulePhase::Cooldown { wave: 0 },
                countdown: Countdown::Ends {
                    at: Duration::from_secs(3)
                },
            }]
        );

        out.clear();
        let step = run.step(Duration::from_secs(3), Wake::Elapsed, &mut out);
        assert_eq!(step, Step::Countdown(Duration::from_secs(10)));
        assert_eq!(out[0], Command::StartWave { wave: 0 });
        assert_eq!(run.phase(), SchedulePhase::Wave { wave: 0 });

        out.clear();
        let step = run.step(Duration::from_secs(13), Wake::Elapsed, &mut out);
        assert_eq!(step, Step::Countdown(Duration::from_secs(3)));
        assert_eq!(
            out[0],
            Command::PayWaveReward {
                wave: 0,
                amount: 25
            }
        );

        out.clear();
        let step = run.step(Duration::from_secs(14), Wake::Interrupted, &mut out);
        assert_eq!(step, Step::Until);
        assert_eq!(
            out,
            vec![
                Command::StartWave { wave: 1 },
                Command::PublishPhase {
                    phase: SchedulePhase::Draining,
                    countdown: Countdown::Unbounded,
                },
            ]
        );

        out.clear();
        assert_eq!(
            run.step(Duration::from_secs(20), Wake::Ready, &mut out),
            Step::Done
        );
        assert_eq!(out, vec![Command::ResolveOutcome]);
    }

    #[test]
    fn batches_space_spawns_without_trailing_interval() {
        let wave = Wave::new(
            0.0,
            0,
            vec![
                Batch::new(EnemyKind::Fast, 2, 2.0, 1.0),
                Batch::new(EnemyKind::Slow, 1, 1.0, 3.0),
            ],
        );
        let mut spawn = WaveSpawn::new(&wave);
        let mut out = Vec::new();

        assert_eq!(
            spawn.step(Duration::ZERO, &mut out),
            Step::Sleep(Duration::from_millis(500))
        );
        assert_eq!(
            spawn.step(Duration::from_millis(500), &mut out),
            Step::Sleep(Duration::from_secs(1))
        );
        assert_eq!(
            spawn.step(Duration::from_millis(1500), &mut out),
            Step::Sleep(Duration::from_secs(3))
        );
        assert_eq!(spawn.step(Duration::from_millis(4500), &mut out), Step::Done);

        assert_eq!(
            out,
            vec![
                Command::SpawnActor {
                    kind: EnemyKind::Fast,
                    at: Duration::ZERO
                },
                Command::SpawnActor {
                    kind: EnemyKind::Fast,
                    at: Duration::from_millis(500)
                },
                Command::SpawnActor {
                    kind: EnemyKind::Slow,
                    at: Duration::from_millis(1500)
                },
                Command::FinishSpawning,
            ]
        );
    }

    #[test]
    fn empty_wave_reports_finished_immediately() {
        let wave = Wave::new(1.0, 0, Vec::new());
        let mut spawn = WaveSpawn::new(&wave);
        let mut out = Vec::new();

        assert_eq!(spawn.step(Duration::ZERO, &mut out), Step::Done);
        assert_eq!(out, vec![Command::FinishSpawning]);
    }
}
