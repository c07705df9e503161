use std::time::Duration;

use path_defence_core::{Batch, Command, EnemyKind, Wave};
use path_defence_system_waves::WaveSpawn;
use path_defence_timeline::{Activity, Cx, Step, TaskId, Timeline};

#[derive(Debug, Default)]
struct Recorder {
    commands: Vec<(Duration, Command)>,
}

struct Spawner(WaveSpawn);

impl Activity for Spawner {
    type Context = Recorder;

    fn resume(&mut self, cx: &mut Cx<'_, Self>) -> Step {
        let now = cx.now();
        let mut out = Vec::new();
        let step = self.0.step(now, &mut out);
        cx.context_mut()
            .commands
            .extend(out.into_iter().map(|command| (now, command)));
        step
    }
}

fn spawn_times(recorder: &Recorder) -> Vec<Duration> {
    recorder
        .commands
        .iter()
        .filter(|(_, command)| matches!(command, Command::SpawnActor { .. }))
        .map(|(at, _)| *at)
        .collect()
}

fn schedule(wave: &Wave) -> (Timeline<Spawner>, TaskId) {
    let mut timeline = Timeline::new();
    let task = timeline.schedule(Spawner(WaveSpawn::new(wave)));
    (timeline, task)
}

#[test]
fn three_spawns_one_second_apart_then_two_second_offset() {
    let wave = Wave::new(
        30.0,
        0,
        vec![Batch::new(EnemyKind::Normal, 3, 1.0, 2.0)],
    );
    let (mut timeline, task) = schedule(&wave);
    let mut recorder = Recorder::default();

    timeline.advance(Duration::from_millis(3_900), &mut recorder);
    assert_eq!(
        spawn_times(&recorder),
        vec![
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(2)
        ]
    );
    assert!(timeline.contains(task), "offset after the last spawn is still running");

    timeline.advance(Duration::from_millis(100), &mut recorder);
    assert!(!timeline.contains(task), "batch activity completes at four seconds");
}

#[test]
fn spawning_finishes_with_final_actor_not_after_offset() {
    let wave = Wave::new(
        30.0,
        0,
        vec![
            Batch::new(EnemyKind::Fast, 2, 4.0, 1.0),
            Batch::new(EnemyKind::Slow, 2, 1.0, 5.0),
        ],
    );
    let (mut timeline, _) = schedule(&wave);
    let mut recorder = Recorder::default();

    timeline.advance(Duration::from_secs(10), &mut recorder);

    assert_eq!(
        spawn_times(&recorder),
        vec![
            Duration::ZERO,
            Duration::from_millis(250),
            Duration::from_millis(1_250),
            Duration::from_millis(2_250),
        ]
    );
    let finished_at = recorder
        .commands
        .iter()
        .find(|(_, command)| *command == Command::FinishSpawning)
        .map(|(at, _)| *at);
    assert_eq!(finished_at, Some(Duration::from_millis(2_250)));
}

#[test]
fn tick_size_does_not_shift_spawn_times() {
    let wave = Wave::new(
        30.0,
        0,
        vec![
            Batch::new(EnemyKind::Normal, 4, 3.0, 0.5),
            Batch::new(EnemyKind::Fast, 3, 2.0, 0.0),
        ],
    );

    let (mut coarse, _) = schedule(&wave);
    let mut coarse_recorder = Recorder::default();
    coarse.advance(Duration::from_secs(5), &mut coarse_recorder);

    let (mut fine, _) = schedule(&wave);
    let mut fine_recorder = Recorder::default();
    for _ in 0..300 {
        fine.advance(Duration::from_millis(16), &mut fine_recorder);
    }

    assert_eq!(coarse_recorder.commands, fine_recorder.commands);
}
