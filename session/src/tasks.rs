//! Activities multiplexed onto the session timeline.

use std::time::Duration;

use path_defence_core::{Command, Event, WaveSchedule};
use path_defence_system_movement::Traversal;
use path_defence_system_tower_targeting::FireLoop;
use path_defence_system_waves::{ScheduleRun, WaveSpawn};
use path_defence_timeline::{Activity, Cx, Step, TaskId, Timeline};
use path_defence_world::{self as world, query, World};
use tracing::debug;

use crate::Stamped;

/// Every kind of timed activity a game runs.
#[derive(Debug)]
pub(crate) enum Task {
    Schedule(ScheduleRun),
    Spawn(WaveSpawn),
    Traverse(Traversal),
    Fire(FireLoop),
}

impl Activity for Task {
    type Context = Sim;

    fn resume(&mut self, cx: &mut Cx<'_, Self>) -> Step {
        if query::outcome(&cx.context().world).is_some() {
            return Step::Done;
        }

        let now = cx.now();
        let mut commands = Vec::new();
        let step = match self {
            Task::Schedule(run) => run.step(now, cx.wake(), &mut commands),
            Task::Spawn(spawn) => spawn.step(now, &mut commands),
            Task::Traverse(traversal) => traversal.step(now, &cx.context().world, &mut commands),
            Task::Fire(fire) => fire.step(now, &cx.context().world, &mut commands),
        };

        let reactions = cx.context_mut().apply(now, commands);
        if let Some(id) = dispatch(cx, reactions) {
            cx.context_mut().schedule_task = Some(id);
        }
        step
    }

    fn ready(&self, context: &Sim) -> bool {
        match self {
            Task::Schedule(run) => run.ready(&context.world),
            _ => true,
        }
    }
}

/// Follow-up work an applied event asks the timeline to perform.
#[derive(Debug)]
pub(crate) enum Reaction {
    Start(Task),
    Interrupt(TaskId),
}

/// Shared state every activity reads and mutates through commands.
#[derive(Debug)]
pub(crate) struct Sim {
    pub(crate) world: World,
    pub(crate) schedule: WaveSchedule,
    pub(crate) cooldown: Duration,
    pub(crate) schedule_task: Option<TaskId>,
    pub(crate) journal: Vec<Stamped>,
}

impl Sim {
    pub(crate) fn new(world: World, schedule: WaveSchedule, cooldown: Duration) -> Self {
        Self {
            world,
            schedule,
            cooldown,
            schedule_task: None,
            journal: Vec::new(),
        }
    }

    /// Applies commands in order, journals the resulting events and collects
    /// the activities they start or interrupt.
    pub(crate) fn apply(&mut self, now: Duration, commands: Vec<Command>) -> Vec<Reaction> {
        let mut events = Vec::new();
        let mut reactions = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
            for event in events.drain(..) {
                reactions.extend(self.react(&event));
                self.journal.push(Stamped { at: now, event });
            }
        }
        reactions
    }

    fn react(&self, event: &Event) -> Option<Reaction> {
        match event {
            Event::ScheduleBegan => Some(Reaction::Start(Task::Schedule(ScheduleRun::new(
                self.schedule.clone(),
                self.cooldown,
            )))),
            Event::WaveStarted { wave } => self
                .schedule
                .get(*wave)
                .map(|wave| Reaction::Start(Task::Spawn(WaveSpawn::new(wave)))),
            Event::ActorSpawned { actor, .. } => {
                Some(Reaction::Start(Task::Traverse(Traversal::new(*actor))))
            }
            Event::FireLoopStarted { tower } => {
                Some(Reaction::Start(Task::Fire(FireLoop::new(*tower))))
            }
            Event::CooldownSkipRequested => {
                debug!(task = ?self.schedule_task, "countdown_skip_requested");
                self.schedule_task.map(Reaction::Interrupt)
            }
            _ => None,
        }
    }
}

/// Destination for reactions: the timeline itself, or a running activity's
/// handle while the timeline is busy.
pub(crate) trait TaskSink {
    fn start_task(&mut self, task: Task) -> TaskId;

    fn interrupt_task(&mut self, id: TaskId) -> bool;
}

impl TaskSink for Cx<'_, Task> {
    fn start_task(&mut self, task: Task) -> TaskId {
        self.spawn(task)
    }

    fn interrupt_task(&mut self, id: TaskId) -> bool {
        self.interrupt(id)
    }
}

impl TaskSink for Timeline<Task> {
    fn start_task(&mut self, task: Task) -> TaskId {
        self.schedule(task)
    }

    fn interrupt_task(&mut self, id: TaskId) -> bool {
        self.interrupt(id)
    }
}

/// Performs the reactions and reports the id of a newly started schedule run.
pub(crate) fn dispatch(sink: &mut impl TaskSink, reactions: Vec<Reaction>) -> Option<TaskId> {
    let mut schedule_task = None;
    for reaction in reactions {
        match reaction {
            Reaction::Start(task) => {
                let is_schedule = matches!(task, Task::Schedule(_));
                let id = sink.start_task(task);
                if is_schedule {
                    schedule_task = Some(id);
                }
            }
            Reaction::Interrupt(id) => {
                let _ = sink.interrupt_task(id);
            }
        }
    }
    schedule_task
}
