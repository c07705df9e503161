#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Virtual-time runner for long-lived cooperative activities.
//!
//! Activities are state machines that yield a [`Step`] each time they are
//! resumed. The [`Timeline`] keeps them ordered by wake time and resumes every
//! due activity at its exact virtual instant, so the result of a simulation
//! does not depend on how the caller slices time into `advance` calls.
//! Activities resumed at the same instant run in ascending [`TaskId`] order.

use std::{collections::BTreeMap, time::Duration};

/// Identifier of a scheduled activity, allocated in scheduling order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// What an activity waits for after yielding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Resume after the duration elapsed. Interrupts are ignored.
    Sleep(Duration),
    /// Resume after the duration elapsed, or earlier when interrupted.
    Countdown(Duration),
    /// Resume once [`Activity::ready`] reports true.
    Until,
    /// The activity finished and is dropped.
    Done,
}

/// Reason an activity was resumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
    /// First resume after scheduling.
    Start,
    /// The requested sleep or countdown elapsed.
    Elapsed,
    /// A countdown was cut short by [`Cx::interrupt`] or [`Timeline::interrupt`].
    Interrupted,
    /// The readiness condition of an [`Step::Until`] wait became true.
    Ready,
}

/// Cooperative activity driven by a [`Timeline`].
pub trait Activity: Sized {
    /// Shared state handed to every resume.
    type Context;

    /// Runs the activity until its next wait point.
    fn resume(&mut self, cx: &mut Cx<'_, Self>) -> Step;

    /// Readiness condition consulted while the activity waits in [`Step::Until`].
    fn ready(&self, _context: &Self::Context) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    At { at: Duration, interruptible: bool },
    Until,
}

#[derive(Debug)]
struct Entry<A> {
    activity: A,
    pending: Pending,
    wake: Wake,
}

#[derive(Debug)]
struct Queue<A> {
    next_id: u64,
    entries: BTreeMap<TaskId, Entry<A>>,
}

impl<A> Queue<A> {
    fn insert(&mut self, activity: A, at: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let entry = Entry {
            activity,
            pending: Pending::At {
                at,
                interruptible: false,
            },
            wake: Wake::Start,
        };
        let _ = self.entries.insert(id, entry);
        id
    }

    fn interrupt(&mut self, id: TaskId, now: Duration) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        match entry.pending {
            Pending::At {
                interruptible: true,
                ..
            } => {
                entry.pending = Pending::At {
                    at: now,
                    interruptible: false,
                };
                entry.wake = Wake::Interrupted;
                true
            }
            _ => false,
        }
    }
}

/// Handle given to an activity while it runs.
pub struct Cx<'a, A: Activity> {
    now: Duration,
    id: TaskId,
    wake: Wake,
    queue: &'a mut Queue<A>,
    context: &'a mut A::Context,
}

impl<'a, A: Activity> Cx<'a, A> {
    /// Virtual time of this resume.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Identifier of the running activity.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Reason for this resume.
    #[must_use]
    pub fn wake(&self) -> Wake {
        self.wake
    }

    /// Shared context.
    #[must_use]
    pub fn context(&self) -> &A::Context {
        &*self.context
    }

    /// Mutable shared context.
    pub fn context_mut(&mut self) -> &mut A::Context {
        &mut *self.context
    }

    /// Schedules a new activity to start at the current instant.
    pub fn spawn(&mut self, activity: A) -> TaskId {
        self.queue.insert(activity, self.now)
    }

    /// Cuts short a pending countdown of another activity.
    pub fn interrupt(&mut self, id: TaskId) -> bool {
        self.queue.interrupt(id, self.now)
    }
}

/// Ordered set of activities advanced in virtual time.
#[derive(Debug)]
pub struct Timeline<A> {
    now: Duration,
    queue: Queue<A>,
}

impl<A: Activity> Default for Timeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Activity> Timeline<A> {
    /// Creates an empty timeline at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            queue: Queue {
                next_id: 0,
                entries: BTreeMap::new(),
            },
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules an activity to start at the current instant.
    pub fn schedule(&mut self, activity: A) -> TaskId {
        self.queue.insert(activity, self.now)
    }

    /// Cuts short a pending countdown. Returns false when the activity is not
    /// waiting in a countdown.
    pub fn interrupt(&mut self, id: TaskId) -> bool {
        self.queue.interrupt(id, self.now)
    }

    /// Drops an activity without resuming it again.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.queue.entries.remove(&id).is_some()
    }

    /// Drops every activity. Time is preserved.
    pub fn clear(&mut self) {
        self.queue.entries.clear();
    }

    /// Reports whether the activity is still scheduled.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.queue.entries.contains_key(&id)
    }

    /// Number of scheduled activities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.entries.len()
    }

    /// Reports whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.entries.is_empty()
    }

    /// Advances virtual time by `dt`, resuming every activity that becomes due.
    ///
    /// A zero `dt` only runs activities due at the current instant.
    pub fn advance(&mut self, dt: Duration, context: &mut A::Context) {
        let target = self.now.saturating_add(dt);

        while let Some((at, id)) = self.next_due(target, &*context) {
            let Some(entry) = self.queue.entries.remove(&id) else {
                break;
            };
            self.now = self.now.max(at);

            let Entry {
                mut activity, wake, ..
            } = entry;
            let step = {
                let mut cx = Cx {
                    now: self.now,
                    id,
                    wake,
                    queue: &mut self.queue,
                    context: &mut *context,
                };
                activity.resume(&mut cx)
            };

            let (pending, wake) = match step {
                Step::Sleep(delay) => (
                    Pending::At {
                        at: self.now.saturating_add(delay),
                        interruptible: false,
                    },
                    Wake::Elapsed,
                ),
                Step::Countdown(delay) => (
                    Pending::At {
                        at: self.now.saturating_add(delay),
                        interruptible: true,
                    },
                    Wake::Elapsed,
                ),
                Step::Until => (Pending::Until, Wake::Ready),
                Step::Done => continue,
            };
            let _ = self.queue.entries.insert(
                id,
                Entry {
                    activity,
                    pending,
                    wake,
                },
            );
        }

        self.now = target;
    }

    fn next_due(&self, target: Duration, context: &A::Context) -> Option<(Duration, TaskId)> {
        self.queue
            .entries
            .iter()
            .filter_map(|(id, entry)| match entry.pending {
                Pending::At { at, .. } if at <= target => Some((at, *id)),
                Pending::At { .. } => None,
                Pending::Until => entry.activity.ready(context).then_some((self.now, *id)),
            })
            .min()
    }
}
