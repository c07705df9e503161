#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower range tracking and highest-progress target selection.
//!
//! [`TowerTargeting`] is a pure system that compares tower and actor snapshots
//! and emits the range entries and exits the world has not seen yet. Each
//! tower with a non-empty target set is driven by a [`FireLoop`] activity that
//! re-selects its target on every shot.

use std::time::Duration;

use path_defence_core::{ActorId, ActorView, Command, TowerId, TowerView, WorldPoint};
use path_defence_timeline::Step;
use path_defence_world::{query, World};

/// Range tracking system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    changes: Vec<RangeChange>,
    actor_workspace: Vec<ActorCandidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `EnterRange` and `ExitRange` commands that reconcile every
    /// tower's target set with the actors currently inside its radius.
    ///
    /// Commands are ordered by tower id, then by actor id. Actors exactly on
    /// the range boundary count as inside.
    pub fn handle(&mut self, towers: &TowerView, actors: &ActorView, out: &mut Vec<Command>) {
        if towers.is_empty() {
            return;
        }

        self.prepare_actor_workspace(actors);

        for tower in towers.iter() {
            self.changes.clear();
            let reach = tower.range * tower.range;

            for candidate in &self.actor_workspace {
                let inside = candidate.position.distance_squared(tower.position) <= reach;
                let known = tower.targets.binary_search(&candidate.id).is_ok();
                match (inside, known) {
                    (true, false) => self.changes.push(RangeChange::Enter(candidate.id)),
                    (false, true) => self.changes.push(RangeChange::Exit(candidate.id)),
                    _ => {}
                }
            }

            for change in &self.changes {
                out.push(change.into_command(tower.id));
            }
        }
    }

    fn prepare_actor_workspace(&mut self, actors: &ActorView) {
        self.actor_workspace.clear();
        self.actor_workspace.reserve(actors.len());
        self.actor_workspace
            .extend(actors.iter().map(|snapshot| ActorCandidate {
                id: snapshot.id,
                position: snapshot.position,
            }));
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActorCandidate {
    id: ActorId,
    position: WorldPoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RangeChange {
    Enter(ActorId),
    Exit(ActorId),
}

impl RangeChange {
    fn into_command(self, tower: TowerId) -> Command {
        match self {
            Self::Enter(actor) => Command::EnterRange { tower, actor },
            Self::Exit(actor) => Command::ExitRange { tower, actor },
        }
    }
}

/// Picks the target with the greatest progress along the pathway.
///
/// Ties go to the lowest actor id, which is the earliest spawned actor.
/// Targets whose progress is unknown are skipped.
#[must_use]
pub fn select_target<F>(targets: &[ActorId], progress: F) -> Option<ActorId>
where
    F: Fn(ActorId) -> Option<f32>,
{
    let mut best: Option<(ActorId, f32)> = None;
    for &actor in targets {
        let Some(traveled) = progress(actor) else {
            continue;
        };
        let replace = match best {
            Some((best_actor, best_traveled)) => {
                traveled > best_traveled || (traveled == best_traveled && actor < best_actor)
            }
            None => true,
        };
        if replace {
            best = Some((actor, traveled));
        }
    }
    best.map(|(actor, _)| actor)
}

/// Activity that fires a single tower until its target set empties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FireLoop {
    tower: TowerId,
}

impl FireLoop {
    /// Creates the fire loop for `tower`.
    #[must_use]
    pub const fn new(tower: TowerId) -> Self {
        Self { tower }
    }

    /// Tower driven by this loop.
    #[must_use]
    pub const fn tower(&self) -> TowerId {
        self.tower
    }

    /// Fires at the current best target and waits one fire interval.
    ///
    /// When no target remains the loop asks the world to mark the tower idle
    /// and ends; the next range entry starts a fresh loop.
    pub fn step(&mut self, now: Duration, world: &World, out: &mut Vec<Command>) -> Step {
        let Some(tower) = query::tower(world, self.tower) else {
            return Step::Done;
        };

        let target = select_target(&tower.targets, |actor| {
            query::actor_traveled(world, actor, now)
        });
        let Some(actor) = target else {
            out.push(Command::StopFiring { tower: self.tower });
            return Step::Done;
        };

        out.push(Command::DamageActor {
            actor,
            amount: tower.attack,
        });
        Step::Sleep(tower.fire_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::{select_target, TowerTargeting};
    use path_defence_core::{
        ActorId, ActorSnapshot, ActorView, Address, Command, EnemyKind, TowerId, TowerKind,
        TowerSnapshot, TowerView, WorldPoint,
    };
    use std::time::Duration;

    fn tower(id: u32, at: (f32, f32), range: f32, targets: Vec<u32>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Basic,
            cell: Address::new(0, 0),
            position: WorldPoint::new(at.0, at.1),
            range,
            attack: 1,
            fire_interval: Duration::from_secs(1),
            firing: !targets.is_empty(),
            targets: targets.into_iter().map(ActorId::new).collect(),
        }
    }

    fn actor(id: u32, at: (f32, f32)) -> ActorSnapshot {
        ActorSnapshot {
            id: ActorId::new(id),
            kind: EnemyKind::Normal,
            health: 10,
            traveled: 0.0,
            position: WorldPoint::new(at.0, at.1),
        }
    }

    #[test]
    fn actor_inside_range_enters_once() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, (0.0, 0.0), 2.0, vec![])]);
        let actors = ActorView::from_snapshots(vec![actor(4, (1.0, 1.0)), actor(5, (3.0, 0.0))]);
        let mut out = Vec::new();

        system.handle(&towers, &actors, &mut out);

        assert_eq!(
            out,
            vec![Command::EnterRange {
                tower: TowerId::new(0),
                actor: ActorId::new(4),
            }]
        );
    }

    #[test]
    fn boundary_counts_as_inside() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, (0.0, 0.0), 2.0, vec![])]);
        let actors = ActorView::from_snapshots(vec![actor(1, (2.0, 0.0))]);
        let mut out = Vec::new();

        system.handle(&towers, &actors, &mut out);

        assert_eq!(out.len(), 1);
    }

    #[test]
    fn known_target_leaving_range_exits() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![
            tower(1, (0.0, 0.0), 1.0, vec![2, 3]),
            tower(0, (10.0, 0.0), 1.0, vec![]),
        ]);
        let actors = ActorView::from_snapshots(vec![actor(2, (0.5, 0.0)), actor(3, (5.0, 0.0))]);
        let mut out = Vec::new();

        system.handle(&towers, &actors, &mut out);

        assert_eq!(
            out,
            vec![Command::ExitRange {
                tower: TowerId::new(1),
                actor: ActorId::new(3),
            }]
        );
    }

    #[test]
    fn highest_progress_wins_and_ties_prefer_earliest_spawn() {
        let targets = [ActorId::new(1), ActorId::new(2), ActorId::new(3)];
        let progress = |actor: ActorId| match actor.get() {
            1 => Some(1.5),
            2 => Some(2.25),
            3 => Some(2.25),
            _ => None,
        };

        assert_eq!(select_target(&targets, progress), Some(ActorId::new(2)));

        let reversed = [ActorId::new(3), ActorId::new(2)];
        assert_eq!(select_target(&reversed, progress), Some(ActorId::new(2)));
    }

    #[test]
    fn no_known_progress_yields_no_target() {
        assert_eq!(select_target(&[ActorId::new(9)], |_| None), None);
        assert_eq!(select_target(&[], |_| Some(1.0)), None);
    }
}
