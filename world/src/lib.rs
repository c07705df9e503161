#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Path Defence.
//!
//! The world owns the grid, the installed pathway, the ledger, live actors and
//! placed towers. It never observes time on its own: every command that
//! depends on the clock carries the simulated instant it was issued at.

mod actors;
mod grid;
mod ledger;
mod towers;

use std::time::Duration;

use path_defence_core::{
    ActorId, ActorSnapshot, Address, Command, Countdown, EnemyKind, EnemyTable, Event, GridSize,
    Outcome, Pathway, PurchaseError, ScheduleRejection, SchedulePhase, Seed, SelectionError,
    TowerId, TowerKind, TowerTable,
};
use tracing::{debug, error, info};

use crate::{actors::ActorRegistry, grid::Grid, ledger::Ledger, towers::TowerRegistry};

/// Static parameters the world is constructed from.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Dimensions of the cell grid.
    pub grid: GridSize,
    /// Distance between neighbouring cell centres in world units.
    pub spacing: f32,
    /// Base health at the start of a game.
    pub base_health: u32,
    /// Cash at the start of a game.
    pub starting_cash: u32,
    /// Parameters for each enemy type.
    pub enemies: EnemyTable,
    /// Parameters for each tower type.
    pub towers: TowerTable,
    /// Tower type selected before the player picks one.
    pub default_tower: TowerKind,
}

#[derive(Clone, Copy, Debug)]
struct ScheduleStatus {
    active: bool,
    spawning: usize,
    wave: Option<usize>,
    phase: SchedulePhase,
    countdown: Countdown,
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        Self {
            active: false,
            spawning: 0,
            wave: None,
            phase: SchedulePhase::Idle,
            countdown: Countdown::Idle,
        }
    }
}

/// Represents the authoritative Path Defence world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    grid: Grid,
    pathway: Pathway,
    seed: Option<Seed>,
    ledger: Ledger,
    actors: ActorRegistry,
    towers: TowerRegistry,
    schedule: ScheduleStatus,
    selected_kind: TowerKind,
    outcome: Option<Outcome>,
}

impl World {
    /// Creates a world with an empty pathway and a full ledger.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            grid: Grid::new(config.grid, config.spacing),
            pathway: Pathway::default(),
            seed: None,
            ledger: Ledger::new(config.base_health, config.starting_cash),
            actors: ActorRegistry::new(),
            towers: TowerRegistry::new(),
            schedule: ScheduleStatus::default(),
            selected_kind: config.default_tower,
            outcome: None,
            config,
        }
    }

    fn install_pathway(&mut self, seed: Seed, pathway: Pathway, out_events: &mut Vec<Event>) {
        self.actors.clear();
        self.schedule = ScheduleStatus::default();
        self.outcome = None;
        self.grid.install_pathway(&pathway);
        self.clear_towers(out_events);
        if self.grid.deselect() {
            out_events.push(Event::CellSelected { cell: None });
        }
        self.reset_ledger(out_events);

        let length = pathway.len();
        self.pathway = pathway;
        self.seed = Some(seed);
        out_events.push(Event::PathwayInstalled { seed, length });
    }

    fn reset_ledger(&mut self, out_events: &mut Vec<Event>) {
        self.ledger.reset();
        out_events.push(Event::LedgerReset {
            health: self.ledger.health(),
            cash: self.ledger.cash(),
        });
    }

    fn clear_towers(&mut self, out_events: &mut Vec<Event>) {
        let count = self.towers.clear();
        self.grid.clear_towers();
        out_events.push(Event::TowersCleared { count });
    }

    fn select_cell(&mut self, cell: Address, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            out_events.push(Event::SelectionRejected {
                cell,
                reason: SelectionError::Inactive,
            });
            return;
        }

        match self.grid.select(cell) {
            Ok(selected) => out_events.push(Event::CellSelected { cell: selected }),
            Err(reason) => out_events.push(Event::SelectionRejected { cell, reason }),
        }
    }

    fn purchase(&mut self, out_events: &mut Vec<Event>) {
        match self.try_purchase(out_events) {
            Ok(()) => {}
            Err(reason) => {
                debug!(reason = ?reason, "purchase_rejected");
                out_events.push(Event::PurchaseRejected { reason });
            }
        }
    }

    fn try_purchase(&mut self, out_events: &mut Vec<Event>) -> Result<(), PurchaseError> {
        if self.outcome.is_some() {
            return Err(PurchaseError::Inactive);
        }
        let cell = self.grid.selected().ok_or(PurchaseError::NoSelection)?;
        if self.grid.occupant(cell).is_some() {
            return Err(PurchaseError::Occupied);
        }
        let kind = self.selected_kind;
        let stats = self
            .config
            .towers
            .get(kind)
            .copied()
            .ok_or(PurchaseError::Unavailable { kind })?;
        let cash = self
            .ledger
            .try_spend(stats.cost())
            .map_err(|cash| PurchaseError::InsufficientCash {
                cost: stats.cost(),
                cash,
            })?;

        let tower = self.towers.insert(cell, stats);
        self.grid.occupy(cell, tower);
        let _ = self.grid.deselect();
        out_events.push(Event::TowerPlaced { tower, kind, cell });
        out_events.push(Event::CashChanged { cash });
        out_events.push(Event::CellSelected { cell: None });
        Ok(())
    }

    fn begin_schedule(&mut self, out_events: &mut Vec<Event>) {
        let rejection = if self.schedule.active || self.outcome.is_some() {
            Some(ScheduleRejection::AlreadyActive)
        } else if !self.pathway.is_traversable() {
            Some(ScheduleRejection::DegeneratePathway)
        } else {
            None
        };

        match rejection {
            Some(reason) => out_events.push(Event::ScheduleRejected { reason }),
            None => {
                self.schedule.active = true;
                out_events.push(Event::ScheduleBegan);
            }
        }
    }

    fn spawn_actor(&mut self, kind: EnemyKind, at: Duration, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() || !self.pathway.is_traversable() {
            return;
        }
        let Some(stats) = self.config.enemies.get(kind).copied() else {
            error!(kind = %kind, "enemy_kind_missing");
            out_events.push(Event::SpawnRejected { kind });
            return;
        };

        let actor = self.actors.spawn(&stats, at);
        out_events.push(Event::ActorSpawned { actor, kind });
    }

    fn advance_actor(&mut self, actor: ActorId, at: Duration, out_events: &mut Vec<Event>) {
        let segment_count = self.pathway.segment_count();
        let Some(state) = self.actors.get_mut(actor) else {
            return;
        };

        state.segment += 1;
        state.segment_started = at;
        if state.segment < segment_count {
            out_events.push(Event::ActorAdvanced {
                actor,
                segment: state.segment,
            });
            return;
        }

        let damage = state.health;
        let _ = self.actors.remove(actor);
        out_events.push(Event::ActorArrived { actor, damage });
        self.drop_targets(actor, out_events);
        self.damage_base(damage, out_events);
        self.request_skip_if_idle(out_events);
    }

    fn damage_actor(&mut self, actor: ActorId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(state) = self.actors.get_mut(actor) else {
            return;
        };

        state.health = state.health.saturating_sub(amount);
        let health = state.health;
        let reward = state.reward;
        out_events.push(Event::ActorDamaged { actor, health });
        if health > 0 {
            return;
        }

        let _ = self.actors.remove(actor);
        out_events.push(Event::ActorKilled { actor, reward });
        let cash = self.ledger.earn(reward);
        out_events.push(Event::CashChanged { cash });
        self.drop_targets(actor, out_events);
        self.request_skip_if_idle(out_events);
    }

    fn damage_base(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        let report = self.ledger.damage(amount);
        out_events.push(Event::BaseDamaged {
            amount,
            health: report.health,
        });
        if report.destroyed_now {
            out_events.push(Event::BaseDestroyed);
            self.finish(Outcome::Lose, out_events);
        }
    }

    fn drop_targets(&mut self, actor: ActorId, out_events: &mut Vec<Event>) {
        for tower in self.towers.iter_mut() {
            if tower.targets.remove(&actor) {
                out_events.push(Event::TargetLost {
                    tower: tower.id,
                    actor,
                });
            }
        }
    }

    fn request_skip_if_idle(&self, out_events: &mut Vec<Event>) {
        if self.schedule.active
            && self.schedule.spawning == 0
            && self.actors.is_empty()
            && self.outcome.is_none()
        {
            out_events.push(Event::CooldownSkipRequested);
        }
    }

    fn enter_range(&mut self, tower: TowerId, actor: ActorId, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() || self.actors.get(actor).is_none() {
            return;
        }
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };

        if state.targets.insert(actor) {
            out_events.push(Event::TargetAcquired { tower, actor });
        }
        if !state.firing {
            state.firing = true;
            out_events.push(Event::FireLoopStarted { tower });
        }
    }

    fn exit_range(&mut self, tower: TowerId, actor: ActorId, out_events: &mut Vec<Event>) {
        if let Some(state) = self.towers.get_mut(tower) {
            if state.targets.remove(&actor) {
                out_events.push(Event::TargetLost { tower, actor });
            }
        }
    }

    fn stop_firing(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        if let Some(state) = self.towers.get_mut(tower) {
            if state.firing {
                state.firing = false;
                out_events.push(Event::FireLoopStopped { tower });
            }
        }
    }

    fn finish(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        self.outcome = Some(outcome);
        self.schedule.spawning = 0;
        self.schedule.phase = SchedulePhase::Finished;
        self.schedule.countdown = Countdown::Idle;
        info!(outcome = ?outcome, health = self.ledger.health(), cash = self.ledger.cash(), "game_ended");
        out_events.push(Event::PhaseChanged {
            phase: SchedulePhase::Finished,
            countdown: Countdown::Idle,
        });
        out_events.push(Event::GameEnded { outcome });
    }

    fn snapshot_actor(&self, actor: &actors::Actor, now: Duration) -> ActorSnapshot {
        let traveled = actor.traveled(now, self.pathway.segment_count());
        let fraction = traveled - actor.segment as f32;
        let from = self
            .pathway
            .get(actor.segment)
            .map(|cell| self.grid.position(cell))
            .unwrap_or_default();
        let to = self
            .pathway
            .get(actor.segment + 1)
            .map_or(from, |cell| self.grid.position(cell));

        ActorSnapshot {
            id: actor.id,
            kind: actor.kind,
            health: actor.health,
            traveled,
            position: from.lerp(to, fraction),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::InstallPathway { seed, pathway } => {
            world.install_pathway(seed, pathway, out_events);
        }
        Command::ResetLedger => world.reset_ledger(out_events),
        Command::ClearTowers => world.clear_towers(out_events),
        Command::SelectCell { cell } => world.select_cell(cell, out_events),
        Command::SelectTowerKind { kind } => {
            if world.config.towers.get(kind).is_some() {
                world.selected_kind = kind;
                out_events.push(Event::TowerKindSelected { kind });
            }
        }
        Command::PurchaseTower => world.purchase(out_events),
        Command::BeginSchedule => world.begin_schedule(out_events),
        Command::PublishPhase { phase, countdown } => {
            world.schedule.phase = phase;
            world.schedule.countdown = countdown;
            out_events.push(Event::PhaseChanged { phase, countdown });
        }
        Command::StartWave { wave } => {
            world.schedule.spawning += 1;
            world.schedule.wave = Some(wave);
            out_events.push(Event::WaveStarted { wave });
        }
        Command::FinishSpawning => {
            world.schedule.spawning = world.schedule.spawning.saturating_sub(1);
            if let Some(wave) = world.schedule.wave {
                out_events.push(Event::SpawningFinished { wave });
            }
            world.request_skip_if_idle(out_events);
        }
        Command::SpawnActor { kind, at } => world.spawn_actor(kind, at, out_events),
        Command::AdvanceActor { actor, at } => world.advance_actor(actor, at, out_events),
        Command::DamageActor { actor, amount } => world.damage_actor(actor, amount, out_events),
        Command::EnterRange { tower, actor } => world.enter_range(tower, actor, out_events),
        Command::ExitRange { tower, actor } => world.exit_range(tower, actor, out_events),
        Command::StopFiring { tower } => world.stop_firing(tower, out_events),
        Command::PayWaveReward { wave, amount } => {
            if world.outcome.is_none() {
                let cash = world.ledger.earn(amount);
                debug!(wave, amount, cash, "wave_reward_paid");
                out_events.push(Event::CashChanged { cash });
            }
        }
        Command::ResolveOutcome => world.finish(Outcome::Win, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use path_defence_core::{
        ActorId, ActorView, Address, Countdown, EnemyStats, EnemyKind, GridSize, Outcome,
        Pathway, SchedulePhase, Seed, TowerId, TowerKind, TowerSnapshot, TowerStats, TowerTable,
        TowerView, WorldPoint,
    };

    /// Dimensions of the cell grid.
    #[must_use]
    pub fn grid_size(world: &World) -> GridSize {
        world.grid.size()
    }

    /// Distance between neighbouring cell centres.
    #[must_use]
    pub fn spacing(world: &World) -> f32 {
        world.grid.spacing()
    }

    /// World position of a cell centre, if the cell lies on the grid.
    #[must_use]
    pub fn cell_position(world: &World, cell: Address) -> Option<WorldPoint> {
        world
            .grid
            .size()
            .contains(cell)
            .then(|| world.grid.position(cell))
    }

    /// Currently installed pathway.
    #[must_use]
    pub fn pathway(world: &World) -> &Pathway {
        &world.pathway
    }

    /// Seed of the installed pathway.
    #[must_use]
    pub fn seed(world: &World) -> Option<Seed> {
        world.seed
    }

    /// Reports whether the cell belongs to the installed pathway.
    #[must_use]
    pub fn is_pathway(world: &World, cell: Address) -> bool {
        world.grid.is_pathway(cell)
    }

    /// Tower standing on the cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: Address) -> Option<TowerId> {
        world.grid.occupant(cell)
    }

    /// Currently selected cell.
    #[must_use]
    pub fn selected_cell(world: &World) -> Option<Address> {
        world.grid.selected()
    }

    /// Tower type bought by the next purchase.
    #[must_use]
    pub fn selected_tower_kind(world: &World) -> TowerKind {
        world.selected_kind
    }

    /// Tower parameters configured for the world.
    #[must_use]
    pub fn tower_table(world: &World) -> &TowerTable {
        &world.config.towers
    }

    /// Parameters of the given tower type.
    #[must_use]
    pub fn tower_stats(world: &World, kind: TowerKind) -> Option<&TowerStats> {
        world.config.towers.get(kind)
    }

    /// Parameters of the given enemy type.
    #[must_use]
    pub fn enemy_stats(world: &World, kind: EnemyKind) -> Option<&EnemyStats> {
        world.config.enemies.get(kind)
    }

    /// Current base health.
    #[must_use]
    pub fn health(world: &World) -> u32 {
        world.ledger.health()
    }

    /// Base health at the start of a game.
    #[must_use]
    pub fn max_health(world: &World) -> u32 {
        world.ledger.max_health()
    }

    /// Current cash balance.
    #[must_use]
    pub fn cash(world: &World) -> u32 {
        world.ledger.cash()
    }

    /// Terminal outcome, once resolved.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Reports whether the wave scheduler was started.
    #[must_use]
    pub fn schedule_active(world: &World) -> bool {
        world.schedule.active
    }

    /// Reports whether any started wave is still emitting actors.
    #[must_use]
    pub fn is_spawning(world: &World) -> bool {
        world.schedule.spawning > 0
    }

    /// Index of the most recently started wave.
    #[must_use]
    pub fn current_wave(world: &World) -> Option<usize> {
        world.schedule.wave
    }

    /// Most recently published scheduler phase.
    #[must_use]
    pub fn phase(world: &World) -> SchedulePhase {
        world.schedule.phase
    }

    /// Most recently published countdown.
    #[must_use]
    pub fn countdown(world: &World) -> Countdown {
        world.schedule.countdown
    }

    /// Number of live actors.
    #[must_use]
    pub fn population(world: &World) -> usize {
        world.actors.len()
    }

    /// Time the actor needs to cross its current segment, if it is alive.
    #[must_use]
    pub fn actor_segment_time(world: &World, actor: ActorId) -> Option<Duration> {
        world.actors.get(actor).map(|state| state.segment_time)
    }

    /// Segments the actor still has to complete, if it is alive.
    #[must_use]
    pub fn actor_remaining_segments(world: &World, actor: ActorId) -> Option<usize> {
        let segments = world.pathway.segment_count();
        world
            .actors
            .get(actor)
            .map(|state| segments.saturating_sub(state.segment))
    }

    /// Continuous progress of a single actor at simulated time `now`.
    #[must_use]
    pub fn actor_traveled(world: &World, actor: ActorId, now: Duration) -> Option<f32> {
        let segments = world.pathway.segment_count();
        world
            .actors
            .get(actor)
            .map(|state| state.traveled(now, segments))
    }

    /// Captures a read-only view of the live actors at simulated time `now`.
    #[must_use]
    pub fn actor_view(world: &World, now: Duration) -> ActorView {
        let snapshots = world
            .actors
            .iter()
            .map(|actor| world.snapshot_actor(actor, now))
            .collect();
        ActorView::from_snapshots(snapshots)
    }

    /// Captures a single tower's state.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|state| snapshot_tower(world, state))
    }

    /// Captures a read-only view of all placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots = world
            .towers
            .iter()
            .map(|state| snapshot_tower(world, state))
            .collect();
        TowerView::from_snapshots(snapshots)
    }

    fn snapshot_tower(world: &World, state: &super::towers::TowerState) -> TowerSnapshot {
        TowerSnapshot {
            id: state.id,
            kind: state.stats.kind(),
            cell: state.cell,
            position: world.grid.position(state.cell),
            range: state.stats.range(),
            attack: state.stats.attack(),
            fire_interval: state.stats.fire_interval(),
            firing: state.firing,
            targets: state.targets.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::{Color, EnemyStats, TowerStats, WorldPoint};

    fn config() -> WorldConfig {
        WorldConfig {
            grid: GridSize::new(3, 4),
            spacing: 1.0,
            base_health: 100,
            starting_cash: 30,
            enemies: EnemyTable::new(vec![EnemyStats::new(
                EnemyKind::Normal,
                40,
                1.0,
                7,
                1.0,
                Color::from_rgb(200, 40, 40),
            )]),
            towers: TowerTable::new(vec![
                TowerStats::new(TowerKind::Basic, 20, 10, 1.5, 1.0, Color::from_rgb(0, 0, 200)),
                TowerStats::new(TowerKind::Ranged, 50, 5, 3.0, 0.5, Color::from_rgb(0, 200, 0)),
            ]),
            default_tower: TowerKind::Basic,
        }
    }

    fn row_pathway() -> Pathway {
        Pathway::new((0..4).map(|column| Address::new(1, column)).collect())
    }

    fn installed_world() -> World {
        let mut world = World::new(config());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InstallPathway {
                seed: Seed::new(7).expect("valid seed"),
                pathway: row_pathway(),
            },
            &mut events,
        );
        world
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn install_pathway_resets_game_state() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::SelectCell { cell: Address::new(0, 0) });
        let _ = run(&mut world, Command::PurchaseTower);
        assert_eq!(query::cash(&world), 10);

        let events = run(
            &mut world,
            Command::InstallPathway {
                seed: Seed::new(9).expect("valid seed"),
                pathway: row_pathway(),
            },
        );

        assert!(events.contains(&Event::TowersCleared { count: 1 }));
        assert!(events.contains(&Event::LedgerReset {
            health: 100,
            cash: 30
        }));
        assert_eq!(query::tower_at(&world, Address::new(0, 0)), None);
        assert_eq!(query::seed(&world).map(|seed| seed.get()), Some(9));
    }

    #[test]
    fn purchase_spends_cash_and_clears_selection() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::SelectCell { cell: Address::new(0, 2) });
        let events = run(&mut world, Command::PurchaseTower);

        assert_eq!(
            events,
            vec![
                Event::TowerPlaced {
                    tower: TowerId::new(0),
                    kind: TowerKind::Basic,
                    cell: Address::new(0, 2),
                },
                Event::CashChanged { cash: 10 },
                Event::CellSelected { cell: None },
            ]
        );
        assert_eq!(query::selected_cell(&world), None);
        assert_eq!(query::tower_at(&world, Address::new(0, 2)), Some(TowerId::new(0)));
    }

    #[test]
    fn unaffordable_purchase_is_refused_without_side_effects() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::SelectTowerKind { kind: TowerKind::Ranged });
        let _ = run(&mut world, Command::SelectCell { cell: Address::new(2, 1) });
        let events = run(&mut world, Command::PurchaseTower);

        assert_eq!(
            events,
            vec![Event::PurchaseRejected {
                reason: PurchaseError::InsufficientCash { cost: 50, cash: 30 }
            }]
        );
        assert_eq!(query::cash(&world), 30);
        assert_eq!(query::tower_at(&world, Address::new(2, 1)), None);
        assert_eq!(query::selected_cell(&world), Some(Address::new(2, 1)));
    }

    #[test]
    fn purchase_without_selection_is_refused() {
        let mut world = installed_world();
        let events = run(&mut world, Command::PurchaseTower);
        assert_eq!(
            events,
            vec![Event::PurchaseRejected {
                reason: PurchaseError::NoSelection
            }]
        );
    }

    #[test]
    fn begin_is_rejected_when_already_active() {
        let mut world = installed_world();
        assert_eq!(run(&mut world, Command::BeginSchedule), vec![Event::ScheduleBegan]);
        assert_eq!(
            run(&mut world, Command::BeginSchedule),
            vec![Event::ScheduleRejected {
                reason: ScheduleRejection::AlreadyActive
            }]
        );
    }

    #[test]
    fn begin_is_rejected_without_traversable_pathway() {
        let mut world = World::new(config());
        assert_eq!(
            run(&mut world, Command::BeginSchedule),
            vec![Event::ScheduleRejected {
                reason: ScheduleRejection::DegeneratePathway
            }]
        );
    }

    #[test]
    fn spawn_without_table_entry_is_reported() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::BeginSchedule);

        let events = run(
            &mut world,
            Command::SpawnActor {
                kind: EnemyKind::Fast,
                at: Duration::ZERO,
            },
        );

        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                kind: EnemyKind::Fast
            }]
        );
        assert_eq!(query::population(&world), 0);
    }

    #[test]
    fn arrival_damages_base_by_remaining_health() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::BeginSchedule);
        let _ = run(
            &mut world,
            Command::SpawnActor {
                kind: EnemyKind::Normal,
                at: Duration::ZERO,
            },
        );
        let actor = ActorId::new(0);
        let _ = run(&mut world, Command::DamageActor { actor, amount: 15 });

        for second in 1..3 {
            let events = run(
                &mut world,
                Command::AdvanceActor {
                    actor,
                    at: Duration::from_secs(second),
                },
            );
            assert!(matches!(events.as_slice(), [Event::ActorAdvanced { .. }]));
        }

        let events = run(
            &mut world,
            Command::AdvanceActor {
                actor,
                at: Duration::from_secs(3),
            },
        );
        assert_eq!(
            events,
            vec![
                Event::ActorArrived { actor, damage: 25 },
                Event::BaseDamaged {
                    amount: 25,
                    health: 75
                },
                Event::CooldownSkipRequested,
            ]
        );
        assert_eq!(query::population(&world), 0);
    }

    #[test]
    fn base_destruction_ends_game_once() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::BeginSchedule);
        let _ = run(&mut world, Command::StartWave { wave: 0 });
        let mut outcomes = Vec::new();

        for _ in 0..3 {
            let _ = run(
                &mut world,
                Command::SpawnActor {
                    kind: EnemyKind::Normal,
                    at: Duration::ZERO,
                },
            );
        }
        for id in 0..3 {
            for second in 1..=3 {
                let events = run(
                    &mut world,
                    Command::AdvanceActor {
                        actor: ActorId::new(id),
                        at: Duration::from_secs(second),
                    },
                );
                outcomes.extend(events.into_iter().filter_map(|event| match event {
                    Event::GameEnded { outcome } => Some(outcome),
                    _ => None,
                }));
            }
        }

        assert_eq!(outcomes, vec![Outcome::Lose]);
        assert_eq!(query::health(&world), 0);
        assert!(run(&mut world, Command::ResolveOutcome).is_empty());
        assert_eq!(query::outcome(&world), Some(Outcome::Lose));
    }

    #[test]
    fn kill_pays_reward_and_releases_targets() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::SelectCell { cell: Address::new(0, 1) });
        let _ = run(&mut world, Command::PurchaseTower);
        let _ = run(
            &mut world,
            Command::SpawnActor {
                kind: EnemyKind::Normal,
                at: Duration::ZERO,
            },
        );
        let tower = TowerId::new(0);
        let actor = ActorId::new(0);

        let entered = run(&mut world, Command::EnterRange { tower, actor });
        assert_eq!(
            entered,
            vec![
                Event::TargetAcquired { tower, actor },
                Event::FireLoopStarted { tower },
            ]
        );

        let events = run(&mut world, Command::DamageActor { actor, amount: 40 });
        assert_eq!(
            events,
            vec![
                Event::ActorDamaged { actor, health: 0 },
                Event::ActorKilled { actor, reward: 7 },
                Event::CashChanged { cash: 17 },
                Event::TargetLost { tower, actor },
            ]
        );
        let snapshot = query::tower(&world, tower).expect("tower exists");
        assert!(snapshot.targets.is_empty());
        assert!(snapshot.firing);
    }

    #[test]
    fn finishing_spawn_with_empty_population_requests_skip() {
        let mut world = installed_world();
        let _ = run(&mut world, Command::BeginSchedule);
        let _ = run(&mut world, Command::StartWave { wave: 0 });
        let events = run(&mut world, Command::FinishSpawning);
        assert_eq!(
            events,
            vec![
                Event::SpawningFinished { wave: 0 },
                Event::CooldownSkipRequested,
            ]
        );
    }

    #[test]
    fn actor_view_interpolates_between_cells() {
        let mut world = installed_world();
        let _ = run(
            &mut world,
            Command::SpawnActor {
                kind: EnemyKind::Normal,
                at: Duration::ZERO,
            },
        );

        let view = query::actor_view(&world, Duration::from_millis(500));
        let snapshot = view.get(ActorId::new(0)).expect("actor captured");
        assert_eq!(snapshot.traveled, 0.5);
        assert_eq!(snapshot.position, WorldPoint::new(0.5, 1.0));
    }
}
