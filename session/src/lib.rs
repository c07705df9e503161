#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A single game of Path Defence: world, timeline and systems wired together.
//!
//! [`Session`] is the surface external input handling talks to. It owns the
//! pathway generator, the authoritative world and the timeline every timed
//! activity runs on, and it exposes the lifecycle values a display needs.

mod config;
mod tasks;

use std::time::Duration;

use path_defence_core::{
    Address, Command, Event, Outcome, PurchaseError, SchedulePhase, Seed, TowerId, TowerKind,
};
use path_defence_system_pathway::{PathGenerator, PathwayError};
use path_defence_system_tower_targeting::TowerTargeting;
use path_defence_timeline::Timeline;
use path_defence_world::{query, World};
use thiserror::Error;
use tracing::{info, warn};

pub use config::{BaseConfig, ConfigError, GameConfig, GridConfig, SchedulerConfig};

use crate::tasks::{dispatch, Sim, Task};

/// Errors surfaced by session construction and configuration-driven commands.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No pathway could be generated.
    #[error(transparent)]
    Pathway(#[from] PathwayError),
    /// The requested tower type has no entry in the tower table.
    #[error("tower `{kind}` is not configured")]
    TowerUnavailable {
        /// Requested tower type.
        kind: TowerKind,
    },
}

/// Event tagged with the simulated instant it was produced at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stamped {
    /// Simulated time of the command that produced the event.
    pub at: Duration,
    /// The event itself.
    pub event: Event,
}

/// Running game.
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    generator: PathGenerator,
    targeting: TowerTargeting,
    timeline: Timeline<Task>,
    sim: Sim,
}

impl Session {
    /// Validates `config` and starts a fresh game on the pathway for `seed`,
    /// or on a random pathway when no seed is supplied.
    pub fn new(config: GameConfig, seed: Option<Seed>) -> Result<Self, SessionError> {
        config.validate()?;
        let world = World::new(config.world_config());
        let sim = Sim::new(world, config.waves.clone(), config.scheduler.cooldown());
        let mut session = Self {
            generator: PathGenerator::new(config.grid_size()),
            targeting: TowerTargeting::new(),
            timeline: Timeline::new(),
            sim,
            config,
        };
        let _ = session.install(seed)?;
        Ok(session)
    }

    /// Configuration the session was built from.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Read-only access to the world for renderers and tests.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.sim.world
    }

    /// Simulated time since the session was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// Starts the wave schedule. Returns false when the schedule is already
    /// running or the pathway cannot be traversed.
    pub fn begin(&mut self) -> bool {
        let events = self.submit(vec![Command::BeginSchedule]);
        let began = events.contains(&Event::ScheduleBegan);
        if began {
            info!(waves = self.config.waves.len(), "schedule_began");
        } else {
            warn!(events = ?events, "schedule_begin_ignored");
        }
        began
    }

    /// Replaces the pathway with the one for the seed written in `text`.
    ///
    /// Text that is not a valid seed draws a random one. Returns false when
    /// the seed already matches or the schedule is running.
    pub fn set_seed(&mut self, text: &str) -> Result<bool, SessionError> {
        let requested = Seed::parse(text);
        if requested.is_some() && requested == self.seed() {
            return Ok(false);
        }
        self.regenerate(requested)
    }

    /// Replaces the pathway with one for a freshly drawn seed.
    pub fn randomize_seed(&mut self) -> Result<bool, SessionError> {
        self.regenerate(None)
    }

    /// Starts a new game on the current pathway.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let _ = self.install(self.seed())?;
        Ok(())
    }

    /// Toggles the selection of `cell`.
    pub fn select_cell(&mut self, cell: Address) -> Option<Address> {
        let _ = self.submit(vec![Command::SelectCell { cell }]);
        query::selected_cell(&self.sim.world)
    }

    /// Chooses the tower type bought by the next purchase.
    pub fn select_tower_kind(&mut self, kind: TowerKind) -> Result<(), SessionError> {
        if query::tower_stats(&self.sim.world, kind).is_none() {
            return Err(SessionError::TowerUnavailable { kind });
        }
        let _ = self.submit(vec![Command::SelectTowerKind { kind }]);
        Ok(())
    }

    /// Buys the selected tower type on the selected cell.
    pub fn purchase(&mut self) -> Result<TowerId, PurchaseError> {
        let events = self.submit(vec![Command::PurchaseTower]);
        for event in events {
            match event {
                Event::TowerPlaced { tower, kind, cell } => {
                    info!(tower = tower.get(), kind = %kind, cell = %cell, "tower_placed");
                    return Ok(tower);
                }
                Event::PurchaseRejected { reason } => {
                    warn!(reason = ?reason, "purchase_rejected");
                    return Err(reason);
                }
                _ => {}
            }
        }
        Err(PurchaseError::Inactive)
    }

    /// Removes every placed tower and returns how many were removed.
    pub fn clear_towers(&mut self) -> usize {
        let events = self.submit(vec![Command::ClearTowers]);
        events
            .iter()
            .find_map(|event| match event {
                Event::TowersCleared { count } => Some(*count),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Advances simulated time by `dt`.
    ///
    /// Range changes are evaluated at the end of each call, so the call
    /// granularity is the resolution of range tracking: a tower starts and
    /// stops firing at call boundaries, and replays only match when they use
    /// the same `dt` sequence. Every other activity runs at its exact
    /// simulated instant. Once the game has an outcome time stops.
    pub fn advance(&mut self, dt: Duration) {
        if self.outcome().is_some() {
            return;
        }

        self.timeline.advance(dt, &mut self.sim);
        self.track_ranges();
    }

    /// Seed of the installed pathway.
    #[must_use]
    pub fn seed(&self) -> Option<Seed> {
        query::seed(&self.sim.world)
    }

    /// Seed of the installed pathway as text for copying and replay.
    #[must_use]
    pub fn seed_text(&self) -> String {
        self.seed().map(|seed| seed.to_string()).unwrap_or_default()
    }

    /// Current base health.
    #[must_use]
    pub fn health(&self) -> u32 {
        query::health(&self.sim.world)
    }

    /// Base health at the start of the game.
    #[must_use]
    pub fn max_health(&self) -> u32 {
        query::max_health(&self.sim.world)
    }

    /// Current cash balance.
    #[must_use]
    pub fn cash(&self) -> u32 {
        query::cash(&self.sim.world)
    }

    /// Index of the most recently started wave.
    #[must_use]
    pub fn wave(&self) -> Option<usize> {
        query::current_wave(&self.sim.world)
    }

    /// Scheduler phase.
    #[must_use]
    pub fn phase(&self) -> SchedulePhase {
        query::phase(&self.sim.world)
    }

    /// Remaining countdown formatted as `mm:ss`.
    #[must_use]
    pub fn countdown_text(&self) -> String {
        query::countdown(&self.sim.world).display(self.now())
    }

    /// Terminal outcome, once the game has ended.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        query::outcome(&self.sim.world)
    }

    /// Takes every event produced since the previous call.
    pub fn drain_events(&mut self) -> Vec<Stamped> {
        std::mem::take(&mut self.sim.journal)
    }

    fn regenerate(&mut self, requested: Option<Seed>) -> Result<bool, SessionError> {
        if query::schedule_active(&self.sim.world) && self.outcome().is_none() {
            warn!(requested = ?requested.map(|seed| seed.get()), "seed_change_refused");
            return Ok(false);
        }
        let _ = self.install(requested)?;
        Ok(true)
    }

    fn install(&mut self, requested: Option<Seed>) -> Result<Seed, SessionError> {
        let generated = self.generator.generate(requested)?;
        let seed = generated.seed;
        let length = generated.pathway.len();

        self.timeline.clear();
        self.sim.schedule_task = None;
        let _ = self.submit(vec![Command::InstallPathway {
            seed,
            pathway: generated.pathway,
        }]);
        info!(seed = seed.get(), length, "pathway_installed");
        Ok(seed)
    }

    fn track_ranges(&mut self) {
        let towers = query::tower_view(&self.sim.world);
        if towers.is_empty() {
            return;
        }

        let actors = query::actor_view(&self.sim.world, self.now());
        let mut commands = Vec::new();
        self.targeting.handle(&towers, &actors, &mut commands);
        if commands.is_empty() {
            return;
        }

        let _ = self.submit(commands);
        self.timeline.advance(Duration::ZERO, &mut self.sim);
    }

    fn submit(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let start = self.sim.journal.len();
        let reactions = self.sim.apply(self.timeline.now(), commands);
        if let Some(id) = dispatch(&mut self.timeline, reactions) {
            self.sim.schedule_task = Some(id);
        }
        self.sim.journal[start..]
            .iter()
            .map(|stamped| stamped.event.clone())
            .collect()
    }
}
