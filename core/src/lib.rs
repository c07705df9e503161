#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Path Defence engine.
//!
//! This crate defines the message surface that connects the session, the
//! authoritative world, and the timed systems. Callers submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that the
//! session reacts to. Systems read immutable views and respond exclusively
//! with new command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod schedule;
mod tables;
mod views;

pub use schedule::{Batch, Wave, WaveSchedule};
pub use tables::{
    Color, EnemyKind, EnemyStats, EnemyTable, TowerKind, TowerStats, TowerTable, UnknownKind,
};
pub use views::{ActorSnapshot, ActorView, TowerSnapshot, TowerView, WorldPoint};

/// Exclusive upper bound for user supplied pathway seeds.
pub const SEED_LIMIT: u32 = 1_000_000_000;

/// Text shown in place of a countdown once the final wave suppresses it.
pub const UNBOUNDED_COUNTDOWN_TEXT: &str = "--:--";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the current pathway wholesale and starts a fresh game on it.
    InstallPathway {
        /// Seed that reproduces the pathway.
        seed: Seed,
        /// Ordered cells enemies traverse.
        pathway: Pathway,
    },
    /// Restores the base health and cash to their configured starting values.
    ResetLedger,
    /// Removes every placed tower.
    ClearTowers,
    /// Selects the provided cell, or deselects it when it is already selected.
    SelectCell {
        /// Cell chosen by the player.
        cell: Address,
    },
    /// Chooses the tower type bought by the next purchase.
    SelectTowerKind {
        /// Tower type to purchase next.
        kind: TowerKind,
    },
    /// Buys a tower of the selected kind at the selected cell.
    PurchaseTower,
    /// Marks the wave scheduler as active.
    BeginSchedule,
    /// Publishes the scheduler phase and countdown for display.
    PublishPhase {
        /// Phase the scheduler entered.
        phase: SchedulePhase,
        /// Countdown visible while the phase lasts.
        countdown: Countdown,
    },
    /// Announces that a wave starts emitting actors.
    StartWave {
        /// Zero-based wave index within the schedule.
        wave: usize,
    },
    /// Announces that the current wave emitted its final actor.
    FinishSpawning,
    /// Emits a new actor at the start of the pathway.
    SpawnActor {
        /// Enemy type to instantiate from the enemy table.
        kind: EnemyKind,
        /// Simulated time of the spawn.
        at: Duration,
    },
    /// Moves an actor onto the next pathway segment.
    AdvanceActor {
        /// Actor completing its current segment.
        actor: ActorId,
        /// Simulated time the segment completed.
        at: Duration,
    },
    /// Applies tower damage to an actor.
    DamageActor {
        /// Actor receiving the damage.
        actor: ActorId,
        /// Health removed from the actor.
        amount: u32,
    },
    /// Records that an actor moved inside a tower's range.
    EnterRange {
        /// Tower whose range was entered.
        tower: TowerId,
        /// Actor that entered.
        actor: ActorId,
    },
    /// Records that an actor left a tower's range.
    ExitRange {
        /// Tower whose range was left.
        tower: TowerId,
        /// Actor that left.
        actor: ActorId,
    },
    /// Marks a tower's fire loop as stopped.
    StopFiring {
        /// Tower whose loop ended.
        tower: TowerId,
    },
    /// Pays the completion reward of a wave.
    PayWaveReward {
        /// Zero-based wave index within the schedule.
        wave: usize,
        /// Cash added to the ledger.
        amount: u32,
    },
    /// Resolves the terminal outcome after the schedule drained.
    ResolveOutcome,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new pathway replaced the previous one.
    PathwayInstalled {
        /// Seed that reproduces the pathway.
        seed: Seed,
        /// Number of cells in the pathway.
        length: usize,
    },
    /// Confirms that the ledger returned to its starting values.
    LedgerReset {
        /// Base health after the reset.
        health: u32,
        /// Cash after the reset.
        cash: u32,
    },
    /// Confirms that every tower was removed.
    TowersCleared {
        /// Number of towers removed.
        count: usize,
    },
    /// Reports the cell selected after a selection command.
    CellSelected {
        /// Selected cell, or `None` when the selection was cleared.
        cell: Option<Address>,
    },
    /// Reports that a selection command was ignored.
    SelectionRejected {
        /// Cell the player attempted to select.
        cell: Address,
        /// Specific reason the selection failed.
        reason: SelectionError,
    },
    /// Confirms the tower type bought by the next purchase.
    TowerKindSelected {
        /// Tower type selected.
        kind: TowerKind,
    },
    /// Confirms that a tower was bought and placed.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower placed.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: Address,
    },
    /// Reports that a purchase was refused.
    PurchaseRejected {
        /// Specific reason the purchase failed.
        reason: PurchaseError,
    },
    /// Reports the cash balance after it changed.
    CashChanged {
        /// Cash held after the change.
        cash: u32,
    },
    /// Confirms that the wave scheduler became active.
    ScheduleBegan,
    /// Reports that a begin request was ignored.
    ScheduleRejected {
        /// Specific reason the scheduler did not start.
        reason: ScheduleRejection,
    },
    /// Reports a scheduler phase transition.
    PhaseChanged {
        /// Phase entered.
        phase: SchedulePhase,
        /// Countdown visible while the phase lasts.
        countdown: Countdown,
    },
    /// Announces that a wave started emitting actors.
    WaveStarted {
        /// Zero-based wave index within the schedule.
        wave: usize,
    },
    /// Announces that a wave emitted its final actor.
    SpawningFinished {
        /// Zero-based wave index within the schedule.
        wave: usize,
    },
    /// Confirms that an actor entered the pathway.
    ActorSpawned {
        /// Identifier assigned to the actor.
        actor: ActorId,
        /// Enemy type of the actor.
        kind: EnemyKind,
    },
    /// Reports a scheduled spawn whose enemy type has no table entry.
    SpawnRejected {
        /// Enemy type that could not be spawned.
        kind: EnemyKind,
    },
    /// Confirms that an actor moved onto the next segment.
    ActorAdvanced {
        /// Actor that advanced.
        actor: ActorId,
        /// Number of segments completed so far.
        segment: usize,
    },
    /// Reports an actor's health after taking damage.
    ActorDamaged {
        /// Actor that took damage.
        actor: ActorId,
        /// Remaining health.
        health: u32,
    },
    /// Reports that an actor was destroyed by damage.
    ActorKilled {
        /// Actor that was destroyed.
        actor: ActorId,
        /// Cash paid for the kill.
        reward: u32,
    },
    /// Reports that an actor reached the end of the pathway.
    ActorArrived {
        /// Actor that arrived.
        actor: ActorId,
        /// Damage dealt to the base, equal to the actor's remaining health.
        damage: u32,
    },
    /// The population emptied while no wave was spawning; cooldowns may end early.
    CooldownSkipRequested,
    /// Reports that an actor joined a tower's target set.
    TargetAcquired {
        /// Tower tracking the actor.
        tower: TowerId,
        /// Actor inside range.
        actor: ActorId,
    },
    /// Reports that an actor left a tower's target set.
    TargetLost {
        /// Tower that stopped tracking the actor.
        tower: TowerId,
        /// Actor no longer in range.
        actor: ActorId,
    },
    /// Requests that a fire loop starts for the tower.
    FireLoopStarted {
        /// Tower that needs a fire loop.
        tower: TowerId,
    },
    /// Confirms that a tower's fire loop ended.
    FireLoopStopped {
        /// Tower whose loop ended.
        tower: TowerId,
    },
    /// Reports base health after damage.
    BaseDamaged {
        /// Damage requested.
        amount: u32,
        /// Health remaining after clamping.
        health: u32,
    },
    /// Reports that the base health reached zero.
    BaseDestroyed,
    /// Announces the terminal outcome of the game.
    GameEnded {
        /// Whether the player won or lost.
        outcome: Outcome,
    },
}

/// Reasons a selection command may be ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectionError {
    /// The cell lies outside the grid.
    OutOfBounds,
    /// Pathway cells can never hold towers, so they are not selectable.
    OnPathway,
    /// The game already ended.
    Inactive,
}

/// Reasons a tower purchase may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PurchaseError {
    /// No cell is selected.
    NoSelection,
    /// The selected cell already holds a tower.
    Occupied,
    /// The ledger cannot cover the tower's cost.
    InsufficientCash {
        /// Cost of the selected tower type.
        cost: u32,
        /// Cash held at the time of the request.
        cash: u32,
    },
    /// The selected tower type has no entry in the tower table.
    Unavailable {
        /// Tower type that was requested.
        kind: TowerKind,
    },
    /// The game already ended.
    Inactive,
}

/// Reasons a begin request may be ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScheduleRejection {
    /// The scheduler is already running or has finished.
    AlreadyActive,
    /// The pathway has one cell or fewer.
    DegeneratePathway,
}

/// Terminal result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every wave drained while the base still had health.
    Win,
    /// The base health reached zero.
    Lose,
}

/// Phases the wave scheduler moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulePhase {
    /// No schedule is running.
    Idle,
    /// Waiting before the given wave starts spawning.
    Cooldown {
        /// Zero-based index of the upcoming wave.
        wave: usize,
    },
    /// The given wave is spawning or its duration is running.
    Wave {
        /// Zero-based index of the running wave.
        wave: usize,
    },
    /// All waves were issued; waiting for the population to empty.
    Draining,
    /// The outcome was resolved.
    Finished,
}

/// Countdown published alongside the scheduler phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Countdown {
    /// No countdown is running.
    Idle,
    /// A countdown that ends at the given simulated time.
    Ends {
        /// Simulated time when the countdown reaches zero.
        at: Duration,
    },
    /// The final wave suppresses its countdown.
    Unbounded,
}

impl Countdown {
    /// Time left before the countdown ends, if it is bounded.
    #[must_use]
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        match self {
            Self::Idle => Some(Duration::ZERO),
            Self::Ends { at } => Some(at.saturating_sub(now)),
            Self::Unbounded => None,
        }
    }

    /// Formats the countdown as `mm:ss`, rounding partial seconds up.
    #[must_use]
    pub fn display(&self, now: Duration) -> String {
        let Some(remaining) = self.remaining(now) else {
            return UNBOUNDED_COUNTDOWN_TEXT.to_owned();
        };

        let mut seconds = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            seconds += 1;
        }
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }
}

/// Unique identifier assigned to an actor, allocated in spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as row and column coordinates.
///
/// Equality and hashing are defined by the coordinates alone, so two
/// independently constructed addresses for the same cell are interchangeable
/// as map keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    row: u32,
    column: u32,
}

impl Address {
    /// Creates a new grid cell address.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two addresses.
    #[must_use]
    pub fn manhattan_distance(self, other: Address) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Reports whether the two addresses share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: Address) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Iterates over the in-bounds neighbors in up, down, right, left order.
    pub fn neighbors(self, size: GridSize) -> impl Iterator<Item = Address> {
        let Self { row, column } = self;
        let candidates = [
            row.checked_sub(1).map(|row| Address::new(row, column)),
            row.checked_add(1).map(|row| Address::new(row, column)),
            column.checked_add(1).map(|column| Address::new(row, column)),
            column.checked_sub(1).map(|column| Address::new(row, column)),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter(move |candidate| size.contains(*candidate))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.column)
    }
}

/// Dimensions of the rectangular cell grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    rows: u32,
    columns: u32,
}

impl GridSize {
    /// Creates a new grid size descriptor.
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Reports whether the address lies within the grid.
    #[must_use]
    pub const fn contains(&self, address: Address) -> bool {
        address.row < self.rows && address.column < self.columns
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.rows) * u64::from(self.columns);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Iterates over every address in row-major order.
    pub fn addresses(self) -> impl Iterator<Item = Address> {
        (0..self.rows).flat_map(move |row| (0..self.columns).map(move |column| Address::new(row, column)))
    }
}

/// Ordered route of cells from the entry column to the base column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pathway {
    cells: Vec<Address>,
}

impl Pathway {
    /// Wraps an ordered list of cells.
    #[must_use]
    pub fn new(cells: Vec<Address>) -> Self {
        Self { cells }
    }

    /// Cells in traversal order.
    #[must_use]
    pub fn cells(&self) -> &[Address] {
        &self.cells
    }

    /// Number of cells in the pathway.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the pathway holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of segments between consecutive cells.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// Reports whether actors can travel the pathway, which needs two cells or more.
    #[must_use]
    pub fn is_traversable(&self) -> bool {
        self.cells.len() > 1
    }

    /// First cell of the pathway.
    #[must_use]
    pub fn start(&self) -> Option<Address> {
        self.cells.first().copied()
    }

    /// Last cell of the pathway.
    #[must_use]
    pub fn end(&self) -> Option<Address> {
        self.cells.last().copied()
    }

    /// Cell at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Address> {
        self.cells.get(index).copied()
    }
}

/// Positive seed that reproduces a pathway for fixed grid dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seed(u32);

impl Seed {
    /// Smallest valid seed.
    pub const MIN: Seed = Seed(1);

    /// Accepts values strictly between zero and [`SEED_LIMIT`].
    #[must_use]
    pub fn new(value: i64) -> Option<Self> {
        if value > 0 && value < i64::from(SEED_LIMIT) {
            u32::try_from(value).ok().map(Self)
        } else {
            None
        }
    }

    /// Parses user supplied text, rejecting anything outside the valid range.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<i64>().ok().and_then(Self::new)
    }

    /// Retrieves the numeric seed.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
