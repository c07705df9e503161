//! Enemy and tower data tables loaded from configuration.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// Enemy archetypes available to wave batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Balanced health and speed.
    Normal,
    /// Fragile and quick.
    Fast,
    /// Durable and slow.
    Slow,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Normal, EnemyKind::Fast, EnemyKind::Slow];

    /// Lowercase name used in configuration files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fast => "fast",
            Self::Slow => "slow",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tower archetypes the player may purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Cheap all-rounder.
    Basic,
    /// Long range, slow fire.
    Ranged,
    /// Short range, rapid fire.
    Quick,
}

impl TowerKind {
    /// Every tower kind in declaration order.
    pub const ALL: [TowerKind; 3] = [TowerKind::Basic, TowerKind::Ranged, TowerKind::Quick];

    /// Lowercase name used in configuration files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Ranged => "ranged",
            Self::Quick => "quick",
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when text does not name a known kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownKind(String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for TowerKind {
    type Err = UnknownKind;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownKind(trimmed.to_owned()))
    }
}

impl FromStr for EnemyKind {
    type Err = UnknownKind;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownKind(trimmed.to_owned()))
    }
}

/// Display colour associated with an enemy or tower type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a new colour from byte channels.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red channel.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green channel.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue channel.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Static parameters of one enemy type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    kind: EnemyKind,
    health: u32,
    speed: f32,
    reward: u32,
    #[serde(default = "unit_scale")]
    scale: f32,
    color: Color,
}

fn unit_scale() -> f32 {
    1.0
}

impl EnemyStats {
    /// Creates enemy parameters.
    #[must_use]
    pub const fn new(
        kind: EnemyKind,
        health: u32,
        speed: f32,
        reward: u32,
        scale: f32,
        color: Color,
    ) -> Self {
        Self {
            kind,
            health,
            speed,
            reward,
            scale,
            color,
        }
    }

    /// Enemy type described by the entry.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Health an actor of this type spawns with.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Segments travelled per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Cash paid when an actor of this type is killed.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Render scale of the actor.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Render colour of the actor.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Time needed to cross one pathway segment.
    #[must_use]
    pub fn segment_time(&self) -> Duration {
        seconds_per(self.speed)
    }
}

/// Static parameters of one tower type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    kind: TowerKind,
    cost: u32,
    attack: u32,
    range: f32,
    fire_rate: f32,
    color: Color,
}

impl TowerStats {
    /// Creates tower parameters.
    #[must_use]
    pub const fn new(
        kind: TowerKind,
        cost: u32,
        attack: u32,
        range: f32,
        fire_rate: f32,
        color: Color,
    ) -> Self {
        Self {
            kind,
            cost,
            attack,
            range,
            fire_rate,
            color,
        }
    }

    /// Tower type described by the entry.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Purchase price.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Damage dealt per shot.
    #[must_use]
    pub const fn attack(&self) -> u32 {
        self.attack
    }

    /// Reach measured in world units from the tower centre.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Shots per second.
    #[must_use]
    pub const fn fire_rate(&self) -> f32 {
        self.fire_rate
    }

    /// Render colour of the tower.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Time between consecutive shots.
    #[must_use]
    pub fn fire_interval(&self) -> Duration {
        seconds_per(self.fire_rate)
    }
}

/// Lookup table of enemy parameters keyed by kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyTable {
    entries: Vec<EnemyStats>,
}

impl EnemyTable {
    /// Wraps the provided entries.
    #[must_use]
    pub fn new(entries: Vec<EnemyStats>) -> Self {
        Self { entries }
    }

    /// Finds the parameters of the given kind.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> Option<&EnemyStats> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    /// Iterates over every entry.
    pub fn iter(&self) -> impl Iterator<Item = &EnemyStats> {
        self.entries.iter()
    }
}

/// Lookup table of tower parameters keyed by kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TowerTable {
    entries: Vec<TowerStats>,
}

impl TowerTable {
    /// Wraps the provided entries.
    #[must_use]
    pub fn new(entries: Vec<TowerStats>) -> Self {
        Self { entries }
    }

    /// Finds the parameters of the given kind.
    #[must_use]
    pub fn get(&self, kind: TowerKind) -> Option<&TowerStats> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    /// Iterates over every entry.
    pub fn iter(&self) -> impl Iterator<Item = &TowerStats> {
        self.entries.iter()
    }
}

/// Converts a per-second rate into the interval between occurrences.
pub(crate) fn seconds_per(rate: f32) -> Duration {
    if rate > 0.0 {
        Duration::try_from_secs_f32(1.0 / rate).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
