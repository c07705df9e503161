//! Game configuration loaded once before a session starts.

use std::{collections::BTreeSet, fs, path::Path, time::Duration};

use path_defence_core::{
    Batch, Color, EnemyKind, EnemyStats, EnemyTable, GridSize, TowerKind, TowerStats, TowerTable,
    Wave, WaveSchedule,
};
use path_defence_system_pathway::MIN_COLUMNS;
use path_defence_world::WorldConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {path}")]
    Read {
        /// Location of the file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The TOML document did not match the configuration layout.
    #[error("failed to parse configuration toml")]
    Parse(#[from] toml::de::Error),
    /// A numeric field holds a value the simulation cannot run with.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was refused.
        reason: &'static str,
    },
    /// A wave batch names an enemy type absent from the enemy table.
    #[error("wave {wave} batch {batch} spawns `{kind}` which has no enemy entry")]
    MissingEnemy {
        /// Index of the wave.
        wave: usize,
        /// Index of the batch within the wave.
        batch: usize,
        /// Enemy type without an entry.
        kind: EnemyKind,
    },
    /// The default tower type has no entry in the tower table.
    #[error("default tower `{kind}` has no tower entry")]
    MissingTower {
        /// Tower type without an entry.
        kind: TowerKind,
    },
    /// A table lists the same type twice.
    #[error("{table} table contains duplicate entry for `{kind}`")]
    Duplicate {
        /// Name of the table.
        table: &'static str,
        /// Duplicated type tag.
        kind: String,
    },
}

/// Grid dimensions and cell spacing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub columns: u32,
    /// Distance between neighbouring cell centres in world units.
    pub spacing: f32,
}

/// Starting state of the resource ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Base health at the start of a game.
    pub health: u32,
    /// Cash at the start of a game.
    pub cash: u32,
}

/// Scheduler timing shared by every wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds counted down before each wave.
    pub cooldown_secs: f32,
}

impl SchedulerConfig {
    /// Pre-wave cooldown as a duration.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        if self.cooldown_secs > 0.0 {
            Duration::try_from_secs_f32(self.cooldown_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

fn default_tower() -> TowerKind {
    TowerKind::Basic
}

/// Complete static description of a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    /// Tower type purchased until the player picks another one.
    #[serde(default = "default_tower")]
    pub default_tower: TowerKind,
    /// Grid dimensions.
    pub grid: GridConfig,
    /// Ledger starting values.
    pub base: BaseConfig,
    /// Scheduler timing.
    pub scheduler: SchedulerConfig,
    /// Enemy parameters keyed by type.
    pub enemies: EnemyTable,
    /// Tower parameters keyed by type.
    pub towers: TowerTable,
    /// Waves in play order.
    pub waves: WaveSchedule,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_tower: TowerKind::Basic,
            grid: GridConfig {
                rows: 8,
                columns: 12,
                spacing: 1.0,
            },
            base: BaseConfig {
                health: 100,
                cash: 100,
            },
            scheduler: SchedulerConfig { cooldown_secs: 5.0 },
            enemies: EnemyTable::new(vec![
                EnemyStats::new(
                    EnemyKind::Normal,
                    10,
                    1.5,
                    5,
                    1.0,
                    Color::from_rgb(200, 60, 60),
                ),
                EnemyStats::new(
                    EnemyKind::Fast,
                    6,
                    3.0,
                    4,
                    0.8,
                    Color::from_rgb(230, 180, 40),
                ),
                EnemyStats::new(
                    EnemyKind::Slow,
                    30,
                    0.75,
                    10,
                    1.3,
                    Color::from_rgb(120, 60, 160),
                ),
            ]),
            towers: TowerTable::new(vec![
                TowerStats::new(
                    TowerKind::Basic,
                    25,
                    3,
                    1.5,
                    1.0,
                    Color::from_rgb(70, 110, 200),
                ),
                TowerStats::new(
                    TowerKind::Ranged,
                    50,
                    4,
                    3.0,
                    0.5,
                    Color::from_rgb(60, 170, 90),
                ),
                TowerStats::new(
                    TowerKind::Quick,
                    40,
                    1,
                    1.5,
                    4.0,
                    Color::from_rgb(220, 120, 40),
                ),
            ]),
            waves: WaveSchedule::new(vec![
                Wave::new(20.0, 25, vec![Batch::new(EnemyKind::Normal, 5, 1.0, 0.0)]),
                Wave::new(
                    25.0,
                    40,
                    vec![
                        Batch::new(EnemyKind::Normal, 5, 1.0, 2.0),
                        Batch::new(EnemyKind::Fast, 4, 2.0, 0.0),
                    ],
                ),
                Wave::new(
                    30.0,
                    0,
                    vec![
                        Batch::new(EnemyKind::Fast, 6, 2.0, 3.0),
                        Batch::new(EnemyKind::Slow, 3, 0.5, 0.0),
                    ],
                ),
            ]),
        }
    }
}

impl GameConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Grid dimensions as a core value.
    #[must_use]
    pub fn grid_size(&self) -> GridSize {
        GridSize::new(self.grid.rows, self.grid.columns)
    }

    /// Checks every value the simulation depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.rows == 0 {
            return Err(invalid("grid.rows", "must be at least 1"));
        }
        if self.grid.columns < MIN_COLUMNS {
            return Err(invalid("grid.columns", "must be at least 3"));
        }
        positive("grid.spacing", self.grid.spacing)?;
        non_negative("scheduler.cooldown_secs", self.scheduler.cooldown_secs)?;

        let mut seen = BTreeSet::new();
        for stats in self.enemies.iter() {
            if !seen.insert(stats.kind()) {
                return Err(duplicate("enemy", stats.kind()));
            }
            per_second(&format!("enemies.{}.speed", stats.kind()), stats.speed())?;
            positive(&format!("enemies.{}.scale", stats.kind()), stats.scale())?;
        }

        let mut seen = BTreeSet::new();
        for stats in self.towers.iter() {
            let kind = stats.kind();
            if !seen.insert(kind) {
                return Err(duplicate("tower", kind));
            }
            positive(&format!("towers.{kind}.range"), stats.range())?;
            per_second(&format!("towers.{kind}.fire_rate"), stats.fire_rate())?;
            if stats.attack() == 0 {
                return Err(ConfigError::Invalid {
                    field: format!("towers.{kind}.attack"),
                    reason: "must be at least 1",
                });
            }
        }
        if self.towers.get(self.default_tower).is_none() {
            return Err(ConfigError::MissingTower {
                kind: self.default_tower,
            });
        }

        for (wave_index, wave) in self.waves.waves().iter().enumerate() {
            non_negative(&format!("waves[{wave_index}].duration"), wave.duration_secs())?;
            for (batch_index, batch) in wave.batches().iter().enumerate() {
                let field = format!("waves[{wave_index}].batches[{batch_index}]");
                per_second(&format!("{field}.rate"), batch.rate())?;
                non_negative(&format!("{field}.offset_next"), batch.offset_next())?;
                if self.enemies.get(batch.kind()).is_none() {
                    return Err(ConfigError::MissingEnemy {
                        wave: wave_index,
                        batch: batch_index,
                        kind: batch.kind(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Builds the world parameters described by this configuration.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            grid: self.grid_size(),
            spacing: self.grid.spacing,
            base_health: self.base.health,
            starting_cash: self.base.cash,
            enemies: self.enemies.clone(),
            towers: self.towers.clone(),
            default_tower: self.default_tower,
        }
    }
}

fn invalid(field: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_owned(),
        reason,
    }
}

fn duplicate(table: &'static str, kind: impl ToString) -> ConfigError {
    ConfigError::Duplicate {
        table,
        kind: kind.to_string(),
    }
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive finite number"))
    }
}

/// Rates are turned into intervals, so their reciprocal must fit a duration.
fn per_second(field: &str, value: f32) -> Result<(), ConfigError> {
    positive(field, value)?;
    if Duration::try_from_secs_f32(1.0 / value).is_ok() {
        Ok(())
    } else {
        Err(invalid(field, "is too small to express as an interval"))
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(invalid(field, "must be a non-negative finite number"));
    }
    if Duration::try_from_secs_f32(value).is_err() {
        return Err(invalid(field, "is too large to express as a duration"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GameConfig};
    use path_defence_core::{EnemyKind, TowerKind};
    use std::time::Duration;

    const SAMPLE: &str = include_str!("../config/default.toml");

    #[test]
    fn built_in_defaults_are_valid() {
        let config = GameConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.waves.len(), 3);
        assert_eq!(config.scheduler.cooldown(), Duration::from_secs(5));
    }

    #[test]
    fn sample_file_matches_built_in_defaults() {
        let parsed = GameConfig::from_toml_str(SAMPLE).expect("sample config parses");
        assert_eq!(parsed, GameConfig::default());
    }

    #[test]
    fn batch_with_unknown_enemy_is_fatal() {
        let mut config = GameConfig::default();
        config.enemies = path_defence_core::EnemyTable::new(
            config
                .enemies
                .iter()
                .copied()
                .filter(|stats| stats.kind() != EnemyKind::Slow)
                .collect(),
        );

        match config.validate() {
            Err(ConfigError::MissingEnemy { wave, kind, .. }) => {
                assert_eq!(wave, 2);
                assert_eq!(kind, EnemyKind::Slow);
            }
            other => panic!("unexpected validation result: {other:?}"),
        }
    }

    #[test]
    fn default_tower_must_exist() {
        let mut config = GameConfig::default();
        config.towers = path_defence_core::TowerTable::new(
            config
                .towers
                .iter()
                .copied()
                .filter(|stats| stats.kind() != TowerKind::Basic)
                .collect(),
        );

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTower {
                kind: TowerKind::Basic
            })
        ));
    }

    #[test]
    fn narrow_grid_is_rejected() {
        let mut config = GameConfig::default();
        config.grid.columns = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let contents = SAMPLE.replacen("rate = 1.0", "rate = 0.0", 1);
        assert!(matches!(
            GameConfig::from_toml_str(&contents),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn vanishing_rate_is_rejected() {
        let contents = SAMPLE.replacen("\nrate = 1.0", "\nrate = 1e-39", 1);
        match GameConfig::from_toml_str(&contents) {
            Err(ConfigError::Invalid { field, .. }) => {
                assert_eq!(field, "waves[0].batches[0].rate");
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn vanishing_speed_is_rejected() {
        let contents = SAMPLE.replacen("speed = 1.5", "speed = 1e-39", 1);
        assert!(matches!(
            GameConfig::from_toml_str(&contents),
            Err(ConfigError::Invalid { field, .. }) if field == "enemies.normal.speed"
        ));
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        let contents = SAMPLE.replacen("kind = \"fast\"", "kind = \"flying\"", 1);
        assert!(matches!(
            GameConfig::from_toml_str(&contents),
            Err(ConfigError::Parse(_))
        ));
    }
}
