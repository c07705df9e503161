#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Path Defence headless.

mod render;

use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use path_defence_core::{Address, Event, GridSize, Seed, TowerKind};
use path_defence_session::{GameConfig, Session};
use path_defence_system_pathway::PathGenerator;
use path_defence_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::render::{clock, render_grid};

#[derive(Debug, Parser)]
#[command(name = "path-defence", about = "Headless Path Defence tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a pathway and print it as text.
    Pathway {
        /// Number of grid rows.
        #[arg(long, default_value_t = 8)]
        rows: u32,
        /// Number of grid columns.
        #[arg(long, default_value_t = 12)]
        columns: u32,
        /// Seed to reproduce; invalid or missing seeds draw a random one.
        #[arg(long)]
        seed: Option<String>,
    },
    /// Play a full game without a display and report the outcome.
    Simulate {
        /// TOML configuration file; the built-in game is used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed to reproduce; invalid or missing seeds draw a random one.
        #[arg(long)]
        seed: Option<String>,
        /// Tower to place before the first wave, as `ROW,COL[,KIND]`.
        #[arg(long = "tower")]
        towers: Vec<TowerPlacement>,
        /// Simulated milliseconds per tick.
        #[arg(long, default_value_t = 50)]
        tick_ms: u64,
        /// Simulated seconds after which the run is abandoned.
        #[arg(long, default_value_t = 900)]
        limit_secs: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TowerPlacement {
    cell: Address,
    kind: Option<TowerKind>,
}

impl FromStr for TowerPlacement {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split(',').map(str::trim);
        let row = parts
            .next()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or_else(|| format!("`{value}` is missing a row"))?;
        let column = parts
            .next()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or_else(|| format!("`{value}` is missing a column"))?;
        let kind = parts
            .next()
            .map(TowerKind::from_str)
            .transpose()
            .map_err(|error| error.to_string())?;
        if parts.next().is_some() {
            return Err(format!("`{value}` has more than three fields"));
        }

        Ok(Self {
            cell: Address::new(row, column),
            kind,
        })
    }
}

/// Entry point for the Path Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Pathway {
            rows,
            columns,
            seed,
        } => print_pathway(GridSize::new(rows, columns), parse_seed(seed.as_deref())),
        Commands::Simulate {
            config,
            seed,
            towers,
            tick_ms,
            limit_secs,
        } => {
            let config = match config {
                Some(path) => GameConfig::load(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => GameConfig::default(),
            };
            simulate(
                config,
                parse_seed(seed.as_deref()),
                &towers,
                Duration::from_millis(tick_ms.max(1)),
                Duration::from_secs(limit_secs),
            )
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_seed(text: Option<&str>) -> Option<Seed> {
    text.and_then(Seed::parse)
}

fn print_pathway(size: GridSize, seed: Option<Seed>) -> Result<()> {
    let mut generator = PathGenerator::new(size);
    let generated = generator
        .generate(seed)
        .context("failed to generate a pathway")?;

    println!("seed {}", generated.seed);
    println!("length {}", generated.pathway.len());
    print!("{}", render_grid(size, &generated.pathway, &[]));
    Ok(())
}

fn simulate(
    config: GameConfig,
    seed: Option<Seed>,
    towers: &[TowerPlacement],
    tick: Duration,
    limit: Duration,
) -> Result<()> {
    let mut session = Session::new(config, seed)?;
    for placement in towers {
        place_tower(&mut session, placement)?;
    }

    let world = session.world();
    let placed: Vec<Address> = query::tower_view(world)
        .iter()
        .map(|tower| tower.cell)
        .collect();
    println!("seed {}", session.seed_text());
    print!(
        "{}",
        render_grid(query::grid_size(world), query::pathway(world), &placed)
    );

    if !session.begin() {
        bail!("the wave schedule could not start");
    }

    while session.outcome().is_none() && session.now() < limit {
        session.advance(tick);
        for stamped in session.drain_events() {
            match stamped.event {
                Event::WaveStarted { wave } => {
                    println!("[{}] wave {} started", clock(stamped.at), wave + 1);
                }
                Event::BaseDamaged { amount, health } => {
                    println!(
                        "[{}] base took {amount} damage, {health} left",
                        clock(stamped.at)
                    );
                }
                _ => {}
            }
        }
    }

    let Some(outcome) = session.outcome() else {
        bail!("no outcome after {} simulated seconds", limit.as_secs());
    };
    info!(outcome = ?outcome, at_ms = session.now().as_millis() as u64, "simulation_finished");
    println!(
        "outcome {outcome:?} health {}/{} cash {}",
        session.health(),
        session.max_health(),
        session.cash()
    );
    Ok(())
}

fn place_tower(session: &mut Session, placement: &TowerPlacement) -> Result<()> {
    if let Some(kind) = placement.kind {
        session.select_tower_kind(kind)?;
    }
    let cell = placement.cell;
    if session.select_cell(cell) != Some(cell) {
        bail!("cell {cell} cannot hold a tower");
    }
    let _ = session
        .purchase()
        .map_err(|reason| anyhow!("tower at {cell} refused: {reason:?}"))?;
    Ok(())
}
