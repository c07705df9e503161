#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded pathway generation using randomized depth-first search.
//!
//! The generator carves a thin route from column zero to the last column. A
//! cell may only join the route when it touches the route at the single cell
//! it extends, which keeps the route from ever running alongside itself. Dead
//! ends are resolved by popping cells off an explicit stack; popped cells stay
//! blacklisted for the rest of the run.

use std::collections::HashSet;

use path_defence_core::{Address, GridSize, Pathway, Seed, SEED_LIMIT};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, error};

/// Smallest number of columns that leaves room between the entry and exit columns.
pub const MIN_COLUMNS: u32 = 3;

/// Errors produced while generating a pathway.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PathwayError {
    /// The grid cannot hold a pathway between distinct edge columns.
    #[error("a {rows}x{columns} grid cannot hold a pathway (need at least 1 row and 3 columns)")]
    GridTooSmall {
        /// Rows in the rejected grid.
        rows: u32,
        /// Columns in the rejected grid.
        columns: u32,
    },
    /// Backtracking emptied the route without reaching the end cell.
    #[error("pathway generation exhausted every route for seed {seed}")]
    Exhausted {
        /// Seed that produced the dead end.
        seed: Seed,
    },
}

/// Result of a successful generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    /// Seed the pathway was generated from.
    pub seed: Seed,
    /// Ordered cells from the entry column to the exit column.
    pub pathway: Pathway,
}

/// Pathway generator that reuses scratch buffers between runs.
#[derive(Debug)]
pub struct PathGenerator {
    size: GridSize,
    blacklist: HashSet<Address>,
    members: HashSet<Address>,
    route: Vec<Address>,
    candidates: Vec<Address>,
}

impl PathGenerator {
    /// Creates a generator for grids of the provided size.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            blacklist: HashSet::new(),
            members: HashSet::new(),
            route: Vec::new(),
            candidates: Vec::with_capacity(4),
        }
    }

    /// Grid dimensions the generator works on.
    #[must_use]
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Generates a pathway for `requested`, or for a freshly drawn seed when absent.
    ///
    /// The same grid size and seed always produce the same pathway.
    pub fn generate(&mut self, requested: Option<Seed>) -> Result<Generated, PathwayError> {
        let rows = self.size.rows();
        let columns = self.size.columns();
        if rows == 0 || columns < MIN_COLUMNS {
            return Err(PathwayError::GridTooSmall { rows, columns });
        }

        let seed = requested.unwrap_or_else(random_seed);
        let mut rng = seeded_stream(seed);
        let start = Address::new(rng.gen_range(0..rows), 0);
        let end = Address::new(rng.gen_range(0..rows), columns - 1);

        self.reset(end);

        let mut backtracks = 0_usize;
        let mut next = start;
        loop {
            self.route.push(next);
            let _ = self.members.insert(next);
            let _ = self.blacklist.insert(next);
            if next == end {
                break;
            }

            next = loop {
                let Some(&last) = self.route.last() else {
                    error!(seed = seed.get(), rows, columns, "pathway_exhausted");
                    return Err(PathwayError::Exhausted { seed });
                };

                self.collect_candidates(last);
                if !self.candidates.is_empty() {
                    let index = rng.gen_range(0..self.candidates.len());
                    break self.candidates[index];
                }

                let _ = self.route.pop();
                let _ = self.members.remove(&last);
                backtracks += 1;
            };
        }

        debug!(
            seed = seed.get(),
            length = self.route.len(),
            backtracks,
            "pathway_generated"
        );
        Ok(Generated {
            seed,
            pathway: Pathway::new(self.route.clone()),
        })
    }

    fn reset(&mut self, end: Address) {
        self.route.clear();
        self.members.clear();
        self.blacklist.clear();

        let last_column = self.size.columns() - 1;
        for row in 0..self.size.rows() {
            for column in [0, last_column] {
                let address = Address::new(row, column);
                if address != end {
                    let _ = self.blacklist.insert(address);
                }
            }
        }
    }

    fn collect_candidates(&mut self, from: Address) {
        self.candidates.clear();
        for candidate in from.neighbors(self.size) {
            if self.blacklist.contains(&candidate) {
                continue;
            }

            let touching = candidate
                .neighbors(self.size)
                .filter(|neighbor| self.members.contains(neighbor))
                .take(2)
                .count();
            if touching > 1 {
                continue;
            }

            self.candidates.push(candidate);
        }
    }
}

/// Deterministic random stream derived from a seed.
///
/// The first draw of `gen_range(0..rows)` picks the start row and the second
/// picks the end row.
#[must_use]
pub fn seeded_stream(seed: Seed) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(u64::from(seed.get()))
}

/// Draws a seed uniformly from the valid range.
#[must_use]
pub fn random_seed() -> Seed {
    let value = rand::thread_rng().gen_range(1..SEED_LIMIT);
    Seed::new(i64::from(value)).unwrap_or(Seed::MIN)
}

#[cfg(test)]
mod tests {
    use super::{random_seed, PathGenerator, PathwayError};
    use path_defence_core::{Address, GridSize, Pathway, Seed, SEED_LIMIT};

    #[test]
    fn narrow_grids_are_rejected() {
        let mut generator = PathGenerator::new(GridSize::new(4, 2));
        assert_eq!(
            generator.generate(Seed::new(5)),
            Err(PathwayError::GridTooSmall {
                rows: 4,
                columns: 2
            })
        );

        let mut empty = PathGenerator::new(GridSize::new(0, 9));
        assert!(matches!(
            empty.generate(Seed::new(5)),
            Err(PathwayError::GridTooSmall { .. })
        ));
    }

    #[test]
    fn single_row_grid_runs_straight() {
        let mut generator = PathGenerator::new(GridSize::new(1, 4));
        let generated = generator.generate(Seed::new(11)).expect("generation succeeds");
        assert_eq!(
            generated.pathway,
            Pathway::new((0..4).map(|column| Address::new(0, column)).collect())
        );
    }

    #[test]
    fn random_seeds_fall_inside_valid_range() {
        for _ in 0..64 {
            let seed = random_seed().get();
            assert!(seed >= 1 && seed < SEED_LIMIT);
        }
    }

    #[test]
    fn missing_seed_is_resolved_and_reported() {
        let mut generator = PathGenerator::new(GridSize::new(5, 9));
        let generated = generator.generate(None).expect("generation succeeds");

        let mut replay = PathGenerator::new(GridSize::new(5, 9));
        let again = replay
            .generate(Some(generated.seed))
            .expect("replay succeeds");
        assert_eq!(generated, again);
    }
}
