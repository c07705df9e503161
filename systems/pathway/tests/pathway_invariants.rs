use std::collections::HashSet;

use path_defence_core::{Address, GridSize, Pathway, Seed};
use path_defence_system_pathway::{seeded_stream, PathGenerator};
use rand::Rng;

const GRIDS: [(u32, u32); 6] = [(1, 3), (2, 3), (3, 3), (5, 9), (8, 12), (10, 10)];

fn generate(size: GridSize, seed: u32) -> Pathway {
    let mut generator = PathGenerator::new(size);
    generator
        .generate(Seed::new(i64::from(seed)))
        .expect("generation terminates with a pathway")
        .pathway
}

#[test]
fn consecutive_cells_are_adjacent_and_unique() {
    for (rows, columns) in GRIDS {
        let size = GridSize::new(rows, columns);
        for seed in 1..200 {
            let pathway = generate(size, seed);
            let cells = pathway.cells();

            for pair in cells.windows(2) {
                assert!(
                    pair[0].is_adjacent(pair[1]),
                    "{rows}x{columns} seed {seed}: {} -> {} is not a step",
                    pair[0],
                    pair[1]
                );
            }

            let unique: HashSet<Address> = cells.iter().copied().collect();
            assert_eq!(
                unique.len(),
                cells.len(),
                "{rows}x{columns} seed {seed}: repeated cell"
            );
            assert!(cells.iter().all(|cell| size.contains(*cell)));
        }
    }
}

#[test]
fn pathway_never_touches_itself() {
    for (rows, columns) in GRIDS {
        let size = GridSize::new(rows, columns);
        for seed in 1..200 {
            let pathway = generate(size, seed);
            let cells = pathway.cells();

            for (i, first) in cells.iter().enumerate() {
                for second in cells.iter().skip(i + 2) {
                    assert!(
                        !first.is_adjacent(*second),
                        "{rows}x{columns} seed {seed}: {first} touches {second}"
                    );
                }
            }
        }
    }
}

#[test]
fn pathway_spans_first_to_last_column() {
    for (rows, columns) in GRIDS {
        let size = GridSize::new(rows, columns);
        for seed in 1..200 {
            let pathway = generate(size, seed);
            let start = pathway.start().expect("pathway has a start");
            let end = pathway.end().expect("pathway has an end");

            assert_eq!(start.column(), 0);
            assert_eq!(end.column(), columns - 1);
            assert!(start.row() < rows && end.row() < rows);

            let interior_edge_cells = pathway.cells()[1..pathway.len() - 1]
                .iter()
                .filter(|cell| cell.column() == 0 || cell.column() == columns - 1)
                .count();
            assert_eq!(interior_edge_cells, 0, "edge columns hold only the endpoints");
        }
    }
}

#[test]
fn generation_is_deterministic_per_seed() {
    let size = GridSize::new(8, 12);
    for seed in [1, 42, 777, 123_456, 999_999_999] {
        assert_eq!(generate(size, seed), generate(size, seed));
    }

    let mut generator = PathGenerator::new(size);
    let first = generator.generate(Seed::new(42)).expect("first run");
    let second = generator.generate(Seed::new(42)).expect("reused generator");
    assert_eq!(first, second, "scratch buffers must not leak between runs");
}

#[test]
fn five_by_nine_seed_42_starts_on_first_draw() {
    let size = GridSize::new(5, 9);
    let seed = Seed::new(42).expect("valid seed");

    let mut stream = seeded_stream(seed);
    let start_row: u32 = stream.gen_range(0..5);
    let end_row: u32 = stream.gen_range(0..5);

    let mut generator = PathGenerator::new(size);
    let generated = generator.generate(Some(seed)).expect("generation terminates");

    assert_eq!(generated.seed, seed);
    assert_eq!(generated.pathway.start(), Some(Address::new(start_row, 0)));
    assert_eq!(generated.pathway.end(), Some(Address::new(end_row, 8)));
    assert_eq!(generated.pathway, generate(size, 42));
}
