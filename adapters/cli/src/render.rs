//! Plain-text rendering of the grid for terminal output.

use std::{collections::HashSet, time::Duration};

use path_defence_core::{Address, GridSize, Pathway};

const EMPTY: char = '.';
const ROUTE: char = '#';
const ENTRY: char = 'S';
const BASE: char = 'E';
const TOWER: char = 'T';

/// Draws one line per grid row: `S` entry, `E` base, `#` pathway, `T` tower.
pub(crate) fn render_grid(size: GridSize, pathway: &Pathway, towers: &[Address]) -> String {
    let route: HashSet<Address> = pathway.cells().iter().copied().collect();
    let towers: HashSet<Address> = towers.iter().copied().collect();
    let start = pathway.start();
    let end = pathway.end();

    let mut out = String::with_capacity((size.columns() as usize + 1) * size.rows() as usize);
    for row in 0..size.rows() {
        for column in 0..size.columns() {
            let cell = Address::new(row, column);
            let glyph = if Some(cell) == start {
                ENTRY
            } else if Some(cell) == end {
                BASE
            } else if route.contains(&cell) {
                ROUTE
            } else if towers.contains(&cell) {
                TOWER
            } else {
                EMPTY
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

/// Formats a duration of simulated time as `mm:ss.mmm`.
pub(crate) fn clock(at: Duration) -> String {
    let millis = at.as_millis();
    format!(
        "{:02}:{:02}.{:03}",
        millis / 60_000,
        (millis / 1_000) % 60,
        millis % 1_000
    )
}

#[cfg(test)]
mod tests {
    use super::{clock, render_grid};
    use path_defence_core::{Address, GridSize, Pathway};
    use std::time::Duration;

    #[test]
    fn marks_entry_base_route_and_towers() {
        let pathway = Pathway::new(vec![
            Address::new(0, 0),
            Address::new(0, 1),
            Address::new(1, 1),
            Address::new(1, 2),
        ]);
        let rendered = render_grid(GridSize::new(2, 3), &pathway, &[Address::new(1, 0)]);

        assert_eq!(rendered, "S#.\nT#E\n");
    }

    #[test]
    fn clock_shows_minutes_seconds_and_millis() {
        assert_eq!(clock(Duration::from_millis(83_250)), "01:23.250");
    }
}
