//! Cell grid bookkeeping: pathway membership, tower occupancy and selection.

use std::collections::HashMap;

use path_defence_core::{Address, GridSize, Pathway, SelectionError, TowerId, WorldPoint};

#[derive(Clone, Copy, Debug, Default)]
struct Cell {
    on_pathway: bool,
    tower: Option<TowerId>,
}

/// Dense cell table keyed by address.
#[derive(Debug)]
pub(crate) struct Grid {
    size: GridSize,
    spacing: f32,
    cells: HashMap<Address, Cell>,
    selected: Option<Address>,
}

impl Grid {
    pub(crate) fn new(size: GridSize, spacing: f32) -> Self {
        let cells = size
            .addresses()
            .map(|address| (address, Cell::default()))
            .collect();
        Self {
            size,
            spacing,
            cells,
            selected: None,
        }
    }

    pub(crate) fn size(&self) -> GridSize {
        self.size
    }

    pub(crate) fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Marks exactly the pathway's cells as pathway cells.
    pub(crate) fn install_pathway(&mut self, pathway: &Pathway) {
        for cell in self.cells.values_mut() {
            cell.on_pathway = false;
        }
        for address in pathway.cells() {
            if let Some(cell) = self.cells.get_mut(address) {
                cell.on_pathway = true;
            }
        }
    }

    pub(crate) fn is_pathway(&self, address: Address) -> bool {
        self.cells
            .get(&address)
            .map_or(false, |cell| cell.on_pathway)
    }

    pub(crate) fn occupant(&self, address: Address) -> Option<TowerId> {
        self.cells.get(&address).and_then(|cell| cell.tower)
    }

    pub(crate) fn occupy(&mut self, address: Address, tower: TowerId) {
        if let Some(cell) = self.cells.get_mut(&address) {
            cell.tower = Some(tower);
        }
    }

    pub(crate) fn clear_towers(&mut self) {
        for cell in self.cells.values_mut() {
            cell.tower = None;
        }
    }

    pub(crate) fn selected(&self) -> Option<Address> {
        self.selected
    }

    /// Toggles the selection on `address` and reports the resulting selection.
    pub(crate) fn select(&mut self, address: Address) -> Result<Option<Address>, SelectionError> {
        if !self.size.contains(address) {
            return Err(SelectionError::OutOfBounds);
        }
        if self.is_pathway(address) {
            return Err(SelectionError::OnPathway);
        }

        self.selected = if self.selected == Some(address) {
            None
        } else {
            Some(address)
        };
        Ok(self.selected)
    }

    /// Clears the selection, reporting whether one existed.
    pub(crate) fn deselect(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// World position of the cell centre.
    pub(crate) fn position(&self, address: Address) -> WorldPoint {
        WorldPoint::new(
            address.column() as f32 * self.spacing,
            address.row() as f32 * self.spacing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_pathway() -> Pathway {
        Pathway::new(vec![
            Address::new(1, 0),
            Address::new(1, 1),
            Address::new(1, 2),
        ])
    }

    #[test]
    fn pathway_cells_cannot_be_selected() {
        let mut grid = Grid::new(GridSize::new(3, 3), 1.0);
        grid.install_pathway(&straight_pathway());

        assert_eq!(
            grid.select(Address::new(1, 1)),
            Err(SelectionError::OnPathway)
        );
        assert_eq!(grid.selected(), None);
    }

    #[test]
    fn selecting_twice_toggles_selection() {
        let mut grid = Grid::new(GridSize::new(3, 3), 1.0);
        grid.install_pathway(&straight_pathway());

        assert_eq!(grid.select(Address::new(0, 2)), Ok(Some(Address::new(0, 2))));
        assert_eq!(grid.select(Address::new(0, 2)), Ok(None));
        assert_eq!(grid.select(Address::new(2, 0)), Ok(Some(Address::new(2, 0))));
        assert_eq!(grid.select(Address::new(0, 1)), Ok(Some(Address::new(0, 1))));
    }

    #[test]
    fn out_of_bounds_selection_is_rejected() {
        let mut grid = Grid::new(GridSize::new(2, 3), 1.0);
        assert_eq!(
            grid.select(Address::new(2, 0)),
            Err(SelectionError::OutOfBounds)
        );
    }

    #[test]
    fn reinstalling_pathway_clears_previous_membership() {
        let mut grid = Grid::new(GridSize::new(3, 3), 1.0);
        grid.install_pathway(&straight_pathway());
        grid.install_pathway(&Pathway::new(vec![
            Address::new(0, 0),
            Address::new(0, 1),
            Address::new(0, 2),
        ]));

        assert!(!grid.is_pathway(Address::new(1, 1)));
        assert!(grid.is_pathway(Address::new(0, 1)));
    }

    #[test]
    fn positions_scale_with_spacing() {
        let grid = Grid::new(GridSize::new(4, 4), 2.5);
        let point = grid.position(Address::new(1, 3));
        assert_eq!(point, WorldPoint::new(7.5, 2.5));
    }
}
