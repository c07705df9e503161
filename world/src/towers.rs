//! Authoritative tower state management utilities.

use std::collections::{BTreeMap, BTreeSet};

use path_defence_core::{ActorId, Address, TowerId, TowerStats};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Cell occupied by the tower.
    pub(crate) cell: Address,
    /// Parameters copied from the tower table at purchase time.
    pub(crate) stats: TowerStats,
    /// Actors currently inside range.
    pub(crate) targets: BTreeSet<ActorId>,
    /// Indicates whether the fire loop is running.
    pub(crate) firing: bool,
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, cell: Address, stats: TowerStats) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        let state = TowerState {
            id,
            cell,
            stats,
            targets: BTreeSet::new(),
            firing: false,
        };
        let _ = self.entries.insert(id, state);
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    /// Removes every tower, returning how many were removed.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
