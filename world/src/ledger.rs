//! Base health and cash accounting.

/// Result of applying damage to the base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DamageReport {
    pub(crate) health: u32,
    pub(crate) destroyed_now: bool,
}

/// Tracks base health and the player's cash.
#[derive(Debug)]
pub(crate) struct Ledger {
    max_health: u32,
    health: u32,
    starting_cash: u32,
    cash: u32,
    destroyed: bool,
}

impl Ledger {
    pub(crate) fn new(max_health: u32, starting_cash: u32) -> Self {
        Self {
            max_health,
            health: max_health,
            starting_cash,
            cash: starting_cash,
            destroyed: max_health == 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.health = self.max_health;
        self.cash = self.starting_cash;
        self.destroyed = self.max_health == 0;
    }

    pub(crate) fn health(&self) -> u32 {
        self.health
    }

    pub(crate) fn max_health(&self) -> u32 {
        self.max_health
    }

    pub(crate) fn cash(&self) -> u32 {
        self.cash
    }

    /// Reduces health, clamping at zero. Destruction is reported once.
    pub(crate) fn damage(&mut self, amount: u32) -> DamageReport {
        self.health = self.health.saturating_sub(amount).min(self.max_health);
        let destroyed_now = self.health == 0 && !self.destroyed;
        if destroyed_now {
            self.destroyed = true;
        }
        DamageReport {
            health: self.health,
            destroyed_now,
        }
    }

    /// Deducts `cost` when affordable, otherwise leaves the balance untouched.
    pub(crate) fn try_spend(&mut self, cost: u32) -> Result<u32, u32> {
        match self.cash.checked_sub(cost) {
            Some(remaining) => {
                self.cash = remaining;
                Ok(remaining)
            }
            None => Err(self.cash),
        }
    }

    pub(crate) fn earn(&mut self, amount: u32) -> u32 {
        self.cash = self.cash.saturating_add(amount);
        self.cash
    }
}
