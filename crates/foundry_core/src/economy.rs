//! Resource pool and power state consumed by production queues.
//!
//! The pool is a single integer counter per owner. Withdrawals are
//! all-or-nothing: a queue either takes the whole step cost or nothing.

use serde::{Deserialize, Serialize};

/// Shared resource counter that queues withdraw from and refund into.
pub trait ResourcePool {
    /// Withdraw `amount` if the pool can cover all of it.
    ///
    /// Returns `false` and leaves the pool untouched otherwise.
    fn try_withdraw(&mut self, amount: i32) -> bool;

    /// Return `amount` to the pool.
    fn refund(&mut self, amount: i32);
}

/// Player cash stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerResources {
    /// Current cash.
    pub cash: i32,
    /// Total ever withdrawn, net of refunds.
    pub spent: i64,
}

impl PlayerResources {
    /// Create a stockpile with starting cash.
    #[must_use]
    pub const fn new(cash: i32) -> Self {
        Self { cash, spent: 0 }
    }

    /// Check if the stockpile covers a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: i32) -> bool {
        self.cash >= cost
    }

    /// Add income to the stockpile.
    pub fn deposit(&mut self, amount: i32) {
        self.cash = self.cash.saturating_add(amount);
    }
}

impl ResourcePool for PlayerResources {
    fn try_withdraw(&mut self, amount: i32) -> bool {
        if amount < 0 || !self.can_afford(amount) {
            return false;
        }
        self.cash -= amount;
        self.spent += i64::from(amount);
        true
    }

    fn refund(&mut self, amount: i32) {
        self.cash = self.cash.saturating_add(amount);
        self.spent -= i64::from(amount);
    }
}

/// Power state reported by the owner's power grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerState {
    /// Enough power: production runs at full rate.
    #[default]
    Normal,
    /// Power shortage: production is slowed down.
    Degraded,
}

impl PowerState {
    /// Check if production should be throttled.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Degraded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_is_all_or_nothing() {
        let mut resources = PlayerResources::new(50);

        assert!(resources.try_withdraw(30));
        assert_eq!(resources.cash, 20);

        assert!(!resources.try_withdraw(21));
        assert_eq!(resources.cash, 20);
        assert_eq!(resources.spent, 30);

        assert!(resources.try_withdraw(20));
        assert_eq!(resources.cash, 0);
    }

    #[test]
    fn test_withdraw_zero_always_succeeds() {
        let mut resources = PlayerResources::new(0);
        assert!(resources.try_withdraw(0));
        assert_eq!(resources.cash, 0);
    }

    #[test]
    fn test_negative_withdraw_rejected() {
        let mut resources = PlayerResources::new(10);
        assert!(!resources.try_withdraw(-5));
        assert_eq!(resources.cash, 10);
    }

    #[test]
    fn test_refund_tracks_spent() {
        let mut resources = PlayerResources::new(100);
        assert!(resources.try_withdraw(60));
        resources.refund(25);
        assert_eq!(resources.cash, 65);
        assert_eq!(resources.spent, 35);
    }

    #[test]
    fn test_power_state_default() {
        assert_eq!(PowerState::default(), PowerState::Normal);
        assert!(PowerState::Degraded.is_degraded());
        assert!(!PowerState::Normal.is_degraded());
    }
}
