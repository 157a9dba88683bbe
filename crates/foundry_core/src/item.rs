//! Amortized production of a single admitted order.
//!
//! An item spreads its total cost over its build time. Each step it computes
//! how much of the cost should still be unspent after the step, by linear
//! interpolation from `(total_time, total_cost)` down to `(0, 0)`, and
//! withdraws the difference from the resource pool. Because the target is
//! recomputed from the totals every step, integer rounding never accumulates:
//! the withdrawals over an item's life always sum to exactly `total_cost`.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;
use crate::economy::{PowerState, ResourcePool};
use crate::math::{fraction, Fixed};

/// Lifecycle phase of a production item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemPhase {
    /// Admitted, not yet ticked.
    Pending,
    /// Build time has been resolved and progress may happen.
    Active,
    /// Fully paid and built, waiting to be removed by its queue.
    Done,
}

/// Outcome of one [`ProductionItem::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTick {
    /// The item is on hold.
    Paused,
    /// Power is degraded and this step was skipped.
    Throttled,
    /// The pool could not cover the step cost; nothing changed.
    Stalled {
        /// Cost that could not be withdrawn.
        cost: i32,
    },
    /// One step of progress was paid for.
    Progressed {
        /// Cost withdrawn this step.
        cost: i32,
    },
    /// The final step was paid for and the item is now done.
    Finished {
        /// Cost withdrawn this step.
        cost: i32,
    },
    /// The item was already done; it is waiting for delivery or removal.
    AwaitingDelivery,
}

/// One admitted order in a production queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionItem {
    item: ItemId,
    count: u32,
    total_cost: i32,
    remaining_cost: i32,
    total_time: u32,
    remaining_time: u32,
    started: bool,
    paused: bool,
    done: bool,
    slowdown: u32,
    /// Set once the item's units are on a pending delivery list.
    pub(crate) listed_for_delivery: bool,
    /// Set once the ready or blocked cue has been played for this item.
    pub(crate) completion_notified: bool,
}

impl ProductionItem {
    /// Create a new item.
    ///
    /// `build_time` is provisional; it is resolved again on the first tick.
    #[must_use]
    pub fn new(item: ItemId, count: u32, cost: i32, build_time: u32) -> Self {
        let total_time = build_time.max(1);
        Self {
            item,
            count,
            total_cost: cost,
            remaining_cost: cost,
            total_time,
            remaining_time: total_time,
            started: false,
            paused: false,
            done: false,
            slowdown: 0,
            listed_for_delivery: false,
            completion_notified: false,
        }
    }

    /// Item type.
    #[must_use]
    pub fn item(&self) -> &ItemId {
        &self.item
    }

    /// Units delivered when this item completes.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Cost of the whole order.
    #[must_use]
    pub const fn total_cost(&self) -> i32 {
        self.total_cost
    }

    /// Cost not yet withdrawn.
    #[must_use]
    pub const fn remaining_cost(&self) -> i32 {
        self.remaining_cost
    }

    /// Build time in ticks.
    #[must_use]
    pub const fn total_time(&self) -> u32 {
        self.total_time
    }

    /// Ticks of progress still needed.
    #[must_use]
    pub const fn remaining_time(&self) -> u32 {
        self.remaining_time
    }

    /// Whether the first tick has happened.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the item is on hold.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the item is fully built.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Current slowdown countdown.
    #[must_use]
    pub const fn slowdown(&self) -> u32 {
        self.slowdown
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> ItemPhase {
        if self.done {
            ItemPhase::Done
        } else if self.started {
            ItemPhase::Active
        } else {
            ItemPhase::Pending
        }
    }

    /// Amount already withdrawn, which is what a cancellation refunds.
    #[must_use]
    pub const fn refund_value(&self) -> i32 {
        self.total_cost - self.remaining_cost
    }

    /// Remaining time as the player experiences it, accounting for slowdown.
    #[must_use]
    pub fn remaining_time_actual(&self, power: PowerState, slowdown_factor: u32) -> u32 {
        if power.is_degraded() {
            self.remaining_time.saturating_mul(slowdown_factor)
        } else {
            self.remaining_time
        }
    }

    /// Fraction of the build time completed.
    #[must_use]
    pub fn progress(&self) -> Fixed {
        let total = u64::from(self.total_time);
        fraction(total - u64::from(self.remaining_time), total)
    }

    /// Put the item on hold or resume it.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Unspent cost the item should have once the current step is paid.
    ///
    /// This is the post-step target `total_cost * (remaining_time - 1) /
    /// total_time`, so the step's withdrawal is `remaining_cost` minus this.
    /// It reaches zero on the final step.
    fn expected_remaining_cost(&self) -> i32 {
        if self.remaining_time <= 1 {
            return 0;
        }
        let expected = i64::from(self.total_cost) * i64::from(self.remaining_time - 1)
            / i64::from(self.total_time);
        // expected <= total_cost, so it fits back into i32.
        i32::try_from(expected).unwrap_or(self.total_cost)
    }

    /// Advance the item by one simulation step.
    ///
    /// `resolve_time` is called once, on the first unpaused tick, to fix the
    /// build time with whatever modifiers apply at that moment. While
    /// `power` is degraded only every `slowdown_factor`-th call makes
    /// progress. A step whose cost the pool cannot cover leaves cost, time and
    /// the pool untouched and is retried identically on the next call. The
    /// build time is still fixed by a first tick that stalls.
    pub fn tick(
        &mut self,
        pool: &mut dyn ResourcePool,
        power: PowerState,
        slowdown_factor: u32,
        resolve_time: impl FnOnce() -> u32,
    ) -> ItemTick {
        if self.done {
            return ItemTick::AwaitingDelivery;
        }

        if self.paused {
            return ItemTick::Paused;
        }

        if !self.started {
            let time = resolve_time().max(1);
            self.total_time = time;
            self.remaining_time = time;
            self.started = true;
        }

        if power.is_degraded() {
            if self.slowdown > 1 {
                self.slowdown -= 1;
                return ItemTick::Throttled;
            }
            self.slowdown = slowdown_factor.max(1);
        }

        let cost = self.remaining_cost - self.expected_remaining_cost();
        if cost != 0 && !pool.try_withdraw(cost) {
            tracing::trace!(item = %self.item, cost, "Production stalled on funds");
            return ItemTick::Stalled { cost };
        }

        self.remaining_cost -= cost;
        self.remaining_time -= 1;
        tracing::trace!(
            item = %self.item,
            cost,
            remaining_cost = self.remaining_cost,
            remaining_time = self.remaining_time,
            "Production step"
        );

        if self.remaining_time > 0 {
            return ItemTick::Progressed { cost };
        }

        self.done = true;
        ItemTick::Finished { cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::PlayerResources;

    fn run_to_completion(item: &mut ProductionItem, pool: &mut PlayerResources) -> Vec<i32> {
        let time = item.total_time();
        let mut withdrawals = Vec::new();
        for _ in 0..10_000 {
            match item.tick(pool, PowerState::Normal, 3, || time) {
                ItemTick::Progressed { cost } => withdrawals.push(cost),
                ItemTick::Finished { cost } => {
                    withdrawals.push(cost);
                    break;
                }
                other => panic!("unexpected tick outcome {other:?}"),
            }
        }
        withdrawals
    }

    #[test]
    fn test_even_cost_split() {
        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 100, 10);
        let mut pool = PlayerResources::new(1000);

        let withdrawals = run_to_completion(&mut item, &mut pool);

        assert_eq!(withdrawals, vec![10; 10]);
        assert!(item.is_done());
        assert_eq!(item.remaining_cost(), 0);
        assert_eq!(item.remaining_time(), 0);
        assert_eq!(pool.cash, 900);
    }

    #[test]
    fn test_uneven_cost_sums_exactly() {
        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 97, 10);
        let mut pool = PlayerResources::new(1000);

        let withdrawals = run_to_completion(&mut item, &mut pool);

        assert_eq!(withdrawals.len(), 10);
        assert_eq!(withdrawals.iter().sum::<i32>(), 97);
        assert!(withdrawals.iter().all(|&c| c == 9 || c == 10));
        assert_eq!(pool.cash, 903);
    }

    #[test]
    fn test_naive_division_under_collects() {
        // Fixed floor-divided step cost, the rejected formula.
        let naive: i32 = (0..10).map(|_| 97 / 10).sum();
        assert_eq!(naive, 90);

        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 97, 10);
        let mut pool = PlayerResources::new(1000);
        let withdrawals = run_to_completion(&mut item, &mut pool);
        assert_ne!(withdrawals.iter().sum::<i32>(), naive);
        assert_eq!(withdrawals.iter().sum::<i32>(), 97);
    }

    #[test]
    fn test_cost_larger_than_time() {
        let mut item = ProductionItem::new(ItemId::new("cheap"), 1, 3, 7);
        let mut pool = PlayerResources::new(10);

        let withdrawals = run_to_completion(&mut item, &mut pool);

        assert_eq!(withdrawals.len(), 7);
        assert_eq!(withdrawals.iter().sum::<i32>(), 3);
    }

    #[test]
    fn test_stall_on_insufficient_funds() {
        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 100, 10);
        let mut pool = PlayerResources::new(15);

        assert_eq!(
            item.tick(&mut pool, PowerState::Normal, 3, || 10),
            ItemTick::Progressed { cost: 10 }
        );
        assert_eq!(
            item.tick(&mut pool, PowerState::Normal, 3, || 10),
            ItemTick::Stalled { cost: 10 }
        );
        assert_eq!(item.remaining_cost(), 90);
        assert_eq!(item.remaining_time(), 9);
        assert_eq!(pool.cash, 5);

        pool.deposit(5);
        assert_eq!(
            item.tick(&mut pool, PowerState::Normal, 3, || 10),
            ItemTick::Progressed { cost: 10 }
        );
        assert_eq!(item.refund_value() + item.remaining_cost(), item.total_cost());
    }

    #[test]
    fn test_paused_item_does_not_change() {
        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 100, 10);
        let mut pool = PlayerResources::new(1000);
        item.tick(&mut pool, PowerState::Normal, 3, || 10);
        item.pause(true);

        for _ in 0..50 {
            assert_eq!(
                item.tick(&mut pool, PowerState::Normal, 3, || 10),
                ItemTick::Paused
            );
        }
        assert_eq!(item.remaining_cost(), 90);
        assert_eq!(item.remaining_time(), 9);
        assert_eq!(pool.cash, 990);
    }

    #[test]
    fn test_build_time_resolved_on_first_tick() {
        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 100, 10);
        let mut pool = PlayerResources::new(1000);
        assert_eq!(item.phase(), ItemPhase::Pending);

        item.tick(&mut pool, PowerState::Normal, 3, || 4);
        assert_eq!(item.phase(), ItemPhase::Active);
        assert_eq!(item.total_time(), 4);
        assert_eq!(item.remaining_time(), 3);
        assert_eq!(item.remaining_cost(), 75);
    }

    #[test]
    fn test_zero_build_time_takes_one_step() {
        let mut item = ProductionItem::new(ItemId::new("instant"), 1, 50, 0);
        let mut pool = PlayerResources::new(50);

        assert_eq!(
            item.tick(&mut pool, PowerState::Normal, 3, || 0),
            ItemTick::Finished { cost: 50 }
        );
        assert_eq!(item.phase(), ItemPhase::Done);
        assert_eq!(
            item.tick(&mut pool, PowerState::Normal, 3, || 0),
            ItemTick::AwaitingDelivery
        );
    }

    #[test]
    fn test_degraded_power_throttles() {
        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 100, 4);
        let mut pool = PlayerResources::new(1000);
        let mut outcomes = Vec::new();
        while !item.is_done() {
            outcomes.push(item.tick(&mut pool, PowerState::Degraded, 3, || 4));
        }

        let progressed = outcomes
            .iter()
            .filter(|o| matches!(o, ItemTick::Progressed { .. } | ItemTick::Finished { .. }))
            .count();
        assert_eq!(progressed, 4);
        // Progress on steps 1, 4, 7 and 10.
        assert_eq!(outcomes.len(), 10);
        assert_eq!(outcomes[1], ItemTick::Throttled);
        assert_eq!(outcomes[2], ItemTick::Throttled);
    }

    #[test]
    fn test_remaining_time_actual() {
        let item = ProductionItem::new(ItemId::new("tank"), 1, 100, 10);
        assert_eq!(item.remaining_time_actual(PowerState::Normal, 3), 10);
        assert_eq!(item.remaining_time_actual(PowerState::Degraded, 3), 30);
    }

    #[test]
    fn test_progress_fraction() {
        let mut item = ProductionItem::new(ItemId::new("tank"), 1, 100, 4);
        let mut pool = PlayerResources::new(1000);
        assert_eq!(item.progress(), Fixed::ZERO);
        item.tick(&mut pool, PowerState::Normal, 3, || 4);
        item.tick(&mut pool, PowerState::Normal, 3, || 4);
        assert_eq!(item.progress(), Fixed::from_num(0.5));
    }
}
