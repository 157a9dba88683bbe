//! Parallel progress with batched delivery.
//!
//! A batched queue advances up to `parallel_limit` items in the same step.
//! Finished items are collected into a pending delivery list, one entry per
//! unit, and nothing leaves the facility until every item in the first
//! `starport_limit` positions of the queue is finished. The whole pending
//! list is then handed to the producer in one call.
//!
//! While items are in flight the queue plays countdown cues as the combined
//! remaining build time crosses configured thresholds. Every admission
//! attempt re-arms the countdown and suppresses cues for a short window, so
//! that a new order does not immediately trigger a cue meant for the
//! previous one.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::catalog::ItemId;
use crate::collaborators::{BatchRequest, Collaborators, ProductionInit};
use crate::config::BatchedConfig;
use crate::events::ProductionEvent;
use crate::item::ProductionItem;
use crate::queue::ProductionQueue;

/// Countdown and delivery state of a batched queue.
#[derive(Debug, Clone)]
pub struct BatchedState {
    config: BatchedConfig,
    fired: Vec<bool>,
    suppression: u32,
    pending: Vec<ItemId>,
}

impl Hash for BatchedState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fired.hash(state);
        self.suppression.hash(state);
        self.pending.hash(state);
    }
}

impl BatchedState {
    /// Create the state for a configuration.
    #[must_use]
    pub fn new(config: BatchedConfig) -> Self {
        let fired = vec![false; config.countdown_thresholds.len()];
        Self {
            config,
            fired,
            suppression: 0,
            pending: Vec::new(),
        }
    }

    /// Batched settings.
    #[must_use]
    pub const fn config(&self) -> &BatchedConfig {
        &self.config
    }

    /// Units waiting for delivery, one entry per unit.
    #[must_use]
    pub fn pending(&self) -> &[ItemId] {
        &self.pending
    }

    /// Which countdown thresholds have fired in the current episode.
    #[must_use]
    pub fn fired(&self) -> &[bool] {
        &self.fired
    }

    /// Steps left before countdown cues may fire again.
    #[must_use]
    pub const fn suppression(&self) -> u32 {
        self.suppression
    }

    /// Re-arm every countdown threshold and restart the suppression window.
    pub(crate) fn on_admission_attempt(&mut self) {
        self.fired.fill(false);
        self.suppression = self.config.suppression_ticks;
    }

    /// Forget the listed units of a removed item.
    pub(crate) fn forget(&mut self, item: &ItemId, copies: u32) {
        let mut remaining = copies;
        self.pending.retain(|queued| {
            if remaining > 0 && queued == item {
                remaining -= 1;
                false
            } else {
                true
            }
        });
    }

    /// Drop pending units and re-arm the countdown.
    pub(crate) fn reset(&mut self) {
        self.fired.fill(false);
        self.pending.clear();
    }

    fn tick_suppression(&mut self) {
        self.suppression = self.suppression.saturating_sub(1);
    }

    /// Pick the countdown cue to play for the combined remaining time.
    ///
    /// The smallest unfired threshold at or above `total` fires, and it and
    /// every larger threshold are marked as fired.
    fn countdown(&mut self, total: u32, queued: usize) -> Option<(u32, String)> {
        if total == 0 || queued == 0 || self.suppression > 0 {
            return None;
        }
        let index = self
            .config
            .countdown_thresholds
            .iter()
            .zip(&self.fired)
            .position(|(&threshold, &fired)| total <= threshold && !fired)?;

        for flag in &mut self.fired[index..] {
            *flag = true;
        }
        let threshold = self.config.countdown_thresholds[index];
        let cue = self.config.countdown_cues.get(index)?.clone();
        Some((threshold, cue))
    }
}

impl ProductionQueue {
    /// One step of a batched queue.
    pub(crate) fn tick_batched(
        &mut self,
        state: &mut BatchedState,
        ctx: &mut Collaborators<'_>,
        all_paused: bool,
    ) {
        state.tick_suppression();

        if !all_paused {
            self.tick_parallel(state.config.parallel_limit, ctx);
        }

        let total = self.remaining_build_time();
        if let Some((threshold, cue)) = state.countdown(total, self.items.len()) {
            tracing::debug!(facility = self.facility.0, threshold, total, %cue, "Countdown cue");
            self.play(ctx.notifications, Some(cue.as_str()));
            self.events.push(ProductionEvent::CountdownCue {
                facility: self.facility,
                threshold,
                cue,
            });
        }

        for item in &mut self.items {
            if item.is_done() && !item.listed_for_delivery {
                for _ in 0..item.count() {
                    state.pending.push(item.item().clone());
                }
                item.listed_for_delivery = true;
            }
        }

        if self.items.is_empty() {
            return;
        }
        let prefix = usize::try_from(state.config.starport_limit)
            .unwrap_or(usize::MAX)
            .min(self.items.len());
        if !self.items[..prefix].iter().all(ProductionItem::is_done) {
            return;
        }

        self.deliver_batch(state, ctx);
    }

    /// Tick unfinished items in queue order, up to `limit` of them.
    fn tick_parallel(&mut self, limit: u32, ctx: &mut Collaborators<'_>) {
        let mut active = 0;
        for index in 0..self.items.len() {
            if self.items[index].is_done() {
                continue;
            }
            self.tick_item(index, ctx);
            active += 1;
            if active >= limit {
                break;
            }
        }
    }

    /// Combined remaining build time of every unfinished item.
    fn remaining_build_time(&self) -> u32 {
        self.items
            .iter()
            .filter(|item| !item.is_done())
            .map(|item| {
                if item.is_started() {
                    item.remaining_time()
                } else {
                    item.total_time()
                }
            })
            .fold(0, u32::saturating_add)
    }

    fn deliver_batch(&mut self, state: &mut BatchedState, ctx: &mut Collaborators<'_>) {
        let slot = if self.alive {
            self.most_likely_producer().cloned()
        } else {
            None
        };
        let Some(slot) = slot else {
            self.cancel_all(state, ctx);
            return;
        };
        if slot.paused {
            return;
        }

        let catalog = Arc::clone(&self.catalog);
        let Some(entry) = state.pending.first().and_then(|id| catalog.get(id.as_str())) else {
            return;
        };

        let inits: Vec<ProductionInit> = state
            .pending
            .iter()
            .map(|id| match catalog.get(id.as_str()) {
                Some(unit) => self.production_init(unit),
                None => ProductionInit {
                    owner: self.owner.player,
                    faction: self.faction.clone(),
                },
            })
            .collect();

        let request = BatchRequest {
            facility: self.facility,
            producer: slot.id,
            items: &state.pending,
            category: self.producer_category(entry),
            inits: &inits,
        };
        if !ctx.producer.produce_batch(&request) {
            tracing::trace!(facility = self.facility.0, "Batch delivery blocked");
            return;
        }

        if !state.config.has_countdown() {
            self.play(ctx.notifications, self.config.cues.ready.as_deref());
        }
        self.items.retain(|item| !item.listed_for_delivery);
        let items = std::mem::take(&mut state.pending);
        tracing::debug!(facility = self.facility.0, units = items.len(), "Batch delivered");
        self.events.push(ProductionEvent::BatchDelivered {
            facility: self.facility,
            items,
        });
    }

    /// Cancel every item with refund when no producer can take the batch.
    fn cancel_all(&mut self, state: &mut BatchedState, ctx: &mut Collaborators<'_>) {
        let Some(head) = self.items.first() else {
            return;
        };
        tracing::warn!(
            facility = self.facility.0,
            items = self.items.len(),
            "No producer available, cancelling queued items"
        );
        self.events.push(ProductionEvent::ProducerUnavailable {
            facility: self.facility,
            item: head.item().clone(),
        });

        for removed in std::mem::take(&mut self.items) {
            let refund = removed.refund_value();
            if refund != 0 {
                ctx.resources.refund(refund);
            }
            self.events.push(ProductionEvent::Cancelled {
                facility: self.facility,
                item: removed.item().clone(),
                refund,
            });
        }
        state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countdown_state() -> BatchedState {
        BatchedState::new(BatchedConfig {
            countdown_thresholds: vec![50, 100, 250],
            countdown_cues: vec![
                "TMinus1".to_string(),
                "TMinus2".to_string(),
                "TMinus5".to_string(),
            ],
            suppression_ticks: 3,
            ..BatchedConfig::default()
        })
    }

    #[test]
    fn test_countdown_fires_smallest_matching_threshold() {
        let mut state = countdown_state();

        assert_eq!(state.countdown(300, 1), None);
        assert_eq!(state.countdown(200, 1), Some((250, "TMinus5".to_string())));
        assert_eq!(state.fired(), &[false, false, true]);
        assert_eq!(state.countdown(180, 1), None);

        assert_eq!(state.countdown(40, 1), Some((50, "TMinus1".to_string())));
        assert_eq!(state.fired(), &[true, true, true]);
        assert_eq!(state.countdown(10, 1), None);
    }

    #[test]
    fn test_countdown_needs_work_in_flight() {
        let mut state = countdown_state();
        assert_eq!(state.countdown(0, 1), None);
        assert_eq!(state.countdown(10, 0), None);
        assert_eq!(state.fired(), &[false, false, false]);
    }

    #[test]
    fn test_admission_rearms_and_suppresses() {
        let mut state = countdown_state();
        assert!(state.countdown(80, 1).is_some());

        state.on_admission_attempt();
        assert_eq!(state.fired(), &[false, false, false]);
        assert_eq!(state.suppression(), 3);
        assert_eq!(state.countdown(80, 1), None);

        for _ in 0..3 {
            state.tick_suppression();
        }
        assert_eq!(state.suppression(), 0);
        assert_eq!(state.countdown(80, 1), Some((100, "TMinus2".to_string())));
    }

    #[test]
    fn test_forget_removes_listed_copies_only() {
        let mut state = BatchedState::new(BatchedConfig::default());
        state.pending = vec![
            ItemId::new("frigate"),
            ItemId::new("frigate"),
            ItemId::new("trike"),
            ItemId::new("frigate"),
        ];

        state.forget(&ItemId::new("frigate"), 2);
        assert_eq!(state.pending(), &[ItemId::new("trike"), ItemId::new("frigate")]);

        state.reset();
        assert!(state.pending().is_empty());
    }
}
