//! Production queue: admission control, cancellation and the per-step tick.
//!
//! A queue belongs to one facility and holds the ordered list of admitted
//! [`ProductionItem`]s. In sequential mode only the head item progresses and
//! each finished item is handed to the producer on its own. In batched mode
//! (see [`crate::batched`]) several items progress at once and delivery
//! waits for a whole prefix of the queue.
//!
//! Commands take effect immediately on the queue's bookkeeping; cost and time
//! only change inside [`ProductionQueue::tick`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batched::BatchedState;
use crate::catalog::{Catalog, CatalogEntry, ItemId};
use crate::collaborators::{
    Collaborators, FacilityId, NotificationSink, OwnedActors, PlayerId, ProduceRequest,
    ProducerId, ProducerSlot, ProductionInit,
};
use crate::config::{QueueConfig, QueueMode};
use crate::economy::{PowerState, ResourcePool};
use crate::error::Result;
use crate::events::ProductionEvent;
use crate::item::{ItemTick, ProductionItem};
use crate::math::{fraction, Fixed};
use crate::state::{Producibles, ProductionState};

/// Why a `StartProduction` order was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum AdmissionError {
    /// The queue is disabled (invalid faction, no producer, or facility lost).
    #[error("production queue is disabled")]
    QueueDisabled,
    /// The item is not built by this queue's category.
    #[error("item is not built by this queue")]
    WrongCategory,
    /// Prerequisites for the item are not met.
    #[error("prerequisites are not met")]
    NotBuildable,
    /// The queue already holds its maximum number of items.
    #[error("queue limit reached")]
    QueueLimitReached,
    /// The queue already holds its maximum number of items of this type.
    #[error("item limit reached")]
    ItemLimitReached,
    /// The order asked for more items than one order may queue.
    #[error("order limit reached")]
    OrderLimitReached,
    /// Owned plus queued units already reach the item's build limit.
    #[error("build limit reached")]
    BuildLimitReached,
    /// The item is not in the catalog.
    #[error("unknown item")]
    UnknownItem,
    /// Zero orders were requested.
    #[error("requested count is zero")]
    ZeroCount,
}

/// Developer cheats that affect production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeveloperMode {
    /// Ignore prerequisites and every admission limit.
    #[serde(default)]
    pub all_tech: bool,
    /// Every item builds in a single step.
    #[serde(default)]
    pub fast_build: bool,
}

/// The player a queue currently works for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    /// Owning player.
    pub player: PlayerId,
    /// The player's faction.
    pub faction: String,
    /// The player's developer settings.
    #[serde(default)]
    pub developer: DeveloperMode,
}

impl Owner {
    /// Create an owner without developer settings.
    #[must_use]
    pub fn new(player: u32, faction: impl Into<String>) -> Self {
        Self {
            player: PlayerId(player),
            faction: faction.into(),
            developer: DeveloperMode::default(),
        }
    }

    /// Set developer settings.
    #[must_use]
    pub fn with_developer(mut self, developer: DeveloperMode) -> Self {
        self.developer = developer;
        self
    }
}

/// Commands accepted from the order layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionOrder {
    /// Queue `count` orders of an item.
    StartProduction {
        /// Item to build.
        item: ItemId,
        /// Orders requested.
        count: u32,
    },
    /// Put every queued item of a type on hold, or resume it.
    PauseProduction {
        /// Item type.
        item: ItemId,
        /// New pause flag.
        paused: bool,
    },
    /// Cancel up to `count` queued items of a type, oldest first.
    CancelProduction {
        /// Item type.
        item: ItemId,
        /// Maximum number of items to cancel.
        count: u32,
    },
}

/// Progress and delivery strategy of a queue.
#[derive(Debug, Clone, Default)]
pub(crate) enum Strategy {
    #[default]
    Sequential,
    Batched(BatchedState),
}

/// Result of handing a finished item to the producer.
enum Delivery {
    Produced,
    Blocked,
    Unavailable,
}

/// Ordered production queue for one facility.
#[derive(Debug, Clone)]
pub struct ProductionQueue {
    pub(crate) config: QueueConfig,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) facility: FacilityId,
    pub(crate) owner: Owner,
    pub(crate) faction: String,
    pub(crate) valid_faction: bool,
    pub(crate) enabled: bool,
    pub(crate) alive: bool,
    pub(crate) producers: Vec<ProducerSlot>,
    pub(crate) producibles: Producibles,
    pub(crate) items: Vec<ProductionItem>,
    pub(crate) strategy: Strategy,
    pub(crate) events: Vec<ProductionEvent>,
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Cost of a partial purchase, scaled by the units actually admitted.
fn scaled_cost(cost: i32, units: u32, per_purchase: u32) -> i32 {
    if units >= per_purchase {
        return cost;
    }
    let scaled = i64::from(cost) * i64::from(units) / i64::from(per_purchase.max(1));
    i32::try_from(scaled).unwrap_or(cost)
}

impl ProductionQueue {
    /// Create a queue for a facility.
    ///
    /// The queue's faction is the owner's. Use [`Self::with_faction`] when
    /// the facility was created with an explicit faction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::FoundryError::Config`] if the configuration
    /// is invalid.
    pub fn new(
        config: QueueConfig,
        catalog: Arc<Catalog>,
        facility: FacilityId,
        owner: Owner,
        producers: Vec<ProducerSlot>,
    ) -> Result<Self> {
        config.validate()?;

        let strategy = match &config.mode {
            QueueMode::Sequential => Strategy::Sequential,
            QueueMode::ParallelBatched(batched) => {
                Strategy::Batched(BatchedState::new(batched.clone()))
            }
        };
        let faction = owner.faction.clone();

        let mut queue = Self {
            config,
            catalog,
            facility,
            owner,
            faction: String::new(),
            valid_faction: false,
            enabled: false,
            alive: true,
            producers,
            producibles: Producibles::default(),
            items: Vec::new(),
            strategy,
            events: Vec::new(),
        };
        queue.refresh_faction(faction);
        Ok(queue)
    }

    /// Override the faction inherited from the owner.
    #[must_use]
    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.refresh_faction(faction.into());
        self
    }

    fn refresh_faction(&mut self, faction: String) {
        self.valid_faction = self.config.allows_faction(&faction);
        self.faction = faction;
        self.refresh_enabled();
        self.producibles = if self.valid_faction {
            Producibles::for_category(&self.catalog, &self.config.queue_type)
        } else {
            Producibles::default()
        };
    }

    fn any_producer_enabled(&self) -> bool {
        self.producers.iter().any(|p| !p.disabled)
    }

    fn refresh_enabled(&mut self) {
        self.enabled = self.valid_faction && self.alive && self.any_producer_enabled();
    }

    // ------------------------------------------------------------------
    // Catalog-derived values
    // ------------------------------------------------------------------

    fn build_time(&self, entry: &CatalogEntry) -> u32 {
        if self.owner.developer.fast_build {
            return 0;
        }
        let time = u128::from(entry.base_build_time())
            * u128::from(entry.build_duration_modifier)
            * u128::from(self.config.build_duration_modifier)
            / 10_000;
        u32::try_from(time).unwrap_or(u32::MAX)
    }

    /// Build time an item would get if it started now.
    #[must_use]
    pub fn build_time_for(&self, item: &str) -> Option<u32> {
        self.catalog.get(item).map(|entry| self.build_time(entry))
    }

    /// Production category handed to the producer for an item.
    pub(crate) fn producer_category<'a>(&'a self, entry: &'a CatalogEntry) -> &'a str {
        if self.owner.developer.all_tech {
            return &self.config.queue_type;
        }
        entry
            .build_at_production_type
            .as_deref()
            .unwrap_or(&self.config.queue_type)
    }

    pub(crate) fn production_init(&self, entry: &CatalogEntry) -> ProductionInit {
        ProductionInit {
            owner: self.owner.player,
            faction: entry
                .initial_faction
                .clone()
                .unwrap_or_else(|| self.faction.clone()),
        }
    }

    fn is_buildable(&self, item: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if self.owner.developer.all_tech {
            return self.producibles.contains(item);
        }
        self.producibles.get(item).is_some_and(|s| s.buildable)
    }

    fn count_of(&self, item: &ItemId) -> u32 {
        len_u32(self.items.iter().filter(|i| i.item() == item).count())
    }

    pub(crate) fn play(&self, notifications: &mut dyn NotificationSink, cue: Option<&str>) {
        if let Some(cue) = cue {
            notifications.play_cue(cue, &self.owner.faction);
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Apply an order from the order layer.
    ///
    /// Returns the number of items admitted, paused or cancelled.
    ///
    /// # Errors
    ///
    /// Returns the admission failure for a `StartProduction` order that
    /// admitted nothing.
    pub fn resolve_order(
        &mut self,
        order: &ProductionOrder,
        ctx: &mut Collaborators<'_>,
    ) -> std::result::Result<u32, AdmissionError> {
        match order {
            ProductionOrder::StartProduction { item, count } => {
                self.start_production(item.as_str(), *count, ctx)
            }
            ProductionOrder::PauseProduction { item, paused } => {
                Ok(self.pause_production(item.as_str(), *paused, ctx))
            }
            ProductionOrder::CancelProduction { item, count } => {
                Ok(self.cancel_production(item.as_str(), *count, ctx))
            }
        }
    }

    fn check_admissible<'c>(
        &self,
        catalog: &'c Catalog,
        item: &str,
        count: u32,
    ) -> std::result::Result<&'c CatalogEntry, AdmissionError> {
        if !self.enabled {
            return Err(AdmissionError::QueueDisabled);
        }
        let entry = catalog.get(item).ok_or(AdmissionError::UnknownItem)?;
        if !entry.produced_in(&self.config.queue_type) {
            return Err(AdmissionError::WrongCategory);
        }
        if !self.is_buildable(item) {
            return Err(AdmissionError::NotBuildable);
        }
        if count == 0 {
            return Err(AdmissionError::ZeroCount);
        }
        Ok(entry)
    }

    /// Units the next admitted order of `entry` may carry, or the limit
    /// that blocks it.
    fn headroom(&self, entry: &CatalogEntry, owned: u32) -> std::result::Result<u32, AdmissionError> {
        if self.config.queue_limit > 0 && len_u32(self.items.len()) >= self.config.queue_limit {
            return Err(AdmissionError::QueueLimitReached);
        }
        if self.config.item_limit > 0 && self.count_of(&entry.id) >= self.config.item_limit {
            return Err(AdmissionError::ItemLimitReached);
        }
        if entry.build_limit > 0 {
            let queued_units: u32 = self
                .items
                .iter()
                .filter(|i| i.item() == &entry.id)
                .map(ProductionItem::count)
                .sum();
            let used = queued_units.saturating_add(owned);
            if used >= entry.build_limit {
                return Err(AdmissionError::BuildLimitReached);
            }
            return Ok((entry.build_limit - used).min(entry.count));
        }
        Ok(entry.count)
    }

    fn rejection_cue(&self, reason: AdmissionError) -> Option<&str> {
        match reason {
            AdmissionError::QueueLimitReached
            | AdmissionError::ItemLimitReached
            | AdmissionError::OrderLimitReached => {
                self.config.cues.limited.as_deref()
            }
            AdmissionError::ZeroCount => None,
            _ => self.config.cues.blocked.as_deref(),
        }
    }

    fn reject(
        &mut self,
        item: ItemId,
        reason: AdmissionError,
        count: u32,
        notifications: &mut dyn NotificationSink,
    ) {
        tracing::debug!(
            facility = self.facility.0,
            item = %item,
            %reason,
            count,
            "Production order rejected"
        );
        self.events.push(ProductionEvent::Rejected {
            facility: self.facility,
            item,
            reason,
            count,
        });
        self.play(notifications, self.rejection_cue(reason));
    }

    /// Queue up to `count` orders of an item.
    ///
    /// Limits are re-checked before every admitted order, so a request that
    /// runs into a limit is admitted partially. The charged cost of an order
    /// that carries fewer units than a full purchase is scaled down.
    ///
    /// # Errors
    ///
    /// Returns the reason if nothing was admitted. The blocked or limited
    /// cue has already been played.
    pub fn start_production(
        &mut self,
        item: &str,
        count: u32,
        ctx: &mut Collaborators<'_>,
    ) -> std::result::Result<u32, AdmissionError> {
        if let Strategy::Batched(state) = &mut self.strategy {
            state.on_admission_attempt();
        }

        let catalog = Arc::clone(&self.catalog);
        let entry = match self.check_admissible(&catalog, item, count) {
            Ok(entry) => entry,
            Err(reason) => {
                self.reject(ItemId::new(item), reason, count, ctx.notifications);
                return Err(reason);
            }
        };

        let all_tech = self.owner.developer.all_tech;
        let owned = ctx.owned.owned_count(self.owner.player, &entry.id);
        let time = self.build_time(entry);

        let wanted = count.min(self.config.order_limit);
        let mut admitted = 0;
        let mut total_cost = 0_i32;
        let mut limit = None;
        while admitted < wanted {
            let units = if all_tech {
                entry.count
            } else {
                match self.headroom(entry, owned) {
                    Ok(units) => units,
                    Err(reason) => {
                        limit = Some(reason);
                        break;
                    }
                }
            };
            let cost = scaled_cost(entry.cost, units, entry.count);
            self.items
                .push(ProductionItem::new(entry.id.clone(), units, cost, time));
            total_cost = total_cost.saturating_add(cost);
            admitted += 1;
        }
        if limit.is_none() && admitted < count {
            limit = Some(AdmissionError::OrderLimitReached);
        }

        if admitted > 0 {
            tracing::debug!(
                facility = self.facility.0,
                item = %entry.id,
                admitted,
                total_cost,
                build_time = time,
                "Production admitted"
            );
            self.events.push(ProductionEvent::Admitted {
                facility: self.facility,
                item: entry.id.clone(),
                count: admitted,
                total_cost,
            });
            self.play(ctx.notifications, self.config.cues.queued.as_deref());
        }

        if let Some(reason) = limit {
            self.reject(entry.id.clone(), reason, count - admitted, ctx.notifications);
            if admitted == 0 {
                return Err(reason);
            }
        }

        Ok(admitted)
    }

    /// Set the pause flag on every queued item of a type.
    ///
    /// Returns the number of items affected. Ignored while disabled.
    pub fn pause_production(&mut self, item: &str, paused: bool, ctx: &mut Collaborators<'_>) -> u32 {
        if !self.enabled {
            return 0;
        }

        let mut affected = 0;
        for queued in self.items.iter_mut().filter(|i| i.item().as_str() == item) {
            queued.pause(paused);
            affected += 1;
        }

        if affected > 0 {
            tracing::debug!(facility = self.facility.0, item, paused, affected, "Production paused");
            self.events.push(ProductionEvent::Paused {
                facility: self.facility,
                item: ItemId::new(item),
                paused,
                affected,
            });
            if paused {
                self.play(ctx.notifications, self.config.cues.on_hold.as_deref());
            }
        }
        affected
    }

    /// Cancel up to `count` queued items of a type, oldest first.
    ///
    /// Each cancelled item refunds what it has already withdrawn. Returns
    /// the number cancelled. Ignored while disabled.
    pub fn cancel_production(&mut self, item: &str, count: u32, ctx: &mut Collaborators<'_>) -> u32 {
        if !self.enabled {
            return 0;
        }

        let cancelled = self.cancel_matching(item, count, ctx.resources);
        if cancelled > 0 {
            if let Strategy::Batched(state) = &mut self.strategy {
                state.on_admission_attempt();
            }
            self.play(ctx.notifications, self.config.cues.cancelled.as_deref());
        }
        cancelled
    }

    pub(crate) fn cancel_matching(
        &mut self,
        item: &str,
        count: u32,
        resources: &mut dyn ResourcePool,
    ) -> u32 {
        let mut cancelled = 0;
        while cancelled < count {
            let Some(index) = self.items.iter().position(|i| i.item().as_str() == item) else {
                break;
            };
            let removed = self.items.remove(index);
            let refund = removed.refund_value();
            if refund != 0 {
                resources.refund(refund);
            }
            if removed.listed_for_delivery {
                if let Strategy::Batched(state) = &mut self.strategy {
                    state.forget(removed.item(), removed.count());
                }
            }
            tracing::debug!(facility = self.facility.0, item, refund, "Production cancelled");
            self.events.push(ProductionEvent::Cancelled {
                facility: self.facility,
                item: removed.item().clone(),
                refund,
            });
            cancelled += 1;
        }
        cancelled
    }

    /// Refund and remove every item. Returns the total refund.
    pub(crate) fn flush(&mut self, resources: &mut dyn ResourcePool) -> i32 {
        if let Strategy::Batched(state) = &mut self.strategy {
            state.reset();
        }
        if self.items.is_empty() {
            return 0;
        }

        let refund = self
            .items
            .iter()
            .map(ProductionItem::refund_value)
            .fold(0_i32, i32::saturating_add);
        if refund != 0 {
            resources.refund(refund);
        }
        tracing::debug!(
            facility = self.facility.0,
            items = self.items.len(),
            refund,
            "Production queue flushed"
        );
        self.items.clear();
        self.events.push(ProductionEvent::Flushed {
            facility: self.facility,
            refund,
        });
        refund
    }

    // ------------------------------------------------------------------
    // Notifications from the outside world
    // ------------------------------------------------------------------

    /// Prerequisites for an item became available.
    pub fn prerequisites_available(&mut self, item: &str) {
        if !self.producibles.set_buildable(item, true) {
            tracing::warn!(facility = self.facility.0, item, "Prerequisite update for unknown item");
        }
    }

    /// Prerequisites for an item became unavailable.
    pub fn prerequisites_unavailable(&mut self, item: &str) {
        if !self.producibles.set_buildable(item, false) {
            tracing::warn!(facility = self.facility.0, item, "Prerequisite update for unknown item");
        }
    }

    /// An item should be hidden from the build palette.
    pub fn item_hidden(&mut self, item: &str) {
        if !self.producibles.set_visible(item, false) {
            tracing::warn!(facility = self.facility.0, item, "Visibility update for unknown item");
        }
    }

    /// An item should be shown on the build palette.
    pub fn item_visible(&mut self, item: &str) {
        if !self.producibles.set_visible(item, true) {
            tracing::warn!(facility = self.facility.0, item, "Visibility update for unknown item");
        }
    }

    /// The facility changed owner.
    ///
    /// Every item is refunded into the previous owner's pool. No item is
    /// carried over. The producible cache starts from scratch and must be
    /// refreshed by the new owner's tech tree.
    pub fn transfer_ownership(&mut self, new_owner: Owner, old_resources: &mut dyn ResourcePool) {
        self.flush(old_resources);

        tracing::info!(
            facility = self.facility.0,
            from = self.owner.player.0,
            to = new_owner.player.0,
            "Production facility changed owner"
        );

        let faction = if self.config.sticky {
            self.faction.clone()
        } else {
            new_owner.faction.clone()
        };
        self.owner = new_owner;
        self.refresh_faction(faction);
    }

    /// The facility was destroyed, sold or transformed.
    pub fn facility_lost(&mut self, resources: &mut dyn ResourcePool) {
        self.flush(resources);
        self.alive = false;
        self.enabled = false;
        tracing::info!(facility = self.facility.0, "Production facility lost");
    }

    /// A structure left the queue through external placement.
    ///
    /// Returns `false` if no finished item of that type is waiting.
    pub fn complete_placement(&mut self, item: &str) -> bool {
        let Some(index) = self
            .items
            .iter()
            .position(|i| i.is_done() && i.item().as_str() == item)
        else {
            return false;
        };
        let placed = self.items.remove(index);
        tracing::debug!(facility = self.facility.0, item, "Structure placed");
        self.events.push(ProductionEvent::Delivered {
            facility: self.facility,
            item: placed.item().clone(),
            count: placed.count(),
        });
        true
    }

    /// Enable or disable a producer slot. Returns `false` for unknown slots.
    pub fn set_producer_disabled(&mut self, producer: ProducerId, disabled: bool) -> bool {
        let Some(slot) = self.producers.iter_mut().find(|p| p.id == producer) else {
            return false;
        };
        slot.disabled = disabled;
        true
    }

    /// Pause or resume a producer slot. Returns `false` for unknown slots.
    pub fn set_producer_paused(&mut self, producer: ProducerId, paused: bool) -> bool {
        let Some(slot) = self.producers.iter_mut().find(|p| p.id == producer) else {
            return false;
        };
        slot.paused = paused;
        true
    }

    // ------------------------------------------------------------------
    // Simulation step
    // ------------------------------------------------------------------

    /// Advance the queue by one simulation step.
    ///
    /// Returns every event generated since the previous step, including
    /// those from commands applied in between.
    pub fn tick(&mut self, ctx: &mut Collaborators<'_>) -> Vec<ProductionEvent> {
        let any_enabled = self.any_producer_enabled();
        let all_paused = !self.producers.iter().any(|p| !p.paused);

        if !any_enabled {
            self.flush(ctx.resources);
        }
        self.enabled = self.valid_faction && any_enabled && self.alive;

        if self.enabled {
            let mut strategy = std::mem::take(&mut self.strategy);
            match &mut strategy {
                Strategy::Sequential => self.tick_sequential(ctx, all_paused),
                Strategy::Batched(state) => self.tick_batched(state, ctx, all_paused),
            }
            self.strategy = strategy;
        }

        self.drain_events()
    }

    /// Take every pending event.
    pub fn drain_events(&mut self) -> Vec<ProductionEvent> {
        std::mem::take(&mut self.events)
    }

    fn tick_sequential(&mut self, ctx: &mut Collaborators<'_>, all_paused: bool) {
        self.drop_ineligible_heads(ctx.resources);

        if self.items.is_empty() || all_paused {
            return;
        }

        if self.tick_item(0, ctx) == ItemTick::AwaitingDelivery {
            self.deliver_head(ctx);
        }
    }

    /// Refund and remove head items whose prerequisites were revoked.
    fn drop_ineligible_heads(&mut self, resources: &mut dyn ResourcePool) {
        while let Some(head) = self.items.first() {
            if self.is_buildable(head.item().as_str()) {
                break;
            }
            let dropped = self.items.remove(0);
            let refund = dropped.refund_value();
            if refund != 0 {
                resources.refund(refund);
            }
            tracing::debug!(
                facility = self.facility.0,
                item = %dropped.item(),
                refund,
                "Dropped item that is no longer buildable"
            );
            self.events.push(ProductionEvent::Dropped {
                facility: self.facility,
                item: dropped.item().clone(),
                refund,
            });
        }
    }

    /// Tick one item and record what happened.
    pub(crate) fn tick_item(&mut self, index: usize, ctx: &mut Collaborators<'_>) -> ItemTick {
        let factor = self.config.slowdown_factor();
        let time = self
            .build_time_for(self.items[index].item().as_str())
            .unwrap_or(0);

        let queued = &mut self.items[index];
        let outcome = queued.tick(ctx.resources, ctx.power, factor, || time);
        match outcome {
            ItemTick::Stalled { cost } => self.events.push(ProductionEvent::Stalled {
                facility: self.facility,
                item: queued.item().clone(),
                cost,
            }),
            ItemTick::Finished { .. } => {
                tracing::debug!(facility = self.facility.0, item = %queued.item(), "Production complete");
                self.events.push(ProductionEvent::Completed {
                    facility: self.facility,
                    item: queued.item().clone(),
                });
            }
            _ => {}
        }
        outcome
    }

    /// Hand the finished head item to the producer.
    fn deliver_head(&mut self, ctx: &mut Collaborators<'_>) {
        let catalog = Arc::clone(&self.catalog);
        let Some(head) = self.items.first() else {
            return;
        };
        let Some(entry) = catalog.get(head.item().as_str()) else {
            return;
        };
        let count = head.count();
        let notified = head.completion_notified;

        if entry.is_structure {
            if !notified {
                self.play(ctx.notifications, self.config.cues.ready.as_deref());
                self.items[0].completion_notified = true;
            }
            return;
        }

        match self.build_unit(entry, count, ctx) {
            Delivery::Produced => {
                self.items.remove(0);
                if !notified {
                    self.play(ctx.notifications, self.config.cues.ready.as_deref());
                }
                tracing::debug!(facility = self.facility.0, item = %entry.id, count, "Item delivered");
                self.events.push(ProductionEvent::Delivered {
                    facility: self.facility,
                    item: entry.id.clone(),
                    count,
                });
            }
            Delivery::Blocked => {
                if !notified {
                    self.play(ctx.notifications, self.config.cues.blocked.as_deref());
                    self.items[0].completion_notified = true;
                    self.events.push(ProductionEvent::DeliveryBlocked {
                        facility: self.facility,
                        item: entry.id.clone(),
                    });
                }
            }
            Delivery::Unavailable => {
                tracing::warn!(
                    facility = self.facility.0,
                    item = %entry.id,
                    "No producer available, cancelling queued items"
                );
                self.events.push(ProductionEvent::ProducerUnavailable {
                    facility: self.facility,
                    item: entry.id.clone(),
                });
                self.cancel_matching(entry.id.as_str(), u32::MAX, ctx.resources);
            }
        }
    }

    fn build_unit(&self, entry: &CatalogEntry, count: u32, ctx: &mut Collaborators<'_>) -> Delivery {
        if !self.alive {
            return Delivery::Unavailable;
        }
        let Some(slot) = self.most_likely_producer() else {
            return Delivery::Unavailable;
        };
        if slot.paused {
            return Delivery::Blocked;
        }

        let init = self.production_init(entry);
        let request = ProduceRequest {
            facility: self.facility,
            producer: slot.id,
            item: &entry.id,
            category: self.producer_category(entry),
            count,
            init: &init,
        };
        if ctx.producer.produce_one(&request) {
            Delivery::Produced
        } else {
            Delivery::Blocked
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Facility this queue belongs to.
    #[must_use]
    pub const fn facility(&self) -> FacilityId {
        self.facility
    }

    /// Queue configuration.
    #[must_use]
    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Current owner.
    #[must_use]
    pub const fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Faction the queue builds for.
    #[must_use]
    pub fn faction(&self) -> &str {
        &self.faction
    }

    /// Whether the faction may use this queue.
    #[must_use]
    pub const fn is_valid_faction(&self) -> bool {
        self.valid_faction
    }

    /// Whether the queue accepts orders and makes progress.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Producer slots attached to the facility.
    #[must_use]
    pub fn producers(&self) -> &[ProducerSlot] {
        &self.producers
    }

    /// The producer most likely to receive the next finished item.
    ///
    /// Among enabled producers of the queue's category the first unpaused
    /// one is preferred.
    #[must_use]
    pub fn most_likely_producer(&self) -> Option<&ProducerSlot> {
        let mut candidates = self
            .producers
            .iter()
            .filter(|p| !p.disabled && p.produces(&self.config.queue_type));
        let first = candidates.next()?;
        if !first.paused {
            return Some(first);
        }
        Some(candidates.find(|p| !p.paused).unwrap_or(first))
    }

    /// The head item.
    #[must_use]
    pub fn current_item(&self) -> Option<&ProductionItem> {
        self.items.first()
    }

    /// Every queued item, head first.
    #[must_use]
    pub fn all_queued(&self) -> &[ProductionItem] {
        &self.items
    }

    /// The first item that is not on hold, or the head if all are.
    #[must_use]
    pub fn first_unpaused_item(&self) -> Option<&ProductionItem> {
        self.items
            .iter()
            .find(|i| !i.is_paused())
            .or_else(|| self.items.first())
    }

    /// Items to show on the build palette.
    #[must_use]
    pub fn all_items(&self) -> Vec<&ItemId> {
        if self.owner.developer.all_tech {
            return self.producibles.all().collect();
        }
        self.producibles.listed().collect()
    }

    /// Items that may be queued right now.
    #[must_use]
    pub fn buildable_items(&self) -> Vec<&ItemId> {
        if !self.enabled {
            return Vec::new();
        }
        if self.owner.developer.all_tech {
            return self.producibles.all().collect();
        }
        self.producibles.buildable().collect()
    }

    /// Whether prerequisites for an item are met.
    #[must_use]
    pub fn can_build(&self, item: &str) -> bool {
        self.producibles
            .get(item)
            .is_some_and(|s| s.buildable || self.owner.developer.all_tech)
    }

    /// Cached prerequisite state of an item.
    #[must_use]
    pub fn production_state(&self, item: &str) -> Option<ProductionState> {
        self.producibles.get(item)
    }

    /// Check the admission limits for one more order of an item.
    ///
    /// Returns whether it would be admitted and the cue that would play.
    #[must_use]
    pub fn can_queue(&self, item: &str, owned: &dyn OwnedActors) -> (bool, Option<&str>) {
        let queued = self.config.cues.queued.as_deref();
        let Some(entry) = self.catalog.get(item) else {
            return (false, self.config.cues.blocked.as_deref());
        };
        if self.owner.developer.all_tech {
            return (true, queued);
        }
        match self.headroom(entry, owned.owned_count(self.owner.player, &entry.id)) {
            Ok(_) => (true, queued),
            Err(reason) => (false, self.rejection_cue(reason)),
        }
    }

    /// Number of queued items.
    #[must_use]
    pub fn queue_length(&self) -> usize {
        self.items.len()
    }

    /// Remaining cost of the head item.
    #[must_use]
    pub fn current_remaining_cost(&self) -> i32 {
        self.items.first().map_or(0, ProductionItem::remaining_cost)
    }

    /// Remaining time of the head item.
    #[must_use]
    pub fn current_remaining_time(&self) -> u32 {
        self.items.first().map_or(0, ProductionItem::remaining_time)
    }

    /// Slowdown countdown of the head item.
    #[must_use]
    pub fn current_slowdown(&self) -> u32 {
        self.items.first().map_or(0, ProductionItem::slowdown)
    }

    /// Whether the head item is on hold.
    #[must_use]
    pub fn current_paused(&self) -> bool {
        self.items.first().is_some_and(ProductionItem::is_paused)
    }

    /// Whether the head item is finished.
    #[must_use]
    pub fn current_done(&self) -> bool {
        self.items.first().is_some_and(ProductionItem::is_done)
    }

    /// Remaining time of the head item as the player experiences it.
    #[must_use]
    pub fn remaining_time_actual(&self, power: PowerState) -> u32 {
        self.items.first().map_or(0, |item| {
            item.remaining_time_actual(power, self.config.slowdown_factor())
        })
    }

    /// Fraction of the queue's total build time already completed.
    #[must_use]
    pub fn progress(&self) -> Fixed {
        let (elapsed, total) = self.items.iter().fold((0_u64, 0_u64), |(e, t), item| {
            let total = u64::from(item.total_time());
            (e + total - u64::from(item.remaining_time()), t + total)
        });
        fraction(elapsed, total)
    }

    /// Units waiting for batched delivery. Always empty in sequential mode.
    #[must_use]
    pub fn pending_delivery(&self) -> &[ItemId] {
        match &self.strategy {
            Strategy::Batched(state) => state.pending(),
            Strategy::Sequential => &[],
        }
    }

    /// Batched delivery state, if this queue delivers in batches.
    #[must_use]
    pub fn batched_state(&self) -> Option<&BatchedState> {
        match &self.strategy {
            Strategy::Batched(state) => Some(state),
            Strategy::Sequential => None,
        }
    }

    /// Deterministic hash of the queue state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.facility.hash(&mut hasher);
        self.owner.hash(&mut hasher);
        self.faction.hash(&mut hasher);
        self.valid_faction.hash(&mut hasher);
        self.enabled.hash(&mut hasher);
        self.alive.hash(&mut hasher);
        self.producers.hash(&mut hasher);
        self.producibles.hash(&mut hasher);
        self.items.hash(&mut hasher);
        if let Strategy::Batched(state) = &self.strategy {
            state.hash(&mut hasher);
        }
        hasher.finish()
    }
}
