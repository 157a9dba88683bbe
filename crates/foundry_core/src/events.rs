//! Events generated by production queues.
//!
//! Queues never call back into game code except through their
//! collaborators. Everything else they do is reported as a
//! [`ProductionEvent`], drained from the queue once per step.

use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;
use crate::collaborators::FacilityId;
use crate::queue::AdmissionError;

/// Events generated by the production system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionEvent {
    /// Orders were admitted to the queue.
    Admitted {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type queued.
        item: ItemId,
        /// Number of orders admitted.
        count: u32,
        /// Cost of the admitted orders combined.
        total_cost: i32,
    },
    /// Orders were refused by admission control.
    Rejected {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type requested.
        item: ItemId,
        /// Why the orders were refused.
        reason: AdmissionError,
        /// Number of orders refused.
        count: u32,
    },
    /// Items were put on hold or resumed.
    Paused {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type affected.
        item: ItemId,
        /// New pause flag.
        paused: bool,
        /// Number of queued items affected.
        affected: u32,
    },
    /// An item was cancelled by order.
    Cancelled {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type cancelled.
        item: ItemId,
        /// Amount of resources refunded.
        refund: i32,
    },
    /// An item lost its prerequisites and was dropped from the queue.
    Dropped {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type dropped.
        item: ItemId,
        /// Amount of resources refunded.
        refund: i32,
    },
    /// The resource pool could not cover a step.
    Stalled {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type waiting for funds.
        item: ItemId,
        /// Step cost that could not be withdrawn.
        cost: i32,
    },
    /// An item finished building.
    Completed {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type finished.
        item: ItemId,
    },
    /// A finished item was handed to the producer.
    Delivered {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type delivered.
        item: ItemId,
        /// Units delivered.
        count: u32,
    },
    /// A finished item could not leave; the hand-off is retried next step.
    DeliveryBlocked {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type waiting.
        item: ItemId,
    },
    /// No producer could take a finished item; all items of that type were
    /// cancelled with refund.
    ProducerUnavailable {
        /// The facility owning the queue.
        facility: FacilityId,
        /// The item type cancelled.
        item: ItemId,
    },
    /// A batch of finished items was handed to the producer at once.
    BatchDelivered {
        /// The facility owning the queue.
        facility: FacilityId,
        /// One entry per delivered unit.
        items: Vec<ItemId>,
    },
    /// Every queued item was refunded and removed.
    Flushed {
        /// The facility owning the queue.
        facility: FacilityId,
        /// Total amount refunded.
        refund: i32,
    },
    /// A countdown threshold was crossed.
    CountdownCue {
        /// The facility owning the queue.
        facility: FacilityId,
        /// Remaining-time threshold in ticks.
        threshold: u32,
        /// Cue played.
        cue: String,
    },
}

impl ProductionEvent {
    /// The facility that generated the event.
    #[must_use]
    pub const fn facility(&self) -> FacilityId {
        match self {
            Self::Admitted { facility, .. }
            | Self::Rejected { facility, .. }
            | Self::Paused { facility, .. }
            | Self::Cancelled { facility, .. }
            | Self::Dropped { facility, .. }
            | Self::Stalled { facility, .. }
            | Self::Completed { facility, .. }
            | Self::Delivered { facility, .. }
            | Self::DeliveryBlocked { facility, .. }
            | Self::ProducerUnavailable { facility, .. }
            | Self::BatchDelivered { facility, .. }
            | Self::Flushed { facility, .. }
            | Self::CountdownCue { facility, .. } => *facility,
        }
    }

    /// Units that left the queue as produced items, with their count.
    #[must_use]
    pub fn delivered_units(&self) -> Vec<(&ItemId, u32)> {
        match self {
            Self::Delivered { item, count, .. } => vec![(item, *count)],
            Self::BatchDelivered { items, .. } => items.iter().map(|item| (item, 1)).collect(),
            _ => Vec::new(),
        }
    }

    /// Amount returned to the owner's resource pool.
    #[must_use]
    pub const fn refund(&self) -> i32 {
        match self {
            Self::Cancelled { refund, .. } | Self::Dropped { refund, .. } | Self::Flushed { refund, .. } => {
                *refund
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivered_units() {
        let single = ProductionEvent::Delivered {
            facility: FacilityId(1),
            item: ItemId::new("trike"),
            count: 2,
        };
        assert_eq!(single.delivered_units(), vec![(&ItemId::new("trike"), 2)]);

        let batch = ProductionEvent::BatchDelivered {
            facility: FacilityId(2),
            items: vec![ItemId::new("quad"), ItemId::new("quad")],
        };
        assert_eq!(batch.delivered_units().len(), 2);
        assert_eq!(batch.facility(), FacilityId(2));

        let flushed = ProductionEvent::Flushed {
            facility: FacilityId(3),
            refund: 40,
        };
        assert!(flushed.delivered_units().is_empty());
        assert_eq!(flushed.refund(), 40);
    }
}
