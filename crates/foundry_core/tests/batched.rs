//! Parallel progress and batched delivery.

use foundry_core::prelude::*;
use foundry_test_utils::fixtures::{delivered, starport_queue, Harness};
use foundry_test_utils::proptest::prelude::*;

fn limit(starport_limit: u32) -> BatchedConfig {
    BatchedConfig {
        starport_limit,
        ..BatchedConfig::default()
    }
}

fn ids(items: &[&str]) -> Vec<ItemId> {
    items.iter().map(|i| ItemId::new(*i)).collect()
}

#[test]
fn test_batch_waits_for_whole_prefix() {
    let mut queue = starport_queue(limit(3));
    let mut harness = Harness::with_cash(10_000);
    harness.order(&mut queue, "frigate", 1).unwrap();
    harness.order(&mut queue, "tank", 1).unwrap();
    harness.order(&mut queue, "frigate", 1).unwrap();

    harness.run(&mut queue, 5);
    assert!(harness.producer.batches.is_empty());
    assert_eq!(queue.pending_delivery(), ids(&["frigate", "frigate"]).as_slice());

    let events = harness.tick(&mut queue);
    assert_eq!(harness.producer.batches, vec![ids(&["frigate", "frigate", "tank"])]);
    assert!(queue.pending_delivery().is_empty());
    assert_eq!(queue.queue_length(), 0);
    assert_eq!(delivered(&events).len(), 3);
    assert_eq!(harness.sink.count("Ready"), 1);
}

#[test]
fn test_prefix_delivers_before_slow_tail() {
    let mut queue = starport_queue(limit(2));
    let mut harness = Harness::with_cash(10_000);
    harness.order(&mut queue, "frigate", 2).unwrap();
    harness.order(&mut queue, "tank", 1).unwrap();

    harness.run(&mut queue, 4);
    assert_eq!(harness.producer.batches, vec![ids(&["frigate", "frigate"])]);
    assert_eq!(queue.queue_length(), 1);

    harness.run(&mut queue, 2);
    assert_eq!(
        harness.producer.batches,
        vec![ids(&["frigate", "frigate"]), ids(&["tank"])]
    );
}

#[test]
fn test_finished_items_ride_along_with_the_next_batch() {
    let mut queue = starport_queue(limit(1));
    let mut harness = Harness::with_cash(10_000);
    harness.order(&mut queue, "tank", 1).unwrap();
    harness.order(&mut queue, "frigate", 2).unwrap();

    harness.run(&mut queue, 6);

    assert_eq!(harness.producer.batches, vec![ids(&["frigate", "frigate", "tank"])]);
    assert_eq!(queue.queue_length(), 0);
}

#[test]
fn test_multi_unit_order_lists_every_unit() {
    let mut queue = starport_queue(limit(1));
    let mut harness = Harness::with_cash(10_000);
    harness.order(&mut queue, "squad", 1).unwrap();

    harness.run(&mut queue, 9);

    assert_eq!(harness.producer.batches, vec![ids(&["squad", "squad", "squad"])]);
    assert_eq!(harness.producer.units(), 3);
}

#[test]
fn test_cancel_removes_listed_units() {
    let mut queue = starport_queue(limit(2));
    let mut harness = Harness::with_cash(10_000);
    harness.order(&mut queue, "frigate", 1).unwrap();
    harness.order(&mut queue, "tank", 1).unwrap();

    harness.run(&mut queue, 4);
    assert_eq!(queue.pending_delivery(), ids(&["frigate"]).as_slice());

    assert_eq!(queue.cancel_production("frigate", 1, &mut harness.ctx()), 1);
    assert!(queue.pending_delivery().is_empty());
    assert_eq!(harness.resources.cash, 10_000 - 80);

    harness.run(&mut queue, 2);
    assert_eq!(harness.producer.batches, vec![ids(&["tank"])]);
}

#[test]
fn test_blocked_batch_is_retried() {
    let mut queue = starport_queue(limit(2));
    let mut harness = Harness::with_cash(10_000);
    harness.producer.blocked = true;
    harness.order(&mut queue, "frigate", 2).unwrap();

    harness.run(&mut queue, 8);
    assert!(harness.producer.batches.is_empty());
    assert_eq!(queue.pending_delivery().len(), 2);
    assert!(harness.producer.attempts >= 5);

    harness.producer.blocked = false;
    harness.tick(&mut queue);
    assert_eq!(harness.producer.batches.len(), 1);
    assert!(queue.pending_delivery().is_empty());
}

#[test]
fn test_countdown_cues_replace_ready_cue() {
    let mut queue = starport_queue(BatchedConfig {
        countdown_thresholds: vec![3, 10],
        countdown_cues: vec!["TMinus3".to_string(), "TMinus10".to_string()],
        suppression_ticks: 2,
        ..BatchedConfig::default()
    });
    let mut harness = Harness::with_cash(10_000);
    harness.order(&mut queue, "frigate", 2).unwrap();

    let events = harness.run(&mut queue, 4);

    let cues: Vec<(u32, &str)> = events
        .iter()
        .filter_map(|e| match e {
            ProductionEvent::CountdownCue { threshold, cue, .. } => Some((*threshold, cue.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(cues, vec![(10, "TMinus10"), (3, "TMinus3")]);
    assert_eq!(harness.sink.names(), vec!["Queued", "TMinus10", "TMinus3"]);
    assert_eq!(harness.producer.batches.len(), 1);
}

#[test]
fn test_parallel_limit_caps_progressing_items() {
    let mut queue = starport_queue(BatchedConfig {
        parallel_limit: 2,
        ..BatchedConfig::default()
    });
    let mut harness = Harness::with_cash(10_000);
    harness.order(&mut queue, "tank", 3).unwrap();

    harness.tick(&mut queue);

    let started: Vec<bool> = queue.all_queued().iter().map(ProductionItem::is_started).collect();
    assert_eq!(started, vec![true, true, false]);
    assert_eq!(harness.resources.cash, 10_000 - 40);
}

proptest! {
    #[test]
    fn prop_every_admitted_unit_is_delivered_once(
        orders in proptest::collection::vec(proptest::sample::select(vec!["frigate", "tank", "squad"]), 1..8),
        starport_limit in 1u32..4,
        parallel_limit in 1u32..4,
    ) {
        let mut queue = starport_queue(BatchedConfig {
            starport_limit,
            parallel_limit,
            ..BatchedConfig::default()
        });
        let mut harness = Harness::with_cash(100_000);
        let mut expected = 0;
        for item in &orders {
            harness.order(&mut queue, item, 1).unwrap();
            expected += if *item == "squad" { 3 } else { 1 };
        }

        let events = harness.run(&mut queue, 200);

        prop_assert_eq!(delivered(&events).len(), expected);
        prop_assert_eq!(harness.producer.units() as usize, expected);
        prop_assert!(queue.pending_delivery().is_empty());
        prop_assert_eq!(queue.queue_length(), 0);
        prop_assert_eq!(harness.resources.spent, orders.iter().map(|i| match *i {
            "frigate" | "squad" => 300,
            _ => 120,
        }).sum::<i64>());
    }
}
