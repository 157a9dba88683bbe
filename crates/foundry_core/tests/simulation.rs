//! Determinism and end-to-end behaviour of the simulation driver.

use foundry_core::prelude::*;
use foundry_core::simulation::TICK_DURATION_MS;
use foundry_test_utils::determinism::strategies::arb_script;
use foundry_test_utils::determinism::{
    find_first_divergence, run_parallel_simulations, verify_determinism,
    verify_simulation_determinism,
};
use foundry_test_utils::fixtures::standard_catalog;
use foundry_test_utils::proptest::prelude::*;

const VEHICLES: FacilityId = FacilityId(1);
const STARPORT: FacilityId = FacilityId(2);

fn create_sim() -> (Simulation, PlayerId, PlayerId) {
    let mut sim = Simulation::new(standard_catalog());
    let atreides = sim.add_player(1, "atreides", 5_000);
    let ordos = sim.add_player(2, "ordos", 5_000);
    sim.add_queue(
        QueueConfig::new("Vehicle").with_item_limit(3),
        VEHICLES,
        atreides,
        vec![ProducerSlot::new(1, "Vehicle")],
    )
    .unwrap();
    sim.add_queue(
        QueueConfig::new("Starport").batched(BatchedConfig {
            starport_limit: 3,
            countdown_thresholds: vec![5, 20],
            countdown_cues: vec!["TMinus5".to_string(), "TMinus20".to_string()],
            suppression_ticks: 3,
            ..BatchedConfig::default()
        }),
        STARPORT,
        atreides,
        vec![ProducerSlot::new(1, "Starport")],
    )
    .unwrap();
    for item in ["trike", "raider", "harvester", "frigate", "tank", "squad"] {
        sim.apply(SimCommand::Grant {
            player: atreides,
            item: ItemId::new(item),
        })
        .unwrap();
    }
    (sim, atreides, ordos)
}

fn start(facility: FacilityId, item: &str, count: u32) -> SimCommand {
    SimCommand::Order {
        facility,
        order: ProductionOrder::StartProduction {
            item: ItemId::new(item),
            count,
        },
    }
}

fn busy_sim() -> Simulation {
    let (mut sim, atreides, ordos) = create_sim();
    sim.schedule(0, start(VEHICLES, "trike", 2));
    sim.schedule(0, start(STARPORT, "frigate", 2));
    sim.schedule(3, start(STARPORT, "squad", 1));
    sim.schedule(5, start(VEHICLES, "raider", 5));
    sim.schedule(
        12,
        SimCommand::SetPower {
            player: atreides,
            power: PowerState::Degraded,
        },
    );
    sim.schedule(
        30,
        SimCommand::SetPower {
            player: atreides,
            power: PowerState::Normal,
        },
    );
    sim.schedule(
        40,
        SimCommand::Order {
            facility: VEHICLES,
            order: ProductionOrder::CancelProduction {
                item: ItemId::new("raider"),
                count: 1,
            },
        },
    );
    sim.schedule(60, SimCommand::Transfer { facility: STARPORT, to: ordos });
    sim
}

#[test]
fn test_tick_duration() {
    assert_eq!(TICK_DURATION_MS, 40);
}

#[test]
fn test_busy_scenario_is_deterministic() {
    let result = verify_determinism(
        5,
        120,
        busy_sim,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    );
    result.assert_deterministic();
    assert!(verify_simulation_determinism(busy_sim, 120));
    assert_eq!(find_first_divergence(busy_sim, 120), None);
}

#[test]
fn test_parallel_runs_match() {
    run_parallel_simulations(busy_sim, 4, 120).assert_deterministic();
}

#[test]
fn test_busy_scenario_outcome() {
    let mut sim = busy_sim();
    let atreides = PlayerId(1);
    sim.run(120);

    assert_eq!(sim.owned_count(atreides, &ItemId::new("trike")), 2);
    assert_eq!(sim.owned_count(atreides, &ItemId::new("frigate")), 2);
    assert_eq!(sim.owned_count(atreides, &ItemId::new("squad")), 3);

    let starport = sim.queue(STARPORT).unwrap();
    assert_eq!(starport.owner().player, PlayerId(2));
    assert!(starport.all_queued().is_empty());

    let cash = sim.player(atreides).unwrap().resources;
    assert_eq!(i64::from(cash.cash) + cash.spent, 5_000);
    assert!(sim.cues().iter().any(|c| c.cue == "TMinus20"));
}

#[test]
fn test_facility_lost_refunds_and_disables() {
    let (mut sim, atreides, _) = create_sim();
    sim.apply(start(VEHICLES, "trike", 3)).unwrap();
    sim.run(5);
    assert_eq!(sim.player(atreides).unwrap().resources.cash, 4_950);

    sim.apply(SimCommand::FacilityLost { facility: VEHICLES }).unwrap();
    assert_eq!(sim.player(atreides).unwrap().resources.cash, 5_000);

    let events = sim.tick();
    assert_eq!(
        events,
        vec![ProductionEvent::Flushed {
            facility: VEHICLES,
            refund: 50,
        }]
    );
    assert!(!sim.queue(VEHICLES).unwrap().is_enabled());
    assert!(sim.tick().is_empty());
}

#[test]
fn test_revoked_prerequisite_drops_head() {
    let (mut sim, atreides, _) = create_sim();
    sim.apply(start(VEHICLES, "trike", 1)).unwrap();
    sim.run(3);

    sim.apply(SimCommand::Revoke {
        player: atreides,
        item: ItemId::new("trike"),
    })
    .unwrap();
    let events = sim.tick();

    assert!(events.contains(&ProductionEvent::Dropped {
        facility: VEHICLES,
        item: ItemId::new("trike"),
        refund: 30,
    }));
    assert_eq!(sim.player(atreides).unwrap().resources.cash, 5_000);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_random_scripts_replay_identically(
        script in arb_script(&["trike", "raider", "harvester"], 80, 30),
    ) {
        let setup = || {
            let (mut sim, _, _) = create_sim();
            for (tick, order) in &script {
                sim.schedule(*tick, SimCommand::Order { facility: VEHICLES, order: order.clone() });
            }
            sim
        };
        prop_assert!(verify_simulation_determinism(setup, 100));

        let mut sim = setup();
        sim.run(100);
        for player in sim.players() {
            prop_assert_eq!(i64::from(player.resources.cash) + player.resources.spent, 5_000);
        }
    }
}
