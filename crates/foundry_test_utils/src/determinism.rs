//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the scheduler produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Production must replay identically on every peer of a lockstep game.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: amortization is pure integer arithmetic and
//!   progress is reported as [`foundry_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Catalogs, players and owned counts live in `BTreeMap`s.
//!
//! - **Queue step order**: the simulation steps queues in insertion order,
//!   exactly once per tick.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use foundry_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Production is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```ignore
/// use foundry_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     5,   // Run 5 times
///     100, // 100 ticks each
///     || setup_scenario(),
///     |sim| { sim.tick(); },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a [`Simulation`] twice with identical setup and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run N simulations on scoped threads and collect their final hashes.
///
/// Catches state that leaks between runs through globals or thread-local
/// hasher seeds.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(hash) => hash,
                Err(_) => panic!("simulation thread panicked"),
            })
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match, `Some(tick)` if they diverge at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for scheduler inputs.
pub mod strategies {
    use foundry_core::prelude::*;
    use proptest::prelude::*;

    /// Item cost in a realistic range, including free items.
    pub fn arb_cost() -> impl Strategy<Value = i32> {
        0i32..5000
    }

    /// Build time in ticks, including instant builds.
    pub fn arb_build_time() -> impl Strategy<Value = u32> {
        0u32..600
    }

    /// Low-power slowdown factor.
    pub fn arb_slowdown() -> impl Strategy<Value = u32> {
        1u32..6
    }

    /// An order for one of the given items.
    pub fn arb_order(items: &'static [&'static str]) -> impl Strategy<Value = ProductionOrder> {
        let item = proptest::sample::select(items).prop_map(ItemId::new);
        prop_oneof![
            3 => (item.clone(), 1u32..6)
                .prop_map(|(item, count)| ProductionOrder::StartProduction { item, count }),
            1 => (item.clone(), any::<bool>())
                .prop_map(|(item, paused)| ProductionOrder::PauseProduction { item, paused }),
            1 => (item, 1u32..3)
                .prop_map(|(item, count)| ProductionOrder::CancelProduction { item, count }),
        ]
    }

    /// A tick-stamped order script.
    pub fn arb_script(
        items: &'static [&'static str],
        ticks: u64,
        len: usize,
    ) -> impl Strategy<Value = Vec<(u64, ProductionOrder)>> {
        proptest::collection::vec((0..ticks, arb_order(items)), 0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_determinism_counter() {
        let result = verify_determinism(3, 10, || 0u64, |n| *n += 7, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.unique_hashes(), vec![70]);
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&("trike", 3)), compute_hash(&("trike", 3)));
        assert_ne!(compute_hash(&("trike", 3)), compute_hash(&("trike", 4)));
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_deterministic_panics_on_mismatch() {
        DeterminismResult {
            is_deterministic: false,
            hashes: vec![1, 2],
            ticks: 5,
        }
        .assert_deterministic();
    }
}
