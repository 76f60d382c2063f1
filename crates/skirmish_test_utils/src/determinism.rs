//! Determinism testing utilities.
//!
//! Provides a harness for verifying that an encounter produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and scripted scenarios only make sense if the same inputs give
//! the same outcome. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   Systems use fixed-point arithmetic via [`skirmish_core::math::Fixed`].
//!
//! - **Map iteration order**: Rust's default hasher is randomized.
//!   The registry always iterates in ascending entity id order.
//!
//! - **Tie-breaking**: Equal-distance targets go to the lowest entity id.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, combat, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full encounters are reproducible
//! 4. **Parallel tests**: Running N encounters on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skirmish_core::encounter::Encounter;

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
    /// Get all unique hashes (should be 1 for a deterministic encounter).
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
                "Encounter is non-deterministic!\n\
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

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one tick
/// * `hash` - Computes the state hash
///
/// # Example
///
/// ```
/// use skirmish_core::encounter::Encounter;
/// use skirmish_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     3,
///     100,
///     || {
///         let mut encounter = Encounter::new();
///         encounter.spawn_starting_roster().unwrap();
///         encounter
///     },
///     |encounter| {
///         encounter.advance();
///     },
///     Encounter::state_hash,
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

/// Run an encounter twice from identical setup and compare final hashes.
pub fn verify_encounter_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Encounter,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |encounter| {
            encounter.advance();
        },
        Encounter::state_hash,
    )
    .is_deterministic
}

/// Result of parallel encounter runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each encounter.
    pub hashes: Vec<u64>,
    /// Number of ticks each encounter ran.
    pub ticks: u64,
    /// Number of encounters run.
    pub runs: usize,
}

impl ParallelRunResult {
    /// Check if all encounters produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all encounters matched.
    ///
    /// # Panics
    ///
    /// Panics if encounters produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel encounters diverged!\n\
                 Encounters: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.runs,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N independent encounters on scoped threads and collect final hashes.
///
/// Each thread builds its own encounter, so nothing but the hash crosses
/// a thread boundary.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_encounters<F>(setup_fn: F, runs: usize, num_ticks: u64) -> ParallelRunResult
where
    F: Fn() -> Encounter + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut encounter = setup_fn();
                    for _ in 0..num_ticks {
                        encounter.advance();
                    }
                    encounter.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult {
        hashes,
        ticks: num_ticks,
        runs,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(tick)` at the first tick
/// after which their hashes differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Encounter,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.advance();
        second.advance();

        if first.state_hash() != second.state_hash() {
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

/// Proptest strategies for encounter testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::math::{Fixed, Vec2Fixed};

    use crate::fixtures::{ScriptedEncounter, ScriptedOrder};

    /// Archetypes shipped with the core.
    pub const STOCK_ARCHETYPES: [&str; 4] = ["knight", "skeleton", "skirmisher", "heavy"];

    /// Generate a fixed-point coordinate on a 1280x800 field.
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (0i32..1280i32).prop_map(Fixed::from_num)
    }

    /// Generate a fixed-point speed.
    ///
    /// Range: 1 to 8 (units per tick), in quarter steps.
    pub fn arb_fixed_speed() -> impl Strategy<Value = Fixed> {
        (4i32..32i32).prop_map(|quarters| Fixed::from_num(quarters) / Fixed::from_num(4))
    }

    /// Generate a point on the field.
    pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a knockback impulse up to 60 units per axis.
    pub fn arb_impulse() -> impl Strategy<Value = Vec2Fixed> {
        (-60i32..60i32, -60i32..60i32).prop_map(|(x, y)| Vec2Fixed::from_int(x, y))
    }

    /// Generate health values (1-1000).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..1000u32
    }

    /// Generate damage values (1-100).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        1u32..100u32
    }

    /// Generate attack range in fixed-point.
    pub fn arb_attack_range() -> impl Strategy<Value = Fixed> {
        (0i32..200i32).prop_map(Fixed::from_num)
    }

    /// Generate one of the stock archetype names.
    pub fn arb_archetype() -> impl Strategy<Value = String> {
        proptest::sample::select(STOCK_ARCHETYPES.to_vec()).prop_map(str::to_string)
    }

    /// Generate an order for a roster of `units` entries.
    pub fn arb_order(units: usize) -> impl Strategy<Value = ScriptedOrder> {
        let unit = 0..units.max(1);
        prop_oneof![
            (unit.clone(), arb_vec2_position())
                .prop_map(|(unit, to)| ScriptedOrder::Move { unit, to }),
            (unit.clone(), unit.clone())
                .prop_map(|(unit, target)| ScriptedOrder::Attack { unit, target }),
            (unit, arb_impulse())
                .prop_map(|(unit, impulse)| ScriptedOrder::Knockback { unit, impulse }),
        ]
    }

    /// Generate a roster of up to `max_units` units with a timed order script.
    pub fn arb_scripted_encounter(
        max_units: usize,
        max_orders: usize,
        max_tick: u64,
    ) -> impl Strategy<Value = ScriptedEncounter> {
        proptest::collection::vec((arb_archetype(), arb_vec2_position()), 1..=max_units.max(1))
            .prop_flat_map(move |roster| {
                let units = roster.len();
                let orders = proptest::collection::vec(
                    (0..max_tick.max(1), arb_order(units)),
                    0..=max_orders,
                );
                (Just(roster), orders)
            })
            .prop_map(|(roster, orders)| ScriptedEncounter { roster, orders })
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::point;
    use proptest::prelude::*;

    fn roster_setup() -> Encounter {
        let mut encounter = Encounter::new();
        encounter.spawn_starting_roster().unwrap();
        encounter
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_unique_hashes_reports_divergence() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            ticks: 1,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    #[test]
    fn test_empty_encounter_determinism() {
        assert!(verify_encounter_determinism(Encounter::new, 100));
    }

    #[test]
    fn test_starting_roster_determinism() {
        assert!(verify_encounter_determinism(roster_setup, 1500));
    }

    #[test]
    fn test_find_divergence_on_deterministic_encounter() {
        assert_eq!(find_first_divergence(roster_setup, 300), None);
    }

    #[test]
    fn test_parallel_encounters_match() {
        let result = run_parallel_encounters(roster_setup, 4, 600);
        assert_eq!(result.hashes.len(), 4);
        result.assert_deterministic();
    }

    #[test]
    fn test_player_orders_are_deterministic() {
        let setup = || {
            let mut encounter = roster_setup();
            let _ = encounter.issue_move(skirmish_core::components::EntityId(1), point(300, 300));
            let _ = encounter.issue_attack(
                skirmish_core::components::EntityId(2),
                skirmish_core::components::EntityId(5),
            );
            encounter
        };
        let result = verify_determinism(
            5,
            800,
            setup,
            |encounter| {
                encounter.advance();
            },
            Encounter::state_hash,
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u64, "a")), compute_hash(&(1u64, "a")));
        assert_ne!(compute_hash(&1u64), compute_hash(&2u64));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_scripted_encounters_are_deterministic(
            script in arb_scripted_encounter(6, 8, 200),
        ) {
            let first = script.run(300).unwrap();
            let second = script.run(300).unwrap();
            prop_assert_eq!(first.state_hash(), second.state_hash());
            prop_assert_eq!(first.snapshot(), second.snapshot());
        }
    }
}
