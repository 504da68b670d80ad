//! Property and integration tests for the enumeration/indexing engine.

use peekwise::{
    enumerate_observation_actions, reachable_state_indices, state_index, state_space,
    state_space_summary, state_vector, substates, Error, FeatureCatalog, ObsAction,
};
use proptest::prelude::*;

/// Small integer-valued context matrices keep catalogs readable while still
/// exercising duplicate collapse and multi-value alphabets.
fn context_matrix(dim: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    proptest::collection::vec(
        proptest::collection::vec(0i32..5, dim),
        1..30,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|r| r.into_iter().map(f64::from).collect())
            .collect()
    })
}

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let mut acc = 1usize;
    for i in 0..k {
        acc = acc * (n - i) / (i + 1);
    }
    acc
}

// ---------------------------------------------------------------------------
// Enumerator
// ---------------------------------------------------------------------------

proptest! {
    /// No duplicates, weights bounded by the budget, counts match the
    /// closed-form binomial sums, and the full budget yields 2^D actions.
    #[test]
    fn enumerator_counts_match_binomial_sums(
        dim in 1usize..11,
        budget in 0usize..11,
    ) {
        let actions = enumerate_observation_actions(dim, budget);
        let expected: usize = (0..=budget.min(dim)).map(|k| binomial(dim, k)).sum();
        prop_assert_eq!(actions.len(), expected);

        let mut sorted = actions.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), actions.len(), "duplicate actions");

        prop_assert!(actions.iter().all(|a| a.weight() <= budget.min(dim)));
        if budget >= dim {
            prop_assert_eq!(actions.len(), 1usize << dim);
        }
    }

    /// Enumeration order is deterministic across runs with the same inputs.
    #[test]
    fn enumerator_is_deterministic(dim in 1usize..9, budget in 0usize..9) {
        prop_assert_eq!(
            enumerate_observation_actions(dim, budget),
            enumerate_observation_actions(dim, budget)
        );
    }
}

// ---------------------------------------------------------------------------
// State spaces
// ---------------------------------------------------------------------------

proptest! {
    /// Adding an observed bit for a feature with `c` catalog values
    /// multiplies `array_size` by `c` and `reachable` by `c - 1`.
    #[test]
    fn state_space_is_multiplicative(
        rows in context_matrix(4),
        bits in proptest::collection::vec(any::<bool>(), 4),
        flip in 0usize..4,
    ) {
        let catalog = FeatureCatalog::from_contexts(&rows).unwrap();
        let mut without = bits.clone();
        without[flip] = false;
        let mut with = bits;
        with[flip] = true;

        let base = state_space(&catalog, &ObsAction::from_bits(without)).unwrap();
        let grown = state_space(&catalog, &ObsAction::from_bits(with)).unwrap();
        let c = catalog.cardinality(flip) as u64;
        prop_assert_eq!(grown.array_size, base.array_size * c);
        prop_assert_eq!(grown.reachable, base.reachable * (c - 1));
    }

    /// `index -> vector -> index` is the identity over every reachable state,
    /// and reachable indices are exactly `reachable` many.
    #[test]
    fn round_trip_over_reachable_states(
        rows in context_matrix(3),
        bits in proptest::collection::vec(any::<bool>(), 3),
    ) {
        let catalog = FeatureCatalog::from_contexts(&rows).unwrap();
        let action = ObsAction::from_bits(bits);
        let space = state_space(&catalog, &action).unwrap();
        let indices = reachable_state_indices(&catalog, &action).unwrap();
        prop_assert_eq!(indices.len() as u64, space.reachable);

        for idx in indices {
            let vector = state_vector(&catalog, idx, &action).unwrap();
            prop_assert_eq!(state_index(&catalog, &vector, &action).unwrap(), idx);
        }
    }

    /// Every dataset row masks to a valid partial vector whose index is in
    /// range, and equal masked rows get equal indices.
    #[test]
    fn masked_rows_index_consistently(
        rows in context_matrix(3),
        bits in proptest::collection::vec(any::<bool>(), 3),
    ) {
        let catalog = FeatureCatalog::from_contexts(&rows).unwrap();
        let action = ObsAction::from_bits(bits);
        let space = state_space(&catalog, &action).unwrap();

        let mut index_of_row = Vec::new();
        for row in &rows {
            let partial = action.mask(row);
            let idx = state_index(&catalog, &partial, &action).unwrap();
            prop_assert!(idx < space.array_size);
            index_of_row.push((partial, idx));
        }
        for (a, ai) in &index_of_row {
            for (b, bi) in &index_of_row {
                if a == b {
                    prop_assert_eq!(ai, bi);
                }
            }
        }
    }

    /// The summary over an enumeration aggregates the per-action sizes.
    #[test]
    fn space_summary_aggregates(
        rows in context_matrix(3),
        budget in 0usize..4,
    ) {
        let catalog = FeatureCatalog::from_contexts(&rows).unwrap();
        let actions = enumerate_observation_actions(3, budget);
        let summary = state_space_summary(&catalog, &actions).unwrap();
        let sizes: Vec<u64> = actions
            .iter()
            .map(|a| state_space(&catalog, a).unwrap().array_size)
            .collect();
        prop_assert_eq!(summary.max_array_size, sizes.iter().copied().max().unwrap());
        prop_assert_eq!(summary.total_array_size, sizes.iter().sum::<u64>());
    }
}

// ---------------------------------------------------------------------------
// Contract enforcement
// ---------------------------------------------------------------------------

#[test]
fn sentinel_and_value_mismatches_are_contract_violations() {
    let catalog = FeatureCatalog::from_contexts(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let action = ObsAction::from_bits(vec![true, false]);

    // Sentinel at an observed position.
    let err = state_index(&catalog, &[None, None], &action).unwrap_err();
    assert!(matches!(err, Error::ContractViolation { .. }));

    // Concrete value at an unobserved position.
    let err = state_index(&catalog, &[Some(1.0), Some(2.0)], &action).unwrap_err();
    assert!(matches!(err, Error::ContractViolation { .. }));

    // Value outside the catalog is its own error.
    let err = state_index(&catalog, &[Some(9.0), None], &action).unwrap_err();
    assert!(matches!(err, Error::UnknownFeatureValue { feature: 0, .. }));
}

#[test]
fn substate_generation_covers_all_subsets() {
    let action = ObsAction::all(4);
    let partial = vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)];
    let subs = substates(&partial, &action).unwrap();
    assert_eq!(subs.len(), 16);
    assert!(subs.iter().any(|(s, _)| s.iter().all(Option::is_none)));
    assert!(subs.iter().any(|(s, _)| s == &partial));
}
