//! Mixed-radix state indexing for partial context vectors.
//!
//! Given a [`FeatureCatalog`] and an [`ObsAction`], every partial vector maps
//! to a dense integer index by a positional-numeral-system fold: observed
//! positions contribute a digit (the value's catalog rank, sentinel rank 0)
//! in radix `cardinality(i)`; unobserved positions carry no information and
//! contribute radix 1. The encoding is injective over the sentinel-inclusive
//! alphabet and its image is exactly `[0, array_size)`.
//!
//! Two cardinalities matter per `(catalog, action)` pair:
//! - `array_size` — the addressable space, sentinel digits included;
//! - `reachable` — only sentinel-free combinations at observed positions,
//!   the states a valid partial vector can actually realize.

use itertools::Itertools;

use crate::catalog::FeatureCatalog;
use crate::error::Error;
use crate::obs::ObsAction;
use crate::PartialVector;

/// The two cardinalities of a `(catalog, action)` state space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateSpace {
    /// Number of sentinel-free partial vectors under the action.
    pub reachable: u64,
    /// Size of the addressable index range (sentinel digits included).
    pub array_size: u64,
}

/// Aggregate state-space sizes over an enumeration of observation actions.
///
/// Online algorithms size their statistics arrays with `max_array_size` and
/// their confidence bounds with `total_array_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpaceSummary {
    pub max_array_size: u64,
    pub total_array_size: u64,
}

fn check_dims(catalog: &FeatureCatalog, action: &ObsAction) -> Result<(), Error> {
    if action.dim() != catalog.dim() {
        return Err(Error::contract(format!(
            "observation action has {} bits for {} features",
            action.dim(),
            catalog.dim()
        )));
    }
    Ok(())
}

/// Compute both cardinalities for an observation action.
///
/// The all-zero action has a single "no observation" state, so both counts
/// are 1. Products are computed with checked arithmetic; overflow is
/// [`Error::CardinalityOverflow`].
pub fn state_space(catalog: &FeatureCatalog, action: &ObsAction) -> Result<StateSpace, Error> {
    check_dims(catalog, action)?;
    let overflow = || Error::CardinalityOverflow {
        feature_dim: catalog.dim(),
    };
    let mut reachable = 1u64;
    let mut array_size = 1u64;
    for i in 0..catalog.dim() {
        if !action.observes(i) {
            continue;
        }
        let card = catalog.cardinality(i) as u64;
        reachable = reachable.checked_mul(card - 1).ok_or_else(overflow)?;
        array_size = array_size.checked_mul(card).ok_or_else(overflow)?;
    }
    Ok(StateSpace {
        reachable,
        array_size,
    })
}

/// Aggregate `max` / `sum` of `array_size` over an action enumeration.
pub fn state_space_summary(
    catalog: &FeatureCatalog,
    actions: &[ObsAction],
) -> Result<SpaceSummary, Error> {
    let mut max_array_size = 0u64;
    let mut total_array_size = 0u64;
    for action in actions {
        let space = state_space(catalog, action)?;
        max_array_size = max_array_size.max(space.array_size);
        total_array_size = total_array_size
            .checked_add(space.array_size)
            .ok_or(Error::CardinalityOverflow {
                feature_dim: catalog.dim(),
            })?;
    }
    Ok(SpaceSummary {
        max_array_size,
        total_array_size,
    })
}

/// Map a partial vector to its state index under an observation action.
///
/// Validates, per position, that the slot is unobserved **iff** the action
/// bit is 0 — a mismatch is a [`Error::ContractViolation`], not silently
/// tolerated. The returned index is unique per partial vector given the
/// action and lies in `[0, array_size)`.
pub fn state_index(
    catalog: &FeatureCatalog,
    partial: &[Option<f64>],
    action: &ObsAction,
) -> Result<u64, Error> {
    check_dims(catalog, action)?;
    if partial.len() != catalog.dim() {
        return Err(Error::contract(format!(
            "partial vector has {} slots for {} features",
            partial.len(),
            catalog.dim()
        )));
    }

    let overflow = || Error::CardinalityOverflow {
        feature_dim: catalog.dim(),
    };
    let mut index = 0u64;
    for (i, slot) in partial.iter().enumerate() {
        match (action.observes(i), slot) {
            (true, None) => {
                return Err(Error::contract(format!(
                    "feature {i} is observed but the slot is unobserved"
                )));
            }
            (false, Some(v)) => {
                return Err(Error::contract(format!(
                    "feature {i} is unobserved but the slot carries value {v}"
                )));
            }
            (false, None) => {}
            (true, Some(_)) => {
                let card = catalog.cardinality(i) as u64;
                let digit = catalog.rank(i, *slot)? as u64;
                index = index
                    .checked_mul(card)
                    .and_then(|x| x.checked_add(digit))
                    .ok_or_else(overflow)?;
            }
        }
    }
    Ok(index)
}

/// Inverse of [`state_index`]: mixed-radix decode of an index back to a
/// partial vector (div/mod from the last feature backward).
///
/// Indices whose observed digit is 0 decode to the sentinel at an observed
/// position — addressable but unreachable vectors that [`state_index`]
/// rejects. Such indices never arise from valid partial vectors; decoding
/// them is supported so round-trip tests can sweep the whole index range.
pub fn state_vector(
    catalog: &FeatureCatalog,
    index: u64,
    action: &ObsAction,
) -> Result<PartialVector, Error> {
    check_dims(catalog, action)?;
    let space = state_space(catalog, action)?;
    if index >= space.array_size {
        return Err(Error::contract(format!(
            "state index {index} out of range (array size {})",
            space.array_size
        )));
    }

    let mut remaining = index;
    let mut slots = vec![None; catalog.dim()];
    for i in (0..catalog.dim()).rev() {
        if !action.observes(i) {
            continue;
        }
        let card = catalog.cardinality(i) as u64;
        let digit = (remaining % card) as usize;
        slots[i] = catalog.value_at_rank(i, digit)?;
        remaining /= card;
    }
    Ok(slots)
}

/// Enumerate the reachable state indices under an action, ascending.
///
/// Reachable states are the sentinel-free rank combinations at observed
/// positions; there are exactly `state_space(..).reachable` of them and they
/// occupy a deterministic subset of `[0, array_size)`. The list is
/// materialized, so the caller carries the exponential cost knowingly.
pub fn reachable_state_indices(
    catalog: &FeatureCatalog,
    action: &ObsAction,
) -> Result<Vec<u64>, Error> {
    check_dims(catalog, action)?;
    let observed = action.observed_indices();
    if observed.is_empty() {
        return Ok(vec![0]);
    }

    let overflow = || Error::CardinalityOverflow {
        feature_dim: catalog.dim(),
    };
    let rank_ranges: Vec<Vec<u64>> = observed
        .iter()
        .map(|&i| (1..catalog.cardinality(i) as u64).collect())
        .collect();
    let mut indices = Vec::new();
    for ranks in rank_ranges.into_iter().multi_cartesian_product() {
        let mut index = 0u64;
        for (&i, digit) in observed.iter().zip(ranks) {
            let card = catalog.cardinality(i) as u64;
            index = index
                .checked_mul(card)
                .and_then(|x| x.checked_add(digit))
                .ok_or_else(overflow)?;
        }
        indices.push(index);
    }
    Ok(indices)
}
