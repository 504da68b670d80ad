//! Substates: partial vectors obtained by forgetting observed features.
//!
//! A substate of a partial vector keeps a subset of its observed positions
//! and nulls out the rest. Substates let related partial observations share
//! statistics: every trial that realizes a state also realizes all of its
//! substates.
//!
//! Generation is exponential in the number of observed features (`2^k`
//! sub-actions for `k` observed bits); the observation budget bounds `k`.

use crate::error::Error;
use crate::obs::ObsAction;
use crate::PartialVector;

/// All element-wise sub-vectors of an observation action, the all-zero
/// action included.
///
/// Sub-actions are produced by direct subset iteration over the observed
/// positions, so duplicates are impossible by construction and the order is
/// deterministic (subset counter order, first observed position as the least
/// significant bit).
pub fn substate_actions(action: &ObsAction) -> Vec<ObsAction> {
    let observed = action.observed_indices();
    debug_assert!(observed.len() < usize::BITS as usize);
    let n = 1usize << observed.len();
    let mut subs = Vec::with_capacity(n);
    for mask in 0..n {
        let mut bits = vec![false; action.dim()];
        for (j, &i) in observed.iter().enumerate() {
            if (mask >> j) & 1 == 1 {
                bits[i] = true;
            }
        }
        subs.push(ObsAction::from_bits(bits));
    }
    subs
}

/// The substate of `partial` specified by `sub_action`: positions kept by
/// `sub_action` retain their value, all others become unobserved.
///
/// `sub_action` observing a position that `partial` does not observe is a
/// [`Error::ContractViolation`].
pub fn substate_of(partial: &[Option<f64>], sub_action: &ObsAction) -> Result<PartialVector, Error> {
    if sub_action.dim() != partial.len() {
        return Err(Error::contract(format!(
            "sub-action has {} bits for {} slots",
            sub_action.dim(),
            partial.len()
        )));
    }
    for (i, slot) in partial.iter().enumerate() {
        if sub_action.observes(i) && slot.is_none() {
            return Err(Error::contract(format!(
                "sub-action observes feature {i} which the vector does not observe"
            )));
        }
    }
    Ok(partial
        .iter()
        .enumerate()
        .map(|(i, slot)| if sub_action.observes(i) { *slot } else { None })
        .collect())
}

/// Every `(substate, sub_action)` pair of a partial vector under its
/// observation action, the all-sentinel trivial substate included.
///
/// `partial` must satisfy the sentinel-iff-unobserved invariant with respect
/// to `action`.
pub fn substates(
    partial: &[Option<f64>],
    action: &ObsAction,
) -> Result<Vec<(PartialVector, ObsAction)>, Error> {
    if action.dim() != partial.len() {
        return Err(Error::contract(format!(
            "observation action has {} bits for {} slots",
            action.dim(),
            partial.len()
        )));
    }
    for (i, slot) in partial.iter().enumerate() {
        if action.observes(i) != slot.is_some() {
            return Err(Error::contract(format!(
                "slot {i} breaks the sentinel-iff-unobserved invariant"
            )));
        }
    }
    substate_actions(action)
        .into_iter()
        .map(|sub| substate_of(partial, &sub).map(|s| (s, sub)))
        .collect()
}
