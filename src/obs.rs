//! Observation actions (feature-subset selections) and their enumeration.
//!
//! An observation action is a binary vector of length `D`: bit `i` set means
//! feature `i` is observed (and paid for) this trial. The enumerator produces
//! every distinct action whose Hamming weight fits a budget, in an order that
//! is deterministic across runs.

use itertools::Itertools;

use crate::error::Error;
use crate::PartialVector;

/// A binary feature-subset selection for a trial.
///
/// `Ord` is derived so collections of actions have a stable order without a
/// separate tie-break rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObsAction {
    bits: Vec<bool>,
}

impl ObsAction {
    /// Build an action from explicit bits.
    pub fn from_bits(bits: impl Into<Vec<bool>>) -> Self {
        Self { bits: bits.into() }
    }

    /// The action that observes nothing.
    pub fn none(dim: usize) -> Self {
        Self {
            bits: vec![false; dim],
        }
    }

    /// The action that observes every feature.
    pub fn all(dim: usize) -> Self {
        Self {
            bits: vec![true; dim],
        }
    }

    /// Context dimensionality this action applies to.
    pub fn dim(&self) -> usize {
        self.bits.len()
    }

    /// Hamming weight: how many features the action observes.
    pub fn weight(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Whether feature `i` is observed. Out-of-range positions read as
    /// unobserved.
    pub fn observes(&self, i: usize) -> bool {
        self.bits.get(i).copied().unwrap_or(false)
    }

    /// Raw bits, one per feature.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Indices of the observed features, ascending.
    pub fn observed_indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.then_some(i))
            .collect()
    }

    /// Whether every feature this action observes is also observed by
    /// `other` (element-wise `<=`).
    pub fn is_subset_of(&self, other: &ObsAction) -> bool {
        self.dim() == other.dim()
            && self
                .bits
                .iter()
                .zip(&other.bits)
                .all(|(a, b)| !*a || *b)
    }

    /// Mask a fully-observed context row down to the partial vector this
    /// action induces: observed positions keep their value, the rest become
    /// unobserved. `context` must have the action's dimensionality.
    pub fn mask(&self, context: &[f64]) -> PartialVector {
        debug_assert_eq!(context.len(), self.dim());
        self.bits
            .iter()
            .zip(context)
            .map(|(b, v)| b.then_some(*v))
            .collect()
    }

    /// Deterministic observation cost: dot product of the action with a
    /// per-feature cost vector.
    pub fn observation_cost(&self, cost_vector: &[f64]) -> Result<f64, Error> {
        if cost_vector.len() != self.dim() {
            return Err(Error::contract(format!(
                "cost vector has {} entries for {} features",
                cost_vector.len(),
                self.dim()
            )));
        }
        let mut cost = 0.0;
        for (b, c) in self.bits.iter().zip(cost_vector) {
            if *b {
                cost += c;
            }
        }
        Ok(cost)
    }
}

/// Enumerate all distinct observation actions of dimension `dim` with Hamming
/// weight at most `max_observed`.
///
/// Each action appears exactly once; the order is deterministic across runs.
/// Two construction paths:
///
/// - `max_observed >= dim`: all `2^dim` actions by direct binary expansion
///   (counter order, feature `dim-1` is the least significant bit). This
///   avoids building per-weight combinations when every subset is wanted, but
///   its cost is `2^dim` — practical up to `dim` around 20, which callers
///   must bound themselves.
/// - otherwise: for each weight `k` in `0..=max_observed`, every
///   `k`-combination of positions (lexicographic), which is duplicate-free by
///   construction.
pub fn enumerate_observation_actions(dim: usize, max_observed: usize) -> Vec<ObsAction> {
    if max_observed >= dim {
        return enumerate_all_actions(dim);
    }

    let mut actions = Vec::new();
    for k in 0..=max_observed {
        for positions in (0..dim).combinations(k) {
            let mut bits = vec![false; dim];
            for p in positions {
                bits[p] = true;
            }
            actions.push(ObsAction { bits });
        }
    }
    actions
}

/// All `2^dim` actions in binary-counter order.
fn enumerate_all_actions(dim: usize) -> Vec<ObsAction> {
    debug_assert!(dim < usize::BITS as usize);
    let n = 1usize << dim;
    let mut actions = Vec::with_capacity(n);
    for i in 0..n {
        let bits = (0..dim).map(|j| (i >> (dim - 1 - j)) & 1 == 1).collect();
        actions.push(ObsAction { bits });
    }
    actions
}
