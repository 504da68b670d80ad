//! Error taxonomy for the indexing engine and the oracle.
//!
//! The engine is a deterministic batch computation: there are no retries and
//! no partial results. Every error here is fatal to the call that produced it,
//! and numeric inconsistency is never silently corrected.

use thiserror::Error;

/// Errors surfaced by the indexing engine and the fixed-observation oracle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller broke an input contract: sentinel/observation-bit mismatch in
    /// a partial vector, shape mismatch, non-finite value, decreasing visit
    /// counts, or similar malformed input.
    #[error("contract violation: {reason}")]
    ContractViolation { reason: String },

    /// A concrete feature value was not present in the catalog built from the
    /// historical dataset. Distinct from [`Error::ContractViolation`] so
    /// callers can tell data drift apart from caller bugs.
    #[error("feature {feature} has no catalog entry for value {value}")]
    UnknownFeatureValue { feature: usize, value: f64 },

    /// A state-space cardinality product overflowed `u64`.
    #[error("state-space cardinality overflows u64 over {feature_dim} features")]
    CardinalityOverflow { feature_dim: usize },

    /// A state was queried that was never populated from historical data.
    /// Indicates either insufficient training data or a caller bug; never
    /// silently defaulted.
    #[error("state {state} was never reached in the historical data")]
    UnreachableState { state: u64 },

    /// The oracle's best arm for the trial's state is not in the offered
    /// arm pool (and no fallback was configured or possible).
    #[error("best arm {arm} for state {state} is not in the offered pool")]
    ArmNotInPool { arm: usize, state: u64 },
}

impl Error {
    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        Error::ContractViolation {
            reason: reason.into(),
        }
    }
}
