//! `peekwise`: deterministic primitives for contextual bandits with
//! *costly, partial* context observation.
//!
//! Designed for the simulation setting where an agent, each trial, may pay to
//! observe a subset of context features, then picks an arm and collects a
//! reward. The crate owns the combinatorial core of that setting:
//!
//! - [`enumerate_observation_actions`]: all feature subsets under a budget,
//!   deterministically ordered ([`ObsAction`]).
//! - [`FeatureCatalog`]: per-feature sorted value alphabets built once from a
//!   historical dataset, with the "unobserved" sentinel at rank 0.
//! - [`state_index`] / [`state_vector`] / [`state_space`]: a collision-free
//!   mixed-radix bijection between partial vectors and dense integer state
//!   indices, with both cardinalities (`reachable`, `array_size`) computable
//!   in closed form — no materialization of the vector space.
//! - [`is_round_over`]: the visit-count-doubling predicate round-based online
//!   learners refresh their statistics with.
//! - [`substates`]: the partial vectors obtained by forgetting observed
//!   features, for information sharing across related observations.
//! - [`FixedObsOracle`]: a batch-built, non-adaptive policy that selects the
//!   single observation action maximizing expected reward minus observation
//!   cost and replays it trial by trial — the performance upper bound online
//!   learners are measured against.
//!
//! **Goals:**
//! - **Deterministic**: same dataset + config → same tables, same choices.
//!   Ties break "first in enumeration order" everywhere.
//! - **Fail-fast**: contract breaches (sentinel/observation mismatches,
//!   malformed shapes, unreached-state queries) are typed [`Error`]s, never
//!   silently corrected.
//! - **Bounded memory**: buffers are sized from closed-form cardinalities;
//!   state tables are integer-indexed arenas, not object graphs.
//!
//! **Non-goals:**
//! - No online learning algorithms (a UCB-style learner plugs in through
//!   [`ObservationPolicy`]; only the contract lives here).
//! - No dataset loading/generation, experiment orchestration, or plotting.
//!
//! # Partial vectors
//!
//! A partial vector is a context row with unobserved positions made
//! explicit: one `Option<f64>` slot per feature, `None` meaning unobserved.
//! The invariant tying it to its [`ObsAction`] — slot is `None` **iff** the
//! observation bit is 0 — is checked wherever it matters and breaking it is
//! a [`Error::ContractViolation`].
//!
//! # Scale
//!
//! Observation-action enumeration and state spaces both grow exponentially
//! in the feature dimensionality and the observation budget. The engine
//! computes every cardinality in closed form first and allocates from those
//! numbers; callers are expected to keep `D` small (the full-enumeration
//! path costs `2^D` and is practical up to `D` around 20).
//!
//! # Example
//!
//! ```rust
//! use peekwise::{FixedObsOracle, MissingArmMode, OracleConfig};
//!
//! // Feature 0 names the winning arm; feature 1 is noise.
//! let contexts: Vec<Vec<f64>> = (0..8)
//!     .map(|t| vec![(t % 2) as f64, (t % 3) as f64])
//!     .collect();
//! let rewards: Vec<Vec<Option<f64>>> = (0..8)
//!     .map(|t| vec![Some(((t + 1) % 2) as f64), Some((t % 2) as f64)])
//!     .collect();
//!
//! let cfg = OracleConfig {
//!     num_arms: 2,
//!     max_observations: 1,
//!     beta: 1.0,
//!     cost_vector: vec![0.1, 0.1],
//!     missing_arm: MissingArmMode::Fail,
//! };
//! let oracle = FixedObsOracle::new(&contexts, &rewards, cfg).unwrap();
//! assert!(oracle.selected_action().observes(0));
//!
//! // Replay a trial: mask the context, pick from the offered pool.
//! let observed = oracle.selected_action().mask(&contexts[0]);
//! let pool = [0, 1];
//! let position = oracle.choose_arm(0, &observed, &pool).unwrap();
//! assert_eq!(pool[position], 0); // class 0.0 pays on arm 0
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod obs;
pub use obs::*;

mod catalog;
pub use catalog::*;

mod state;
pub use state::*;

mod round;
pub use round::*;

mod substate;
pub use substate::*;

mod policy;
pub use policy::*;

mod oracle;
pub use oracle::*;

/// A context row with unobserved positions made explicit:
/// `None` = unobserved sentinel, `Some(v)` = observed value.
pub type PartialVector = Vec<Option<f64>>;
