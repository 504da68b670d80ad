//! Round-completion predicate for round-doubling online algorithms.
//!
//! Online learners that refresh their statistics in rounds snapshot their
//! visit counts at the start of a round and end the round once any cell's
//! count has at least doubled. The predicate is stateless: it compares two
//! same-shaped snapshots and nothing else.

use crate::error::Error;

/// Whether the current round is over.
///
/// `prior` holds per-cell visit totals as of the last checkpoint, `current`
/// the totals now. The round is over iff any cell satisfies
/// `current - prior >= max(prior, 1)` — the count at least doubled, with a
/// floor of 1 so the very first visit to a cell also triggers.
///
/// Shape mismatches and decreasing counts (visit totals are monotone by
/// contract) are a [`Error::ContractViolation`].
pub fn is_round_over(prior: &[u64], current: &[u64]) -> Result<bool, Error> {
    if prior.len() != current.len() {
        return Err(Error::contract(format!(
            "count snapshots differ in shape: {} vs {}",
            prior.len(),
            current.len()
        )));
    }
    let mut over = false;
    for (i, (&old, &new)) in prior.iter().zip(current).enumerate() {
        if new < old {
            return Err(Error::contract(format!(
                "visit count for cell {i} decreased from {old} to {new}"
            )));
        }
        if new - old >= old.max(1) {
            over = true;
        }
    }
    Ok(over)
}
