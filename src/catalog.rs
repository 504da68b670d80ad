//! Per-feature value catalog built once from a historical dataset.
//!
//! The catalog records, for each feature, the sorted distinct values seen in
//! the data. Together with the implicit "unobserved" sentinel it defines the
//! per-feature alphabet the state indexer folds over: the sentinel always has
//! rank 0, and the concrete value at sorted position `p` has rank `p + 1`.
//!
//! "Unobserved" is not a magic value mixed into the data domain — partial
//! vectors carry `Option<f64>` slots and `None` is the sentinel.

use crate::error::Error;

/// Sorted distinct values per feature, with the unobserved sentinel at rank 0.
///
/// Built once per dataset; read-only thereafter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureCatalog {
    /// Concrete values only (the sentinel is implicit), sorted ascending,
    /// one list per feature.
    values: Vec<Vec<f64>>,
}

impl FeatureCatalog {
    /// Build the catalog from an `N x D` matrix of fully-observed contexts.
    ///
    /// Duplicates collapse; ordering is by natural value order. The matrix
    /// must be non-empty, rectangular, and finite — anything else is a
    /// [`Error::ContractViolation`], never silently repaired.
    pub fn from_contexts(contexts: &[Vec<f64>]) -> Result<Self, Error> {
        let Some(first) = contexts.first() else {
            return Err(Error::contract("context matrix is empty"));
        };
        let dim = first.len();
        if dim == 0 {
            return Err(Error::contract("context rows have zero features"));
        }
        for (t, row) in contexts.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::contract(format!(
                    "context row {t} has {} features, expected {dim}",
                    row.len()
                )));
            }
            if let Some(v) = row.iter().find(|v| !v.is_finite()) {
                return Err(Error::contract(format!(
                    "context row {t} contains non-finite value {v}"
                )));
            }
        }

        let mut values = vec![Vec::new(); dim];
        for (i, column) in values.iter_mut().enumerate() {
            let mut seen: Vec<f64> = contexts.iter().map(|row| row[i]).collect();
            seen.sort_by(|a, b| a.total_cmp(b));
            seen.dedup_by(|a, b| a.total_cmp(b).is_eq());
            *column = seen;
        }
        Ok(Self { values })
    }

    /// Context dimensionality `D`.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Number of values in feature `i`'s alphabet, sentinel included.
    pub fn cardinality(&self, feature: usize) -> usize {
        self.values[feature].len() + 1
    }

    /// Sorted distinct concrete values of feature `i` (sentinel excluded).
    pub fn values(&self, feature: usize) -> &[f64] {
        &self.values[feature]
    }

    /// Rank of a slot within feature `i`'s alphabet: the sentinel (`None`)
    /// is rank 0, the concrete value at sorted position `p` is rank `p + 1`.
    ///
    /// A concrete value absent from the catalog is
    /// [`Error::UnknownFeatureValue`].
    pub fn rank(&self, feature: usize, slot: Option<f64>) -> Result<usize, Error> {
        let Some(v) = slot else {
            return Ok(0);
        };
        if !v.is_finite() {
            return Err(Error::contract(format!(
                "feature {feature} observed with non-finite value {v}"
            )));
        }
        match self.values[feature].binary_search_by(|probe| probe.total_cmp(&v)) {
            Ok(p) => Ok(p + 1),
            Err(_) => Err(Error::UnknownFeatureValue { feature, value: v }),
        }
    }

    /// Inverse of [`rank`](Self::rank): rank 0 is the sentinel, rank `p + 1`
    /// is the concrete value at sorted position `p`. Out-of-range ranks are a
    /// contract violation.
    pub fn value_at_rank(&self, feature: usize, rank: usize) -> Result<Option<f64>, Error> {
        if rank == 0 {
            return Ok(None);
        }
        self.values[feature]
            .get(rank - 1)
            .map(|v| Some(*v))
            .ok_or_else(|| {
                Error::contract(format!(
                    "rank {rank} out of range for feature {feature} (cardinality {})",
                    self.cardinality(feature)
                ))
            })
    }
}
