//! Fixed-observation oracle: a non-adaptive policy with hindsight access to
//! the true state-occurrence probabilities and expected rewards.
//!
//! Construction is a pure batch fold over the historical dataset: for every
//! observation action under the budget, trials are grouped by their masked
//! row's canonical state index, per-state occurrence probabilities and
//! per-arm mean rewards are computed, and the action maximizing
//! `beta * E[best reward] - observation cost` is selected. All tables are
//! immutable once built.
//!
//! At replay time the oracle always observes the single selected action —
//! this non-adaptation is its defining property and what makes it a
//! performance upper bound for online learners under the same budget.
//!
//! Ties are broken "first encountered in enumeration order" uniformly: over
//! arms within a state, and over observation actions within the value array.

use std::collections::BTreeMap;

use crate::catalog::FeatureCatalog;
use crate::error::Error;
use crate::obs::{enumerate_observation_actions, ObsAction};
use crate::policy::ObservationPolicy;
use crate::state::{state_index, state_space, StateSpace};

/// What `choose_arm` does when the precomputed best arm for the trial's
/// state is absent from the offered pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingArmMode {
    /// Fail the trial with [`Error::ArmNotInPool`]. The default: an oracle
    /// replay that silently substitutes arms is no longer an upper bound.
    #[default]
    Fail,
    /// Fall back to the pooled arm with the highest recorded mean reward for
    /// the state (first maximum in pool order). Errors only if no pooled arm
    /// has a recorded mean.
    BestInPool,
}

/// Construction parameters for [`FixedObsOracle`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OracleConfig {
    /// Number of arms (reward matrix columns).
    pub num_arms: usize,
    /// Maximum number of features any observation action may observe.
    pub max_observations: usize,
    /// Reward/cost trade-off: weight on expected best reward when valuing an
    /// observation action. `0.0` makes observing anything worthless.
    pub beta: f64,
    /// Per-feature observation cost, length `D`.
    pub cost_vector: Vec<f64>,
    /// Behavior when the best arm is not in the trial's pool.
    pub missing_arm: MissingArmMode,
}

/// Empirical statistics for one reachable state under one observation action.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateCell {
    /// Empirical occurrence probability: group size / total trials.
    pub prob: f64,
    /// Number of historical trials realizing this state.
    pub visits: u64,
    /// Per-arm mean reward over trials in the group where that arm's reward
    /// was recorded; `None` where no reward was ever recorded.
    pub mean_rewards: Vec<Option<f64>>,
    /// Best arm and its mean (argmax over recorded means, first index on
    /// ties); `None` when no arm has a recorded reward.
    pub best: Option<(usize, f64)>,
}

/// Log-ready record of one replayed trial.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialLogRow {
    pub trial: usize,
    /// State index under the fixed observation action.
    pub state: u64,
    /// Global arm id played.
    pub arm: usize,
    pub reward: f64,
    /// Observation cost paid this trial.
    pub cost: f64,
    /// `reward - cost`.
    pub gain: f64,
}

struct RewardAccum {
    visits: u64,
    sum: Vec<f64>,
    count: Vec<u64>,
}

impl RewardAccum {
    fn new(num_arms: usize) -> Self {
        Self {
            visits: 0,
            sum: vec![0.0; num_arms],
            count: vec![0; num_arms],
        }
    }
}

/// Non-adaptive oracle policy over a fixed observation action.
///
/// Owns its statistics and replay buffers exclusively; trial processing is
/// strictly ordered by trial index.
#[derive(Debug, Clone)]
pub struct FixedObsOracle {
    cfg: OracleConfig,
    catalog: FeatureCatalog,
    actions: Vec<ObsAction>,
    /// `beta * E[best reward] - observation cost`, one per action.
    action_values: Vec<f64>,
    selected: usize,
    space: StateSpace,
    /// Dense arena for the selected action, sized `array_size`; `None` cells
    /// were never reached from historical data.
    cells: Vec<Option<StateCell>>,
    /// `gain[0] = 0`, one more entry than trials replayed.
    cumulative_gain: Vec<f64>,
    log: Vec<TrialLogRow>,
}

impl FixedObsOracle {
    /// Build the oracle from full context/reward history.
    ///
    /// `contexts` is the `N x D` fully-observed context matrix; `rewards` is
    /// `N x num_arms` with `None` for arm/trial pairs never realized.
    pub fn new(
        contexts: &[Vec<f64>],
        rewards: &[Vec<Option<f64>>],
        cfg: OracleConfig,
    ) -> Result<Self, Error> {
        let catalog = FeatureCatalog::from_contexts(contexts)?;
        validate_inputs(&catalog, contexts, rewards, &cfg)?;

        let actions = enumerate_observation_actions(catalog.dim(), cfg.max_observations);

        let mut action_values = Vec::with_capacity(actions.len());
        for action in &actions {
            let groups = group_by_state(&catalog, contexts, rewards, cfg.num_arms, action)?;
            let mut expected = 0.0;
            for cell in groups.values() {
                if let Some((_, best_mean)) = cell.best {
                    expected += cell.prob * best_mean;
                }
            }
            let value = cfg.beta * expected - action.observation_cost(&cfg.cost_vector)?;
            action_values.push(value);
        }
        let selected = argmax_first(&action_values);

        let space = state_space(&catalog, &actions[selected])?;
        let arena_len = usize::try_from(space.array_size).map_err(|_| {
            Error::CardinalityOverflow {
                feature_dim: catalog.dim(),
            }
        })?;
        let groups = group_by_state(&catalog, contexts, rewards, cfg.num_arms, &actions[selected])?;
        let mut cells = vec![None; arena_len];
        for (idx, cell) in groups {
            cells[idx as usize] = Some(cell);
        }

        Ok(Self {
            cfg,
            catalog,
            actions,
            action_values,
            selected,
            space,
            cells,
            cumulative_gain: vec![0.0],
            log: Vec::new(),
        })
    }

    /// Human-readable policy label.
    pub fn label(&self) -> String {
        format!("fixed-observation oracle (beta={})", self.cfg.beta)
    }

    /// All enumerated observation actions, in enumeration order.
    pub fn actions(&self) -> &[ObsAction] {
        &self.actions
    }

    /// Scalar value of each observation action, aligned with
    /// [`actions`](Self::actions).
    pub fn action_values(&self) -> &[f64] {
        &self.action_values
    }

    /// The single observation action the oracle replays.
    pub fn selected_action(&self) -> &ObsAction {
        &self.actions[self.selected]
    }

    /// Position of the selected action in enumeration order.
    pub fn selected_action_index(&self) -> usize {
        self.selected
    }

    /// State-space cardinalities of the selected action.
    pub fn selected_state_space(&self) -> StateSpace {
        self.space
    }

    /// The catalog the oracle indexes with.
    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    /// Per-state statistics for `state` under the selected action.
    ///
    /// Out-of-range indices are a contract violation; in-range states never
    /// reached from the historical data are [`Error::UnreachableState`].
    pub fn state_cell(&self, state: u64) -> Result<&StateCell, Error> {
        let slot = usize::try_from(state)
            .ok()
            .and_then(|i| self.cells.get(i))
            .ok_or_else(|| {
                Error::contract(format!(
                    "state index {state} out of range (array size {})",
                    self.space.array_size
                ))
            })?;
        slot.as_ref().ok_or(Error::UnreachableState { state })
    }

    /// Empirical occurrence probability of `state` under the selected action.
    pub fn state_probability(&self, state: u64) -> Result<f64, Error> {
        Ok(self.state_cell(state)?.prob)
    }

    /// The fixed action's observed feature indices.
    ///
    /// The oracle never adapts its observation choice, so the availability
    /// and cost arguments of the policy contract are ignored here.
    pub fn choose_features_to_observe(
        &self,
        _trial: usize,
        _available_features: &[usize],
        _cost_vector: &[f64],
    ) -> Vec<usize> {
        self.selected_action().observed_indices()
    }

    /// Pick the arm for a live trial.
    ///
    /// `observed` is the trial's partial vector under the fixed action;
    /// `pool` the global arm ids currently offered. Returns the position of
    /// the chosen arm **within `pool`**.
    pub fn choose_arm(
        &self,
        _trial: usize,
        observed: &[Option<f64>],
        pool: &[usize],
    ) -> Result<usize, Error> {
        validate_pool(pool, self.cfg.num_arms)?;
        let state = state_index(&self.catalog, observed, self.selected_action())?;
        let cell = self.state_cell(state)?;
        let Some((best, _)) = cell.best else {
            return Err(Error::UnreachableState { state });
        };

        if let Some(position) = pool.iter().position(|&a| a == best) {
            return Ok(position);
        }
        match self.cfg.missing_arm {
            MissingArmMode::Fail => Err(Error::ArmNotInPool { arm: best, state }),
            MissingArmMode::BestInPool => {
                let mut fallback: Option<(usize, f64)> = None;
                for (position, &arm) in pool.iter().enumerate() {
                    if let Some(mean) = cell.mean_rewards[arm] {
                        if fallback.is_none_or(|(_, m)| mean > m) {
                            fallback = Some((position, mean));
                        }
                    }
                }
                fallback
                    .map(|(position, _)| position)
                    .ok_or(Error::ArmNotInPool { arm: best, state })
            }
        }
    }

    /// Record the outcome of trial `t`.
    ///
    /// Accumulates `reward - cost(selected action)` into the cumulative-gain
    /// sequence and appends a [`TrialLogRow`].
    pub fn update(
        &mut self,
        t: usize,
        pool_arm_index: usize,
        reward: f64,
        trial_costs: &[f64],
        observed: &[Option<f64>],
        pool: &[usize],
    ) -> Result<(), Error> {
        validate_pool(pool, self.cfg.num_arms)?;
        if pool_arm_index >= pool.len() {
            return Err(Error::contract(format!(
                "pool arm index {pool_arm_index} out of range for pool of {}",
                pool.len()
            )));
        }
        if !reward.is_finite() {
            return Err(Error::contract(format!("non-finite reward {reward}")));
        }
        let cost = self.selected_action().observation_cost(trial_costs)?;
        let state = state_index(&self.catalog, observed, self.selected_action())?;

        let gain = reward - cost;
        let total = self.cumulative_gain.last().copied().unwrap_or(0.0) + gain;
        self.cumulative_gain.push(total);
        self.log.push(TrialLogRow {
            trial: t,
            state,
            arm: pool[pool_arm_index],
            reward,
            cost,
            gain,
        });
        Ok(())
    }

    /// Cumulative gain sequence: `gain[0] = 0`, then one entry per trial.
    pub fn cumulative_gain(&self) -> &[f64] {
        &self.cumulative_gain
    }

    /// Total gain over every replayed trial.
    pub fn total_gain(&self) -> f64 {
        *self.cumulative_gain.last().unwrap_or(&0.0)
    }

    /// Log-ready rows, one per replayed trial.
    pub fn log(&self) -> &[TrialLogRow] {
        &self.log
    }
}

impl ObservationPolicy for FixedObsOracle {
    fn choose_features_to_observe(
        &mut self,
        trial: usize,
        available_features: &[usize],
        cost_vector: &[f64],
    ) -> Vec<usize> {
        FixedObsOracle::choose_features_to_observe(self, trial, available_features, cost_vector)
    }

    fn choose_arm(
        &mut self,
        trial: usize,
        observed: &[Option<f64>],
        pool: &[usize],
    ) -> Result<usize, Error> {
        FixedObsOracle::choose_arm(self, trial, observed, pool)
    }

    fn update(
        &mut self,
        trial: usize,
        pool_arm_index: usize,
        reward: f64,
        cost_vector: &[f64],
        observed: &[Option<f64>],
        pool: &[usize],
    ) -> Result<(), Error> {
        FixedObsOracle::update(self, trial, pool_arm_index, reward, cost_vector, observed, pool)
    }
}

/// Group trials by the canonical state index of their masked rows and reduce
/// each group to a [`StateCell`].
fn group_by_state(
    catalog: &FeatureCatalog,
    contexts: &[Vec<f64>],
    rewards: &[Vec<Option<f64>>],
    num_arms: usize,
    action: &ObsAction,
) -> Result<BTreeMap<u64, StateCell>, Error> {
    let mut groups: BTreeMap<u64, RewardAccum> = BTreeMap::new();
    for (row, reward_row) in contexts.iter().zip(rewards) {
        let partial = action.mask(row);
        let idx = state_index(catalog, &partial, action)?;
        let acc = groups
            .entry(idx)
            .or_insert_with(|| RewardAccum::new(num_arms));
        acc.visits += 1;
        for (arm, reward) in reward_row.iter().enumerate() {
            if let Some(r) = reward {
                acc.sum[arm] += r;
                acc.count[arm] += 1;
            }
        }
    }

    let total = contexts.len() as f64;
    let cells = groups
        .into_iter()
        .map(|(idx, acc)| {
            let mean_rewards: Vec<Option<f64>> = acc
                .sum
                .iter()
                .zip(&acc.count)
                .map(|(s, c)| (*c > 0).then(|| s / *c as f64))
                .collect();
            let mut best: Option<(usize, f64)> = None;
            for (arm, mean) in mean_rewards.iter().enumerate() {
                if let Some(m) = mean {
                    if best.is_none_or(|(_, b)| *m > b) {
                        best = Some((arm, *m));
                    }
                }
            }
            let cell = StateCell {
                prob: acc.visits as f64 / total,
                visits: acc.visits,
                mean_rewards,
                best,
            };
            (idx, cell)
        })
        .collect();
    Ok(cells)
}

/// Index of the first maximum (strictly-greater replacement).
fn argmax_first(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn validate_pool(pool: &[usize], num_arms: usize) -> Result<(), Error> {
    if pool.is_empty() {
        return Err(Error::contract("arm pool is empty"));
    }
    if let Some(&arm) = pool.iter().find(|&&a| a >= num_arms) {
        return Err(Error::contract(format!(
            "pool contains arm {arm}, but only {num_arms} arms exist"
        )));
    }
    Ok(())
}

fn validate_inputs(
    catalog: &FeatureCatalog,
    contexts: &[Vec<f64>],
    rewards: &[Vec<Option<f64>>],
    cfg: &OracleConfig,
) -> Result<(), Error> {
    if cfg.num_arms == 0 {
        return Err(Error::contract("oracle needs at least one arm"));
    }
    if !cfg.beta.is_finite() || cfg.beta < 0.0 {
        return Err(Error::contract(format!(
            "beta must be finite and non-negative, got {}",
            cfg.beta
        )));
    }
    if cfg.cost_vector.len() != catalog.dim() {
        return Err(Error::contract(format!(
            "cost vector has {} entries for {} features",
            cfg.cost_vector.len(),
            catalog.dim()
        )));
    }
    if let Some(c) = cfg.cost_vector.iter().find(|c| !c.is_finite()) {
        return Err(Error::contract(format!(
            "cost vector contains non-finite value {c}"
        )));
    }
    if rewards.len() != contexts.len() {
        return Err(Error::contract(format!(
            "{} reward rows for {} context rows",
            rewards.len(),
            contexts.len()
        )));
    }
    for (t, row) in rewards.iter().enumerate() {
        if row.len() != cfg.num_arms {
            return Err(Error::contract(format!(
                "reward row {t} has {} arms, expected {}",
                row.len(),
                cfg.num_arms
            )));
        }
        if let Some(r) = row.iter().flatten().find(|r| !r.is_finite()) {
            return Err(Error::contract(format!(
                "reward row {t} contains non-finite value {r}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feature 0 (two values) perfectly predicts the best arm; feature 1 is
    /// noise shared by every trial.
    fn predictive_dataset() -> (Vec<Vec<f64>>, Vec<Vec<Option<f64>>>) {
        let mut contexts = Vec::new();
        let mut rewards = Vec::new();
        for t in 0..40 {
            let class = (t % 2) as f64;
            // (t / 2) % 2 decorrelates feature 1 from the class: every class
            // sees both of its values equally often.
            contexts.push(vec![class, ((t / 2) % 2) as f64]);
            // class 0.0 => arm 0 pays 1.0, class 1.0 => arm 1 pays 1.0.
            let (r0, r1) = if class == 0.0 { (1.0, 0.0) } else { (0.0, 1.0) };
            rewards.push(vec![Some(r0), Some(r1)]);
        }
        (contexts, rewards)
    }

    fn config(beta: f64) -> OracleConfig {
        OracleConfig {
            num_arms: 2,
            max_observations: 2,
            beta,
            cost_vector: vec![0.1, 0.1],
            missing_arm: MissingArmMode::Fail,
        }
    }

    #[test]
    fn high_beta_selects_the_predictive_feature() {
        let (contexts, rewards) = predictive_dataset();
        let oracle = FixedObsOracle::new(&contexts, &rewards, config(1.0)).unwrap();
        assert!(
            oracle.selected_action().observes(0),
            "selected {:?} with values {:?}",
            oracle.selected_action(),
            oracle.action_values()
        );
    }

    #[test]
    fn zero_beta_selects_the_empty_action() {
        let (contexts, rewards) = predictive_dataset();
        let oracle = FixedObsOracle::new(&contexts, &rewards, config(0.0)).unwrap();
        assert_eq!(oracle.selected_action(), &ObsAction::none(2));
        assert!(oracle
            .choose_features_to_observe(0, &[0, 1], &[0.1, 0.1])
            .is_empty());
    }

    #[test]
    fn choose_arm_returns_pool_position_of_best_arm() {
        let (contexts, rewards) = predictive_dataset();
        let oracle = FixedObsOracle::new(&contexts, &rewards, config(1.0)).unwrap();
        let observed = oracle.selected_action().mask(&contexts[0]);
        // Pool lists arms in reversed order; position 1 is arm 0.
        let position = oracle.choose_arm(0, &observed, &[1, 0]).unwrap();
        assert_eq!(position, 1);
    }

    #[test]
    fn missing_best_arm_fails_by_default() {
        let (contexts, rewards) = predictive_dataset();
        let oracle = FixedObsOracle::new(&contexts, &rewards, config(1.0)).unwrap();
        let observed = oracle.selected_action().mask(&contexts[0]); // best arm 0
        let err = oracle.choose_arm(0, &observed, &[1]).unwrap_err();
        assert!(matches!(err, Error::ArmNotInPool { arm: 0, .. }));
    }

    #[test]
    fn missing_best_arm_falls_back_when_configured() {
        let (contexts, rewards) = predictive_dataset();
        let mut cfg = config(1.0);
        cfg.missing_arm = MissingArmMode::BestInPool;
        let oracle = FixedObsOracle::new(&contexts, &rewards, cfg).unwrap();
        let observed = oracle.selected_action().mask(&contexts[0]); // best arm 0
        let position = oracle.choose_arm(0, &observed, &[1]).unwrap();
        assert_eq!(position, 0); // arm 1, the only pooled arm with a mean
    }

    #[test]
    fn unreached_state_is_surfaced_not_defaulted() {
        // Three of the four feature combinations appear in history; only the
        // full observation action distinguishes every best arm.
        let contexts = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
        ];
        let rewards = vec![
            vec![Some(1.0), Some(0.0)],
            vec![Some(0.0), Some(1.0)],
            vec![Some(0.0), Some(1.0)],
        ];
        let mut cfg = config(1.0);
        cfg.cost_vector = vec![0.0, 0.0];
        let oracle = FixedObsOracle::new(&contexts, &rewards, cfg).unwrap();
        assert_eq!(oracle.selected_action(), &ObsAction::all(2));

        // (1.0, 1.0) is addressable and reachable, but never occurred.
        let state = state_index(
            oracle.catalog(),
            &[Some(1.0), Some(1.0)],
            oracle.selected_action(),
        )
        .unwrap();
        assert_eq!(
            oracle.state_probability(state),
            Err(Error::UnreachableState { state })
        );
        let err = oracle
            .choose_arm(0, &[Some(1.0), Some(1.0)], &[0, 1])
            .unwrap_err();
        assert_eq!(err, Error::UnreachableState { state });
    }

    #[test]
    fn update_accumulates_gain_and_log_rows() {
        let (contexts, rewards) = predictive_dataset();
        let mut oracle = FixedObsOracle::new(&contexts, &rewards, config(1.0)).unwrap();
        let action = oracle.selected_action().clone();
        let cost = action.observation_cost(&[0.1, 0.1]).unwrap();

        let pool = [0usize, 1];
        for t in 0..3 {
            let observed = action.mask(&contexts[t]);
            let position = oracle.choose_arm(t, &observed, &pool).unwrap();
            oracle
                .update(t, position, 1.0, &[0.1, 0.1], &observed, &pool)
                .unwrap();
        }
        assert_eq!(oracle.cumulative_gain().len(), 4);
        assert_eq!(oracle.log().len(), 3);
        assert!((oracle.total_gain() - 3.0 * (1.0 - cost)).abs() < 1e-12);
        for row in oracle.log() {
            assert!((row.gain - (row.reward - row.cost)).abs() < 1e-12);
        }
    }

    #[test]
    fn ties_resolve_to_first_in_enumeration_order() {
        assert_eq!(argmax_first(&[1.0, 1.0, 0.5]), 0);
        assert_eq!(argmax_first(&[0.5, 1.0, 1.0]), 1);
    }

    #[test]
    fn malformed_inputs_are_contract_violations() {
        let (contexts, rewards) = predictive_dataset();
        let mut cfg = config(1.0);
        cfg.cost_vector = vec![0.1]; // wrong length
        assert!(FixedObsOracle::new(&contexts, &rewards, cfg).is_err());

        let mut cfg = config(1.0);
        cfg.num_arms = 3; // reward rows have 2 arms
        assert!(FixedObsOracle::new(&contexts, &rewards, cfg).is_err());

        let cfg = config(f64::NAN);
        assert!(FixedObsOracle::new(&contexts, &rewards, cfg).is_err());
    }
}
