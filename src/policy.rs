//! The three-method contract every partial-observation policy satisfies.
//!
//! A replay harness drives any policy — the hindsight oracle here, or an
//! online learner living elsewhere (a UCB-style arm selector, say) — through
//! the same per-trial cycle: pick which features to pay for, pick an arm
//! given the resulting partial vector, then learn from the realized reward.
//! This trait pins that cycle down so harness code is generic over policies.

use crate::error::Error;

/// Per-trial contract for policies that choose what to observe and which
/// arm to play.
///
/// Every method takes `&mut self`: online learners mutate statistics on
/// every call, and the trait accommodates them even though some
/// implementations (the oracle) only mutate in `update`.
pub trait ObservationPolicy {
    /// Choose which features to pay for this trial.
    ///
    /// Returns a subset of `available_features`. `cost_vector` carries this
    /// trial's per-feature observation costs.
    fn choose_features_to_observe(
        &mut self,
        trial: usize,
        available_features: &[usize],
        cost_vector: &[f64],
    ) -> Vec<usize>;

    /// Choose an arm given the trial's partial context vector.
    ///
    /// `observed` has one slot per feature (`None` = unobserved); `pool`
    /// lists the global arm ids offered this trial. Returns an index **into
    /// `pool`**.
    fn choose_arm(
        &mut self,
        trial: usize,
        observed: &[Option<f64>],
        pool: &[usize],
    ) -> Result<usize, Error>;

    /// Learn from the realized reward of the chosen arm.
    fn update(
        &mut self,
        trial: usize,
        pool_arm_index: usize,
        reward: f64,
        cost_vector: &[f64],
        observed: &[Option<f64>],
        pool: &[usize],
    ) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedObsOracle, MissingArmMode, OracleConfig};

    fn run_policy<P: ObservationPolicy>(
        policy: &mut P,
        contexts: &[Vec<f64>],
        rewards: &[Vec<Option<f64>>],
        costs: &[f64],
    ) -> Result<(), Error> {
        let dim = contexts[0].len();
        let all_features: Vec<usize> = (0..dim).collect();
        let pool: Vec<usize> = (0..rewards[0].len()).collect();
        for (t, (row, reward_row)) in contexts.iter().zip(rewards).enumerate() {
            let chosen = policy.choose_features_to_observe(t, &all_features, costs);
            let observed: Vec<Option<f64>> = (0..dim)
                .map(|i| chosen.contains(&i).then(|| row[i]))
                .collect();
            let position = policy.choose_arm(t, &observed, &pool)?;
            let reward = reward_row[pool[position]].unwrap_or(0.0);
            policy.update(t, position, reward, costs, &observed, &pool)?;
        }
        Ok(())
    }

    #[test]
    fn oracle_runs_through_the_generic_harness() {
        let contexts: Vec<Vec<f64>> =
            (0..20).map(|t| vec![(t % 2) as f64, (t % 3) as f64]).collect();
        let rewards: Vec<Vec<Option<f64>>> = (0..20)
            .map(|t| {
                let best = t % 2;
                vec![
                    Some(if best == 0 { 1.0 } else { 0.0 }),
                    Some(if best == 1 { 1.0 } else { 0.0 }),
                ]
            })
            .collect();
        let cfg = OracleConfig {
            num_arms: 2,
            max_observations: 1,
            beta: 1.0,
            cost_vector: vec![0.05, 0.05],
            missing_arm: MissingArmMode::Fail,
        };
        let mut oracle = FixedObsOracle::new(&contexts, &rewards, cfg).unwrap();
        run_policy(&mut oracle, &contexts, &rewards, &[0.05, 0.05]).unwrap();
        assert_eq!(oracle.log().len(), 20);
        // The oracle plays the true best arm on every trial, so every
        // replayed reward is 1.0.
        assert!(oracle.log().iter().all(|row| row.reward == 1.0));
    }
}
