//! Build a fixed-observation oracle on a synthetic dataset and replay it.
//!
//! Run with: `cargo run --example oracle_replay`

use peekwise::{FixedObsOracle, MissingArmMode, OracleConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution};

fn main() {
    let trials = 2_000;
    let dim = 4;
    let num_arms = 3;
    let costs = vec![0.08, 0.02, 0.02, 0.02];

    // Feature 0 names the best arm; the rest is noise. Rewards are noisy
    // Bernoulli draws so the oracle has to average, not just look up.
    let mut rng = StdRng::seed_from_u64(42);
    let good = Bernoulli::new(0.9).unwrap();
    let bad = Bernoulli::new(0.2).unwrap();

    let mut contexts = Vec::with_capacity(trials);
    let mut rewards = Vec::with_capacity(trials);
    for _ in 0..trials {
        let class = rng.random_range(0..num_arms);
        let mut row = vec![class as f64];
        for _ in 1..dim {
            row.push(rng.random_range(0..3) as f64);
        }
        contexts.push(row);
        let reward_row: Vec<Option<f64>> = (0..num_arms)
            .map(|arm| {
                let d = if arm == class { &good } else { &bad };
                Some(if d.sample(&mut rng) { 1.0 } else { 0.0 })
            })
            .collect();
        rewards.push(reward_row);
    }

    let cfg = OracleConfig {
        num_arms,
        max_observations: 2,
        beta: 1.0,
        cost_vector: costs.clone(),
        missing_arm: MissingArmMode::Fail,
    };
    let mut oracle = FixedObsOracle::new(&contexts, &rewards, cfg).expect("well-formed dataset");

    println!("{}", oracle.label());
    println!("selected action: {:?}", oracle.selected_action().bits());
    println!("state space:     {:?}", oracle.selected_state_space());

    let all_features: Vec<usize> = (0..dim).collect();
    let pool: Vec<usize> = (0..num_arms).collect();
    for (t, (row, reward_row)) in contexts.iter().zip(&rewards).enumerate() {
        let observe = oracle.choose_features_to_observe(t, &all_features, &costs);
        let observed: Vec<Option<f64>> = (0..dim)
            .map(|i| observe.contains(&i).then(|| row[i]))
            .collect();
        let position = oracle
            .choose_arm(t, &observed, &pool)
            .expect("states seen in history");
        let reward = reward_row[pool[position]].unwrap_or(0.0);
        oracle
            .update(t, position, reward, &costs, &observed, &pool)
            .expect("consistent trial inputs");
    }

    let total = oracle.total_gain();
    println!(
        "replayed {trials} trials, total gain {total:.1} (mean {:.3}/trial)",
        total / trials as f64
    );
}
