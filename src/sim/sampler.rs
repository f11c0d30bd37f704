use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::chain::{RunMatrix, TransitionMatrix};
use crate::error::Result;
use crate::sim::half_inning::simulate_half_inning;
use crate::state::BaseOutState;

/// Samples the empirical run distribution for one starting state: `trials`
/// independent half-innings, one run total per trial.
pub fn sample_run_distribution<G: Rng + ?Sized>(
    chain: &TransitionMatrix,
    runs: &RunMatrix,
    start: BaseOutState,
    trials: usize,
    rng: &mut G,
) -> Result<Vec<i64>> {
    let mut samples = Vec::with_capacity(trials);
    for _ in 0..trials {
        samples.push(simulate_half_inning(chain, runs, start, rng)?.runs);
    }
    Ok(samples)
}

/// Parallel variant of [`sample_run_distribution`]. Each trial owns a ChaCha
/// stream seeded from `seed` and the trial number, so the result does not
/// depend on thread scheduling and is reproducible for a given seed.
pub fn sample_run_distribution_par(
    chain: &TransitionMatrix,
    runs: &RunMatrix,
    start: BaseOutState,
    trials: usize,
    seed: u64,
) -> Result<Vec<i64>> {
    (0..trials as u64)
        .into_par_iter()
        .map(|trial| {
            let mut rng = ChaCha20Rng::seed_from_u64(seed.wrapping_add(trial));
            Ok(simulate_half_inning(chain, runs, start, &mut rng)?.runs)
        })
        .collect()
}

/// Samples a run distribution from every transient state the chain covers.
/// Each state gets its own seed block so distributions stay independent.
pub fn sample_all_starting_states(
    chain: &TransitionMatrix,
    runs: &RunMatrix,
    trials: usize,
    seed: u64,
) -> Result<HashMap<BaseOutState, Vec<i64>>> {
    let transient = &chain.states()[..chain.n_transient()];
    transient
        .iter()
        .map(|&start| {
            let state_seed = seed.wrapping_add((start.index() as u64) << 32);
            let samples = sample_run_distribution_par(chain, runs, start, trials, state_seed)?;
            Ok((start, samples))
        })
        .collect()
}

/// Arithmetic mean of a sample. NaN for an empty sample.
pub fn mean(samples: &[i64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    samples.iter().sum::<i64>() as f64 / samples.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN below two samples.
pub fn std_dev(samples: &[i64]) -> f64 {
    if samples.len() < 2 {
        return f64::NAN;
    }
    let m = mean(samples);
    let ss: f64 = samples
        .iter()
        .map(|&x| {
            let d = x as f64 - m;
            d * d
        })
        .sum();
    (ss / (samples.len() - 1) as f64).sqrt()
}
