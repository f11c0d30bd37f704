use crate::chain::{RunMatrix, TransitionMatrix};
use crate::error::Result;
use crate::sim::sampler::{mean, sample_run_distribution_par, std_dev};
use crate::state::BaseOutState;

/// Innings per team per game used for the whole-game projection.
const INNINGS_PER_GAME: f64 = 9.0;

/// Matrix-level comparison of two estimated chains.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainComparison {
    /// Frobenius norm of the element-wise difference over the shared states.
    pub frobenius_distance: f64,
    /// States covered by both chains, in the first chain's order.
    pub shared_states: Vec<BaseOutState>,
}

/// Comparison of two chains' simulated run distributions from a common
/// starting state.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDistributionComparison {
    pub mean_a: f64,
    pub mean_b: f64,
    pub sd_a: f64,
    pub sd_b: f64,
    /// Pooled per-half-inning standard deviation.
    pub pooled_sd: f64,
    /// Pooled SD projected to a nine-inning game by multiplying by 9,
    /// treating innings as independent. An approximation, not a derivation.
    pub per_game_sd: f64,
}

/// Compares two chains estimated from different partitions of the data
/// (e.g. home and away offenses).
///
/// The chains may cover different subsets of the state space, so both are
/// reindexed onto their shared states before the element-wise difference is
/// taken. The shared set always includes the absorbing state.
pub fn compare_chains(a: &TransitionMatrix, b: &TransitionMatrix) -> Result<ChainComparison> {
    let shared_states: Vec<BaseOutState> = a
        .states()
        .iter()
        .copied()
        .filter(|&s| b.contains(s))
        .collect();

    let mut sum_sq = 0.0;
    for &from in &shared_states {
        for &to in &shared_states {
            let d = a.prob(from, to)? - b.prob(from, to)?;
            sum_sq += d * d;
        }
    }

    Ok(ChainComparison {
        frobenius_distance: sum_sq.sqrt(),
        shared_states,
    })
}

/// Samples both chains from `start` and compares the resulting run
/// distributions. The same trial count and seed are used for each side so
/// the comparison is reproducible.
pub fn compare_run_distributions(
    a: &TransitionMatrix,
    b: &TransitionMatrix,
    start: BaseOutState,
    trials: usize,
    seed: u64,
) -> Result<RunDistributionComparison> {
    let runs_a = RunMatrix::for_chain(a);
    let runs_b = RunMatrix::for_chain(b);
    let samples_a = sample_run_distribution_par(a, &runs_a, start, trials, seed)?;
    let samples_b = sample_run_distribution_par(b, &runs_b, start, trials, seed)?;

    let sd_a = std_dev(&samples_a);
    let sd_b = std_dev(&samples_b);
    let pooled_sd = ((sd_a * sd_a + sd_b * sd_b) / 2.0).sqrt();

    Ok(RunDistributionComparison {
        mean_a: mean(&samples_a),
        mean_b: mean(&samples_b),
        sd_a,
        sd_b,
        pooled_sd,
        per_game_sd: pooled_sd * INNINGS_PER_GAME,
    })
}
