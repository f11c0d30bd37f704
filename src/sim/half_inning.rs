use rand::Rng;

use crate::chain::{RunMatrix, TransitionMatrix};
use crate::error::{Error, Result};
use crate::state::BaseOutState;

/// Step cap for a single walk. A genuine absorbing chain ends a half-inning
/// within a handful of plays; hitting the cap means the estimated chain has a
/// transient subset that cannot reach three outs.
const MAX_STEPS: usize = 10_000;

/// Outcome of one simulated half-inning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfInning {
    /// Total runs scored over the walk.
    pub runs: i64,
    /// Visited states, starting state through the absorbing state inclusive.
    pub trace: Vec<BaseOutState>,
}

/// Simulates one half-inning: a Markov chain walk from `start` until the
/// absorbing three-out state, accumulating runs from the run matrix.
///
/// Randomness comes from the caller-supplied generator, so tests can replay a
/// fixed stream and parallel callers can keep independent streams.
pub fn simulate_half_inning<G: Rng + ?Sized>(
    chain: &TransitionMatrix,
    runs: &RunMatrix,
    start: BaseOutState,
    rng: &mut G,
) -> Result<HalfInning> {
    if !runs.is_aligned_with(chain) {
        return Err(Error::MisalignedRunMatrix);
    }

    let mut current = chain.index_of(start)?;
    let mut total: i64 = 0;
    let mut trace = vec![start];
    let absorbed = chain.n_states() - 1;

    let mut steps = 0;
    while current != absorbed {
        if steps == MAX_STEPS {
            return Err(Error::AbsorptionNotReached(MAX_STEPS));
        }
        let next = sample_row(chain, current, rng);
        total += runs.runs()[[current, next]];
        trace.push(chain.states()[next]);
        current = next;
        steps += 1;
    }

    Ok(HalfInning { runs: total, trace })
}

/// Draws the next state index from the categorical distribution in `row`.
fn sample_row<G: Rng + ?Sized>(chain: &TransitionMatrix, row: usize, rng: &mut G) -> usize {
    let sample = rng.gen::<f64>();
    let mut cumsum = 0.0;
    for (j, &p) in chain.probs().row(row).iter().enumerate() {
        cumsum += p;
        if sample < cumsum {
            return j;
        }
    }
    chain.n_states() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::estimate_chain;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn state(code: &str) -> BaseOutState {
        code.parse().unwrap()
    }

    fn pair(from: &str, to: &str) -> (BaseOutState, BaseOutState) {
        (state(from), state(to))
    }

    fn branching_chain() -> (TransitionMatrix, RunMatrix) {
        let transitions = vec![
            pair("0000", "0100"),
            pair("0000", "3"),
            pair("0100", "3"),
        ];
        let chain = estimate_chain(&transitions).unwrap();
        let runs = RunMatrix::for_chain(&chain);
        (chain, runs)
    }

    #[test]
    fn test_trace_ends_at_absorption() {
        let (chain, runs) = branching_chain();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for _ in 0..200 {
            let inning = simulate_half_inning(&chain, &runs, state("0000"), &mut rng).unwrap();
            assert_eq!(inning.trace.first(), Some(&state("0000")));
            assert_eq!(inning.trace.last(), Some(&BaseOutState::ABSORBED));
            // The absorbing state appears exactly once, as the final element.
            let absorbed = inning
                .trace
                .iter()
                .filter(|s| s.is_absorbed())
                .count();
            assert_eq!(absorbed, 1);
            assert!(inning.runs >= 0);
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_walk() {
        let (chain, runs) = branching_chain();
        let mut first_rng = ChaCha20Rng::seed_from_u64(7);
        let mut second_rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..50 {
            let a = simulate_half_inning(&chain, &runs, state("0000"), &mut first_rng).unwrap();
            let b = simulate_half_inning(&chain, &runs, state("0000"), &mut second_rng).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_unknown_start_state() {
        let (chain, runs) = branching_chain();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        match simulate_half_inning(&chain, &runs, state("2111"), &mut rng) {
            Err(Error::UnknownState(s)) => assert_eq!(s, state("2111")),
            other => panic!("expected unknown-state error, got {other:?}"),
        }
    }

    #[test]
    fn test_misaligned_run_matrix() {
        let (chain, _) = branching_chain();
        let other = estimate_chain(&[pair("0000", "3")]).unwrap();
        let runs = RunMatrix::for_chain(&other);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(matches!(
            simulate_half_inning(&chain, &runs, state("0000"), &mut rng),
            Err(Error::MisalignedRunMatrix)
        ));
    }

    #[test]
    fn test_unreachable_absorption_fails_fast() {
        // A chain whose transient states only feed each other would walk
        // forever; the simulator reports it instead.
        let transitions = vec![pair("0000", "0100"), pair("0100", "0000")];
        let chain = estimate_chain(&transitions).unwrap();
        let runs = RunMatrix::for_chain(&chain);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        assert!(matches!(
            simulate_half_inning(&chain, &runs, state("0000"), &mut rng),
            Err(Error::AbsorptionNotReached(_))
        ));
    }

    #[test]
    fn test_runs_accumulate_through_walk() {
        // Deterministic walk: leadoff triple, sacrifice fly scores the runner,
        // then two more outs. Exactly one run per half-inning.
        let transitions = vec![
            pair("0000", "0001"),
            pair("0001", "1000"),
            pair("1000", "3"),
        ];
        let chain = estimate_chain(&transitions).unwrap();
        let runs = RunMatrix::for_chain(&chain);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let inning = simulate_half_inning(&chain, &runs, state("0000"), &mut rng).unwrap();
        assert_eq!(inning.runs, 1);
        assert_eq!(
            inning.trace,
            vec![state("0000"), state("0001"), state("1000"), BaseOutState::ABSORBED]
        );
    }
}
