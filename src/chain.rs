use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::runs::runs_on_transition;
use crate::state::BaseOutState;

pub mod compare;
pub mod estimator;
pub mod fundamental;

pub use compare::{
    compare_chains, compare_run_distributions, ChainComparison, RunDistributionComparison,
};
pub use estimator::{estimate_chain, estimate_from_records};
pub use fundamental::{fundamental_matrix, FundamentalMatrix};

/// Row sums of an estimated matrix must match 1 within this tolerance.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// An estimated row-stochastic transition matrix over the observed subset of
/// the base/outs state space.
///
/// Rows and columns share one ordering: the observed before-states by
/// descending frequency, absorbing state last. All numerical consumers go
/// through the explicit state-to-index mapping rather than assuming any fixed
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    states: Vec<BaseOutState>,
    index: HashMap<BaseOutState, usize>,
    probs: Array2<f64>,
}

impl TransitionMatrix {
    /// Wraps a probability matrix after checking the structural invariants:
    /// a square matrix over distinct states with the absorbing state last,
    /// rows summing to 1 within [`ROW_SUM_TOLERANCE`], and an exact unit
    /// absorbing row.
    pub fn new(states: Vec<BaseOutState>, probs: Array2<f64>) -> Result<Self> {
        let n = states.len();
        if n == 0 || states[n - 1] != BaseOutState::ABSORBED {
            return Err(Error::AbsorbingStateNotLast);
        }
        assert_eq!(probs.nrows(), n, "probability matrix must be square over the states");
        assert_eq!(probs.ncols(), n, "probability matrix must be square over the states");

        let mut index = HashMap::with_capacity(n);
        for (i, &state) in states.iter().enumerate() {
            assert!(
                index.insert(state, i).is_none(),
                "duplicate state {state} in matrix ordering"
            );
        }

        for (i, &state) in states.iter().enumerate() {
            let row = probs.row(i);
            if row.iter().any(|&p| !p.is_finite() || p < 0.0) {
                return Err(Error::RowSumInvariant {
                    state,
                    sum: f64::NAN,
                });
            }
            let sum: f64 = row.sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(Error::RowSumInvariant { state, sum });
            }
        }

        // The absorbing row is a fixed point, exactly.
        for j in 0..n {
            let expected = if j == n - 1 { 1.0 } else { 0.0 };
            if probs[[n - 1, j]] != expected {
                return Err(Error::RowSumInvariant {
                    state: BaseOutState::ABSORBED,
                    sum: probs.row(n - 1).sum(),
                });
            }
        }

        Ok(TransitionMatrix {
            states,
            index,
            probs,
        })
    }

    /// Row/column state ordering, absorbing state last.
    pub fn states(&self) -> &[BaseOutState] {
        &self.states
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Number of transient states covered by the matrix.
    pub fn n_transient(&self) -> usize {
        self.states.len() - 1
    }

    pub fn contains(&self, state: BaseOutState) -> bool {
        self.index.contains_key(&state)
    }

    /// Index of a state in this matrix's ordering.
    pub fn index_of(&self, state: BaseOutState) -> Result<usize> {
        self.index
            .get(&state)
            .copied()
            .ok_or(Error::UnknownState(state))
    }

    /// Estimated transition probability between two states.
    pub fn prob(&self, from: BaseOutState, to: BaseOutState) -> Result<f64> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        Ok(self.probs[[i, j]])
    }

    pub fn probs(&self) -> &Array2<f64> {
        &self.probs
    }

    /// The transient-to-transient sub-block Q, in matrix order.
    pub fn transient_block(&self) -> Array2<f64> {
        let n = self.n_transient();
        Array2::from_shape_fn((n, n), |(i, j)| self.probs[[i, j]])
    }
}

/// Runs scored per state transition, aligned index-for-index with a
/// [`TransitionMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunMatrix {
    states: Vec<BaseOutState>,
    runs: Array2<i64>,
}

impl RunMatrix {
    /// Derives the run matrix for a chain from the closed-form identity.
    /// Entries into or out of the absorbing state are zero.
    pub fn for_chain(chain: &TransitionMatrix) -> Self {
        let states = chain.states().to_vec();
        let n = states.len();
        let runs = Array2::from_shape_fn((n, n), |(i, j)| {
            runs_on_transition(states[i], states[j])
        });
        RunMatrix { states, runs }
    }

    pub fn states(&self) -> &[BaseOutState] {
        &self.states
    }

    pub fn runs(&self) -> &Array2<i64> {
        &self.runs
    }

    /// True when this matrix shares the chain's state ordering.
    pub fn is_aligned_with(&self, chain: &TransitionMatrix) -> bool {
        self.states == chain.states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(code: &str) -> BaseOutState {
        code.parse().unwrap()
    }

    fn two_state_chain() -> TransitionMatrix {
        let states = vec![state("0000"), state("0100"), BaseOutState::ABSORBED];
        let probs = ndarray::arr2(&[
            [0.0, 0.5, 0.5],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ]);
        TransitionMatrix::new(states, probs).unwrap()
    }

    #[test]
    fn test_structural_invariants() {
        let chain = two_state_chain();
        assert_eq!(chain.n_states(), 3);
        assert_eq!(chain.n_transient(), 2);
        assert_eq!(chain.prob(state("0000"), state("0100")).unwrap(), 0.5);
        assert!(chain.contains(BaseOutState::ABSORBED));
        assert!(chain.index_of(state("2111")).is_err());
    }

    #[test]
    fn test_rejects_bad_row_sum() {
        let states = vec![state("0000"), BaseOutState::ABSORBED];
        let probs = ndarray::arr2(&[[0.3, 0.6], [0.0, 1.0]]);
        match TransitionMatrix::new(states, probs) {
            Err(Error::RowSumInvariant { state: s, .. }) => assert_eq!(s, state("0000")),
            other => panic!("expected row-sum error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_inexact_absorbing_row() {
        let states = vec![state("0000"), BaseOutState::ABSORBED];
        let probs = ndarray::arr2(&[[0.0, 1.0], [1e-12, 1.0 - 1e-12]]);
        assert!(TransitionMatrix::new(states, probs).is_err());
    }

    #[test]
    fn test_rejects_missing_absorbing_state() {
        let states = vec![state("0000")];
        let probs = ndarray::arr2(&[[1.0]]);
        assert!(TransitionMatrix::new(states, probs).is_err());
    }

    #[test]
    fn test_run_matrix_alignment() {
        let chain = two_state_chain();
        let runs = RunMatrix::for_chain(&chain);
        assert!(runs.is_aligned_with(&chain));

        let i = chain.index_of(state("0000")).unwrap();
        let j = chain.index_of(state("0100")).unwrap();
        let absorbed = chain.index_of(BaseOutState::ABSORBED).unwrap();
        // Batter reaches first: no run. Into the absorbing state: forced zero.
        assert_eq!(runs.runs()[[i, j]], 0);
        assert_eq!(runs.runs()[[i, absorbed]], 0);
        assert_eq!(runs.runs()[[absorbed, absorbed]], 0);
        // Self-loop on an empty-bases state is a home run.
        assert_eq!(runs.runs()[[i, i]], 1);
    }
}
