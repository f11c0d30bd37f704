use ndarray::Array2;

use crate::chain::TransitionMatrix;
use crate::error::{Error, Result};
use crate::state::BaseOutState;

/// Pivots smaller than this are treated as a singular system.
const SINGULARITY_EPS: f64 = 1e-12;

/// Expected-visits matrix N = (I - Q)^-1 of the absorbing chain, over the
/// transient states only.
///
/// Entry (i, j) is the expected number of visits to state j before the
/// half-inning ends, starting from state i. Row sums are the expected number
/// of plate appearances until absorption.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalMatrix {
    states: Vec<BaseOutState>,
    visits: Array2<f64>,
}

impl FundamentalMatrix {
    /// Transient states in the same order as the source chain.
    pub fn states(&self) -> &[BaseOutState] {
        &self.states
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.visits
    }

    /// Expected visits to `to` before absorption, starting from `from`.
    pub fn expected_visits(&self, from: BaseOutState, to: BaseOutState) -> Result<f64> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        Ok(self.visits[[i, j]])
    }

    /// Expected plate appearances before the half-inning ends, starting from
    /// `from`: the row sum of N.
    pub fn expected_plate_appearances(&self, from: BaseOutState) -> Result<f64> {
        let i = self.index_of(from)?;
        Ok(self.visits.row(i).sum())
    }

    fn index_of(&self, state: BaseOutState) -> Result<usize> {
        self.states
            .iter()
            .position(|&s| s == state)
            .ok_or(Error::UnknownState(state))
    }
}

/// Computes the fundamental matrix of the chain by inverting I - Q, where Q
/// is the transient-to-transient block.
///
/// Fails with [`Error::SingularMatrix`] when I - Q is singular, which happens
/// exactly when some transient state cannot reach the absorbing state; the
/// error is surfaced instead of a matrix of garbage values.
pub fn fundamental_matrix(chain: &TransitionMatrix) -> Result<FundamentalMatrix> {
    let q = chain.transient_block();
    let n = q.nrows();
    let mut a = Array2::<f64>::eye(n);
    a -= &q;

    let visits = invert(a)?;
    Ok(FundamentalMatrix {
        states: chain.states()[..n].to_vec(),
        visits,
    })
}

/// Inverts a square matrix by Gauss-Jordan elimination with partial pivoting.
fn invert(a: Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    // Augmented system [A | I], reduced in place.
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        // Find pivot
        let mut max_idx = col;
        let mut max_val = aug[[col, col]].abs();
        for row in col + 1..n {
            let val = aug[[row, col]].abs();
            if val > max_val {
                max_idx = row;
                max_val = val;
            }
        }
        if max_val < SINGULARITY_EPS {
            return Err(Error::SingularMatrix);
        }

        // Swap rows if necessary
        if max_idx != col {
            for j in 0..2 * n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[max_idx, j]];
                aug[[max_idx, j]] = tmp;
            }
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        // Eliminate the column everywhere else
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..2 * n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    Ok(Array2::from_shape_fn((n, n), |(i, j)| aug[[i, n + j]]))
}
