use std::collections::HashMap;

use log::debug;
use ndarray::Array2;

use crate::chain::TransitionMatrix;
use crate::error::{Error, Result};
use crate::event::{encode_transitions, select_model_plays, PlayRecord};
use crate::state::BaseOutState;

/// Estimates the transition probability matrix from observed (before, after)
/// state pairs by empirical frequency counting.
///
/// Row and column order is data-driven: observed before-states by descending
/// frequency (ties broken by ascending state index, so estimation is
/// deterministic), with the absorbing state appended last as an exact unit
/// row. States never observed as a before-state get no row; if such a state
/// still occurs as an after-state the matrix cannot be square and
/// row-stochastic at once, and estimation fails rather than dropping mass.
///
/// # Examples
///
/// ```
/// use basechain::chain::estimate_chain;
/// use basechain::state::BaseOutState;
///
/// let start: BaseOutState = "0000".parse().unwrap();
/// let one_out: BaseOutState = "1000".parse().unwrap();
/// let transitions = vec![
///     (start, one_out),
///     (start, one_out),
///     (one_out, BaseOutState::ABSORBED),
/// ];
/// let chain = estimate_chain(&transitions).unwrap();
/// assert_eq!(chain.prob(start, one_out).unwrap(), 1.0);
/// ```
pub fn estimate_chain(transitions: &[(BaseOutState, BaseOutState)]) -> Result<TransitionMatrix> {
    if transitions.is_empty() {
        return Err(Error::EmptyTransitions);
    }

    let mut totals: HashMap<BaseOutState, usize> = HashMap::new();
    let mut joint: HashMap<(BaseOutState, BaseOutState), usize> = HashMap::new();
    for &(from, to) in transitions {
        if from.is_absorbed() {
            return Err(Error::TransitionFromAbsorbed);
        }
        *totals.entry(from).or_insert(0) += 1;
        *joint.entry((from, to)).or_insert(0) += 1;
    }

    let mut ordered: Vec<(BaseOutState, usize)> = totals.iter().map(|(&s, &n)| (s, n)).collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.index().cmp(&b.0.index())));

    let mut states: Vec<BaseOutState> = ordered.iter().map(|&(s, _)| s).collect();
    states.push(BaseOutState::ABSORBED);

    for &(_, to) in transitions {
        if !to.is_absorbed() && !totals.contains_key(&to) {
            return Err(Error::DanglingState(to));
        }
    }

    let n = states.len();
    let mut probs = Array2::<f64>::zeros((n, n));
    let index: HashMap<BaseOutState, usize> =
        states.iter().enumerate().map(|(i, &s)| (s, i)).collect();
    for (&(from, to), &count) in &joint {
        let i = index[&from];
        let j = index[&to];
        probs[[i, j]] = count as f64 / totals[&from] as f64;
    }
    probs[[n - 1, n - 1]] = 1.0;

    debug!(
        "estimated chain over {} states from {} transitions",
        n,
        transitions.len()
    );

    TransitionMatrix::new(states, probs)
}

/// Full estimation pipeline over raw records: applies the input contract,
/// encodes the surviving plays, and estimates the chain.
pub fn estimate_from_records(records: &[PlayRecord]) -> Result<TransitionMatrix> {
    let plays = select_model_plays(records);
    estimate_chain(&encode_transitions(plays))
}
