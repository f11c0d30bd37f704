use thiserror::Error;

use crate::state::BaseOutState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid state code {0:?}")]
    InvalidStateCode(String),

    #[error("invalid destination code {0}")]
    InvalidDestination(u8),

    #[error("no transitions to estimate from")]
    EmptyTransitions,

    #[error("transition starts from the three-out state")]
    TransitionFromAbsorbed,

    #[error("state ordering must end with the three-out state")]
    AbsorbingStateNotLast,

    #[error("state {0} appears as an after-state but never as a before-state")]
    DanglingState(BaseOutState),

    #[error("transition row for state {state} sums to {sum}, expected 1")]
    RowSumInvariant { state: BaseOutState, sum: f64 },

    #[error("state {0} was never observed as a before-state")]
    UnknownState(BaseOutState),

    #[error("run matrix is not aligned with the transition matrix")]
    MisalignedRunMatrix,

    #[error("half-inning did not reach three outs within {0} steps")]
    AbsorptionNotReached(usize),

    #[error("no run distribution for state {0}")]
    MissingState(BaseOutState),

    #[error("matrix I - Q is singular")]
    SingularMatrix,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
