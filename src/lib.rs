pub mod chain;
pub mod error;
pub mod event;
pub mod expectancy;
pub mod report;
pub mod runs;
pub mod sim;
pub mod state;

pub use chain::{
    compare_chains, compare_run_distributions, estimate_chain, estimate_from_records,
    fundamental_matrix, ChainComparison, FundamentalMatrix, RunDistributionComparison, RunMatrix,
    TransitionMatrix,
};
pub use error::{Error, Result};
pub use expectancy::RunExpectancyTable;
pub use sim::{sample_all_starting_states, sample_run_distribution, simulate_half_inning, HalfInning};
pub use state::BaseOutState;
