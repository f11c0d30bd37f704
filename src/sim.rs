pub mod half_inning;
pub mod sampler;

pub use half_inning::{simulate_half_inning, HalfInning};
pub use sampler::{
    mean, sample_all_starting_states, sample_run_distribution, sample_run_distribution_par,
    std_dev,
};
