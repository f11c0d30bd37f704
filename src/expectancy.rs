use std::collections::HashMap;
use std::fmt;

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::sim::sampler::mean;
use crate::state::BaseOutState;

/// Canonical base-configuration ordering for reporting, as occupancy masks
/// (bit 0 = first base): empty, each single base, each pair, loaded.
pub const BASE_ORDER: [u8; 8] = [
    0b000, 0b001, 0b010, 0b100, 0b011, 0b101, 0b110, 0b111,
];

/// Mean runs scored until the end of the half-inning for each of the 24
/// starting states, arranged 8 base configurations x 3 outs counts.
///
/// Values are kept at full precision; rounding to 2 decimals happens only at
/// the reporting surface ([`RunExpectancyTable::rounded`] and `Display`).
#[derive(Debug, Clone, PartialEq)]
pub struct RunExpectancyTable {
    values: Array2<f64>,
}

impl RunExpectancyTable {
    /// Builds the table from per-state mean run values. Every one of the 24
    /// transient states must be present.
    pub fn from_means(means: &HashMap<BaseOutState, f64>) -> Result<Self> {
        let mut values = Array2::<f64>::zeros((BASE_ORDER.len(), 3));
        for (row, &bases) in BASE_ORDER.iter().enumerate() {
            for outs in 0..3u8 {
                let state = BaseOutState::transient(outs, bases);
                let value = means.get(&state).ok_or(Error::MissingState(state))?;
                values[[row, outs as usize]] = *value;
            }
        }
        Ok(RunExpectancyTable { values })
    }

    /// Builds the table from sampled run distributions.
    pub fn from_samples(samples: &HashMap<BaseOutState, Vec<i64>>) -> Result<Self> {
        let means = samples
            .iter()
            .map(|(&state, dist)| (state, mean(dist)))
            .collect();
        Self::from_means(&means)
    }

    /// Expected runs from the state with the given base mask and outs count,
    /// at full precision.
    ///
    /// # Panics
    ///
    /// Panics if `bases > 7` or `outs > 2`.
    pub fn value(&self, bases: u8, outs: u8) -> f64 {
        let row = Self::base_row(bases);
        self.values[[row, outs as usize]]
    }

    /// Expected runs rounded to 2 decimals, the table's reporting precision.
    pub fn rounded(&self, bases: u8, outs: u8) -> f64 {
        (self.value(bases, outs) * 100.0).round() / 100.0
    }

    /// Row label in the `BBB` occupancy form, e.g. `"110"` for runners on
    /// first and second.
    pub fn row_label(bases: u8) -> String {
        format!("{}{}{}", bases & 1, (bases >> 1) & 1, (bases >> 2) & 1)
    }

    fn base_row(bases: u8) -> usize {
        BASE_ORDER
            .iter()
            .position(|&b| b == bases)
            .expect("base mask must be 0-7")
    }
}

impl fmt::Display for RunExpectancyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bases   0 outs  1 out   2 outs")?;
        for &bases in &BASE_ORDER {
            write!(f, "{}  ", Self::row_label(bases))?;
            for outs in 0..3u8 {
                write!(f, "{:>8.2}", self.rounded(bases, outs))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
