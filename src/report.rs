use std::collections::HashMap;
use std::io;

use serde::Serialize;

use crate::chain::{RunMatrix, TransitionMatrix};
use crate::error::Result;
use crate::event::PlayRecord;
use crate::expectancy::{RunExpectancyTable, BASE_ORDER};
use crate::state::BaseOutState;

/// Reads structured play records, the form in which the upstream data source
/// delivers them, from CSV with a header row.
pub fn read_play_records<R: io::Read>(reader: R) -> Result<Vec<PlayRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Writes the labeled transition probability matrix as CSV.
pub fn write_transition_matrix<W: io::Write>(writer: W, chain: &TransitionMatrix) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    let mut header = vec!["state".to_string()];
    header.extend(chain.states().iter().map(BaseOutState::to_string));
    csv_writer.write_record(&header)?;
    for (i, state) in chain.states().iter().enumerate() {
        let mut row = vec![state.to_string()];
        row.extend(chain.probs().row(i).iter().map(|p| p.to_string()));
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the labeled run matrix as CSV.
pub fn write_run_matrix<W: io::Write>(writer: W, runs: &RunMatrix) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    let mut header = vec!["state".to_string()];
    header.extend(runs.states().iter().map(BaseOutState::to_string));
    csv_writer.write_record(&header)?;
    for (i, state) in runs.states().iter().enumerate() {
        let mut row = vec![state.to_string()];
        row.extend(runs.runs().row(i).iter().map(|r| r.to_string()));
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the 8x3 run-expectancy table as CSV, at the 2-decimal reporting
/// precision.
pub fn write_expectancy_table<W: io::Write>(writer: W, table: &RunExpectancyTable) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(["bases", "0", "1", "2"])?;
    for &bases in &BASE_ORDER {
        let mut row = vec![RunExpectancyTable::row_label(bases)];
        for outs in 0..3u8 {
            row.push(format!("{:.2}", table.rounded(bases, outs)));
        }
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct SampleRow {
    state: String,
    trial: usize,
    runs: i64,
}

/// Persists raw run-distribution samples for the plotting collaborator, one
/// row per trial, grouped by starting state in packed state order.
pub fn write_run_samples<W: io::Write>(
    writer: W,
    samples: &HashMap<BaseOutState, Vec<i64>>,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    let mut states: Vec<&BaseOutState> = samples.keys().collect();
    states.sort();
    for &state in states {
        for (trial, &runs) in samples[&state].iter().enumerate() {
            csv_writer.serialize(SampleRow {
                state: state.to_string(),
                trial,
                runs,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::estimate_chain;
    use crate::event::Destination;

    fn state(code: &str) -> BaseOutState {
        code.parse().unwrap()
    }

    fn pair(from: &str, to: &str) -> (BaseOutState, BaseOutState) {
        (state(from), state(to))
    }

    #[test]
    fn test_read_play_records() {
        let csv = "\
game_id,game_number,inning,home_batting,batted_ball,outs_before,outs_on_play,batter_dest,first_runner,second_runner,third_runner
BOS202304010,0,1,false,true,0,1,0,,,
BOS202304010,0,1,false,true,1,0,1,,4,
";
        let records = read_play_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].batter_dest, Destination::Out);
        assert_eq!(records[0].first_runner, None);
        assert_eq!(records[1].batter_dest, Destination::First);
        assert_eq!(records[1].second_runner, Some(Destination::Home));
        assert_eq!(records[1].before_state().to_string(), "1010");
    }

    #[test]
    fn test_bad_destination_code_is_an_error() {
        let csv = "\
game_id,game_number,inning,home_batting,batted_ball,outs_before,outs_on_play,batter_dest,first_runner,second_runner,third_runner
BOS202304010,0,1,false,true,0,1,9,,,
";
        assert!(read_play_records(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_write_transition_matrix() {
        let chain =
            estimate_chain(&[pair("0000", "0100"), pair("0100", "3"), pair("0000", "3")])
                .unwrap();
        let mut buf = Vec::new();
        write_transition_matrix(&mut buf, &chain).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "state,0000,0100,3");
        assert_eq!(lines[1], "0000,0,0.5,0.5");
        assert_eq!(lines[3], "3,0,0,1");
    }

    #[test]
    fn test_write_run_matrix() {
        let chain = estimate_chain(&[pair("0000", "0000"), pair("0000", "3")]).unwrap();
        let runs = RunMatrix::for_chain(&chain);
        let mut buf = Vec::new();
        write_run_matrix(&mut buf, &runs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "state,0000,3");
        // Home-run self-loop scores one; into the absorbing state is zero.
        assert_eq!(lines[1], "0000,1,0");
        assert_eq!(lines[2], "3,0,0");
    }

    #[test]
    fn test_write_expectancy_table() {
        let means: HashMap<BaseOutState, f64> = BaseOutState::transient_states()
            .map(|s| (s, 0.125))
            .collect();
        let table = RunExpectancyTable::from_means(&means).unwrap();
        let mut buf = Vec::new();
        write_expectancy_table(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "bases,0,1,2");
        assert_eq!(lines[1], "000,0.13,0.13,0.13");
    }

    #[test]
    fn test_write_run_samples() {
        let mut samples = HashMap::new();
        samples.insert(state("0000"), vec![0, 2]);
        samples.insert(state("1000"), vec![1]);
        let mut buf = Vec::new();
        write_run_samples(&mut buf, &samples).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "state,trial,runs");
        assert_eq!(lines[1], "0000,0,0");
        assert_eq!(lines[2], "0000,1,2");
        assert_eq!(lines[3], "1000,0,1");
    }
}
