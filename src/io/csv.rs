/*!
# I/O Utilities for Saving Traces to CSV

Saves a collected chain trace to a CSV file. Enable via the `csv` feature.
*/

use crate::core::{ChainState, StepInfo};
use csv::Writer;
use std::error::Error;
use std::fs::File;

/**
Saves an index-aligned trace as a CSV file.

The resulting file has one row per step with:
- a `"step"` column,
- one column per flattened coordinate (`mu`, `theta[0]`, ...),
- `"logprob"`, `"accept_prob"`, `"divergent"`, and `"n_steps"` columns
  from the per-step diagnostics.

# Arguments

* `states` - The collected chain states.
* `infos` - The diagnostics, aligned with `states`.
* `filename` - The file path where the CSV data will be written.

# Returns

Returns `Ok(())` if successful, or an error if any I/O or CSV formatting
issue occurs.
*/
pub fn save_trace_csv(
    states: &[ChainState],
    infos: &[StepInfo],
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(File::create(filename)?);

    let coord_names = states
        .first()
        .map(|s| s.position.coord_names())
        .unwrap_or_default();
    let mut header: Vec<String> = vec!["step".to_string()];
    header.extend(coord_names);
    header.extend(
        ["logprob", "accept_prob", "divergent", "n_steps"]
            .iter()
            .map(|s| s.to_string()),
    );
    wtr.write_record(&header)?;

    for (i, (state, info)) in states.iter().zip(infos).enumerate() {
        let mut row = vec![i.to_string()];
        row.extend(state.position.coords().iter().map(|v| v.to_string()));
        row.push(state.logprob.to_string());
        row.push(info.acceptance_prob.to_string());
        row.push(info.is_divergent.to_string());
        row.push(info.n_steps.to_string());
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
