//! Running a batch of experiments and writing their outcomes.
use crate::error::ModelResult;
use crate::model::{Model, Outcomes, ParameterSet};
use crate::output::DataWriter;
use crate::recorder::{CollectingRecorder, NullRecorder};
use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;
use std::path::Path;

/// Options for a batch run
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Whether to write the intermediate results of every experiment
    pub debug_model: bool,
    /// Whether failed experiments are left out instead of stopping the batch
    pub skip_failed: bool,
}

/// Write the outcomes of a successful experiment or deal with a failed one.
///
/// # Returns
///
/// The number of outcome rows written (zero or one)
fn handle_result(
    writer: &mut DataWriter,
    experiment: usize,
    result: ModelResult<Outcomes>,
    skip_failed: bool,
) -> Result<usize> {
    match result {
        Ok(outcomes) => {
            writer.write_outcomes(experiment, &outcomes)?;
            Ok(1)
        }
        Err(err) if skip_failed => {
            warn!("Skipping experiment {experiment}: {err}");
            Ok(0)
        }
        Err(err) => Err(err).with_context(|| format!("Experiment {experiment} failed")),
    }
}

/// Evaluate every experiment and write the outcomes to `output_path`.
///
/// Experiments are evaluated in parallel unless debug output is requested. Outcomes are always
/// written in experiment order.
///
/// # Returns
///
/// The number of experiments which were evaluated successfully
pub fn run(
    model: &Model,
    experiments: &[ParameterSet],
    output_path: &Path,
    options: BatchOptions,
) -> Result<usize> {
    let mut writer = DataWriter::create(output_path, model.outcome_keys(), options.debug_model)?;
    let mut succeeded = 0;

    if options.debug_model {
        for (experiment, overrides) in experiments.iter().enumerate() {
            let mut recorder = CollectingRecorder::default();
            let result = model.evaluate_overrides(overrides, &mut recorder);
            if result.is_ok() {
                writer.write_debug_info(experiment, &recorder)?;
            }
            succeeded += handle_result(&mut writer, experiment, result, options.skip_failed)?;
        }
    } else {
        let results: Vec<_> = experiments
            .par_iter()
            .map(|overrides| model.evaluate_overrides(overrides, &mut NullRecorder))
            .collect();

        for (experiment, result) in results.into_iter().enumerate() {
            succeeded += handle_result(&mut writer, experiment, result, options.skip_failed)?;
        }
    }

    writer.flush()?;
    info!(
        "Evaluated {succeeded} of {} experiments",
        experiments.len()
    );

    Ok(succeeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::output::OUTCOMES_FILE_NAME;
    use tempfile::tempdir;

    fn experiments(decisions: &[&str]) -> Vec<ParameterSet> {
        decisions
            .iter()
            .map(|decision| {
                [("decision".to_string(), (*decision).to_string())]
                    .into_iter()
                    .collect()
            })
            .collect()
    }

    fn count_rows(output_path: &Path) -> usize {
        csv::Reader::from_path(output_path.join(OUTCOMES_FILE_NAME))
            .unwrap()
            .records()
            .count()
    }

    #[test]
    fn test_run_parallel_and_debug_agree() {
        let model = Model::default();
        let experiments = experiments(&["ref", "amine", "oxy", "clc"]);

        let parallel_dir = tempdir().unwrap();
        run(&model, &experiments, parallel_dir.path(), BatchOptions::default()).unwrap();

        let debug_dir = tempdir().unwrap();
        let options = BatchOptions {
            debug_model: true,
            ..BatchOptions::default()
        };
        run(&model, &experiments, debug_dir.path(), options).unwrap();

        let read = |dir: &Path| std::fs::read_to_string(dir.join(OUTCOMES_FILE_NAME)).unwrap();
        assert_eq!(read(parallel_dir.path()), read(debug_dir.path()));
        assert_eq!(count_rows(parallel_dir.path()), 4);
    }

    #[test]
    fn test_run_failed_experiment() {
        let model = Model::default();
        let experiments = experiments(&["amine", "coal", "oxy"]);
        let dir = tempdir().unwrap();

        assert_error!(
            run(&model, &experiments, dir.path(), BatchOptions::default()),
            "Experiment 1 failed"
        );
    }

    #[test]
    fn test_run_skip_failed() {
        let model = Model::default();
        let experiments = experiments(&["amine", "coal", "oxy"]);
        let dir = tempdir().unwrap();
        let options = BatchOptions {
            skip_failed: true,
            ..BatchOptions::default()
        };

        assert_eq!(run(&model, &experiments, dir.path(), options).unwrap(), 2);
        assert_eq!(count_rows(dir.path()), 2);
    }
}
