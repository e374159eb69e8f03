//! Integration tests for the `run` command.
use beccs::cli::{RunOpts, handle_run_command};
use beccs::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/malmo")
}

/// Read a CSV file into its header and rows
fn read_csv(path: PathBuf) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|record| record.unwrap().iter().map(String::from).collect())
        .collect();

    (header, rows)
}

/// An integration test for the `run` command.
///
/// All the runs share one test, as the logger can only be initialised once per process.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("BECCS_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let mut opts = RunOpts {
        experiments: Some(get_model_dir().join("experiments.csv")),
        output_dir: Some(output_dir.clone()),
        ..RunOpts::default()
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

    let (header, rows) = read_csv(output_dir.join("outcomes.csv"));
    assert_eq!(header[..4], ["experiment", "regret_1", "regret_2", "regret_3"]);
    assert!(header.contains(&"amine_capex".to_string()));
    assert_eq!(rows.len(), 4);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row[0], i.to_string());
        assert_eq!(row.len(), header.len());
    }
    assert!(output_dir.join("metadata.toml").is_file());
    assert!(!output_dir.join("debug_cash_flows.csv").exists());

    // The output folder is now non-empty
    assert!(handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).is_err());

    opts.overwrite = true;
    opts.debug_model = true;
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

    let (rerun_header, rerun_rows) = read_csv(output_dir.join("outcomes.csv"));
    assert_eq!(rerun_header, header);
    assert_eq!(rerun_rows, rows);
    let (_, cash_flows) = read_csv(output_dir.join("debug_cash_flows.csv"));
    assert!(!cash_flows.is_empty());
    let (_, balances) = read_csv(output_dir.join("debug_balances.csv"));
    assert_eq!(balances.len(), 4 * 4);

    // Base scenario only
    let base_dir = tempdir.path().join("base");
    let opts = RunOpts {
        output_dir: Some(base_dir.clone()),
        ..RunOpts::default()
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();
    let (_, rows) = read_csv(base_dir.join("outcomes.csv"));
    assert_eq!(rows.len(), 1);

    // An unknown parameter fails the run
    let bad_experiments = tempdir.path().join("bad.csv");
    fs::write(&bad_experiments, "dr,coal_price\n0.05,12.0\n").unwrap();
    let opts = RunOpts {
        experiments: Some(bad_experiments),
        output_dir: Some(tempdir.path().join("bad")),
        ..RunOpts::default()
    };
    assert!(handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).is_err());
}
