//! Integration tests for the `validate` command.
use beccs::cli::handle_validate_command;
use beccs::log::is_logger_initialised;
use beccs::settings::Settings;
use std::path::PathBuf;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/malmo")
}

/// An integration test for the `validate` command.
///
/// We also check that the logger is initialised after it is run.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("BECCS_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    handle_validate_command(&get_model_dir(), Some(Settings::default())).unwrap();

    assert!(is_logger_initialised());

    // A missing model is reported rather than defaulted
    assert!(handle_validate_command(&PathBuf::from("demos/missing"), None).is_err());
}
