//! The command line interface for the model.
use crate::batch::{self, BatchOptions};
use crate::input::read_experiments;
use crate::log;
use crate::model::{Model, ParameterSet};
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::recorder::LogRecorder;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the model.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// CSV file with one experiment per row; the base scenario is run if omitted
    #[arg(long)]
    pub experiments: Option<PathBuf>,
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write intermediate results to CSV files
    #[arg(long)]
    pub debug_model: bool,
    /// Whether to leave out failed experiments instead of stopping the run
    #[arg(long)]
    pub skip_failed: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a batch of experiments.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Evaluate the base scenario and print its outcomes.
    Evaluate {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
    /// Estimate the nominal steam cycle of the model.
    Cycle {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Manage program settings.
    Settings {
        /// The available subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Evaluate { model_dir } => handle_evaluate_command(&model_dir, None),
            Self::Cycle { model_dir } => handle_cycle_command(&model_dir, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    if let Some(settings) = settings {
        Ok(settings)
    } else {
        Settings::load().context("Failed to load settings.")
    }
}

/// Initialise the program logger, unless an earlier command in this process already has
fn init_logger(settings: &Settings, log_file_path: Option<&Path>) -> Result<()> {
    if log::is_logger_initialised() {
        return Ok(());
    }

    log::init(Some(&settings.log_level), log_file_path).context("Failed to initialise logging.")
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = load_settings(settings)?;

    // These settings can be overridden by command-line arguments
    if opts.debug_model {
        settings.debug_model = true;
    }
    if opts.overwrite {
        settings.overwrite = true;
    }

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path)?;
        &pathbuf
    };

    let overwrite =
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    init_logger(&settings, Some(output_path))?;

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let experiments = match &opts.experiments {
        Some(path) => read_experiments(path).context("Failed to load experiments.")?,
        None => vec![ParameterSet::new()],
    };
    info!("Running {} experiments", experiments.len());

    write_metadata(
        output_path,
        model_path,
        opts.experiments.as_deref(),
        experiments.len(),
    )
    .context("Failed to save metadata.")?;

    let options = BatchOptions {
        debug_model: settings.debug_model,
        skip_failed: opts.skip_failed,
    };
    batch::run(&model, &experiments, output_path, options)?;
    info!("Run complete!");

    Ok(())
}

/// Handle the `evaluate` command.
pub fn handle_evaluate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;
    init_logger(&settings, None)?;

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    let outcomes = model
        .evaluate(&model.parameters, &mut LogRecorder)
        .context("Failed to evaluate the base scenario.")?;
    for (key, value) in &outcomes {
        info!("{key} = {value:.3}");
    }

    Ok(())
}

/// Handle the `cycle` command.
pub fn handle_cycle_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;
    init_logger(&settings, None)?;

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    let cycle = model
        .nominal_cycle
        .context("The model file has no [cycle] section")?;

    info!(
        "Condenser pressure {:.2} bar after {} iterations",
        cycle.condenser_pressure, cycle.iterations
    );
    info!(
        "Steam flow {:.2} kg/s, heat {:.2} MW, power {:.2} MW",
        cycle.steam_mass_flow.value(),
        cycle.heat.value(),
        cycle.power.value()
    );
    for (name, state) in [
        ("Live steam", cycle.states.live_steam),
        ("Isentropic expansion", cycle.states.isentropic_mix),
        ("Feedwater", cycle.states.boiler),
    ] {
        info!(
            "{name}: {:.2} bar, h = {:.1} kJ/kg, s = {:.4} kJ/kg K",
            state.pressure, state.enthalpy, state.entropy
        );
    }

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // We won't save log files when running the validate command
    init_logger(&settings, None)?;

    Model::from_path(model_path).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}
