//! A regret-based decision model for retrofitting carbon capture to a biomass CHP plant.
//!
//! Four technologies are compared under uncertain prices, policies and costs: the existing plant,
//! amine scrubbing, oxyfuel combustion and chemical-looping combustion. Each scenario is evaluated
//! by computing the technologies' energy balances and capital costs, simulating their cash flows
//! year by year and reducing the resulting NPVs to regret.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod balance;
pub mod batch;
pub mod cli;
pub mod cost;
pub mod cycle;
pub mod error;
pub mod finance;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod recorder;
pub mod regret;
pub mod settings;
pub mod simulation;
pub mod steam;
pub mod technology;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config folder for the program.
///
/// Falls back to the current folder on platforms without a config folder.
pub fn get_beccs_config_dir() -> PathBuf {
    let Some(mut dir) = dirs::config_dir() else {
        return PathBuf::from(".");
    };
    dir.push("beccs");

    dir
}
