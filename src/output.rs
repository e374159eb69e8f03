//! The module responsible for writing output data to disk.
use crate::cost::tranche;
use crate::finance::discount_factor;
use crate::model::Outcomes;
use crate::recorder::CollectingRecorder;
use crate::technology::TechnologyKind;
use crate::units::Dimensionless;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "beccs_results";

/// The output file name for the outcomes of each experiment
pub const OUTCOMES_FILE_NAME: &str = "outcomes.csv";

/// The output file name for technology balances
const BALANCES_FILE_NAME: &str = "debug_balances.csv";

/// The output file name for itemised capital costs
const CAPITAL_COSTS_FILE_NAME: &str = "debug_capital_costs.csv";

/// The output file name for yearly cash flows
const CASH_FLOWS_FILE_NAME: &str = "debug_cash_flows.csv";

/// Get the default output directory for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory, if it doesn't already exist.
///
/// An existing directory which is not empty is only reused if `allow_overwrite` is set, in which
/// case its contents are deleted.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if output_dir.is_dir() {
        if fs::read_dir(output_dir)?.next().is_none() {
            // Already exists and is empty
            return Ok(false);
        }

        if !allow_overwrite {
            bail!(
                "Output folder already exists and is not empty. \
                Rerun with --overwrite to replace its contents."
            );
        }

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the technology balances CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct BalanceRow {
    experiment: usize,
    technology: TechnologyKind,
    fuel_input: f64,
    net_heat: f64,
    net_power: f64,
    captured: f64,
    emitted: f64,
    operating_hours: f64,
    efficiency: f64,
}

/// Represents a row in the capital costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapitalCostRow {
    experiment: usize,
    technology: TechnologyKind,
    item: String,
    tranche: String,
    bare_cost: f64,
}

/// Represents a row in the cash flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CashFlowRow {
    experiment: usize,
    technology: TechnologyKind,
    year: u32,
    phase: String,
    capital_cost: f64,
    operating_cost: f64,
    revenue: f64,
    net: f64,
    carbon_price: f64,
    credit_price: f64,
    auction_subsidy: f64,
    discount_factor: f64,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    balances_writer: csv::Writer<File>,
    capital_costs_writer: csv::Writer<File>,
    cash_flows_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            balances_writer: new_writer(BALANCES_FILE_NAME)?,
            capital_costs_writer: new_writer(CAPITAL_COSTS_FILE_NAME)?,
            cash_flows_writer: new_writer(CASH_FLOWS_FILE_NAME)?,
        })
    }

    /// Write everything collected during one experiment
    fn write_debug_info(&mut self, experiment: usize, recorder: &CollectingRecorder) -> Result<()> {
        for balance in &recorder.balances {
            self.balances_writer.serialize(BalanceRow {
                experiment,
                technology: balance.kind,
                fuel_input: balance.fuel_input.value(),
                net_heat: balance.net_heat.value(),
                net_power: balance.net_power.value(),
                captured: balance.captured.value(),
                emitted: balance.emitted.value(),
                operating_hours: balance.operating_hours.value(),
                efficiency: balance.efficiency().value(),
            })?;
        }

        for technology in &recorder.costs {
            let kind = technology.kind();
            for (item, cost) in &technology.bare_costs {
                self.capital_costs_writer.serialize(CapitalCostRow {
                    experiment,
                    technology: kind,
                    item: item.id().to_string(),
                    tranche: tranche(kind, *item).id().to_string(),
                    bare_cost: cost.value(),
                })?;
            }
        }

        for record in &recorder.cash_flows {
            let rate = Dimensionless(record.discount_rate);
            for flow in &record.cash_flows {
                self.cash_flows_writer.serialize(CashFlowRow {
                    experiment,
                    technology: record.kind,
                    year: flow.year,
                    phase: flow.phase.id().to_string(),
                    capital_cost: flow.capital_cost.value(),
                    operating_cost: flow.operating_cost.value(),
                    revenue: flow.revenue.value(),
                    net: flow.net().value(),
                    carbon_price: flow.carbon_price,
                    credit_price: flow.credit_price,
                    auction_subsidy: flow.auction_subsidy,
                    discount_factor: discount_factor(rate, flow.year).value(),
                })?;
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.balances_writer.flush()?;
        self.capital_costs_writer.flush()?;
        self.cash_flows_writer.flush()?;

        Ok(())
    }
}

/// An object for writing the results of a batch of experiments to file
pub struct DataWriter {
    outcome_keys: Vec<String>,
    outcomes_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `outcome_keys` - The outcome columns, in order
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(
        output_path: &Path,
        outcome_keys: Vec<String>,
        save_debug_info: bool,
    ) -> Result<Self> {
        let mut outcomes_writer = csv::Writer::from_path(output_path.join(OUTCOMES_FILE_NAME))?;
        outcomes_writer.write_record(
            std::iter::once("experiment").chain(outcome_keys.iter().map(String::as_str)),
        )?;

        let debug_writer = if save_debug_info {
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            outcome_keys,
            outcomes_writer,
            debug_writer,
        })
    }

    /// Write the outcomes of one experiment
    pub fn write_outcomes(&mut self, experiment: usize, outcomes: &Outcomes) -> Result<()> {
        let mut record = vec![experiment.to_string()];
        for key in &self.outcome_keys {
            let value = outcomes
                .get(key)
                .with_context(|| format!("Experiment {experiment} has no outcome {key}"))?;
            record.push(value.to_string());
        }
        self.outcomes_writer.write_record(&record)?;

        Ok(())
    }

    /// Write debug information to CSV files
    pub fn write_debug_info(&mut self, experiment: usize, recorder: &CollectingRecorder) -> Result<()> {
        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_debug_info(experiment, recorder)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.outcomes_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use itertools::Itertools;
    use tempfile::tempdir;

    #[test]
    fn test_create_output_directory_new() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_existing() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        fs::create_dir(&output_dir).unwrap();

        // Empty folders are reused
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Non-empty folders need permission
        fs::write(output_dir.join("file.txt"), "contents").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("file.txt").exists());
    }

    #[test]
    fn test_write_outcomes() {
        let dir = tempdir().unwrap();
        let keys = vec!["regret_1".to_string(), "npv_ref".to_string()];
        {
            let mut writer = DataWriter::create(dir.path(), keys.clone(), false).unwrap();
            let outcomes: Outcomes = [("npv_ref".to_string(), 2.5), ("regret_1".to_string(), -1.0)]
                .into_iter()
                .collect();
            writer.write_outcomes(3, &outcomes).unwrap();

            let incomplete: Outcomes = [("npv_ref".to_string(), 2.5)].into_iter().collect();
            assert!(writer.write_outcomes(4, &incomplete).is_err());
            writer.flush().unwrap();
        }

        let contents = fs::read_to_string(dir.path().join(OUTCOMES_FILE_NAME)).unwrap();
        assert_eq!(contents, "experiment,regret_1,npv_ref\n3,-1,2.5\n");
        assert!(!dir.path().join(CASH_FLOWS_FILE_NAME).exists());
    }

    #[test]
    fn test_write_debug_info() {
        let model = Model::default();
        let mut recorder = CollectingRecorder::default();
        model.evaluate(&model.parameters, &mut recorder).unwrap();

        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), model.outcome_keys(), true).unwrap();
            writer.write_debug_info(0, &recorder).unwrap();
            writer.flush().unwrap();
        }

        let balances: Vec<BalanceRow> = csv::Reader::from_path(dir.path().join(BALANCES_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_eq!(
            balances.iter().map(|row| row.technology).collect_vec(),
            [
                TechnologyKind::Reference,
                TechnologyKind::Amine,
                TechnologyKind::Oxyfuel,
                TechnologyKind::ChemicalLooping
            ]
        );

        let costs: Vec<CapitalCostRow> =
            csv::Reader::from_path(dir.path().join(CAPITAL_COSTS_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert!(costs.iter().all(|row| row.technology != TechnologyKind::Reference));
        assert!(
            costs
                .iter()
                .any(|row| row.item == "FR" && row.tranche == "initial")
        );

        let cash_flows: Vec<CashFlowRow> =
            csv::Reader::from_path(dir.path().join(CASH_FLOWS_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(cash_flows.len(), 4 * 34);
        assert_eq!(cash_flows[0].year, 1);
        assert!(
            cash_flows
                .iter()
                .filter(|row| row.technology == TechnologyKind::Reference)
                .all(|row| row.phase == "reference")
        );
    }
}
