//! The model definition and the evaluation of a single scenario.
use crate::balance::{PlantConstants, calculate_balances};
use crate::cost::cost_technology;
use crate::cycle::{CycleParameters, CycleTargets, NominalCycle, estimate_nominal_cycle};
use crate::error::ModelResult;
use crate::input::{input_err_msg, read_toml};
use crate::recorder::Recorder;
use crate::regret::{RegretMode, regret, regret_keys};
use crate::simulation::policy::PolicyRules;
use crate::simulation::{npv_of, simulate_cash_flows};
use crate::technology::{CostedTechnology, TechnologyKind, TechnologyMap};
use crate::units::{Money, Power};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use strum::IntoEnumIterator;

pub mod parameters;
pub use parameters::{ModelParameters, ParameterSet, TimeRegime};

const MODEL_FILE_NAME: &str = "model.toml";

/// Outcome name to value, with a fixed set of keys for a given model
pub type Outcomes = IndexMap<String, f64>;

/// Options controlling which outcomes are produced
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelOptions {
    /// How regret is measured
    pub regret_mode: RegretMode,
    /// The technology compared against in pairwise mode
    pub baseline: TechnologyKind,
    /// Whether to report the capital cost of each technology
    pub include_capex: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            regret_mode: RegretMode::Pairwise,
            baseline: TechnologyKind::Amine,
            include_capex: false,
        }
    }
}

/// Model definition
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Model {
    /// Which outcomes are produced
    pub options: ModelOptions,
    /// The base scenario
    pub parameters: ModelParameters,
    /// Reference balance of the existing plant
    pub plant: PlantConstants,
    /// Constants of the price shocks and support schemes
    pub policy: PolicyRules,
    /// Settings for estimating the nominal steam cycle
    pub cycle: Option<CycleParameters>,
    /// Nominal steam cycle estimated from `cycle` when the model is loaded
    #[serde(skip)]
    pub nominal_cycle: Option<NominalCycle>,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model or an error if the model file is missing or invalid, or if its nominal cycle
    /// does not converge
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let file_path = model_dir.as_ref().join(MODEL_FILE_NAME);
        let mut model: Model = read_toml(&file_path)?;
        model
            .parameters
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        if let Some(params) = &model.cycle {
            let cycle = model
                .estimate_cycle(params)
                .with_context(|| input_err_msg(&file_path))?;
            model.nominal_cycle = Some(cycle);
        }

        Ok(model)
    }

    /// The names of the outcomes produced by [`Model::evaluate`], in order
    pub fn outcome_keys(&self) -> Vec<String> {
        let mut keys = regret_keys(self.options.regret_mode);
        keys.extend(TechnologyKind::iter().map(|kind| format!("npv_{kind}")));
        if self.options.include_capex {
            keys.extend(TechnologyKind::iter().map(|kind| format!("{kind}_capex")));
        }

        keys
    }

    /// Estimate the nominal steam cycle of the existing plant
    pub fn estimate_cycle(&self, params: &CycleParameters) -> ModelResult<NominalCycle> {
        let targets = CycleTargets {
            heat: self.plant.net_heat(),
            power: Power(self.plant.net_power),
            fuel_input: Power(self.plant.fuel_input),
            lower_heating_value: self.plant.lower_heating_value,
        };

        estimate_nominal_cycle(params, &targets)
    }

    /// Evaluate one scenario.
    ///
    /// Each call is independent of every other: nothing is cached or carried over between calls.
    ///
    /// # Arguments
    ///
    /// * `params` - The scenario to evaluate
    /// * `recorder` - Receives the intermediate results
    ///
    /// # Returns
    ///
    /// The outcomes, with the keys given by [`Model::outcome_keys`]
    pub fn evaluate(
        &self,
        params: &ModelParameters,
        recorder: &mut dyn Recorder,
    ) -> ModelResult<Outcomes> {
        if let Some(cycle) = &self.nominal_cycle {
            recorder.record_cycle(cycle);
        }

        let technologies: TechnologyMap<CostedTechnology> = calculate_balances(&self.plant, params)
            .into_iter()
            .map(|(kind, balance)| {
                recorder.record_balance(&balance);
                let costed = cost_technology(balance, params);
                recorder.record_costs(&costed);
                (kind, costed)
            })
            .collect();

        let reference = technologies[&TechnologyKind::Reference].balance;
        let npvs: TechnologyMap<Money> = technologies
            .iter()
            .map(|(kind, technology)| {
                let cash_flows = simulate_cash_flows(technology, &reference, params, &self.policy)?;
                recorder.record_cash_flows(*kind, &cash_flows, params.discount_rate);
                Ok((*kind, npv_of(&cash_flows, params.discount_rate)))
            })
            .collect::<ModelResult<_>>()?;

        let mut outcomes = regret(
            self.options.regret_mode,
            &npvs,
            self.options.baseline,
            params.decision,
        );
        outcomes.extend(npvs.iter().map(|(kind, npv)| (format!("npv_{kind}"), npv.value())));
        if self.options.include_capex {
            outcomes.extend(
                technologies
                    .iter()
                    .map(|(kind, technology)| (format!("{kind}_capex"), technology.total_capex().value())),
            );
        }

        Ok(outcomes)
    }

    /// Evaluate the base scenario with the given overrides applied
    pub fn evaluate_overrides(
        &self,
        overrides: &ParameterSet,
        recorder: &mut dyn Recorder,
    ) -> ModelResult<Outcomes> {
        let params = self.parameters.with_overrides(overrides)?;
        self.evaluate(&params, recorder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::fixture::assert_error;
    use crate::recorder::{CollectingRecorder, NullRecorder};
    use itertools::Itertools;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::{TempDir, tempdir};

    fn model_with(options: ModelOptions) -> Model {
        Model {
            options,
            ..Model::default()
        }
    }

    #[rstest]
    #[case(RegretMode::Pairwise, false)]
    #[case(RegretMode::Pairwise, true)]
    #[case(RegretMode::Minimax, false)]
    #[case(RegretMode::Minimax, true)]
    fn test_outcome_keys_match_evaluation(#[case] regret_mode: RegretMode, #[case] include_capex: bool) {
        let model = model_with(ModelOptions {
            regret_mode,
            include_capex,
            ..ModelOptions::default()
        });
        let outcomes = model.evaluate(&model.parameters, &mut NullRecorder).unwrap();
        assert_eq!(outcomes.keys().cloned().collect_vec(), model.outcome_keys());
        assert!(outcomes.values().all(|value| value.is_finite()));
    }

    #[test]
    fn test_pairwise_outcome_keys() {
        let model = Model::default();
        assert_eq!(
            model.outcome_keys(),
            [
                "regret_1",
                "regret_2",
                "regret_3",
                "npv_ref",
                "npv_amine",
                "npv_oxy",
                "npv_clc"
            ]
        );
    }

    #[test]
    fn test_pairwise_regret_is_npv_difference() {
        let model = Model::default();
        let outcomes = model.evaluate(&model.parameters, &mut NullRecorder).unwrap();
        assert_eq!(outcomes["regret_1"], outcomes["npv_ref"] - outcomes["npv_amine"]);
        assert_eq!(outcomes["regret_2"], outcomes["npv_oxy"] - outcomes["npv_amine"]);
        assert_eq!(outcomes["regret_3"], outcomes["npv_clc"] - outcomes["npv_amine"]);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let model = model_with(ModelOptions {
            regret_mode: RegretMode::Minimax,
            include_capex: true,
            ..ModelOptions::default()
        });
        let mut params = model.parameters.clone();
        params.bio_shortage = true;
        params.power_surge = true;
        params.auction = true;

        let first = model.evaluate(&params, &mut NullRecorder).unwrap();
        let _ = model.evaluate(&model.parameters, &mut NullRecorder).unwrap();
        let second = model.evaluate(&params, &mut NullRecorder).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_minimax_regret_non_negative() {
        let model = model_with(ModelOptions {
            regret_mode: RegretMode::Minimax,
            ..ModelOptions::default()
        });
        for decision in TechnologyKind::iter() {
            let mut params = model.parameters.clone();
            params.decision = decision;
            let outcomes = model.evaluate(&params, &mut NullRecorder).unwrap();

            let regrets = TechnologyKind::iter()
                .map(|kind| outcomes[format!("regret_{kind}").as_str()])
                .collect_vec();
            assert!(regrets.iter().all(|regret| *regret >= 0.0));
            assert!(regrets.contains(&0.0));
            assert_eq!(
                outcomes["regret_decision"],
                outcomes[format!("regret_{decision}").as_str()]
            );
        }
    }

    #[test]
    fn test_capex_outcomes() {
        let model = model_with(ModelOptions {
            include_capex: true,
            ..ModelOptions::default()
        });
        let outcomes = model.evaluate(&model.parameters, &mut NullRecorder).unwrap();
        assert_eq!(outcomes["ref_capex"], 0.0);
        for kind in ["amine", "oxy", "clc"] {
            assert!(outcomes[format!("{kind}_capex").as_str()] > 0.0);
        }
    }

    #[test]
    fn test_evaluate_records_every_stage() {
        let model = Model::default();
        let mut recorder = CollectingRecorder::default();
        model.evaluate(&model.parameters, &mut recorder).unwrap();

        assert_eq!(recorder.balances.len(), 4);
        assert_eq!(recorder.costs.len(), 4);
        assert_eq!(recorder.cash_flows.len(), 4);
        for record in &recorder.cash_flows {
            assert_eq!(record.cash_flows.len(), 34);
        }
    }

    #[test]
    fn test_evaluate_overrides_invalid_decision() {
        let model = Model::default();
        let overrides = [("decision".to_string(), "coal".to_string())]
            .into_iter()
            .collect();
        assert!(matches!(
            model.evaluate_overrides(&overrides, &mut NullRecorder),
            Err(ModelError::ParameterRange { name, .. }) if name == "decision"
        ));
    }

    /// Write a model file with the given contents to a new temporary folder
    fn write_model(contents: &str) -> TempDir {
        let dir = tempdir().unwrap();
        let mut file = File::create(dir.path().join(MODEL_FILE_NAME)).unwrap();
        writeln!(file, "{contents}").unwrap();
        dir
    }

    #[test]
    fn test_model_from_path_estimates_cycle() {
        let dir = write_model(
            "[cycle]\nlive_steam_pressure = 90.0\nlive_steam_temperature = 540.0\n\
            isentropic_efficiency = 0.85",
        );
        let model = Model::from_path(dir.path()).unwrap();
        let cycle = model.nominal_cycle.unwrap();
        assert!(cycle.condenser_pressure > 1.0 && cycle.condenser_pressure < 10.0);

        // Without a [cycle] section nothing is estimated
        let dir = write_model("[parameters]\ndr = 0.05");
        assert!(Model::from_path(dir.path()).unwrap().nominal_cycle.is_none());
    }

    #[test]
    fn test_model_from_path_invalid_cycle() {
        let dir = write_model(
            "[cycle]\nlive_steam_pressure = 90.0\nlive_steam_temperature = 540.0\n\
            isentropic_efficiency = 0.85\nmax_iterations = 5",
        );
        let err = Model::from_path(dir.path()).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<ModelError>(),
            Some(ModelError::CycleConvergence(_))
        ));
    }

    #[test]
    fn test_model_from_path() {
        let dir = write_model(
            "[options]\nregret_mode = \"minimax\"\n\n[parameters]\ndr = 0.05\nTime = \"Uptime\"\n\n\
            [policy]\nauction_subsidy = 100.0",
        );

        let model = Model::from_path(dir.path()).unwrap();
        assert_eq!(model.options.regret_mode, RegretMode::Minimax);
        assert_eq!(model.parameters.discount_rate, 0.05);
        assert_eq!(model.parameters.time_regime, TimeRegime::Uptime);
        assert_eq!(model.policy.auction_subsidy, 100.0);
        assert_eq!(model.plant, PlantConstants::default());
        assert!(model.cycle.is_none());
    }

    #[test]
    fn test_model_from_path_invalid_parameters() {
        let dir = write_model("[parameters]\nrate = 1.5");
        let file_path = dir.path().join(MODEL_FILE_NAME);

        assert_error!(
            Model::from_path(dir.path()),
            format!("Error reading {}", file_path.display())
        );
        let err = Model::from_path(dir.path()).unwrap_err();
        assert_eq!(err.root_cause().to_string(), "rate must be between 0 and 1");
    }
}
