//! Estimation of the nominal steam cycle of the reference CHP plant.
//!
//! The plant is modelled as a single back-pressure Rankine cycle whose condenser delivers the
//! district heat. The condenser pressure is unknown: it is found by stepping down from the
//! live-steam pressure until the heat output of the cycle matches the target.
use crate::error::{ModelError, ModelResult};
use crate::steam::{SteamState, StateSpec, TRIPLE_POINT_PRESSURE, resolve};
use crate::units::{MassFlow, Power};
use log::trace;
use serde::Deserialize;

/// kW per MW
const KW_PER_MW: f64 = 1000.0;

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_pressure_step, f64, 0.1);
define_param_default!(default_tolerance, f64, 0.03);
define_param_default!(default_max_iterations, u32, 1000);

/// Parameters of the nominal cycle, as given in the `[cycle]` section of the model file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CycleParameters {
    /// Live-steam pressure (bar)
    pub live_steam_pressure: f64,
    /// Live-steam temperature (°C)
    pub live_steam_temperature: f64,
    /// Isentropic efficiency of the turbine
    pub isentropic_efficiency: f64,
    /// The amount the condenser pressure is reduced by on each iteration (bar)
    #[serde(default = "default_pressure_step")]
    pub pressure_step: f64,
    /// Relative tolerance on the heat output
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Maximum number of condenser pressures to try
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

/// What the nominal cycle has to deliver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleTargets {
    /// Net heat output
    pub heat: Power,
    /// Net electric power
    pub power: Power,
    /// Fuel heat input
    pub fuel_input: Power,
    /// Lower heating value of the fuel (MJ/kg)
    pub lower_heating_value: f64,
}

/// The states visited by the cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStates {
    /// Feedwater entering the boiler (saturated liquid at condenser pressure)
    pub boiler: SteamState,
    /// End of an isentropic expansion to condenser pressure
    pub isentropic_mix: SteamState,
    /// Live steam at the turbine inlet
    pub live_steam: SteamState,
}

/// The converged nominal cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NominalCycle {
    /// Fuel heat input
    pub fuel_input: Power,
    /// Fuel mass flow
    pub fuel_mass_flow: MassFlow,
    /// Net heat output
    pub heat: Power,
    /// Net electric power
    pub power: Power,
    /// Steam mass flow through the turbine
    pub steam_mass_flow: MassFlow,
    /// Condenser pressure (bar)
    pub condenser_pressure: f64,
    /// Number of condenser pressures tried
    pub iterations: u32,
    /// The states visited by the cycle
    pub states: CycleStates,
}

/// Heat and power produced by the cycle at one trial condenser pressure
struct TrialCycle {
    states: CycleStates,
    steam_mass_flow: f64,
    heat: f64,
    power: f64,
}

/// Evaluate the cycle for a given condenser pressure
fn evaluate_trial(
    params: &CycleParameters,
    targets: &CycleTargets,
    live_steam: SteamState,
    condenser_pressure: f64,
) -> ModelResult<TrialCycle> {
    let boiler = resolve(StateSpec::SaturatedLiquid {
        pressure: condenser_pressure,
    })?;
    let isentropic_mix = resolve(StateSpec::PressureEntropy {
        pressure: condenser_pressure,
        entropy: live_steam.entropy,
    })?;

    let exit_enthalpy = live_steam.enthalpy
        - params.isentropic_efficiency * (live_steam.enthalpy - isentropic_mix.enthalpy);

    // All useful output is taken from the steam between the boiler and the turbine exit
    let steam_mass_flow = (targets.power.value() + targets.heat.value()) * KW_PER_MW
        / (live_steam.enthalpy - boiler.enthalpy);
    let power = steam_mass_flow * (live_steam.enthalpy - exit_enthalpy) / KW_PER_MW;
    let heat = steam_mass_flow * (exit_enthalpy - boiler.enthalpy) / KW_PER_MW;

    Ok(TrialCycle {
        states: CycleStates {
            boiler,
            isentropic_mix,
            live_steam,
        },
        steam_mass_flow,
        heat,
        power,
    })
}

/// Find the condenser pressure for which the cycle delivers the target heat output.
///
/// # Arguments
///
/// * `params` - Live-steam conditions, turbine efficiency and iteration settings
/// * `targets` - The heat and power the cycle should deliver
///
/// # Returns
///
/// The converged cycle, or [`ModelError::CycleConvergence`] if the iteration budget runs out, the
/// condenser pressure drops below the triple point or the solution is not physical. Failed
/// property lookups are propagated unchanged.
pub fn estimate_nominal_cycle(
    params: &CycleParameters,
    targets: &CycleTargets,
) -> ModelResult<NominalCycle> {
    let live_steam = resolve(StateSpec::PressureTemperature {
        pressure: params.live_steam_pressure,
        temperature: params.live_steam_temperature,
    })?;

    let mut condenser_pressure = params.live_steam_pressure;
    for iteration in 1..=params.max_iterations {
        if condenser_pressure < TRIPLE_POINT_PRESSURE {
            return Err(ModelError::CycleConvergence(format!(
                "condenser pressure fell to {condenser_pressure} bar, below the triple point, \
                after {} iterations",
                iteration - 1
            )));
        }

        let trial = evaluate_trial(params, targets, live_steam, condenser_pressure)?;
        if trial.steam_mass_flow <= 0.0 {
            return Err(ModelError::CycleConvergence(format!(
                "non-positive steam mass flow ({} kg/s)",
                trial.steam_mass_flow
            )));
        }

        let deviation = (trial.heat - targets.heat.value()).abs() / targets.heat.value().abs();
        trace!(
            "Cycle iteration {iteration}: p_cond = {condenser_pressure:.3} bar, \
            Q = {:.2} MW, P = {:.2} MW",
            trial.heat,
            trial.power
        );

        if deviation <= params.tolerance {
            if trial.power <= 0.0 {
                return Err(ModelError::CycleConvergence(format!(
                    "non-positive net power ({} MW)",
                    trial.power
                )));
            }

            return Ok(NominalCycle {
                fuel_input: targets.fuel_input,
                fuel_mass_flow: MassFlow(targets.fuel_input.value() / targets.lower_heating_value),
                heat: Power(trial.heat),
                power: Power(trial.power),
                steam_mass_flow: MassFlow(trial.steam_mass_flow),
                condenser_pressure,
                iterations: iteration,
                states: trial.states,
            });
        }

        condenser_pressure -= params.pressure_step;
    }

    Err(ModelError::CycleConvergence(format!(
        "heat output did not converge within {} iterations",
        params.max_iterations
    )))
}
