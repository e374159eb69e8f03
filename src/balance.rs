//! Steady-state energy and mass balances of the four technologies.
//!
//! Every capture technology is derived from the reference plant by subtracting parasitic loads
//! (CO2 compression and cooling, solvent regeneration, air separation) which scale linearly with
//! the captured CO2 flow. The balances do not close exactly: the reference plant recovers latent
//! heat by flue-gas condensation and the chemical-looping flue gas volume ignores excess oxygen.
//! These are known approximations of the plant data, not errors to be corrected here.
use crate::model::ModelParameters;
use crate::technology::{
    Auxiliaries, LoopingAuxiliaries, TechnologyBalance, TechnologyKind, TechnologyMap,
};
use crate::units::{Hours, MassFlow, Power};
use serde::Deserialize;

/// Molar mass of O2 (kg/kmol)
const O2_MOLAR_MASS: f64 = 32.0;

/// Reference balance of the existing plant and the coefficients used to derive the capture
/// cases from it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlantConstants {
    /// Lower heating value of the biomass (MJ/kg)
    pub lower_heating_value: f64,
    /// Fuel heat input (MW)
    pub fuel_input: f64,
    /// Net electric power (MW)
    pub net_power: f64,
    /// Heat recovered by flue-gas condensation (MW)
    pub flue_gas_condensation_heat: f64,
    /// Heat delivered by the condenser (MW)
    pub condenser_heat: f64,
    /// CO2 generated per kg of fuel
    pub co2_per_fuel: f64,
    /// Captured CO2 flow (kg/s) for which the amine design losses below were quoted
    pub amine_design_capture: f64,
    /// Electric power lost at the amine design point (MW)
    pub amine_power_loss: f64,
    /// Condenser heat lost at the amine design point (MW)
    pub amine_heat_loss: f64,
    /// Heat recovered from the capture plant at the amine design point (MW)
    pub amine_heat_recovery: f64,
    /// Flue gas mass per kg of fuel
    pub flue_gas_per_fuel: f64,
    /// Flue gas volume per kg of fuel (Nm³/kg)
    pub flue_gas_volume_per_fuel: f64,
    /// CO2 compression work at the amine design point (MW)
    pub compression_work: f64,
    /// CO2 cooling load at the amine design point (MW)
    pub cooling_load: f64,
    /// Stoichiometric O2 demand (kmol per kg of fuel)
    pub oxygen_demand_per_fuel: f64,
    /// Heat of oxidation of the oxygen carrier (MJ/kmol O2)
    pub oxidation_enthalpy: f64,
    /// H2O generated per kg of fuel
    pub water_per_fuel: f64,
    /// Ash per kg of fuel
    pub ash_per_fuel: f64,
    /// Chemical-looping flue gas volume per kg of fuel (Nm³/kg)
    pub looping_flue_gas_volume_per_fuel: f64,
    /// Superficial gas velocity in the fuel reactor (m/s)
    pub reducer_gas_velocity: f64,
    /// Ratio of reactor area to flue gas cross-section
    pub reducer_area_factor: f64,
}

impl Default for PlantConstants {
    fn default() -> Self {
        Self {
            lower_heating_value: 10.44,
            fuel_input: 174.5,
            net_power: 48.3,
            flue_gas_condensation_heat: 33.3,
            condenser_heat: 106.6,
            co2_per_fuel: 1.0105,
            amine_design_capture: 16.6,
            amine_power_loss: 48.3 - 31.8,
            amine_heat_loss: 106.6 - 73.7,
            amine_heat_recovery: 11.0 + 21.7,
            flue_gas_per_fuel: 4.952,
            flue_gas_volume_per_fuel: 3.982,
            compression_work: 3.5,
            cooling_load: 3.6,
            oxygen_demand_per_fuel: 0.024_045,
            oxidation_enthalpy: 479.0,
            water_per_fuel: 0.7416,
            ash_per_fuel: 0.013_75,
            looping_flue_gas_volume_per_fuel: 2.342 + 4.203,
            reducer_gas_velocity: 5.5,
            reducer_area_factor: 1300.0 / 20.0,
        }
    }
}

impl PlantConstants {
    /// Fuel mass flow of the reference plant
    pub fn fuel_mass_flow(&self) -> MassFlow {
        MassFlow(self.fuel_input / self.lower_heating_value)
    }

    /// CO2 generated by burning the fuel
    pub fn co2_generated(&self) -> MassFlow {
        self.fuel_mass_flow() * self.co2_per_fuel.into()
    }

    /// Net heat of the reference plant
    pub fn net_heat(&self) -> Power {
        Power(self.condenser_heat + self.flue_gas_condensation_heat)
    }

    /// A load quoted at the amine design point, scaled to the given captured flow
    fn scaled_to_capture(&self, load_at_design: f64, captured: MassFlow) -> Power {
        Power(load_at_design / self.amine_design_capture * captured.value())
    }

    /// Power needed to compress and cool the captured CO2
    fn conditioning_load(&self, captured: MassFlow) -> Power {
        self.scaled_to_capture(self.compression_work, captured)
            + self.scaled_to_capture(self.cooling_load, captured)
    }

    /// Power drawn by the ASU to separate the given amount of O2 (kmol/s), with the specific work
    /// given in MJ per tonne O2
    fn air_separation_load(oxygen: f64, specific_work: f64) -> Power {
        Power(specific_work / 1000.0 * oxygen * O2_MOLAR_MASS)
    }
}

/// Operating hours and capture settings shared by all the capture cases
struct CaptureSettings {
    rate: f64,
    operating_hours: Hours,
}

/// Balance of the existing plant
fn reference_balance(plant: &PlantConstants, operating_hours: Hours) -> TechnologyBalance {
    TechnologyBalance {
        kind: TechnologyKind::Reference,
        fuel_input: Power(plant.fuel_input),
        net_heat: plant.net_heat(),
        net_power: Power(plant.net_power),
        emitted: plant.co2_generated(),
        captured: MassFlow(0.0),
        operating_hours,
        auxiliaries: Auxiliaries::None,
    }
}

/// Split the CO2 generated by the fuel into captured and emitted flows
fn split_co2(generated: MassFlow, rate: f64) -> (MassFlow, MassFlow) {
    (generated * rate.into(), generated * (1.0 - rate).into())
}

/// Balance of the plant with amine scrubbing and heat recovery from the capture plant
fn amine_balance(plant: &PlantConstants, settings: &CaptureSettings) -> TechnologyBalance {
    let fuel_mass_flow = plant.fuel_mass_flow().value();
    let (captured, emitted) = split_co2(plant.co2_generated(), settings.rate);

    let net_power = Power(plant.net_power) - plant.scaled_to_capture(plant.amine_power_loss, captured);
    let condenser_heat =
        Power(plant.condenser_heat) - plant.scaled_to_capture(plant.amine_heat_loss, captured);
    let recovered_heat = plant.scaled_to_capture(plant.amine_heat_recovery, captured);

    // Flue-gas condensation is unaffected by the capture plant
    let net_heat = condenser_heat + Power(plant.flue_gas_condensation_heat) + recovered_heat;

    TechnologyBalance {
        kind: TechnologyKind::Amine,
        fuel_input: Power(plant.fuel_input),
        net_heat,
        net_power,
        emitted,
        captured,
        operating_hours: settings.operating_hours,
        auxiliaries: Auxiliaries::Amine {
            flue_gas_mass_flow: MassFlow(plant.flue_gas_per_fuel * fuel_mass_flow),
            flue_gas_volume_flow: plant.flue_gas_volume_per_fuel * fuel_mass_flow,
        },
    }
}

/// Balance of the plant converted to oxyfuel combustion
fn oxyfuel_balance(
    plant: &PlantConstants,
    params: &ModelParameters,
    settings: &CaptureSettings,
) -> TechnologyBalance {
    let oxygen_demand = plant.oxygen_demand_per_fuel * plant.fuel_mass_flow().value();
    let (captured, emitted) = split_co2(plant.co2_generated(), settings.rate);

    let net_power = Power(plant.net_power)
        - PlantConstants::air_separation_load(oxygen_demand, params.asu_specific_work)
        - plant.conditioning_load(captured);

    TechnologyBalance {
        kind: TechnologyKind::Oxyfuel,
        fuel_input: Power(plant.fuel_input),
        net_heat: plant.net_heat(),
        net_power,
        emitted,
        captured,
        operating_hours: settings.operating_hours,
        auxiliaries: Auxiliaries::Oxyfuel { oxygen_demand },
    }
}

/// Balance of the plant converted to chemical-looping combustion.
///
/// Most of the oxygen is delivered by the oxygen carrier; the remainder is supplied by a small
/// ASU to a post-oxidation chamber.
fn looping_balance(
    plant: &PlantConstants,
    params: &ModelParameters,
    settings: &CaptureSettings,
) -> TechnologyBalance {
    let fuel_mass_flow = plant.fuel_mass_flow().value();
    let oxygen_demand = plant.oxygen_demand_per_fuel * fuel_mass_flow;
    let oxygen_carried = oxygen_demand * params.carrier_oxygen_efficiency;
    let oxygen_polishing = oxygen_demand * (1.0 - params.carrier_oxygen_efficiency);

    // Heat released per kmol of O2 consumed, split between the reactors
    let fuel_enthalpy = plant.lower_heating_value / plant.oxygen_demand_per_fuel;
    let reduction_enthalpy = fuel_enthalpy - plant.oxidation_enthalpy;

    let co2 = plant.co2_generated();
    let water = plant.water_per_fuel * fuel_mass_flow;
    let flue_gas_mass_flow = MassFlow(co2.value() + water + oxygen_polishing * O2_MOLAR_MASS);

    let flue_gas_volume = plant.looping_flue_gas_volume_per_fuel * fuel_mass_flow;
    let cross_section = flue_gas_volume / plant.reducer_gas_velocity;

    let (captured, emitted) = split_co2(co2, settings.rate);
    let net_power = Power(plant.net_power)
        - PlantConstants::air_separation_load(oxygen_polishing, params.asu_specific_work)
        - plant.conditioning_load(captured);

    TechnologyBalance {
        kind: TechnologyKind::ChemicalLooping,
        fuel_input: Power(plant.fuel_input),
        net_heat: plant.net_heat(),
        net_power,
        emitted,
        captured,
        operating_hours: settings.operating_hours,
        auxiliaries: Auxiliaries::ChemicalLooping(LoopingAuxiliaries {
            oxygen_carried,
            oxygen_polishing,
            flue_gas_mass_flow,
            ash_mass_flow: MassFlow(plant.ash_per_fuel * fuel_mass_flow),
            reducer_area: plant.reducer_area_factor * cross_section,
            air_reactor_heat: Power(plant.oxidation_enthalpy * oxygen_carried),
            fuel_reactor_heat: Power(reduction_enthalpy * oxygen_carried),
            post_oxidation_heat: Power(fuel_enthalpy * oxygen_polishing),
        }),
    }
}

/// Calculate the energy and mass balances of all four technologies.
///
/// The reference plant always runs for the nominal operating hours; the capture technologies
/// have them shifted by the operating-hours regime and lever.
pub fn calculate_balances(
    plant: &PlantConstants,
    params: &ModelParameters,
) -> TechnologyMap<TechnologyBalance> {
    let settings = CaptureSettings {
        rate: params.capture_rate,
        operating_hours: Hours(params.operating_hours + params.operating_hours_adjustment()),
    };

    [
        reference_balance(plant, Hours(params.operating_hours)),
        amine_balance(plant, &settings),
        oxyfuel_balance(plant, params, &settings),
        looping_balance(plant, params, &settings),
    ]
    .into_iter()
    .map(|balance| (balance.kind, balance))
    .collect()
}
