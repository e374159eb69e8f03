//! The conversion technologies which can be retrofitted to the CHP plant.
//!
//! A technology is built up in stages: its energy and mass balance ([`TechnologyBalance`]) is
//! computed first and is then extended with capital costs ([`CostedTechnology`]). Both stages are
//! plain values which are not changed after construction.
use crate::cost::CostItem;
use crate::units::{Dimensionless, Hours, MassFlow, Money, Power};
use indexmap::IndexMap;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use strum::{EnumCount, EnumIter};

/// The candidate technologies
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumCount,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum TechnologyKind {
    /// The existing plant without carbon capture
    #[string = "ref"]
    Reference,
    /// Post-combustion capture by amine scrubbing
    #[string = "amine"]
    Amine,
    /// Oxyfuel combustion with an air separation unit
    #[string = "oxy"]
    Oxyfuel,
    /// Chemical-looping combustion
    #[string = "clc"]
    ChemicalLooping,
}

/// One value per technology, in [`TechnologyKind`] order
pub type TechnologyMap<T> = IndexMap<TechnologyKind, T>;

/// Auxiliary quantities needed to size the chemical-looping equipment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopingAuxiliaries {
    /// Oxygen carried by the oxygen carrier (kmol/s)
    pub oxygen_carried: f64,
    /// Oxygen supplied by the ASU to the post-oxidation chamber (kmol/s)
    pub oxygen_polishing: f64,
    /// Gas mass flow through the post-oxidation chamber (kg/s)
    pub flue_gas_mass_flow: MassFlow,
    /// Ash mass flow (kg/s)
    pub ash_mass_flow: MassFlow,
    /// Fuel reactor cross-sectional area scaled from the flue gas velocity (m²)
    pub reducer_area: f64,
    /// Heat released in the air reactor
    pub air_reactor_heat: Power,
    /// Heat released (or absorbed, if negative) in the fuel reactor
    pub fuel_reactor_heat: Power,
    /// Heat released in the post-oxidation chamber
    pub post_oxidation_heat: Power,
}

/// Technology-specific quantities retained for the cost calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Auxiliaries {
    /// Nothing beyond the common balance
    None,
    /// Amine scrubbing of the flue gas
    Amine {
        /// Flue gas mass flow (kg/s)
        flue_gas_mass_flow: MassFlow,
        /// Flue gas volume flow (Nm³/s)
        flue_gas_volume_flow: f64,
    },
    /// Oxyfuel combustion
    Oxyfuel {
        /// Oxygen supplied by the ASU (kmol/s)
        oxygen_demand: f64,
    },
    /// Chemical-looping combustion
    ChemicalLooping(LoopingAuxiliaries),
}

/// The steady-state energy and mass balance of one technology
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnologyBalance {
    /// Which technology this is
    pub kind: TechnologyKind,
    /// Fuel heat input
    pub fuel_input: Power,
    /// Net usable heat output
    pub net_heat: Power,
    /// Net electric power
    pub net_power: Power,
    /// CO2 emitted to the atmosphere
    pub emitted: MassFlow,
    /// CO2 captured
    pub captured: MassFlow,
    /// Annual operating hours
    pub operating_hours: Hours,
    /// Technology-specific quantities
    pub auxiliaries: Auxiliaries,
}

impl TechnologyBalance {
    /// Total CO2 generated by the fuel, whether captured or not
    pub fn generated(&self) -> MassFlow {
        self.emitted + self.captured
    }

    /// Net heat and power divided by fuel heat input (LHV basis, so may exceed one)
    pub fn efficiency(&self) -> Dimensionless {
        (self.net_heat + self.net_power) / self.fuel_input
    }
}

/// A technology with its itemised and escalated capital costs
#[derive(Debug, Clone, PartialEq)]
pub struct CostedTechnology {
    /// The energy and mass balance
    pub balance: TechnologyBalance,
    /// Bare-equipment cost per item
    pub bare_costs: IndexMap<CostItem, Money>,
    /// Capital spent over the first two years, before operation starts
    pub initial_capex: Option<Money>,
    /// Capital spent over the two years starting at the investment milestone
    pub capex: Option<Money>,
}

impl CostedTechnology {
    /// Which technology this is
    pub fn kind(&self) -> TechnologyKind {
        self.balance.kind
    }

    /// Sum of both capital tranches (absent tranches count as zero)
    pub fn total_capex(&self) -> Money {
        self.initial_capex.unwrap_or_default() + self.capex.unwrap_or_default()
    }
}
