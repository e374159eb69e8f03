//! Capital cost estimates for the capture technologies.
//!
//! Bare-equipment costs of each item are scaled from literature correlations to the size of the
//! plant and escalated to the present with the CEPCI. The bare costs are then turned into total
//! capital requirements by applying a fixed chain of markups, each one compounding on the last.
use crate::model::ModelParameters;
use crate::technology::{Auxiliaries, CostedTechnology, TechnologyBalance, TechnologyKind};
use crate::units::{Dimensionless, MassFlow, Money};
use indexmap::IndexMap;
use std::fmt;

/// Pounds per kilogram
const LB_PER_KG: f64 = 1000.0 / 453.592;

/// An item of equipment which appears in the cost estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostItem {
    /// Fuel reactor of the chemical-looping unit
    FuelReactor,
    /// Cyclones separating the oxygen carrier from the gas
    Cyclone,
    /// Post-oxidation chamber burning unconverted gases
    PostOxidationChamber,
    /// Cryogenic air separation unit
    AirSeparationUnit,
    /// Oxygen carrier and ash handling
    OxygenCarrierAsh,
    /// CO2 compression and liquefaction
    CompressionLiquefaction,
    /// Interim CO2 storage at the plant
    InterimStorage,
    /// Complete amine capture plant
    AminePlant,
}

impl CostItem {
    /// The short name of the item used in output files
    pub fn id(self) -> &'static str {
        match self {
            Self::FuelReactor => "FR",
            Self::Cyclone => "cyclone",
            Self::PostOxidationChamber => "POC",
            Self::AirSeparationUnit => "ASU",
            Self::OxygenCarrierAsh => "OCash",
            Self::CompressionLiquefaction => "CL",
            Self::InterimStorage => "interim",
            Self::AminePlant => "amines",
        }
    }
}

impl fmt::Display for CostItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// When the capital for an item is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tranche {
    /// Spent in the first two years: core equipment which is not yet commercially mature
    Initial,
    /// Spent at the investment milestone
    Delayed,
}

impl Tranche {
    /// Name used in output files
    pub fn id(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Delayed => "delayed",
        }
    }
}

/// The tranche which an item of a given technology belongs to
pub fn tranche(kind: TechnologyKind, item: CostItem) -> Tranche {
    match (kind, item) {
        (
            TechnologyKind::ChemicalLooping,
            CostItem::CompressionLiquefaction | CostItem::InterimStorage,
        ) => Tranche::Delayed,
        (TechnologyKind::ChemicalLooping, _) => Tranche::Initial,
        _ => Tranche::Delayed,
    }
}

/// Fractional markups applied to bare-equipment costs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscalationRates {
    /// Engineering, procurement and construction
    pub epc: f64,
    /// Process and project contingency
    pub contingency: f64,
    /// Owner's costs
    pub owner_cost: f64,
    /// First-of-a-kind markup for immature technology
    pub immaturity: f64,
    /// Schedule and budget overrun
    pub overrun: f64,
}

impl EscalationRates {
    /// Take the escalation rates from the model parameters
    pub fn from_parameters(params: &ModelParameters) -> Self {
        Self {
            epc: params.epc,
            contingency: params.contingency,
            owner_cost: params.owner_cost,
            immaturity: params.immaturity,
            overrun: params.overrun,
        }
    }

    /// The markups applied to a tranche, in the order they compound
    pub fn chain(&self, tranche: Tranche) -> Vec<f64> {
        match tranche {
            Tranche::Initial => vec![
                self.epc,
                self.contingency,
                self.owner_cost,
                self.immaturity,
                self.overrun,
            ],
            Tranche::Delayed => vec![self.epc, self.contingency, self.owner_cost, self.overrun],
        }
    }
}

/// Apply each markup in turn, so that every markup also applies to the previous ones
pub fn escalate(bare_cost: Money, markups: &[f64]) -> Money {
    markups
        .iter()
        .fold(bare_cost, |cost, rate| cost * Dimensionless(1.0 + rate))
}

/// Convert a cost from a correlation to present-day MEUR
///
/// # Arguments
///
/// * `cost` - Cost in the correlation's currency
/// * `exchange_rate` - EUR per unit of the correlation's currency
/// * `cepci_base` - The CEPCI of the correlation's cost year
/// * `installation_factor` - Ratio of installed to purchased cost
fn to_present(
    cost: f64,
    params: &ModelParameters,
    exchange_rate: f64,
    cepci_base: f64,
    installation_factor: f64,
) -> Money {
    Money(cost * exchange_rate * params.cepci / cepci_base * installation_factor)
}

/// Cost of an ASU producing the given amount of O2 (kmol/s)
fn air_separation_unit(oxygen: f64, params: &ModelParameters) -> Money {
    let oxygen_lbmol_per_hour = oxygen * LB_PER_KG * 3600.0;
    let cost = 0.02 * 59.0_f64.powf(0.067) / (1.0 - 0.95_f64).powf(0.073)
        * oxygen_lbmol_per_hour.powf(params.asu_cost_exponent);
    to_present(cost, params, params.usd, 499.6, 1.3)
}

/// Cost of compressing and liquefying the captured CO2
fn compression_liquefaction(captured: MassFlow, params: &ModelParameters) -> Money {
    to_present(25.5 * captured.value() / 37.31, params, 1.0, 607.5, 1.3)
}

/// Cost of a 4000 m³ interim CO2 storage
fn interim_storage(params: &ModelParameters) -> Money {
    let cost = (53_000.0 + 2400.0 * 4000.0_f64.powf(0.6)) * 1e-6;
    to_present(cost, params, params.usd, 499.6, 1.2)
}

/// The bare-equipment cost of every item making up a technology
fn bare_costs(balance: &TechnologyBalance, params: &ModelParameters) -> IndexMap<CostItem, Money> {
    match balance.auxiliaries {
        Auxiliaries::None => IndexMap::new(),
        Auxiliaries::Amine { .. } => IndexMap::from([(
            CostItem::AminePlant,
            Money(params.amine_cost * params.sek * balance.captured.value() / 16.6),
        )]),
        Auxiliaries::Oxyfuel { oxygen_demand } => IndexMap::from([
            (
                CostItem::AirSeparationUnit,
                air_separation_unit(oxygen_demand, params),
            ),
            (
                CostItem::CompressionLiquefaction,
                compression_liquefaction(balance.captured, params),
            ),
            (CostItem::InterimStorage, interim_storage(params)),
        ]),
        Auxiliaries::ChemicalLooping(aux) => {
            let reactor = 4.98 * (aux.reducer_area / 1531.0).powf(params.reactor_cost_exponent);
            let cyclone = 0.345 * 3.0;
            let post_oxidation = 48.67e-6
                * aux.flue_gas_mass_flow.value()
                * (1.0 + (0.018_f64 * (850.0 + 273.15) - 26.4).exp())
                / (0.995 - 0.98);
            let carrier_ash = 4.6 * (aux.ash_mass_flow.value() / 6.7).powf(0.56);

            IndexMap::from([
                (
                    CostItem::FuelReactor,
                    to_present(reactor, params, params.usd, 585.7, 1.4),
                ),
                (
                    CostItem::Cyclone,
                    to_present(cyclone, params, params.usd, 576.1, 1.4),
                ),
                (
                    CostItem::PostOxidationChamber,
                    to_present(post_oxidation, params, params.usd, 585.7, 1.3),
                ),
                (
                    CostItem::AirSeparationUnit,
                    air_separation_unit(aux.oxygen_polishing, params),
                ),
                (
                    CostItem::OxygenCarrierAsh,
                    to_present(carrier_ash, params, params.usd, 603.1, 1.2),
                ),
                (
                    CostItem::CompressionLiquefaction,
                    compression_liquefaction(balance.captured, params),
                ),
                (CostItem::InterimStorage, interim_storage(params)),
            ])
        }
    }
}

/// Sum the bare costs of the items in the given tranche
fn tranche_cost(kind: TechnologyKind, costs: &IndexMap<CostItem, Money>, of: Tranche) -> Money {
    costs
        .iter()
        .filter(|(item, _)| tranche(kind, **item) == of)
        .map(|(_, cost)| *cost)
        .sum()
}

/// Estimate the capital costs of a technology.
///
/// The amine plant cost is a turnkey estimate, so only the overrun markup is applied to it.
/// The reference plant needs no investment.
pub fn cost_technology(balance: TechnologyBalance, params: &ModelParameters) -> CostedTechnology {
    let rates = EscalationRates::from_parameters(params);
    let bare_costs = bare_costs(&balance, params);

    let (initial_capex, capex) = match balance.kind {
        TechnologyKind::Reference => (None, None),
        TechnologyKind::Amine => {
            let bare = bare_costs.values().copied().sum();
            (None, Some(escalate(bare, &[rates.overrun])))
        }
        TechnologyKind::Oxyfuel => {
            let bare = bare_costs.values().copied().sum();
            (None, Some(escalate(bare, &rates.chain(Tranche::Delayed))))
        }
        TechnologyKind::ChemicalLooping => {
            let initial = tranche_cost(balance.kind, &bare_costs, Tranche::Initial);
            let delayed = tranche_cost(balance.kind, &bare_costs, Tranche::Delayed);
            (
                Some(escalate(initial, &rates.chain(Tranche::Initial))),
                Some(escalate(delayed, &rates.chain(Tranche::Delayed))),
            )
        }
    };

    CostedTechnology {
        balance,
        bare_costs,
        initial_capex,
        capex,
    }
}
