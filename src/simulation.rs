//! Year-by-year cash flow simulation of a technology choice.
//!
//! Until the investment milestone every technology runs as the existing plant. Capital is spent
//! in two halves: the initial tranche over the first two years and the steady-state tranche over
//! the milestone year and the year after. From then on the plant runs with the technology's own
//! balance, paying for CO2 transport and storage and earning removal credits.
use crate::error::{ModelError, ModelResult};
use crate::finance::net_present_value;
use crate::model::ModelParameters;
use crate::technology::{CostedTechnology, TechnologyBalance, TechnologyKind};
use crate::units::{Dimensionless, Money};

pub mod policy;
use policy::{PolicyRules, PolicyState};

/// Number of years over which each capital tranche is spent
pub const CONSTRUCTION_YEARS: u32 = 2;

/// Amine solvent lost per tonne of captured CO2 (kg/t)
const SOLVENT_MAKEUP: f64 = 1.5;

/// Oxygen carrier replaced per MWh of fuel (t/MWh)
const CARRIER_MAKEUP: f64 = 1e-3;

/// Which balance the plant runs with in a given year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Running as the existing plant
    Reference,
    /// Running with the new technology
    Operating,
}

impl Phase {
    /// Name used in output files
    pub fn id(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Operating => "operating",
        }
    }
}

/// The costs and revenues of one simulated year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearCashFlow {
    /// Year counted from the start of the simulation (starting at 1)
    pub year: u32,
    /// Which balance the plant ran with
    pub phase: Phase,
    /// Capital spent this year
    pub capital_cost: Money,
    /// Fuel, transport, storage and consumable costs
    pub operating_cost: Money,
    /// Sales of heat, power and removal credits
    pub revenue: Money,
    /// Emission allowance price in this year (EUR/t)
    pub carbon_price: f64,
    /// Removal credit price set by policy in this year (EUR/t)
    pub credit_price: f64,
    /// Auction subsidy received per tonne captured in this year (EUR/t)
    pub auction_subsidy: f64,
}

impl YearCashFlow {
    /// Revenue minus all costs
    pub fn net(&self) -> Money {
        self.revenue - self.capital_cost - self.operating_cost
    }
}

/// Costs and revenues of running the plant with the given balance
fn plant_operation(balance: &TechnologyBalance, prices: &PolicyState, heat_value: f64) -> (Money, Money) {
    let hours = balance.operating_hours;
    let fuel_cost = (balance.fuel_input * hours).priced_at(prices.biomass_price);
    let revenue = (balance.net_heat * hours).priced_at(heat_value * prices.electricity_price)
        + (balance.net_power * hours).priced_at(prices.electricity_price);

    (fuel_cost, revenue)
}

/// Costs and revenues associated with the captured CO2
fn capture_operation(
    balance: &TechnologyBalance,
    params: &ModelParameters,
    credit_price: f64,
) -> (Money, Money) {
    let captured = balance.captured.over(balance.operating_hours);
    let mut cost = captured.priced_at((params.transport_cost + params.storage_cost) * params.sek);
    let revenue = captured.priced_at(credit_price);

    match balance.kind {
        TechnologyKind::Amine => {
            cost += captured.priced_at(params.solvent_cost * params.sek * SOLVENT_MAKEUP);
        }
        TechnologyKind::ChemicalLooping => {
            let fuel = balance.fuel_input * balance.operating_hours;
            cost += fuel.priced_at(CARRIER_MAKEUP * params.carrier_cost);
        }
        TechnologyKind::Reference | TechnologyKind::Oxyfuel => {}
    }

    (cost, revenue)
}

/// Simulate the yearly cash flows of choosing the given technology.
///
/// The simulation runs from year 1 up to, but not including, `timing + lifetime`. Prices start
/// from the parameter values on every call, so different technologies never see each other's
/// price trajectories. A technology without capital costs keeps running as the existing plant.
///
/// # Arguments
///
/// * `technology` - The technology chosen
/// * `reference` - Balance of the existing plant, used before the technology is in operation
/// * `params` - Model parameters
/// * `rules` - Constants of the price shocks and support schemes
///
/// # Returns
///
/// One cash flow per year, or [`ModelError::ParameterRange`] if the simulated period does not
/// fit in a count of years
pub fn simulate_cash_flows(
    technology: &CostedTechnology,
    reference: &TechnologyBalance,
    params: &ModelParameters,
    rules: &PolicyRules,
) -> ModelResult<Vec<YearCashFlow>> {
    let out_of_range = || {
        ModelError::parameter_range(
            "timing",
            format!(
                "timing {} and lifetime {} overflow the simulated period",
                params.timing, params.lifetime
            ),
        )
    };
    let horizon = params
        .timing
        .checked_add(params.lifetime)
        .ok_or_else(out_of_range)?;
    let operation_start = params
        .timing
        .checked_add(CONSTRUCTION_YEARS)
        .ok_or_else(out_of_range)?;
    let retrofitted = technology.initial_capex.is_some() || technology.capex.is_some();
    let mut prices = PolicyState::initial(params);
    let mut invested = false;

    let cash_flows = (1..horizon)
        .map(|year| {
            prices.advance(year, params, rules);

            let mut capital_cost = Money(0.0);
            if year <= CONSTRUCTION_YEARS {
                if let Some(initial) = technology.initial_capex {
                    capital_cost += initial / Dimensionless(f64::from(CONSTRUCTION_YEARS));
                }
            }
            if retrofitted && (params.timing..operation_start).contains(&year) {
                invested = true;
                capital_cost +=
                    technology.capex.unwrap_or_default() / Dimensionless(f64::from(CONSTRUCTION_YEARS));
            }

            let (phase, operating_cost, revenue, auction_subsidy) =
                if invested && year >= operation_start {
                    let subsidy = rules.auction_subsidy(year, params, operation_start);
                    let (fuel_cost, sales) =
                        plant_operation(&technology.balance, &prices, params.heat_value);
                    let (capture_cost, credits) = capture_operation(
                        &technology.balance,
                        params,
                        prices.credit_price + subsidy,
                    );
                    (
                        Phase::Operating,
                        fuel_cost + capture_cost,
                        sales + credits,
                        subsidy,
                    )
                } else {
                    let (fuel_cost, sales) = plant_operation(reference, &prices, params.heat_value);
                    (Phase::Reference, fuel_cost, sales, 0.0)
                };

            YearCashFlow {
                year,
                phase,
                capital_cost,
                operating_cost,
                revenue,
                carbon_price: prices.carbon_price,
                credit_price: prices.credit_price,
                auction_subsidy,
            }
        })
        .collect();

    Ok(cash_flows)
}

/// Discount a series of yearly cash flows to a net present value
pub fn npv_of(cash_flows: &[YearCashFlow], discount_rate: f64) -> Money {
    net_present_value(
        Dimensionless(discount_rate),
        cash_flows.iter().map(|flow| (flow.year, flow.net())),
    )
}
