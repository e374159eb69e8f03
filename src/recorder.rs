//! Hooks for observing the intermediate results of a model evaluation.
//!
//! The model reports each stage of an evaluation to a [`Recorder`]. Recorders never influence the
//! outcome of an evaluation.
use crate::cycle::NominalCycle;
use crate::simulation::YearCashFlow;
use crate::technology::{CostedTechnology, TechnologyBalance, TechnologyKind};
use log::{debug, trace};

/// Receives the intermediate results of a model evaluation.
///
/// All methods do nothing by default.
pub trait Recorder {
    /// Called with the nominal steam cycle, if one is estimated
    fn record_cycle(&mut self, _cycle: &NominalCycle) {}

    /// Called with the balance of each technology
    fn record_balance(&mut self, _balance: &TechnologyBalance) {}

    /// Called with the capital costs of each technology
    fn record_costs(&mut self, _technology: &CostedTechnology) {}

    /// Called with the yearly cash flows of each technology
    fn record_cash_flows(
        &mut self,
        _kind: TechnologyKind,
        _cash_flows: &[YearCashFlow],
        _discount_rate: f64,
    ) {
    }
}

/// A recorder which ignores everything
#[derive(Debug, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {}

/// A recorder which writes everything to the program log
#[derive(Debug, Default)]
pub struct LogRecorder;

impl Recorder for LogRecorder {
    fn record_cycle(&mut self, cycle: &NominalCycle) {
        debug!(
            "Nominal cycle: condenser at {:.2} bar after {} iterations, steam flow {:.2} kg/s, \
            heat {:.2} MW, power {:.2} MW",
            cycle.condenser_pressure,
            cycle.iterations,
            cycle.steam_mass_flow.value(),
            cycle.heat.value(),
            cycle.power.value()
        );
        trace!("Cycle states: {:?}", cycle.states);
    }

    fn record_balance(&mut self, balance: &TechnologyBalance) {
        debug!(
            "{}: heat {:.2} MW, power {:.2} MW, captured {:.2} kg/s, emitted {:.2} kg/s, {} h/yr",
            balance.kind,
            balance.net_heat.value(),
            balance.net_power.value(),
            balance.captured.value(),
            balance.emitted.value(),
            balance.operating_hours.value()
        );
        trace!("{} auxiliaries: {:?}", balance.kind, balance.auxiliaries);
    }

    fn record_costs(&mut self, technology: &CostedTechnology) {
        for (item, cost) in &technology.bare_costs {
            trace!("{} {item}: {:.3} MEUR", technology.kind(), cost.value());
        }
        debug!(
            "{}: capex {:.2} MEUR",
            technology.kind(),
            technology.total_capex().value()
        );
    }

    fn record_cash_flows(
        &mut self,
        kind: TechnologyKind,
        cash_flows: &[YearCashFlow],
        _discount_rate: f64,
    ) {
        for flow in cash_flows {
            trace!(
                "{kind} year {} ({}): net {:.3} MEUR, carbon price {:.1}, credit price {:.1} \
                + {:.1} subsidy",
                flow.year,
                flow.phase.id(),
                flow.net().value(),
                flow.carbon_price,
                flow.credit_price,
                flow.auction_subsidy
            );
        }
    }
}

/// Yearly cash flows of one technology as reported to a [`CollectingRecorder`]
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowRecord {
    /// The technology
    pub kind: TechnologyKind,
    /// Discount rate used to reduce the cash flows to an NPV
    pub discount_rate: f64,
    /// The cash flows
    pub cash_flows: Vec<YearCashFlow>,
}

/// A recorder which keeps everything it is given, for writing to debug files
#[derive(Debug, Default)]
pub struct CollectingRecorder {
    /// Balances in the order they were reported
    pub balances: Vec<TechnologyBalance>,
    /// Capital costs in the order they were reported
    pub costs: Vec<CostedTechnology>,
    /// Cash flows in the order they were reported
    pub cash_flows: Vec<CashFlowRecord>,
}

impl Recorder for CollectingRecorder {
    fn record_balance(&mut self, balance: &TechnologyBalance) {
        self.balances.push(*balance);
    }

    fn record_costs(&mut self, technology: &CostedTechnology) {
        self.costs.push(technology.clone());
    }

    fn record_cash_flows(
        &mut self,
        kind: TechnologyKind,
        cash_flows: &[YearCashFlow],
        discount_rate: f64,
    ) {
        self.cash_flows.push(CashFlowRecord {
            kind,
            discount_rate,
            cash_flows: cash_flows.to_vec(),
        });
    }
}
