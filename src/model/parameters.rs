//! Defines the `ModelParameters` struct, which holds one scenario: every uncertain quantity and
//! every decision lever of the model.
//!
//! The base scenario is read from the `[parameters]` section of `model.toml`. Experiments override
//! it with flat [`ParameterSet`]s keyed by the same names.
use crate::error::{ModelError, ModelResult};
use crate::technology::TechnologyKind;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::fmt::Display;
use std::str::FromStr;

/// Hours in a year
const HOURS_PER_YEAR: f64 = 8760.0;

/// Columns written by experiment generators which are not model parameters
const BOOKKEEPING_KEYS: [&str; 3] = ["scenario", "policy", "model"];

/// A flat set of parameter overrides, as found in one row of an experiments file
pub type ParameterSet = IndexMap<String, String>;

/// How many hours a year the capture technologies run, relative to the existing plant
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum TimeRegime {
    /// Same operating hours as the existing plant
    #[default]
    #[string = "Baseline"]
    Baseline,
    /// More maintenance and outages
    #[string = "Downtime"]
    Downtime,
    /// Longer operating season
    #[string = "Uptime"]
    Uptime,
}

impl TimeRegime {
    /// Change in yearly operating hours (h)
    pub fn offset(self) -> f64 {
        match self {
            Self::Baseline => 0.0,
            Self::Downtime => -1500.0,
            Self::Uptime => 1500.0,
        }
    }
}

/// One scenario of the model.
///
/// Field names in parameter files follow the column names used by the experiment generators.
/// Prices are in EUR unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParameters {
    /// Fraction of the O2 demand of chemical looping supplied by the oxygen carrier
    #[serde(rename = "O2eff")]
    pub carrier_oxygen_efficiency: f64,
    /// Specific work of the air separation unit (MJ per tonne O2)
    #[serde(rename = "Wasu")]
    pub asu_specific_work: f64,
    /// Yearly operating hours of the existing plant (h)
    #[serde(rename = "operating")]
    pub operating_hours: f64,
    /// Discount rate
    #[serde(rename = "dr")]
    pub discount_rate: f64,
    /// Economic lifetime of the retrofit (years)
    pub lifetime: u32,
    /// Electricity price (EUR/MWh)
    #[serde(rename = "celc")]
    pub electricity_price: f64,
    /// Value of heat relative to electricity
    #[serde(rename = "cheat")]
    pub heat_value: f64,
    /// Biomass price (EUR/MWh)
    #[serde(rename = "cbio")]
    pub biomass_price: f64,
    /// Chemical engineering plant cost index of the cost year
    #[serde(rename = "CEPCI")]
    pub cepci: f64,
    /// EUR per SEK
    pub sek: f64,
    /// EUR per USD
    pub usd: f64,
    /// CO2 transport cost (SEK/t)
    #[serde(rename = "ctrans")]
    pub transport_cost: f64,
    /// CO2 storage cost (SEK/t)
    #[serde(rename = "cstore")]
    pub storage_cost: f64,
    /// Initial price of removal credits (EUR/t)
    #[serde(rename = "crc")]
    pub credit_price: f64,
    /// MEA solvent price (SEK/kg)
    #[serde(rename = "cmea")]
    pub solvent_cost: f64,
    /// Oxygen carrier price (EUR/t)
    #[serde(rename = "coc")]
    pub carrier_cost: f64,
    /// Turnkey cost of the amine plant at the design capture rate (MSEK)
    #[serde(rename = "cAM")]
    pub amine_cost: f64,
    /// Scaling exponent of the fuel reactor cost
    #[serde(rename = "cFR")]
    pub reactor_cost_exponent: f64,
    /// Scaling exponent of the ASU cost
    #[serde(rename = "cASU")]
    pub asu_cost_exponent: f64,
    /// Engineering, procurement and construction markup
    #[serde(rename = "EPC")]
    pub epc: f64,
    /// Contingency markup
    #[serde(rename = "contingencies")]
    pub contingency: f64,
    /// Owner's cost markup
    #[serde(rename = "ownercost")]
    pub owner_cost: f64,
    /// Overrun markup
    pub overrun: f64,
    /// Markup for immature technology
    #[serde(rename = "immature")]
    pub immaturity: f64,
    /// Yearly increase of the carbon price under market integration (EUR/t)
    #[serde(rename = "EUA")]
    pub carbon_price_increment: f64,
    /// Carbon price ceiling (EUR/t)
    #[serde(rename = "ceiling")]
    pub carbon_price_ceiling: f64,
    /// Initial carbon price (EUR/t)
    #[serde(rename = "ETS")]
    pub carbon_price: f64,
    /// Whether biomass prices rise during the first decade
    #[serde(rename = "Bioshortage")]
    pub bio_shortage: bool,
    /// Whether electricity prices rise during the first years
    #[serde(rename = "Powersurge")]
    pub power_surge: bool,
    /// Whether removal credits are auctioned with a subsidy
    #[serde(rename = "Auction")]
    pub auction: bool,
    /// Whether removal credits are integrated into the emissions trading market
    #[serde(rename = "Integration")]
    pub integration: bool,
    /// Whether the carbon price is capped at the ceiling
    #[serde(rename = "Capping")]
    pub capping: bool,
    /// Whether the state procures removals at the ceiling price
    #[serde(rename = "Procurement")]
    pub procurement: bool,
    /// Operating-hours regime of the capture technologies
    #[serde(rename = "Time")]
    pub time_regime: TimeRegime,
    /// The technology chosen
    pub decision: TechnologyKind,
    /// Fraction of the generated CO2 which is captured
    #[serde(rename = "rate")]
    pub capture_rate: f64,
    /// Year of the investment milestone
    pub timing: u32,
    /// Extra yearly operating hours of the capture technologies (h)
    pub operating_increase: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            carrier_oxygen_efficiency: 0.90,
            asu_specific_work: 828.0,
            operating_hours: 4500.0,
            discount_rate: 0.075,
            lifetime: 25,
            electricity_price: 40.0,
            heat_value: 0.80,
            biomass_price: 25.0,
            cepci: 800.0,
            sek: 0.089,
            usd: 0.96,
            transport_cost: 600.0,
            storage_cost: 300.0,
            credit_price: 200.0,
            solvent_cost: 29.0,
            carrier_cost: 500.0,
            amine_cost: 2154.0,
            reactor_cost_exponent: 0.6,
            asu_cost_exponent: 0.852,
            epc: 0.175,
            contingency: 0.25,
            owner_cost: 0.05,
            overrun: 0.30,
            immaturity: 0.50,
            carbon_price_increment: 10.0,
            carbon_price_ceiling: 250.0,
            carbon_price: 80.0,
            bio_shortage: false,
            power_surge: false,
            auction: false,
            integration: true,
            capping: true,
            procurement: true,
            time_regime: TimeRegime::Baseline,
            decision: TechnologyKind::Amine,
            capture_rate: 0.90,
            timing: 10,
            operating_increase: 0.0,
        }
    }
}

/// Parse a real-valued parameter
fn parse_real(name: &str, value: &str) -> ModelResult<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| ModelError::parameter_range(name, format!("`{value}` is not a number")))
}

/// Parse a count of years. Whole numbers written as reals (e.g. `10.0`) are accepted.
fn parse_years(name: &str, value: &str) -> ModelResult<u32> {
    let real = parse_real(name, value)?;
    if real.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&real) {
        return Err(ModelError::parameter_range(
            name,
            format!("`{value}` is not a whole number of years"),
        ));
    }

    // Range and integrality checked above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(real as u32)
}

/// Parse one of the labels of an enumerated parameter. Labels are matched ignoring case.
fn parse_label<T>(name: &str, value: &str) -> ModelResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| ModelError::parameter_range(name, format!("{err}")))
}

/// Parse a flag. Accepts `true`/`false` in any case and `1`/`0`.
fn parse_flag(name: &str, value: &str) -> ModelResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ModelError::parameter_range(
            name,
            format!("`{value}` is not true or false"),
        )),
    }
}

impl ModelParameters {
    /// Yearly operating hours of the capture technologies relative to the existing plant (h)
    pub fn operating_hours_adjustment(&self) -> f64 {
        self.time_regime.offset() + self.operating_increase
    }

    /// Set a single parameter from its string representation.
    ///
    /// # Arguments
    ///
    /// * `name` - The parameter name as used in parameter files
    /// * `value` - The new value
    ///
    /// # Returns
    ///
    /// A [`ModelError::ParameterRange`] if the name is unknown or the value cannot be parsed.
    /// Bookkeeping columns of experiment files are accepted and ignored.
    pub fn set(&mut self, name: &str, value: &str) -> ModelResult<()> {
        let value = value.trim();
        match name {
            "O2eff" => self.carrier_oxygen_efficiency = parse_real(name, value)?,
            "Wasu" => self.asu_specific_work = parse_real(name, value)?,
            "operating" => self.operating_hours = parse_real(name, value)?,
            "dr" => self.discount_rate = parse_real(name, value)?,
            "lifetime" => self.lifetime = parse_years(name, value)?,
            "celc" => self.electricity_price = parse_real(name, value)?,
            "cheat" => self.heat_value = parse_real(name, value)?,
            "cbio" => self.biomass_price = parse_real(name, value)?,
            "CEPCI" => self.cepci = parse_real(name, value)?,
            "sek" => self.sek = parse_real(name, value)?,
            "usd" => self.usd = parse_real(name, value)?,
            "ctrans" => self.transport_cost = parse_real(name, value)?,
            "cstore" => self.storage_cost = parse_real(name, value)?,
            "crc" => self.credit_price = parse_real(name, value)?,
            "cmea" => self.solvent_cost = parse_real(name, value)?,
            "coc" => self.carrier_cost = parse_real(name, value)?,
            "cAM" => self.amine_cost = parse_real(name, value)?,
            "cFR" => self.reactor_cost_exponent = parse_real(name, value)?,
            "cASU" => self.asu_cost_exponent = parse_real(name, value)?,
            "EPC" => self.epc = parse_real(name, value)?,
            "contingencies" => self.contingency = parse_real(name, value)?,
            "ownercost" => self.owner_cost = parse_real(name, value)?,
            "overrun" => self.overrun = parse_real(name, value)?,
            "immature" => self.immaturity = parse_real(name, value)?,
            "EUA" => self.carbon_price_increment = parse_real(name, value)?,
            "ceiling" => self.carbon_price_ceiling = parse_real(name, value)?,
            "ETS" => self.carbon_price = parse_real(name, value)?,
            "Bioshortage" => self.bio_shortage = parse_flag(name, value)?,
            "Powersurge" => self.power_surge = parse_flag(name, value)?,
            "Auction" => self.auction = parse_flag(name, value)?,
            "Integration" => self.integration = parse_flag(name, value)?,
            "Capping" => self.capping = parse_flag(name, value)?,
            "Procurement" => self.procurement = parse_flag(name, value)?,
            "Time" => self.time_regime = parse_label(name, value)?,
            "decision" => self.decision = parse_label(name, value)?,
            "rate" => self.capture_rate = parse_real(name, value)?,
            "timing" => self.timing = parse_years(name, value)?,
            "operating_increase" => self.operating_increase = parse_real(name, value)?,
            _ if BOOKKEEPING_KEYS.contains(&name) => {}
            _ => return Err(ModelError::parameter_range(name, "unknown parameter")),
        }

        Ok(())
    }

    /// A copy of these parameters with the given overrides applied
    pub fn with_overrides(&self, overrides: &ParameterSet) -> ModelResult<Self> {
        let mut params = self.clone();
        for (name, value) in overrides {
            params.set(name, value)?;
        }

        Ok(params)
    }

    /// Check that the numeric parameters are within their valid ranges
    pub fn validate(&self) -> Result<()> {
        check_proportion("rate", self.capture_rate)?;
        check_proportion("O2eff", self.carrier_oxygen_efficiency)?;

        for (name, value) in [
            ("EPC", self.epc),
            ("contingencies", self.contingency),
            ("ownercost", self.owner_cost),
            ("overrun", self.overrun),
            ("immature", self.immaturity),
        ] {
            check_non_negative(name, value)?;
        }

        for (name, value) in [
            ("celc", self.electricity_price),
            ("cheat", self.heat_value),
            ("cbio", self.biomass_price),
            ("ctrans", self.transport_cost),
            ("cstore", self.storage_cost),
            ("crc", self.credit_price),
            ("cmea", self.solvent_cost),
            ("coc", self.carrier_cost),
            ("cAM", self.amine_cost),
            ("EUA", self.carbon_price_increment),
            ("ceiling", self.carbon_price_ceiling),
            ("ETS", self.carbon_price),
            ("Wasu", self.asu_specific_work),
        ] {
            check_non_negative(name, value)?;
        }

        for (name, value) in [
            ("CEPCI", self.cepci),
            ("sek", self.sek),
            ("usd", self.usd),
            ("cFR", self.reactor_cost_exponent),
            ("cASU", self.asu_cost_exponent),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{name} must be a finite number greater than zero"
            );
        }

        ensure!(self.lifetime >= 1, "lifetime must be at least one year");
        ensure!(self.timing >= 1, "timing must be at least one year");
        ensure!(
            self.discount_rate.is_finite() && self.discount_rate > -1.0,
            "dr must be a finite number greater than -1"
        );
        check_operating_hours("operating", self.operating_hours)?;
        check_operating_hours(
            "operating hours of the capture technologies",
            self.operating_hours + self.operating_hours_adjustment(),
        )?;

        Ok(())
    }
}

/// Check that a parameter is between 0 and 1
fn check_proportion(name: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{name} must be between 0 and 1"
    );

    Ok(())
}

/// Check that a parameter is finite and not negative
fn check_non_negative(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite number greater than or equal to zero"
    );

    Ok(())
}

/// Check that a number of operating hours fits within a year
fn check_operating_hours(name: &str, value: f64) -> Result<()> {
    ensure!(
        value > 0.0 && value <= HOURS_PER_YEAR,
        "{name} must be greater than zero and at most {HOURS_PER_YEAR}"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::parameters;
    use rstest::rstest;

    fn overrides(pairs: &[(&str, &str)]) -> ParameterSet {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[rstest]
    fn test_defaults_are_valid(parameters: ModelParameters) {
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn test_deserialise_short_keys() {
        let params: ModelParameters = toml::from_str(
            "O2eff = 0.95\nTime = \"Uptime\"\ndecision = \"clc\"\nAuction = true\ntiming = 7",
        )
        .unwrap();
        assert_eq!(params.carrier_oxygen_efficiency, 0.95);
        assert_eq!(params.time_regime, TimeRegime::Uptime);
        assert_eq!(params.decision, TechnologyKind::ChemicalLooping);
        assert!(params.auction);
        assert_eq!(params.timing, 7);

        // Everything else keeps its default
        assert_eq!(params.lifetime, 25);
    }

    #[test]
    fn test_deserialise_unknown_key() {
        assert!(toml::from_str::<ModelParameters>("not_a_parameter = 1.0").is_err());
    }

    #[rstest]
    fn test_with_overrides(parameters: ModelParameters) {
        let params = parameters
            .with_overrides(&overrides(&[
                ("dr", "0.05"),
                ("timing", "12.0"),
                ("Bioshortage", "True"),
                ("Time", "Downtime"),
                ("decision", "oxy"),
                ("scenario", "3"),
                ("policy", "None"),
                ("model", "regret_BECCS"),
            ]))
            .unwrap();

        assert_eq!(params.discount_rate, 0.05);
        assert_eq!(params.timing, 12);
        assert!(params.bio_shortage);
        assert_eq!(params.time_regime, TimeRegime::Downtime);
        assert_eq!(params.decision, TechnologyKind::Oxyfuel);
        assert_eq!(params.capture_rate, parameters.capture_rate);
    }

    #[rstest]
    #[case("decision", "coal")]
    #[case("Time", "Sometimes")]
    #[case("dr", "lots")]
    #[case("timing", "10.5")]
    #[case("lifetime", "-3")]
    #[case("Auction", "maybe")]
    #[case("unknown", "1.0")]
    fn test_invalid_override(
        parameters: ModelParameters,
        #[case] name: &str,
        #[case] value: &str,
    ) {
        let err = parameters
            .with_overrides(&overrides(&[(name, value)]))
            .unwrap_err();
        assert!(
            matches!(&err, ModelError::ParameterRange { name: n, .. } if n == name),
            "unexpected error: {err}"
        );
    }

    #[rstest]
    #[case(TimeRegime::Baseline, 0.0, 0.0)]
    #[case(TimeRegime::Downtime, 0.0, -1500.0)]
    #[case(TimeRegime::Uptime, 600.0, 2100.0)]
    #[case(TimeRegime::Downtime, 1200.0, -300.0)]
    fn test_operating_hours_adjustment(
        mut parameters: ModelParameters,
        #[case] regime: TimeRegime,
        #[case] increase: f64,
        #[case] expected: f64,
    ) {
        parameters.time_regime = regime;
        parameters.operating_increase = increase;
        assert_eq!(parameters.operating_hours_adjustment(), expected);
    }

    #[rstest]
    #[case(|p: &mut ModelParameters| p.capture_rate = 1.2, "rate must be between 0 and 1")]
    #[case(|p: &mut ModelParameters| p.epc = -0.1, "EPC must be a finite number greater than or equal to zero")]
    #[case(|p: &mut ModelParameters| p.lifetime = 0, "lifetime must be at least one year")]
    #[case(|p: &mut ModelParameters| p.timing = 0, "timing must be at least one year")]
    #[case(|p: &mut ModelParameters| p.discount_rate = -1.0, "dr must be a finite number greater than -1")]
    #[case(|p: &mut ModelParameters| p.operating_hours = 0.0, "operating must be greater than zero and at most 8760")]
    #[case(|p: &mut ModelParameters| p.usd = f64::NAN, "usd must be a finite number greater than zero")]
    fn test_validate_invalid(
        mut parameters: ModelParameters,
        #[case] modify: fn(&mut ModelParameters),
        #[case] expected: &str,
    ) {
        modify(&mut parameters);
        assert_eq!(parameters.validate().unwrap_err().to_string(), expected);
    }

    #[rstest]
    fn test_validate_capture_hours(mut parameters: ModelParameters) {
        parameters.operating_hours = 8000.0;
        parameters.time_regime = TimeRegime::Uptime;
        assert!(parameters.validate().is_err());
    }
}
