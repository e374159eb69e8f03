//! Evolution of prices and climate policy over the simulated years.
use crate::model::ModelParameters;
use serde::Deserialize;

/// Constants governing the price shocks and the auction subsidy
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicyRules {
    /// Annual growth of the biomass price during a bio-shortage
    pub bio_shortage_growth: f64,
    /// First year in which the biomass price no longer grows
    pub bio_shortage_end: u32,
    /// Annual growth of the electricity price during a power surge
    pub power_surge_growth: f64,
    /// First year in which the electricity price no longer grows
    pub power_surge_end: u32,
    /// Subsidy added to the credit price for auctioned CO2 removal (EUR/t)
    pub auction_subsidy: f64,
    /// Number of operating years covered by the auction contract
    pub auction_years: u32,
}

impl Default for PolicyRules {
    fn default() -> Self {
        Self {
            bio_shortage_growth: 0.10,
            bio_shortage_end: 11,
            power_surge_growth: 0.20,
            power_surge_end: 4,
            auction_subsidy: 160.0,
            auction_years: 15,
        }
    }
}

impl PolicyRules {
    /// The auction subsidy paid per tonne of captured CO2 in the given year (EUR/t).
    ///
    /// Auctioned support lasts for a fixed number of years from the start of operation.
    pub fn auction_subsidy(
        &self,
        year: u32,
        params: &ModelParameters,
        operation_start: u32,
    ) -> f64 {
        if params.auction && year < operation_start.saturating_add(self.auction_years) {
            self.auction_subsidy
        } else {
            0.0
        }
    }
}

/// Prices which change from year to year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyState {
    /// Biomass price (EUR/MWh)
    pub biomass_price: f64,
    /// Electricity price (EUR/MWh)
    pub electricity_price: f64,
    /// Emission allowance price (EUR/t)
    pub carbon_price: f64,
    /// Price paid for removal credits (EUR/t)
    pub credit_price: f64,
    /// Regulatory ceiling on the carbon price (EUR/t)
    pub ceiling: f64,
}

impl PolicyState {
    /// The prices at the start of the simulation
    pub fn initial(params: &ModelParameters) -> Self {
        Self {
            biomass_price: params.biomass_price,
            electricity_price: params.electricity_price,
            carbon_price: params.carbon_price,
            credit_price: params.credit_price,
            ceiling: params.carbon_price_ceiling,
        }
    }

    /// Move the prices on to the given year.
    ///
    /// With market integration the carbon price rises by a fixed increment each year. If the
    /// carbon price is capped, it is held at the ceiling once it gets there. The credit price
    /// follows the carbon price upwards and, under public procurement, is guaranteed to be at
    /// least the ceiling.
    pub fn advance(&mut self, year: u32, params: &ModelParameters, rules: &PolicyRules) {
        if params.bio_shortage && year < rules.bio_shortage_end {
            self.biomass_price *= 1.0 + rules.bio_shortage_growth;
        }
        if params.power_surge && year < rules.power_surge_end {
            self.electricity_price *= 1.0 + rules.power_surge_growth;
        }

        if params.integration {
            if !params.capping {
                self.carbon_price += params.carbon_price_increment;
            } else if self.carbon_price < self.ceiling {
                self.carbon_price = (self.carbon_price + params.carbon_price_increment).min(self.ceiling);
            }

            self.credit_price = self.credit_price.max(self.carbon_price);
            if self.ceiling > self.credit_price && params.capping && params.procurement {
                self.credit_price = self.ceiling;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::parameters;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn trajectory(params: &ModelParameters, years: u32) -> Vec<PolicyState> {
        let rules = PolicyRules::default();
        let mut state = PolicyState::initial(params);
        (1..=years)
            .map(|year| {
                state.advance(year, params, &rules);
                state
            })
            .collect()
    }

    #[rstest]
    fn test_no_flags_keeps_prices(mut parameters: ModelParameters) {
        parameters.integration = false;
        let initial = PolicyState::initial(&parameters);
        for state in trajectory(&parameters, 40) {
            assert_eq!(state, initial);
        }
    }

    #[rstest]
    fn test_bio_shortage(mut parameters: ModelParameters) {
        parameters.bio_shortage = true;
        let states = trajectory(&parameters, 20);

        // Ten years of 10 % growth, then flat
        let expected = parameters.biomass_price * 1.1_f64.powi(10);
        assert_approx_eq!(f64, states[9].biomass_price, expected, epsilon = 1e-9);
        assert_approx_eq!(f64, states[19].biomass_price, expected, epsilon = 1e-9);
    }

    #[rstest]
    fn test_power_surge(mut parameters: ModelParameters) {
        parameters.power_surge = true;
        let states = trajectory(&parameters, 10);

        let expected = parameters.electricity_price * 1.2_f64.powi(3);
        assert_approx_eq!(f64, states[2].electricity_price, expected, epsilon = 1e-9);
        assert_approx_eq!(f64, states[9].electricity_price, expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(10.0)]
    #[case(37.0)]
    #[case(500.0)]
    fn test_capped_carbon_price_bounded(mut parameters: ModelParameters, #[case] increment: f64) {
        parameters.integration = true;
        parameters.capping = true;
        parameters.carbon_price_increment = increment;

        let states = trajectory(&parameters, 60);
        for state in &states {
            assert!(state.carbon_price <= parameters.carbon_price_ceiling);
        }
        assert_approx_eq!(
            f64,
            states.last().unwrap().carbon_price,
            parameters.carbon_price_ceiling
        );
    }

    #[rstest]
    fn test_uncapped_carbon_price_grows(mut parameters: ModelParameters) {
        parameters.integration = true;
        parameters.capping = false;
        let states = trajectory(&parameters, 30);

        let expected = parameters.carbon_price + 30.0 * parameters.carbon_price_increment;
        assert_approx_eq!(f64, states[29].carbon_price, expected, epsilon = 1e-9);
        assert!(states[29].carbon_price > parameters.carbon_price_ceiling);
    }

    #[rstest]
    fn test_procurement_sets_credit_floor(mut parameters: ModelParameters) {
        parameters.integration = true;
        parameters.capping = true;
        parameters.procurement = true;
        parameters.credit_price = 100.0;

        let states = trajectory(&parameters, 1);
        assert_approx_eq!(f64, states[0].credit_price, parameters.carbon_price_ceiling);

        parameters.procurement = false;
        let states = trajectory(&parameters, 1);
        assert_approx_eq!(f64, states[0].credit_price, 100.0);
    }

    #[rstest]
    fn test_credit_follows_carbon_price(mut parameters: ModelParameters) {
        parameters.integration = true;
        parameters.capping = false;
        parameters.credit_price = 50.0;
        parameters.carbon_price = 80.0;

        let states = trajectory(&parameters, 5);
        for state in states {
            assert!(state.credit_price >= state.carbon_price);
        }
    }

    #[rstest]
    fn test_auction_window(mut parameters: ModelParameters) {
        let rules = PolicyRules::default();
        parameters.auction = true;

        // Operation starts in year 12, so support runs up to year 26
        assert_approx_eq!(f64, rules.auction_subsidy(12, &parameters, 12), 160.0);
        assert_approx_eq!(f64, rules.auction_subsidy(26, &parameters, 12), 160.0);
        assert_approx_eq!(f64, rules.auction_subsidy(27, &parameters, 12), 0.0);

        // The window end saturates instead of overflowing
        assert_approx_eq!(f64, rules.auction_subsidy(u32::MAX - 1, &parameters, u32::MAX), 160.0);

        parameters.auction = false;
        assert_approx_eq!(f64, rules.auction_subsidy(12, &parameters, 12), 0.0);
    }
}
