//! General functions related to finance.
use crate::units::{Dimensionless, Money};

/// Calculates the factor by which a cash flow in the given year is discounted.
///
/// Year 0 is the present, so its cash flows are not discounted.
pub fn discount_factor(discount_rate: Dimensionless, year: u32) -> Dimensionless {
    Dimensionless(1.0 / (1.0 + discount_rate.value()).powf(f64::from(year)))
}

/// Calculates the net present value of a series of yearly net cash flows.
///
/// # Arguments
///
/// * `discount_rate` - The annual discount rate
/// * `cash_flows` - Pairs of year and net cash flow in that year
pub fn net_present_value<I>(discount_rate: Dimensionless, cash_flows: I) -> Money
where
    I: IntoIterator<Item = (u32, Money)>,
{
    cash_flows
        .into_iter()
        .map(|(year, cash_flow)| cash_flow * discount_factor(discount_rate, year))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 10, 1.0)] // Edge case: discount_rate==0
    #[case(0.05, 0, 1.0)] // Edge case: present year
    #[case(0.05, 1, 0.952_380_952_380_952_3)]
    #[case(0.075, 10, 0.485_193_928_301_464_4)]
    fn test_discount_factor(#[case] discount_rate: f64, #[case] year: u32, #[case] expected: f64) {
        let result = discount_factor(Dimensionless(discount_rate), year);
        assert_approx_eq!(f64, result.value(), expected, epsilon = 1e-10);
    }

    #[rstest]
    #[case(0.0, vec![(1, -100.0), (2, 60.0), (3, 60.0)], 20.0)]
    #[case(0.1, vec![(1, 110.0)], 100.0)]
    #[case(0.1, vec![(1, 110.0), (2, 121.0)], 200.0)]
    #[case(0.05, vec![], 0.0)]
    fn test_net_present_value(
        #[case] discount_rate: f64,
        #[case] cash_flows: Vec<(u32, f64)>,
        #[case] expected: f64,
    ) {
        let result = net_present_value(
            Dimensionless(discount_rate),
            cash_flows
                .into_iter()
                .map(|(year, value)| (year, Money(value))),
        );
        assert_approx_eq!(Money, result, Money(expected), epsilon = 1e-9);
    }

    #[test]
    fn test_positive_rate_reduces_value() {
        let cash_flows = [(1, Money(10.0)), (2, Money(10.0)), (3, Money(10.0))];
        let undiscounted = net_present_value(Dimensionless(0.0), cash_flows);
        let discounted = net_present_value(Dimensionless(0.05), cash_flows);
        assert!(discounted < undiscounted);
    }
}
