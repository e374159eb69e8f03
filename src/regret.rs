//! Reduction of the technology NPVs to regret outcomes.
use crate::technology::{TechnologyKind, TechnologyMap};
use crate::units::Money;
use indexmap::IndexMap;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use strum::{EnumCount, IntoEnumIterator};

/// How regret is measured
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
pub enum RegretMode {
    /// NPV of each other technology minus the NPV of a baseline technology
    #[default]
    #[string = "pairwise"]
    Pairwise,
    /// Shortfall of each technology's NPV against the best NPV
    #[string = "minimax"]
    Minimax,
}

/// The outcome names produced by a regret mode, in the order they are produced
pub fn regret_keys(mode: RegretMode) -> Vec<String> {
    match mode {
        RegretMode::Pairwise => (1..TechnologyKind::COUNT)
            .map(|i| format!("regret_{i}"))
            .collect(),
        RegretMode::Minimax => std::iter::once("regret_decision".to_string())
            .chain(TechnologyKind::iter().map(|kind| format!("regret_{kind}")))
            .collect(),
    }
}

/// Regret of each other technology against `baseline`, numbered in [`TechnologyKind`] order
fn pairwise(npvs: &TechnologyMap<Money>, baseline: TechnologyKind) -> IndexMap<String, f64> {
    let base = npvs[&baseline];
    TechnologyKind::iter()
        .filter(|kind| *kind != baseline)
        .enumerate()
        .map(|(i, kind)| (format!("regret_{}", i + 1), (npvs[&kind] - base).value()))
        .collect()
}

/// Regret of the chosen technology and of every technology against the best one
fn minimax(npvs: &TechnologyMap<Money>, decision: TechnologyKind) -> IndexMap<String, f64> {
    let best = npvs
        .values()
        .copied()
        .fold(Money(f64::NEG_INFINITY), Money::max);
    let regret = |kind: TechnologyKind| (best - npvs[&kind]).value();

    std::iter::once(("regret_decision".to_string(), regret(decision)))
        .chain(TechnologyKind::iter().map(|kind| (format!("regret_{kind}"), regret(kind))))
        .collect()
}

/// Reduce the NPVs of the four technologies to regret outcomes.
///
/// # Arguments
///
/// * `mode` - How regret is measured
/// * `npvs` - NPV of every technology
/// * `baseline` - The technology compared against in pairwise mode
/// * `decision` - The technology chosen, reported separately in minimax mode
pub fn regret(
    mode: RegretMode,
    npvs: &TechnologyMap<Money>,
    baseline: TechnologyKind,
    decision: TechnologyKind,
) -> IndexMap<String, f64> {
    match mode {
        RegretMode::Pairwise => pairwise(npvs, baseline),
        RegretMode::Minimax => minimax(npvs, decision),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::{fixture, rstest};

    #[fixture]
    fn npvs() -> TechnologyMap<Money> {
        [
            (TechnologyKind::Reference, Money(120.0)),
            (TechnologyKind::Amine, Money(100.0)),
            (TechnologyKind::Oxyfuel, Money(150.0)),
            (TechnologyKind::ChemicalLooping, Money(90.0)),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    fn test_pairwise_against_amine(npvs: TechnologyMap<Money>) {
        let outcomes = regret(
            RegretMode::Pairwise,
            &npvs,
            TechnologyKind::Amine,
            TechnologyKind::Amine,
        );
        assert_eq!(
            outcomes.into_iter().collect_vec(),
            [
                ("regret_1".to_string(), 20.0),
                ("regret_2".to_string(), 50.0),
                ("regret_3".to_string(), -10.0),
            ]
        );
    }

    #[rstest]
    fn test_pairwise_against_reference(npvs: TechnologyMap<Money>) {
        let outcomes = regret(
            RegretMode::Pairwise,
            &npvs,
            TechnologyKind::Reference,
            TechnologyKind::Amine,
        );
        assert_approx_eq!(f64, outcomes["regret_1"], -20.0);
        assert_approx_eq!(f64, outcomes["regret_2"], 30.0);
        assert_approx_eq!(f64, outcomes["regret_3"], -30.0);
    }

    #[rstest]
    #[case(TechnologyKind::Reference, 30.0)]
    #[case(TechnologyKind::Amine, 50.0)]
    #[case(TechnologyKind::Oxyfuel, 0.0)]
    #[case(TechnologyKind::ChemicalLooping, 60.0)]
    fn test_minimax(
        npvs: TechnologyMap<Money>,
        #[case] decision: TechnologyKind,
        #[case] expected: f64,
    ) {
        let outcomes = regret(
            RegretMode::Minimax,
            &npvs,
            TechnologyKind::Amine,
            decision,
        );
        assert_approx_eq!(f64, outcomes["regret_decision"], expected);
        assert_approx_eq!(f64, outcomes["regret_oxy"], 0.0);
        assert!(outcomes.values().all(|value| *value >= 0.0));
    }

    #[rstest]
    #[case(RegretMode::Pairwise)]
    #[case(RegretMode::Minimax)]
    fn test_keys_match_outcomes(npvs: TechnologyMap<Money>, #[case] mode: RegretMode) {
        let outcomes = regret(mode, &npvs, TechnologyKind::Oxyfuel, TechnologyKind::Reference);
        assert_eq!(outcomes.keys().cloned().collect_vec(), regret_keys(mode));
    }
}
