//! Steam and water properties from the IAPWS-IF97 tables.
//!
//! Property evaluation is delegated to the `seuif97` crate. Its functions take pressures in MPa
//! and temperatures in °C, whereas the rest of the model works in bar, so conversion happens here.
use crate::error::{ModelError, ModelResult};
use seuif97::{OH, OS, OT, ps, pt, px};
use std::fmt;

/// Pressure at the triple point of water, the lowest pressure covered by the tables (bar)
pub const TRIPLE_POINT_PRESSURE: f64 = 0.006_116_57;

/// Pressure at the critical point of water (bar)
const CRITICAL_PRESSURE: f64 = 220.64;

/// Upper pressure limit of the property tables (bar)
const MAX_PRESSURE: f64 = 1000.0;

/// Temperature range covered by the property tables for all pressures (°C)
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=800.0;

/// bar per MPa
const BAR_PER_MPA: f64 = 10.0;

/// A request for the properties of water at a given point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateSpec {
    /// Pressure (bar) and temperature (°C)
    PressureTemperature {
        /// Pressure in bar
        pressure: f64,
        /// Temperature in °C
        temperature: f64,
    },
    /// Saturated liquid at the given pressure (bar)
    SaturatedLiquid {
        /// Pressure in bar
        pressure: f64,
    },
    /// Saturated vapour at the given pressure (bar)
    SaturatedVapour {
        /// Pressure in bar
        pressure: f64,
    },
    /// Pressure (bar) and specific entropy (kJ/kg·K)
    PressureEntropy {
        /// Pressure in bar
        pressure: f64,
        /// Specific entropy in kJ/kg·K
        entropy: f64,
    },
}

impl StateSpec {
    /// The pressure of the requested state in bar
    pub fn pressure(&self) -> f64 {
        match *self {
            Self::PressureTemperature { pressure, .. }
            | Self::SaturatedLiquid { pressure }
            | Self::SaturatedVapour { pressure }
            | Self::PressureEntropy { pressure, .. } => pressure,
        }
    }
}

impl fmt::Display for StateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::PressureTemperature {
                pressure,
                temperature,
            } => write!(f, "p = {pressure} bar, T = {temperature} °C"),
            Self::SaturatedLiquid { pressure } => write!(f, "p = {pressure} bar, x = 0"),
            Self::SaturatedVapour { pressure } => write!(f, "p = {pressure} bar, x = 1"),
            Self::PressureEntropy { pressure, entropy } => {
                write!(f, "p = {pressure} bar, s = {entropy} kJ/kg·K")
            }
        }
    }
}

/// The resolved properties of a point in the cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteamState {
    /// Pressure (bar)
    pub pressure: f64,
    /// Specific enthalpy (kJ/kg)
    pub enthalpy: f64,
    /// Specific entropy (kJ/kg·K)
    pub entropy: f64,
}

/// Look up the enthalpy and entropy of water at the requested state.
///
/// Fails with [`ModelError::PropertyLookup`] if the state lies outside the region covered by
/// the tables or if the tables cannot produce a finite value for it.
pub fn resolve(spec: StateSpec) -> ModelResult<SteamState> {
    let fail = |reason: &str| ModelError::PropertyLookup {
        state: spec.to_string(),
        reason: reason.to_string(),
    };

    let pressure = spec.pressure();
    if !(TRIPLE_POINT_PRESSURE..=MAX_PRESSURE).contains(&pressure) {
        return Err(fail("pressure outside the range of the property tables"));
    }
    let p_mpa = pressure / BAR_PER_MPA;

    let (enthalpy, entropy) = match spec {
        StateSpec::PressureTemperature { temperature, .. } => {
            if !TEMPERATURE_RANGE.contains(&temperature) {
                return Err(fail("temperature outside the range of the property tables"));
            }
            (pt(p_mpa, temperature, OH), pt(p_mpa, temperature, OS))
        }
        StateSpec::SaturatedLiquid { .. } | StateSpec::SaturatedVapour { .. } => {
            if pressure >= CRITICAL_PRESSURE {
                return Err(fail("no saturation state above the critical pressure"));
            }
            let quality = if matches!(spec, StateSpec::SaturatedLiquid { .. }) {
                0.0
            } else {
                1.0
            };
            (px(p_mpa, quality, OH), px(p_mpa, quality, OS))
        }
        StateSpec::PressureEntropy { entropy, .. } => {
            if !entropy.is_finite() || entropy < 0.0 {
                return Err(fail("entropy must be a finite, non-negative number"));
            }
            let temperature = ps(p_mpa, entropy, OT);
            if !TEMPERATURE_RANGE.contains(&temperature) {
                return Err(fail("resulting temperature outside the range of the tables"));
            }
            (ps(p_mpa, entropy, OH), entropy)
        }
    };

    if !enthalpy.is_finite() || !entropy.is_finite() {
        return Err(fail("property tables returned a non-finite value"));
    }

    Ok(SteamState {
        pressure,
        enthalpy,
        entropy,
    })
}
