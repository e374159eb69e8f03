//! This module defines various unit types and their conversions.
//!
//! Physical quantities of the plant balance are tracked in the units the plant engineers use:
//! power and heat in MW, mass flows in kg/s, operating time in hours per year and money in
//! millions of euros (MEUR).
#![allow(missing_docs)]

use float_cmp::{ApproxEq, F64Margin};
use serde::{Deserialize, Serialize};

/// Seconds per hour
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Kilograms per tonne
const KG_PER_TONNE: f64 = 1000.0;

/// Euros per million euros
const EUR_PER_MEUR: f64 = 1e6;

macro_rules! base_unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Neg,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Return the larger of two values
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }

        impl From<f64> for $name {
            fn from(val: f64) -> Self {
                Self(val)
            }
        }

        impl std::ops::Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                $name(iter.map(|x| x.0).sum())
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }
    };
}

/// A unit which can be scaled by a [`Dimensionless`] factor
macro_rules! unit_struct {
    ($name:ident) => {
        base_unit_struct!($name);

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

// Base quantities
base_unit_struct!(Dimensionless);
unit_struct!(Power);
unit_struct!(MassFlow);
unit_struct!(Hours);
unit_struct!(Energy);
unit_struct!(Mass);
unit_struct!(Money);

// Multiplication rules
impl_mul!(Power, Hours, Energy);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl MassFlow {
    /// The mass (in tonnes) which flows over the given number of hours
    pub fn over(self, hours: Hours) -> Mass {
        Mass(self.0 * SECONDS_PER_HOUR * hours.0 / KG_PER_TONNE)
    }
}

impl Energy {
    /// The cost of this energy at a unit price given in EUR/MWh
    pub fn priced_at(self, eur_per_mwh: f64) -> Money {
        Money::from_eur(self.0 * eur_per_mwh)
    }
}

impl Mass {
    /// The cost of this mass at a unit price given in EUR/t
    pub fn priced_at(self, eur_per_tonne: f64) -> Money {
        Money::from_eur(self.0 * eur_per_tonne)
    }
}

impl Money {
    /// Convert a value in euros into MEUR
    pub fn from_eur(eur: f64) -> Self {
        Self(eur / EUR_PER_MEUR)
    }
}
