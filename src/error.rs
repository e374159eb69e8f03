//! Errors which can be raised while evaluating the model.
use thiserror::Error;

/// An error which makes a single model evaluation fail.
///
/// None of these are recovered from inside the model: the caller decides whether to discard the
/// sample, log it or abort the whole batch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A steam property was requested outside the validity region of the property tables
    #[error("Steam property lookup failed at {state}: {reason}")]
    PropertyLookup {
        /// Description of the requested state
        state: String,
        /// Why the lookup failed
        reason: String,
    },

    /// The nominal cycle did not converge or gave a physically invalid result
    #[error("Nominal cycle estimation failed: {0}")]
    CycleConvergence(String),

    /// A parameter was outside its permitted set of values
    #[error("Invalid value for parameter `{name}`: {reason}")]
    ParameterRange {
        /// Name of the parameter
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ModelError {
    /// Create a [`ModelError::ParameterRange`] for the named parameter
    pub fn parameter_range(name: &str, reason: impl Into<String>) -> Self {
        Self::ParameterRange {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for model evaluation
pub type ModelResult<T> = Result<T, ModelError>;
