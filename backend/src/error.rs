//! Billing errors
//!
//! Every failure in the engine is detected synchronously and returned to the
//! immediate caller. Nothing is retried or suppressed internally, and a failed
//! mutation of the rate table never applies partially.

use thiserror::Error;

/// Errors produced by the billing engine
#[derive(Debug, Error)]
pub enum BillingError {
    /// Unrecognized identifier (consumer class, flag, tax kind) or an
    /// out-of-domain numeric input such as negative consumption
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A constructed value violates a non-negativity or range invariant
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Lookup of a key absent from the rate table
    #[error("{namespace} '{key}' not found")]
    NotFound { namespace: &'static str, key: String },

    /// Snapshot or configuration JSON could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, BillingError>;

impl BillingError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        BillingError::InvalidInput(msg.into())
    }

    pub(crate) fn invalid_value(msg: impl Into<String>) -> Self {
        BillingError::InvalidValue(msg.into())
    }

    /// True for `InvalidInput`
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, BillingError::InvalidInput(_))
    }

    /// True for `InvalidValue`
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, BillingError::InvalidValue(_))
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::NotFound { .. })
    }
}

/// Reject negative or non-finite money/price values
pub(crate) fn ensure_non_negative(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(BillingError::invalid_value(format!(
            "{} must be a non-negative number, got {}",
            what, value
        )));
    }
    Ok(())
}

/// Reject negative or non-finite consumption
pub(crate) fn ensure_consumption(kwh: f64) -> Result<()> {
    if !kwh.is_finite() || kwh < 0.0 {
        return Err(BillingError::invalid_input(format!(
            "consumption cannot be negative, got {} kWh",
            kwh
        )));
    }
    Ok(())
}
