//! Billing configuration
//!
//! Settings for the default surcharge composition, plus an optional rate
//! table snapshot to load at startup. Every field has a default, so an empty
//! JSON object is a valid configuration.
//!
//! ```json
//! {
//!   "lighting_fee": 12.5,
//!   "municipal_percentage": 3.0,
//!   "taxes": ["pis_cofins", "icms"],
//!   "flag": "yellow",
//!   "flag_pricing": "rate_table",
//!   "rate_table": { "reference_month": "03/2025", "rates": { "commercial_base": 0.8 } }
//! }
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_non_negative, BillingError, Result};
use crate::rates::{RateTable, RateTablePatch};
use crate::surcharge::{TariffFlag, TaxKind, DEFAULT_LIGHTING_FEE};

/// Source of flag unit prices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagPricing {
    /// Fixed prices built into each flag
    #[default]
    Builtin,
    /// Current flag prices of the rate table
    RateTable,
}

impl FromStr for FlagPricing {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "builtin" => Ok(FlagPricing::Builtin),
            "rate_table" => Ok(FlagPricing::RateTable),
            other => Err(BillingError::invalid_input(format!(
                "unknown flag pricing '{}', expected one of: builtin, rate_table",
                other
            ))),
        }
    }
}

/// Config as written in the file, before enumerated names are resolved
///
/// Names go through `FromStr` so an unknown flag or tax kind is reported as
/// `InvalidInput`, the same as on the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBillingConfig {
    lighting_fee: Option<f64>,
    municipal_percentage: Option<f64>,
    taxes: Option<Vec<String>>,
    flag: Option<String>,
    flag_pricing: Option<String>,
    rate_table: Option<RateTablePatch>,
}

impl TryFrom<RawBillingConfig> for BillingConfig {
    type Error = BillingError;

    fn try_from(raw: RawBillingConfig) -> Result<Self> {
        let defaults = BillingConfig::default();
        let taxes = match raw.taxes {
            Some(names) => names
                .iter()
                .map(|name| name.parse())
                .collect::<Result<Vec<TaxKind>>>()?,
            None => defaults.taxes,
        };
        Ok(BillingConfig {
            lighting_fee: raw.lighting_fee.unwrap_or(defaults.lighting_fee),
            municipal_percentage: raw.municipal_percentage,
            taxes,
            flag: raw
                .flag
                .as_deref()
                .map(str::parse::<TariffFlag>)
                .transpose()?
                .unwrap_or(defaults.flag),
            flag_pricing: raw
                .flag_pricing
                .as_deref()
                .map(str::parse::<FlagPricing>)
                .transpose()?
                .unwrap_or(defaults.flag_pricing),
            rate_table: raw.rate_table,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBillingConfig")]
pub struct BillingConfig {
    /// Fixed public lighting fee. Default: 15.00
    pub lighting_fee: f64,

    /// Municipal contribution in percent; `None` leaves it out of the bill
    pub municipal_percentage: Option<f64>,

    /// Taxes applied in order, each on the running total.
    /// Default: PIS/COFINS then ICMS
    pub taxes: Vec<TaxKind>,

    /// Flag in effect for the billing month. Default: green
    pub flag: TariffFlag,

    /// Where the flag's unit price comes from. Default: built-in prices
    pub flag_pricing: FlagPricing,

    /// Rate table contents to import before billing
    pub rate_table: Option<RateTablePatch>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            lighting_fee: DEFAULT_LIGHTING_FEE,
            municipal_percentage: None,
            taxes: vec![TaxKind::PisCofins, TaxKind::Icms],
            flag: TariffFlag::Green,
            flag_pricing: FlagPricing::Builtin,
            rate_table: None,
        }
    }
}

impl BillingConfig {
    /// Parse and validate a JSON configuration
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `InvalidInput` for an unknown
    /// flag, tax kind or flag pricing name, `InvalidValue` for out-of-range
    /// values
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawBillingConfig = serde_json::from_str(json)?;
        let config = BillingConfig::try_from(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading billing config");
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `InvalidValue` for a negative fee, a percentage outside 0..=100 or a
    /// negative price in the embedded rate table
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("lighting fee", self.lighting_fee)?;
        if let Some(percent) = self.municipal_percentage {
            if !(0.0..=100.0).contains(&percent) {
                return Err(BillingError::invalid_value(format!(
                    "municipal_percentage must be between 0 and 100, got {}",
                    percent
                )));
            }
        }
        if let Some(patch) = &self.rate_table {
            patch.validate()?;
        }
        Ok(())
    }

    /// Import the embedded rate table snapshot into `table`, if any
    pub fn apply_to(&self, table: &RateTable) -> Result<()> {
        match &self.rate_table {
            Some(patch) => table.import_snapshot(patch.clone()),
            None => Ok(()),
        }
    }
}
