//! Tariff flags
//!
//! Generation-condition indicators that add a per-kWh markup, billed per
//! 100 kWh of consumption.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BillingError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TariffFlag {
    /// Favourable generation conditions, no markup
    #[default]
    #[serde(rename = "green")]
    Green,
    #[serde(rename = "yellow")]
    Yellow,
    #[serde(rename = "red-tier-1")]
    RedTier1,
    #[serde(rename = "red-tier-2")]
    RedTier2,
}

impl TariffFlag {
    pub const ALL: [TariffFlag; 4] = [
        TariffFlag::Green,
        TariffFlag::Yellow,
        TariffFlag::RedTier1,
        TariffFlag::RedTier2,
    ];

    /// Identifier used on input and as the rate table flag key
    pub fn key(&self) -> &'static str {
        match self {
            TariffFlag::Green => "green",
            TariffFlag::Yellow => "yellow",
            TariffFlag::RedTier1 => "red-tier-1",
            TariffFlag::RedTier2 => "red-tier-2",
        }
    }

    /// Label shown in breakdowns and descriptions
    pub fn label(&self) -> &'static str {
        match self {
            TariffFlag::Green => "green flag",
            TariffFlag::Yellow => "yellow flag",
            TariffFlag::RedTier1 => "red flag - tier 1",
            TariffFlag::RedTier2 => "red flag - tier 2",
        }
    }

    /// Built-in price per 100 kWh
    pub fn default_unit_price(&self) -> f64 {
        match self {
            TariffFlag::Green => 0.00,
            TariffFlag::Yellow => 1.50,
            TariffFlag::RedTier1 => 4.50,
            TariffFlag::RedTier2 => 7.00,
        }
    }
}

impl FromStr for TariffFlag {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TariffFlag::ALL
            .into_iter()
            .find(|flag| flag.key() == s)
            .ok_or_else(|| {
                BillingError::invalid_input(format!(
                    "unknown flag '{}', expected one of: green, yellow, red-tier-1, red-tier-2",
                    s
                ))
            })
    }
}

impl fmt::Display for TariffFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
