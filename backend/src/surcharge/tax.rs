//! Tax kinds applied on top of the accumulated amount

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    /// State tax on goods and services, 18%
    Icms,
    /// 1.65%
    Pis,
    /// 7.6%
    Cofins,
    /// Combined PIS and COFINS, 9.25%
    PisCofins,
}

impl TaxKind {
    pub const ALL: [TaxKind; 4] = [TaxKind::Icms, TaxKind::Pis, TaxKind::Cofins, TaxKind::PisCofins];

    pub fn key(&self) -> &'static str {
        match self {
            TaxKind::Icms => "icms",
            TaxKind::Pis => "pis",
            TaxKind::Cofins => "cofins",
            TaxKind::PisCofins => "pis_cofins",
        }
    }

    /// Rate in percent
    pub fn percent(&self) -> f64 {
        match self {
            TaxKind::Icms => 18.0,
            TaxKind::Pis => 1.65,
            TaxKind::Cofins => 7.6,
            TaxKind::PisCofins => 9.25,
        }
    }

    /// Rate as a fraction (0.18 for ICMS)
    pub fn rate(&self) -> f64 {
        self.percent() / 100.0
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxKind::Icms => "ICMS (18%)",
            TaxKind::Pis => "PIS (1.65%)",
            TaxKind::Cofins => "COFINS (7.6%)",
            TaxKind::PisCofins => "PIS/COFINS (9.25%)",
        }
    }
}

impl FromStr for TaxKind {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaxKind::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| {
                BillingError::invalid_input(format!(
                    "unknown tax kind '{}', expected one of: icms, pis, cofins, pis_cofins",
                    s
                ))
            })
    }
}

impl fmt::Display for TaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
