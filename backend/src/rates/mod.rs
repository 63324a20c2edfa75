//! Rate Table
//!
//! Shared, mutable source of per-kWh tariffs and flag surcharge unit prices.
//!
//! # Keys
//!
//! Tariffs (price per kWh unless noted):
//! - `residential_tier_1` (0-100 kWh), `residential_tier_2` (101-300 kWh),
//!   `residential_tier_3` (>300 kWh)
//! - `commercial_base`
//! - `industrial_base`, `industrial_demand` (fixed monthly charge)
//!
//! Flags (price per 100 kWh): `green`, `yellow`, `red-tier-1`, `red-tier-2`
//!
//! # Sharing
//!
//! A [`RateTable`] is a handle: clones observe and mutate the same state.
//! [`RateTable::global`] (and [`rate_table`]) return the process-wide table;
//! [`RateTable::new`] builds an independent one for explicit injection.

use std::collections::BTreeMap;

pub mod snapshot;
pub mod table;

pub use snapshot::{RateTablePatch, RateTableSnapshot};
pub use table::{rate_table, RateTable};

pub const RESIDENTIAL_TIER_1: &str = "residential_tier_1";
pub const RESIDENTIAL_TIER_2: &str = "residential_tier_2";
pub const RESIDENTIAL_TIER_3: &str = "residential_tier_3";
pub const COMMERCIAL_BASE: &str = "commercial_base";
pub const INDUSTRIAL_BASE: &str = "industrial_base";
pub const INDUSTRIAL_DEMAND: &str = "industrial_demand";

/// Built-in tariffs loaded at construction and on reset
pub fn default_rates() -> BTreeMap<String, f64> {
    [
        (RESIDENTIAL_TIER_1, 0.50),
        (RESIDENTIAL_TIER_2, 0.65),
        (RESIDENTIAL_TIER_3, 0.85),
        (COMMERCIAL_BASE, 0.75),
        (INDUSTRIAL_BASE, 0.60),
        (INDUSTRIAL_DEMAND, 25.00),
    ]
    .into_iter()
    .map(|(key, price)| (key.to_string(), price))
    .collect()
}

/// Built-in flag unit prices (per 100 kWh)
pub fn default_flag_prices() -> BTreeMap<String, f64> {
    crate::surcharge::flag::TariffFlag::ALL
        .iter()
        .map(|flag| (flag.key().to_string(), flag.default_unit_price()))
        .collect()
}
