//! Residential pricing: progressive tiers
//!
//! Consumption is split across tiers in order; each tier bills only the kWh
//! that fall inside it.
//!
//! | tier | range | default rate |
//! |---|---|---|
//! | 1 | 0-100 kWh | 0.50 |
//! | 2 | 101-300 kWh | 0.65 |
//! | 3 | >300 kWh | 0.85 |

use super::PricedConsumption;
use crate::error::Result;
use crate::models::Breakdown;
use crate::rates::{RateTable, RESIDENTIAL_TIER_1, RESIDENTIAL_TIER_2, RESIDENTIAL_TIER_3};

/// One pricing tier; `upper_kwh` is inclusive, `None` means unbounded
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub upper_kwh: Option<f64>,
    pub rate: f64,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResidentialPricing {
    tiers: Vec<Tier>,
}

impl ResidentialPricing {
    pub const DESCRIPTION: &'static str = "Residential - progressive tiered pricing";

    /// Tiers at the given per-kWh rates
    pub fn with_rates(tier_1: f64, tier_2: f64, tier_3: f64) -> Self {
        Self {
            tiers: vec![
                Tier {
                    upper_kwh: Some(100.0),
                    rate: tier_1,
                    label: "tier 1 (0-100 kWh)",
                },
                Tier {
                    upper_kwh: Some(300.0),
                    rate: tier_2,
                    label: "tier 2 (101-300 kWh)",
                },
                Tier {
                    upper_kwh: None,
                    rate: tier_3,
                    label: "tier 3 (>300 kWh)",
                },
            ],
        }
    }

    /// Tiers priced from the table's current residential rates
    pub fn from_rate_table(table: &RateTable) -> Result<Self> {
        Ok(Self::with_rates(
            table.get_rate(RESIDENTIAL_TIER_1)?,
            table.get_rate(RESIDENTIAL_TIER_2)?,
            table.get_rate(RESIDENTIAL_TIER_3)?,
        ))
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn calculate(&self, consumption_kwh: f64) -> PricedConsumption {
        let mut total = 0.0;
        let mut breakdown = Breakdown::new();
        let mut remaining = consumption_kwh;
        let mut previous_upper = 0.0;

        for tier in &self.tiers {
            if remaining <= 0.0 {
                break;
            }

            let width = match tier.upper_kwh {
                Some(upper) => upper - previous_upper,
                None => f64::INFINITY,
            };
            let consumed = remaining.min(width);
            if consumed > 0.0 {
                let amount = consumed * tier.rate;
                breakdown.record(tier.label, amount);
                total += amount;
            }

            remaining -= consumed;
            previous_upper = tier.upper_kwh.unwrap_or(f64::INFINITY);
        }

        PricedConsumption { total, breakdown }
    }
}

impl Default for ResidentialPricing {
    fn default() -> Self {
        Self::with_rates(0.50, 0.65, 0.85)
    }
}
