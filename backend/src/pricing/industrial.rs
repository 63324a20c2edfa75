//! Industrial pricing: flat rate, demand charge and volume discount
//!
//! The discount (18% above 5000 kWh, else 12% above 2000 kWh) applies to the
//! consumption amount only, never to the fixed demand charge.

use super::commercial::BASE_CONSUMPTION_LABEL;
use super::PricedConsumption;
use crate::error::Result;
use crate::models::Breakdown;
use crate::rates::{RateTable, INDUSTRIAL_BASE, INDUSTRIAL_DEMAND};

pub const DEMAND_CHARGE_LABEL: &str = "demand charge";

#[derive(Debug, Clone, PartialEq)]
pub struct IndustrialPricing {
    rate: f64,
    demand_charge: f64,
}

impl IndustrialPricing {
    pub const DESCRIPTION: &'static str = "Industrial - special rate with demand charge";

    pub fn with_rates(rate: f64, demand_charge: f64) -> Self {
        Self {
            rate,
            demand_charge,
        }
    }

    pub fn from_rate_table(table: &RateTable) -> Result<Self> {
        Ok(Self::with_rates(
            table.get_rate(INDUSTRIAL_BASE)?,
            table.get_rate(INDUSTRIAL_DEMAND)?,
        ))
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn demand_charge(&self) -> f64 {
        self.demand_charge
    }

    fn discount_for(consumption_kwh: f64) -> Option<(f64, &'static str)> {
        if consumption_kwh > 5000.0 {
            Some((0.18, "industrial discount (>5000 kWh)"))
        } else if consumption_kwh > 2000.0 {
            Some((0.12, "industrial discount (>2000 kWh)"))
        } else {
            None
        }
    }

    pub fn calculate(&self, consumption_kwh: f64) -> PricedConsumption {
        let consumption_amount = consumption_kwh * self.rate;
        let mut breakdown = Breakdown::new();
        breakdown.record(BASE_CONSUMPTION_LABEL, consumption_amount);
        breakdown.record(DEMAND_CHARGE_LABEL, self.demand_charge);

        let discount = match Self::discount_for(consumption_kwh) {
            Some((fraction, label)) => {
                let discount = consumption_amount * fraction;
                breakdown.record(label, -discount);
                discount
            }
            None => 0.0,
        };

        PricedConsumption {
            total: consumption_amount - discount + self.demand_charge,
            breakdown,
        }
    }
}

impl Default for IndustrialPricing {
    fn default() -> Self {
        Self::with_rates(0.60, 25.00)
    }
}
