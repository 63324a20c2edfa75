//! Commercial pricing: flat rate with a single volume discount
//!
//! Above 1000 kWh the base amount is discounted 10%, otherwise above 500 kWh
//! it is discounted 5%. Discounts never compound.

use super::PricedConsumption;
use crate::error::Result;
use crate::models::Breakdown;
use crate::rates::{RateTable, COMMERCIAL_BASE};

/// Breakdown label of the consumption line, shared with industrial pricing
pub const BASE_CONSUMPTION_LABEL: &str = "base consumption amount";

#[derive(Debug, Clone, PartialEq)]
pub struct CommercialPricing {
    rate: f64,
}

impl CommercialPricing {
    pub const DESCRIPTION: &'static str = "Commercial - flat rate with volume discount";

    pub fn with_rate(rate: f64) -> Self {
        Self { rate }
    }

    pub fn from_rate_table(table: &RateTable) -> Result<Self> {
        Ok(Self::with_rate(table.get_rate(COMMERCIAL_BASE)?))
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Discount fraction and its label for a consumption level
    fn discount_for(consumption_kwh: f64) -> Option<(f64, &'static str)> {
        if consumption_kwh > 1000.0 {
            Some((0.10, "volume discount (>1000 kWh)"))
        } else if consumption_kwh > 500.0 {
            Some((0.05, "volume discount (>500 kWh)"))
        } else {
            None
        }
    }

    pub fn calculate(&self, consumption_kwh: f64) -> PricedConsumption {
        let base = consumption_kwh * self.rate;
        let mut breakdown = Breakdown::new();
        breakdown.record(BASE_CONSUMPTION_LABEL, base);

        let mut total = base;
        if let Some((fraction, label)) = Self::discount_for(consumption_kwh) {
            let discount = base * fraction;
            breakdown.record(label, -discount);
            total -= discount;
        }

        PricedConsumption { total, breakdown }
    }
}

impl Default for CommercialPricing {
    fn default() -> Self {
        Self::with_rate(0.75)
    }
}
