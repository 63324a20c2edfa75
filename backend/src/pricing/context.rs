//! Pricing Context
//!
//! Holds exactly one bound strategy and delegates bill computation to it.

use tracing::{debug, trace};

use super::PricingStrategy;
use crate::error::{ensure_consumption, Result};
use crate::models::Breakdown;

/// Result of [`PricingContext::calculate_bill`]
#[derive(Debug, Clone, PartialEq)]
pub struct BillCalculation {
    pub total: f64,
    pub breakdown: Breakdown,
    /// Description of the strategy that produced the amount
    pub strategy_label: &'static str,
}

#[derive(Debug, Clone)]
pub struct PricingContext {
    strategy: PricingStrategy,
}

impl PricingContext {
    pub fn new(strategy: PricingStrategy) -> Self {
        Self { strategy }
    }

    /// Replace the bound strategy for all later calls
    pub fn rebind(&mut self, strategy: PricingStrategy) {
        debug!(
            from = self.strategy.describe(),
            to = strategy.describe(),
            "rebinding pricing strategy"
        );
        self.strategy = strategy;
    }

    pub fn strategy(&self) -> &PricingStrategy {
        &self.strategy
    }

    /// Compute the base bill with the bound strategy
    ///
    /// # Errors
    /// `InvalidInput` if `consumption_kwh` is negative
    pub fn calculate_bill(&self, consumption_kwh: f64) -> Result<BillCalculation> {
        ensure_consumption(consumption_kwh)?;

        let priced = self.strategy.calculate(consumption_kwh);
        trace!(
            strategy = self.strategy.describe(),
            consumption_kwh,
            total = priced.total,
            "bill calculated"
        );

        Ok(BillCalculation {
            total: priced.total,
            breakdown: priced.breakdown,
            strategy_label: self.strategy.describe(),
        })
    }
}
