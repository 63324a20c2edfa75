//! Pricing Strategies
//!
//! One interchangeable algorithm per consumer class, each mapping a
//! consumption quantity to a base amount plus a line-item breakdown.
//!
//! # Strategies
//!
//! 1. **Residential**: progressive tiers (see [`residential`])
//! 2. **Commercial**: flat rate with a volume discount (see [`commercial`])
//! 3. **Industrial**: flat rate, demand charge, volume discount (see [`industrial`])
//!
//! Strategies capture their rates when they are built, either from the
//! built-in defaults or from a [`RateTable`]. A later change to the table
//! only affects strategies built afterwards.
//!
//! # Example
//!
//! ```
//! use energy_billing_core::pricing::{create_strategy, PricingContext};
//! use energy_billing_core::rates::RateTable;
//!
//! let table = RateTable::new();
//! let context = PricingContext::new(create_strategy("residential", &table).unwrap());
//! let bill = context.calculate_bill(200.0).unwrap();
//!
//! assert!((bill.total - 115.0).abs() < 1e-9);
//! assert_eq!(bill.breakdown.len(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};
use crate::models::Breakdown;
use crate::rates::RateTable;

pub mod commercial;
pub mod context;
pub mod industrial;
pub mod residential;

pub use commercial::CommercialPricing;
pub use context::{BillCalculation, PricingContext};
pub use industrial::IndustrialPricing;
pub use residential::ResidentialPricing;

/// Base amount and its itemization as computed by a strategy
#[derive(Debug, Clone, PartialEq)]
pub struct PricedConsumption {
    pub total: f64,
    pub breakdown: Breakdown,
}

/// Consumer classes with a dedicated pricing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerClass {
    Residential,
    Commercial,
    Industrial,
}

impl ConsumerClass {
    pub const ALL: [ConsumerClass; 3] = [
        ConsumerClass::Residential,
        ConsumerClass::Commercial,
        ConsumerClass::Industrial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConsumerClass::Residential => "residential",
            ConsumerClass::Commercial => "commercial",
            ConsumerClass::Industrial => "industrial",
        }
    }
}

impl FromStr for ConsumerClass {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        ConsumerClass::ALL
            .into_iter()
            .find(|class| class.name() == s)
            .ok_or_else(|| {
                BillingError::invalid_input(format!(
                    "unknown consumer class '{}', expected one of: residential, commercial, industrial",
                    s
                ))
            })
    }
}

impl fmt::Display for ConsumerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed set of pricing algorithms
#[derive(Debug, Clone, PartialEq)]
pub enum PricingStrategy {
    Residential(ResidentialPricing),
    Commercial(CommercialPricing),
    Industrial(IndustrialPricing),
}

impl PricingStrategy {
    /// Strategy for `class` at the built-in default rates
    pub fn for_class(class: ConsumerClass) -> Self {
        match class {
            ConsumerClass::Residential => PricingStrategy::Residential(ResidentialPricing::default()),
            ConsumerClass::Commercial => PricingStrategy::Commercial(CommercialPricing::default()),
            ConsumerClass::Industrial => PricingStrategy::Industrial(IndustrialPricing::default()),
        }
    }

    /// Strategy for `class` at the rates currently in `table`
    ///
    /// # Errors
    /// `NotFound` if the table lacks one of the class's rate keys
    pub fn from_rate_table(class: ConsumerClass, table: &RateTable) -> Result<Self> {
        Ok(match class {
            ConsumerClass::Residential => {
                PricingStrategy::Residential(ResidentialPricing::from_rate_table(table)?)
            }
            ConsumerClass::Commercial => {
                PricingStrategy::Commercial(CommercialPricing::from_rate_table(table)?)
            }
            ConsumerClass::Industrial => {
                PricingStrategy::Industrial(IndustrialPricing::from_rate_table(table)?)
            }
        })
    }

    pub fn consumer_class(&self) -> ConsumerClass {
        match self {
            PricingStrategy::Residential(_) => ConsumerClass::Residential,
            PricingStrategy::Commercial(_) => ConsumerClass::Commercial,
            PricingStrategy::Industrial(_) => ConsumerClass::Industrial,
        }
    }

    /// Base amount and breakdown for `consumption_kwh`
    ///
    /// Does not validate its input; [`PricingContext::calculate_bill`] rejects
    /// negative consumption before delegating here.
    pub fn calculate(&self, consumption_kwh: f64) -> PricedConsumption {
        match self {
            PricingStrategy::Residential(pricing) => pricing.calculate(consumption_kwh),
            PricingStrategy::Commercial(pricing) => pricing.calculate(consumption_kwh),
            PricingStrategy::Industrial(pricing) => pricing.calculate(consumption_kwh),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            PricingStrategy::Residential(_) => ResidentialPricing::DESCRIPTION,
            PricingStrategy::Commercial(_) => CommercialPricing::DESCRIPTION,
            PricingStrategy::Industrial(_) => IndustrialPricing::DESCRIPTION,
        }
    }
}

/// Build a fresh strategy for a consumer-class name, priced from `table`
///
/// # Errors
/// `InvalidInput` for any name other than "residential", "commercial" or
/// "industrial"
pub fn create_strategy(name: &str, table: &RateTable) -> Result<PricingStrategy> {
    let class: ConsumerClass = name.parse()?;
    PricingStrategy::from_rate_table(class, table)
}
