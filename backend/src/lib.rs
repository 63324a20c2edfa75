//! Energy Billing Core
//!
//! Computes an electricity bill from a consumer class and a monthly
//! consumption, then layers optional surcharges on top of the base amount.
//!
//! # Architecture
//!
//! - **rates**: shared, mutable rate table (tariffs and flag prices)
//! - **pricing**: per-consumer-class pricing strategies and the pricing context
//! - **surcharge**: owned chain of surcharges over a base amount
//! - **models**: itemized breakdown
//! - **config**: billing configuration loaded from JSON
//!
//! # Critical Invariants
//!
//! 1. Breakdown values always sum to the total they itemize
//! 2. Rate table prices are never negative; failed mutations never apply
//! 3. Taxes compound on the running total, so surcharge order matters
//!
//! # Example
//!
//! ```
//! use energy_billing_core::{assemble_bill, create_strategy, PricingContext, RateTable, TariffFlag};
//!
//! let table = RateTable::new();
//! let context = PricingContext::new(create_strategy("commercial", &table).unwrap());
//! let base = context.calculate_bill(600.0).unwrap();
//!
//! let bill = assemble_bill(base.total, 600.0, TariffFlag::Green, false, true).unwrap();
//! assert!((bill.amount() - (427.50 + 15.0)).abs() < 1e-9);
//! assert!((bill.breakdown().sum() - bill.amount()).abs() < 1e-9);
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod models;
pub mod pricing;
pub mod rates;
pub mod surcharge;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-exports for convenience
pub use config::{BillingConfig, FlagPricing};
pub use error::{BillingError, Result};
pub use models::{Breakdown, BreakdownEntry};
pub use pricing::{
    create_strategy, BillCalculation, ConsumerClass, PricedConsumption, PricingContext,
    PricingStrategy,
};
pub use rates::{rate_table, RateTable, RateTablePatch, RateTableSnapshot};
pub use surcharge::{
    assemble_bill, assemble_with_config, BillComponent, Surcharge, TariffFlag, TaxKind,
};
