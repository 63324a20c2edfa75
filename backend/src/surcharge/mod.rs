//! Surcharge Chain
//!
//! A bill is built as an owned, strictly linear chain: one base amount at the
//! root, wrapped by zero or more surcharges. Each wrapper sees the component it
//! wraps and adds its own contribution to the amount and the breakdown.
//!
//! # Contribution policies
//!
//! | surcharge | contribution | breakdown line |
//! |---|---|---|
//! | flag | `kwh / 100 * unit_price` | only when > 0 |
//! | tax | inner **current total** × rate | always |
//! | lighting fee | fixed fee | always |
//! | municipal contribution | percent × **first breakdown entry** | always |
//!
//! Taxes compound on everything wrapped before them, so wrapping order
//! changes the total. The municipal contribution is always levied on the raw
//! base amount, regardless of what it wraps.
//!
//! # Example
//! ```
//! use energy_billing_core::surcharge::{BillComponent, TariffFlag, TaxKind};
//!
//! let tax_then_fee = BillComponent::base(100.0).unwrap()
//!     .with_tax(TaxKind::Icms)
//!     .with_lighting_fee(15.0).unwrap();
//! let fee_then_tax = BillComponent::base(100.0).unwrap()
//!     .with_lighting_fee(15.0).unwrap()
//!     .with_tax(TaxKind::Icms);
//!
//! assert!((tax_then_fee.amount() - 133.00).abs() < 1e-9);
//! assert!((fee_then_tax.amount() - 135.70).abs() < 1e-9);
//! ```

use tracing::trace;

use crate::error::{ensure_consumption, ensure_non_negative, BillingError, Result};
use crate::models::Breakdown;
use crate::rates::RateTable;

pub mod assembly;
pub mod flag;
pub mod tax;

pub use assembly::{assemble_bill, assemble_with_config};
pub use flag::TariffFlag;
pub use tax::TaxKind;

/// Label of the base amount when none is given
pub const DEFAULT_BASE_LABEL: &str = "energy consumption";

/// Default public lighting fee
pub const DEFAULT_LIGHTING_FEE: f64 = 15.00;

/// Breakdown label of the public lighting fee
pub const LIGHTING_FEE_LABEL: &str = "public lighting fee";

/// Default municipal contribution, in percent
pub const DEFAULT_MUNICIPAL_PERCENT: f64 = 3.0;

/// Parameters of one wrapper in the chain
#[derive(Debug, Clone, PartialEq)]
pub enum Surcharge {
    /// Generation-cost markup billed per 100 kWh
    Flag {
        flag: TariffFlag,
        consumption_kwh: f64,
        /// Price per 100 kWh in effect when the wrapper was built
        unit_price: f64,
    },

    /// Percentage of the accumulated total
    Tax(TaxKind),

    /// Fixed public lighting fee
    LightingFee(f64),

    /// Percentage of the raw base amount
    MunicipalContribution {
        /// In percent, 0..=100
        percent: f64,
    },
}

impl Surcharge {
    fn validate(&self) -> Result<()> {
        match self {
            Surcharge::Flag {
                consumption_kwh,
                unit_price,
                ..
            } => {
                ensure_consumption(*consumption_kwh)?;
                ensure_non_negative("flag unit price", *unit_price)
            }
            Surcharge::Tax(_) => Ok(()),
            Surcharge::LightingFee(fee) => ensure_non_negative("lighting fee", *fee),
            Surcharge::MunicipalContribution { percent } => {
                if !(0.0..=100.0).contains(percent) {
                    return Err(BillingError::invalid_value(format!(
                        "municipal contribution must be between 0 and 100 percent, got {}",
                        percent
                    )));
                }
                Ok(())
            }
        }
    }

    /// Amount this surcharge adds on top of `inner`
    pub fn contribution(&self, inner: &BillComponent) -> f64 {
        match self {
            Surcharge::Flag {
                consumption_kwh,
                unit_price,
                ..
            } => consumption_kwh / 100.0 * unit_price,
            Surcharge::Tax(kind) => inner.amount() * kind.rate(),
            Surcharge::LightingFee(fee) => *fee,
            Surcharge::MunicipalContribution { percent } => {
                inner.breakdown().first_amount().unwrap_or(0.0) * percent / 100.0
            }
        }
    }

    /// Key of this surcharge's breakdown line
    pub fn breakdown_label(&self) -> String {
        match self {
            Surcharge::Flag { flag, .. } => flag.label().to_string(),
            Surcharge::Tax(kind) => kind.label().to_string(),
            Surcharge::LightingFee(_) => LIGHTING_FEE_LABEL.to_string(),
            Surcharge::MunicipalContribution { percent } => {
                format!("municipal contribution ({:.1}%)", percent)
            }
        }
    }

    /// Short name used when composing a chain description
    pub fn description(&self) -> &'static str {
        match self {
            Surcharge::Flag { flag, .. } => flag.label(),
            Surcharge::Tax(kind) => kind.label(),
            Surcharge::LightingFee(_) => LIGHTING_FEE_LABEL,
            Surcharge::MunicipalContribution { .. } => "municipal contribution",
        }
    }

    /// Flags stay out of the itemization when they cost nothing
    fn itemize(&self, contribution: f64) -> bool {
        match self {
            Surcharge::Flag { .. } => contribution > 0.0,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Base {
        amount: f64,
        label: String,
    },
    /// `contribution` and `amount` are fixed when the wrapper is built
    Wrapped {
        inner: Box<BillComponent>,
        surcharge: Surcharge,
        contribution: f64,
        amount: f64,
    },
}

/// One element of a surcharge chain
///
/// Either the base amount or a surcharge wrapping exactly one inner
/// component. Chains are built front to back by the consuming `with_*`
/// methods and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BillComponent {
    node: Node,
}

impl BillComponent {
    /// Base amount labelled "energy consumption"
    ///
    /// # Errors
    /// `InvalidValue` if `amount` is negative
    pub fn base(amount: f64) -> Result<Self> {
        Self::base_with_label(amount, DEFAULT_BASE_LABEL)
    }

    /// Base amount with a custom label
    pub fn base_with_label(amount: f64, label: impl Into<String>) -> Result<Self> {
        ensure_non_negative("base amount", amount)?;
        Ok(Self {
            node: Node::Base {
                amount,
                label: label.into(),
            },
        })
    }

    /// Wrap this component with `surcharge`
    ///
    /// # Errors
    /// `InvalidInput` for negative flag consumption, `InvalidValue` for a
    /// negative fee or price, or a percentage outside 0..=100. On error the
    /// chain is dropped; nothing else is affected.
    pub fn apply(self, surcharge: Surcharge) -> Result<Self> {
        surcharge.validate()?;
        Ok(self.wrap(surcharge))
    }

    /// Wrap without validation; only for parameters known to be valid
    fn wrap(self, surcharge: Surcharge) -> Self {
        let contribution = surcharge.contribution(&self);
        let amount = self.amount() + contribution;
        trace!(surcharge = surcharge.description(), contribution, "wrapping bill component");
        Self {
            node: Node::Wrapped {
                inner: Box::new(self),
                surcharge,
                contribution,
                amount,
            },
        }
    }

    /// Add a flag surcharge at the flag's built-in price
    pub fn with_flag(self, flag: TariffFlag, consumption_kwh: f64) -> Result<Self> {
        self.apply(Surcharge::Flag {
            flag,
            consumption_kwh,
            unit_price: flag.default_unit_price(),
        })
    }

    /// Add a flag surcharge priced from `table`'s flag prices
    ///
    /// # Errors
    /// `NotFound` if the table has no price for the flag
    pub fn with_flag_priced(
        self,
        flag: TariffFlag,
        consumption_kwh: f64,
        table: &RateTable,
    ) -> Result<Self> {
        let unit_price = table.get_flag_price(flag.key())?;
        self.apply(Surcharge::Flag {
            flag,
            consumption_kwh,
            unit_price,
        })
    }

    /// Add a tax computed on the current total
    pub fn with_tax(self, kind: TaxKind) -> Self {
        self.wrap(Surcharge::Tax(kind))
    }

    /// Add a fixed public lighting fee
    pub fn with_lighting_fee(self, fee: f64) -> Result<Self> {
        self.apply(Surcharge::LightingFee(fee))
    }

    /// Add the public lighting fee at its default of 15.00
    pub fn with_default_lighting_fee(self) -> Self {
        self.wrap(Surcharge::LightingFee(DEFAULT_LIGHTING_FEE))
    }

    /// Add a municipal contribution of `percent` of the raw base amount
    pub fn with_municipal_contribution(self, percent: f64) -> Result<Self> {
        self.apply(Surcharge::MunicipalContribution { percent })
    }

    /// Total amount including every wrapper
    pub fn amount(&self) -> f64 {
        match &self.node {
            Node::Base { amount, .. } | Node::Wrapped { amount, .. } => *amount,
        }
    }

    /// Composed description, base first
    pub fn description(&self) -> String {
        match &self.node {
            Node::Base { label, .. } => label.clone(),
            Node::Wrapped {
                inner, surcharge, ..
            } => format!("{} + {}", inner.description(), surcharge.description()),
        }
    }

    /// Itemized account of the amount; an owned copy
    pub fn breakdown(&self) -> Breakdown {
        let mut breakdown = Breakdown::new();
        for (surcharge, contribution) in self.layers() {
            match surcharge {
                None => breakdown.record(self.base_label().to_string(), contribution),
                Some(surcharge) if surcharge.itemize(contribution) => {
                    breakdown.record(surcharge.breakdown_label(), contribution)
                }
                Some(_) => {}
            }
        }
        breakdown
    }

    /// Base first, then each surcharge with its stored contribution
    fn layers(&self) -> Vec<(Option<&Surcharge>, f64)> {
        let mut layers = Vec::new();
        let mut current = self;
        loop {
            match &current.node {
                Node::Base { amount, .. } => {
                    layers.push((None, *amount));
                    break;
                }
                Node::Wrapped {
                    inner,
                    surcharge,
                    contribution,
                    ..
                } => {
                    layers.push((Some(surcharge), *contribution));
                    current = inner;
                }
            }
        }
        layers.reverse();
        layers
    }

    fn base_label(&self) -> &str {
        let mut current = self;
        loop {
            match &current.node {
                Node::Base { label, .. } => return label,
                Node::Wrapped { inner, .. } => current = inner,
            }
        }
    }

    /// Contribution of the outermost surcharge, `None` for the base
    pub fn contribution(&self) -> Option<f64> {
        match &self.node {
            Node::Base { .. } => None,
            Node::Wrapped { contribution, .. } => Some(*contribution),
        }
    }

    /// Amount at the root of the chain
    pub fn base_amount(&self) -> f64 {
        let mut current = self;
        loop {
            match &current.node {
                Node::Base { amount, .. } => return *amount,
                Node::Wrapped { inner, .. } => current = inner,
            }
        }
    }

    /// The wrapped component, `None` for the base
    pub fn inner(&self) -> Option<&BillComponent> {
        match &self.node {
            Node::Base { .. } => None,
            Node::Wrapped { inner, .. } => Some(inner),
        }
    }

    /// The surcharge applied by this element, `None` for the base
    pub fn surcharge(&self) -> Option<&Surcharge> {
        match &self.node {
            Node::Base { .. } => None,
            Node::Wrapped { surcharge, .. } => Some(surcharge),
        }
    }

    /// Surcharges from innermost to outermost
    pub fn surcharges(&self) -> Vec<&Surcharge> {
        let mut chain = Vec::new();
        let mut current = self;
        while let Node::Wrapped {
            inner, surcharge, ..
        } = &current.node
        {
            chain.push(surcharge);
            current = inner;
        }
        chain.reverse();
        chain
    }

    /// Number of wrappers around the base
    pub fn depth(&self) -> usize {
        self.surcharges().len()
    }
}
