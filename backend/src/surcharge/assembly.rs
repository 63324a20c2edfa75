//! Canonical surcharge composition
//!
//! Default order: flag → PIS/COFINS → ICMS → lighting fee. Callers needing
//! another order build the chain directly with the `with_*` methods.

use super::{BillComponent, TariffFlag, TaxKind};
use crate::config::{BillingConfig, FlagPricing};
use crate::error::Result;
use crate::rates::RateTable;

/// Build a bill in the canonical order
///
/// # Arguments
/// * `base_amount` - amount computed by a pricing strategy
/// * `consumption_kwh` - consumption used to price the flag
/// * `flag` - flag in effect
/// * `include_taxes` - add PIS/COFINS then ICMS
/// * `include_lighting_fee` - add the default 15.00 lighting fee
///
/// # Example
/// ```
/// use energy_billing_core::surcharge::{assemble_bill, TariffFlag};
///
/// let bill = assemble_bill(100.0, 200.0, TariffFlag::Yellow, false, true).unwrap();
/// assert!((bill.amount() - 118.0).abs() < 1e-9); // 100 + 3 flag + 15 fee
/// ```
pub fn assemble_bill(
    base_amount: f64,
    consumption_kwh: f64,
    flag: TariffFlag,
    include_taxes: bool,
    include_lighting_fee: bool,
) -> Result<BillComponent> {
    let mut bill = BillComponent::base(base_amount)?.with_flag(flag, consumption_kwh)?;

    if include_taxes {
        bill = bill.with_tax(TaxKind::PisCofins).with_tax(TaxKind::Icms);
    }

    if include_lighting_fee {
        bill = bill.with_default_lighting_fee();
    }

    Ok(bill)
}

/// Build a bill from a [`BillingConfig`]
///
/// Order: configured flag → configured taxes (in order) → lighting fee →
/// municipal contribution when configured. The toggles mirror
/// [`assemble_bill`]. `table` is only read when the config prices flags from
/// the rate table.
pub fn assemble_with_config(
    base_amount: f64,
    consumption_kwh: f64,
    config: &BillingConfig,
    table: &RateTable,
    include_taxes: bool,
    include_lighting_fee: bool,
) -> Result<BillComponent> {
    let base = BillComponent::base(base_amount)?;
    let mut bill = match config.flag_pricing {
        FlagPricing::Builtin => base.with_flag(config.flag, consumption_kwh)?,
        FlagPricing::RateTable => base.with_flag_priced(config.flag, consumption_kwh, table)?,
    };

    if include_taxes {
        for kind in &config.taxes {
            bill = bill.with_tax(*kind);
        }
    }

    if include_lighting_fee {
        bill = bill.with_lighting_fee(config.lighting_fee)?;
    }

    if let Some(percent) = config.municipal_percentage {
        bill = bill.with_municipal_contribution(percent)?;
    }

    Ok(bill)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surcharge::{Surcharge, LIGHTING_FEE_LABEL};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_full_canonical_order() {
        let bill = assemble_bill(100.0, 200.0, TariffFlag::Yellow, true, true).unwrap();
        let kinds: Vec<&Surcharge> = bill.surcharges();
        assert_eq!(kinds.len(), 4);
        assert!(matches!(kinds[0], Surcharge::Flag { .. }));
        assert_eq!(kinds[1], &Surcharge::Tax(TaxKind::PisCofins));
        assert_eq!(kinds[2], &Surcharge::Tax(TaxKind::Icms));
        assert_eq!(kinds[3], &Surcharge::LightingFee(15.0));

        let expected = 103.0 * 1.0925 * 1.18 + 15.0;
        assert!((bill.amount() - expected).abs() < EPS);
    }

    #[test]
    fn test_without_taxes_or_fee() {
        let bill = assemble_bill(100.0, 200.0, TariffFlag::Green, false, false).unwrap();
        assert_eq!(bill.amount(), 100.0);
        assert_eq!(bill.breakdown().len(), 1);
    }

    #[test]
    fn test_without_fee_has_no_fee_line() {
        let bill = assemble_bill(100.0, 100.0, TariffFlag::Green, true, false).unwrap();
        assert!(!bill.breakdown().contains(LIGHTING_FEE_LABEL));
        assert!(bill.breakdown().contains("ICMS (18%)"));
    }

    #[test]
    fn test_negative_base_rejected() {
        let err = assemble_bill(-1.0, 100.0, TariffFlag::Green, true, true).unwrap_err();
        assert!(err.is_invalid_value());
    }

    #[test]
    fn test_config_assembly_adds_municipal_contribution() {
        let config = BillingConfig {
            lighting_fee: 10.0,
            municipal_percentage: Some(5.0),
            taxes: vec![TaxKind::Icms],
            flag: TariffFlag::RedTier1,
            flag_pricing: FlagPricing::Builtin,
            rate_table: None,
        };
        let bill = assemble_with_config(100.0, 100.0, &config, &RateTable::isolated(), true, true).unwrap();

        // (100 + 4.50) * 1.18 + 10 + 5% of 100
        let expected = 104.5 * 1.18 + 10.0 + 5.0;
        assert!((bill.amount() - expected).abs() < EPS);
        assert_eq!(
            bill.breakdown().get("municipal contribution (5.0%)"),
            Some(5.0)
        );
    }

    #[test]
    fn test_config_assembly_prices_flag_from_table() {
        let table = RateTable::isolated();
        table.set_flag_price("yellow", 2.0).unwrap();
        let config = BillingConfig {
            flag: TariffFlag::Yellow,
            flag_pricing: FlagPricing::RateTable,
            ..BillingConfig::default()
        };

        let bill = assemble_with_config(100.0, 300.0, &config, &table, false, false).unwrap();
        assert!((bill.amount() - 106.0).abs() < EPS);
    }
}
