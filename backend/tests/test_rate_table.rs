//! Integration tests for the rate table
//!
//! Tests cover:
//! - Lookups, mutations and validation
//! - Reset to defaults
//! - Snapshot export/import (struct and JSON)
//! - Shared state between handles and the process-wide accessors
//! - Recreating the process-wide table after a reset
//! - Concurrent writers

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use energy_billing_core::rates::{
    rate_table, RateTable, RateTablePatch, COMMERCIAL_BASE, INDUSTRIAL_DEMAND, RESIDENTIAL_TIER_1,
};
use energy_billing_core::testing::reset_global_rate_table;

/// Serializes tests that touch the process-wide table
static GLOBAL_GUARD: Mutex<()> = Mutex::new(());

fn global_guard() -> MutexGuard<'static, ()> {
    GLOBAL_GUARD.lock().unwrap_or_else(PoisonError::into_inner)
}

#[test]
fn test_defaults_on_construction() {
    let table = RateTable::isolated();
    assert_eq!(table.get_rate(RESIDENTIAL_TIER_1).unwrap(), 0.50);
    assert_eq!(table.get_rate(INDUSTRIAL_DEMAND).unwrap(), 25.00);
    assert_eq!(table.get_flag_price("red-tier-2").unwrap(), 7.00);
    assert_eq!(table.get_all_rates().len(), 6);
    assert_eq!(table.get_all_flag_prices().len(), 4);
}

#[test]
fn test_reference_month_defaults_to_current_month() {
    let table = RateTable::isolated();
    let month = table.reference_month();
    assert_eq!(month.len(), 7);
    assert_eq!(&month[2..3], "/");
}

#[test]
fn test_set_rate_inserts_new_key() {
    let table = RateTable::isolated();
    table.set_rate("rural_base", 0.40).unwrap();
    assert_eq!(table.get_rate("rural_base").unwrap(), 0.40);
    assert_eq!(table.get_all_rates().len(), 7);
}

#[test]
fn test_negative_rate_rejected_and_table_unchanged() {
    let table = RateTable::isolated();
    let before = table.get_all_rates();
    let stamp = table.updated_at();

    let err = table.set_rate(RESIDENTIAL_TIER_1, -1.0).unwrap_err();
    assert!(err.is_invalid_value());
    assert_eq!(table.get_all_rates(), before);
    assert_eq!(table.updated_at(), stamp);
}

#[test]
fn test_negative_flag_price_rejected() {
    let table = RateTable::isolated();
    assert!(table.set_flag_price("yellow", -0.5).unwrap_err().is_invalid_value());
    assert_eq!(table.get_flag_price("yellow").unwrap(), 1.50);
}

#[test]
fn test_rates_and_flags_are_separate_namespaces() {
    let table = RateTable::isolated();
    table.set_rate("yellow", 9.0).unwrap();
    assert_eq!(table.get_flag_price("yellow").unwrap(), 1.50);
    assert!(table.get_rate("green").unwrap_err().is_not_found());
}

#[test]
fn test_reset_restores_defaults_after_any_history() {
    let table = RateTable::isolated();
    table.set_rate(RESIDENTIAL_TIER_1, 2.0).unwrap();
    table.set_rate("extra", 1.0).unwrap();
    table.set_flag_price("green", 3.0).unwrap();

    table.reset_to_defaults();

    assert_eq!(table.get_rate(RESIDENTIAL_TIER_1).unwrap(), 0.50);
    assert!(table.get_rate("extra").unwrap_err().is_not_found());
    assert_eq!(table.get_flag_price("green").unwrap(), 0.00);
}

#[test]
fn test_snapshot_round_trip() {
    let source = RateTable::isolated();
    source.set_reference_month("03/2025");
    source.set_rate(COMMERCIAL_BASE, 0.82).unwrap();
    source.set_flag_price("yellow", 1.88).unwrap();

    let target = RateTable::isolated();
    target.import_snapshot(source.export_snapshot()).unwrap();

    assert_eq!(target.reference_month(), "03/2025");
    assert_eq!(target.get_all_rates(), source.get_all_rates());
    assert_eq!(target.get_all_flag_prices(), source.get_all_flag_prices());
}

#[test]
fn test_json_round_trip() {
    let source = RateTable::isolated();
    source.set_rate(COMMERCIAL_BASE, 0.9).unwrap();
    let json = source.to_json().unwrap();

    assert!(json.contains("\"reference_month\""));
    assert!(json.contains("\"updated_at\""));

    let target = RateTable::isolated();
    target.import_json(&json).unwrap();
    assert_eq!(target.get_rate(COMMERCIAL_BASE).unwrap(), 0.9);
}

#[test]
fn test_partial_import_only_touches_present_fields() {
    let table = RateTable::isolated();
    table.set_reference_month("01/2024");

    let mut flags = BTreeMap::new();
    flags.insert("yellow".to_string(), 2.0);
    table
        .import_snapshot(RateTablePatch {
            flags: Some(flags),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(table.reference_month(), "01/2024");
    assert_eq!(table.get_all_rates().len(), 6);
    // Present maps replace the stored map wholesale
    assert_eq!(table.get_all_flag_prices().len(), 1);
    assert_eq!(table.get_flag_price("yellow").unwrap(), 2.0);
}

#[test]
fn test_empty_import_refreshes_timestamp() {
    let table = RateTable::isolated();
    let before = table.updated_at();
    thread::sleep(std::time::Duration::from_millis(2));

    table.import_snapshot(RateTablePatch::default()).unwrap();
    assert!(table.updated_at() > before);
}

#[test]
fn test_invalid_import_applies_nothing() {
    let table = RateTable::isolated();
    let before = table.export_snapshot();

    let err = table
        .import_json(r#"{"reference_month": "09/2030", "rates": {"commercial_base": -3.0}}"#)
        .unwrap_err();
    assert!(err.is_invalid_value());
    assert_eq!(table.export_snapshot(), before);
}

#[test]
fn test_clones_share_state() {
    let table = RateTable::isolated();
    let handle = table.clone();
    handle.set_rate(COMMERCIAL_BASE, 1.1).unwrap();

    assert!(table.same_instance(&handle));
    assert_eq!(table.get_rate(COMMERCIAL_BASE).unwrap(), 1.1);
}

#[test]
fn test_independent_tables_do_not_share_state() {
    let a = RateTable::isolated();
    let b = RateTable::isolated();
    a.set_rate(COMMERCIAL_BASE, 5.0).unwrap();

    assert!(!a.same_instance(&b));
    assert_eq!(b.get_rate(COMMERCIAL_BASE).unwrap(), 0.75);
}

#[test]
fn test_all_access_paths_share_one_table() {
    let _guard = global_guard();
    reset_global_rate_table();

    let constructed = RateTable::new();
    let defaulted = RateTable::default();
    let global = RateTable::global();
    let convenience = rate_table();

    assert!(constructed.same_instance(&global));
    assert!(defaulted.same_instance(&global));
    assert!(convenience.same_instance(&global));

    constructed.set_rate(COMMERCIAL_BASE, 9.0).unwrap();
    assert_eq!(convenience.get_rate(COMMERCIAL_BASE).unwrap(), 9.0);
    assert_eq!(defaulted.get_rate(COMMERCIAL_BASE).unwrap(), 9.0);
}

#[test]
fn test_reset_recreates_global_with_defaults() {
    let _guard = global_guard();
    reset_global_rate_table();

    let before = rate_table();
    before.set_rate(RESIDENTIAL_TIER_1, 3.0).unwrap();
    before.set_flag_price("yellow", 5.0).unwrap();

    reset_global_rate_table();
    let after = RateTable::global();

    assert!(!before.same_instance(&after));
    assert!(after.same_instance(&rate_table()));
    assert_eq!(after.get_rate(RESIDENTIAL_TIER_1).unwrap(), 0.50);
    assert_eq!(after.get_flag_price("yellow").unwrap(), 1.50);
    // Old handles keep the discarded table
    assert_eq!(before.get_rate(RESIDENTIAL_TIER_1).unwrap(), 3.0);
}

#[test]
fn test_concurrent_writers_lose_no_updates() {
    let table = RateTable::isolated();
    let writers = 32;

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let table = table.clone();
            thread::spawn(move || {
                table.set_rate(&format!("concurrent_{}", i), i as f64).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let rates = table.get_all_rates();
    for i in 0..writers {
        assert_eq!(rates[&format!("concurrent_{}", i)], i as f64);
    }
    assert_eq!(rates.len(), 6 + writers);
}

#[test]
fn test_concurrent_writers_through_global_handle() {
    let _guard = global_guard();
    reset_global_rate_table();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            thread::spawn(move || {
                rate_table()
                    .set_rate(&format!("global_concurrent_{}", i), 1.0)
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let table = RateTable::global();
    for i in 0..16 {
        assert_eq!(table.get_rate(&format!("global_concurrent_{}", i)).unwrap(), 1.0);
    }
    assert_eq!(table.get_all_rates().len(), 6 + 16);
}
