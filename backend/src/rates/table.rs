//! Rate table storage and the process-wide instance
//!
//! # Critical Invariants
//!
//! 1. Every stored price is finite and >= 0
//! 2. Validation happens before the write lock mutates anything, so a failed
//!    mutation leaves the table untouched
//! 3. Every successful mutation refreshes `updated_at`
//! 4. Concurrent first access to [`RateTable::global`] yields one instance

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::snapshot::{RateTablePatch, RateTableSnapshot};
use super::{default_flag_prices, default_rates};
use crate::error::{ensure_non_negative, BillingError, Result};

/// Slot holding the process-wide table, filled on first access
static GLOBAL: Mutex<Option<RateTable>> = Mutex::new(None);

#[derive(Debug)]
struct RateTableState {
    rates: BTreeMap<String, f64>,
    flags: BTreeMap<String, f64>,
    reference_month: String,
    updated_at: DateTime<Utc>,
}

impl RateTableState {
    fn with_defaults() -> Self {
        let now = Utc::now();
        Self {
            rates: default_rates(),
            flags: default_flag_prices(),
            reference_month: now.format("%m/%Y").to_string(),
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Shared handle to a rate table
///
/// Cloning the handle does not copy the table: all clones read and write the
/// same state, guarded by a read/write lock.
///
/// # Example
/// ```
/// use energy_billing_core::rates::{RateTable, COMMERCIAL_BASE};
///
/// let table = RateTable::new();
/// let handle = table.clone();
///
/// handle.set_rate(COMMERCIAL_BASE, 0.80).unwrap();
/// assert_eq!(table.get_rate(COMMERCIAL_BASE).unwrap(), 0.80);
///
/// table.reset_to_defaults();
/// assert_eq!(handle.get_rate(COMMERCIAL_BASE).unwrap(), 0.75);
/// ```
#[derive(Clone)]
pub struct RateTable {
    inner: Arc<RwLock<RateTableState>>,
}

impl RateTable {
    fn with_default_state() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RateTableState::with_defaults())),
        }
    }

    /// Handle to the process-wide table
    ///
    /// Same as [`RateTable::global`]: every construction path observes one
    /// table per process.
    pub fn new() -> Self {
        Self::global()
    }

    /// Handle to the process-wide table, created on first call
    pub fn global() -> RateTable {
        let mut slot = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert_with(|| {
            debug!("creating process-wide rate table");
            RateTable::with_default_state()
        })
        .clone()
    }

    /// Table detached from the process-wide one, loaded with defaults
    #[cfg(any(test, feature = "test-util"))]
    pub fn isolated() -> Self {
        Self::with_default_state()
    }

    /// Drop the process-wide table so the next access recreates it
    #[cfg(any(test, feature = "test-util"))]
    pub(crate) fn discard_global() {
        let mut slot = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// True when both handles point at the same underlying table
    pub fn same_instance(&self, other: &RateTable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, RateTableState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RateTableState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Tariffs
    // ------------------------------------------------------------------

    /// Price stored under `key`
    ///
    /// # Errors
    /// `NotFound` if the key is absent
    pub fn get_rate(&self, key: &str) -> Result<f64> {
        self.read()
            .rates
            .get(key)
            .copied()
            .ok_or_else(|| BillingError::NotFound {
                namespace: "rate",
                key: key.to_string(),
            })
    }

    /// Independent copy of every tariff
    pub fn get_all_rates(&self) -> BTreeMap<String, f64> {
        self.read().rates.clone()
    }

    /// Insert or overwrite a tariff
    ///
    /// # Errors
    /// `InvalidValue` if `price` is negative; the table is left unchanged
    pub fn set_rate(&self, key: &str, price: f64) -> Result<()> {
        ensure_non_negative(&format!("rate '{}'", key), price)?;
        let mut state = self.write();
        state.rates.insert(key.to_string(), price);
        state.touch();
        debug!(key, price, "rate updated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    /// Unit price (per 100 kWh) stored for flag `name`
    ///
    /// # Errors
    /// `NotFound` if the flag is absent
    pub fn get_flag_price(&self, name: &str) -> Result<f64> {
        self.read()
            .flags
            .get(name)
            .copied()
            .ok_or_else(|| BillingError::NotFound {
                namespace: "flag",
                key: name.to_string(),
            })
    }

    /// Independent copy of every flag price
    pub fn get_all_flag_prices(&self) -> BTreeMap<String, f64> {
        self.read().flags.clone()
    }

    /// Insert or overwrite a flag unit price
    ///
    /// # Errors
    /// `InvalidValue` if `price` is negative; the table is left unchanged
    pub fn set_flag_price(&self, name: &str, price: f64) -> Result<()> {
        ensure_non_negative(&format!("flag price '{}'", name), price)?;
        let mut state = self.write();
        state.flags.insert(name.to_string(), price);
        state.touch();
        debug!(flag = name, price, "flag price updated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn reference_month(&self) -> String {
        self.read().reference_month.clone()
    }

    pub fn set_reference_month(&self, month: impl Into<String>) {
        let month = month.into();
        let mut state = self.write();
        debug!(from = %state.reference_month, to = %month, "reference month updated");
        state.reference_month = month;
        state.touch();
    }

    /// Time of the last mutation
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.read().updated_at
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// Restore the built-in tariffs and flag prices in one step
    ///
    /// The reference month is kept.
    pub fn reset_to_defaults(&self) {
        let mut state = self.write();
        state.rates = default_rates();
        state.flags = default_flag_prices();
        state.touch();
        info!("rate table reset to defaults");
    }

    /// Consistent copy of the whole table
    pub fn export_snapshot(&self) -> RateTableSnapshot {
        let state = self.read();
        RateTableSnapshot {
            reference_month: state.reference_month.clone(),
            updated_at: state.updated_at,
            rates: state.rates.clone(),
            flags: state.flags.clone(),
        }
    }

    /// Overwrite the fields present in `patch`
    ///
    /// Present maps replace the stored maps wholesale. The timestamp is
    /// always refreshed, even for an empty patch.
    ///
    /// # Errors
    /// `InvalidValue` if any price in the patch is negative; nothing is applied
    pub fn import_snapshot(&self, patch: impl Into<RateTablePatch>) -> Result<()> {
        let patch = patch.into();
        patch.validate()?;

        let mut state = self.write();
        if let Some(month) = patch.reference_month {
            state.reference_month = month;
        }
        if let Some(rates) = patch.rates {
            state.rates = rates;
        }
        if let Some(flags) = patch.flags {
            state.flags = flags;
        }
        state.touch();
        info!(
            reference_month = %state.reference_month,
            rates = state.rates.len(),
            flags = state.flags.len(),
            "rate table imported"
        );
        Ok(())
    }

    /// Export the snapshot as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        self.export_snapshot().to_json()
    }

    /// Import a (possibly partial) snapshot from JSON
    pub fn import_json(&self, json: &str) -> Result<()> {
        self.import_snapshot(RateTablePatch::from_json_str(json)?)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("RateTable")
            .field("reference_month", &state.reference_month)
            .field("rates", &state.rates)
            .field("flags", &state.flags)
            .field("updated_at", &state.updated_at)
            .finish()
    }
}

impl fmt::Display for RateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        write!(
            f,
            "RateTable(month={}, rates={}, flags={})",
            state.reference_month,
            state.rates.len(),
            state.flags.len()
        )
    }
}

/// Convenience accessor for the process-wide table
pub fn rate_table() -> RateTable {
    RateTable::global()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{COMMERCIAL_BASE, RESIDENTIAL_TIER_1};
    use std::thread;

    /// Serializes tests that touch the process-wide slot
    static GLOBAL_GUARD: Mutex<()> = Mutex::new(());

    fn global_guard() -> std::sync::MutexGuard<'static, ()> {
        GLOBAL_GUARD.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn test_get_missing_rate_is_not_found() {
        let table = RateTable::isolated();
        assert!(table.get_rate("nope").unwrap_err().is_not_found());
        assert!(table.get_flag_price("purple").unwrap_err().is_not_found());
    }

    #[test]
    fn test_negative_rate_leaves_table_unchanged() {
        let table = RateTable::isolated();
        let before = table.export_snapshot();

        let err = table.set_rate(RESIDENTIAL_TIER_1, -1.0).unwrap_err();
        assert!(err.is_invalid_value());

        let after = table.export_snapshot();
        assert_eq!(before, after);
    }

    #[test]
    fn test_mutation_refreshes_timestamp() {
        let table = RateTable::isolated();
        let before = table.updated_at();
        thread::sleep(std::time::Duration::from_millis(2));
        table.set_flag_price("yellow", 2.0).unwrap();
        assert!(table.updated_at() > before);
    }

    #[test]
    fn test_returned_maps_are_copies() {
        let table = RateTable::isolated();
        let mut rates = table.get_all_rates();
        rates.insert(COMMERCIAL_BASE.to_string(), 99.0);
        rates.remove(RESIDENTIAL_TIER_1);

        assert_eq!(table.get_rate(COMMERCIAL_BASE).unwrap(), 0.75);
        assert_eq!(table.get_rate(RESIDENTIAL_TIER_1).unwrap(), 0.50);
    }

    #[test]
    fn test_reset_keeps_reference_month() {
        let table = RateTable::isolated();
        table.set_reference_month("12/2024");
        table.set_rate(RESIDENTIAL_TIER_1, 0.9).unwrap();
        table.reset_to_defaults();

        assert_eq!(table.reference_month(), "12/2024");
        assert_eq!(table.get_rate(RESIDENTIAL_TIER_1).unwrap(), 0.50);
    }

    #[test]
    fn test_display_summary() {
        let table = RateTable::isolated();
        table.set_reference_month("05/2025");
        assert_eq!(table.to_string(), "RateTable(month=05/2025, rates=6, flags=4)");
    }

    #[test]
    fn test_global_accessors_share_state() {
        let _guard = global_guard();
        RateTable::discard_global();

        let a = RateTable::global();
        let b = rate_table();
        assert!(a.same_instance(&b));

        a.set_rate("shared_key", 1.25).unwrap();
        assert_eq!(b.get_rate("shared_key").unwrap(), 1.25);
    }

    #[test]
    fn test_discard_global_forces_fresh_instance() {
        let _guard = global_guard();
        RateTable::discard_global();

        let first = RateTable::global();
        first.set_rate(RESIDENTIAL_TIER_1, 3.0).unwrap();

        RateTable::discard_global();
        let second = RateTable::global();

        assert!(!first.same_instance(&second));
        assert_eq!(second.get_rate(RESIDENTIAL_TIER_1).unwrap(), 0.50);
    }

    #[test]
    fn test_direct_construction_is_process_wide() {
        let _guard = global_guard();
        RateTable::discard_global();

        let constructed = RateTable::new();
        let defaulted = RateTable::default();
        constructed.set_rate(COMMERCIAL_BASE, 9.0).unwrap();

        assert!(constructed.same_instance(&RateTable::global()));
        assert!(defaulted.same_instance(&rate_table()));
        assert_eq!(RateTable::global().get_rate(COMMERCIAL_BASE).unwrap(), 9.0);
    }

    #[test]
    fn test_concurrent_first_access_yields_one_instance() {
        let _guard = global_guard();
        RateTable::discard_global();

        let handles: Vec<_> = (0..16).map(|_| thread::spawn(RateTable::global)).collect();
        let tables: Vec<RateTable> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for table in &tables[1..] {
            assert!(tables[0].same_instance(table));
        }
    }
}
