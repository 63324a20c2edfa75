//! Test-only helpers
//!
//! Compiled for unit tests and behind the `test-util` feature. Not part of
//! the production surface.

use crate::rates::RateTable;

/// Discard the process-wide rate table
///
/// The next call to [`RateTable::global`] or [`crate::rates::rate_table`]
/// creates a fresh table with the built-in defaults. Handles obtained before
/// the reset keep pointing at the discarded table.
pub fn reset_global_rate_table() {
    RateTable::discard_global();
}
