//! Domain models shared by pricing and surcharges

pub mod breakdown;

// Re-exports
pub use breakdown::{Breakdown, BreakdownEntry};
