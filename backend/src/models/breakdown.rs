//! Itemized breakdown of a bill
//!
//! An ordered, label-keyed account of every contribution to a total.
//! Insertion order is preserved so that the first entry is always the base
//! amount a chain was started from.

use serde::{Deserialize, Serialize};

/// One line of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub amount: f64,
}

/// Ordered mapping from line-item label to amount
///
/// Labels are unique. Recording a label that is already present adds the new
/// amount to the existing line instead of replacing it, so the values always
/// sum to the total even when the same surcharge kind is applied twice.
///
/// # Example
/// ```
/// use energy_billing_core::Breakdown;
///
/// let mut breakdown = Breakdown::new();
/// breakdown.record("energy consumption", 100.0);
/// breakdown.record("ICMS (18%)", 18.0);
/// assert_eq!(breakdown.len(), 2);
/// assert_eq!(breakdown.first_amount(), Some(100.0));
/// assert!((breakdown.sum() - 118.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakdown {
    entries: Vec<BreakdownEntry>,
}

impl Breakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contribution under `label`
    pub fn record(&mut self, label: impl Into<String>, amount: f64) {
        let label = label.into();
        match self.entries.iter_mut().find(|entry| entry.label == label) {
            Some(entry) => entry.amount += amount,
            None => self.entries.push(BreakdownEntry { label, amount }),
        }
    }

    /// Amount recorded under `label`, if any
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.amount)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Amount of the very first entry (the base a chain started from)
    pub fn first_amount(&self) -> Option<f64> {
        self.entries.first().map(|entry| entry.amount)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entries, discounts included
    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreakdownEntry> {
        self.entries.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }
}

impl<'a> IntoIterator for &'a Breakdown {
    type Item = &'a BreakdownEntry;
    type IntoIter = std::slice::Iter<'a, BreakdownEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
