//! Rate table snapshots
//!
//! Export produces a complete [`RateTableSnapshot`]. Import takes a
//! [`RateTablePatch`], where every field is optional and only the fields
//! present overwrite the table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, Result};

/// Complete exported state of a rate table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTableSnapshot {
    /// Reference month label (e.g. "03/2025")
    pub reference_month: String,

    /// Time of the last mutation before export
    pub updated_at: DateTime<Utc>,

    /// Tariffs per key
    pub rates: BTreeMap<String, f64>,

    /// Flag unit prices per 100 kWh
    pub flags: BTreeMap<String, f64>,
}

/// Partial rate table state accepted by import
///
/// `updated_at` is accepted for round-tripping exported snapshots but is
/// ignored: import always stamps the table with the current time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTablePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_month: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<BTreeMap<String, f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<BTreeMap<String, f64>>,
}

impl RateTablePatch {
    /// Check every price before anything is applied
    pub fn validate(&self) -> Result<()> {
        for (key, price) in self.rates.iter().flatten() {
            ensure_non_negative(&format!("rate '{}'", key), *price)?;
        }
        for (key, price) in self.flags.iter().flatten() {
            ensure_non_negative(&format!("flag price '{}'", key), *price)?;
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<RateTableSnapshot> for RateTablePatch {
    fn from(snapshot: RateTableSnapshot) -> Self {
        RateTablePatch {
            reference_month: Some(snapshot.reference_month),
            updated_at: Some(snapshot.updated_at),
            rates: Some(snapshot.rates),
            flags: Some(snapshot.flags),
        }
    }
}

impl RateTableSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_fields_are_optional() {
        let patch = RateTablePatch::from_json_str(r#"{"reference_month": "01/2025"}"#).unwrap();
        assert_eq!(patch.reference_month.as_deref(), Some("01/2025"));
        assert!(patch.rates.is_none());
        assert!(patch.flags.is_none());
    }

    #[test]
    fn test_patch_rejects_negative_prices() {
        let patch = RateTablePatch::from_json_str(
            r#"{"rates": {"commercial_base": 0.8}, "flags": {"yellow": -1.0}}"#,
        )
        .unwrap();
        assert!(patch.validate().unwrap_err().is_invalid_value());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = RateTablePatch::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, crate::BillingError::Serialization(_)));
    }
}
