//! # Validation Policy
//!
//! The tunable constants the document validators apply. Defaults reproduce
//! the authority's published limits; a YAML file may override any subset.
//!
//! ```yaml
//! note_max_age_days: 180
//! shipment_max_lead_days: 5
//! recompute_withholding: true
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest day count a policy window may span (one hundred years).
pub const MAX_POLICY_DAYS: i64 = 36_500;

/// Limits and switches consulted by the document validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationPolicy {
    /// Oldest original document a credit or debit note may modify, in days
    /// before the note's emission date.
    pub note_max_age_days: i64,
    /// Latest transport start after a shipment guide's emission, in days.
    /// Transport may never start before emission.
    pub shipment_max_lead_days: i64,
    /// Furthest a shipment guide's transport start may lie after today.
    pub shipment_max_future_days: i64,
    /// Maximum recipients on one shipment guide.
    pub shipment_max_recipients: usize,
    /// Maximum line items per shipment recipient.
    pub shipment_max_items_per_recipient: usize,
    /// Minimum length of origin and destination addresses.
    pub address_min_len: usize,
    /// Check each withholding line's withheld amount against base × rate.
    pub recompute_withholding: bool,
    /// Absolute tolerance for the recomputation above.
    pub withholding_tolerance: Decimal,
    /// Apply the "not more than the original" cap to debit notes as well as
    /// credit notes.
    pub cap_debit_note_amount: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            note_max_age_days: 180,
            shipment_max_lead_days: 5,
            shipment_max_future_days: 30,
            shipment_max_recipients: 10,
            shipment_max_items_per_recipient: 100,
            address_min_len: 10,
            recompute_withholding: false,
            withholding_tolerance: Decimal::new(1, 2),
            cap_debit_note_amount: true,
        }
    }
}

impl ValidationPolicy {
    /// Parse a policy from YAML. Absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed YAML or unknown keys and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let policy: Self = serde_yaml::from_str(yaml)?;
        policy.check()?;
        Ok(policy)
    }

    /// Read and parse a policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let policy = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), "validation policy loaded");
        Ok(policy)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let day_counts = [
            ("note_max_age_days", self.note_max_age_days),
            ("shipment_max_lead_days", self.shipment_max_lead_days),
            ("shipment_max_future_days", self.shipment_max_future_days),
        ];
        for (field, value) in day_counts {
            if !(0..=MAX_POLICY_DAYS).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be between 0 and {MAX_POLICY_DAYS} days, got {value}"),
                });
            }
        }
        if self.shipment_max_recipients == 0 {
            return Err(ConfigError::Invalid {
                field: "shipment_max_recipients",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.shipment_max_items_per_recipient == 0 {
            return Err(ConfigError::Invalid {
                field: "shipment_max_items_per_recipient",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.withholding_tolerance.is_sign_negative() {
            return Err(ConfigError::Invalid {
                field: "withholding_tolerance",
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}
