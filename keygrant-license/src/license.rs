//! License records as delivered inside a signed payload.
//!
//! These are plain data. Nothing here enforces feature gating or expiry;
//! that is the embedding application's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The customer a license belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company_name: String,
    /// Creation time (seconds since epoch).
    #[serde(default)]
    pub created: i64,
}

/// A machine a license has been activated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivationData {
    /// Machine code of the activated device.
    pub mid: String,
    #[serde(default)]
    pub ip: String,
    /// Activation time (seconds since epoch).
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub friendly_name: Option<String>,
}

/// One license key record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LicenseRecord {
    pub id: i64,
    pub product_id: i64,
    pub key: String,
    /// Creation time (seconds since epoch).
    #[serde(default)]
    pub created: i64,
    /// Expiration time (seconds since epoch), 0 if none.
    #[serde(default)]
    pub expires: i64,
    /// Subscription period in days.
    #[serde(default)]
    pub period: i32,
    /// Feature flags F1..F8.
    #[serde(default)]
    pub features: Vec<bool>,
    #[serde(default)]
    pub block: bool,
    #[serde(default)]
    pub trial_activation: bool,
    #[serde(default)]
    pub max_no_of_machines: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub activated_machines: Vec<ActivationData>,
}

impl LicenseRecord {
    /// Returns the creation time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// Returns the expiration time, or None if the record has none.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.expires, 0)
    }
}

/// Licenses and machine list decoded from a verified license response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LicensePayload {
    #[serde(default)]
    pub licenses: Vec<LicenseRecord>,
    /// Machines the payload is valid for. Empty means any machine.
    #[serde(default)]
    pub activated_machine_codes: Vec<String>,
}

impl LicensePayload {
    /// Returns true if `machine_code` may use this payload.
    #[must_use]
    pub fn authorizes(&self, machine_code: &str) -> bool {
        self.activated_machine_codes.is_empty()
            || self.activated_machine_codes.iter().any(|m| m == machine_code)
    }
}
