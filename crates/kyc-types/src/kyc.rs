//! Verification record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The cached view of a verification record.
///
/// This is the shape held by the in-memory cache and written to the
/// snapshot file. A record is only ever cached when [`KycRecord::is_valid`]
/// holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycRecord {
    pub name: String,
    pub pan_number: String,
    pub merchant_id: Uuid,
}

impl KycRecord {
    pub fn new(name: impl Into<String>, pan_number: impl Into<String>, merchant_id: Uuid) -> Self {
        Self {
            name: name.into(),
            pan_number: pan_number.into(),
            merchant_id,
        }
    }

    /// Name and PAN must be non-empty and the merchant id must not be nil.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.pan_number.is_empty() && !self.merchant_id.is_nil()
    }

    /// Cache key for this record: the hyphenated merchant id.
    pub fn cache_key(&self) -> String {
        cache_key(&self.merchant_id)
    }
}

/// Textual form of a merchant id used as the cache and snapshot key.
pub fn cache_key(merchant_id: &Uuid) -> String {
    merchant_id.hyphenated().to_string()
}

/// A full row of the `kycs` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kyc {
    pub id: i64,
    pub name: String,
    pub pan_number: String,
    pub aadhar_number: Option<String>,
    pub merchant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Kyc {
    pub fn cache_key(&self) -> String {
        cache_key(&self.merchant_id)
    }
}

impl From<&Kyc> for KycRecord {
    fn from(kyc: &Kyc) -> Self {
        KycRecord {
            name: kyc.name.clone(),
            pan_number: kyc.pan_number.clone(),
            merchant_id: kyc.merchant_id,
        }
    }
}

/// Insert input for a new verification record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewKyc {
    pub name: String,
    pub pan_number: String,
    pub aadhar_number: Option<String>,
    /// Assigned by the store when absent or nil
    pub merchant_id: Option<Uuid>,
}

impl NewKyc {
    pub fn new(name: impl Into<String>, pan_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pan_number: pan_number.into(),
            ..Default::default()
        }
    }

    pub fn with_aadhar_number(mut self, aadhar_number: impl Into<String>) -> Self {
        self.aadhar_number = Some(aadhar_number.into());
        self
    }

    pub fn with_merchant_id(mut self, merchant_id: Uuid) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    /// The caller-supplied merchant id, or a fresh v4 id if none (or nil) was given.
    pub fn resolve_merchant_id(&self) -> Uuid {
        match self.merchant_id {
            Some(id) if !id.is_nil() => id,
            _ => Uuid::new_v4(),
        }
    }
}

/// Field updates applied to an existing record.
///
/// Empty strings are treated as "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KycUpdate {
    pub pan_number: Option<String>,
    pub aadhar_number: Option<String>,
}

impl KycUpdate {
    pub fn new(pan_number: Option<String>, aadhar_number: Option<String>) -> Self {
        Self {
            pan_number: pan_number.filter(|s| !s.is_empty()),
            aadhar_number: aadhar_number.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pan_number.is_none() && self.aadhar_number.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_validity() {
        let id = Uuid::new_v4();
        assert!(KycRecord::new("Acme", "ABCDE1234F", id).is_valid());
        assert!(!KycRecord::new("", "ABCDE1234F", id).is_valid());
        assert!(!KycRecord::new("Acme", "", id).is_valid());
        assert!(!KycRecord::new("Acme", "ABCDE1234F", Uuid::nil()).is_valid());
    }

    #[test]
    fn test_cache_key_is_hyphenated_lowercase() {
        let id = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let record = KycRecord::new("Acme", "ABCDE1234F", id);
        assert_eq!(record.cache_key(), "11111111-1111-1111-1111-111111111111");

        let upper = Uuid::parse_str("ABCDEFAB-1111-1111-1111-111111111111").unwrap();
        assert_eq!(cache_key(&upper), "abcdefab-1111-1111-1111-111111111111");
    }

    #[test]
    fn test_resolve_merchant_id() {
        let id = Uuid::new_v4();
        assert_eq!(NewKyc::new("Acme", "PAN").with_merchant_id(id).resolve_merchant_id(), id);

        let assigned = NewKyc::new("Acme", "PAN").resolve_merchant_id();
        assert!(!assigned.is_nil());

        let from_nil = NewKyc::new("Acme", "PAN")
            .with_merchant_id(Uuid::nil())
            .resolve_merchant_id();
        assert!(!from_nil.is_nil());
    }

    #[test]
    fn test_update_drops_empty_fields() {
        let update = KycUpdate::new(Some(String::new()), Some("1234".to_string()));
        assert_eq!(update.pan_number, None);
        assert_eq!(update.aadhar_number.as_deref(), Some("1234"));
        assert!(KycUpdate::new(Some(String::new()), None).is_empty());
    }
}
