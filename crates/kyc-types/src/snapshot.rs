//! On-disk snapshot format for the KYC cache
//!
//! ```json
//! {
//!   "kyc_name_and_pan_number": {
//!     "<merchant id>": {
//!       "name": "...",
//!       "pan_number": "...",
//!       "merchant_id": "<merchant id>"
//!     }
//!   }
//! }
//! ```

use crate::kyc::KycRecord;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Serialized form of the whole cache.
///
/// Entries are kept in a `BTreeMap` so the same contents always encode to
/// the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// A `null` map decodes as empty; a missing field is still an error.
    #[serde(
        rename = "kyc_name_and_pan_number",
        deserialize_with = "null_as_empty"
    )]
    pub entries: BTreeMap<String, KycRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, KycRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl CacheSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, record: KycRecord) {
        self.entries.insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode with two-space indentation and a trailing newline.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Decode a snapshot. Structural errors fail; invalid rows do not.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Split entries into the ones that may be cached and the rejected keys.
    pub fn partition_valid(self) -> (Vec<(String, KycRecord)>, Vec<(String, KycRecord)>) {
        self.entries
            .into_iter()
            .partition(|(_, record)| record.is_valid())
    }
}

impl FromIterator<(String, KycRecord)> for CacheSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, KycRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn acme() -> KycRecord {
        KycRecord::new(
            "Acme",
            "ABCDE1234F",
            Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap(),
        )
    }

    #[test]
    fn test_encoding_layout() {
        let record = acme();
        let snapshot: CacheSnapshot = [(record.cache_key(), record)].into_iter().collect();

        let expected = r#"{
  "kyc_name_and_pan_number": {
    "11111111-1111-1111-1111-111111111111": {
      "name": "Acme",
      "pan_number": "ABCDE1234F",
      "merchant_id": "11111111-1111-1111-1111-111111111111"
    }
  }
}
"#;
        assert_eq!(snapshot.to_pretty_json().unwrap(), expected);
    }

    #[test]
    fn test_encoding_is_key_ordered() {
        let a = KycRecord::new("A", "PAN-A", Uuid::from_u128(2));
        let b = KycRecord::new("B", "PAN-B", Uuid::from_u128(1));
        let forward: CacheSnapshot = [(a.cache_key(), a.clone()), (b.cache_key(), b.clone())]
            .into_iter()
            .collect();
        let backward: CacheSnapshot = [(b.cache_key(), b), (a.cache_key(), a)]
            .into_iter()
            .collect();

        assert_eq!(
            forward.to_pretty_json().unwrap(),
            backward.to_pretty_json().unwrap()
        );
    }

    #[test]
    fn test_decode_keeps_invalid_rows_for_caller_to_drop() {
        let content = r#"{
            "kyc_name_and_pan_number": {
                "11111111-1111-1111-1111-111111111111": {
                    "name": "Acme",
                    "pan_number": "ABCDE1234F",
                    "merchant_id": "11111111-1111-1111-1111-111111111111"
                },
                "00000000-0000-0000-0000-000000000000": {
                    "name": "Ghost",
                    "pan_number": "XYZ",
                    "merchant_id": "00000000-0000-0000-0000-000000000000"
                },
                "22222222-2222-2222-2222-222222222222": {
                    "name": "",
                    "pan_number": "XYZ",
                    "merchant_id": "22222222-2222-2222-2222-222222222222"
                }
            }
        }"#;

        let snapshot = CacheSnapshot::from_json(content).unwrap();
        assert_eq!(snapshot.len(), 3);

        let (valid, invalid) = snapshot.partition_valid();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].1, acme());
        assert_eq!(invalid.len(), 2);
    }

    #[test]
    fn test_decode_null_entries_as_empty() {
        let snapshot = CacheSnapshot::from_json(r#"{"kyc_name_and_pan_number": null}"#).unwrap();
        assert!(snapshot.is_empty());

        assert!(CacheSnapshot::from_json("{}").is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert!(CacheSnapshot::from_json("not json").is_err());
        assert!(CacheSnapshot::from_json(r#"{"something_else": {}}"#).is_err());
        assert!(CacheSnapshot::from_json(r#"{"kyc_name_and_pan_number": []}"#).is_err());
    }
}
