//! Record store contract

use crate::error::Result;
use async_trait::async_trait;
use kyc_types::{Kyc, KycRecord, KycUpdate, NewKyc};
use uuid::Uuid;

/// Relational backing store of verification records.
///
/// The cache and the write path only depend on this trait, so tests can run
/// them against a failing or scripted store.
#[async_trait]
pub trait KycStore: Send + Sync {
    /// Insert a record, assigning a merchant id if none was given.
    async fn insert(&self, kyc: &NewKyc) -> Result<Kyc>;

    /// All rows projected to `(name, pan_number, merchant_id)`.
    async fn list_records(&self) -> Result<Vec<KycRecord>>;

    /// Apply field updates by merchant id, returning the number of rows affected.
    async fn update_by_merchant(&self, merchant_id: Uuid, update: &KycUpdate) -> Result<u64>;

    async fn get_by_merchant(&self, merchant_id: Uuid) -> Result<Option<Kyc>>;
}
