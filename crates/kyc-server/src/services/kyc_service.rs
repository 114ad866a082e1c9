//! KYC record service: write-through and read-through over the cache

use crate::error::{KycError, Result};
use crate::storage::{KycCache, KycStore};
use kyc_types::{cache_key, Kyc, KycRecord, KycUpdate, NewKyc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct KycService {
    store: Arc<dyn KycStore>,
    cache: Arc<KycCache>,
}

impl KycService {
    pub fn new(store: Arc<dyn KycStore>, cache: Arc<KycCache>) -> Self {
        Self { store, cache }
    }

    /// Insert a record, then refresh its cache entry and the snapshot.
    ///
    /// Nothing in the cache changes when the insert fails.
    pub async fn create(&self, new_kyc: &NewKyc) -> Result<Kyc> {
        if new_kyc.name.is_empty() || new_kyc.pan_number.is_empty() {
            return Err(KycError::InvalidRequest(
                "name and panNumber are required".into(),
            ));
        }

        let kyc = self.store.insert(new_kyc).await?;
        info!("Created KYC for merchant_id: {}", kyc.merchant_id);

        self.refresh(&kyc.cache_key(), KycRecord::from(&kyc)).await;
        Ok(kyc)
    }

    /// Apply field updates, then refresh the cache entry from the stored row.
    ///
    /// Returns [`KycError::NotFound`] without touching the cache when no row
    /// matches `merchant_id`.
    pub async fn update(&self, merchant_id: Uuid, update: &KycUpdate) -> Result<Kyc> {
        if update.is_empty() {
            return Err(KycError::InvalidRequest(
                "panNumber or aadharNumber is required".into(),
            ));
        }

        let key = cache_key(&merchant_id);
        let affected = self.store.update_by_merchant(merchant_id, update).await?;
        if affected == 0 {
            info!("No record found for merchant_id: {}", key);
            return Err(KycError::NotFound(key));
        }

        let kyc = self
            .store
            .get_by_merchant(merchant_id)
            .await?
            .ok_or_else(|| KycError::NotFound(key.clone()))?;

        self.refresh(&key, KycRecord::from(&kyc)).await;
        Ok(kyc)
    }

    /// Cache first, then the store. A store hit is cached for later reads.
    ///
    /// A stored row the cache refuses as invalid is reported as not found.
    pub async fn get(&self, merchant_id: Uuid) -> Result<KycRecord> {
        let key = cache_key(&merchant_id);
        if let Some(record) = self.cache.get(&key) {
            debug!("Cache hit for merchant_id: {}", key);
            return Ok(record);
        }

        debug!("Cache miss for merchant_id: {}", key);
        let kyc = self
            .store
            .get_by_merchant(merchant_id)
            .await?
            .ok_or_else(|| KycError::NotFound(key.clone()))?;

        let record = KycRecord::from(&kyc);
        if !self.cache.set(key.clone(), record.clone()) {
            return Err(KycError::NotFound(key));
        }
        Ok(record)
    }

    async fn refresh(&self, key: &str, record: KycRecord) {
        self.cache.invalidate(key);
        self.cache.set(key, record);

        if let Err(e) = self.cache.save_snapshot().await {
            warn!("Snapshot not saved after update of {}: {}", key, e);
        }
    }
}
