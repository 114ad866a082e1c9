//! In-memory KYC cache using DashMap, snapshotted to a JSON file
//!
//! Startup loads the cache from the snapshot file and falls back to the
//! record store when the file is missing or unreadable. Every write path
//! mutates the cache and then rewrites the snapshot.

use crate::error::Result;
use crate::storage::loader::{load_first, CacheLoader, SnapshotLoader, StoreLoader};
use crate::storage::KycStore;
use dashmap::DashMap;
use kyc_types::{CacheSnapshot, KycRecord};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Unbounded cache of verification records keyed by textual merchant id
pub struct KycCache {
    data: DashMap<String, KycRecord>,
    snapshot_path: PathBuf,
    /// Serializes snapshot writers
    save_lock: Mutex<()>,
    /// Set by every mutation, cleared when a snapshot write starts
    dirty: AtomicBool,
}

impl KycCache {
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            data: DashMap::new(),
            snapshot_path: snapshot_path.into(),
            save_lock: Mutex::new(()),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Populate the cache from the snapshot file, falling back to the store.
    ///
    /// Fails only when the store fallback fails; a bad snapshot file is
    /// logged and skipped.
    pub async fn initialize(&self, store: &dyn KycStore) -> Result<()> {
        let loaders: Vec<Box<dyn CacheLoader + '_>> =
            vec![Box::new(SnapshotLoader), Box::new(StoreLoader::new(store))];
        load_first(self, &loaders).await
    }

    /// Get a record from cache
    pub fn get(&self, key: &str) -> Option<KycRecord> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Store or overwrite a record. Invalid records are dropped and `false`
    /// is returned.
    pub fn set(&self, key: impl Into<String>, record: KycRecord) -> bool {
        let key = key.into();
        if !record.is_valid() {
            warn!("Invalid KYC data for key: {}. Skipping cache update.", key);
            return false;
        }

        self.data.insert(key.clone(), record);
        self.dirty.store(true, Ordering::SeqCst);
        debug!("Cache updated for key: {}", key);
        true
    }

    /// Remove a record; missing keys are ignored
    pub fn invalidate(&self, key: &str) {
        if self.data.remove(key).is_some() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        debug!("Cache invalidated for key: {}", key);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the cache changed since the last snapshot write began
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Point-in-time copy of the whole cache
    pub fn snapshot(&self) -> CacheSnapshot {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Write the whole cache to the snapshot file.
    ///
    /// The file is written next to the target and renamed over it, so a
    /// failed save leaves the previous snapshot in place.
    pub async fn save_snapshot(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        self.dirty.store(false, Ordering::SeqCst);

        let result = self.write_snapshot().await;
        match &result {
            Ok(count) => info!(
                "Cache saved to {} ({} records)",
                self.snapshot_path.display(),
                count
            ),
            Err(e) => {
                self.dirty.store(true, Ordering::SeqCst);
                warn!(
                    "Error saving cache to {}: {}",
                    self.snapshot_path.display(),
                    e
                );
            }
        }
        result.map(|_| ())
    }

    /// Save only if something changed since the last save. Returns whether
    /// a save happened.
    pub async fn flush_if_dirty(&self) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save_snapshot().await?;
        Ok(true)
    }

    /// Load entries from the snapshot file, returning how many were kept.
    pub async fn load_snapshot(&self) -> Result<usize> {
        let content = tokio::fs::read_to_string(&self.snapshot_path).await?;
        let snapshot = CacheSnapshot::from_json(&content)?;

        let (valid, invalid) = snapshot.partition_valid();
        for (key, record) in invalid {
            warn!("Skipping invalid cache entry {}: {:?}", key, record);
        }

        let count = valid.len();
        for (key, record) in valid {
            self.data.insert(key, record);
        }
        Ok(count)
    }

    /// Fill the cache from every valid store row, then write a fresh snapshot.
    ///
    /// A failed snapshot write is reported even though the in-memory cache
    /// is already populated.
    pub async fn populate_from_store(&self, store: &dyn KycStore) -> Result<usize> {
        let records = store.list_records().await?;

        let mut count = 0;
        for record in records {
            if !record.is_valid() {
                warn!("Skipping invalid KYC record: {:?}", record);
                continue;
            }
            let key = record.cache_key();
            debug!("Cache populated for merchant_id: {}", key);
            self.data.insert(key, record);
            count += 1;
        }
        self.dirty.store(true, Ordering::SeqCst);

        self.save_snapshot().await?;
        Ok(count)
    }

    /// Spawn a background task that flushes the snapshot every `period`
    /// when the cache has changed.
    pub fn start_snapshot_task(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = cache.flush_if_dirty().await {
                    warn!("Periodic snapshot failed: {}", e);
                }
            }
        })
    }

    async fn write_snapshot(&self) -> Result<usize> {
        let snapshot = self.snapshot();
        let content = snapshot.to_pretty_json()?;
        write_atomic(&self.snapshot_path, content.as_bytes()).await?;
        Ok(snapshot.len())
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
