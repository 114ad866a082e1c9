//! Startup loaders for the KYC cache
//!
//! Loaders run in order and the first one that succeeds wins.

use crate::error::Result;
use crate::storage::{KycCache, KycStore};
use async_trait::async_trait;
use tracing::{info, warn};

/// One way of filling the cache at startup
#[async_trait]
pub trait CacheLoader: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fill `cache`, returning the number of records loaded.
    async fn load(&self, cache: &KycCache) -> Result<usize>;
}

/// Reads the snapshot file
pub struct SnapshotLoader;

#[async_trait]
impl CacheLoader for SnapshotLoader {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn load(&self, cache: &KycCache) -> Result<usize> {
        cache.load_snapshot().await
    }
}

/// Reads every row from the record store, then writes a fresh snapshot
pub struct StoreLoader<'a> {
    store: &'a dyn KycStore,
}

impl<'a> StoreLoader<'a> {
    pub fn new(store: &'a dyn KycStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CacheLoader for StoreLoader<'_> {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn load(&self, cache: &KycCache) -> Result<usize> {
        cache.populate_from_store(self.store).await
    }
}

/// Run `loaders` in order until one succeeds. The last failure is returned
/// when none do; an empty list leaves the cache empty.
pub async fn load_first(cache: &KycCache, loaders: &[Box<dyn CacheLoader + '_>]) -> Result<()> {
    let mut last_err = None;

    for loader in loaders {
        match loader.load(cache).await {
            Ok(count) => {
                info!(
                    "Cache initialized from {} ({} records)",
                    loader.name(),
                    count
                );
                return Ok(());
            }
            Err(e) => {
                warn!("Cache {} load failed: {}", loader.name(), e);
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
