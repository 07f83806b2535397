//! Detection counter persistence
//!
//! Holds the durable detection count, the `enabled` flag and the capped,
//! newest-first detection history.
//!
//! # Example
//!
//! ```no_run
//! use leadscan::storage::{DetectionStore, JsonFileStore};
//! use leadscan::models::PostRecord;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), leadscan::error::StoreError> {
//! let store = JsonFileStore::open(Path::new("./data/detections.json"), 50).await?;
//! store
//!     .record_detection(PostRecord::new("urn:li:activity:1", "We are hiring developer"))
//!     .await?;
//! println!("{} detections", store.stats().await?.detected_count);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::models::{DetectionCounters, PostRecord, StatsSnapshot};
use crate::utils::error::StoreError;
use crate::utils::now_millis;

/// Default detection history capacity
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Persistence collaborator for detection counters
#[async_trait]
pub trait DetectionStore: Send + Sync {
    /// Stamp the post with the current time, count it and push it onto the
    /// history. Returns the new total.
    async fn record_detection(&self, post: PostRecord) -> Result<u64, StoreError>;

    /// Current counters
    async fn stats(&self) -> Result<StatsSnapshot, StoreError>;

    /// Clear the count and the history, keeping the `enabled` flag
    async fn reset(&self) -> Result<(), StoreError>;

    /// Persist the feature flag
    async fn set_enabled(&self, enabled: bool) -> Result<(), StoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Non-durable store for tests and one-shot runs
pub struct MemoryStore {
    counters: RwLock<DetectionCounters>,
    history_cap: usize,
}

impl MemoryStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            counters: RwLock::new(DetectionCounters::default()),
            history_cap,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

#[async_trait]
impl DetectionStore for MemoryStore {
    async fn record_detection(&self, mut post: PostRecord) -> Result<u64, StoreError> {
        post.timestamp = now_millis();
        Ok(self.counters.write().await.record(post, self.history_cap))
    }

    async fn stats(&self) -> Result<StatsSnapshot, StoreError> {
        Ok(self.counters.read().await.snapshot())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.counters.write().await.reset();
        Ok(())
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.counters.write().await.enabled = enabled;
        Ok(())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Store backed by a single JSON file, rewritten atomically on every change
pub struct JsonFileStore {
    path: PathBuf,
    counters: RwLock<DetectionCounters>,
    history_cap: usize,
}

impl JsonFileStore {
    /// Open the store, starting from defaults when the file does not exist
    pub async fn open(path: &Path, history_cap: usize) -> Result<Self, StoreError> {
        let counters = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => DetectionCounters::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), "Detection counters loaded");
        Ok(Self {
            path: path.to_path_buf(),
            counters: RwLock::new(counters),
            history_cap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to temp file first, then rename (atomic)
    async fn persist(&self, counters: &DetectionCounters) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let bytes = serde_json::to_vec_pretty(counters)?;
        tokio::fs::write(&temp_path, bytes).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Detection counters saved");
        Ok(())
    }
}

#[async_trait]
impl DetectionStore for JsonFileStore {
    async fn record_detection(&self, mut post: PostRecord) -> Result<u64, StoreError> {
        post.timestamp = now_millis();
        let mut counters = self.counters.write().await;
        let total = counters.record(post, self.history_cap);
        self.persist(&counters).await?;
        Ok(total)
    }

    async fn stats(&self) -> Result<StatsSnapshot, StoreError> {
        Ok(self.counters.read().await.snapshot())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut counters = self.counters.write().await;
        counters.reset();
        self.persist(&counters).await
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        let mut counters = self.counters.write().await;
        counters.enabled = enabled;
        self.persist(&counters).await
    }
}
