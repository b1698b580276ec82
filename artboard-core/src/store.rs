//! Template store collaborator.
//!
//! [`TemplateStore`] is the contract the editor publishes through and the
//! generator reads from. [`MemoryTemplateStore`] is a reference
//! implementation that keeps records in memory and can mirror them to JSON
//! files on disk.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use uuid::Uuid;

use crate::schema::{generate_slug, TemplateRecord, TemplateSnapshot};

/// How many fresh slugs are tried before giving up on a publish.
const MAX_SLUG_ATTEMPTS: usize = 16;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No template is published under the slug.
    #[error("Template not found: {0}")]
    NotFound(String),
    /// The store could not be reached or refused the request.
    #[error("Transport error: {0}")]
    Transport(String),
    /// No unused slug could be generated.
    #[error("Could not allocate a unique slug")]
    SlugExhausted,
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether the failure is transient and worth a manual retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_) | Self::SlugExhausted)
    }
}

/// Receipt returned by a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Identifier attached to the published template.
    pub id: Uuid,
    /// Public slug the template is retrievable under.
    pub slug: String,
}

/// Remote persistence for published templates.
///
/// Both calls are single-shot; implementations do not retry.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Persist a snapshot under a freshly generated slug.
    ///
    /// Never overwrites a template published under another slug.
    async fn publish(&self, snapshot: TemplateSnapshot) -> Result<PublishReceipt, StoreError>;

    /// Fetch a published template by slug.
    ///
    /// Returns [`StoreError::NotFound`] when no template has that slug.
    async fn fetch_by_slug(&self, slug: &str) -> Result<TemplateRecord, StoreError>;
}

/// In-memory template store with optional JSON-file persistence.
///
/// Cloning shares the underlying records.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    records: Arc<RwLock<HashMap<String, TemplateRecord>>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl MemoryTemplateStore {
    /// Create an empty store without persistence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that mirrors every record to `<data_dir>/<slug>.json`.
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            data_dir: Some(data_dir),
        })
    }

    /// Get a record by slug from memory or, failing that, from disk.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<TemplateRecord> {
        {
            let records = self
                .records
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(record) = records.get(slug) {
                return Some(record.clone());
            }
        }
        self.load_from_disk(slug)
    }

    /// Get a list of all slugs held in memory.
    #[must_use]
    pub fn slugs(&self) -> Vec<String> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.keys().cloned().collect()
    }

    /// Insert a record under its own slug, refusing to overwrite.
    ///
    /// Returns `Ok(false)` if the slug was already taken. A record that
    /// cannot be written to the data directory is removed again.
    fn insert_new(&self, record: TemplateRecord) -> Result<bool, StoreError> {
        let slug = record.slug.clone();
        {
            let mut records = self
                .records
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if records.contains_key(&slug) || self.record_path(&slug).is_some_and(|p| p.exists()) {
                return Ok(false);
            }
            records.insert(slug.clone(), record.clone());
        }
        if let Err(e) = self.persist_record(&record) {
            tracing::warn!("Failed to persist template {slug}: {e}");
            self.records
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(&slug);
            return Err(e);
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn record_path(&self, slug: &str) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", sanitize_filename(slug))))
    }

    /// Save a record to disk as JSON.
    ///
    /// No-op if the store was created without a data directory.
    fn persist_record(&self, record: &TemplateRecord) -> Result<(), StoreError> {
        let Some(path) = self.record_path(&record.slug) else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(&path, json)?;
        Ok(())
    }

    /// Load a record from disk into memory.
    fn load_from_disk(&self, slug: &str) -> Option<TemplateRecord> {
        let path = self.record_path(slug)?;
        let contents = std::fs::read_to_string(&path).ok()?;
        let record: TemplateRecord = match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Ignoring unreadable template file {}: {e}", path.display());
                return None;
            }
        };
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert(slug.to_string(), record.clone());
        Some(record)
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn publish(&self, snapshot: TemplateSnapshot) -> Result<PublishReceipt, StoreError> {
        let id = Uuid::new_v4();
        let timestamp = current_timestamp_ms();
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = generate_slug();
            let record = TemplateRecord::from_snapshot(id, slug.clone(), &snapshot, timestamp)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            if self.insert_new(record)? {
                tracing::info!("Published template {id} as {slug}");
                return Ok(PublishReceipt { id, slug });
            }
            tracing::debug!("Slug {slug} already taken, retrying");
        }
        Err(StoreError::SlugExhausted)
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<TemplateRecord, StoreError> {
        self.get(slug)
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }
}

/// Sanitize a slug for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(slug: &str) -> String {
    slug.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get the current Unix timestamp in milliseconds.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}
