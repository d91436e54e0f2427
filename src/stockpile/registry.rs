// src/stockpile/registry.rs

//! Boundary to the persistent object registry.
//!
//! The registry is the source of truth for "did this already happen", so
//! every implementation must make `update_status` idempotent for the same
//! object and safe to run concurrently for different objects.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{Result, SdmflowError};
use crate::stockpile::status::Status;
use crate::stockpile::validate::ArtifactKind;

pub type RegistryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// One status change for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub kind: ArtifactKind,
    pub object_id: i64,
    pub status: Status,
    /// blake3 digest of the primary output, when the object is complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<String>,
}

impl StatusUpdate {
    pub fn new(kind: ArtifactKind, object_id: i64, status: Status) -> Self {
        Self {
            kind,
            object_id,
            status,
            verify: None,
        }
    }

    pub fn with_verify(mut self, digest: impl Into<String>) -> Self {
        self.verify = Some(digest.into());
        self
    }
}

/// What the registry holds for an object: the last applied update.
pub type RegistryRecord = StatusUpdate;

/// The registry collaborator.
pub trait Registry: Send + Sync {
    /// Set the object's status. Applying the same update twice must leave
    /// the same stored record.
    fn update_status(&self, update: StatusUpdate) -> RegistryFuture<'_, ()>;

    fn record(&self, kind: ArtifactKind, object_id: i64) -> RegistryFuture<'_, Option<RegistryRecord>>;
}

/// Push one status update to the registry.
///
/// Exactly one `update_status` call. Errors are returned to the caller, which
/// may retry: the update is idempotent by the registry's contract.
pub async fn commit(registry: &dyn Registry, update: StatusUpdate) -> Result<()> {
    let kind = update.kind;
    let object_id = update.object_id;
    let status = update.status;

    registry.update_status(update).await?;

    info!(%kind, object_id, %status, "committed object status");
    Ok(())
}

/// In-process registry, mostly for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    records: Arc<Mutex<HashMap<(ArtifactKind, i64), RegistryRecord>>>,
    updates: Arc<AtomicUsize>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `update_status` calls received.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn get(&self, kind: ArtifactKind, object_id: i64) -> Option<RegistryRecord> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(&(kind, object_id)).cloned())
    }
}

impl Registry for MemoryRegistry {
    fn update_status(&self, update: StatusUpdate) -> RegistryFuture<'_, ()> {
        Box::pin(async move {
            self.updates.fetch_add(1, Ordering::SeqCst);
            let mut records = self
                .records
                .lock()
                .map_err(|_| SdmflowError::Registry("memory registry lock poisoned".into()))?;
            records.insert((update.kind, update.object_id), update);
            Ok(())
        })
    }

    fn record(&self, kind: ArtifactKind, object_id: i64) -> RegistryFuture<'_, Option<RegistryRecord>> {
        Box::pin(async move { Ok(self.get(kind, object_id)) })
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Registry stored as one JSON file per object: `<root>/<kind>/<id>.json`.
///
/// Each update writes a uniquely named temporary file next to the record and
/// renames it over the record, so a reader only ever sees a whole record and
/// updates to different objects never touch the same file.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    root: PathBuf,
}

impl FileRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, kind: ArtifactKind, object_id: i64) -> PathBuf {
        self.root
            .join(kind.as_str())
            .join(format!("{object_id}.json"))
    }
}

impl Registry for FileRegistry {
    fn update_status(&self, update: StatusUpdate) -> RegistryFuture<'_, ()> {
        Box::pin(async move {
            let path = self.record_path(update.kind, update.object_id);
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone());

            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                SdmflowError::Registry(format!("creating registry dir {}: {e}", dir.display()))
            })?;

            let body = serde_json::to_vec_pretty(&update)?;
            let tmp = dir.join(format!(
                ".{}.{}.{}.tmp",
                update.object_id,
                std::process::id(),
                TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
            ));

            tokio::fs::write(&tmp, &body).await.map_err(|e| {
                SdmflowError::Registry(format!("writing {}: {e}", tmp.display()))
            })?;
            if let Err(e) = tokio::fs::rename(&tmp, &path).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(SdmflowError::Registry(format!(
                    "replacing {}: {e}",
                    path.display()
                )));
            }

            debug!(path = %path.display(), status = %update.status, "registry record written");
            Ok(())
        })
    }

    fn record(&self, kind: ArtifactKind, object_id: i64) -> RegistryFuture<'_, Option<RegistryRecord>> {
        Box::pin(async move {
            let path = self.record_path(kind, object_id);
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(SdmflowError::Registry(format!(
                    "reading {}: {e}",
                    path.display()
                ))),
            }
        })
    }
}
