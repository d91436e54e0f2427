use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sdmflow::errors::SdmflowError;
use sdmflow::stockpile::registry::RegistryFuture;
use sdmflow::stockpile::{ArtifactKind, Registry, RegistryRecord, StatusUpdate};

/// A registry that rejects every update and counts the attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingRegistry {
    attempts: Arc<AtomicUsize>,
}

impl FailingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Registry for FailingRegistry {
    fn update_status(&self, update: StatusUpdate) -> RegistryFuture<'_, ()> {
        let attempts = Arc::clone(&self.attempts);
        Box::pin(async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(SdmflowError::Registry(format!(
                "registry unavailable for {} {}",
                update.kind, update.object_id
            )))
        })
    }

    fn record(
        &self,
        _kind: ArtifactKind,
        _object_id: i64,
    ) -> RegistryFuture<'_, Option<RegistryRecord>> {
        Box::pin(async { Ok(None) })
    }
}

/// A registry that rejects updates for one object and forwards the rest.
pub struct SelectiveRegistry<R> {
    inner: R,
    reject: i64,
}

impl<R: Registry> SelectiveRegistry<R> {
    pub fn new(inner: R, reject: i64) -> Self {
        Self { inner, reject }
    }
}

impl<R: Registry> Registry for SelectiveRegistry<R> {
    fn update_status(&self, update: StatusUpdate) -> RegistryFuture<'_, ()> {
        if update.object_id == self.reject {
            let id = update.object_id;
            return Box::pin(async move {
                Err(SdmflowError::Registry(format!("object {id} rejected")))
            });
        }
        self.inner.update_status(update)
    }

    fn record(
        &self,
        kind: ArtifactKind,
        object_id: i64,
    ) -> RegistryFuture<'_, Option<RegistryRecord>> {
        self.inner.record(kind, object_id)
    }
}
