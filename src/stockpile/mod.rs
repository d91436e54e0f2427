// src/stockpile/mod.rs

//! Verification and commit of produced artifacts ("stockpile").
//!
//! Runs after the execution engine reports a job done:
//!
//! `PENDING -> verify outputs -> {COMPLETE, GENERAL_ERROR, IO_ERROR, NOT_FOUND}`
//!
//! then one status update per object in the registry.
//!
//! - [`status`] is the registry's status vocabulary.
//! - [`validate`] holds the `kind -> validator` table and [`verify`].
//! - [`registry`] is the registry boundary, plus memory and file backends.
//! - [`batch`] stockpiles many objects from one manifest.

pub mod batch;
pub mod digest;
pub mod registry;
pub mod status;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

pub use registry::{FileRegistry, MemoryRegistry, Registry, RegistryRecord, StatusUpdate, commit};
pub use status::{Status, StatusRegion};
pub use validate::{
    ArtifactKind, ArtifactRef, ArtifactValidator, ValidationFailure, Validators, Verification,
    verify,
};

/// Everything needed to verify and commit one logical object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockpileRequest {
    pub kind: ArtifactKind,
    pub object_id: i64,

    /// Files to check; the first one is the primary output.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Status reported by the execution side.
    #[serde(default)]
    pub status: Option<Status>,

    /// File holding the reported status code, used when `status` is unset.
    #[serde(default)]
    pub status_file: Option<String>,
}

impl StockpileRequest {
    pub fn new<O>(kind: ArtifactKind, object_id: i64, outputs: O) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            kind,
            object_id,
            outputs: outputs.into_iter().map(Into::into).collect(),
            status: None,
            status_file: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_status_file(mut self, path: impl Into<String>) -> Self {
        self.status_file = Some(path.into());
        self
    }

    pub fn artifacts(&self) -> Vec<ArtifactRef> {
        self.outputs
            .iter()
            .map(|p| ArtifactRef::new(p.clone(), self.kind))
            .collect()
    }
}

/// Result of one stockpile run, after the registry accepted the update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockpileReport {
    pub kind: ArtifactKind,
    pub object_id: i64,
    pub status: Status,
    pub diagnostics: Vec<String>,
    pub verify: Option<String>,
}

impl StockpileReport {
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Verifies outputs and commits statuses. Holds no per-object state, so one
/// value can serve many concurrent objects.
#[derive(Clone)]
pub struct Stockpile {
    fs: Arc<dyn FileSystem>,
    validators: Validators,
    registry: Arc<dyn Registry>,
}

impl std::fmt::Debug for Stockpile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stockpile")
            .field("fs", &self.fs)
            .field("validators", &self.validators)
            .finish_non_exhaustive()
    }
}

impl Stockpile {
    /// Real filesystem and the standard validators.
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            validators: Validators::standard(),
            registry,
        }
    }

    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    pub fn registry(&self) -> &dyn Registry {
        self.registry.as_ref()
    }

    /// Reported status: explicit value first, then the status file. A status
    /// file that cannot be read or parsed counts as GENERAL_ERROR.
    pub fn assumed_status(&self, request: &StockpileRequest, notes: &mut Vec<String>) -> Option<Status> {
        if let Some(status) = request.status {
            return Some(status);
        }
        let status_file = request.status_file.as_ref()?;

        let parsed = self
            .fs
            .read_to_string(Path::new(status_file))
            .ok()
            .and_then(|s| s.trim().parse::<i32>().ok());

        match parsed {
            Some(code) => Some(Status::from_code(code)),
            None => {
                notes.push(format!("Status file {status_file} is missing or unreadable"));
                Some(Status::GeneralError)
            }
        }
    }

    /// Verify the request's outputs, commit the outcome, then write
    /// `success_file` (`1` when COMPLETE, `0` otherwise).
    ///
    /// Verification failures are recorded, not returned as errors. A commit
    /// failure is returned and leaves no success file behind.
    pub async fn test_and_stash(
        &self,
        request: &StockpileRequest,
        success_file: Option<&Path>,
    ) -> Result<StockpileReport> {
        let mut diagnostics = Vec::new();
        let assumed = self.assumed_status(request, &mut diagnostics);

        let verification = verify(
            assumed,
            &request.artifacts(),
            &self.validators,
            self.fs.as_ref(),
        );
        diagnostics.extend(verification.diagnostics);
        let status = verification.status;

        let verify_digest = if status.is_complete() {
            self.primary_digest(request)
        } else {
            None
        };

        let mut update = StatusUpdate::new(request.kind, request.object_id, status);
        if let Some(ref digest) = verify_digest {
            update = update.with_verify(digest.clone());
        }
        commit(self.registry.as_ref(), update).await?;

        if let Some(path) = success_file {
            let flag: &[u8] = if status.is_complete() { b"1" } else { b"0" };
            self.fs.write(path, flag)?;
        }

        if !status.is_complete() {
            info!(
                kind = %request.kind,
                object_id = request.object_id,
                %status,
                problems = diagnostics.len(),
                "object recorded with error status"
            );
        }

        Ok(StockpileReport {
            kind: request.kind,
            object_id: request.object_id,
            status,
            diagnostics,
            verify: verify_digest,
        })
    }

    fn primary_digest(&self, request: &StockpileRequest) -> Option<String> {
        let primary = request.outputs.first()?;
        match digest::compute_file_hash(self.fs.as_ref(), Path::new(primary)) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(path = %primary, error = %e, "could not compute verify digest");
                None
            }
        }
    }
}
