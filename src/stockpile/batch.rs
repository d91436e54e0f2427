// src/stockpile/batch.rs

use std::collections::HashMap;
use std::path::Path;

use tokio::task::{self, JoinSet};
use tracing::{error, info};

use crate::errors::{Result, SdmflowError};
use crate::fs::FileSystem;
use crate::stockpile::{Stockpile, StockpileReport, StockpileRequest};

/// Placeholder id for a task the set reports but never spawned.
const UNKNOWN_OBJECT: i64 = -1;

/// Outcome of a batch: one report per committed object, one entry per
/// object whose commit failed.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<StockpileReport>,
    pub failures: Vec<(i64, String)>,
}

impl BatchReport {
    /// Every object made it into the registry (whatever its status).
    pub fn all_committed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse a JSON manifest: an array of [`StockpileRequest`]s.
pub fn load_manifest(fs: &dyn FileSystem, path: &Path) -> Result<Vec<StockpileRequest>> {
    let text = fs.read_to_string(path)?;
    let requests: Vec<StockpileRequest> = serde_json::from_str(&text)?;
    Ok(requests)
}

/// Stockpile every request concurrently, one task per object.
///
/// Objects share nothing but the registry. A failing commit is collected in
/// [`BatchReport::failures`] and never stops the other objects.
pub async fn stockpile_all(stockpile: &Stockpile, requests: Vec<StockpileRequest>) -> BatchReport {
    let total = requests.len();
    let mut set = JoinSet::new();
    let mut object_of: HashMap<task::Id, i64> = HashMap::with_capacity(total);

    for request in requests {
        let stockpile = stockpile.clone();
        let object_id = request.object_id;
        let handle = set.spawn(async move { stockpile.test_and_stash(&request, None).await });
        object_of.insert(handle.id(), object_id);
    }

    let mut batch = BatchReport::default();
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((_, Ok(report))) => batch.reports.push(report),
            Ok((id, Err(e))) => {
                let object_id = object_of.get(&id).copied().unwrap_or(UNKNOWN_OBJECT);
                error!(object_id, error = %e, "stockpile commit failed");
                batch.failures.push((object_id, e.to_string()));
            }
            Err(join_err) => {
                let object_id = object_of
                    .get(&join_err.id())
                    .copied()
                    .unwrap_or(UNKNOWN_OBJECT);
                error!(object_id, error = %join_err, "stockpile task panicked");
                batch.failures.push((object_id, join_err.to_string()));
            }
        }
    }

    batch.reports.sort_by_key(|r| r.object_id);
    batch.failures.sort();

    info!(
        total,
        committed = batch.reports.len(),
        failed = batch.failures.len(),
        "batch stockpile finished"
    );
    batch
}

/// Load `manifest`, stockpile it, then write `success_file` (`1` when every
/// object was committed, `0` otherwise).
pub async fn run_manifest(
    stockpile: &Stockpile,
    fs: &dyn FileSystem,
    manifest: &Path,
    success_file: &Path,
) -> Result<BatchReport> {
    let requests = load_manifest(fs, manifest).map_err(|e| {
        SdmflowError::ConfigError(format!(
            "reading stockpile manifest {}: {e}",
            manifest.display()
        ))
    })?;

    let batch = stockpile_all(stockpile, requests).await;
    let flag: &[u8] = if batch.all_committed() { b"1" } else { b"0" };
    fs.write(success_file, flag)?;
    Ok(batch)
}
