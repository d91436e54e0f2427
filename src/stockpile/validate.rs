// src/stockpile/validate.rs

//! Format-aware checks on produced artifacts.
//!
//! The caller names the kind of object it is verifying; the kind picks the
//! validator through an explicit [`Validators`] table. Nothing here looks at
//! file extensions.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::stockpile::status::Status;

/// Logical kind of object being verified and committed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Generic,
    Json,
    Matrix,
    Vector,
    Raster,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Generic => "generic",
            ArtifactKind::Json => "json",
            ArtifactKind::Matrix => "matrix",
            ArtifactKind::Vector => "vector",
            ArtifactKind::Raster => "raster",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A produced file and the kind of check it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub path: String,
    pub kind: ArtifactKind,
}

impl ArtifactRef {
    pub fn new(path: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Why a single artifact failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub status: Status,
    pub reason: String,
}

impl ValidationFailure {
    pub fn general(reason: impl Into<String>) -> Self {
        Self {
            status: Status::GeneralError,
            reason: reason.into(),
        }
    }

    pub fn io(reason: impl Into<String>) -> Self {
        Self {
            status: Status::IoError,
            reason: reason.into(),
        }
    }
}

/// Structural check over the bytes of an existing, readable file.
///
/// Non-fatal observations go into `notes`.
pub trait ArtifactValidator: Send + Sync {
    fn check(
        &self,
        path: &str,
        contents: &[u8],
        notes: &mut Vec<String>,
    ) -> Result<(), ValidationFailure>;
}

/// Explicit `kind -> validator` table.
#[derive(Clone, Default)]
pub struct Validators {
    by_kind: HashMap<ArtifactKind, Arc<dyn ArtifactValidator>>,
}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.by_kind.keys().collect();
        kinds.sort();
        f.debug_struct("Validators").field("kinds", &kinds).finish()
    }
}

impl Validators {
    /// Empty table; every lookup fails until something is registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in validator for every [`ArtifactKind`].
    pub fn standard() -> Self {
        let mut v = Self::empty();
        v.register(ArtifactKind::Generic, ExistsOnly);
        v.register(ArtifactKind::Json, JsonValidator);
        v.register(ArtifactKind::Matrix, MatrixValidator);
        v.register(ArtifactKind::Vector, GeoJsonValidator);
        v.register(ArtifactKind::Raster, RasterValidator);
        v
    }

    pub fn register(&mut self, kind: ArtifactKind, validator: impl ArtifactValidator + 'static) {
        self.by_kind.insert(kind, Arc::new(validator));
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Arc<dyn ArtifactValidator>> {
        self.by_kind.get(&kind)
    }
}

/// Outcome of verifying one object's outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub status: Status,
    /// Every failure reason and note, in output order.
    pub diagnostics: Vec<String>,
}

impl Verification {
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Verify `outputs` after the engine reports the producing job done.
///
/// - An `assumed` error status is returned unchanged; a reported failure is
///   never upgraded.
/// - Otherwise every output is checked, even after a failure. Missing files
///   are NOT_FOUND, unreadable ones IO_ERROR, and validator failures carry
///   their own status. The result is the worst status observed, or COMPLETE
///   when everything passes.
pub fn verify(
    assumed: Option<Status>,
    outputs: &[ArtifactRef],
    validators: &Validators,
    fs: &dyn FileSystem,
) -> Verification {
    if let Some(status) = assumed {
        if status.is_error() {
            debug!(%status, "incoming status is an error; skipping output checks");
            return Verification {
                status,
                diagnostics: vec![format!("incoming status was {status}")],
            };
        }
    }

    let mut worst: Option<Status> = None;
    let mut diagnostics = Vec::new();

    for artifact in outputs {
        if let Err(failure) = check_artifact(artifact, validators, fs, &mut diagnostics) {
            warn!(
                path = %artifact.path,
                kind = %artifact.kind,
                status = %failure.status,
                reason = %failure.reason,
                "artifact failed verification"
            );
            diagnostics.push(failure.reason);
            worst = Some(match worst {
                Some(current) => current.worst(failure.status),
                None => failure.status,
            });
        }
    }

    Verification {
        status: worst.unwrap_or(Status::Complete),
        diagnostics,
    }
}

fn check_artifact(
    artifact: &ArtifactRef,
    validators: &Validators,
    fs: &dyn FileSystem,
    notes: &mut Vec<String>,
) -> Result<(), ValidationFailure> {
    let path = Path::new(&artifact.path);
    if !fs.exists(path) {
        return Err(ValidationFailure {
            status: Status::NotFound,
            reason: format!("File {} does not exist", artifact.path),
        });
    }

    let validator = validators.get(artifact.kind).ok_or_else(|| {
        ValidationFailure::general(format!(
            "no validator registered for kind '{}' ({})",
            artifact.kind, artifact.path
        ))
    })?;

    let contents = fs.read(path).map_err(|e| {
        ValidationFailure::io(format!("File {} could not be read: {e}", artifact.path))
    })?;

    validator.check(&artifact.path, &contents, notes)
}

/// Existence is all that matters (sentinel files, opaque payloads).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistsOnly;

impl ArtifactValidator for ExistsOnly {
    fn check(&self, _: &str, _: &[u8], _: &mut Vec<String>) -> Result<(), ValidationFailure> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValidator;

impl ArtifactValidator for JsonValidator {
    fn check(&self, path: &str, contents: &[u8], _: &mut Vec<String>) -> Result<(), ValidationFailure> {
        serde_json::from_slice::<serde_json::Value>(contents)
            .map(|_| ())
            .map_err(|_| ValidationFailure::general(format!("File {path} does not contain valid JSON")))
    }
}

/// Delimited numeric table: comma, tab or whitespace separated, one row per
/// line, consistent column count. A first row that is not numeric is taken
/// as a header.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixValidator;

impl ArtifactValidator for MatrixValidator {
    fn check(&self, path: &str, contents: &[u8], _: &mut Vec<String>) -> Result<(), ValidationFailure> {
        let text = std::str::from_utf8(contents)
            .map_err(|_| ValidationFailure::io(format!("Matrix {path} is not UTF-8 text")))?;

        let mut rows = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(split_cells)
            .peekable();

        let header_is_text = rows
            .peek()
            .map(|cells| cells.iter().any(|c| c.parse::<f64>().is_err()))
            .unwrap_or(false);
        if header_is_text {
            rows.next();
        }

        let mut width: Option<usize> = None;
        let mut count = 0usize;
        for (line_no, cells) in rows.enumerate() {
            count += 1;
            match width {
                None => width = Some(cells.len()),
                Some(w) if w != cells.len() => {
                    return Err(ValidationFailure::io(format!(
                        "Matrix {path} row {} has {} columns, expected {w}",
                        line_no + 1,
                        cells.len()
                    )));
                }
                Some(_) => {}
            }
            if let Some(bad) = cells.iter().find(|c| c.parse::<f64>().is_err()) {
                return Err(ValidationFailure::io(format!(
                    "Matrix {path} row {} has non-numeric value '{bad}'",
                    line_no + 1
                )));
            }
        }

        if count == 0 {
            return Err(ValidationFailure::io(format!("Matrix {path} has no data rows")));
        }
        Ok(())
    }
}

fn split_cells(line: &str) -> Vec<&str> {
    if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// GeoJSON vector data.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonValidator;

const GEOMETRY_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

impl ArtifactValidator for GeoJsonValidator {
    fn check(
        &self,
        path: &str,
        contents: &[u8],
        notes: &mut Vec<String>,
    ) -> Result<(), ValidationFailure> {
        let invalid = || ValidationFailure::general(format!("File {path} is not a valid GeoJSON file"));

        let value: serde_json::Value = serde_json::from_slice(contents).map_err(|_| invalid())?;
        let kind = value.get("type").and_then(|t| t.as_str()).ok_or_else(invalid)?;

        match kind {
            "FeatureCollection" => {
                let features = value
                    .get("features")
                    .and_then(|f| f.as_array())
                    .ok_or_else(invalid)?;
                if features.is_empty() {
                    notes.push(format!("Vector {path} has no features"));
                }
                Ok(())
            }
            "Feature" => Ok(()),
            k if GEOMETRY_TYPES.contains(&k) => Ok(()),
            _ => Err(invalid()),
        }
    }
}

/// GeoTIFF (classic or BigTIFF) or ESRI ASCII grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterValidator;

const TIFF_MAGIC: &[&[u8]] = &[b"II*\0", b"MM\0*", b"II+\0", b"MM\0+"];

impl ArtifactValidator for RasterValidator {
    fn check(&self, path: &str, contents: &[u8], _: &mut Vec<String>) -> Result<(), ValidationFailure> {
        if TIFF_MAGIC.iter().any(|m| contents.starts_with(m)) {
            return Ok(());
        }

        let invalid = |why: &str| {
            ValidationFailure::general(format!("File {path} is not a valid raster file ({why})"))
        };

        let text = std::str::from_utf8(contents).map_err(|_| invalid("unknown binary format"))?;
        let mut header: HashMap<String, f64> = HashMap::new();
        for line in text.lines().take(6) {
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            if let Ok(v) = value.parse::<f64>() {
                header.insert(key.to_ascii_lowercase(), v);
            }
        }

        for key in ["ncols", "nrows", "cellsize"] {
            if !header.contains_key(key) {
                return Err(invalid(&format!("missing '{key}'")));
            }
        }
        let has_x = header.contains_key("xllcorner") || header.contains_key("xllcenter");
        let has_y = header.contains_key("yllcorner") || header.contains_key("yllcenter");
        if !has_x || !has_y {
            return Err(invalid("missing lower-left origin"));
        }

        let ncols = header["ncols"];
        let nrows = header["nrows"];
        if ncols < 1.0 || nrows < 1.0 {
            return Err(invalid("empty grid"));
        }
        Ok(())
    }
}
