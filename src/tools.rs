// src/tools.rs

//! Small helpers the generated document calls back into.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Create every path in `paths` that does not exist yet as an empty file.
///
/// Existing files are left alone. Returns the paths that were created.
pub fn touch_missing<P>(fs: &dyn FileSystem, paths: &[P]) -> Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let mut created = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if fs.exists(path) {
            debug!(path = %path.display(), "already exists; not touching");
            continue;
        }
        fs.write(path, b"")?;
        created.push(path.to_path_buf());
    }
    info!(created = created.len(), total = paths.len(), "touched missing outputs");
    Ok(created)
}

/// Copy the lines of `input` that name existing files into `output`.
///
/// Blank lines are ignored. Returns how many candidates were kept.
pub fn triage(fs: &dyn FileSystem, input: &Path, output: &Path) -> Result<usize> {
    let candidates = fs.read_to_string(input)?;

    let kept: Vec<&str> = candidates
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| fs.exists(Path::new(line)))
        .collect();

    let mut body = kept.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    fs.write(output, body.as_bytes())?;

    info!(
        input = %input.display(),
        kept = kept.len(),
        "triaged candidate files"
    );
    Ok(kept.len())
}
