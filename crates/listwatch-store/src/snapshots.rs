//! Raw snapshot files written by the crawler.
//!
//! Each file is one JSON document:
//!
//! ```json
//! { "crawled_at": "2025-08-01 10:00:00", "bairro": "centro", "properties": [ ... ] }
//! ```
//!
//! `collection_date` stands in when `crawled_at` is missing. Files are taken in
//! sorted path order, which becomes the ingestion order of the run.

use std::collections::HashSet;
use std::path::Path;

use listwatch_core::RawSnapshot;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::StoreError;

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    crawled_at: Option<String>,
    #[serde(default)]
    collection_date: Option<String>,
    /// Neighbourhood slug the batch was collected for.
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    properties: Vec<Value>,
}

/// Snapshots read from a directory tree.
#[derive(Debug, Default)]
pub struct LoadedSnapshots {
    pub snapshots: Vec<RawSnapshot>,
    /// Files that could not be read or parsed.
    pub skipped: usize,
}

/// Read one snapshot file.
pub fn read_snapshot_file(path: &Path) -> Result<RawSnapshot, StoreError> {
    let raw = std::fs::read_to_string(path)?;
    let file: SnapshotFile = serde_json::from_str(&raw)?;

    let captured_at = file
        .crawled_at
        .or(file.collection_date)
        .unwrap_or_default();
    let mut records = file.properties;
    if let Some(area) = file.bairro {
        for record in &mut records {
            if let Some(obj) = record.as_object_mut() {
                obj.entry("bairro_coleta")
                    .or_insert_with(|| Value::String(area.clone()));
            }
        }
    }
    Ok(RawSnapshot::new(path.display().to_string(), captured_at, records))
}

/// Read every `*.json` file under `dir`, recursively.
///
/// A file or directory entry that cannot be read is logged, counted in
/// [`LoadedSnapshots::skipped`] and skipped. A file reached more than once
/// through symlinks is loaded once.
pub fn load_snapshot_dir(dir: &Path) -> Result<LoadedSnapshots, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::SnapshotDirNotFound(dir.to_path_buf()));
    }
    let mut loaded = LoadedSnapshots::default();
    let pattern = format!("{}/**/*.json", glob::Pattern::escape(&dir.display().to_string()));

    let mut paths = Vec::new();
    let mut seen = HashSet::new();
    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable entry");
                loaded.skipped += 1;
                continue;
            }
        };
        let real = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if seen.insert(real) {
            paths.push(path);
        }
    }
    paths.sort();

    for path in &paths {
        match read_snapshot_file(path) {
            Ok(snapshot) => loaded.snapshots.push(snapshot),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping snapshot file");
                loaded.skipped += 1;
            }
        }
    }
    info!(
        dir = %dir.display(),
        files = paths.len(),
        loaded = loaded.snapshots.len(),
        skipped = loaded.skipped,
        "loaded snapshot files"
    );
    Ok(loaded)
}
