//! Persistence collaborators for run outputs.
//!
//! Both tables are written replace-style: each run publishes the full current
//! state and the full change history, never an append log.

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use listwatch_core::Output;
use listwatch_core::schema::{CHANGES_TABLE, PROPERTIES_TABLE, changes_batch, properties_batch};
use tracing::info;

use crate::StoreError;
use crate::parquet_io::write_parquet;

/// Destination for the two output tables of a run.
pub trait Sink {
    /// Replace the current-state table. Returns the number of rows written.
    fn replace_properties(&self, batch: &RecordBatch) -> Result<usize, StoreError>;

    /// Replace the change-event table. Returns the number of rows written.
    fn replace_changes(&self, batch: &RecordBatch) -> Result<usize, StoreError>;
}

/// Rows written by [`persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persisted {
    pub properties: usize,
    pub changes: usize,
}

/// Convert a run's outputs to Arrow and hand them to `sink`.
pub fn persist(sink: &dyn Sink, output: &Output) -> Result<Persisted, StoreError> {
    let properties = sink.replace_properties(&properties_batch(&output.states)?)?;
    let changes = sink.replace_changes(&changes_batch(&output.changes)?)?;
    Ok(Persisted { properties, changes })
}

/// Writes `properties.parquet` and `changes.parquet` into a directory.
pub struct ParquetSink {
    dir: PathBuf,
}

impl ParquetSink {
    /// Create the sink, creating `dir` if needed.
    pub fn new(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn properties_path(&self) -> PathBuf {
        self.dir.join(format!("{PROPERTIES_TABLE}.parquet"))
    }

    pub fn changes_path(&self) -> PathBuf {
        self.dir.join(format!("{CHANGES_TABLE}.parquet"))
    }
}

impl Sink for ParquetSink {
    fn replace_properties(&self, batch: &RecordBatch) -> Result<usize, StoreError> {
        let path = self.properties_path();
        write_parquet(&path, batch)?;
        info!(rows = batch.num_rows(), path = %path.display(), "wrote properties");
        Ok(batch.num_rows())
    }

    fn replace_changes(&self, batch: &RecordBatch) -> Result<usize, StoreError> {
        let path = self.changes_path();
        write_parquet(&path, batch)?;
        info!(rows = batch.num_rows(), path = %path.display(), "wrote changes");
        Ok(batch.num_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parquet_io::read_parquet;
    use listwatch_core::{RawSnapshot, run};
    use serde_json::json;

    fn priced(price: i64) -> serde_json::Value {
        json!({ "id": 1, "prices": { "rawPrice": price } })
    }

    fn sample_output() -> Output {
        run(&[
            RawSnapshot::new("a", "2025-08-01", vec![priced(10)]),
            RawSnapshot::new("b", "2025-08-02", vec![priced(12)]),
        ])
    }

    fn rows(path: &Path) -> usize {
        read_parquet(path).unwrap().iter().map(|b| b.num_rows()).sum()
    }

    #[test]
    fn parquet_sink_writes_both_tables() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = ParquetSink::new(&tmp.path().join("out")).unwrap();
        let persisted = persist(&sink, &sample_output()).unwrap();
        assert_eq!(persisted, Persisted { properties: 1, changes: 1 });
        assert_eq!(rows(&sink.properties_path()), 1);
        assert_eq!(rows(&sink.changes_path()), 1);
    }

    #[test]
    fn second_run_replaces_not_appends() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sink = ParquetSink::new(tmp.path()).unwrap();
        persist(&sink, &sample_output()).unwrap();
        persist(&sink, &sample_output()).unwrap();
        assert_eq!(rows(&sink.properties_path()), 1);
        assert_eq!(rows(&sink.changes_path()), 1);
    }

    #[test]
    fn identical_runs_write_identical_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = ParquetSink::new(&tmp.path().join("a")).unwrap();
        let b = ParquetSink::new(&tmp.path().join("b")).unwrap();
        persist(&a, &sample_output()).unwrap();
        persist(&b, &sample_output()).unwrap();
        assert_eq!(
            std::fs::read(a.changes_path()).unwrap(),
            std::fs::read(b.changes_path()).unwrap()
        );
        assert_eq!(
            std::fs::read(a.properties_path()).unwrap(),
            std::fs::read(b.properties_path()).unwrap()
        );
    }
}
