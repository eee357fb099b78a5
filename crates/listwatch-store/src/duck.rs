//! DuckDB storage for the current-state and change-event tables.

use std::path::Path;

use arrow::array::{Array, Int64Array};
use arrow::record_batch::RecordBatch;
use duckdb::Connection;
use listwatch_core::PropertyId;
use listwatch_core::schema::{CHANGES_TABLE, PROPERTIES_TABLE};
use tracing::info;

use crate::StoreError;
use crate::parquet_io::write_parquet;
use crate::sink::Sink;

/// DuckDB store holding the `properties` and `changes` tables.
///
/// Tables are always created with `CREATE OR REPLACE` from Parquet, so a load
/// publishes a complete table in one statement.
///
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for a file that survives across runs.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Check whether both output tables exist.
    pub fn has_tables(&self) -> bool {
        self.properties_count().is_ok() && self.changes_count().is_ok()
    }

    /// Load `properties.parquet` into the `properties` table.
    pub fn load_properties(&self, path: &Path) -> Result<usize, StoreError> {
        self.replace_from_parquet(PROPERTIES_TABLE, path)
    }

    /// Load `changes.parquet` into the `changes` table.
    pub fn load_changes(&self, path: &Path) -> Result<usize, StoreError> {
        self.replace_from_parquet(CHANGES_TABLE, path)
    }

    /// Load both tables from a directory holding the Parquet outputs of a run.
    pub fn load_all(&self, data_dir: &Path) -> Result<(), StoreError> {
        self.load_properties(&data_dir.join(format!("{PROPERTIES_TABLE}.parquet")))?;
        self.load_changes(&data_dir.join(format!("{CHANGES_TABLE}.parquet")))?;
        Ok(())
    }

    fn replace_from_parquet(&self, table: &str, path: &Path) -> Result<usize, StoreError> {
        if !path.exists() {
            return Err(StoreError::ParquetNotFound(path.to_path_buf()));
        }
        let sql = format!(
            "CREATE OR REPLACE TABLE {table} AS SELECT * FROM read_parquet('{}')",
            sql_quote(&path.display().to_string())
        );
        self.conn.execute_batch(&sql)?;
        let count = self.count_table(table)?;
        info!(table, count, "replaced table");
        Ok(count)
    }

    /// Stage a batch as Parquet in a temp dir, then replace `table` from it.
    fn replace_from_batch(&self, table: &str, batch: &RecordBatch) -> Result<usize, StoreError> {
        let staging = tempfile::TempDir::new()?;
        let path = staging.path().join(format!("{table}.parquet"));
        write_parquet(&path, batch)?;
        self.replace_from_parquet(table, &path)
    }

    // ── Counts ──

    /// Number of rows in the `properties` table.
    pub fn properties_count(&self) -> Result<usize, StoreError> {
        self.count_table(PROPERTIES_TABLE)
    }

    /// Number of rows in the `changes` table.
    pub fn changes_count(&self) -> Result<usize, StoreError> {
        self.count_table(CHANGES_TABLE)
    }

    /// `(active, inactive)` listing counts.
    pub fn active_counts(&self) -> Result<(usize, usize), StoreError> {
        let sql = format!(
            "SELECT count(*) FILTER (WHERE active)::BIGINT AS active,
                    count(*) FILTER (WHERE NOT active)::BIGINT AS inactive
             FROM {PROPERTIES_TABLE}"
        );
        let batches = self.query_arrow(&sql)?;
        let batch = batches.first().ok_or(StoreError::NoResults)?;
        Ok((int_cell(batch, 0)?, int_cell(batch, 1)?))
    }

    fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT AS cnt FROM {table}");
        let batches = self.query_arrow(&sql)?;
        let batch = batches.first().ok_or(StoreError::NoResults)?;
        int_cell(batch, 0)
    }

    // ── Lookups ──

    /// Current-state row for one listing.
    pub fn get_property(&self, id: PropertyId) -> Result<RecordBatch, StoreError> {
        let sql = format!("SELECT * FROM {PROPERTIES_TABLE} WHERE id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([id.0])?.collect();
        let batch = batches.into_iter().next().ok_or(StoreError::NoResults)?;
        if batch.num_rows() == 0 {
            return Err(StoreError::NoResults);
        }
        Ok(batch)
    }

    /// Change history of one listing, oldest first.
    pub fn changes_for(&self, id: PropertyId) -> Result<Vec<RecordBatch>, StoreError> {
        let sql = format!(
            "SELECT field, old_value, new_value, changed_at FROM {CHANGES_TABLE}
             WHERE id = ? ORDER BY changed_at, field"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([id.0])?.collect();
        Ok(batches)
    }

    // ── Escape hatch ──

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }
}

impl Sink for DuckStore {
    fn replace_properties(&self, batch: &RecordBatch) -> Result<usize, StoreError> {
        self.replace_from_batch(PROPERTIES_TABLE, batch)
    }

    fn replace_changes(&self, batch: &RecordBatch) -> Result<usize, StoreError> {
        self.replace_from_batch(CHANGES_TABLE, batch)
    }
}

/// Escape a value for use inside a single-quoted SQL literal.
fn sql_quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn int_cell(batch: &RecordBatch, col: usize) -> Result<usize, StoreError> {
    let col = batch
        .column(col)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| StoreError::Other("count column not i64".into()))?;
    if col.is_empty() {
        return Err(StoreError::NoResults);
    }
    Ok(col.value(0) as usize)
}
