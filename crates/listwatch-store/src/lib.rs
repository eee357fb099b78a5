//! Storage layer: raw snapshot loading, Parquet outputs, DuckDB tables.

mod error;
pub use error::StoreError;

mod parquet_io;
pub use parquet_io::{read_parquet, write_parquet};

pub mod sink;
pub use sink::{ParquetSink, Persisted, Sink, persist};

pub mod snapshots;
pub use snapshots::{LoadedSnapshots, load_snapshot_dir, read_snapshot_file};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
