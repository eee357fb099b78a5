//! Temporal change detection and lifecycle inference over listing snapshots.

pub mod canonical;
pub mod changes;
pub mod dedup;
pub mod error;
pub mod field;
pub mod history;
pub mod lifecycle;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod snapshot;
pub mod state;

pub use canonical::canonicalize;
pub use changes::detect_changes;
pub use error::{CanonicalError, SnapshotError};
pub use field::{Field, FieldKind, FieldValue};
pub use lifecycle::{Lifecycle, LifecycleIndex};
pub use pipeline::{Output, RunSummary, run};
pub use record::{ChangeEvent, PropertyId, PropertyRecord, PropertyState, RawSnapshot};
