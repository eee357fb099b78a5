use thiserror::Error;

/// Why a single raw listing could not become a canonical record.
#[derive(Debug, Error, PartialEq)]
pub enum CanonicalError {
    #[error("raw listing is not a JSON object")]
    NotAnObject,

    #[error("raw listing has no id")]
    MissingId,

    #[error("raw listing id is not an integer: {0}")]
    InvalidId(String),
}

/// Why a whole snapshot was left out of a run.
#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("snapshot {source_label} has an unparseable capture time: {value:?}")]
    InvalidTimestamp { source_label: String, value: String },
}
