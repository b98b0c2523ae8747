use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading schema definitions and snapshots.
///
/// The diff engine itself never fails; these come from the loading layer in
/// front of it.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Reading a schema or snapshot file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schema or snapshot file is not valid JSON for the expected shape.
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two collections share a name (compared case-insensitively).
    #[error("duplicate collection '{name}' in {path}")]
    DuplicateCollection { name: String, path: PathBuf },

    /// A field carries relation settings without being a relation, or the reverse.
    #[error("field '{field}' in collection '{collection}' has relation settings inconsistent with its type")]
    RelationMismatch { collection: String, field: String },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
