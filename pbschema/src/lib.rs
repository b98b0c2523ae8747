//! pbschema: schema diffing for PocketBase collections.
//!
//! Compares the desired [`SchemaDefinition`] against the last recorded
//! [`SchemaSnapshot`] and produces a [`SchemaDiff`] describing which
//! collections to create, delete and modify. Around the engine sit a
//! destructive-change classifier, a diff filter, a change summary, a
//! dependency orderer and the loaders used by the `pbschema` binary.

pub mod config;
pub mod differ;
pub mod errors;
pub mod filter;
pub mod id;
pub mod loader;
pub mod ordering;
pub mod schema;
pub mod severity;
pub mod summary;

pub use config::{DiffEngineConfig, Severity};
pub use differ::{
    CollectionModification, FieldChange, FieldModification, PermissionChange, RuleUpdate, SchemaDiff,
    aggregate_changes, aggregate_changes_with_registry,
};
pub use errors::{Result, SchemaError};
pub use filter::{FilterOptions, filter_diff};
pub use id::{CollectionIdRegistry, IdRegistry};
pub use loader::{load_schema_definition, load_snapshot, save_snapshot};
pub use ordering::{CollectionOrder, order_collections_by_dependency};
pub use schema::{
    CollectionSchema, CollectionType, FieldDefinition, FieldType, RelationConfig, RuleSet, RuleType,
    SchemaDefinition, SchemaSnapshot,
};
pub use severity::{DestructiveChange, DestructiveChangeKind, detect_destructive_changes, requires_force_flag};
pub use summary::{ChangeCounts, ChangeSummary, summarize_changes};
