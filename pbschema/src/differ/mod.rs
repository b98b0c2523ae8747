//! Schema diff engine.
//!
//! This module provides functionality to:
//! - Normalize option values so explicit defaults match absent values
//! - Compare fields, indexes, rules and permissions of matched collections
//! - Detect single-field renames per field type
//! - Aggregate everything into a [`SchemaDiff`] for migration generation

mod aggregate;
mod changes;
mod collections;
mod fields;
mod indexes;
mod normalize;
mod rules;

pub use aggregate::{aggregate_changes, aggregate_changes_with_registry, build_collection_id_map};
pub use changes::{
    CollectionModification, FieldChange, FieldModification, PermissionChange, RuleUpdate, SchemaDiff,
};
pub use collections::{
    USERS_COLLECTION, build_collection_modification, find_new_collections, find_removed_collections,
    match_collections_by_name,
};
pub use fields::{
    CollectionIdMap, detect_field_changes, find_new_fields, find_removed_fields, match_fields_by_name,
    relation_targets_match, resolve_relation_target, strip_collection_expression,
};
pub use indexes::{IndexChanges, compare_indexes};
pub use normalize::{are_values_equal, normalize_option_value};
pub use rules::{compare_permissions, compare_rules};
