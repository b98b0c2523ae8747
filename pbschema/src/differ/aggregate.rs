//! Top-level diff entry point.

use super::changes::SchemaDiff;
use super::collections::{
    build_collection_modification, find_new_collections, find_removed_collections, match_collections_by_name,
};
use super::fields::CollectionIdMap;
use crate::config::DiffEngineConfig;
use crate::id::{CollectionIdRegistry, IdRegistry};
use crate::schema::{SchemaDefinition, SchemaSnapshot};
use log::debug;
use std::collections::BTreeMap;

/// Compare the current definition against the previous snapshot.
///
/// A `None` snapshot means first run: every non-system collection is
/// created. Ids for new collections come from a registry scoped to this call.
pub fn aggregate_changes(
    current: &SchemaDefinition,
    previous: Option<&SchemaSnapshot>,
    config: &DiffEngineConfig,
) -> SchemaDiff {
    let mut registry = CollectionIdRegistry::new();
    aggregate_changes_with_registry(current, previous, config, &mut registry)
}

/// Same as [`aggregate_changes`] with a caller supplied id registry.
pub fn aggregate_changes_with_registry(
    current: &SchemaDefinition,
    previous: Option<&SchemaSnapshot>,
    config: &DiffEngineConfig,
    registry: &mut dyn IdRegistry,
) -> SchemaDiff {
    let id_to_name = build_collection_id_map(previous);

    let mut collections_to_create: Vec<_> = find_new_collections(current, previous)
        .into_iter()
        .filter(|c| !config.is_system_collection(&c.name))
        .cloned()
        .collect();
    let collections_to_delete: Vec<_> = find_removed_collections(current, previous)
        .into_iter()
        .filter(|c| !config.is_system_collection(&c.name))
        .cloned()
        .collect();

    let known_ids = previous
        .into_iter()
        .flat_map(|s| s.iter())
        .chain(current.iter())
        .filter_map(|c| c.id.as_deref());
    for id in known_ids {
        registry.register(id);
    }
    for collection in &mut collections_to_create {
        if collection.id.as_deref().is_none_or(str::is_empty) {
            collection.id = Some(registry.generate());
        }
    }

    let collections_to_modify: Vec<_> = match_collections_by_name(current, previous)
        .into_iter()
        .map(|(current, previous)| build_collection_modification(current, previous, &id_to_name, config))
        .filter(|m| m.has_changes())
        .collect();

    let existing_collection_ids: BTreeMap<String, String> = previous
        .into_iter()
        .flat_map(|s| s.iter())
        .filter_map(|c| c.id.as_ref().map(|id| (c.name.clone(), id.clone())))
        .collect();

    debug!(
        "schema diff: {} to create, {} to delete, {} to modify",
        collections_to_create.len(),
        collections_to_delete.len(),
        collections_to_modify.len()
    );

    SchemaDiff {
        collections_to_create,
        collections_to_delete,
        collections_to_modify,
        existing_collection_ids,
    }
}

/// Collection id to name lookup from the previous snapshot.
pub fn build_collection_id_map(previous: Option<&SchemaSnapshot>) -> CollectionIdMap {
    previous
        .into_iter()
        .flat_map(|s| s.iter())
        .filter_map(|c| c.id.as_ref().map(|id| (id.clone(), c.name.clone())))
        .collect()
}
