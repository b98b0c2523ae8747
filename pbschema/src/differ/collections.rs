//! Collection matching and per-collection modification building.

use super::changes::{CollectionModification, FieldChange, FieldModification};
use super::fields::{
    CollectionIdMap, detect_field_changes, find_new_fields, find_removed_fields, match_fields_by_name,
    relation_targets_match,
};
use super::indexes::compare_indexes;
use super::rules::{compare_permissions, compare_rules};
use crate::config::DiffEngineConfig;
use crate::schema::{CollectionSchema, FieldDefinition, FieldType, SchemaDefinition, SchemaSnapshot};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Name of the auth collection whose server-managed fields are never added.
pub const USERS_COLLECTION: &str = "users";

/// Pair current collections with previous ones by case-insensitive name.
pub fn match_collections_by_name<'a, 'b>(
    current: &'a SchemaDefinition,
    previous: Option<&'b SchemaSnapshot>,
) -> Vec<(&'a CollectionSchema, &'b CollectionSchema)> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let previous_by_name: HashMap<String, &CollectionSchema> =
        previous.iter().map(|c| (c.name.to_lowercase(), c)).collect();

    current
        .iter()
        .filter_map(|c| previous_by_name.get(&c.name.to_lowercase()).map(|p| (c, *p)))
        .collect()
}

/// Current collections whose key is absent from the snapshot (exact case).
///
/// Without a snapshot every collection is new.
pub fn find_new_collections<'a>(
    current: &'a SchemaDefinition,
    previous: Option<&SchemaSnapshot>,
) -> Vec<&'a CollectionSchema> {
    match previous {
        Some(previous) => current
            .collections
            .iter()
            .filter(|(name, _)| !previous.collections.contains_key(*name))
            .map(|(_, c)| c)
            .collect(),
        None => current.iter().collect(),
    }
}

/// Snapshot collections whose key is absent from the current definition (exact case).
pub fn find_removed_collections<'b>(
    current: &SchemaDefinition,
    previous: Option<&'b SchemaSnapshot>,
) -> Vec<&'b CollectionSchema> {
    match previous {
        Some(previous) => previous
            .collections
            .iter()
            .filter(|(name, _)| !current.collections.contains_key(*name))
            .map(|(_, c)| c)
            .collect(),
        None => Vec::new(),
    }
}

/// Build the full modification record for a matched collection pair.
pub fn build_collection_modification(
    current: &CollectionSchema,
    previous: &CollectionSchema,
    id_to_name: &CollectionIdMap,
    config: &DiffEngineConfig,
) -> CollectionModification {
    let mut modification = CollectionModification::new(current.name.clone());

    let mut added = find_new_fields(&current.fields, &previous.fields);
    if current.name == USERS_COLLECTION {
        added.retain(|f| !config.is_users_system_field(&f.name));
    }
    let removed = find_removed_fields(&current.fields, &previous.fields);

    for (current_field, previous_field) in match_fields_by_name(&current.fields, &previous.fields) {
        let changes = detect_field_changes(current_field, previous_field, id_to_name);
        if !changes.is_empty() {
            modification.fields_to_modify.push(FieldModification {
                field_name: previous_field.name.clone(),
                current_definition: previous_field.clone(),
                new_definition: current_field.clone(),
                changes,
            });
        }
    }

    let renames = detect_renames(&added, &removed, id_to_name);
    let renamed_to: HashSet<&str> = renames.iter().map(|(_, new)| new.name.as_str()).collect();
    let renamed_from: HashSet<&str> = renames.iter().map(|(old, _)| old.name.as_str()).collect();

    modification.fields_to_add = added
        .into_iter()
        .filter(|f| !renamed_to.contains(f.name.as_str()))
        .cloned()
        .collect();
    modification.fields_to_remove = removed
        .into_iter()
        .filter(|f| !renamed_from.contains(f.name.as_str()))
        .cloned()
        .collect();

    for (old, new) in renames {
        let mut changes = detect_field_changes(new, old, id_to_name);
        changes.push(FieldChange::new("name", old.name.as_str(), new.name.as_str()));
        modification.fields_to_modify.push(FieldModification {
            field_name: old.name.clone(),
            current_definition: old.clone(),
            new_definition: new.clone(),
            changes,
        });
    }

    let indexes = compare_indexes(&current.indexes, &previous.indexes);
    modification.indexes_to_add = indexes.indexes_to_add;
    modification.indexes_to_remove = indexes.indexes_to_remove;
    modification.rules_to_update = compare_rules(current, previous);
    modification.permissions_to_update = compare_permissions(current, previous);

    modification
}

/// Pair one removed field with one added field of the same type.
///
/// Only types with exactly one addition and one removal qualify; relation
/// fields must also point at the same collection. Returns `(old, new)`.
fn detect_renames<'a>(
    added: &[&'a FieldDefinition],
    removed: &[&'a FieldDefinition],
    id_to_name: &CollectionIdMap,
) -> Vec<(&'a FieldDefinition, &'a FieldDefinition)> {
    let added_by_type = group_by_type(added);
    let removed_by_type = group_by_type(removed);

    let mut renames = Vec::new();
    for (field_type, new_fields) in &added_by_type {
        let Some(old_fields) = removed_by_type.get(field_type) else {
            continue;
        };
        let ([new], [old]) = (new_fields.as_slice(), old_fields.as_slice()) else {
            continue;
        };
        if *field_type == FieldType::Relation
            && !relation_targets_match(new.relation.as_ref(), old.relation.as_ref(), id_to_name)
        {
            continue;
        }
        renames.push((*old, *new));
    }
    renames
}

fn group_by_type<'a>(fields: &[&'a FieldDefinition]) -> BTreeMap<FieldType, Vec<&'a FieldDefinition>> {
    let mut groups: BTreeMap<FieldType, Vec<&'a FieldDefinition>> = BTreeMap::new();
    for field in fields {
        groups.entry(field.field_type).or_default().push(*field);
    }
    groups
}
