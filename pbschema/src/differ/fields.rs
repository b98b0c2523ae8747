//! Field-level comparison: additions, removals and per-property changes.

use super::changes::FieldChange;
use super::normalize::{are_values_equal, normalize_option_value};
use crate::schema::{FieldDefinition, FieldType, RelationConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Collection id to collection name, taken from the previous snapshot.
pub type CollectionIdMap = HashMap<String, String>;

static COLLECTION_LOOKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*app\.findCollectionByNameOrId\(\s*["'`]([^"'`]+)["'`]\s*\)\s*$"#)
        .expect("collection lookup pattern is valid")
});

/// Fields of `current` whose name does not appear in `previous`.
pub fn find_new_fields<'a>(current: &'a [FieldDefinition], previous: &[FieldDefinition]) -> Vec<&'a FieldDefinition> {
    let previous_names: HashSet<&str> = previous.iter().map(|f| f.name.as_str()).collect();
    current
        .iter()
        .filter(|f| !previous_names.contains(f.name.as_str()))
        .collect()
}

/// Fields of `previous` whose name does not appear in `current`.
pub fn find_removed_fields<'a>(
    current: &[FieldDefinition],
    previous: &'a [FieldDefinition],
) -> Vec<&'a FieldDefinition> {
    find_new_fields(previous, current)
}

/// `(current, previous)` pairs for field names present on both sides.
pub fn match_fields_by_name<'a, 'b>(
    current: &'a [FieldDefinition],
    previous: &'b [FieldDefinition],
) -> Vec<(&'a FieldDefinition, &'b FieldDefinition)> {
    let previous_by_name: HashMap<&str, &FieldDefinition> = previous.iter().map(|f| (f.name.as_str(), f)).collect();
    current
        .iter()
        .filter_map(|f| previous_by_name.get(f.name.as_str()).map(|p| (f, *p)))
        .collect()
}

/// Strip an `app.findCollectionByNameOrId("X")` expression down to `X`.
pub fn strip_collection_expression(target: &str) -> &str {
    match COLLECTION_LOOKUP.captures(target).and_then(|c| c.get(1)) {
        Some(name) => name.as_str(),
        None => target.trim(),
    }
}

/// Resolve a relation target to a lowercase collection name.
pub fn resolve_relation_target(target: &str, id_to_name: &CollectionIdMap) -> String {
    let stripped = strip_collection_expression(target);
    id_to_name
        .get(stripped)
        .map(String::as_str)
        .unwrap_or(stripped)
        .to_lowercase()
}

/// Whether two relation configs point at the same collection.
pub fn relation_targets_match(
    current: Option<&RelationConfig>,
    previous: Option<&RelationConfig>,
    id_to_name: &CollectionIdMap,
) -> bool {
    match (current, previous) {
        (Some(current), Some(previous)) => {
            resolve_relation_target(&current.collection, id_to_name)
                == resolve_relation_target(&previous.collection, id_to_name)
        }
        (None, None) => true,
        _ => false,
    }
}

/// All property-level differences between two definitions of a field.
///
/// Reported values are the raw, non-normalized values from each side.
pub fn detect_field_changes(
    current: &FieldDefinition,
    previous: &FieldDefinition,
    id_to_name: &CollectionIdMap,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if current.field_type != previous.field_type {
        changes.push(FieldChange::new(
            "type",
            previous.field_type.as_str(),
            current.field_type.as_str(),
        ));
    }

    changes.extend(detect_constraint_changes(current, previous));
    changes.extend(detect_option_changes(current, previous));

    if current.field_type == FieldType::Relation && previous.field_type == FieldType::Relation {
        changes.extend(detect_relation_changes(current, previous, id_to_name));
    }

    changes
}

fn detect_constraint_changes(current: &FieldDefinition, previous: &FieldDefinition) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if current.required != previous.required {
        changes.push(FieldChange::new("required", previous.required, current.required));
    }

    if current.unique != previous.unique {
        changes.push(FieldChange::new("unique", previous.unique, current.unique));
    }

    changes
}

fn detect_option_changes(current: &FieldDefinition, previous: &FieldDefinition) -> Vec<FieldChange> {
    let keys: BTreeSet<&String> = current.options.keys().chain(previous.options.keys()).collect();
    let mut changes = Vec::new();

    for key in keys {
        let current_value = current.options.get(key);
        let previous_value = previous.options.get(key);

        let normalized_current = normalize_option_value(key, current_value, current.field_type);
        let normalized_previous = normalize_option_value(key, previous_value, previous.field_type);
        if normalized_current.is_none() && normalized_previous.is_none() {
            continue;
        }

        if !are_values_equal(current_value, previous_value) {
            changes.push(FieldChange::new(
                format!("options.{key}"),
                previous_value.cloned().unwrap_or(Value::Null),
                current_value.cloned().unwrap_or(Value::Null),
            ));
        }
    }

    changes
}

fn detect_relation_changes(
    current: &FieldDefinition,
    previous: &FieldDefinition,
    id_to_name: &CollectionIdMap,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let (Some(current_rel), Some(previous_rel)) = (current.relation.as_ref(), previous.relation.as_ref()) else {
        return changes;
    };

    if !relation_targets_match(Some(current_rel), Some(previous_rel), id_to_name) {
        changes.push(FieldChange::new(
            "relation.collection",
            previous_rel.collection.as_str(),
            current_rel.collection.as_str(),
        ));
    }

    if current_rel.cascade_delete != previous_rel.cascade_delete {
        changes.push(FieldChange::new(
            "relation.cascadeDelete",
            previous_rel.cascade_delete,
            current_rel.cascade_delete,
        ));
    }

    // maxSelect 1 and minSelect 0 are the single-relation defaults
    if collapse_default(current_rel.max_select, 1) != collapse_default(previous_rel.max_select, 1) {
        changes.push(FieldChange::new(
            "relation.maxSelect",
            previous_rel.max_select,
            current_rel.max_select,
        ));
    }

    if collapse_default(current_rel.min_select, 0) != collapse_default(previous_rel.min_select, 0) {
        changes.push(FieldChange::new(
            "relation.minSelect",
            previous_rel.min_select,
            current_rel.min_select,
        ));
    }

    changes
}

fn collapse_default(value: Option<u32>, default: u32) -> Option<u32> {
    value.filter(|v| *v != default)
}
