//! Types for representing schema changes between a snapshot and the current definition.

use crate::schema::{CollectionSchema, FieldDefinition, RuleType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single property-level change on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Dotted property path, e.g. `type`, `options.min`, `relation.maxSelect`
    pub property: String,
    pub old_value: Value,
    pub new_value: Value,
}

impl FieldChange {
    pub fn new(property: impl Into<String>, old_value: impl Into<Value>, new_value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

/// A field present on both sides whose definition changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldModification {
    /// Name of the field in the previous snapshot (the old name for renames)
    pub field_name: String,
    /// Definition recorded in the previous snapshot
    pub current_definition: FieldDefinition,
    /// Definition in the current schema
    pub new_definition: FieldDefinition,
    pub changes: Vec<FieldChange>,
}

impl FieldModification {
    /// Check if this modification renames the field
    pub fn is_rename(&self) -> bool {
        self.changes.iter().any(|c| c.property == "name")
    }

    /// Check if the field type changed
    pub fn has_type_change(&self) -> bool {
        self.changes.iter().any(|c| c.property == "type")
    }

    /// Check if the field transitions to `required = true`
    pub fn becomes_required(&self) -> bool {
        self.changes
            .iter()
            .any(|c| c.property == "required" && c.new_value == Value::Bool(true))
    }

    /// Type changes and required transitions can fail on existing data.
    pub fn is_destructive(&self) -> bool {
        self.has_type_change() || self.becomes_required()
    }

    /// Name of the field after the change is applied.
    pub fn new_name(&self) -> &str {
        &self.new_definition.name
    }
}

/// A change of one rule slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub rule_type: RuleType,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Permission changes share the shape of rule updates.
pub type PermissionChange = RuleUpdate;

/// All changes for a collection present in both the snapshot and the definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionModification {
    pub collection: String,
    pub fields_to_add: Vec<FieldDefinition>,
    pub fields_to_remove: Vec<FieldDefinition>,
    pub fields_to_modify: Vec<FieldModification>,
    pub indexes_to_add: Vec<String>,
    pub indexes_to_remove: Vec<String>,
    pub rules_to_update: Vec<RuleUpdate>,
    pub permissions_to_update: Vec<PermissionChange>,
}

impl CollectionModification {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Check if any change list is non-empty
    pub fn has_changes(&self) -> bool {
        !self.fields_to_add.is_empty()
            || !self.fields_to_remove.is_empty()
            || !self.fields_to_modify.is_empty()
            || self.has_collection_level_changes()
    }

    /// Index, rule or permission changes
    pub fn has_collection_level_changes(&self) -> bool {
        !self.indexes_to_add.is_empty()
            || !self.indexes_to_remove.is_empty()
            || !self.rules_to_update.is_empty()
            || !self.permissions_to_update.is_empty()
    }

    pub fn clear_collection_level_changes(&mut self) {
        self.indexes_to_add.clear();
        self.indexes_to_remove.clear();
        self.rules_to_update.clear();
        self.permissions_to_update.clear();
    }

    /// Field modifications that rename a field
    pub fn renames(&self) -> impl Iterator<Item = &FieldModification> {
        self.fields_to_modify.iter().filter(|m| m.is_rename())
    }
}

/// Complete change-set between a snapshot and the current definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    /// New collections, each carrying a durable id
    pub collections_to_create: Vec<CollectionSchema>,
    pub collections_to_delete: Vec<CollectionSchema>,
    pub collections_to_modify: Vec<CollectionModification>,
    /// Collection name to id, as recorded in the previous snapshot
    pub existing_collection_ids: BTreeMap<String, String>,
}

impl SchemaDiff {
    /// Check if the diff carries no changes at all
    pub fn is_empty(&self) -> bool {
        self.collections_to_create.is_empty()
            && self.collections_to_delete.is_empty()
            && self.collections_to_modify.is_empty()
    }

    pub fn modification(&self, collection: &str) -> Option<&CollectionModification> {
        self.collections_to_modify.iter().find(|m| m.collection == collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use serde_json::json;

    fn make_modification(changes: Vec<FieldChange>) -> FieldModification {
        FieldModification {
            field_name: "age".to_string(),
            current_definition: FieldDefinition::new("age", FieldType::Text),
            new_definition: FieldDefinition::new("age", FieldType::Number),
            changes,
        }
    }

    #[test]
    fn test_type_change_is_destructive() {
        let modification = make_modification(vec![FieldChange::new("type", "text", "number")]);
        assert!(modification.has_type_change());
        assert!(modification.is_destructive());
        assert!(!modification.is_rename());
    }

    #[test]
    fn test_required_only_destructive_when_turned_on() {
        let on = make_modification(vec![FieldChange::new("required", false, true)]);
        let off = make_modification(vec![FieldChange::new("required", true, false)]);
        assert!(on.becomes_required());
        assert!(!off.becomes_required());
        assert!(!off.is_destructive());
    }

    #[test]
    fn test_empty_modification_has_no_changes() {
        let mut modification = CollectionModification::new("posts");
        assert!(!modification.has_changes());
        modification.indexes_to_add.push("CREATE INDEX idx ON posts (title)".to_string());
        assert!(modification.has_changes());
        modification.clear_collection_level_changes();
        assert!(!modification.has_changes());
    }

    #[test]
    fn test_diff_serializes_camel_case() {
        let diff = SchemaDiff::default();
        let value = serde_json::to_value(&diff).unwrap();
        assert_eq!(value["collectionsToCreate"], json!([]));
        assert_eq!(value["existingCollectionIds"], json!({}));
        assert!(diff.is_empty());
    }
}
