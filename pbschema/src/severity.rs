//! Destructive change classification and the force-flag gate.

use crate::config::{DiffEngineConfig, Severity};
use crate::differ::SchemaDiff;
use serde::Serialize;
use serde_json::Value;

/// Kind of potentially destructive change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestructiveChangeKind {
    CollectionDelete,
    FieldDelete,
    FieldTypeChange,
    FieldRequired,
    FieldModify,
}

impl std::fmt::Display for DestructiveChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DestructiveChangeKind::CollectionDelete => write!(f, "collection delete"),
            DestructiveChangeKind::FieldDelete => write!(f, "field delete"),
            DestructiveChangeKind::FieldTypeChange => write!(f, "type change"),
            DestructiveChangeKind::FieldRequired => write!(f, "required"),
            DestructiveChangeKind::FieldModify => write!(f, "field modify"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestructiveChange {
    pub kind: DestructiveChangeKind,
    pub severity: Severity,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// All changes at or above the configured severity threshold.
pub fn detect_destructive_changes(diff: &SchemaDiff, config: &DiffEngineConfig) -> Vec<DestructiveChange> {
    let mut changes = Vec::new();

    for collection in &diff.collections_to_delete {
        changes.push(DestructiveChange {
            kind: DestructiveChangeKind::CollectionDelete,
            severity: Severity::High,
            collection: collection.name.clone(),
            field: None,
            description: format!("Delete collection '{}' and all of its records", collection.name),
            old_value: None,
            new_value: None,
        });
    }

    for modification in &diff.collections_to_modify {
        for field in &modification.fields_to_remove {
            changes.push(DestructiveChange {
                kind: DestructiveChangeKind::FieldDelete,
                severity: Severity::High,
                collection: modification.collection.clone(),
                field: Some(field.name.clone()),
                description: format!("Delete field '{}.{}' and its data", modification.collection, field.name),
                old_value: None,
                new_value: None,
            });
        }

        for field in &modification.fields_to_modify {
            for change in &field.changes {
                let (kind, severity, description) = match change.property.as_str() {
                    "type" => (
                        DestructiveChangeKind::FieldTypeChange,
                        Severity::High,
                        format!(
                            "Change type of '{}.{}' from {} to {}",
                            modification.collection, field.field_name, change.old_value, change.new_value
                        ),
                    ),
                    "required" if change.new_value == Value::Bool(true) => (
                        DestructiveChangeKind::FieldRequired,
                        Severity::Medium,
                        format!("Make '{}.{}' required", modification.collection, field.field_name),
                    ),
                    property => (
                        DestructiveChangeKind::FieldModify,
                        Severity::Low,
                        format!(
                            "Change {property} of '{}.{}' from {} to {}",
                            modification.collection, field.field_name, change.old_value, change.new_value
                        ),
                    ),
                };

                changes.push(DestructiveChange {
                    kind,
                    severity,
                    collection: modification.collection.clone(),
                    field: Some(field.field_name.clone()),
                    description,
                    old_value: Some(change.old_value.clone()),
                    new_value: Some(change.new_value.clone()),
                });
            }
        }
    }

    changes.retain(|c| config.severity_threshold.includes(c.severity));
    changes
}

/// Whether applying the diff must be confirmed with an explicit force flag.
pub fn requires_force_flag(diff: &SchemaDiff, config: &DiffEngineConfig) -> bool {
    config.require_force_for_destructive && !detect_destructive_changes(diff, config).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::{CollectionModification, FieldChange, FieldModification};
    use crate::schema::{CollectionSchema, FieldDefinition, FieldType};

    fn make_field_modification(changes: Vec<FieldChange>) -> FieldModification {
        FieldModification {
            field_name: "count".to_string(),
            current_definition: FieldDefinition::new("count", FieldType::Number),
            new_definition: FieldDefinition::new("count", FieldType::Number),
            changes,
        }
    }

    fn make_diff(changes: Vec<FieldChange>) -> SchemaDiff {
        let mut modification = CollectionModification::new("posts");
        modification.fields_to_modify.push(make_field_modification(changes));
        SchemaDiff {
            collections_to_modify: vec![modification],
            ..SchemaDiff::default()
        }
    }

    fn at(threshold: Severity) -> DiffEngineConfig {
        DiffEngineConfig::default().with_threshold(threshold)
    }

    #[test]
    fn test_option_change_only_surfaces_at_low() {
        let diff = make_diff(vec![FieldChange::new("options.max", 10, 20)]);

        assert!(detect_destructive_changes(&diff, &at(Severity::High)).is_empty());
        assert!(detect_destructive_changes(&diff, &at(Severity::Medium)).is_empty());

        let low = detect_destructive_changes(&diff, &at(Severity::Low));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].severity, Severity::Low);
        assert_eq!(low[0].kind, DestructiveChangeKind::FieldModify);
    }

    #[test]
    fn test_required_transition_is_medium() {
        let diff = make_diff(vec![FieldChange::new("required", false, true)]);
        assert!(detect_destructive_changes(&diff, &at(Severity::High)).is_empty());
        let medium = detect_destructive_changes(&diff, &at(Severity::Medium));
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].kind, DestructiveChangeKind::FieldRequired);

        let relaxed = make_diff(vec![FieldChange::new("required", true, false)]);
        assert!(detect_destructive_changes(&relaxed, &at(Severity::Medium)).is_empty());
        assert_eq!(detect_destructive_changes(&relaxed, &at(Severity::Low)).len(), 1);
    }

    #[test]
    fn test_deletions_and_type_changes_are_high() {
        let mut diff = make_diff(vec![FieldChange::new("type", "text", "number")]);
        diff.collections_to_delete.push(CollectionSchema::new("legacy"));
        diff.collections_to_modify[0]
            .fields_to_remove
            .push(FieldDefinition::new("old", FieldType::Text));

        let high = detect_destructive_changes(&diff, &at(Severity::High));
        let kinds: Vec<_> = high.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DestructiveChangeKind::CollectionDelete,
                DestructiveChangeKind::FieldDelete,
                DestructiveChangeKind::FieldTypeChange,
            ]
        );
        assert!(high.iter().all(|c| c.severity == Severity::High));
    }

    #[test]
    fn test_force_flag_gate() {
        let mut diff = SchemaDiff::default();
        let config = DiffEngineConfig::default();
        assert!(!requires_force_flag(&diff, &config));

        diff.collections_to_delete.push(CollectionSchema::new("legacy"));
        assert!(requires_force_flag(&diff, &config));

        let disabled = DiffEngineConfig {
            require_force_for_destructive: false,
            ..DiffEngineConfig::default()
        };
        assert!(!requires_force_flag(&diff, &disabled));
    }

    #[test]
    fn test_low_changes_do_not_gate_at_high_threshold() {
        let diff = make_diff(vec![FieldChange::new("options.max", 10, 20)]);
        assert!(!requires_force_flag(&diff, &at(Severity::High)));
        assert!(requires_force_flag(&diff, &at(Severity::Low)));
    }
}
