//! Human-readable change summary for status reporting.

use crate::differ::SchemaDiff;
use serde::Serialize;

/// Per-category change counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub collections_to_create: usize,
    pub collections_to_delete: usize,
    pub collections_to_modify: usize,
    pub fields_to_add: usize,
    pub fields_to_remove: usize,
    pub fields_to_modify: usize,
    pub indexes_to_add: usize,
    pub indexes_to_remove: usize,
    pub rules_to_update: usize,
    pub permissions_to_update: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.collections_to_create
            + self.collections_to_delete
            + self.fields_to_add
            + self.fields_to_remove
            + self.fields_to_modify
            + self.indexes_to_add
            + self.indexes_to_remove
            + self.rules_to_update
            + self.permissions_to_update
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub counts: ChangeCounts,
    pub destructive_changes: Vec<String>,
    pub non_destructive_changes: Vec<String>,
}

impl ChangeSummary {
    pub fn has_changes(&self) -> bool {
        self.counts.total() > 0
    }

    pub fn has_destructive_changes(&self) -> bool {
        !self.destructive_changes.is_empty()
    }
}

/// Count and describe every change in the diff.
///
/// A field modification with a type change or a required transition is listed
/// once under destructive changes; other modifications are listed once under
/// non-destructive changes.
pub fn summarize_changes(diff: &SchemaDiff) -> ChangeSummary {
    let mut summary = ChangeSummary::default();
    let counts = &mut summary.counts;

    counts.collections_to_create = diff.collections_to_create.len();
    counts.collections_to_delete = diff.collections_to_delete.len();
    counts.collections_to_modify = diff.collections_to_modify.len();

    for collection in &diff.collections_to_create {
        summary
            .non_destructive_changes
            .push(format!("Create collection: {}", collection.name));
    }

    for collection in &diff.collections_to_delete {
        summary
            .destructive_changes
            .push(format!("Delete collection: {}", collection.name));
    }

    for modification in &diff.collections_to_modify {
        let name = &modification.collection;
        let counts = &mut summary.counts;
        counts.fields_to_add += modification.fields_to_add.len();
        counts.fields_to_remove += modification.fields_to_remove.len();
        counts.fields_to_modify += modification.fields_to_modify.len();
        counts.indexes_to_add += modification.indexes_to_add.len();
        counts.indexes_to_remove += modification.indexes_to_remove.len();
        counts.rules_to_update += modification.rules_to_update.len();
        counts.permissions_to_update += modification.permissions_to_update.len();

        for field in &modification.fields_to_add {
            summary
                .non_destructive_changes
                .push(format!("Add field: {name}.{} ({})", field.name, field.field_type));
        }

        for field in &modification.fields_to_remove {
            summary.destructive_changes.push(format!("Delete field: {name}.{}", field.name));
        }

        for field in &modification.fields_to_modify {
            if field.has_type_change() {
                summary.destructive_changes.push(format!(
                    "Change field type: {name}.{} ({} → {})",
                    field.field_name, field.current_definition.field_type, field.new_definition.field_type
                ));
            } else if field.becomes_required() {
                summary
                    .destructive_changes
                    .push(format!("Make field required: {name}.{}", field.field_name));
            } else if field.is_rename() {
                summary.non_destructive_changes.push(format!(
                    "Rename field: {name}.{} → {}",
                    field.field_name,
                    field.new_name()
                ));
            } else {
                let properties: Vec<&str> = field.changes.iter().map(|c| c.property.as_str()).collect();
                summary.non_destructive_changes.push(format!(
                    "Modify field: {name}.{} ({})",
                    field.field_name,
                    properties.join(", ")
                ));
            }
        }

        for index in &modification.indexes_to_add {
            summary.non_destructive_changes.push(format!("Add index on {name}: {index}"));
        }

        for index in &modification.indexes_to_remove {
            summary.non_destructive_changes.push(format!("Remove index on {name}: {index}"));
        }

        for update in &modification.rules_to_update {
            summary
                .non_destructive_changes
                .push(format!("Update rule: {name}.{}", update.rule_type));
        }

        for update in &modification.permissions_to_update {
            summary
                .non_destructive_changes
                .push(format!("Update permission: {name}.{}", update.rule_type));
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::{CollectionModification, FieldChange, FieldModification, RuleUpdate};
    use crate::schema::{CollectionSchema, FieldDefinition, FieldType, RuleType};
    use pretty_assertions::assert_eq;

    fn make_modification(name: &str, old_type: FieldType, new_type: FieldType, changes: Vec<FieldChange>) -> FieldModification {
        FieldModification {
            field_name: name.to_string(),
            current_definition: FieldDefinition::new(name, old_type),
            new_definition: FieldDefinition::new(name, new_type),
            changes,
        }
    }

    #[test]
    fn test_empty_diff() {
        let summary = summarize_changes(&SchemaDiff::default());
        assert!(!summary.has_changes());
        assert!(!summary.has_destructive_changes());
        assert_eq!(summary.counts, ChangeCounts::default());
    }

    #[test]
    fn test_descriptions() {
        let mut posts = CollectionModification::new("posts");
        posts.fields_to_add.push(FieldDefinition::new("summary", FieldType::Text));
        posts.fields_to_remove.push(FieldDefinition::new("legacy", FieldType::Text));
        posts.fields_to_modify.push(make_modification(
            "views",
            FieldType::Text,
            FieldType::Number,
            vec![FieldChange::new("type", "text", "number")],
        ));
        posts.fields_to_modify.push(make_modification(
            "title",
            FieldType::Text,
            FieldType::Text,
            vec![FieldChange::new("required", false, true)],
        ));
        posts.fields_to_modify.push(make_modification(
            "body",
            FieldType::Editor,
            FieldType::Editor,
            vec![FieldChange::new("options.maxSize", 100, 200)],
        ));
        let mut rename = make_modification("author", FieldType::Text, FieldType::Text, vec![]);
        rename.new_definition.name = "writer".to_string();
        rename.changes.push(FieldChange::new("name", "author", "writer"));
        posts.fields_to_modify.push(rename);
        posts.indexes_to_add.push("CREATE INDEX idx ON posts (title)".to_string());
        posts.rules_to_update.push(RuleUpdate {
            rule_type: RuleType::ListRule,
            old_value: None,
            new_value: Some(String::new()),
        });

        let diff = SchemaDiff {
            collections_to_create: vec![CollectionSchema::new("tags")],
            collections_to_delete: vec![CollectionSchema::new("old")],
            collections_to_modify: vec![posts],
            ..SchemaDiff::default()
        };

        let summary = summarize_changes(&diff);
        assert!(summary.has_changes());
        assert!(summary.has_destructive_changes());
        assert_eq!(
            summary.destructive_changes,
            vec![
                "Delete collection: old",
                "Delete field: posts.legacy",
                "Change field type: posts.views (text → number)",
                "Make field required: posts.title",
            ]
        );
        assert_eq!(
            summary.non_destructive_changes,
            vec![
                "Create collection: tags",
                "Add field: posts.summary (text)",
                "Modify field: posts.body (options.maxSize)",
                "Rename field: posts.author → writer",
                "Add index on posts: CREATE INDEX idx ON posts (title)",
                "Update rule: posts.listRule",
            ]
        );
        assert_eq!(summary.counts.fields_to_modify, 4);
        assert_eq!(summary.counts.collections_to_modify, 1);
        assert_eq!(summary.counts.rules_to_update, 1);
    }
}
