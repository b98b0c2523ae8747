use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use pbschema::{
    DestructiveChange, FieldChange, FilterOptions, RuleUpdate, SchemaDiff, aggregate_changes,
    detect_destructive_changes, filter_diff, requires_force_flag,
};
use serde::Serialize;
use serde_json::Value;

use super::{initialized_context, load_project_state};
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};
use crate::theme::{ChangeMark, ICONS, THEME};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Pending Changes",
        commands: &[
            "pbschema diff                          # Show all pending changes",
            "pbschema diff --output json            # Machine-readable diff",
        ],
    },
    ExampleGroup {
        title: "Filtering",
        commands: &[
            "pbschema diff --filter users           # Only the users collection",
            "pbschema diff --filter 'posts\\.title'  # Only one field",
            "pbschema diff --skip-destructive       # Leave out deletions and risky changes",
        ],
    },
    ExampleGroup {
        title: "Destructive Changes",
        commands: &["pbschema diff --force                  # Accept deletions and type changes"],
    },
];

#[derive(Args)]
pub struct DiffArgs {
    /// Regex matched against collection names and "Collection.field" (repeatable)
    #[arg(short = 'f', long = "filter", value_name = "PATTERN")]
    pub filters: Vec<String>,

    /// Drop deletions and modifications that may lose data
    #[arg(long)]
    pub skip_destructive: bool,

    /// Accept destructive changes
    #[arg(long)]
    pub force: bool,
}

/// A diff together with the destructive changes at the configured threshold.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub diff: SchemaDiff,
    pub destructive_changes: Vec<DestructiveChange>,
}

pub fn handle_diff(args: DiffArgs, output: &OutputManager) -> Result<()> {
    let ctx = initialized_context(output)?;
    let (definition, snapshot) = load_project_state(&ctx, output)?;
    let config = &ctx.config.diff;

    let mut diff = aggregate_changes(&definition, snapshot.as_ref(), config);

    if !args.filters.is_empty() || args.skip_destructive {
        let options = FilterOptions {
            patterns: args.filters,
            skip_destructive: args.skip_destructive,
        };
        diff = filter_diff(&diff, &options);
    }

    let destructive_changes = detect_destructive_changes(&diff, config);
    let force_required = requires_force_flag(&diff, config);

    output.heading("Pending Changes");

    if diff.is_empty() && !output.is_json() {
        output.success("Schema matches the recorded snapshot");
        output.info("Nothing to migrate");
        return Ok(());
    }

    let report = DiffReport {
        diff,
        destructive_changes,
    };
    output.display(&report)?;

    if config.warn_on_delete {
        for warning in delete_warnings(&report.diff) {
            output.warning(&warning);
        }
    }

    if !report.destructive_changes.is_empty() && !output.is_json() {
        output.subheading(&format!(
            "Destructive changes (threshold: {})",
            config.severity_threshold
        ));
        for change in &report.destructive_changes {
            output.indented(
                ICONS.lock,
                THEME.severity(change.severity),
                &format!("[{}] {}", change.severity, change.description),
            );
        }
    }

    if force_required {
        if args.force {
            output.warning("Destructive changes accepted with --force");
        } else {
            output.info("Use --skip-destructive to leave them out, or --force to accept them.");
            anyhow::bail!(
                "{} destructive change(s) require --force",
                report.destructive_changes.len()
            );
        }
    }

    Ok(())
}

impl TableDisplay for DiffReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["", "Target", "Change"]);
        let color = !output.options.no_color;

        let mut row = |mark: ChangeMark, target: String, change: String| {
            let mut marker = Cell::new(mark.icon());
            if color {
                marker = marker.fg(mark.table_color());
            }
            table.add_row(vec![marker, Cell::new(target), Cell::new(change)]);
        };

        let diff = &self.diff;
        for collection in &diff.collections_to_create {
            let id = collection.id.as_deref().unwrap_or("-");
            row(
                ChangeMark::Added,
                collection.name.clone(),
                format!("create {} collection ({id}), {} field(s)", collection.collection_type, collection.fields.len()),
            );
        }

        for collection in &diff.collections_to_delete {
            row(ChangeMark::Removed, collection.name.clone(), "delete collection".to_string());
        }

        for modification in &diff.collections_to_modify {
            let name = &modification.collection;
            for field in &modification.fields_to_add {
                row(ChangeMark::Added, format!("{name}.{}", field.name), format!("add {} field", field.field_type));
            }
            for field in &modification.fields_to_remove {
                row(ChangeMark::Removed, format!("{name}.{}", field.name), "remove field".to_string());
            }
            for field in &modification.fields_to_modify {
                let changes: Vec<String> = field.changes.iter().map(format_field_change).collect();
                row(ChangeMark::Changed, format!("{name}.{}", field.field_name), changes.join("\n"));
            }
            for index in &modification.indexes_to_add {
                row(ChangeMark::Added, name.clone(), format!("add index: {index}"));
            }
            for index in &modification.indexes_to_remove {
                row(ChangeMark::Removed, name.clone(), format!("remove index: {index}"));
            }
            for update in &modification.rules_to_update {
                row(ChangeMark::Changed, name.clone(), format_rule_update("rule", update));
            }
            for update in &modification.permissions_to_update {
                row(ChangeMark::Changed, name.clone(), format_rule_update("permission", update));
            }
        }

        table
    }

    fn to_compact(&self) -> String {
        let diff = &self.diff;
        format!(
            "create={} delete={} modify={} destructive={}",
            diff.collections_to_create.len(),
            diff.collections_to_delete.len(),
            diff.collections_to_modify.len(),
            self.destructive_changes.len()
        )
    }
}

/// Warnings for every collection and field whose data a diff would delete.
fn delete_warnings(diff: &SchemaDiff) -> Vec<String> {
    let collections = diff
        .collections_to_delete
        .iter()
        .map(|collection| format!("Collection '{}' and all its records will be deleted", collection.name));
    let fields = diff.collections_to_modify.iter().flat_map(|modification| {
        modification.fields_to_remove.iter().map(move |field| {
            format!("Field '{}.{}' and its data will be deleted", modification.collection, field.name)
        })
    });
    collections.chain(fields).collect()
}

fn format_field_change(change: &FieldChange) -> String {
    format!(
        "{}: {} {} {}",
        change.property,
        format_value(&change.old_value),
        ICONS.arrow,
        format_value(&change.new_value)
    )
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_rule_update(kind: &str, update: &RuleUpdate) -> String {
    let show = |value: &Option<String>| match value {
        Some(rule) => format!("{rule:?}"),
        None => "null".to_string(),
    };
    format!(
        "{kind} {}: {} {} {}",
        update.rule_type,
        show(&update.old_value),
        ICONS.arrow,
        show(&update.new_value)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GlobalOptions;
    use pbschema::{CollectionModification, CollectionSchema, FieldDefinition, FieldType, RuleType};

    fn make_report() -> DiffReport {
        let mut posts = CollectionModification::new("posts");
        posts.fields_to_add.push(FieldDefinition::new("summary", FieldType::Text));
        posts.rules_to_update.push(RuleUpdate {
            rule_type: RuleType::ListRule,
            old_value: None,
            new_value: Some(String::new()),
        });
        DiffReport {
            diff: SchemaDiff {
                collections_to_create: vec![CollectionSchema::new("tags").with_id("pbc_tags00000000001")],
                collections_to_modify: vec![posts],
                ..SchemaDiff::default()
            },
            destructive_changes: Vec::new(),
        }
    }

    #[test]
    fn test_rule_update_shows_null_and_empty_distinctly() {
        let update = RuleUpdate {
            rule_type: RuleType::ViewRule,
            old_value: None,
            new_value: Some(String::new()),
        };
        assert_eq!(format_rule_update("rule", &update), "rule viewRule: null → \"\"");
    }

    #[test]
    fn test_field_change_formatting() {
        let change = FieldChange::new("type", "text", "number");
        assert_eq!(format_field_change(&change), "type: text → number");
        let change = FieldChange::new("options.max", Value::Null, 20);
        assert_eq!(format_field_change(&change), "options.max: null → 20");
    }

    #[test]
    fn test_table_lists_every_change() {
        let output = OutputManager::new(GlobalOptions {
            no_color: true,
            ..Default::default()
        });
        let report = make_report();
        let rendered = report.to_table(&output).to_string();
        assert!(rendered.contains("pbc_tags00000000001"));
        assert!(rendered.contains("posts.summary"));
        assert!(rendered.contains("rule listRule"));
        assert_eq!(report.to_compact(), "create=1 delete=0 modify=1 destructive=0");
    }

    #[test]
    fn test_delete_warnings_name_collections_and_fields() {
        let mut posts = CollectionModification::new("posts");
        posts.fields_to_remove.push(FieldDefinition::new("legacy", FieldType::Text));
        posts.fields_to_add.push(FieldDefinition::new("summary", FieldType::Text));
        let diff = SchemaDiff {
            collections_to_delete: vec![CollectionSchema::new("drafts")],
            collections_to_modify: vec![posts],
            ..SchemaDiff::default()
        };

        assert_eq!(
            delete_warnings(&diff),
            vec![
                "Collection 'drafts' and all its records will be deleted".to_string(),
                "Field 'posts.legacy' and its data will be deleted".to_string(),
            ]
        );
        assert!(delete_warnings(&make_report().diff).is_empty());
    }
}
