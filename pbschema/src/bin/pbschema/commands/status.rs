use anyhow::Result;
use comfy_table::{Attribute, Cell, Table};
use pbschema::{ChangeSummary, aggregate_changes, summarize_changes};
use serde::Serialize;

use super::{initialized_context, load_project_state};
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};
use crate::theme::ICONS;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Schema Status",
    commands: &[
        "pbschema status                        # Summarize pending changes",
        "pbschema status --output compact       # One-line counts for scripts",
    ],
}];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Version of the recorded snapshot, if any
    pub snapshot_version: Option<String>,
    pub collections: usize,
    #[serde(flatten)]
    pub summary: ChangeSummary,
}

pub fn handle_status(output: &OutputManager) -> Result<()> {
    let ctx = initialized_context(output)?;
    let (definition, snapshot) = load_project_state(&ctx, output)?;

    let diff = aggregate_changes(&definition, snapshot.as_ref(), &ctx.config.diff);
    let report = StatusReport {
        snapshot_version: snapshot.map(|s| s.version),
        collections: definition.len(),
        summary: summarize_changes(&diff),
    };

    output.heading("Schema Status");
    output.key_value("Schema", &ctx.display_path(&ctx.schema_dir));
    output.key_value(
        "Snapshot",
        report
            .snapshot_version
            .as_deref()
            .map(|v| format!("v{v}"))
            .as_deref()
            .unwrap_or("none recorded"),
    );

    output.display(&report)?;

    if !report.summary.has_changes() {
        output.success("Schema matches the recorded snapshot");
        return Ok(());
    }

    if !report.summary.destructive_changes.is_empty() {
        output.subheading("Destructive");
        for change in &report.summary.destructive_changes {
            output.indented(ICONS.warning, crate::theme::THEME.error, change);
        }
    }

    if !report.summary.non_destructive_changes.is_empty() {
        output.subheading("Non-destructive");
        for change in &report.summary.non_destructive_changes {
            output.bullet(change);
        }
    }

    output.info("Run 'pbschema diff' for property-level details");
    Ok(())
}

impl TableDisplay for StatusReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Category", "Count"]);

        let counts = &self.summary.counts;
        let rows = [
            ("Collections defined", self.collections),
            ("Collections to create", counts.collections_to_create),
            ("Collections to delete", counts.collections_to_delete),
            ("Collections to modify", counts.collections_to_modify),
            ("Fields to add", counts.fields_to_add),
            ("Fields to remove", counts.fields_to_remove),
            ("Fields to modify", counts.fields_to_modify),
            ("Indexes to add", counts.indexes_to_add),
            ("Indexes to remove", counts.indexes_to_remove),
            ("Rules to update", counts.rules_to_update),
            ("Permissions to update", counts.permissions_to_update),
        ];
        for (label, count) in rows {
            let mut value = Cell::new(count);
            if count > 0 {
                value = value.add_attribute(Attribute::Bold);
            }
            table.add_row(vec![Cell::new(label), value]);
        }

        table
    }

    fn to_compact(&self) -> String {
        let counts = &self.summary.counts;
        format!(
            "changes={} destructive={} create={} delete={} modify={}",
            counts.total(),
            self.summary.destructive_changes.len(),
            counts.collections_to_create,
            counts.collections_to_delete,
            counts.collections_to_modify
        )
    }
}
