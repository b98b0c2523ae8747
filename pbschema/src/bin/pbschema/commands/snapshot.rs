use anyhow::{Context, Result};
use clap::Args;
use pbschema::{
    CollectionIdRegistry, IdRegistry, SchemaDefinition, SchemaDiff, SchemaSnapshot, aggregate_changes, save_snapshot,
};
use std::collections::BTreeMap;

use super::{initialized_context, load_project_state};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Record State",
    commands: &[
        "pbschema snapshot                      # Record the current schema after applying it",
        "pbschema snapshot --force              # Re-record even when nothing changed",
    ],
}];

#[derive(Args)]
pub struct SnapshotArgs {
    /// Write a new snapshot even when the schema is unchanged
    #[arg(long)]
    pub force: bool,
}

pub fn handle_snapshot(args: SnapshotArgs, output: &OutputManager) -> Result<()> {
    let ctx = initialized_context(output)?;
    let (definition, previous) = load_project_state(&ctx, output)?;

    output.heading("Record Snapshot");

    let diff = aggregate_changes(&definition, previous.as_ref(), &ctx.config.diff);
    if diff.is_empty() && previous.is_some() && !args.force {
        output.success("Snapshot is already up to date");
        return Ok(());
    }

    let snapshot = record_snapshot(&definition, &diff, previous.as_ref());
    save_snapshot(&ctx.snapshot_path, &snapshot)
        .with_context(|| format!("Failed to write {}", ctx.display_path(&ctx.snapshot_path)))?;

    output.success(&format!(
        "Recorded snapshot v{} with {} collection(s)",
        snapshot.version,
        snapshot.collections.len()
    ));
    output.bullet(&format!("Saved: {}", ctx.display_path(&ctx.snapshot_path)));
    Ok(())
}

/// Snapshot of `definition` with a durable id on every collection.
///
/// Ids come from the definition itself, then the previous snapshot (matched
/// case-insensitively), then the ids assigned to new collections by `diff`.
/// Collections the diff never creates, such as system collections, get a
/// fresh id that collides with none of the others.
fn record_snapshot(
    definition: &SchemaDefinition,
    diff: &SchemaDiff,
    previous: Option<&SchemaSnapshot>,
) -> SchemaSnapshot {
    let mut known: BTreeMap<String, String> = diff
        .existing_collection_ids
        .iter()
        .map(|(name, id)| (name.to_lowercase(), id.clone()))
        .collect();
    for created in &diff.collections_to_create {
        if let Some(id) = &created.id {
            known.insert(created.name.to_lowercase(), id.clone());
        }
    }

    let mut registry = CollectionIdRegistry::new();
    for id in known.values() {
        registry.register(id);
    }
    for id in definition.iter().filter_map(|c| c.id.as_deref()).filter(|id| !id.is_empty()) {
        registry.register(id);
    }

    let collections = definition
        .iter()
        .map(|collection| {
            let mut recorded = collection.clone();
            if recorded.id.as_deref().is_none_or(str::is_empty) {
                let id = match known.get(&collection.name.to_lowercase()) {
                    Some(id) => id.clone(),
                    None => registry.generate(),
                };
                recorded.id = Some(id);
            }
            (recorded.name.clone(), recorded)
        })
        .collect();

    SchemaSnapshot::new(next_version(previous), collections)
}

fn next_version(previous: Option<&SchemaSnapshot>) -> String {
    let Some(previous) = previous else {
        return "1".to_string();
    };
    match previous.version.parse::<u64>().ok().and_then(|v| v.checked_add(1)) {
        Some(version) => version.to_string(),
        None => {
            log::debug!("previous snapshot version {:?} cannot be incremented, restarting at 1", previous.version);
            "1".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbschema::{CollectionSchema, DiffEngineConfig, FieldDefinition, FieldType};

    fn make_definition() -> SchemaDefinition {
        [
            CollectionSchema::new("posts").with_field(FieldDefinition::relation("author", "users")),
            CollectionSchema::auth("users").with_field(FieldDefinition::new("bio", FieldType::Text)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_first_snapshot_assigns_ids_and_is_idempotent() {
        let definition = make_definition();
        let config = DiffEngineConfig::default();
        let diff = aggregate_changes(&definition, None, &config);

        let snapshot = record_snapshot(&definition, &diff, None);
        assert_eq!(snapshot.version, "1");
        for collection in snapshot.iter() {
            let id = collection.id.as_deref().unwrap();
            assert!(id.starts_with("pbc_"), "{id}");
        }

        assert!(aggregate_changes(&definition, Some(&snapshot), &config).is_empty());
    }

    #[test]
    fn test_existing_ids_are_kept() {
        let definition = make_definition();
        let config = DiffEngineConfig::default();
        let first = record_snapshot(&definition, &aggregate_changes(&definition, None, &config), None);

        let mut next = make_definition();
        next.insert(CollectionSchema::new("tags"));
        let diff = aggregate_changes(&next, Some(&first), &config);
        let second = record_snapshot(&next, &diff, Some(&first));

        assert_eq!(second.version, "2");
        assert_eq!(second.get("posts").unwrap().id, first.get("posts").unwrap().id);
        assert_eq!(second.get("users").unwrap().id, first.get("users").unwrap().id);
        assert_eq!(second.get("tags").unwrap().id, diff.collections_to_create[0].id);
    }

    #[test]
    fn test_non_numeric_version_restarts() {
        let snapshot = SchemaSnapshot::new("initial", BTreeMap::new());
        assert_eq!(next_version(Some(&snapshot)), "1");
        assert_eq!(next_version(None), "1");
    }

    #[test]
    fn test_max_version_restarts_instead_of_overflowing() {
        let snapshot = SchemaSnapshot::new(u64::MAX.to_string(), BTreeMap::new());
        assert_eq!(next_version(Some(&snapshot)), "1");
        let snapshot = SchemaSnapshot::new("41", BTreeMap::new());
        assert_eq!(next_version(Some(&snapshot)), "42");
    }

    #[test]
    fn test_system_collections_get_durable_ids() {
        let definition: SchemaDefinition = [
            CollectionSchema::auth("_superusers"),
            CollectionSchema::new("posts").with_field(FieldDefinition::new("title", FieldType::Text)),
        ]
        .into_iter()
        .collect();
        let config = DiffEngineConfig::default();
        let diff = aggregate_changes(&definition, None, &config);
        assert_eq!(diff.collections_to_create.len(), 1);

        let snapshot = record_snapshot(&definition, &diff, None);
        let superusers = snapshot.get("_superusers").unwrap().id.clone().unwrap();
        let posts = snapshot.get("posts").unwrap().id.clone().unwrap();
        assert!(superusers.starts_with("pbc_"), "{superusers}");
        assert_ne!(superusers, posts);
        assert_eq!(Some(posts), diff.collections_to_create[0].id);
    }
}
