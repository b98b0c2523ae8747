//! Loading schema files from disk, diffing, summarizing and ordering.

use pbschema::{
    CollectionOrder, DiffEngineConfig, SchemaSnapshot, aggregate_changes, load_schema_definition, load_snapshot,
    order_collections_by_dependency, save_snapshot, summarize_changes,
};
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn make_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "users.json",
        r#"{
            "name": "users",
            "type": "auth",
            "fields": [
                { "name": "email", "type": "email", "required": true },
                { "name": "name", "type": "text", "options": { "max": 100 } }
            ],
            "rules": { "listRule": null, "viewRule": "id = @request.auth.id" }
        }"#,
    );
    write(
        temp.path(),
        "posts.json",
        r#"{
            "name": "posts",
            "fields": [
                { "name": "title", "type": "text", "required": true },
                { "name": "author", "type": "relation", "relation": { "collection": "users", "cascadeDelete": true } },
                { "name": "cover", "type": "file", "options": { "maxSelect": 1, "mimeTypes": [] } }
            ],
            "indexes": ["CREATE INDEX idx_posts_title ON posts (title)"],
            "rules": { "listRule": "", "viewRule": "" }
        }"#,
    );
    temp
}

#[test]
fn first_run_then_recorded_snapshot_is_idempotent() {
    let project = make_project();
    let config = DiffEngineConfig::default();
    let snapshot_path = project.path().join("state/snapshot.json");

    let definition = load_schema_definition(project.path()).unwrap();
    assert_eq!(definition.len(), 2);
    assert!(load_snapshot(&snapshot_path).unwrap().is_none());

    let first = aggregate_changes(&definition, None, &config);
    assert_eq!(first.collections_to_create.len(), 2);

    let summary = summarize_changes(&first);
    assert_eq!(summary.counts.collections_to_create, 2);
    assert!(!summary.has_destructive_changes());

    // Record the created collections with their assigned ids
    let mut recorded = SchemaSnapshot::from_definition("1", &definition);
    for created in &first.collections_to_create {
        recorded.collections.get_mut(&created.name).unwrap().id = created.id.clone();
    }
    save_snapshot(&snapshot_path, &recorded).unwrap();

    let reloaded = load_snapshot(&snapshot_path).unwrap().unwrap();
    let second = aggregate_changes(&definition, Some(&reloaded), &config);
    assert!(second.is_empty(), "{second:#?}");
    assert_eq!(second.existing_collection_ids.len(), 2);
}

#[test]
fn editing_files_produces_a_summary() {
    let project = make_project();
    let config = DiffEngineConfig::default();
    let before = load_schema_definition(project.path()).unwrap();
    let snapshot = SchemaSnapshot::from_definition("1", &before);

    write(
        project.path(),
        "posts.json",
        r#"{
            "name": "posts",
            "fields": [
                { "name": "headline", "type": "text", "required": true },
                { "name": "author", "type": "relation", "relation": { "collection": "users", "cascadeDelete": true } },
                { "name": "cover", "type": "file", "options": { "maxSelect": 1, "mimeTypes": [] } },
                { "name": "views", "type": "number" }
            ],
            "rules": { "listRule": null, "viewRule": "" }
        }"#,
    );
    let after = load_schema_definition(project.path()).unwrap();

    let diff = aggregate_changes(&after, Some(&snapshot), &config);
    let summary = summarize_changes(&diff);

    assert_eq!(
        summary.non_destructive_changes,
        vec![
            "Add field: posts.views (number)",
            "Rename field: posts.title → headline",
            "Remove index on posts: CREATE INDEX idx_posts_title ON posts (title)",
            "Update rule: posts.listRule",
        ]
    );
    assert!(summary.destructive_changes.is_empty());
    assert_eq!(summary.counts.collections_to_modify, 1);
}

#[test]
fn loaded_collections_order_by_relation() {
    let project = make_project();
    let definition = load_schema_definition(project.path()).unwrap();
    let collections: Vec<_> = definition.iter().cloned().collect();

    match order_collections_by_dependency(&collections) {
        CollectionOrder::Ordered(ordered) => {
            let names: Vec<&str> = ordered.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["users", "posts"]);
        }
        other => panic!("unexpected cycle: {other:?}"),
    }
}
