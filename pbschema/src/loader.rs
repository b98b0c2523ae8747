//! Loading schema definitions and snapshots from disk.

use crate::errors::{Result, SchemaError};
use crate::schema::{CollectionSchema, SchemaDefinition, SchemaSnapshot};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A schema file holds either one collection or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Many(Vec<CollectionSchema>),
    One(Box<CollectionSchema>),
}

impl SchemaFile {
    fn into_collections(self) -> Vec<CollectionSchema> {
        match self {
            SchemaFile::Many(collections) => collections,
            SchemaFile::One(collection) => vec![*collection],
        }
    }
}

/// Load the current schema definition from every `*.json` file under `dir`.
///
/// Files are read recursively in path order; hidden files and directories
/// are skipped. A missing directory yields an empty definition.
pub fn load_schema_definition(dir: &Path) -> Result<SchemaDefinition> {
    let mut definition = SchemaDefinition::new();

    if !dir.exists() {
        log::debug!("schema directory {} does not exist", dir.display());
        return Ok(definition);
    }

    // Lowercased name -> file that declared it
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for path in discover_schema_files(dir)? {
        let content = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
            path: path.clone(),
            source,
        })?;
        let file: SchemaFile = serde_json::from_str(&content).map_err(|source| SchemaError::Json {
            path: path.clone(),
            source,
        })?;

        for collection in file.into_collections() {
            validate_collection(&collection)?;

            let key = collection.name.to_lowercase();
            if seen.contains_key(&key) {
                return Err(SchemaError::DuplicateCollection {
                    name: collection.name,
                    path,
                });
            }
            seen.insert(key, path.clone());

            log::debug!("loaded collection '{}' from {}", collection.name, path.display());
            definition.insert(collection);
        }
    }

    Ok(definition)
}

/// Load a recorded snapshot. A missing file means no prior state.
pub fn load_snapshot(path: &Path) -> Result<Option<SchemaSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = serde_json::from_str(&content).map_err(|source| SchemaError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(snapshot))
}

/// Write a snapshot as pretty-printed JSON, creating parent directories.
pub fn save_snapshot(path: &Path, snapshot: &SchemaSnapshot) -> Result<()> {
    let io_error = |source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let content = serde_json::to_string_pretty(snapshot).map_err(|source| SchemaError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(io_error)
}

fn discover_schema_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            SchemaError::Io {
                path,
                source: err.into(),
            }
        })?;
        let path = entry.path();

        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        // Only components below `dir` count, so a hidden schema root still works
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn validate_collection(collection: &CollectionSchema) -> Result<()> {
    match collection.fields.iter().find(|f| !f.has_consistent_relation()) {
        Some(field) => Err(SchemaError::RelationMismatch {
            collection: collection.name.clone(),
            field: field.name.clone(),
        }),
        None => Ok(()),
    }
}
