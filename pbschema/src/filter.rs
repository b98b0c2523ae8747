//! Narrow a diff to selected collections or fields.

use crate::differ::{CollectionModification, SchemaDiff};
use regex::Regex;

/// Options for narrowing a [`SchemaDiff`].
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Patterns matched against `Collection` and `Collection.field`
    pub patterns: Vec<String>,
    /// Drop deletions, field removals and modifications that may lose data
    pub skip_destructive: bool,
}

impl FilterOptions {
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn skip_destructive(mut self) -> Self {
        self.skip_destructive = true;
        self
    }
}

/// A compiled filter pattern. Invalid regexes fall back to substring matching.
#[derive(Debug)]
enum Pattern {
    Regex(Regex),
    Literal(String),
}

impl Pattern {
    fn compile(source: &str) -> Self {
        match Regex::new(source) {
            Ok(regex) => Pattern::Regex(regex),
            Err(err) => {
                log::debug!("filter pattern '{source}' is not a valid regex, matching as substring: {err}");
                Pattern::Literal(source.to_string())
            }
        }
    }

    fn is_match(&self, target: &str) -> bool {
        match self {
            Pattern::Regex(regex) => regex.is_match(target),
            Pattern::Literal(literal) => target.contains(literal.as_str()),
        }
    }
}

struct Matcher {
    patterns: Vec<Pattern>,
}

impl Matcher {
    fn new(sources: &[String]) -> Self {
        Self {
            patterns: sources.iter().map(|s| Pattern::compile(s)).collect(),
        }
    }

    /// No patterns selects everything.
    fn matches(&self, target: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.is_match(target))
    }

    fn matches_field(&self, collection: &str, field: &str) -> bool {
        self.matches(&format!("{collection}.{field}"))
    }
}

/// Produce a new diff containing only the changes selected by `options`.
///
/// A modification whose collection name matches is kept whole. Otherwise only
/// the field changes whose `Collection.field` matches survive, and
/// collection-level changes (indexes, rules, permissions) are dropped.
pub fn filter_diff(diff: &SchemaDiff, options: &FilterOptions) -> SchemaDiff {
    let matcher = Matcher::new(&options.patterns);

    let collections_to_create = diff
        .collections_to_create
        .iter()
        .filter(|c| matcher.matches(&c.name))
        .cloned()
        .collect();

    let collections_to_delete = if options.skip_destructive {
        Vec::new()
    } else {
        diff.collections_to_delete
            .iter()
            .filter(|c| matcher.matches(&c.name))
            .cloned()
            .collect()
    };

    let collections_to_modify = diff
        .collections_to_modify
        .iter()
        .filter_map(|m| filter_modification(m, &matcher, options.skip_destructive))
        .collect();

    SchemaDiff {
        collections_to_create,
        collections_to_delete,
        collections_to_modify,
        existing_collection_ids: diff.existing_collection_ids.clone(),
    }
}

fn filter_modification(
    modification: &CollectionModification,
    matcher: &Matcher,
    skip_destructive: bool,
) -> Option<CollectionModification> {
    let collection = modification.collection.as_str();
    let mut filtered = modification.clone();

    if !matcher.matches(collection) {
        filtered.fields_to_add.retain(|f| matcher.matches_field(collection, &f.name));
        filtered.fields_to_remove.retain(|f| matcher.matches_field(collection, &f.name));
        filtered.fields_to_modify.retain(|m| {
            matcher.matches_field(collection, &m.field_name) || matcher.matches_field(collection, m.new_name())
        });
        filtered.clear_collection_level_changes();
    }

    if skip_destructive {
        filtered.fields_to_remove.clear();
        filtered.fields_to_modify.retain(|m| !m.is_destructive());
    }

    filtered.has_changes().then_some(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::{FieldChange, FieldModification};
    use crate::schema::{CollectionSchema, FieldDefinition, FieldType};

    fn make_diff() -> SchemaDiff {
        let mut user = CollectionModification::new("User");
        user.fields_to_add.push(FieldDefinition::new("name", FieldType::Text));
        user.fields_to_add.push(FieldDefinition::new("bio", FieldType::Text));
        user.fields_to_remove.push(FieldDefinition::new("legacy", FieldType::Text));
        user.indexes_to_add.push("CREATE INDEX idx_user_name ON User (name)".to_string());

        let mut posts = CollectionModification::new("Posts");
        posts.fields_to_modify.push(FieldModification {
            field_name: "views".to_string(),
            current_definition: FieldDefinition::new("views", FieldType::Text),
            new_definition: FieldDefinition::new("views", FieldType::Number),
            changes: vec![FieldChange::new("type", "text", "number")],
        });
        posts.fields_to_modify.push(FieldModification {
            field_name: "title".to_string(),
            current_definition: FieldDefinition::new("title", FieldType::Text),
            new_definition: FieldDefinition::new("title", FieldType::Text).with_option("max", 200),
            changes: vec![FieldChange::new("options.max", serde_json::Value::Null, 200)],
        });

        SchemaDiff {
            collections_to_create: vec![CollectionSchema::new("Tags"), CollectionSchema::new("Users")],
            collections_to_delete: vec![CollectionSchema::new("Legacy")],
            collections_to_modify: vec![user, posts],
            existing_collection_ids: [("User".to_string(), "pbc_user".to_string())].into_iter().collect(),
        }
    }

    #[test]
    fn test_no_patterns_keeps_everything() {
        let diff = make_diff();
        assert_eq!(filter_diff(&diff, &FilterOptions::default()), diff);
    }

    #[test]
    fn test_collection_pattern_keeps_whole_modification() {
        let diff = make_diff();
        let filtered = filter_diff(&diff, &FilterOptions::default().with_pattern("^User$"));

        assert!(filtered.collections_to_create.is_empty());
        assert!(filtered.collections_to_delete.is_empty());
        assert_eq!(filtered.collections_to_modify.len(), 1);
        let user = &filtered.collections_to_modify[0];
        assert_eq!(user, &diff.collections_to_modify[0]);
        assert_eq!(filtered.existing_collection_ids, diff.existing_collection_ids);
    }

    #[test]
    fn test_field_pattern_narrows_to_field() {
        let diff = make_diff();
        let filtered = filter_diff(&diff, &FilterOptions::default().with_pattern("User.name"));

        assert_eq!(filtered.collections_to_modify.len(), 1);
        let user = &filtered.collections_to_modify[0];
        let added: Vec<_> = user.fields_to_add.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(added, vec!["name"]);
        assert!(user.fields_to_remove.is_empty());
        assert!(user.indexes_to_add.is_empty());
    }

    #[test]
    fn test_unanchored_pattern_matches_substrings() {
        let diff = make_diff();
        let filtered = filter_diff(&diff, &FilterOptions::default().with_pattern("User"));
        let created: Vec<_> = filtered.collections_to_create.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(created, vec!["Users"]);
        assert_eq!(filtered.collections_to_modify.len(), 1);
        assert_eq!(filtered.collections_to_modify[0], diff.collections_to_modify[0]);
    }

    #[test]
    fn test_regex_patterns() {
        let diff = make_diff();
        let filtered = filter_diff(&diff, &FilterOptions::default().with_pattern("^T.*"));
        let created: Vec<_> = filtered.collections_to_create.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(created, vec!["Tags"]);
        assert!(filtered.collections_to_modify.is_empty());
    }

    #[test]
    fn test_invalid_regex_matches_as_substring() {
        let mut diff = make_diff();
        diff.collections_to_create.push(CollectionSchema::new("odd(name)"));
        let filtered = filter_diff(&diff, &FilterOptions::default().with_pattern("odd(name"));
        assert_eq!(filtered.collections_to_create.len(), 1);
        assert_eq!(filtered.collections_to_create[0].name, "odd(name)");
    }

    #[test]
    fn test_skip_destructive() {
        let diff = make_diff();
        let filtered = filter_diff(&diff, &FilterOptions::default().skip_destructive());

        assert!(filtered.collections_to_delete.is_empty());
        assert_eq!(filtered.collections_to_create.len(), 2);

        let user = filtered.modification("User").unwrap();
        assert!(user.fields_to_remove.is_empty());
        assert_eq!(user.fields_to_add.len(), 2);

        let posts = filtered.modification("Posts").unwrap();
        let kept: Vec<_> = posts.fields_to_modify.iter().map(|m| m.field_name.as_str()).collect();
        assert_eq!(kept, vec!["title"]);
    }

    #[test]
    fn test_emptied_modifications_are_dropped() {
        let diff = make_diff();
        let filtered = filter_diff(&diff, &FilterOptions::default().with_pattern("Posts.views").skip_destructive());
        assert!(filtered.collections_to_modify.is_empty());
        assert!(filtered.is_empty());
    }
}
