//! Schema types for collections, fields and recorded snapshots.
//!
//! These are the values exchanged with the schema-authoring layer (current
//! definition) and snapshot storage (previous state). They serialize with the
//! camelCase keys PocketBase uses for its collection JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field type of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Email,
    Url,
    Editor,
    Number,
    Bool,
    Date,
    Autodate,
    Select,
    Relation,
    File,
    Json,
    GeoPoint,
    Password,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Editor => "editor",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Autodate => "autodate",
            FieldType::Select => "select",
            FieldType::Relation => "relation",
            FieldType::File => "file",
            FieldType::Json => "json",
            FieldType::GeoPoint => "geoPoint",
            FieldType::Password => "password",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation settings for a `relation` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationConfig {
    /// Target collection, either by name or by durable id.
    pub collection: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cascade_delete: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_select: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_select: Option<u32>,
}

impl RelationConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            cascade_delete: None,
            max_select: None,
            min_select: None,
        }
    }
}

/// A single field of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field name, unique within its collection
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    /// Type-specific options (min, max, maxSelect, mimeTypes, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,

    /// Present iff `field_type` is `relation`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationConfig>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            unique: None,
            options: Map::new(),
            relation: None,
        }
    }

    /// Create a relation field pointing at `target`.
    pub fn relation(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            relation: Some(RelationConfig::new(target)),
            ..Self::new(name, FieldType::Relation)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Whether the relation config is present exactly when the type is `relation`.
    pub fn has_consistent_relation(&self) -> bool {
        (self.field_type == FieldType::Relation) == self.relation.is_some()
    }
}

/// Collection kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    #[default]
    Base,
    Auth,
}

impl std::fmt::Display for CollectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionType::Base => f.write_str("base"),
            CollectionType::Auth => f.write_str("auth"),
        }
    }
}

/// The rule slots of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleType {
    ListRule,
    ViewRule,
    CreateRule,
    UpdateRule,
    DeleteRule,
    ManageRule,
}

impl RuleType {
    pub const ALL: [RuleType; 6] = [
        RuleType::ListRule,
        RuleType::ViewRule,
        RuleType::CreateRule,
        RuleType::UpdateRule,
        RuleType::DeleteRule,
        RuleType::ManageRule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::ListRule => "listRule",
            RuleType::ViewRule => "viewRule",
            RuleType::CreateRule => "createRule",
            RuleType::UpdateRule => "updateRule",
            RuleType::DeleteRule => "deleteRule",
            RuleType::ManageRule => "manageRule",
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access rules of a collection.
///
/// `None` means locked (superusers only), `Some("")` means public and any
/// other string is a filter expression. `manage_rule` only applies to auth
/// collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default)]
    pub list_rule: Option<String>,
    #[serde(default)]
    pub view_rule: Option<String>,
    #[serde(default)]
    pub create_rule: Option<String>,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage_rule: Option<String>,
}

impl RuleSet {
    pub fn get(&self, rule_type: RuleType) -> Option<&str> {
        match rule_type {
            RuleType::ListRule => self.list_rule.as_deref(),
            RuleType::ViewRule => self.view_rule.as_deref(),
            RuleType::CreateRule => self.create_rule.as_deref(),
            RuleType::UpdateRule => self.update_rule.as_deref(),
            RuleType::DeleteRule => self.delete_rule.as_deref(),
            RuleType::ManageRule => self.manage_rule.as_deref(),
        }
    }

    pub fn set(&mut self, rule_type: RuleType, value: Option<String>) {
        let slot = match rule_type {
            RuleType::ListRule => &mut self.list_rule,
            RuleType::ViewRule => &mut self.view_rule,
            RuleType::CreateRule => &mut self.create_rule,
            RuleType::UpdateRule => &mut self.update_rule,
            RuleType::DeleteRule => &mut self.delete_rule,
            RuleType::ManageRule => &mut self.manage_rule,
        };
        *slot = value;
    }

    pub fn with(mut self, rule_type: RuleType, value: Option<&str>) -> Self {
        self.set(rule_type, value.map(str::to_string));
        self
    }
}

/// One collection (table) of the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    pub name: String,

    #[serde(rename = "type", default)]
    pub collection_type: CollectionType,

    /// Durable id, assigned once the collection has been created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDefinition>,

    /// Raw index statements, compared as an unordered set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<RuleSet>,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection_type: CollectionType::Base,
            id: None,
            fields: Vec::new(),
            indexes: Vec::new(),
            rules: None,
            permissions: None,
        }
    }

    pub fn auth(name: impl Into<String>) -> Self {
        Self {
            collection_type: CollectionType::Auth,
            ..Self::new(name)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.indexes.push(index.into());
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_permissions(mut self, permissions: RuleSet) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Relation targets referenced by this collection's fields, as written.
    pub fn relation_targets(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter_map(|f| f.relation.as_ref())
            .map(|r| r.collection.as_str())
    }
}

/// The desired schema: collection name to collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDefinition {
    pub collections: BTreeMap<String, CollectionSchema>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a collection keyed by its own name, returning any replaced entry.
    pub fn insert(&mut self, collection: CollectionSchema) -> Option<CollectionSchema> {
        self.collections.insert(collection.name.clone(), collection)
    }

    pub fn get(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionSchema> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl FromIterator<CollectionSchema> for SchemaDefinition {
    fn from_iter<I: IntoIterator<Item = CollectionSchema>>(iter: I) -> Self {
        let mut definition = Self::new();
        for collection in iter {
            definition.insert(collection);
        }
        definition
    }
}

/// A previously recorded schema state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub collections: BTreeMap<String, CollectionSchema>,
}

impl SchemaSnapshot {
    pub fn new(version: impl Into<String>, collections: BTreeMap<String, CollectionSchema>) -> Self {
        Self {
            version: version.into(),
            timestamp: Utc::now(),
            collections,
        }
    }

    /// Record the given definition as a snapshot.
    pub fn from_definition(version: impl Into<String>, definition: &SchemaDefinition) -> Self {
        Self::new(version, definition.collections.clone())
    }

    pub fn get(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionSchema> {
        self.collections.values()
    }
}
