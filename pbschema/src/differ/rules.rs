//! Rule and permission comparison.
//!
//! `None` (locked) and `Some("")` (public) are different values and are
//! never treated as equal.

use super::changes::{PermissionChange, RuleUpdate};
use crate::schema::{CollectionSchema, RuleSet, RuleType};

/// Compare effective rules, falling back from `rules` to `permissions`.
pub fn compare_rules(current: &CollectionSchema, previous: &CollectionSchema) -> Vec<RuleUpdate> {
    RuleType::ALL
        .into_iter()
        .filter_map(|rule_type| {
            let old_value = effective_rule(previous, rule_type);
            let new_value = effective_rule(current, rule_type);
            rule_update(rule_type, old_value, new_value)
        })
        .collect()
}

/// Compare the `permissions` slots only.
pub fn compare_permissions(current: &CollectionSchema, previous: &CollectionSchema) -> Vec<PermissionChange> {
    RuleType::ALL
        .into_iter()
        .filter_map(|rule_type| {
            let old_value = slot(previous.permissions.as_ref(), rule_type);
            let new_value = slot(current.permissions.as_ref(), rule_type);
            rule_update(rule_type, old_value, new_value)
        })
        .collect()
}

fn effective_rule(collection: &CollectionSchema, rule_type: RuleType) -> Option<&str> {
    slot(collection.rules.as_ref(), rule_type).or_else(|| slot(collection.permissions.as_ref(), rule_type))
}

fn slot(rules: Option<&RuleSet>, rule_type: RuleType) -> Option<&str> {
    rules.and_then(|r| r.get(rule_type))
}

fn rule_update(rule_type: RuleType, old_value: Option<&str>, new_value: Option<&str>) -> Option<RuleUpdate> {
    (old_value != new_value).then(|| RuleUpdate {
        rule_type,
        old_value: old_value.map(str::to_string),
        new_value: new_value.map(str::to_string),
    })
}
