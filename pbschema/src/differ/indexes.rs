//! Index comparison. Index statements are compared byte-for-byte as sets.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexChanges {
    pub indexes_to_add: Vec<String>,
    pub indexes_to_remove: Vec<String>,
}

pub fn compare_indexes(current: &[String], previous: &[String]) -> IndexChanges {
    IndexChanges {
        indexes_to_add: set_difference(current, previous),
        indexes_to_remove: set_difference(previous, current),
    }
}

/// Entries of `left` missing from `right`, deduplicated, in `left` order.
fn set_difference(left: &[String], right: &[String]) -> Vec<String> {
    let right: HashSet<&str> = right.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut difference = Vec::new();
    for index in left {
        if !right.contains(index.as_str()) && seen.insert(index.as_str()) {
            difference.push(index.clone());
        }
    }
    difference
}
