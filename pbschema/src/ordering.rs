//! Creation order of collections based on relation dependencies.

use crate::differ::strip_collection_expression;
use crate::schema::CollectionSchema;
use std::collections::{BTreeSet, HashMap};

/// Result of ordering collections by their relation dependencies.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOrder {
    /// Every collection appears after the collections it references.
    Ordered(Vec<CollectionSchema>),
    /// A cycle prevents a full ordering; collections are returned in input order.
    Unresolved {
        collections: Vec<CollectionSchema>,
        cycle: Vec<String>,
    },
}

impl CollectionOrder {
    pub fn collections(&self) -> &[CollectionSchema] {
        match self {
            CollectionOrder::Ordered(collections) => collections,
            CollectionOrder::Unresolved { collections, .. } => collections,
        }
    }

    pub fn into_collections(self) -> Vec<CollectionSchema> {
        match self {
            CollectionOrder::Ordered(collections) => collections,
            CollectionOrder::Unresolved { collections, .. } => collections,
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, CollectionOrder::Ordered(_))
    }
}

/// Order collections so that relation targets come before the collections
/// referencing them.
///
/// Targets are resolved by name (case-insensitive), by a wrapped
/// `app.findCollectionByNameOrId(...)` expression or by durable id. Self
/// references and targets outside `collections` add no edge. Among
/// collections that are ready at the same time, input order wins.
pub fn order_collections_by_dependency(collections: &[CollectionSchema]) -> CollectionOrder {
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for (index, collection) in collections.iter().enumerate() {
        lookup.entry(collection.name.to_lowercase()).or_insert(index);
        if let Some(id) = collection.id.as_deref().filter(|id| !id.is_empty()) {
            lookup.entry(id.to_string()).or_insert(index);
        }
    }

    let resolve = |target: &str| -> Option<usize> {
        let stripped = strip_collection_expression(target);
        lookup
            .get(stripped)
            .or_else(|| lookup.get(&stripped.to_lowercase()))
            .copied()
    };

    // dependents[target] lists the collections that must wait for target
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); collections.len()];
    let mut pending: Vec<usize> = vec![0; collections.len()];

    for (index, collection) in collections.iter().enumerate() {
        let targets: BTreeSet<usize> = collection
            .relation_targets()
            .filter_map(|target| resolve(target))
            .filter(|&target| target != index)
            .collect();
        for target in targets {
            dependents[target].push(index);
            pending[index] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..collections.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(collections.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < collections.len() {
        let cycle: Vec<String> = nodes_on_cycles(&dependents, &pending)
            .into_iter()
            .map(|i| collections[i].name.clone())
            .collect();
        log::warn!(
            "circular relation dependency between collections: {}; keeping input order",
            cycle.join(", ")
        );
        return CollectionOrder::Unresolved {
            collections: collections.to_vec(),
            cycle,
        };
    }

    log::debug!("ordered {} collections by relation dependency", order.len());
    CollectionOrder::Ordered(order.into_iter().map(|i| collections[i].clone()).collect())
}

/// Nodes left unordered by Kahn's algorithm that lie on a cycle.
///
/// Leftover nodes that merely depend on a cycle are excluded: a node belongs
/// to a cycle only when it can reach itself through other leftover nodes.
fn nodes_on_cycles(dependents: &[Vec<usize>], pending: &[usize]) -> Vec<usize> {
    let leftover = |i: usize| pending[i] > 0;
    (0..pending.len())
        .filter(|&start| leftover(start))
        .filter(|&start| {
            let mut seen = vec![false; pending.len()];
            let mut stack: Vec<usize> = dependents[start].iter().copied().filter(|&d| leftover(d)).collect();
            while let Some(node) = stack.pop() {
                if node == start {
                    return true;
                }
                if std::mem::replace(&mut seen[node], true) {
                    continue;
                }
                stack.extend(dependents[node].iter().copied().filter(|&d| leftover(d)));
            }
            false
        })
        .collect()
}
