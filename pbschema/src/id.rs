use std::collections::HashSet;

use nanoid::nanoid;

/// Alphabet for generated collection ids.
const COLLECTION_ID_ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const COLLECTION_ID_PREFIX: &str = "pbc_";
const COLLECTION_ID_LENGTH: usize = 15;

/// Source of durable collection ids.
///
/// Implementations must never hand out an id that is already registered.
pub trait IdRegistry {
    /// Mark an existing id as taken.
    fn register(&mut self, id: &str);

    fn contains(&self, id: &str) -> bool;

    /// Produce a fresh id and register it.
    fn generate(&mut self) -> String;
}

/// Id registry scoped to a single aggregation call.
#[derive(Debug, Default)]
pub struct CollectionIdRegistry {
    taken: HashSet<String>,
}

impl CollectionIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

impl IdRegistry for CollectionIdRegistry {
    fn register(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }

    fn contains(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    fn generate(&mut self) -> String {
        loop {
            let id = generate_collection_id();
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Generates a new collection id in PocketBase's `pbc_` form.
pub fn generate_collection_id() -> String {
    format!("{COLLECTION_ID_PREFIX}{}", nanoid!(COLLECTION_ID_LENGTH, COLLECTION_ID_ALPHABET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_expected_prefix_length_and_charset() {
        let id = generate_collection_id();
        let suffix = id.strip_prefix(COLLECTION_ID_PREFIX).unwrap();
        assert_eq!(suffix.len(), COLLECTION_ID_LENGTH);
        assert!(suffix.chars().all(|c| COLLECTION_ID_ALPHABET.contains(&c)));
    }

    #[test]
    fn registry_never_repeats_ids() {
        let mut registry = CollectionIdRegistry::new();
        registry.register("pbc_existing");
        let ids: HashSet<String> = (0..200).map(|_| registry.generate()).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(registry.len(), 201);
        assert!(registry.contains("pbc_existing"));
        assert!(!ids.contains("pbc_existing"));
    }
}
