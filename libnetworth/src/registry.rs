use indexmap::IndexSet;

use crate::record::Record;

/// Ordered set of every account key the ledger knows about.
///
/// Keys only leave the registry through [`KeyRegistry::remove`], which the
/// ledger calls for an explicit key deletion. Merges never reorder
/// existing keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyRegistry {
    keys: IndexSet<String>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Keys used by `records`, in the order they are first seen.
    pub fn from_records(records: &[Record]) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.merge(record.assets().keys());
        }
        registry
    }

    /// Appends `key` unless present. Returns whether it was new.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Appends every unseen key of `candidates` in encounter order and
    /// returns how many were new.
    pub fn merge<I, K>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut added = 0;
        for key in candidates {
            let key = key.as_ref();
            if !self.keys.contains(key) {
                self.keys.insert(key.to_string());
                added += 1;
            }
        }
        added
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.keys.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.get_index_of(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a KeyRegistry {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
