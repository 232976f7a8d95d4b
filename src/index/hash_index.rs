//! Hash Index for O(1) Equality Lookups
//!
//! Buckets keyed by the field value itself (not a hash of it), so two
//! distinct values can never share a bucket.

use super::FieldIndex;
use crate::record::RecordId;
use crate::value::Value;
use ahash::AHashMap;
use roaring::RoaringBitmap;

/// Equality-only index
#[derive(Debug, Clone)]
pub struct EqualityIndex {
    name: String,
    /// value -> set of record ids
    index: AHashMap<Value, RoaringBitmap>,
    /// Reverse index for removals: record id -> value
    reverse: AHashMap<RecordId, Value>,
}

impl EqualityIndex {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            index: AHashMap::new(),
            reverse: AHashMap::new(),
        }
    }

    /// Number of distinct keys
    pub fn distinct(&self) -> usize {
        self.index.len()
    }
}

impl FieldIndex for EqualityIndex {
    fn insert(&mut self, id: RecordId, value: Value) {
        // Remove old entry if exists
        self.remove(id);

        self.index.entry(value.clone()).or_default().insert(id);
        self.reverse.insert(id, value);
    }

    fn remove(&mut self, id: RecordId) -> Option<Value> {
        let old = self.reverse.remove(&id)?;
        if let Some(ids) = self.index.get_mut(&old) {
            ids.remove(id);
            // Remove entry if empty
            if ids.is_empty() {
                self.index.remove(&old);
            }
        }
        Some(old)
    }

    fn lookup_eq(&self, value: &Value) -> Vec<RecordId> {
        self.index.get(value).map(|ids| ids.iter().collect()).unwrap_or_default()
    }

    fn enumerate(&self) -> Vec<RecordId> {
        self.index.values().flat_map(RoaringBitmap::iter).collect()
    }

    fn key_of(&self, id: RecordId) -> Option<&Value> {
        self.reverse.get(&id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self) -> usize {
        self.reverse.len()
    }
}
