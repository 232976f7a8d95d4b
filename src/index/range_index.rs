//! Range Index for O(log n) Range Queries
//!
//! Ordered map from key to bucket. A range scan walks a contiguous key range
//! and stays inside the literal's value family, so `age < 34` never picks up
//! null or text keys that happen to sort before integers.

use super::{FieldIndex, RangeOp};
use crate::record::RecordId;
use crate::value::Value;
use ahash::AHashMap;
use roaring::RoaringBitmap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Key wrapper giving `Value` the total storage order.
#[derive(Clone, Debug)]
struct Key(Value);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.storage_cmp(&other.0)
    }
}

/// Ordered index answering equality and range lookups
#[derive(Debug, Clone)]
pub struct ComparisonIndex {
    name: String,
    /// Sorted buckets: key -> record ids
    data: BTreeMap<Key, RoaringBitmap>,
    /// Reverse index for removals
    reverse: AHashMap<RecordId, Value>,
}

impl ComparisonIndex {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: BTreeMap::new(),
            reverse: AHashMap::new(),
        }
    }

    /// Records whose key satisfies `key OP value`, in key order.
    /// Empty when `value` has no ordering.
    pub fn lookup_range(&self, op: RangeOp, value: &Value) -> Vec<RecordId> {
        if !value.is_ordered() {
            return Vec::new();
        }
        let pivot = Key(value.clone());
        let in_family = |(k, _): &(&Key, &RoaringBitmap)| k.0.same_family(value);

        match op {
            RangeOp::Lt => Self::flatten(self.data.range(..pivot).skip_while(|e| !in_family(e))),
            RangeOp::Le => Self::flatten(self.data.range(..=pivot).skip_while(|e| !in_family(e))),
            RangeOp::Gt => Self::flatten(
                self.data
                    .range((Bound::Excluded(pivot), Bound::Unbounded))
                    .take_while(in_family),
            ),
            RangeOp::Ge => Self::flatten(self.data.range(pivot..).take_while(in_family)),
        }
    }

    /// Number of distinct keys
    pub fn distinct(&self) -> usize {
        self.data.len()
    }

    fn flatten<'a>(entries: impl Iterator<Item = (&'a Key, &'a RoaringBitmap)>) -> Vec<RecordId> {
        entries.flat_map(|(_, ids)| ids.iter()).collect()
    }
}

impl FieldIndex for ComparisonIndex {
    fn insert(&mut self, id: RecordId, value: Value) {
        // Remove old entry if exists
        self.remove(id);

        self.data.entry(Key(value.clone())).or_default().insert(id);
        self.reverse.insert(id, value);
    }

    fn remove(&mut self, id: RecordId) -> Option<Value> {
        let old = self.reverse.remove(&id)?;
        let key = Key(old);
        if let Some(ids) = self.data.get_mut(&key) {
            ids.remove(id);
            if ids.is_empty() {
                self.data.remove(&key);
            }
        }
        Some(key.0)
    }

    fn lookup_eq(&self, value: &Value) -> Vec<RecordId> {
        self.data
            .get(&Key(value.clone()))
            .map(|ids| ids.iter().collect())
            .unwrap_or_default()
    }

    /// All records in key order.
    fn enumerate(&self) -> Vec<RecordId> {
        Self::flatten(self.data.iter())
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
