//! Field Index Module
//!
//! Secondary index over one record field.
//!
//! Design:
//! - EqualityIndex: hash buckets, equality lookups only
//! - ComparisonIndex: ordered buckets, equality and range lookups
//! - Buckets are RoaringBitmaps of record ids; records live in the IndexSet
//! - Reverse map (id -> key) for removals and consistency checks

mod hash_index;
mod range_index;

pub use hash_index::EqualityIndex;
pub use range_index::ComparisonIndex;

use crate::predicate::CompareOp;
use crate::record::RecordId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations shared by both index strategies.
pub trait FieldIndex {
    /// Place a record in the bucket for `value`, replacing any earlier placement.
    fn insert(&mut self, id: RecordId, value: Value);

    /// Remove a record from whatever bucket holds it. Returns the key it was under.
    fn remove(&mut self, id: RecordId) -> Option<Value>;

    /// Lookup exact match. Bucket order is ascending record id.
    fn lookup_eq(&self, value: &Value) -> Vec<RecordId>;

    /// Every indexed record.
    fn enumerate(&self) -> Vec<RecordId>;

    /// Key a record is currently indexed under.
    fn key_of(&self, id: RecordId) -> Option<&Value>;

    /// Get index name (the field name)
    fn name(&self) -> &str;

    /// Get indexed count
    fn count(&self) -> usize;

    /// Move a record from the `old` bucket to the `new` one. No-op when equal.
    fn update(&mut self, id: RecordId, old: &Value, new: Value) {
        if *old == new {
            return;
        }
        if let Some(previous) = self.remove(id) {
            if previous != *old {
                tracing::debug!(
                    index = self.name(),
                    id,
                    indexed = %previous,
                    reported = %old,
                    "field change reported an old value the index never saw"
                );
            }
        }
        self.insert(id, new);
    }
}

/// Which strategy an index uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Hash buckets, equality only
    Equality,
    /// Ordered buckets, equality and ranges
    Comparison,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Equality => f.write_str("equality"),
            IndexKind::Comparison => f.write_str("comparison"),
        }
    }
}

/// Range operators answered by a [`ComparisonIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl RangeOp {
    pub const fn from_compare(op: CompareOp) -> Option<Self> {
        match op {
            CompareOp::Eq => None,
            CompareOp::Lt => Some(RangeOp::Lt),
            CompareOp::Le => Some(RangeOp::Le),
            CompareOp::Gt => Some(RangeOp::Gt),
            CompareOp::Ge => Some(RangeOp::Ge),
        }
    }
}

/// An index over one field: one of the two strategies.
#[derive(Debug, Clone)]
pub enum Index {
    Equality(EqualityIndex),
    Comparison(ComparisonIndex),
}

impl Index {
    /// Create an empty index of the given kind.
    pub fn new(name: &str, kind: IndexKind) -> Self {
        match kind {
            IndexKind::Equality => Index::Equality(EqualityIndex::new(name)),
            IndexKind::Comparison => Index::Comparison(ComparisonIndex::new(name)),
        }
    }

    pub const fn kind(&self) -> IndexKind {
        match self {
            Index::Equality(_) => IndexKind::Equality,
            Index::Comparison(_) => IndexKind::Comparison,
        }
    }

    /// Whether this index can answer `op` directly.
    pub const fn supports(&self, op: CompareOp) -> bool {
        match self {
            Index::Equality(_) => matches!(op, CompareOp::Eq),
            Index::Comparison(_) => true,
        }
    }

    /// Answer `field OP value`. `None` when the strategy cannot serve `op`.
    pub fn lookup(&self, op: CompareOp, value: &Value) -> Option<Vec<RecordId>> {
        match RangeOp::from_compare(op) {
            None => Some(self.lookup_eq(value)),
            Some(range) => self.lookup_range(range, value),
        }
    }

    /// Range lookup, `None` for an equality index.
    pub fn lookup_range(&self, op: RangeOp, value: &Value) -> Option<Vec<RecordId>> {
        match self {
            Index::Equality(_) => None,
            Index::Comparison(idx) => Some(idx.lookup_range(op, value)),
        }
    }

    fn inner(&self) -> &dyn FieldIndex {
        match self {
            Index::Equality(idx) => idx,
            Index::Comparison(idx) => idx,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FieldIndex {
        match self {
            Index::Equality(idx) => idx,
            Index::Comparison(idx) => idx,
        }
    }
}

impl FieldIndex for Index {
    fn insert(&mut self, id: RecordId, value: Value) {
        self.inner_mut().insert(id, value);
    }

    fn remove(&mut self, id: RecordId) -> Option<Value> {
        self.inner_mut().remove(id)
    }

    fn lookup_eq(&self, value: &Value) -> Vec<RecordId> {
        self.inner().lookup_eq(value)
    }

    fn enumerate(&self) -> Vec<RecordId> {
        self.inner().enumerate()
    }

    fn key_of(&self, id: RecordId) -> Option<&Value> {
        self.inner().key_of(id)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn count(&self) -> usize {
        self.inner().count()
    }

    fn update(&mut self, id: RecordId, old: &Value, new: Value) {
        self.inner_mut().update(id, old, new);
    }
}
