//! Change propagation from the source collection into an IndexSet.
//!
//! Notifications are applied synchronously; the caller's write lock is the
//! only serialization. A mutation made without a notification leaves the
//! indexes stale until a later remove/add of the same record.

use crate::index::FieldIndex;
use crate::record::{Record, RecordId};
use crate::set::IndexSet;
use crate::value::Value;
use parking_lot::RwLock;
use std::sync::Arc;

/// Receiver of source collection notifications.
pub trait ChangeListener<T>: Send + Sync {
    fn element_added(&self, id: RecordId, record: &Arc<T>);

    fn element_removed(&self, id: RecordId);

    /// `record` is the record as it is after the change.
    fn field_changed(&self, id: RecordId, record: &Arc<T>, field: &str, old: &Value, new: &Value);
}

impl<T: Record> IndexSet<T> {
    /// Index a new record. An id already present is replaced.
    pub fn element_added(&mut self, id: RecordId, record: Arc<T>) {
        if self.records.contains_key(&id) {
            tracing::debug!(id, "re-adding present record, replacing it");
            self.unindex(id);
        }
        for field in self.spec.fields() {
            if let Some(index) = self.indexes.get_mut(field.name()) {
                index.insert(id, field.value_of(&record));
            }
        }
        self.records.insert(id, record);
    }

    /// Drop a record from every index. Returns the record that was held.
    pub fn element_removed(&mut self, id: RecordId) -> Option<Arc<T>> {
        let Some(record) = self.records.remove(&id) else {
            tracing::warn!(id, "removal notified for a record the index set does not hold");
            return None;
        };
        self.unindex(id);
        Some(record)
    }

    /// Move a record between buckets of the changed field's index.
    ///
    /// The stored record is replaced with `record` whether or not the field is
    /// indexed, so residual filters see the new value. The bucket follows the
    /// notified `new` value even when the record's accessor still reads
    /// otherwise; that drift is logged and left to `check_consistency`.
    pub fn field_changed(&mut self, id: RecordId, record: Arc<T>, field: &str, old: &Value, new: Value) {
        let Some(slot) = self.records.get_mut(&id) else {
            tracing::warn!(id, field, "field change notified for a record the index set does not hold");
            return;
        };
        if let Some(descriptor) = self.spec.field(field) {
            let current = descriptor.value_of(&record);
            if current != new {
                tracing::warn!(
                    id,
                    field,
                    notified = %new,
                    current = %current,
                    "notified value differs from the record's current value"
                );
            }
        }
        *slot = record;
        if let Some(index) = self.indexes.get_mut(field) {
            index.update(id, old, new);
        }
    }

    // Reverse maps locate the bucket, so this works even for drifted records.
    fn unindex(&mut self, id: RecordId) {
        for index in self.indexes.values_mut() {
            index.remove(id);
        }
    }
}

impl<T> ChangeListener<T> for RwLock<IndexSet<T>>
where
    T: Record + Send + Sync,
{
    fn element_added(&self, id: RecordId, record: &Arc<T>) {
        self.write().element_added(id, Arc::clone(record));
    }

    fn element_removed(&self, id: RecordId) {
        self.write().element_removed(id);
    }

    fn field_changed(&self, id: RecordId, record: &Arc<T>, field: &str, old: &Value, new: &Value) {
        self.write().field_changed(id, Arc::clone(record), field, old, new.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IndexBuilder;
    use crate::predicate::Predicate;
    use crate::record::FieldDescriptor;
    use crate::specification::IndexSpecification;
    use crate::value::FieldKind;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Interior-mutable record: the same Arc is shared with the source.
    struct Counter {
        label: &'static str,
        hits: AtomicI64,
    }

    impl Counter {
        fn new(label: &'static str, hits: i64) -> Self {
            Self { label, hits: AtomicI64::new(hits) }
        }
    }

    impl Record for Counter {
        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "label" => Some(Value::from(self.label)),
                "hits" => Some(Value::from(self.hits.load(Ordering::SeqCst))),
                _ => None,
            }
        }
    }

    fn counters() -> (Vec<Arc<Counter>>, IndexSet<Counter>) {
        let records = vec![
            Arc::new(Counter::new("a", 6)),
            Arc::new(Counter::new("b", 1)),
            Arc::new(Counter::new("c", 6)),
        ];
        let spec = IndexSpecification::<Counter>::build()
            .with(FieldDescriptor::named("hits", FieldKind::Int))
            .unwrap();
        let set = IndexBuilder::build_set((0..).zip(records.iter().cloned()), spec).unwrap();
        (records, set)
    }

    fn hits_eq(set: &IndexSet<Counter>, n: i64) -> Vec<RecordId> {
        set.query_ids(&Predicate::eq("hits", n))
    }

    #[test]
    fn test_field_changed_moves_bucket() {
        let (records, mut set) = counters();
        records[0].hits.store(3, Ordering::SeqCst);
        set.field_changed(0, Arc::clone(&records[0]), "hits", &Value::Int(6), Value::Int(3));

        assert_eq!(hits_eq(&set, 6), vec![2]);
        assert_eq!(hits_eq(&set, 3), vec![0]);
        assert!(set.check_consistency().is_empty());
    }

    #[test]
    fn test_notified_value_wins_over_stale_record() {
        let (records, mut set) = counters();
        // Announced before the record itself changes.
        set.field_changed(0, Arc::clone(&records[0]), "hits", &Value::Int(6), Value::Int(3));

        assert_eq!(hits_eq(&set, 3), vec![0]);
        assert_eq!(hits_eq(&set, 6), vec![2]);
        let drift = set.check_consistency();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].indexed, Some(Value::Int(3)));
        assert_eq!(drift[0].current, Some(Value::Int(6)));

        records[0].hits.store(3, Ordering::SeqCst);
        assert!(set.check_consistency().is_empty());
    }

    #[test]
    fn test_unchanged_value_is_noop() {
        let (records, mut set) = counters();
        set.field_changed(1, Arc::clone(&records[1]), "hits", &Value::Int(1), Value::Int(1));
        assert_eq!(hits_eq(&set, 1), vec![1]);
    }

    #[test]
    fn test_unindexed_field_replaces_record_only() {
        let (records, mut set) = counters();
        set.field_changed(2, Arc::clone(&records[2]), "label", &Value::from("c"), Value::from("z"));
        assert_eq!(hits_eq(&set, 6), vec![0, 2]);
    }

    #[test]
    fn test_added_and_removed() {
        let (_, mut set) = counters();
        set.element_added(7, Arc::new(Counter::new("d", 1)));
        assert_eq!(hits_eq(&set, 1), vec![1, 7]);

        assert!(set.element_removed(1).is_some());
        assert_eq!(hits_eq(&set, 1), vec![7]);
        assert!(set.element_removed(1).is_none());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_readding_replaces_record() {
        let (_, mut set) = counters();
        set.element_added(0, Arc::new(Counter::new("a", 9)));
        assert_eq!(hits_eq(&set, 6), vec![2]);
        assert_eq!(hits_eq(&set, 9), vec![0]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_remove_add_repairs_silent_mutation() {
        let (records, mut set) = counters();
        records[0].hits.store(2, Ordering::SeqCst);

        let drift = set.check_consistency();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].indexed, Some(Value::Int(6)));
        assert_eq!(drift[0].current, Some(Value::Int(2)));

        let record = set.element_removed(0).unwrap();
        set.element_added(0, record);
        assert!(set.check_consistency().is_empty());
        assert_eq!(hits_eq(&set, 2), vec![0]);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let (records, mut set) = counters();
        set.field_changed(40, Arc::clone(&records[0]), "hits", &Value::Int(6), Value::Int(0));
        assert_eq!(set.len(), 3);
        assert!(set.check_consistency().is_empty());
    }

    #[test]
    fn test_locked_set_is_a_listener() {
        let (records, set) = counters();
        let shared = RwLock::new(set);
        let listener: &dyn ChangeListener<Counter> = &shared;

        records[1].hits.store(6, Ordering::SeqCst);
        listener.field_changed(1, &records[1], "hits", &Value::Int(1), &Value::Int(6));
        listener.element_removed(2);

        assert_eq!(hits_eq(&shared.read(), 6), vec![0, 1]);
    }
}
