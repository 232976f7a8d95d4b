//! Observable source collection.
//!
//! Holds `Arc<T>` slots and tells its subscribers about every change before the
//! mutating call returns. Removed slots are tombstoned; ids are never reused.

use crate::builder::IndexBuilder;
use crate::error::{ConfigError, SourceError};
use crate::propagate::ChangeListener;
use crate::record::{Record, RecordId, RecordMut};
use crate::set::SharedIndexSet;
use crate::specification::IndexSpecification;
use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub struct ObservableCollection<T> {
    slots: Vec<Option<Arc<T>>>,
    live: usize,
    listeners: Vec<Arc<dyn ChangeListener<T>>>,
}

impl<T> ObservableCollection<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), live: 0, listeners: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: RecordId) -> Option<&Arc<T>> {
        self.slots.get(id as usize)?.as_ref()
    }

    /// Live records in id order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &Arc<T>)> {
        (0..).zip(self.slots.iter()).filter_map(|(id, slot)| slot.as_ref().map(|r| (id, r)))
    }

    /// Register a listener. It only sees changes made after this call.
    pub fn subscribe(&mut self, listener: Arc<dyn ChangeListener<T>>) {
        self.listeners.push(listener);
    }

    /// Append a record and return its id.
    pub fn push(&mut self, record: T) -> Result<RecordId, SourceError> {
        let id = RecordId::try_from(self.slots.len()).map_err(|_| SourceError::CapacityExceeded)?;
        let record = Arc::new(record);
        self.slots.push(Some(Arc::clone(&record)));
        self.live += 1;
        for listener in &self.listeners {
            listener.element_added(id, &record);
        }
        Ok(id)
    }

    /// Remove a record, returning it.
    pub fn remove(&mut self, id: RecordId) -> Result<Arc<T>, SourceError> {
        let record = self
            .slots
            .get_mut(id as usize)
            .and_then(Option::take)
            .ok_or(SourceError::UnknownRecord(id))?;
        self.live -= 1;
        for listener in &self.listeners {
            listener.element_removed(id);
        }
        Ok(record)
    }
}

impl<T: Record> ObservableCollection<T> {
    /// Announce a change already made through interior mutability.
    ///
    /// `old` is the value before the change; the new value is read back from
    /// the record.
    pub fn notify_field_changed(&self, id: RecordId, field: &str, old: Value) -> Result<(), SourceError> {
        let record = self.get(id).ok_or(SourceError::UnknownRecord(id))?;
        let new = record.field(field).ok_or_else(|| SourceError::UnknownField {
            id,
            field: field.to_string(),
        })?;
        for listener in &self.listeners {
            listener.field_changed(id, record, field, &old, &new);
        }
        Ok(())
    }

    /// Build an IndexSet over the current contents and keep it subscribed.
    pub fn index_with(
        &mut self,
        spec: impl Into<Arc<IndexSpecification<T>>>,
    ) -> Result<SharedIndexSet<T>, ConfigError>
    where
        T: Send + Sync + 'static,
    {
        let set = IndexBuilder::build_set(self.iter().map(|(id, r)| (id, Arc::clone(r))), spec)?;
        let shared = Arc::new(RwLock::new(set));
        self.subscribe(Arc::clone(&shared) as Arc<dyn ChangeListener<T>>);
        Ok(shared)
    }
}

impl<T: RecordMut + Clone> ObservableCollection<T> {
    /// Copy-on-write field update. Returns the previous value.
    ///
    /// Subscribers are only notified when the value actually changed.
    pub fn set_field(&mut self, id: RecordId, field: &str, value: Value) -> Result<Value, SourceError> {
        let slot = self
            .slots
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or(SourceError::UnknownRecord(id))?;
        let unknown = || SourceError::UnknownField { id, field: field.to_string() };

        let current = slot.field(field).ok_or_else(unknown)?;
        if current == value {
            return Ok(current);
        }
        let old = Arc::make_mut(slot).set_field(field, value.clone()).ok_or_else(unknown)?;
        let record = Arc::clone(slot);
        for listener in &self.listeners {
            listener.field_changed(id, &record, field, &old, &value);
        }
        Ok(old)
    }
}

impl<T> Default for ObservableCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ObservableCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let slots: Vec<_> = iter.into_iter().map(|r| Some(Arc::new(r))).collect();
        Self { live: slots.len(), slots, listeners: Vec::new() }
    }
}

impl<T> fmt::Debug for ObservableCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCollection")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
