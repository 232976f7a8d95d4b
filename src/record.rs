//! Records and field descriptors.
//!
//! Records are application types. The core only reads them through accessors:
//! a `FieldDescriptor` for indexed fields, and the `Record` trait for anything a
//! predicate names that is not indexed.

use crate::value::{FieldKind, Value};
use std::fmt;
use std::sync::Arc;

/// Slot identifier assigned by the source collection.
pub type RecordId = u32;

/// Name-based field access.
pub trait Record {
    /// Current value of `name`, `None` when the record has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

/// Name-based field mutation, used by copy-on-write sources.
pub trait RecordMut: Record {
    /// Set `name` to `value` and return the previous value, `None` when the
    /// record has no such field.
    fn set_field(&mut self, name: &str, value: Value) -> Option<Value>;
}

/// Pure function from a record to one field's value.
pub type Accessor<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// One indexed field: name, declared kind and accessor.
pub struct FieldDescriptor<T> {
    name: String,
    kind: FieldKind,
    accessor: Accessor<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn new<F>(name: impl Into<String>, kind: FieldKind, accessor: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            accessor: Arc::new(accessor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Evaluate the accessor.
    pub fn value_of(&self, record: &T) -> Value {
        (self.accessor)(record)
    }
}

impl<T: Record + 'static> FieldDescriptor<T> {
    /// Descriptor whose accessor reads `name` through [`Record::field`].
    /// A missing field reads as `Value::Null`.
    pub fn named(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let key = name.clone();
        Self::new(name, kind, move |record: &T| record.field(&key).unwrap_or(Value::Null))
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
