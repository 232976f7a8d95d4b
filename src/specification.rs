//! Index specification: the ordered list of fields to index.
//!
//! Built once per record type, then shared read-only (`Arc`) by every
//! IndexSet built from it. Field order decides which field the router tries
//! first when several conjuncts are routable.

use crate::error::ConfigError;
use crate::record::FieldDescriptor;
use ahash::AHashMap;
use std::fmt;

pub struct IndexSpecification<T> {
    fields: Vec<FieldDescriptor<T>>,
    positions: AHashMap<String, usize>,
}

impl<T> IndexSpecification<T> {
    /// Start an empty specification.
    pub fn build() -> Self {
        Self {
            fields: Vec::new(),
            positions: AHashMap::new(),
        }
    }

    /// Append a field. Duplicate names are rejected.
    pub fn with(mut self, field: FieldDescriptor<T>) -> Result<Self, ConfigError> {
        if self.positions.contains_key(field.name()) {
            return Err(ConfigError::DuplicateField {
                field: field.name().to_string(),
            });
        }
        self.positions.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
        Ok(self)
    }

    /// Alias of [`with`](Self::with) for fluent chains.
    pub fn and(self, field: FieldDescriptor<T>) -> Result<Self, ConfigError> {
        self.with(field)
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.position(name).and_then(|pos| self.fields.get(pos))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescriptor::name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> Default for IndexSpecification<T> {
    fn default() -> Self {
        Self::build()
    }
}

impl<T> fmt::Debug for IndexSpecification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}
