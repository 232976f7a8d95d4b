//! Index builder: strategy selection and bulk load.
//!
//! A field whose kind is totally ordered gets a ComparisonIndex; equality-only
//! kinds get an EqualityIndex; kinds with neither are rejected before any
//! record is read.

use crate::config::SetOptions;
use crate::error::ConfigError;
use crate::index::{FieldIndex, Index, IndexKind};
use crate::record::{FieldDescriptor, Record, RecordId};
use crate::set::IndexSet;
use crate::specification::IndexSpecification;
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct IndexBuilder;

impl IndexBuilder {
    /// Pick the strategy for a field from its declared kind.
    pub fn classify<T>(field: &FieldDescriptor<T>) -> Result<IndexKind, ConfigError> {
        let caps = field.kind().capabilities();
        if caps.order {
            Ok(IndexKind::Comparison)
        } else if caps.equality {
            Ok(IndexKind::Equality)
        } else {
            Err(ConfigError::UnindexableField {
                field: field.name().to_string(),
                kind: field.kind(),
            })
        }
    }

    /// Build one index with a single pass over `source`.
    pub fn index_for<'a, T, I>(source: I, field: &FieldDescriptor<T>) -> Result<Index, ConfigError>
    where
        T: 'a,
        I: IntoIterator<Item = (RecordId, &'a T)>,
    {
        let kind = Self::classify(field)?;
        let mut index = Index::new(field.name(), kind);
        for (id, record) in source {
            index.insert(id, field.value_of(record));
        }
        tracing::debug!(field = field.name(), %kind, records = index.count(), "built index");
        Ok(index)
    }

    /// Build an IndexSet over `source` with default options.
    pub fn build_set<T, I>(
        source: I,
        spec: impl Into<Arc<IndexSpecification<T>>>,
    ) -> Result<IndexSet<T>, ConfigError>
    where
        T: Record,
        I: IntoIterator<Item = (RecordId, Arc<T>)>,
    {
        Self::build_set_with(source, spec, SetOptions::default())
    }

    /// Build an IndexSet: validate every field, load the records, then one
    /// index per field in specification order.
    pub fn build_set_with<T, I>(
        source: I,
        spec: impl Into<Arc<IndexSpecification<T>>>,
        options: SetOptions,
    ) -> Result<IndexSet<T>, ConfigError>
    where
        T: Record,
        I: IntoIterator<Item = (RecordId, Arc<T>)>,
    {
        let spec = spec.into();
        for field in spec.fields() {
            Self::classify(field)?;
        }

        let records: BTreeMap<RecordId, Arc<T>> = source.into_iter().collect();

        let mut indexes = AHashMap::with_capacity(spec.len());
        for field in spec.fields() {
            let index = Self::index_for(records.iter().map(|(&id, r)| (id, r.as_ref())), field)?;
            indexes.insert(field.name().to_string(), index);
        }

        tracing::info!(records = records.len(), fields = spec.len(), "index set built");
        Ok(IndexSet::from_parts(spec, indexes, records, options))
    }

    /// Build an IndexSet over owned records, numbering them from zero.
    pub fn indices_for<T, I>(
        records: I,
        spec: impl Into<Arc<IndexSpecification<T>>>,
    ) -> Result<IndexSet<T>, ConfigError>
    where
        T: Record,
        I: IntoIterator<Item = T>,
    {
        Self::build_set(
            (0..).zip(records.into_iter().map(Arc::new)),
            spec,
        )
    }
}
