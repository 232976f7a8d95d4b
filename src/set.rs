use crate::config::SetOptions;
use crate::index::{FieldIndex, Index};
use crate::predicate::{CompareOp, Comparison, CompiledPredicate, Predicate};
use crate::record::{Record, RecordId};
use crate::specification::IndexSpecification;
use crate::types::{Drift, Outcome, Plan, Route, Trace, UnableToUseIndex};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Listener for fallback scans.
pub type FallbackListener = Box<dyn Fn(&UnableToUseIndex) + Send + Sync>;

/// An IndexSet behind the single-writer lock the change channel expects.
pub type SharedIndexSet<T> = Arc<RwLock<IndexSet<T>>>;

/// Records plus one index per specified field.
///
/// Queries are routed through an index when the predicate shape allows it and
/// fall back to a full scan otherwise. Mutation arrives through the change
/// handlers in `propagate`.
pub struct IndexSet<T> {
    pub(crate) spec: Arc<IndexSpecification<T>>,
    pub(crate) indexes: AHashMap<String, Index>,
    pub(crate) records: BTreeMap<RecordId, Arc<T>>,
    options: SetOptions,
    listeners: Vec<FallbackListener>,
}

/// Resolved access path; borrows the index it will read.
enum Access<'s, 'p> {
    Direct(&'p Comparison, &'s Index),
    Candidates(&'p Comparison, &'s Index),
    Scan(String),
}

impl Access<'_, '_> {
    fn route(&self) -> Route {
        match self {
            Access::Direct(cmp, index) => Route::Direct {
                field: cmp.field.clone(),
                op: cmp.op,
                index: index.kind(),
            },
            Access::Candidates(cmp, index) => Route::Candidates {
                field: cmp.field.clone(),
                op: cmp.op,
                index: index.kind(),
            },
            Access::Scan(reason) => Route::Scan { reason: reason.clone() },
        }
    }
}

impl<T> IndexSet<T> {
    pub(crate) fn from_parts(
        spec: Arc<IndexSpecification<T>>,
        indexes: AHashMap<String, Index>,
        records: BTreeMap<RecordId, Arc<T>>,
        options: SetOptions,
    ) -> Self {
        Self { spec, indexes, records, options, listeners: Vec::new() }
    }

    pub fn specification(&self) -> &Arc<IndexSpecification<T>> {
        &self.spec
    }

    pub const fn options(&self) -> &SetOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get(&self, id: RecordId) -> Option<&Arc<T>> {
        self.records.get(&id)
    }

    /// All records in id order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &Arc<T>)> {
        self.records.iter().map(|(&id, record)| (id, record))
    }

    /// Index for a field, if the field is specified.
    pub fn index(&self, field: &str) -> Option<&Index> {
        self.indexes.get(field)
    }

    /// Indexes in specification order.
    pub fn indexes(&self) -> impl Iterator<Item = (&str, &Index)> {
        self.spec
            .names()
            .filter_map(|name| self.indexes.get(name).map(|index| (name, index)))
    }

    /// Register a listener called once per query that falls back to a scan.
    pub fn on_unable_to_use_index<F>(&mut self, listener: F)
    where
        F: Fn(&UnableToUseIndex) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// How `predicate` would be answered, without running it.
    pub fn explain(&self, predicate: &Predicate) -> Plan {
        Plan {
            predicate: predicate.to_string(),
            route: self.access(predicate).route(),
        }
    }

    fn access<'s, 'p>(&'s self, predicate: &'p Predicate) -> Access<'s, 'p> {
        match predicate {
            Predicate::Compare(cmp) => match self.routable(cmp) {
                Ok(index) => Access::Direct(cmp, index),
                Err(reason) => Access::Scan(reason),
            },
            Predicate::And(_) => {
                let conjuncts = predicate.conjuncts();
                // Specification order first; on one field an equality beats a range.
                for name in self.spec.names() {
                    let mut best: Option<(&'p Comparison, &'s Index)> = None;
                    for &cmp in conjuncts.iter().filter(|c| c.field == name) {
                        let Ok(index) = self.routable(cmp) else { continue };
                        if cmp.op == CompareOp::Eq {
                            best = Some((cmp, index));
                            break;
                        }
                        best.get_or_insert((cmp, index));
                    }
                    if let Some((cmp, index)) = best {
                        return Access::Candidates(cmp, index);
                    }
                }
                Access::Scan(if conjuncts.is_empty() {
                    "conjunction has no top-level comparison".to_string()
                } else {
                    "no conjunct can be answered by an index".to_string()
                })
            }
            Predicate::Or(_) => {
                Access::Scan("disjunctions cannot be answered by a single index".to_string())
            }
        }
    }

    fn routable(&self, cmp: &Comparison) -> Result<&Index, String> {
        let Some(index) = self.indexes.get(&cmp.field) else {
            return Err(format!("field '{}' is not indexed", cmp.field));
        };
        if !index.supports(cmp.op) {
            return Err(format!(
                "{} index on '{}' cannot answer '{}'",
                index.kind(),
                cmp.field,
                cmp.op
            ));
        }
        if cmp.op.is_range() && !cmp.value.is_ordered() {
            return Err(format!("literal {} has no ordering", cmp.value));
        }
        Ok(index)
    }

    fn fallback(&self, predicate: &Predicate, reason: &str) {
        if self.options.log_fallback {
            tracing::debug!(%predicate, reason, records = self.records.len(), "falling back to full scan");
        }
        if self.options.notify_on_fallback && !self.listeners.is_empty() {
            let event = UnableToUseIndex::new(predicate, reason);
            for listener in &self.listeners {
                listener(&event);
            }
        }
    }
}

impl<T: Record> IndexSet<T> {
    /// Records matching `predicate`.
    ///
    /// Order: key order through a comparison index, ascending id through an
    /// equality index or a scan.
    pub fn query(&self, predicate: &Predicate) -> Vec<Arc<T>> {
        let (ids, _) = self.run(predicate);
        self.resolve(&ids)
    }

    /// Ids of the records matching `predicate`, same order as [`query`](Self::query).
    pub fn query_ids(&self, predicate: &Predicate) -> Vec<RecordId> {
        self.run(predicate).0
    }

    /// [`query`](Self::query) plus a trace of how it ran.
    pub fn query_traced(&self, predicate: &Predicate) -> Outcome<Vec<Arc<T>>> {
        let start = Instant::now();
        let (ids, (route, candidates)) = self.run(predicate);
        let data = self.resolve(&ids);
        let trace = Trace {
            route,
            candidates,
            matched: data.len(),
            time_us: micros(start.elapsed()),
        };
        Outcome { data, trace }
    }

    fn run(&self, predicate: &Predicate) -> (Vec<RecordId>, (Route, usize)) {
        let access = self.access(predicate);
        let route = access.route();
        match access {
            Access::Direct(cmp, index) => {
                let ids = index.lookup(cmp.op, &cmp.value).unwrap_or_default();
                let candidates = ids.len();
                (ids, (route, candidates))
            }
            Access::Candidates(cmp, index) => {
                let ids = index.lookup(cmp.op, &cmp.value).unwrap_or_default();
                let candidates = ids.len();
                let compiled = CompiledPredicate::compile(predicate, &self.spec);
                let matched = ids
                    .into_iter()
                    .filter(|id| self.records.get(id).is_some_and(|r| compiled.matches(r)))
                    .collect();
                (matched, (route, candidates))
            }
            Access::Scan(reason) => {
                self.fallback(predicate, &reason);
                let compiled = CompiledPredicate::compile(predicate, &self.spec);
                let matched = self
                    .records
                    .iter()
                    .filter(|(_, r)| compiled.matches(r))
                    .map(|(&id, _)| id)
                    .collect();
                (matched, (route, self.records.len()))
            }
        }
    }

    fn resolve(&self, ids: &[RecordId]) -> Vec<Arc<T>> {
        ids.iter().filter_map(|id| self.records.get(id).cloned()).collect()
    }

    /// Compare every index against the records' current field values.
    ///
    /// Reports records mutated without a field-change notification. Cost is a
    /// full pass per field; meant for tests and debugging.
    pub fn check_consistency(&self) -> Vec<Drift> {
        let mut drift = Vec::new();
        for field in self.spec.fields() {
            let Some(index) = self.indexes.get(field.name()) else { continue };
            for (&id, record) in &self.records {
                let current = field.value_of(record);
                let indexed = index.key_of(id);
                if indexed != Some(&current) {
                    drift.push(Drift {
                        id,
                        field: field.name().to_string(),
                        indexed: indexed.cloned(),
                        current: Some(current),
                    });
                }
            }
            for id in index.enumerate() {
                if !self.records.contains_key(&id) {
                    drift.push(Drift {
                        id,
                        field: field.name().to_string(),
                        indexed: index.key_of(id).cloned(),
                        current: None,
                    });
                }
            }
        }
        drift
    }
}

impl<T> fmt::Debug for IndexSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSet")
            .field("fields", &self.spec.names().collect::<Vec<_>>())
            .field("records", &self.records.len())
            .field("options", &self.options)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// Saturates instead of wrapping on absurd durations.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}
