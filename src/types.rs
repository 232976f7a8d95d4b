use crate::index::IndexKind;
use crate::predicate::{CompareOp, Predicate};
use crate::record::RecordId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a query is answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// The whole predicate is one indexed comparison; the lookup is the answer.
    Direct { field: String, op: CompareOp, index: IndexKind },
    /// One conjunct is looked up; every candidate is re-tested against the
    /// full predicate.
    Candidates { field: String, op: CompareOp, index: IndexKind },
    /// No index applies; every record is tested.
    Scan { reason: String },
}

impl Route {
    pub const fn uses_index(&self) -> bool {
        !matches!(self, Route::Scan { .. })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Direct { field, op, index } => write!(f, "direct {index} index on '{field}' ({op})"),
            Route::Candidates { field, op, index } => {
                write!(f, "candidates from {index} index on '{field}' ({op}) + residual filter")
            }
            Route::Scan { reason } => write!(f, "full scan: {reason}"),
        }
    }
}

/// Plan type returned by explain()
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub predicate: String,
    pub route: Route,
}

/// Execution report for one query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trace {
    pub route: Route,
    /// Records produced by the index lookup (or all records on a scan)
    pub candidates: usize,
    pub matched: usize,
    pub time_us: u64,
}

/// Query result plus its trace
#[derive(Clone, Debug)]
pub struct Outcome<T> {
    pub data: T,
    pub trace: Trace,
}

/// Diagnostic delivered when a query falls back to a full scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnableToUseIndex {
    pub predicate: Predicate,
    pub reason: String,
    pub message: String,
}

impl UnableToUseIndex {
    pub(crate) fn new(predicate: &Predicate, reason: &str) -> Self {
        Self {
            predicate: predicate.clone(),
            reason: reason.to_string(),
            message: format!("unable to use index for predicate: {predicate} ({reason})"),
        }
    }
}

/// A record whose indexed key no longer matches its current field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Drift {
    pub id: RecordId,
    pub field: String,
    /// Key the index holds, `None` when the record is missing from the index
    pub indexed: Option<Value>,
    /// Value the accessor reads now, `None` when the record is gone
    pub current: Option<Value>,
}
