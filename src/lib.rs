// Sekilas v0.1.0 - In-Memory Secondary Indices
// Equality and range indices over a live record collection, kept current by change notifications

pub mod value;
pub mod record;
pub mod error;
pub mod config;
pub mod types;
pub mod specification;
pub mod predicate;
pub mod index;
pub mod builder;
pub mod set;
pub mod propagate;
pub mod source;

// Re-export main types
pub use value::{Capabilities, FieldKind, Value};
pub use record::{Accessor, FieldDescriptor, Record, RecordId, RecordMut};
pub use error::{ConfigError, SourceError};
pub use config::SetOptions;
pub use types::{Drift, Outcome, Plan, Route, Trace, UnableToUseIndex};
pub use specification::IndexSpecification;
pub use predicate::{CompareOp, Comparison, CompiledPredicate, Predicate};
pub use index::{ComparisonIndex, EqualityIndex, FieldIndex, Index, IndexKind, RangeOp};
pub use builder::IndexBuilder;
pub use set::{FallbackListener, IndexSet, SharedIndexSet};
pub use propagate::ChangeListener;
pub use source::ObservableCollection;
