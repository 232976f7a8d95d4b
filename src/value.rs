//! Field values and declared field kinds.
//!
//! Every index key and every predicate literal is a [`Value`]. A field declares
//! its [`FieldKind`] up front; the kind's capabilities decide which index
//! strategy can serve the field.
//!
//! Two orderings exist:
//! - `compare`: the semantic order used by predicates. Only defined between two
//!   values of the same ordered family.
//! - `storage_cmp`: a total order (family rank first) used to key ordered maps.
//!   Range scans never cross a family boundary, so it stays internal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single field value.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Symbolic value with equality but no ordering (enum labels, colors).
    Tag(String),
    /// Free-form JSON payload. Neither hashed nor ordered by indices.
    Json(serde_json::Value),
}

// -0.0 folds to 0.0 and every NaN folds to one NaN so equal floats share a bucket.
fn canonical(f: f64) -> f64 {
    if f == 0.0 {
        0.0
    } else if f.is_nan() {
        f64::NAN
    } else {
        f
    }
}

impl Value {
    /// Build a tag value.
    pub fn tag(label: impl Into<String>) -> Self {
        Value::Tag(label.into())
    }

    const fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Uint(_) => 3,
            Value::Float(_) => 4,
            Value::Text(_) => 5,
            Value::Bytes(_) => 6,
            Value::Tag(_) => 7,
            Value::Json(_) => 8,
        }
    }

    /// True when the value belongs to a family with a total order.
    pub const fn is_ordered(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Uint(_)
                | Value::Float(_)
                | Value::Text(_)
                | Value::Bytes(_)
        )
    }

    /// True when both values belong to the same variant.
    pub const fn same_family(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }

    /// Semantic comparison. `None` across families or for unordered families.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Uint(a), Value::Uint(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(canonical(*a).total_cmp(&canonical(*b))),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order over all values: family rank, then payload.
    pub(crate) fn storage_cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| {
            if let Some(ord) = self.compare(other) {
                return ord;
            }
            match (self, other) {
                (Value::Tag(a), Value::Tag(b)) => a.cmp(b),
                (Value::Json(a), Value::Json(b)) => a.to_string().cmp(&b.to_string()),
                _ => Ordering::Equal,
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Float(a), Value::Float(b)) => canonical(*a).to_bits() == canonical(*b).to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Text(a), Value::Text(b)) | (Value::Tag(a), Value::Tag(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            // Textual equality keeps Eq in line with Hash and storage_cmp.
            (Value::Json(a), Value::Json(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Uint(u) => u.hash(state),
            Value::Float(f) => canonical(*f).to_bits().hash(state),
            Value::Text(s) | Value::Tag(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Json(j) => j.to_string().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}u"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => {
                f.write_str("0x")?;
                b.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
            }
            Value::Tag(t) => write!(f, "#{t}"),
            Value::Json(j) => write!(f, "{j}"),
        }
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }
        )+
    };
}

value_from!(Int as i64: i8, i16, i32, i64);
value_from!(Uint as u64: u8, u16, u32, u64);
value_from!(Float as f64: f32, f64);
value_from!(Text as String: String, &str);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Declared value type of an indexed field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    Int,
    Uint,
    Float,
    Text,
    Bytes,
    Tag,
    Json,
}

/// What a field kind supports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Capabilities {
    pub equality: bool,
    pub order: bool,
}

impl FieldKind {
    pub const fn capabilities(self) -> Capabilities {
        match self {
            FieldKind::Tag => Capabilities { equality: true, order: false },
            FieldKind::Json => Capabilities { equality: false, order: false },
            _ => Capabilities { equality: true, order: true },
        }
    }

    pub const fn supports_equality(self) -> bool {
        self.capabilities().equality
    }

    pub const fn supports_order(self) -> bool {
        self.capabilities().order
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Uint => "uint",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
            FieldKind::Bytes => "bytes",
            FieldKind::Tag => "tag",
            FieldKind::Json => "json",
        };
        f.write_str(name)
    }
}
