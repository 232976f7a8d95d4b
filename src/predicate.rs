//! Predicate trees.
//!
//! A filter is a boolean tree of `field OP literal` leaves joined by AND/OR.
//! The tree is plain data: the router inspects it (operator, field, literal)
//! without running any code, and the compiled evaluator tests it against
//! records when a scan or residual filter is needed.

use crate::record::{FieldDescriptor, Record};
use crate::specification::IndexSpecification;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Comparison operator of a leaf.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// True for the four ordering operators.
    pub const fn is_range(self) -> bool {
        !matches!(self, CompareOp::Eq)
    }

    /// Apply the operator. Range operators need a semantic order between the
    /// two values; without one the comparison is false.
    pub fn test(self, actual: &Value, literal: &Value) -> bool {
        match self {
            CompareOp::Eq => actual == literal,
            CompareOp::Lt => actual.compare(literal).is_some_and(Ordering::is_lt),
            CompareOp::Le => actual.compare(literal).is_some_and(Ordering::is_le),
            CompareOp::Gt => actual.compare(literal).is_some_and(Ordering::is_gt),
            CompareOp::Ge => actual.compare(literal).is_some_and(Ordering::is_ge),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Leaf `field OP value`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Comparison {
    pub fn new(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Boolean filter tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare(Comparison),
    /// Empty conjunction is true.
    And(Vec<Predicate>),
    /// Empty disjunction is false.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare(Comparison::new(field, op, value))
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub const fn and(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    pub const fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    /// Leaf comparisons that must all hold: the top-level conjunction with
    /// nested conjunctions flattened. Disjunctions contribute nothing.
    pub fn conjuncts(&self) -> SmallVec<[&Comparison; 8]> {
        let mut out = SmallVec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'p>(&'p self, out: &mut SmallVec<[&'p Comparison; 8]>) {
        match self {
            Predicate::Compare(cmp) => out.push(cmp),
            Predicate::And(children) => {
                for child in children {
                    child.collect_conjuncts(out);
                }
            }
            Predicate::Or(_) => {}
        }
    }

    /// Evaluate directly against a record through [`Record::field`].
    /// A missing field reads as `Value::Null`.
    pub fn matches<T: Record + ?Sized>(&self, record: &T) -> bool {
        match self {
            Predicate::Compare(cmp) => {
                let actual = record.field(&cmp.field).unwrap_or(Value::Null);
                cmp.op.test(&actual, &cmp.value)
            }
            Predicate::And(children) => children.iter().all(|c| c.matches(record)),
            Predicate::Or(children) => children.iter().any(|c| c.matches(record)),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, joiner, empty) = match self {
            Predicate::Compare(cmp) => return write!(f, "{cmp}"),
            Predicate::And(children) => (children, " && ", "true"),
            Predicate::Or(children) => (children, " || ", "false"),
        };
        if children.is_empty() {
            return f.write_str(empty);
        }
        f.write_str("(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(joiner)?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

impl From<Comparison> for Predicate {
    fn from(cmp: Comparison) -> Self {
        Predicate::Compare(cmp)
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Predicate::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Predicate::Or(vec![self, rhs])
    }
}

// ============ COMPILED EVALUATION ============

enum FieldRef<'p, T> {
    Indexed(&'p FieldDescriptor<T>),
    Named(&'p str),
}

enum Node<'p, T> {
    Compare {
        field: FieldRef<'p, T>,
        op: CompareOp,
        value: &'p Value,
    },
    All(Vec<Node<'p, T>>),
    Any(Vec<Node<'p, T>>),
}

/// A predicate with every field reference resolved once, up front.
///
/// Indexed fields read through their descriptor's accessor, so scans and
/// residual filters see exactly the value the index keys on. Other fields read
/// through [`Record::field`].
pub struct CompiledPredicate<'p, T> {
    root: Node<'p, T>,
}

impl<'p, T: Record> CompiledPredicate<'p, T> {
    pub fn compile(predicate: &'p Predicate, spec: &'p IndexSpecification<T>) -> Self {
        Self {
            root: Self::lower(predicate, spec),
        }
    }

    fn lower(predicate: &'p Predicate, spec: &'p IndexSpecification<T>) -> Node<'p, T> {
        match predicate {
            Predicate::Compare(cmp) => Node::Compare {
                field: spec
                    .field(&cmp.field)
                    .map_or(FieldRef::Named(cmp.field.as_str()), FieldRef::Indexed),
                op: cmp.op,
                value: &cmp.value,
            },
            Predicate::And(children) => {
                Node::All(children.iter().map(|c| Self::lower(c, spec)).collect())
            }
            Predicate::Or(children) => {
                Node::Any(children.iter().map(|c| Self::lower(c, spec)).collect())
            }
        }
    }

    pub fn matches(&self, record: &T) -> bool {
        Self::eval(&self.root, record)
    }

    fn eval(node: &Node<'p, T>, record: &T) -> bool {
        match node {
            Node::Compare { field, op, value } => {
                let actual = match field {
                    FieldRef::Indexed(descriptor) => descriptor.value_of(record),
                    FieldRef::Named(name) => record.field(name).unwrap_or(Value::Null),
                };
                op.test(&actual, value)
            }
            Node::All(children) => children.iter().all(|c| Self::eval(c, record)),
            Node::Any(children) => children.iter().any(|c| Self::eval(c, record)),
        }
    }
}
