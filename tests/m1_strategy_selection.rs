//! Tests for M1: Index Strategy Selection and Lookups
//! Covers TC-1.1, TC-1.2, TC-1.3
//!
//! Run individual tests with:
//! cargo test tc_1_1 -- --nocapture
//! cargo test m1_strategy_selection -- --nocapture

use sekilas::{
    ConfigError, FieldDescriptor, FieldIndex, FieldKind, Index, IndexBuilder, IndexKind,
    IndexSet, IndexSpecification, Predicate, RangeOp, Record, Value,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Person {
    name: &'static str,
    age: i64,
    color: Option<&'static str>,
}

impl Record for Person {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name)),
            "age" => Some(Value::from(self.age)),
            "color" => Some(self.color.map_or(Value::Null, Value::tag)),
            _ => None,
        }
    }
}

fn person(name: &'static str, age: i64) -> Person {
    Person { name, age, color: None }
}

fn family() -> Vec<Person> {
    vec![person("Jason", 25), person("Aaron", 37), person("Erin", 34), person("Adriana", 13)]
}

fn age_set() -> IndexSet<Person> {
    let spec = IndexSpecification::build()
        .with(FieldDescriptor::new("age", FieldKind::Int, |p: &Person| Value::from(p.age)))
        .unwrap();
    IndexBuilder::indices_for(family(), spec).unwrap()
}

fn names(records: &[Arc<Person>]) -> Vec<&'static str> {
    let mut names: Vec<_> = records.iter().map(|p| p.name).collect();
    names.sort_unstable();
    names
}

mod tc_1_1_builder_picks_strategy {
    use super::*;

    #[test]
    fn test_ordered_field_gets_comparison_index() {
        let set = age_set();
        let index = set.index("age").unwrap();
        assert_eq!(index.kind(), IndexKind::Comparison);
        assert!(matches!(index, Index::Comparison(_)));
        assert_eq!(index.count(), 4);
    }

    #[test]
    fn test_equality_only_field_gets_equality_index() {
        let spec = IndexSpecification::<Person>::build()
            .with(FieldDescriptor::named("color", FieldKind::Tag))
            .unwrap();
        let set = IndexBuilder::indices_for(family(), spec).unwrap();
        assert_eq!(set.index("color").unwrap().kind(), IndexKind::Equality);
    }

    #[test]
    fn test_every_declared_kind_classifies() {
        for (kind, expected) in [
            (FieldKind::Bool, Some(IndexKind::Comparison)),
            (FieldKind::Int, Some(IndexKind::Comparison)),
            (FieldKind::Uint, Some(IndexKind::Comparison)),
            (FieldKind::Float, Some(IndexKind::Comparison)),
            (FieldKind::Text, Some(IndexKind::Comparison)),
            (FieldKind::Bytes, Some(IndexKind::Comparison)),
            (FieldKind::Tag, Some(IndexKind::Equality)),
            (FieldKind::Json, None),
        ] {
            let field = FieldDescriptor::<Person>::named("f", kind);
            assert_eq!(IndexBuilder::classify(&field).ok(), expected, "kind {kind}");
        }
    }

    #[test]
    fn test_unindexable_field_is_a_build_error() {
        let spec = IndexSpecification::build()
            .with(FieldDescriptor::<Person>::named("age", FieldKind::Int))
            .and_then(|s| s.and(FieldDescriptor::named("meta", FieldKind::Json)))
            .unwrap();
        let err = IndexBuilder::indices_for(family(), spec).unwrap_err();
        assert!(matches!(err, ConfigError::UnindexableField { ref field, .. } if field == "meta"));
        assert!(err.to_string().contains("cannot be indexed"));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = IndexSpecification::build()
            .with(FieldDescriptor::<Person>::named("age", FieldKind::Int))
            .and_then(|s| s.and(FieldDescriptor::named("age", FieldKind::Int)))
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateField { field: "age".into() });
    }
}

mod tc_1_2_equality_lookups {
    use super::*;

    #[test]
    fn test_equality_lookup_resolves() {
        let set = age_set();
        let found = set.query(&Predicate::eq("age", 25));
        assert_eq!(names(&found), vec!["Jason"]);
    }

    #[test]
    fn test_computed_literal_resolves() {
        let records = family();
        let literal = records[0].age + resolves_to_zero();
        let set = age_set();
        let found = set.query(&Predicate::eq("age", literal));
        assert_eq!(names(&found), vec!["Jason"]);
    }

    fn resolves_to_zero() -> i64 {
        0
    }

    #[test]
    fn test_missing_value_lands_in_null_bucket() {
        let mut records = family();
        records[1].color = Some("green");
        let spec = IndexSpecification::<Person>::build()
            .with(FieldDescriptor::named("color", FieldKind::Tag))
            .unwrap();
        let set = IndexBuilder::indices_for(records, spec).unwrap();

        assert_eq!(names(&set.query(&Predicate::eq("color", Value::tag("green")))), vec!["Aaron"]);
        assert_eq!(
            names(&set.query(&Predicate::eq("color", Value::Null))),
            vec!["Adriana", "Erin", "Jason"]
        );
    }

    #[test]
    fn test_cross_family_literal_matches_nothing() {
        let set = age_set();
        assert!(set.query(&Predicate::eq("age", 25u64)).is_empty());
        assert!(set.query(&Predicate::eq("age", "25")).is_empty());
    }
}

mod tc_1_3_range_lookups {
    use super::*;

    #[test]
    fn test_less_than() {
        assert_eq!(names(&age_set().query(&Predicate::lt("age", 34))), vec!["Adriana", "Jason"]);
    }

    #[test]
    fn test_less_than_or_equal() {
        assert_eq!(
            names(&age_set().query(&Predicate::le("age", 34))),
            vec!["Adriana", "Erin", "Jason"]
        );
    }

    #[test]
    fn test_greater_than() {
        assert_eq!(names(&age_set().query(&Predicate::gt("age", 34))), vec!["Aaron"]);
    }

    #[test]
    fn test_greater_than_or_equal() {
        assert_eq!(names(&age_set().query(&Predicate::ge("age", 34))), vec!["Aaron", "Erin"]);
    }

    #[test]
    fn test_range_result_is_in_key_order() {
        let set = age_set();
        let ages: Vec<i64> = set.query(&Predicate::ge("age", 0)).iter().map(|p| p.age).collect();
        assert_eq!(ages, vec![13, 25, 34, 37]);
    }

    #[test]
    fn test_range_through_index_directly() {
        let set = age_set();
        let index = set.index("age").unwrap();
        assert_eq!(index.lookup_range(RangeOp::Gt, &Value::Int(24)), Some(vec![0, 2, 1]));

        let tags = IndexBuilder::index_for(
            (0..).zip(family().iter()),
            &FieldDescriptor::named("color", FieldKind::Tag),
        )
        .unwrap();
        assert_eq!(tags.lookup_range(RangeOp::Lt, &Value::tag("x")), None);
    }

    #[test]
    fn test_text_range() {
        let spec = IndexSpecification::<Person>::build()
            .with(FieldDescriptor::named("name", FieldKind::Text))
            .unwrap();
        let set = IndexBuilder::indices_for(family(), spec).unwrap();
        let found = set.query(&Predicate::lt("name", "B"));
        assert_eq!(found.iter().map(|p| p.name).collect::<Vec<_>>(), vec!["Aaron", "Adriana"]);
    }
}
