mod common;

use std::collections::BTreeSet;

use common::{age, city, name, people_schema, snapshot};
use proptest::prelude::*;
use sombra_planner::query::serializer::StandardIndexSerializer;
use sombra_planner::query::{GraphQueryBuilder, PredicateKind, Value};
use sombra_planner::schema::{ElementCategory, IndexDescriptor};
use sombra_planner::types::IndexId;

#[derive(Debug, Clone)]
enum Op {
    Equal(&'static str, Value),
    Range(PredicateKind, i64),
    InCities(Vec<String>),
    Exists(&'static str),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(|v| Op::Equal("name", Value::String(v))),
        "[a-z]{1,6}".prop_map(|v| Op::Equal("city", Value::String(v))),
        (0i64..100).prop_map(|v| Op::Equal("age", Value::Int(v))),
        (
            prop_oneof![
                Just(PredicateKind::LessThan),
                Just(PredicateKind::GreaterThanEqual),
                Just(PredicateKind::NotEqual),
            ],
            0i64..100
        )
            .prop_map(|(p, v)| Op::Range(p, v)),
        prop::collection::vec("[a-z]{1,4}", 1..4).prop_map(Op::InCities),
        prop_oneof![Just("name"), Just("bio")].prop_map(Op::Exists),
    ]
}

fn schema() -> sombra_planner::query::metadata::InMemorySchema {
    people_schema()
        .with_index(IndexDescriptor::composite(
            IndexId(1),
            "by_name",
            ElementCategory::Vertex,
            [name()],
        ))
        .with_index(IndexDescriptor::composite(
            IndexId(2),
            "by_name_city",
            ElementCategory::Vertex,
            [name(), city()],
        ))
        .with_index(
            IndexDescriptor::mixed(IndexId(3), "search", ElementCategory::Vertex, "es")
                .with_field(age())
                .with_field(city()),
        )
}

proptest! {
    #[test]
    fn planning_is_deterministic_and_bounded(
        ops in prop::collection::vec(arb_op(), 0..8),
        limit in prop::option::of(0usize..50),
    ) {
        let tx = snapshot(schema());
        let serializer = StandardIndexSerializer::new();
        let mut builder = GraphQueryBuilder::new(&tx, &serializer).freeze();
        for op in ops {
            builder = match op {
                Op::Equal(key, value) => builder.has_value(key, value),
                Op::Range(predicate, value) => builder.has("age", predicate, value),
                Op::InCities(values) => builder.has("city", PredicateKind::In, values),
                Op::Exists(key) => builder.has_key(key),
            }
            .expect("generated constraints are valid");
        }
        if let Some(limit) = limit {
            builder = builder.limit(limit);
        }

        let first = builder.construct_query(ElementCategory::Vertex).expect("compile");
        let second = builder.construct_query(ElementCategory::Vertex).expect("compile");
        prop_assert_eq!(&first, &second);

        if limit == Some(0) {
            prop_assert!(first.is_empty());
        }
        let Some(condition) = first.condition() else {
            prop_assert_eq!(first.sub_query_count(), 0);
            return Ok(());
        };
        let plan = first.plan();
        prop_assert!(plan.joint.len() <= condition.num_clauses());
        let distinct: BTreeSet<_> = plan.joint.sub_queries().iter().map(|s| s.index.id).collect();
        prop_assert_eq!(distinct.len(), plan.joint.len());
        if plan.joint.is_empty() {
            prop_assert_eq!(plan.limit(), 0);
            prop_assert!(!plan.fully_covered);
        } else {
            prop_assert!(plan.limit() > 0);
            prop_assert!(plan.limit() <= tx_hard_max());
        }
        if plan.fully_covered {
            prop_assert!(!plan.joint.is_empty());
        }
        prop_assert!(plan.is_sorted);
    }
}

fn tx_hard_max() -> usize {
    sombra_planner::config::PlannerConfig::default().hard_max_limit
}
