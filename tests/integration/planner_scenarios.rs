mod common;

use common::{age, bio, city, init_tracing, name, people_schema, snapshot};
use sombra_planner::config::PlannerConfig;
use sombra_planner::query::metadata::TxSnapshot;
use sombra_planner::query::serializer::{BackendQuery, StandardIndexSerializer};
use sombra_planner::query::{CompiledQuery, GraphQueryBuilder, Order, PredicateKind, Value};
use sombra_planner::schema::{ElementCategory, IndexDescriptor};
use sombra_planner::types::{IndexId, Result};
use std::sync::Arc;

fn chosen(query: &CompiledQuery) -> Vec<String> {
    query
        .plan()
        .joint
        .sub_queries()
        .iter()
        .map(|sub| sub.index.name.clone())
        .collect()
}

fn by_name() -> IndexDescriptor {
    IndexDescriptor::composite(IndexId(1), "by_name", ElementCategory::Vertex, [name()])
}

#[test]
fn compiling_twice_yields_identical_plans() -> Result<()> {
    init_tracing();
    let tx = snapshot(people_schema().with_index(by_name()));
    let serializer = StandardIndexSerializer::new();
    let builder = GraphQueryBuilder::new(&tx, &serializer)
        .has_value("name", "ada")?
        .has("age", PredicateKind::GreaterThan, 30_i64)?
        .limit(10)
        .freeze();
    let first = builder.construct_query(ElementCategory::Vertex)?;
    let second = builder.construct_query(ElementCategory::Vertex)?;
    assert_eq!(first, second);
    assert_eq!(
        builder.describe_for_vertices()?.plan_hash,
        builder.describe_for_vertices()?.plan_hash
    );
    Ok(())
}

#[test]
fn composite_with_residual_range_is_partially_covered() -> Result<()> {
    init_tracing();
    let tx = snapshot(people_schema().with_index(by_name()));
    let serializer = StandardIndexSerializer::new();
    let query = GraphQueryBuilder::new(&tx, &serializer)
        .has_value("name", "alice")?
        .has("age", PredicateKind::GreaterThanEqual, 18_i64)?
        .freeze()
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(chosen(&query), vec!["by_name"]);
    assert!(!query.plan().fully_covered);
    assert!(query.plan().is_sorted);
    assert_eq!(query.condition().map(|c| c.num_clauses()), Some(2));
    Ok(())
}

#[test]
fn composite_expands_membership_into_lookup_keys() -> Result<()> {
    let index = IndexDescriptor::composite(
        IndexId(4),
        "by_name_city",
        ElementCategory::Vertex,
        [name(), city()],
    );
    let tx = snapshot(people_schema().with_index(index));
    let serializer = StandardIndexSerializer::new();
    let base = GraphQueryBuilder::new(&tx, &serializer).freeze();

    let covered = base
        .clone()
        .has_value("name", "ada")?
        .has("city", PredicateKind::In, vec!["london", "paris"])?
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(chosen(&covered), vec!["by_name_city"]);
    assert!(covered.plan().fully_covered);
    match &covered.plan().joint.sub_queries()[0].query {
        BackendQuery::KeyLookup { keys, .. } => assert_eq!(keys.len(), 2),
        other => panic!("expected key lookup, found {other:?}"),
    }

    let partial = base
        .has_value("name", "ada")?
        .construct_query(ElementCategory::Vertex)?;
    assert!(partial.plan().joint.is_empty());
    assert_eq!(partial.plan().limit(), 0);
    Ok(())
}

#[test]
fn overlapping_covers_are_counted_once() -> Result<()> {
    let search = IndexDescriptor::mixed(IndexId(2), "search", ElementCategory::Vertex, "es")
        .with_field(name())
        .with_field(age());
    let tx = snapshot(people_schema().with_index(by_name()).with_index(search));
    let serializer = StandardIndexSerializer::new();
    let query = GraphQueryBuilder::new(&tx, &serializer)
        .has_value("name", "ada")?
        .has("age", PredicateKind::LessThan, 40_i64)?
        .freeze()
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(chosen(&query), vec!["by_name", "search"]);
    assert!(query.plan().fully_covered);
    // Two covered clauses: the base default limit grows by 2^2 before the hard clamp.
    assert_eq!(query.plan().limit(), PlannerConfig::default().hard_max_limit);
    Ok(())
}

#[test]
fn first_sorted_selection_fixes_sortedness() -> Result<()> {
    init_tracing();
    let search = IndexDescriptor::mixed(IndexId(2), "search", ElementCategory::Vertex, "es")
        .with_field(age());
    let text = IndexDescriptor::mixed(IndexId(3), "text", ElementCategory::Vertex, "es")
        .with_field(bio());
    let tx = snapshot(people_schema().with_index(search).with_index(text));
    let serializer = StandardIndexSerializer::new();
    let query = GraphQueryBuilder::new(&tx, &serializer)
        .order_by("age", Order::Asc)?
        .freeze()
        .has("bio", PredicateKind::TextContains, "rust")?
        .has("age", PredicateKind::GreaterThan, 18_i64)?
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(chosen(&query), vec!["search", "text"]);
    assert!(query.plan().is_sorted);
    assert!(query.plan().fully_covered);
    Ok(())
}

#[test]
fn unsorted_selection_leaves_results_unsorted() -> Result<()> {
    let tx = snapshot(people_schema().with_index(by_name()));
    let serializer = StandardIndexSerializer::new();
    let query = GraphQueryBuilder::new(&tx, &serializer)
        .order_by("age", Order::Desc)?
        .freeze()
        .has_value("name", "ada")?
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(chosen(&query), vec!["by_name"]);
    assert!(!query.plan().is_sorted);
    Ok(())
}

#[test]
fn zero_limit_and_unsatisfiable_constraints_yield_empty_queries() -> Result<()> {
    let tx = snapshot(people_schema().with_index(by_name()));
    let serializer = StandardIndexSerializer::new();
    let base = GraphQueryBuilder::new(&tx, &serializer).freeze();

    let zero = base
        .clone()
        .has_value("name", "ada")?
        .limit(0)
        .construct_query(ElementCategory::Vertex)?;
    assert!(zero.is_empty());

    let empty_in = base
        .clone()
        .has("name", PredicateKind::In, Value::List(Vec::new()))?
        .construct_query(ElementCategory::Vertex)?;
    assert!(empty_in.is_empty());

    let unknown = base
        .has_value("nickname", "ada")?
        .construct_query(ElementCategory::Vertex)?;
    assert!(unknown.is_empty());
    assert_eq!(unknown.sub_query_count(), 0);
    Ok(())
}

#[test]
fn limits_follow_configuration_and_transaction_state() -> Result<()> {
    let schema: Arc<_> = Arc::new(people_schema().with_index(by_name()));
    let serializer = StandardIndexSerializer::new();

    let clean = TxSnapshot::new(schema.clone(), PlannerConfig::default());
    let query = GraphQueryBuilder::new(&clean, &serializer)
        .has_value("name", "ada")?
        .limit(10)
        .freeze()
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(query.plan().limit(), 20);
    assert_eq!(query.limit(), Some(10));

    let dirty = TxSnapshot::new(schema.clone(), PlannerConfig::default()).with_modifications(3);
    let query = GraphQueryBuilder::new(&dirty, &serializer)
        .has_value("name", "ada")?
        .limit(10)
        .freeze()
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(query.plan().limit(), 25);

    let adaptive = TxSnapshot::new(schema, PlannerConfig::adaptive());
    let query = GraphQueryBuilder::new(&adaptive, &serializer)
        .has_value("name", "ada")?
        .freeze()
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(query.plan().limit(), 2 * PlannerConfig::adaptive().default_no_limit);
    Ok(())
}

#[test]
fn category_filters_candidate_indexes() -> Result<()> {
    let edge_index =
        IndexDescriptor::composite(IndexId(9), "edge_by_name", ElementCategory::Edge, [name()]);
    let tx = snapshot(people_schema().with_index(by_name()).with_index(edge_index));
    let serializer = StandardIndexSerializer::new();
    let builder = GraphQueryBuilder::new(&tx, &serializer)
        .has_value("name", "ada")?
        .freeze();
    let edges = builder.construct_query(ElementCategory::Edge)?;
    assert_eq!(chosen(&edges), vec!["edge_by_name"]);
    let properties = builder.construct_query(ElementCategory::Property)?;
    assert!(properties.plan().joint.is_empty());
    Ok(())
}

#[test]
fn text_predicates_are_only_answered_by_search_indexes() -> Result<()> {
    let by_bio =
        IndexDescriptor::composite(IndexId(1), "by_bio", ElementCategory::Vertex, [bio()]);
    let tx = snapshot(people_schema().with_index(by_bio));
    let serializer = StandardIndexSerializer::new();
    let query = GraphQueryBuilder::new(&tx, &serializer)
        .has("bio", PredicateKind::TextPrefix, "rust")?
        .freeze()
        .construct_query(ElementCategory::Vertex)?;
    assert!(query.plan().joint.is_empty());
    assert!(!query.plan().fully_covered);
    Ok(())
}

#[test]
fn unsupported_search_predicates_fall_back_to_filtering() -> Result<()> {
    let search = IndexDescriptor::mixed(IndexId(2), "search", ElementCategory::Vertex, "es")
        .with_field(bio());
    let tx = snapshot(people_schema().with_index(search));
    let serializer =
        StandardIndexSerializer::new().without_predicate("es", PredicateKind::TextRegex);
    let builder = GraphQueryBuilder::new(&tx, &serializer).freeze();
    let regex = builder
        .clone()
        .has("bio", PredicateKind::TextRegex, "ru.t")?
        .construct_query(ElementCategory::Vertex)?;
    assert!(regex.plan().joint.is_empty());
    let contains = builder
        .has("bio", PredicateKind::TextContains, "rust")?
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(chosen(&contains), vec!["search"]);
    Ok(())
}
