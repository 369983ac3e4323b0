mod common;

use common::{init_tracing, name, people_schema, snapshot, RecordingExecutor};
use sombra_planner::query::executor::{Element, PropertyRef};
use sombra_planner::query::serializer::StandardIndexSerializer;
use sombra_planner::query::{GraphQueryBuilder, Order, PredicateKind};
use sombra_planner::schema::{ElementCategory, IndexDescriptor};
use sombra_planner::types::{EdgeId, IndexId, KeyId, NodeId, Result, SombraError};

fn mixed_results() -> Vec<Element> {
    vec![
        Element::Vertex(NodeId(1)),
        Element::Edge(EdgeId(10)),
        Element::Vertex(NodeId(2)),
        Element::Property(PropertyRef {
            id: 100,
            key: KeyId(1),
            owner: NodeId(1),
        }),
        Element::Vertex(NodeId(3)),
    ]
}

#[test]
fn read_operations_keep_only_the_requested_kind() -> Result<()> {
    init_tracing();
    let tx = snapshot(people_schema());
    let serializer = StandardIndexSerializer::new();
    let executor = RecordingExecutor::new(mixed_results());
    let builder = GraphQueryBuilder::new(&tx, &serializer)
        .has_key("name")?
        .freeze();

    assert_eq!(
        builder.vertices(&executor)?,
        vec![NodeId(1), NodeId(2), NodeId(3)]
    );
    assert_eq!(builder.edges(&executor)?, vec![EdgeId(10)]);
    let properties = builder.properties(&executor)?;
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].owner, NodeId(1));
    assert_eq!(executor.calls(), 3);
    assert_eq!(
        executor.last_query().map(|q| q.category()),
        Some(ElementCategory::Property)
    );
    Ok(())
}

#[test]
fn results_are_truncated_to_the_limit() -> Result<()> {
    let tx = snapshot(people_schema());
    let serializer = StandardIndexSerializer::new();
    let executor = RecordingExecutor::new(mixed_results());
    let ids = GraphQueryBuilder::new(&tx, &serializer)
        .has_key("name")?
        .limit(2)
        .freeze()
        .vertices(&executor)?;
    assert_eq!(ids, vec![NodeId(1), NodeId(2)]);
    Ok(())
}

#[test]
fn empty_queries_never_reach_the_executor() -> Result<()> {
    let tx = snapshot(people_schema());
    let serializer = StandardIndexSerializer::new();
    let executor = RecordingExecutor::new(mixed_results());
    let builder = GraphQueryBuilder::new(&tx, &serializer).freeze();

    let zero = builder.clone().has_value("name", "ada")?.limit(0);
    assert!(zero.vertices(&executor)?.is_empty());
    assert!(zero.edges(&executor)?.is_empty());

    let unsatisfiable = builder.has_value("ghost", 1_i64)?;
    assert!(unsatisfiable.properties(&executor)?.is_empty());
    assert_eq!(executor.calls(), 0);
    Ok(())
}

#[test]
fn executor_receives_the_compiled_plan() -> Result<()> {
    let index =
        IndexDescriptor::composite(IndexId(1), "by_name", ElementCategory::Vertex, [name()]);
    let tx = snapshot(people_schema().with_index(index));
    let serializer = StandardIndexSerializer::new();
    let executor = RecordingExecutor::new(Vec::new());
    let builder = GraphQueryBuilder::new(&tx, &serializer)
        .has_value("name", "ada")?
        .freeze();
    assert!(builder.vertices(&executor)?.is_empty());
    let seen = executor.last_query().expect("executor was called");
    assert_eq!(seen, builder.construct_query(ElementCategory::Vertex)?);
    assert_eq!(seen.sub_query_count(), 1);
    assert!(seen.plan().fully_covered);
    Ok(())
}

#[test]
fn descriptions_summarize_the_plan() -> Result<()> {
    let index =
        IndexDescriptor::composite(IndexId(1), "by_name", ElementCategory::Vertex, [name()]);
    let tx = snapshot(people_schema().with_index(index));
    let serializer = StandardIndexSerializer::new();
    let builder = GraphQueryBuilder::new(&tx, &serializer)
        .order_by("age", Order::Asc)?
        .freeze()
        .has_value("name", "ada")?
        .has("age", PredicateKind::LessThan, 30_i64)?;

    let vertices = builder.describe_for_vertices()?;
    assert_eq!(vertices.sub_query_count, 1);
    assert_eq!(vertices.explain.op, "JointIndexQuery");
    assert_eq!(vertices.explain.prop("fully_covered"), Some("false"));
    assert_eq!(vertices.explain.prop("order"), Some("age asc"));
    assert_eq!(vertices.explain.inputs[0].op, "CompositeLookup");
    assert_eq!(vertices.explain.inputs[0].prop("index"), Some("by_name"));

    let json = vertices.to_json(true);
    assert_eq!(json["sub_queries"], 1);
    assert_eq!(json["plan"]["props"]["condition"], "<redacted>");
    assert_eq!(json["plan"]["inputs"][0]["props"]["keys"], "1");

    let edges = builder.describe_for_edges()?;
    assert_eq!(edges.sub_query_count, 0);
    assert_ne!(edges.plan_hash, vertices.plan_hash);
    assert_eq!(builder.describe_for_properties()?.explain.prop("category"), Some("property"));
    Ok(())
}

#[test]
fn order_keys_must_be_known_property_keys() {
    let tx = snapshot(people_schema().with_edge_label("knows", KeyId(20)));
    let serializer = StandardIndexSerializer::new();
    let builder = GraphQueryBuilder::new(&tx, &serializer);
    assert!(matches!(
        builder.clone().order_by("unknown", Order::Asc),
        Err(SombraError::InvalidOwned(_))
    ));
    assert!(matches!(
        builder.order_by("knows", Order::Asc),
        Err(SombraError::InvalidOwned(_))
    ));
}
