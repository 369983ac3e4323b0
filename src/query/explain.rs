//! Human-readable description of compiled index plans.

use std::hash::Hasher;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use xxhash_rust::xxh64::Xxh64;

use crate::query::physical::{CompiledQuery, SubQuery};
use crate::query::serializer::BackendQuery;

/// Explain node representing one plan operator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExplainNode {
    /// Operator name
    pub op: String,
    /// Additional properties describing the operator
    pub props: Vec<ExplainProp>,
    /// Input operators
    pub inputs: Vec<ExplainNode>,
}

impl ExplainNode {
    /// Creates a new explain node with the given operator name.
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            props: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Value of the first property named `key`.
    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|prop| prop.key == key)
            .map(|prop| prop.value.as_str())
    }
}

/// Single property associated with an [`ExplainNode`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExplainProp {
    /// Property key.
    pub key: String,
    /// Property value serialized for display.
    pub value: String,
    /// Whether this property contains literal data that may be redacted.
    pub redactable: bool,
}

impl ExplainProp {
    fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            redactable: false,
        }
    }

    fn literal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            redactable: true,
        }
    }
}

/// Description of a compiled query, produced without contacting any backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryDescription {
    /// Number of backend index calls the plan would issue.
    pub sub_query_count: usize,
    /// Explain tree rooted at the joint index query.
    pub explain: ExplainNode,
    /// Deterministic hash of the explain tree.
    pub plan_hash: u64,
}

impl QueryDescription {
    /// Describes `query`.
    pub fn new(query: &CompiledQuery) -> Self {
        let explain = explain_query(query);
        let plan_hash = plan_hash(&explain);
        Self {
            sub_query_count: query.sub_query_count(),
            explain,
            plan_hash,
        }
    }

    /// JSON rendering used by explain tooling. Redactable props are masked when `redact`
    /// is set.
    pub fn to_json(&self, redact: bool) -> JsonValue {
        let mut root = Map::new();
        root.insert("sub_queries".into(), JsonValue::from(self.sub_query_count));
        root.insert(
            "plan_hash".into(),
            JsonValue::String(format!("{:016x}", self.plan_hash)),
        );
        root.insert("plan".into(), explain_node_to_value(&self.explain, redact));
        JsonValue::Object(root)
    }
}

/// Builds the explain tree for a compiled query.
pub fn explain_query(query: &CompiledQuery) -> ExplainNode {
    let Some(condition) = query.condition() else {
        let mut node = ExplainNode::new("EmptyResult");
        node.props
            .push(ExplainProp::plain("category", query.category().as_str()));
        return node;
    };
    let plan = query.plan();
    let mut root = ExplainNode::new("JointIndexQuery");
    root.props = vec![
        ExplainProp::plain("category", query.category().as_str()),
        ExplainProp::literal("condition", condition.to_string()),
        ExplainProp::plain("index_limit", plan.limit().to_string()),
        ExplainProp::plain("fully_covered", plan.fully_covered.to_string()),
        ExplainProp::plain("sorted", plan.is_sorted.to_string()),
    ];
    if let Some(limit) = query.limit() {
        root.props.push(ExplainProp::plain("limit", limit.to_string()));
    }
    if !query.orders().is_empty() {
        root.props
            .push(ExplainProp::plain("order", query.orders().to_string()));
    }
    root.inputs = plan.joint.sub_queries().iter().map(sub_query_node).collect();
    root
}

fn sub_query_node(sub: &SubQuery) -> ExplainNode {
    let mut props = vec![
        ExplainProp::plain("index", sub.index.name.clone()),
        ExplainProp::plain("index_id", sub.index.id.to_string()),
    ];
    let op = match &sub.query {
        BackendQuery::KeyLookup { store, keys } => {
            props.push(ExplainProp::plain("store", store.clone()));
            props.push(ExplainProp::plain("keys", keys.len().to_string()));
            "CompositeLookup"
        }
        BackendQuery::Search {
            store,
            query,
            orders,
        } => {
            props.push(ExplainProp::plain("store", store.clone()));
            props.push(ExplainProp::literal("query", query.clone()));
            if !orders.is_empty() {
                let rendered = orders
                    .iter()
                    .map(|(key, order)| format!("{key} {order}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                props.push(ExplainProp::plain("order", rendered));
            }
            "MixedSearch"
        }
    };
    let mut node = ExplainNode::new(op);
    node.props = props;
    node
}

/// Deterministic hash over operator names, props and tree shape.
pub fn plan_hash(root: &ExplainNode) -> u64 {
    let mut hasher = Xxh64::new(0);
    hash_explain_node(root, &mut hasher);
    hasher.finish()
}

fn hash_explain_node(node: &ExplainNode, hasher: &mut Xxh64) {
    hash_field(hasher, &node.op);
    hasher.write_u64(node.props.len() as u64);
    for prop in &node.props {
        hash_field(hasher, &prop.key);
        hash_field(hasher, &prop.value);
    }
    hasher.write_u64(node.inputs.len() as u64);
    for child in &node.inputs {
        hash_explain_node(child, hasher);
    }
}

/// Length-prefixed so adjacent fields cannot run into each other.
fn hash_field(hasher: &mut Xxh64, field: &str) {
    hasher.write_u64(field.len() as u64);
    hasher.write(field.as_bytes());
}

fn explain_node_to_value(node: &ExplainNode, redact: bool) -> JsonValue {
    let mut map = Map::new();
    map.insert("op".into(), JsonValue::String(node.op.clone()));
    if !node.props.is_empty() {
        let mut props = Map::new();
        for prop in &node.props {
            let value = if redact && prop.redactable {
                "<redacted>".to_owned()
            } else {
                prop.value.clone()
            };
            props.insert(prop.key.clone(), JsonValue::String(value));
        }
        map.insert("props".into(), JsonValue::Object(props));
    }
    let inputs = node
        .inputs
        .iter()
        .map(|child| explain_node_to_value(child, redact))
        .collect::<Vec<_>>();
    map.insert("inputs".into(), JsonValue::Array(inputs));
    JsonValue::Object(map)
}
