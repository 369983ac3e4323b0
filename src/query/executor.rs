//! Execution seam for compiled queries.
//!
//! The planner never touches storage. A [`QueryExecutor`] runs the joint index query,
//! filters residual clauses and returns elements; the helpers here short-circuit the
//! empty query and keep only elements of the requested kind.

use crate::query::physical::CompiledQuery;
use crate::types::{EdgeId, KeyId, NodeId, Result};

/// A vertex property instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PropertyRef {
    /// Identifier of the property instance.
    pub id: u64,
    /// Key the property is stored under.
    pub key: KeyId,
    /// Vertex owning the property.
    pub owner: NodeId,
}

/// Graph element produced by an executor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Element {
    /// A vertex.
    Vertex(NodeId),
    /// An edge.
    Edge(EdgeId),
    /// A vertex property.
    Property(PropertyRef),
}

impl Element {
    /// The vertex id, if this is a vertex.
    pub fn as_vertex(&self) -> Option<NodeId> {
        match self {
            Element::Vertex(id) => Some(*id),
            _ => None,
        }
    }

    /// The edge id, if this is an edge.
    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            Element::Edge(id) => Some(*id),
            _ => None,
        }
    }

    /// The property, if this is a property.
    pub fn as_property(&self) -> Option<PropertyRef> {
        match self {
            Element::Property(prop) => Some(*prop),
            _ => None,
        }
    }
}

/// Runs compiled queries against a storage backend.
pub trait QueryExecutor {
    /// Returns the elements matching `query`, honoring its order and limit.
    fn execute(&self, query: &CompiledQuery) -> Result<Vec<Element>>;
}

/// Executes `query` unless it is the empty query, which never reaches the executor.
pub fn run_query(executor: &dyn QueryExecutor, query: &CompiledQuery) -> Result<Vec<Element>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    executor.execute(query)
}

/// Runs `query` and keeps the elements `select` accepts, up to the query limit.
pub fn collect_elements<T>(
    executor: &dyn QueryExecutor,
    query: &CompiledQuery,
    select: impl Fn(&Element) -> Option<T>,
) -> Result<Vec<T>> {
    let elements = run_query(executor, query)?;
    let limit = query.limit().unwrap_or(usize::MAX);
    Ok(elements.iter().filter_map(select).take(limit).collect())
}
