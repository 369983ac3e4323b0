//! Fluent graph-centric query builder.
//!
//! Constraints and the limit can be changed at any time, but order keys can only be
//! added while the builder is [`Open`]. Calling [`GraphQueryBuilder::freeze`] fixes the
//! order and unlocks the terminal operations, each of which compiles an independent
//! [`CompiledQuery`] from the current state:
//!
//! ```ignore
//! let query = GraphQueryBuilder::new(&tx, &serializer)
//!     .has_value("name", "ada")?
//!     .order_by("age", Order::Desc)?
//!     .limit(10)
//!     .freeze();
//! let ids = query.vertices(&executor)?;
//! ```

use std::fmt;

use crate::query::executor::{collect_elements, Element, PropertyRef, QueryExecutor};
use crate::query::explain::QueryDescription;
use crate::query::metadata::TransactionContext;
use crate::query::normalize::Constraint;
use crate::query::order::{Order, OrderList, OrderListBuilder};
use crate::query::physical::CompiledQuery;
use crate::query::planner::Planner;
use crate::query::serializer::IndexSerializer;
use crate::query::{PredicateKind, Value};
use crate::schema::{ElementCategory, PropertyKey, LABEL_KEY_NAME};
use crate::types::{EdgeId, NodeId, Result, SombraError};

mod sealed {
    pub trait Sealed {}
}

/// Phase marker of a [`GraphQueryBuilder`].
pub trait BuilderPhase: sealed::Sealed + Clone {}

/// Builder phase that still accepts order keys.
#[derive(Clone, Debug, Default)]
pub struct Open {
    orders: OrderListBuilder,
}

/// Builder phase with a fixed order; terminal operations are available.
#[derive(Clone, Debug, Default)]
pub struct Frozen {
    orders: OrderList,
}

impl sealed::Sealed for Open {}
impl sealed::Sealed for Frozen {}
impl BuilderPhase for Open {}
impl BuilderPhase for Frozen {}

/// Accumulates constraints, order and limit for one transaction.
#[derive(Clone)]
pub struct GraphQueryBuilder<'a, P: BuilderPhase = Open> {
    tx: &'a dyn TransactionContext,
    serializer: &'a dyn IndexSerializer,
    constraints: Vec<Constraint>,
    limit: Option<usize>,
    phase: P,
}

impl<'a> GraphQueryBuilder<'a, Open> {
    /// Starts an unconstrained, unordered, unlimited query.
    pub fn new(tx: &'a dyn TransactionContext, serializer: &'a dyn IndexSerializer) -> Self {
        Self {
            tx,
            serializer,
            constraints: Vec::new(),
            limit: None,
            phase: Open::default(),
        }
    }

    /// Orders results by the property key called `key`.
    pub fn order_by(self, key: &str, order: Order) -> Result<Self> {
        if !self.tx.contains_property_key(key)? {
            return Err(SombraError::InvalidOwned(format!(
                "order key '{key}' does not exist or is not a property key"
            )));
        }
        let key = self.tx.property_key(key)?;
        self.order_by_key(key, order)
    }

    /// Orders results by an already resolved property key.
    pub fn order_by_key(mut self, key: PropertyKey, order: Order) -> Result<Self> {
        self.phase.orders.add(key, order)?;
        Ok(self)
    }

    /// Fixes the order; no order keys can be added afterwards.
    pub fn freeze(self) -> GraphQueryBuilder<'a, Frozen> {
        GraphQueryBuilder {
            tx: self.tx,
            serializer: self.serializer,
            constraints: self.constraints,
            limit: self.limit,
            phase: Frozen {
                orders: self.phase.orders.freeze(),
            },
        }
    }
}

impl<'a, P: BuilderPhase> GraphQueryBuilder<'a, P> {
    /// Adds `key <predicate> value`.
    pub fn has(self, key: &str, predicate: PredicateKind, value: impl Into<Value>) -> Result<Self> {
        self.push(key, predicate, Some(value.into()))
    }

    /// Requires `key` to be present.
    pub fn has_key(self, key: &str) -> Result<Self> {
        self.push(key, PredicateKind::NotEqual, None)
    }

    /// Requires `key` to be absent.
    pub fn has_not_key(self, key: &str) -> Result<Self> {
        self.push(key, PredicateKind::Equal, None)
    }

    /// Requires `key = value`.
    pub fn has_value(self, key: &str, value: impl Into<Value>) -> Result<Self> {
        self.has(key, PredicateKind::Equal, value)
    }

    /// Requires `key != value`.
    pub fn has_not_value(self, key: &str, value: impl Into<Value>) -> Result<Self> {
        self.has(key, PredicateKind::NotEqual, value)
    }

    /// Restricts `key` to the half-open range `[start, end)`.
    pub fn interval(
        self,
        key: &str,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Result<Self> {
        self.has(key, PredicateKind::GreaterThanEqual, start)?
            .has(key, PredicateKind::LessThan, end)
    }

    /// Restricts results to elements carrying `label`.
    pub fn has_label(self, label: &str) -> Result<Self> {
        self.has(LABEL_KEY_NAME, PredicateKind::Equal, label)
    }

    /// Caps the number of results. Zero makes every terminal operation return nothing.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Constraints in registration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The limit set so far, if any.
    pub fn current_limit(&self) -> Option<usize> {
        self.limit
    }

    fn push(mut self, key: &str, predicate: PredicateKind, value: Option<Value>) -> Result<Self> {
        self.constraints.push(Constraint::new(key, predicate, value)?);
        Ok(self)
    }
}

impl GraphQueryBuilder<'_, Frozen> {
    /// The frozen order.
    pub fn orders(&self) -> &OrderList {
        &self.phase.orders
    }

    /// Compiles the current state into an index plan for `category`.
    pub fn construct_query(&self, category: ElementCategory) -> Result<CompiledQuery> {
        Planner::new(self.tx, self.serializer).construct_query(
            &self.constraints,
            &self.phase.orders,
            self.limit,
            category,
        )
    }

    /// Matching vertices.
    pub fn vertices(&self, executor: &dyn QueryExecutor) -> Result<Vec<NodeId>> {
        let query = self.construct_query(ElementCategory::Vertex)?;
        collect_elements(executor, &query, Element::as_vertex)
    }

    /// Matching edges.
    pub fn edges(&self, executor: &dyn QueryExecutor) -> Result<Vec<EdgeId>> {
        let query = self.construct_query(ElementCategory::Edge)?;
        collect_elements(executor, &query, Element::as_edge)
    }

    /// Matching vertex properties.
    pub fn properties(&self, executor: &dyn QueryExecutor) -> Result<Vec<PropertyRef>> {
        let query = self.construct_query(ElementCategory::Property)?;
        collect_elements(executor, &query, Element::as_property)
    }

    /// Plans the vertex query without executing it.
    pub fn describe_for_vertices(&self) -> Result<QueryDescription> {
        self.describe(ElementCategory::Vertex)
    }

    /// Plans the edge query without executing it.
    pub fn describe_for_edges(&self) -> Result<QueryDescription> {
        self.describe(ElementCategory::Edge)
    }

    /// Plans the property query without executing it.
    pub fn describe_for_properties(&self) -> Result<QueryDescription> {
        self.describe(ElementCategory::Property)
    }

    /// Plans the query for `category` without executing it.
    pub fn describe(&self, category: ElementCategory) -> Result<QueryDescription> {
        Ok(QueryDescription::new(&self.construct_query(category)?))
    }
}

impl<P: BuilderPhase> fmt::Display for GraphQueryBuilder<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, constraint) in self.constraints.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match &constraint.value {
                Some(value) => write!(f, "{} {} {}", constraint.key, constraint.predicate, value)?,
                None => write!(f, "{} {} null", constraint.key, constraint.predicate)?,
            }
        }
        f.write_str("]")?;
        if let Some(limit) = self.limit {
            write!(f, ":{limit}")?;
        }
        Ok(())
    }
}
