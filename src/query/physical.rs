//! Physical index plan selected by the planner.

use std::sync::Arc;

use crate::query::condition::ConditionTree;
use crate::query::order::OrderList;
use crate::query::serializer::BackendQuery;
use crate::schema::{ElementCategory, IndexDescriptor};

/// One backend call: the selected index and the request it should answer.
#[derive(Clone, Debug, PartialEq)]
pub struct SubQuery {
    /// Index the request targets.
    pub index: Arc<IndexDescriptor>,
    /// Serialized request for the index backend.
    pub query: BackendQuery,
}

/// Set of index sub-queries whose results are intersected, sharing one fetch limit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JointIndexQuery {
    sub_queries: Vec<SubQuery>,
    limit: usize,
}

impl JointIndexQuery {
    pub(crate) fn push(&mut self, index: Arc<IndexDescriptor>, query: BackendQuery) {
        self.sub_queries.push(SubQuery { index, query });
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Sub-queries in selection order.
    pub fn sub_queries(&self) -> &[SubQuery] {
        &self.sub_queries
    }

    /// Number of sub-queries.
    pub fn len(&self) -> usize {
        self.sub_queries.len()
    }

    /// Whether no index was selected.
    pub fn is_empty(&self) -> bool {
        self.sub_queries.is_empty()
    }

    /// Maximum number of entries fetched from each index.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// A joint query together with what the executor may assume about its results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanEnvelope {
    /// Index calls to issue.
    pub joint: JointIndexQuery,
    /// Every top-level clause is answered by the selected indexes, so results need no
    /// residual filtering.
    pub fully_covered: bool,
    /// Results already come back in the requested order.
    pub is_sorted: bool,
}

impl PlanEnvelope {
    /// Per-index fetch limit of the wrapped joint query.
    pub fn limit(&self) -> usize {
        self.joint.limit()
    }
}

/// Immutable result of compiling a builder for one element category.
///
/// A query without a condition is the empty query: it can produce no results and the
/// executor is never consulted for it.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    category: ElementCategory,
    condition: Option<ConditionTree>,
    orders: OrderList,
    plan: PlanEnvelope,
    limit: Option<usize>,
}

impl CompiledQuery {
    pub(crate) fn new(
        category: ElementCategory,
        condition: ConditionTree,
        orders: OrderList,
        plan: PlanEnvelope,
        limit: Option<usize>,
    ) -> Self {
        Self {
            category,
            condition: Some(condition),
            orders,
            plan,
            limit,
        }
    }

    /// The query that matches nothing.
    pub fn empty(category: ElementCategory) -> Self {
        Self {
            category,
            condition: None,
            orders: OrderList::no_order(),
            plan: PlanEnvelope::default(),
            limit: Some(0),
        }
    }

    /// Whether this is the empty query.
    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
    }

    /// Element category the query was compiled for.
    pub fn category(&self) -> ElementCategory {
        self.category
    }

    /// Normalized condition, absent for the empty query.
    pub fn condition(&self) -> Option<&ConditionTree> {
        self.condition.as_ref()
    }

    /// Requested result order.
    pub fn orders(&self) -> &OrderList {
        &self.orders
    }

    /// Selected index plan.
    pub fn plan(&self) -> &PlanEnvelope {
        &self.plan
    }

    /// Caller-requested result limit; `None` means unbounded.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Number of backend index calls the plan issues.
    pub fn sub_query_count(&self) -> usize {
        self.plan.joint.len()
    }
}
