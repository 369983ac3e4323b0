//! Greedy index selection.
//!
//! The planner normalizes the builder's constraints, gathers every index attached to a
//! referenced key, and then repeatedly picks the index whose cover scores highest while
//! still answering at least one clause no earlier pick answered. Each pick contributes
//! one backend sub-query; the sub-queries are intersected by the executor. Selection
//! stops when no candidate adds coverage, so it runs at most once per top-level clause.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::query::candidates::collect_index_candidates;
use crate::query::condition::{ClauseId, ConditionTree};
use crate::query::cover::{
    check_type_constraint, composite_cover, index_covers_order, mixed_cover, TypeConstraint,
};
use crate::query::limit::index_limit;
use crate::query::metadata::TransactionContext;
use crate::query::normalize::{constraints_to_normal_form, Constraint};
use crate::query::order::OrderList;
use crate::query::physical::{CompiledQuery, JointIndexQuery, PlanEnvelope};
use crate::query::serializer::{IndexKeyTuple, IndexSerializer};
use crate::query::PredicateKind;
use crate::schema::{Cardinality, ElementCategory, IndexDescriptor, IndexKind};
use crate::types::{IndexId, Result};

/// Score of a covered equality literal.
pub const EQUAL_CONDITION_SCORE: f64 = 4.0;
/// Score of any other covered clause.
pub const OTHER_CONDITION_SCORE: f64 = 1.0;
/// Bonus for an index that can return results in the requested order.
pub const ORDER_MATCH: f64 = 2.0;
/// Damping applied to clauses an earlier pick already covers.
pub const ALREADY_MATCHED_ADJUSTOR: f64 = 0.1;
/// Per-clause bonus for composite indexes with unique (single) entries.
pub const CARDINALITY_SINGLE_SCORE: f64 = 1000.0;
/// Per-clause bonus for composite indexes with list or set entries.
pub const CARDINALITY_OTHER_SCORE: f64 = 990.0;

/// Compiles builder state into index plans against one transaction.
pub struct Planner<'a> {
    tx: &'a dyn TransactionContext,
    serializer: &'a dyn IndexSerializer,
}

/// What a selected index answers: exact-match tuples or a subcondition.
#[derive(Clone, Debug)]
enum Subcondition {
    Composite(Vec<IndexKeyTuple>),
    Mixed(Vec<ClauseId>),
}

#[derive(Clone, Debug)]
struct Candidate {
    index: Arc<IndexDescriptor>,
    score: f64,
    subcover: BTreeSet<ClauseId>,
    subcondition: Subcondition,
    supports_sort: bool,
}

impl<'a> Planner<'a> {
    /// Creates a planner bound to a transaction and an index serializer.
    pub fn new(tx: &'a dyn TransactionContext, serializer: &'a dyn IndexSerializer) -> Self {
        Self { tx, serializer }
    }

    /// Builds the compiled query for `category`.
    ///
    /// A zero limit or an unsatisfiable constraint set yields the empty query without
    /// consulting index metadata.
    pub fn construct_query(
        &self,
        constraints: &[Constraint],
        orders: &OrderList,
        limit: Option<usize>,
        category: ElementCategory,
    ) -> Result<CompiledQuery> {
        let schema = self.tx.schema();
        let Some(conditions) = constraints_to_normal_form(schema, constraints, limit)? else {
            debug!(category = category.as_str(), "query is empty");
            return Ok(CompiledQuery::empty(category));
        };
        let candidates = collect_index_candidates(schema, &conditions, category)?;
        let plan = self.select_indexes(&conditions, orders, &candidates, limit)?;
        Ok(CompiledQuery::new(
            category,
            conditions,
            orders.clone(),
            plan,
            limit,
        ))
    }

    fn select_indexes(
        &self,
        conditions: &ConditionTree,
        orders: &OrderList,
        candidates: &BTreeMap<IndexId, Arc<IndexDescriptor>>,
        limit: Option<usize>,
    ) -> Result<PlanEnvelope> {
        debug_assert!(conditions.is_normal_form(), "condition must be normalized: {conditions}");
        let mut joint = JointIndexQuery::default();
        let mut is_sorted = orders.is_empty();
        let mut covered: BTreeSet<ClauseId> = BTreeSet::new();

        loop {
            let mut best: Option<Candidate> = None;
            for index in candidates.values() {
                let Some(candidate) = self.evaluate(index, conditions, orders, &covered) else {
                    continue;
                };
                let adds_clause = candidate.subcover.iter().any(|c| !covered.contains(c));
                trace!(
                    index = %index.name,
                    score = candidate.score,
                    adds_clause,
                    "scored index candidate"
                );
                let better = best
                    .as_ref()
                    .map_or(true, |current| candidate.score > current.score);
                if adds_clause && better {
                    best = Some(candidate);
                }
            }
            let Some(winner) = best else {
                break;
            };

            if covered.is_empty() {
                is_sorted = winner.supports_sort;
            }
            covered.extend(winner.subcover.iter().copied());
            debug!(
                index = %winner.index.name,
                kind = winner.index.kind_name(),
                score = winner.score,
                covered = covered.len(),
                "index chosen for query"
            );
            let query = match &winner.subcondition {
                Subcondition::Composite(tuples) => {
                    self.serializer.composite_query(&winner.index, tuples)?
                }
                Subcondition::Mixed(clauses) => {
                    let subcondition = conditions.project(clauses);
                    self.serializer
                        .mixed_query(&winner.index, &subcondition, orders)?
                }
            };
            joint.push(winner.index, query);
        }

        if covered.is_empty() {
            return Ok(PlanEnvelope {
                joint: JointIndexQuery::default(),
                fully_covered: false,
                is_sorted,
            });
        }
        let fetch_limit = index_limit(
            self.tx.config(),
            limit,
            covered.len(),
            self.tx.uncommitted_modifications(),
        );
        debug!(limit = fetch_limit, sub_queries = joint.len(), "computed index limit");
        joint.set_limit(fetch_limit);
        Ok(PlanEnvelope {
            joint,
            fully_covered: covered.len() == conditions.num_clauses(),
            is_sorted,
        })
    }

    /// Covers and scores one index against the current coverage.
    fn evaluate(
        &self,
        index: &Arc<IndexDescriptor>,
        conditions: &ConditionTree,
        orders: &OrderList,
        covered: &BTreeSet<ClauseId>,
    ) -> Option<Candidate> {
        let mut subcover = BTreeSet::new();
        match check_type_constraint(index, conditions) {
            TypeConstraint::Inapplicable => return None,
            TypeConstraint::Satisfied(clause) => {
                subcover.insert(clause);
            }
            TypeConstraint::Unconstrained => {}
        }

        let mut supports_sort = orders.is_empty();
        let subcondition = match &index.kind {
            IndexKind::Composite { .. } => {
                let cover = composite_cover(index, conditions)?;
                subcover.extend(cover.covered);
                Subcondition::Composite(cover.tuples)
            }
            IndexKind::Mixed { .. } => {
                if covered.is_empty() && !supports_sort && index_covers_order(index, orders) {
                    supports_sort = true;
                }
                let clauses = mixed_cover(index, conditions, self.serializer)?;
                subcover.extend(clauses.iter().copied());
                Subcondition::Mixed(clauses)
            }
        };

        let cardinality_bonus = match &index.kind {
            IndexKind::Composite {
                cardinality: Cardinality::Single,
                ..
            } => CARDINALITY_SINGLE_SCORE,
            IndexKind::Composite { .. } => CARDINALITY_OTHER_SCORE,
            IndexKind::Mixed { .. } => 0.0,
        };
        let mut score = 0.0;
        for &clause in &subcover {
            let is_equality = conditions
                .literal(clause)
                .is_some_and(|atom| atom.predicate == PredicateKind::Equal);
            let mut clause_score = if is_equality {
                EQUAL_CONDITION_SCORE
            } else {
                OTHER_CONDITION_SCORE
            };
            if covered.contains(&clause) {
                clause_score *= ALREADY_MATCHED_ADJUSTOR;
            }
            score += clause_score + cardinality_bonus;
        }
        if supports_sort {
            score += ORDER_MATCH;
        }

        Some(Candidate {
            index: Arc::clone(index),
            score,
            subcover,
            subcondition,
            supports_sort,
        })
    }
}

/// Convenience wrapper around [`Planner::construct_query`].
pub fn construct_query(
    tx: &dyn TransactionContext,
    serializer: &dyn IndexSerializer,
    constraints: &[Constraint],
    orders: &OrderList,
    limit: Option<usize>,
    category: ElementCategory,
) -> Result<CompiledQuery> {
    Planner::new(tx, serializer).construct_query(constraints, orders, limit, category)
}
