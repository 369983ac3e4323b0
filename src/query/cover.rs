//! Decides which top-level clauses of a normalized condition an index can answer.

use std::collections::BTreeSet;

use tracing::warn;

use crate::query::condition::{ClauseId, Condition, ConditionTree};
use crate::query::order::OrderList;
use crate::query::serializer::{IndexKeyTuple, IndexSerializer};
use crate::query::Value;
use crate::schema::{IndexDescriptor, IndexKind, SchemaStatus, LABEL_KEY_ID};

/// Outcome of checking an index's schema-type constraint against the query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeConstraint {
    /// The index applies to every label.
    Unconstrained,
    /// The query pins the required label through this clause.
    Satisfied(ClauseId),
    /// The index cannot be used for this query.
    Inapplicable,
}

/// Matches the index's required label against the label equality of the query.
pub fn check_type_constraint(index: &IndexDescriptor, conditions: &ConditionTree) -> TypeConstraint {
    let Some(required) = index.schema_type_constraint.as_deref() else {
        return TypeConstraint::Unconstrained;
    };
    let Some((clause, labels)) = conditions.equality_values(LABEL_KEY_ID) else {
        return TypeConstraint::Inapplicable;
    };
    if labels.len() > 1 {
        warn!(
            index = %index.name,
            labels = labels.len(),
            "multiple label constraints are not supported by the index selector"
        );
        return TypeConstraint::Inapplicable;
    }
    match labels.first() {
        Some(Value::String(label)) if label == required => TypeConstraint::Satisfied(clause),
        _ => TypeConstraint::Inapplicable,
    }
}

/// Exact-match lookups a composite index can answer, and the clauses they consume.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeCover {
    /// One full field-value tuple per lookup, in field order.
    pub tuples: Vec<IndexKeyTuple>,
    /// Top-level clauses the lookups answer.
    pub covered: BTreeSet<ClauseId>,
}

/// Covers a composite index by pinning every field with a top-level equality clause and
/// enumerating the cross product of their value sets.
///
/// Returns `None` when the index (or any of its fields) is not enabled, or when some
/// field has no equality clause.
pub fn composite_cover(index: &IndexDescriptor, conditions: &ConditionTree) -> Option<CompositeCover> {
    let IndexKind::Composite { status, .. } = &index.kind else {
        return None;
    };
    if *status != SchemaStatus::Enabled
        || index.fields.is_empty()
        || !index.fields.iter().all(|field| field.is_enabled())
    {
        return None;
    }

    let mut covered = BTreeSet::new();
    let mut value_sets = Vec::with_capacity(index.fields.len());
    for field in &index.fields {
        let (clause, values) = conditions.equality_values(field.key.id)?;
        covered.insert(clause);
        value_sets.push(values);
    }

    let mut tuples = Vec::with_capacity(4);
    let mut current = IndexKeyTuple::with_capacity(value_sets.len());
    enumerate_tuples(&value_sets, &mut current, &mut tuples);
    if tuples.is_empty() {
        return None;
    }
    Some(CompositeCover { tuples, covered })
}

fn enumerate_tuples(
    value_sets: &[Vec<&Value>],
    current: &mut IndexKeyTuple,
    out: &mut Vec<IndexKeyTuple>,
) {
    let position = current.len();
    let Some(values) = value_sets.get(position) else {
        out.push(current.clone());
        return;
    };
    for value in values {
        current.push((*value).clone());
        enumerate_tuples(value_sets, current, out);
        current.pop();
    }
}

/// Top-level clauses a mixed index can evaluate in full, in clause order.
///
/// Compound clauses are covered all-or-nothing: every literal underneath must be
/// answerable by the index.
pub fn mixed_cover(
    index: &IndexDescriptor,
    conditions: &ConditionTree,
    serializer: &dyn IndexSerializer,
) -> Option<Vec<ClauseId>> {
    if !matches!(index.kind, IndexKind::Mixed { .. }) {
        return None;
    }
    let covered: Vec<ClauseId> = conditions
        .clauses()
        .iter()
        .copied()
        .filter(|&clause| covers_all(index, conditions, clause, serializer))
        .collect();
    if covered.is_empty() {
        None
    } else {
        Some(covered)
    }
}

fn covers_all(
    index: &IndexDescriptor,
    conditions: &ConditionTree,
    clause: ClauseId,
    serializer: &dyn IndexSerializer,
) -> bool {
    match conditions.get(clause) {
        Condition::Literal(atom) => {
            if atom.value.is_none() {
                return false;
            }
            let Some(key) = atom.key.as_property_key() else {
                return false;
            };
            match index.enabled_field(key.id) {
                Some(field) => serializer.supports(index, field, atom.predicate),
                None => false,
            }
        }
        Condition::And(children) | Condition::Or(children) => children
            .iter()
            .all(|&child| covers_all(index, conditions, child, serializer)),
        Condition::Not(child) => covers_all(index, conditions, *child, serializer),
    }
}

/// Whether every order key is an enabled field of the mixed index.
pub fn index_covers_order(index: &IndexDescriptor, orders: &OrderList) -> bool {
    orders.keys().all(|key| index.indexes_key(key.id))
}
