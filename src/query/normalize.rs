//! Rewrites builder constraints into a normalized condition tree.
//!
//! The result is a conjunction whose clauses are literals or disjunctions of equality
//! literals on a single key (the expansion of `key IN [..]`). Membership predicates never
//! survive normalization.

use crate::query::condition::{ConditionTree, PredicateCondition};
use crate::query::metadata::SchemaProvider;
use crate::query::{PredicateKind, Value};
use crate::schema::RelationType;
use crate::types::{Result, SombraError};

/// A constraint as registered on the builder, before its key is resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Key name as given by the caller.
    pub key: String,
    /// Comparison operator.
    pub predicate: PredicateKind,
    /// Operand; `None` for existence checks.
    pub value: Option<Value>,
}

impl Constraint {
    /// Validates the key and operand eagerly so bad input fails at registration time.
    pub fn new(
        key: impl Into<String>,
        predicate: PredicateKind,
        value: Option<Value>,
    ) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(SombraError::Invalid("constraint key must not be empty"));
        }
        if !predicate.is_valid_condition(value.as_ref()) {
            return Err(SombraError::InvalidOwned(match &value {
                Some(value) => format!("invalid condition: {key} {predicate} {value}"),
                None => format!("invalid condition: {key} {predicate} null"),
            }));
        }
        Ok(Self {
            key,
            predicate,
            value,
        })
    }
}

/// Normalizes `constraints` into a conjunctive condition tree.
///
/// Returns `Ok(None)` when the query can produce no rows: a zero `limit`, or a constraint
/// set that is unsatisfiable (an empty `IN` list, or a value constraint on a key the
/// schema does not know). The zero-limit check happens before any schema lookup.
pub fn constraints_to_normal_form(
    schema: &dyn SchemaProvider,
    constraints: &[Constraint],
    limit: Option<usize>,
) -> Result<Option<ConditionTree>> {
    if limit == Some(0) {
        return Ok(None);
    }
    let mut tree = ConditionTree::new();
    for atom in constraints {
        let Some(ty) = schema.resolve_key(&atom.key)? else {
            let trivially_true = match (atom.predicate, &atom.value) {
                (PredicateKind::Equal, None) => true,
                (PredicateKind::NotEqual, Some(_)) => true,
                _ => false,
            };
            if trivially_true {
                continue;
            }
            return Ok(None);
        };
        check_value_type(&ty, atom)?;

        match atom.predicate {
            PredicateKind::In => {
                let values = operand_list(atom)?;
                let mut disjuncts: Vec<PredicateCondition> = Vec::with_capacity(values.len());
                for value in values {
                    let literal = PredicateCondition::new(
                        ty.clone(),
                        PredicateKind::Equal,
                        Some(value.clone()),
                    );
                    if !disjuncts.contains(&literal) {
                        disjuncts.push(literal);
                    }
                }
                match disjuncts.len() {
                    0 => return Ok(None),
                    1 => {
                        if let Some(literal) = disjuncts.pop() {
                            add_top_level(&mut tree, literal);
                        }
                    }
                    _ => {
                        let children = disjuncts
                            .into_iter()
                            .map(|literal| tree.new_literal(literal))
                            .collect();
                        let or = tree.new_or(children);
                        tree.add_clause(or);
                    }
                }
            }
            PredicateKind::NotIn => {
                for value in operand_list(atom)? {
                    add_top_level(
                        &mut tree,
                        PredicateCondition::new(
                            ty.clone(),
                            PredicateKind::NotEqual,
                            Some(value.clone()),
                        ),
                    );
                }
            }
            predicate => {
                add_top_level(
                    &mut tree,
                    PredicateCondition::new(ty.clone(), predicate, atom.value.clone()),
                );
            }
        }
    }
    Ok(Some(tree))
}

fn add_top_level(tree: &mut ConditionTree, literal: PredicateCondition) {
    let duplicate = tree
        .clauses()
        .iter()
        .any(|&clause| tree.literal(clause) == Some(&literal));
    if !duplicate {
        tree.add_literal(literal);
    }
}

fn operand_list(atom: &Constraint) -> Result<&[Value]> {
    atom.value
        .as_ref()
        .and_then(Value::as_list)
        .ok_or(SombraError::Invalid("membership predicate requires a list operand"))
}

fn check_value_type(ty: &RelationType, atom: &Constraint) -> Result<()> {
    let RelationType::Property(key) = ty else {
        return Ok(());
    };
    if !atom.predicate.is_valid_value_type(key.data_type) {
        return Err(SombraError::InvalidOwned(format!(
            "data type {:?} of key '{}' is not compatible with {}",
            key.data_type, key.name, atom.predicate
        )));
    }
    let values: &[Value] = match &atom.value {
        Some(Value::List(values)) => values,
        Some(value) => std::slice::from_ref(value),
        None => &[],
    };
    for value in values {
        if !key.data_type.accepts(value) {
            return Err(SombraError::InvalidOwned(format!(
                "value {value} does not match data type {:?} of key '{}'",
                key.data_type, key.name
            )));
        }
    }
    Ok(())
}
