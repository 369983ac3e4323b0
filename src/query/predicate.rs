//! Predicate operators accepted in constraints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::Value;
use crate::schema::DataType;

/// Operator applied between a key and its operand.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PredicateKind {
    /// `key = value`; with no operand it means "key is absent".
    Equal,
    /// `key != value`; with no operand it means "key is present".
    NotEqual,
    /// `key < value`.
    LessThan,
    /// `key <= value`.
    LessThanEqual,
    /// `key > value`.
    GreaterThan,
    /// `key >= value`.
    GreaterThanEqual,
    /// Operand is a list; rewritten to equalities during normalization.
    In,
    /// Operand is a list; rewritten to inequalities during normalization.
    NotIn,
    /// Full-text token containment, answered by mixed indexes only.
    TextContains,
    /// String prefix match, answered by mixed indexes only.
    TextPrefix,
    /// Regular-expression match, answered by mixed indexes only.
    TextRegex,
}

impl PredicateKind {
    /// Whether `value` is an acceptable operand for this operator.
    pub fn is_valid_condition(self, value: Option<&Value>) -> bool {
        match self {
            PredicateKind::Equal | PredicateKind::NotEqual => {
                !matches!(value, Some(Value::List(_)))
            }
            PredicateKind::LessThan
            | PredicateKind::LessThanEqual
            | PredicateKind::GreaterThan
            | PredicateKind::GreaterThanEqual => value.is_some_and(Value::is_comparable),
            PredicateKind::In | PredicateKind::NotIn => matches!(value, Some(Value::List(_))),
            PredicateKind::TextContains | PredicateKind::TextPrefix | PredicateKind::TextRegex => {
                matches!(value, Some(Value::String(_)))
            }
        }
    }

    /// Whether keys of `data_type` can be constrained with this operator.
    pub fn is_valid_value_type(self, data_type: DataType) -> bool {
        match self {
            PredicateKind::Equal
            | PredicateKind::NotEqual
            | PredicateKind::In
            | PredicateKind::NotIn => true,
            PredicateKind::LessThan
            | PredicateKind::LessThanEqual
            | PredicateKind::GreaterThan
            | PredicateKind::GreaterThanEqual => {
                data_type.is_comparable() || data_type == DataType::Any
            }
            PredicateKind::TextContains | PredicateKind::TextPrefix | PredicateKind::TextRegex => {
                matches!(data_type, DataType::String | DataType::Any)
            }
        }
    }

    /// Whether this is [`PredicateKind::Equal`].
    pub fn is_equality(self) -> bool {
        self == PredicateKind::Equal
    }

    /// Operator symbol used in explain output and condition rendering.
    pub fn symbol(self) -> &'static str {
        match self {
            PredicateKind::Equal => "=",
            PredicateKind::NotEqual => "!=",
            PredicateKind::LessThan => "<",
            PredicateKind::LessThanEqual => "<=",
            PredicateKind::GreaterThan => ">",
            PredicateKind::GreaterThanEqual => ">=",
            PredicateKind::In => "IN",
            PredicateKind::NotIn => "NOT IN",
            PredicateKind::TextContains => "CONTAINS",
            PredicateKind::TextPrefix => "PREFIX",
            PredicateKind::TextRegex => "REGEX",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
