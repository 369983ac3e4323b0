//! Translation of index covers into backend sub-queries.

use std::collections::HashSet;
use std::fmt;

use smallvec::SmallVec;

use crate::query::condition::ConditionTree;
use crate::query::order::{Order, OrderList};
use crate::query::{PredicateKind, Value};
use crate::schema::{IndexDescriptor, IndexField, IndexKind};
use crate::types::{Result, SombraError};

/// One exact-match lookup key for a composite index, in field order.
pub type IndexKeyTuple = SmallVec<[Value; 4]>;

/// Backend request produced for one selected index. The planner never inspects it.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendQuery {
    /// Point lookups against a composite index store, one encoded key per tuple.
    KeyLookup {
        /// Composite index store.
        store: String,
        /// Encoded lookup keys.
        keys: Vec<Vec<u8>>,
    },
    /// Search request against the store backing a mixed index.
    Search {
        /// `backing_index/index_name` of the search store.
        store: String,
        /// Rendered subcondition.
        query: String,
        /// Requested sort as `(key name, direction)` pairs.
        orders: Vec<(String, Order)>,
    },
}

impl fmt::Display for BackendQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendQuery::KeyLookup { store, keys } => {
                write!(f, "{store}: {} key(s)", keys.len())
            }
            BackendQuery::Search {
                store,
                query,
                orders,
            } => {
                write!(f, "{store}: {query}")?;
                if !orders.is_empty() {
                    f.write_str(" ORDER BY ")?;
                    for (idx, (key, order)) in orders.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{key} {order}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Builds backend sub-queries and reports mixed-index predicate support.
pub trait IndexSerializer {
    /// Sub-query for a composite index answering the given exact-match tuples.
    fn composite_query(
        &self,
        index: &IndexDescriptor,
        tuples: &[IndexKeyTuple],
    ) -> Result<BackendQuery>;

    /// Sub-query for a mixed index answering `condition`, sorted by `orders` when possible.
    fn mixed_query(
        &self,
        index: &IndexDescriptor,
        condition: &ConditionTree,
        orders: &OrderList,
    ) -> Result<BackendQuery>;

    /// Whether the mixed index can evaluate `predicate` on `field`.
    fn supports(&self, index: &IndexDescriptor, field: &IndexField, predicate: PredicateKind)
        -> bool;
}

/// Default serializer: order-preserving byte keys for composite stores and textual
/// search requests for mixed stores.
#[derive(Clone, Debug, Default)]
pub struct StandardIndexSerializer {
    unsupported: HashSet<(String, PredicateKind)>,
}

impl StandardIndexSerializer {
    /// Serializer supporting every predicate valid for a field's data type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `predicate` as unavailable on the search store `backing_index`.
    pub fn without_predicate(
        mut self,
        backing_index: impl Into<String>,
        predicate: PredicateKind,
    ) -> Self {
        self.unsupported.insert((backing_index.into(), predicate));
        self
    }
}

impl IndexSerializer for StandardIndexSerializer {
    fn composite_query(
        &self,
        index: &IndexDescriptor,
        tuples: &[IndexKeyTuple],
    ) -> Result<BackendQuery> {
        if !index.is_composite() {
            return Err(SombraError::Backend(format!(
                "index '{}' is not a composite index",
                index.name
            )));
        }
        let keys = tuples
            .iter()
            .map(|tuple| {
                let mut key = Vec::with_capacity(4 + tuple.len() * 9);
                key.extend_from_slice(&index.id.0.to_be_bytes());
                for value in tuple {
                    encode_key_value(value, &mut key)?;
                }
                Ok(key)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BackendQuery::KeyLookup {
            store: index.name.clone(),
            keys,
        })
    }

    fn mixed_query(
        &self,
        index: &IndexDescriptor,
        condition: &ConditionTree,
        orders: &OrderList,
    ) -> Result<BackendQuery> {
        let IndexKind::Mixed { backing_index } = &index.kind else {
            return Err(SombraError::Backend(format!(
                "index '{}' is not a mixed index",
                index.name
            )));
        };
        Ok(BackendQuery::Search {
            store: format!("{backing_index}/{}", index.name),
            query: condition.to_string(),
            orders: orders
                .entries()
                .iter()
                .map(|entry| (entry.key.name.clone(), entry.order))
                .collect(),
        })
    }

    fn supports(
        &self,
        index: &IndexDescriptor,
        field: &IndexField,
        predicate: PredicateKind,
    ) -> bool {
        let IndexKind::Mixed { backing_index } = &index.kind else {
            return false;
        };
        if matches!(predicate, PredicateKind::In | PredicateKind::NotIn) {
            return false;
        }
        if self
            .unsupported
            .contains(&(backing_index.clone(), predicate))
        {
            return false;
        }
        predicate.is_valid_value_type(field.key.data_type)
    }
}

/// Appends an order-preserving encoding of `value` to `out`.
fn encode_key_value(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Bool(v) => {
            out.push(0x01);
            out.push(u8::from(*v));
        }
        Value::Int(v) => {
            out.push(0x02);
            out.extend_from_slice(&((*v as u64) ^ (1 << 63)).to_be_bytes());
        }
        Value::Float(v) => {
            out.push(0x03);
            let bits = v.to_bits();
            let ordered = if bits >> 63 == 1 { !bits } else { bits ^ (1 << 63) };
            out.extend_from_slice(&ordered.to_be_bytes());
        }
        Value::String(v) => {
            out.push(0x04);
            escape_bytes(v.as_bytes(), out);
        }
        Value::Bytes(v) => {
            out.push(0x05);
            escape_bytes(v, out);
        }
        Value::DateTime(v) => {
            out.push(0x06);
            out.extend_from_slice(&((*v as u64) ^ (1 << 63)).to_be_bytes());
        }
        Value::List(_) => {
            return Err(SombraError::Invalid(
                "composite index keys cannot contain list values",
            ))
        }
    }
    Ok(())
}

fn escape_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    for &b in bytes {
        out.push(b);
        if b == 0 {
            out.push(0xFF);
        }
    }
    out.extend_from_slice(&[0x00, 0x00]);
}
