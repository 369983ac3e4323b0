//! Result ordering requested by a query.
//!
//! Keys are collected in an [`OrderListBuilder`] while the query is being assembled and
//! frozen into an [`OrderList`] before planning. The frozen list has no mutators.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::schema::{Cardinality, PropertyKey};
use crate::types::{KeyId, Result, SombraError};

/// Sort direction for one order key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        })
    }
}

/// One `(key, direction)` pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderEntry {
    /// Single-valued, comparable key.
    pub key: PropertyKey,
    /// Direction.
    pub order: Order,
}

/// Order keys collected before the query is compiled.
#[derive(Clone, Debug, Default)]
pub struct OrderListBuilder {
    entries: Vec<OrderEntry>,
}

impl OrderListBuilder {
    /// Starts with no order keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an order key after checking it can define a total order.
    pub fn add(&mut self, key: PropertyKey, order: Order) -> Result<()> {
        if !key.data_type.is_comparable() {
            return Err(SombraError::InvalidOwned(format!(
                "can only order on keys with comparable data type. [{}] has datatype [{:?}]",
                key.name, key.data_type
            )));
        }
        if key.cardinality != Cardinality::Single {
            return Err(SombraError::InvalidOwned(format!(
                "ordering is undefined on multi-valued key [{}]",
                key.name
            )));
        }
        if self.contains_key(key.id) {
            return Err(SombraError::InvalidOwned(format!(
                "order key [{}] already present",
                key.name
            )));
        }
        self.entries.push(OrderEntry { key, order });
        Ok(())
    }

    /// Whether `key` already orders the results.
    pub fn contains_key(&self, key: KeyId) -> bool {
        self.entries.iter().any(|entry| entry.key.id == key)
    }

    /// Number of order keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no order key was added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freezes the collected keys.
    pub fn freeze(self) -> OrderList {
        OrderList {
            entries: self.entries.into(),
        }
    }
}

/// Immutable list of order keys shared by compiled queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderList {
    entries: Arc<[OrderEntry]>,
}

impl Default for OrderList {
    fn default() -> Self {
        Self::no_order()
    }
}

impl OrderList {
    /// The empty order: results may come back in any order.
    pub fn no_order() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
        }
    }

    /// Entries in priority order.
    pub fn entries(&self) -> &[OrderEntry] {
        &self.entries
    }

    /// Order keys in priority order.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> + '_ {
        self.entries.iter().map(|entry| &entry.key)
    }

    /// Whether `key` orders the results.
    pub fn contains_key(&self, key: KeyId) -> bool {
        self.entries.iter().any(|entry| entry.key.id == key)
    }

    /// Number of order keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether results may come back in any order.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for OrderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", entry.key.name, entry.order)?;
        }
        Ok(())
    }
}
