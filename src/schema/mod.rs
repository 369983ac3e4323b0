//! Schema vocabulary consumed by the planner: keys, data types, element categories and
//! index descriptors. The planner only reads these; ownership stays with the registry.

mod index;

pub use index::{IndexDescriptor, IndexField, IndexKind};

use serde::{Deserialize, Serialize};

use crate::query::Value;
use crate::types::KeyId;

/// Name of the implicit key that carries vertex and edge labels.
pub const LABEL_KEY_NAME: &str = "~label";
/// Identifier reserved for the implicit label key.
pub const LABEL_KEY_ID: KeyId = KeyId(0);

/// Logical data type of a property key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// `true` / `false`, ordered with `false` first.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// UTF-8 text.
    String,
    /// Opaque binary payload; not ordered.
    Bytes,
    /// UTC timestamp.
    DateTime,
    /// Untyped key that accepts any scalar value.
    Any,
}

impl DataType {
    /// Whether values of this type have a total order usable for sorting and ranges.
    pub fn is_comparable(self) -> bool {
        matches!(
            self,
            DataType::Bool
                | DataType::Int
                | DataType::Float
                | DataType::String
                | DataType::DateTime
        )
    }

    /// Whether `value` may be stored under a key of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::List(_)) => false,
            (DataType::Any, _) => true,
            (DataType::Bool, Value::Bool(_)) => true,
            (DataType::Int, Value::Int(_)) => true,
            (DataType::Float, Value::Float(_) | Value::Int(_)) => true,
            (DataType::String, Value::String(_)) => true,
            (DataType::Bytes, Value::Bytes(_)) => true,
            (DataType::DateTime, Value::DateTime(_)) => true,
            _ => false,
        }
    }
}

/// How many values a key (or a composite index entry) may hold per element.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// At most one value.
    Single,
    /// Any number of values, duplicates allowed.
    List,
    /// Any number of distinct values.
    Set,
}

/// Kind of graph element a query targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ElementCategory {
    /// Graph vertices.
    Vertex,
    /// Graph edges.
    Edge,
    /// Vertex property instances.
    Property,
}

impl ElementCategory {
    /// Lowercase name used in explain output.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementCategory::Vertex => "vertex",
            ElementCategory::Edge => "edge",
            ElementCategory::Property => "property",
        }
    }
}

/// Lifecycle state of an index or of one of its fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SchemaStatus {
    /// Defined but not yet known to every instance.
    Installed,
    /// Known everywhere; still being populated.
    Registered,
    /// Usable for queries.
    Enabled,
    /// Retired.
    Disabled,
}

/// A property key as known to the schema registry.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PropertyKey {
    /// Registry identifier.
    pub id: KeyId,
    /// Registry name.
    pub name: String,
    /// Type every value of the key must have.
    pub data_type: DataType,
    /// Values per element.
    pub cardinality: Cardinality,
}

impl PropertyKey {
    /// Creates a single-valued key.
    pub fn new(id: KeyId, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            cardinality: Cardinality::Single,
        }
    }

    /// Overrides the key cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// The implicit label key used by schema-type constrained indexes.
    pub fn label() -> Self {
        Self::new(LABEL_KEY_ID, LABEL_KEY_NAME, DataType::String)
    }
}

/// Anything a constraint key may resolve to.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum RelationType {
    /// A property key.
    Property(PropertyKey),
    /// An edge label, which can never be constrained or ordered on.
    EdgeLabel {
        /// Registry identifier.
        id: KeyId,
        /// Registry name.
        name: String,
    },
}

impl RelationType {
    /// Registry identifier of the relation type.
    pub fn id(&self) -> KeyId {
        match self {
            RelationType::Property(key) => key.id,
            RelationType::EdgeLabel { id, .. } => *id,
        }
    }

    /// Registry name of the relation type.
    pub fn name(&self) -> &str {
        match self {
            RelationType::Property(key) => &key.name,
            RelationType::EdgeLabel { name, .. } => name,
        }
    }

    /// Returns the property key when this is one.
    pub fn as_property_key(&self) -> Option<&PropertyKey> {
        match self {
            RelationType::Property(key) => Some(key),
            RelationType::EdgeLabel { .. } => None,
        }
    }

    /// Whether this is a property key.
    pub fn is_property_key(&self) -> bool {
        matches!(self, RelationType::Property(_))
    }
}
