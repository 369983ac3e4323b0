//! Secondary index descriptors and their per-field registration state.

use crate::schema::{Cardinality, ElementCategory, PropertyKey, SchemaStatus};
use crate::types::{IndexId, KeyId};

/// One indexed key together with its registration state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexField {
    /// Indexed key.
    pub key: PropertyKey,
    /// Registration state; only enabled fields are matched against queries.
    pub status: SchemaStatus,
}

impl IndexField {
    /// Field on `key` that is ready for queries.
    pub fn enabled(key: PropertyKey) -> Self {
        Self {
            key,
            status: SchemaStatus::Enabled,
        }
    }

    /// Whether the field may answer queries.
    pub fn is_enabled(&self) -> bool {
        self.status == SchemaStatus::Enabled
    }
}

/// Structural kind of a secondary index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IndexKind {
    /// Exact-match lookup keyed by the full tuple of field values.
    Composite {
        /// Lifecycle state of the whole index.
        status: SchemaStatus,
        /// How many entries an element may hold in the index.
        cardinality: Cardinality,
    },
    /// External search index answering per-field predicates independently.
    Mixed {
        /// Name of the backing search store.
        backing_index: String,
    },
}

/// Definition of a secondary index as registered in the schema.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexDescriptor {
    /// Registry identifier; lower ids win score ties.
    pub id: IndexId,
    /// Registry name, also used as the backend store name.
    pub name: String,
    /// Element category the index covers.
    pub element: ElementCategory,
    /// Indexed keys in declaration order.
    pub fields: Vec<IndexField>,
    /// Composite or mixed, with kind-specific settings.
    pub kind: IndexKind,
    /// Label the indexed elements must carry for the index to apply.
    pub schema_type_constraint: Option<String>,
}

impl IndexDescriptor {
    /// Creates an enabled, single-cardinality composite index over `keys` in order.
    pub fn composite(
        id: IndexId,
        name: impl Into<String>,
        element: ElementCategory,
        keys: impl IntoIterator<Item = PropertyKey>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            element,
            fields: keys.into_iter().map(IndexField::enabled).collect(),
            kind: IndexKind::Composite {
                status: SchemaStatus::Enabled,
                cardinality: Cardinality::Single,
            },
            schema_type_constraint: None,
        }
    }

    /// Creates a mixed index backed by `backing_index` with no fields yet.
    pub fn mixed(
        id: IndexId,
        name: impl Into<String>,
        element: ElementCategory,
        backing_index: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            element,
            fields: Vec::new(),
            kind: IndexKind::Mixed {
                backing_index: backing_index.into(),
            },
            schema_type_constraint: None,
        }
    }

    /// Appends an enabled field.
    pub fn with_field(self, key: PropertyKey) -> Self {
        self.with_field_status(key, SchemaStatus::Enabled)
    }

    /// Appends a field in the given state.
    pub fn with_field_status(mut self, key: PropertyKey, status: SchemaStatus) -> Self {
        self.fields.push(IndexField { key, status });
        self
    }

    /// Restricts the index to elements carrying `label`.
    pub fn with_type_constraint(mut self, label: impl Into<String>) -> Self {
        self.schema_type_constraint = Some(label.into());
        self
    }

    /// Overrides the status of a composite index. No-op for mixed indexes.
    pub fn with_status(mut self, new_status: SchemaStatus) -> Self {
        if let IndexKind::Composite { status, .. } = &mut self.kind {
            *status = new_status;
        }
        self
    }

    /// Overrides the entry cardinality of a composite index. No-op for mixed indexes.
    pub fn with_cardinality(mut self, new_cardinality: Cardinality) -> Self {
        if let IndexKind::Composite { cardinality, .. } = &mut self.kind {
            *cardinality = new_cardinality;
        }
        self
    }

    /// Whether this is an exact-match composite index.
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, IndexKind::Composite { .. })
    }

    /// Enabled field on `key`; the last registration wins when a key repeats.
    pub fn enabled_field(&self, key: KeyId) -> Option<&IndexField> {
        self.fields
            .iter()
            .rev()
            .find(|field| field.is_enabled() && field.key.id == key)
    }

    /// Whether `key` is an enabled field of this index.
    pub fn indexes_key(&self, key: KeyId) -> bool {
        self.enabled_field(key).is_some()
    }

    /// Short kind name used in logs and explain output.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            IndexKind::Composite { .. } => "composite",
            IndexKind::Mixed { .. } => "mixed",
        }
    }
}
