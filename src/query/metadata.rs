//! Schema and transaction collaborators consumed by the planner.
//!
//! The planner resolves constraint keys by name and looks up the indexes attached to
//! each property key. Both lookups go through [`SchemaProvider`]; the transaction the
//! query runs in exposes it together with the planner configuration and the amount of
//! uncommitted write activity through [`TransactionContext`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::PlannerConfig;
use crate::schema::{IndexDescriptor, PropertyKey, RelationType, LABEL_KEY_NAME};
use crate::types::{IndexId, KeyId, Result, SombraError};

/// Provides key resolution and index associations for planner consumers.
pub trait SchemaProvider {
    /// Resolves a key name; `Ok(None)` when the schema does not know it.
    fn resolve_key(&self, name: &str) -> Result<Option<RelationType>>;
    /// Indexes that include `key` among their fields, regardless of element category.
    fn key_indexes(&self, key: KeyId) -> Result<Vec<Arc<IndexDescriptor>>>;
}

/// View of the enclosing transaction used while compiling one query.
pub trait TransactionContext {
    /// Schema registry visible to the transaction.
    fn schema(&self) -> &dyn SchemaProvider;
    /// Planner configuration of the owning graph.
    fn config(&self) -> &PlannerConfig;
    /// Number of uncommitted element modifications held by the transaction.
    fn uncommitted_modifications(&self) -> usize;

    /// Whether `name` resolves to a property key.
    fn contains_property_key(&self, name: &str) -> Result<bool> {
        Ok(self
            .schema()
            .resolve_key(name)?
            .is_some_and(|ty| ty.is_property_key()))
    }

    /// Resolves `name` to a property key or fails.
    fn property_key(&self, name: &str) -> Result<PropertyKey> {
        match self.schema().resolve_key(name)? {
            Some(RelationType::Property(key)) => Ok(key),
            Some(RelationType::EdgeLabel { .. }) => Err(SombraError::InvalidOwned(format!(
                "key '{name}' is an edge label, not a property key"
            ))),
            None => Err(SombraError::NotFound(format!("property key '{name}'"))),
        }
    }
}

/// Simple in-memory schema registry used for tests or embedding.
pub struct InMemorySchema {
    keys: HashMap<String, RelationType>,
    indexes: BTreeMap<IndexId, Arc<IndexDescriptor>>,
    key_indexes: HashMap<KeyId, Vec<IndexId>>,
}

impl Default for InMemorySchema {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySchema {
    /// Creates a registry that only knows the implicit label key.
    pub fn new() -> Self {
        let mut keys = HashMap::new();
        keys.insert(
            LABEL_KEY_NAME.to_owned(),
            RelationType::Property(PropertyKey::label()),
        );
        Self {
            keys,
            indexes: BTreeMap::new(),
            key_indexes: HashMap::new(),
        }
    }

    /// Registers a property key.
    pub fn with_property(mut self, key: PropertyKey) -> Self {
        self.keys
            .insert(key.name.clone(), RelationType::Property(key));
        self
    }

    /// Registers an edge label.
    pub fn with_edge_label(mut self, name: impl Into<String>, id: KeyId) -> Self {
        let name = name.into();
        self.keys
            .insert(name.clone(), RelationType::EdgeLabel { id, name });
        self
    }

    /// Registers an index and associates it with every key it lists as a field.
    pub fn with_index(mut self, index: IndexDescriptor) -> Self {
        let id = index.id;
        for field in &index.fields {
            let entry = self.key_indexes.entry(field.key.id).or_default();
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
        self.indexes.insert(id, Arc::new(index));
        self
    }
}

impl SchemaProvider for InMemorySchema {
    fn resolve_key(&self, name: &str) -> Result<Option<RelationType>> {
        Ok(self.keys.get(name).cloned())
    }

    fn key_indexes(&self, key: KeyId) -> Result<Vec<Arc<IndexDescriptor>>> {
        let Some(ids) = self.key_indexes.get(&key) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| self.indexes.get(id).cloned())
            .collect())
    }
}

/// Transaction context over a fixed schema snapshot.
pub struct TxSnapshot {
    schema: Arc<dyn SchemaProvider>,
    config: PlannerConfig,
    modifications: usize,
}

impl TxSnapshot {
    /// Creates a clean (unmodified) transaction view.
    pub fn new(schema: Arc<dyn SchemaProvider>, config: PlannerConfig) -> Self {
        Self {
            schema,
            config,
            modifications: 0,
        }
    }

    /// Records the number of uncommitted modifications held by the transaction.
    pub fn with_modifications(mut self, modifications: usize) -> Self {
        self.modifications = modifications;
        self
    }
}

impl TransactionContext for TxSnapshot {
    fn schema(&self) -> &dyn SchemaProvider {
        self.schema.as_ref()
    }

    fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn uncommitted_modifications(&self) -> usize {
        self.modifications
    }
}
