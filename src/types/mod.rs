//! Identifiers and the crate-wide error type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Identifier of a vertex returned by the executor.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u64);
/// Identifier of an edge returned by the executor.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct EdgeId(pub u64);
/// Identifier of a relation type (property key or edge label) in the schema registry.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct KeyId(pub u32);
/// Identifier of a secondary index in the schema registry.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct IndexId(pub u32);

/// Errors surfaced by the planner and its collaborators.
#[derive(thiserror::Error, Debug)]
pub enum SombraError {
    /// Caller supplied an argument the planner cannot accept.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Invalid argument with a formatted message.
    #[error("invalid argument: {0}")]
    InvalidOwned(String),
    /// A schema name could not be resolved.
    #[error("not found: {0}")]
    NotFound(String),
    /// A collaborator (schema registry, serializer, executor) failed.
    #[error("backend: {0}")]
    Backend(String),
    /// Planner configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SombraError>;

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for KeyId {
    fn from(value: u32) -> Self {
        KeyId(value)
    }
}

impl From<KeyId> for u32 {
    fn from(value: KeyId) -> Self {
        value.0
    }
}

impl From<u32> for IndexId {
    fn from(value: u32) -> Self {
        IndexId(value)
    }
}

impl From<IndexId> for u32 {
    fn from(value: IndexId) -> Self {
        value.0
    }
}
