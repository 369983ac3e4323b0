//! Index selection for graph-centric property queries.
//!
//! Given a set of property constraints, an optional order and limit, the planner decides
//! which composite (exact-match) and mixed (search) indexes to consult and produces a
//! [`query::CompiledQuery`] that a storage executor can run.

#![warn(missing_docs)]

pub mod config;
pub mod query;
pub mod schema;
pub mod types;

pub use config::{ConfigError, PlannerConfig};
pub use types::{Result, SombraError};
