#![forbid(unsafe_code)]

//! Graph-centric query compilation.
//!
//! This module turns a flat list of property constraints into a plan of backend index
//! calls: constraints are normalized into a conjunctive condition tree, candidate
//! indexes are collected for the referenced keys, and a greedy selector picks the
//! indexes that cover the most clauses.

/// Fluent query builder with a type-level order freeze.
pub mod builder;

/// Index candidate discovery for a normalized condition.
pub mod candidates;

/// Arena-backed condition tree in conjunctive normal form.
pub mod condition;

/// Composite and mixed index cover matchers.
pub mod cover;

/// Execution seam and element-kind filtering.
pub mod executor;

/// Explain trees and plan hashing for compiled queries.
pub mod explain;

/// Per-index fetch limit calculation.
pub mod limit;

/// Schema and transaction collaborators.
///
/// Resolves keys and index associations required for planning.
pub mod metadata;

/// Constraint normalization into a condition tree.
pub mod normalize;

/// Result ordering.
pub mod order;

/// Physical index plans and compiled queries.
pub mod physical;

/// Greedy index selection.
pub mod planner;

/// Comparison and text predicates.
pub mod predicate;

/// Index sub-query serialization.
pub mod serializer;

/// Constraint operand values.
pub mod value;

pub use builder::{Frozen, GraphQueryBuilder, Open};
pub use explain::QueryDescription;
pub use order::Order;
pub use physical::CompiledQuery;
pub use predicate::PredicateKind;
pub use value::Value;
