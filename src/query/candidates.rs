//! Index candidate discovery.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::query::condition::ConditionTree;
use crate::query::metadata::SchemaProvider;
use crate::schema::{ElementCategory, IndexDescriptor};
use crate::types::{IndexId, Result, SombraError};

/// Every index attached to a key referenced anywhere in `conditions` whose element
/// category is `category`, keyed (and therefore deduplicated and ordered) by index id.
///
/// Predicate compatibility is not checked here; the cover matchers decide that.
pub fn collect_index_candidates(
    schema: &dyn SchemaProvider,
    conditions: &ConditionTree,
    category: ElementCategory,
) -> Result<BTreeMap<IndexId, Arc<IndexDescriptor>>> {
    let mut candidates = BTreeMap::new();
    for (_, atom) in conditions.literals() {
        let Some(key) = atom.key.as_property_key() else {
            return Err(SombraError::InvalidOwned(format!(
                "condition key '{}' is not a property key",
                atom.key.name()
            )));
        };
        for index in schema.key_indexes(key.id)? {
            if index.element == category {
                trace!(index = %index.name, key = %key.name, "index candidate");
                candidates.entry(index.id).or_insert(index);
            }
        }
    }
    Ok(candidates)
}
