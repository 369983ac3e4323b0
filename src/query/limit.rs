//! Sizing of backend index fetches.

use crate::config::PlannerConfig;

/// Extra rows fetched when the transaction holds uncommitted writes that may hide matches.
pub const TX_MODIFICATION_SLACK: usize = 5;

/// Per-index fetch limit for a plan whose selected indexes cover `covered` clauses.
///
/// The base is the caller's limit (or the hard ceiling when unset). With limit adjustment
/// enabled, an unset limit becomes `default_no_limit` and a set one is capped at
/// `max_base_limit`. The base is then over-fetched by `2^covered` so residual filtering
/// still yields enough rows, padded when the transaction is dirty, and finally clamped to
/// `hard_max_limit`.
pub fn index_limit(
    config: &PlannerConfig,
    user_limit: Option<usize>,
    covered: usize,
    uncommitted_modifications: usize,
) -> usize {
    let mut limit = match (config.adjust_query_limit, user_limit) {
        (true, None) => config.default_no_limit,
        (true, Some(limit)) => limit.min(config.max_base_limit),
        (false, Some(limit)) => limit,
        (false, None) => config.hard_max_limit,
    };
    if covered > 0 && limit > 0 {
        let max_multiplier = usize::MAX / limit;
        let growth = u32::try_from(covered)
            .ok()
            .and_then(|exp| 1usize.checked_shl(exp))
            .unwrap_or(usize::MAX);
        limit = limit.saturating_mul(growth.min(max_multiplier));
    }
    if uncommitted_modifications > 0 {
        limit = limit.saturating_add(TX_MODIFICATION_SLACK);
    }
    limit.min(config.hard_max_limit)
}
