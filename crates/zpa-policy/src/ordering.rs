//! Rule ordering key derivation.

use std::collections::HashMap;

use crate::policy_sets::PolicyRule;

/// Total-order sort key for a rule under a partial override map.
///
/// Overridden rules sort before all others, ranked by their requested
/// position; everything else keeps its server-assigned `rule_order`. Deriving
/// an explicit key (rather than comparing pairs) keeps the order trivially
/// transitive, and the stable sort preserves the existing relative order of
/// ties.
pub(crate) fn order_rank(rule: &PolicyRule, overrides: &HashMap<String, i64>) -> (u8, i64) {
    overrides.get(&rule.id).map_or_else(
        || (1, rule.numeric_rule_order()),
        |&requested| (0, requested),
    )
}
