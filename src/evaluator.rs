//! Pure rule evaluation over working memory.
//!
//! Recomputes each rule's status from the effective values of its
//! conditions. Invoked after every answer and on every propagation pass;
//! it never mutates working memory.

use crate::catalog::Catalog;
use crate::fact::FactStatus;
use crate::memory::WorkingMemory;
use crate::rule::{Rule, RuleStates, RuleStatus};

/// Effective value of a condition.
///
/// For derived conditions a determined hypothesis wins over the user's
/// literal answer: once an OR-rule fires the parent, an earlier "unknown"
/// at that key must not shadow the derivation. For base conditions the
/// user's answer is the sole source of truth.
pub fn effective_value(
    catalog: &Catalog,
    memory: &WorkingMemory,
    condition: &str,
) -> Option<FactStatus> {
    let finding = memory.findings.get(condition).copied();
    let hypothesis = memory.hypotheses.get(condition).copied();

    if catalog.is_derived(condition) {
        if let Some(value) = hypothesis {
            if value.is_determined() {
                return Some(value);
            }
        }
    }

    finding.or(hypothesis)
}

/// Re-evaluate every rule, refreshing its condition snapshot and status.
pub fn evaluate_all(catalog: &Catalog, memory: &WorkingMemory, states: &mut RuleStates) {
    for rule in catalog.rules() {
        let checked: Vec<(String, FactStatus)> = rule
            .conditions
            .iter()
            .map(|cond| {
                (
                    cond.clone(),
                    effective_value(catalog, memory, cond).unwrap_or(FactStatus::Pending),
                )
            })
            .collect();

        let new_status = classify(rule, &checked, catalog, states);

        if let Some(state) = states.get_mut(&rule.id) {
            state.checked_conditions = checked.into_iter().collect();
            if let Some(status) = new_status {
                if state.status != status {
                    tracing::debug!(rule = %rule.id, status = %status, "rule classified");
                }
                state.status = status;
            }
        }
    }
}

/// Classify a rule from its condition snapshot. `None` leaves the current
/// status (pending/evaluating) in place.
fn classify(
    rule: &Rule,
    checked: &[(String, FactStatus)],
    catalog: &Catalog,
    states: &RuleStates,
) -> Option<RuleStatus> {
    let any_true = checked.iter().any(|(_, v)| *v == FactStatus::True);
    let any_false = checked.iter().any(|(_, v)| *v == FactStatus::False);
    let has_unknown = checked.iter().any(|(_, v)| *v == FactStatus::Unknown);
    let all_true = checked.iter().all(|(_, v)| *v == FactStatus::True);
    let all_answered = checked.iter().all(|(_, v)| *v != FactStatus::Pending);

    if rule.is_or_rule {
        classify_or(checked, catalog, states, any_true)
    } else {
        classify_and(all_true, any_false, has_unknown, all_answered)
    }
}

/// AND-rule: fire when everything is true, block on any false, and go
/// uncertain once every condition is answered but some are unknown.
fn classify_and(
    all_true: bool,
    any_false: bool,
    has_unknown: bool,
    all_answered: bool,
) -> Option<RuleStatus> {
    if all_true {
        Some(RuleStatus::Fired)
    } else if any_false {
        Some(RuleStatus::Blocked)
    } else if has_unknown && all_answered {
        Some(RuleStatus::Uncertain)
    } else {
        None
    }
}

/// OR-rule: fire on any true disjunct. Otherwise the rule settles only
/// when every disjunct is negatively resolved: explicitly false, unknown
/// on a base key, or unknown on a derived key whose every producer has
/// itself reached a resolved status.
fn classify_or(
    checked: &[(String, FactStatus)],
    catalog: &Catalog,
    states: &RuleStates,
    any_true: bool,
) -> Option<RuleStatus> {
    if any_true {
        return Some(RuleStatus::Fired);
    }

    let mut has_unknown = false;
    for (cond, value) in checked {
        match value {
            FactStatus::False => {}
            FactStatus::Unknown => {
                has_unknown = true;
                if catalog.is_derived(cond) && !producers_resolved(catalog, states, cond) {
                    return None;
                }
            }
            FactStatus::True | FactStatus::Pending => return None,
        }
    }

    Some(if has_unknown {
        RuleStatus::Uncertain
    } else {
        RuleStatus::Blocked
    })
}

/// Whether every rule producing `condition` has a resolved status.
fn producers_resolved(catalog: &Catalog, states: &RuleStates, condition: &str) -> bool {
    catalog.producers(condition).all(|r| {
        states
            .get(&r.id)
            .map(|s| s.status.is_resolved())
            .unwrap_or(false)
    })
}
