//! Hypothesis propagation: lift fired/blocked rule statuses into working
//! memory until a fixpoint.
//!
//! Each pass re-evaluates every rule, then commits status changes as
//! hypotheses. The iteration cap guards against ill-formed catalogues with
//! cyclic condition graphs; a cycle is tolerated, not an error.

use crate::catalog::Catalog;
use crate::evaluator;
use crate::fact::FactStatus;
use crate::memory::WorkingMemory;
use crate::rule::{RuleStates, RuleStatus};

/// Hard cap on propagation passes.
pub const MAX_ITERATIONS: usize = 100;

/// Outcome of a propagation run.
#[derive(Debug, Clone, Copy)]
pub struct PropagationOutcome {
    pub iterations: usize,
    pub reached_fixpoint: bool,
}

/// Run the evaluate/commit loop to a fixpoint (or the iteration cap).
///
/// Appends one reasoning-log line per newly derived fact.
pub fn propagate(
    catalog: &Catalog,
    memory: &mut WorkingMemory,
    states: &mut RuleStates,
    log: &mut Vec<String>,
) -> PropagationOutcome {
    let mut iterations = 0;
    let mut changed = true;

    while changed && iterations < MAX_ITERATIONS {
        iterations += 1;
        changed = false;

        evaluator::evaluate_all(catalog, memory, states);

        for rule in catalog.rules() {
            let status = match states.get(&rule.id) {
                Some(state) => state.status,
                None => continue,
            };

            match status {
                RuleStatus::Fired => {
                    if memory.hypotheses.get(&rule.action) != Some(&FactStatus::True) {
                        memory.put_hypothesis(&rule.action, FactStatus::True);
                        log.push(format!("derived \"{}\" (rule {} fired)", rule.action, rule.id));
                        tracing::debug!(rule = %rule.id, action = %rule.action, "hypothesis derived");
                        refresh_dependents(catalog, states, &rule.action, FactStatus::True);
                        changed = true;
                    }
                }
                RuleStatus::Blocked if !rule.is_or_rule => {
                    // Only commit a negative hypothesis when no sibling
                    // producer can still establish the action. OR-rule
                    // blocks never propagate: another disjunct elsewhere
                    // may still fire.
                    let action = rule.action.as_str();
                    let can_still_derive = catalog.producers(action).any(|other| {
                        other.id != rule.id
                            && states
                                .get(&other.id)
                                .map(|s| s.status != RuleStatus::Blocked)
                                .unwrap_or(false)
                    });
                    if !can_still_derive
                        && memory.hypotheses.get(action) != Some(&FactStatus::False)
                    {
                        memory.put_hypothesis(action, FactStatus::False);
                        log.push(format!("ruled out \"{}\" (rule {} blocked)", action, rule.id));
                        tracing::debug!(rule = %rule.id, action = %action, "negative hypothesis derived");
                        refresh_dependents(catalog, states, action, FactStatus::False);
                        changed = true;
                    }
                }
                _ => {}
            }
        }
    }

    PropagationOutcome {
        iterations,
        reached_fixpoint: !changed,
    }
}

/// Push a freshly derived value into the snapshots of rules that consume
/// it, so the next evaluation pass sees it immediately.
fn refresh_dependents(
    catalog: &Catalog,
    states: &mut RuleStates,
    condition: &str,
    value: FactStatus,
) {
    let dependent_ids: Vec<String> = catalog.consumers(condition).map(|r| r.id.clone()).collect();
    for id in dependent_ids {
        if let Some(state) = states.get_mut(&id) {
            state
                .checked_conditions
                .insert(condition.to_string(), value);
        }
    }
}
