//! Result synthesis and display snapshots.
//!
//! These types are the label-resolved, serializable representations an
//! outer dialogue server (or the CLI) renders directly.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::evaluator::effective_value;
use crate::fact::FactStatus;
use crate::memory::WorkingMemory;
use crate::rule::{RuleStates, RuleStatus};

/// A goal conclusion whose rule fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicableVisa {
    pub action: String,
    pub visa_type: String,
}

/// A goal conclusion that is neither fired nor blocked: possible, pending
/// the listed unknowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalVisa {
    pub action: String,
    pub visa_type: String,
    /// The goal rule's conditions whose effective value is unknown.
    pub unknown_conditions: Vec<String>,
}

/// Final classification of the goal conclusions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub applicable: Vec<ApplicableVisa>,
    pub conditional: Vec<ConditionalVisa>,
    /// Every condition the user literally answered "unknown".
    pub unknown_conditions: Vec<String>,
    pub reasoning_log: Vec<String>,
}

/// Display state of one condition inside a rule card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionDisplay {
    pub text: String,
    /// `true` / `false` / `unknown` / `unchecked`.
    pub status: String,
    pub is_derived: bool,
}

/// Display state of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDisplay {
    pub id: String,
    pub name: String,
    pub visa_type: String,
    pub conditions: Vec<ConditionDisplay>,
    pub conclusion: String,
    pub status: RuleStatus,
    pub operator: &'static str,
}

/// One entry of the answered-questions list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredQuestion {
    pub condition: String,
    pub answer: FactStatus,
}

/// Per-rule display snapshot in catalogue order.
pub fn rules_display(
    catalog: &Catalog,
    memory: &WorkingMemory,
    states: &RuleStates,
) -> Vec<RuleDisplay> {
    catalog
        .rules()
        .iter()
        .map(|rule| {
            let conditions = rule
                .conditions
                .iter()
                .map(|cond| {
                    let status = match effective_value(catalog, memory, cond) {
                        Some(FactStatus::True) => "true",
                        Some(FactStatus::False) => "false",
                        Some(FactStatus::Unknown) => "unknown",
                        Some(FactStatus::Pending) | None => "unchecked",
                    };
                    ConditionDisplay {
                        text: cond.clone(),
                        status: status.to_string(),
                        is_derived: catalog.is_derived(cond),
                    }
                })
                .collect();
            RuleDisplay {
                id: rule.id.clone(),
                name: rule.name.clone(),
                visa_type: rule.visa_type.clone(),
                conditions,
                conclusion: rule.action.clone(),
                status: states
                    .get(&rule.id)
                    .map(|s| s.status)
                    .unwrap_or(RuleStatus::Pending),
                operator: rule.operator(),
            }
        })
        .collect()
}

/// The answer history as displayable entries.
pub fn answered_questions(memory: &WorkingMemory) -> Vec<AnsweredQuestion> {
    memory
        .answer_history
        .iter()
        .map(|(condition, answer)| AnsweredQuestion {
            condition: condition.clone(),
            answer: *answer,
        })
        .collect()
}

/// Classify every goal rule: fired goals are applicable, blocked goals are
/// excluded, everything else is conditional with its open unknowns.
pub fn synthesize(
    catalog: &Catalog,
    memory: &WorkingMemory,
    states: &RuleStates,
    reasoning_log: &[String],
) -> Diagnosis {
    let mut applicable = Vec::new();
    let mut conditional = Vec::new();

    for goal in catalog.goal_rules() {
        let status = states
            .get(&goal.id)
            .map(|s| s.status)
            .unwrap_or(RuleStatus::Pending);

        match status {
            RuleStatus::Fired => applicable.push(ApplicableVisa {
                action: goal.action.clone(),
                visa_type: goal.visa_type.clone(),
            }),
            RuleStatus::Blocked => {}
            _ => {
                let unknown_conditions = goal
                    .conditions
                    .iter()
                    .filter(|cond| {
                        effective_value(catalog, memory, cond) == Some(FactStatus::Unknown)
                    })
                    .cloned()
                    .collect();
                conditional.push(ConditionalVisa {
                    action: goal.action.clone(),
                    visa_type: goal.visa_type.clone(),
                    unknown_conditions,
                });
            }
        }
    }

    Diagnosis {
        applicable,
        conditional,
        unknown_conditions: memory.unknown_findings(),
        reasoning_log: reasoning_log.to_vec(),
    }
}
