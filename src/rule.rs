//! Rule model and per-session rule state.
//!
//! A `Rule` is immutable catalogue data; `RuleState` is the mutable
//! per-session record the evaluator and propagator work on.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fact::FactStatus;

/// A single production rule: IF all/any `conditions` THEN `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier within a catalogue snapshot.
    pub id: String,
    /// Human-readable name for display; defaults to the action text.
    pub name: String,
    /// Condition keys, in authored order. Each key doubles as a question.
    pub conditions: Vec<String>,
    /// The conclusion this rule establishes when it fires.
    pub action: String,
    /// OR-combinator over the conditions; default is AND.
    pub is_or_rule: bool,
    /// Visa-type tag used for question grouping and result display.
    pub visa_type: String,
    /// Advisory flag; the authoritative goal set is the catalogue's
    /// `goal_actions` list.
    pub is_goal_action: bool,
}

impl Rule {
    pub fn new(id: impl Into<String>, conditions: Vec<String>, action: impl Into<String>) -> Self {
        let action = action.into();
        Self {
            id: id.into(),
            name: action.clone(),
            conditions,
            action,
            is_or_rule: false,
            visa_type: String::new(),
            is_goal_action: false,
        }
    }

    pub fn or_rule(mut self) -> Self {
        self.is_or_rule = true;
        self
    }

    pub fn with_visa_type(mut self, visa_type: impl Into<String>) -> Self {
        self.visa_type = visa_type.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn goal(mut self) -> Self {
        self.is_goal_action = true;
        self
    }

    /// Display form of the combinator.
    pub fn operator(&self) -> &'static str {
        if self.is_or_rule { "OR" } else { "AND" }
    }
}

/// Evaluation status of a rule within a session.
///
/// `Pending → Evaluating` when the planner touches one of the rule's
/// conditions; the evaluator classifies into `Fired`, `Blocked` or
/// `Uncertain`. Rewind resets everything to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Pending,
    Evaluating,
    Fired,
    Blocked,
    Uncertain,
}

impl RuleStatus {
    /// Terminal within a session: no further answer can change the outcome.
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            RuleStatus::Fired | RuleStatus::Blocked | RuleStatus::Uncertain
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleStatus::Pending => "pending",
            RuleStatus::Evaluating => "evaluating",
            RuleStatus::Fired => "fired",
            RuleStatus::Blocked => "blocked",
            RuleStatus::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session evaluation record for one rule.
#[derive(Debug, Clone)]
pub struct RuleState {
    pub status: RuleStatus,
    /// Snapshot of each condition's effective value at last evaluation.
    pub checked_conditions: HashMap<String, FactStatus>,
}

impl Default for RuleState {
    fn default() -> Self {
        Self {
            status: RuleStatus::Pending,
            checked_conditions: HashMap::new(),
        }
    }
}

impl RuleState {
    /// Rewind: back to `Pending` with an empty snapshot.
    pub fn reset(&mut self) {
        self.status = RuleStatus::Pending;
        self.checked_conditions.clear();
    }
}

/// Per-session state table, keyed by rule id.
pub type RuleStates = HashMap<String, RuleState>;
