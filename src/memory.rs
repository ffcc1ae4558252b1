//! Working memory: the per-session fact stores.
//!
//! Findings are what the user said; hypotheses are what the rules derived.
//! The answer history carries insertion order and is the anchor for rewind.

use std::collections::HashMap;

use crate::fact::FactStatus;

/// Per-session trilean fact stores.
#[derive(Debug, Clone, Default)]
pub struct WorkingMemory {
    /// User answers, keyed by condition.
    pub findings: HashMap<String, FactStatus>,
    /// Facts derived by rule firing or blocking.
    pub hypotheses: HashMap<String, FactStatus>,
    /// Answers in the order they were given. Truncated on rewind.
    pub answer_history: Vec<(String, FactStatus)>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup: findings first, then hypotheses.
    ///
    /// This is deliberately not the evaluator's effective value: the
    /// hypothesis-over-finding precedence on derived keys lives in
    /// `evaluator::effective_value`, which also needs the catalogue.
    pub fn value(&self, condition: &str) -> Option<FactStatus> {
        self.findings
            .get(condition)
            .or_else(|| self.hypotheses.get(condition))
            .copied()
    }

    /// Record a user answer and append it to the history.
    pub fn put_finding(&mut self, condition: &str, value: FactStatus) {
        self.findings.insert(condition.to_string(), value);
        self.answer_history.push((condition.to_string(), value));
    }

    /// Record a derived fact.
    pub fn put_hypothesis(&mut self, condition: &str, value: FactStatus) {
        self.hypotheses.insert(condition.to_string(), value);
    }

    /// Rewind to `target_idx`: drop every finding answered at indices
    /// ≥ `target_idx`, truncate the history there, and clear all
    /// hypotheses (they are re-derived from the surviving findings).
    pub fn rewind_to(&mut self, target_idx: usize) {
        if target_idx >= self.answer_history.len() {
            return;
        }
        let removed: Vec<String> = self.answer_history[target_idx..]
            .iter()
            .map(|(cond, _)| cond.clone())
            .collect();
        self.answer_history.truncate(target_idx);
        for cond in removed {
            self.findings.remove(&cond);
        }
        self.hypotheses.clear();
    }

    /// Conditions the user literally answered "unknown", in answer order.
    pub fn unknown_findings(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for (cond, _) in &self.answer_history {
            if self.findings.get(cond) == Some(&FactStatus::Unknown) && !seen.contains(cond) {
                seen.push(cond.clone());
            }
        }
        seen
    }

    /// Derived facts in deterministic (sorted) order.
    pub fn derived_facts(&self) -> Vec<String> {
        let mut facts: Vec<String> = self.hypotheses.keys().cloned().collect();
        facts.sort();
        facts
    }
}
