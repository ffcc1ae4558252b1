//! Session façade: one consultation dialogue over a catalogue snapshot.
//!
//! A `Session` is a serialised state machine: `start`, then a sequence of
//! `answer` / `back` calls, until the diagnosis completes. All operations
//! are synchronous and CPU-only; the outer server drives one request at a
//! time per session.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::SessionError;
use crate::fact::Answer;
use crate::memory::WorkingMemory;
use crate::planner::{self, Planner};
use crate::propagate;
use crate::report::{self, AnsweredQuestion, Diagnosis, RuleDisplay};
use crate::rule::{RuleState, RuleStates, RuleStatus};

/// Result of `start` / `restart`.
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub question: Option<String>,
    pub rules: Vec<RuleDisplay>,
    pub is_complete: bool,
}

/// Result of `answer`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub next_question: Option<String>,
    pub derived_facts: Vec<String>,
    pub rules: Vec<RuleDisplay>,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
}

/// Result of `back`.
#[derive(Debug, Clone, Serialize)]
pub struct BackOutcome {
    pub current_question: Option<String>,
    pub answered_questions: Vec<AnsweredQuestion>,
    pub rules: Vec<RuleDisplay>,
}

/// Full observable state, for reconnecting clients.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub current_question: Option<String>,
    pub answered_questions: Vec<AnsweredQuestion>,
    pub rules: Vec<RuleDisplay>,
    pub derived_facts: Vec<String>,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
}

/// One consultation over an immutable catalogue snapshot.
pub struct Session {
    catalog: Arc<Catalog>,
    memory: WorkingMemory,
    states: RuleStates,
    planner: Planner,
    current_question: Option<String>,
    reasoning_log: Vec<String>,
}

impl Session {
    /// Create a session against a catalogue snapshot. The snapshot stays
    /// with the session even if the caller later loads a newer catalogue.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let states = fresh_states(&catalog);
        Self {
            catalog,
            memory: WorkingMemory::new(),
            states,
            planner: Planner::new(),
            current_question: None,
            reasoning_log: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Begin the consultation: build the question queue, settle rules that
    /// need no input (zero-condition rules fire immediately), and surface
    /// the first question.
    pub fn start(&mut self) -> StartOutcome {
        let goal_count = self.catalog.goal_rules().len();
        let visa_codes: Vec<&str> = self.catalog.visa_config().codes();
        self.reasoning_log.push(format!(
            "consultation started: {goal_count} goal rules across visa types [{}]",
            visa_codes.join(", ")
        ));
        tracing::info!(goals = goal_count, rules = self.catalog.len(), "consultation started");

        self.planner.rebuild(&self.catalog);
        propagate::propagate(
            &self.catalog,
            &mut self.memory,
            &mut self.states,
            &mut self.reasoning_log,
        );
        self.current_question =
            self.planner
                .next_question(&self.catalog, &self.memory, &mut self.states);

        StartOutcome {
            question: self.current_question.clone(),
            rules: self.rules_display(),
            is_complete: self.is_complete(),
        }
    }

    /// Record an answer for `condition` and advance the dialogue.
    ///
    /// Rejected (state unchanged) when no question is pending. The
    /// condition is taken from the caller rather than assumed to be the
    /// current question, so a knowledgeable user can short-circuit by
    /// answering a derived key directly.
    pub fn answer(
        &mut self,
        condition: &str,
        answer: Answer,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.current_question.is_none() {
            return Err(SessionError::NoCurrentQuestion);
        }

        let fact = answer.fact();
        self.memory.put_finding(condition, fact);
        self.reasoning_log
            .push(format!("answer: \"{condition}\" -> {answer}"));
        tracing::debug!(condition, answer = %answer, "answer recorded");

        // Unknown on a derived condition: descend into the subtree that
        // could explain it.
        if answer == Answer::Unknown && self.catalog.is_derived(condition) {
            self.planner
                .expand_unknown(&self.catalog, &self.memory, condition);
            self.reasoning_log
                .push(format!("expanding sub-conditions of \"{condition}\""));
        }

        propagate::propagate(
            &self.catalog,
            &mut self.memory,
            &mut self.states,
            &mut self.reasoning_log,
        );

        self.current_question =
            self.planner
                .next_question(&self.catalog, &self.memory, &mut self.states);
        let is_complete = self.is_complete();

        Ok(AnswerOutcome {
            next_question: self.current_question.clone(),
            derived_facts: self.memory.derived_facts(),
            rules: self.rules_display(),
            is_complete,
            diagnosis: is_complete.then(|| self.diagnosis()),
        })
    }

    /// Rewind `steps` answers (clamped to the history length) and
    /// re-derive everything from the surviving prefix.
    pub fn back(&mut self, steps: usize) -> BackOutcome {
        let history_len = self.memory.answer_history.len();
        let steps = steps.min(history_len);

        if steps > 0 {
            let target_idx = history_len - steps;
            let target = self.memory.answer_history[target_idx].0.clone();

            // Conditions asked up to (and including) the rewind target keep
            // their "evaluating" display state after the rebuild.
            let asked: Vec<String> = self.memory.answer_history[..=target_idx]
                .iter()
                .map(|(cond, _)| cond.clone())
                .collect();

            self.memory.rewind_to(target_idx);
            for state in self.states.values_mut() {
                state.reset();
            }
            self.planner.rebuild(&self.catalog);

            propagate::propagate(
                &self.catalog,
                &mut self.memory,
                &mut self.states,
                &mut self.reasoning_log,
            );

            self.current_question = Some(target.clone());
            for cond in &asked {
                planner::mark_rules_evaluating(&self.catalog, &mut self.states, cond);
            }

            self.reasoning_log
                .push(format!("rewound {steps} step(s) to \"{target}\""));
            tracing::debug!(steps, target = %target, "session rewound");
        }

        BackOutcome {
            current_question: self.current_question.clone(),
            answered_questions: report::answered_questions(&self.memory),
            rules: self.rules_display(),
        }
    }

    /// Throw everything away and start over on the same snapshot.
    pub fn restart(&mut self) -> StartOutcome {
        self.memory = WorkingMemory::new();
        self.states = fresh_states(&self.catalog);
        self.planner = Planner::new();
        self.current_question = None;
        self.reasoning_log.clear();
        self.start()
    }

    /// Current observable state.
    pub fn state(&self) -> StateSnapshot {
        let is_complete = self.is_complete();
        StateSnapshot {
            current_question: self.current_question.clone(),
            answered_questions: report::answered_questions(&self.memory),
            rules: self.rules_display(),
            derived_facts: self.memory.derived_facts(),
            is_complete,
            diagnosis: is_complete.then(|| self.diagnosis()),
        }
    }

    /// Visa-type tags of the rules using `condition`.
    pub fn related_visa_types(&self, condition: &str) -> Vec<String> {
        self.catalog
            .related_visa_types(condition)
            .into_iter()
            .collect()
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn reasoning_log(&self) -> &[String] {
        &self.reasoning_log
    }

    /// Diagnosis is complete when no question is pending or every goal
    /// rule has reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.current_question.is_none() || self.goals_resolved()
    }

    /// Final classification of the goal conclusions.
    pub fn diagnosis(&self) -> Diagnosis {
        report::synthesize(
            &self.catalog,
            &self.memory,
            &self.states,
            &self.reasoning_log,
        )
    }

    fn goals_resolved(&self) -> bool {
        // Only fired/blocked goals are finished here: an uncertain goal
        // can still fire once the expanded sub-conditions of an unknown
        // derived parent are answered. Uncertain goals end the dialogue
        // through queue exhaustion instead.
        self.catalog.goal_rules().iter().all(|goal| {
            self.states
                .get(&goal.id)
                .map(|s| matches!(s.status, RuleStatus::Fired | RuleStatus::Blocked))
                .unwrap_or(false)
        })
    }

    fn rules_display(&self) -> Vec<RuleDisplay> {
        report::rules_display(&self.catalog, &self.memory, &self.states)
    }

    #[cfg(test)]
    pub(crate) fn rule_status(&self, rule_id: &str) -> crate::rule::RuleStatus {
        self.states[rule_id].status
    }

    #[cfg(test)]
    pub(crate) fn memory(&self) -> &WorkingMemory {
        &self.memory
    }
}

fn fresh_states(catalog: &Catalog) -> RuleStates {
    catalog
        .rules()
        .iter()
        .map(|r| (r.id.clone(), RuleState::default()))
        .collect()
}
