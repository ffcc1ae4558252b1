//! Immutable catalogue snapshot: the rule set a session reasons over.
//!
//! A `Catalog` is built once from loaded rules plus the visa-type
//! configuration and then shared read-only (`Arc`) by every session started
//! against it. Reloading the catalogue produces a new snapshot; running
//! sessions keep the one they were started with.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::VisaTypeConfig;
use crate::rule::Rule;

/// Immutable rule catalogue with derived indexes.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: Vec<Rule>,
    goal_actions: Vec<String>,
    visa_config: VisaTypeConfig,
    /// Conditions that appear as some rule's action.
    derived: HashSet<String>,
    /// action → indexes of rules producing it.
    producers: HashMap<String, Vec<usize>>,
    /// condition → indexes of rules using it.
    consumers: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Build a snapshot. Rule order is preserved (it matters for display
    /// and export, not for inference).
    pub fn new(rules: Vec<Rule>, goal_actions: Vec<String>, visa_config: VisaTypeConfig) -> Self {
        let mut derived = HashSet::new();
        let mut producers: HashMap<String, Vec<usize>> = HashMap::new();
        let mut consumers: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, rule) in rules.iter().enumerate() {
            derived.insert(rule.action.clone());
            producers.entry(rule.action.clone()).or_default().push(idx);
            for cond in &rule.conditions {
                consumers.entry(cond.clone()).or_default().push(idx);
            }
        }

        Self {
            rules,
            goal_actions,
            visa_config,
            derived,
            producers,
            consumers,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn visa_config(&self) -> &VisaTypeConfig {
        &self.visa_config
    }

    pub fn goal_actions(&self) -> &[String] {
        &self.goal_actions
    }

    /// Rules whose action is in the goal set, sorted by configured visa
    /// order (ties keep file order).
    pub fn goal_rules(&self) -> Vec<&Rule> {
        let goal_set: HashSet<&str> = self.goal_actions.iter().map(String::as_str).collect();
        let mut goals: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| goal_set.contains(r.action.as_str()))
            .collect();
        goals.sort_by_key(|r| self.visa_config.order_of(&r.visa_type));
        goals
    }

    /// Whether `condition` appears as the action of at least one rule.
    pub fn is_derived(&self, condition: &str) -> bool {
        self.derived.contains(condition)
    }

    pub fn derived_conditions(&self) -> &HashSet<String> {
        &self.derived
    }

    /// Rules producing `condition` (their action equals it).
    pub fn producers(&self, condition: &str) -> impl Iterator<Item = &Rule> {
        self.producers
            .get(condition)
            .into_iter()
            .flatten()
            .map(|&idx| &self.rules[idx])
    }

    /// Rules using `condition` in their IF part.
    pub fn consumers(&self, condition: &str) -> impl Iterator<Item = &Rule> {
        self.consumers
            .get(condition)
            .into_iter()
            .flatten()
            .map(|&idx| &self.rules[idx])
    }

    /// Visa-type tags of every rule using `condition` in its IF part.
    pub fn related_visa_types(&self, condition: &str) -> BTreeSet<String> {
        self.consumers(condition)
            .filter(|r| !r.visa_type.is_empty())
            .map(|r| r.visa_type.clone())
            .collect()
    }
}
