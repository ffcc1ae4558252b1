//! Catalogue integrity checker.
//!
//! Runs separately from the engine and never blocks operation: a cyclic or
//! partially unreachable catalogue still consults (the engine's bounded
//! recursion tolerates it), but the issues are worth surfacing to whoever
//! maintains the rules.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;

use crate::catalog::Catalog;

/// How bad an issue is. Errors make parts of the catalogue unreachable or
/// undecidable; warnings are suspicious but harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One reported integrity issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Check a catalogue snapshot and report every issue found.
pub fn check_catalog(catalog: &Catalog) -> Vec<Issue> {
    let mut issues = Vec::new();

    check_goals(catalog, &mut issues);
    check_rules(catalog, &mut issues);
    check_cycles(catalog, &mut issues);
    check_reachability(catalog, &mut issues);

    issues
}

/// Every configured goal conclusion needs at least one producing rule.
fn check_goals(catalog: &Catalog, issues: &mut Vec<Issue>) {
    for action in catalog.goal_actions() {
        if catalog.producers(action).next().is_none() {
            issues.push(Issue::error(format!(
                "goal action \"{action}\" has no producing rule"
            )));
        }
    }
}

fn check_rules(catalog: &Catalog, issues: &mut Vec<Issue>) {
    let config = catalog.visa_config();
    let mut seen: HashSet<(String, Vec<String>, bool)> = HashSet::new();

    for rule in catalog.rules() {
        if rule.conditions.is_empty() {
            issues.push(Issue::warning(format!(
                "rule {} (\"{}\") has no conditions and fires unconditionally",
                rule.id, rule.action
            )));
        }

        if !rule.visa_type.is_empty() && !config.contains(&rule.visa_type) {
            issues.push(Issue::warning(format!(
                "rule {} uses unconfigured visa type \"{}\"",
                rule.id, rule.visa_type
            )));
        }

        let key = (
            rule.action.clone(),
            rule.conditions.clone(),
            rule.is_or_rule,
        );
        if !seen.insert(key) {
            issues.push(Issue::warning(format!(
                "rule {} duplicates another rule for \"{}\"",
                rule.id, rule.action
            )));
        }
    }
}

/// Cycles in the action → condition dependency graph. The engine tolerates
/// them, but they usually indicate a modelling mistake.
fn check_cycles(catalog: &Catalog, issues: &mut Vec<Issue>) {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for rule in catalog.rules() {
        for cond in &rule.conditions {
            graph.add_edge(rule.action.as_str(), cond.as_str(), ());
        }
    }

    for scc in tarjan_scc(&graph) {
        let cyclic = scc.len() > 1 || scc.iter().any(|&n| graph.contains_edge(n, n));
        if cyclic {
            let mut members: Vec<&str> = scc.clone();
            members.sort_unstable();
            issues.push(Issue::error(format!(
                "dependency cycle between conditions: {}",
                members.join(" -> ")
            )));
        }
    }
}

/// Conditions no goal can ever reach are never asked.
fn check_reachability(catalog: &Catalog, issues: &mut Vec<Issue>) {
    let mut reachable: HashSet<&str> = HashSet::new();
    let mut frontier: VecDeque<&str> = catalog
        .goal_actions()
        .iter()
        .map(String::as_str)
        .collect();
    while let Some(action) = frontier.pop_front() {
        if !reachable.insert(action) {
            continue;
        }
        for rule in catalog.producers(action) {
            for cond in &rule.conditions {
                frontier.push_back(cond.as_str());
            }
        }
    }

    let mut unreachable: Vec<&str> = catalog
        .rules()
        .iter()
        .flat_map(|r| r.conditions.iter().map(String::as_str))
        .filter(|cond| !reachable.contains(cond))
        .collect();
    unreachable.sort_unstable();
    unreachable.dedup();
    for cond in unreachable {
        issues.push(Issue::warning(format!(
            "condition \"{cond}\" does not feed any goal and will never be asked"
        )));
    }
}
