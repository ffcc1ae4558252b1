//! Question planner: which condition to ask next, and in what order.
//!
//! The queue is built backward from the goal rules, grouped into visa-type
//! buckets and priority-sorted within each bucket. Selection prunes
//! questions whose answer can no longer matter (ancestor already resolved,
//! or every using rule effectively blocked), and an "unknown" answer on a
//! derived condition expands its sub-conditions at the head of the queue:
//! depth-first descent into the subtree explaining it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::catalog::Catalog;
use crate::evaluator::effective_value;
use crate::fact::FactStatus;
use crate::memory::WorkingMemory;
use crate::rule::{RuleStates, RuleStatus};

/// Hard cap on the selection loop.
pub const MAX_SELECTION_LOOPS: usize = 1000;
/// Recursion bound for ancestor resolution.
pub const MAX_ANCESTOR_DEPTH: usize = 20;

/// The question queue and its construction rules.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    queue: VecDeque<String>,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining queued conditions, head first.
    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// Rebuild the queue from scratch (on start and after rewind).
    pub fn rebuild(&mut self, catalog: &Catalog) {
        self.queue = build_queue(catalog);
        tracing::debug!(questions = self.queue.len(), "question queue rebuilt");
    }

    /// Pop skippable heads until a real question surfaces; the surfaced
    /// question stays at the head until answered. Rules using it move
    /// `Pending → Evaluating`.
    pub fn next_question(
        &mut self,
        catalog: &Catalog,
        memory: &WorkingMemory,
        states: &mut RuleStates,
    ) -> Option<String> {
        let mut loops = 0;
        while let Some(head) = self.queue.front().cloned() {
            loops += 1;
            if loops > MAX_SELECTION_LOOPS {
                tracing::warn!("selection loop cap hit; stopping question selection");
                return None;
            }

            let value = effective_value(catalog, memory, &head);
            if value.is_some() && value != Some(FactStatus::Pending) {
                self.queue.pop_front();
                continue;
            }

            if should_skip(catalog, memory, states, &head) {
                tracing::debug!(condition = %head, "question pruned");
                self.queue.pop_front();
                continue;
            }

            mark_rules_evaluating(catalog, states, &head);
            return Some(head);
        }
        None
    }

    /// The user answered "unknown" on a derived condition: pull the
    /// sub-conditions of its producing rules to the head of the queue,
    /// base conditions first.
    pub fn expand_unknown(&mut self, catalog: &Catalog, memory: &WorkingMemory, condition: &str) {
        let mut sub_conditions: Vec<String> = Vec::new();
        for rule in catalog.producers(condition) {
            for cond in &rule.conditions {
                if sub_conditions.iter().any(|c| c == cond) {
                    continue;
                }
                let value = effective_value(catalog, memory, cond);
                if value.is_none() || value == Some(FactStatus::Pending) {
                    sub_conditions.push(cond.clone());
                }
            }
        }
        if sub_conditions.is_empty() {
            return;
        }

        // Base first; stable, so authored order survives within each class.
        sub_conditions.sort_by_key(|c| catalog.is_derived(c));

        self.queue.retain(|q| !sub_conditions.contains(q));
        for cond in sub_conditions.iter().rev() {
            self.queue.push_front(cond.clone());
        }
        tracing::debug!(condition, inserted = sub_conditions.len(), "expanded unknown condition");
    }
}

/// Rules using `condition` that are still pending become `Evaluating`.
/// Purely display-oriented; the evaluator ignores the distinction.
pub fn mark_rules_evaluating(catalog: &Catalog, states: &mut RuleStates, condition: &str) {
    let ids: Vec<String> = catalog.consumers(condition).map(|r| r.id.clone()).collect();
    for id in ids {
        if let Some(state) = states.get_mut(&id) {
            if state.status == RuleStatus::Pending {
                state.status = RuleStatus::Evaluating;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Queue construction
// ---------------------------------------------------------------------------

fn build_queue(catalog: &Catalog) -> VecDeque<String> {
    let goal_rules = catalog.goal_rules();

    // Every condition transitively feeding a goal, base and derived alike.
    let mut needed: BTreeSet<String> = BTreeSet::new();
    let mut processed: HashSet<String> = HashSet::new();
    for goal in &goal_rules {
        collect_conditions(catalog, &goal.action, &mut needed, &mut processed);
    }

    // Direct conditions of goal rules get the top priority band.
    let goal_direct: HashSet<&str> = goal_rules
        .iter()
        .flat_map(|r| r.conditions.iter().map(String::as_str))
        .collect();

    // Minimum distance of each condition from any goal.
    let mut depth: HashMap<String, usize> = HashMap::new();
    for goal in &goal_rules {
        calc_depth(catalog, &goal.action, 0, &mut depth);
    }

    // Bucket each condition under one visa type. Multi-visa conditions go
    // to the mentioning visa asked earliest; conditions with only
    // unconfigured visa tags land in trailing buckets rather than being
    // dropped.
    let config = catalog.visa_config();
    let mut buckets: BTreeMap<(u32, String), Vec<String>> = BTreeMap::new();
    for code in config.codes() {
        buckets.insert((config.order_of(code), code.to_string()), Vec::new());
    }
    let mut multi_visa: HashSet<String> = HashSet::new();

    for cond in &needed {
        // Tags of the rules using this condition, untagged ("") included;
        // untagged rules' questions still have to be asked.
        let related: BTreeSet<String> = catalog
            .consumers(cond)
            .map(|r| r.visa_type.clone())
            .collect();
        if related.is_empty() {
            continue;
        }
        if related.len() > 1 {
            multi_visa.insert(cond.clone());
        }
        let target = related
            .iter()
            .min_by_key(|code| (config.order_of(code.as_str()), (*code).clone()))
            .cloned()
            .unwrap_or_default();
        buckets
            .entry((config.order_of(&target), target))
            .or_default()
            .push(cond.clone());
    }

    // Priority-sort within each bucket, then concatenate in bucket order.
    let mut queue = VecDeque::new();
    for ((_, code), mut conditions) in buckets {
        conditions.sort_by_key(|cond| {
            std::cmp::Reverse(priority(catalog, cond, &code, &goal_direct, &depth, &multi_visa))
        });
        queue.extend(conditions);
    }
    queue
}

/// Depth-first collection of every condition reachable from `action`.
fn collect_conditions(
    catalog: &Catalog,
    action: &str,
    needed: &mut BTreeSet<String>,
    processed: &mut HashSet<String>,
) {
    if !processed.insert(action.to_string()) {
        return;
    }
    for rule in catalog.producers(action) {
        for cond in &rule.conditions {
            needed.insert(cond.clone());
            if catalog.is_derived(cond) {
                collect_conditions(catalog, cond, needed, processed);
            }
        }
    }
}

/// Relax minimum depths downward from `action`. Recursing only on
/// improvement keeps this terminating on cyclic catalogues.
fn calc_depth(catalog: &Catalog, action: &str, depth: usize, map: &mut HashMap<String, usize>) {
    for rule in catalog.producers(action) {
        for cond in &rule.conditions {
            let improved = match map.get(cond) {
                Some(&existing) => existing > depth,
                None => true,
            };
            if improved {
                map.insert(cond.clone(), depth);
                if catalog.is_derived(cond) {
                    calc_depth(catalog, cond, depth + 1, map);
                }
            }
        }
    }
}

/// Priority of a condition within its visa bucket, higher asked first:
/// goal-direct conditions dominate, then base conditions, then deeper
/// derived conditions (shallow parents are asked last, after the specific
/// facts below them), with small bonuses for multi-visa reach and fan-in.
fn priority(
    catalog: &Catalog,
    cond: &str,
    visa_code: &str,
    goal_direct: &HashSet<&str>,
    depth: &HashMap<String, usize>,
    multi_visa: &HashSet<String>,
) -> i64 {
    let mut score: i64 = 0;

    if goal_direct.contains(cond) {
        score += 10_000;
    }

    if !catalog.is_derived(cond) {
        score += 5_000;
    } else {
        score += depth.get(cond).copied().unwrap_or(0) as i64 * 100;
    }

    if multi_visa.contains(cond) {
        score += 50;
    }

    score += catalog
        .consumers(cond)
        .filter(|r| r.visa_type == visa_code)
        .count() as i64;

    score
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// A question is moot when no rule uses it, when an ancestor conclusion is
/// already determined, or when every using rule is (effectively) blocked.
fn should_skip(
    catalog: &Catalog,
    memory: &WorkingMemory,
    states: &RuleStates,
    condition: &str,
) -> bool {
    if catalog.consumers(condition).next().is_none() {
        return true;
    }

    let mut visited = HashSet::new();
    if ancestor_resolved(catalog, memory, condition, &mut visited, 0) {
        return true;
    }

    // AND-block shortcut: the answer cannot change any using rule's
    // outcome. OR-rules never qualify; a true disjunct always matters.
    catalog.consumers(condition).all(|rule| {
        let blocked = states
            .get(&rule.id)
            .map(|s| s.status == RuleStatus::Blocked)
            .unwrap_or(false);
        if blocked {
            return true;
        }
        if rule.is_or_rule {
            return false;
        }
        rule.conditions.iter().any(|other| {
            other != condition
                && effective_value(catalog, memory, other) == Some(FactStatus::False)
        })
    })
}

/// Walk up through the rules consuming `condition`; if any ancestor action
/// is already determined (by hypothesis or answer), this condition no
/// longer needs asking. Bounded and cycle-guarded.
fn ancestor_resolved(
    catalog: &Catalog,
    memory: &WorkingMemory,
    condition: &str,
    visited: &mut HashSet<String>,
    depth: usize,
) -> bool {
    if depth > MAX_ANCESTOR_DEPTH {
        return false;
    }
    if !visited.insert(condition.to_string()) {
        return false;
    }

    for rule in catalog.consumers(condition) {
        let action = rule.action.as_str();

        if let Some(value) = memory.hypotheses.get(action) {
            if value.is_determined() {
                return true;
            }
        }
        if let Some(value) = memory.findings.get(action) {
            if value.is_determined() {
                return true;
            }
        }

        if ancestor_resolved(catalog, memory, action, visited, depth + 1) {
            return true;
        }
    }
    false
}
