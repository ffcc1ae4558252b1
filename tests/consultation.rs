//! End-to-end consultation tests.
//!
//! These drive the session façade exactly as an outer dialogue server
//! would, validating the planner, evaluator and propagator together.

use std::sync::Arc;

use visa_counsel::catalog::Catalog;
use visa_counsel::config::VisaTypeConfig;
use visa_counsel::fact::{Answer, FactStatus};
use visa_counsel::rule::{Rule, RuleStatus};
use visa_counsel::session::Session;

fn session_of(rules: Vec<Rule>, goals: &[&str]) -> Session {
    let catalog = Catalog::new(
        rules,
        goals.iter().map(|g| g.to_string()).collect(),
        VisaTypeConfig::fallback(),
    );
    Session::new(Arc::new(catalog))
}

/// Answer the session's current question until complete or `max` answers.
fn drive_all(session: &mut Session, answer: Answer, max: usize) -> usize {
    let mut count = 0;
    while count < max {
        let question = match session.current_question() {
            Some(q) => q.to_string(),
            None => break,
        };
        count += 1;
        let outcome = session.answer(&question, answer).unwrap();
        if outcome.is_complete {
            break;
        }
    }
    count
}

#[test]
fn straight_yes_path() {
    let mut session = session_of(
        vec![
            Rule::new("G1", vec!["c1".into(), "c2".into()], "E-visa applicable")
                .with_visa_type("E")
                .goal(),
        ],
        &["E-visa applicable"],
    );

    let q1 = session.start().question.unwrap();
    let out = session.answer(&q1, Answer::Yes).unwrap();
    let q2 = out.next_question.unwrap();
    let out = session.answer(&q2, Answer::Yes).unwrap();

    assert!(out.is_complete);
    let diagnosis = out.diagnosis.unwrap();
    assert_eq!(diagnosis.applicable.len(), 1);
    assert_eq!(diagnosis.applicable[0].action, "E-visa applicable");
    assert_eq!(diagnosis.applicable[0].visa_type, "E");
    assert!(diagnosis.conditional.is_empty());
}

#[test]
fn or_rule_fires_and_prunes_sibling_disjunct() {
    let mut session = session_of(
        vec![
            Rule::new("R1", vec!["a".into(), "b".into()], "P").or_rule(),
            Rule::new("G1", vec!["P".into()], "goal").goal(),
        ],
        &["goal"],
    );

    session.start();
    // Answer the subtree leaf directly: a=yes fires the OR, derives P,
    // fires the goal, and b must never be asked.
    let out = session.answer("a", Answer::Yes).unwrap();

    assert!(out.is_complete, "next question was {:?}", out.next_question);
    assert!(out.derived_facts.contains(&"P".to_string()));
    let diagnosis = out.diagnosis.unwrap();
    assert_eq!(diagnosis.applicable.len(), 1);
    assert_eq!(diagnosis.applicable[0].action, "goal");
}

#[test]
fn unknown_on_derived_condition_expands_subtree() {
    let mut session = session_of(
        vec![
            Rule::new("R1", vec!["x1".into(), "x2".into()], "P"),
            Rule::new("G1", vec!["P".into(), "y".into()], "goal").goal(),
        ],
        &["goal"],
    );

    // Bucket priority asks the goal-direct base condition first.
    let q = session.start().question.unwrap();
    assert_eq!(q, "y");
    let out = session.answer("y", Answer::Yes).unwrap();
    assert_eq!(out.next_question.as_deref(), Some("P"));

    // "unknown" on the derived parent descends into its sub-conditions.
    let out = session.answer("P", Answer::Unknown).unwrap();
    assert_eq!(out.next_question.as_deref(), Some("x1"));
    let out = session.answer("x1", Answer::Yes).unwrap();
    assert_eq!(out.next_question.as_deref(), Some("x2"));
    let out = session.answer("x2", Answer::Yes).unwrap();

    assert!(out.is_complete);
    assert!(out.derived_facts.contains(&"P".to_string()));
    let diagnosis = out.diagnosis.unwrap();
    assert_eq!(diagnosis.applicable.len(), 1);
    assert_eq!(diagnosis.applicable[0].action, "goal");
    // The literal unknown on P is still reported.
    assert_eq!(diagnosis.unknown_conditions, vec!["P".to_string()]);
}

#[test]
fn and_block_shortcut_skips_doomed_sibling() {
    let mut session = session_of(
        vec![Rule::new("G1", vec!["c1".into(), "c2".into()], "goal").goal()],
        &["goal"],
    );

    let q1 = session.start().question.unwrap();
    assert_eq!(q1, "c1");
    let out = session.answer("c1", Answer::No).unwrap();

    // c2 is moot: the only rule using it is already blocked.
    assert!(out.is_complete);
    assert_eq!(out.next_question, None);
    let diagnosis = out.diagnosis.unwrap();
    assert!(diagnosis.applicable.is_empty());
    // Blocked goals are excluded, not conditional.
    assert!(diagnosis.conditional.is_empty());
}

#[test]
fn rewind_and_diverge() {
    let mut session = session_of(
        vec![Rule::new("G1", vec!["c1".into(), "c2".into()], "goal").goal()],
        &["goal"],
    );

    let q1 = session.start().question.unwrap();
    let q2 = session.answer(&q1, Answer::Yes).unwrap().next_question.unwrap();
    let out = session.answer(&q2, Answer::Yes).unwrap();
    assert!(out.is_complete);

    let back = session.back(1);
    assert_eq!(back.current_question.as_deref(), Some(q2.as_str()));
    assert_eq!(back.answered_questions.len(), 1);
    assert_eq!(back.answered_questions[0].condition, q1);
    let g1 = back.rules.iter().find(|r| r.id == "G1").unwrap();
    assert_eq!(g1.status, RuleStatus::Evaluating);

    let out = session.answer(&q2, Answer::No).unwrap();
    assert!(out.is_complete);
    let diagnosis = out.diagnosis.unwrap();
    assert!(diagnosis.applicable.is_empty());
}

#[test]
fn replay_after_rewind_reproduces_state() {
    let rules = vec![
        Rule::new("R1", vec!["x1".into(), "x2".into()], "P"),
        Rule::new("G1", vec!["P".into(), "y".into()], "goal").goal(),
    ];
    let mut session = session_of(rules, &["goal"]);
    session.start();

    // Record a run.
    let mut answers: Vec<(String, Answer)> = Vec::new();
    let plan = [Answer::Yes, Answer::Unknown, Answer::Yes, Answer::Yes];
    for answer in plan {
        let q = session.current_question().unwrap().to_string();
        answers.push((q.clone(), answer));
        session.answer(&q, answer).unwrap();
    }
    let before = session.state();
    assert!(before.is_complete);

    // Rewind to the beginning and replay the same answers.
    session.back(answers.len());
    for (condition, answer) in &answers {
        assert_eq!(session.current_question(), Some(condition.as_str()));
        session.answer(condition, *answer).unwrap();
    }
    let after = session.state();

    assert_eq!(after.current_question, before.current_question);
    assert_eq!(after.rules, before.rules);
    assert_eq!(after.derived_facts, before.derived_facts);
    assert_eq!(after.is_complete, before.is_complete);
    assert_eq!(
        after.diagnosis.map(|d| (d.applicable, d.conditional, d.unknown_conditions)),
        before.diagnosis.map(|d| (d.applicable, d.conditional, d.unknown_conditions)),
    );
}

#[test]
fn restart_replay_reproduces_diagnosis() {
    let rules = vec![
        Rule::new("R1", vec!["a".into(), "b".into()], "P").or_rule(),
        Rule::new("G1", vec!["P".into(), "y".into()], "goal").goal(),
    ];
    let mut session = session_of(rules, &["goal"]);
    session.start();

    let mut answers: Vec<(String, Answer)> = Vec::new();
    while let Some(q) = session.current_question().map(str::to_string) {
        answers.push((q.clone(), Answer::Yes));
        if session.answer(&q, Answer::Yes).unwrap().is_complete {
            break;
        }
    }
    let before = session.diagnosis();

    session.restart();
    for (condition, answer) in &answers {
        session.answer(condition, *answer).unwrap();
    }
    let after = session.diagnosis();

    assert_eq!(before.applicable, after.applicable);
    assert_eq!(before.conditional, after.conditional);
    assert_eq!(before.unknown_conditions, after.unknown_conditions);
}

#[test]
fn all_unknown_terminates_with_no_applicable() {
    // A small multi-visa catalogue with derived middles.
    let rules = vec![
        Rule::new("E001", vec!["e1".into(), "e_mid".into()], "E goal")
            .with_visa_type("E")
            .goal(),
        Rule::new("E002", vec!["e2".into(), "e3".into()], "e_mid").with_visa_type("E"),
        Rule::new("L001", vec!["l1".into(), "l2".into()], "L goal")
            .with_visa_type("L")
            .goal(),
        Rule::new("B001", vec!["b1".into()], "B goal")
            .with_visa_type("B")
            .goal(),
    ];
    let mut session = session_of(rules, &["E goal", "L goal", "B goal"]);
    session.start();

    // Must terminate within the number of askable conditions.
    let askable = 8; // e1, e_mid, e2, e3, l1, l2, b1 (+ slack)
    let steps = drive_all(&mut session, Answer::Unknown, askable + 1);
    assert!(steps <= askable, "took {steps} answers");

    let state = session.state();
    assert!(state.is_complete);
    let diagnosis = state.diagnosis.unwrap();
    assert!(diagnosis.applicable.is_empty());

    // Every goal ended uncertain or blocked.
    let goals = ["E goal", "L goal", "B goal"];
    for rule in state
        .rules
        .iter()
        .filter(|r| goals.contains(&r.conclusion.as_str()))
    {
        assert!(matches!(
            rule.status,
            RuleStatus::Uncertain | RuleStatus::Blocked
        ));
    }

    // Every unknown answer is reported.
    for answered in &state.answered_questions {
        assert_eq!(answered.answer, FactStatus::Unknown);
        assert!(diagnosis.unknown_conditions.contains(&answered.condition));
    }
}

#[test]
fn blocked_sole_producer_negatively_resolves_consumers() {
    // P's only producer blocks; the AND consumer of P must block through
    // the propagated false.
    let mut session = session_of(
        vec![
            Rule::new("R1", vec!["x".into()], "P"),
            Rule::new("G1", vec!["P".into(), "y".into()], "goal").goal(),
        ],
        &["goal"],
    );

    session.start();
    let out = session.answer("x", Answer::No).unwrap();

    assert!(out.is_complete);
    assert!(out.derived_facts.contains(&"P".to_string()));
    let diagnosis = out.diagnosis.unwrap();
    assert!(diagnosis.applicable.is_empty());
    assert!(diagnosis.conditional.is_empty());
}

#[test]
fn or_consumer_treats_blocked_producer_as_negatively_resolved() {
    // The OR goal's disjuncts: a (base, answered unknown) and P (derived,
    // answered unknown, sole producer blocked). Both negatively resolved
    // => goal uncertain, not stuck.
    let mut session = session_of(
        vec![
            Rule::new("R1", vec!["x".into()], "P"),
            Rule::new("G1", vec!["a".into(), "P".into()], "goal")
                .or_rule()
                .goal(),
        ],
        &["goal"],
    );

    session.start();
    let steps = drive_all(&mut session, Answer::Unknown, 10);
    assert!(steps <= 4, "took {steps} answers");

    let state = session.state();
    assert!(state.is_complete);
    let g1 = state.rules.iter().find(|r| r.id == "G1").unwrap();
    assert_eq!(g1.status, RuleStatus::Uncertain);
    let diagnosis = state.diagnosis.unwrap();
    assert!(diagnosis.applicable.is_empty());
    assert_eq!(diagnosis.conditional.len(), 1);
    assert_eq!(diagnosis.conditional[0].action, "goal");
}

#[test]
fn derived_conditions_are_askable_and_short_circuit() {
    // A knowledgeable user answers the derived parent directly; the
    // subtree below it is never visited.
    let mut session = session_of(
        vec![
            Rule::new("R1", vec!["x1".into(), "x2".into()], "P"),
            Rule::new("G1", vec!["P".into()], "goal").goal(),
        ],
        &["goal"],
    );

    let q = session.start().question.unwrap();
    assert_eq!(q, "P");
    let out = session.answer("P", Answer::Yes).unwrap();

    assert!(out.is_complete);
    assert_eq!(out.diagnosis.unwrap().applicable.len(), 1);
}

#[test]
fn multi_visa_condition_asked_once_in_earliest_bucket() {
    let rules = vec![
        Rule::new("E001", vec!["shared".into(), "e1".into()], "E goal")
            .with_visa_type("E")
            .goal(),
        Rule::new("L001", vec!["shared".into(), "l1".into()], "L goal")
            .with_visa_type("L")
            .goal(),
    ];
    let mut session = session_of(rules, &["E goal", "L goal"]);
    session.start();

    let mut asked = Vec::new();
    while let Some(q) = session.current_question().map(str::to_string) {
        asked.push(q.clone());
        if session.answer(&q, Answer::Yes).unwrap().is_complete {
            break;
        }
    }

    let shared_count = asked.iter().filter(|q| *q == "shared").count();
    assert_eq!(shared_count, 1, "asked: {asked:?}");
    // The shared condition belongs to the E bucket (earliest order) and
    // carries the multi-visa bonus, so it leads.
    assert_eq!(asked[0], "shared");
}
