//! Consultation benchmarks: queue construction and the all-unknown
//! worst case (maximum expansion and propagation work).

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use visa_counsel::catalog::Catalog;
use visa_counsel::config::VisaTypeConfig;
use visa_counsel::fact::Answer;
use visa_counsel::rule::Rule;
use visa_counsel::session::Session;

/// A layered synthetic catalogue: `goals` goal rules, each over a chain of
/// derived conditions `depth` deep with `width` base leaves per layer.
fn layered_catalog(goals: usize, depth: usize, width: usize) -> Catalog {
    let mut rules = Vec::new();
    let mut goal_actions = Vec::new();
    let codes = ["E", "L", "B", "H-1B", "J-1"];

    for g in 0..goals {
        let code = codes[g % codes.len()];
        let goal_action = format!("{code} goal {g}");
        goal_actions.push(goal_action.clone());

        let mut parent = goal_action;
        for d in 0..depth {
            let mut conditions: Vec<String> = (0..width)
                .map(|w| format!("{code} g{g} d{d} base {w}"))
                .collect();
            let child = format!("{code} g{g} derived {d}");
            if d + 1 < depth {
                conditions.push(child.clone());
            }
            rules.push(
                Rule::new(
                    format!("R{:03}", rules.len() + 1),
                    conditions,
                    parent.clone(),
                )
                .with_visa_type(code),
            );
            parent = child;
        }
    }

    Catalog::new(rules, goal_actions, VisaTypeConfig::fallback())
}

fn bench_start(c: &mut Criterion) {
    let catalog = Arc::new(layered_catalog(5, 4, 3));
    c.bench_function("start_5x4x3", |b| {
        b.iter(|| {
            let mut session = Session::new(catalog.clone());
            black_box(session.start());
        })
    });
}

fn bench_all_unknown(c: &mut Criterion) {
    let catalog = Arc::new(layered_catalog(5, 4, 3));
    c.bench_function("all_unknown_5x4x3", |b| {
        b.iter(|| {
            let mut session = Session::new(catalog.clone());
            session.start();
            while let Some(q) = session.current_question().map(str::to_string) {
                let outcome = session.answer(&q, Answer::Unknown).unwrap();
                if outcome.is_complete {
                    break;
                }
            }
            black_box(session.diagnosis())
        })
    });
}

criterion_group!(benches, bench_start, bench_all_unknown);
criterion_main!(benches);
