//! # visa-counsel
//!
//! An interactive rule-based expert system for visa-type selection. The
//! core is a backward-chaining inference engine that plans a question
//! queue from goal rules, conducts a yes/no/unknown dialogue, propagates
//! derived facts forward, prunes subtrees whose conclusions are already
//! settled, supports rewinding answers, and classifies every goal
//! conclusion as applicable, conditional or excluded.
//!
//! ## Architecture
//!
//! - **Fact model** (`fact`): the trilean-plus-pending truth values
//! - **Working memory** (`memory`): findings, hypotheses, answer history
//! - **Catalogue** (`catalog`, `loader`, `config`): immutable rule
//!   snapshot built from `rules.json` + `visa_types.toml`
//! - **Inference** (`evaluator`, `propagate`): pure rule classification
//!   and the hypothesis fixpoint
//! - **Planning** (`planner`): question ordering, pruning, and dynamic
//!   expansion on "unknown"
//! - **Sessions** (`session`, `registry`): the dialogue façade and the
//!   concurrent map an outer server drives
//! - **Tooling** (`validate`, `export`): catalogue integrity checks and
//!   CSV round-trips
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use visa_counsel::catalog::Catalog;
//! use visa_counsel::config::VisaTypeConfig;
//! use visa_counsel::fact::Answer;
//! use visa_counsel::rule::Rule;
//! use visa_counsel::session::Session;
//!
//! let rules = vec![
//!     Rule::new("R001", vec!["has treaty trade".into()], "E-visa applicable")
//!         .with_visa_type("E")
//!         .goal(),
//! ];
//! let catalog = Catalog::new(
//!     rules,
//!     vec!["E-visa applicable".into()],
//!     VisaTypeConfig::fallback(),
//! );
//! let mut session = Session::new(Arc::new(catalog));
//! let first = session.start().question.unwrap();
//! let outcome = session.answer(&first, Answer::Yes).unwrap();
//! assert!(outcome.is_complete);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod fact;
pub mod loader;
pub mod memory;
pub mod planner;
pub mod propagate;
pub mod registry;
pub mod report;
pub mod rule;
pub mod session;
pub mod validate;
