//! Trilean fact model shared by working memory and rule evaluation.
//!
//! `Pending` is a fourth tag, not absence-of-key: the OR-rule evaluation
//! needs to distinguish "the user said they don't know" from "nobody was
//! ever asked".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Truth value of a condition in working memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactStatus {
    True,
    False,
    Unknown,
    /// Never stored / never asked. Distinct from an explicit `Unknown` answer.
    Pending,
}

impl FactStatus {
    /// Whether this value settles the condition one way or the other.
    pub fn is_determined(self) -> bool {
        matches!(self, FactStatus::True | FactStatus::False)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FactStatus::True => "true",
            FactStatus::False => "false",
            FactStatus::Unknown => "unknown",
            FactStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for FactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's answer to the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
    Unknown,
}

impl Answer {
    /// Parse the wire form (`yes`, `no`, `unknown`). Accepts single-letter
    /// shorthand for interactive use.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => Some(Answer::Yes),
            "no" | "n" => Some(Answer::No),
            "unknown" | "u" | "?" => Some(Answer::Unknown),
            _ => None,
        }
    }

    /// The fact recorded in working memory for this answer.
    pub fn fact(self) -> FactStatus {
        match self {
            Answer::Yes => FactStatus::True,
            Answer::No => FactStatus::False,
            Answer::Unknown => FactStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
