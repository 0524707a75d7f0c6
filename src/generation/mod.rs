//! LLM-backed generation of courses, quizzes, homework and solutions.
//!
//! Every operation runs through [`pipeline::request_json`] and then applies its
//! own failure policy: course generation fails hard, the others degrade to a
//! fallback value.

mod course;
mod homework;
pub mod pipeline;
mod quiz;
pub mod sanitize;
mod solution;

pub use course::generate_course;
pub use homework::generate_homework;
pub use pipeline::{request_json, AttemptFailure, GenerationFailure, PromptJob, RetryDecision};
pub use quiz::{generate_quiz, quiz_size};
pub use sanitize::strip_code_fences;
pub use solution::generate_solution;

use serde::{Deserialize, Serialize};

/// A successful result, tagged with how complete it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Everything the model produced was valid.
    Complete(T),
    /// Some items failed validation and were dropped.
    Partial { value: T, dropped: usize },
    /// Generation failed and a placeholder value stands in.
    Fallback(T),
}

impl<T> Outcome<T> {
    /// Wrap a hydrated item list, marking it partial when anything was dropped.
    pub fn from_items(value: T, dropped: usize) -> Self {
        if dropped == 0 {
            Outcome::Complete(value)
        } else {
            Outcome::Partial { value, dropped }
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Complete(v) | Outcome::Fallback(v) => v,
            Outcome::Partial { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Complete(v) | Outcome::Fallback(v) => v,
            Outcome::Partial { value, .. } => value,
        }
    }

    /// Number of items dropped during hydration.
    pub fn dropped(&self) -> usize {
        match self {
            Outcome::Partial { dropped, .. } => *dropped,
            _ => 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback(_))
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            Outcome::Complete(_) => OutcomeStatus::Complete,
            Outcome::Partial { .. } => OutcomeStatus::Partial,
            Outcome::Fallback(_) => OutcomeStatus::Fallback,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Complete(v) => Outcome::Complete(f(v)),
            Outcome::Partial { value, dropped } => Outcome::Partial {
                value: f(value),
                dropped,
            },
            Outcome::Fallback(v) => Outcome::Fallback(f(v)),
        }
    }
}

/// Wire-level status of an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Complete,
    Partial,
    Fallback,
    /// A lookup ran successfully and found nothing.
    NotFound,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Complete => "complete",
            OutcomeStatus::Partial => "partial",
            OutcomeStatus::Fallback => "fallback",
            OutcomeStatus::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
