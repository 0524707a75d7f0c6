//! Validated result shapes.
//!
//! Course → Session → Topic → TopicQuestion is a strict ownership tree built
//! fresh for each request. Hydration from model output lives next to each type.

pub mod hydrate;

pub use hydrate::HydrationError;

use hydrate::{
    object, optional_array, optional_string, optional_string_list, optional_u32, required_string,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel solution text marking a soft failure of solution generation.
pub const SOLUTION_UNAVAILABLE: &str = "# Unable to generate solution";

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl TopicQuestion {
    /// Generic question used when no real question could be generated.
    pub fn placeholder(subject: &str) -> Self {
        Self {
            question: format!("What is the main concept of '{}'?", subject),
            options: ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
            correct_answer: "A".to_string(),
        }
    }

    /// Build a question from model output.
    ///
    /// The question text is required and exactly one option must equal the
    /// correct answer.
    pub fn hydrate(value: &Value) -> Result<Self, HydrationError> {
        let fields = object(value, "question")?;
        let question = Self {
            question: required_string(fields, "question")?,
            options: optional_string_list(fields, "options")?,
            correct_answer: optional_string(fields, "correct_answer")?,
        };
        question.validate()?;
        Ok(question)
    }

    /// Check the single-correct-answer invariant.
    pub fn validate(&self) -> Result<(), HydrationError> {
        let matches = self
            .options
            .iter()
            .filter(|o| **o == self.correct_answer)
            .count();
        match matches {
            1 => Ok(()),
            0 => Err(HydrationError::new(format!(
                "correct answer '{}' is not one of the options",
                self.correct_answer
            ))),
            n => Err(HydrationError::new(format!(
                "correct answer '{}' appears {} times in the options",
                self.correct_answer, n
            ))),
        }
    }
}

/// A topic within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub duration_minutes: u32,
    pub youtube_url: String,
    pub questions: Vec<TopicQuestion>,
}

impl Topic {
    /// Outline generation only fills in the title; the rest stays empty until
    /// a video and quiz are attached.
    pub fn hydrate(value: &Value) -> Result<Self, HydrationError> {
        let fields = object(value, "topic")?;
        Ok(Self {
            title: required_string(fields, "title")?,
            duration_minutes: 0,
            youtube_url: String::new(),
            questions: Vec::new(),
        })
    }
}

/// One session of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_no: u32,
    pub session_name: String,
    pub learning_objectives: Vec<String>,
    pub topics: Vec<Topic>,
    pub coding_problem: String,
    pub coding_solution: String,
}

impl Session {
    pub fn hydrate(value: &Value) -> Result<Self, HydrationError> {
        let fields = object(value, "session")?;
        let topics = optional_array(fields, "topics")?
            .iter()
            .map(Topic::hydrate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            session_no: optional_u32(fields, "session_no")?,
            session_name: optional_string(fields, "session_name")?,
            learning_objectives: optional_string_list(fields, "learning_objectives")?,
            topics,
            coding_problem: String::new(),
            coding_solution: String::new(),
        })
    }
}

/// A generated course outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub subject: String,
    pub level: String,
    pub total_sessions: u32,
    pub sessions: Vec<Session>,
    pub created_at: String,
}

/// Caller-side values a course falls back to when the model omits them.
#[derive(Debug, Clone, Copy)]
pub struct CourseDefaults<'a> {
    pub subject: &'a str,
    pub total_sessions: u32,
}

impl Course {
    /// Build a course from model output.
    ///
    /// Any malformed session or topic fails the whole course, as does an
    /// outline with no sessions at all.
    pub fn hydrate(value: &Value, defaults: CourseDefaults<'_>) -> Result<Self, HydrationError> {
        let fields = object(value, "course")?;

        let sessions = optional_array(fields, "sessions")?
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Session::hydrate(s)
                    .map_err(|e| HydrationError::new(format!("session #{}: {}", i + 1, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if sessions.is_empty() {
            return Err(HydrationError::new("course outline has no sessions"));
        }

        let subject = optional_string(fields, "subject")?;
        let level = optional_string(fields, "level")?;
        let total_sessions = optional_u32(fields, "total_sessions")?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject: non_empty_or(subject, defaults.subject),
            level: non_empty_or(level, "beginner"),
            total_sessions: if total_sessions == 0 {
                defaults.total_sessions
            } else {
                total_sessions
            },
            sessions,
            created_at: chrono::Local::now().to_rfc3339(),
        })
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// A homework problem derived from a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkProblem {
    pub problem_statement: String,
    pub skeleton_code: String,
    pub hints: Vec<String>,
}

impl HomeworkProblem {
    pub fn hydrate(value: &Value) -> Result<Self, HydrationError> {
        let fields = object(value, "homework problem")?;
        Ok(Self {
            problem_statement: required_string(fields, "problem_statement")?,
            skeleton_code: optional_string(fields, "skeleton_code")?,
            hints: optional_string_list(fields, "hints")?,
        })
    }
}

/// A filled-in solution for a coding problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSolution {
    pub problem_statement: String,
    pub skeleton_code: String,
    pub solution_code: String,
}

impl ProblemSolution {
    /// Build a solution from model output.
    ///
    /// The statement and skeleton default to what the caller sent; the
    /// solution code is required.
    pub fn hydrate(value: &Value, problem: &str, skeleton: &str) -> Result<Self, HydrationError> {
        let fields = object(value, "solution")?;
        Ok(Self {
            problem_statement: non_empty_or(optional_string(fields, "problem_statement")?, problem),
            skeleton_code: non_empty_or(optional_string(fields, "skeleton_code")?, skeleton),
            solution_code: required_string(fields, "solution_code")?,
        })
    }

    /// Fallback returned when no solution could be generated.
    pub fn unavailable(problem: &str, skeleton: &str) -> Self {
        Self {
            problem_statement: problem.to_string(),
            skeleton_code: skeleton.to_string(),
            solution_code: SOLUTION_UNAVAILABLE.to_string(),
        }
    }

    /// Whether this is the "unable to generate" fallback rather than a real solution.
    pub fn is_unavailable(&self) -> bool {
        self.solution_code == SOLUTION_UNAVAILABLE
    }
}

/// A video accepted by the lookup adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMatch {
    pub url: String,
    pub title: String,
    pub duration_minutes: u32,
}
