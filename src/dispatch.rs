//! Operation dispatch shared by the MCP server, the HTTP API and the CLI.
//!
//! A call arrives as an operation name plus JSON arguments, is decoded into a
//! [`GenerationRequest`], validated, and routed to the generator, lookup or
//! transcript service that handles it.

use crate::completion::{CompletionService, OpenAICompletion};
use crate::config::{Prompts, Settings};
use crate::error::{CourseGenError, Result};
use crate::generation::{self, Outcome, OutcomeStatus};
use crate::lookup::{self, SerpApiSearch, VideoSearch};
use crate::transcript::{TranscriptService, WhisperTranscript};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const GENERATE_COURSE: &str = "generate_course";
pub const FIND_VIDEO: &str = "find_video";
pub const GENERATE_QUIZ: &str = "generate_quiz";
pub const GET_TRANSCRIPT: &str = "get_transcript";
pub const GENERATE_HOMEWORK: &str = "generate_homework";
pub const GENERATE_SOLUTION: &str = "generate_solution";

/// Every operation name, in the order tools are advertised.
pub const OPERATIONS: [&str; 6] = [
    GENERATE_COURSE,
    FIND_VIDEO,
    GENERATE_QUIZ,
    GET_TRANSCRIPT,
    GENERATE_HOMEWORK,
    GENERATE_SOLUTION,
];

/// Shortest video a quiz can be requested for, in minutes.
pub const MIN_QUIZ_DURATION: u32 = 5;

/// A decoded operation call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "snake_case")]
pub enum GenerationRequest {
    GenerateCourse {
        title: String,
        sessions: u32,
        topics: u32,
    },
    FindVideo {
        topic: String,
    },
    GenerateQuiz {
        title: String,
        duration: u32,
    },
    GetTranscript {
        url: String,
    },
    GenerateHomework {
        transcript: String,
    },
    GenerateSolution {
        problem: String,
        skeleton: String,
    },
}

impl GenerationRequest {
    /// Decode a call by operation name and JSON arguments.
    pub fn from_call(name: &str, arguments: Value) -> Result<Self> {
        if !OPERATIONS.contains(&name) {
            return Err(CourseGenError::UnknownOperation(name.to_string()));
        }

        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        let tagged = serde_json::json!({ "operation": name, "arguments": arguments });
        serde_json::from_value(tagged)
            .map_err(|e| CourseGenError::InvalidInput(format!("{}: {}", name, e)))
    }

    /// Operation name of this request.
    pub fn name(&self) -> &'static str {
        match self {
            GenerationRequest::GenerateCourse { .. } => GENERATE_COURSE,
            GenerationRequest::FindVideo { .. } => FIND_VIDEO,
            GenerationRequest::GenerateQuiz { .. } => GENERATE_QUIZ,
            GenerationRequest::GetTranscript { .. } => GET_TRANSCRIPT,
            GenerationRequest::GenerateHomework { .. } => GENERATE_HOMEWORK,
            GenerationRequest::GenerateSolution { .. } => GENERATE_SOLUTION,
        }
    }

    /// Range and format checks that the argument types alone do not express.
    pub fn validate(&self) -> Result<()> {
        match self {
            GenerationRequest::GenerateCourse {
                title,
                sessions,
                topics,
            } => {
                non_blank("title", title)?;
                at_least("sessions", *sessions, 1)?;
                at_least("topics", *topics, 1)
            }
            GenerationRequest::FindVideo { topic } => non_blank("topic", topic),
            GenerationRequest::GenerateQuiz { title, duration } => {
                non_blank("title", title)?;
                at_least("duration", *duration, MIN_QUIZ_DURATION)
            }
            GenerationRequest::GetTranscript { url } => {
                let parsed = url::Url::parse(url).map_err(|e| {
                    CourseGenError::InvalidInput(format!("url '{}' is not valid: {}", url, e))
                })?;
                match parsed.scheme() {
                    "http" | "https" => Ok(()),
                    other => Err(CourseGenError::InvalidInput(format!(
                        "url must be http or https, got '{}'",
                        other
                    ))),
                }
            }
            GenerationRequest::GenerateHomework { transcript } => {
                non_blank("transcript", transcript)
            }
            GenerationRequest::GenerateSolution { problem, .. } => non_blank("problem", problem),
        }
    }
}

fn non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CourseGenError::InvalidInput(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn at_least(field: &str, value: u32, min: u32) -> Result<()> {
    if value < min {
        return Err(CourseGenError::InvalidInput(format!(
            "{} must be at least {}, got {}",
            field, min, value
        )));
    }
    Ok(())
}

/// Result of one dispatched operation, ready for any front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub operation: &'static str,
    pub status: OutcomeStatus,
    /// Sequence items dropped during hydration.
    pub dropped: usize,
    pub data: Value,
}

impl OperationResult {
    fn from_outcome<T: Serialize>(operation: &'static str, outcome: Outcome<T>) -> Result<Self> {
        let status = outcome.status();
        let dropped = outcome.dropped();
        if dropped > 0 {
            warn!("{}: returning partial result, {} items dropped", operation, dropped);
        }

        Ok(Self {
            operation,
            status,
            dropped,
            data: serde_json::to_value(outcome.into_value())?,
        })
    }
}

/// Routes operation calls to their implementations.
pub struct Dispatcher {
    settings: Settings,
    prompts: Prompts,
    completion: Arc<dyn CompletionService>,
    search: Arc<dyn VideoSearch>,
    transcriber: Arc<dyn TranscriptService>,
}

impl Dispatcher {
    /// Create a dispatcher backed by OpenAI and SerpAPI.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let completion = OpenAICompletion::from_settings(&settings.llm)?;
        info!("Using completion model {}", completion.model());

        let search = SerpApiSearch::from_settings(&settings)?;
        let transcriber = WhisperTranscript::from_settings(&settings)?;

        Ok(Self::with_components(
            settings,
            prompts,
            Arc::new(completion),
            Arc::new(search),
            Arc::new(transcriber),
        ))
    }

    /// Create a dispatcher with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        completion: Arc<dyn CompletionService>,
        search: Arc<dyn VideoSearch>,
        transcriber: Arc<dyn TranscriptService>,
    ) -> Self {
        Self {
            settings,
            prompts,
            completion,
            search,
            transcriber,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decode, validate and run a call by name.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<OperationResult> {
        let request = GenerationRequest::from_call(name, arguments)?;
        self.dispatch(request).await
    }

    /// Validate and run a decoded request.
    #[instrument(skip_all, fields(operation = request.name()))]
    pub async fn dispatch(&self, request: GenerationRequest) -> Result<OperationResult> {
        request.validate()?;

        let operation = request.name();
        let limits = &self.settings.generation;
        let completion = self.completion.as_ref();

        match request {
            GenerationRequest::GenerateCourse {
                title,
                sessions,
                topics,
            } => {
                let outcome = generation::generate_course(
                    completion,
                    &self.prompts,
                    &limits.course,
                    &title,
                    sessions,
                    topics,
                )
                .await?;
                OperationResult::from_outcome(operation, outcome)
            }
            GenerationRequest::FindVideo { topic } => {
                let found = lookup::find_video(self.search.as_ref(), &topic).await?;
                let status = if found.is_some() {
                    OutcomeStatus::Complete
                } else {
                    OutcomeStatus::NotFound
                };
                Ok(OperationResult {
                    operation,
                    status,
                    dropped: 0,
                    data: serde_json::to_value(found)?,
                })
            }
            GenerationRequest::GenerateQuiz { title, duration } => {
                let outcome = generation::generate_quiz(
                    completion,
                    &self.prompts,
                    &limits.quiz,
                    &title,
                    duration,
                )
                .await?;
                OperationResult::from_outcome(operation, outcome)
            }
            GenerationRequest::GetTranscript { url } => {
                let outcome = match self.transcriber.transcribe(&url).await {
                    Ok(text) => Outcome::Complete(text),
                    Err(e) => {
                        warn!("Transcript for {} failed: {}", url, e);
                        Outcome::Fallback(String::new())
                    }
                };
                OperationResult::from_outcome(operation, outcome)
            }
            GenerationRequest::GenerateHomework { transcript } => {
                let outcome = generation::generate_homework(
                    completion,
                    &self.prompts,
                    &limits.homework,
                    &transcript,
                )
                .await?;
                OperationResult::from_outcome(operation, outcome)
            }
            GenerationRequest::GenerateSolution { problem, skeleton } => {
                let outcome = generation::generate_solution(
                    completion,
                    &self.prompts,
                    &limits.solution,
                    &problem,
                    &skeleton,
                )
                .await?;
                OperationResult::from_outcome(operation, outcome)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stub components for dispatcher tests across the crate.

    use super::*;
    use crate::completion::ScriptedCompletion;
    use crate::lookup::VideoCandidate;
    use async_trait::async_trait;

    pub struct FixedSearch(pub Vec<VideoCandidate>);

    #[async_trait]
    impl VideoSearch for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<VideoCandidate>> {
            Ok(self.0.clone())
        }
    }

    /// Transcriber returning fixed text, or failing when `None`.
    pub struct FixedTranscript(pub Option<String>);

    #[async_trait]
    impl TranscriptService for FixedTranscript {
        async fn transcribe(&self, _url: &str) -> Result<String> {
            self.0
                .clone()
                .ok_or_else(|| CourseGenError::ToolNotFound("yt-dlp".to_string()))
        }
    }

    pub fn candidate(title: &str, length: &str) -> VideoCandidate {
        VideoCandidate {
            title: title.to_string(),
            link: format!("https://www.youtube.com/watch?v={}", title),
            length: Some(length.to_string()),
        }
    }

    pub fn dispatcher(completion: ScriptedCompletion) -> Dispatcher {
        dispatcher_with(
            completion,
            vec![candidate("short", "9:59"), candidate("right", "17:42")],
            Some("Today we cover for loops.".to_string()),
        )
    }

    pub fn dispatcher_with(
        completion: ScriptedCompletion,
        videos: Vec<VideoCandidate>,
        transcript: Option<String>,
    ) -> Dispatcher {
        Dispatcher::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(completion),
            Arc::new(FixedSearch(videos)),
            Arc::new(FixedTranscript(transcript)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::completion::{CompletionError, ScriptedCompletion};
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_from_call_decodes_arguments() {
        let request = GenerationRequest::from_call(
            "generate_course",
            json!({"title": "Rust", "sessions": 3, "topics": 2}),
        )
        .unwrap();
        assert_eq!(
            request,
            GenerationRequest::GenerateCourse {
                title: "Rust".to_string(),
                sessions: 3,
                topics: 2
            }
        );
        assert_eq!(request.name(), GENERATE_COURSE);
    }

    #[test]
    fn test_from_call_errors() {
        let unknown = GenerationRequest::from_call("delete_course", json!({})).unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::NotFound);

        let missing = GenerationRequest::from_call("generate_quiz", json!({"title": "x"})).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::InvalidInput);

        let negative =
            GenerationRequest::from_call("generate_quiz", json!({"title": "x", "duration": -5}))
                .unwrap_err();
        assert_eq!(negative.kind(), ErrorKind::InvalidInput);

        let no_args = GenerationRequest::from_call("find_video", Value::Null).unwrap_err();
        assert_eq!(no_args.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_validate_ranges() {
        let course = |sessions, topics| GenerationRequest::GenerateCourse {
            title: "Rust".to_string(),
            sessions,
            topics,
        };
        assert!(course(1, 1).validate().is_ok());
        assert!(course(0, 1).validate().is_err());
        assert!(course(1, 0).validate().is_err());

        let quiz = |duration| GenerationRequest::GenerateQuiz {
            title: "Loops".to_string(),
            duration,
        };
        assert!(quiz(5).validate().is_ok());
        assert!(quiz(4).validate().is_err());

        let blank = GenerationRequest::FindVideo {
            topic: "  ".to_string(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_validate_url() {
        let transcript = |url: &str| GenerationRequest::GetTranscript {
            url: url.to_string(),
        };
        assert!(transcript("https://www.youtube.com/watch?v=abc").validate().is_ok());
        assert!(transcript("not a url").validate().is_err());
        assert!(transcript("ftp://example.com/a.mp3").validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_model() {
        let service = Arc::new(ScriptedCompletion::replying("[]"));
        let dispatcher = Dispatcher::with_components(
            Settings::default(),
            Prompts::default(),
            service.clone(),
            Arc::new(FixedSearch(vec![])),
            Arc::new(FixedTranscript(None)),
        );

        let err = dispatcher
            .call("generate_quiz", json!({"title": "Loops", "duration": 2}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_quiz_end_to_end() {
        let reply = r#"[
            {"question": "Q1", "options": ["a", "b", "c", "d"], "correct_answer": "a"},
            {"question": "Q2", "options": ["a", "b", "c", "d"], "correct_answer": "b"},
            {"question": "Q3", "options": ["a", "b", "c", "d"], "correct_answer": "z"}
        ]"#;
        let dispatcher = dispatcher(ScriptedCompletion::replying(reply));

        let result = dispatcher
            .call("generate_quiz", json!({"title": "Intro to Loops", "duration": 15}))
            .await
            .unwrap();

        assert_eq!(result.operation, GENERATE_QUIZ);
        assert_eq!(result.status, OutcomeStatus::Partial);
        assert_eq!(result.dropped, 1);
        assert_eq!(result.data.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_course_failure_is_error() {
        let dispatcher = dispatcher(ScriptedCompletion::failing(CompletionError::Auth(
            "no key".to_string(),
        )));
        let err = dispatcher
            .call(
                "generate_course",
                json!({"title": "Rust", "sessions": 1, "topics": 1}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
    }

    #[tokio::test]
    async fn test_find_video_found_and_not_found() {
        let found = dispatcher(ScriptedCompletion::new(vec![]))
            .call("find_video", json!({"topic": "loops"}))
            .await
            .unwrap();
        assert_eq!(found.status, OutcomeStatus::Complete);
        assert_eq!(found.data["title"], "right");
        assert_eq!(found.data["duration_minutes"], 17);

        let missing = dispatcher_with(
            ScriptedCompletion::new(vec![]),
            vec![candidate("five", "5:00"), candidate("thirty", "30:00")],
            None,
        )
        .call("find_video", json!({"topic": "loops"}))
        .await
        .unwrap();
        assert_eq!(missing.status, OutcomeStatus::NotFound);
        assert!(missing.data.is_null());
    }

    #[tokio::test]
    async fn test_transcript_failure_is_empty_fallback() {
        let ok = dispatcher(ScriptedCompletion::new(vec![]))
            .call("get_transcript", json!({"url": "https://youtu.be/abc"}))
            .await
            .unwrap();
        assert_eq!(ok.status, OutcomeStatus::Complete);
        assert_eq!(ok.data, json!("Today we cover for loops."));

        let failed = dispatcher_with(ScriptedCompletion::new(vec![]), vec![], None)
            .call("get_transcript", json!({"url": "https://youtu.be/abc"}))
            .await
            .unwrap();
        assert_eq!(failed.status, OutcomeStatus::Fallback);
        assert_eq!(failed.data, json!(""));
    }

    #[tokio::test]
    async fn test_solution_fallback_through_dispatch() {
        let dispatcher = dispatcher(ScriptedCompletion::failing(CompletionError::Network(
            "reset".to_string(),
        )));
        let result = dispatcher
            .call(
                "generate_solution",
                json!({"problem": "reverse a list", "skeleton": "def rev(x): pass"}),
            )
            .await
            .unwrap();

        assert_eq!(result.status, OutcomeStatus::Fallback);
        assert_eq!(result.data["solution_code"], crate::schema::SOLUTION_UNAVAILABLE);
        assert_eq!(result.data["problem_statement"], "reverse a list");
    }
}
