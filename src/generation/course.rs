use super::pipeline::{request_json, PromptJob};
use super::Outcome;
use crate::completion::CompletionService;
use crate::config::{GenerationLimits, Prompts};
use crate::error::{CourseGenError, Result};
use crate::schema::{Course, CourseDefaults};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Generate a course outline.
///
/// There is no fallback course: a service error, exhausted retries, or an
/// outline that does not hydrate are all returned as errors.
#[instrument(skip(completion, prompts, limits))]
pub async fn generate_course(
    completion: &dyn CompletionService,
    prompts: &Prompts,
    limits: &GenerationLimits,
    title: &str,
    sessions: u32,
    topics_per_session: u32,
) -> Result<Outcome<Course>> {
    let mut vars = HashMap::new();
    vars.insert("title".to_string(), title.to_string());
    vars.insert("sessions".to_string(), sessions.to_string());
    vars.insert("topics".to_string(), topics_per_session.to_string());

    let job = PromptJob::render(prompts, &prompts.course, &vars, limits);
    let payload = request_json(completion, &job).await?;

    let course = Course::hydrate(
        &payload,
        CourseDefaults {
            subject: title,
            total_sessions: sessions,
        },
    )
    .map_err(|e| CourseGenError::Validation(e.to_string()))?;

    info!(
        "Generated course '{}' with {} sessions",
        course.subject,
        course.sessions.len()
    );

    Ok(Outcome::Complete(course))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionError, ScriptedCompletion};
    use crate::error::ErrorKind;

    const OUTLINE: &str = r#"```json
{
  "subject": "Python Basics",
  "level": "beginner",
  "total_sessions": 2,
  "sessions": [
    {"session_no": 1, "session_name": "Variables", "learning_objectives": ["Assign values"],
     "topics": [{"title": "Names"}, {"title": "Types"}]},
    {"session_no": 2, "session_name": "Loops", "learning_objectives": ["Iterate"],
     "topics": [{"title": "for"}, {"title": "while"}]}
  ]
}
```"#;

    fn limits() -> GenerationLimits {
        GenerationLimits::new(800, 0.7)
    }

    #[tokio::test]
    async fn test_generates_course() {
        let service = ScriptedCompletion::replying(OUTLINE);
        let outcome = generate_course(&service, &Prompts::default(), &limits(), "Python Basics", 2, 2)
            .await
            .unwrap();

        let course = outcome.value();
        assert_eq!(outcome.status(), crate::generation::OutcomeStatus::Complete);
        assert_eq!(course.sessions.len(), 2);
        assert_eq!(course.sessions[1].topics[0].title, "for");

        let request = &service.requests()[0];
        assert_eq!(request.max_tokens, 800);
        assert!(request.prompt.contains("'Python Basics' with 2 sessions"));
    }

    #[tokio::test]
    async fn test_zero_sessions_is_an_error() {
        let service = ScriptedCompletion::replying(r#"{"subject": "X", "sessions": []}"#);
        let err = generate_course(&service, &Prompts::default(), &limits(), "X", 1, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let service =
            ScriptedCompletion::failing(CompletionError::Network("connection refused".to_string()));
        let err = generate_course(&service, &Prompts::default(), &limits(), "X", 1, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_is_format_error() {
        let service = ScriptedCompletion::new(vec![
            Ok("no".to_string()),
            Ok("still no".to_string()),
            Ok("never".to_string()),
        ]);
        let err = generate_course(&service, &Prompts::default(), &limits(), "X", 1, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(service.calls(), 3);
    }
}
