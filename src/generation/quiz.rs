use super::pipeline::{request_json, PromptJob};
use super::Outcome;
use crate::completion::CompletionService;
use crate::config::{GenerationLimits, Prompts};
use crate::error::{CourseGenError, Result};
use crate::schema::hydrate::hydrate_sequence;
use crate::schema::TopicQuestion;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Number of questions for a video of the given length: one per five minutes, at least one.
pub fn quiz_size(duration_minutes: u32) -> u32 {
    (duration_minutes / 5).max(1)
}

/// Generate multiple-choice questions for a video.
///
/// Never fails: when the model cannot produce a single valid question the
/// result is a one-question placeholder quiz.
#[instrument(skip(completion, prompts, limits))]
pub async fn generate_quiz(
    completion: &dyn CompletionService,
    prompts: &Prompts,
    limits: &GenerationLimits,
    video_title: &str,
    duration_minutes: u32,
) -> Result<Outcome<Vec<TopicQuestion>>> {
    let count = quiz_size(duration_minutes);

    let mut vars = HashMap::new();
    vars.insert("title".to_string(), video_title.to_string());
    vars.insert("count".to_string(), count.to_string());

    let job = PromptJob::render(prompts, &prompts.quiz, &vars, limits);
    let payload = match request_json(completion, &job).await {
        Ok(payload) => payload,
        Err(failure) => {
            warn!(
                "Quiz generation failed, using placeholder: {}",
                CourseGenError::from(failure)
            );
            return Ok(placeholder(video_title));
        }
    };

    let (questions, dropped) = hydrate_sequence(&payload, "question", TopicQuestion::hydrate);
    if questions.is_empty() {
        warn!("No valid quiz questions in model output, using placeholder");
        return Ok(placeholder(video_title));
    }

    info!("Generated {} quiz questions ({} requested)", questions.len(), count);
    Ok(Outcome::from_items(questions, dropped))
}

fn placeholder(video_title: &str) -> Outcome<Vec<TopicQuestion>> {
    Outcome::Fallback(vec![TopicQuestion::placeholder(video_title)])
}
