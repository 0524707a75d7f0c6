use super::pipeline::{request_json, PromptJob};
use super::Outcome;
use crate::completion::CompletionService;
use crate::config::{GenerationLimits, Prompts};
use crate::error::{CourseGenError, Result};
use crate::schema::hydrate::hydrate_sequence;
use crate::schema::HomeworkProblem;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Generate homework problems from a lecture transcript.
///
/// Failures degrade to an empty problem list.
#[instrument(skip_all, fields(transcript_chars = transcript.len()))]
pub async fn generate_homework(
    completion: &dyn CompletionService,
    prompts: &Prompts,
    limits: &GenerationLimits,
    transcript: &str,
) -> Result<Outcome<Vec<HomeworkProblem>>> {
    let mut vars = HashMap::new();
    vars.insert("transcript".to_string(), transcript.to_string());

    let job = PromptJob::render(prompts, &prompts.homework, &vars, limits);
    let payload = match request_json(completion, &job).await {
        Ok(payload) => payload,
        Err(failure) => {
            warn!(
                "Homework generation failed: {}",
                CourseGenError::from(failure)
            );
            return Ok(Outcome::Fallback(Vec::new()));
        }
    };

    let (problems, dropped) = hydrate_sequence(&payload, "homework problem", HomeworkProblem::hydrate);
    if problems.is_empty() {
        warn!("No valid homework problems in model output");
        return Ok(Outcome::Fallback(Vec::new()));
    }

    info!("Generated {} homework problems", problems.len());
    Ok(Outcome::from_items(problems, dropped))
}
