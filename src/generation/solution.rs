use super::pipeline::{request_json, PromptJob};
use super::Outcome;
use crate::completion::CompletionService;
use crate::config::{GenerationLimits, Prompts};
use crate::error::{CourseGenError, Result};
use crate::schema::ProblemSolution;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Fill in a solution for a problem statement and skeleton.
///
/// Any failure yields the "unable to generate" solution with the caller's
/// inputs echoed back.
#[instrument(skip_all, fields(problem_chars = problem.len()))]
pub async fn generate_solution(
    completion: &dyn CompletionService,
    prompts: &Prompts,
    limits: &GenerationLimits,
    problem: &str,
    skeleton: &str,
) -> Result<Outcome<ProblemSolution>> {
    let mut vars = HashMap::new();
    vars.insert("problem".to_string(), problem.to_string());
    vars.insert("skeleton".to_string(), skeleton.to_string());

    let job = PromptJob::render(prompts, &prompts.solution, &vars, limits);
    let solution = request_json(completion, &job)
        .await
        .map_err(CourseGenError::from)
        .and_then(|payload| {
            ProblemSolution::hydrate(&payload, problem, skeleton)
                .map_err(|e| CourseGenError::Validation(e.to_string()))
        });

    match solution {
        Ok(solution) => {
            info!("Generated solution ({} chars)", solution.solution_code.len());
            Ok(Outcome::Complete(solution))
        }
        Err(e) => {
            warn!("Solution generation failed: {}", e);
            Ok(Outcome::Fallback(ProblemSolution::unavailable(problem, skeleton)))
        }
    }
}
