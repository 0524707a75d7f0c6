//! One-shot content operations from the command line.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::dispatch::{Dispatcher, GenerationRequest};
use crate::generation::OutcomeStatus;
use anyhow::{Context, Result};
use std::io::Read;

/// Run a single operation and print its result as JSON.
pub async fn run_generate(request: GenerationRequest, settings: Settings) -> Result<()> {
    let operation = request.name();
    request.validate()?;
    preflight::check(operation, &settings)?;

    let dispatcher = Dispatcher::new(settings)?;

    let spinner = Output::spinner(&format!("Running {}...", operation.replace('_', " ")));
    let result = dispatcher.dispatch(request).await;
    spinner.finish_and_clear();

    let result = result?;
    match result.status {
        OutcomeStatus::Complete => {}
        OutcomeStatus::Partial => Output::warning(&format!(
            "{} invalid item(s) were dropped from the model output.",
            result.dropped
        )),
        OutcomeStatus::Fallback => {
            Output::warning("Generation failed; showing the fallback result.")
        }
        OutcomeStatus::NotFound => Output::warning("Nothing suitable was found."),
    }

    Output::json(&result.data)?;
    Ok(())
}

/// Transcript text from the positional argument, a file, or stdin.
pub fn read_transcript(text: Option<String>, file: Option<String>) -> Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) if path == "-" => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read transcript from stdin")?;
            Ok(buffer)
        }
        (None, Some(path)) => {
            let path = Settings::expand_path(&path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read transcript from {}", path.display()))
        }
        (None, None) => anyhow::bail!("Provide a transcript or --file"),
    }
}
