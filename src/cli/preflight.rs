//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available before an
//! operation starts, so the user gets one clear message instead of a failure
//! midway through a download or a retry loop.

use crate::config::Settings;
use crate::dispatch::{
    FIND_VIDEO, GENERATE_COURSE, GENERATE_HOMEWORK, GENERATE_QUIZ, GENERATE_SOLUTION,
    GET_TRANSCRIPT,
};
use crate::error::{CourseGenError, Result};
use std::process::Command;

/// Run pre-flight checks for the named operation.
pub fn check(operation: &str, settings: &Settings) -> Result<()> {
    match operation {
        GENERATE_COURSE | GENERATE_QUIZ | GENERATE_HOMEWORK | GENERATE_SOLUTION => {
            check_api_key(settings)?;
        }
        FIND_VIDEO => {
            check_search_key(settings)?;
        }
        GET_TRANSCRIPT => {
            check_api_key(settings)?;
            check_tool("yt-dlp")?;
            check_tool("ffmpeg")?;
        }
        _ => {}
    }
    Ok(())
}

/// Check that an OpenAI API key is available.
///
/// A custom `llm.api_base` counts as configured, since local endpoints often
/// need no key.
fn check_api_key(settings: &Settings) -> Result<()> {
    let configured = settings.llm.api_key.as_deref().is_some_and(|k| !k.is_empty())
        || settings.llm.api_base.as_deref().is_some_and(|b| !b.is_empty());
    if configured {
        return Ok(());
    }

    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        _ => Err(CourseGenError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn check_search_key(settings: &Settings) -> Result<()> {
    match settings.search_api_key() {
        Some(_) => Ok(()),
        None => Err(CourseGenError::Config(
            "SERPAPI_KEY not set. Set it with: export SERPAPI_KEY='...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), yt-dlp uses --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(CourseGenError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CourseGenError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(CourseGenError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
