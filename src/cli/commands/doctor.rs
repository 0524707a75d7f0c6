//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("coursegen doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    // Only get_transcript needs these; missing tools are warnings.
    let tools = vec![
        check_tool("yt-dlp", "yt-dlp --version", install_hint_ytdlp()),
        check_tool("ffmpeg", "ffmpeg -version", install_hint_ffmpeg()),
    ];
    print_section("External Tools", &tools);
    checks.extend(tools);

    let keys = vec![check_openai_api_key(settings), check_search_key(settings)];
    print_section("API Configuration", &keys);
    checks.extend(keys);

    let dirs = vec![check_temp_dir(&settings.temp_dir())];
    print_section("Directories", &dirs);
    checks.extend(dirs);

    let config = vec![check_config_file(config_path), check_prompts(settings)];
    print_section("Configuration", &config);
    checks.extend(config);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using coursegen.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! coursegen is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, version_cmd: &str, hint: &str) -> CheckResult {
    let mut parts = version_cmd.split_whitespace();
    let cmd = parts.next().unwrap_or(name);

    match Command::new(cmd).args(parts).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::warning(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning(name, "not found (needed for transcripts)", hint)
        }
        Err(e) => CheckResult::warning(name, &format!("error: {}", e), hint),
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check that the completion API is reachable with a key.
fn check_openai_api_key(settings: &Settings) -> CheckResult {
    let from_config = settings.llm.api_key.clone().filter(|k| !k.is_empty());
    let key = from_config.or_else(|| std::env::var("OPENAI_API_KEY").ok());

    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OpenAI API key", &format!("configured ({})", mask(&key)))
        }
        Some(key) if !key.is_empty() => CheckResult::warning(
            "OpenAI API key",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        _ if settings.llm.api_base.is_some() => CheckResult::ok(
            "OpenAI API key",
            "not set (custom llm.api_base in use)",
        ),
        _ => CheckResult::error(
            "OpenAI API key",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...' (or llm.api_key)",
        ),
    }
}

fn check_search_key(settings: &Settings) -> CheckResult {
    match settings.search_api_key() {
        Some(key) => CheckResult::ok("SerpAPI key", &format!("configured ({})", mask(&key))),
        None => CheckResult::warning(
            "SerpAPI key",
            "not set (find_video will fail)",
            "Set with: export SERPAPI_KEY='...' (or search.api_key)",
        ),
    }
}

fn check_temp_dir(temp_dir: &Path) -> CheckResult {
    if temp_dir.is_dir() {
        CheckResult::ok("Temp directory", &temp_dir.display().to_string())
    } else if temp_dir.exists() {
        CheckResult::error(
            "Temp directory",
            &format!("{} is not a directory", temp_dir.display()),
            "Point general.temp_dir at a writable directory",
        )
    } else {
        CheckResult::warning(
            "Temp directory",
            &format!("{} (will be created)", temp_dir.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: coursegen config edit",
        )
    }
}

fn check_prompts(settings: &Settings) -> CheckResult {
    let custom_dir = settings.prompts.custom_dir.as_deref();
    match Prompts::load(custom_dir, Some(&settings.prompts.variables)) {
        Ok(_) => match custom_dir {
            Some(dir) => CheckResult::ok("Prompts", &format!("custom ({})", dir)),
            None => CheckResult::ok("Prompts", "built-in"),
        },
        Err(e) => CheckResult::error(
            "Prompts",
            &format!("failed to load: {}", e),
            "Fix the TOML files in prompts.custom_dir",
        ),
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "***");
        assert_eq!(mask("sk-abcdefghijklmnop1234"), "sk-abcd...1234");
    }

    #[test]
    fn test_missing_tool_is_warning() {
        let result = check_tool("nope", "coursegen-no-such-tool --version", "install it");
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[test]
    fn test_temp_dir_states() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_temp_dir(dir.path()).status, CheckStatus::Ok);
        assert_eq!(
            check_temp_dir(&dir.path().join("later")).status,
            CheckStatus::Warning
        );

        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(check_temp_dir(&file).status, CheckStatus::Error);
    }

    #[test]
    fn test_custom_endpoint_key_optional() {
        let mut settings = Settings::default();
        settings.llm.api_base = Some("http://localhost:11434/v1".to_string());
        settings.llm.api_key = Some(String::new());
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert_eq!(check_openai_api_key(&settings).status, CheckStatus::Ok);
        }
    }
}
