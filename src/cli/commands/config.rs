//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Run the config command against the file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: PathBuf) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::kv("File", &config_path.display().to_string());
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `raw`.
///
/// The value is read as a TOML literal when it parses as one, otherwise as a
/// plain string. The result must still deserialize into [`Settings`] and the
/// key must survive the round trip, which rejects typos and wrong types.
pub fn set_value(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let path: Vec<&str> = key.split('.').collect();
    if path.iter().any(|segment| segment.is_empty()) {
        bail!("Invalid configuration key: {}", key);
    }

    let mut document =
        toml::Value::try_from(settings).context("Failed to serialize current config")?;

    let (field, parents) = path
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Invalid configuration key: {}", key))?;
    let mut table = document
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("Configuration root is not a table"))?;
    for segment in parents {
        table = table
            .get_mut(*segment)
            .and_then(toml::Value::as_table_mut)
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;
    }
    table.insert((*field).to_string(), parse_literal(raw));

    let updated = document
        .try_into::<Settings>()
        .with_context(|| format!("Invalid value for {}: {}", key, raw))?;

    let check = toml::Value::try_from(&updated).context("Failed to serialize updated config")?;
    let mut node = Some(&check);
    for segment in &path {
        node = node.and_then(|value| value.get(*segment));
    }
    if node.is_none() {
        bail!("Unknown configuration key: {}", key);
    }

    Ok(updated)
}

fn parse_literal(raw: &str) -> toml::Value {
    format!("value = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_typed_values() {
        let settings = Settings::default();

        let updated = set_value(&settings, "llm.model", "gpt-4o-mini").unwrap();
        assert_eq!(updated.llm.model, "gpt-4o-mini");

        let updated = set_value(&updated, "server.port", "9100").unwrap();
        assert_eq!(updated.server.port, 9100);

        let updated = set_value(&updated, "generation.quiz.max_retries", "4").unwrap();
        assert_eq!(updated.generation.quiz.max_retries, 4);
        assert_eq!(updated.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_set_optional_and_map_keys() {
        let settings = Settings::default();

        let updated = set_value(&settings, "llm.api_base", "http://localhost:11434/v1").unwrap();
        assert_eq!(
            updated.llm.api_base.as_deref(),
            Some("http://localhost:11434/v1")
        );

        let updated = set_value(&updated, "prompts.variables.audience", "beginners").unwrap();
        assert_eq!(
            updated.prompts.variables.get("audience").map(String::as_str),
            Some("beginners")
        );
    }

    #[test]
    fn test_set_rejects_bad_keys_and_types() {
        let settings = Settings::default();
        assert!(set_value(&settings, "llm.modle", "x").is_err());
        assert!(set_value(&settings, "nosuch.section", "x").is_err());
        assert!(set_value(&settings, "server.port", "not-a-port").is_err());
        assert!(set_value(&settings, "llm..model", "x").is_err());
    }

    #[test]
    fn test_set_persists_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let action = ConfigAction::Set {
            key: "transcription.clip_seconds".to_string(),
            value: "120".to_string(),
        };

        run_config(&action, Settings::default(), path.clone()).unwrap();

        let reloaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(reloaded.transcription.clip_seconds, 120);
    }
}
