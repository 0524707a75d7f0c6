//! Configuration settings for coursegen.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub generation: GenerationSettings,
    pub search: SearchSettings,
    pub transcription: TranscriptionSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/coursegen".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Chat-completion model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model used for every generation operation.
    pub model: String,
    /// API key. Falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Alternative OpenAI-compatible endpoint.
    pub api_base: Option<String>,
    /// HTTP timeout for a single completion call, in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            api_base: None,
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Sampling and retry limits for one generation operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationLimits {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Additional attempts after a reply that is not valid JSON.
    pub max_retries: u32,
}

impl GenerationLimits {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            max_retries: 2,
        }
    }
}

/// Per-operation generation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub course: GenerationLimits,
    pub quiz: GenerationLimits,
    pub homework: GenerationLimits,
    pub solution: GenerationLimits,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            course: GenerationLimits::new(800, 0.7),
            quiz: GenerationLimits::new(500, 0.7),
            homework: GenerationLimits::new(500, 0.7),
            solution: GenerationLimits::new(600, 0.0),
        }
    }
}

/// Video search settings (SerpAPI).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// SerpAPI key. Falls back to `SERPAPI_KEY`.
    pub api_key: Option<String>,
    /// Search endpoint.
    pub base_url: String,
    /// Search engine selector.
    pub engine: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://serpapi.com/search.json".to_string(),
            engine: "youtube".to_string(),
        }
    }
}

/// Transcript generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Speech-to-text model.
    pub model: String,
    /// Only the first `clip_seconds` of audio are transcribed.
    pub clip_seconds: u32,
    /// Sample rate of the cropped mono clip.
    pub sample_rate: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            clip_seconds: 180,
            sample_rate: 16000,
        }
    }
}

/// Front-end server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Requests running longer than this are cancelled.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 600,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CourseGenError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coursegen")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// SerpAPI key from the config file or the `SERPAPI_KEY` environment variable.
    pub fn search_api_key(&self) -> Option<String> {
        self.search
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("SERPAPI_KEY").ok().filter(|k| !k.is_empty()))
    }
}
