//! Configuration module for coursegen.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{PromptTemplate, Prompts};
pub use settings::{
    GeneralSettings, GenerationLimits, GenerationSettings, LlmSettings, PromptSettings,
    SearchSettings, ServerSettings, Settings, TranscriptionSettings,
};
