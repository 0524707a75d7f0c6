//! Lecture transcription.
//!
//! The default service downloads a video's audio, keeps only the opening
//! minutes, and sends that clip to the OpenAI transcription endpoint.

mod audio;
mod whisper;

pub use audio::{crop_audio, download_audio};
pub use whisper::WhisperTranscript;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for transcription backends.
#[async_trait]
pub trait TranscriptService: Send + Sync {
    /// Transcribe the audio behind `url` into plain text.
    async fn transcribe(&self, url: &str) -> Result<String>;
}
