//! OpenAI transcription of a cropped audio clip.

use super::audio::{crop_audio, download_audio};
use super::TranscriptService;
use crate::config::Settings;
use crate::error::{CourseGenError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Transcriber built on yt-dlp, ffmpeg and the OpenAI audio API.
pub struct WhisperTranscript {
    client: Client<OpenAIConfig>,
    model: String,
    clip_seconds: u32,
    sample_rate: u32,
    work_root: PathBuf,
}

impl WhisperTranscript {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.llm)?,
            model: settings.transcription.model.clone(),
            clip_seconds: settings.transcription.clip_seconds,
            sample_rate: settings.transcription.sample_rate,
            work_root: settings.temp_dir(),
        })
    }

    async fn transcribe_clip(&self, clip: &Path) -> Result<String> {
        let bytes = tokio::fs::read(clip).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8("clip.wav".to_string(), bytes))
            .model(&self.model)
            .build()
            .map_err(|e| CourseGenError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| CourseGenError::Transcription(format!("Transcription API error: {}", e)))?;

        Ok(response.text.trim().to_string())
    }
}

#[async_trait]
impl TranscriptService for WhisperTranscript {
    #[instrument(skip(self))]
    async fn transcribe(&self, url: &str) -> Result<String> {
        let started = Instant::now();

        tokio::fs::create_dir_all(&self.work_root).await?;
        // Removed on drop, including when the request is cancelled.
        let workdir = tempfile::Builder::new()
            .prefix("transcript-")
            .tempdir_in(&self.work_root)?;

        let audio = download_audio(url, workdir.path()).await?;
        debug!("Downloaded audio to {:?}", audio);

        let clip = workdir.path().join("clip.wav");
        crop_audio(&audio, &clip, self.clip_seconds, self.sample_rate).await?;

        let text = self.transcribe_clip(&clip).await?;

        info!(
            "Transcribed {} chars in {:.2}s",
            text.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}
