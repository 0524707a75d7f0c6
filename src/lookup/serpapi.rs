//! SerpAPI-backed video search.

use super::{VideoCandidate, VideoSearch};
use crate::config::Settings;
use crate::error::{CourseGenError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Video search through SerpAPI's YouTube engine.
pub struct SerpApiSearch {
    client: reqwest::Client,
    base_url: String,
    engine: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    video_results: Vec<VideoCandidate>,
    #[serde(default)]
    error: Option<String>,
}

impl SerpApiSearch {
    pub fn new(
        base_url: impl Into<String>,
        engine: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| CourseGenError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            engine: engine.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Build from settings. A missing API key only fails once a search is attempted.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.search.base_url,
            &settings.search.engine,
            settings.search_api_key(),
        )
    }
}

#[async_trait]
impl VideoSearch for SerpApiSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CourseGenError::Config(
                "SerpAPI key not set. Set SERPAPI_KEY or search.api_key in the config".to_string(),
            )
        })?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("engine", self.engine.as_str()),
                ("search_query", query),
                ("api_key", api_key),
            ])
            .send()
            .await
            .map_err(|e| CourseGenError::Search(format!("request failed: {}", e)))?;

        let status = response.status();
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CourseGenError::Search(format!("unreadable response ({}): {}", status, e)))?;

        if let Some(error) = body.error {
            // SerpAPI reports "no results" through the error field too.
            if error.contains("hasn't returned any results") {
                return Ok(Vec::new());
            }
            return Err(CourseGenError::Search(error));
        }
        if !status.is_success() {
            return Err(CourseGenError::Search(format!("HTTP {}", status)));
        }

        debug!("Search returned {} videos", body.video_results.len());
        Ok(body.video_results)
    }
}
