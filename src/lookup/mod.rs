//! Video lookup through a web-search service.
//!
//! One query per topic; the first candidate whose displayed length falls in
//! the accepted window wins. No retries.

mod serpapi;

pub use serpapi::SerpApiSearch;

use crate::error::Result;
use crate::schema::VideoMatch;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Shortest accepted video, in whole minutes.
pub const MIN_VIDEO_MINUTES: u32 = 15;
/// Longest accepted video, in whole minutes.
pub const MAX_VIDEO_MINUTES: u32 = 20;

/// A raw search result, in service order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoCandidate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    /// Display length such as `"16:05"` or `"1:02:30"`.
    #[serde(default)]
    pub length: Option<String>,
}

/// Trait for video search backends.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Run one search query and return the candidates in ranking order.
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>>;
}

/// Whole minutes from a display length: the integer before the first `:`.
///
/// `"16:05"` is 16 and `"1:02:30"` is 1. Returns `None` when that part is not
/// a number.
pub fn parse_display_minutes(length: &str) -> Option<u32> {
    let minutes = length.trim().split(':').next()?;
    minutes.trim().parse().ok()
}

/// Pick the first acceptable candidate.
///
/// A missing length counts as `"0:00"`; an unparseable one skips the candidate,
/// and so does a missing link.
pub fn select_video(candidates: &[VideoCandidate]) -> Option<VideoMatch> {
    candidates.iter().find_map(|candidate| {
        if candidate.link.trim().is_empty() {
            debug!("Skipping '{}': no link", candidate.title);
            return None;
        }

        let length = candidate.length.as_deref().unwrap_or("0:00");
        let minutes = match parse_display_minutes(length) {
            Some(m) => m,
            None => {
                debug!("Skipping '{}': unreadable length '{}'", candidate.title, length);
                return None;
            }
        };

        if !(MIN_VIDEO_MINUTES..=MAX_VIDEO_MINUTES).contains(&minutes) {
            debug!("Skipping '{}': {} minutes", candidate.title, minutes);
            return None;
        }

        Some(VideoMatch {
            url: candidate.link.clone(),
            title: candidate.title.clone(),
            duration_minutes: minutes,
        })
    })
}

/// Find a suitable video for `topic`.
///
/// `Ok(None)` means the search ran and nothing fit; search failures are errors.
#[instrument(skip(search))]
pub async fn find_video(search: &dyn VideoSearch, topic: &str) -> Result<Option<VideoMatch>> {
    let candidates = search.search(topic).await?;
    let found = select_video(&candidates);

    match &found {
        Some(video) => info!(
            "Selected '{}' ({} min) out of {} results",
            video.title,
            video.duration_minutes,
            candidates.len()
        ),
        None => info!("No video of {}-{} minutes among {} results", MIN_VIDEO_MINUTES, MAX_VIDEO_MINUTES, candidates.len()),
    }

    Ok(found)
}
