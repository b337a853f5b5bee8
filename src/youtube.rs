//! YouTube URL parsing and Data API access.
//!
//! The client is deliberately blocking (`ureq`); the backend wraps calls in
//! `spawn_blocking` and the CLI just calls straight through. Responses are
//! normalized into [`VideoMetadata`] here so the YAML engine only ever sees
//! `HH:MM:SS` durations and an already-resolved liveness flag.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use serde::Deserialize;

use crate::cache::TtlCache;
use crate::duration::parse_iso8601_duration;
use crate::remote_stream::VideoMetadata;

pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS_PER_PAGE: &str = "50";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Video metadata changes rarely; playlists churn more often.
pub const VIDEO_METADATA_TTL: Duration = Duration::from_secs(3600);
pub const PLAYLIST_TTL: Duration = Duration::from_secs(1800);

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]{11})").unwrap()
});

static PLAYLIST_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/playlist\?list=([A-Za-z0-9_-]+)").unwrap());

/// Canonical id extracted from a user-supplied YouTube URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedUrl {
    Video { id: String },
    Playlist { id: String },
}

/// Recognizes watch/short-link video URLs and playlist URLs; a video match
/// wins when a URL could be read as either. Returns `None` for everything
/// else.
pub fn parse_youtube_url(url: &str) -> Option<ParsedUrl> {
    if let Some(captures) = VIDEO_URL.captures(url) {
        return Some(ParsedUrl::Video {
            id: captures[1].to_owned(),
        });
    }

    if let Some(captures) = PLAYLIST_URL.captures(url) {
        return Some(ParsedUrl::Playlist {
            id: captures[1].to_owned(),
        });
    }

    None
}

/// Blocking YouTube Data API v3 client with a cache-first read path.
pub struct YouTubeClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
    cache: Arc<dyn TtlCache>,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, cache: Arc<dyn TtlCache>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE_URL.to_owned(),
            cache,
        }
    }

    /// Points the client at a different API root. Only tests use this.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches normalized metadata for a single video, consulting the cache
    /// first. A video the API does not know about is an error.
    pub fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata> {
        let cache_key = format!("video:{video_id}");
        if let Some(hit) = self.cache.get(&cache_key) {
            if let Ok(metadata) = serde_json::from_str(&hit) {
                return Ok(metadata);
            }
        }

        let response: VideoListResponse = self
            .agent
            .get(&format!("{}/videos", self.base_url))
            .query("id", video_id)
            .query("key", &self.api_key)
            .query("part", "contentDetails,snippet,liveStreamingDetails")
            .call()
            .with_context(|| format!("fetching metadata for video {video_id}"))?
            .into_json()
            .context("decoding YouTube videos response")?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("video not found: {video_id}"))?;

        let metadata = normalize_video(video_id, item);
        if let Ok(encoded) = serde_json::to_string(&metadata) {
            self.cache.put(&cache_key, &encoded, VIDEO_METADATA_TTL);
        }

        Ok(metadata)
    }

    /// Collects every video id in a playlist, paging through the API.
    /// An unknown or empty playlist is an error.
    pub fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let cache_key = format!("playlist:{playlist_id}");
        if let Some(hit) = self.cache.get(&cache_key) {
            if let Ok(ids) = serde_json::from_str(&hit) {
                return Ok(ids);
            }
        }

        let mut video_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .agent
                .get(&format!("{}/playlistItems", self.base_url))
                .query("playlistId", playlist_id)
                .query("key", &self.api_key)
                .query("part", "snippet")
                .query("maxResults", MAX_RESULTS_PER_PAGE);
            if let Some(token) = &page_token {
                request = request.query("pageToken", token);
            }

            let response: PlaylistItemsResponse = request
                .call()
                .with_context(|| format!("fetching playlist {playlist_id}"))?
                .into_json()
                .context("decoding YouTube playlistItems response")?;

            if response.items.is_empty() {
                break;
            }

            video_ids.extend(
                response
                    .items
                    .into_iter()
                    .map(|item| item.snippet.resource_id.video_id),
            );

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        if video_ids.is_empty() {
            bail!("playlist not found or empty: {playlist_id}");
        }

        if let Ok(encoded) = serde_json::to_string(&video_ids) {
            self.cache.put(&cache_key, &encoded, PLAYLIST_TTL);
        }

        Ok(video_ids)
    }
}

/// `videos.list` response. Only the fields the converter reads are declared;
/// everything optional because older videos often lack metadata.
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: VideoSnippet,
    content_details: ContentDetails,
    #[serde(default)]
    live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    #[serde(default)]
    scheduled_start_time: Option<String>,
    #[serde(default)]
    actual_start_time: Option<String>,
    #[serde(default)]
    actual_end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

/// A broadcast counts as live while it has started (or is scheduled) and has
/// not ended. Finished broadcasts convert as ordinary VODs.
fn is_live_broadcast(details: Option<&LiveStreamingDetails>) -> bool {
    match details {
        Some(details) => {
            details.actual_end_time.is_none()
                && (details.actual_start_time.is_some() || details.scheduled_start_time.is_some())
        }
        None => false,
    }
}

fn normalize_video(video_id: &str, item: VideoItem) -> VideoMetadata {
    let is_live = is_live_broadcast(item.live_streaming_details.as_ref());
    VideoMetadata {
        title: item.snippet.title,
        description: item.snippet.description,
        duration: parse_iso8601_duration(&item.content_details.duration),
        is_live,
        video_url: format!("https://youtube.com/watch?v={video_id}"),
        published_at: item.snippet.published_at,
    }
}
