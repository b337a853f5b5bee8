#![forbid(unsafe_code)]

//! HTTP API that converts YouTube URLs into remote stream descriptors.
//!
//! Thin shell around the library: validation at the edge, blocking YouTube
//! API work pushed onto the blocking pool, and a fixed-window rate limit in
//! front of the conversion routes.

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{signal, task};
use tubecast_tools::{
    cache::MemoryCache,
    config::{self, DEFAULT_CONFIG_PATH},
    filename::{FilenameFormat, format_filename},
    rate_limit::RateLimiter,
    remote_stream::{DEFAULT_SCRIPT_OPTIONS, VideoMetadata, generate_document},
    validate::{FlatOptions, build_generation_options},
    youtube::{ParsedUrl, YouTubeClient, parse_youtube_url},
};

const RATE_LIMIT_REQUESTS: u32 = 60;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct AppState {
    client: Arc<YouTubeClient>,
    limiter: Arc<RateLimiter>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn too_many_requests() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "rate limit exceeded, try again shortly".to_owned(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        if self.status == StatusCode::TOO_MANY_REQUESTS {
            // Tell well-behaved clients when the window resets.
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(RATE_LIMIT_WINDOW.as_secs()),
            );
        }
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, headers, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Conversion request body. Field names match the original web client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConvertRequest {
    url: String,
    #[serde(default = "default_duration_mode")]
    duration_mode: String,
    #[serde(default = "default_script_options")]
    script_options: String,
    custom_duration: Option<String>,
    padding_interval: Option<u32>,
    #[serde(default = "default_livestream_duration")]
    livestream_duration: String,
    custom_livestream_duration: Option<String>,
    #[serde(default)]
    include_title: bool,
    #[serde(default)]
    include_plot: bool,
    #[serde(default = "default_plot_format")]
    plot_format: String,
    #[serde(default)]
    include_year: bool,
    #[serde(default)]
    include_content_rating: bool,
    #[serde(default)]
    content_rating: String,
}

fn default_duration_mode() -> String {
    "none".to_owned()
}

fn default_script_options() -> String {
    DEFAULT_SCRIPT_OPTIONS.to_owned()
}

fn default_livestream_duration() -> String {
    "00:00:00".to_owned()
}

fn default_plot_format() -> String {
    "string".to_owned()
}

impl ConvertRequest {
    fn into_flat_options(self) -> FlatOptions {
        FlatOptions {
            duration_mode: self.duration_mode,
            custom_duration: self.custom_duration,
            padding_interval: self.padding_interval,
            livestream_duration: self.livestream_duration,
            custom_livestream_duration: self.custom_livestream_duration,
            always_include_live_duration: true,
            script_options: self.script_options,
            include_title: self.include_title,
            include_plot: self.include_plot,
            plot_format: self.plot_format,
            include_year: self.include_year,
            include_content_rating: self.include_content_rating,
            content_rating: self.content_rating,
        }
    }
}

#[derive(Serialize)]
struct ConvertVideoResponse {
    yaml: String,
    metadata: VideoMetadata,
}

#[derive(Serialize)]
struct PlaylistEntry {
    yaml: String,
    filename: String,
    metadata: VideoMetadata,
}

#[derive(Serialize)]
struct ConvertPlaylistResponse {
    videos: Vec<PlaylistEntry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let file_config = config::read_env_config(Path::new(DEFAULT_CONFIG_PATH))?;
    let runtime = config::resolve_runtime_config(
        file_config,
        std::env::var("YOUTUBE_API_KEY").ok(),
        std::env::var("TUBECAST_HOST").ok(),
        std::env::var("TUBECAST_PORT")
            .ok()
            .and_then(|value| value.parse().ok()),
    )?;

    let cache = Arc::new(MemoryCache::new());
    let state = AppState {
        client: Arc::new(YouTubeClient::new(runtime.youtube_api_key.clone(), cache)),
        limiter: Arc::new(RateLimiter::new(RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW)),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/convert", post(convert_video))
        .route("/api/convert/playlist", post(convert_playlist))
        .layer(middleware::map_response(security_headers))
        .with_state(state);

    let addr = SocketAddr::new(runtime.host.parse()?, runtime.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    println!("tubecast API listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("running API server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        eprintln!("Failed to install Ctrl+C handler: {}", err);
    }
}

async fn security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "tubecast API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "convertVideo": "POST /api/convert",
            "convertPlaylist": "POST /api/convert/playlist",
        },
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn convert_video(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(request): Json<ConvertRequest>,
) -> ApiResult<Json<ConvertVideoResponse>> {
    if !state.limiter.check(peer.ip()) {
        return Err(ApiError::too_many_requests());
    }

    let url = request.url.clone();
    let options = build_generation_options(request.into_flat_options())
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let video_id = match parse_youtube_url(&url) {
        Some(ParsedUrl::Video { id }) => id,
        Some(ParsedUrl::Playlist { .. }) => {
            return Err(ApiError::bad_request(
                "this endpoint only accepts video URLs; use /api/convert/playlist for playlists",
            ));
        }
        None => {
            return Err(ApiError::bad_request(
                "please provide a valid YouTube video URL",
            ));
        }
    };

    let client = state.client.clone();
    let metadata = task::spawn_blocking(move || client.video_metadata(&video_id))
        .await
        .map_err(|err| ApiError::internal(format!("task join error: {err}")))?
        .map_err(|err| ApiError::internal(err.to_string()))?;

    let yaml = generate_document(&metadata, &options);
    Ok(Json(ConvertVideoResponse { yaml, metadata }))
}

async fn convert_playlist(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(request): Json<ConvertRequest>,
) -> ApiResult<Json<ConvertPlaylistResponse>> {
    if !state.limiter.check(peer.ip()) {
        return Err(ApiError::too_many_requests());
    }

    let url = request.url.clone();
    let options = build_generation_options(request.into_flat_options())
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let playlist_id = match parse_youtube_url(&url) {
        Some(ParsedUrl::Playlist { id }) => id,
        Some(ParsedUrl::Video { .. }) => {
            return Err(ApiError::bad_request(
                "this endpoint only accepts playlist URLs; use /api/convert for single videos",
            ));
        }
        None => {
            return Err(ApiError::bad_request(
                "please provide a valid YouTube playlist URL",
            ));
        }
    };

    let client = state.client.clone();
    let videos = task::spawn_blocking(move || -> Result<Vec<PlaylistEntry>> {
        let video_ids = client.playlist_video_ids(&playlist_id)?;
        let mut entries = Vec::with_capacity(video_ids.len());
        for video_id in video_ids {
            // One bad video should not sink the whole playlist.
            match client.video_metadata(&video_id) {
                Ok(metadata) => {
                    let yaml = generate_document(&metadata, &options);
                    let filename =
                        format!("{}.yml", format_filename(&metadata.title, FilenameFormat::Compact));
                    entries.push(PlaylistEntry {
                        yaml,
                        filename,
                        metadata,
                    });
                }
                Err(err) => eprintln!("Skipping video {video_id}: {err:#}"),
            }
        }
        Ok(entries)
    })
    .await
    .map_err(|err| ApiError::internal(format!("task join error: {err}")))?
    .map_err(|err| ApiError::internal(err.to_string()))?;

    Ok(Json(ConvertPlaylistResponse { videos }))
}
