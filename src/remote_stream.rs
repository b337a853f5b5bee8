//! Remote stream descriptor generation.
//!
//! ErsatzTV consumes small YAML documents describing a shell command that
//! produces a media stream. This module owns that contract end to end: the
//! scalar encoders, the duration resolution state machine, and the document
//! builder that stitches both into a deterministic, byte-exact text block.
//! The test suite pins exact line order and exact text, because downstream
//! parsers treat quoted durations and booleans as strings.
//!
//! Everything here is a pure computation over in-memory values; invalid or
//! missing optional fields are omitted, never reported as errors.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::duration::pad_to_interval;

/// Default extra yt-dlp flags inserted into the generated script.
pub const DEFAULT_SCRIPT_OPTIONS: &str = "--hls-use-mpegts";

/// Placeholder substituted with the playable URL in explicit templates.
pub const VIDEO_URL_TOKEN: &str = "{VIDEO_URL}";

/// Normalized video metadata handed to the builder.
///
/// `duration` is always well-formed `HH:MM:SS` text (hours unbounded width)
/// and only meaningful for VODs. Wire names are camelCase to match the API
/// payloads the original frontend consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub duration: String,
    pub is_live: bool,
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// How the `duration:` field of a VOD is decided.
///
/// A tagged union so a mode can never be paired with the wrong payload:
/// the custom value travels with `Custom`, the interval with `ApiPadded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationMode {
    /// Omit the duration line entirely.
    Omit,
    /// Use an operator-supplied `HH:MM:SS` value verbatim.
    Custom(String),
    /// Use the duration reported by the YouTube API.
    Api,
    /// API duration rounded up to the next multiple of this many minutes.
    ApiPadded(u32),
}

/// Duration choice for live broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveDuration {
    /// A preset `HH:MM:SS` literal; `00:00:00` means indefinite.
    Preset(String),
    /// An operator-supplied `HH:MM:SS` value.
    Custom(String),
}

impl LiveDuration {
    fn value(&self) -> &str {
        match self {
            LiveDuration::Preset(value) | LiveDuration::Custom(value) => value,
        }
    }
}

/// YAML scalar style used for the multi-line `plot` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlotFormat {
    /// Double-quoted single-line scalar with escapes.
    #[serde(rename = "string")]
    Quoted,
    /// Folded block scalar (`>`), newlines fold to spaces.
    #[serde(rename = "folded")]
    Folded,
    /// Literal block scalar (`|`), newlines preserved.
    #[serde(rename = "literal")]
    Literal,
}

/// Block scalar flavors understood by [`block_scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Literal,
    Folded,
}

/// User-chosen generation settings, validated at the boundary.
///
/// The builder trusts these values: custom durations have already been
/// matched against `HH:MM:SS` and the padding interval against the allowed
/// set before anything reaches [`generate_document`].
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub duration_mode: DurationMode,
    pub live_duration: LiveDuration,
    /// When true (the default), live content always gets a `duration:` line
    /// regardless of the VOD duration mode. When false the line only appears
    /// for live content if `duration_mode` is not [`DurationMode::Omit`].
    pub always_include_live_duration: bool,
    /// Explicit script template containing [`VIDEO_URL_TOKEN`]. When absent
    /// the builder assembles `yt-dlp <url> <script_options> -o -` itself.
    pub script_template: Option<String>,
    pub script_options: String,
    pub include_title: bool,
    pub include_plot: bool,
    pub plot_format: PlotFormat,
    pub include_year: bool,
    pub include_content_rating: bool,
    pub content_rating: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            duration_mode: DurationMode::Omit,
            live_duration: LiveDuration::Preset("00:00:00".to_owned()),
            always_include_live_duration: true,
            script_template: None,
            script_options: DEFAULT_SCRIPT_OPTIONS.to_owned(),
            include_title: false,
            include_plot: false,
            plot_format: PlotFormat::Quoted,
            include_year: false,
            include_content_rating: false,
            content_rating: String::new(),
        }
    }
}

/// Escapes a string for a YAML double-quoted scalar.
///
/// Backslash goes first so characters introduced by the later substitutions
/// are never double-escaped.
pub fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Renders `key: "value"` with the value escaped.
pub fn quoted_scalar(key: &str, value: &str) -> String {
    format!("{key}: \"{}\"", escape_quoted(value))
}

/// Renders `key: value` unquoted. Booleans, durations, and years must never
/// be quoted or the downstream YAML consumer reads them as strings.
pub fn plain_scalar(key: &str, value: &str) -> String {
    format!("{key}: {value}")
}

/// Renders a literal (`|`) or folded (`>`) block scalar: the marker line,
/// then every source line indented by exactly two spaces. Blank source lines
/// become a line of exactly two spaces; no trailing newline is added.
pub fn block_scalar(key: &str, value: &str, style: BlockStyle) -> String {
    let marker = match style {
        BlockStyle::Literal => '|',
        BlockStyle::Folded => '>',
    };

    let body = value
        .split('\n')
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{key}: {marker}\n{body}")
}

/// Decides the effective `duration:` value for a video, or `None` to omit
/// the line. Keyed first on liveness, then on the VOD duration mode.
pub fn resolve_duration(metadata: &VideoMetadata, options: &GenerationOptions) -> Option<String> {
    if metadata.is_live {
        if !options.always_include_live_duration && options.duration_mode == DurationMode::Omit {
            return None;
        }
        return Some(options.live_duration.value().to_owned());
    }

    match &options.duration_mode {
        DurationMode::Omit => None,
        DurationMode::Custom(value) => Some(value.clone()),
        DurationMode::Api => Some(metadata.duration.clone()),
        DurationMode::ApiPadded(interval) => Some(pad_to_interval(&metadata.duration, *interval)),
    }
}

static LEADING_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})").unwrap());

/// Pulls the leading four-digit year out of an ISO-8601 timestamp without
/// going through a date type, sidestepping timezone shifts around midnight.
fn extract_year(published_at: &str) -> Option<&str> {
    LEADING_YEAR
        .find(published_at)
        .map(|matched| matched.as_str())
}

/// Builds the final remote stream document.
///
/// Field order is fixed: `script`, `is_live`, then optional `duration`,
/// `title`, `plot`, `year`, `content_rating`. Lines are joined with `\n` and
/// no trailing newline is emitted.
pub fn generate_document(metadata: &VideoMetadata, options: &GenerationOptions) -> String {
    let script = match &options.script_template {
        Some(template) => template.replace(VIDEO_URL_TOKEN, &metadata.video_url),
        None => format!(
            "yt-dlp {} {} -o -",
            metadata.video_url, options.script_options
        ),
    };

    let mut lines = vec![quoted_scalar("script", &script)];
    lines.push(plain_scalar(
        "is_live",
        if metadata.is_live { "true" } else { "false" },
    ));

    if let Some(duration) = resolve_duration(metadata, options) {
        lines.push(plain_scalar("duration", &duration));
    }

    if options.include_title {
        lines.push(quoted_scalar("title", &metadata.title));
    }

    if options.include_plot && !metadata.description.is_empty() {
        lines.push(match options.plot_format {
            PlotFormat::Quoted => quoted_scalar("plot", &metadata.description),
            PlotFormat::Folded => block_scalar("plot", &metadata.description, BlockStyle::Folded),
            PlotFormat::Literal => block_scalar("plot", &metadata.description, BlockStyle::Literal),
        });
    }

    if options.include_year {
        if let Some(year) = metadata.published_at.as_deref().and_then(extract_year) {
            lines.push(plain_scalar("year", year));
        }
    }

    if options.include_content_rating && !options.content_rating.trim().is_empty() {
        lines.push(quoted_scalar("content_rating", &options.content_rating));
    }

    lines.join("\n")
}
