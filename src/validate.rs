//! Boundary validation for generation requests.
//!
//! The YAML engine trusts its inputs, so every request (HTTP body or CLI
//! flags) passes through here first. This is also the only place the flat
//! wire parameters become the typed [`GenerationOptions`], which keeps
//! mode/payload mismatches unrepresentable further down.

use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;

use crate::remote_stream::{
    DEFAULT_SCRIPT_OPTIONS, DurationMode, GenerationOptions, LiveDuration, PlotFormat,
    VIDEO_URL_TOKEN,
};

/// Padding intervals (minutes) ErsatzTV programming blocks align to.
pub const ALLOWED_PADDING_INTERVALS: [u32; 4] = [5, 10, 15, 30];

/// The generated script must stream to stdout for ErsatzTV to consume it.
pub const REQUIRED_OUTPUT: &str = "-o -";

/// Flags that would change the output target or container and break the
/// remote stream contract.
pub const PROHIBITED_FLAGS: [&str; 7] = [
    "-f",
    "--format",
    "--extract-audio",
    "--recode-video",
    "--merge-output-format",
    "--output",
    "--paths",
];

/// Shell-chaining sequences that must never appear in a script.
const INJECTION_SEQUENCES: [&str; 5] = [";", "&&", "||", "`", "$("];

/// Length cap on user-supplied script options.
const MAX_SCRIPT_OPTIONS_LEN: usize = 10_000;

static CLOCK_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}):([0-5]\d):([0-5]\d)$").unwrap());

/// Characters yt-dlp flags legitimately need: alphanumerics, whitespace, and
/// `-_./{}[]:` (colons show up in flags like `--downloader-args ffmpeg:...`).
static SAFE_SCRIPT_OPTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\s\-./{}\[\]:]*$").unwrap());

/// Checks an operator-supplied duration against `HH:MM:SS` with hours 00-23.
pub fn validate_duration(duration: &str) -> Result<()> {
    let trimmed = duration.trim();
    if trimmed.is_empty() {
        bail!("duration cannot be empty");
    }

    let Some(captures) = CLOCK_DURATION.captures(trimmed) else {
        bail!("duration must be in HH:MM:SS format (e.g. 01:23:45)");
    };

    let hours: u32 = captures[1].parse()?;
    if hours > 23 {
        bail!("duration hours must be between 00 and 23");
    }

    Ok(())
}

/// Checks a padding interval against the allowed programming block sizes.
pub fn validate_padding_interval(minutes: u32) -> Result<()> {
    if !ALLOWED_PADDING_INTERVALS.contains(&minutes) {
        bail!("padding interval must be 5, 10, 15, or 30 minutes");
    }
    Ok(())
}

/// Checks user-supplied yt-dlp flags and returns them trimmed.
///
/// Input carrying shell-chaining sequences or characters outside the safe
/// set is rejected outright rather than stripped: silently laundering an
/// injection attempt into something runnable would hide the abuse. Only NUL
/// bytes are dropped.
pub fn sanitize_script_options(options: &str) -> Result<String> {
    if options.len() > MAX_SCRIPT_OPTIONS_LEN {
        bail!("script options are too long");
    }

    let no_nul = options.replace('\0', "");

    for sequence in INJECTION_SEQUENCES {
        if no_nul.contains(sequence) {
            bail!("script options contain potentially dangerous command chaining or injection");
        }
    }

    if !SAFE_SCRIPT_OPTIONS.is_match(&no_nul) {
        bail!("script options contain invalid characters");
    }

    Ok(no_nul.trim().to_owned())
}

/// Rejects scripts that would not stream to stdout, carry a prohibited flag,
/// or attempt shell chaining.
pub fn validate_script_options(script: &str) -> Result<()> {
    if !script.contains(REQUIRED_OUTPUT) {
        bail!("script must include \"{REQUIRED_OUTPUT}\" for stdout output");
    }

    for flag in PROHIBITED_FLAGS {
        if script.contains(flag) {
            bail!("script cannot include prohibited flag: {flag}");
        }
    }

    for sequence in INJECTION_SEQUENCES {
        if script.contains(sequence) {
            bail!("script contains potentially dangerous command chaining or injection");
        }
    }

    Ok(())
}

/// Flat, stringly-typed generation parameters as they arrive over the wire
/// or from CLI flags. [`build_generation_options`] is the one path from here
/// to the typed options the engine accepts.
#[derive(Debug, Clone)]
pub struct FlatOptions {
    /// One of `none`, `custom`, `api`, `api-padded`.
    pub duration_mode: String,
    pub custom_duration: Option<String>,
    pub padding_interval: Option<u32>,
    /// A preset `HH:MM:SS` literal or the sentinel `custom`.
    pub livestream_duration: String,
    pub custom_livestream_duration: Option<String>,
    pub always_include_live_duration: bool,
    pub script_options: String,
    pub include_title: bool,
    pub include_plot: bool,
    /// One of `string`, `folded`, `literal`.
    pub plot_format: String,
    pub include_year: bool,
    pub include_content_rating: bool,
    pub content_rating: String,
}

impl Default for FlatOptions {
    fn default() -> Self {
        Self {
            duration_mode: "none".to_owned(),
            custom_duration: None,
            padding_interval: None,
            livestream_duration: "00:00:00".to_owned(),
            custom_livestream_duration: None,
            always_include_live_duration: true,
            script_options: DEFAULT_SCRIPT_OPTIONS.to_owned(),
            include_title: false,
            include_plot: false,
            plot_format: "string".to_owned(),
            include_year: false,
            include_content_rating: false,
            content_rating: String::new(),
        }
    }
}

/// Validates flat parameters and assembles [`GenerationOptions`].
///
/// Enforces the mode-conditional requirements the engine itself assumes:
/// a valid custom duration when the mode is `custom`, an allowed interval
/// when it is `api-padded`, and a custom livestream value when the sentinel
/// is selected. Script options are sanitized, then the resulting template is
/// screened as a whole.
pub fn build_generation_options(flat: FlatOptions) -> Result<GenerationOptions> {
    let duration_mode = match flat.duration_mode.as_str() {
        "none" => DurationMode::Omit,
        "custom" => {
            let Some(value) = flat.custom_duration else {
                bail!("custom duration mode requires a custom duration value");
            };
            validate_duration(&value)?;
            DurationMode::Custom(value.trim().to_owned())
        }
        "api" => DurationMode::Api,
        "api-padded" => {
            let Some(interval) = flat.padding_interval else {
                bail!("api-padded duration mode requires a padding interval");
            };
            validate_padding_interval(interval)?;
            DurationMode::ApiPadded(interval)
        }
        other => bail!("unsupported duration mode: {other}"),
    };

    let live_duration = if flat.livestream_duration == "custom" {
        let Some(value) = flat.custom_livestream_duration else {
            bail!("custom livestream duration requires a value");
        };
        validate_duration(&value)?;
        LiveDuration::Custom(value.trim().to_owned())
    } else {
        validate_duration(&flat.livestream_duration)?;
        LiveDuration::Preset(flat.livestream_duration)
    };

    let plot_format = match flat.plot_format.as_str() {
        "string" => PlotFormat::Quoted,
        "folded" => PlotFormat::Folded,
        "literal" => PlotFormat::Literal,
        other => bail!("unsupported plot format: {other}"),
    };

    let script_options = sanitize_script_options(&flat.script_options)?;
    validate_script_options(&format!(
        "yt-dlp {VIDEO_URL_TOKEN} {script_options} -o -"
    ))?;

    Ok(GenerationOptions {
        duration_mode,
        live_duration,
        always_include_live_duration: flat.always_include_live_duration,
        script_template: None,
        script_options,
        include_title: flat.include_title,
        include_plot: flat.include_plot,
        plot_format,
        include_year: flat.include_year,
        include_content_rating: flat.include_content_rating,
        content_rating: flat.content_rating,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_durations() {
        for duration in ["00:00:00", "01:23:45", "23:59:59"] {
            assert!(validate_duration(duration).is_ok(), "{duration}");
        }
    }

    #[test]
    fn rejects_bad_durations() {
        for duration in ["", "1:23:45", "00:60:00", "00:00:60", "24:00:00", "abc"] {
            assert!(validate_duration(duration).is_err(), "{duration:?}");
        }
    }

    #[test]
    fn padding_interval_set_is_closed() {
        for minutes in ALLOWED_PADDING_INTERVALS {
            assert!(validate_padding_interval(minutes).is_ok());
        }
        for minutes in [0, 1, 7, 20, 60] {
            assert!(validate_padding_interval(minutes).is_err(), "{minutes}");
        }
    }

    #[test]
    fn sanitizer_rejects_shell_metacharacters_outright() {
        // Injection attempts must come back as errors, not get laundered
        // into runnable flags.
        for input in [
            "--hls-use-mpegts; rm -rf /",
            "--flag $(whoami)",
            "--flag `id`",
            "--flag && ls",
            "--flag || ls",
            "--flag \"quoted\"",
        ] {
            assert!(sanitize_script_options(input).is_err(), "{input}");
        }
    }

    #[test]
    fn sanitizer_trims_and_drops_nul_bytes() {
        assert_eq!(
            sanitize_script_options("  --retries 3  ").unwrap(),
            "--retries 3"
        );
        assert_eq!(sanitize_script_options("a\0b").unwrap(), "ab");
    }

    #[test]
    fn sanitizer_allows_colon_flags() {
        assert_eq!(
            sanitize_script_options("--downloader-args ffmpeg:-nostats").unwrap(),
            "--downloader-args ffmpeg:-nostats"
        );
    }

    #[test]
    fn sanitizer_caps_input_length() {
        let long = "-".repeat(MAX_SCRIPT_OPTIONS_LEN + 1);
        assert!(sanitize_script_options(&long).is_err());
    }

    #[test]
    fn script_screening_requires_stdout_output() {
        assert!(validate_script_options("yt-dlp {VIDEO_URL} -o file.mp4").is_err());
        assert!(validate_script_options("yt-dlp {VIDEO_URL} -o -").is_ok());
    }

    #[test]
    fn script_screening_rejects_prohibited_flags() {
        for flag in PROHIBITED_FLAGS {
            let script = format!("yt-dlp {{VIDEO_URL}} {flag} x -o -");
            assert!(validate_script_options(&script).is_err(), "{flag}");
        }
    }

    #[test]
    fn script_screening_rejects_chaining() {
        for script in [
            "yt-dlp {VIDEO_URL} -o -; echo pwned",
            "yt-dlp {VIDEO_URL} -o - && ls",
            "yt-dlp {VIDEO_URL} -o - || ls",
            "yt-dlp `id` -o -",
            "yt-dlp $(id) -o -",
        ] {
            assert!(validate_script_options(script).is_err(), "{script}");
        }
    }

    #[test]
    fn builds_default_options() {
        let options = build_generation_options(FlatOptions::default()).unwrap();
        assert_eq!(options.duration_mode, DurationMode::Omit);
        assert_eq!(
            options.live_duration,
            LiveDuration::Preset("00:00:00".to_owned())
        );
        assert_eq!(options.script_options, DEFAULT_SCRIPT_OPTIONS);
    }

    #[test]
    fn custom_mode_requires_a_valid_value() {
        let missing = FlatOptions {
            duration_mode: "custom".to_owned(),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(missing).is_err());

        let malformed = FlatOptions {
            duration_mode: "custom".to_owned(),
            custom_duration: Some("99:99:99".to_owned()),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(malformed).is_err());

        let valid = FlatOptions {
            duration_mode: "custom".to_owned(),
            custom_duration: Some("01:30:00".to_owned()),
            ..FlatOptions::default()
        };
        assert_eq!(
            build_generation_options(valid).unwrap().duration_mode,
            DurationMode::Custom("01:30:00".to_owned())
        );
    }

    #[test]
    fn padded_mode_requires_an_allowed_interval() {
        let missing = FlatOptions {
            duration_mode: "api-padded".to_owned(),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(missing).is_err());

        let odd = FlatOptions {
            duration_mode: "api-padded".to_owned(),
            padding_interval: Some(7),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(odd).is_err());

        let valid = FlatOptions {
            duration_mode: "api-padded".to_owned(),
            padding_interval: Some(15),
            ..FlatOptions::default()
        };
        assert_eq!(
            build_generation_options(valid).unwrap().duration_mode,
            DurationMode::ApiPadded(15)
        );
    }

    #[test]
    fn livestream_sentinel_requires_a_custom_value() {
        let missing = FlatOptions {
            livestream_duration: "custom".to_owned(),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(missing).is_err());

        let valid = FlatOptions {
            livestream_duration: "custom".to_owned(),
            custom_livestream_duration: Some("03:00:00".to_owned()),
            ..FlatOptions::default()
        };
        assert_eq!(
            build_generation_options(valid).unwrap().live_duration,
            LiveDuration::Custom("03:00:00".to_owned())
        );
    }

    #[test]
    fn injection_bearing_script_options_fail_the_whole_request() {
        let flat = FlatOptions {
            script_options: "--flag $(whoami)".to_owned(),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(flat).is_err());
    }

    #[test]
    fn unknown_enums_are_rejected() {
        let mode = FlatOptions {
            duration_mode: "sometimes".to_owned(),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(mode).is_err());

        let format = FlatOptions {
            plot_format: "fancy".to_owned(),
            ..FlatOptions::default()
        };
        assert!(build_generation_options(format).is_err());
    }
}
