//! Filename formatting for downloaded descriptors.
//!
//! Pure utility: turns video titles into filesystem-safe names in a handful
//! of styles, with optional sequential numbering for playlist batches.

use std::sync::LazyLock;

use regex::Regex;

/// Longest name emitted, in characters.
pub const MAX_FILENAME_LEN: usize = 200;

/// Characters no mainstream filesystem accepts: `/ \ : * ? " < > |`.
static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|]"#).unwrap());
static NON_COMPACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\s-]").unwrap());
static NON_SNAKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\s_]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Naming style for a single title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameFormat {
    /// Keep spaces, casing, and punctuation; only drop invalid characters.
    Original,
    /// Lowercase, hyphen-separated, ASCII alphanumerics only.
    Compact,
    /// Preserve casing, spaces become single hyphens.
    Kebab,
    /// Lowercase, underscore-separated.
    Snake,
}

/// Sequential numbering applied to playlist entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStyle {
    None,
    /// `001-title`
    Prefix,
    /// `title-001`
    Suffix,
}

/// Formats a title into a filename-safe string, capped at
/// [`MAX_FILENAME_LEN`] characters.
pub fn format_filename(title: &str, format: FilenameFormat) -> String {
    format_with_limit(title, format, MAX_FILENAME_LEN)
}

fn format_with_limit(title: &str, format: FilenameFormat, max_len: usize) -> String {
    let formatted = match format {
        FilenameFormat::Original => INVALID_CHARS.replace_all(title, "").trim().to_owned(),
        FilenameFormat::Compact => {
            let stripped = NON_COMPACT.replace_all(title, "");
            WHITESPACE.replace_all(&stripped, "-").to_lowercase()
        }
        FilenameFormat::Kebab => {
            let stripped = INVALID_CHARS.replace_all(title, "");
            let hyphenated = WHITESPACE.replace_all(&stripped, "-");
            HYPHEN_RUNS.replace_all(&hyphenated, "-").into_owned()
        }
        FilenameFormat::Snake => {
            let stripped = NON_SNAKE.replace_all(title, "");
            WHITESPACE.replace_all(&stripped, "_").to_lowercase()
        }
    };

    formatted.chars().take(max_len).collect()
}

/// Names one entry of a playlist batch. Sequential styles always number a
/// compact base (shortened to leave room for the `NNN-` marker) so a whole
/// batch sorts correctly regardless of the per-title format.
pub fn playlist_filename(
    title: &str,
    index: usize,
    format: FilenameFormat,
    sequence: SequenceStyle,
) -> String {
    match sequence {
        SequenceStyle::None => format_filename(title, format),
        SequenceStyle::Prefix => {
            let base = format_with_limit(title, FilenameFormat::Compact, MAX_FILENAME_LEN - 4);
            format!("{:03}-{base}", index + 1)
        }
        SequenceStyle::Suffix => {
            let base = format_with_limit(title, FilenameFormat::Compact, MAX_FILENAME_LEN - 4);
            format!("{base}-{:03}", index + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_keeps_text_but_drops_invalid_chars() {
        assert_eq!(
            format_filename("My Video: The \"Sequel\"?", FilenameFormat::Original),
            "My Video The Sequel"
        );
    }

    #[test]
    fn compact_is_lowercase_hyphenated() {
        assert_eq!(
            format_filename("My Great Video!", FilenameFormat::Compact),
            "my-great-video"
        );
        assert_eq!(
            format_filename("Ep. 5: The Return", FilenameFormat::Compact),
            "ep-5-the-return"
        );
    }

    #[test]
    fn kebab_preserves_casing_and_collapses_hyphens() {
        assert_eq!(
            format_filename("My Video - Part 2", FilenameFormat::Kebab),
            "My-Video-Part-2"
        );
    }

    #[test]
    fn snake_is_lowercase_underscored() {
        assert_eq!(
            format_filename("My Great Video!", FilenameFormat::Snake),
            "my_great_video"
        );
    }

    #[test]
    fn output_is_capped() {
        let long = "a".repeat(500);
        assert_eq!(
            format_filename(&long, FilenameFormat::Original).chars().count(),
            MAX_FILENAME_LEN
        );
    }

    #[test]
    fn sequential_numbering_is_one_based_and_padded() {
        assert_eq!(
            playlist_filename("My Video", 0, FilenameFormat::Compact, SequenceStyle::Prefix),
            "001-my-video"
        );
        assert_eq!(
            playlist_filename("My Video", 11, FilenameFormat::Compact, SequenceStyle::Suffix),
            "my-video-012"
        );
    }

    #[test]
    fn sequence_none_uses_the_plain_format() {
        assert_eq!(
            playlist_filename("My Video", 3, FilenameFormat::Kebab, SequenceStyle::None),
            "My-Video"
        );
    }

    #[test]
    fn sequential_names_leave_room_for_the_marker() {
        let long = "b".repeat(500);
        let name = playlist_filename(&long, 0, FilenameFormat::Compact, SequenceStyle::Prefix);
        assert_eq!(name.chars().count(), MAX_FILENAME_LEN);
        assert!(name.starts_with("001-"));
    }
}
