//! Duration text handling for remote stream descriptors.
//!
//! The YouTube Data API reports video lengths as ISO-8601 durations
//! (`PT1H2M3S`); ErsatzTV expects plain `HH:MM:SS`. Everything in here is a
//! total function over strings: upstream API data is not fully trusted, so
//! malformed input degrades to a zero duration instead of erroring.

use std::sync::LazyLock;

use regex::Regex;

static ISO8601_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap());

/// Converts an ISO-8601 `PT#H#M#S` duration into `HH:MM:SS` text.
///
/// Any component may be absent (`PT5M` is five minutes). Input that does not
/// contain a `PT...` duration at all comes back as `"00:00:00"`. Hours are
/// zero-padded to two digits but never truncated, so `PT100H0M0S` stays
/// `100:00:00`.
pub fn parse_iso8601_duration(text: &str) -> String {
    let Some(captures) = ISO8601_DURATION.captures(text) else {
        return "00:00:00".to_owned();
    };

    let component = |index: usize| -> u64 {
        captures
            .get(index)
            .and_then(|group| group.as_str().parse().ok())
            .unwrap_or(0)
    };

    format!(
        "{:02}:{:02}:{:02}",
        component(1),
        component(2),
        component(3)
    )
}

/// Rounds an `HH:MM:SS` duration up to the next multiple of
/// `interval_minutes`, for aligning VODs to fixed programming blocks.
///
/// Residual seconds bump the minute count before rounding, so any positive
/// duration lands on at least one full interval; a zero duration stays zero.
/// Seconds are never preserved in the output. Interval membership in
/// {5, 10, 15, 30} is the caller's job; any positive interval works here.
pub fn pad_to_interval(duration: &str, interval_minutes: u32) -> String {
    let (hours, minutes, seconds) = split_clock(duration);

    // An interval of zero would divide by zero; clamp rather than panic.
    // Hours are unbounded-width text, so the arithmetic saturates instead of
    // overflowing on absurd inputs.
    let interval = u64::from(interval_minutes.max(1));
    let total_minutes = hours
        .saturating_mul(60)
        .saturating_add(minutes)
        .saturating_add(u64::from(seconds > 0));
    let padded_minutes = total_minutes.div_ceil(interval).saturating_mul(interval);

    format!("{:02}:{:02}:00", padded_minutes / 60, padded_minutes % 60)
}

/// Splits `HH:MM:SS` into numeric components, treating anything unparsable
/// as zero so the padder stays total.
fn split_clock(duration: &str) -> (u64, u64, u64) {
    let mut parts = duration
        .split(':')
        .map(|part| part.parse::<u64>().unwrap_or(0));

    let hours = parts.next().unwrap_or(0);
    let minutes = parts.next().unwrap_or(0);
    let seconds = parts.next().unwrap_or(0);
    (hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_duration() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), "01:02:03");
    }

    #[test]
    fn parses_partial_components() {
        assert_eq!(parse_iso8601_duration("PT5M"), "00:05:00");
        assert_eq!(parse_iso8601_duration("PT45S"), "00:00:45");
        assert_eq!(parse_iso8601_duration("PT2H"), "02:00:00");
    }

    #[test]
    fn zero_duration_is_all_zeros() {
        assert_eq!(parse_iso8601_duration("PT0S"), "00:00:00");
    }

    #[test]
    fn hours_keep_their_natural_width() {
        assert_eq!(parse_iso8601_duration("PT100H0M0S"), "100:00:00");
    }

    #[test]
    fn malformed_input_degrades_to_zero() {
        assert_eq!(parse_iso8601_duration(""), "00:00:00");
        assert_eq!(parse_iso8601_duration("invalid"), "00:00:00");
        assert_eq!(parse_iso8601_duration("P1D"), "00:00:00");
    }

    #[test]
    fn parsed_output_always_matches_clock_shape() {
        let clock = Regex::new(r"^\d+:\d{2}:\d{2}$").unwrap();
        for input in ["PT1H2M3S", "PT100H", "PT59S", "", "garbage"] {
            assert!(clock.is_match(&parse_iso8601_duration(input)), "{input}");
        }
    }

    #[test]
    fn zero_duration_stays_zero_when_padded() {
        for interval in [5, 10, 15, 30] {
            assert_eq!(pad_to_interval("00:00:00", interval), "00:00:00");
        }
    }

    #[test]
    fn positive_seconds_force_a_full_interval() {
        assert_eq!(pad_to_interval("00:00:01", 5), "00:05:00");
    }

    #[test]
    fn exact_multiples_only_lose_their_seconds() {
        assert_eq!(pad_to_interval("00:05:00", 5), "00:05:00");
        assert_eq!(pad_to_interval("01:30:00", 30), "01:30:00");
    }

    #[test]
    fn rounds_up_to_the_next_block() {
        assert_eq!(pad_to_interval("00:03:33", 15), "00:15:00");
        assert_eq!(pad_to_interval("00:03:33", 5), "00:05:00");
        assert_eq!(pad_to_interval("01:02:03", 30), "01:30:00");
        assert_eq!(pad_to_interval("00:59:59", 10), "01:00:00");
    }

    #[test]
    fn extreme_hour_counts_saturate_instead_of_panicking() {
        // Hours are unbounded-width text, so a parsed duration can carry an
        // hour count near u64::MAX and padding must still be total.
        let huge = format!("{}:00:00", u64::MAX);
        let clock = Regex::new(r"^\d+:\d{2}:00$").unwrap();
        for interval in [5, 15, 30] {
            assert!(clock.is_match(&pad_to_interval(&huge, interval)));
        }
        assert!(clock.is_match(&pad_to_interval(&parse_iso8601_duration(
            "PT18446744073709551615H"
        ), 15)));
    }

    #[test]
    fn output_minutes_are_a_multiple_of_the_interval() {
        for (duration, interval) in [("00:07:12", 5), ("02:44:00", 15), ("00:29:59", 30)] {
            let (hours, minutes, seconds) = split_clock(&pad_to_interval(duration, interval));
            assert_eq!(seconds, 0);
            assert_eq!((hours * 60 + minutes) % u64::from(interval), 0);
        }
    }
}
