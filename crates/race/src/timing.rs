//! Duration and timestamp helpers shared by the projection and deviation code.
//!
//! Malformed durations never escape this module as errors: [`parse_duration`]
//! yields `0`, which downstream code treats as "no prediction". Missing
//! timestamps format as [`SENTINEL`]; the sentinel is display-only and all
//! arithmetic goes through `Option` values instead.

use thiserror::Error;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339};

/// Display placeholder for a time that cannot be computed.
pub const SENTINEL: &str = "--:--:--";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFormatError {
    #[error("expected H:MM:SS, got {0:?}")]
    Pattern(String),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u32 },
}

/// Parses `H:MM:SS` / `HH:MM:SS` into seconds, reporting why it failed.
pub fn try_parse_duration(text: &str) -> Result<u32, TimeFormatError> {
    let (hours, minutes, seconds) = split_hms(text)?;
    if minutes > 59 {
        return Err(TimeFormatError::OutOfRange {
            field: "minutes",
            value: minutes,
        });
    }
    if seconds > 59 {
        return Err(TimeFormatError::OutOfRange {
            field: "seconds",
            value: seconds,
        });
    }
    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| TimeFormatError::Pattern(text.to_string()))
}

/// Parses a duration string, returning `0` when it is malformed.
pub fn parse_duration(text: &str) -> u32 {
    try_parse_duration(text).unwrap_or(0)
}

fn split_hms(text: &str) -> Result<(u32, u32, u32), TimeFormatError> {
    let pattern = || TimeFormatError::Pattern(text.to_string());
    let mut parts = text.trim().split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(pattern());
    };

    let field = |part: &str| -> Result<u32, TimeFormatError> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(pattern());
        }
        part.parse::<u32>().map_err(|_| pattern())
    };

    Ok((field(h)?, field(m)?, field(s)?))
}

/// Whole seconds from `start` to `end`, floored; negative when `end` precedes `start`.
pub fn elapsed_seconds(start: OffsetDateTime, end: OffsetDateTime) -> i64 {
    let millis = (end - start).whole_milliseconds();
    millis.div_euclid(1000) as i64
}

/// Formats an unsigned duration as zero-padded `HH:MM:SS`. Hours may exceed 99.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats a signed duration as `+HH:MM:SS` or `-HH:MM:SS`; zero is `+`.
pub fn format_signed(seconds: i64) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    format!("{sign}{}", format_duration(seconds.unsigned_abs()))
}

/// Formats the span between two optional timestamps, or [`SENTINEL`] when
/// either side is missing or the span is negative.
pub fn format_elapsed(start: Option<OffsetDateTime>, end: Option<OffsetDateTime>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => match u64::try_from(elapsed_seconds(start, end)) {
            Ok(secs) => format_duration(secs),
            Err(_) => SENTINEL.to_string(),
        },
        _ => SENTINEL.to_string(),
    }
}

/// Wall-clock `HH:MM:SS` of a timestamp (in its own offset), or [`SENTINEL`].
pub fn format_clock(timestamp: Option<OffsetDateTime>) -> String {
    match timestamp {
        Some(ts) => format!("{:02}:{:02}:{:02}", ts.hour(), ts.minute(), ts.second()),
        None => SENTINEL.to_string(),
    }
}

/// Parses an RFC 3339 timestamp, or a bare `HH:MM:SS` time of day on
/// `reference_date` (UTC).
pub fn parse_timestamp(text: &str, reference_date: Date) -> Option<OffsetDateTime> {
    let text = text.trim();
    if let Ok(ts) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(ts);
    }

    let (hours, minutes, seconds) = split_hms(text).ok()?;
    let time_of_day = Time::from_hms(
        u8::try_from(hours).ok()?,
        u8::try_from(minutes).ok()?,
        u8::try_from(seconds).ok()?,
    )
    .ok()?;
    Some(PrimitiveDateTime::new(reference_date, time_of_day).assume_utc())
}
