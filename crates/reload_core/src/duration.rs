use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// Fallback period used when a configured duration cannot be parsed.
pub const DEFAULT_AUTO_REFRESH_MS: u64 = 5_000;

/// Longest period a host timer accepts (`2^31 - 1` ms, just under 25 days).
pub const MAX_PERIOD_MS: u64 = i32::MAX as u64;

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid time string {input:?}: no number found")]
    Parse { input: String },
    #[error("time string {input:?} must describe a positive duration")]
    NotPositive { input: String },
    #[error("time string {input:?} is out of range")]
    OutOfRange { input: String },
}

/// A validated, strictly positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeDuration(Duration);

impl TimeDuration {
    pub(crate) fn from_millis(ms: u64) -> Self {
        debug_assert!(ms > 0);
        Self(Duration::from_millis(ms))
    }

    /// The period used when the configured one is unusable.
    pub fn default_auto_refresh() -> Self {
        Self::from_millis(DEFAULT_AUTO_REFRESH_MS)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_millis_f64(&self) -> f64 {
        self.0.as_secs_f64() * MS_PER_SECOND
    }
}

impl fmt::Display for TimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis_f64())
    }
}

impl From<TimeDuration> for Duration {
    fn from(value: TimeDuration) -> Self {
        value.0
    }
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-9]+[0-9.]*) *(ms|milliseconds?|s|seconds?|m|minutes?|h|hours?|d|days?)?")
            .expect("time pattern is valid")
    })
}

/// Parses a human time specification such as `"5s"`, `"2 minutes"` or `"500"`.
///
/// The first number found anywhere in the input is used, together with a unit
/// directly following it (spaces allowed). A bare number is milliseconds.
pub fn parse_duration(input: &str) -> Result<TimeDuration, DurationError> {
    let captures = time_pattern()
        .captures(input)
        .ok_or_else(|| DurationError::Parse {
            input: input.to_string(),
        })?;

    let magnitude = captures
        .get(1)
        .and_then(|token| leading_number(token.as_str()))
        .ok_or_else(|| DurationError::Parse {
            input: input.to_string(),
        })?;
    let factor = captures
        .get(2)
        .map(|unit| unit_factor(unit.as_str()))
        .unwrap_or(1.0);

    let millis = magnitude * factor;
    if millis <= 0.0 {
        return Err(DurationError::NotPositive {
            input: input.to_string(),
        });
    }
    if millis > MAX_PERIOD_MS as f64 {
        return Err(DurationError::OutOfRange {
            input: input.to_string(),
        });
    }

    let duration =
        Duration::try_from_secs_f64(millis / MS_PER_SECOND).map_err(|_| DurationError::OutOfRange {
            input: input.to_string(),
        })?;
    if duration.is_zero() {
        return Err(DurationError::NotPositive {
            input: input.to_string(),
        });
    }
    Ok(TimeDuration(duration))
}

/// Reads the longest decimal prefix of a `[0-9]+[0-9.]*` token, so `"1.5.2"` is `1.5`.
fn leading_number(token: &str) -> Option<f64> {
    let mut parts = token.splitn(3, '.');
    let whole = parts.next()?;
    let text = match parts.next() {
        Some(fraction) => format!("{whole}.{fraction}"),
        None => whole.to_string(),
    };
    text.parse().ok()
}

fn unit_factor(unit: &str) -> f64 {
    match unit {
        "ms" | "millisecond" | "milliseconds" => 1.0,
        "s" | "second" | "seconds" => MS_PER_SECOND,
        "m" | "minute" | "minutes" => MS_PER_MINUTE,
        "h" | "hour" | "hours" => MS_PER_HOUR,
        "d" | "day" | "days" => MS_PER_DAY,
        _ => 1.0,
    }
}
