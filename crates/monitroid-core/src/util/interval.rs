//! Sampling interval parser for CLI arguments.
//!
//! Supported formats:
//! - Milliseconds: `500ms`
//! - Seconds: `2s`, or a bare number such as `10`
//! - Minutes: `5m`
//! - Hours: `1h`

use std::time::Duration;

/// Error type for interval parsing failures.
#[derive(Debug, Clone)]
pub struct IntervalParseError {
    pub input: String,
    pub message: String,
}

impl std::fmt::Display for IntervalParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to parse interval '{}': {}",
            self.input, self.message
        )
    }
}

impl std::error::Error for IntervalParseError {}

/// Parses a human-readable interval into a [`Duration`].
///
/// A gatherer sampled every zero seconds would spin, so `0`, `0s` etc. are rejected.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use monitroid_core::util::parse_interval;
///
/// assert_eq!(parse_interval("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_interval("2").unwrap(), Duration::from_secs(2));
/// ```
pub fn parse_interval(input: &str) -> Result<Duration, IntervalParseError> {
    let input = input.trim();
    let err = |message: &str| IntervalParseError {
        input: input.to_string(),
        message: message.to_string(),
    };

    if input.is_empty() {
        return Err(err("empty interval string"));
    }

    // "ms" must be checked before "m" and "s".
    let (num_str, unit_ms) = if let Some(num) = input.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, 1_000)
    } else if let Some(num) = input.strip_suffix('m') {
        (num, 60 * 1_000)
    } else if let Some(num) = input.strip_suffix('h') {
        (num, 60 * 60 * 1_000)
    } else {
        (input, 1_000)
    };

    let value: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| err("expected a whole number with an optional ms/s/m/h suffix"))?;

    let millis = value
        .checked_mul(unit_ms)
        .ok_or_else(|| err("interval is too large"))?;

    if millis == 0 {
        return Err(err("interval must be greater than zero"));
    }

    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_interval("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_interval("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_bare_number_is_seconds() {
        assert_eq!(parse_interval("10").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_interval(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_formats() {
        assert!(parse_interval("").is_err());
        assert!(parse_interval("abc").is_err());
        assert!(parse_interval("1.5s").is_err());
        assert!(parse_interval("10d").is_err());
        assert!(parse_interval("-1s").is_err());
    }

    #[test]
    fn test_zero_rejected() {
        let err = parse_interval("0ms").unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
        assert!(parse_interval("0").is_err());
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(parse_interval(&format!("{}h", u64::MAX)).is_err());
    }
}
