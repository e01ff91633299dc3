//! Timestamp normalization.
//!
//! The pipeline compares timestamps timezone-naive. Any timezone-aware
//! input has its zone stripped (not converted) here, exactly once, before
//! it reaches a record type. There is no other parsing path, so naive and
//! aware values can never be mixed downstream.

use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

/// Error raised when a timestamp cannot be normalized.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    /// The value matched none of the accepted timestamp forms.
    #[error("unparsable timestamp: {value:?}")]
    Unparseable {
        /// The raw input value.
        value: String,
    },
}

/// Naive formats accepted from the source files, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses a raw timestamp string into a naive timestamp.
///
/// Timezone-aware input (RFC 3339 with an offset) keeps its local clock
/// face and loses the zone; naive input parses as-is.
///
/// # Errors
///
/// Returns [`TimestampError::Unparseable`] if the value matches no
/// accepted form.
pub fn normalize_timestamp(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = raw.trim();

    if let Ok(aware) = DateTime::parse_from_rfc3339(trimmed) {
        // Strip the zone, keep the clock face.
        return Ok(aware.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive);
        }
    }

    Err(TimestampError::Unparseable {
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::*;

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parses_space_separated_naive() {
        assert_eq!(
            normalize_timestamp("2020-03-14 09:26:53").unwrap(),
            naive(2020, 3, 14, 9, 26, 53)
        );
    }

    #[test]
    fn parses_iso_t_separated_with_fraction() {
        assert_eq!(
            normalize_timestamp("2020-03-14T09:26:53.250").unwrap(),
            naive(2020, 3, 14, 9, 26, 53).with_nanosecond(250_000_000).unwrap()
        );
    }

    #[test]
    fn aware_input_is_stripped_not_converted() {
        // 09:26:53 at +02:00 stays 09:26:53, not 07:26:53.
        assert_eq!(
            normalize_timestamp("2020-03-14T09:26:53+02:00").unwrap(),
            naive(2020, 3, 14, 9, 26, 53)
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            normalize_timestamp("  2020-01-01 00:00:00 ").unwrap(),
            naive(2020, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            normalize_timestamp("not-a-date"),
            Err(TimestampError::Unparseable {
                value: "not-a-date".to_string()
            })
        );
    }

    #[test]
    fn rejects_date_without_time() {
        assert!(normalize_timestamp("2020-03-14").is_err());
    }
}
