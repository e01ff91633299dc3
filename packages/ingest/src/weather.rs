//! Hourly wind CSV reader.
//!
//! Accepts the site-filtered SAAQIS extract shape: a `DateTime` column
//! plus the two wind columns. `NoData` markers and blank cells become
//! gaps for the resampler to fill or report.

use std::io::Read;

use service_map_request_models::normalize_timestamp;
use service_map_wind::{WindObservation, WindVector};

use crate::IngestError;

/// Columns the wind CSV must carry.
pub const REQUIRED_COLUMNS: &[&str] = &["DateTime", "wind direction degree", "wind speed m/s"];

/// Row-quality counters from a wind read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindIngestStats {
    /// Rows seen in the file (excluding the header).
    pub total_rows: u64,
    /// Rows skipped for an unparsable timestamp.
    pub bad_timestamp: u64,
    /// Rows kept as gaps because either value was blank or `NoData`.
    pub missing_value: u64,
    /// Rows kept as gaps because a value was out of range (negative
    /// speed, direction outside [0, 360], non-finite).
    pub out_of_range: u64,
}

/// Reads the hourly wind CSV into observations.
///
/// Rows with unusable values are kept as gaps (not dropped) so the
/// resampler sees the full time span; rows with unusable timestamps
/// cannot be placed at all and are counted and skipped.
///
/// # Errors
///
/// Returns [`IngestError::Schema`] for a missing column, or
/// [`IngestError::Csv`]/[`IngestError::Io`] if the file cannot be read.
pub fn read_wind_observations<R: Read>(
    reader: R,
) -> Result<(Vec<WindObservation>, WindIngestStats), IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let positions = crate::header_positions(csv_reader.headers()?, REQUIRED_COLUMNS)?;
    let [timestamp_idx, direction_idx, speed_idx] = positions[..] else {
        unreachable!("header_positions returns one index per required column");
    };

    let mut observations = Vec::new();
    let mut stats = WindIngestStats::default();

    for record in csv_reader.records() {
        let record = record?;
        stats.total_rows += 1;

        let raw_timestamp = record.get(timestamp_idx).unwrap_or("");
        let Ok(timestamp) = normalize_timestamp(raw_timestamp) else {
            stats.bad_timestamp += 1;
            continue;
        };

        let direction = parse_value(record.get(direction_idx).unwrap_or(""));
        let speed = parse_value(record.get(speed_idx).unwrap_or(""));

        let vector = match (speed, direction) {
            (Some(s), Some(d)) if (0.0..=360.0).contains(&d) && s >= 0.0 => {
                match WindVector::new(s, d) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        stats.out_of_range += 1;
                        None
                    }
                }
            }
            (Some(_), Some(_)) => {
                stats.out_of_range += 1;
                None
            }
            _ => {
                stats.missing_value += 1;
                None
            }
        };

        observations.push(WindObservation { timestamp, vector });
    }

    log::info!(
        "Read {} wind rows ({} gaps: {} missing, {} out of range)",
        observations.len(),
        stats.missing_value + stats.out_of_range,
        stats.missing_value,
        stats.out_of_range
    );

    Ok((observations, stats))
}

/// Parses a numeric cell; blank and `NoData` markers yield `None`.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nodata")
        || trimmed.eq_ignore_ascii_case("nan")
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "DateTime,wind direction degree,wind speed m/s";

    fn read(body: &str) -> (Vec<WindObservation>, WindIngestStats) {
        let data = format!("{HEADER}\n{body}");
        read_wind_observations(data.as_bytes()).unwrap()
    }

    #[test]
    fn reads_hourly_rows() {
        let (observations, stats) = read(
            "2020-06-01 00:00:00,350,4.0\n2020-06-01 01:00:00,10,4.0",
        );
        assert_eq!(observations.len(), 2);
        assert_eq!(stats.missing_value, 0);
        let v = observations[0].vector.unwrap();
        assert!((v.direction_deg() - 350.0).abs() < 1e-9);
        assert!((v.speed_ms() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn nodata_cells_become_gaps() {
        let (observations, stats) = read(
            "2020-06-01 00:00:00,NoData,NoData\n2020-06-01 01:00:00,90,",
        );
        assert_eq!(observations.len(), 2);
        assert!(observations[0].vector.is_none());
        assert!(observations[1].vector.is_none());
        assert_eq!(stats.missing_value, 2);
    }

    #[test]
    fn out_of_range_values_become_gaps() {
        let (observations, stats) = read(
            "2020-06-01 00:00:00,400,3.0\n2020-06-01 01:00:00,90,-2.0",
        );
        assert!(observations[0].vector.is_none());
        assert!(observations[1].vector.is_none());
        assert_eq!(stats.out_of_range, 2);
    }

    #[test]
    fn direction_360_is_accepted_as_north() {
        let (observations, _) = read("2020-06-01 00:00:00,360,3.0");
        let v = observations[0].vector.unwrap();
        assert!(v.direction_deg().abs() < 1e-9);
    }

    #[test]
    fn bad_timestamp_rows_are_skipped() {
        let (observations, stats) = read("garbage,90,3.0\n2020-06-01 01:00:00,90,3.0");
        assert_eq!(observations.len(), 1);
        assert_eq!(stats.bad_timestamp, 1);
    }

    #[test]
    fn missing_wind_column_aborts() {
        let data = "DateTime,wind speed m/s\n2020-06-01 00:00:00,3.0";
        let err = read_wind_observations(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Schema { column } if column == "wind direction degree"
        ));
    }
}
