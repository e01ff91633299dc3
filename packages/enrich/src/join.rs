//! Temporal joining of requests onto the wind grid.

use chrono::{Duration, NaiveDateTime};
use service_map_wind::WindGrid;

use crate::EnrichedRequest;

/// Counters produced by [`attach_wind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinStats {
    /// Rows joined to a grid slot carrying a wind value.
    pub matched: u64,
    /// Rows whose rounded timestamp fell outside the grid's range.
    pub unmatched: u64,
    /// Rows that hit a grid slot inside the range with no wind data (an
    /// unfilled gap); wind stays null rather than being fabricated.
    pub no_data: u64,
}

/// Rounds a timestamp to the nearest grid point.
///
/// The lattice is anchored at midnight, so a 30-minute step lands on
/// :00/:30. Exact half-step ties round to the **later** grid point; this
/// is load-bearing for join cardinality and must not change quietly.
#[must_use]
pub fn round_to_grid(timestamp: NaiveDateTime, step_minutes: u32) -> NaiveDateTime {
    let step = i64::from(step_minutes) * 60;
    let seconds = timestamp.and_utc().timestamp();
    let remainder = seconds.rem_euclid(step);
    let down = seconds - remainder;
    let rounded = if remainder * 2 >= step { down + step } else { down };
    timestamp + Duration::seconds(rounded - seconds)
}

/// Attaches grid observations to enriched requests at their rounded
/// creation timestamps, in place.
///
/// An off-grid rounded timestamp sets the `unmatched` flag instead of
/// silently joining to null, so callers can count unmatched rows.
pub fn attach_wind(requests: &mut [EnrichedRequest], grid: &WindGrid) -> JoinStats {
    let mut stats = JoinStats::default();

    for request in requests {
        match grid.value_at(request.creation_rounded) {
            None => {
                request.unmatched = true;
                stats.unmatched += 1;
            }
            Some(observation) => match observation.vector {
                Some(vector) => {
                    request.wind = Some(vector);
                    stats.matched += 1;
                }
                None => {
                    stats.no_data += 1;
                }
            },
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use h3o::Resolution;
    use service_map_geodesy::GeoPoint;
    use service_map_hexgrid::assign_cell;
    use service_map_request_models::{Directorate, ServiceRequest};
    use service_map_wind::{ResampleConfig, WindObservation, WindVector, resample};

    use super::*;

    fn ts(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn enriched(creation: NaiveDateTime) -> EnrichedRequest {
        let location = GeoPoint::new(-33.8930, 18.6050).unwrap();
        let request = ServiceRequest {
            notification_number: 1,
            reference_number: None,
            creation_timestamp: creation,
            completion_timestamp: None,
            directorate: Directorate::Energy,
            department: "Electricity".to_string(),
            branch: "Maintenance".to_string(),
            section: "North".to_string(),
            code_group: "STREETLIGHTS".to_string(),
            code: "Street Light Out".to_string(),
            cause_code_group: None,
            cause_code: None,
            official_suburb: "BELLVILLE SOUTH".to_string(),
            location: Some(location),
        };
        let cell = assign_cell(location, Resolution::Eight).unwrap();
        EnrichedRequest::new(request, location, cell, 250.0, 30)
    }

    fn hourly(hour: u32, speed: f64, direction: f64) -> WindObservation {
        WindObservation {
            timestamp: ts(hour, 0, 0),
            vector: Some(WindVector::new(speed, direction).unwrap()),
        }
    }

    #[test]
    fn rounds_to_nearest_half_hour() {
        assert_eq!(round_to_grid(ts(9, 26, 53), 30), ts(9, 30, 0));
        assert_eq!(round_to_grid(ts(9, 44, 59), 30), ts(9, 30, 0));
        assert_eq!(round_to_grid(ts(9, 45, 1), 30), ts(10, 0, 0));
        assert_eq!(round_to_grid(ts(9, 30, 0), 30), ts(9, 30, 0));
    }

    #[test]
    fn exact_ties_round_to_the_later_point() {
        assert_eq!(round_to_grid(ts(9, 15, 0), 30), ts(9, 30, 0));
        assert_eq!(round_to_grid(ts(9, 45, 0), 30), ts(10, 0, 0));
        assert_eq!(round_to_grid(ts(23, 45, 0), 30), ts(0, 0, 0) + Duration::days(1));
    }

    #[test]
    fn attaches_wind_at_rounded_timestamp() {
        let (grid, _) = resample(
            &[hourly(9, 4.0, 350.0), hourly(10, 4.0, 10.0)],
            &ResampleConfig::default(),
        )
        .unwrap();

        let mut requests = vec![enriched(ts(9, 26, 53))];
        let stats = attach_wind(&mut requests, &grid);

        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 0);
        let wind = requests[0].wind.unwrap();
        // 09:30 midpoint of 350° and 10° across the wrap.
        assert!(wind.direction_deg() < 1e-6 || wind.direction_deg() > 360.0 - 1e-6);
        assert!(!requests[0].unmatched);
    }

    #[test]
    fn out_of_range_rows_are_flagged_unmatched() {
        let (grid, _) = resample(
            &[hourly(9, 4.0, 90.0), hourly(10, 4.0, 90.0)],
            &ResampleConfig::default(),
        )
        .unwrap();

        let mut requests = vec![enriched(ts(15, 0, 0))];
        let stats = attach_wind(&mut requests, &grid);

        assert_eq!(stats.unmatched, 1);
        assert!(requests[0].unmatched);
        assert!(requests[0].wind.is_none());
    }

    #[test]
    fn unfilled_gap_counts_as_no_data_not_unmatched() {
        let readings = vec![
            hourly(0, 4.0, 90.0),
            WindObservation {
                timestamp: ts(1, 0, 0),
                vector: None,
            },
            WindObservation {
                timestamp: ts(2, 0, 0),
                vector: None,
            },
            hourly(3, 2.0, 270.0),
        ];
        let config = ResampleConfig {
            source_step_minutes: 60,
            max_fill_span_steps: Some(1),
        };
        let (grid, _) = resample(&readings, &config).unwrap();

        let mut requests = vec![enriched(ts(1, 10, 0))];
        let stats = attach_wind(&mut requests, &grid);

        assert_eq!(stats.no_data, 1);
        assert_eq!(stats.unmatched, 0);
        assert!(!requests[0].unmatched);
        assert!(requests[0].wind.is_none());
    }
}
