#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical service-request record types.
//!
//! This crate defines the validated record type every pipeline stage
//! consumes, the closed directorate taxonomy the source data is normalized
//! into, and the single timestamp-normalization entry point. Raw tabular
//! rows never travel past ingestion; downstream components only see these
//! types.

pub mod taxonomy;
pub mod time;

use chrono::NaiveDateTime;
use service_map_geodesy::GeoPoint;

pub use taxonomy::Directorate;
pub use time::{TimestampError, normalize_timestamp};

/// A single municipal service request, as validated at ingestion.
///
/// Immutable once constructed: enrichment stages produce new types rather
/// than mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    /// Unique notification number (direct identifier, removed by the
    /// anonymization stage).
    pub notification_number: u64,
    /// Secondary reference number, present for a subset of requests.
    pub reference_number: Option<String>,
    /// When the request was logged. Always present; timezone-naive.
    pub creation_timestamp: NaiveDateTime,
    /// When the request was closed, if it has been.
    pub completion_timestamp: Option<NaiveDateTime>,
    /// Responsible directorate.
    pub directorate: Directorate,
    /// Department within the directorate.
    pub department: String,
    /// Branch within the department.
    pub branch: String,
    /// Section within the branch.
    pub section: String,
    /// Request type grouping.
    pub code_group: String,
    /// Specific request type code.
    pub code: String,
    /// Cause grouping, where recorded.
    pub cause_code_group: Option<String>,
    /// Specific cause code, where recorded.
    pub cause_code: Option<String>,
    /// Suburb the request was reported in.
    pub official_suburb: String,
    /// Reported location. `None` when the source row had no usable
    /// coordinates; such rows are counted, never silently dropped.
    pub location: Option<GeoPoint>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use service_map_geodesy::GeoPoint;

    use super::*;

    #[test]
    fn request_construction_round_trips_fields() {
        let creation = NaiveDate::from_ymd_opt(2020, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        let request = ServiceRequest {
            notification_number: 400_512_345,
            reference_number: Some("9104296962".to_string()),
            creation_timestamp: creation,
            completion_timestamp: None,
            directorate: Directorate::WaterAndSanitation,
            department: "Water Pollution Control".to_string(),
            branch: "WPC Operations".to_string(),
            section: "District: Bellville".to_string(),
            code_group: "SEWER".to_string(),
            code: "Sewer: Blocked/Overflow".to_string(),
            cause_code_group: None,
            cause_code: None,
            official_suburb: "BELLVILLE SOUTH".to_string(),
            location: Some(GeoPoint::new(-33.9113, 18.6290).unwrap()),
        };

        assert_eq!(request.notification_number, 400_512_345);
        assert!(request.completion_timestamp.is_none());
        assert_eq!(request.directorate, Directorate::WaterAndSanitation);
    }
}
