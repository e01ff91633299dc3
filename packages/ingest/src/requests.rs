//! Service-request CSV reader.

use std::io::Read;
use std::str::FromStr;

use service_map_geodesy::GeoPoint;
use service_map_request_models::{Directorate, ServiceRequest, normalize_timestamp};

use crate::IngestError;

/// Columns the service-request CSV must carry, in the order the positions
/// are resolved. A leading unnamed pandas index column is tolerated and
/// ignored because lookup is by name.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "notification_number",
    "reference_number",
    "creation_timestamp",
    "completion_timestamp",
    "directorate",
    "department",
    "branch",
    "section",
    "code_group",
    "code",
    "cause_code_group",
    "cause_code",
    "official_suburb",
    "latitude",
    "longitude",
];

/// Row-quality counters from a service-request read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestIngestStats {
    /// Rows seen in the file (excluding the header).
    pub total_rows: u64,
    /// Rows kept with no usable coordinates (`location = None`).
    pub missing_location: u64,
    /// Rows skipped for an unparsable or absent creation timestamp.
    pub bad_creation_timestamp: u64,
    /// Rows skipped for an unparsable notification number.
    pub bad_notification_number: u64,
    /// Rows skipped for a directorate outside the known taxonomy.
    pub unknown_directorate: u64,
}

impl RequestIngestStats {
    /// Rows skipped entirely.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.bad_creation_timestamp + self.bad_notification_number + self.unknown_directorate
    }
}

/// Reads and validates the service-request CSV.
///
/// The schema is checked once against the header row; after that, rows
/// with a bad identifier, creation timestamp, or directorate are counted
/// and skipped, and rows with unusable coordinates are kept with
/// `location = None` so the subsampler can report them.
///
/// # Errors
///
/// Returns [`IngestError::Schema`] for a missing column, or
/// [`IngestError::Csv`]/[`IngestError::Io`] if the file cannot be read.
pub fn read_service_requests<R: Read>(
    reader: R,
) -> Result<(Vec<ServiceRequest>, RequestIngestStats), IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let positions = crate::header_positions(csv_reader.headers()?, REQUIRED_COLUMNS)?;
    let [
        notification_idx,
        reference_idx,
        creation_idx,
        completion_idx,
        directorate_idx,
        department_idx,
        branch_idx,
        section_idx,
        code_group_idx,
        code_idx,
        cause_code_group_idx,
        cause_code_idx,
        suburb_idx,
        latitude_idx,
        longitude_idx,
    ] = positions[..]
    else {
        unreachable!("header_positions returns one index per required column");
    };

    let mut requests = Vec::new();
    let mut stats = RequestIngestStats::default();

    for record in csv_reader.records() {
        let record = record?;
        stats.total_rows += 1;

        let Some(notification_number) = parse_u64(field(&record, notification_idx)) else {
            stats.bad_notification_number += 1;
            continue;
        };

        let Some(creation_timestamp) =
            non_empty(field(&record, creation_idx)).and_then(|s| normalize_timestamp(s).ok())
        else {
            stats.bad_creation_timestamp += 1;
            continue;
        };

        let Ok(directorate) = Directorate::from_str(field(&record, directorate_idx).trim()) else {
            stats.unknown_directorate += 1;
            continue;
        };

        let completion_timestamp =
            non_empty(field(&record, completion_idx)).and_then(|s| normalize_timestamp(s).ok());

        let location = parse_location(
            field(&record, latitude_idx),
            field(&record, longitude_idx),
        );
        if location.is_none() {
            stats.missing_location += 1;
        }

        requests.push(ServiceRequest {
            notification_number,
            reference_number: non_empty(field(&record, reference_idx)).map(str::to_string),
            creation_timestamp,
            completion_timestamp,
            directorate,
            department: field(&record, department_idx).trim().to_string(),
            branch: field(&record, branch_idx).trim().to_string(),
            section: field(&record, section_idx).trim().to_string(),
            code_group: field(&record, code_group_idx).trim().to_string(),
            code: field(&record, code_idx).trim().to_string(),
            cause_code_group: non_empty(field(&record, cause_code_group_idx)).map(str::to_string),
            cause_code: non_empty(field(&record, cause_code_idx)).map(str::to_string),
            official_suburb: field(&record, suburb_idx).trim().to_string(),
            location,
        });
    }

    log::info!(
        "Read {} service requests ({} skipped, {} without coordinates)",
        requests.len(),
        stats.skipped(),
        stats.missing_location
    );

    Ok((requests, stats))
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("")
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed)
    }
}

/// Parses an identifier that pandas may have written as a float
/// (`"400512345.0"`).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_u64(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(n);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        Some(f as u64)
    } else {
        None
    }
}

/// Parses lat/lon into a validated point. Missing, unparsable,
/// out-of-range, or (0, 0) placeholder coordinates all count as no
/// location.
fn parse_location(lat: &str, lon: &str) -> Option<GeoPoint> {
    let latitude = non_empty(lat)?.parse::<f64>().ok()?;
    let longitude = non_empty(lon)?.parse::<f64>().ok()?;
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    GeoPoint::new(latitude, longitude).ok()
}
