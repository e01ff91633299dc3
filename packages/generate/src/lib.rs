#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV output generation for the enrichment pipeline.
//!
//! Every writer uses an atomic write pattern (write to `.tmp`, then
//! rename) so an interrupted run never leaves a truncated output behind.
//! Column layouts come from the record types' column catalogs, so the
//! files and the anonymization policy checks can never drift apart.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use h3o::CellIndex;
use service_map_anonymize::AnonymizedRequest;
use service_map_enrich::EnrichedRequest;
use service_map_request_models::ServiceRequest;
use service_map_wind::WindGrid;
use thiserror::Error;

/// Errors that can occur while writing outputs.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// File write or rename failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the indexed dataset: every ingested row plus its `hex_index`.
///
/// `cells` must be the batch-assignment output aligned with `requests`;
/// rows without coordinates get an empty index cell.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
pub fn write_indexed(
    path: &Path,
    requests: &[ServiceRequest],
    cells: &[Option<CellIndex>],
) -> Result<u64, GenerateError> {
    let tmp = tmp_path(path);
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(&EnrichedRequest::COLUMNS[..16])?;

    let mut rows: u64 = 0;
    for (request, cell) in requests.iter().zip(cells) {
        let mut record = request_fields(request);
        record.push(cell.map(|c| c.to_string()).unwrap_or_default());
        writer.write_record(&record)?;
        rows += 1;
    }

    finish(writer, &tmp, path)?;
    log::info!("Wrote {rows} indexed rows to {}", path.display());
    Ok(rows)
}

/// Writes the subsampled dataset: indexed rows inside the radius, plus
/// `distance_meters`.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_subsampled(path: &Path, rows: &[EnrichedRequest]) -> Result<u64, GenerateError> {
    let tmp = tmp_path(path);
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(&EnrichedRequest::COLUMNS[..17])?;

    for row in rows {
        let mut record = request_fields(&row.request);
        record.push(row.hex_index.to_string());
        record.push(format!("{:.1}", row.distance_meters));
        writer.write_record(&record)?;
    }

    finish(writer, &tmp, path)?;
    log::info!("Wrote {} subsampled rows to {}", rows.len(), path.display());
    Ok(rows.len() as u64)
}

/// Writes the dense wind grid in the same column shape as the hourly
/// input file.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_wind_grid(path: &Path, grid: &WindGrid) -> Result<u64, GenerateError> {
    let tmp = tmp_path(path);
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(["DateTime", "wind direction degree", "wind speed m/s"])?;

    for sample in grid.samples() {
        let (direction, speed) = sample.vector.map_or_else(
            || (String::new(), String::new()),
            |v| (v.direction_deg().to_string(), v.speed_ms().to_string()),
        );
        writer.write_record([format_timestamp(sample.timestamp), direction, speed])?;
    }

    finish(writer, &tmp, path)?;
    log::info!("Wrote {} wind grid rows to {}", grid.len(), path.display());
    Ok(grid.len() as u64)
}

/// Writes the enriched dataset: subsampled rows plus the rounded creation
/// time, joined wind fields, and the `unmatched` flag.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_enriched(path: &Path, rows: &[EnrichedRequest]) -> Result<u64, GenerateError> {
    let tmp = tmp_path(path);
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(EnrichedRequest::COLUMNS)?;

    for row in rows {
        let mut record = request_fields(&row.request);
        record.push(row.hex_index.to_string());
        record.push(format!("{:.1}", row.distance_meters));
        record.push(format_timestamp(row.creation_rounded));
        let (direction, speed) = row.wind.map_or_else(
            || (String::new(), String::new()),
            |v| (v.direction_deg().to_string(), v.speed_ms().to_string()),
        );
        record.push(direction);
        record.push(speed);
        record.push(row.unmatched.to_string());
        writer.write_record(&record)?;
    }

    finish(writer, &tmp, path)?;
    log::info!("Wrote {} enriched rows to {}", rows.len(), path.display());
    Ok(rows.len() as u64)
}

/// Writes the anonymized terminal dataset.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_anonymized(path: &Path, rows: &[AnonymizedRequest]) -> Result<u64, GenerateError> {
    let tmp = tmp_path(path);
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(AnonymizedRequest::COLUMNS)?;

    for row in rows {
        let (direction, speed) = row.wind.map_or_else(
            || (String::new(), String::new()),
            |v| (v.direction_deg().to_string(), v.speed_ms().to_string()),
        );
        writer.write_record([
            format_timestamp(row.creation_timestamp),
            row.completion_timestamp.map(format_timestamp).unwrap_or_default(),
            row.directorate.to_string(),
            row.department.clone(),
            row.branch.clone(),
            row.section.clone(),
            row.code_group.clone(),
            row.cause_code_group.clone().unwrap_or_default(),
            row.official_suburb.clone(),
            row.hex_index.to_string(),
            direction,
            speed,
        ])?;
    }

    finish(writer, &tmp, path)?;
    log::info!("Wrote {} anonymized rows to {}", rows.len(), path.display());
    Ok(rows.len() as u64)
}

/// The 15 raw request columns, shared by every request-bearing writer.
fn request_fields(request: &ServiceRequest) -> Vec<String> {
    vec![
        request.notification_number.to_string(),
        request.reference_number.clone().unwrap_or_default(),
        format_timestamp(request.creation_timestamp),
        request
            .completion_timestamp
            .map(format_timestamp)
            .unwrap_or_default(),
        request.directorate.to_string(),
        request.department.clone(),
        request.branch.clone(),
        request.section.clone(),
        request.code_group.clone(),
        request.code.clone(),
        request.cause_code_group.clone().unwrap_or_default(),
        request.cause_code.clone().unwrap_or_default(),
        request.official_suburb.clone(),
        request.location.map(|p| p.latitude().to_string()).unwrap_or_default(),
        request.location.map(|p| p.longitude().to_string()).unwrap_or_default(),
    ]
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Sibling `.tmp` path for the atomic write pattern.
fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Flushes the writer and renames the temp file into place.
fn finish(writer: csv::Writer<std::fs::File>, tmp: &Path, path: &Path) -> Result<(), GenerateError> {
    writer.into_inner().map_err(|e| e.into_error())?.sync_all().ok();
    std::fs::rename(tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use h3o::Resolution;
    use service_map_anonymize::{AnonymizePolicy, anonymize};
    use service_map_geodesy::GeoPoint;
    use service_map_hexgrid::assign_cell;
    use service_map_request_models::Directorate;
    use service_map_wind::{ResampleConfig, WindObservation, WindVector, resample};

    use super::*;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample_request() -> ServiceRequest {
        ServiceRequest {
            notification_number: 42,
            reference_number: None,
            creation_timestamp: ts(9, 26),
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
            location: Some(GeoPoint::new(-33.8930, 18.6050).unwrap()),
        }
    }

    fn sample_enriched() -> EnrichedRequest {
        let request = sample_request();
        let location = request.location.unwrap();
        let cell = assign_cell(location, Resolution::Eight).unwrap();
        EnrichedRequest::new(request, location, cell, 420.0, 30)
    }

    fn read_back(path: &Path) -> Vec<csv::StringRecord> {
        csv::Reader::from_path(path)
            .unwrap()
            .records()
            .map(Result::unwrap)
            .collect()
    }

    fn headers_of(path: &Path) -> Vec<String> {
        csv::Reader::from_path(path)
            .unwrap()
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn indexed_output_has_hex_column_and_no_tmp_leftover() {
        let dir = std::env::temp_dir().join("service_map_generate_indexed_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("indexed.csv");

        let requests = vec![sample_request()];
        let cells = vec![Some(
            assign_cell(requests[0].location.unwrap(), Resolution::Eight).unwrap(),
        )];
        let rows = write_indexed(&path, &requests, &cells).unwrap();

        assert_eq!(rows, 1);
        assert!(!tmp_path(&path).exists());
        let headers = headers_of(&path);
        assert_eq!(headers.last().map(String::as_str), Some("hex_index"));
        let records = read_back(&path);
        assert_eq!(records[0].get(15).unwrap().len(), 15);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn enriched_output_matches_column_catalog() {
        let dir = std::env::temp_dir().join("service_map_generate_enriched_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("enriched.csv");

        write_enriched(&path, &[sample_enriched()]).unwrap();
        assert_eq!(headers_of(&path), EnrichedRequest::COLUMNS);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn anonymized_output_contains_no_prohibited_column() {
        let dir = std::env::temp_dir().join("service_map_generate_anon_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("anonymized.csv");

        let released = anonymize(&sample_enriched(), &AnonymizePolicy::default()).unwrap();
        write_anonymized(&path, &[released]).unwrap();

        let headers = headers_of(&path);
        for prohibited in service_map_anonymize::DEFAULT_REMOVED_COLUMNS {
            assert!(
                !headers.iter().any(|h| h == prohibited),
                "anonymized output still carries `{prohibited}`"
            );
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn wind_grid_round_trips_through_the_input_shape() {
        let dir = std::env::temp_dir().join("service_map_generate_wind_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wind_grid.csv");

        let readings = vec![
            WindObservation {
                timestamp: ts(0, 0),
                vector: Some(WindVector::new(4.0, 350.0).unwrap()),
            },
            WindObservation {
                timestamp: ts(1, 0),
                vector: Some(WindVector::new(4.0, 10.0).unwrap()),
            },
        ];
        let (grid, _) = resample(&readings, &ResampleConfig::default()).unwrap();
        let rows = write_wind_grid(&path, &grid).unwrap();

        assert_eq!(rows, 3);
        let records = read_back(&path);
        assert_eq!(records[1].get(0).unwrap(), "2020-06-01 00:30:00");

        std::fs::remove_dir_all(&dir).ok();
    }
}
