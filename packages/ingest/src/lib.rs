#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion of the pipeline's source files.
//!
//! Raw tabular data crosses into typed records exactly here. Each reader
//! validates the expected schema once up front (a missing column aborts
//! the batch), then recovers row-level problems locally: a bad row is
//! counted in the reader's stats and skipped or nulled, never silently
//! dropped.

pub mod catalog;
pub mod requests;
pub mod weather;

use thiserror::Error;

pub use catalog::{read_boundary_polygon, read_hex_catalog};
pub use requests::{RequestIngestStats, read_service_requests};
pub use weather::{WindIngestStats, read_wind_observations};

/// Errors that can occur during ingestion. All are structural: they
/// indicate a configuration or upstream-contract violation, not a data
/// anomaly, and abort the whole batch.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File read failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV could not be read at all.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("missing required column `{column}`")]
    Schema {
        /// The absent column.
        column: String,
    },

    /// GeoJSON could not be parsed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The reference hexagon catalog is malformed.
    #[error("hex catalog error: {message}")]
    Catalog {
        /// What was wrong with the catalog.
        message: String,
    },

    /// The site boundary file did not contain a usable polygon.
    #[error("boundary error: {message}")]
    Boundary {
        /// What was wrong with the boundary.
        message: String,
    },
}

/// Resolves required header names to column positions, failing on the
/// first absent column.
pub(crate) fn header_positions(
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<Vec<usize>, IngestError> {
    required
        .iter()
        .map(|&name| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| IngestError::Schema {
                    column: name.to_string(),
                })
        })
        .collect()
}
