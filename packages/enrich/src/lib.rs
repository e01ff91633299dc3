#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial subsampling and temporal enrichment of service requests.
//!
//! The subsampler restricts an indexed dataset to a geodesic radius around
//! the site centroid; the joiner rounds each surviving request onto the
//! wind grid and attaches the matching observation. Both are pure
//! whole-batch functions with explicit exclusion counters.

pub mod join;
pub mod subsample;

use chrono::NaiveDateTime;
use h3o::CellIndex;
use service_map_geodesy::GeoPoint;
use service_map_request_models::ServiceRequest;
use service_map_wind::WindVector;

pub use join::{JoinStats, attach_wind, round_to_grid};
pub use subsample::{RadiusSubsample, SubsampleOrder, filter_by_radius};

/// A service request that survived the radius filter, carrying its derived
/// fields through to anonymization.
///
/// `location` is non-optional here: only requests with usable coordinates
/// can pass the distance filter, and the type records that guarantee.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRequest {
    /// The source request, unmodified.
    pub request: ServiceRequest,
    /// Reported location (also present on `request`; duplicated here so
    /// enrichment stages never re-unwrap an `Option`).
    pub location: GeoPoint,
    /// Hex cell assigned at the pipeline's indexing resolution.
    pub hex_index: CellIndex,
    /// Great-circle distance to the site centroid, in meters.
    pub distance_meters: f64,
    /// Creation timestamp rounded onto the wind grid.
    pub creation_rounded: NaiveDateTime,
    /// Wind observation joined at `creation_rounded`, when available.
    pub wind: Option<WindVector>,
    /// `true` when `creation_rounded` fell outside the wind grid's
    /// covered range.
    pub unmatched: bool,
}

impl EnrichedRequest {
    /// Column catalog of the enriched dataset as exported. The
    /// anonymization policy is verified against this list so a drop rule
    /// naming a column that no longer exists fails loudly.
    pub const COLUMNS: &[&str] = &[
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
        "hex_index",
        "distance_meters",
        "creation_rounded",
        "wind_direction_deg",
        "wind_speed_ms",
        "unmatched",
    ];

    /// Builds an enriched request with the creation timestamp rounded
    /// onto the grid; wind is attached later by [`attach_wind`].
    #[must_use]
    pub fn new(
        request: ServiceRequest,
        location: GeoPoint,
        hex_index: CellIndex,
        distance_meters: f64,
        grid_step_minutes: u32,
    ) -> Self {
        let creation_rounded = round_to_grid(request.creation_timestamp, grid_step_minutes);
        Self {
            request,
            location,
            hex_index,
            distance_meters,
            creation_rounded,
            wind: None,
            unmatched: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_catalog_has_no_duplicates() {
        let mut seen = std::collections::BTreeSet::new();
        for column in EnrichedRequest::COLUMNS {
            assert!(seen.insert(column), "duplicate column {column}");
        }
    }
}
