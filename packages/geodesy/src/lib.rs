#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle math and geographic reference conventions.
//!
//! Provides the [`Geodesy`] calculator (haversine distances over a
//! configurable sphere), area-weighted polygon centroids, and the
//! nautical-mile conversion used whenever a radius is configured in
//! arc-minutes of latitude.

use geo::{Area, Centroid, Polygon, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters (IUGG arithmetic mean radius R1).
///
/// All great-circle distances are computed on a sphere of this radius
/// unless overridden via [`GeodesyConfig`].
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per arc-minute of latitude: exactly one international nautical
/// mile. Any "radius in minutes" setting converts through this constant,
/// never through an approximation.
pub const METERS_PER_ARC_MINUTE: f64 = 1852.0;

/// Errors that can occur during geodesic computations.
#[derive(Debug, Error)]
pub enum GeodesyError {
    /// Latitude/longitude out of range or non-finite.
    #[error("invalid coordinate: lat={latitude}, lon={longitude}")]
    InvalidCoordinate {
        /// The offending latitude.
        latitude: f64,
        /// The offending longitude.
        longitude: f64,
    },

    /// Polygon is zero-area, self-intersecting, or otherwise degenerate.
    #[error("degenerate geometry: {message}")]
    DegenerateGeometry {
        /// Description of what makes the geometry degenerate.
        message: String,
    },
}

/// A validated geographic point in decimal degrees.
///
/// Construction enforces latitude in [-90, 90], longitude in [-180, 180],
/// and finiteness, so downstream code never re-checks ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a validated point.
    ///
    /// # Errors
    ///
    /// Returns [`GeodesyError::InvalidCoordinate`] if either component is
    /// non-finite or outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeodesyError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(GeodesyError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }
}

/// Configuration for [`Geodesy`].
///
/// An explicit config object rather than a module-level constant so tests
/// can substitute a different sphere deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeodesyConfig {
    /// Sphere radius in meters used for all distance computations.
    pub earth_radius_m: f64,
}

impl Default for GeodesyConfig {
    fn default() -> Self {
        Self {
            earth_radius_m: MEAN_EARTH_RADIUS_M,
        }
    }
}

/// Great-circle distance calculator over a fixed sphere.
#[derive(Debug, Clone, Copy)]
pub struct Geodesy {
    radius_m: f64,
}

impl Geodesy {
    /// Creates a calculator from an explicit config.
    #[must_use]
    pub const fn new(config: GeodesyConfig) -> Self {
        Self {
            radius_m: config.earth_radius_m,
        }
    }

    /// Haversine great-circle distance between two points, in meters.
    ///
    /// Uses the `atan2` form, which stays numerically stable for both
    /// near-zero and near-antipodal separations.
    #[must_use]
    pub fn haversine_distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let lat_a = a.latitude().to_radians();
        let lat_b = b.latitude().to_radians();
        let d_lat = (b.latitude() - a.latitude()).to_radians();
        let d_lon = (b.longitude() - a.longitude()).to_radians();

        let h = (d_lat / 2.0).sin().powi(2)
            + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

        self.radius_m * c
    }

    /// Distances from every location in a batch to a common center.
    ///
    /// Whole-batch evaluation in input order; a missing location yields
    /// `None` at the same position so callers can count exclusions.
    #[must_use]
    pub fn distances_to(&self, locations: &[Option<GeoPoint>], center: GeoPoint) -> Vec<Option<f64>> {
        locations
            .iter()
            .map(|loc| loc.map(|p| self.haversine_distance(p, center)))
            .collect()
    }
}

impl Default for Geodesy {
    fn default() -> Self {
        Self::new(GeodesyConfig::default())
    }
}

/// Converts a radius expressed in arc-minutes of latitude to meters.
#[must_use]
pub fn arc_minutes_to_meters(minutes: f64) -> f64 {
    minutes * METERS_PER_ARC_MINUTE
}

/// Area-weighted centroid of a simple polygon in geographic coordinates.
///
/// The polygon is interpreted with `x` = longitude and `y` = latitude.
///
/// # Errors
///
/// Returns [`GeodesyError::DegenerateGeometry`] if the polygon has zero
/// area, is self-intersecting, or its centroid falls outside valid
/// coordinate ranges.
pub fn polygon_centroid(polygon: &Polygon<f64>) -> Result<GeoPoint, GeodesyError> {
    if polygon.unsigned_area() == 0.0 {
        return Err(GeodesyError::DegenerateGeometry {
            message: "polygon has zero area".to_string(),
        });
    }
    if !polygon.is_valid() {
        return Err(GeodesyError::DegenerateGeometry {
            message: "polygon is self-intersecting or otherwise invalid".to_string(),
        });
    }

    let centroid = polygon
        .centroid()
        .ok_or_else(|| GeodesyError::DegenerateGeometry {
            message: "polygon has no centroid".to_string(),
        })?;

    GeoPoint::new(centroid.y(), centroid.x())
}
