#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hierarchical hexagonal spatial indexing over H3.
//!
//! Wraps `h3o` cell assignment behind validated [`GeoPoint`] inputs, and
//! provides the index-set validation and quality diagnostics used to check
//! derived indices against the authoritative reference catalog.

pub mod resolution;

use std::collections::BTreeSet;
use std::str::FromStr;

use h3o::{CellIndex, LatLng, Resolution};
use service_map_geodesy::{GeoPoint, Geodesy};
use thiserror::Error;

/// Errors that can occur during hexagonal indexing.
#[derive(Debug, Error)]
pub enum HexGridError {
    /// Coordinates were rejected by the H3 library.
    #[error("invalid coordinate for hex indexing: {0}")]
    InvalidCoordinate(#[from] h3o::error::InvalidLatLng),

    /// Two index sets were built at different resolutions; comparison never
    /// coerces, it fails.
    #[error("index sets built at different resolutions: expected {expected}, found {found}")]
    ResolutionMismatch {
        /// Resolution the comparison expected.
        expected: Resolution,
        /// Resolution actually found.
        found: Resolution,
    },
}

/// Assigns the H3 cell containing `point` at the given resolution.
///
/// Deterministic: a pure function of `(point, resolution)`.
///
/// # Errors
///
/// Returns [`HexGridError::InvalidCoordinate`] if H3 rejects the
/// coordinates (unreachable through a validated [`GeoPoint`], but mapped
/// rather than asserted).
pub fn assign_cell(point: GeoPoint, resolution: Resolution) -> Result<CellIndex, HexGridError> {
    let coord = LatLng::new(point.latitude(), point.longitude())?;
    Ok(coord.to_cell(resolution))
}

/// Batch cell assignment preserving input order.
///
/// A missing location yields `None` at the same position.
///
/// # Errors
///
/// Returns [`HexGridError::InvalidCoordinate`] if any present location is
/// rejected by H3.
pub fn assign_cells(
    locations: &[Option<GeoPoint>],
    resolution: Resolution,
) -> Result<Vec<Option<CellIndex>>, HexGridError> {
    locations
        .iter()
        .map(|loc| loc.map(|p| assign_cell(p, resolution)).transpose())
        .collect()
}

/// Result of comparing a derived index set against a reference set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Cells present in the reference but absent from the derived set.
    pub missing: BTreeSet<CellIndex>,
    /// Cells present in the derived set but absent from the reference.
    pub extra: BTreeSet<CellIndex>,
    /// Number of cells present in both sets.
    pub matched: usize,
}

impl ValidationReport {
    /// `true` when the derived set exactly matches the reference.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compares a derived index set against an authoritative reference set.
///
/// # Errors
///
/// Returns [`HexGridError::ResolutionMismatch`] if either set mixes
/// resolutions internally or the two sets were built at different
/// resolutions. Empty sets impose no resolution constraint.
pub fn validate_index_set(
    derived: &BTreeSet<CellIndex>,
    reference: &BTreeSet<CellIndex>,
) -> Result<ValidationReport, HexGridError> {
    let derived_res = uniform_resolution(derived)?;
    let reference_res = uniform_resolution(reference)?;

    if let (Some(expected), Some(found)) = (reference_res, derived_res)
        && expected != found
    {
        return Err(HexGridError::ResolutionMismatch { expected, found });
    }

    let matched = derived.intersection(reference).count();
    let missing = reference.difference(derived).copied().collect();
    let extra = derived.difference(reference).copied().collect();

    Ok(ValidationReport {
        missing,
        extra,
        matched,
    })
}

/// Returns the single resolution shared by every cell in the set, or
/// `None` for an empty set.
fn uniform_resolution(cells: &BTreeSet<CellIndex>) -> Result<Option<Resolution>, HexGridError> {
    let mut iter = cells.iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let expected = first.resolution();
    for cell in iter {
        let found = cell.resolution();
        if found != expected {
            return Err(HexGridError::ResolutionMismatch { expected, found });
        }
    }
    Ok(Some(expected))
}

/// Plausibility constraint for [`QualityCheck`]: every decoded cell
/// centroid must lie within `max_distance_m` of `center`.
#[derive(Debug, Clone, Copy)]
pub struct PlausibilityCheck {
    /// Reference point cell centroids are measured against.
    pub center: GeoPoint,
    /// Maximum plausible geodesic distance in meters.
    pub max_distance_m: f64,
}

/// Configuration for the read-only index quality diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct QualityCheck {
    /// Resolution every index is expected to decode to.
    pub expected_resolution: Resolution,
    /// Optional centroid plausibility constraint.
    pub plausibility: Option<PlausibilityCheck>,
}

/// Diagnostic counters produced by [`QualityCheck::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityReport {
    /// Rows with no index at all.
    pub null_count: u64,
    /// Indices seen more than once.
    pub duplicate_count: u64,
    /// Values that failed to parse as an H3 index.
    pub invalid_geometry_count: u64,
    /// `true` when every parsed index decodes to the expected resolution.
    pub resolution_consistency: bool,
    /// `true` when every parsed cell centroid passed the plausibility
    /// constraint (vacuously `true` when no constraint is configured).
    pub centroid_plausibility: bool,
}

impl QualityCheck {
    /// Runs the diagnostic over raw index strings.
    ///
    /// Read-only: input is only inspected, never mutated or filtered.
    pub fn run<'a, I>(&self, geodesy: &Geodesy, cells: I) -> QualityReport
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut report = QualityReport {
            resolution_consistency: true,
            centroid_plausibility: true,
            ..QualityReport::default()
        };
        let mut seen: BTreeSet<CellIndex> = BTreeSet::new();

        for raw in cells {
            let Some(raw) = raw else {
                report.null_count += 1;
                continue;
            };
            let Ok(cell) = CellIndex::from_str(raw.trim()) else {
                report.invalid_geometry_count += 1;
                continue;
            };

            if cell.resolution() != self.expected_resolution {
                report.resolution_consistency = false;
            }
            if !seen.insert(cell) {
                report.duplicate_count += 1;
            }

            if let Some(check) = self.plausibility {
                let centroid = LatLng::from(cell);
                match GeoPoint::new(centroid.lat(), centroid.lng()) {
                    Ok(p) => {
                        if geodesy.haversine_distance(p, check.center) > check.max_distance_m {
                            report.centroid_plausibility = false;
                        }
                    }
                    Err(_) => report.centroid_plausibility = false,
                }
            }
        }

        report
    }
}
