//! H3 resolution policy table.
//!
//! The anonymization stage generalizes locations by collapsing them to a
//! hex cell, so the privacy radius it can claim is bounded by how far a
//! cell centroid can sit from any point inside the cell. This module
//! documents the edge-length table those claims are derived from.
//!
//! The bound is advisory: H3 cells are irregular hexagons (and twelve
//! pentagons per resolution), so the worst-case centroid-to-vertex
//! distance is estimated from the average edge length with a distortion
//! allowance, not guaranteed cell by cell.

use h3o::Resolution;

/// Average hexagon edge length in meters for H3 resolutions 0-15, from
/// the published H3 cell statistics.
pub const AVG_EDGE_LENGTH_M: [f64; 16] = [
    1_107_712.591,
    418_676.0055,
    158_244.6558,
    59_810.857_94,
    22_606.379_4,
    8_544.408_276,
    3_229.482_772,
    1_220.629_759,
    461.354_684,
    174.375_668,
    65.907_807,
    24.910_561,
    9.415_526,
    3.559_893,
    1.348_575,
    0.509_713,
];

/// Distortion allowance over the average edge for the worst-case
/// centroid-to-vertex distance. For a regular hexagon that distance equals
/// the edge length; real H3 cells stretch up to roughly 15% beyond it.
const MAX_VERTEX_FACTOR: f64 = 1.155;

/// Average hexagon edge length in meters at the given resolution.
#[must_use]
pub fn avg_edge_length_m(resolution: Resolution) -> f64 {
    AVG_EDGE_LENGTH_M[usize::from(u8::from(resolution))]
}

/// Estimated worst-case centroid-to-vertex distance in meters at the
/// given resolution.
///
/// At resolution 8 this is ~533 m (461 m average edge), which is why the
/// default ≤500 m anonymization radius is documented as borderline rather
/// than met.
#[must_use]
pub fn max_vertex_distance_m(resolution: Resolution) -> f64 {
    avg_edge_length_m(resolution) * MAX_VERTEX_FACTOR
}

/// Coarsest resolution whose estimated worst-case centroid-to-vertex
/// distance fits within `max_displacement_m`.
///
/// Returns `None` if even resolution 15 cells are too large for the
/// requested bound.
#[must_use]
pub fn resolution_for_privacy_radius(max_displacement_m: f64) -> Option<Resolution> {
    (0u8..=15)
        .filter_map(|r| Resolution::try_from(r).ok())
        .find(|&r| max_vertex_distance_m(r) <= max_displacement_m)
}
