//! Reference geometry readers: the hexagon catalog and the site boundary.

use std::collections::BTreeSet;
use std::io::Read;
use std::str::FromStr;

use geo::{MultiPolygon, Polygon};
use geojson::GeoJson;
use h3o::CellIndex;

use crate::IngestError;

/// Feature property carrying the H3 index in the reference catalog.
const INDEX_PROPERTY: &str = "index";

/// Reads the authoritative hexagon catalog.
///
/// Expects a `FeatureCollection` where every feature carries an `index`
/// property holding the H3 string form. The catalog is reference data: any
/// malformed feature aborts the read rather than being skipped.
///
/// # Errors
///
/// Returns [`IngestError::Catalog`] for a feature without a parseable
/// index, or [`IngestError::GeoJson`]/[`IngestError::Io`] on parse
/// failure.
pub fn read_hex_catalog<R: Read>(mut reader: R) -> Result<BTreeSet<CellIndex>, IngestError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    let geojson: GeoJson = raw.parse()?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(IngestError::Catalog {
            message: "expected a FeatureCollection".to_string(),
        });
    };

    let mut cells = BTreeSet::new();
    for (number, feature) in collection.features.iter().enumerate() {
        let index = feature
            .property(INDEX_PROPERTY)
            .and_then(|v| v.as_str())
            .ok_or_else(|| IngestError::Catalog {
                message: format!("feature {number} has no `{INDEX_PROPERTY}` property"),
            })?;
        let cell = CellIndex::from_str(index).map_err(|e| IngestError::Catalog {
            message: format!("feature {number} has invalid index {index:?}: {e}"),
        })?;
        cells.insert(cell);
    }

    log::info!("Read {} reference hex cells", cells.len());
    Ok(cells)
}

/// Reads the site boundary polygon used to derive the reference centroid.
///
/// Accepts a bare geometry, a single feature, or a feature collection (the
/// first polygonal feature wins). A `MultiPolygon` boundary contributes
/// its largest-ring first polygon.
///
/// # Errors
///
/// Returns [`IngestError::Boundary`] if no polygonal geometry is present,
/// or [`IngestError::GeoJson`]/[`IngestError::Io`] on parse failure.
pub fn read_boundary_polygon<R: Read>(mut reader: R) -> Result<Polygon<f64>, IngestError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    let geojson: GeoJson = raw.parse()?;

    let geometries: Vec<geojson::Geometry> = match geojson {
        GeoJson::Geometry(g) => vec![g],
        GeoJson::Feature(f) => f.geometry.into_iter().collect(),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .filter_map(|f| f.geometry)
            .collect(),
    };

    for geometry in geometries {
        let Ok(geo_geometry) = geo::Geometry::<f64>::try_from(geometry) else {
            continue;
        };
        match geo_geometry {
            geo::Geometry::Polygon(polygon) => return Ok(polygon),
            geo::Geometry::MultiPolygon(MultiPolygon(polygons)) => {
                if let Some(polygon) = polygons.into_iter().next() {
                    return Ok(polygon);
                }
            }
            _ => {}
        }
    }

    Err(IngestError::Boundary {
        message: "no polygonal geometry found".to_string(),
    })
}
