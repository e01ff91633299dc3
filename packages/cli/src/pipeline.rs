//! Pipeline orchestration.
//!
//! A thin driver over the pure stage functions: ingest, index, subsample,
//! resample, join, anonymize, write. Everything interesting lives in the
//! stage crates; this module only sequences them, reports progress at
//! batch boundaries, and logs every exclusion counter.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use service_map_anonymize::anonymize_batch;
use service_map_cli_utils::{IndicatifProgress, MultiProgress};
use service_map_enrich::{EnrichedRequest, SubsampleOrder, attach_wind, filter_by_radius};
use service_map_geodesy::{GeoPoint, polygon_centroid};
use service_map_hexgrid::{
    PlausibilityCheck, QualityCheck, QualityReport, assign_cells, validate_index_set,
};
use service_map_ingest::{
    read_boundary_polygon, read_hex_catalog, read_service_requests, read_wind_observations,
};
use service_map_wind::resample;

use crate::config::PipelineConfig;

/// Rows processed per progress-bar increment.
const BATCH_SIZE: usize = 10_000;

/// Arguments for the full pipeline run.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Service-request CSV.
    #[arg(long)]
    pub requests: PathBuf,

    /// Hourly wind CSV for the site.
    #[arg(long)]
    pub wind: PathBuf,

    /// Site boundary GeoJSON; its centroid is the subsample center.
    #[arg(long)]
    pub boundary: PathBuf,

    /// Reference hexagon catalog GeoJSON; when given, the derived index
    /// set is validated against it.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output directory.
    #[arg(long, default_value = "data/output")]
    pub out_dir: PathBuf,

    /// Maximum number of request rows to process (useful for testing).
    #[arg(long)]
    pub limit: Option<u64>,
}

/// Arguments for catalog validation.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Service-request CSV to derive an index set from.
    #[arg(long)]
    pub requests: PathBuf,

    /// Reference hexagon catalog GeoJSON.
    #[arg(long)]
    pub catalog: PathBuf,
}

/// Runs the full enrichment and anonymization pipeline.
///
/// # Errors
///
/// Returns an error on any structural failure: unreadable inputs, schema
/// violations, degenerate reference geometry, or resolution mismatches.
/// Row-level problems are counted and logged instead.
#[allow(clippy::cast_possible_truncation)]
pub fn run(
    multi: &MultiProgress,
    config: &PipelineConfig,
    args: &RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    std::fs::create_dir_all(&args.out_dir)?;

    let resolution = config.resolution()?;
    let geodesy = config.geodesy();

    // Ingest
    let (mut requests, request_stats) =
        read_service_requests(BufReader::new(File::open(&args.requests)?))?;
    log::info!(
        "Ingested {} requests ({} skipped, {} without coordinates)",
        requests.len(),
        request_stats.skipped(),
        request_stats.missing_location
    );
    if let Some(limit) = args.limit {
        requests.truncate(usize::try_from(limit)?);
        log::info!("Limiting run to {} requests", requests.len());
    }

    let boundary = read_boundary_polygon(BufReader::new(File::open(&args.boundary)?))?;
    let center = polygon_centroid(&boundary)?;
    log::info!(
        "Site centroid: ({:.4}, {:.4})",
        center.latitude(),
        center.longitude()
    );

    // Index
    let progress = IndicatifProgress::stage_bar(multi, "Assigning hex cells...");
    progress.set_total(requests.len() as u64);
    let locations: Vec<Option<GeoPoint>> = requests.iter().map(|r| r.location).collect();
    let mut cells = Vec::with_capacity(locations.len());
    for chunk in locations.chunks(BATCH_SIZE) {
        cells.extend(assign_cells(chunk, resolution)?);
        progress.inc(chunk.len() as u64);
    }
    progress.finish(format!("Indexed {} requests", cells.len()));

    let quality = run_quality_check(&geodesy, config, resolution, center, &cells);
    log::info!(
        "Index quality: {} null, {} duplicate, {} invalid, resolution consistent: {}, centroids plausible: {}",
        quality.null_count,
        quality.duplicate_count,
        quality.invalid_geometry_count,
        quality.resolution_consistency,
        quality.centroid_plausibility
    );

    if let Some(catalog_path) = &args.catalog {
        validate_against_catalog(catalog_path, &cells)?;
    }

    service_map_generate::write_indexed(&args.out_dir.join("indexed.csv"), &requests, &cells)?;

    // Subsample
    let radius_meters = config.radius_meters();
    let subsample = filter_by_radius(
        &geodesy,
        &locations,
        center,
        radius_meters,
        SubsampleOrder::InputOrder,
    );
    log::info!(
        "Radius filter ({radius_meters} m): kept {} rows, excluded {} without coordinates",
        subsample.kept.len(),
        subsample.missing_location
    );

    let mut enriched: Vec<EnrichedRequest> = Vec::with_capacity(subsample.kept.len());
    for &(index, distance) in &subsample.kept {
        // Kept rows always carry a location and therefore a cell.
        let (Some(location), Some(cell)) = (locations[index], cells[index]) else {
            continue;
        };
        enriched.push(EnrichedRequest::new(
            requests[index].clone(),
            location,
            cell,
            distance,
            config.grid_step_minutes,
        ));
    }
    service_map_generate::write_subsampled(&args.out_dir.join("subsampled.csv"), &enriched)?;

    // Wind grid
    let (wind_readings, wind_stats) =
        read_wind_observations(BufReader::new(File::open(&args.wind)?))?;
    log::info!(
        "Ingested {} wind rows ({} gaps)",
        wind_readings.len(),
        wind_stats.missing_value + wind_stats.out_of_range
    );
    let (grid, resample_stats) = resample(&wind_readings, &config.resample())?;
    log::info!(
        "Wind grid: {} samples at {} min step ({} hours inserted, {} filled forward, {} filled backward, {} left null)",
        grid.len(),
        grid.step().num_minutes(),
        resample_stats.inserted_missing,
        resample_stats.filled_forward,
        resample_stats.filled_backward,
        resample_stats.left_unfilled
    );
    service_map_generate::write_wind_grid(&args.out_dir.join("wind_grid.csv"), &grid)?;

    // Join
    let join_stats = attach_wind(&mut enriched, &grid);
    log::info!(
        "Wind join: {} matched, {} unmatched, {} without wind data",
        join_stats.matched,
        join_stats.unmatched,
        join_stats.no_data
    );
    service_map_generate::write_enriched(&args.out_dir.join("enriched.csv"), &enriched)?;

    // Anonymize
    let released = anonymize_batch(&enriched, &config.policy()?)?;
    service_map_generate::write_anonymized(&args.out_dir.join("anonymized.csv"), &released)?;

    log::info!(
        "Pipeline complete in {:.1}s ({} released rows)",
        start.elapsed().as_secs_f64(),
        released.len()
    );
    Ok(())
}

/// Validates a derived index set against the reference catalog without
/// running the rest of the pipeline.
///
/// # Errors
///
/// Returns an error on unreadable inputs, schema violations, or a
/// resolution mismatch between the derived set and the catalog.
pub fn validate(
    config: &PipelineConfig,
    args: &ValidateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolution = config.resolution()?;

    let (requests, _) = read_service_requests(BufReader::new(File::open(&args.requests)?))?;
    let locations: Vec<Option<GeoPoint>> = requests.iter().map(|r| r.location).collect();
    let cells = assign_cells(&locations, resolution)?;

    let check = QualityCheck {
        expected_resolution: resolution,
        plausibility: None,
    };
    let index_strings: Vec<Option<String>> =
        cells.iter().map(|c| c.map(|c| c.to_string())).collect();
    let quality = check.run(
        &config.geodesy(),
        index_strings.iter().map(Option::as_deref),
    );
    log::info!(
        "Index quality: {} null, {} duplicate, {} invalid",
        quality.null_count,
        quality.duplicate_count,
        quality.invalid_geometry_count
    );

    validate_against_catalog(&args.catalog, &cells)
}

fn validate_against_catalog(
    catalog_path: &Path,
    cells: &[Option<h3o::CellIndex>],
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = read_hex_catalog(BufReader::new(File::open(catalog_path)?))?;
    let derived = cells.iter().flatten().copied().collect();
    let report = validate_index_set(&derived, &reference)?;

    if report.is_exact() {
        log::info!("Catalog validation: exact match ({} cells)", report.matched);
    } else {
        log::warn!(
            "Catalog validation: {} matched, {} missing from derived set, {} not in catalog",
            report.matched,
            report.missing.len(),
            report.extra.len()
        );
    }
    Ok(())
}

fn run_quality_check(
    geodesy: &service_map_geodesy::Geodesy,
    config: &PipelineConfig,
    resolution: h3o::Resolution,
    center: GeoPoint,
    cells: &[Option<h3o::CellIndex>],
) -> QualityReport {
    let check = QualityCheck {
        expected_resolution: resolution,
        plausibility: Some(PlausibilityCheck {
            center,
            max_distance_m: config.plausibility_max_m,
        }),
    };
    let index_strings: Vec<Option<String>> =
        cells.iter().map(|c| c.map(|c| c.to_string())).collect();
    check.run(geodesy, index_strings.iter().map(Option::as_deref))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUESTS_CSV: &str = "\
notification_number,reference_number,creation_timestamp,completion_timestamp,directorate,department,branch,section,code_group,code,cause_code_group,cause_code,official_suburb,latitude,longitude
1001,REF-1,2020-06-01 09:26:53,2020-06-02 10:00:00,WATER AND SANITATION,Water Pollution,WPC Ops,District: Bellville,SEWER,Sewer: Blocked/Overflow,,,BELLVILLE SOUTH,-33.8930,18.6050
1002,REF-2,2020-06-01 09:40:00,,URBAN MOBILITY,Roads,North,Area 1,ROADS,Pothole,,,CAPE TOWN CBD,-33.9249,18.4241
1003,REF-3,2020-06-01 10:05:00,,ENERGY,Electricity,Maint,North,STREETLIGHTS,Street Light Out,,,BELLVILLE SOUTH,,
";

    const WIND_CSV: &str = "\
DateTime,wind direction degree,wind speed m/s
2020-06-01 09:00:00,350,4.0
2020-06-01 10:00:00,10,4.0
";

    /// Rectangle whose centroid is exactly (-33.8930, 18.6050).
    const BOUNDARY_GEOJSON: &str = r#"{
        "type": "Feature",
        "properties": {"name": "Bellville South AQM site"},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [18.600, -33.898], [18.610, -33.898],
                [18.610, -33.888], [18.600, -33.888],
                [18.600, -33.898]
            ]]
        }
    }"#;

    #[test]
    fn full_pipeline_produces_all_outputs() {
        let dir = std::env::temp_dir().join("service_map_cli_pipeline_test");
        std::fs::create_dir_all(&dir).unwrap();
        let out_dir = dir.join("out");

        let requests_path = dir.join("sr.csv");
        let wind_path = dir.join("wind.csv");
        let boundary_path = dir.join("boundary.geojson");
        std::fs::write(&requests_path, REQUESTS_CSV).unwrap();
        std::fs::write(&wind_path, WIND_CSV).unwrap();
        std::fs::write(&boundary_path, BOUNDARY_GEOJSON).unwrap();

        let args = RunArgs {
            requests: requests_path,
            wind: wind_path,
            boundary: boundary_path,
            catalog: None,
            out_dir: out_dir.clone(),
            limit: None,
        };
        run(
            &MultiProgress::new(),
            &PipelineConfig::default(),
            &args,
        )
        .unwrap();

        for output in [
            "indexed.csv",
            "subsampled.csv",
            "wind_grid.csv",
            "enriched.csv",
            "anonymized.csv",
        ] {
            assert!(out_dir.join(output).exists(), "{output} was not written");
        }

        // The CBD request (~17 km away) and the row without coordinates
        // fall out; only the on-site request survives enrichment.
        let enriched = std::fs::read_to_string(out_dir.join("enriched.csv")).unwrap();
        assert_eq!(enriched.lines().count(), 2);
        assert!(enriched.contains("1001"));
        assert!(!enriched.contains("1002"));

        // The released extract holds the 06:00 bucket and no raw
        // coordinates or identifiers.
        let anonymized = std::fs::read_to_string(out_dir.join("anonymized.csv")).unwrap();
        let header = anonymized.lines().next().unwrap();
        for prohibited in ["latitude", "longitude", "notification_number", "reference_number"] {
            assert!(!header.contains(prohibited), "released header has {prohibited}");
        }
        assert!(anonymized.contains("2020-06-01 06:00:00"));

        // The wind grid has the 09:30 midpoint resolving the wraparound.
        let grid = std::fs::read_to_string(out_dir.join("wind_grid.csv")).unwrap();
        assert_eq!(grid.lines().count(), 4);
        let midpoint = grid
            .lines()
            .find(|l| l.starts_with("2020-06-01 09:30:00"))
            .unwrap();
        let direction: f64 = midpoint.split(',').nth(1).unwrap().parse().unwrap();
        assert!(direction < 1e-6 || direction > 360.0 - 1e-6);

        std::fs::remove_dir_all(&dir).ok();
    }
}
