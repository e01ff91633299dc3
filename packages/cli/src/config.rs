//! Pipeline configuration.
//!
//! One immutable config object, loaded once and handed to each stage; no
//! stage reads a constant from anywhere else. The defaults are embedded at
//! compile time and can be overridden with `--config <file.toml>`.

use std::path::Path;

use h3o::Resolution;
use serde::Deserialize;
use service_map_anonymize::{AnonymizePolicy, DEFAULT_REMOVED_COLUMNS};
use service_map_geodesy::{
    Geodesy, GeodesyConfig, MEAN_EARTH_RADIUS_M, arc_minutes_to_meters,
};
use service_map_wind::ResampleConfig;

/// Default configuration embedded at compile time.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Immutable pipeline configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct PipelineConfig {
    /// H3 resolution for indexing and anonymization.
    pub resolution: u8,
    /// Subsample radius in arc-minutes of latitude.
    pub radius_arc_minutes: f64,
    /// Output wind grid step in minutes.
    pub grid_step_minutes: u32,
    /// Source wind series step in minutes.
    pub source_step_minutes: u32,
    /// Longest gap (in source steps) carry-fill may bridge.
    pub max_fill_span_steps: Option<usize>,
    /// Creation-time generalization bucket in hours.
    pub bucket_hours: u32,
    /// Sphere radius in meters for distance computations.
    pub earth_radius_m: f64,
    /// Plausibility distance for the index quality report, in meters.
    pub plausibility_max_m: f64,
    /// Enriched-schema columns removed by anonymization.
    pub removed_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolution: 8,
            radius_arc_minutes: 1.0,
            grid_step_minutes: 30,
            source_step_minutes: 60,
            max_fill_span_steps: None,
            bucket_hours: 6,
            earth_radius_m: MEAN_EARTH_RADIUS_M,
            plausibility_max_m: 50_000.0,
            removed_columns: DEFAULT_REMOVED_COLUMNS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// The configured H3 resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is outside 0-15.
    pub fn resolution(&self) -> Result<Resolution, h3o::error::InvalidResolution> {
        Resolution::try_from(self.resolution)
    }

    /// A distance calculator on the configured sphere.
    #[must_use]
    pub const fn geodesy(&self) -> Geodesy {
        Geodesy::new(GeodesyConfig {
            earth_radius_m: self.earth_radius_m,
        })
    }

    /// Resampler settings.
    #[must_use]
    pub const fn resample(&self) -> ResampleConfig {
        ResampleConfig {
            source_step_minutes: self.source_step_minutes,
            max_fill_span_steps: self.max_fill_span_steps,
        }
    }

    /// The anonymization policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured resolution is outside 0-15.
    pub fn policy(&self) -> Result<AnonymizePolicy, h3o::error::InvalidResolution> {
        Ok(AnonymizePolicy {
            resolution: self.resolution()?,
            bucket_hours: self.bucket_hours,
            removed_columns: self.removed_columns.iter().cloned().collect(),
        })
    }

    /// Subsample radius in meters, via the fixed nautical-mile constant.
    #[must_use]
    pub fn radius_meters(&self) -> f64 {
        arc_minutes_to_meters(self.radius_arc_minutes)
    }
}

/// Loads the pipeline config from a file, or the embedded defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or either TOML is
/// malformed.
pub fn load(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            let config = toml::from_str(&raw)?;
            log::info!("Loaded pipeline config from {}", p.display());
            Ok(config)
        }
        None => Ok(toml::from_str(DEFAULT_CONFIG_TOML)?),
    }
}
