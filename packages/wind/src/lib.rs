#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Circular wind time-series math.
//!
//! Wind direction is a circular quantity: the arithmetic mean of 350° and
//! 10° is 180°, which points the wrong way entirely. Everything in this
//! crate that averages directions goes through the resultant-vector form
//! instead, so values near the 0/360 boundary interpolate correctly.
//!
//! The resampling order is a fixed contract: a raw hourly series is first
//! regularized onto a strict 60-minute lattice, then gap-filled by plain
//! carry (forward, then backward for a leading gap), and only then is the
//! half-hour grid built. Gap filling never invents directions; midpoint
//! interpolation only ever runs between two real or carried observations
//! one source step apart.

pub mod fill;
pub mod resample;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fill::{FillStats, fill_gaps};
pub use resample::{WindGrid, build_half_hour_grid, regularize, resample};

/// Errors that can occur while building a wind grid.
#[derive(Debug, Error)]
pub enum WindError {
    /// Speed or direction was non-finite or out of range.
    #[error("invalid wind sample: speed={speed_ms} m/s, direction={direction_deg} deg")]
    InvalidSample {
        /// The offending speed.
        speed_ms: f64,
        /// The offending direction.
        direction_deg: f64,
    },

    /// A series timestamp does not sit on the expected lattice.
    #[error("wind series is not on a strict {expected_minutes}-minute step at {timestamp}")]
    IrregularStep {
        /// First off-lattice timestamp.
        timestamp: NaiveDateTime,
        /// Expected step in minutes.
        expected_minutes: u32,
    },

    /// The input series contained no observations at all.
    #[error("wind series is empty")]
    Empty,
}

/// A wind reading: speed plus circular direction.
///
/// Construction enforces finite, non-negative speed and normalizes the
/// direction into [0, 360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindVector {
    pub(crate) speed_ms: f64,
    pub(crate) direction_deg: f64,
}

impl WindVector {
    /// Creates a validated wind vector.
    ///
    /// A direction of exactly 360° normalizes to 0°.
    ///
    /// # Errors
    ///
    /// Returns [`WindError::InvalidSample`] on non-finite input or
    /// negative speed.
    pub fn new(speed_ms: f64, direction_deg: f64) -> Result<Self, WindError> {
        if !speed_ms.is_finite() || speed_ms < 0.0 || !direction_deg.is_finite() {
            return Err(WindError::InvalidSample {
                speed_ms,
                direction_deg,
            });
        }
        Ok(Self {
            speed_ms,
            direction_deg: normalize_direction(direction_deg),
        })
    }

    /// Wind speed in meters per second.
    #[must_use]
    pub const fn speed_ms(self) -> f64 {
        self.speed_ms
    }

    /// Wind direction in degrees, always in [0, 360).
    #[must_use]
    pub const fn direction_deg(self) -> f64 {
        self.direction_deg
    }
}

/// A timestamped wind observation; `None` models a gap in the series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindObservation {
    /// Observation time, timezone-naive.
    pub timestamp: NaiveDateTime,
    /// The reading, or `None` for a gap.
    pub vector: Option<WindVector>,
}

/// Configuration for [`resample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResampleConfig {
    /// Step of the source series in minutes; the output grid runs at half
    /// this step.
    pub source_step_minutes: u32,
    /// Longest gap (in source steps) that carry-fill may bridge. Gaps
    /// longer than this stay null and flow downstream as "no wind data
    /// available". `None` fills unconditionally.
    pub max_fill_span_steps: Option<usize>,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            source_step_minutes: 60,
            max_fill_span_steps: None,
        }
    }
}

/// Counters describing what resampling did to the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResampleStats {
    /// Lattice slots that had no source observation.
    pub inserted_missing: u64,
    /// Duplicate-timestamp readings dropped (first occurrence kept).
    pub duplicates_dropped: u64,
    /// Gap slots filled by forward carry.
    pub filled_forward: u64,
    /// Gap slots filled by backward carry (leading gaps only).
    pub filled_backward: u64,
    /// Gap slots left null (gap longer than the configured span, or no
    /// valid observation anywhere).
    pub left_unfilled: u64,
}

/// Midpoint of two wind readings using vector (circular) interpolation.
///
/// Direction is the circular mean `atan2(sin a + sin b, cos a + cos b)`;
/// speed is half the magnitude of the resultant of the two speed-scaled
/// vectors, not the arithmetic mean of the scalar speeds.
#[must_use]
pub fn circular_midpoint(a: WindVector, b: WindVector) -> WindVector {
    let t1 = a.direction_deg.to_radians();
    let t2 = b.direction_deg.to_radians();

    let direction_deg = normalize_direction(
        (t1.sin() + t2.sin())
            .atan2(t1.cos() + t2.cos())
            .to_degrees(),
    );

    let east = a.speed_ms * t1.sin() + b.speed_ms * t2.sin();
    let north = a.speed_ms * t1.cos() + b.speed_ms * t2.cos();
    let speed_ms = east.hypot(north) / 2.0;

    WindVector {
        speed_ms,
        direction_deg,
    }
}

/// Wraps a direction into [0, 360), guarding against the rounding case
/// where `rem_euclid` of a tiny negative lands on 360.0 exactly.
fn normalize_direction(direction_deg: f64) -> f64 {
    let wrapped = direction_deg.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
