//! Half-hour grid construction from a sparse hourly series.
//!
//! The pipeline is regularize → fill → grid. Regularization pins every
//! reading onto a strict source-step lattice anchored at the earliest
//! timestamp; grid construction then copies each source value unchanged
//! and inserts one interpolated midpoint between every consecutive pair.

use chrono::{Duration, NaiveDateTime};

use crate::fill::fill_gaps;
use crate::{ResampleConfig, ResampleStats, WindError, WindObservation, circular_midpoint};

/// A dense wind series on a fixed step.
///
/// Invariants: samples are strictly ordered with a constant step, and
/// every source observation's value appears unchanged at its original
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct WindGrid {
    step: Duration,
    samples: Vec<WindObservation>,
}

impl WindGrid {
    /// Grid step.
    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    /// All samples in timestamp order.
    #[must_use]
    pub fn samples(&self) -> &[WindObservation] {
        &self.samples
    }

    /// Number of grid points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when the grid has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First grid timestamp.
    #[must_use]
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.samples.first().map(|obs| obs.timestamp)
    }

    /// Last grid timestamp.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|obs| obs.timestamp)
    }

    /// Looks up the observation at an exact grid timestamp.
    ///
    /// Returns `None` when the timestamp is outside the covered range or
    /// off the grid lattice; a present observation with a `None` vector
    /// means the slot is inside the range but has no wind data.
    #[must_use]
    pub fn value_at(&self, timestamp: NaiveDateTime) -> Option<&WindObservation> {
        let start = self.start()?;
        let offset = (timestamp - start).num_seconds();
        let step = self.step.num_seconds();
        if offset < 0 || step <= 0 || offset % step != 0 {
            return None;
        }
        usize::try_from(offset / step)
            .ok()
            .and_then(|idx| self.samples.get(idx))
    }
}

/// Pins a raw series onto a strict lattice at `step`, anchored at the
/// earliest timestamp.
///
/// Readings are sorted, duplicate timestamps dropped (first kept), and
/// absent lattice slots inserted as gaps. Counters land in `stats`.
///
/// # Errors
///
/// Returns [`WindError::Empty`] for an empty input and
/// [`WindError::IrregularStep`] if any timestamp is off the lattice.
#[allow(clippy::cast_possible_truncation)]
pub fn regularize(
    readings: &[WindObservation],
    step: Duration,
    stats: &mut ResampleStats,
) -> Result<Vec<WindObservation>, WindError> {
    if readings.is_empty() {
        return Err(WindError::Empty);
    }

    let mut sorted = readings.to_vec();
    sorted.sort_by_key(|obs| obs.timestamp);

    let before = sorted.len();
    sorted.dedup_by_key(|obs| obs.timestamp);
    stats.duplicates_dropped += (before - sorted.len()) as u64;

    let start = sorted[0].timestamp;
    let step_seconds = step.num_seconds();
    let expected_minutes = minutes_of(step);
    for obs in &sorted {
        let offset = (obs.timestamp - start).num_seconds();
        if step_seconds <= 0 || offset % step_seconds != 0 {
            return Err(WindError::IrregularStep {
                timestamp: obs.timestamp,
                expected_minutes,
            });
        }
    }

    let mut lattice = Vec::new();
    let mut expected = start;
    for obs in sorted {
        while expected < obs.timestamp {
            lattice.push(WindObservation {
                timestamp: expected,
                vector: None,
            });
            stats.inserted_missing += 1;
            expected += step;
        }
        lattice.push(obs);
        expected += step;
    }

    Ok(lattice)
}

/// Builds the half-step grid from a strict fixed-step series.
///
/// Every source value is copied unchanged; each inserted midpoint is the
/// circular mean of its two neighbors, or a gap if either neighbor is a
/// gap.
///
/// # Errors
///
/// Returns [`WindError::Empty`] for an empty input and
/// [`WindError::IrregularStep`] if consecutive timestamps are not exactly
/// `source_step` apart.
pub fn build_half_hour_grid(
    series: &[WindObservation],
    source_step: Duration,
) -> Result<WindGrid, WindError> {
    if series.is_empty() {
        return Err(WindError::Empty);
    }

    let half_step = source_step / 2;
    let expected_minutes = minutes_of(source_step);

    let mut samples = Vec::with_capacity(series.len() * 2);
    for pair in series.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if b.timestamp - a.timestamp != source_step {
            return Err(WindError::IrregularStep {
                timestamp: b.timestamp,
                expected_minutes,
            });
        }

        samples.push(*a);
        let vector = match (a.vector, b.vector) {
            (Some(va), Some(vb)) => Some(circular_midpoint(va, vb)),
            _ => None,
        };
        samples.push(WindObservation {
            timestamp: a.timestamp + half_step,
            vector,
        });
    }
    if let Some(last) = series.last() {
        samples.push(*last);
    }

    Ok(WindGrid {
        step: half_step,
        samples,
    })
}

/// Regularizes, gap-fills, and grids a raw hourly series in one pass.
///
/// # Errors
///
/// Propagates [`WindError::Empty`] and [`WindError::IrregularStep`] from
/// the regularization and gridding steps.
pub fn resample(
    readings: &[WindObservation],
    config: &ResampleConfig,
) -> Result<(WindGrid, ResampleStats), WindError> {
    let step = Duration::minutes(i64::from(config.source_step_minutes));
    let mut stats = ResampleStats::default();

    let mut lattice = regularize(readings, step, &mut stats)?;

    let fill = fill_gaps(&mut lattice, config.max_fill_span_steps);
    stats.filled_forward += fill.filled_forward;
    stats.filled_backward += fill.filled_backward;
    stats.left_unfilled += fill.left_unfilled;

    let grid = build_half_hour_grid(&lattice, step)?;
    Ok((grid, stats))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn minutes_of(step: Duration) -> u32 {
    step.num_minutes().max(0) as u32
}
