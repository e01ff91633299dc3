//! Geodesic radius filtering.

use service_map_geodesy::{GeoPoint, Geodesy};

/// Ordering of the kept rows in a [`RadiusSubsample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsampleOrder {
    /// Stable input order (the default everywhere in the pipeline).
    InputOrder,
    /// Ascending distance, ties broken by input order.
    ByDistance,
}

/// Result of a radius filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusSubsample {
    /// `(input index, distance in meters)` for every retained row.
    pub kept: Vec<(usize, f64)>,
    /// Rows excluded for having no usable location. Reported, never
    /// silently dropped.
    pub missing_location: u64,
}

/// Filters a batch of locations to those within `radius_meters` of
/// `center` (inclusive boundary: distance equal to the radius is kept).
///
/// Monotone in the radius: growing `radius_meters` never removes a
/// previously retained row.
#[must_use]
pub fn filter_by_radius(
    geodesy: &Geodesy,
    locations: &[Option<GeoPoint>],
    center: GeoPoint,
    radius_meters: f64,
    order: SubsampleOrder,
) -> RadiusSubsample {
    let mut kept = Vec::new();
    let mut missing_location: u64 = 0;

    for (index, distance) in geodesy.distances_to(locations, center).iter().enumerate() {
        match distance {
            Some(d) if *d <= radius_meters => kept.push((index, *d)),
            Some(_) => {}
            None => missing_location += 1,
        }
    }

    if order == SubsampleOrder::ByDistance {
        kept.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    }

    RadiusSubsample {
        kept,
        missing_location,
    }
}

#[cfg(test)]
mod tests {
    use service_map_geodesy::{MEAN_EARTH_RADIUS_M, arc_minutes_to_meters};

    use super::*;

    /// Bellville South AQM site centroid.
    const CENTER: (f64, f64) = (-33.8930, 18.6050);

    fn center() -> GeoPoint {
        GeoPoint::new(CENTER.0, CENTER.1).unwrap()
    }

    /// A point due north of the center at the given great-circle
    /// distance, constructed by inverting the arc length.
    fn north_of_center(distance_m: f64) -> GeoPoint {
        let delta_deg = (distance_m / MEAN_EARTH_RADIUS_M).to_degrees();
        GeoPoint::new(CENTER.0 + delta_deg, CENTER.1).unwrap()
    }

    #[test]
    fn one_minute_radius_boundary_is_inclusive() {
        let geodesy = Geodesy::default();
        let radius = arc_minutes_to_meters(1.0);
        let locations = vec![
            Some(north_of_center(1851.9)),
            Some(north_of_center(1852.1)),
            Some(center()),
        ];

        let subsample =
            filter_by_radius(&geodesy, &locations, center(), radius, SubsampleOrder::InputOrder);

        let kept: Vec<usize> = subsample.kept.iter().map(|(i, _)| *i).collect();
        assert_eq!(kept, vec![0, 2]);
        assert!((subsample.kept[0].1 - 1851.9).abs() < 0.5);
    }

    #[test]
    fn missing_locations_are_counted_not_dropped_silently() {
        let geodesy = Geodesy::default();
        let locations = vec![Some(center()), None, None];
        let subsample =
            filter_by_radius(&geodesy, &locations, center(), 100.0, SubsampleOrder::InputOrder);

        assert_eq!(subsample.kept.len(), 1);
        assert_eq!(subsample.missing_location, 2);
    }

    #[test]
    fn kept_rows_follow_input_order_by_default() {
        let geodesy = Geodesy::default();
        let locations = vec![
            Some(north_of_center(900.0)),
            Some(north_of_center(100.0)),
            Some(north_of_center(500.0)),
        ];
        let subsample =
            filter_by_radius(&geodesy, &locations, center(), 1000.0, SubsampleOrder::InputOrder);

        let kept: Vec<usize> = subsample.kept.iter().map(|(i, _)| *i).collect();
        assert_eq!(kept, vec![0, 1, 2]);
    }

    #[test]
    fn by_distance_order_sorts_ascending() {
        let geodesy = Geodesy::default();
        let locations = vec![
            Some(north_of_center(900.0)),
            Some(north_of_center(100.0)),
            Some(north_of_center(500.0)),
        ];
        let subsample =
            filter_by_radius(&geodesy, &locations, center(), 1000.0, SubsampleOrder::ByDistance);

        let kept: Vec<usize> = subsample.kept.iter().map(|(i, _)| *i).collect();
        assert_eq!(kept, vec![1, 2, 0]);
    }

    #[test]
    fn growing_the_radius_never_removes_a_row() {
        let geodesy = Geodesy::default();
        let locations: Vec<Option<GeoPoint>> = (0..20)
            .map(|i| Some(north_of_center(f64::from(i) * 150.0)))
            .collect();

        let mut previous: Vec<usize> = Vec::new();
        for radius in [0.0, 300.0, 900.0, 1500.0, 3000.0] {
            let kept: Vec<usize> =
                filter_by_radius(&geodesy, &locations, center(), radius, SubsampleOrder::InputOrder)
                    .kept
                    .iter()
                    .map(|(i, _)| *i)
                    .collect();
            assert!(
                previous.iter().all(|i| kept.contains(i)),
                "radius {radius} dropped a previously kept row"
            );
            previous = kept;
        }
    }
}
