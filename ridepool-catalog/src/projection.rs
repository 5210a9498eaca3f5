use ridepool_core::geo::{haversine_km, GeoPoint, EARTH_RADIUS_KM};
use ridepool_core::models::PickupProjection;
use ridepool_core::CoreError;

pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProjectionError {
    #[error("route has no points")]
    EmptyRoute,

    #[error("invalid coordinates: {lat}, {lng}")]
    InvalidPoint { lat: f64, lng: f64 },
}

impl From<ProjectionError> for CoreError {
    fn from(err: ProjectionError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

/// Maps a chosen pickup onto a driver's route and reports the detour.
///
/// Never rejects a point for being far away: a large detour is reported as such and the
/// driver decides at accept time.
#[derive(Debug, Clone)]
pub struct PickupProjector {
    average_speed_kmh: f64,
}

impl PickupProjector {
    pub fn new(average_speed_kmh: f64) -> Self {
        let average_speed_kmh = if average_speed_kmh.is_finite() && average_speed_kmh > 0.0 {
            average_speed_kmh
        } else {
            DEFAULT_AVERAGE_SPEED_KMH
        };
        Self { average_speed_kmh }
    }

    /// Each segment is flattened onto a local equirectangular plane and the point is
    /// clamped onto it; the closest candidate wins. Reported distances are haversine.
    pub fn project(&self, route: &[GeoPoint], point: GeoPoint) -> Result<PickupProjection, ProjectionError> {
        if !point.is_valid() {
            return Err(ProjectionError::InvalidPoint {
                lat: point.lat,
                lng: point.lng,
            });
        }
        let first = *route.first().ok_or(ProjectionError::EmptyRoute)?;
        if let Some(bad) = route.iter().find(|p| !p.is_valid()) {
            return Err(ProjectionError::InvalidPoint {
                lat: bad.lat,
                lng: bad.lng,
            });
        }

        let mut best = Candidate {
            snapped: first,
            segment_index: 0,
            offset_km: haversine_km(point, first),
            along_route_km: 0.0,
        };

        let mut travelled = 0.0;
        for (index, segment) in route.windows(2).enumerate() {
            let (a, b) = (segment[0], segment[1]);
            let snapped = snap_to_segment(a, b, point);
            let offset_km = haversine_km(point, snapped);

            if offset_km < best.offset_km {
                best = Candidate {
                    snapped,
                    segment_index: index,
                    offset_km,
                    along_route_km: travelled + haversine_km(a, snapped),
                };
            }
            travelled += haversine_km(a, b);
        }

        let detour_km = 2.0 * best.offset_km;
        Ok(PickupProjection {
            snapped: best.snapped,
            segment_index: best.segment_index,
            offset_km: best.offset_km,
            along_route_km: best.along_route_km,
            detour_km,
            detour_secs: detour_km / self.average_speed_kmh * 3600.0,
        })
    }
}

impl Default for PickupProjector {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE_SPEED_KMH)
    }
}

struct Candidate {
    snapped: GeoPoint,
    segment_index: usize,
    offset_km: f64,
    along_route_km: f64,
}

fn wrap_lng(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

/// Plane coordinates (km) of `p` relative to `origin`.
fn to_plane(origin: GeoPoint, p: GeoPoint, cos_lat: f64) -> (f64, f64) {
    let x = wrap_lng(p.lng - origin.lng).to_radians() * cos_lat * EARTH_RADIUS_KM;
    let y = (p.lat - origin.lat).to_radians() * EARTH_RADIUS_KM;
    (x, y)
}

fn snap_to_segment(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> GeoPoint {
    let cos_lat = ((a.lat + b.lat) * 0.5).to_radians().cos();
    let (bx, by) = to_plane(a, b, cos_lat);
    let (px, py) = to_plane(a, p, cos_lat);

    let length_sq = bx * bx + by * by;
    if length_sq <= f64::EPSILON {
        return a;
    }

    let t = ((px * bx + py * by) / length_sq).clamp(0.0, 1.0);
    GeoPoint {
        lat: a.lat + t * (b.lat - a.lat),
        lng: a.lng + t * wrap_lng(b.lng - a.lng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km_east(p: GeoPoint, km: f64) -> GeoPoint {
        let dlng = (km / (EARTH_RADIUS_KM * p.lat.to_radians().cos())).to_degrees();
        GeoPoint::new(p.lat, p.lng + dlng)
    }

    fn north_route() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(50.00, 19.0),
            GeoPoint::new(50.05, 19.0),
            GeoPoint::new(50.10, 19.0),
            GeoPoint::new(50.20, 19.0),
        ]
    }

    #[test]
    fn test_point_on_route_has_no_detour() {
        let projector = PickupProjector::default();
        let route = north_route();
        let on_route = GeoPoint::new(50.07, 19.0);

        let projection = projector.project(&route, on_route).unwrap();
        assert!(projection.offset_km < 1e-6);
        assert!(projection.detour_km < 1e-6);
        assert_eq!(projection.segment_index, 1);
        let expected_along = haversine_km(route[0], on_route);
        assert!((projection.along_route_km - expected_along).abs() < 1e-3);
    }

    #[test]
    fn test_two_km_off_route_reports_detour() {
        let projector = PickupProjector::new(40.0);
        let route = north_route();
        let off_route = km_east(GeoPoint::new(50.15, 19.0), 2.0);

        let projection = projector.project(&route, off_route).unwrap();
        assert!((projection.offset_km - 2.0).abs() < 0.02, "offset {}", projection.offset_km);
        assert!((projection.detour_km - 4.0).abs() < 0.04);
        assert!((projection.detour_secs - 360.0).abs() < 4.0);
        assert_eq!(projection.segment_index, 2);
        assert!((projection.snapped.lat - 50.15).abs() < 1e-3);
    }

    #[test]
    fn test_point_beyond_route_end_clamps_to_endpoint() {
        let projector = PickupProjector::default();
        let route = north_route();
        let beyond = GeoPoint::new(50.30, 19.0);

        let projection = projector.project(&route, beyond).unwrap();
        assert!(haversine_km(projection.snapped, route[3]) < 1e-6);
        assert_eq!(projection.segment_index, 2);
    }

    #[test]
    fn test_far_points_are_never_rejected() {
        let projector = PickupProjector::default();
        let far_away = GeoPoint::new(41.9, 12.5);
        let projection = projector.project(&north_route(), far_away).unwrap();
        assert!(projection.detour_km > 1000.0);
    }

    #[test]
    fn test_single_point_route() {
        let projector = PickupProjector::default();
        let only = GeoPoint::new(50.0, 19.0);
        let p = km_east(only, 1.0);
        let projection = projector.project(&[only], p).unwrap();
        assert!((projection.offset_km - 1.0).abs() < 0.01);
        assert_eq!(projection.along_route_km, 0.0);
    }

    #[test]
    fn test_invalid_input() {
        let projector = PickupProjector::default();
        assert_eq!(
            projector.project(&[], GeoPoint::new(50.0, 19.0)),
            Err(ProjectionError::EmptyRoute)
        );
        assert!(matches!(
            projector.project(&north_route(), GeoPoint::new(95.0, 19.0)),
            Err(ProjectionError::InvalidPoint { .. })
        ));
    }
}
