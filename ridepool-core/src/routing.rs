use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::{haversine_km, GeoPoint, Place, PlaceQuery};
use crate::{CoreError, CoreResult};

/// Result of a route query between two points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_secs: f64,
    /// Ordered from origin to destination.
    pub polyline: Vec<GeoPoint>,
}

/// Geocoding and routing port. Calls go through [`BoundedRouter`], which turns failures
/// and timeouts into [`CoreError::ExternalLookupFailed`].
#[async_trait]
pub trait GeoRouter: Send + Sync {
    /// Resolve free text (an address, a place name) to coordinates.
    async fn geocode(&self, text: &str) -> CoreResult<GeoPoint>;

    /// Driving route between two points.
    async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> CoreResult<RouteSummary>;
}

/// Wraps any router with a hard deadline per call.
#[derive(Clone)]
pub struct BoundedRouter {
    inner: Arc<dyn GeoRouter>,
    timeout: Duration,
}

impl BoundedRouter {
    pub fn new(inner: Arc<dyn GeoRouter>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn geocode(&self, text: &str) -> CoreResult<GeoPoint> {
        let point = tokio::time::timeout(self.timeout, self.inner.geocode(text))
            .await
            .map_err(|_| {
                tracing::warn!("Geocoding '{}' timed out after {:?}", text, self.timeout);
                CoreError::ExternalLookupFailed(format!("geocoding timed out after {:?}", self.timeout))
            })??;

        if !point.is_valid() {
            return Err(CoreError::ExternalLookupFailed(format!(
                "geocoder returned invalid coordinates for '{}'",
                text
            )));
        }
        Ok(point)
    }

    pub async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> CoreResult<RouteSummary> {
        let route = tokio::time::timeout(self.timeout, self.inner.route(origin, destination))
            .await
            .map_err(|_| {
                tracing::warn!("Routing timed out after {:?}", self.timeout);
                CoreError::ExternalLookupFailed(format!("routing timed out after {:?}", self.timeout))
            })??;

        if route.polyline.is_empty() || !route.distance_km.is_finite() || route.distance_km < 0.0 {
            return Err(CoreError::ExternalLookupFailed(
                "router returned an unusable route".to_string(),
            ));
        }
        Ok(route)
    }

    /// Turn caller input into a resolved place, geocoding only when no coordinates were given.
    pub async fn resolve(&self, query: &PlaceQuery) -> CoreResult<Place> {
        match query.point {
            Some(point) if point.is_valid() => Ok(Place::new(query.address.clone(), point)),
            Some(point) => Err(CoreError::Validation(format!(
                "invalid coordinates: {}, {}",
                point.lat, point.lng
            ))),
            None => {
                if query.address.trim().is_empty() {
                    return Err(CoreError::Validation("an address or coordinates are required".to_string()));
                }
                let point = self.geocode(&query.address).await?;
                Ok(Place::new(query.address.clone(), point))
            }
        }
    }
}

/// Network-free router: straight lines between points, geocoding from a fixed gazetteer.
///
/// Used as the offline fallback and by tests. Distances are haversine distances scaled by
/// `road_factor` to approximate road length.
#[derive(Debug, Clone)]
pub struct StraightLineRouter {
    gazetteer: HashMap<String, GeoPoint>,
    road_factor: f64,
    speed_kmh: f64,
    vertices: usize,
}

impl StraightLineRouter {
    pub fn new(speed_kmh: f64) -> Self {
        Self {
            gazetteer: HashMap::new(),
            road_factor: 1.0,
            speed_kmh,
            vertices: 8,
        }
    }

    pub fn with_place(mut self, name: &str, point: GeoPoint) -> Self {
        self.gazetteer.insert(name.trim().to_lowercase(), point);
        self
    }

    pub fn with_road_factor(mut self, road_factor: f64) -> Self {
        self.road_factor = road_factor;
        self
    }
}

impl Default for StraightLineRouter {
    fn default() -> Self {
        Self::new(40.0)
    }
}

#[async_trait]
impl GeoRouter for StraightLineRouter {
    async fn geocode(&self, text: &str) -> CoreResult<GeoPoint> {
        self.gazetteer
            .get(&text.trim().to_lowercase())
            .copied()
            .ok_or_else(|| CoreError::ExternalLookupFailed(format!("no match for '{}'", text)))
    }

    async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> CoreResult<RouteSummary> {
        let steps = self.vertices.max(1);
        let polyline = (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                GeoPoint::new(
                    origin.lat + t * (destination.lat - origin.lat),
                    origin.lng + t * (destination.lng - origin.lng),
                )
            })
            .collect();

        let distance_km = haversine_km(origin, destination) * self.road_factor;
        let duration_secs = if self.speed_kmh > 0.0 {
            distance_km / self.speed_kmh * 3600.0
        } else {
            0.0
        };

        Ok(RouteSummary {
            distance_km,
            duration_secs,
            polyline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowRouter;

    #[async_trait]
    impl GeoRouter for SlowRouter {
        async fn geocode(&self, _text: &str) -> CoreResult<GeoPoint> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(GeoPoint::new(0.0, 0.0))
        }

        async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> CoreResult<RouteSummary> {
            Ok(RouteSummary {
                distance_km: 1.0,
                duration_secs: 60.0,
                polyline: vec![origin, destination],
            })
        }
    }

    #[tokio::test]
    async fn test_slow_geocode_is_cut_off() {
        let router = BoundedRouter::new(Arc::new(SlowRouter), Duration::from_millis(20));
        let err = router.geocode("Main Street 1").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_resolve_skips_geocoding_when_coordinates_are_given() {
        let router = BoundedRouter::new(Arc::new(SlowRouter), Duration::from_millis(20));
        let query = PlaceQuery::at("Gate B", GeoPoint::new(50.0, 19.0));
        let place = router.resolve(&query).await.unwrap();
        assert_eq!(place.address, "Gate B");

        let err = router.resolve(&PlaceQuery::address("  ")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_straight_line_router() {
        let router = StraightLineRouter::default().with_place("Main Square", GeoPoint::new(50.06, 19.94));
        assert_eq!(
            router.geocode(" main square ").await.unwrap(),
            GeoPoint::new(50.06, 19.94)
        );
        assert!(router.geocode("Nowhere").await.unwrap_err().is_retryable());

        let a = GeoPoint::new(50.0, 19.0);
        let b = GeoPoint::new(50.1, 19.0);
        let route = router.route(a, b).await.unwrap();
        assert_eq!(route.polyline.first(), Some(&a));
        assert_eq!(route.polyline.len(), 9);
        assert!((route.distance_km - haversine_km(a, b)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_route_passes_through() {
        let router = BoundedRouter::new(Arc::new(SlowRouter), Duration::from_millis(200));
        let route = router
            .route(GeoPoint::new(50.0, 19.0), GeoPoint::new(50.1, 19.1))
            .await
            .unwrap();
        assert_eq!(route.polyline.len(), 2);
    }
}
