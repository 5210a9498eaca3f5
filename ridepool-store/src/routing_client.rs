use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use ridepool_core::geo::GeoPoint;
use ridepool_core::routing::{GeoRouter, RouteSummary};
use ridepool_core::{CoreError, CoreResult};

use crate::app_config::RoutingConfig;

#[derive(Debug, thiserror::Error)]
pub enum RoutingClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Api(String),
    #[error("no route between the given points")]
    NoRoute,
    #[error("no match for '{0}'")]
    NoMatch(String),
}

impl From<RoutingClientError> for CoreError {
    fn from(err: RoutingClientError) -> Self {
        tracing::warn!("Map service lookup failed: {}", err);
        CoreError::ExternalLookupFailed(err.to_string())
    }
}

#[derive(Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    /// Metres
    distance: f64,
    /// Seconds
    duration: f64,
    geometry: GeoJsonLine,
}

#[derive(Deserialize)]
struct GeoJsonLine {
    /// `[lng, lat]` pairs
    coordinates: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
}

fn parse_route(response: OsrmRouteResponse) -> Result<RouteSummary, RoutingClientError> {
    if response.code != "Ok" {
        return match response.code.as_str() {
            "NoRoute" | "NoSegment" => Err(RoutingClientError::NoRoute),
            code => Err(RoutingClientError::Api(format!(
                "OSRM answered {}: {}",
                code,
                response.message.unwrap_or_default()
            ))),
        };
    }

    let route = response.routes.into_iter().next().ok_or(RoutingClientError::NoRoute)?;
    let polyline: Vec<GeoPoint> = route
        .geometry
        .coordinates
        .iter()
        .map(|[lng, lat]| GeoPoint::new(*lat, *lng))
        .collect();
    if polyline.is_empty() {
        return Err(RoutingClientError::NoRoute);
    }

    Ok(RouteSummary {
        distance_km: route.distance / 1000.0,
        duration_secs: route.duration,
        polyline,
    })
}

fn parse_geocode(text: &str, hits: Vec<NominatimHit>) -> Result<GeoPoint, RoutingClientError> {
    let hit = hits
        .into_iter()
        .next()
        .ok_or_else(|| RoutingClientError::NoMatch(text.to_string()))?;
    let lat = hit
        .lat
        .parse::<f64>()
        .map_err(|e| RoutingClientError::Api(format!("bad latitude '{}': {}", hit.lat, e)))?;
    let lng = hit
        .lon
        .parse::<f64>()
        .map_err(|e| RoutingClientError::Api(format!("bad longitude '{}': {}", hit.lon, e)))?;
    Ok(GeoPoint::new(lat, lng))
}

/// HTTP router: OSRM for driving routes, Nominatim for geocoding.
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: Client,
    osrm_url: String,
    nominatim_url: String,
}

impl OsrmRouter {
    pub fn new(osrm_url: &str, nominatim_url: &str, timeout: Duration) -> Result<Self, RoutingClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ridepool/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            osrm_url: osrm_url.trim_end_matches('/').to_string(),
            nominatim_url: nominatim_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RoutingConfig) -> Result<Self, RoutingClientError> {
        Self::new(
            &config.osrm_url,
            &config.nominatim_url,
            Duration::from_millis(config.timeout_ms),
        )
    }

    async fn fetch_route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteSummary, RoutingClientError> {
        let base = format!(
            "{}/route/v1/driving/{:.6},{:.6};{:.6},{:.6}",
            self.osrm_url, origin.lng, origin.lat, destination.lng, destination.lat
        );
        let mut url = Url::parse(&base)
            .map_err(|err| RoutingClientError::Api(format!("failed to build OSRM URL: {}", err)))?;
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");

        let parsed: OsrmRouteResponse = self.client.get(url).send().await?.json().await?;
        parse_route(parsed)
    }

    async fn fetch_geocode(&self, text: &str) -> Result<GeoPoint, RoutingClientError> {
        let mut url = Url::parse(&format!("{}/search", self.nominatim_url))
            .map_err(|err| RoutingClientError::Api(format!("failed to build geocoder URL: {}", err)))?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("limit", "1")
            .append_pair("q", text);

        let hits: Vec<NominatimHit> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_geocode(text, hits)
    }
}

#[async_trait]
impl GeoRouter for OsrmRouter {
    async fn geocode(&self, text: &str) -> CoreResult<GeoPoint> {
        Ok(self.fetch_geocode(text).await?)
    }

    async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> CoreResult<RouteSummary> {
        Ok(self.fetch_route(origin, destination).await?)
    }
}
