use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use rideway_core::geo::{Coordinate, GeoError, Geocoder, RouteMetrics};

#[derive(Debug, Clone)]
pub struct GeoapifyConfig {
    pub base_url: String,
    pub api_key: String,
    /// Total per-request budget; expiry surfaces as an upstream failure.
    pub timeout_seconds: u64,
}

/// Geoapify adapter for forward geocoding, routing and autocomplete.
pub struct GeoapifyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeoapifyClient {
    pub fn new(config: &GeoapifyConfig) -> Result<Self, GeoError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GeoError::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GeoError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Geoapify request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeoError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeoError::Upstream(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GeoError::Upstream(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    geometry: Option<PointGeometry>,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    properties: RouteProperties,
}

#[derive(Debug, Deserialize)]
struct RouteProperties {
    /// Metres.
    distance: f64,
    /// Seconds.
    time: f64,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    features: Vec<SuggestFeature>,
}

#[derive(Debug, Deserialize)]
struct SuggestFeature {
    #[serde(default)]
    properties: SuggestProperties,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestProperties {
    formatted: Option<String>,
}

fn parse_point(body: &GeocodeResponse, address: &str) -> Result<Coordinate, GeoError> {
    let geometry = body
        .features
        .first()
        .and_then(|feature| feature.geometry.as_ref())
        .ok_or_else(|| GeoError::NotFound(address.to_string()))?;

    // GeoJSON axis order: [lng, lat].
    match geometry.coordinates.as_slice() {
        [lng, lat, ..] => Ok(Coordinate::new(*lat, *lng)),
        _ => Err(GeoError::Upstream(
            "malformed geometry in geocoding response".to_string(),
        )),
    }
}

fn parse_route(body: &RouteResponse, origin: &str, destination: &str) -> Result<RouteMetrics, GeoError> {
    let properties = body
        .features
        .first()
        .map(|feature| &feature.properties)
        .ok_or_else(|| GeoError::NotFound(format!("no route from {origin} to {destination}")))?;

    Ok(RouteMetrics {
        distance_meters: properties.distance,
        duration_seconds: properties.time,
    })
}

fn parse_suggestions(body: SuggestResponse) -> Vec<String> {
    body.features
        .into_iter()
        .filter_map(|feature| feature.properties.formatted)
        .filter(|formatted| !formatted.is_empty())
        .collect()
}

#[async_trait]
impl Geocoder for GeoapifyClient {
    async fn coordinates_of(&self, address: &str) -> Result<Coordinate, GeoError> {
        if address.trim().is_empty() {
            return Err(GeoError::InvalidArgument("address must not be empty".into()));
        }

        let body: GeocodeResponse = self
            .get("/v1/geocode/search", &[("text", address)])
            .await?;
        parse_point(&body, address)
    }

    async fn route_metrics(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<RouteMetrics, GeoError> {
        let from = self.coordinates_of(origin).await?;
        let to = self.coordinates_of(destination).await?;

        // The routing endpoint wants latitude-first waypoints.
        let waypoints = format!("{},{}|{},{}", from.lat, from.lng, to.lat, to.lng);
        let body: RouteResponse = self
            .get(
                "/v1/routing",
                &[("waypoints", waypoints.as_str()), ("mode", "drive")],
            )
            .await?;
        parse_route(&body, origin, destination)
    }

    async fn suggestions_for(&self, partial: &str) -> Result<Vec<String>, GeoError> {
        if partial.trim().is_empty() {
            return Err(GeoError::InvalidArgument("input must not be empty".into()));
        }

        let body: SuggestResponse = self
            .get("/v1/geocode/autocomplete", &[("text", partial)])
            .await?;
        Ok(parse_suggestions(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeoapifyClient {
        GeoapifyClient::new(&GeoapifyConfig {
            base_url: "http://localhost:0".into(),
            api_key: "test".into(),
            timeout_seconds: 1,
        })
        .unwrap()
    }

    #[test]
    fn geocode_parses_longitude_first() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{"features":[{"geometry":{"type":"Point","coordinates":[77.209,28.6139]},"properties":{"formatted":"Connaught Place, New Delhi"}}]}"#,
        )
        .unwrap();

        let point = parse_point(&body, "Connaught Place").unwrap();
        assert_eq!(point.lng, 77.209);
        assert_eq!(point.lat, 28.6139);
    }

    #[test]
    fn geocode_without_features_is_not_found() {
        let body: GeocodeResponse = serde_json::from_str(r#"{"features":[]}"#).unwrap();

        match parse_point(&body, "nowhere") {
            Err(GeoError::NotFound(address)) => assert_eq!(address, "nowhere"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn geocode_with_short_coordinates_is_upstream_error() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{"features":[{"geometry":{"type":"Point","coordinates":[77.209]}}]}"#,
        )
        .unwrap();

        assert!(matches!(
            parse_point(&body, "somewhere"),
            Err(GeoError::Upstream(_))
        ));
    }

    #[test]
    fn route_reads_distance_and_time() {
        let body: RouteResponse = serde_json::from_str(
            r#"{"features":[{"properties":{"mode":"drive","distance":5120.5,"time":612.25}}]}"#,
        )
        .unwrap();

        let metrics = parse_route(&body, "a", "b").unwrap();
        assert_eq!(metrics.distance_meters, 5120.5);
        assert_eq!(metrics.duration_seconds, 612.25);
    }

    #[test]
    fn route_without_features_is_not_found() {
        let body: RouteResponse = serde_json::from_str(r#"{"features":[]}"#).unwrap();
        assert!(matches!(
            parse_route(&body, "a", "b"),
            Err(GeoError::NotFound(_))
        ));
    }

    #[test]
    fn suggestions_skip_entries_without_formatted_text() {
        let body: SuggestResponse = serde_json::from_str(
            r#"{"features":[
                {"properties":{"formatted":"MG Road, Bengaluru"}},
                {"properties":{}},
                {"properties":{"formatted":""}},
                {"properties":{"formatted":"MG Road, Pune"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            parse_suggestions(body),
            vec!["MG Road, Bengaluru".to_string(), "MG Road, Pune".to_string()]
        );
    }

    #[tokio::test]
    async fn blank_address_is_rejected_before_any_request() {
        let result = client().coordinates_of("   ").await;
        assert!(matches!(result, Err(GeoError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn blank_suggestion_input_is_rejected() {
        let result = client().suggestions_for("").await;
        assert!(matches!(result, Err(GeoError::InvalidArgument(_))));
    }
}
