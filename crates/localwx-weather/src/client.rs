//! National Weather Service API client.
//!
//! Each public method performs one stage of the lookup chain and issues its
//! requests strictly one after another.

use chrono::{DateTime, FixedOffset};
use localwx_core::ApiConfig;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::error::{FetchError, Stage};
use crate::types::{
    Coordinates, ForecastPeriod, GeoPoint, Measurement, Observation, Station, FORECAST_PERIODS,
};

const ACCEPT_GEO_JSON: &str = "application/geo+json";

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    relative_location: RelativeLocation,
    observation_stations: String,
    forecast: Option<String>,
    grid_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelativeLocation {
    properties: RelativeLocationProperties,
}

#[derive(Debug, Deserialize)]
struct RelativeLocationProperties {
    city: String,
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationListResponse {
    #[serde(default)]
    observation_stations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StationResponse {
    id: String,
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationProperties {
    station_identifier: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: ObservationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationProperties {
    icon: Option<String>,
    timestamp: DateTime<FixedOffset>,
    text_description: Option<String>,
    temperature: Option<ApiQuantity>,
    relative_humidity: Option<ApiQuantity>,
    wind_speed: Option<ApiQuantity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiQuantity {
    value: Option<f64>,
    #[serde(default)]
    unit_code: String,
}

impl From<Option<ApiQuantity>> for Measurement {
    fn from(q: Option<ApiQuantity>) -> Self {
        match q {
            Some(q) => Measurement {
                value: q.value,
                unit_code: q.unit_code,
            },
            None => Measurement::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ApiForecastPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiForecastPeriod {
    number: u32,
    name: String,
    icon: Option<String>,
    short_forecast: Option<String>,
    detailed_forecast: Option<String>,
    temperature: Option<f64>,
    temperature_unit: Option<String>,
    is_daytime: bool,
    wind_speed: Option<String>,
    wind_direction: Option<String>,
}

impl From<ApiForecastPeriod> for ForecastPeriod {
    fn from(p: ApiForecastPeriod) -> Self {
        ForecastPeriod {
            number: p.number,
            name: p.name,
            icon: p.icon,
            short_forecast: p.short_forecast.unwrap_or_default(),
            detailed_forecast: p.detailed_forecast.unwrap_or_default(),
            temperature: p.temperature,
            temperature_unit: p.temperature_unit.unwrap_or_default(),
            is_daytime: p.is_daytime,
            wind_speed: p.wind_speed,
            wind_direction: p.wind_direction,
        }
    }
}

/// Client for `api.weather.gov` (or anything serving the same shapes).
#[derive(Debug, Clone)]
pub struct NwsClient {
    client: Arc<Client>,
    base_url: String,
}

impl NwsClient {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        Self::with_base_url(config, &config.base_url)
    }

    /// Same as [`NwsClient::new`] but pointed at another API root.
    pub fn with_base_url(config: &ApiConfig, base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and decode the JSON body, tagging failures with `stage`.
    async fn get_json<T: DeserializeOwned>(&self, stage: Stage, url: &str) -> Result<T, FetchError> {
        tracing::debug!("Fetching {} from {}", stage, url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, ACCEPT_GEO_JSON)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                stage,
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Failed to read {} error body from {}: {}", stage, url, e);
                    String::new()
                }
            };
            return Err(FetchError::Status {
                stage,
                url: url.to_string(),
                status,
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|source| FetchError::Request {
            stage,
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode {
            stage,
            url: url.to_string(),
            source,
        })
    }

    /// Resolve coordinates to a city/state and the station list URL.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve_point(&self, coordinates: Coordinates) -> Result<GeoPoint, FetchError> {
        let url = format!("{}/points/{}", self.base_url, coordinates.path_segment());
        let point: PointResponse = self.get_json(Stage::Point, &url).await?;
        let props = point.properties;

        let geo_point = GeoPoint {
            coordinates,
            city: props.relative_location.properties.city,
            state: props.relative_location.properties.state,
            observation_stations: props.observation_stations,
            forecast_url: props.forecast,
            grid_id: props.grid_id,
        };

        tracing::info!("Resolved point to {}", geo_point.relative_location());
        Ok(geo_point)
    }

    /// URL of the first station in the point's station list.
    ///
    /// Only the first entry is considered; there is no fallback to later
    /// stations if that one has no current data.
    #[instrument(skip(self, point), fields(url = %point.observation_stations), level = "info")]
    pub async fn first_station_url(&self, point: &GeoPoint) -> Result<String, FetchError> {
        let url = point.observation_stations.as_str();
        let list: StationListResponse = self.get_json(Stage::StationList, url).await?;

        tracing::debug!("Station list has {} entries", list.observation_stations.len());

        list.observation_stations
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NoStations {
                url: url.to_string(),
            })
    }

    /// Station identifier, name and resource URL.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_station(&self, station_url: &str) -> Result<Station, FetchError> {
        let station: StationResponse = self.get_json(Stage::Station, station_url).await?;

        let station = Station {
            identifier: station.properties.station_identifier,
            name: station.properties.name,
            url: station.id,
        };

        tracing::info!("Using station {}", station.label());
        Ok(station)
    }

    /// Latest observation of `station`.
    #[instrument(skip(self, station), fields(station = %station.identifier), level = "info")]
    pub async fn fetch_observation(&self, station: &Station) -> Result<Observation, FetchError> {
        let url = station.observation_url();
        let observation: ObservationResponse = self.get_json(Stage::Observation, &url).await?;
        let props = observation.properties;

        let observation = Observation {
            icon: props.icon,
            timestamp: props.timestamp,
            text_description: props.text_description.unwrap_or_default(),
            temperature: props.temperature.into(),
            relative_humidity: props.relative_humidity.into(),
            wind_speed: props.wind_speed.into(),
        };

        tracing::info!(
            "Observation at {}: {}",
            observation.timestamp,
            observation.text_description
        );
        Ok(observation)
    }

    /// First [`FORECAST_PERIODS`] forecast periods in API order.
    ///
    /// Fails with [`FetchError::InsufficientForecast`] if the API returns fewer.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<ForecastPeriod>, FetchError> {
        let url = format!(
            "{}/points/{}/forecast",
            self.base_url,
            coordinates.path_segment()
        );
        let forecast: ForecastResponse = self.get_json(Stage::Forecast, &url).await?;
        let periods = forecast.properties.periods;

        if periods.len() < FORECAST_PERIODS {
            return Err(FetchError::InsufficientForecast {
                expected: FORECAST_PERIODS,
                found: periods.len(),
            });
        }

        tracing::info!("Fetched forecast ({} periods available)", periods.len());
        Ok(periods
            .into_iter()
            .take(FORECAST_PERIODS)
            .map(ForecastPeriod::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> ApiConfig {
        ApiConfig {
            base_url: "http://unused".to_string(),
            user_agent: "localwx-test".to_string(),
            timeout_secs: 5,
        }
    }

    fn point_json(stations_url: &str) -> serde_json::Value {
        serde_json::json!({
            "properties": {
                "gridId": "MTR",
                "forecast": "https://api.weather.gov/gridpoints/MTR/85,105/forecast",
                "observationStations": stations_url,
                "relativeLocation": {
                    "properties": { "city": "San Francisco", "state": "CA" }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_resolve_point_success() {
        let mock_server = MockServer::start().await;
        let stations_url = format!("{}/gridpoints/MTR/85,105/stations", mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/points/37.77,-122.42"))
            .and(header("user-agent", "localwx-test"))
            .and(header("accept", "application/geo+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(point_json(&stations_url)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = NwsClient::with_base_url(&test_config(), &mock_server.uri()).unwrap();
        let coords = Coordinates::new(37.77, -122.42).unwrap();
        let point = client.resolve_point(coords).await.unwrap();

        assert_eq!(point.city, "San Francisco");
        assert_eq!(point.state, "CA");
        assert_eq!(point.observation_stations, stations_url);
        assert_eq!(point.grid_id.as_deref(), Some("MTR"));
        assert_eq!(point.coordinates, coords);
    }

    #[tokio::test]
    async fn test_resolve_point_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/points/0,0"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "title": "Data Unavailable For Requested Point"
            })))
            .mount(&mock_server)
            .await;

        let client = NwsClient::with_base_url(&test_config(), &mock_server.uri()).unwrap();
        let err = client
            .resolve_point(Coordinates::new(0.0, 0.0).unwrap())
            .await
            .unwrap_err();

        match err {
            FetchError::Status { stage, status, body, .. } => {
                assert_eq!(stage, Stage::Point);
                assert_eq!(status.as_u16(), 404);
                assert!(body.contains("Data Unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_point_malformed_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/points/37.77,-122.42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": { "gridId": "MTR" }
            })))
            .mount(&mock_server)
            .await;

        let client = NwsClient::with_base_url(&test_config(), &mock_server.uri()).unwrap();
        let err = client
            .resolve_point(Coordinates::new(37.77, -122.42).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode { stage: Stage::Point, .. }));
    }

    #[tokio::test]
    async fn test_empty_station_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "observationStations": []
            })))
            .mount(&mock_server)
            .await;

        let client = NwsClient::with_base_url(&test_config(), &mock_server.uri()).unwrap();
        let point = GeoPoint {
            coordinates: Coordinates::new(37.77, -122.42).unwrap(),
            city: "San Francisco".into(),
            state: "CA".into(),
            observation_stations: format!("{}/stations", mock_server.uri()),
            forecast_url: None,
            grid_id: None,
        };

        let err = client.first_station_url(&point).await.unwrap_err();
        assert!(matches!(err, FetchError::NoStations { .. }));
    }

    #[tokio::test]
    async fn test_observation_with_null_values() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stations/KSFO/observations/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": {
                    "icon": null,
                    "timestamp": "2026-10-17T18:56:00+00:00",
                    "textDescription": "",
                    "temperature": { "unitCode": "wmoUnit:degC", "value": null },
                    "relativeHumidity": { "unitCode": "wmoUnit:percent", "value": null },
                    "windSpeed": null
                }
            })))
            .mount(&mock_server)
            .await;

        let client = NwsClient::with_base_url(&test_config(), &mock_server.uri()).unwrap();
        let station = Station {
            identifier: "KSFO".into(),
            name: "San Francisco International Airport".into(),
            url: format!("{}/stations/KSFO", mock_server.uri()),
        };

        let observation = client.fetch_observation(&station).await.unwrap();
        assert_eq!(observation.icon, None);
        assert_eq!(observation.temperature.value, None);
        assert_eq!(observation.temperature.unit_code, "wmoUnit:degC");
        assert_eq!(observation.relative_humidity.value, None);
        assert_eq!(observation.wind_speed, Measurement::default());
    }

    #[tokio::test]
    async fn test_server_error_on_forecast() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/points/37.77,-122.42/forecast"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let client = NwsClient::with_base_url(&test_config(), &mock_server.uri()).unwrap();
        let err = client
            .fetch_forecast(Coordinates::new(37.77, -122.42).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Forecast));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = NwsClient::with_base_url(&test_config(), "https://api.weather.gov/").unwrap();
        assert_eq!(client.base_url(), "https://api.weather.gov");
    }
}
