use chrono::{DateTime, FixedOffset};
use localwx_core::WeatherError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of forecast periods a session exposes.
pub const FORECAST_PERIODS: usize = 3;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::InvalidCoordinates(format!(
                "latitude {} out of range",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidCoordinates(format!(
                "longitude {} out of range",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// `lat,lon` as used in `/points/{lat},{lon}`.
    ///
    /// The API only accepts four decimal places; anything finer is answered
    /// with a redirect, so values are rounded here.
    pub fn path_segment(&self) -> String {
        format!(
            "{},{}",
            round_to_4(self.latitude),
            round_to_4(self.longitude)
        )
    }
}

fn round_to_4(value: f64) -> f64 {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    // avoid "-0" in the path
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Where a session's coordinates came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Given explicitly on the command line or in the config file
    Manual,
    /// Reported by the platform location service
    Device,
    /// Device location was unavailable; the configured fallback is in use
    Fallback,
}

/// Output of the location provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub source: LocationSource,
    pub accuracy_meters: Option<f64>,
}

impl ResolvedLocation {
    pub fn manual(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            source: LocationSource::Manual,
            accuracy_meters: None,
        }
    }

    pub fn fallback(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            source: LocationSource::Fallback,
            accuracy_meters: None,
        }
    }

    /// Degraded mode: the page should say the location is approximate.
    pub fn is_degraded(&self) -> bool {
        self.source == LocationSource::Fallback
    }
}

/// A resolved `/points` lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub coordinates: Coordinates,
    pub city: String,
    pub state: String,
    /// URL of the observation station list for this point
    pub observation_stations: String,
    /// Forecast URL advertised by the point, kept for reference only
    pub forecast_url: Option<String>,
    /// Forecast office id, e.g. "MTR"
    pub grid_id: Option<String>,
}

impl GeoPoint {
    /// "City, ST"
    pub fn relative_location(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }
}

/// An observation station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub identifier: String,
    pub name: String,
    /// The station resource URL; observations hang off it
    pub url: String,
}

impl Station {
    pub fn observation_url(&self) -> String {
        format!("{}/observations/current", self.url.trim_end_matches('/'))
    }

    /// "KSFO - San Francisco International Airport"
    pub fn label(&self) -> String {
        format!("{} - {}", self.identifier, self.name)
    }
}

/// A value with its unit code as reported by the API, e.g. `wmoUnit:degC`.
/// `value` is `None` when the station did not report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Measurement {
    pub value: Option<f64>,
    pub unit_code: String,
}

/// Latest observation of a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub icon: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
    pub text_description: String,
    pub temperature: Measurement,
    pub relative_humidity: Measurement,
    pub wind_speed: Measurement,
}

/// One period ("Tonight", "Thursday", ...) of the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub number: u32,
    pub name: String,
    pub icon: Option<String>,
    pub short_forecast: String,
    pub detailed_forecast: String,
    pub temperature: Option<f64>,
    /// "F" or "C" as reported by the API
    pub temperature_unit: String,
    pub is_daytime: bool,
    pub wind_speed: Option<String>,
    pub wind_direction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(37.77, -122.42).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.1, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_path_segment_keeps_short_values() {
        let c = Coordinates::new(37.77, -122.42).unwrap();
        assert_eq!(c.path_segment(), "37.77,-122.42");
    }

    #[test]
    fn test_path_segment_rounds_to_four_places() {
        let c = Coordinates::new(47.606_209_4, -122.332_071_2).unwrap();
        assert_eq!(c.path_segment(), "47.6062,-122.3321");
    }

    #[test]
    fn test_path_segment_no_negative_zero() {
        let c = Coordinates::new(-0.000_01, 10.0).unwrap();
        assert_eq!(c.path_segment(), "0,10");
    }

    #[test]
    fn test_degraded_only_for_fallback() {
        let c = Coordinates::new(1.0, 2.0).unwrap();
        assert!(ResolvedLocation::fallback(c).is_degraded());
        assert!(!ResolvedLocation::manual(c).is_degraded());
    }

    #[test]
    fn test_station_observation_url() {
        let station = Station {
            identifier: "KSFO".into(),
            name: "San Francisco International Airport".into(),
            url: "https://api.weather.gov/stations/KSFO/".into(),
        };
        assert_eq!(
            station.observation_url(),
            "https://api.weather.gov/stations/KSFO/observations/current"
        );
        assert_eq!(station.label(), "KSFO - San Francisco International Airport");
    }

    #[test]
    fn test_relative_location() {
        let point = GeoPoint {
            coordinates: Coordinates::new(37.77, -122.42).unwrap(),
            city: "San Francisco".into(),
            state: "CA".into(),
            observation_stations: "https://example/stations".into(),
            forecast_url: None,
            grid_id: None,
        };
        assert_eq!(point.relative_location(), "San Francisco, CA");
    }
}
