//! Weather-specific error types.

use localwx_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError};
use std::fmt;
use thiserror::Error;

/// Location service errors
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// The request that was in flight when a fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Point,
    StationList,
    Station,
    Observation,
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Point => "point lookup",
            Stage::StationList => "station list",
            Stage::Station => "station lookup",
            Stage::Observation => "current observation",
            Stage::Forecast => "forecast",
        })
    }
}

/// Errors from the NWS fetch pipeline. None of these are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("{stage} request to {url} failed")]
    Request {
        stage: Stage,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} request to {url} returned {status}")]
    Status {
        stage: Stage,
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse {stage} response from {url}")]
    Decode {
        stage: Stage,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Station list at {url} is empty")]
    NoStations { url: String },

    #[error("Forecast returned {found} periods, expected at least {expected}")]
    InsufficientForecast { expected: usize, found: usize },
}

impl FetchError {
    /// Stage the error belongs to, when it came from a request.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            FetchError::Request { stage, .. }
            | FetchError::Status { stage, .. }
            | FetchError::Decode { stage, .. } => Some(*stage),
            FetchError::NoStations { .. } => Some(Stage::StationList),
            FetchError::InsufficientForecast { .. } => Some(Stage::Forecast),
            FetchError::Client(_) => None,
        }
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Client(source) => {
                AppError::Network(NetworkError::ConnectionFailed(source.to_string()))
            }
            FetchError::Request { source, .. } => AppError::Network(source.into_network_error()),
            FetchError::Status {
                stage: Stage::Point,
                url,
                status,
                ..
            } if status == reqwest::StatusCode::NOT_FOUND => {
                AppError::Weather(WeatherError::LocationNotCovered(url))
            }
            FetchError::Status {
                status, url, body, ..
            } => AppError::Network(NetworkError::ServerError {
                status: status.as_u16(),
                message: format!("{}: {}", url, body),
            }),
            FetchError::Decode { stage, source, .. } => AppError::Network(
                NetworkError::InvalidResponse(format!("{}: {}", stage, source)),
            ),
            FetchError::NoStations { url } => AppError::Weather(WeatherError::NoStations(url)),
            FetchError::InsufficientForecast { expected, found } => {
                AppError::Weather(WeatherError::IncompleteForecast { expected, found })
            }
        }
    }
}
