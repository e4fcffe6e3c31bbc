//! One weather lookup for one location, from point resolution to a
//! renderable report.

use localwx_core::{DisplayConfig, TemperatureUnit};
use std::fmt;

use crate::client::NwsClient;
use crate::error::FetchError;
use crate::report::{ReportInputs, WeatherReport};
use crate::types::{ForecastPeriod, GeoPoint, Observation, ResolvedLocation, Station};

/// Where a session is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ResolvingPoint,
    FetchingStation,
    FetchingObservation,
    FetchingForecast,
    Ready,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::ResolvingPoint => "resolving point",
            Self::FetchingStation => "fetching station",
            Self::FetchingObservation => "fetching observation",
            Self::FetchingForecast => "fetching forecast",
            Self::Ready => "ready",
            Self::Failed => "failed",
        })
    }
}

/// Fetched data plus the display unit. Data is filled in stage by stage and
/// only read back once the session is [`SessionState::Ready`].
#[derive(Debug, Clone)]
pub struct WeatherSession {
    location: ResolvedLocation,
    unit: TemperatureUnit,
    state: SessionState,
    point: Option<GeoPoint>,
    station: Option<Station>,
    observation: Option<Observation>,
    forecast: Vec<ForecastPeriod>,
}

impl WeatherSession {
    pub fn new(location: ResolvedLocation, unit: TemperatureUnit) -> Self {
        Self {
            location,
            unit,
            state: SessionState::Idle,
            point: None,
            station: None,
            observation: None,
            forecast: Vec::new(),
        }
    }

    /// Run the fetch pipeline once: point, station list, station,
    /// observation, forecast. Requests are strictly sequential.
    ///
    /// A `Ready` session returns immediately without any request. On error
    /// the session is left `Failed` and no later stage is attempted.
    pub async fn run(&mut self, client: &NwsClient) -> Result<(), FetchError> {
        if self.state == SessionState::Ready {
            tracing::debug!("Session already ready, skipping fetch");
            return Ok(());
        }

        match self.run_stages(client).await {
            Ok(()) => {
                self.state = SessionState::Ready;
                tracing::info!("Weather session ready for {}", self.location.coordinates);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Weather session failed while {}: {}", self.state, e);
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self, client: &NwsClient) -> Result<(), FetchError> {
        let coordinates = self.location.coordinates;

        self.transition(SessionState::ResolvingPoint);
        let point = client.resolve_point(coordinates).await?;

        self.transition(SessionState::FetchingStation);
        let station_url = client.first_station_url(&point).await?;
        self.point = Some(point);
        let station = client.fetch_station(&station_url).await?;

        self.transition(SessionState::FetchingObservation);
        let observation = client.fetch_observation(&station).await?;
        self.station = Some(station);
        self.observation = Some(observation);

        self.transition(SessionState::FetchingForecast);
        self.forecast = client.fetch_forecast(coordinates).await?;

        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session {} -> {}", self.state, next);
        self.state = next;
    }

    /// Change the display unit. Never fetches.
    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        if unit != self.unit {
            tracing::debug!("Display unit {} -> {}", self.unit, unit);
        }
        self.unit = unit;
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn location(&self) -> &ResolvedLocation {
        &self.location
    }

    pub fn point(&self) -> Option<&GeoPoint> {
        self.point.as_ref()
    }

    pub fn station(&self) -> Option<&Station> {
        self.station.as_ref()
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    pub fn forecast(&self) -> &[ForecastPeriod] {
        &self.forecast
    }

    /// The page for the current unit, or `None` until the session is ready.
    pub fn report(&self, display: &DisplayConfig) -> Option<WeatherReport> {
        if self.state != SessionState::Ready {
            return None;
        }

        let inputs = ReportInputs {
            location: &self.location,
            point: self.point.as_ref()?,
            station: self.station.as_ref()?,
            observation: self.observation.as_ref()?,
            forecast: &self.forecast,
        };

        Some(WeatherReport::build(inputs, self.unit, display))
    }
}
