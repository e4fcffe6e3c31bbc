//! The rendered page: display strings only, built from a finished session.

use localwx_core::{DisplayConfig, TemperatureUnit};
use serde::Serialize;
use std::fmt;

use crate::format::{format_humidity, format_temperature, format_wind_speed, icon_uri, PLACEHOLDER};
use crate::types::{ForecastPeriod, GeoPoint, Observation, ResolvedLocation, Station};

const APPROXIMATE_SUFFIX: &str = "(approximate location)";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M %:z";

/// Everything the page shows, already formatted for `unit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: String,
    pub approximate: bool,
    pub unit: TemperatureUnit,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub summary: String,
    pub temperature: String,
    pub humidity: String,
    pub wind: String,
    pub station: String,
    pub observed_at: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSlot {
    pub name: String,
    pub temperature: String,
    pub short_forecast: String,
    pub wind: Option<String>,
    pub icon: Option<String>,
}

/// Borrowed inputs for [`WeatherReport::build`].
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub location: &'a ResolvedLocation,
    pub point: &'a GeoPoint,
    pub station: &'a Station,
    pub observation: &'a Observation,
    pub forecast: &'a [ForecastPeriod],
}

impl WeatherReport {
    pub fn build(inputs: ReportInputs<'_>, unit: TemperatureUnit, display: &DisplayConfig) -> Self {
        let ReportInputs {
            location,
            point,
            station,
            observation,
            forecast,
        } = inputs;

        let mut location_line = point.relative_location();
        if location.is_degraded() {
            location_line = format!("{} {}", location_line, APPROXIMATE_SUFFIX);
        }

        let summary = if observation.text_description.trim().is_empty() {
            PLACEHOLDER.to_string()
        } else {
            observation.text_description.clone()
        };

        let current = CurrentConditions {
            summary,
            temperature: format_temperature(
                observation.temperature.value,
                &observation.temperature.unit_code,
                unit,
            ),
            humidity: format_humidity(observation.relative_humidity.value),
            wind: format_wind_speed(
                observation.wind_speed.value,
                &observation.wind_speed.unit_code,
                unit,
            ),
            station: station.label(),
            observed_at: observation.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            icon: observation
                .icon
                .as_deref()
                .map(|raw| icon_uri(raw, Some(display.current_icon_size))),
        };

        let forecast = forecast
            .iter()
            .map(|period| ForecastSlot {
                name: period.name.clone(),
                temperature: format_temperature(period.temperature, &period.temperature_unit, unit),
                short_forecast: period.short_forecast.clone(),
                wind: forecast_wind(period),
                icon: period
                    .icon
                    .as_deref()
                    .map(|raw| icon_uri(raw, Some(display.forecast_icon_size))),
            })
            .collect();

        Self {
            location: location_line,
            approximate: location.is_degraded(),
            unit,
            current,
            forecast,
        }
    }
}

/// "10 mph NW"; the forecast reports wind as free text.
fn forecast_wind(period: &ForecastPeriod) -> Option<String> {
    match (&period.wind_speed, &period.wind_direction) {
        (Some(speed), Some(dir)) if !dir.is_empty() => Some(format!("{} {}", speed, dir)),
        (Some(speed), _) => Some(speed.clone()),
        (None, _) => None,
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = &self.current;

        writeln!(f, "{}", self.location)?;
        writeln!(f)?;
        writeln!(f, "Now: {}, {}", current.temperature, current.summary)?;
        writeln!(f, "  Humidity: {}", current.humidity)?;
        writeln!(f, "  Wind:     {}", current.wind)?;
        writeln!(f, "  Station:  {}", current.station)?;
        writeln!(f, "  Observed: {}", current.observed_at)?;
        if let Some(icon) = &current.icon {
            writeln!(f, "  Icon:     {}", icon)?;
        }

        if !self.forecast.is_empty() {
            writeln!(f)?;
            writeln!(f, "Forecast:")?;
        }
        for slot in &self.forecast {
            write!(f, "  {:<16} {:>6}  {}", slot.name, slot.temperature, slot.short_forecast)?;
            if let Some(wind) = &slot.wind {
                write!(f, " ({})", wind)?;
            }
            writeln!(f)?;
            if let Some(icon) = &slot.icon {
                writeln!(f, "  {:<16} {}", "", icon)?;
            }
        }

        writeln!(f)?;
        write!(f, "Units: {}", self.unit)
    }
}
