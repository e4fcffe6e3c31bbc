//! Unit conversion and display formatting. Pure functions, no I/O.

use localwx_core::{IconSize, TemperatureUnit};
use thiserror::Error;

/// Shown wherever a value was not reported.
pub const PLACEHOLDER: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Unknown temperature unit code '{0}'")]
    UnknownUnit(String),
}

/// Unit a temperature was reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceUnit {
    Celsius,
    Fahrenheit,
}

impl SourceUnit {
    /// Parse `degC`, `wmoUnit:degF`, `C`, `fahrenheit`, ... (case-insensitive).
    pub fn parse(code: &str) -> Option<Self> {
        let bare = strip_namespace(code);
        match bare.to_ascii_lowercase().as_str() {
            "degc" | "c" | "celsius" => Some(Self::Celsius),
            "degf" | "f" | "fahrenheit" => Some(Self::Fahrenheit),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

/// `wmoUnit:degC` -> `degC`
fn strip_namespace(code: &str) -> &str {
    code.rsplit(':').next().unwrap_or(code).trim()
}

/// Unit a value reported in `source` is displayed in.
pub fn display_unit(source: SourceUnit, target: TemperatureUnit) -> SourceUnit {
    match target {
        TemperatureUnit::Auto => source,
        TemperatureUnit::Celsius => SourceUnit::Celsius,
        TemperatureUnit::Fahrenheit => SourceUnit::Fahrenheit,
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> i64 {
    (celsius * 9.0 / 5.0 + 32.0).round() as i64
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> i64 {
    ((fahrenheit - 32.0) * 5.0 / 9.0).round() as i64
}

/// Convert `value` (in the unit named by `unit_code`) for display in `target`,
/// rounded to the nearest degree. Each direction rounds once from the raw value.
pub fn convert_temp(value: f64, unit_code: &str, target: TemperatureUnit) -> Result<i64, FormatError> {
    let source =
        SourceUnit::parse(unit_code).ok_or_else(|| FormatError::UnknownUnit(unit_code.to_string()))?;

    Ok(convert_from(value, source, target))
}

fn convert_from(value: f64, source: SourceUnit, target: TemperatureUnit) -> i64 {
    match (source, display_unit(source, target)) {
        (SourceUnit::Celsius, SourceUnit::Fahrenheit) => celsius_to_fahrenheit(value),
        (SourceUnit::Fahrenheit, SourceUnit::Celsius) => fahrenheit_to_celsius(value),
        _ => value.round() as i64,
    }
}

/// "72°F", "22°C", or the placeholder when the value is missing.
///
/// An unrecognised unit code is shown verbatim next to the rounded value
/// instead of failing the whole page.
pub fn format_temperature(value: Option<f64>, unit_code: &str, target: TemperatureUnit) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };

    match SourceUnit::parse(unit_code) {
        Some(source) => format!(
            "{}{}",
            convert_from(value, source, target),
            display_unit(source, target).symbol()
        ),
        None => {
            tracing::debug!("Unrecognised temperature unit code: {}", unit_code);
            format!("{} {}", value.round() as i64, strip_namespace(unit_code))
        }
    }
}

/// Relative humidity rounded to a whole percent.
pub fn format_humidity(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}%", v.round() as i64),
        None => PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeedUnit {
    KilometersPerHour,
    MetersPerSecond,
    MilesPerHour,
    Knots,
}

impl SpeedUnit {
    fn parse(code: &str) -> Option<Self> {
        match strip_namespace(code).to_ascii_lowercase().as_str() {
            "km_h-1" | "km/h" | "kph" => Some(Self::KilometersPerHour),
            "m_s-1" | "m/s" => Some(Self::MetersPerSecond),
            "mi_h-1" | "mph" => Some(Self::MilesPerHour),
            "kt" | "kn" | "knots" => Some(Self::Knots),
            _ => None,
        }
    }

    fn to_kmh(self, value: f64) -> f64 {
        match self {
            Self::KilometersPerHour => value,
            Self::MetersPerSecond => value * 3.6,
            Self::MilesPerHour => value * 1.609_344,
            Self::Knots => value * 1.852,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::KilometersPerHour => "km/h",
            Self::MetersPerSecond => "m/s",
            Self::MilesPerHour => "mph",
            Self::Knots => "kt",
        }
    }
}

/// Wind speed in km/h for Celsius, mph for Fahrenheit, as reported for `Auto`.
pub fn format_wind_speed(value: Option<f64>, unit_code: &str, target: TemperatureUnit) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };

    let Some(source) = SpeedUnit::parse(unit_code) else {
        return format!("{} {}", value.round() as i64, strip_namespace(unit_code));
    };

    let (shown, unit) = match target {
        TemperatureUnit::Auto => (value, source),
        TemperatureUnit::Celsius => (source.to_kmh(value), SpeedUnit::KilometersPerHour),
        TemperatureUnit::Fahrenheit => (source.to_kmh(value) / 1.609_344, SpeedUnit::MilesPerHour),
    };

    format!("{} {}", shown.round() as i64, unit.label())
}

/// Drop any query string from an icon URI and request `size` instead.
/// Without a size the bare URI is returned.
pub fn icon_uri(raw: &str, size: Option<IconSize>) -> String {
    let unsized_uri = raw.split('?').next().unwrap_or(raw);

    match size {
        Some(size) => format!("{}?size={}", unsized_uri, size.as_str()),
        None => unsized_uri.to_string(),
    }
}
