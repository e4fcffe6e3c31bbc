use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

use crate::error::ConfigError;

/// National Weather Service API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.weather.gov";
/// Coordinate used when no device location is available (San Francisco).
pub const DEFAULT_FALLBACK_LATITUDE: f64 = 37.77;
pub const DEFAULT_FALLBACK_LONGITUDE: f64 = -122.42;

const CONFIG_DIR_NAME: &str = "localwx";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Temperature display preference.
///
/// `Auto` shows each value in the unit the API reported it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "a" => Ok(Self::Auto),
            "celsius" | "c" => Ok(Self::Celsius),
            "fahrenheit" | "f" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit '{}'", other)),
        }
    }
}

/// Icon size requested from the icon service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconSize {
    Small,
    Medium,
    Large,
}

impl IconSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for IconSize {
    type Err = String;

    /// Accepts `small`/`s`, `medium`/`m`, `large`/`l` in any case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" | "s" => Ok(Self::Small),
            "medium" | "m" => Ok(Self::Medium),
            "large" | "l" => Ok(Self::Large),
            other => Err(format!("unknown icon size '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Weather API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the coordinates come from
    #[serde(default)]
    pub location: LocationConfig,

    /// Display preferences
    #[serde(default)]
    pub display: DisplayConfig,

    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the points/stations API
    pub base_url: String,

    /// The NWS rejects requests without an identifying User-Agent
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: concat!("localwx/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Fixed latitude; when set together with `longitude` no lookup happens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Ask the platform location service first
    pub use_device: bool,

    /// Give up on the device lookup after this many seconds
    pub device_timeout_secs: u64,

    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            use_device: true,
            device_timeout_secs: 10,
            fallback_latitude: DEFAULT_FALLBACK_LATITUDE,
            fallback_longitude: DEFAULT_FALLBACK_LONGITUDE,
        }
    }
}

impl LocationConfig {
    /// Manual coordinates, only when both halves are configured.
    pub fn manual_coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub temperature_unit: TemperatureUnit,
    pub current_icon_size: IconSize,
    pub forecast_icon_size: IconSize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Auto,
            current_icon_size: IconSize::Large,
            forecast_icon_size: IconSize::Small,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            location: LocationConfig::default(),
            display: DisplayConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the user config dir, creating a default file if missing.
    ///
    /// A config dir that cannot be determined or written is not fatal: the
    /// defaults are used for this run.
    pub fn load() -> std::result::Result<Self, ConfigError> {
        match Self::config_path() {
            Ok(path) => Self::load_or_create(&path),
            Err(e) => {
                tracing::warn!("{:#}; using default config", e);
                Ok(Self::default())
            }
        }
    }

    /// Load `path`, writing defaults there first when it does not exist.
    pub fn load_or_create(path: &Path) -> std::result::Result<Self, ConfigError> {
        if path.exists() {
            return Self::load_from(path);
        }

        let config = Self::default();
        match config.save_to(path) {
            Ok(()) => tracing::info!("Wrote default config to {}", path.display()),
            Err(e) => tracing::warn!(
                "Could not write default config to {}: {:#}; using defaults",
                path.display(),
                e
            ),
        }
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> std::result::Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.display().to_string())
            } else {
                ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
            }
        })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Load (from `path`, or the default location) and validate.
    pub fn load_validated(
        path: Option<&Path>,
    ) -> std::result::Result<(Self, ValidationResult), ConfigError> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.ensure_valid()?;
        Ok((config, validation))
    }

    /// Validate, logging warnings. Errors become [`ConfigError::Invalid`].
    pub fn ensure_valid(&self) -> std::result::Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        Ok(validation)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);

        if self.api.user_agent.trim().is_empty() {
            result.add_error(
                "api.user_agent",
                "User agent must not be empty; the weather API rejects anonymous requests",
            );
        }

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        } else if self.api.timeout_secs > 300 {
            result.add_warning("api.timeout_secs", "Timeout is unusually long (>300s)");
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                validate_coordinate(lat, lon, "location", &mut result);
            }
            (None, None) => {}
            _ => result.add_warning(
                "location",
                "Only one of latitude/longitude is set; manual location ignored",
            ),
        }

        validate_coordinate(
            self.location.fallback_latitude,
            self.location.fallback_longitude,
            "location.fallback",
            &mut result,
        );

        if self.location.use_device && self.location.device_timeout_secs == 0 {
            result.add_warning(
                "location.device_timeout_secs",
                "Device location timeout is 0; the fallback will always be used",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.scheme() == "http" {
                    result.add_warning(field_name, "Plain http is only meant for testing");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the default configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }
}

fn validate_coordinate(lat: f64, lon: f64, field: &str, result: &mut ValidationResult) {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        result.add_error(
            format!("{}.latitude", field),
            format!("Latitude must be within [-90, 90], got {}", lat),
        );
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        result.add_error(
            format!("{}.longitude", field),
            format!("Longitude must be within [-180, 180], got {}", lon),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.api.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://api.weather.gov".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_http_scheme_is_warning() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:8080".to_string();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "api.base_url"));
    }

    #[test]
    fn test_empty_user_agent() {
        let mut config = Config::default();
        config.api.user_agent = "  ".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.user_agent"));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_out_of_range_manual_location() {
        let mut config = Config::default();
        config.location.latitude = Some(91.0);
        config.location.longitude = Some(10.0);
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "location.latitude"));
    }

    #[test]
    fn test_half_manual_location_is_warning() {
        let mut config = Config::default();
        config.location.latitude = Some(40.0);
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "location"));
        assert_eq!(config.location.manual_coordinates(), None);
    }

    #[test]
    fn test_invalid_fallback() {
        let mut config = Config::default();
        config.location.fallback_longitude = f64::NAN;
        let result = config.validate();
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "location.fallback.longitude"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_temperature_unit_parse() {
        assert_eq!("F".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("celsius".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
        assert_eq!("Auto".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Auto));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn test_icon_size_aliases() {
        assert_eq!("s".parse::<IconSize>(), Ok(IconSize::Small));
        assert_eq!("Medium".parse::<IconSize>(), Ok(IconSize::Medium));
        assert_eq!("L".parse::<IconSize>(), Ok(IconSize::Large));
        assert!("xl".parse::<IconSize>().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.location.latitude = Some(47.61);
        config.location.longitude = Some(-122.33);
        config.display.temperature_unit = TemperatureUnit::Celsius;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.location.manual_coordinates(), Some((47.61, -122.33)));
        assert_eq!(loaded.display.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(loaded.api.base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\ntemperature_unit = \"fahrenheit\"\ncurrent_icon_size = \"medium\"\nforecast_icon_size = \"small\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.display.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(config.display.current_icon_size, IconSize::Medium);
        assert_eq!(config.log_level, "warn");
        assert!(config.location.use_device);
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[location]\nlatitude = 47.61\nlongitude = -122.33\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.location.manual_coordinates(), Some((47.61, -122.33)));
        assert_eq!(config.location.fallback_latitude, DEFAULT_FALLBACK_LATITUDE);
        assert_eq!(config.location.device_timeout_secs, 10);
    }

    #[test]
    fn test_load_validated_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"nope\"\nuser_agent = \"x\"\ntimeout_secs = 5\n").unwrap();

        let err = Config::load_validated(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
    }

    #[test]
    fn test_ensure_valid_keeps_warnings() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:8080".to_string();

        let validation = config.ensure_valid().unwrap();
        assert!(validation.is_valid());
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_missing_explicit_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localwx").join("config.toml");

        let config = Config::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_unwritable_config_dir_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the config directory should be
        let blocker = dir.path().join("localwx");
        std::fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("config.toml");

        let config = Config::load_or_create(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert!(config.location.use_device);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
