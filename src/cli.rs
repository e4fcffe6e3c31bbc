//! Command line arguments.

use clap::{Parser, ValueEnum};
use localwx_core::{Config, TemperatureUnit};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "localwx", version, about = "Current conditions and forecast from the National Weather Service")]
pub struct Args {
    /// Latitude in decimal degrees (requires --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees (requires --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Temperature unit; defaults to the configured unit
    #[arg(long, value_enum)]
    pub unit: Option<UnitArg>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Read c/f/a/q from stdin to switch units after the page is shown
    #[arg(long)]
    pub interactive: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the API root, e.g. for a local mirror
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Skip the platform location service
    #[arg(long)]
    pub no_device_location: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    Auto,
    Celsius,
    Fahrenheit,
}

impl From<UnitArg> for TemperatureUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Auto => TemperatureUnit::Auto,
            UnitArg::Celsius => TemperatureUnit::Celsius,
            UnitArg::Fahrenheit => TemperatureUnit::Fahrenheit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    /// Fold command line overrides into the loaded config.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(unit) = self.unit {
            config.display.temperature_unit = unit.into();
        }
        if self.no_device_location {
            config.location.use_device = false;
        }
    }

    pub fn manual_coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

/// One line of interactive input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Unit(TemperatureUnit),
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(Self::Quit),
            other => other.parse().ok().map(Self::Unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let args = Args::try_parse_from(["localwx", "--lat", "47.61", "--lon", "-122.33"]).unwrap();
        assert_eq!(args.manual_coordinates(), Some((47.61, -122.33)));
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_lat_requires_lon() {
        assert!(Args::try_parse_from(["localwx", "--lat", "47.61"]).is_err());
    }

    #[test]
    fn test_overrides_applied() {
        let args = Args::try_parse_from([
            "localwx",
            "--unit",
            "fahrenheit",
            "--base-url",
            "http://127.0.0.1:8080",
            "--no-device-location",
            "--format",
            "json",
        ])
        .unwrap();

        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.display.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080");
        assert!(!config.location.use_device);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_interactive_commands() {
        assert_eq!(Command::parse("c\n"), Some(Command::Unit(TemperatureUnit::Celsius)));
        assert_eq!(Command::parse(" F "), Some(Command::Unit(TemperatureUnit::Fahrenheit)));
        assert_eq!(Command::parse("a"), Some(Command::Unit(TemperatureUnit::Auto)));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("x"), None);
    }
}
