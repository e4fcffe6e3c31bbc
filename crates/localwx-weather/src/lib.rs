//! Weather lookup for localwx
//!
//! Resolves a location, then walks the National Weather Service API
//! (point, station, latest observation, forecast) and turns the result into
//! a page of display strings.

pub mod client;
pub mod error;
pub mod format;
pub mod location;
pub mod report;
pub mod session;
pub mod types;

pub use client::NwsClient;
pub use error::{FetchError, LocationError, Stage};
pub use localwx_core::{IconSize, TemperatureUnit};
pub use location::{get_current_location, LocationProvider};
pub use report::{CurrentConditions, ForecastSlot, WeatherReport};
pub use session::{SessionState, WeatherSession};
pub use types::*;
