//! Location resolution: manual coordinates, then the platform location
//! service, then the configured fallback.

use localwx_core::{LocationConfig, WeatherError};
use std::time::Duration;

use crate::error::LocationError;
use crate::types::{Coordinates, ResolvedLocation};

/// Produces the single coordinate a session works with.
#[derive(Debug, Clone)]
pub struct LocationProvider {
    manual: Option<Coordinates>,
    use_device: bool,
    device_timeout: Duration,
    fallback: Coordinates,
}

impl LocationProvider {
    pub fn from_config(config: &LocationConfig) -> Result<Self, WeatherError> {
        let manual = config
            .manual_coordinates()
            .map(|(lat, lon)| Coordinates::new(lat, lon))
            .transpose()?;

        Ok(Self {
            manual,
            use_device: config.use_device,
            device_timeout: Duration::from_secs(config.device_timeout_secs),
            fallback: Coordinates::new(config.fallback_latitude, config.fallback_longitude)?,
        })
    }

    /// Override with explicit coordinates (e.g. from the command line).
    pub fn with_manual(mut self, coordinates: Coordinates) -> Self {
        self.manual = Some(coordinates);
        self
    }

    /// Resolve the location. Never fails: device problems fall back to the
    /// configured coordinate and mark the result as degraded.
    pub async fn locate(&self) -> ResolvedLocation {
        if let Some(coordinates) = self.manual {
            tracing::debug!("Using manual location {}", coordinates);
            return ResolvedLocation::manual(coordinates);
        }

        if self.use_device {
            match tokio::time::timeout(self.device_timeout, get_current_location()).await {
                Ok(Ok(location)) => {
                    tracing::info!("Got device location: {}", location.coordinates);
                    return location;
                }
                Ok(Err(e)) => tracing::warn!("Device location unavailable: {}", e),
                Err(_) => tracing::warn!("Device location unavailable: {}", LocationError::Timeout),
            }
        }

        tracing::warn!("Using fallback location {}", self.fallback);
        ResolvedLocation::fallback(self.fallback)
    }
}

/// Ask the platform location service for the current position.
pub async fn get_current_location() -> Result<ResolvedLocation, LocationError> {
    platform::current_location().await
}

#[cfg(target_os = "linux")]
mod platform {
    //! GeoClue2 over the system bus.

    use futures_util::StreamExt;
    use zbus::zvariant::OwnedObjectPath;
    use zbus::{proxy, Connection};

    use crate::error::LocationError;
    use crate::types::{Coordinates, LocationSource, ResolvedLocation};

    const DESKTOP_ID: &str = "localwx";
    // GClueAccuracyLevel::CITY
    const ACCURACY_LEVEL_CITY: u32 = 4;

    #[proxy(
        interface = "org.freedesktop.GeoClue2.Manager",
        default_service = "org.freedesktop.GeoClue2",
        default_path = "/org/freedesktop/GeoClue2/Manager"
    )]
    trait Manager {
        fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
    }

    #[proxy(
        interface = "org.freedesktop.GeoClue2.Client",
        default_service = "org.freedesktop.GeoClue2"
    )]
    trait Client {
        fn start(&self) -> zbus::Result<()>;

        fn stop(&self) -> zbus::Result<()>;

        #[zbus(property)]
        fn set_desktop_id(&self, id: &str) -> zbus::Result<()>;

        #[zbus(property)]
        fn set_requested_accuracy_level(&self, level: u32) -> zbus::Result<()>;

        #[zbus(signal)]
        fn location_updated(&self, old: OwnedObjectPath, new: OwnedObjectPath) -> zbus::Result<()>;
    }

    #[proxy(
        interface = "org.freedesktop.GeoClue2.Location",
        default_service = "org.freedesktop.GeoClue2"
    )]
    trait Location {
        #[zbus(property)]
        fn latitude(&self) -> zbus::Result<f64>;

        #[zbus(property)]
        fn longitude(&self) -> zbus::Result<f64>;

        #[zbus(property)]
        fn accuracy(&self) -> zbus::Result<f64>;
    }

    fn map_err(e: zbus::Error) -> LocationError {
        let message = e.to_string();
        if message.contains("AccessDenied") {
            LocationError::PermissionDenied
        } else if message.contains("ServiceUnknown") || message.contains("NameHasNoOwner") {
            LocationError::ServiceUnavailable
        } else {
            LocationError::Other(message)
        }
    }

    pub(super) async fn current_location() -> Result<ResolvedLocation, LocationError> {
        let conn = Connection::system().await.map_err(|e| {
            tracing::debug!("System bus unavailable: {}", e);
            LocationError::ServiceUnavailable
        })?;

        let manager = ManagerProxy::new(&conn).await.map_err(map_err)?;
        let client_path = manager.get_client().await.map_err(map_err)?;
        let client = ClientProxy::builder(&conn)
            .path(client_path.as_str())
            .map_err(map_err)?
            .build()
            .await
            .map_err(map_err)?;

        client.set_desktop_id(DESKTOP_ID).await.map_err(map_err)?;
        client
            .set_requested_accuracy_level(ACCURACY_LEVEL_CITY)
            .await
            .map_err(map_err)?;

        let mut updates = client.receive_location_updated().await.map_err(map_err)?;
        client.start().await.map_err(map_err)?;

        let result = match updates.next().await {
            Some(signal) => {
                let args = signal.args().map_err(map_err)?;
                read_location(&conn, args.new.as_str()).await
            }
            None => Err(LocationError::ServiceUnavailable),
        };

        if let Err(e) = client.stop().await {
            tracing::debug!("Failed to stop GeoClue client: {}", e);
        }

        result
    }

    async fn read_location(conn: &Connection, path: &str) -> Result<ResolvedLocation, LocationError> {
        let location = LocationProxy::builder(conn)
            .path(path)
            .map_err(map_err)?
            .build()
            .await
            .map_err(map_err)?;

        let latitude = location.latitude().await.map_err(map_err)?;
        let longitude = location.longitude().await.map_err(map_err)?;
        let accuracy = location.accuracy().await.ok();

        let coordinates = Coordinates::new(latitude, longitude)
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(ResolvedLocation {
            coordinates,
            source: LocationSource::Device,
            accuracy_meters: accuracy,
        })
    }
}

#[cfg(windows)]
mod platform {
    //! WinRT `Windows.Devices.Geolocation`.

    use windows::Devices::Geolocation::Geolocator;

    use crate::error::LocationError;
    use crate::types::{Coordinates, LocationSource, ResolvedLocation};

    // HRESULT E_ACCESSDENIED
    const E_ACCESSDENIED: u32 = 0x8007_0005;

    fn map_err(e: windows::core::Error) -> LocationError {
        if e.code().0 as u32 == E_ACCESSDENIED {
            LocationError::PermissionDenied
        } else {
            LocationError::Other(e.to_string())
        }
    }

    pub(super) async fn current_location() -> Result<ResolvedLocation, LocationError> {
        tokio::task::spawn_blocking(blocking_location)
            .await
            .map_err(|e| LocationError::Other(e.to_string()))?
    }

    fn blocking_location() -> Result<ResolvedLocation, LocationError> {
        let locator = Geolocator::new().map_err(map_err)?;
        let position = locator
            .GetGeopositionAsync()
            .map_err(map_err)?
            .get()
            .map_err(map_err)?;
        let coordinate = position.Coordinate().map_err(map_err)?;
        let basic = coordinate
            .Point()
            .map_err(map_err)?
            .Position()
            .map_err(map_err)?;

        let coordinates = Coordinates::new(basic.Latitude, basic.Longitude)
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(ResolvedLocation {
            coordinates,
            source: LocationSource::Device,
            accuracy_meters: coordinate.Accuracy().ok(),
        })
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
mod platform {
    use crate::error::LocationError;
    use crate::types::ResolvedLocation;

    pub(super) async fn current_location() -> Result<ResolvedLocation, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LocationSource;

    fn config() -> LocationConfig {
        LocationConfig {
            latitude: None,
            longitude: None,
            use_device: false,
            device_timeout_secs: 1,
            fallback_latitude: 37.77,
            fallback_longitude: -122.42,
        }
    }

    #[tokio::test]
    async fn test_fallback_when_device_disabled() {
        let provider = LocationProvider::from_config(&config()).unwrap();
        let location = provider.locate().await;

        assert_eq!(location.source, LocationSource::Fallback);
        assert!(location.is_degraded());
        assert_eq!(location.coordinates, Coordinates::new(37.77, -122.42).unwrap());
    }

    #[tokio::test]
    async fn test_manual_from_config() {
        let mut cfg = config();
        cfg.latitude = Some(47.61);
        cfg.longitude = Some(-122.33);
        cfg.use_device = true;

        let provider = LocationProvider::from_config(&cfg).unwrap();
        let location = provider.locate().await;

        assert_eq!(location.source, LocationSource::Manual);
        assert!(!location.is_degraded());
        assert_eq!(location.coordinates.latitude, 47.61);
    }

    #[tokio::test]
    async fn test_manual_override_wins() {
        let provider = LocationProvider::from_config(&config())
            .unwrap()
            .with_manual(Coordinates::new(40.71, -74.01).unwrap());
        let location = provider.locate().await;

        assert_eq!(location.source, LocationSource::Manual);
        assert_eq!(location.coordinates.longitude, -74.01);
    }

    #[tokio::test]
    async fn test_zero_device_timeout_falls_back() {
        let mut cfg = config();
        cfg.use_device = true;
        cfg.device_timeout_secs = 0;

        let location = LocationProvider::from_config(&cfg).unwrap().locate().await;
        assert_eq!(location.source, LocationSource::Fallback);
    }

    #[test]
    fn test_invalid_fallback_rejected() {
        let mut cfg = config();
        cfg.fallback_latitude = 120.0;
        assert!(LocationProvider::from_config(&cfg).is_err());
    }
}
