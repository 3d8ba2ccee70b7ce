//! Device position for seeding the map center and the nearby list.
//!
//! The platform supplies a [`PositionSource`]; [`GeolocationProvider`] turns
//! it into the `{ location, error, is_loading }` state the screens read.
//! Failures become an error message, never a retry; the user refetches.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};

use crate::config::Config;
use crate::error::{Result, RunmateError};
use crate::GeoPoint;

/// Seoul City Hall. Used when the fixed location is configured and as the
/// fallback map center.
pub const DEFAULT_LOCATION: GeoPoint = GeoPoint {
    latitude: 37.5642,
    longitude: 127.0017,
};

pub const UNSUPPORTED_MESSAGE: &str = "This device does not support location services.";

/// Platform position lookup (GPS, browser API, ...).
pub trait PositionSource: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    fn current_position(&self) -> impl Future<Output = Result<GeoPoint>> + Send;
}

/// Always reports the same point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPositionSource(pub GeoPoint);

impl Default for FixedPositionSource {
    fn default() -> Self {
        Self(DEFAULT_LOCATION)
    }
}

impl PositionSource for FixedPositionSource {
    async fn current_position(&self) -> Result<GeoPoint> {
        Ok(self.0)
    }
}

/// Snapshot read by the screens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeolocationState {
    pub location: Option<GeoPoint>,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl GeolocationState {
    /// Longitude, as the backend's `x`.
    pub fn x(&self) -> Option<f64> {
        self.location.map(|p| p.longitude)
    }

    /// Latitude, as the backend's `y`.
    pub fn y(&self) -> Option<f64> {
        self.location.map(|p| p.latitude)
    }
}

#[derive(Debug)]
pub struct GeolocationProvider<S> {
    source: S,
    use_fixed: bool,
    state: Mutex<GeolocationState>,
}

impl<S: PositionSource> GeolocationProvider<S> {
    pub fn new(source: S) -> Self {
        Self::build(source, false)
    }

    /// Honors `use_fixed_location`: when set, the source is never queried.
    pub fn with_config(source: S, config: &Config) -> Self {
        Self::build(source, config.use_fixed_location)
    }

    fn build(source: S, use_fixed: bool) -> Self {
        let supported = use_fixed || source.is_supported();
        let state = GeolocationState {
            location: None,
            error: (!supported).then(|| UNSUPPORTED_MESSAGE.to_string()),
            is_loading: supported,
        };
        Self {
            source,
            use_fixed,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GeolocationState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> GeolocationState {
        self.lock().clone()
    }

    /// Last known location, or [`DEFAULT_LOCATION`].
    pub fn location_or_default(&self) -> GeoPoint {
        self.lock().location.unwrap_or(DEFAULT_LOCATION)
    }

    /// Ask the source again. A failure keeps the previous location.
    pub async fn refetch(&self) -> GeolocationState {
        if self.use_fixed {
            let mut state = self.lock();
            state.location = Some(DEFAULT_LOCATION);
            state.error = None;
            state.is_loading = false;
            return state.clone();
        }

        if !self.source.is_supported() {
            return self.state();
        }

        self.lock().is_loading = true;
        let result = self.source.current_position().await;

        let mut state = self.lock();
        state.is_loading = false;
        match result {
            Ok(point) => {
                debug!(
                    "[Geolocation] position {:.4}, {:.4}",
                    point.latitude, point.longitude
                );
                state.location = Some(point);
                state.error = None;
            }
            Err(e) => {
                warn!("[Geolocation] lookup failed: {}", e);
                state.error = Some(match e {
                    RunmateError::Geolocation { message } => message,
                    other => other.to_string(),
                });
            }
        }
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Unsupported;

    impl PositionSource for Unsupported {
        fn is_supported(&self) -> bool {
            false
        }

        async fn current_position(&self) -> Result<GeoPoint> {
            unreachable!("unsupported source is never queried")
        }
    }

    /// Fails on the first call, succeeds afterwards.
    struct Flaky(AtomicU32);

    impl PositionSource for Flaky {
        async fn current_position(&self) -> Result<GeoPoint> {
            if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RunmateError::Geolocation {
                    message: "User denied Geolocation".to_string(),
                })
            } else {
                Ok(GeoPoint::new(36.79, 127.1))
            }
        }
    }

    #[tokio::test]
    async fn test_fixed_source() {
        let provider = GeolocationProvider::new(FixedPositionSource::default());
        assert!(provider.state().is_loading);

        let state = provider.refetch().await;
        assert_eq!(state.location, Some(DEFAULT_LOCATION));
        assert_eq!(state.x(), Some(127.0017));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let provider = GeolocationProvider::new(Unsupported);
        let state = provider.refetch().await;
        assert_eq!(state.error.as_deref(), Some(UNSUPPORTED_MESSAGE));
        assert!(!state.is_loading);
        assert_eq!(provider.location_or_default(), DEFAULT_LOCATION);
    }

    #[tokio::test]
    async fn test_error_then_refetch() {
        let provider = GeolocationProvider::new(Flaky(AtomicU32::new(0)));

        let state = provider.refetch().await;
        assert_eq!(state.error.as_deref(), Some("User denied Geolocation"));
        assert!(state.location.is_none());

        let state = provider.refetch().await;
        assert!(state.error.is_none());
        assert_eq!(state.y(), Some(36.79));
    }

    #[tokio::test]
    async fn test_config_forces_fixed_location() {
        let config = Config::mock().with_fixed_location(true);
        let provider = GeolocationProvider::with_config(Unsupported, &config);
        assert!(provider.state().error.is_none());

        let state = provider.refetch().await;
        assert_eq!(state.location, Some(DEFAULT_LOCATION));
    }
}
