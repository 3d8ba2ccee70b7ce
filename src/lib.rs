//! # Runmate Core
//!
//! Headless client core for a group-running app. The UI layer (pages, map
//! SDK, styling) lives on the host side; this crate keeps the state that has
//! real rules behind it.
//!
//! This library provides:
//! - A map search controller that refetches session markers for the visible
//!   viewport, de-duplicating identical requests and composing filters
//! - A bottom sheet gesture controller with a clamped, drag-driven height
//! - Typed API modules with a mock and a real (REST) backend, selected by
//!   configuration at construction time
//! - Pace, route and form-validation helpers used by the session screens
//!
//! ## Features
//!
//! - **`http`** - Enable the REST backend and place-name lookup (default)
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use runmate::{BottomSheet, SheetConfig, DragTarget, PointerInput};
//!
//! let mut sheet = BottomSheet::new(SheetConfig::default());
//! sheet.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
//! sheet.drag_move(PointerInput::mouse(400.0));
//! assert_eq!(sheet.height(), 132);
//! sheet.drag_end();
//! ```

use rstar::AABB;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, RunmateError};

// Configuration (mock/real switch, endpoints, timeouts)
pub mod config;
pub use config::Config;

// Backend payload types
pub mod types;

// API traits with mock and REST backends
pub mod api;
pub use api::{
    AuthApi, Backend, ManageApi, MockBackend, MyPageApi, NearbyApi, SearchApi, SessionApi,
};
#[cfg(feature = "http")]
pub use api::HttpBackend;

// Map bounds search controller
pub mod search;
pub use search::{FetchOutcome, FilterId, FilterSet, Marker, SearchController, SearchParams};

// Bottom sheet gesture controller
pub mod sheet;
pub use sheet::{
    BottomSheet, DragTarget, GestureResponse, ListenerChange, PointerInput, PointerKind,
    SheetCommands, SheetConfig, SheetHandle,
};

// Geolocation provider
pub mod geolocation;
pub use geolocation::{FixedPositionSource, GeolocationProvider, GeolocationState, PositionSource};

// Pace and display formatting
pub mod pace;

// Form validation
pub mod validation;
pub use validation::{FieldErrors, SessionForm, SignupForm};

// Drawn route for session creation
pub mod route;
pub use route::{LocationFormData, RouteDraft};

// Host session management (attendance, evaluation)
pub mod manage;
pub use manage::{HostEvaluationDraft, JoinRequestBoard, ManageFlow, ManageStep};

// Logged-in user state
pub mod auth;
pub use auth::{AuthSession, LoginError};

// Nearest place name for a coordinate
#[cfg(feature = "http")]
pub mod places;
#[cfg(feature = "http")]
pub use places::PlaceNameResolver;

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("runmate"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use runmate::GeoPoint;
/// let point = GeoPoint::new(37.5642, 127.0017); // Seoul City Hall
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GeoPoint {
    #[serde(alias = "lat", alias = "y")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "x")]
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// `[lng, lat]`, the axis order used by the spatial index.
    pub(crate) fn as_xy(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// The rectangular lat/lng region currently visible on the map.
///
/// Always holds finite values with `min <= max` on both axes; a zero-area box
/// is allowed and left to the backend to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting non-finite or inverted coordinates.
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Result<Self> {
        let values = [min_lng, min_lat, max_lng, max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RunmateError::InvalidBounds {
                message: format!("non-finite coordinate in {:?}", values),
            });
        }
        if min_lng > max_lng {
            return Err(RunmateError::InvalidBounds {
                message: format!("min_lng {} > max_lng {}", min_lng, max_lng),
            });
        }
        if min_lat > max_lat {
            return Err(RunmateError::InvalidBounds {
                message: format!("min_lat {} > max_lat {}", min_lat, max_lat),
            });
        }
        Ok(Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        })
    }

    /// Build from the south-west and north-east corners a map widget reports.
    pub fn from_corners(south_west: GeoPoint, north_east: GeoPoint) -> Result<Self> {
        Self::new(
            south_west.longitude,
            south_west.latitude,
            north_east.longitude,
            north_east.latitude,
        )
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// True when the point lies inside or on the edge of the box.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
            && point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
    }

    /// Envelope for R-tree queries (`[lng, lat]` axes).
    pub fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}
