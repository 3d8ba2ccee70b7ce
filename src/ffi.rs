//! FFI bindings for mobile platforms (iOS/Android).
//!
//! The bottom sheet is exposed as an object so the native view can feed it
//! raw pointer events; the rest are stateless helpers. Functions that would
//! clash with the internal API are prefixed with `ffi_`.

use std::sync::Arc;

use log::debug;

use crate::pace;
use crate::route::RouteDraft;
use crate::sheet::{
    DragTarget, GestureResponse, PointerInput, PointerKind, SheetCommands, SheetConfig,
    SheetHandle,
};
use crate::types::{GenderPolicy, RunType};
use crate::{init_logging, BoundingBox, GeoPoint};

// ============================================================================
// Bottom sheet
// ============================================================================

/// A bottom sheet driven from native touch/mouse handlers.
#[derive(Debug, uniffi::Object)]
pub struct BottomSheetController {
    handle: SheetHandle,
}

#[uniffi::export]
impl BottomSheetController {
    #[uniffi::constructor]
    pub fn new(config: SheetConfig) -> Arc<Self> {
        init_logging();
        debug!(
            "[BottomSheetFfi] new sheet {}..{}",
            config.collapsed_height, config.max_height
        );
        Arc::new(Self {
            handle: SheetHandle::new(config),
        })
    }

    pub fn height(&self) -> u32 {
        self.handle.height()
    }

    pub fn is_dragging(&self) -> bool {
        self.handle.is_dragging()
    }

    pub fn drag_start(&self, target: DragTarget, kind: PointerKind, y: f64) -> GestureResponse {
        self.handle.drag_start(target, PointerInput { kind, y })
    }

    pub fn drag_move(&self, kind: PointerKind, y: f64) -> GestureResponse {
        self.handle.drag_move(PointerInput { kind, y })
    }

    pub fn drag_end(&self) -> GestureResponse {
        self.handle.drag_end()
    }

    pub fn collapse(&self) -> GestureResponse {
        SheetCommands::collapse(&self.handle)
    }
}

/// Default sheet limits (32..420 px).
#[uniffi::export]
pub fn default_sheet_config() -> SheetConfig {
    SheetConfig::default()
}

// ============================================================================
// Map helpers
// ============================================================================

/// Validated viewport bounds from the map's south-west/north-east corners.
#[uniffi::export]
pub fn ffi_bounds_from_corners(south_west: GeoPoint, north_east: GeoPoint) -> Option<BoundingBox> {
    BoundingBox::from_corners(south_west, north_east).ok()
}

/// Length of a drawn route in km (two decimals). Invalid points are skipped.
#[uniffi::export]
pub fn ffi_route_distance_km(points: Vec<GeoPoint>) -> f64 {
    let mut draft = RouteDraft::new();
    for point in points {
        let _ = draft.push(point);
    }
    draft.distance_km()
}

// ============================================================================
// Pace and labels
// ============================================================================

#[uniffi::export]
pub fn ffi_pace_string_to_seconds(value: String) -> Option<u32> {
    pace::pace_string_to_seconds(&value)
}

#[uniffi::export]
pub fn ffi_seconds_to_pace_string(total_seconds: u32) -> String {
    pace::seconds_to_pace_string(total_seconds)
}

#[uniffi::export]
pub fn ffi_format_pace_display(value: String) -> String {
    pace::format_pace_display(&value)
}

#[uniffi::export]
pub fn gender_policy_label(policy: GenderPolicy) -> String {
    policy.label().to_string()
}

#[uniffi::export]
pub fn run_type_label(run_type: RunType) -> String {
    run_type.label().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::ListenerChange;

    #[test]
    fn test_controller_round_trip() {
        let sheet = BottomSheetController::new(default_sheet_config());
        let r = sheet.drag_start(DragTarget::Handle, PointerKind::Touch, 500.0);
        assert_eq!(r.listeners, ListenerChange::Attach);
        assert!(sheet.drag_move(PointerKind::Touch, 400.0).prevent_default);
        assert_eq!(sheet.height(), 132);
        assert_eq!(sheet.collapse().listeners, ListenerChange::Detach);
        assert_eq!(sheet.height(), 32);
    }

    #[test]
    fn test_route_distance_skips_invalid_points() {
        let km = ffi_route_distance_km(vec![
            GeoPoint::new(37.0, 127.0),
            GeoPoint::new(f64::NAN, 127.0),
            GeoPoint::new(38.0, 127.0),
        ]);
        assert!((km - 111.19).abs() < 0.1);
    }

    #[test]
    fn test_bounds_from_inverted_corners() {
        let sw = GeoPoint::new(37.6, 127.1);
        let ne = GeoPoint::new(37.5, 127.0);
        assert!(ffi_bounds_from_corners(sw, ne).is_none());
        assert!(ffi_bounds_from_corners(ne, sw).is_some());
    }
}
