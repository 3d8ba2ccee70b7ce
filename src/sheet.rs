//! # Bottom sheet gestures
//!
//! Turns pointer and touch drags on the sheet's handle into a panel height
//! clamped to `[collapsed_height, max_height]`.
//!
//! The controller is synchronous and owns no platform listeners. Every entry
//! point returns a [`GestureResponse`] telling the host what to do: which
//! height to render, whether to suppress default scrolling, and whether to
//! attach or detach its document-level move/end listeners.
//!
//! Parents collapse the sheet through [`SheetCommands`], usually via a
//! cloned [`SheetHandle`].

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::error::{Result, RunmateError};

/// Height of the collapsed sheet (handle only), in px.
pub const COLLAPSED_HEIGHT: u32 = 32;
/// Height of the fully expanded sheet, in px.
pub const MAX_HEIGHT: u32 = 420;

/// Height limits for one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SheetConfig {
    pub collapsed_height: u32,
    pub max_height: u32,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            collapsed_height: COLLAPSED_HEIGHT,
            max_height: MAX_HEIGHT,
        }
    }
}

impl SheetConfig {
    pub fn new(collapsed_height: u32, max_height: u32) -> Result<Self> {
        if collapsed_height > max_height {
            return Err(RunmateError::Validation {
                message: format!(
                    "collapsed height {} exceeds max height {}",
                    collapsed_height, max_height
                ),
            });
        }
        Ok(Self {
            collapsed_height,
            max_height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// One pointer sample: the device kind and the client Y coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub kind: PointerKind,
    pub y: f64,
}

impl PointerInput {
    pub fn mouse(y: f64) -> Self {
        Self {
            kind: PointerKind::Mouse,
            y,
        }
    }

    pub fn touch(y: f64) -> Self {
        Self {
            kind: PointerKind::Touch,
            y,
        }
    }
}

/// Where a drag started. Only the handle starts a drag, so form controls in
/// the body stay usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum DragTarget {
    Handle,
    Body,
}

/// What the host should do with its document-level move/end listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ListenerChange {
    Unchanged,
    Attach,
    Detach,
}

/// Result of feeding one event to the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GestureResponse {
    /// Height to render
    pub height: u32,
    /// Call `preventDefault` on the platform event (touch moves while dragging)
    pub prevent_default: bool,
    pub listeners: ListenerChange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging { start_pointer_y: f64, start_height: u32 },
}

/// Drag state machine for one bottom sheet.
#[derive(Debug, Clone)]
pub struct BottomSheet {
    config: SheetConfig,
    height: u32,
    drag: DragState,
}

impl Default for BottomSheet {
    fn default() -> Self {
        Self::new(SheetConfig::default())
    }
}

impl BottomSheet {
    /// A collapsed, idle sheet.
    pub fn new(config: SheetConfig) -> Self {
        Self {
            config,
            height: config.collapsed_height,
            drag: DragState::Idle,
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn config(&self) -> SheetConfig {
        self.config
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn is_collapsed(&self) -> bool {
        self.height == self.config.collapsed_height
    }

    fn respond(&self, prevent_default: bool, listeners: ListenerChange) -> GestureResponse {
        GestureResponse {
            height: self.height,
            prevent_default,
            listeners,
        }
    }

    /// Pointer-down / touch-start.
    pub fn drag_start(&mut self, target: DragTarget, input: PointerInput) -> GestureResponse {
        if target != DragTarget::Handle || !input.y.is_finite() {
            return self.respond(false, ListenerChange::Unchanged);
        }

        // A second start without an end re-anchors the running session.
        let listeners = if self.is_dragging() {
            ListenerChange::Unchanged
        } else {
            ListenerChange::Attach
        };
        self.drag = DragState::Dragging {
            start_pointer_y: input.y,
            start_height: self.height,
        };
        debug!(
            "[BottomSheet] drag start at y={} height={}",
            input.y, self.height
        );
        self.respond(false, listeners)
    }

    /// Pointer-move / touch-move. Dragging upward grows the sheet.
    pub fn drag_move(&mut self, input: PointerInput) -> GestureResponse {
        let DragState::Dragging {
            start_pointer_y,
            start_height,
        } = self.drag
        else {
            return self.respond(false, ListenerChange::Unchanged);
        };

        let prevent_default = input.kind == PointerKind::Touch;
        if !input.y.is_finite() {
            return self.respond(prevent_default, ListenerChange::Unchanged);
        }

        let candidate = start_height as f64 + (start_pointer_y - input.y);
        self.height = candidate.round().clamp(
            self.config.collapsed_height as f64,
            self.config.max_height as f64,
        ) as u32;
        self.respond(prevent_default, ListenerChange::Unchanged)
    }

    /// Pointer-up / touch-end. The sheet stays where the drag left it.
    pub fn drag_end(&mut self) -> GestureResponse {
        if !self.is_dragging() {
            return self.respond(false, ListenerChange::Unchanged);
        }
        self.drag = DragState::Idle;
        debug!("[BottomSheet] drag end at height={}", self.height);
        self.respond(false, ListenerChange::Detach)
    }

    /// Force the sheet down to the collapsed height, ending any drag.
    pub fn collapse(&mut self) -> GestureResponse {
        let listeners = if self.is_dragging() {
            ListenerChange::Detach
        } else {
            ListenerChange::Unchanged
        };
        self.drag = DragState::Idle;
        self.height = self.config.collapsed_height;
        self.respond(false, listeners)
    }
}

// ============================================================================
// Command channel
// ============================================================================

/// Commands a parent screen may issue to a sheet it does not own.
pub trait SheetCommands: Send + Sync {
    fn collapse(&self) -> GestureResponse;
}

/// Shared handle to a [`BottomSheet`]. The sheet component and its parent
/// each hold a clone.
#[derive(Debug, Clone, Default)]
pub struct SheetHandle {
    inner: Arc<Mutex<BottomSheet>>,
}

impl SheetHandle {
    pub fn new(config: SheetConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BottomSheet::new(config))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BottomSheet> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn height(&self) -> u32 {
        self.lock().height()
    }

    pub fn is_dragging(&self) -> bool {
        self.lock().is_dragging()
    }

    pub fn drag_start(&self, target: DragTarget, input: PointerInput) -> GestureResponse {
        self.lock().drag_start(target, input)
    }

    pub fn drag_move(&self, input: PointerInput) -> GestureResponse {
        self.lock().drag_move(input)
    }

    pub fn drag_end(&self) -> GestureResponse {
        self.lock().drag_end()
    }
}

impl SheetCommands for SheetHandle {
    fn collapse(&self) -> GestureResponse {
        self.lock().collapse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_collapsed() {
        let sheet = BottomSheet::default();
        assert_eq!(sheet.height(), COLLAPSED_HEIGHT);
        assert!(!sheet.is_dragging());
        assert!(sheet.is_collapsed());
    }

    #[test]
    fn test_drag_grows_and_clamps() {
        let mut sheet = BottomSheet::default();
        let r = sheet.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
        assert_eq!(r.listeners, ListenerChange::Attach);

        assert_eq!(sheet.drag_move(PointerInput::mouse(400.0)).height, 132);
        assert_eq!(sheet.drag_move(PointerInput::mouse(0.0)).height, MAX_HEIGHT);
        assert_eq!(sheet.drag_move(PointerInput::mouse(900.0)).height, COLLAPSED_HEIGHT);

        let r = sheet.drag_end();
        assert_eq!(r.listeners, ListenerChange::Detach);
        assert_eq!(r.height, COLLAPSED_HEIGHT);
    }

    #[test]
    fn test_body_does_not_start_drag() {
        let mut sheet = BottomSheet::default();
        let r = sheet.drag_start(DragTarget::Body, PointerInput::touch(300.0));
        assert_eq!(r.listeners, ListenerChange::Unchanged);
        assert!(!sheet.is_dragging());

        // Moves without a drag session are ignored
        let r = sheet.drag_move(PointerInput::touch(100.0));
        assert_eq!(r.height, COLLAPSED_HEIGHT);
        assert!(!r.prevent_default);
    }

    #[test]
    fn test_touch_move_prevents_default() {
        let mut sheet = BottomSheet::default();
        sheet.drag_start(DragTarget::Handle, PointerInput::touch(300.0));
        let r = sheet.drag_move(PointerInput::touch(250.0));
        assert!(r.prevent_default);
        assert_eq!(r.height, 82);

        let r = sheet.drag_move(PointerInput::mouse(240.0));
        assert!(!r.prevent_default);
    }

    #[test]
    fn test_no_snap_on_release() {
        let mut sheet = BottomSheet::default();
        sheet.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
        sheet.drag_move(PointerInput::mouse(333.0));
        sheet.drag_end();
        assert_eq!(sheet.height(), 199);

        // Next drag starts from the current height
        sheet.drag_start(DragTarget::Handle, PointerInput::mouse(400.0));
        sheet.drag_move(PointerInput::mouse(390.0));
        assert_eq!(sheet.height(), 209);
    }

    #[test]
    fn test_collapse_during_drag() {
        let mut sheet = BottomSheet::default();
        sheet.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
        sheet.drag_move(PointerInput::mouse(300.0));

        let r = sheet.collapse();
        assert_eq!(r.height, COLLAPSED_HEIGHT);
        assert_eq!(r.listeners, ListenerChange::Detach);
        assert!(!sheet.is_dragging());

        // Late moves from the torn-down session do nothing
        assert_eq!(sheet.drag_move(PointerInput::mouse(0.0)).height, COLLAPSED_HEIGHT);

        let r = sheet.collapse();
        assert_eq!(r.height, COLLAPSED_HEIGHT);
        assert_eq!(r.listeners, ListenerChange::Unchanged);
    }

    #[test]
    fn test_non_finite_pointer_ignored() {
        let mut sheet = BottomSheet::default();
        sheet.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
        sheet.drag_move(PointerInput::mouse(450.0));
        sheet.drag_move(PointerInput::mouse(f64::NAN));
        assert_eq!(sheet.height(), 82);
    }

    #[test]
    fn test_config_validation() {
        assert!(SheetConfig::new(32, 420).is_ok());
        assert!(SheetConfig::new(500, 420).is_err());
    }

    #[test]
    fn test_handle_shares_state() {
        let handle = SheetHandle::new(SheetConfig::default());
        let parent = handle.clone();

        handle.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
        handle.drag_move(PointerInput::mouse(200.0));
        handle.drag_end();
        assert_eq!(parent.height(), 332);

        parent.collapse();
        assert_eq!(handle.height(), COLLAPSED_HEIGHT);
    }
}
