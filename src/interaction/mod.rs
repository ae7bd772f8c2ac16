//! Pointer, wheel and touch gesture state.
//!
//! This module holds only state and pure pan/zoom math. The engine feeds it
//! events and applies the resulting offsets (see `api::interaction_controller`).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Extent, Point, TimeRange, max_pan_offset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    Idle,
    Panning,
    PinchZooming,
    /// Sticky crosshair toggled by a long press on touch surfaces.
    TouchCrosshair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

/// One active contact, in plot-local logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    #[must_use]
    pub const fn new(id: u64, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

/// Contacts currently on the surface. Gestures rarely exceed four fingers.
pub type TouchList = SmallVec<[TouchPoint; 4]>;

/// Distance and midpoint of the first two contacts.
#[must_use]
pub fn pinch_geometry(touches: &[TouchPoint]) -> Option<(f64, (f64, f64))> {
    let [a, b, ..] = touches else {
        return None;
    };
    let distance = (a.x - b.x).hypot(a.y - b.y);
    Some((distance, ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)))
}

/// Crosshair state exposed to host applications for tooltips.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CrosshairState {
    pub visible: bool,
    pub x: f64,
    /// Pointer y clamped to the plot height.
    pub pointer_y: f64,
    /// Time of the snapped sample.
    pub time: Option<i64>,
    pub point: Option<Point>,
    /// Value under `pointer_y` in the visible extent.
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartClickKind {
    /// Mouse or pen released without panning.
    Click,
    /// Tap while the touch crosshair is active.
    TouchClick,
}

/// Click on the plot resolved to the nearest sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartClick {
    pub kind: ChartClickKind,
    pub x: f64,
    pub y: f64,
    pub point: Point,
}

/// Zoom and pan limits for the current geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanZoomBounds {
    pub full_extent: Extent,
    pub range: TimeRange,
    pub width: f64,
    pub max_zoom: f64,
}

impl PanZoomBounds {
    #[must_use]
    pub fn clamp_zoom(self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(1.0, self.max_zoom.max(1.0))
        } else {
            1.0
        }
    }

    #[must_use]
    pub fn max_pan(self, zoom: f64) -> f64 {
        max_pan_offset(self.full_extent, self.range, self.width, zoom)
    }

    #[must_use]
    pub fn clamp_pan(self, pan: f64, zoom: f64) -> f64 {
        if pan.is_finite() {
            pan.clamp(0.0, self.max_pan(zoom))
        } else {
            0.0
        }
    }

    /// Pan offset after dragging by `dx` pixels: `pan - dx / zoom`, clamped.
    #[must_use]
    pub fn pan_by(self, pan: f64, zoom: f64, dx: f64) -> f64 {
        self.clamp_pan(pan - dx / zoom, zoom)
    }

    /// Zooms by `factor` keeping the time under `anchor_x` fixed on screen.
    ///
    /// Returns the new `(zoom, pan)`. The anchor drifts only when the pan
    /// offset has to be clamped.
    #[must_use]
    pub fn zoom_at(self, zoom: f64, pan: f64, factor: f64, anchor_x: f64) -> (f64, f64) {
        let extent = self.full_extent;
        let anchor_time = extent.x_to_time(anchor_x, self.width, zoom, pan);
        let new_zoom = self.clamp_zoom(zoom * factor);
        let unclamped = (anchor_time - extent.x_min) / extent.x_span() * self.width
            - anchor_x / new_zoom;
        (new_zoom, self.clamp_pan(unclamped, new_zoom))
    }
}

/// Pending long-press toggle, expressed as a deadline on the host clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LongPressTimer {
    deadline_ms: Option<u64>,
    x: f64,
    y: f64,
}

impl LongPressTimer {
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64, x: f64, y: f64) {
        self.deadline_ms = Some(now_ms.saturating_add(delay_ms));
        self.x = x;
        self.y = y;
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    #[must_use]
    pub fn is_pending(self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Fires once when `now_ms` reaches the deadline, returning the press
    /// position.
    pub fn poll(&mut self, now_ms: u64) -> Option<(f64, f64)> {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                Some((self.x, self.y))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionState {
    drag_mode: DragMode,
    touches: TouchList,
    last_pointer_x: Option<f64>,
    panned: bool,
    last_pinch_distance: Option<f64>,
    touch_crosshair: bool,
    long_press: LongPressTimer,
    crosshair: CrosshairState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DragMode {
    #[default]
    Idle,
    Panning,
    Pinching,
}

impl InteractionState {
    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        if self.touch_crosshair {
            return InteractionMode::TouchCrosshair;
        }
        match self.drag_mode {
            DragMode::Idle => InteractionMode::Idle,
            DragMode::Panning => InteractionMode::Panning,
            DragMode::Pinching => InteractionMode::PinchZooming,
        }
    }

    #[must_use]
    pub fn crosshair(&self) -> CrosshairState {
        self.crosshair
    }

    pub fn set_crosshair(&mut self, crosshair: CrosshairState) {
        self.crosshair = crosshair;
    }

    pub fn clear_crosshair(&mut self) {
        self.crosshair = CrosshairState::default();
    }

    #[must_use]
    pub fn touch_crosshair_enabled(&self) -> bool {
        self.touch_crosshair
    }

    /// Button pressed: remembers the anchor for subsequent drags.
    pub fn on_pointer_down(&mut self, x: f64) {
        self.last_pointer_x = Some(x);
        self.panned = false;
    }

    /// Pointer moved. Returns the horizontal drag delta while a button is held.
    pub fn on_pointer_drag(&mut self, x: f64) -> Option<f64> {
        let last = self.last_pointer_x?;
        self.last_pointer_x = Some(x);
        self.panned = true;
        self.drag_mode = DragMode::Panning;
        Some(x - last)
    }

    /// Button released. Returns `true` when the press was a click (no pan).
    pub fn on_pointer_up(&mut self) -> bool {
        let was_click = self.last_pointer_x.is_some() && !self.panned;
        self.last_pointer_x = None;
        self.panned = false;
        self.drag_mode = DragMode::Idle;
        was_click
    }

    /// Non-touch pointer left the surface.
    pub fn on_pointer_leave(&mut self) {
        self.last_pointer_x = None;
        self.last_pinch_distance = None;
        self.panned = false;
        self.drag_mode = DragMode::Idle;
        self.clear_crosshair();
    }

    #[must_use]
    pub fn active_touches(&self) -> &[TouchPoint] {
        &self.touches
    }

    /// Records moved contacts by id.
    pub fn update_touches(&mut self, touches: &[TouchPoint]) {
        for touch in touches {
            if let Some(known) = self.touches.iter_mut().find(|known| known.id == touch.id) {
                *known = *touch;
            }
        }
    }

    pub fn on_touch_start(&mut self, touches: &[TouchPoint], now_ms: u64, long_press_ms: u64) {
        self.touches = touches.iter().copied().collect();
        match touches {
            [single] => {
                self.last_pointer_x = Some(single.x);
                self.long_press.arm(now_ms, long_press_ms, single.x, single.y);
            }
            [_, _, ..] => {
                self.last_pinch_distance = pinch_geometry(touches).map(|(distance, _)| distance);
            }
            [] => {}
        }
    }

    /// Any touch movement cancels a pending long press.
    pub fn cancel_long_press(&mut self) {
        self.long_press.cancel();
    }

    /// Single-contact drag outside crosshair mode. Returns the delta.
    pub fn on_touch_drag(&mut self, x: f64) -> Option<f64> {
        let last = self.last_pointer_x?;
        self.last_pointer_x = Some(x);
        self.drag_mode = DragMode::Panning;
        Some(x - last)
    }

    /// Two-contact move. Returns `(factor, midpoint_x)` relative to the last
    /// recorded distance.
    pub fn on_pinch(&mut self, touches: &[TouchPoint]) -> Option<(f64, f64)> {
        let (distance, (mid_x, _)) = pinch_geometry(touches)?;
        let last = self.last_pinch_distance?;
        self.last_pinch_distance = Some(distance);
        self.drag_mode = DragMode::Pinching;
        if last <= 0.0 || distance <= 0.0 {
            return None;
        }
        Some((distance / last, mid_x))
    }

    /// Lifts `changed` contacts. Returns `true` when the lift should be
    /// reported as a touch click.
    ///
    /// A single contact left over from a pinch becomes the new pan anchor.
    pub fn on_touch_end(&mut self, changed: &[TouchPoint]) -> bool {
        self.touches
            .retain(|touch| !changed.iter().any(|lifted| lifted.id == touch.id));
        self.last_pinch_distance = None;
        match self.touches.as_slice() {
            [remaining] if !self.touch_crosshair => self.last_pointer_x = Some(remaining.x),
            _ if !self.touch_crosshair => self.last_pointer_x = None,
            _ => {}
        }
        self.drag_mode = DragMode::Idle;
        let tap = self.long_press.is_pending() && self.touch_crosshair && changed.len() == 1;
        self.long_press.cancel();
        tap
    }

    /// Fires the long-press toggle once its deadline is reached.
    ///
    /// Returns the new crosshair mode and the press position.
    pub fn poll_long_press(&mut self, now_ms: u64) -> Option<(bool, (f64, f64))> {
        let position = self.long_press.poll(now_ms)?;
        self.touch_crosshair = !self.touch_crosshair;
        if !self.touch_crosshair {
            self.last_pointer_x = None;
            self.last_pinch_distance = None;
            self.clear_crosshair();
        }
        Some((self.touch_crosshair, position))
    }

    /// Drops every gesture, e.g. after reconfiguration.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{InteractionMode, InteractionState, PanZoomBounds, TouchPoint};
    use crate::core::{Extent, TimeRange};

    fn bounds() -> PanZoomBounds {
        let range = TimeRange::new(0, 1_000);
        PanZoomBounds {
            full_extent: Extent::from_time_range(range, 0.0, 1.0),
            range,
            width: 500.0,
            max_zoom: 8.0,
        }
    }

    #[test]
    fn pan_is_clamped_to_bounds() {
        let bounds = bounds();
        assert_eq!(bounds.pan_by(0.0, 2.0, 100.0), 0.0);
        assert_relative_eq!(bounds.pan_by(0.0, 2.0, -100.0), 50.0);
        assert_relative_eq!(bounds.pan_by(0.0, 2.0, -10_000.0), 250.0);
    }

    #[test]
    fn zoom_keeps_anchor_time_under_pointer() {
        let bounds = bounds();
        let extent = bounds.full_extent;
        let (zoom, pan) = bounds.zoom_at(2.0, 100.0, 1.1, 250.0);
        let before = extent.x_to_time(250.0, 500.0, 2.0, 100.0);
        let after = extent.x_to_time(250.0, 500.0, zoom, pan);
        assert_relative_eq!(zoom, 2.2, epsilon = 1e-12);
        assert_relative_eq!(before, after, epsilon = 1e-9);
    }

    #[test]
    fn zoom_never_leaves_configured_limits() {
        let bounds = bounds();
        assert_eq!(bounds.zoom_at(1.0, 0.0, 0.5, 100.0).0, 1.0);
        assert_eq!(bounds.zoom_at(8.0, 0.0, 2.0, 100.0).0, 8.0);
    }

    #[test]
    fn click_requires_no_drag() {
        let mut state = InteractionState::default();
        state.on_pointer_down(10.0);
        assert!(state.on_pointer_up());

        state.on_pointer_down(10.0);
        assert_eq!(state.on_pointer_drag(25.0), Some(15.0));
        assert_eq!(state.mode(), InteractionMode::Panning);
        assert!(!state.on_pointer_up());
        assert_eq!(state.mode(), InteractionMode::Idle);
    }

    #[test]
    fn long_press_toggles_sticky_crosshair() {
        let mut state = InteractionState::default();
        state.on_touch_start(&[TouchPoint::new(1, 40.0, 60.0)], 1_000, 500);
        assert!(state.poll_long_press(1_499).is_none());
        assert_eq!(state.poll_long_press(1_500), Some((true, (40.0, 60.0))));
        assert_eq!(state.mode(), InteractionMode::TouchCrosshair);

        state.on_touch_start(&[TouchPoint::new(1, 40.0, 60.0)], 2_000, 500);
        state.cancel_long_press();
        assert!(state.poll_long_press(5_000).is_none());
        assert!(state.touch_crosshair_enabled());
    }

    #[test]
    fn pinch_factor_is_distance_ratio() {
        let mut state = InteractionState::default();
        state.on_touch_start(
            &[TouchPoint::new(1, 100.0, 0.0), TouchPoint::new(2, 200.0, 0.0)],
            0,
            500,
        );
        let (factor, mid_x) = state
            .on_pinch(&[TouchPoint::new(1, 50.0, 0.0), TouchPoint::new(2, 250.0, 0.0)])
            .expect("pinch");
        assert_relative_eq!(factor, 2.0);
        assert_relative_eq!(mid_x, 150.0);
        assert_eq!(state.mode(), InteractionMode::PinchZooming);
    }

    #[test]
    fn finger_left_after_pinch_becomes_pan_anchor() {
        let mut state = InteractionState::default();
        state.on_touch_start(
            &[TouchPoint::new(1, 100.0, 0.0), TouchPoint::new(2, 200.0, 0.0)],
            0,
            500,
        );
        state.update_touches(&[TouchPoint::new(1, 80.0, 0.0), TouchPoint::new(2, 220.0, 0.0)]);
        assert!(!state.on_touch_end(&[TouchPoint::new(1, 80.0, 0.0)]));
        assert_eq!(state.active_touches(), &[TouchPoint::new(2, 220.0, 0.0)]);
        assert_eq!(state.on_touch_drag(230.0), Some(10.0));
    }
}
