use tracing::trace;

use crate::extensions::ListenerId;
use crate::interaction::{ChartClick, ChartClickKind, PointerKind, TouchPoint};
use crate::render::Renderer;

use super::{ChartEngine, DirtyLayers};

impl<R: Renderer> ChartEngine<R> {
    /// Button press on the plot. Touch contacts arrive through
    /// [`ChartEngine::touch_start`] instead.
    pub fn pointer_down(&mut self, x: f64, _y: f64, kind: PointerKind) {
        if kind == PointerKind::Touch {
            return;
        }
        self.interaction.on_pointer_down(x);
    }

    /// Hover or drag. Pans while a button is held, then moves the crosshair.
    pub fn pointer_move(&mut self, x: f64, y: f64, kind: PointerKind) {
        if kind == PointerKind::Touch || self.points.is_empty() {
            return;
        }
        if let Some(dx) = self.interaction.on_pointer_drag(x) {
            self.apply_pan_delta(dx);
        }
        self.update_crosshair_at(x, y);
    }

    /// Button release. A press without panning is reported to click
    /// listeners with the nearest sample.
    pub fn pointer_up(&mut self, x: f64, y: f64, kind: PointerKind) {
        if kind == PointerKind::Touch {
            return;
        }
        let was_click = self.interaction.on_pointer_up();
        if !was_click || self.click_listeners.is_empty() {
            return;
        }
        let extent = self.data_extent.extent();
        if let Some(point) = self.resolve_point_at(x, y, extent) {
            self.click_listeners.emit(&ChartClick {
                kind: ChartClickKind::Click,
                x,
                y,
                point,
            });
        }
    }

    /// Pointer left the surface: drag state and crosshair are dropped.
    pub fn pointer_leave(&mut self, kind: PointerKind) {
        if kind == PointerKind::Touch {
            return;
        }
        self.interaction.on_pointer_leave();
        self.request_redraw(DirtyLayers::CROSSHAIR);
    }

    /// Wheel zoom anchored at `x`. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, x: f64, delta_y: f64) {
        if self.points.is_empty() || delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let input = self.config.input;
        let factor = if delta_y < 0.0 {
            input.wheel_zoom_in_factor
        } else {
            input.wheel_zoom_out_factor
        };
        self.apply_zoom(factor, x);
    }

    pub fn touch_start(&mut self, touches: &[TouchPoint], now_ms: u64) {
        if self.points.is_empty() {
            return;
        }
        self.interaction
            .on_touch_start(touches, now_ms, self.config.input.long_press_ms);
    }

    /// Touch movement. One contact pans (or drives the sticky crosshair),
    /// two contacts pinch-zoom around their midpoint.
    pub fn touch_move(&mut self, touches: &[TouchPoint]) {
        if self.points.is_empty() {
            return;
        }
        self.interaction.cancel_long_press();
        self.interaction.update_touches(touches);
        match touches {
            [touch] => {
                if self.interaction.touch_crosshair_enabled() {
                    self.update_crosshair_at(touch.x, touch.y);
                } else if let Some(dx) = self.interaction.on_touch_drag(touch.x) {
                    self.apply_pan_delta(dx);
                } else {
                    self.update_crosshair_at(touch.x, touch.y);
                }
            }
            [_, _, ..] => {
                if self.interaction.touch_crosshair_enabled() {
                    return;
                }
                if let Some((factor, mid_x)) = self.interaction.on_pinch(touches) {
                    self.apply_zoom(factor, mid_x);
                }
            }
            [] => {}
        }
    }

    /// Contacts lifted. A quick tap while the touch crosshair is active is
    /// reported as a touch click.
    pub fn touch_end(&mut self, changed_touches: &[TouchPoint]) {
        let tap = self.interaction.on_touch_end(changed_touches);
        let [touch] = changed_touches else {
            return;
        };
        if !tap {
            return;
        }
        let extent = self.visible_extent.extent();
        if let Some(point) = self.resolve_point_at(touch.x, touch.y, extent) {
            self.click_listeners.emit(&ChartClick {
                kind: ChartClickKind::TouchClick,
                x: touch.x,
                y: touch.y,
                point,
            });
        }
    }

    /// Advances host-clock driven timers. Returns `true` when the long press
    /// fired and toggled the touch crosshair.
    pub fn poll_timers(&mut self, now_ms: u64) -> bool {
        let Some((enabled, (x, y))) = self.interaction.poll_long_press(now_ms) else {
            return false;
        };
        trace!(enabled, "touch crosshair toggled");
        if !enabled || !self.update_crosshair_at(x, y) {
            self.request_redraw(DirtyLayers::CROSSHAIR);
        }
        true
    }

    /// Subscribes to [`ChartClick`] notifications.
    pub fn on_click(&mut self, listener: impl FnMut(&ChartClick) + 'static) -> ListenerId {
        self.click_listeners.on(listener)
    }

    pub fn off_click(&mut self, id: ListenerId) -> bool {
        self.click_listeners.off(id)
    }

    fn apply_pan_delta(&mut self, dx: f64) {
        self.pan = self.pan_zoom_bounds().pan_by(self.pan, self.zoom, dx);
        self.after_viewport_change();
    }

    fn apply_zoom(&mut self, factor: f64, anchor_x: f64) {
        let (zoom, pan) = self
            .pan_zoom_bounds()
            .zoom_at(self.zoom, self.pan, factor, anchor_x);
        trace!(zoom, pan, factor, anchor_x, "zoom applied");
        self.zoom = zoom;
        self.pan = pan;
        self.after_viewport_change();
    }

    fn after_viewport_change(&mut self) {
        self.recalculate_visible_extent();
        self.reproject_crosshair();
        self.request_redraw(DirtyLayers::full());
    }
}
