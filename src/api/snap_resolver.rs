use crate::core::{Extent, Point};
use crate::interaction::CrosshairState;
use crate::render::Renderer;

use super::{ChartEngine, DirtyLayers, SeriesController};

/// Sample closest in time to `time`.
///
/// Linear scan with a strict comparison, so on exact equidistance the earlier
/// sample wins.
#[must_use]
pub fn nearest_point(points: &[Point], time: i64) -> Option<&Point> {
    let mut best: Option<(&Point, u64)> = None;
    for point in points {
        let distance = point.time.abs_diff(time);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((point, distance)),
        }
    }
    best.map(|(point, _)| point)
}

impl<R: Renderer> ChartEngine<R> {
    /// Inverse-maps a plot position through `extent` and snaps it to a sample.
    pub(super) fn resolve_point_at(&self, x: f64, y: f64, extent: Extent) -> Option<Point> {
        let (raw_time, _) =
            extent.pixel_to_point(x, y, self.config.viewport, self.zoom, self.pan);
        if !raw_time.is_finite() {
            return None;
        }
        let time = self.chart_type.snap_time(raw_time, self.config.step_size_ms);
        nearest_point(&self.points, time).copied()
    }

    /// Moves the crosshair to the sample under the pointer.
    ///
    /// Dirties only the crosshair layer. Returns `false` when the pointer
    /// could not be resolved (no data, or hover disabled on touch surfaces).
    pub(super) fn update_crosshair_at(&mut self, x: f64, y: f64) -> bool {
        if self.config.input.touch_capable && !self.interaction.touch_crosshair_enabled() {
            return false;
        }
        let extent = self.visible_extent.extent();
        let Some(point) = self.resolve_point_at(x, y, extent) else {
            return false;
        };

        let viewport = self.config.viewport;
        let pointer_y = y.min(viewport.height);
        let offset = self.chart_type.x_label_offset(self.config.step_size_ms);
        self.interaction.set_crosshair(CrosshairState {
            // The pointer sits on the time axis gutter: keep the snap, hide the lines.
            visible: pointer_y < viewport.height,
            x: extent.time_to_x(point.time as f64 + offset, viewport.width, self.zoom, self.pan),
            pointer_y,
            time: Some(point.time),
            point: Some(point),
            price: Some(extent.y_to_value(pointer_y, viewport.height)),
        });
        self.request_redraw(DirtyLayers::CROSSHAIR);
        true
    }

    /// Re-projects the snapped sample after zoom, pan or a value rescale.
    pub(super) fn reproject_crosshair(&mut self) {
        let mut crosshair = self.interaction.crosshair();
        let Some(time) = crosshair.time else {
            return;
        };
        let extent = self.visible_extent.extent();
        let viewport = self.config.viewport;
        let offset = self.chart_type.x_label_offset(self.config.step_size_ms);
        crosshair.x = extent.time_to_x(time as f64 + offset, viewport.width, self.zoom, self.pan);
        crosshair.price = Some(extent.y_to_value(crosshair.pointer_y, viewport.height));
        self.interaction.set_crosshair(crosshair);
    }

    #[must_use]
    pub fn crosshair(&self) -> CrosshairState {
        self.interaction.crosshair()
    }
}
