use tracing::trace;

use crate::core::{
    DataExtent, Extent, Point, VisibleWindow, pixel_per_ms, visible_slice_bounds,
    visible_time_window,
};
use crate::interaction::PanZoomBounds;
use crate::render::Renderer;

use super::ChartEngine;

impl<R: Renderer> ChartEngine<R> {
    pub(super) fn pan_zoom_bounds(&self) -> PanZoomBounds {
        PanZoomBounds {
            full_extent: self.data_extent.extent(),
            range: self.time_range,
            width: self.config.viewport.width,
            max_zoom: self.config.max_zoom,
        }
    }

    pub(super) fn clamp_pan(&mut self) {
        self.pan = self.pan_zoom_bounds().clamp_pan(self.pan, self.zoom);
    }

    /// Re-slices the visible samples and re-tightens the visible value range.
    ///
    /// x bounds stay on the configured range so panning never rescales time.
    /// An empty slice keeps the full extent's value range.
    pub fn recalculate_visible_extent(&mut self) -> &[Point] {
        let window = self.visible_time_range();
        let (start, end) = visible_slice_bounds(&self.points, window, self.config.step_size_ms);
        self.visible_bounds = (start, end);
        self.visible_extent
            .recalculate_values(&self.points[start..end], self.time_range, &self.data_extent);
        trace!(
            window_start = window.start,
            window_end = window.end,
            first = start,
            end,
            "visible extent recalculated"
        );
        &self.points[start..end]
    }

    /// Samples selected by the last [`ChartEngine::recalculate_visible_extent`].
    #[must_use]
    pub fn last_visible_points(&self) -> &[Point] {
        let (start, end) = self.visible_bounds;
        self.points.get(start..end).unwrap_or(&[])
    }

    /// Time interval currently on screen.
    #[must_use]
    pub fn visible_time_range(&self) -> VisibleWindow {
        visible_time_window(
            self.data_extent.extent(),
            self.time_range,
            self.config.viewport.width,
            self.zoom,
            self.pan,
        )
    }

    #[must_use]
    pub fn visible_extent(&self) -> Extent {
        self.visible_extent.extent()
    }

    #[must_use]
    pub fn data_extent(&self) -> &DataExtent {
        &self.data_extent
    }

    #[must_use]
    pub fn pixel_per_ms(&self) -> f64 {
        pixel_per_ms(self.time_range, self.config.viewport.width, self.zoom)
    }

    #[must_use]
    pub fn max_pan_offset(&self) -> f64 {
        self.pan_zoom_bounds().max_pan(self.zoom)
    }

    #[must_use]
    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn pan_offset(&self) -> f64 {
        self.pan
    }

    /// Projects a data point through the visible extent, as drawers do.
    #[must_use]
    pub fn map_to_pixel(&self, time: f64, value: f64) -> (f64, f64) {
        self.visible_extent
            .extent()
            .map_to_pixel(time, value, self.config.viewport, self.zoom, self.pan)
    }

    /// Inverse of [`ChartEngine::map_to_pixel`].
    #[must_use]
    pub fn pixel_to_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.visible_extent
            .extent()
            .pixel_to_point(x, y, self.config.viewport, self.zoom, self.pan)
    }
}
