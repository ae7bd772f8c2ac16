use serde::{Deserialize, Serialize};

use crate::core::{Extent, Point, TimeRange};

/// Time interval currently covered by the plot under zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleWindow {
    pub start: f64,
    pub end: f64,
    pub pixel_per_ms: f64,
}

/// Pixels per millisecond of the configured range at `zoom`.
#[must_use]
pub fn pixel_per_ms(range: TimeRange, width: f64, zoom: f64) -> f64 {
    width / range.span() * zoom
}

/// Computes the visible time window.
///
/// `start = x_min + pan / (pixel_per_ms / zoom)`,
/// `end = start + (x_max - x_min) / zoom`.
#[must_use]
pub fn visible_time_window(
    full_extent: Extent,
    range: TimeRange,
    width: f64,
    zoom: f64,
    pan: f64,
) -> VisibleWindow {
    let pixel_per_ms = pixel_per_ms(range, width, zoom);
    let start = full_extent.x_min + pan / (pixel_per_ms / zoom);
    let end = start + full_extent.x_span() / zoom;
    VisibleWindow {
        start,
        end,
        pixel_per_ms,
    }
}

/// Largest pan offset at `zoom` that keeps the window end inside the range.
///
/// Never negative.
#[must_use]
pub fn max_pan_offset(full_extent: Extent, range: TimeRange, width: f64, zoom: f64) -> f64 {
    let pixel_per_ms = pixel_per_ms(range, width, zoom);
    let visible_end_at_zero_pan = full_extent.x_min + full_extent.x_span() / zoom;
    let offset = ((range.end as f64 - visible_end_at_zero_pan) * pixel_per_ms) / zoom;
    if offset.is_finite() { offset.max(0.0) } else { 0.0 }
}

/// Index bounds `[first, end)` of the samples to draw for `window`.
///
/// `first` is the first sample with `time >= start - step`, `last` the last
/// with `time <= end`. One sample past `last` is kept so that segments leaving
/// the right edge are drawn. Returns an empty range when neither bound is met.
#[must_use]
pub fn visible_slice_bounds(points: &[Point], window: VisibleWindow, step: i64) -> (usize, usize) {
    let lower = window.start - step as f64;
    let first = points.partition_point(|point| (point.time as f64) < lower);
    let after_last = points.partition_point(|point| (point.time as f64) <= window.end);

    if first >= points.len() || after_last == 0 {
        return (0, 0);
    }
    let last = after_last - 1;
    let end = (last + 2).min(points.len());
    if first >= end { (0, 0) } else { (first, end) }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{max_pan_offset, visible_slice_bounds, visible_time_window};
    use crate::core::{Extent, Point, TimeRange};

    fn minute_series(count: i64) -> Vec<Point> {
        (0..count).map(|i| Point::close(i * 60_000, 1.0)).collect()
    }

    #[test]
    fn unzoomed_window_covers_full_range() {
        let range = TimeRange::new(0, 600_000);
        let extent = Extent::from_time_range(range, 0.0, 1.0);
        let window = visible_time_window(extent, range, 600.0, 1.0, 0.0);
        assert_relative_eq!(window.start, 0.0);
        assert_relative_eq!(window.end, 600_000.0);
        assert_relative_eq!(window.pixel_per_ms, 0.001);
    }

    #[test]
    fn max_pan_matches_closed_form() {
        let range = TimeRange::new(0, 600_000);
        let extent = Extent::from_time_range(range, 0.0, 1.0);
        assert_relative_eq!(max_pan_offset(extent, range, 600.0, 4.0), 600.0 * (1.0 - 0.25));
        assert_eq!(max_pan_offset(extent, range, 600.0, 1.0), 0.0);
    }

    #[test]
    fn slice_keeps_one_step_of_left_context_and_one_trailing_point() {
        let points = minute_series(10);
        let range = TimeRange::new(0, 600_000);
        let extent = Extent::from_time_range(range, 0.0, 1.0);
        let mut window = visible_time_window(extent, range, 600.0, 1.0, 0.0);
        window.start = 180_000.0;
        window.end = 300_000.0;
        // first: time >= 120_000 -> index 2; last: time <= 300_000 -> index 5.
        assert_eq!(visible_slice_bounds(&points, window, 60_000), (2, 7));
    }

    #[test]
    fn window_outside_data_is_empty() {
        let points = minute_series(3);
        let range = TimeRange::new(0, 600_000);
        let extent = Extent::from_time_range(range, 0.0, 1.0);
        let mut window = visible_time_window(extent, range, 600.0, 1.0, 0.0);
        window.start = 500_000.0;
        window.end = 600_000.0;
        assert_eq!(visible_slice_bounds(&points, window, 60_000), (0, 0));
        assert_eq!(visible_slice_bounds(&[], window, 60_000), (0, 0));
    }
}
