use serde::{Deserialize, Serialize};

use crate::core::{TimeRange, Viewport};

/// Smallest value span an extent may collapse to.
pub const MIN_VALUE_SPAN: f64 = 1e-4;

/// Fractional paddings applied above and below a tight value range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtentPadding {
    pub top: f64,
    pub bottom: f64,
}

impl Default for ExtentPadding {
    fn default() -> Self {
        Self {
            top: 0.2,
            bottom: 0.1,
        }
    }
}

impl ExtentPadding {
    /// Padding used by auxiliary indicator panes.
    #[must_use]
    pub const fn pane() -> Self {
        Self {
            top: 0.15,
            bottom: 0.2,
        }
    }

    /// Expands a tight `[min, max]` range by the configured fractions.
    ///
    /// Degenerate ranges get a minimum span centred on the value first.
    #[must_use]
    pub fn apply(self, min: f64, max: f64) -> (f64, f64) {
        let (min, max) = widen_degenerate(min, max);
        let span = max - min;
        (min - span * self.bottom, max + span * self.top)
    }
}

/// Replaces an empty span by `max(|v| * 1%, MIN_VALUE_SPAN)` around the value.
#[must_use]
pub fn widen_degenerate(min: f64, max: f64) -> (f64, f64) {
    if max - min > 0.0 {
        return (min, max);
    }
    let center = (min + max) / 2.0;
    let half = (center.abs() * 0.01).max(MIN_VALUE_SPAN) / 2.0;
    (center - half, center + half)
}

/// Data-space rectangle with a fixed mapping to pixel space.
///
/// `x` is time in milliseconds, `y` is the series value. Pixel coordinates are
/// logical units of the surface the extent is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        }
    }
}

impl Extent {
    #[must_use]
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
        .with_min_span()
    }

    #[must_use]
    pub fn from_time_range(range: TimeRange, y_min: f64, y_max: f64) -> Self {
        Self::new(range.start as f64, range.end as f64, y_min, y_max)
    }

    /// Guarantees `x_max > x_min` and `y_max > y_min`.
    #[must_use]
    pub fn with_min_span(mut self) -> Self {
        if !(self.x_max > self.x_min) {
            self.x_max = self.x_min + 1.0;
        }
        let (y_min, y_max) = widen_degenerate(self.y_min, self.y_max);
        self.y_min = y_min;
        self.y_max = y_max;
        self
    }

    #[must_use]
    pub fn x_span(self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn y_span(self) -> f64 {
        self.y_max - self.y_min
    }

    /// Maps a data point into pixel space.
    ///
    /// `x = ((t - x_min) / (x_max - x_min) * width - pan) * zoom`
    /// `y = (1 - (v - y_min) / (y_max - y_min)) * height`
    #[must_use]
    pub fn map_to_pixel(
        self,
        time: f64,
        value: f64,
        viewport: Viewport,
        zoom: f64,
        pan: f64,
    ) -> (f64, f64) {
        (
            self.time_to_x(time, viewport.width, zoom, pan),
            self.value_to_y(value, viewport.height),
        )
    }

    /// Exact inverse of [`Extent::map_to_pixel`].
    #[must_use]
    pub fn pixel_to_point(
        self,
        x: f64,
        y: f64,
        viewport: Viewport,
        zoom: f64,
        pan: f64,
    ) -> (f64, f64) {
        (
            self.x_to_time(x, viewport.width, zoom, pan),
            self.y_to_value(y, viewport.height),
        )
    }

    #[must_use]
    pub fn time_to_x(self, time: f64, width: f64, zoom: f64, pan: f64) -> f64 {
        ((time - self.x_min) / (self.x_max - self.x_min) * width - pan) * zoom
    }

    #[must_use]
    pub fn x_to_time(self, x: f64, width: f64, zoom: f64, pan: f64) -> f64 {
        (x / zoom + pan) / width * (self.x_max - self.x_min) + self.x_min
    }

    #[must_use]
    pub fn value_to_y(self, value: f64, height: f64) -> f64 {
        (1.0 - (value - self.y_min) / (self.y_max - self.y_min)) * height
    }

    #[must_use]
    pub fn y_to_value(self, y: f64, height: f64) -> f64 {
        (1.0 - y / height) * (self.y_max - self.y_min) + self.y_min
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{Extent, ExtentPadding, widen_degenerate};
    use crate::core::Viewport;

    #[test]
    fn mapping_matches_reference_formula() {
        let extent = Extent::new(0.0, 1_000.0, 10.0, 20.0);
        let viewport = Viewport::new(500.0, 200.0);

        let (x, y) = extent.map_to_pixel(500.0, 15.0, viewport, 2.0, 50.0);
        assert_relative_eq!(x, (250.0 - 50.0) * 2.0);
        assert_relative_eq!(y, 100.0);

        let (time, value) = extent.pixel_to_point(x, y, viewport, 2.0, 50.0);
        assert_relative_eq!(time, 500.0);
        assert_relative_eq!(value, 15.0);
    }

    #[test]
    fn top_of_range_maps_to_zero_y() {
        let extent = Extent::new(0.0, 1.0, -5.0, 5.0);
        assert_eq!(extent.value_to_y(5.0, 300.0), 0.0);
        assert_eq!(extent.value_to_y(-5.0, 300.0), 300.0);
    }

    #[test]
    fn degenerate_extent_gets_non_zero_spans() {
        let extent = Extent::new(7.0, 7.0, 42.0, 42.0);
        assert!(extent.x_span() > 0.0);
        assert!(extent.y_span() > 0.0);
        assert!(extent.y_min < 42.0 && extent.y_max > 42.0);

        let (lo, hi) = widen_degenerate(0.0, 0.0);
        assert!(hi - lo >= super::MIN_VALUE_SPAN);
    }

    #[test]
    fn padding_is_relative_to_tight_span() {
        let (min, max) = ExtentPadding::default().apply(10.0, 20.0);
        assert_relative_eq!(min, 9.0);
        assert_relative_eq!(max, 22.0);
    }
}
