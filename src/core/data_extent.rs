use serde::{Deserialize, Serialize};

use crate::core::extent::{Extent, ExtentPadding};
use crate::core::{Point, TimeRange};

/// Which sample fields drive the value bounds of an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtentSource {
    /// `low`/`high` (OHLC-type series).
    LowHigh,
    /// `close` only (line-type series).
    Close,
}

impl ExtentSource {
    /// Returns the `(low, high)` contribution of a sample, if any.
    #[must_use]
    pub fn value_bounds(self, point: &Point) -> Option<(f64, f64)> {
        match self {
            Self::LowHigh => match (point.low, point.high) {
                (Some(low), Some(high)) => Some((low.min(high), low.max(high))),
                _ => None,
            },
            Self::Close => point.close.map(|close| (close, close)),
        }
        .filter(|(low, high)| low.is_finite() && high.is_finite())
    }
}

/// Data-space bounds of a dataset with a value padding policy.
///
/// The tight value range is tracked separately from the padded one so that
/// streaming updates only move the padded bounds when a sample escapes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataExtent {
    extent: Extent,
    source: ExtentSource,
    padding: ExtentPadding,
    tight: Option<(f64, f64)>,
    vol_max: f64,
}

impl DataExtent {
    #[must_use]
    pub fn new(source: ExtentSource, padding: ExtentPadding, time_range: TimeRange) -> Self {
        let mut data_extent = Self {
            extent: Extent::default(),
            source,
            padding,
            tight: None,
            vol_max: 0.0,
        };
        data_extent.recalculate(&[], time_range);
        data_extent
    }

    #[must_use]
    pub fn from_points(
        source: ExtentSource,
        padding: ExtentPadding,
        points: &[Point],
        time_range: TimeRange,
    ) -> Self {
        let mut data_extent = Self::new(source, padding, time_range);
        data_extent.recalculate(points, time_range);
        data_extent
    }

    #[must_use]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    #[must_use]
    pub fn source(&self) -> ExtentSource {
        self.source
    }

    #[must_use]
    pub fn padding(&self) -> ExtentPadding {
        self.padding
    }

    #[must_use]
    pub fn vol_max(&self) -> f64 {
        self.vol_max
    }

    /// Tight (unpadded) value range of every sample seen so far.
    #[must_use]
    pub fn tight_range(&self) -> Option<(f64, f64)> {
        self.tight
    }

    /// Recomputes every bound from scratch.
    ///
    /// x comes from `time_range`, never from the data. Samples without the
    /// fields required by the source are ignored.
    pub fn recalculate(&mut self, points: &[Point], time_range: TimeRange) {
        let mut tight: Option<(f64, f64)> = None;
        let mut vol_max = 0.0_f64;
        for point in points {
            if let Some((low, high)) = self.source.value_bounds(point) {
                tight = Some(match tight {
                    Some((min, max)) => (min.min(low), max.max(high)),
                    None => (low, high),
                });
            }
            if let Some(volume) = point.volume.filter(|volume| volume.is_finite()) {
                vol_max = vol_max.max(volume);
            }
        }

        let (y_min, y_max) = match tight {
            Some((min, max)) => self.padding.apply(min, max),
            None => (0.0, 1.0),
        };
        self.tight = tight;
        self.vol_max = vol_max;
        self.extent = Extent::from_time_range(time_range, y_min, y_max);
    }

    /// Recomputes the value bounds only, keeping the current x bounds.
    ///
    /// An empty slice keeps the value range of `fallback`.
    pub fn recalculate_values(&mut self, points: &[Point], time_range: TimeRange, fallback: &Self) {
        self.recalculate(points, time_range);
        if self.tight.is_none() {
            self.extent.y_min = fallback.extent.y_min;
            self.extent.y_max = fallback.extent.y_max;
            self.tight = fallback.tight;
        }
    }

    /// Widens the bounds to include a streamed sample.
    ///
    /// Returns `true` iff any bound moved. Once the first valued sample has
    /// replaced the placeholder range, bounds never shrink.
    pub fn add_data_point(&mut self, point: &Point) -> bool {
        let mut changed = false;

        let time = point.time as f64;
        if time < self.extent.x_min {
            self.extent.x_min = time;
            changed = true;
        }
        if time > self.extent.x_max {
            self.extent.x_max = time;
            changed = true;
        }

        if let Some(volume) = point.volume.filter(|volume| volume.is_finite()) {
            if volume > self.vol_max {
                self.vol_max = volume;
                changed = true;
            }
        }

        if let Some((low, high)) = self.source.value_bounds(point) {
            let (y_min, y_max) = match self.tight {
                // The default [0, 1] span of an empty dataset is a placeholder.
                None => {
                    self.tight = Some((low, high));
                    self.padding.apply(low, high)
                }
                Some((min, max)) => {
                    let tight = (min.min(low), max.max(high));
                    self.tight = Some(tight);
                    if low < self.extent.y_min || high > self.extent.y_max {
                        let (padded_min, padded_max) = self.padding.apply(tight.0, tight.1);
                        (
                            padded_min.min(self.extent.y_min),
                            padded_max.max(self.extent.y_max),
                        )
                    } else {
                        (self.extent.y_min, self.extent.y_max)
                    }
                }
            };
            if y_min != self.extent.y_min || y_max != self.extent.y_max {
                self.extent.y_min = y_min;
                self.extent.y_max = y_max;
                changed = true;
            }
        }

        changed
    }

    /// Height in pixels of a volume bar scaled to `fraction` of the plot.
    #[must_use]
    pub fn volume_to_height(&self, volume: f64, plot_height: f64, fraction: f64) -> f64 {
        if self.vol_max <= 0.0 || !volume.is_finite() {
            return 0.0;
        }
        (volume.max(0.0) / self.vol_max) * plot_height * fraction
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{DataExtent, ExtentSource};
    use crate::core::{ExtentPadding, Point, TimeRange};

    fn range() -> TimeRange {
        TimeRange::new(0, 1_000)
    }

    #[test]
    fn empty_dataset_uses_unit_value_range() {
        let extent = DataExtent::new(ExtentSource::LowHigh, ExtentPadding::default(), range());
        assert_eq!(extent.extent().y_min, 0.0);
        assert_eq!(extent.extent().y_max, 1.0);
        assert_eq!(extent.extent().x_min, 0.0);
        assert_eq!(extent.extent().x_max, 1_000.0);
    }

    #[test]
    fn low_high_source_pads_tight_range() {
        let points = [
            Point::ohlc(0, 12.0, 20.0, 10.0, 15.0),
            Point::ohlc(100, 15.0, 18.0, 11.0, 16.0),
        ];
        let extent = DataExtent::from_points(
            ExtentSource::LowHigh,
            ExtentPadding::default(),
            &points,
            range(),
        );
        assert_relative_eq!(extent.extent().y_min, 9.0);
        assert_relative_eq!(extent.extent().y_max, 22.0);
        assert_eq!(extent.tight_range(), Some((10.0, 20.0)));
    }

    #[test]
    fn close_source_ignores_wicks() {
        let points = [
            Point::ohlc(0, 12.0, 50.0, 1.0, 10.0),
            Point::ohlc(100, 15.0, 50.0, 1.0, 20.0),
        ];
        let extent =
            DataExtent::from_points(ExtentSource::Close, ExtentPadding::default(), &points, range());
        assert_eq!(extent.tight_range(), Some((10.0, 20.0)));
    }

    #[test]
    fn point_inside_padded_range_changes_nothing() {
        let mut extent = DataExtent::from_points(
            ExtentSource::LowHigh,
            ExtentPadding::default(),
            &[Point::ohlc(0, 12.0, 20.0, 10.0, 15.0)],
            range(),
        );
        let before = extent.extent();
        // 21 lies inside the padded [9, 22] range.
        assert!(!extent.add_data_point(&Point::ohlc(10, 15.0, 21.0, 14.0, 16.0)));
        assert_eq!(extent.extent(), before);
        assert_eq!(extent.tight_range(), Some((10.0, 21.0)));
    }

    #[test]
    fn escaping_point_widens_padded_bounds() {
        let mut extent = DataExtent::from_points(
            ExtentSource::LowHigh,
            ExtentPadding::default(),
            &[Point::ohlc(0, 12.0, 20.0, 10.0, 15.0)],
            range(),
        );
        assert!(extent.add_data_point(&Point::ohlc(10, 15.0, 30.0, 14.0, 16.0)));
        assert!(extent.extent().y_max >= 30.0);
        assert!(extent.extent().y_min <= 9.0);
    }

    #[test]
    fn time_outside_range_widens_x() {
        let mut extent = DataExtent::new(ExtentSource::Close, ExtentPadding::default(), range());
        assert!(extent.add_data_point(&Point::close(2_000, 1.0)));
        assert_eq!(extent.extent().x_max, 2_000.0);
    }

    #[test]
    fn volume_scales_to_fraction_of_plot() {
        let points = [
            Point::ohlcv(0, 1.0, 2.0, 0.5, 1.5, 100.0),
            Point::ohlcv(100, 1.0, 2.0, 0.5, 1.5, 50.0),
        ];
        let extent = DataExtent::from_points(
            ExtentSource::LowHigh,
            ExtentPadding::default(),
            &points,
            range(),
        );
        assert_eq!(extent.vol_max(), 100.0);
        assert_relative_eq!(extent.volume_to_height(50.0, 400.0, 0.2), 40.0);
    }
}
