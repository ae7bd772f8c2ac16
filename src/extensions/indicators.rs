//! Overlay indicators drawn on top of the main series.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::api::{ChartStyle, PriceField};
use crate::core::{DataExtent, Extent, Point, Viewport};
use crate::render::{Color, LayerPrimitives, LinePrimitive, RectPrimitive};

/// Read-only view of the chart handed to indicators each frame.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorContext<'a> {
    /// Whole aggregated series (warm-up windows may start off screen).
    pub points: &'a [Point],
    /// Index range `[start, end)` of the visible slice within `points`.
    pub visible: (usize, usize),
    pub extent: Extent,
    pub viewport: Viewport,
    pub zoom: f64,
    pub pan: f64,
    pub step_px: f64,
    pub x_label_offset: f64,
    /// Value and volume bounds of the visible slice.
    pub visible_extent: &'a DataExtent,
    pub volume_height_fraction: f64,
    pub style: &'a ChartStyle,
}

impl IndicatorContext<'_> {
    #[must_use]
    pub fn visible_points(&self) -> &[Point] {
        let (start, end) = self.visible;
        self.points.get(start..end).unwrap_or(&[])
    }

    #[must_use]
    pub fn x(&self, time: i64) -> f64 {
        self.extent.time_to_x(
            time as f64 + self.x_label_offset,
            self.viewport.width,
            self.zoom,
            self.pan,
        )
    }

    #[must_use]
    pub fn y(&self, value: f64) -> f64 {
        self.extent.value_to_y(value, self.viewport.height)
    }
}

/// Derived series drawn into the indicator layer.
pub trait Indicator {
    /// Unique registry id of this instance.
    fn id(&self) -> &str;

    /// Kind key shown in legends, e.g. `"SMA"`.
    fn key(&self) -> &str;

    fn draw(&self, context: &IndicatorContext<'_>, out: &mut LayerPrimitives);

    /// Indicator value at the sample under the crosshair.
    fn crosshair_value(&self, context: &IndicatorContext<'_>, point: &Point) -> Option<f64>;
}

/// Simple moving average over one price field.
///
/// Until `period` samples are available the average runs over the samples
/// seen so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub id: String,
    pub period: usize,
    pub source: PriceField,
    pub color: Color,
}

impl MovingAverage {
    #[must_use]
    pub fn new(id: impl Into<String>, period: usize) -> Self {
        Self {
            id: id.into(),
            period: period.max(1),
            source: PriceField::Close,
            color: Color::rgb(41.0 / 255.0, 98.0 / 255.0, 1.0),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: PriceField) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Average aligned with `points`; samples lacking the field yield `None`.
    #[must_use]
    pub fn values(&self, points: &[Point]) -> Vec<Option<f64>> {
        let period = self.period.max(1);
        let mut window = VecDeque::with_capacity(period);
        let mut sum = 0.0;
        points
            .iter()
            .map(|point| {
                let value = self.source.value(point)?;
                window.push_back(value);
                sum += value;
                if window.len() > period {
                    sum -= window.pop_front().unwrap_or(0.0);
                }
                Some(sum / window.len() as f64)
            })
            .collect()
    }
}

impl Indicator for MovingAverage {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        "SMA"
    }

    fn draw(&self, context: &IndicatorContext<'_>, out: &mut LayerPrimitives) {
        let (start, end) = context.visible;
        let values = self.values(&context.points[..end.min(context.points.len())]);
        let path: Vec<(f64, f64)> = context
            .visible_points()
            .iter()
            .zip(values.iter().skip(start))
            .filter_map(|(point, value)| value.map(|value| (context.x(point.time), context.y(value))))
            .collect();
        let width = context.style.indicator_line_width;
        out.lines.extend(path.windows(2).map(|pair| {
            LinePrimitive::new(pair[0].0, pair[0].1, pair[1].0, pair[1].1, width, self.color)
        }));
    }

    fn crosshair_value(&self, context: &IndicatorContext<'_>, point: &Point) -> Option<f64> {
        let index = context
            .points
            .binary_search_by_key(&point.time, |candidate| candidate.time)
            .ok()?;
        self.values(&context.points[..=index]).last().copied().flatten()
    }
}

/// Volume histogram along the bottom of the plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeBars {
    pub id: String,
}

impl VolumeBars {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Indicator for VolumeBars {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        "VOL"
    }

    fn draw(&self, context: &IndicatorContext<'_>, out: &mut LayerPrimitives) {
        let volumes = context.visible_extent;
        if volumes.vol_max() <= 0.0 {
            return;
        }
        let style = context.style;
        let gap = context.step_px * 0.1;
        let width = (context.step_px - gap).max(0.0);
        let plot_height = context.viewport.height;
        for point in context.visible_points() {
            let Some(volume) = point.volume.filter(|volume| volume.is_finite()) else {
                continue;
            };
            let height =
                volumes.volume_to_height(volume, plot_height, context.volume_height_fraction);
            let color = if point.is_bullish() {
                style.up_color
            } else {
                style.down_color
            };
            // Bars are centred on the bucket like the candle bodies above them.
            let center = context.x(point.time);
            out.rects.push(RectPrimitive::filled(
                center - width / 2.0,
                plot_height - height,
                width,
                height,
                color.with_alpha(style.volume_alpha),
            ));
        }
    }

    fn crosshair_value(&self, _context: &IndicatorContext<'_>, point: &Point) -> Option<f64> {
        point.volume
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{Indicator, IndicatorContext, MovingAverage, VolumeBars};
    use crate::api::ChartStyle;
    use crate::core::{DataExtent, ExtentPadding, ExtentSource, Point, TimeRange, Viewport};
    use crate::render::{CanvasLayerKind, LayerPrimitives};

    #[test]
    fn moving_average_warms_up_over_partial_window() {
        let points: Vec<Point> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, close)| Point::close(i as i64, *close))
            .collect();
        let values: Vec<f64> = MovingAverage::new("sma", 3)
            .values(&points)
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(values.len(), 5);
        assert_relative_eq!(values[0], 1.0);
        assert_relative_eq!(values[1], 1.5);
        assert_relative_eq!(values[2], 2.0);
        assert_relative_eq!(values[4], 4.0);
    }

    #[test]
    fn samples_without_source_field_are_skipped() {
        let points = [Point::close(0, 2.0), Point::default(), Point::close(2, 4.0)];
        let values = MovingAverage::new("sma", 2).values(&points);
        assert_eq!(values[1], None);
        assert_eq!(values[2], Some(3.0));
    }

    #[test]
    fn volume_bars_scale_to_the_visible_maximum() {
        let points = [
            Point::ohlcv(0, 1.0, 2.0, 0.5, 1.5, 50.0),
            Point::ohlcv(60_000, 1.5, 2.0, 1.0, 1.2, 200.0),
            Point::ohlcv(120_000, 1.2, 1.8, 1.0, 1.6, 100.0),
        ];
        let range = TimeRange::new(0, 180_000);
        // Only the last two samples are visible; the first one's volume is ignored.
        let visible = DataExtent::from_points(
            ExtentSource::LowHigh,
            ExtentPadding::default(),
            &points[1..],
            range,
        );
        let style = ChartStyle::default();
        let context = IndicatorContext {
            points: &points,
            visible: (1, 3),
            extent: visible.extent(),
            viewport: Viewport::new(300.0, 200.0),
            zoom: 1.0,
            pan: 0.0,
            step_px: 100.0,
            x_label_offset: 30_000.0,
            visible_extent: &visible,
            volume_height_fraction: 0.25,
            style: &style,
        };
        let mut out = LayerPrimitives::new(CanvasLayerKind::Indicators);
        VolumeBars::new("vol").draw(&context, &mut out);

        assert_eq!(out.rects.len(), 2);
        assert_relative_eq!(out.rects[0].height, 50.0);
        assert_relative_eq!(out.rects[0].y, 150.0);
        assert_relative_eq!(out.rects[1].height, 25.0);
        // Centred on 150_000 ms of a 180_000 ms range, 90 px wide.
        assert_relative_eq!(out.rects[1].x, 205.0);
    }
}
