//! Indicators drawn in their own pane below the main plot.
//!
//! A pane shares the time axis of the main series but scales its values
//! independently, with its own value gutter and horizontal gridlines.

use serde::{Deserialize, Serialize};

use crate::api::ChartStyle;
use crate::core::{Extent, Point};
use crate::render::{Color, LayerPrimitives, LinePrimitive};

/// Read-only view of one pane handed to its indicator each frame.
#[derive(Debug, Clone, Copy)]
pub struct PaneContext<'a> {
    /// Whole aggregated series.
    pub points: &'a [Point],
    /// Indicator series aligned with `points`.
    pub values: &'a [Option<f64>],
    /// Index range `[start, end)` of the visible slice within `points`.
    pub visible: (usize, usize),
    /// Pane extent: configured time range, padded visible indicator values.
    pub extent: Extent,
    /// Surface y of the pane's top edge.
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub pan: f64,
    pub x_label_offset: f64,
    pub style: &'a ChartStyle,
}

impl PaneContext<'_> {
    /// Visible samples paired with their indicator values.
    pub fn visible_values(&self) -> impl Iterator<Item = (&Point, Option<f64>)> + '_ {
        let (start, end) = self.visible;
        let end = end.min(self.points.len()).min(self.values.len());
        let start = start.min(end);
        self.points[start..end]
            .iter()
            .zip(self.values[start..end].iter().copied())
    }

    /// Indicator value of the sample at exactly `time`.
    #[must_use]
    pub fn value_at_time(&self, time: i64) -> Option<f64> {
        let index = self
            .points
            .binary_search_by_key(&time, |point| point.time)
            .ok()?;
        self.values.get(index).copied().flatten()
    }

    #[must_use]
    pub fn x(&self, time: i64) -> f64 {
        self.extent.time_to_x(
            time as f64 + self.x_label_offset,
            self.width,
            self.zoom,
            self.pan,
        )
    }

    /// Surface y of `value` inside the pane.
    #[must_use]
    pub fn y(&self, value: f64) -> f64 {
        self.top + self.extent.value_to_y(value, self.height)
    }

    /// Value under a pointer at `relative_y` (0 at the pane top, 1 at its
    /// bottom).
    #[must_use]
    pub fn value_at_relative_y(&self, relative_y: f64) -> f64 {
        self.extent.y_to_value(relative_y * self.height, self.height)
    }
}

/// Derived series drawn into its own pane.
pub trait PaneIndicator {
    /// Unique registry id of this instance.
    fn id(&self) -> &str;

    /// Kind key shown in legends, e.g. `"RSI"`.
    fn key(&self) -> &str;

    /// Indicator series aligned with `points`; the pane autoscales to its
    /// visible part.
    fn values(&self, points: &[Point]) -> Vec<Option<f64>>;

    fn draw(&self, context: &PaneContext<'_>, out: &mut LayerPrimitives);

    /// Readout for a crosshair at `time` with the pointer at `relative_y`
    /// within the pane.
    fn crosshair_value(&self, context: &PaneContext<'_>, time: i64, relative_y: f64)
    -> Option<f64>;
}

/// Relative strength index with Wilder smoothing.
///
/// The first value appears once `period` close-to-close changes are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeStrength {
    pub id: String,
    pub period: usize,
    pub color: Color,
    /// Guide levels drawn across the pane when inside its value range.
    pub levels: (f64, f64),
}

impl RelativeStrength {
    #[must_use]
    pub fn new(id: impl Into<String>, period: usize) -> Self {
        Self {
            id: id.into(),
            period: period.max(1),
            color: Color::rgb(126.0 / 255.0, 87.0 / 255.0, 194.0 / 255.0),
            levels: (30.0, 70.0),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    fn index(average_gain: f64, average_loss: f64) -> f64 {
        if average_loss == 0.0 {
            if average_gain == 0.0 { 50.0 } else { 100.0 }
        } else {
            100.0 - 100.0 / (1.0 + average_gain / average_loss)
        }
    }
}

impl PaneIndicator for RelativeStrength {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        "RSI"
    }

    fn values(&self, points: &[Point]) -> Vec<Option<f64>> {
        let period = self.period.max(1);
        let mut previous: Option<f64> = None;
        let mut changes = 0_usize;
        let (mut gain, mut loss) = (0.0, 0.0);
        points
            .iter()
            .map(|point| {
                let close = point.close?;
                let Some(last) = previous.replace(close) else {
                    return None;
                };
                let change = close - last;
                let (up, down) = (change.max(0.0), (-change).max(0.0));
                changes += 1;
                if changes <= period {
                    gain += up / period as f64;
                    loss += down / period as f64;
                    if changes < period {
                        return None;
                    }
                } else {
                    let weight = (period - 1) as f64;
                    gain = (gain * weight + up) / period as f64;
                    loss = (loss * weight + down) / period as f64;
                }
                Some(Self::index(gain, loss))
            })
            .collect()
    }

    fn draw(&self, context: &PaneContext<'_>, out: &mut LayerPrimitives) {
        let style = context.style;
        let extent = context.extent;
        for level in [self.levels.0, self.levels.1] {
            if level >= extent.y_min && level <= extent.y_max {
                let y = context.y(level);
                out.lines.push(LinePrimitive::new(
                    0.0,
                    y,
                    context.width,
                    y,
                    style.grid_width,
                    self.color.with_alpha(0.4),
                ));
            }
        }

        let path: Vec<(f64, f64)> = context
            .visible_values()
            .filter_map(|(point, value)| value.map(|value| (context.x(point.time), context.y(value))))
            .collect();
        out.lines.extend(path.windows(2).map(|pair| {
            LinePrimitive::new(
                pair[0].0,
                pair[0].1,
                pair[1].0,
                pair[1].1,
                style.indicator_line_width,
                self.color,
            )
        }));
    }

    fn crosshair_value(
        &self,
        context: &PaneContext<'_>,
        time: i64,
        relative_y: f64,
    ) -> Option<f64> {
        context.value_at_time(time).or_else(|| {
            (0.0..=1.0)
                .contains(&relative_y)
                .then(|| context.value_at_relative_y(relative_y))
        })
    }
}
