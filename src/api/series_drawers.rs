//! Projection of the visible slice into render primitives for each series kind.

#[cfg(feature = "parallel-projection")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use crate::core::{Extent, Point, TimeRange, Viewport};
use crate::render::{Color, LayerPrimitives, LinePrimitive, PolygonPrimitive, RectPrimitive};

use super::ChartStyle;

/// Read-only inputs shared by every drawer.
#[derive(Debug, Clone, Copy)]
pub struct SeriesDrawContext<'a> {
    pub points: &'a [Point],
    /// Extent whose value bounds fit the visible slice.
    pub extent: Extent,
    pub viewport: Viewport,
    pub zoom: f64,
    pub pan: f64,
    pub step_size_ms: i64,
    pub pixel_per_ms: f64,
    pub time_range: TimeRange,
    pub style: &'a ChartStyle,
}

impl SeriesDrawContext<'_> {
    #[must_use]
    pub fn x(&self, time: i64) -> f64 {
        self.extent
            .time_to_x(time as f64, self.viewport.width, self.zoom, self.pan)
    }

    #[must_use]
    pub fn y(&self, value: f64) -> f64 {
        self.extent.value_to_y(value, self.viewport.height)
    }

    /// Width of one bucket in pixels at the current zoom.
    #[must_use]
    pub fn step_px(&self) -> f64 {
        self.step_size_ms as f64 * self.pixel_per_ms
    }

    /// Samples inside the configured range, for path-style series.
    fn in_range(&self) -> impl Iterator<Item = &Point> {
        self.points
            .iter()
            .filter(|point| self.time_range.contains(point.time))
    }
}

/// Projected candle or bar geometry in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleGeometry {
    pub center_x: f64,
    pub body_left: f64,
    pub body_width: f64,
    pub open_y: f64,
    pub close_y: f64,
    pub high_y: f64,
    pub low_y: f64,
    pub is_bullish: bool,
}

impl CandleGeometry {
    #[must_use]
    pub fn body_top(self) -> f64 {
        self.open_y.min(self.close_y)
    }

    #[must_use]
    pub fn body_bottom(self) -> f64 {
        self.open_y.max(self.close_y)
    }
}

/// Projects complete OHLC samples; samples missing a field are skipped.
///
/// `spacing` is the fraction of a bucket left empty between bodies.
#[must_use]
pub fn project_candles(context: &SeriesDrawContext<'_>, spacing: f64) -> Vec<CandleGeometry> {
    let gap = context.step_px() * spacing;
    let body_width = context.step_px() - gap;

    #[cfg(feature = "parallel-projection")]
    {
        context
            .points
            .par_iter()
            .filter_map(|point| project_single_candle(context, point, gap, body_width))
            .collect()
    }

    #[cfg(not(feature = "parallel-projection"))]
    {
        context
            .points
            .iter()
            .filter_map(|point| project_single_candle(context, point, gap, body_width))
            .collect()
    }
}

fn project_single_candle(
    context: &SeriesDrawContext<'_>,
    point: &Point,
    gap: f64,
    body_width: f64,
) -> Option<CandleGeometry> {
    let (Some(open), Some(high), Some(low), Some(close)) =
        (point.open, point.high, point.low, point.close)
    else {
        return None;
    };
    let x = context.x(point.time);
    Some(CandleGeometry {
        center_x: x + body_width / 2.0 + gap / 2.0,
        body_left: x + gap / 2.0,
        body_width,
        open_y: context.y(open),
        close_y: context.y(close),
        high_y: context.y(high),
        low_y: context.y(low),
        is_bullish: close > open,
    })
}

fn direction_color(style: &ChartStyle, bullish: bool) -> Color {
    if bullish {
        style.up_color
    } else {
        style.down_color
    }
}

pub(super) fn draw_candles(
    context: &SeriesDrawContext<'_>,
    spacing: f64,
    hollow: bool,
    out: &mut LayerPrimitives,
) {
    for candle in project_candles(context, spacing) {
        let color = direction_color(context.style, candle.is_bullish);
        let wick_width = (candle.body_width / 5.0).min(1.0);
        let body_height = candle.body_bottom() - candle.body_top();

        if hollow {
            // Wicks stop at the body so the hollow body stays empty.
            out.lines.push(LinePrimitive::new(
                candle.center_x,
                candle.high_y,
                candle.center_x,
                candle.body_top(),
                wick_width,
                color,
            ));
            out.lines.push(LinePrimitive::new(
                candle.center_x,
                candle.low_y,
                candle.center_x,
                candle.body_bottom(),
                wick_width,
                color,
            ));
        } else {
            out.lines.push(LinePrimitive::new(
                candle.center_x,
                candle.high_y,
                candle.center_x,
                candle.low_y,
                wick_width,
                color,
            ));
        }

        let body = if hollow && candle.is_bullish {
            RectPrimitive::outlined(
                candle.body_left,
                candle.body_top(),
                candle.body_width,
                body_height,
                color,
            )
        } else {
            RectPrimitive::filled(
                candle.body_left,
                candle.body_top(),
                candle.body_width,
                body_height,
                color,
            )
        };
        out.rects.push(body);
    }
}

pub(super) fn draw_bars(context: &SeriesDrawContext<'_>, spacing: f64, out: &mut LayerPrimitives) {
    for bar in project_candles(context, spacing) {
        let color = direction_color(context.style, bar.is_bullish);
        let stroke = (bar.body_width / 5.0).min(1.0);
        let tick = (bar.body_width / 2.0).max(4.0);
        let x = bar.center_x;
        out.lines.extend([
            LinePrimitive::new(x, bar.high_y, x, bar.low_y, stroke, color),
            // open tick left, close tick right
            LinePrimitive::new(x - tick, bar.open_y, x, bar.open_y, stroke, color),
            LinePrimitive::new(x, bar.close_y, x + tick, bar.close_y, stroke, color),
        ]);
    }
}

fn close_path(context: &SeriesDrawContext<'_>) -> Vec<(f64, f64)> {
    context
        .in_range()
        .filter_map(|point| point.close.map(|close| (context.x(point.time), context.y(close))))
        .collect()
}

fn push_polyline(path: &[(f64, f64)], width: f64, color: Color, out: &mut LayerPrimitives) {
    out.lines.extend(
        path.windows(2)
            .map(|pair| LinePrimitive::new(pair[0].0, pair[0].1, pair[1].0, pair[1].1, width, color)),
    );
}

pub(super) fn draw_line(context: &SeriesDrawContext<'_>, out: &mut LayerPrimitives) {
    let style = context.style;
    push_polyline(&close_path(context), style.line_width, style.line_color, out);
}

pub(super) fn draw_area(context: &SeriesDrawContext<'_>, out: &mut LayerPrimitives) {
    let style = context.style;
    let path = close_path(context);
    push_polyline(&path, style.line_width, style.line_color, out);

    if path.len() < 2 {
        return;
    }
    let (first_x, last_x) = (path[0].0, path[path.len() - 1].0);
    let bottom = context.viewport.height;
    let mut outline = path;
    outline.push((last_x, bottom));
    outline.push((first_x, bottom));
    out.polygons.push(PolygonPrimitive::new(outline, style.area_fill));
}

pub(super) fn draw_stepline(context: &SeriesDrawContext<'_>, out: &mut LayerPrimitives) {
    let style = context.style;
    let path = close_path(context);
    let mut stepped = Vec::with_capacity(path.len() * 2);
    for (index, &(x, y)) in path.iter().enumerate() {
        if index > 0 {
            stepped.push((x, path[index - 1].1));
        }
        stepped.push((x, y));
    }
    push_polyline(&stepped, style.line_width, style.line_color, out);
}

pub(super) fn draw_hlc_area(context: &SeriesDrawContext<'_>, out: &mut LayerPrimitives) {
    let style = context.style;
    let mut high = Vec::new();
    let mut low = Vec::new();
    let mut close = Vec::new();
    for point in context.in_range() {
        let (Some(h), Some(l), Some(c)) = (point.high, point.low, point.close) else {
            continue;
        };
        let x = context.x(point.time);
        high.push((x, context.y(h)));
        low.push((x, context.y(l)));
        close.push((x, context.y(c)));
    }

    push_polyline(&high, style.line_width, style.up_color, out);
    push_polyline(&low, style.line_width, style.down_color, out);
    push_polyline(&close, style.line_width, style.line_color, out);

    if close.len() >= 2 {
        let reversed_close: Vec<_> = close.iter().rev().copied().collect();
        for (edge, fill) in [(high, style.hlc_high_fill), (low, style.hlc_low_fill)] {
            let mut outline = edge;
            outline.extend(reversed_close.iter().copied());
            out.polygons.push(PolygonPrimitive::new(outline, fill));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SeriesDrawContext, project_candles};
    use crate::api::ChartStyle;
    use crate::core::{Extent, Point, TimeRange, Viewport};

    #[test]
    fn candle_projection_skips_incomplete_samples() {
        let style = ChartStyle::default();
        let range = TimeRange::new(0, 600_000);
        let points = [
            Point::ohlc(0, 10.0, 12.0, 9.0, 11.0),
            Point::close(60_000, 11.0),
            Point::ohlc(120_000, 11.0, 13.0, 10.0, 10.5),
        ];
        let context = SeriesDrawContext {
            points: &points,
            extent: Extent::from_time_range(range, 8.0, 14.0),
            viewport: Viewport::new(600.0, 300.0),
            zoom: 1.0,
            pan: 0.0,
            step_size_ms: 60_000,
            pixel_per_ms: 0.001,
            time_range: range,
            style: &style,
        };
        let candles = project_candles(&context, 0.1);
        assert_eq!(candles.len(), 2);
        assert!(candles[0].is_bullish);
        assert!(!candles[1].is_bullish);
        // One 60 px bucket: 6 px gap, 54 px body centred in the bucket.
        assert!((candles[0].body_width - 54.0).abs() < 1e-9);
        assert!((candles[0].center_x - 30.0).abs() < 1e-9);
    }
}
