use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_unix_millis, decimal_to_f64};
use crate::error::{ChartError, ChartResult};

/// Logical (density-independent) size of a drawing surface.
///
/// All pixel math happens in logical units; the raster backend applies the
/// device pixel ratio once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Converts a physical surface size into logical units.
    ///
    /// A missing or invalid ratio falls back to `1.0`.
    #[must_use]
    pub fn from_physical(width_px: u32, height_px: u32, device_pixel_ratio: f64) -> Self {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width: f64::from(width_px) / ratio,
            height: f64::from(height_px) / ratio,
        }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn validate(self) -> ChartResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ChartError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// One OHLCV sample keyed by time in milliseconds.
///
/// Value fields are optional so the same type carries pure line series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub time: i64,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Point {
    #[must_use]
    pub fn ohlc(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: None,
        }
    }

    #[must_use]
    pub fn ohlcv(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            volume: Some(volume),
            ..Self::ohlc(time, open, high, low, close)
        }
    }

    /// Close-only sample for line-type series.
    #[must_use]
    pub fn close(time: i64, close: f64) -> Self {
        Self {
            time,
            close: Some(close),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Converts strongly-typed temporal/decimal input into a sample.
    pub fn from_decimal_time(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Option<Decimal>,
    ) -> ChartResult<Self> {
        Ok(Self {
            time: datetime_to_unix_millis(time),
            open: Some(decimal_to_f64(open, "open")?),
            high: Some(decimal_to_f64(high, "high")?),
            low: Some(decimal_to_f64(low, "low")?),
            close: Some(decimal_to_f64(close, "close")?),
            volume: volume
                .map(|volume| decimal_to_f64(volume, "volume"))
                .transpose()?,
        })
    }

    /// Returns `true` when close is strictly above open.
    ///
    /// Samples missing either field are treated as bearish.
    #[must_use]
    pub fn is_bullish(self) -> bool {
        matches!((self.open, self.close), (Some(open), Some(close)) if close > open)
    }
}

/// Largest absolute time, in milliseconds, a configuration may name:
/// 100 000 000 days either side of the Unix epoch.
pub const MAX_TIME_MS: i64 = 8_640_000_000_000_000;

/// Nominal time window in the same unit as [`Point::time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.end as f64 - self.start as f64
    }

    #[must_use]
    pub fn contains(self, time: i64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// How the configured time window is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeRangeMode {
    /// Window supplied by configuration and replaced wholesale.
    Fixed { start: i64, end: i64 },
    /// First aggregated point to last point plus `lookahead_steps` empty steps.
    Auto { lookahead_steps: u32 },
}

impl Default for TimeRangeMode {
    fn default() -> Self {
        Self::Auto { lookahead_steps: 5 }
    }
}

impl TimeRangeMode {
    #[must_use]
    pub const fn fixed(range: TimeRange) -> Self {
        Self::Fixed {
            start: range.start,
            end: range.end,
        }
    }

    /// Resolves the effective window for an aggregated series.
    ///
    /// A degenerate window (including auto mode over an empty or single-point
    /// series without lookahead) is widened to one step so every extent keeps a
    /// non-zero time span. Bounds saturate at the `i64` limits.
    #[must_use]
    pub fn resolve(self, aggregated: &[Point], step_size: i64) -> TimeRange {
        let step = step_size.max(1);
        let range = match self {
            Self::Fixed { start, end } => TimeRange::new(start, end),
            Self::Auto { lookahead_steps } => match (aggregated.first(), aggregated.last()) {
                (Some(first), Some(last)) => TimeRange::new(
                    first.time,
                    last.time
                        .saturating_add(i64::from(lookahead_steps).saturating_mul(step)),
                ),
                _ => TimeRange::new(0, step),
            },
        };
        if range.end <= range.start {
            let start = range.start.min(i64::MAX - step);
            TimeRange::new(start, start + step)
        } else {
            range
        }
    }

    pub fn validate(self) -> ChartResult<Self> {
        if let Self::Fixed { start, end } = self {
            let domain = -MAX_TIME_MS..=MAX_TIME_MS;
            if !domain.contains(&start) || !domain.contains(&end) {
                return Err(ChartError::InvalidOption(format!(
                    "fixed time range must lie within ±{MAX_TIME_MS} ms (start={start}, end={end})"
                )));
            }
            if end <= start {
                return Err(ChartError::InvalidOption(format!(
                    "fixed time range must satisfy start < end (start={start}, end={end})"
                )));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_TIME_MS, Point, TimeRange, TimeRangeMode, Viewport};

    #[test]
    fn physical_size_is_divided_by_pixel_ratio() {
        let viewport = Viewport::from_physical(2000, 1000, 2.0);
        assert_eq!(viewport, Viewport::new(1000.0, 500.0));
        assert_eq!(Viewport::from_physical(300, 200, f64::NAN), Viewport::new(300.0, 200.0));
    }

    #[test]
    fn auto_range_spans_first_to_last_plus_lookahead() {
        let points = vec![Point::close(60_000, 1.0), Point::close(180_000, 2.0)];
        let range = TimeRangeMode::Auto { lookahead_steps: 2 }.resolve(&points, 60_000);
        assert_eq!(range, TimeRange::new(60_000, 300_000));
    }

    #[test]
    fn degenerate_ranges_are_widened_by_one_step() {
        let single = vec![Point::close(1_000, 1.0)];
        let range = TimeRangeMode::Auto { lookahead_steps: 0 }.resolve(&single, 500);
        assert_eq!(range, TimeRange::new(1_000, 1_500));
        assert_eq!(
            TimeRangeMode::Auto { lookahead_steps: 3 }.resolve(&[], 10),
            TimeRange::new(0, 10)
        );
    }

    #[test]
    fn inverted_fixed_range_is_rejected() {
        assert!(TimeRangeMode::Fixed { start: 5, end: 5 }.validate().is_err());
        assert!(TimeRangeMode::Fixed { start: 0, end: 5 }.validate().is_ok());
    }

    #[test]
    fn fixed_range_outside_the_time_domain_is_rejected() {
        let wide = TimeRangeMode::Fixed {
            start: i64::MIN / 2 - 10,
            end: i64::MAX / 2 + 10,
        };
        assert!(wide.validate().is_err());
        let edge = TimeRangeMode::Fixed {
            start: -MAX_TIME_MS,
            end: MAX_TIME_MS,
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn span_of_extreme_range_does_not_overflow() {
        assert_eq!(TimeRange::new(i64::MIN, i64::MAX).span(), 2.0 * i64::MAX as f64 + 1.0);
    }

    #[test]
    fn auto_range_saturates_instead_of_overflowing() {
        let points = vec![Point::close(i64::MAX - 10, 1.0)];
        let range = TimeRangeMode::Auto {
            lookahead_steps: u32::MAX,
        }
        .resolve(&points, i64::MAX / 4);
        assert_eq!(range, TimeRange::new(i64::MAX - 10, i64::MAX));

        let degenerate = TimeRangeMode::Auto { lookahead_steps: 0 }.resolve(&points, 60_000);
        assert_eq!(degenerate.end, i64::MAX);
        assert!(degenerate.start < degenerate.end);
    }
}
