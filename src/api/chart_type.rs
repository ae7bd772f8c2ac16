use serde::{Deserialize, Serialize};

use crate::core::{ExtentSource, Point};
use crate::error::{ChartError, ChartResult};
use crate::render::LayerPrimitives;

use super::series_drawers::{self, SeriesDrawContext};

/// Built-in series kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    Candle,
    HollowCandle,
    Bar,
    Line,
    Area,
    Stepline,
    HlcArea,
}

impl ChartType {
    pub const ALL: [Self; 7] = [
        Self::Candle,
        Self::HollowCandle,
        Self::Bar,
        Self::Line,
        Self::Area,
        Self::Stepline,
        Self::HlcArea,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Candle => "candle",
            Self::HollowCandle => "hollow-candle",
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Area => "area",
            Self::Stepline => "stepline",
            Self::HlcArea => "hlc-area",
        }
    }

    pub fn from_id(id: &str) -> ChartResult<Self> {
        Self::ALL
            .into_iter()
            .find(|chart_type| chart_type.id() == id)
            .ok_or_else(|| ChartError::UnknownChartType(id.to_owned()))
    }

    /// Whether samples occupy a whole bucket (bodies drawn across the step).
    #[must_use]
    pub const fn is_bucketed(self) -> bool {
        matches!(self, Self::Candle | Self::HollowCandle | Self::Bar)
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Sample field shown in the crosshair info line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl PriceField {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "O",
            Self::High => "H",
            Self::Low => "L",
            Self::Close => "C",
        }
    }

    #[must_use]
    pub fn value(self, point: &Point) -> Option<f64> {
        match self {
            Self::Open => point.open,
            Self::High => point.high,
            Self::Low => point.low,
            Self::Close => point.close,
        }
    }
}

/// Per-kind behavior the engine relies on.
pub trait SeriesController {
    fn extent_source(&self) -> ExtentSource;

    /// Projects the visible slice into primitives.
    fn draw(&self, context: &SeriesDrawContext<'_>, out: &mut LayerPrimitives);

    fn crosshair_fields(&self) -> &'static [PriceField];

    /// Offset added to a sample time to find its horizontal label/crosshair
    /// position.
    fn x_label_offset(&self, step_size_ms: i64) -> f64;

    /// Maps an inverse-projected time onto the bucket the pointer designates.
    fn snap_time(&self, raw_time: f64, step_size_ms: i64) -> i64;
}

const OHLC_FIELDS: [PriceField; 4] = [
    PriceField::Open,
    PriceField::High,
    PriceField::Low,
    PriceField::Close,
];
const HLC_FIELDS: [PriceField; 3] = [PriceField::High, PriceField::Low, PriceField::Close];
const CLOSE_FIELDS: [PriceField; 1] = [PriceField::Close];

impl SeriesController for ChartType {
    fn extent_source(&self) -> ExtentSource {
        match self {
            Self::Candle | Self::HollowCandle | Self::Bar | Self::HlcArea => ExtentSource::LowHigh,
            Self::Line | Self::Area | Self::Stepline => ExtentSource::Close,
        }
    }

    fn draw(&self, context: &SeriesDrawContext<'_>, out: &mut LayerPrimitives) {
        match self {
            Self::Candle => series_drawers::draw_candles(context, 0.1, false, out),
            Self::HollowCandle => series_drawers::draw_candles(context, 0.3, true, out),
            Self::Bar => series_drawers::draw_bars(context, 0.1, out),
            Self::Line => series_drawers::draw_line(context, out),
            Self::Area => series_drawers::draw_area(context, out),
            Self::Stepline => series_drawers::draw_stepline(context, out),
            Self::HlcArea => series_drawers::draw_hlc_area(context, out),
        }
    }

    fn crosshair_fields(&self) -> &'static [PriceField] {
        match self {
            Self::Candle | Self::HollowCandle | Self::Bar => &OHLC_FIELDS,
            Self::HlcArea => &HLC_FIELDS,
            Self::Line | Self::Area | Self::Stepline => &CLOSE_FIELDS,
        }
    }

    fn x_label_offset(&self, step_size_ms: i64) -> f64 {
        if self.is_bucketed() {
            step_size_ms as f64 / 2.0
        } else {
            0.0
        }
    }

    fn snap_time(&self, raw_time: f64, step_size_ms: i64) -> i64 {
        let step = step_size_ms.max(1) as f64;
        let buckets = if self.is_bucketed() {
            (raw_time / step).floor()
        } else {
            (raw_time / step).round()
        };
        (buckets * step) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartType, PriceField, SeriesController};
    use crate::core::ExtentSource;
    use crate::error::ChartError;

    #[test]
    fn ids_round_trip_and_unknown_fails() {
        for chart_type in ChartType::ALL {
            assert_eq!(ChartType::from_id(chart_type.id()).ok(), Some(chart_type));
        }
        assert!(matches!(
            ChartType::from_id("renko"),
            Err(ChartError::UnknownChartType(id)) if id == "renko"
        ));
    }

    #[test]
    fn ohlc_types_snap_to_containing_bucket() {
        assert_eq!(ChartType::Candle.snap_time(119_999.0, 60_000), 60_000);
        assert_eq!(ChartType::Line.snap_time(119_999.0, 60_000), 120_000);
        assert_eq!(ChartType::Candle.x_label_offset(60_000), 30_000.0);
        assert_eq!(ChartType::HlcArea.x_label_offset(60_000), 0.0);
    }

    #[test]
    fn extent_sources_follow_series_shape() {
        assert_eq!(ChartType::HlcArea.extent_source(), ExtentSource::LowHigh);
        assert_eq!(ChartType::Stepline.extent_source(), ExtentSource::Close);
        assert_eq!(ChartType::Area.crosshair_fields(), &[PriceField::Close]);
    }
}
