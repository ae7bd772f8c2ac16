use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::core::primitives::unix_millis_to_datetime;

/// Produces every piece of text the engine places on the chart.
///
/// Calendar methods receive the timestamp already shifted into the configured
/// display offset.
pub trait LabelFormatter {
    fn format_year(&self, time: DateTime<FixedOffset>) -> String;
    fn format_month(&self, time: DateTime<FixedOffset>) -> String;
    fn format_day(&self, time: DateTime<FixedOffset>) -> String;
    fn format_hour(&self, time: DateTime<FixedOffset>) -> String;
    fn format_price(&self, price: f64) -> String;
    fn format_tooltip_price(&self, price: f64, decimals: usize) -> String;
    fn format_tooltip_date(&self, time: DateTime<FixedOffset>) -> String;
    fn format_volume(&self, volume: f64) -> String;
}

/// Locale-neutral formatter backed by chrono patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultLabelFormatter;

impl LabelFormatter for DefaultLabelFormatter {
    fn format_year(&self, time: DateTime<FixedOffset>) -> String {
        time.format("%Y").to_string()
    }

    fn format_month(&self, time: DateTime<FixedOffset>) -> String {
        time.format("%b").to_string()
    }

    fn format_day(&self, time: DateTime<FixedOffset>) -> String {
        time.format("%-d").to_string()
    }

    fn format_hour(&self, time: DateTime<FixedOffset>) -> String {
        time.format("%H:%M").to_string()
    }

    fn format_price(&self, price: f64) -> String {
        if !price.is_finite() {
            return "nan".to_owned();
        }
        // Strip float noise left over from step accumulation.
        let rounded = (price * 1e10).round() / 1e10;
        format!("{rounded}")
    }

    fn format_tooltip_price(&self, price: f64, decimals: usize) -> String {
        format!("{price:.decimals$}")
    }

    fn format_tooltip_date(&self, time: DateTime<FixedOffset>) -> String {
        time.format("%b %-d, %Y %H:%M").to_string()
    }

    fn format_volume(&self, volume: f64) -> String {
        let magnitude = volume.abs();
        let (scaled, suffix) = if magnitude >= 1e9 {
            (volume / 1e9, "B")
        } else if magnitude >= 1e6 {
            (volume / 1e6, "M")
        } else if magnitude >= 1e3 {
            (volume / 1e3, "K")
        } else {
            return self.format_price(volume);
        };
        let text = format!("{scaled:.1}");
        let text = text.strip_suffix(".0").unwrap_or(&text);
        format!("{text}{suffix}")
    }
}

/// Measures rendered text width in logical pixels for a font size.
pub type TextMeasureFn = Arc<dyn Fn(&str, f64) -> f64 + Send + Sync + 'static>;

/// Deterministic monospace-style width estimate.
#[must_use]
pub fn estimate_text_width(text: &str, font_size_px: f64) -> f64 {
    text.chars().count() as f64 * font_size_px * 0.6
}

#[must_use]
pub fn default_text_measurer() -> TextMeasureFn {
    Arc::new(estimate_text_width)
}

/// Shifts engine milliseconds into a display offset.
///
/// Offsets outside chrono's accepted range fall back to UTC.
#[must_use]
pub fn to_display_time(time_ms: i64, utc_offset_minutes: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix());
    unix_millis_to_datetime(time_ms).with_timezone(&offset)
}

/// Decimal places needed to tell value labels apart.
///
/// Derives the step between `plot_height / label_spacing` evenly spaced labels
/// over `value_range`.
#[must_use]
pub fn estimate_price_decimals(value_range: f64, plot_height: f64, label_spacing: f64) -> usize {
    let max_labels = if label_spacing > 0.0 {
        (plot_height / label_spacing).floor()
    } else {
        0.0
    };
    let step = value_range / max_labels;
    if !step.is_finite() {
        return 0;
    }
    match step {
        s if s < 0.0001 => 5,
        s if s < 0.001 => 4,
        s if s < 0.01 => 3,
        s if s < 0.1 => 2,
        s if s < 1.0 => 1,
        _ => 0,
    }
}
