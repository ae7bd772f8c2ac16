use serde::{Deserialize, Serialize};

use crate::core::{ExtentPadding, MAX_TIME_MS, TimeRange, TimeRangeMode, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::render::Color;

use super::ChartType;

/// Gutter sizes and label spacing of the chart surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Width of the value-axis gutter right of the plot.
    #[serde(default = "default_y_label_width_px")]
    pub y_label_width_px: f64,
    /// Height of the time-axis gutter below the plot.
    #[serde(default = "default_x_label_height_px")]
    pub x_label_height_px: f64,
    /// Horizontal padding reserved around each time label.
    #[serde(default = "default_time_label_padding_px")]
    pub time_label_padding_px: f64,
    /// Vertical spacing between value labels.
    #[serde(default = "default_value_label_spacing_px")]
    pub value_label_spacing_px: f64,
    #[serde(default = "default_axis_font_size_px")]
    pub axis_font_size_px: f64,
    /// Fraction of the plot height used by the tallest volume bar.
    #[serde(default = "default_volume_height_fraction")]
    pub volume_height_fraction: f64,
    /// Height of each indicator pane stacked under the time axis.
    #[serde(default = "default_pane_height_px")]
    pub pane_height_px: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            y_label_width_px: default_y_label_width_px(),
            x_label_height_px: default_x_label_height_px(),
            time_label_padding_px: default_time_label_padding_px(),
            value_label_spacing_px: default_value_label_spacing_px(),
            axis_font_size_px: default_axis_font_size_px(),
            volume_height_fraction: default_volume_height_fraction(),
            pane_height_px: default_pane_height_px(),
        }
    }
}

/// Pointer and touch tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Zoom factor applied for wheel deltas towards the user (`delta_y < 0`).
    #[serde(default = "default_wheel_zoom_in_factor")]
    pub wheel_zoom_in_factor: f64,
    #[serde(default = "default_wheel_zoom_out_factor")]
    pub wheel_zoom_out_factor: f64,
    /// Hold duration that toggles the touch crosshair.
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    /// On touch-capable surfaces the crosshair follows the pointer only while
    /// the touch crosshair is active.
    #[serde(default)]
    pub touch_capable: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_in_factor: default_wheel_zoom_in_factor(),
            wheel_zoom_out_factor: default_wheel_zoom_out_factor(),
            long_press_ms: default_long_press_ms(),
            touch_capable: false,
        }
    }
}

/// Colors and stroke widths of the built-in drawers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub up_color: Color,
    pub down_color: Color,
    pub line_color: Color,
    pub line_width: f64,
    pub area_fill: Color,
    pub hlc_high_fill: Color,
    pub hlc_low_fill: Color,
    pub grid_color: Color,
    pub grid_width: f64,
    pub axis_text_color: Color,
    pub crosshair_color: Color,
    pub crosshair_width: f64,
    pub volume_alpha: f64,
    pub indicator_line_width: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        let up = Color::rgb(96.0 / 255.0, 152.0 / 255.0, 149.0 / 255.0);
        let down = Color::rgb(242.0 / 255.0, 54.0 / 255.0, 69.0 / 255.0);
        let line = Color::rgb(41.0 / 255.0, 98.0 / 255.0, 1.0);
        Self {
            up_color: up,
            down_color: down,
            line_color: line,
            line_width: 1.0,
            area_fill: line.with_alpha(0.4),
            hlc_high_fill: up.with_alpha(0.1),
            hlc_low_fill: down.with_alpha(0.1),
            grid_color: Color::rgb(242.0 / 255.0, 243.0 / 255.0, 243.0 / 255.0),
            grid_width: 1.0,
            axis_text_color: Color::rgb(0.0, 0.0, 0.0),
            crosshair_color: Color::rgb(149.0 / 255.0, 152.0 / 255.0, 161.0 / 255.0),
            crosshair_width: 1.0,
            volume_alpha: 0.3,
            indicator_line_width: 1.0,
        }
    }
}

impl ChartStyle {
    pub fn validate(&self) -> ChartResult<()> {
        for color in [
            self.up_color,
            self.down_color,
            self.line_color,
            self.area_fill,
            self.hlc_high_fill,
            self.hlc_low_fill,
            self.grid_color,
            self.axis_text_color,
            self.crosshair_color,
        ] {
            color.validate()?;
        }
        for (name, width) in [
            ("line_width", self.line_width),
            ("grid_width", self.grid_width),
            ("crosshair_width", self.crosshair_width),
            ("indicator_line_width", self.indicator_line_width),
        ] {
            if !width.is_finite() || width <= 0.0 {
                return Err(ChartError::InvalidOption(format!(
                    "style `{name}` must be finite and > 0"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.volume_alpha) {
            return Err(ChartError::InvalidOption(
                "style `volume_alpha` must be in [0, 1]".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Public engine bootstrap configuration.
///
/// Serializable so hosts can persist and reload a chart setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEngineConfig {
    /// Logical size of the main plot area (axes gutters excluded).
    pub viewport: Viewport,
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
    #[serde(default = "default_step_size_ms")]
    pub step_size_ms: i64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    #[serde(default)]
    pub time_range: TimeRangeMode,
    #[serde(default)]
    pub padding: ExtentPadding,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub input: InputConfig,
    /// Fixed offset used to classify time labels into calendar units.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub style: ChartStyle,
}

impl ChartEngineConfig {
    /// Minimal config: candles, one-minute steps, auto time range.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            chart_type: default_chart_type(),
            step_size_ms: default_step_size_ms(),
            max_zoom: default_max_zoom(),
            time_range: TimeRangeMode::default(),
            padding: ExtentPadding::default(),
            layout: LayoutConfig::default(),
            input: InputConfig::default(),
            utc_offset_minutes: 0,
            style: ChartStyle::default(),
        }
    }

    #[must_use]
    pub fn with_chart_type(mut self, chart_type: impl Into<String>) -> Self {
        self.chart_type = chart_type.into();
        self
    }

    #[must_use]
    pub fn with_step_size_ms(mut self, step_size_ms: i64) -> Self {
        self.step_size_ms = step_size_ms;
        self
    }

    #[must_use]
    pub fn with_max_zoom(mut self, max_zoom: f64) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    #[must_use]
    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = TimeRangeMode::fixed(range);
        self
    }

    #[must_use]
    pub fn with_auto_time_range(mut self, lookahead_steps: u32) -> Self {
        self.time_range = TimeRangeMode::Auto { lookahead_steps };
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: ExtentPadding) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_input(mut self, input: InputConfig) -> Self {
        self.input = input;
        self
    }

    #[must_use]
    pub fn with_touch_capable(mut self, touch_capable: bool) -> Self {
        self.input.touch_capable = touch_capable;
        self
    }

    #[must_use]
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ChartError::InvalidData(format!("failed to parse engine config: {e}")))
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ChartError::InvalidData(format!("failed to serialize engine config: {e}"))
        })
    }

    /// Checks every option and resolves the chart type.
    pub fn validate(&self) -> ChartResult<ChartType> {
        self.viewport.validate()?;
        let chart_type = ChartType::from_id(&self.chart_type)?;
        if self.step_size_ms <= 0 || self.step_size_ms > MAX_TIME_MS {
            return Err(ChartError::InvalidOption(format!(
                "step size must be in (0, {MAX_TIME_MS}] ms (got {})",
                self.step_size_ms
            )));
        }
        if !self.max_zoom.is_finite() || self.max_zoom < 1.0 {
            return Err(ChartError::InvalidOption(format!(
                "max zoom must be finite and >= 1 (got {})",
                self.max_zoom
            )));
        }
        self.time_range.validate()?;
        validate_padding(self.padding)?;
        validate_layout(self.layout)?;
        validate_input(self.input)?;
        self.style.validate()?;
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ChartError::InvalidOption(format!(
                "utc offset must be within one day (got {} minutes)",
                self.utc_offset_minutes
            )));
        }
        Ok(chart_type)
    }
}

fn validate_padding(padding: ExtentPadding) -> ChartResult<()> {
    for (name, value) in [("top", padding.top), ("bottom", padding.bottom)] {
        if !value.is_finite() || value < 0.0 {
            return Err(ChartError::InvalidOption(format!(
                "padding `{name}` must be finite and >= 0"
            )));
        }
    }
    Ok(())
}

fn validate_layout(layout: LayoutConfig) -> ChartResult<()> {
    for (name, value) in [
        ("y_label_width_px", layout.y_label_width_px),
        ("x_label_height_px", layout.x_label_height_px),
        ("time_label_padding_px", layout.time_label_padding_px),
        ("value_label_spacing_px", layout.value_label_spacing_px),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ChartError::InvalidOption(format!(
                "layout `{name}` must be finite and >= 0"
            )));
        }
    }
    for (name, value) in [
        ("axis_font_size_px", layout.axis_font_size_px),
        ("pane_height_px", layout.pane_height_px),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ChartError::InvalidOption(format!(
                "layout `{name}` must be finite and > 0"
            )));
        }
    }
    if !(0.0..=1.0).contains(&layout.volume_height_fraction) {
        return Err(ChartError::InvalidOption(
            "volume height fraction must be in [0, 1]".to_owned(),
        ));
    }
    Ok(())
}

fn validate_input(input: InputConfig) -> ChartResult<()> {
    if !input.wheel_zoom_in_factor.is_finite() || input.wheel_zoom_in_factor <= 1.0 {
        return Err(ChartError::InvalidOption(
            "wheel zoom-in factor must be finite and > 1".to_owned(),
        ));
    }
    if !input.wheel_zoom_out_factor.is_finite()
        || input.wheel_zoom_out_factor <= 0.0
        || input.wheel_zoom_out_factor >= 1.0
    {
        return Err(ChartError::InvalidOption(
            "wheel zoom-out factor must be in (0, 1)".to_owned(),
        ));
    }
    Ok(())
}

fn default_chart_type() -> String {
    ChartType::Candle.id().to_owned()
}

fn default_step_size_ms() -> i64 {
    60_000
}

fn default_max_zoom() -> f64 {
    10.0
}

fn default_y_label_width_px() -> f64 {
    80.0
}

fn default_x_label_height_px() -> f64 {
    30.0
}

fn default_time_label_padding_px() -> f64 {
    20.0
}

fn default_value_label_spacing_px() -> f64 {
    30.0
}

fn default_axis_font_size_px() -> f64 {
    12.0
}

fn default_volume_height_fraction() -> f64 {
    0.2
}

fn default_pane_height_px() -> f64 {
    120.0
}

fn default_wheel_zoom_in_factor() -> f64 {
    1.1
}

fn default_wheel_zoom_out_factor() -> f64 {
    0.9
}

fn default_long_press_ms() -> u64 {
    500
}
