use tracing::debug;

use crate::core::{TimeRangeMode, Viewport};
use crate::error::ChartResult;
use crate::render::Renderer;

use super::{ChartEngine, ChartStyle, ChartType, DirtyLayers};

impl<R: Renderer> ChartEngine<R> {
    /// Reconfigures range, step and zoom limit.
    ///
    /// Zoom, pan and every gesture reset to defaults, and the aggregated series
    /// is re-derived from the retained raw samples. On error nothing changes.
    pub fn update_core_options(
        &mut self,
        time_range: TimeRangeMode,
        step_size_ms: i64,
        max_zoom: f64,
    ) -> ChartResult<()> {
        let mut config = self.config.clone();
        config.time_range = time_range;
        config.step_size_ms = step_size_ms;
        config.max_zoom = max_zoom;
        config.validate()?;
        self.config = config;

        self.zoom = 1.0;
        self.pan = 0.0;
        self.interaction.reset();
        self.rebuild_series();
        debug!(
            step_size_ms,
            max_zoom,
            range_start = self.time_range.start,
            range_end = self.time_range.end,
            "core options updated"
        );
        self.request_redraw(DirtyLayers::full());
        Ok(())
    }

    /// Switches the series kind; extents are rebuilt for its value source.
    pub fn change_type(&mut self, chart_type: &str) -> ChartResult<()> {
        let chart_type = ChartType::from_id(chart_type)?;
        self.config.chart_type = chart_type.id().to_owned();
        self.chart_type = chart_type;
        self.recreate_extents();
        self.interaction.clear_crosshair();
        debug!(chart_type = %chart_type, "chart type changed");
        self.request_redraw(DirtyLayers::full());
        Ok(())
    }

    /// Applies a new plot size.
    ///
    /// The pan offset scales with the width ratio so the same time stays at
    /// the left edge, then is re-clamped.
    pub fn resize(&mut self, viewport: Viewport) -> ChartResult<()> {
        let viewport = viewport.validate()?;
        let old_width = self.config.viewport.width;
        self.config.viewport = viewport;
        if !self.points.is_empty() {
            self.pan *= viewport.width / old_width;
            self.clamp_pan();
        }
        self.recalculate_visible_extent();
        self.interaction.clear_crosshair();
        debug!(width = viewport.width, height = viewport.height, "chart resized");
        self.request_redraw(DirtyLayers::full());
        Ok(())
    }

    pub fn set_style(&mut self, style: ChartStyle) -> ChartResult<()> {
        style.validate()?;
        self.config.style = style;
        self.request_redraw(DirtyLayers::full());
        Ok(())
    }
}
