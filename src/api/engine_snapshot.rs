use serde::{Deserialize, Serialize};

use crate::core::{Extent, TimeRange, Viewport, VisibleWindow};
use crate::error::{ChartError, ChartResult};
use crate::interaction::{CrosshairState, InteractionMode};
use crate::render::Renderer;

use super::{ChartEngine, ChartType, FrameState, TimeLabelCacheStats};

/// Serializable view of the engine state used by regression tests and
/// debugging tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub viewport: Viewport,
    pub chart_type: ChartType,
    pub step_size_ms: i64,
    pub time_range: TimeRange,
    pub zoom: f64,
    pub pan: f64,
    pub max_pan: f64,
    pub visible_window: VisibleWindow,
    pub data_extent: Extent,
    pub visible_extent: Extent,
    pub point_count: usize,
    pub visible_point_count: usize,
    pub interaction_mode: InteractionMode,
    pub crosshair: CrosshairState,
    pub frame_state: FrameState,
    pub indicators: Vec<String>,
    pub time_label_cache: TimeLabelCacheStats,
}

impl<R: Renderer> ChartEngine<R> {
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let (start, end) = self.visible_bounds;
        EngineSnapshot {
            viewport: self.config.viewport,
            chart_type: self.chart_type,
            step_size_ms: self.config.step_size_ms,
            time_range: self.time_range,
            zoom: self.zoom,
            pan: self.pan,
            max_pan: self.max_pan_offset(),
            visible_window: self.visible_time_range(),
            data_extent: self.data_extent.extent(),
            visible_extent: self.visible_extent.extent(),
            point_count: self.points.len(),
            visible_point_count: end.saturating_sub(start),
            interaction_mode: self.interaction.mode(),
            crosshair: self.interaction.crosshair(),
            frame_state: self.scheduler.state(),
            indicators: self.indicators.keys().cloned().collect(),
            time_label_cache: self.time_labels.stats(),
        }
    }

    pub fn snapshot_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize snapshot: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{ChartEngine, ChartEngineConfig, EngineSnapshot};
    use crate::core::{Point, Viewport};
    use crate::render::NullRenderer;

    #[test]
    fn snapshot_json_round_trips() {
        let config = ChartEngineConfig::new(Viewport::new(640.0, 320.0)).with_chart_type("line");
        let mut engine = ChartEngine::new(NullRenderer::default(), config).expect("valid config");
        engine.draw((0..10).map(|i| Point::close(i * 60_000, 100.0 + i as f64)).collect());

        let json = engine.snapshot_json_pretty().expect("serialize");
        let parsed: EngineSnapshot = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, engine.snapshot());
        assert_eq!(parsed.point_count, 10);
        assert_eq!(parsed.visible_point_count, 10);
    }
}
