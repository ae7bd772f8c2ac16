use indexmap::IndexMap;
use tracing::debug;

use crate::core::{DataExtent, Point, TimeRange};
use crate::extensions::{EventEmitter, IndicatorEvents};
use crate::interaction::{ChartClick, InteractionMode, InteractionState};
use crate::render::Renderer;

use super::axis_time_labels::TimeLabelCache;
use super::indicator_controller::IndicatorEntry;
use super::invalidation::{FrameCommand, FrameScheduler};
use super::label_formatter::{LabelFormatter, TextMeasureFn};
use super::{ChartEngineConfig, ChartType, DirtyLayers};

/// Main orchestration facade consumed by host applications.
///
/// `ChartEngine` owns the raw and aggregated series, both extents, zoom and
/// pan, gesture state and the frame scheduler. Host callbacks feed it input
/// and poll [`ChartEngine::take_frame_request`]; drawing happens in
/// [`ChartEngine::render_frame`].
pub struct ChartEngine<R: Renderer> {
    pub(super) renderer: R,
    pub(super) config: ChartEngineConfig,
    pub(super) chart_type: ChartType,
    /// Samples exactly as supplied; re-bucketed on step changes.
    pub(super) raw_points: Vec<Point>,
    /// Step-aligned series, one point per bucket.
    pub(super) points: Vec<Point>,
    pub(super) time_range: TimeRange,
    pub(super) data_extent: DataExtent,
    pub(super) visible_extent: DataExtent,
    /// `[start, end)` of the last visible slice within `points`.
    pub(super) visible_bounds: (usize, usize),
    pub(super) zoom: f64,
    pub(super) pan: f64,
    pub(super) interaction: InteractionState,
    pub(super) scheduler: FrameScheduler,
    pub(super) pending_command: Option<FrameCommand>,
    pub(super) frame_requests: usize,
    pub(super) time_labels: TimeLabelCache,
    pub(super) formatter: Box<dyn LabelFormatter>,
    pub(super) measurer: TextMeasureFn,
    pub(super) indicators: IndexMap<String, IndicatorEntry>,
    pub(super) indicator_events: IndicatorEvents,
    pub(super) click_listeners: EventEmitter<ChartClick>,
}

impl<R: Renderer> ChartEngine<R> {
    #[must_use]
    pub fn config(&self) -> &ChartEngineConfig {
        &self.config
    }

    #[must_use]
    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// Aggregated series.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Samples as ingested, before bucketing.
    #[must_use]
    pub fn raw_points(&self) -> &[Point] {
        &self.raw_points
    }

    /// Effective configured range (resolved when auto ranging).
    #[must_use]
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    #[must_use]
    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    /// Replaces the label formatter, e.g. after a locale switch.
    ///
    /// Cached time labels are discarded and the chart is redrawn.
    pub fn set_label_formatter(&mut self, formatter: Box<dyn LabelFormatter>) {
        self.formatter = formatter;
        self.rebuild_time_label_candidates();
        debug!("label formatter replaced");
        self.request_redraw(DirtyLayers::full());
    }

    pub fn set_text_measurer(&mut self, measurer: TextMeasureFn) {
        self.measurer = measurer;
        self.request_redraw(DirtyLayers::full());
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
