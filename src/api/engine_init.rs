use indexmap::IndexMap;
use tracing::debug;

use crate::core::DataExtent;
use crate::error::ChartResult;
use crate::extensions::{EventEmitter, IndicatorEvents};
use crate::interaction::InteractionState;
use crate::render::Renderer;

use super::axis_time_labels::TimeLabelCache;
use super::invalidation::FrameScheduler;
use super::label_formatter::{DefaultLabelFormatter, default_text_measurer};
use super::{ChartEngine, ChartEngineConfig, SeriesController};

impl<R: Renderer> ChartEngine<R> {
    /// Creates an empty engine.
    ///
    /// Fails on any configuration mistake, including an unknown chart type.
    pub fn new(renderer: R, config: ChartEngineConfig) -> ChartResult<Self> {
        let chart_type = config.validate()?;
        let time_range = config.time_range.resolve(&[], config.step_size_ms);
        let source = chart_type.extent_source();
        let data_extent = DataExtent::new(source, config.padding, time_range);
        let visible_extent = DataExtent::new(source, config.padding, time_range);

        debug!(
            chart_type = %chart_type,
            step_size_ms = config.step_size_ms,
            max_zoom = config.max_zoom,
            width = config.viewport.width,
            height = config.viewport.height,
            "chart engine created"
        );

        Ok(Self {
            renderer,
            config,
            chart_type,
            raw_points: Vec::new(),
            points: Vec::new(),
            time_range,
            data_extent,
            visible_extent,
            visible_bounds: (0, 0),
            zoom: 1.0,
            pan: 0.0,
            interaction: InteractionState::default(),
            scheduler: FrameScheduler::default(),
            pending_command: None,
            frame_requests: 0,
            time_labels: TimeLabelCache::default(),
            formatter: Box::new(DefaultLabelFormatter),
            measurer: default_text_measurer(),
            indicators: IndexMap::new(),
            indicator_events: IndicatorEvents::default(),
            click_listeners: EventEmitter::default(),
        })
    }
}
