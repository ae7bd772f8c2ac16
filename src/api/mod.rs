mod axis_ticks;
mod axis_time_labels;
mod chart_type;
mod crosshair_render_frame_builder;
mod data_controller;
mod engine;
mod engine_config;
mod engine_init;
mod engine_snapshot;
mod indicator_controller;
mod interaction_controller;
mod invalidation;
mod label_formatter;
mod options_controller;
mod render_coordinator;
mod render_frame_builder;
mod series_drawers;
mod snap_resolver;
mod visible_window_access;

pub use axis_ticks::{ValueAxisLabel, nice_step, value_axis_labels};
pub use axis_time_labels::{
    LabelPriority, PlacedTimeLabel, TimeAxisLabel, TimeLabelCache, TimeLabelCacheStats,
    TimeLabelRegime, place_time_labels,
};
pub use chart_type::{ChartType, PriceField, SeriesController};
pub use engine::ChartEngine;
pub use engine_config::{ChartEngineConfig, ChartStyle, InputConfig, LayoutConfig};
pub use engine_snapshot::EngineSnapshot;
pub use indicator_controller::PaneLayout;
pub use invalidation::{DirtyLayers, FrameCommand, FrameScheduler, FrameState};
pub use label_formatter::{
    DefaultLabelFormatter, LabelFormatter, TextMeasureFn, default_text_measurer,
    estimate_price_decimals, estimate_text_width, to_display_time,
};
pub use series_drawers::{CandleGeometry, SeriesDrawContext, project_candles};
pub use snap_resolver::nearest_point;
