use tracing::{debug, trace, warn};

use crate::core::{DataExtent, Point, StreamMerge, TimeRangeMode, aggregate, merge_next};
use crate::render::Renderer;

use super::{ChartEngine, DirtyLayers, SeriesController};

fn has_finite_fields(point: &Point) -> bool {
    [point.open, point.high, point.low, point.close, point.volume]
        .into_iter()
        .flatten()
        .all(f64::is_finite)
}

impl<R: Renderer> ChartEngine<R> {
    /// Replaces the whole dataset.
    ///
    /// Raw samples are retained for later re-bucketing; the aggregated series,
    /// both extents and the label candidates are rebuilt and a full redraw is
    /// requested. Samples carrying non-finite values are dropped.
    pub fn draw(&mut self, points: Vec<Point>) {
        let original_count = points.len();
        let mut points = points;
        points.retain(has_finite_fields);
        if points.len() != original_count {
            warn!(
                dropped = original_count - points.len(),
                "dropping samples with non-finite values"
            );
        }

        self.raw_points = points;
        self.rebuild_series();
        debug!(
            raw_count = self.raw_points.len(),
            aggregated_count = self.points.len(),
            range_start = self.time_range.start,
            range_end = self.time_range.end,
            "dataset replaced"
        );
        self.request_redraw(DirtyLayers::full());
    }

    /// Streams one sample into the chart.
    ///
    /// The sample merges into the last bucket or opens a new one. A full
    /// redraw is requested only when the full extent moved (or the auto range
    /// advanced); otherwise just the newest point is redrawn.
    pub fn draw_next_point(&mut self, point: Point) -> Option<StreamMerge> {
        if !has_finite_fields(&point) {
            warn!(time = point.time, "ignoring streamed sample with non-finite values");
            return None;
        }
        self.raw_points.push(point);

        let outcome = merge_next(&mut self.points, point, self.config.step_size_ms);
        let Some(&latest) = self.points.last() else {
            return Some(outcome);
        };

        let mut bounds_changed = self.data_extent.add_data_point(&latest);

        let range_changed = self.refresh_auto_time_range();
        if range_changed {
            // The x mapping moved, so every bound is re-derived.
            self.data_extent.recalculate(&self.points, self.time_range);
            self.clamp_pan();
            bounds_changed = true;
        }

        if range_changed {
            self.rebuild_time_label_candidates();
        } else if outcome == StreamMerge::Appended && latest.time >= self.time_range.start {
            self.time_labels.push_candidate(latest.time);
        }

        trace!(
            time = latest.time,
            ?outcome,
            bounds_changed,
            count = self.points.len(),
            "streamed sample"
        );

        if bounds_changed {
            self.request_redraw(DirtyLayers::full());
        } else {
            self.request_redraw(DirtyLayers::LATEST_POINT);
        }
        Some(outcome)
    }

    /// Re-derives the aggregated series and everything built from it.
    pub(super) fn rebuild_series(&mut self) {
        let step = self.config.step_size_ms;
        self.points = aggregate(&self.raw_points, step);
        self.time_range = self.config.time_range.resolve(&self.points, step);
        self.recreate_extents();
        self.rebuild_time_label_candidates();
    }

    /// Rebuilds both extents for the current chart type and series.
    pub(super) fn recreate_extents(&mut self) {
        let source = self.chart_type.extent_source();
        let padding = self.config.padding;
        self.data_extent = DataExtent::from_points(source, padding, &self.points, self.time_range);
        self.visible_extent = DataExtent::new(source, padding, self.time_range);
        self.clamp_pan();
        self.recalculate_visible_extent();
    }

    /// Re-resolves an auto range against the current series.
    ///
    /// Returns `true` when the effective range moved.
    fn refresh_auto_time_range(&mut self) -> bool {
        if !matches!(self.config.time_range, TimeRangeMode::Auto { .. }) {
            return false;
        }
        let resolved = self
            .config
            .time_range
            .resolve(&self.points, self.config.step_size_ms);
        if resolved == self.time_range {
            return false;
        }
        self.time_range = resolved;
        true
    }
}
