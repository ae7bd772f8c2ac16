use crate::render::{
    CanvasLayerKind, LayerPrimitives, LinePrimitive, RenderFrame, Renderer, TextHAlign,
    TextPrimitive,
};

use super::axis_ticks::value_axis_labels;
use super::axis_time_labels::PlacedTimeLabel;
use super::indicator_controller::IndicatorSlot;
use super::series_drawers::SeriesDrawContext;
use super::{ChartEngine, DirtyLayers, SeriesController};

/// Gap between the plot edge and value-axis text.
const AXIS_TEXT_INSET_PX: f64 = 5.0;
const PANE_BORDER_WIDTH_PX: f64 = 2.0;

/// Pushes `text` unless the formatter produced nothing to draw.
pub(super) fn push_label(out: &mut LayerPrimitives, text: TextPrimitive) {
    if !text.text.is_empty() {
        out.texts.push(text);
    }
}

impl<R: Renderer> ChartEngine<R> {
    /// Materializes every layer named by `layers`.
    ///
    /// Repainted layers are always present in the frame, even when empty, so
    /// backends clear their previous content.
    pub(super) fn build_render_frame(&mut self, layers: DirtyLayers) -> RenderFrame {
        let mut frame = RenderFrame::new(self.config.viewport);
        for kind in layers.canvas_layers() {
            frame.layer_mut(kind);
        }

        let time_labels = if layers.contains(DirtyLayers::BASE)
            || layers.contains(DirtyLayers::INDICATORS)
        {
            self.time_axis_labels()
        } else {
            Vec::new()
        };
        if layers.contains(DirtyLayers::BASE) {
            self.append_grid_and_axes(&mut frame, &time_labels);
            let (start, end) = self.visible_bounds;
            self.append_series(&mut frame, CanvasLayerKind::Series, start, end);
        } else if layers.contains(DirtyLayers::LATEST_POINT) {
            self.append_latest_point(&mut frame);
        }
        if layers.contains(DirtyLayers::INDICATORS) {
            self.append_indicators(&mut frame);
            self.append_panes(&mut frame, &time_labels);
        }
        if layers.contains(DirtyLayers::CROSSHAIR) {
            self.append_crosshair(&mut frame);
        }
        frame
    }

    fn series_context(&self, start: usize, end: usize) -> SeriesDrawContext<'_> {
        let end = end.min(self.points.len());
        SeriesDrawContext {
            points: self.points.get(start.min(end)..end).unwrap_or(&[]),
            extent: self.visible_extent.extent(),
            viewport: self.config.viewport,
            zoom: self.zoom,
            pan: self.pan,
            step_size_ms: self.config.step_size_ms,
            pixel_per_ms: self.pixel_per_ms(),
            time_range: self.time_range,
            style: &self.config.style,
        }
    }

    fn append_series(&self, frame: &mut RenderFrame, kind: CanvasLayerKind, start: usize, end: usize) {
        let context = self.series_context(start, end);
        self.chart_type.draw(&context, frame.layer_mut(kind));
    }

    /// Redraws only the newest bucket. Path-style series also redraw the
    /// segment joining it to its predecessor.
    fn append_latest_point(&self, frame: &mut RenderFrame) {
        let len = self.points.len();
        if len == 0 {
            return;
        }
        let tail = if self.chart_type.is_bucketed() { 1 } else { 2 };
        self.append_series(frame, CanvasLayerKind::LatestPoint, len.saturating_sub(tail), len);
    }

    fn append_grid_and_axes(&self, frame: &mut RenderFrame, time_labels: &[PlacedTimeLabel]) {
        let viewport = self.config.viewport;
        let layout = self.config.layout;
        let style = self.config.style;
        let font_size = layout.axis_font_size_px;

        let value_labels = value_axis_labels(
            self.visible_extent.extent(),
            viewport.height,
            font_size,
            layout.value_label_spacing_px,
        );

        let grid = frame.layer_mut(CanvasLayerKind::Grid);
        for label in &value_labels {
            grid.lines.push(LinePrimitive::new(
                0.0,
                label.y,
                viewport.width,
                label.y,
                style.grid_width,
                style.grid_color,
            ));
        }
        for placed in time_labels.iter().filter(|placed| placed.drawn) {
            grid.lines.push(LinePrimitive::new(
                placed.x,
                0.0,
                placed.x,
                viewport.height,
                style.grid_width,
                style.grid_color,
            ));
        }

        let axis = frame.layer_mut(CanvasLayerKind::Axis);
        // Baseline sits a third of the font below the anchor to centre glyphs.
        let baseline_shift = font_size / 3.0;
        for label in &value_labels {
            push_label(
                axis,
                TextPrimitive::new(
                    self.formatter.format_price(label.value),
                    viewport.width + AXIS_TEXT_INSET_PX,
                    label.y + baseline_shift,
                    font_size,
                    style.axis_text_color,
                    TextHAlign::Left,
                ),
            );
        }
        let time_baseline = viewport.height + layout.x_label_height_px / 2.0 + baseline_shift;
        for placed in time_labels.iter().filter(|placed| placed.drawn) {
            push_label(
                axis,
                TextPrimitive::new(
                    placed.label.text.clone(),
                    placed.x,
                    time_baseline,
                    font_size,
                    style.axis_text_color,
                    TextHAlign::Center,
                ),
            );
        }
    }

    fn append_indicators(&self, frame: &mut RenderFrame) {
        if self.points.is_empty() {
            return;
        }
        let context = self.indicator_context();
        let layer = frame.layer_mut(CanvasLayerKind::Indicators);
        for entry in self.indicators.values().filter(|entry| entry.visible) {
            if let IndicatorSlot::Overlay(indicator) = &entry.slot {
                indicator.draw(&context, layer);
            }
        }
    }

    /// Each visible pane: top border, time gridlines shared with the main
    /// plot, its own value gridlines and gutter labels, then the indicator.
    fn append_panes(&self, frame: &mut RenderFrame, time_labels: &[PlacedTimeLabel]) {
        let panes = self.pane_frames();
        if panes.is_empty() {
            return;
        }
        let viewport = self.config.viewport;
        let layout = self.config.layout;
        let style = self.config.style;
        let font_size = layout.axis_font_size_px;
        let layer = frame.layer_mut(CanvasLayerKind::Panes);

        for (indicator, pane) in &panes {
            let top = pane.layout.top;
            let height = pane.layout.height;
            layer.lines.push(LinePrimitive::new(
                0.0,
                top,
                viewport.width + layout.y_label_width_px,
                top,
                PANE_BORDER_WIDTH_PX,
                style.grid_color,
            ));
            for placed in time_labels.iter().filter(|placed| placed.drawn) {
                layer.lines.push(LinePrimitive::new(
                    placed.x,
                    top,
                    placed.x,
                    top + height,
                    style.grid_width,
                    style.grid_color,
                ));
            }
            let value_labels = value_axis_labels(
                pane.extent.extent(),
                height,
                font_size,
                layout.value_label_spacing_px,
            );
            for label in &value_labels {
                let y = top + label.y;
                layer.lines.push(LinePrimitive::new(
                    0.0,
                    y,
                    viewport.width,
                    y,
                    style.grid_width,
                    style.grid_color,
                ));
                push_label(
                    layer,
                    TextPrimitive::new(
                        self.formatter.format_price(label.value),
                        viewport.width + AXIS_TEXT_INSET_PX,
                        y + font_size / 3.0,
                        font_size,
                        style.axis_text_color,
                        TextHAlign::Left,
                    ),
                );
            }
            if !self.points.is_empty() {
                indicator.draw(&self.pane_context(pane), layer);
            }
        }
    }
}
