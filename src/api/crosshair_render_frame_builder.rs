use crate::core::Point;
use crate::render::{
    CanvasLayerKind, LinePrimitive, RectPrimitive, RenderFrame, Renderer, TextHAlign,
    TextPrimitive,
};

use super::label_formatter::{estimate_price_decimals, to_display_time};
use super::render_frame_builder::push_label;
use super::{ChartEngine, SeriesController};

const INFO_LINE_INSET_PX: f64 = 8.0;
const LABEL_BOX_PADDING_PX: f64 = 4.0;

impl<R: Renderer> ChartEngine<R> {
    /// Crosshair lines, the boxed axis labels under them, and the info line
    /// with the snapped sample's fields.
    pub(super) fn append_crosshair(&self, frame: &mut RenderFrame) {
        let crosshair = self.interaction.crosshair();
        if !crosshair.visible {
            return;
        }
        let (Some(point), Some(price)) = (crosshair.point, crosshair.price) else {
            return;
        };

        let viewport = self.config.viewport;
        let layout = self.config.layout;
        let style = self.config.style;
        let font_size = layout.axis_font_size_px;
        let box_height = font_size + 2.0 * LABEL_BOX_PADDING_PX;
        let decimals = estimate_price_decimals(
            self.visible_extent.extent().y_span(),
            viewport.height,
            layout.value_label_spacing_px,
        );
        let layer = frame.layer_mut(CanvasLayerKind::Crosshair);

        layer.lines.push(LinePrimitive::new(
            crosshair.x,
            0.0,
            crosshair.x,
            viewport.height,
            style.crosshair_width,
            style.crosshair_color,
        ));
        layer.lines.push(LinePrimitive::new(
            0.0,
            crosshair.pointer_y,
            viewport.width,
            crosshair.pointer_y,
            style.crosshair_width,
            style.crosshair_color,
        ));

        // Price box in the value gutter.
        layer.rects.push(RectPrimitive::filled(
            viewport.width,
            crosshair.pointer_y - box_height / 2.0,
            layout.y_label_width_px,
            box_height,
            style.crosshair_color,
        ));
        push_label(
            layer,
            TextPrimitive::new(
                self.formatter.format_tooltip_price(price, decimals),
                viewport.width + LABEL_BOX_PADDING_PX,
                crosshair.pointer_y + font_size / 3.0,
                font_size,
                style.axis_text_color,
                TextHAlign::Left,
            ),
        );

        // Date box in the time gutter, centred on the crosshair.
        let date_text = self
            .formatter
            .format_tooltip_date(to_display_time(point.time, self.config.utc_offset_minutes));
        let date_width = (self.measurer)(&date_text, font_size) + 2.0 * LABEL_BOX_PADDING_PX;
        layer.rects.push(RectPrimitive::filled(
            crosshair.x - date_width / 2.0,
            viewport.height,
            date_width.max(0.0),
            box_height,
            style.crosshair_color,
        ));
        push_label(
            layer,
            TextPrimitive::new(
                date_text,
                crosshair.x,
                viewport.height + box_height / 2.0 + font_size / 3.0,
                font_size,
                style.axis_text_color,
                TextHAlign::Center,
            ),
        );

        push_label(
            layer,
            TextPrimitive::new(
                self.crosshair_info_line(&point, decimals),
                INFO_LINE_INSET_PX,
                INFO_LINE_INSET_PX + font_size,
                font_size,
                style.axis_text_color,
                TextHAlign::Left,
            ),
        );
    }

    /// `O 1.00 H 2.00 L 0.50 C 1.50 V 1.2K SMA 1.25`, limited to the fields
    /// the series kind shows.
    fn crosshair_info_line(&self, point: &Point, decimals: usize) -> String {
        let mut parts = Vec::new();
        for field in self.chart_type.crosshair_fields() {
            if let Some(value) = field.value(point) {
                parts.push(format!(
                    "{} {}",
                    field.label(),
                    self.formatter.format_tooltip_price(value, decimals)
                ));
            }
        }
        if let Some(volume) = point.volume {
            parts.push(format!("V {}", self.formatter.format_volume(volume)));
        }
        let relative_y = self.interaction.crosshair().pointer_y / self.config.viewport.height;
        for (_, key, value) in self.indicator_readouts(point, relative_y) {
            if let Some(value) = value {
                parts.push(format!(
                    "{key} {}",
                    self.formatter.format_tooltip_price(value, decimals)
                ));
            }
        }
        parts.join(" ")
    }
}
