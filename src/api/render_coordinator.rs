use tracing::trace;

use crate::error::ChartResult;
use crate::render::Renderer;

use super::{ChartEngine, DirtyLayers};

impl<R: Renderer> ChartEngine<R> {
    /// Frame callback body: paints the dirty layers scheduled since the last
    /// frame.
    ///
    /// Returns `Ok(false)` when nothing was scheduled or the engine was
    /// disposed. Requests issued while the frame runs are coalesced into a
    /// single follow-up frame reported through
    /// [`ChartEngine::take_frame_request`].
    pub fn render_frame(&mut self) -> ChartResult<bool> {
        let Some(mut layers) = self.scheduler.begin_frame() else {
            return Ok(false);
        };

        let before = self.visible_extent.extent();
        self.recalculate_visible_extent();
        if self.visible_extent.extent() != before {
            // A streamed point rescaled the visible values: the incremental
            // layer alone would leave the base stale.
            layers |= DirtyLayers::full();
            self.reproject_crosshair();
        }

        let frame = self.build_render_frame(layers);
        let result = self.renderer.render(&frame);
        if let Some(command) = self.scheduler.end_frame() {
            self.push_frame_command(command);
        }
        result?;

        trace!(
            ?layers,
            lines = frame.line_count(),
            rects = frame.rect_count(),
            texts = frame.text_count(),
            "frame rendered"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{ChartEngine, ChartEngineConfig, DirtyLayers, FrameCommand};
    use crate::core::{Point, Viewport};
    use crate::render::{CanvasLayerKind, NullRenderer};

    fn engine() -> ChartEngine<NullRenderer> {
        let config = ChartEngineConfig::new(Viewport::new(800.0, 400.0));
        ChartEngine::new(NullRenderer::default(), config).expect("valid config")
    }

    #[test]
    fn render_without_request_is_a_no_op() {
        let mut engine = engine();
        assert!(!engine.render_frame().expect("render"));

        engine.request_redraw(DirtyLayers::CROSSHAIR);
        assert!(engine.render_frame().expect("render"));
        assert!(!engine.render_frame().expect("render"));
        assert_eq!(engine.renderer().frames_rendered, 1);
        assert_eq!(engine.renderer().last_layers, vec![CanvasLayerKind::Crosshair]);
    }

    #[test]
    fn full_redraw_paints_base_layers_in_order() {
        let mut engine = engine();
        let points = (0..20)
            .map(|i| Point::ohlc(i * 60_000, 10.0, 12.0 + i as f64, 9.0, 11.0))
            .collect();
        engine.draw(points);
        assert_eq!(engine.take_frame_request(), Some(FrameCommand::RequestFrame));
        assert!(engine.render_frame().expect("render"));

        let renderer = engine.renderer();
        assert_eq!(
            renderer.last_layers,
            vec![
                CanvasLayerKind::Grid,
                CanvasLayerKind::Series,
                CanvasLayerKind::Indicators,
                CanvasLayerKind::Panes,
                CanvasLayerKind::Crosshair,
                CanvasLayerKind::Axis,
            ]
        );
        assert_eq!(renderer.last_rect_count, 20);
        assert!(renderer.last_text_count > 0);
    }

    #[test]
    fn disposed_engine_skips_scheduled_frame() {
        let mut engine = engine();
        engine.request_redraw(DirtyLayers::CROSSHAIR);
        engine.dispose();
        assert!(!engine.render_frame().expect("render"));
        assert_eq!(engine.take_frame_request(), None);
    }
}
