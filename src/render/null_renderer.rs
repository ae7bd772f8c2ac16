use crate::error::ChartResult;
use crate::render::{CanvasLayerKind, RenderFrame, Renderer};

/// No-op renderer for tests and headless engine usage.
///
/// Frames are still validated so invalid geometry surfaces without a real
/// backend.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames_rendered: usize,
    pub last_layers: Vec<CanvasLayerKind>,
    pub last_line_count: usize,
    pub last_rect_count: usize,
    pub last_polygon_count: usize,
    pub last_text_count: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        self.frames_rendered += 1;
        self.last_layers = frame.layers.iter().map(|layer| layer.kind).collect();
        self.last_line_count = frame.line_count();
        self.last_rect_count = frame.rect_count();
        self.last_polygon_count = frame.polygon_count();
        self.last_text_count = frame.text_count();
        Ok(())
    }
}
