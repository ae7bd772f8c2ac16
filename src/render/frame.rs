use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::error::{ChartError, ChartResult};
use crate::render::{LinePrimitive, PolygonPrimitive, RectPrimitive, TextPrimitive};

/// Canvas layers in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanvasLayerKind {
    Grid,
    Series,
    LatestPoint,
    Indicators,
    Panes,
    Crosshair,
    Axis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerPrimitives {
    pub kind: CanvasLayerKind,
    pub lines: Vec<LinePrimitive>,
    pub rects: Vec<RectPrimitive>,
    pub polygons: Vec<PolygonPrimitive>,
    pub texts: Vec<TextPrimitive>,
}

impl LayerPrimitives {
    #[must_use]
    pub fn new(kind: CanvasLayerKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
            rects: Vec::new(),
            polygons: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        for line in &self.lines {
            line.validate()?;
        }
        for rect in &self.rects {
            rect.validate()?;
        }
        for polygon in &self.polygons {
            polygon.validate()?;
        }
        for text in &self.texts {
            text.validate()?;
        }
        Ok(())
    }
}

/// Backend-agnostic scene for one draw pass.
///
/// Only layers repainted by the pass are present; a backend keeps the previous
/// content of every other layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub layers: Vec<LayerPrimitives>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            layers: Vec::new(),
        }
    }

    /// Returns the layer of `kind`, creating it in paint order if missing.
    pub fn layer_mut(&mut self, kind: CanvasLayerKind) -> &mut LayerPrimitives {
        let index = match self.layers.binary_search_by_key(&kind, |layer| layer.kind) {
            Ok(index) => index,
            Err(index) => {
                self.layers.insert(index, LayerPrimitives::new(kind));
                index
            }
        };
        &mut self.layers[index]
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.lines.len()).sum()
    }

    #[must_use]
    pub fn rect_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.rects.len()).sum()
    }

    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.polygons.len()).sum()
    }

    #[must_use]
    pub fn text_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.texts.len()).sum()
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        for layer in &self.layers {
            layer.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CanvasLayerKind, RenderFrame};
    use crate::core::Viewport;
    use crate::render::{Color, LinePrimitive};

    #[test]
    fn layers_are_kept_in_paint_order() {
        let mut frame = RenderFrame::new(Viewport::new(100.0, 100.0));
        let line = LinePrimitive::new(0.0, 0.0, 1.0, 1.0, 1.0, Color::rgb(0.0, 0.0, 0.0));
        for kind in [
            CanvasLayerKind::Crosshair,
            CanvasLayerKind::Grid,
            CanvasLayerKind::Series,
        ] {
            frame.layer_mut(kind).lines.push(line);
        }

        let kinds: Vec<_> = frame.layers.iter().map(|layer| layer.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CanvasLayerKind::Grid,
                CanvasLayerKind::Series,
                CanvasLayerKind::Crosshair
            ]
        );
        assert_eq!(frame.line_count(), 3);
    }
}
