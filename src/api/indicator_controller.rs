use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{DataExtent, ExtentPadding, ExtentSource, Point};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{
    Indicator, IndicatorContext, IndicatorEvent, ListenerId, PaneContext, PaneIndicator,
};
use crate::render::Renderer;

use super::{ChartEngine, DirtyLayers, SeriesController};

/// Registered indicator: drawn over the series or in its own pane.
pub(crate) enum IndicatorSlot {
    Overlay(Box<dyn Indicator>),
    Pane(Box<dyn PaneIndicator>),
}

impl IndicatorSlot {
    fn id(&self) -> &str {
        match self {
            Self::Overlay(indicator) => indicator.id(),
            Self::Pane(indicator) => indicator.id(),
        }
    }

    pub(crate) fn key(&self) -> &str {
        match self {
            Self::Overlay(indicator) => indicator.key(),
            Self::Pane(indicator) => indicator.key(),
        }
    }
}

pub(crate) struct IndicatorEntry {
    pub(crate) slot: IndicatorSlot,
    pub(crate) visible: bool,
}

/// Surface placement of one visible indicator pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneLayout {
    pub id: String,
    /// Surface y of the pane's top edge, below the time axis.
    pub top: f64,
    pub height: f64,
}

/// Pane content resolved for one frame.
pub(crate) struct PaneFrame {
    pub(crate) layout: PaneLayout,
    pub(crate) values: Vec<Option<f64>>,
    pub(crate) extent: DataExtent,
}

impl<R: Renderer> ChartEngine<R> {
    /// Registers an overlay indicator on top of the stack.
    ///
    /// Fails when another indicator already uses the same id.
    pub fn add_indicator(&mut self, indicator: Box<dyn Indicator>) -> ChartResult<()> {
        self.insert_indicator(IndicatorSlot::Overlay(indicator))
    }

    /// Registers an indicator drawn in its own pane under the time axis.
    ///
    /// Panes stack in registration order. Ids are shared with overlay
    /// indicators.
    pub fn add_pane_indicator(&mut self, indicator: Box<dyn PaneIndicator>) -> ChartResult<()> {
        self.insert_indicator(IndicatorSlot::Pane(indicator))
    }

    fn insert_indicator(&mut self, slot: IndicatorSlot) -> ChartResult<()> {
        let id = slot.id().to_owned();
        if self.indicators.contains_key(&id) {
            return Err(ChartError::InvalidOption(format!(
                "indicator id `{id}` is already registered"
            )));
        }
        debug!(id = %id, key = slot.key(), "indicator added");
        self.indicators.insert(
            id,
            IndicatorEntry {
                slot,
                visible: true,
            },
        );
        self.request_redraw(DirtyLayers::INDICATORS);
        Ok(())
    }

    /// Drops every indicator of the same kind and pushes `indicator` on top.
    ///
    /// Used to apply changed settings.
    pub fn replace_indicator(&mut self, indicator: Box<dyn Indicator>) {
        self.replace_slot(IndicatorSlot::Overlay(indicator));
    }

    /// Pane counterpart of [`ChartEngine::replace_indicator`].
    pub fn replace_pane_indicator(&mut self, indicator: Box<dyn PaneIndicator>) {
        self.replace_slot(IndicatorSlot::Pane(indicator));
    }

    fn replace_slot(&mut self, slot: IndicatorSlot) {
        let key = slot.key().to_owned();
        self.indicators.retain(|_, entry| entry.slot.key() != key);
        let id = slot.id().to_owned();
        // A same-id indicator of another kind is replaced as well.
        self.indicators.shift_remove(&id);
        debug!(id = %id, key = %key, "indicator replaced");
        self.indicators.insert(
            id,
            IndicatorEntry {
                slot,
                visible: true,
            },
        );
        self.request_redraw(DirtyLayers::INDICATORS);
    }

    /// Returns `false` when no indicator has this id.
    pub fn remove_indicator(&mut self, id: &str) -> bool {
        if self.indicators.shift_remove(id).is_none() {
            return false;
        }
        self.indicator_events.emit(&IndicatorEvent::Removed { id: id.to_owned() });
        self.request_redraw(DirtyLayers::INDICATORS);
        true
    }

    pub fn set_indicator_visible(&mut self, id: &str, visible: bool) -> bool {
        let Some(entry) = self.indicators.get_mut(id) else {
            return false;
        };
        if entry.visible != visible {
            entry.visible = visible;
            self.indicator_events.emit(&IndicatorEvent::VisibilityChanged {
                id: id.to_owned(),
                visible,
            });
            self.request_redraw(DirtyLayers::INDICATORS);
        }
        true
    }

    /// Asks the host to show the settings of an indicator.
    pub fn open_indicator_settings(&mut self, id: &str) -> bool {
        if !self.indicators.contains_key(id) {
            return false;
        }
        self.indicator_events
            .emit(&IndicatorEvent::SettingsOpen { id: id.to_owned() });
        true
    }

    #[must_use]
    pub fn indicator_ids(&self) -> Vec<&str> {
        self.indicators.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn is_indicator_visible(&self, id: &str) -> Option<bool> {
        self.indicators.get(id).map(|entry| entry.visible)
    }

    pub fn on_indicator_event(
        &mut self,
        listener: impl FnMut(&IndicatorEvent) + 'static,
    ) -> ListenerId {
        self.indicator_events.on(listener)
    }

    pub fn off_indicator_event(&mut self, id: ListenerId) -> bool {
        self.indicator_events.off(id)
    }

    /// Placement of the visible panes; hidden panes collapse.
    #[must_use]
    pub fn pane_layout(&self) -> Vec<PaneLayout> {
        let height = self.config.layout.pane_height_px;
        let first_top = self.config.viewport.height + self.config.layout.x_label_height_px;
        self.indicators
            .iter()
            .filter(|(_, entry)| entry.visible && matches!(entry.slot, IndicatorSlot::Pane(_)))
            .enumerate()
            .map(|(index, (id, _))| PaneLayout {
                id: id.clone(),
                top: first_top + index as f64 * height,
                height,
            })
            .collect()
    }

    /// Height of the whole surface: plot, time axis and visible panes.
    #[must_use]
    pub fn surface_height(&self) -> f64 {
        let layout = self.config.layout;
        let panes = self.pane_layout().len() as f64;
        self.config.viewport.height + layout.x_label_height_px + panes * layout.pane_height_px
    }

    /// Values of the visible indicators at the crosshair sample, in stacking
    /// order.
    ///
    /// Pane indicators receive the crosshair height relative to the main plot.
    #[must_use]
    pub fn indicator_values_at_crosshair(&self) -> Vec<(String, Option<f64>)> {
        let crosshair = self.interaction.crosshair();
        let Some(point) = crosshair.point else {
            return Vec::new();
        };
        let relative_y = crosshair.pointer_y / self.config.viewport.height;
        self.indicator_readouts(&point, relative_y)
            .into_iter()
            .map(|(id, _, value)| (id.to_owned(), value))
            .collect()
    }

    /// Readout of one pane for a pointer at `relative_y` within it, at the
    /// crosshair time.
    #[must_use]
    pub fn pane_crosshair_value(&self, id: &str, relative_y: f64) -> Option<f64> {
        let time = self.interaction.crosshair().point?.time;
        let entry = self.indicators.get(id).filter(|entry| entry.visible)?;
        let IndicatorSlot::Pane(indicator) = &entry.slot else {
            return None;
        };
        let layout = self.pane_layout().into_iter().find(|layout| layout.id == id)?;
        let pane = self.pane_frame(indicator.as_ref(), layout);
        indicator.crosshair_value(&self.pane_context(&pane), time, relative_y)
    }

    /// `(id, key, value)` of every visible indicator at `point`.
    pub(super) fn indicator_readouts(
        &self,
        point: &Point,
        relative_y: f64,
    ) -> Vec<(&str, &str, Option<f64>)> {
        let overlay = self.indicator_context();
        let mut panes = self.pane_layout().into_iter();
        self.indicators
            .iter()
            .filter(|(_, entry)| entry.visible)
            .map(|(id, entry)| {
                let value = match &entry.slot {
                    IndicatorSlot::Overlay(indicator) => indicator.crosshair_value(&overlay, point),
                    IndicatorSlot::Pane(indicator) => panes.next().and_then(|layout| {
                        let pane = self.pane_frame(indicator.as_ref(), layout);
                        indicator.crosshair_value(&self.pane_context(&pane), point.time, relative_y)
                    }),
                };
                (id.as_str(), entry.slot.key(), value)
            })
            .collect()
    }

    /// Resolved content of every visible pane, in stacking order.
    pub(super) fn pane_frames(&self) -> Vec<(&dyn PaneIndicator, PaneFrame)> {
        let mut panes = self.pane_layout().into_iter();
        self.indicators
            .values()
            .filter(|entry| entry.visible)
            .filter_map(|entry| match &entry.slot {
                IndicatorSlot::Pane(indicator) => panes
                    .next()
                    .map(|layout| (indicator.as_ref(), self.pane_frame(indicator.as_ref(), layout))),
                IndicatorSlot::Overlay(_) => None,
            })
            .collect()
    }

    /// Computes a pane's series and scales its extent to the visible part.
    fn pane_frame(&self, indicator: &dyn PaneIndicator, layout: PaneLayout) -> PaneFrame {
        let values = indicator.values(&self.points);
        let (start, end) = self.visible_bounds;
        let end = end.min(self.points.len()).min(values.len());
        let visible: Vec<Point> = self.points[start.min(end)..end]
            .iter()
            .zip(&values[start.min(end)..end])
            .filter_map(|(point, value)| value.map(|value| Point::close(point.time, value)))
            .collect();
        let extent = DataExtent::from_points(
            ExtentSource::Close,
            ExtentPadding::pane(),
            &visible,
            self.time_range,
        );
        PaneFrame {
            layout,
            values,
            extent,
        }
    }

    pub(super) fn pane_context<'a>(&'a self, pane: &'a PaneFrame) -> PaneContext<'a> {
        PaneContext {
            points: &self.points,
            values: &pane.values,
            visible: self.visible_bounds,
            extent: pane.extent.extent(),
            top: pane.layout.top,
            width: self.config.viewport.width,
            height: pane.layout.height,
            zoom: self.zoom,
            pan: self.pan,
            x_label_offset: self.chart_type.x_label_offset(self.config.step_size_ms),
            style: &self.config.style,
        }
    }

    pub(super) fn indicator_context(&self) -> IndicatorContext<'_> {
        let step_size_ms = self.config.step_size_ms;
        IndicatorContext {
            points: &self.points,
            visible: self.visible_bounds,
            extent: self.visible_extent.extent(),
            viewport: self.config.viewport,
            zoom: self.zoom,
            pan: self.pan,
            step_px: step_size_ms as f64 * self.pixel_per_ms(),
            x_label_offset: self.chart_type.x_label_offset(step_size_ms),
            visible_extent: &self.visible_extent,
            volume_height_fraction: self.config.layout.volume_height_fraction,
            style: &self.config.style,
        }
    }
}
