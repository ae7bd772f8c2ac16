use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::render::{CanvasLayerKind, Renderer};

use super::ChartEngine;

/// Visual layers needing a repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirtyLayers {
    bits: u8,
}

impl DirtyLayers {
    /// Grid, axes and the whole series.
    pub const BASE: Self = Self { bits: 1 << 0 };
    /// Only the newest sample of the series.
    pub const LATEST_POINT: Self = Self { bits: 1 << 1 };
    /// Overlay indicators and indicator panes.
    pub const INDICATORS: Self = Self { bits: 1 << 2 };
    pub const CROSSHAIR: Self = Self { bits: 1 << 3 };

    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    /// Everything a full redraw repaints.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            bits: Self::BASE.bits | Self::INDICATORS.bits | Self::CROSSHAIR.bits,
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits && other.bits != 0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }

    /// Canvas layers a frame for this dirty set repaints.
    ///
    /// A base repaint supersedes the incremental latest-point layer.
    #[must_use]
    pub fn canvas_layers(self) -> Vec<CanvasLayerKind> {
        let mut layers = Vec::with_capacity(6);
        if self.contains(Self::BASE) {
            layers.extend([
                CanvasLayerKind::Grid,
                CanvasLayerKind::Series,
                CanvasLayerKind::Axis,
            ]);
        } else if self.contains(Self::LATEST_POINT) {
            layers.push(CanvasLayerKind::LatestPoint);
        }
        if self.contains(Self::INDICATORS) {
            layers.extend([CanvasLayerKind::Indicators, CanvasLayerKind::Panes]);
        }
        if self.contains(Self::CROSSHAIR) {
            layers.push(CanvasLayerKind::Crosshair);
        }
        layers.sort();
        layers
    }
}

impl std::ops::BitOr for DirtyLayers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for DirtyLayers {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Instruction for the host's frame primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameCommand {
    /// Schedule one frame callback that calls `render_frame`.
    RequestFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameState {
    Idle,
    Scheduled(DirtyLayers),
    Running { follow_up: Option<DirtyLayers> },
}

/// Coalesces redraw requests into at most one pending frame.
///
/// Pure transitions; the host owns the actual frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameScheduler {
    state: FrameState,
    disposed: bool,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self {
            state: FrameState::Idle,
            disposed: false,
        }
    }
}

impl FrameScheduler {
    #[must_use]
    pub fn state(self) -> FrameState {
        self.state
    }

    #[must_use]
    pub fn is_disposed(self) -> bool {
        self.disposed
    }

    /// Marks `layers` dirty.
    ///
    /// Only the first request after an idle period returns
    /// [`FrameCommand::RequestFrame`]; later ones widen the pending set.
    /// Requests during a running frame queue exactly one follow-up frame.
    pub fn request(&mut self, layers: DirtyLayers) -> Option<FrameCommand> {
        if self.disposed || layers.is_none() {
            return None;
        }
        match self.state {
            FrameState::Idle => {
                self.state = FrameState::Scheduled(layers);
                Some(FrameCommand::RequestFrame)
            }
            FrameState::Scheduled(pending) => {
                self.state = FrameState::Scheduled(pending | layers);
                None
            }
            FrameState::Running { follow_up } => {
                let merged = follow_up.map_or(layers, |pending| pending | layers);
                self.state = FrameState::Running {
                    follow_up: Some(merged),
                };
                None
            }
        }
    }

    /// Enters the frame callback. Returns the layers to paint, or `None` when
    /// nothing is scheduled or the scheduler was disposed.
    pub fn begin_frame(&mut self) -> Option<DirtyLayers> {
        if self.disposed {
            return None;
        }
        match self.state {
            FrameState::Scheduled(layers) => {
                self.state = FrameState::Running { follow_up: None };
                Some(layers)
            }
            FrameState::Idle | FrameState::Running { .. } => None,
        }
    }

    /// Leaves the frame callback, scheduling the follow-up frame if any
    /// request arrived while running.
    pub fn end_frame(&mut self) -> Option<FrameCommand> {
        match self.state {
            FrameState::Running {
                follow_up: Some(layers),
            } if !self.disposed => {
                self.state = FrameState::Scheduled(layers);
                Some(FrameCommand::RequestFrame)
            }
            FrameState::Running { .. } => {
                self.state = FrameState::Idle;
                None
            }
            FrameState::Idle | FrameState::Scheduled(_) => None,
        }
    }

    /// Stops all further scheduling.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.state = FrameState::Idle;
    }
}

impl<R: Renderer> ChartEngine<R> {
    /// Marks layers dirty and records a frame request for the host if this is
    /// the first request of the tick.
    pub fn request_redraw(&mut self, layers: DirtyLayers) {
        if let Some(command) = self.scheduler.request(layers) {
            trace!(?layers, "frame requested");
            self.push_frame_command(command);
        }
    }

    pub(super) fn push_frame_command(&mut self, command: FrameCommand) {
        self.frame_requests += 1;
        self.pending_command = Some(command);
    }

    /// Takes the outstanding frame request, if any.
    ///
    /// Hosts poll this after input or ingestion and schedule one callback
    /// invoking [`ChartEngine::render_frame`].
    pub fn take_frame_request(&mut self) -> Option<FrameCommand> {
        self.pending_command.take()
    }

    /// Number of frame callbacks requested since construction.
    #[must_use]
    pub fn frame_request_count(&self) -> usize {
        self.frame_requests
    }

    #[must_use]
    pub fn frame_state(&self) -> FrameState {
        self.scheduler.state()
    }

    /// Layers waiting for the next frame.
    #[must_use]
    pub fn pending_dirty_layers(&self) -> DirtyLayers {
        match self.scheduler.state() {
            FrameState::Scheduled(layers) => layers,
            FrameState::Running { follow_up } => follow_up.unwrap_or_default(),
            FrameState::Idle => DirtyLayers::none(),
        }
    }

    /// Detaches the engine from the host: no further frames are requested and
    /// an already scheduled `render_frame` becomes a no-op.
    pub fn dispose(&mut self) {
        self.scheduler.dispose();
        self.pending_command = None;
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.scheduler.is_disposed()
    }
}
