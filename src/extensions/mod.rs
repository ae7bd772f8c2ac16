//! Indicators and host notifications layered on top of the engine.

pub mod events;
pub mod indicators;
pub mod panes;

pub use events::{EventEmitter, IndicatorEvent, IndicatorEvents, ListenerId};
pub use indicators::{Indicator, IndicatorContext, MovingAverage, VolumeBars};
pub use panes::{PaneContext, PaneIndicator, RelativeStrength};
