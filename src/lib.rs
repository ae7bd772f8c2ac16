//! finchart: viewport and coordinate engine for streaming OHLCV charts.
//!
//! The crate owns the data-space/pixel-space mapping under zoom and pan, the
//! fixed-step aggregation of raw points, visible-window slicing, axis label
//! layout and the pointer/touch interaction state machine. Drawing backends
//! consume the backend-agnostic frames produced by [`api::ChartEngine`].

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{ChartEngine, ChartEngineConfig};
pub use error::{ChartError, ChartResult};
