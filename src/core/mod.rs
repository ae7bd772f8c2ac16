pub mod aggregation;
pub mod data_extent;
pub mod extent;
pub mod primitives;
pub mod types;
pub mod windowing;

pub use aggregation::{StreamMerge, aggregate, bucket_time, merge_next};
pub use data_extent::{DataExtent, ExtentSource};
pub use extent::{Extent, ExtentPadding, MIN_VALUE_SPAN};
pub use types::{MAX_TIME_MS, Point, TimeRange, TimeRangeMode, Viewport};
pub use windowing::{
    VisibleWindow, max_pan_offset, pixel_per_ms, visible_slice_bounds, visible_time_window,
};
