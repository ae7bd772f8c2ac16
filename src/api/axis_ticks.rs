use serde::{Deserialize, Serialize};

use crate::core::{Extent, MIN_VALUE_SPAN};

/// Upper bound on emitted value labels, whatever the step resolves to.
const MAX_VALUE_LABELS: usize = 512;

/// Value-axis label anchored at a plot-local y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueAxisLabel {
    pub value: f64,
    pub y: f64,
}

fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounded tick step for `range` split into at most `max_labels` intervals.
///
/// The raw step is normalised to `[1, 10) * 10^n` and snapped to 1, 2, 5 or 10
/// at the thresholds 1.5, 3 and 7.5, then rounded to the decimal places that
/// are significant for `range`.
#[must_use]
pub fn nice_step(range: f64, max_labels: usize) -> f64 {
    let range = if range.is_finite() && range > 0.0 {
        range
    } else {
        MIN_VALUE_SPAN
    };
    let raw = range / max_labels.max(1) as f64;

    let mut magnitude = 10_f64.powf(raw.log10().floor());
    if !magnitude.is_finite() || magnitude == 0.0 {
        magnitude = 0.1;
    }
    let normalized = raw / magnitude;
    let step = if normalized < 1.5 {
        magnitude
    } else if normalized < 3.0 {
        2.0 * magnitude
    } else if normalized < 7.5 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    };

    let decimals = (-range.log10().floor()).max(0.0) as i32;
    let rounded = round_to_decimals(step, decimals);
    // Rounding can erase steps much finer than the range's leading digit.
    if rounded > 0.0 { rounded } else { step }
}

/// Lays out value labels for the visible extent.
///
/// Labels start at the first step multiple at or above `y_min` and stop past
/// `y_max`. Labels whose text would clip the top or bottom of the gutter are
/// skipped.
#[must_use]
pub fn value_axis_labels(
    extent: Extent,
    plot_height: f64,
    font_size_px: f64,
    label_spacing_px: f64,
) -> Vec<ValueAxisLabel> {
    if !(plot_height.is_finite() && plot_height > 0.0) {
        return Vec::new();
    }
    let text_height = font_size_px * 1.2;
    let max_labels = (plot_height / (text_height + label_spacing_px)).floor().max(1.0) as usize;
    let range = extent.y_span().max(MIN_VALUE_SPAN);
    let step = nice_step(range, max_labels);
    let first = (extent.y_min / step).ceil() * step;

    (0..MAX_VALUE_LABELS)
        .map(|index| first + index as f64 * step)
        .take_while(|value| *value <= extent.y_max)
        .filter_map(|value| {
            let y = plot_height - (value - extent.y_min) / range * plot_height;
            if y - font_size_px < 0.0 || y + font_size_px > plot_height {
                return None;
            }
            Some(ValueAxisLabel {
                value: round_to_decimals(value, 10),
                y,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{nice_step, value_axis_labels};
    use crate::core::Extent;

    #[test]
    fn steps_snap_to_one_two_five() {
        assert_relative_eq!(nice_step(100.0, 10), 10.0);
        assert_relative_eq!(nice_step(100.0, 40), 2.0);
        assert_relative_eq!(nice_step(100.0, 25), 5.0);
        assert_relative_eq!(nice_step(1.0, 4), 0.2);
        assert_relative_eq!(nice_step(90.0, 10), 10.0);
    }

    #[test]
    fn tiny_steps_survive_rounding() {
        let step = nice_step(0.5, 30);
        assert!(step > 0.0);
        assert_relative_eq!(step, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn labels_are_step_multiples_inside_the_gutter() {
        let extent = Extent::new(0.0, 1.0, 95.0, 205.0);
        let labels = value_axis_labels(extent, 400.0, 12.0, 30.0);
        assert!(!labels.is_empty());
        for pair in labels.windows(2) {
            assert_relative_eq!(pair[1].value - pair[0].value, 10.0, epsilon = 1e-9);
            assert!(pair[1].y < pair[0].y);
        }
        for label in &labels {
            assert!(label.y >= 12.0 && label.y <= 388.0);
            assert_relative_eq!(label.value % 10.0, 0.0, epsilon = 1e-9);
        }
    }
}
