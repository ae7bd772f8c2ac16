use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::render::Renderer;

use super::label_formatter::{LabelFormatter, to_display_time};
use super::{ChartEngine, SeriesController};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Calendar granularity chosen from the visible span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeLabelRegime {
    /// More than a year visible.
    Years,
    /// More than a month visible.
    Months,
    /// More than a day visible.
    Days,
    Hours,
}

impl TimeLabelRegime {
    #[must_use]
    pub fn from_span_ms(span_ms: f64) -> Self {
        let days = span_ms / MS_PER_DAY;
        if days > 365.0 {
            Self::Years
        } else if days > 30.0 {
            Self::Months
        } else if days > 1.0 {
            Self::Days
        } else {
            Self::Hours
        }
    }
}

/// Placement priority; higher values are placed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LabelPriority {
    Hour = 1,
    Day = 2,
    Month = 3,
    Year = 4,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxisLabel {
    pub time: i64,
    pub text: String,
    pub priority: LabelPriority,
}

/// Label accepted by the greedy placement.
///
/// Labels hanging off the left edge keep their slot so later labels cannot
/// crowd them, but are not drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedTimeLabel {
    pub label: TimeAxisLabel,
    pub x: f64,
    pub start: f64,
    pub end: f64,
    pub drawn: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeLabelCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

/// Candidate label times plus their classified labels.
///
/// Classification depends on the predecessor, so the cache is only valid for
/// an append-only candidate list and must be cleared whenever the list is
/// rebuilt or the formatter changes.
#[derive(Debug, Clone, Default)]
pub struct TimeLabelCache {
    candidates: Vec<i64>,
    labels: HashMap<(i64, TimeLabelRegime), TimeAxisLabel>,
    hits: u64,
    misses: u64,
}

impl TimeLabelCache {
    pub fn rebuild(&mut self, candidates: impl IntoIterator<Item = i64>) {
        self.clear();
        self.candidates.extend(candidates);
    }

    /// Appends the time of a freshly created bucket.
    pub fn push_candidate(&mut self, time: i64) {
        self.candidates.push(time);
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.labels.clear();
        self.hits = 0;
        self.misses = 0;
    }

    #[must_use]
    pub fn candidates(&self) -> &[i64] {
        &self.candidates
    }

    #[must_use]
    pub fn stats(&self) -> TimeLabelCacheStats {
        TimeLabelCacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.labels.len(),
        }
    }

    /// Classifies every candidate for `regime`.
    pub fn labels(
        &mut self,
        regime: TimeLabelRegime,
        formatter: &dyn LabelFormatter,
        utc_offset_minutes: i32,
    ) -> Vec<TimeAxisLabel> {
        let mut out = Vec::with_capacity(self.candidates.len());
        let mut previous: Option<DateTime<FixedOffset>> = None;
        for &time in &self.candidates {
            let date = to_display_time(time, utc_offset_minutes);
            if let Some(cached) = self.labels.get(&(time, regime)) {
                self.hits += 1;
                out.push(cached.clone());
            } else {
                self.misses += 1;
                let label = classify(time, date, previous, regime, formatter);
                self.labels.insert((time, regime), label.clone());
                out.push(label);
            }
            previous = Some(date);
        }
        out
    }
}

fn classify(
    time: i64,
    date: DateTime<FixedOffset>,
    previous: Option<DateTime<FixedOffset>>,
    regime: TimeLabelRegime,
    formatter: &dyn LabelFormatter,
) -> TimeAxisLabel {
    let new_year = previous.is_some_and(|prev| prev.year() != date.year());
    let new_month = previous.is_some_and(|prev| (prev.year(), prev.month()) != (date.year(), date.month()));
    let new_day = previous.is_some_and(|prev| prev.date_naive() != date.date_naive());

    let (text, priority) = match regime {
        TimeLabelRegime::Years if new_year => (formatter.format_year(date), LabelPriority::Year),
        TimeLabelRegime::Years | TimeLabelRegime::Months if new_month => {
            (formatter.format_month(date), LabelPriority::Month)
        }
        TimeLabelRegime::Years | TimeLabelRegime::Months | TimeLabelRegime::Days => {
            (formatter.format_day(date), LabelPriority::Day)
        }
        TimeLabelRegime::Hours if new_day => (formatter.format_day(date), LabelPriority::Day),
        TimeLabelRegime::Hours => (formatter.format_hour(date), LabelPriority::Hour),
    };
    TimeAxisLabel {
        time,
        text,
        priority,
    }
}

/// Greedy placement in descending priority.
///
/// A label is accepted when its box, grown by `padding` on both sides, does
/// not overlap an accepted one and it ends before `plot_width`.
pub fn place_time_labels(
    mut labels: Vec<TimeAxisLabel>,
    plot_width: f64,
    padding: f64,
    x_of: impl Fn(i64) -> f64,
    width_of: impl Fn(&str) -> f64,
) -> Vec<PlacedTimeLabel> {
    // Stable: equal priorities keep chronological order.
    labels.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut accepted: Vec<PlacedTimeLabel> = Vec::new();
    for label in labels {
        let x = x_of(label.time);
        let half = width_of(&label.text) / 2.0;
        let (start, end) = (x - half, x + half);
        if !(start.is_finite() && end.is_finite()) || end >= plot_width {
            continue;
        }
        let overlaps = accepted
            .iter()
            .any(|other| start < other.end + padding && end > other.start - padding);
        if !overlaps {
            accepted.push(PlacedTimeLabel {
                label,
                x,
                start,
                end,
                drawn: start >= 0.0,
            });
        }
    }
    accepted
}

impl<R: Renderer> ChartEngine<R> {
    /// Resets label candidates to the aggregated times inside the range.
    pub(super) fn rebuild_time_label_candidates(&mut self) {
        let start = self.time_range.start;
        self.time_labels.rebuild(
            self.points
                .iter()
                .map(|point| point.time)
                .filter(|time| *time >= start),
        );
    }

    /// Lays out the time axis for the current zoom and pan.
    pub fn time_axis_labels(&mut self) -> Vec<PlacedTimeLabel> {
        let window = self.visible_time_range();
        let regime = TimeLabelRegime::from_span_ms(window.end - window.start);
        let labels = self.time_labels.labels(
            regime,
            self.formatter.as_ref(),
            self.config.utc_offset_minutes,
        );

        let extent = self.data_extent.extent();
        let width = self.config.viewport.width;
        let (zoom, pan) = (self.zoom, self.pan);
        let offset = self.chart_type.x_label_offset(self.config.step_size_ms);
        let font_size = self.config.layout.axis_font_size_px;
        let measurer = &self.measurer;
        place_time_labels(
            labels,
            width,
            self.config.layout.time_label_padding_px,
            |time| extent.time_to_x(time as f64 + offset, width, zoom, pan),
            |text| measurer(text, font_size),
        )
    }

    #[must_use]
    pub fn time_label_cache_stats(&self) -> TimeLabelCacheStats {
        self.time_labels.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LabelPriority, TimeAxisLabel, TimeLabelCache, TimeLabelRegime, place_time_labels,
    };
    use crate::api::label_formatter::DefaultLabelFormatter;

    const HOUR: i64 = 3_600_000;
    const DAY: i64 = 24 * HOUR;

    #[test]
    fn regimes_follow_span_in_days() {
        assert_eq!(TimeLabelRegime::from_span_ms(400.0 * DAY as f64), TimeLabelRegime::Years);
        assert_eq!(TimeLabelRegime::from_span_ms(31.0 * DAY as f64), TimeLabelRegime::Months);
        assert_eq!(TimeLabelRegime::from_span_ms(2.0 * DAY as f64), TimeLabelRegime::Days);
        assert_eq!(TimeLabelRegime::from_span_ms(DAY as f64), TimeLabelRegime::Hours);
    }

    #[test]
    fn day_boundary_outranks_hours_in_intraday_regime() {
        let mut cache = TimeLabelCache::default();
        // 2024-01-01 22:00, 23:00, then 2024-01-02 00:00 UTC.
        let base = 1_704_146_400_000;
        cache.rebuild([base, base + HOUR, base + 2 * HOUR]);
        let labels = cache.labels(TimeLabelRegime::Hours, &DefaultLabelFormatter, 0);
        let priorities: Vec<_> = labels.iter().map(|label| label.priority).collect();
        assert_eq!(
            priorities,
            [LabelPriority::Hour, LabelPriority::Hour, LabelPriority::Day]
        );
        assert_eq!(labels[0].text, "22:00");
        assert_eq!(labels[2].text, "2");

        let _ = cache.labels(TimeLabelRegime::Hours, &DefaultLabelFormatter, 0);
        assert_eq!(cache.stats().hits, 3);
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn year_boundary_gets_top_priority() {
        let mut cache = TimeLabelCache::default();
        // 2023-12-31 and 2024-01-01 UTC.
        cache.rebuild([1_703_980_800_000, 1_704_067_200_000]);
        let labels = cache.labels(TimeLabelRegime::Years, &DefaultLabelFormatter, 0);
        assert_eq!(labels[0].priority, LabelPriority::Day);
        assert_eq!(labels[1].priority, LabelPriority::Year);
        assert_eq!(labels[1].text, "2024");
    }

    fn label(time: i64, priority: LabelPriority) -> TimeAxisLabel {
        TimeAxisLabel {
            time,
            text: "label".to_owned(),
            priority,
        }
    }

    #[test]
    fn higher_priority_wins_contested_slot() {
        let labels = vec![
            label(100, LabelPriority::Hour),
            label(110, LabelPriority::Month),
            label(300, LabelPriority::Hour),
        ];
        let placed = place_time_labels(labels, 1_000.0, 20.0, |time| time as f64, |_| 30.0);
        let times: Vec<_> = placed.iter().map(|p| p.label.time).collect();
        assert_eq!(times, [110, 300]);
    }

    #[test]
    fn labels_left_of_plot_reserve_space_without_drawing() {
        let labels = vec![label(-5, LabelPriority::Day), label(30, LabelPriority::Hour)];
        let placed = place_time_labels(labels, 1_000.0, 20.0, |time| time as f64, |_| 30.0);
        assert_eq!(placed.len(), 1);
        assert!(!placed[0].drawn);

        let right_edge = vec![label(995, LabelPriority::Year)];
        assert!(place_time_labels(right_edge, 1_000.0, 20.0, |time| time as f64, |_| 30.0).is_empty());
    }
}
