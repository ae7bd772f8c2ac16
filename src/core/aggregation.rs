use tracing::trace;

use crate::core::Point;

/// Outcome of folding a streamed sample into an aggregated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMerge {
    /// Sample landed in the last bucket, which was updated in place.
    Merged,
    /// Sample opened a new bucket at the end of the series.
    Appended,
}

/// Start of the bucket containing `time`.
///
/// Uses Euclidean remainder so negative times bucket downward. Times whose
/// bucket start lies below `i64::MIN` saturate there.
#[must_use]
pub fn bucket_time(time: i64, step: i64) -> i64 {
    let step = step.max(1);
    time.saturating_sub(time.rem_euclid(step))
}

/// Folds `next` into `into`, which already holds the earlier sample(s) of the
/// same bucket.
///
/// First open, max high, min low, last close, summed volume. Absent fields do
/// not overwrite present ones.
pub fn merge_into(into: &mut Point, next: &Point) {
    into.open = into.open.or(next.open);
    into.high = max_opt(into.high, next.high);
    into.low = min_opt(into.low, next.low);
    into.close = next.close.or(into.close);
    into.volume = match (into.volume, next.volume) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    };
}

/// Buckets raw samples onto a fixed time grid, one sample per bucket.
///
/// Output times are strictly increasing. Aggregating an already aggregated
/// series with the same step returns it unchanged.
#[must_use]
pub fn aggregate(points: &[Point], step: i64) -> Vec<Point> {
    let mut ordered;
    let input = if points.is_sorted_by_key(|point| point.time) {
        points
    } else {
        ordered = points.to_vec();
        ordered.sort_by_key(|point| point.time);
        &ordered[..]
    };

    let mut out: Vec<Point> = Vec::with_capacity(input.len());
    for point in input {
        let bucket = bucket_time(point.time, step);
        match out.last_mut() {
            Some(last) if last.time == bucket => merge_into(last, point),
            _ => out.push(Point {
                time: bucket,
                ..*point
            }),
        }
    }

    trace!(
        raw_count = points.len(),
        aggregated_count = out.len(),
        step,
        "aggregated series"
    );
    out
}

/// Folds one streamed sample into the tail of an aggregated series.
///
/// A sample older than the last bucket is merged into that bucket rather than
/// reordering history.
pub fn merge_next(series: &mut Vec<Point>, point: Point, step: i64) -> StreamMerge {
    let bucket = bucket_time(point.time, step);
    match series.last_mut() {
        Some(last) if bucket <= last.time => {
            merge_into(last, &point);
            StreamMerge::Merged
        }
        _ => {
            series.push(Point {
                time: bucket,
                ..point
            });
            StreamMerge::Appended
        }
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn min_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
