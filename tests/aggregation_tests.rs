use finchart::core::{Point, StreamMerge, aggregate, bucket_time, merge_next};
use proptest::prelude::*;

const MINUTE: i64 = 60_000;

#[test]
fn raw_ticks_fold_into_minute_candles() {
    let raw = [
        Point::ohlcv(0, 10.0, 11.0, 9.5, 10.5, 1.0),
        Point::ohlcv(15_000, 10.5, 12.0, 10.0, 11.5, 2.0),
        Point::ohlcv(59_999, 11.5, 11.6, 8.0, 9.0, 3.0),
        Point::ohlcv(60_000, 9.0, 9.5, 8.5, 9.2, 4.0),
    ];
    let candles = aggregate(&raw, MINUTE);
    assert_eq!(
        candles,
        vec![
            Point::ohlcv(0, 10.0, 12.0, 8.0, 9.0, 6.0),
            Point::ohlcv(60_000, 9.0, 9.5, 8.5, 9.2, 4.0),
        ]
    );
}

#[test]
fn unsorted_input_is_ordered_before_bucketing() {
    let raw = [
        Point::close(130_000, 3.0),
        Point::close(10_000, 1.0),
        Point::close(70_000, 2.0),
    ];
    let times: Vec<i64> = aggregate(&raw, MINUTE).iter().map(|p| p.time).collect();
    assert_eq!(times, vec![0, 60_000, 120_000]);
}

#[test]
fn streaming_matches_batch_aggregation() {
    let raw: Vec<Point> = (0..50)
        .map(|i| Point::ohlcv(i * 17_000, 1.0 + i as f64, 2.0 + i as f64, 0.5, 1.5, 1.0))
        .collect();
    let mut streamed = Vec::new();
    let mut appended = 0;
    for point in &raw {
        if merge_next(&mut streamed, *point, MINUTE) == StreamMerge::Appended {
            appended += 1;
        }
    }
    let batch = aggregate(&raw, MINUTE);
    assert_eq!(streamed, batch);
    assert_eq!(appended, batch.len());
}

#[test]
fn late_sample_merges_into_last_bucket() {
    let mut series = vec![Point::close(0, 1.0), Point::close(MINUTE, 2.0)];
    let outcome = merge_next(&mut series, Point::close(5_000, 7.0), MINUTE);
    assert_eq!(outcome, StreamMerge::Merged);
    assert_eq!(series.len(), 2);
    assert_eq!(series[1].close, Some(7.0));
}

proptest! {
    #[test]
    fn aggregation_is_idempotent_and_strictly_increasing(
        times in prop::collection::vec(-10_000_000i64..10_000_000, 0..200),
        step in 1i64..3_600_000,
    ) {
        let raw: Vec<Point> = times
            .iter()
            .map(|time| Point::ohlcv(*time, 1.0, 2.0, 0.5, 1.5, 1.0))
            .collect();
        let once = aggregate(&raw, step);
        let twice = aggregate(&once, step);
        prop_assert_eq!(&once, &twice);
        for pair in once.windows(2) {
            prop_assert!(pair[0].time < pair[1].time);
        }
        for point in &once {
            prop_assert_eq!(bucket_time(point.time, step), point.time);
        }
        let total_volume: f64 = once.iter().filter_map(|p| p.volume).sum();
        prop_assert!((total_volume - raw.len() as f64).abs() < 1e-9);
    }
}
