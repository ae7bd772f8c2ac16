use criterion::{Criterion, criterion_group, criterion_main};
use finchart::api::{ChartEngine, ChartEngineConfig, DirtyLayers};
use finchart::core::{
    Extent, Point, TimeRange, Viewport, aggregate, visible_slice_bounds, visible_time_window,
};
use finchart::render::NullRenderer;
use std::hint::black_box;

const MINUTE: i64 = 60_000;

fn generated_bars(count: i64) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let base = 100.0 + i as f64 * 0.05;
            let close = if i % 2 == 0 { base + 1.0 } else { base - 1.0 };
            let low = base.min(close) - 0.75;
            let high = base.max(close) + 0.75;
            Point::ohlcv(i * MINUTE, base, high, low, close, 10.0)
        })
        .collect()
}

fn bench_mapping_round_trip(c: &mut Criterion) {
    let viewport = Viewport::new(1920.0, 1080.0);
    let extent = Extent::new(0.0, 10_000.0 * MINUTE as f64, 0.0, 2_500.0);

    c.bench_function("mapping_round_trip", |b| {
        b.iter(|| {
            let (x, y) =
                extent.map_to_pixel(black_box(4_321.0 * MINUTE as f64), 1_234.5, viewport, 3.0, 250.0);
            let _ = extent.pixel_to_point(x, y, viewport, 3.0, 250.0);
        })
    });
}

fn bench_aggregate_10k(c: &mut Criterion) {
    // 15 second samples folded into minute candles.
    let samples: Vec<Point> = (0..10_000)
        .map(|i| Point::close(i * 15_000, 100.0 + (i % 37) as f64))
        .collect();

    c.bench_function("aggregate_10k", |b| {
        b.iter(|| aggregate(black_box(&samples), MINUTE))
    });
}

fn bench_visible_slice_10k(c: &mut Criterion) {
    let bars = generated_bars(10_000);
    let range = TimeRange::new(0, 10_000 * MINUTE);
    let extent = Extent::from_time_range(range, 0.0, 1_000.0);

    c.bench_function("visible_slice_10k", |b| {
        b.iter(|| {
            let window = visible_time_window(extent, range, 1_600.0, black_box(20.0), 40_000.0);
            visible_slice_bounds(&bars, window, MINUTE)
        })
    });
}

fn bench_full_frame_2k(c: &mut Criterion) {
    let config = ChartEngineConfig::new(Viewport::new(1600.0, 900.0));
    let mut engine = ChartEngine::new(NullRenderer::default(), config).expect("engine init");
    engine.draw(generated_bars(2_000));

    c.bench_function("full_frame_2k", |b| {
        b.iter(|| {
            engine.request_redraw(DirtyLayers::full());
            let _ = engine.take_frame_request();
            engine.render_frame().expect("render")
        })
    });
}

criterion_group!(
    benches,
    bench_mapping_round_trip,
    bench_aggregate_10k,
    bench_visible_slice_10k,
    bench_full_frame_2k
);
criterion_main!(benches);
