use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use finchart::api::{ChartEngine, ChartEngineConfig, PaneLayout, PriceField};
use finchart::core::{Point, Viewport};
use finchart::error::ChartError;
use finchart::extensions::{IndicatorEvent, MovingAverage, RelativeStrength, VolumeBars};
use finchart::interaction::PointerKind;
use finchart::render::{CanvasLayerKind, Color, NullRenderer};

const MINUTE: i64 = 60_000;

fn engine() -> ChartEngine<NullRenderer> {
    let config = ChartEngineConfig::new(Viewport::new(800.0, 400.0)).with_auto_time_range(0);
    let mut engine = ChartEngine::new(NullRenderer::default(), config).expect("engine init");
    let bars = (0..=100)
        .map(|i| {
            let close = 100.0 + i as f64;
            Point::ohlcv(i * MINUTE, close - 0.5, close + 1.0, close - 1.0, close, 10.0 + i as f64)
        })
        .collect();
    engine.draw(bars);
    engine
}

fn record_events(engine: &mut ChartEngine<NullRenderer>) -> Rc<RefCell<Vec<IndicatorEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.on_indicator_event(move |event| sink.borrow_mut().push(event.clone()));
    events
}

#[test]
fn indicators_draw_into_their_own_layer() {
    let mut engine = engine();
    engine
        .add_indicator(Box::new(MovingAverage::new("sma-10", 10)))
        .expect("unique id");
    engine
        .add_indicator(Box::new(VolumeBars::new("vol")))
        .expect("unique id");
    assert_eq!(engine.indicator_ids(), vec!["sma-10", "vol"]);

    assert!(engine.render_frame().expect("render"));
    let renderer = engine.renderer();
    assert!(renderer.last_layers.contains(&CanvasLayerKind::Indicators));
    // 101 candle bodies plus 101 volume bars.
    assert_eq!(renderer.last_rect_count, 202);
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut engine = engine();
    engine
        .add_indicator(Box::new(MovingAverage::new("ma", 5)))
        .expect("unique id");
    let err = engine
        .add_indicator(Box::new(VolumeBars::new("ma")))
        .expect_err("duplicate id");
    assert!(matches!(err, ChartError::InvalidOption(_)));
}

#[test]
fn replacing_drops_every_indicator_of_the_same_kind() {
    let mut engine = engine();
    engine.add_indicator(Box::new(MovingAverage::new("sma-10", 10))).expect("add");
    engine.add_indicator(Box::new(VolumeBars::new("vol"))).expect("add");
    engine.add_indicator(Box::new(MovingAverage::new("sma-20", 20))).expect("add");

    engine.replace_indicator(Box::new(MovingAverage::new("sma-50", 50)));
    assert_eq!(engine.indicator_ids(), vec!["vol", "sma-50"]);
}

#[test]
fn visibility_settings_and_removal_emit_events() {
    let mut engine = engine();
    let events = record_events(&mut engine);
    engine.add_indicator(Box::new(VolumeBars::new("vol"))).expect("add");

    assert!(engine.set_indicator_visible("vol", false));
    // Unchanged visibility is not re-announced.
    assert!(engine.set_indicator_visible("vol", false));
    assert_eq!(engine.is_indicator_visible("vol"), Some(false));
    assert!(engine.open_indicator_settings("vol"));
    assert!(engine.remove_indicator("vol"));
    assert!(!engine.remove_indicator("vol"));
    assert!(!engine.set_indicator_visible("vol", true));

    assert_eq!(
        *events.borrow(),
        vec![
            IndicatorEvent::VisibilityChanged {
                id: "vol".to_owned(),
                visible: false
            },
            IndicatorEvent::SettingsOpen {
                id: "vol".to_owned()
            },
            IndicatorEvent::Removed {
                id: "vol".to_owned()
            },
        ]
    );
}

#[test]
fn hidden_indicators_are_not_drawn() {
    let mut engine = engine();
    engine.add_indicator(Box::new(VolumeBars::new("vol"))).expect("add");
    engine.set_indicator_visible("vol", false);
    engine.render_frame().expect("render");
    assert_eq!(engine.renderer().last_rect_count, 101);
}

#[test]
fn crosshair_reports_indicator_values() {
    let mut engine = engine();
    engine
        .add_indicator(Box::new(MovingAverage::new("sma-3", 3)))
        .expect("add");
    engine.add_indicator(Box::new(VolumeBars::new("vol"))).expect("add");
    assert!(engine.indicator_values_at_crosshair().is_empty());

    // x = 403 resolves to the candle at minute 50.
    engine.pointer_move(403.0, 100.0, PointerKind::Mouse);
    let values = engine.indicator_values_at_crosshair();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].0, "sma-3");
    assert_relative_eq!(values[0].1.expect("sma"), 149.0);
    assert_eq!(values[1], ("vol".to_owned(), Some(60.0)));
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let mut engine = engine();
    let count = Rc::new(RefCell::new(0_usize));
    let sink = Rc::clone(&count);
    let id = engine.on_indicator_event(move |_| *sink.borrow_mut() += 1);
    engine.add_indicator(Box::new(VolumeBars::new("vol"))).expect("add");
    engine.set_indicator_visible("vol", false);
    assert!(engine.off_indicator_event(id));
    engine.set_indicator_visible("vol", true);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn pane_indicator_stacks_under_the_time_axis() {
    let mut engine = engine();
    engine
        .add_pane_indicator(Box::new(
            RelativeStrength::new("rsi-14", 14).with_color(Color::rgb(0.5, 0.2, 0.8)),
        ))
        .expect("unique id");
    assert_eq!(
        engine.pane_layout(),
        vec![PaneLayout {
            id: "rsi-14".to_owned(),
            top: 400.0 + 30.0,
            height: 120.0,
        }]
    );
    assert_relative_eq!(engine.surface_height(), 550.0);

    assert!(engine.render_frame().expect("render"));
    let renderer = engine.renderer();
    assert!(renderer.last_layers.contains(&CanvasLayerKind::Panes));
    // Candle bodies only: the pane draws lines and gutter text.
    assert_eq!(renderer.last_rect_count, 101);

    engine.set_indicator_visible("rsi-14", false);
    assert!(engine.pane_layout().is_empty());
    assert_relative_eq!(engine.surface_height(), 430.0);
}

#[test]
fn pane_ids_are_shared_with_overlays() {
    let mut engine = engine();
    engine
        .add_pane_indicator(Box::new(RelativeStrength::new("rsi", 14)))
        .expect("unique id");
    let err = engine
        .add_indicator(Box::new(MovingAverage::new("rsi", 3)))
        .expect_err("duplicate id");
    assert!(matches!(err, ChartError::InvalidOption(_)));

    engine.replace_pane_indicator(Box::new(RelativeStrength::new("rsi-7", 7)));
    assert_eq!(engine.indicator_ids(), vec!["rsi-7"]);
}

#[test]
fn pane_readout_uses_the_series_then_the_pointer_height() {
    let mut engine = engine();
    engine
        .add_pane_indicator(Box::new(RelativeStrength::new("rsi-14", 14)))
        .expect("add");
    assert_eq!(engine.pane_crosshair_value("rsi-14", 0.5), None);

    // Every close rises, so the index sits at 100 once warmed up.
    engine.pointer_move(403.0, 100.0, PointerKind::Mouse);
    assert_eq!(engine.pane_crosshair_value("rsi-14", 0.5), Some(100.0));
    assert_eq!(
        engine.indicator_values_at_crosshair(),
        vec![("rsi-14".to_owned(), Some(100.0))]
    );

    // Minute 5 is still warming up: the pointer height inside the pane is
    // read through its extent, padded from [99.5, 100.5] to [99.3, 100.65].
    engine.pointer_move(43.0, 100.0, PointerKind::Mouse);
    assert_relative_eq!(
        engine.pane_crosshair_value("rsi-14", 0.5).expect("readout"),
        99.975,
        epsilon = 1e-9
    );
    assert_eq!(engine.pane_crosshair_value("rsi-14", 1.5), None);
}

#[test]
fn moving_average_reads_the_configured_field() {
    let mut engine = engine();
    engine
        .add_indicator(Box::new(
            MovingAverage::new("sma-high", 2)
                .with_source(PriceField::High)
                .with_color(Color::rgb(1.0, 0.5, 0.0)),
        ))
        .expect("add");
    engine.pointer_move(403.0, 100.0, PointerKind::Mouse);
    // Highs at minutes 49 and 50 are 150 and 151.
    assert_eq!(
        engine.indicator_values_at_crosshair(),
        vec![("sma-high".to_owned(), Some(150.5))]
    );
}
