use sim_chart_wasm::domain::market_data::{Candle, CandleSeries, Ohlc, Price, Timestamp};
use sim_chart_wasm::infrastructure::rendering::frame::{BEAR_COLOR, BULL_COLOR};
use sim_chart_wasm::infrastructure::rendering::{FrameBuilder, FrameInput, Pointer};
use sim_chart_wasm::view_state::ViewState;

const NOW: u64 = 1_700_000_000_000;

fn candle(ts: u64, open: f64, close: f64) -> Candle {
    Candle::new(
        Timestamp::from_millis(ts),
        Ohlc::new(Price::from(open), Price::from(open.max(close)), Price::from(open.min(close)), Price::from(close)),
    )
}

/// Ten one-point bodies, one twenty-point body, then a flat in-progress candle.
fn fixture() -> (CandleSeries, Candle) {
    let mut history = CandleSeries::new(100);
    for i in 0..10 {
        history.push(candle(i * 8_000, 100.0, 101.0));
    }
    history.push(candle(80_000, 100.0, 120.0));
    (history, candle(88_000, 100.0, 100.0))
}

#[test]
fn scale_and_bodies_follow_the_visible_range() {
    let (history, current) = fixture();
    let view = ViewState::default();
    let input = FrameInput { history: &history, current: &current, price: 100.0, now_ms: NOW, pointer: None };
    let frame = FrameBuilder::new(&view).build(input, 840, 280).unwrap();

    // low 100, high 120, padded by 20% of the 20-point range
    assert!((frame.scale.min - 96.0).abs() < 1e-9);
    assert!((frame.scale.max - 124.0).abs() < 1e-9);

    assert_eq!(frame.candles.len(), 12);
    let small = &frame.candles[0];
    assert!((small.body_height - 10.0).abs() < 1e-9);
    assert!((small.body_x - 2.0).abs() < 1e-9);
    assert!((small.body_width - (840.0 / 42.0 - 4.0)).abs() < 1e-9);
    assert!((small.wick_x - 10.0).abs() < 1e-9);
    assert_eq!(small.color(), BULL_COLOR);

    let flat = &frame.candles[11];
    assert!(flat.in_progress);
    assert_eq!(flat.body_height, 1.0);
}

#[test]
fn tall_bodies_are_marked_as_voids() {
    let (history, current) = fixture();
    let view = ViewState::default();
    let input = FrameInput { history: &history, current: &current, price: 100.0, now_ms: NOW, pointer: None };
    let frame = FrameBuilder::new(&view).build(input, 840, 280).unwrap();

    assert_eq!(frame.liquidity_voids, vec![10]);
}

#[test]
fn flat_market_has_no_voids() {
    let mut history = CandleSeries::new(10);
    for i in 0..5 {
        history.push(candle(i * 8_000, 50.0, 50.0));
    }
    let current = candle(40_000, 50.0, 50.0);
    let view = ViewState::default();
    let input = FrameInput { history: &history, current: &current, price: 50.0, now_ms: NOW, pointer: None };
    let frame = FrameBuilder::new(&view).build(input, 300, 200).unwrap();

    assert!(frame.liquidity_voids.is_empty());
    assert!((frame.scale.range() - 0.4).abs() < 1e-9);
}

#[test]
fn price_line_color_follows_the_open() {
    let (history, current) = fixture();
    let view = ViewState::default();
    let build = |price| {
        let input = FrameInput { history: &history, current: &current, price, now_ms: NOW, pointer: None };
        FrameBuilder::new(&view).build(input, 840, 280).unwrap().price_line
    };

    assert_eq!(build(100.0).color, BULL_COLOR);
    assert_eq!(build(99.5).color, BEAR_COLOR);
    insta::assert_snapshot!(build(112.346).label, @"112.35");
}

#[test]
fn crosshair_labels_price_and_time() {
    let (history, current) = fixture();
    let view = ViewState::default();
    let at = |pointer| {
        let input = FrameInput { history: &history, current: &current, price: 100.0, now_ms: NOW, pointer };
        FrameBuilder::new(&view).build(input, 840, 280).unwrap().crosshair
    };

    let centre = at(Some(Pointer { x: 420.0, y: 140.0 })).unwrap();
    insta::assert_snapshot!(format!("{} @ {}", centre.price_label, centre.time_label), @"110.00 @ 22:13:20");

    let left = at(Some(Pointer { x: 0.0, y: 0.0 })).unwrap();
    insta::assert_snapshot!(format!("{} @ {}", left.price_label, left.time_label), @"124.00 @ 22:12:50");

    assert!(at(Some(Pointer { x: 900.0, y: 10.0 })).is_none());
    assert!(at(None).is_none());
}
