use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use sim_chart_wasm::application::ChartSession;
use sim_chart_wasm::domain::errors::{AppError, RenderingResult};
use sim_chart_wasm::domain::events::EngineEvent;
use sim_chart_wasm::domain::logging::{LogComponent, LogLevel, init_logger};
use sim_chart_wasm::domain::simulation::{ChartEngine, EngineConfig};
use sim_chart_wasm::infrastructure::rendering::{Frame, FrameSink, Pointer};
use sim_chart_wasm::infrastructure::services::BufferedLogger;
use sim_chart_wasm::view_state::ViewState;

const NOW: u64 = 1_700_000_000_000;
const D: u64 = 8_000;

fn logs() -> &'static BufferedLogger {
    static LOGGER: OnceLock<BufferedLogger> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger = BufferedLogger::new(100_000, LogLevel::Debug);
        init_logger(Box::new(logger.clone()));
        logger
    })
}

fn warned(component: &str, needle: &str) -> bool {
    logs().entries().iter().any(|entry| {
        entry.level == LogLevel::Warn
            && matches!(entry.component, LogComponent::Rendering(name) if name == component)
            && entry.message.contains(needle)
    })
}

fn session() -> ChartSession {
    ChartSession::new(ChartEngine::new(EngineConfig::default(), NOW).unwrap(), ViewState::default())
}

#[derive(Clone, Default)]
struct RecordingSink {
    frames: Rc<RefCell<Vec<Frame>>>,
}

impl FrameSink for RecordingSink {
    fn surface_size(&mut self) -> RenderingResult<(u32, u32)> {
        Ok((840, 400))
    }

    fn present(&mut self, frame: &Frame) -> RenderingResult<()> {
        self.frames.borrow_mut().push(frame.clone());
        Ok(())
    }
}

struct DetachedCanvas;

impl FrameSink for DetachedCanvas {
    fn surface_size(&mut self) -> RenderingResult<(u32, u32)> {
        Err(AppError::RenderingError("canvas 'detached-chart' not found".to_string()))
    }

    fn present(&mut self, _frame: &Frame) -> RenderingResult<()> {
        unreachable!("no size, no frame")
    }
}

#[test]
fn missing_surface_keeps_simulating() {
    logs();
    let mut session = session();

    let mut now = NOW;
    let mut sealed = 0;
    for _ in 0..3 {
        now += D;
        sealed += session.on_frame(now).map_or(0, |_| 1);
    }

    assert_eq!(sealed, 3);
    assert_eq!(session.engine().borrow().history().count(), 203);
    assert!(warned("Session", "no render surface"));
}

#[test]
fn failing_surface_is_logged_and_skipped() {
    logs();
    let mut session = session().with_sink(Box::new(DetachedCanvas));

    let price_before = session.engine().borrow().price();
    session.engine().borrow_mut().set_bias_literal("UP");
    for i in 1..=5 {
        session.on_frame(NOW + i);
    }

    assert_eq!(session.consecutive_render_failures(), 5);
    assert!(session.engine().borrow().price() > price_before);
    assert!(warned("Session", "detached-chart"));
}

#[test]
fn frames_show_the_visible_window() {
    let sink = RecordingSink::default();
    let frames = Rc::clone(&sink.frames);
    let mut session = session().with_sink(Box::new(sink));

    session.on_frame(NOW + 16);
    session.set_pointer(Some(Pointer { x: 420.0, y: 200.0 }));
    session.on_frame(NOW + 32);

    let frames = frames.borrow();
    assert_eq!(frames.len(), 2);
    let frame = &frames[1];
    assert_eq!(frame.candles.len(), 41);
    assert!(frame.candles[40].in_progress);
    assert_eq!(frame.candles[40].timestamp, NOW);
    assert!((frame.candles[0].slot_width - 840.0 / 42.0).abs() < 1e-9);
    assert!(frames[0].crosshair.is_none());
    assert!(frame.crosshair.is_some());
    assert_eq!(frame.vertical_grid.len(), 12);
    assert_eq!(frame.horizontal_grid.len(), 8);
}

#[test]
fn zoom_changes_the_window() {
    let sink = RecordingSink::default();
    let frames = Rc::clone(&sink.frames);
    let mut session = session().with_sink(Box::new(sink));

    session.view_mut().zoom_by(1.5);
    session.on_frame(NOW + 16);

    assert_eq!(frames.borrow()[0].candles.len(), 21);
}

#[test]
fn sealed_candles_are_published() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut session = session();
    session.subscribe_events(move |event| sink.borrow_mut().push(event.clone()));

    session.engine().borrow_mut().set_bias_literal("DOWN");
    session.on_frame(NOW + D);

    let events = seen.borrow();
    assert!(matches!(events[0], EngineEvent::BiasChanged { .. }));
    match &events[1] {
        EngineEvent::CandleSealed { candle, history_len } => {
            assert_eq!(candle.timestamp.value(), NOW);
            assert_eq!(*history_len, 201);
        }
        other => panic!("unexpected event {:?}", other),
    }
}
