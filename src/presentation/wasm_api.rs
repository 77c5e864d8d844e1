use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::MouseEvent;

use crate::application::{ChartSession, SignalAutomation};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Candle, Signal, Timestamp};
use crate::domain::simulation::{ChartEngine, EngineConfig};
use crate::infrastructure::ControlChannel;
use crate::infrastructure::rendering::{CanvasRenderer, Pointer};
use crate::view_state::ViewState;
use crate::{log_info, log_warn};

/// Longest delay `setTimeout` accepts.
const MAX_TIMEOUT_MS: u64 = i32::MAX as u64;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;
type TimerSlot = Rc<RefCell<Option<Timeout>>>;

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

fn request_frame(callback: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("window not available"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

/// Keep one timeout armed for the earliest pending scheduled signal.
fn arm_scheduler(automation: &Rc<RefCell<SignalAutomation>>, slot: &TimerSlot, next: Option<Timestamp>) {
    let Some(deadline) = next else {
        slot.borrow_mut().take();
        return;
    };
    let delay = deadline.value().saturating_sub(now_ms()).min(MAX_TIMEOUT_MS) as u32;

    let automation_handle = Rc::clone(automation);
    let slot_handle = Rc::clone(slot);
    let timeout = Timeout::new(delay, move || {
        let next = automation_handle.borrow_mut().fire_due(now_ms());
        arm_scheduler(&automation_handle, &slot_handle, next);
    });
    *slot.borrow_mut() = Some(timeout);
}

/// Simulated market chart bound to a canvas element.
#[wasm_bindgen]
pub struct SimChartApi {
    session: Rc<RefCell<ChartSession>>,
    automation: Rc<RefCell<SignalAutomation>>,
    frame_loop: FrameCallback,
    frame_handle: Rc<Cell<Option<i32>>>,
    timer: TimerSlot,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl SimChartApi {
    /// `config_json` accepts any subset of the engine settings in camelCase.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: String, config_json: Option<String>) -> Result<SimChartApi, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) if !json.trim().is_empty() => EngineConfig::from_json(json)?,
            _ => EngineConfig::default(),
        };

        let view = ViewState {
            utc_offset_minutes: -(js_sys::Date::new_0().get_timezone_offset() as i32),
            ..ViewState::default()
        };
        let session = ChartSession::new(ChartEngine::new(config, now_ms())?, view)
            .with_sink(Box::new(CanvasRenderer::new(canvas_id.clone())));

        let channel = Rc::new(RefCell::new(ControlChannel::new()));
        session.attach_bias_source(&mut *channel.borrow_mut());

        let session = Rc::new(RefCell::new(session));
        let listeners = install_listeners(&canvas_id, &session);

        log_info!(LogComponent::Presentation("SimChartApi"), "chart bound to #{}", canvas_id);

        Ok(Self {
            session,
            automation: Rc::new(RefCell::new(SignalAutomation::new(channel))),
            frame_loop: Rc::new(RefCell::new(None)),
            frame_handle: Rc::new(Cell::new(None)),
            timer: Rc::new(RefCell::new(None)),
            _listeners: listeners,
        })
    }

    /// Start the requestAnimationFrame loop. Calling it twice is a no-op.
    pub fn start(&mut self) -> Result<(), JsValue> {
        if self.frame_loop.borrow().is_some() {
            return Ok(());
        }

        let session = Rc::clone(&self.session);
        let frame_loop = Rc::clone(&self.frame_loop);
        let frame_handle = Rc::clone(&self.frame_handle);
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Ok(mut session) = session.try_borrow_mut() {
                session.on_frame(now_ms());
            }
            let next = frame_loop.borrow().as_ref().and_then(|callback| request_frame(callback).ok());
            frame_handle.set(next);
        });

        self.frame_handle.set(Some(request_frame(&callback)?));
        *self.frame_loop.borrow_mut() = Some(callback);
        log_info!(LogComponent::Presentation("SimChartApi"), "frame loop started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.frame_handle.take() {
            if let Some(window) = web_sys::window() {
                if let Err(err) = window.cancel_animation_frame(handle) {
                    log_warn!(LogComponent::Presentation("SimChartApi"), "cancelAnimationFrame failed: {:?}", err);
                }
            }
        }
        if self.frame_loop.borrow_mut().take().is_some() {
            log_info!(LogComponent::Presentation("SimChartApi"), "frame loop stopped");
        }
    }

    /// Push a bias literal ("UP", "DOWN", "NEUTRAL") through the control
    /// channel. Anything else is treated as NEUTRAL.
    #[wasm_bindgen(js_name = setSignal)]
    pub fn set_signal(&self, signal: &str) {
        self.automation.borrow().send_signal(Signal::parse_lenient(signal));
    }

    #[wasm_bindgen(js_name = setVolatility)]
    pub fn set_volatility(&self, multiplier: f64) {
        self.automation.borrow().send_volatility(multiplier);
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&self, zoom: f64) {
        let mut session = self.session.borrow_mut();
        let view = session.view_mut();
        view.zoom_by(zoom - view.zoom);
    }

    pub fn resize(&self) {
        self.session.borrow_mut().resize_surface();
    }

    pub fn price(&self) -> f64 {
        self.session.borrow().engine().borrow().price()
    }

    #[wasm_bindgen(js_name = currentSignal)]
    pub fn current_signal(&self) -> String {
        self.session.borrow().engine().borrow().signal().to_string()
    }

    #[wasm_bindgen(js_name = candleCount)]
    pub fn candle_count(&self) -> usize {
        self.session.borrow().engine().borrow().history().count()
    }

    /// Sealed history followed by the in-progress candle, as JSON.
    #[wasm_bindgen(js_name = candlesJson)]
    pub fn candles_json(&self) -> Result<String, JsValue> {
        let session = self.session.borrow();
        let engine = session.engine();
        let engine = engine.borrow();
        let mut candles: Vec<Candle> = engine.history().to_vec();
        candles.push(*engine.current_candle());
        serde_json::to_string(&candles).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Publish `signal` at the next local `hhmm`. Returns the deadline in
    /// epoch milliseconds.
    #[wasm_bindgen(js_name = scheduleSignal)]
    pub fn schedule_signal(&self, hhmm: &str, signal: &str, utc_offset_minutes: Option<i32>) -> Result<f64, JsValue> {
        let offset = utc_offset_minutes.unwrap_or_else(|| self.session.borrow().view().utc_offset_minutes);
        let (_, deadline) =
            self.automation.borrow_mut().schedule_at_clock(hhmm, Signal::parse_lenient(signal), now_ms(), offset)?;

        let next = self.automation.borrow_mut().fire_due(now_ms());
        arm_scheduler(&self.automation, &self.timer, next);
        Ok(deadline.value() as f64)
    }

    #[wasm_bindgen(js_name = cancelScheduledSignals)]
    pub fn cancel_scheduled_signals(&self) -> usize {
        self.timer.borrow_mut().take();
        let cancelled = self.automation.borrow_mut().cancel_all();
        log_info!(LogComponent::Presentation("SimChartApi"), "cancelled {} scheduled signals", cancelled);
        cancelled
    }
}

impl Drop for SimChartApi {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pointer tracking on the canvas and surface refit on window resize.
fn install_listeners(canvas_id: &str, session: &Rc<RefCell<ChartSession>>) -> Vec<EventListener> {
    let mut listeners = Vec::new();
    let Some(window) = web_sys::window() else {
        return listeners;
    };

    let resize_session = Rc::clone(session);
    listeners.push(EventListener::new(&window, "resize", move |_| {
        if let Ok(mut session) = resize_session.try_borrow_mut() {
            session.resize_surface();
        }
    }));

    let Some(canvas) = window.document().and_then(|document| document.get_element_by_id(canvas_id)) else {
        log_warn!(LogComponent::Presentation("SimChartApi"), "#{} not in document, pointer tracking disabled", canvas_id);
        return listeners;
    };

    let move_session = Rc::clone(session);
    let move_target = canvas.clone();
    listeners.push(EventListener::new(&canvas, "mousemove", move |event| {
        let Some(event) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let rect = move_target.get_bounding_client_rect();
        let pointer = Pointer { x: event.client_x() as f64 - rect.left(), y: event.client_y() as f64 - rect.top() };
        if let Ok(mut session) = move_session.try_borrow_mut() {
            session.set_pointer(Some(pointer));
        }
    }));

    let leave_session = Rc::clone(session);
    listeners.push(EventListener::new(&canvas, "mouseleave", move |_| {
        if let Ok(mut session) = leave_session.try_borrow_mut() {
            session.set_pointer(None);
        }
    }));

    listeners
}
