use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::control::BiasSource;
use crate::domain::events::{EngineEvent, EventDispatcher, InMemoryEventDispatcher};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Candle, Signal, Volatility};
use crate::domain::simulation::ChartEngine;
use crate::infrastructure::rendering::{FrameBuilder, FrameInput, FrameSink, Pointer};
use crate::view_state::ViewState;
use crate::{log_debug, log_info, log_warn};

/// One chart on screen: the engine, where it is drawn, and how.
///
/// The engine is shared with bias subscriptions, which only write the latest
/// signal or volatility into it; the physics reads them on the next frame.
pub struct ChartSession {
    engine: Rc<RefCell<ChartEngine>>,
    sink: Option<Box<dyn FrameSink>>,
    view: ViewState,
    pointer: Option<Pointer>,
    events: InMemoryEventDispatcher,
    last_signal: Signal,
    last_volatility: Volatility,
    consecutive_render_failures: u32,
    warned_no_surface: bool,
}

impl ChartSession {
    pub fn new(engine: ChartEngine, view: ViewState) -> Self {
        Self {
            last_signal: engine.signal(),
            last_volatility: engine.volatility(),
            engine: Rc::new(RefCell::new(engine)),
            sink: None,
            view,
            pointer: None,
            events: InMemoryEventDispatcher::new(),
            consecutive_render_failures: 0,
            warned_no_surface: false,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.set_sink(Some(sink));
        self
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn FrameSink>>) {
        self.sink = sink;
        self.warned_no_surface = false;
        self.consecutive_render_failures = 0;
    }

    pub fn engine(&self) -> Rc<RefCell<ChartEngine>> {
        Rc::clone(&self.engine)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn set_pointer(&mut self, pointer: Option<Pointer>) {
        self.pointer = pointer;
    }

    pub fn subscribe_events<F>(&mut self, handler: F)
    where
        F: Fn(&EngineEvent) + 'static,
    {
        self.events.subscribe(handler);
    }

    /// Route every update from `source` into the engine. The subscription
    /// holds the engine weakly and ends with the first update after the
    /// session is dropped.
    pub fn attach_bias_source(&self, source: &mut dyn BiasSource) {
        let engine = Rc::downgrade(&self.engine);
        source.subscribe(Box::new(move |update| {
            let Some(engine) = engine.upgrade() else {
                return false;
            };
            match engine.try_borrow_mut() {
                Ok(mut engine) => engine.apply_control(update),
                Err(_) => log_warn!(LogComponent::Application("Session"), "engine busy, dropped {:?}", update),
            };
            true
        }));
        log_info!(LogComponent::Application("Session"), "bias source attached");
    }

    /// Advance the simulation to `now_ms`, report what changed, then draw.
    /// Drawing never stops the simulation.
    pub fn on_frame(&mut self, now_ms: u64) -> Option<Candle> {
        let (sealed, history_len, signal, volatility) = {
            let mut engine = self.engine.borrow_mut();
            let sealed = engine.step(now_ms);
            (sealed, engine.history().count(), engine.signal(), engine.volatility())
        };

        if signal != self.last_signal {
            self.events.publish(EngineEvent::BiasChanged { from: self.last_signal, to: signal });
            self.last_signal = signal;
        }
        if volatility != self.last_volatility {
            self.events.publish(EngineEvent::VolatilityChanged { multiplier: volatility });
            self.last_volatility = volatility;
        }
        if let Some(candle) = sealed {
            self.events.publish(EngineEvent::CandleSealed { candle, history_len });
        }

        self.render(now_ms);
        sealed
    }

    fn render(&mut self, now_ms: u64) {
        let Some(sink) = self.sink.as_mut() else {
            if !self.warned_no_surface {
                log_warn!(LogComponent::Rendering("Session"), "no render surface attached, simulation continues");
                self.warned_no_surface = true;
            }
            return;
        };

        let result = sink.surface_size().and_then(|(width, height)| {
            let engine = self.engine.borrow();
            let input = FrameInput {
                history: engine.history(),
                current: engine.current_candle(),
                price: engine.price(),
                now_ms,
                pointer: self.pointer,
            };
            let frame = FrameBuilder::new(&self.view).build(input, width, height)?;
            sink.present(&frame)
        });

        match result {
            Ok(()) => {
                if self.consecutive_render_failures > 0 {
                    log_info!(
                        LogComponent::Rendering("Session"),
                        "rendering recovered after {} skipped frames",
                        self.consecutive_render_failures
                    );
                }
                self.consecutive_render_failures = 0;
            }
            Err(err) => {
                self.consecutive_render_failures += 1;
                if self.consecutive_render_failures == 1 {
                    log_warn!(LogComponent::Rendering("Session"), "frame skipped: {}", err);
                } else {
                    log_debug!(LogComponent::Rendering("Session"), "frame skipped: {}", err);
                }
            }
        }
    }

    /// Re-fit the surface after the container changed size.
    pub fn resize_surface(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.resize() {
                log_warn!(LogComponent::Rendering("Session"), "resize failed: {}", err);
            }
        }
    }

    pub fn consecutive_render_failures(&self) -> u32 {
        self.consecutive_render_failures
    }
}
