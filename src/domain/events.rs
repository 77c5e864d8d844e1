use crate::domain::market_data::{Candle, Signal, Volatility};

/// Things the simulation reports to the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    CandleSealed { candle: Candle, history_len: usize },
    BiasChanged { from: Signal, to: Signal },
    VolatilityChanged { multiplier: Volatility },
    ScheduledSignalFired { signal: Signal, deadline: u64 },
}

/// Event dispatcher for publishing events
pub trait EventDispatcher {
    fn publish(&self, event: EngineEvent);
}

/// Single-threaded in-memory fan-out.
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    handlers: Vec<Box<dyn Fn(&EngineEvent)>>,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&EngineEvent) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish(&self, event: EngineEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }
}
