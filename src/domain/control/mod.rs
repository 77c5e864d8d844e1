//! Admin control surface: the updates pushed into the engine and the
//! capability through which they arrive.

pub mod scheduler;

pub use scheduler::{ClockTime, ScheduledSignal, SignalScheduler, TaskId};

use crate::domain::market_data::{Signal, Volatility};
use serde_json::Value;

/// Key holding the last-written signal literal.
pub const SIGNAL_PATH: &str = "control/signal";
/// Key holding the last-written volatility multiplier.
pub const SPEED_PATH: &str = "control/speed";

/// One externally pushed change to the engine's bias state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlUpdate {
    Signal(Signal),
    Volatility(Volatility),
}

impl ControlUpdate {
    /// Decode a channel write. Returns `None` for keys the engine does not
    /// consume and for empty speed values.
    ///
    /// - signal: string literal, anything else (including null) is NEUTRAL
    /// - speed: number or numeric string, clamped by [`Volatility::new`]
    pub fn decode(path: &str, value: &Value) -> Option<Self> {
        match path {
            SIGNAL_PATH => {
                let signal = value.as_str().map(Signal::parse_lenient).unwrap_or_default();
                Some(Self::Signal(signal))
            }
            SPEED_PATH => {
                let multiplier = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }?;
                Some(Self::Volatility(Volatility::new(multiplier)))
            }
            _ => None,
        }
    }

    /// Channel key and payload for this update.
    pub fn encode(&self) -> (&'static str, Value) {
        match self {
            Self::Signal(signal) => (SIGNAL_PATH, Value::from(signal.as_ref())),
            Self::Volatility(volatility) => (SPEED_PATH, Value::from(volatility.value())),
        }
    }
}

/// Injected source of bias updates (replaces a global "current signal").
///
/// Implementations deliver the current state on subscription and every
/// later change, in order, on the caller's thread. A callback returning
/// `false` is unsubscribed.
pub trait BiasSource {
    fn subscribe(&mut self, callback: Box<dyn FnMut(ControlUpdate) -> bool>);
}
