use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::domain::control::{BiasSource, ControlUpdate, SIGNAL_PATH, SPEED_PATH};
use crate::domain::logging::LogComponent;
use crate::log_debug;

/// Returns `false` once it no longer wants updates.
type ValueListener = Box<dyn FnMut(&Value) -> bool>;

/// In-process key/value store with change notification, standing in for the
/// realtime database the admin console writes to.
///
/// Listeners receive the current value (or `null`) when they register and
/// every later change of their key, in write order. Writing the value a key
/// already holds does not notify. A listener that returns `false` is removed.
#[derive(Default)]
pub struct ControlChannel {
    values: HashMap<String, Value>,
    listeners: Vec<(String, ValueListener)>,
}

impl ControlChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn set(&mut self, path: &str, value: Value) {
        if self.values.get(path) == Some(&value) {
            return;
        }
        log_debug!(LogComponent::Control("Channel"), "{} = {}", path, value);

        let before = self.listeners.len();
        self.listeners.retain_mut(|(key, listener)| key != path || listener(&value));
        let dropped = before - self.listeners.len();
        if dropped > 0 {
            log_debug!(LogComponent::Control("Channel"), "dropped {} listeners on {}", dropped, path);
        }
        self.values.insert(path.to_string(), value);
    }

    /// Write an engine update under its own key.
    pub fn publish(&mut self, update: ControlUpdate) {
        let (path, value) = update.encode();
        self.set(path, value);
    }

    pub fn on_value(&mut self, path: &str, mut listener: ValueListener) {
        if listener(self.values.get(path).unwrap_or(&Value::Null)) {
            self.listeners.push((path.to_string(), listener));
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl BiasSource for ControlChannel {
    fn subscribe(&mut self, callback: Box<dyn FnMut(ControlUpdate) -> bool>) {
        let shared = Rc::new(RefCell::new(callback));
        let alive = Rc::new(Cell::new(true));
        for path in [SIGNAL_PATH, SPEED_PATH] {
            let callback = Rc::clone(&shared);
            let alive = Rc::clone(&alive);
            self.on_value(
                path,
                Box::new(move |value| {
                    if !alive.get() {
                        return false;
                    }
                    if let Some(update) = ControlUpdate::decode(path, value) {
                        alive.set((&mut *callback.borrow_mut())(update));
                    }
                    alive.get()
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{Signal, Volatility};
    use serde_json::json;

    fn recorder() -> (Rc<RefCell<Vec<ControlUpdate>>>, Box<dyn FnMut(ControlUpdate) -> bool>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (
            seen,
            Box::new(move |update| {
                sink.borrow_mut().push(update);
                true
            }),
        )
    }

    #[test]
    fn subscription_delivers_current_state_first() {
        let mut channel = ControlChannel::new();
        channel.set(SPEED_PATH, json!(2.0));

        let (seen, callback) = recorder();
        channel.subscribe(callback);

        assert_eq!(
            *seen.borrow(),
            vec![
                ControlUpdate::Signal(Signal::Neutral),
                ControlUpdate::Volatility(Volatility::new(2.0)),
            ]
        );
    }

    #[test]
    fn changes_arrive_in_write_order() {
        let mut channel = ControlChannel::new();
        let (seen, callback) = recorder();
        channel.subscribe(callback);
        seen.borrow_mut().clear();

        channel.publish(ControlUpdate::Signal(Signal::Up));
        channel.set(SIGNAL_PATH, json!("DOWN"));
        channel.set(SIGNAL_PATH, json!("DOWN"));
        channel.set("settings/wallets", json!({"btc": "x"}));

        assert_eq!(
            *seen.borrow(),
            vec![ControlUpdate::Signal(Signal::Up), ControlUpdate::Signal(Signal::Down)]
        );
        assert_eq!(channel.get(SIGNAL_PATH), Some(&json!("DOWN")));
    }

    #[test]
    fn raw_listeners_see_null_before_first_write() {
        let mut channel = ControlChannel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        channel.on_value(
            "x",
            Box::new(move |v| {
                sink.borrow_mut().push(v.clone());
                true
            }),
        );
        channel.set("x", json!(1));

        assert_eq!(*seen.borrow(), vec![Value::Null, json!(1)]);
        assert_eq!(channel.listener_count(), 1);
    }

    #[test]
    fn listeners_that_decline_are_removed() {
        let mut channel = ControlChannel::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        channel.on_value(
            "x",
            Box::new(move |_| {
                counter.set(counter.get() + 1);
                counter.get() < 2
            }),
        );
        channel.on_value("y", Box::new(|_| false));
        assert_eq!(channel.listener_count(), 1);

        channel.set("x", json!(1));
        channel.set("x", json!(2));
        assert_eq!(calls.get(), 2);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn declined_subscription_detaches_from_both_keys() {
        let mut channel = ControlChannel::new();
        let open = Rc::new(Cell::new(true));
        let flag = Rc::clone(&open);
        channel.subscribe(Box::new(move |_| flag.get()));
        assert_eq!(channel.listener_count(), 2);

        open.set(false);
        channel.publish(ControlUpdate::Signal(Signal::Up));
        assert_eq!(channel.listener_count(), 1);
        channel.publish(ControlUpdate::Volatility(Volatility::new(2.0)));
        assert_eq!(channel.listener_count(), 0);
    }
}
