use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::control::{ClockTime, ControlUpdate, ScheduledSignal, SignalScheduler, TaskId};
use crate::domain::errors::AppError;
use crate::domain::events::{EngineEvent, EventDispatcher, InMemoryEventDispatcher};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Signal, Timestamp, Volatility};
use crate::infrastructure::ControlChannel;
use crate::log_info;

/// Admin-side automation: immediate and time-of-day signal writes to the
/// control channel.
pub struct SignalAutomation {
    scheduler: SignalScheduler,
    channel: Rc<RefCell<ControlChannel>>,
    events: InMemoryEventDispatcher,
}

impl SignalAutomation {
    pub fn new(channel: Rc<RefCell<ControlChannel>>) -> Self {
        Self { scheduler: SignalScheduler::new(), channel, events: InMemoryEventDispatcher::new() }
    }

    pub fn subscribe_events<F>(&mut self, handler: F)
    where
        F: Fn(&EngineEvent) + 'static,
    {
        self.events.subscribe(handler);
    }

    pub fn send_signal(&self, signal: Signal) {
        self.channel.borrow_mut().publish(ControlUpdate::Signal(signal));
    }

    pub fn send_volatility(&self, multiplier: f64) {
        self.channel.borrow_mut().publish(ControlUpdate::Volatility(Volatility::new(multiplier)));
    }

    pub fn schedule_at(&mut self, deadline: Timestamp, signal: Signal) -> TaskId {
        log_info!(LogComponent::Control("Automation"), "{} scheduled for {}", signal, deadline.value());
        self.scheduler.schedule(deadline, signal)
    }

    /// Schedule `signal` for the next occurrence of `hhmm` in the observer's
    /// local time.
    pub fn schedule_at_clock(
        &mut self,
        hhmm: &str,
        signal: Signal,
        now_ms: u64,
        utc_offset_minutes: i32,
    ) -> Result<(TaskId, Timestamp), AppError> {
        let clock: ClockTime = hhmm.parse()?;
        let deadline = clock.next_occurrence(Timestamp::from_millis(now_ms), utc_offset_minutes)?;
        Ok((self.schedule_at(deadline, signal), deadline))
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.scheduler.cancel(id)
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.scheduler.len();
        self.scheduler.clear();
        cancelled
    }

    pub fn pending(&self) -> Vec<ScheduledSignal> {
        self.scheduler.pending()
    }

    /// Publish every signal due at `now_ms` in deadline order and return the
    /// next deadline still pending.
    pub fn fire_due(&mut self, now_ms: u64) -> Option<Timestamp> {
        for task in self.scheduler.take_due(Timestamp::from_millis(now_ms)) {
            log_info!(
                LogComponent::Control("Automation"),
                "firing {} (due {}, late by {}ms)",
                task.signal,
                task.deadline.value(),
                now_ms.saturating_sub(task.deadline.value())
            );
            self.send_signal(task.signal);
            self.events.publish(EngineEvent::ScheduledSignalFired { signal: task.signal, deadline: task.deadline.value() });
        }
        self.scheduler.next_deadline()
    }
}
