//! Signal channel: a single-slot mailbox for request/response
//! exchanges between workers.
//!
//! The slot holds at most one [`Signal`] and `post` always overwrites it.
//! Only one exchange may be outstanding at a time. The node keeps to that by
//! construction: the transmitter is the only requester (latency probes) and
//! the receiver the only responder.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SignalCode {
    /// "I need some data."
    Request = 0,
    /// "Here's the data."
    Response = 1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub code: SignalCode,
    pub payload: String,
}

#[derive(Debug, Default)]
pub struct SignalChannel {
    slot: Mutex<Option<Signal>>,
    changed: Condvar,
}

impl SignalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot and wake any waiter.
    pub fn post(&self, code: SignalCode, payload: impl Into<String>) {
        *self.slot.lock() = Some(Signal {
            code,
            payload: payload.into(),
        });
        self.changed.notify_all();
    }

    /// Current slot contents. Does not clear the slot.
    pub fn read(&self) -> Option<Signal> {
        self.slot.lock().clone()
    }

    /// Overwrite the slot only if its current contents satisfy `accept`.
    /// Check and write happen under one lock acquisition.
    pub fn post_if(
        &self,
        accept: impl Fn(&Signal) -> bool,
        code: SignalCode,
        payload: impl Into<String>,
    ) -> bool {
        let mut slot = self.slot.lock();
        if !slot.as_ref().is_some_and(|s| accept(s)) {
            return false;
        }
        *slot = Some(Signal {
            code,
            payload: payload.into(),
        });
        drop(slot);
        self.changed.notify_all();
        true
    }

    pub fn clear(&self) {
        self.slot.lock().take();
    }

    /// Wait up to `timeout` for the slot to hold a signal matching `accept`.
    /// Returns a copy; the slot is left as is.
    pub fn wait_until(
        &self,
        timeout: Duration,
        accept: impl Fn(&Signal) -> bool,
    ) -> Option<Signal> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if let Some(signal) = slot.as_ref().filter(|s| accept(*s)) {
                return Some(signal.clone());
            }
            if self.changed.wait_until(&mut slot, deadline).timed_out() {
                return slot.as_ref().filter(|s| accept(*s)).cloned();
            }
        }
    }
}
