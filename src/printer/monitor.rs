//! Periodic paper-presence polling with change notification.
//!
//! The printer never reports paper state on its own, so the monitor asks
//! every `interval` and calls the registered observers when the answer
//! changes.

use std::time::Duration;

use tracing::{info, warn};

use crate::encoder::Encoder;

/// Callback invoked with the new paper state.
pub type PaperObserver = Box<dyn Fn(bool) + Send>;

pub struct StatusMonitor {
    interval: Duration,
    last_poll: Option<Duration>,
    paper_present: bool,
    observers: Vec<PaperObserver>,
}

impl StatusMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_poll: None,
            paper_present: true,
            observers: Vec::new(),
        }
    }

    /// Last known paper state.
    pub fn paper_present(&self) -> bool {
        self.paper_present
    }

    pub fn subscribe(&mut self, observer: PaperObserver) {
        self.observers.push(observer);
    }

    /// Set the initial state without notifying anyone.
    pub fn prime(&mut self, paper_present: bool, now: Duration) {
        self.paper_present = paper_present;
        self.last_poll = Some(now);
    }

    /// Whether a poll is due at `now`.
    pub fn due(&self, now: Duration) -> bool {
        match self.last_poll {
            Some(last) => now.saturating_sub(last) >= self.interval,
            None => true,
        }
    }

    /// Record a paper reading. Observers fire only on a change. Returns
    /// whether the state changed.
    pub fn observe(&mut self, paper_present: bool) -> bool {
        if paper_present == self.paper_present {
            return false;
        }
        self.paper_present = paper_present;
        info!(paper_present, "paper status changed");
        for observer in &self.observers {
            observer(paper_present);
        }
        true
    }

    /// Poll the printer if the interval has passed. A failed query is
    /// logged and leaves the known state unchanged.
    pub fn poll(&mut self, encoder: &mut Encoder, now: Duration) -> bool {
        if !self.due(now) {
            return false;
        }
        self.last_poll = Some(now);
        match encoder.has_paper() {
            Ok(present) => self.observe(present),
            Err(e) => {
                warn!(error = %e, "paper status poll failed");
                false
            }
        }
    }
}
