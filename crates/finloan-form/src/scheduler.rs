//! Debounced live validation.
//!
//! Each edit schedules a validation of the edited field after a delay. A new
//! edit of the same field replaces the pending one, so only the latest
//! keystroke's validation ever fires.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

/// Default delay between the last keystroke and validation.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Pending per-field validations keyed by field name.
#[derive(Debug, Clone)]
pub struct ValidationScheduler {
    delay: Duration,
    pending: HashMap<String, Instant>,
}

impl ValidationScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule validation of `field` at `now + delay`, cancelling any
    /// earlier pending validation of the same field.
    pub fn schedule(&mut self, field: &str, now: Instant) {
        let deadline = now + self.delay;
        if self.pending.insert(field.to_string(), deadline).is_some() {
            trace!(field, "superseded pending validation");
        }
    }

    /// Drop the pending validation of `field`. Returns whether one existed.
    pub fn cancel(&mut self, field: &str) -> bool {
        self.pending.remove(field).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.pending.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending deadline, for sizing the event-loop poll timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every field whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<(Instant, String)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(field, deadline)| (*deadline, field.clone()))
            .collect();
        due.sort();

        for (_, field) in &due {
            self.pending.remove(field);
        }
        due.into_iter().map(|(_, field)| field).collect()
    }
}

impl Default for ValidationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
