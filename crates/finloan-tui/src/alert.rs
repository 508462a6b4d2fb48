//! Transient alert banners.
//!
//! Alerts appear above the form and expire on their own after the
//! configured duration. The user can also dismiss the newest one early.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default time an alert stays on screen.
pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_millis(5000);

/// Alert severity, mapped to a banner color by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlertSeverity {
    Info,
    Success,
    Warning,
    Danger,
}

impl AlertSeverity {
    /// Get the icon for this severity level.
    pub fn icon(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "ℹ",
            AlertSeverity::Success => "✔",
            AlertSeverity::Warning => "⚠",
            AlertSeverity::Danger => "✖",
        }
    }
}

/// A single banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    pub severity: AlertSeverity,
    pub message: String,
    pub expires_at: Instant,
}

impl Alert {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Visible alerts, oldest first.
#[derive(Debug, Clone)]
pub struct AlertQueue {
    duration: Duration,
    alerts: VecDeque<Alert>,
    next_id: u64,
}

impl AlertQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            alerts: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Show an alert. Returns its id.
    pub fn push(&mut self, severity: AlertSeverity, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.alerts.push_back(Alert {
            id,
            severity,
            message: message.into(),
            expires_at: now + self.duration,
        });
        id
    }

    /// Remove an alert before it expires.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    pub fn dismiss_latest(&mut self) -> Option<Alert> {
        self.alerts.pop_back()
    }

    /// Drop expired alerts. Returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.alerts.len();
        self.alerts.retain(|a| !a.is_expired(now));
        before - self.alerts.len()
    }

    /// Alerts to draw, newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().rev()
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.alerts.iter().map(|a| a.expires_at).min()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl Default for AlertQueue {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_DURATION)
    }
}
