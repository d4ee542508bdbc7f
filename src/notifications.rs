//! Notification queue.
//!
//! The service only owns the list of live notifications and their expiry
//! times; `toast` renders that list into the DOM. Time comes from an
//! injected [`Clock`] so expiry can be driven deterministically in tests.

use std::cell::Cell;
use std::rc::Rc;

use crate::constants::{DEFAULT_NOTIFICATION_DURATION_MS, PROGRESS_COMPLETE_LINGER_MS};

pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        crate::utils::now_ms()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now: Rc::new(Cell::new(start_ms)) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Severity::Success => "Success",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Information",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duration {
    Millis(u64),
    /// Stays until dismissed.
    Persistent,
}

impl Default for Duration {
    fn default() -> Self {
        Duration::Millis(DEFAULT_NOTIFICATION_DURATION_MS)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowOptions {
    pub duration: Duration,
}

impl ShowOptions {
    pub fn persistent() -> Self {
        Self { duration: Duration::Persistent }
    }

    pub fn millis(ms: u64) -> Self {
        Self { duration: Duration::Millis(ms) }
    }
}

pub type NotificationId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    /// Percent complete for progress notifications.
    pub progress: Option<f64>,
    pub expires_at: Option<u64>,
}

impl Notification {
    pub fn title(&self) -> &'static str {
        if self.progress.is_some() {
            "Processing..."
        } else {
            self.severity.title()
        }
    }
}

pub struct NotificationService {
    clock: Rc<dyn Clock>,
    items: Vec<Notification>,
    next_id: NotificationId,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(Rc::new(SystemClock))
    }
}

impl NotificationService {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            items: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> NotificationId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn show(&mut self, message: impl Into<String>, severity: Severity, options: ShowOptions) -> NotificationId {
        let id = self.allocate_id();
        let expires_at = match options.duration {
            Duration::Millis(ms) => Some(self.clock.now_ms() + ms),
            Duration::Persistent => None,
        };
        self.items.push(Notification {
            id,
            message: message.into(),
            severity,
            progress: None,
            expires_at,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, Severity::Success, ShowOptions::default())
    }

    pub fn error(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, Severity::Error, ShowOptions::default())
    }

    pub fn warning(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, Severity::Warning, ShowOptions::default())
    }

    pub fn info(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, Severity::Info, ShowOptions::default())
    }

    /// Returns `false` when the id is unknown (already expired or dismissed).
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn dismiss_all(&mut self) {
        self.items.clear();
    }

    /// Replace the text (and optionally the severity) of a live notification.
    pub fn update(&mut self, id: NotificationId, message: impl Into<String>, severity: Option<Severity>) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.message = message.into();
                if let Some(severity) = severity {
                    n.severity = severity;
                }
                true
            }
            None => false,
        }
    }

    /// Create or advance a progress notification. Reaching 100% schedules
    /// removal one second later.
    pub fn progress(&mut self, id: Option<NotificationId>, message: impl Into<String>, percent: f64) -> NotificationId {
        let percent = percent.clamp(0.0, 100.0);
        let now = self.clock.now_ms();
        let expires_at = (percent >= 100.0).then_some(now + PROGRESS_COMPLETE_LINGER_MS);
        let message = message.into();

        if let Some(existing) = id.and_then(|id| self.items.iter_mut().find(|n| n.id == id)) {
            existing.message = message;
            existing.progress = Some(percent);
            if expires_at.is_some() {
                existing.expires_at = expires_at;
            }
            return existing.id;
        }

        let id = self.allocate_id();
        self.items.push(Notification {
            id,
            message,
            severity: Severity::Info,
            progress: Some(percent),
            expires_at,
        });
        id
    }

    /// Drop notifications whose expiry is at or before `now`; returns their ids.
    pub fn tick(&mut self, now: u64) -> Vec<NotificationId> {
        let mut expired = Vec::new();
        self.items.retain(|n| match n.expires_at {
            Some(at) if at <= now => {
                expired.push(n.id);
                false
            }
            _ => true,
        });
        expired
    }

    /// Expire against the injected clock.
    pub fn tick_now(&mut self) -> Vec<NotificationId> {
        let now = self.clock.now_ms();
        self.tick(now)
    }

    pub fn active(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }
}
