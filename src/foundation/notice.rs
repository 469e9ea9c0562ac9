//! User-facing, non-blocking notifications dispatched to the host.

use std::cell::RefCell;

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational message.
    Info,
    /// Something the user asked for did not happen.
    Warning,
}

/// A message shown to the user without interrupting them.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Human-readable text.
    pub content: String,
}

impl Notice {
    /// Build a warning notice.
    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            content: content.into(),
        }
    }

    /// Build an info notice.
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            content: content.into(),
        }
    }
}

/// Sink for notices, supplied by the host.
pub trait Notifier {
    /// Deliver one notice.
    fn notify(&self, notice: Notice);
}

/// Notifier that forwards everything to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(content = %notice.content, "notice"),
            NoticeLevel::Warning => tracing::warn!(content = %notice.content, "notice"),
        }
    }
}

/// Notifier that keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every notice received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    /// Number of warnings received so far.
    pub fn warning_count(&self) -> usize {
        self.notices
            .borrow()
            .iter()
            .filter(|n| n.level == NoticeLevel::Warning)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}
