//! Notification and navigation sinks.
//!
//! The tracing sinks log what a real shell would render; the recording
//! sinks keep everything they receive so callers can inspect it.

use std::sync::{Mutex, PoisonError};

use super::{Navigator, Notifier, PageReference, Toast, ToastVariant};

/// Logs toasts through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Error | ToastVariant::Warning => {
                tracing::warn!(title = %toast.title, message = %toast.message, "toast");
            }
            ToastVariant::Info | ToastVariant::Success => {
                tracing::info!(title = %toast.title, message = %toast.message, "toast");
            }
        }
    }
}

/// Logs navigation requests through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, target: PageReference) {
        let target = serde_json::to_string(&target).unwrap_or_default();
        tracing::info!(%target, "navigate");
    }
}

/// Keeps every toast it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toasts received so far, oldest first.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}

/// Keeps every navigation target it receives.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<PageReference>>,
}

impl RecordingNavigator {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets received so far, oldest first.
    #[must_use]
    pub fn targets(&self) -> Vec<PageReference> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: PageReference) {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
    }
}
