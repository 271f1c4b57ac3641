//! Modal workflow controllers.
//!
//! Opening a modal yields two halves: a session, handed to whatever
//! presents the modal ([`ModalHost`]), and a [`ModalResult`] future the
//! caller awaits. The session settles the result exactly once, either
//! when the workflow completes or when the user cancels. Dropping an
//! unsettled session counts as a cancellation, so the result never fails.

pub mod booking;
pub mod estimate;
pub mod host;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

pub use booking::{BookingModal, BookingModalSession};
pub use estimate::{EstimateModal, EstimateModalSession, FlowStatus, FlowVariable};
pub use host::QueuedModalHost;

/// Terminal status of a modal interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalStatus {
    /// The workflow completed.
    Success,
    /// The user dismissed the modal.
    Cancelled,
}

/// Structured outcome delivered through a [`ModalResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalOutcome<P> {
    /// How the modal ended.
    pub status: ModalStatus,
    /// Result value, present only for workflows that produce one.
    pub payload: Option<P>,
}

impl<P> ModalOutcome<P> {
    /// Successful completion carrying `payload`.
    #[must_use]
    pub const fn success(payload: P) -> Self {
        Self {
            status: ModalStatus::Success,
            payload: Some(payload),
        }
    }

    /// Successful completion without a result value.
    #[must_use]
    pub const fn completed() -> Self {
        Self {
            status: ModalStatus::Success,
            payload: None,
        }
    }

    /// Cancellation by the user.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            status: ModalStatus::Cancelled,
            payload: None,
        }
    }

    /// Returns `true` if the workflow completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ModalStatus::Success
    }
}

/// Future resolving to the outcome of one opened modal.
///
/// Resolves to [`ModalOutcome::cancelled`] if the session is dropped
/// without being closed.
#[derive(Debug)]
pub struct ModalResult<P> {
    rx: oneshot::Receiver<ModalOutcome<P>>,
}

impl<P> Future for ModalResult<P> {
    type Output = ModalOutcome<P>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or_else(|_| ModalOutcome::cancelled()))
    }
}

/// Settling half of an opened modal, owned by its session.
pub(crate) struct ModalSlot<P> {
    kind: &'static str,
    id: uuid::Uuid,
    tx: Option<oneshot::Sender<ModalOutcome<P>>>,
}

impl<P> ModalSlot<P> {
    /// Opens a modal of `kind`.
    pub(crate) fn open(kind: &'static str) -> (Self, ModalResult<P>) {
        let (tx, rx) = oneshot::channel();
        let slot = Self {
            kind,
            id: uuid::Uuid::new_v4(),
            tx: Some(tx),
        };
        tracing::debug!(modal = kind, id = %slot.id, "modal opened");
        (slot, ModalResult { rx })
    }

    pub(crate) const fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    pub(crate) const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Settles the result. Returns `false` if it was already settled.
    pub(crate) fn close(&mut self, outcome: ModalOutcome<P>) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };
        tracing::debug!(modal = self.kind, id = %self.id, status = ?outcome.status, "modal closed");
        // The caller may have stopped waiting; that is not an error.
        let _ = tx.send(outcome);
        true
    }
}

impl<P> Drop for ModalSlot<P> {
    fn drop(&mut self) {
        if self.is_open() {
            self.close(ModalOutcome::cancelled());
        }
    }
}

impl<P> fmt::Debug for ModalSlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalSlot")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Presentation layer for modals.
///
/// A host receives a session when a modal opens and drives it from user
/// input (submit, cancel, status changes). Any rendering technology can
/// implement it; the controllers never render anything themselves.
pub trait ModalHost: Send + Sync + fmt::Debug {
    /// Shows the booking form for `session`.
    fn present_booking(&self, session: BookingModalSession);

    /// Shows the estimate guided process for `session`.
    fn present_estimate(&self, session: EstimateModalSession);
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio_test::{assert_pending, assert_ready_eq, task};

    use super::*;

    #[tokio::test]
    async fn close_settles_exactly_once() {
        let (mut slot, result) = ModalSlot::<u32>::open("test");
        assert!(slot.close(ModalOutcome::success(1)));
        assert!(!slot.close(ModalOutcome::success(2)));
        assert!(!slot.is_open());
        assert_eq!(result.await, ModalOutcome::success(1));
    }

    #[tokio::test]
    async fn dropping_open_slot_cancels() {
        let (slot, result) = ModalSlot::<u32>::open("test");
        drop(slot);
        assert_eq!(result.await, ModalOutcome::cancelled());
    }

    #[test]
    fn result_is_pending_until_closed() {
        let (mut slot, result) = ModalSlot::<u32>::open("test");
        let mut result = task::spawn(result);
        assert_pending!(result.poll());
        slot.close(ModalOutcome::completed());
        assert!(result.is_woken());
        assert_ready_eq!(result.poll(), ModalOutcome::completed());
    }

    #[tokio::test]
    async fn reopening_is_independent() {
        let (mut first, first_result) = ModalSlot::<u32>::open("test");
        first.close(ModalOutcome::cancelled());
        assert_eq!(first_result.await.status, ModalStatus::Cancelled);

        let (mut second, second_result) = ModalSlot::<u32>::open("test");
        assert!(second.is_open());
        second.close(ModalOutcome::success(7));
        assert_eq!(second_result.await.payload, Some(7));
    }
}
