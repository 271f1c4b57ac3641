//! Queueing [`ModalHost`] for hosts driven from their own event loop.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::{BookingModalSession, EstimateModalSession, ModalHost};

/// Host that queues presented sessions for a separate driver.
///
/// The driver pulls sessions with [`Self::next_booking`] or
/// [`Self::next_estimate`] and feeds them user input. Sessions left in
/// the queue when the host is dropped resolve as cancelled.
#[derive(Debug, Default)]
pub struct QueuedModalHost {
    bookings: Mutex<VecDeque<BookingModalSession>>,
    estimates: Mutex<VecDeque<EstimateModalSession>>,
    booking_ready: Notify,
    estimate_ready: Notify,
}

impl QueuedModalHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the next booking modal to be presented.
    pub async fn next_booking(&self) -> BookingModalSession {
        loop {
            if let Some(session) = lock(&self.bookings).pop_front() {
                return session;
            }
            self.booking_ready.notified().await;
        }
    }

    /// Waits for the next estimate modal to be presented.
    pub async fn next_estimate(&self) -> EstimateModalSession {
        loop {
            if let Some(session) = lock(&self.estimates).pop_front() {
                return session;
            }
            self.estimate_ready.notified().await;
        }
    }

    /// Takes the oldest queued booking modal, if any.
    #[must_use]
    pub fn try_next_booking(&self) -> Option<BookingModalSession> {
        lock(&self.bookings).pop_front()
    }

    /// Takes the oldest queued estimate modal, if any.
    #[must_use]
    pub fn try_next_estimate(&self) -> Option<EstimateModalSession> {
        lock(&self.estimates).pop_front()
    }
}

impl ModalHost for QueuedModalHost {
    fn present_booking(&self, session: BookingModalSession) {
        tracing::debug!(car_id = %session.car_id(), "booking modal queued");
        lock(&self.bookings).push_back(session);
        self.booking_ready.notify_one();
    }

    fn present_estimate(&self, session: EstimateModalSession) {
        tracing::debug!(car_id = %session.car_id(), "estimate modal queued");
        lock(&self.estimates).push_back(session);
        self.estimate_ready.notify_one();
    }
}

fn lock<T>(queue: &Mutex<VecDeque<T>>) -> MutexGuard<'_, VecDeque<T>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}
