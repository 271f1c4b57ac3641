//! Workflow launcher: opens modals on behalf of views and acts on their
//! outcome.
//!
//! A successful booking shows a confirmation toast and navigates to the
//! new booking's record page. A cancelled modal has no side effect.

use std::sync::Arc;

use crate::collaborators::{Navigator, Notifier, PageReference, RecordStore, Toast, ToastVariant};
use crate::domain::{BOOKING_OBJECT, BookingCreated, RecordId};
use crate::modal::{BookingModal, EstimateModal, ModalHost, ModalOutcome, ModalStatus};

/// Title of the toast shown after a booking is saved.
pub const BOOKING_TOAST_TITLE: &str = "Success";
/// Message of the toast shown after a booking is saved.
pub const BOOKING_TOAST_MESSAGE: &str = "Booking Created Successfully";

/// Opens booking and estimate modals and reacts to their outcome.
#[derive(Debug, Clone)]
pub struct WorkflowLauncher {
    booking: BookingModal,
    host: Arc<dyn ModalHost>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl WorkflowLauncher {
    /// Creates a launcher presenting modals through `host`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        host: Arc<dyn ModalHost>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            booking: BookingModal::new(store),
            host,
            notifier,
            navigator,
        }
    }

    /// Opens the booking modal for `car_id` and waits for it to close.
    ///
    /// On success the user is notified and taken to the new booking.
    pub async fn book(&self, car_id: RecordId) -> ModalOutcome<BookingCreated> {
        let (session, result) = self.booking.open(car_id);
        self.host.present_booking(session);
        let outcome = result.await;
        self.finish_booking(&outcome);
        outcome
    }

    /// Opens the estimate modal for `car_id` and waits for it to close.
    pub async fn estimate(&self, car_id: RecordId) -> ModalOutcome<()> {
        let (session, result) = EstimateModal::open(car_id.clone());
        self.host.present_estimate(session);
        let outcome = result.await;
        tracing::info!(%car_id, status = ?outcome.status, "estimate modal closed");
        outcome
    }

    /// Performs the post-booking side effects for `outcome`. Returns the
    /// navigation target, or `None` if the modal was cancelled.
    pub fn finish_booking(&self, outcome: &ModalOutcome<BookingCreated>) -> Option<PageReference> {
        let (ModalStatus::Success, Some(created)) = (outcome.status, outcome.payload.as_ref())
        else {
            tracing::debug!("booking modal closed without a booking");
            return None;
        };

        self.notifier.notify(Toast::new(
            BOOKING_TOAST_TITLE,
            BOOKING_TOAST_MESSAGE,
            ToastVariant::Success,
        ));
        let target = PageReference::record_view(BOOKING_OBJECT, created.record_id.clone());
        self.navigator.navigate(target.clone());
        tracing::info!(booking_id = %created.record_id, "navigating to new booking");
        Some(target)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::collaborators::{PageAction, RecordingNavigator, RecordingNotifier};
    use crate::domain::FieldMap;
    use crate::domain::booking::fields;
    use crate::error::DeskError;
    use crate::modal::{FlowStatus, QueuedModalHost};

    #[derive(Debug)]
    struct FixedStore;

    #[async_trait]
    impl RecordStore for FixedStore {
        async fn save(&self, _object: &str, record: FieldMap) -> Result<RecordId, DeskError> {
            if record.contains_key(fields::CUSTOMER) {
                Ok(RecordId::from("B42"))
            } else {
                Err(DeskError::Save("Customer is required".to_string()))
            }
        }
    }

    struct Harness {
        launcher: WorkflowLauncher,
        host: Arc<QueuedModalHost>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness() -> Harness {
        let host = Arc::new(QueuedModalHost::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let launcher = WorkflowLauncher::new(
            Arc::new(FixedStore),
            Arc::clone(&host) as Arc<dyn ModalHost>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&navigator) as Arc<dyn Navigator>,
        );
        Harness {
            launcher,
            host,
            notifier,
            navigator,
        }
    }

    #[tokio::test]
    async fn successful_booking_toasts_and_navigates() {
        let h = harness();
        let launcher = h.launcher.clone();
        let flow = tokio::spawn(async move { launcher.book(RecordId::from("C1")).await });

        let mut session = h.host.next_booking().await;
        let Err(_) = session.submit(FieldMap::new()).await else {
            panic!("first submit should fail");
        };
        let mut form = FieldMap::new();
        form.insert(fields::CUSTOMER.to_string(), "Asha".into());
        assert!(session.submit(form).await.is_ok());

        let Ok(outcome) = flow.await else {
            panic!("workflow task failed");
        };
        assert!(outcome.is_success());
        assert_eq!(
            h.notifier.toasts(),
            vec![Toast::new(
                "Success",
                "Booking Created Successfully",
                ToastVariant::Success
            )]
        );
        assert_eq!(
            h.navigator.targets(),
            vec![PageReference::RecordPage {
                object_api_name: "Booking__c".to_string(),
                record_id: RecordId::from("B42"),
                action: PageAction::View,
            }]
        );
    }

    #[tokio::test]
    async fn cancelled_booking_has_no_side_effects() {
        let h = harness();
        let launcher = h.launcher.clone();
        let flow = tokio::spawn(async move { launcher.book(RecordId::from("C1")).await });

        h.host.next_booking().await.cancel();

        let Ok(outcome) = flow.await else {
            panic!("workflow task failed");
        };
        assert_eq!(outcome, ModalOutcome::cancelled());
        assert!(h.notifier.toasts().is_empty());
        assert!(h.navigator.targets().is_empty());
    }

    #[tokio::test]
    async fn estimate_resolves_when_process_finishes() {
        let h = harness();
        let launcher = h.launcher.clone();
        let flow = tokio::spawn(async move { launcher.estimate(RecordId::from("C3")).await });

        let mut session = h.host.next_estimate().await;
        assert_eq!(session.input_variables().len(), 1);
        session.handle_status_change(FlowStatus::Paused);
        session.handle_status_change(FlowStatus::Finished);

        let Ok(outcome) = flow.await else {
            panic!("workflow task failed");
        };
        assert_eq!(outcome, ModalOutcome::completed());
        assert!(h.navigator.targets().is_empty());
    }
}
