//! Booking modal: collects the booking form and saves it for one car.
//!
//! The car id is fixed when the modal opens and written into the
//! submitted field set right before the save call, so the form itself
//! never has to carry it. A failed save leaves the modal open with the
//! failure message available for display; the user can correct the form
//! and submit again, or cancel.

use std::sync::Arc;

use super::{ModalOutcome, ModalResult, ModalSlot};
use crate::collaborators::RecordStore;
use crate::domain::booking::fields;
use crate::domain::{BOOKING_OBJECT, BookingCreated, FieldMap, RecordId};
use crate::error::DeskError;

const KIND: &str = "booking";

/// Opens booking modals.
#[derive(Debug, Clone)]
pub struct BookingModal {
    store: Arc<dyn RecordStore>,
}

impl BookingModal {
    /// Creates an opener saving through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Opens a booking modal for `car_id`.
    #[must_use]
    pub fn open(&self, car_id: RecordId) -> (BookingModalSession, ModalResult<BookingCreated>) {
        let (slot, result) = ModalSlot::open(KIND);
        tracing::info!(%car_id, "booking modal opened");
        let session = BookingModalSession {
            car_id,
            store: Arc::clone(&self.store),
            slot,
            error: None,
        };
        (session, result)
    }
}

/// One open booking modal.
#[derive(Debug)]
pub struct BookingModalSession {
    car_id: RecordId,
    store: Arc<dyn RecordStore>,
    slot: ModalSlot<BookingCreated>,
    error: Option<String>,
}

impl BookingModalSession {
    /// The car being booked.
    #[must_use]
    pub const fn car_id(&self) -> &RecordId {
        &self.car_id
    }

    /// Hidden form fields: the car reference.
    #[must_use]
    pub fn hidden_fields(&self) -> FieldMap {
        let mut hidden = FieldMap::new();
        hidden.insert(fields::CAR.to_string(), self.car_id.clone().into());
        hidden
    }

    /// Returns `true` until the modal is saved or cancelled.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.slot.is_open()
    }

    /// Message of the last failed save, cleared by a successful one.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submits the form.
    ///
    /// The car reference is injected into `form` (overriding any value the
    /// form carried) and the record is saved. On success the modal closes
    /// with the new booking id. On failure it stays open and the message
    /// is kept for [`Self::error_message`].
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::ModalClosed`] if the modal was already settled,
    /// or [`DeskError::Save`] if the store rejected the booking.
    pub async fn submit(&mut self, mut form: FieldMap) -> Result<RecordId, DeskError> {
        if !self.slot.is_open() {
            return Err(DeskError::ModalClosed(self.slot.kind()));
        }

        form.insert(fields::CAR.to_string(), self.car_id.clone().into());

        match self.store.save(BOOKING_OBJECT, form).await {
            Ok(record_id) => {
                self.error = None;
                tracing::info!(car_id = %self.car_id, booking_id = %record_id, "booking saved");
                self.slot.close(ModalOutcome::success(BookingCreated {
                    record_id: record_id.clone(),
                }));
                Ok(record_id)
            }
            Err(err) => {
                let err = match err {
                    DeskError::Save(message) => DeskError::Save(message),
                    other => DeskError::Save(other.to_string()),
                };
                tracing::warn!(car_id = %self.car_id, error = %err, "booking save failed; modal stays open");
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Dismisses the modal without saving.
    pub fn cancel(mut self) {
        tracing::info!(car_id = %self.car_id, "booking modal cancelled");
        self.slot.close(ModalOutcome::cancelled());
    }
}
