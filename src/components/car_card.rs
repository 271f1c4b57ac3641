//! Detail card for the car selected in the catalog.
//!
//! The card listens for selections on [`CarSelectionChannel`], fetches the
//! detail fields of the selected car and renders them as badges. Only the
//! lookup for the most recent selection may update the card.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::collaborators::RecordLookup;
use crate::domain::car::fields;
use crate::domain::{
    BookingCreated, CarSelection, CarSelectionChannel, FieldMap, MessageBus, RecordId, Scope,
    SubscriptionToken,
};
use crate::error::DeskError;
use crate::modal::ModalOutcome;

use super::workflow::WorkflowLauncher;

const NOT_AVAILABLE: &str = "N/A";

/// Rendered details of one car.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarDetail {
    /// Display name.
    pub product_name: String,
    /// Model designation.
    pub model: Option<String>,
    /// Car family / segment.
    pub car_family: Option<String>,
    /// `<n> Seats`, or `N/A`.
    pub seating_capacity: String,
    /// Gearbox, or `N/A`.
    pub transmission: String,
    /// Fuel type, or `N/A`.
    pub fuel_type: String,
    /// `$<rate>/day`, or `N/A` when no rate is set.
    pub rental_rate: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Average rating, 0 when the car has no reviews.
    pub average_rating: f64,
}

impl CarDetail {
    /// Builds the badges from looked-up fields.
    #[must_use]
    pub fn from_fields(values: &FieldMap) -> Self {
        let text = |name: &str| {
            values
                .get(name)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |name: &str| values.get(name).and_then(serde_json::Value::as_f64);

        Self {
            product_name: text(fields::NAME).unwrap_or_default(),
            model: text(fields::MODEL),
            car_family: text(fields::CAR_FAMILY),
            seating_capacity: number(fields::SEATS)
                .map_or_else(|| NOT_AVAILABLE.to_string(), |n| format!("{} Seats", n.round())),
            transmission: text(fields::TRANSMISSION).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            fuel_type: text(fields::FUEL_TYPE).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            rental_rate: number(fields::RENTAL_RATE)
                .filter(|rate| *rate > 0.0)
                .map_or_else(|| NOT_AVAILABLE.to_string(), |rate| format!("${rate}/day")),
            description: text(fields::DESCRIPTION),
            average_rating: number(fields::AVERAGE_RATING).unwrap_or(0.0),
        }
    }
}

/// Observable state of the card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardState {
    /// Selected car, `None` until the first selection.
    pub record_id: Option<RecordId>,
    /// Details of the selected car once loaded.
    pub detail: Option<CarDetail>,
    /// Set while a lookup is in flight.
    pub loading: bool,
    /// Message of a failed lookup.
    pub error: Option<String>,
    generation: u64,
}

impl CardState {
    /// Returns `true` once details for the selected car are available.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.detail.is_some()
    }
}

/// The car detail panel.
#[derive(Debug, Clone)]
pub struct CarCard {
    lookup: Arc<dyn RecordLookup>,
    workflows: WorkflowLauncher,
    state: Arc<watch::Sender<CardState>>,
    subscription: Arc<Mutex<Option<SubscriptionToken>>>,
}

impl CarCard {
    /// Creates a disconnected card.
    #[must_use]
    pub fn new(lookup: Arc<dyn RecordLookup>, workflows: WorkflowLauncher) -> Self {
        let (state, _) = watch::channel(CardState::default());
        Self {
            lookup,
            workflows,
            state: Arc::new(state),
            subscription: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribes to car selections. Connecting twice is a no-op.
    pub fn connect(&self, bus: &MessageBus) {
        let mut subscription = self.lock_subscription();
        if subscription.is_some() {
            return;
        }
        let card = self.clone();
        let token = bus.subscribe::<CarSelectionChannel, _>(Scope::Global, move |selection| {
            card.handle_selection(selection)
        });
        *subscription = Some(token);
    }

    /// Drops the selection subscription.
    pub fn disconnect(&self, bus: &MessageBus) {
        if let Some(token) = self.lock_subscription().take() {
            bus.unsubscribe(&token);
        }
    }

    /// Shows `selection` and starts loading its details.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Internal`] if no tokio runtime is available.
    pub fn handle_selection(&self, selection: &CarSelection) -> Result<(), DeskError> {
        let record_id = selection.car_id.clone();
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.record_id = Some(record_id.clone());
            state.detail = None;
            state.error = None;
            state.loading = true;
            generation = state.generation;
        });
        tracing::debug!(%record_id, "car selected for detail card");

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            DeskError::Internal("detail lookup requires a tokio runtime".to_string())
        })?;
        let lookup = Arc::clone(&self.lookup);
        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            let result = lookup.fetch_fields(&record_id, &fields::DETAIL).await;
            state.send_if_modified(|state| {
                if state.generation != generation {
                    tracing::debug!(%record_id, "discarding stale detail lookup");
                    return false;
                }
                state.loading = false;
                match result {
                    Ok(values) => state.detail = Some(CarDetail::from_fields(&values)),
                    Err(err) => {
                        tracing::warn!(%record_id, error = %err, "detail lookup failed");
                        state.error = Some(err.user_message());
                    }
                }
                true
            });
        });
        Ok(())
    }

    /// Copy of the current state.
    #[must_use]
    pub fn state(&self) -> CardState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CardState> {
        self.state.subscribe()
    }

    /// Opens the booking modal for the selected car.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::NoSelection`] if no car is selected.
    pub async fn book_now(&self) -> Result<ModalOutcome<BookingCreated>, DeskError> {
        let record_id = self
            .state
            .borrow()
            .record_id
            .clone()
            .ok_or(DeskError::NoSelection)?;
        Ok(self.workflows.book(record_id).await)
    }

    fn lock_subscription(&self) -> MutexGuard<'_, Option<SubscriptionToken>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
