//! Filter coordinator: owns the filter panel state and publishes it.
//!
//! Every field handler mutates one field of the live [`FilterCriteria`]
//! and then runs the shared pipeline: validate, then debounce, then
//! publish a deep snapshot on [`CarFilterChannel`]. A failed validation
//! records per-field diagnostics and cancels any publication still
//! waiting, so an invalid state is never published. A successful one
//! replaces the pending publication with a new one scheduled a full
//! quiescence window later, so a burst of edits produces a single
//! snapshot carrying the state after the last edit.
//!
//! The scheduled publication is a spawned task sleeping on
//! [`tokio::time`]; each schedule bumps a generation counter and the task
//! only publishes if its generation is still current when it wakes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::collaborators::{PicklistField, PicklistSource, PicklistValue};
use crate::config::DeskConfig;
use crate::domain::filter::{MAX_RATING, apply_checkbox};
use crate::domain::{
    CarFilterChannel, FilterCriteria, FilterSnapshot, FuelType, MessageContext, Transmission,
};
use crate::error::{DeskError, FilterValidationError};

/// Options offered by the filter panel's picklist inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Pickup locations.
    pub pickup_locations: Vec<PicklistValue>,
    /// Gearbox checkboxes.
    pub transmission_types: Vec<Transmission>,
    /// Fuel type checkboxes.
    pub fuel_types: Vec<FuelType>,
}

#[derive(Debug)]
struct CoordinatorState {
    criteria: FilterCriteria,
    diagnostics: Option<FilterValidationError>,
    /// Bumped on every pipeline run; a scheduled publication only fires
    /// if it still carries the latest value.
    generation: u64,
    pending: Option<JoinHandle<()>>,
    published: u64,
}

/// Debounced, validated publisher of the filter panel state.
///
/// Cheap to clone; clones share the same state. Designed for a
/// current-thread runtime: handlers and the scheduled publication never
/// run concurrently, which is what makes cancellation total.
#[derive(Debug, Clone)]
pub struct FilterCoordinator {
    context: MessageContext,
    window: Duration,
    state: Arc<Mutex<CoordinatorState>>,
}

impl FilterCoordinator {
    /// Creates a coordinator starting from `defaults`, publishing through
    /// `context` after `window` of quiescence.
    #[must_use]
    pub fn new(context: MessageContext, defaults: FilterCriteria, window: Duration) -> Self {
        Self {
            context,
            window,
            state: Arc::new(Mutex::new(CoordinatorState {
                criteria: defaults,
                diagnostics: None,
                generation: 0,
                pending: None,
                published: 0,
            })),
        }
    }

    /// Creates a coordinator using the configured defaults and window.
    #[must_use]
    pub fn from_config(context: MessageContext, config: &DeskConfig) -> Self {
        Self::new(context, config.filter_defaults(), config.filter_debounce)
    }

    /// Copy of the live criteria, for rendering the panel.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        self.lock().criteria.clone()
    }

    /// Diagnostics of the last failed validation; `None` once valid.
    #[must_use]
    pub fn diagnostics(&self) -> Option<FilterValidationError> {
        self.lock().diagnostics.clone()
    }

    /// Returns `true` while a publication is scheduled.
    #[must_use]
    pub fn has_pending_publication(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Number of snapshots published so far.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.lock().published
    }

    /// Handles the search box.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_search_key(&self, search_key: impl Into<String>) -> Result<(), DeskError> {
        let search_key = search_key.into();
        self.mutate("search_key", |c| c.search_key = search_key)
    }

    /// Handles the pickup location combobox.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_pickup_location(&self, location: impl Into<String>) -> Result<(), DeskError> {
        let location = location.into();
        self.mutate("pickup_location", |c| c.pickup_location = location)
    }

    /// Handles the start date input.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_start_date(&self, start: Option<NaiveDate>) -> Result<(), DeskError> {
        self.mutate("start_date", |c| c.date_range.start = start)
    }

    /// Handles the end date input.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_end_date(&self, end: Option<NaiveDate>) -> Result<(), DeskError> {
        self.mutate("end_date", |c| c.date_range.end = end)
    }

    /// Handles the seat slider. Values below 1 are raised to 1.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_max_seats(&self, max_seats: u32) -> Result<(), DeskError> {
        self.mutate("max_seats", |c| c.max_seats = max_seats.max(1))
    }

    /// Handles the rate slider. Negative or non-finite values become 0.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_max_rental_rate(&self, rate: f64) -> Result<(), DeskError> {
        let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        self.mutate("max_rental_rate", |c| c.max_rental_rate = rate)
    }

    /// Handles the rating input, clamped into `[0, 5]`.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_min_rating(&self, rating: f64) -> Result<(), DeskError> {
        let rating = if rating.is_finite() {
            rating.clamp(0.0, MAX_RATING)
        } else {
            0.0
        };
        self.mutate("min_rating", |c| c.min_rating = rating)
    }

    /// Handles one transmission checkbox. Only `value` is added or
    /// removed; the other checked values are left alone.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_transmission(&self, value: Transmission, checked: bool) -> Result<(), DeskError> {
        self.mutate("transmission_types", |c| {
            apply_checkbox(&mut c.transmission_types, value, checked);
        })
    }

    /// Handles one fuel type checkbox. Only `value` is added or removed;
    /// the other checked values are left alone.
    ///
    /// # Errors
    ///
    /// See [`Self::publish_filter`].
    pub fn set_fuel_type(&self, value: FuelType, checked: bool) -> Result<(), DeskError> {
        self.mutate("fuel_types", |c| {
            apply_checkbox(&mut c.fuel_types, value, checked);
        })
    }

    /// Validates the current state and schedules its publication.
    ///
    /// Called by every field handler; callable directly to republish the
    /// unchanged state.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Validation`] with per-field diagnostics if the
    /// dates are missing or out of order (any pending publication is
    /// cancelled), or [`DeskError::Internal`] if no tokio runtime is
    /// available to schedule the publication.
    pub fn publish_filter(&self) -> Result<(), DeskError> {
        let mut state = self.lock();
        self.run_pipeline(&mut state)
    }

    /// Cancels a scheduled publication without publishing it.
    pub fn cancel_pending(&self) {
        let mut state = self.lock();
        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
            tracing::debug!("pending filter publication cancelled");
        }
    }

    /// Loads the picklist options of the panel.
    ///
    /// A list that fails to load is left empty; filtering still works.
    pub async fn load_options(&self, source: &dyn PicklistSource) -> FilterOptions {
        let pickup_locations = fetch_picklist(source, PicklistField::PickupLocation).await;
        let transmission_types = fetch_picklist(source, PicklistField::TransmissionType)
            .await
            .iter()
            .filter_map(|v| parse_option(&v.value))
            .collect();
        let fuel_types = fetch_picklist(source, PicklistField::FuelType)
            .await
            .iter()
            .filter_map(|v| parse_option(&v.value))
            .collect();

        FilterOptions {
            pickup_locations,
            transmission_types,
            fuel_types,
        }
    }

    fn mutate<F>(&self, field: &'static str, apply: F) -> Result<(), DeskError>
    where
        F: FnOnce(&mut FilterCriteria),
    {
        let mut state = self.lock();
        apply(&mut state.criteria);
        tracing::debug!(field, "filter field changed");
        self.run_pipeline(&mut state)
    }

    fn run_pipeline(&self, state: &mut CoordinatorState) -> Result<(), DeskError> {
        state.generation += 1;
        let previous = state.pending.take();
        if let Some(previous) = &previous {
            previous.abort();
        }

        if let Err(diagnostics) = state.criteria.validate() {
            if previous.is_some() {
                tracing::debug!("pending filter publication cancelled: filter invalid");
            }
            tracing::debug!(%diagnostics, "filter not published");
            state.diagnostics = Some(diagnostics.clone());
            return Err(DeskError::Validation(diagnostics));
        }
        state.diagnostics = None;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            DeskError::Internal("filter publication requires a tokio runtime".to_string())
        })?;
        let generation = state.generation;
        let task = fire_after_quiescence(
            Arc::clone(&self.state),
            self.context.clone(),
            self.window,
            generation,
        );
        state.pending = Some(runtime.spawn(task));
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<CoordinatorState>) -> MutexGuard<'_, CoordinatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn fire_after_quiescence(
    state: Arc<Mutex<CoordinatorState>>,
    context: MessageContext,
    window: Duration,
    generation: u64,
) {
    tokio::time::sleep(window).await;

    let snapshot = {
        let mut state = lock_state(&state);
        if state.generation != generation {
            return;
        }
        state.pending = None;
        state.published += 1;
        FilterSnapshot::capture(state.published, &state.criteria)
    };

    let delivered = context.publish::<CarFilterChannel>(&snapshot);
    tracing::info!(sequence = snapshot.sequence, delivered, "filter published");
}

async fn fetch_picklist(source: &dyn PicklistSource, field: PicklistField) -> Vec<PicklistValue> {
    match source.picklist_values(field).await {
        Ok(values) => values,
        Err(err) => {
            tracing::warn!(?field, error = %err, "picklist unavailable");
            Vec::new()
        }
    }
}

fn parse_option<T: std::str::FromStr>(value: &str) -> Option<T> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        tracing::warn!(value, "ignoring unknown picklist value");
    }
    parsed
}
