//! Catalog list view: tiles for the cars matching the published filter.

use std::sync::Arc;

use crate::collaborators::CarQuery;
use crate::domain::{BookingCreated, MessageBus};
use crate::error::DeskError;
use crate::modal::ModalOutcome;
use crate::service::{CatalogBinding, CatalogState, SelectionRelay};

use super::tile::{CarTile, TileIntent};
use super::workflow::WorkflowLauncher;

/// Result of handling a [`TileIntent`].
#[derive(Debug, Clone, PartialEq)]
pub enum IntentOutcome {
    /// The selection was announced to this many subscribers.
    Selected(usize),
    /// The estimate modal closed.
    Estimated(ModalOutcome<()>),
    /// The booking modal closed.
    Booked(ModalOutcome<BookingCreated>),
}

/// The car list panel.
///
/// Connecting subscribes to the filter channel and loads the catalog;
/// disconnecting drops the subscription.
#[derive(Debug, Clone)]
pub struct CarTileList {
    bus: MessageBus,
    binding: CatalogBinding,
    relay: SelectionRelay,
    workflows: WorkflowLauncher,
}

impl CarTileList {
    /// Creates a disconnected list.
    #[must_use]
    pub fn new(bus: MessageBus, query: Arc<dyn CarQuery>, workflows: WorkflowLauncher) -> Self {
        let relay = SelectionRelay::new(bus.context());
        Self {
            binding: CatalogBinding::new(query),
            bus,
            relay,
            workflows,
        }
    }

    /// Mounts the list.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Internal`] if no tokio runtime is available.
    pub fn connect(&self) -> Result<(), DeskError> {
        self.binding.connect(&self.bus)
    }

    /// Unmounts the list.
    pub fn disconnect(&self) {
        self.binding.disconnect(&self.bus);
    }

    /// The underlying catalog binding.
    #[must_use]
    pub const fn binding(&self) -> &CatalogBinding {
        &self.binding
    }

    /// Current catalog state.
    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.binding.state()
    }

    /// Returns `true` until the first filter arrives; the view shows its
    /// "apply filters" prompt meanwhile.
    #[must_use]
    pub fn show_initial_message(&self) -> bool {
        self.binding.state().awaiting_filters()
    }

    /// Returns `true` if the last query returned at least one car.
    #[must_use]
    pub fn is_records_found(&self) -> bool {
        self.binding.has_results()
    }

    /// Tiles for the current result.
    #[must_use]
    pub fn tiles(&self) -> Vec<CarTile> {
        self.binding.state().cars().iter().map(CarTile::from).collect()
    }

    /// Acts on a tile intent. Modal intents wait for the modal to close.
    pub async fn handle_intent(&self, intent: TileIntent) -> IntentOutcome {
        match intent {
            TileIntent::Selected(car_id) => IntentOutcome::Selected(self.relay.select(car_id)),
            TileIntent::EstimateBooking(car_id) => {
                IntentOutcome::Estimated(self.workflows.estimate(car_id).await)
            }
            TileIntent::BookNow(car_id) => IntentOutcome::Booked(self.workflows.book(car_id).await),
        }
    }
}
