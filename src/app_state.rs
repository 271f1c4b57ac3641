//! Shared application state handed to every component at construction.

use std::sync::Arc;

use crate::collaborators::{
    CarQuery, InMemoryFleet, Navigator, Notifier, PicklistSource, RecordLookup, RecordStore,
};
use crate::components::{CarCard, CarTileList, WorkflowLauncher};
use crate::config::DeskConfig;
use crate::domain::MessageBus;
use crate::modal::ModalHost;
use crate::service::FilterCoordinator;

/// Collaborators and the bus shared by all components of one desk.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: DeskConfig,
    /// Bus connecting the panels.
    pub bus: MessageBus,
    /// Catalog query.
    pub query: Arc<dyn CarQuery>,
    /// Record persistence.
    pub records: Arc<dyn RecordStore>,
    /// Record field lookup.
    pub lookup: Arc<dyn RecordLookup>,
    /// Picklist metadata.
    pub picklists: Arc<dyn PicklistSource>,
    /// Toast sink.
    pub notifier: Arc<dyn Notifier>,
    /// Navigation sink.
    pub navigator: Arc<dyn Navigator>,
    /// Modal presentation.
    pub modal_host: Arc<dyn ModalHost>,
}

impl AppState {
    /// Builds a state whose data collaborators are all served by `fleet`.
    #[must_use]
    pub fn with_fleet(
        config: DeskConfig,
        fleet: &Arc<InMemoryFleet>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        modal_host: Arc<dyn ModalHost>,
    ) -> Self {
        Self {
            config,
            bus: MessageBus::new(),
            query: Arc::clone(fleet) as Arc<dyn CarQuery>,
            records: Arc::clone(fleet) as Arc<dyn RecordStore>,
            lookup: Arc::clone(fleet) as Arc<dyn RecordLookup>,
            picklists: Arc::clone(fleet) as Arc<dyn PicklistSource>,
            notifier,
            navigator,
            modal_host,
        }
    }

    /// Launcher for the modal workflows.
    #[must_use]
    pub fn workflows(&self) -> WorkflowLauncher {
        WorkflowLauncher::new(
            Arc::clone(&self.records),
            Arc::clone(&self.modal_host),
            Arc::clone(&self.notifier),
            Arc::clone(&self.navigator),
        )
    }

    /// Filter panel coordinator with the configured defaults.
    #[must_use]
    pub fn filter_coordinator(&self) -> FilterCoordinator {
        FilterCoordinator::from_config(self.bus.context(), &self.config)
    }

    /// Disconnected catalog list.
    #[must_use]
    pub fn car_tile_list(&self) -> CarTileList {
        CarTileList::new(self.bus.clone(), Arc::clone(&self.query), self.workflows())
    }

    /// Disconnected detail card.
    #[must_use]
    pub fn car_card(&self) -> CarCard {
        CarCard::new(Arc::clone(&self.lookup), self.workflows())
    }
}
