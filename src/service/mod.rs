//! Service layer: coordination logic between the panels.
//!
//! [`FilterCoordinator`] validates, debounces and publishes the filter
//! state, [`SelectionRelay`] announces selected cars and
//! [`CatalogBinding`] re-queries the catalog whenever a filter arrives.
//! All three talk to each other only through the
//! [`crate::domain::MessageBus`].

pub mod catalog_binding;
pub mod filter_coordinator;
pub mod selection_relay;

pub use catalog_binding::{CatalogBinding, CatalogState, QueryState};
pub use filter_coordinator::{FilterCoordinator, FilterOptions};
pub use selection_relay::SelectionRelay;
