//! Channels carried on the [`super::MessageBus`] and their payloads.

use serde::{Deserialize, Serialize};

use super::message_bus::Channel;
use super::{FilterSnapshot, RecordId};

/// Channel on which the filter panel publishes debounced snapshots.
#[derive(Debug, Clone, Copy)]
pub struct CarFilterChannel;

impl Channel for CarFilterChannel {
    type Payload = FilterSnapshot;
    const NAME: &'static str = "car_filter";
}

/// Channel on which a selected car is announced to detail views.
#[derive(Debug, Clone, Copy)]
pub struct CarSelectionChannel;

impl Channel for CarSelectionChannel {
    type Payload = CarSelection;
    const NAME: &'static str = "car_selection";
}

/// Payload of [`CarSelectionChannel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarSelection {
    /// The car the user picked.
    pub car_id: RecordId,
}
