//! Interfaces of the platform services the coordination layer calls.
//!
//! Query execution, record persistence, record-field lookup, picklist
//! metadata, toast rendering and page navigation all live outside this
//! crate. Components receive them as trait objects at construction.
//! [`memory::InMemoryFleet`] and the [`sinks`] implementations back the
//! demo binary and the tests.

pub mod memory;
pub mod sinks;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{CatalogPage, FieldMap, FilterSnapshot, RecordId};
use crate::error::DeskError;

pub use memory::InMemoryFleet;
pub use sinks::{RecordingNavigator, RecordingNotifier, TracingNavigator, TracingNotifier};

/// Executes the catalog list query.
#[async_trait]
pub trait CarQuery: Send + Sync + fmt::Debug {
    /// Lists the cars matching `filter`. `None` means no filter has been
    /// published yet and must be tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Query`] if the query cannot be executed.
    async fn list_cars(&self, filter: Option<&FilterSnapshot>) -> Result<CatalogPage, DeskError>;
}

/// Persists records.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Saves a new record of type `object` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Save`] with a user-facing message when the
    /// record is rejected or cannot be stored.
    async fn save(&self, object: &str, fields: FieldMap) -> Result<RecordId, DeskError>;
}

/// Reads field values of an existing record.
#[async_trait]
pub trait RecordLookup: Send + Sync + fmt::Debug {
    /// Returns the requested fields of `record_id`. Fields without a value
    /// may be absent from the map.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Lookup`] if the record cannot be read.
    async fn fetch_fields(
        &self,
        record_id: &RecordId,
        fields: &[&str],
    ) -> Result<FieldMap, DeskError>;
}

/// Picklist-backed filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PicklistField {
    /// Pickup location of a car.
    PickupLocation,
    /// Gearbox type.
    TransmissionType,
    /// Fuel type.
    FuelType,
}

/// One selectable picklist option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistValue {
    /// Display label.
    pub label: String,
    /// Stored value.
    pub value: String,
}

impl PicklistValue {
    /// Option whose label equals its value.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Supplies picklist options for filter fields.
#[async_trait]
pub trait PicklistSource: Send + Sync + fmt::Debug {
    /// Returns the active options of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Picklist`] if the metadata cannot be read.
    async fn picklist_values(&self, field: PicklistField) -> Result<Vec<PicklistValue>, DeskError>;
}

/// Severity of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastVariant {
    /// Neutral information.
    Info,
    /// Completed successfully.
    Success,
    /// Needs attention.
    Warning,
    /// Failed.
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Title line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Severity.
    pub variant: ToastVariant,
}

impl Toast {
    /// Creates a toast.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>, variant: ToastVariant) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant,
        }
    }
}

/// Renders notifications. Fire-and-forget.
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Shows `toast` to the user.
    fn notify(&self, toast: Toast);
}

/// Action performed on a record page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    /// Read-only view.
    View,
    /// Edit form.
    Edit,
}

/// Navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageReference {
    /// The page of a single record.
    RecordPage {
        /// Object type of the record.
        object_api_name: String,
        /// Record to show.
        record_id: RecordId,
        /// What to do on the page.
        action: PageAction,
    },
}

impl PageReference {
    /// View page of `record_id` of type `object`.
    #[must_use]
    pub fn record_view(object: &str, record_id: RecordId) -> Self {
        Self::RecordPage {
            object_api_name: object.to_string(),
            record_id,
            action: PageAction::View,
        }
    }
}

/// Performs page navigation. Fire-and-forget.
pub trait Navigator: Send + Sync + fmt::Debug {
    /// Navigates to `target`.
    fn navigate(&self, target: PageReference);
}
