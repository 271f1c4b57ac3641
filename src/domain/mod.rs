//! Domain layer: filter model, car projections and the message bus.
//!
//! This module contains the client-side domain model including record
//! identity, filter criteria with their validation rules, the catalog
//! projections, and the publish/subscribe bus with its channels.

pub mod booking;
pub mod car;
pub mod filter;
pub mod message;
pub mod message_bus;
pub mod record_id;
pub mod subscription;

pub use booking::{BOOKING_OBJECT, BookingCreated};
pub use car::{CarSummary, CatalogPage};
pub use filter::{DateRange, FilterCriteria, FilterSnapshot, FuelType, Transmission};
pub use message::{CarFilterChannel, CarSelection, CarSelectionChannel};
pub use message_bus::{Channel, MessageBus, MessageContext};
pub use record_id::{FieldMap, RecordId};
pub use subscription::{ContextId, Scope, SubscriptionToken};
