//! View-side components of the rental desk.
//!
//! Each component owns its observable state and talks to the others only
//! over the [`crate::domain::MessageBus`]:
//!
//! - [`CarTileList`] renders the catalog for the published filter and
//!   turns tile clicks into selections and modal workflows.
//! - [`CarCard`] shows the details of the selected car.
//! - [`WorkflowLauncher`] opens the booking and estimate modals and
//!   performs the follow-up of a successful booking.

pub mod car_card;
pub mod car_tile_list;
pub mod tile;
pub mod workflow;

pub use car_card::{CarCard, CarDetail, CardState};
pub use car_tile_list::{CarTileList, IntentOutcome};
pub use tile::{CarTile, TileIntent};
pub use workflow::WorkflowLauncher;
