//! # rental-desk
//!
//! Coordination layer of a car rental desk: a filter panel, a catalog
//! list, a detail card and the booking and estimate modals, wired
//! together through a typed in-process message bus.
//!
//! Data access, persistence, toasts, navigation and modal rendering are
//! collaborators behind traits; this crate owns only the coordination
//! between them.
//!
//! ## Architecture
//!
//! ```text
//! FilterCoordinator (service/)
//!     │  validate → debounce → snapshot
//!     ▼
//! MessageBus ── car_filter ──► CatalogBinding ──► CarQuery
//!     │                              │
//!     │                        CarTileList (components/)
//!     │                              │ select / estimate / book
//!     ◄──────── car_selection ───────┤
//!     │                              ▼
//!     └──────────────► CarCard   WorkflowLauncher ──► ModalHost (modal/)
//!                                    │
//!                                    └──► RecordStore, Notifier, Navigator
//! ```

pub mod app_state;
pub mod collaborators;
pub mod components;
pub mod config;
pub mod domain;
pub mod error;
pub mod modal;
pub mod service;
