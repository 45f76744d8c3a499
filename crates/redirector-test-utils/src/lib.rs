//! Shared test utilities for the shared-link redirector workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`remote`]: [`FakeRemote`], an in-memory remote tree that records calls
//! - [`manifest`]: [`MemoryManifest`], an in-memory paginated manifest store
//! - [`events`]: signed change-event deliveries in both payload shapes

pub mod events;
pub mod manifest;
pub mod remote;

pub use events::{EventShape, delivery, event_body, signed_delivery};
pub use manifest::MemoryManifest;
pub use remote::{Call, FakeRemote, TOP_ID, download_url_for};
