//! Inbound change events
//!
//! - **signature**: HMAC-SHA256 verification of raw delivery bodies
//! - **event**: envelope parsing, subject extraction, trigger routing
//! - **processor**: scoped corrections for a single file or a subtree

mod event;
mod processor;
mod signature;

pub use event::{Envelope, Route, Subject, Trigger};
pub use processor::{Delivery, EventProcessor, Outcome, SkipReason};
pub use signature::{sign, Signatures, SigningKeys};
