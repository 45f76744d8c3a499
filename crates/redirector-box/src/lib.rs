//! Box implementation of [`redirector_core::RemoteStore`]
//!
//! [`BoxClient`] speaks the Box content API over blocking HTTPS:
//!
//! - `GET /files/{id}` and `GET /folders/{id}` with a `fields` projection
//! - `GET /folders/{id}/items` paged by `limit` and `offset`
//! - `PUT /files/{id}` (or `/folders/{id}`) with a `shared_link` body to
//!   create or remove a link
//!
//! A 404 on a fetch is reported as a missing object; every other failure
//! becomes [`redirector_core::Error::RemoteApi`] carrying the status.

pub mod client;
pub mod error;
mod wire;

pub use client::{BoxClient, DEFAULT_API_BASE};
pub use error::{Error, Result};
