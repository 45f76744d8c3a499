//! Reconciliation engine for a shared-link download manifest
//!
//! The manifest maps logical paths to the download URLs of files that are
//! publicly downloadable in a remote content store, either through their
//! own shared link or through a shared ancestor folder. This crate keeps it
//! in sync two ways:
//!
//! - **Full sweep** ([`Reconciler`]): walk the managed folder, correct
//!   every file, then delete rows nothing vouched for
//! - **Change events** ([`EventProcessor`]): verify a signed delivery and
//!   correct just the file or subtree it names
//!
//! # Architecture
//!
//! ```text
//!        Reconciler          EventProcessor
//!             |                    |
//!             +--------+-----------+
//!                      |
//!     TreeWalker / publicity / path / Manifest
//!                      |
//!          +-----------+-----------+
//!          |                       |
//!     RemoteStore             ManifestStore
//! ```
//!
//! The two entry points never call each other. Between sweeps the
//! manifest may be stale; a completed sweep is authoritative.

pub mod config;
pub mod correction;
pub mod error;
pub mod manifest;
pub mod model;
pub mod path;
pub mod publicity;
pub mod reconcile;
pub mod remote;
pub mod walker;
pub mod webhook;

pub use config::Config;
pub use correction::{FileOutcome, correct_file};
pub use error::{Error, Result};
pub use manifest::{FileManifestStore, Manifest, ManifestStore, ScanPage};
pub use model::{
    Access, LinkState, ManifestEntry, ObjectKind, PathEntry, Permission, RemoteObject, SharedLink,
};
pub use path::resolve_path;
pub use publicity::{AncestorCache, is_effectively_public, is_public_by_inheritance};
pub use reconcile::{Reconciler, SweepReport};
pub use remote::{ItemPage, LinkChange, OBJECT_FIELDS, RemoteStore, align_shared_link, fetch};
pub use walker::{ITEM_PAGE_LIMIT, TreeWalk, TreeWalker, WalkedFile};
pub use webhook::{Delivery, EventProcessor, Outcome, Signatures, SigningKeys, SkipReason, Trigger};
